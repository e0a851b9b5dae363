//! Keep-set driven pruning of stale subtrees.

use std::collections::HashSet;

use crate::node::{NodeData, NodeId};
use crate::observer::TreeObserver;
use crate::tree::NodeTree;

/// What a trim call tells its caller about the trimmed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimResult {
    /// The node stays: it is a registered keeper, or it shed at least
    /// one child during this call.
    Keep,
    /// The node, and everything under it, may be removed by the caller.
    Discard,
}

impl NodeTree {
    /// Prune the subtree at `id` against an externally maintained keep
    /// set.
    ///
    /// Children whose own trim reports [`TrimResult::Discard`] are
    /// removed from the live tree through the regular batched removal
    /// paths (sub-projects via the lockstep project path). A folder that
    /// had to shed a child is preserved even when that leaves it empty;
    /// a folder that is neither a keeper nor shed anything is offered up
    /// for removal. Keepers short-circuit: their subtrees are left
    /// untouched, so a keep set should list every node it wants intact,
    /// ancestors included.
    pub fn trim(
        &mut self,
        id: NodeId,
        keepers: &HashSet<NodeId>,
        observer: &mut dyn TreeObserver,
    ) -> TrimResult {
        if keepers.contains(&id) {
            return TrimResult::Keep;
        }
        match self.node(id).data() {
            NodeData::File(_) => TrimResult::Discard,
            NodeData::Folder(_) | NodeData::VirtualFolder(_) => {
                if self.trim_folder_children(id, keepers, observer) {
                    TrimResult::Keep
                } else {
                    TrimResult::Discard
                }
            }
            NodeData::Project(_) | NodeData::Session(_) => {
                let subset_touched = self.trim_project_subset(id, keepers, observer);
                let folder_touched = self.trim_folder_children(id, keepers, observer);
                if subset_touched || folder_touched {
                    TrimResult::Keep
                } else {
                    TrimResult::Discard
                }
            }
        }
    }

    /// Trim the distinguished sub-project list of a project or session
    /// node. Returns true when any sub-project was removed.
    fn trim_project_subset(
        &mut self,
        id: NodeId,
        keepers: &HashSet<NodeId>,
        observer: &mut dyn TreeObserver,
    ) -> bool {
        let subset = self.project_nodes(id).to_vec();
        let mut dropped = Vec::new();
        for project in subset {
            if self.trim(project, keepers, observer) == TrimResult::Discard {
                dropped.push(project);
            }
        }
        let touched = !dropped.is_empty();
        self.remove_project_nodes(id, dropped, observer);
        touched
    }

    /// Trim the plain file and folder children of a folder-like node.
    /// Sub-projects are left to [`Self::trim_project_subset`]. Returns
    /// true when anything was removed.
    fn trim_folder_children(
        &mut self,
        id: NodeId,
        keepers: &HashSet<NodeId>,
        observer: &mut dyn TreeObserver,
    ) -> bool {
        let dropped_files: Vec<NodeId> = self
            .file_nodes(id)
            .iter()
            .copied()
            .filter(|file| !keepers.contains(file))
            .collect();
        let mut touched = !dropped_files.is_empty();
        self.remove_file_nodes(id, dropped_files, observer);

        let folders: Vec<NodeId> = self
            .folder_nodes(id)
            .iter()
            .copied()
            .filter(|&folder| !self.node(folder).is_project())
            .collect();
        let mut dropped_folders = Vec::new();
        for folder in folders {
            if self.trim(folder, keepers, observer) == TrimResult::Discard {
                dropped_folders.push(folder);
            }
        }
        touched |= !dropped_folders.is_empty();
        self.remove_folder_nodes(id, dropped_folders, observer);
        touched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::FileKind;
    use crate::observer::NullObserver;

    fn obs() -> NullObserver {
        NullObserver
    }

    #[test]
    fn shedding_a_sibling_keeps_the_folder() {
        let mut tree = NodeTree::new();
        let project = tree.new_project_node("/work/app/Cargo.toml");
        tree.add_project_nodes(tree.root(), vec![project], &mut obs());
        let folder = tree.new_folder_node("/work/app/src", None);
        tree.add_folder_nodes(project, vec![folder], &mut obs());
        let x = tree.new_file_node("/work/app/src/x.rs", FileKind::Source, false, None);
        let y = tree.new_file_node("/work/app/src/y.rs", FileKind::Source, false, None);
        tree.add_file_nodes(folder, vec![x, y], &mut obs());

        let keepers = HashSet::from([x]);
        assert_eq!(tree.trim(folder, &keepers, &mut obs()), TrimResult::Keep);
        assert!(tree.contains(x));
        assert!(!tree.contains(y));
        assert_eq!(tree.file_nodes(folder), &[x]);
    }

    #[test]
    fn untouched_non_keeper_folder_is_offered_up() {
        let mut tree = NodeTree::new();
        let project = tree.new_project_node("/work/app/Cargo.toml");
        tree.add_project_nodes(tree.root(), vec![project], &mut obs());
        let folder = tree.new_folder_node("/work/app/empty", None);
        tree.add_folder_nodes(project, vec![folder], &mut obs());

        let keepers = HashSet::new();
        assert_eq!(tree.trim(folder, &keepers, &mut obs()), TrimResult::Discard);
        // The caller removes; trim itself leaves the node in place.
        assert!(tree.contains(folder));
    }

    #[test]
    fn touched_folder_survives_even_when_emptied() {
        let mut tree = NodeTree::new();
        let project = tree.new_project_node("/work/app/Cargo.toml");
        tree.add_project_nodes(tree.root(), vec![project], &mut obs());
        let folder = tree.new_folder_node("/work/app/src", None);
        tree.add_folder_nodes(project, vec![folder], &mut obs());
        let y = tree.new_file_node("/work/app/src/y.rs", FileKind::Source, false, None);
        tree.add_file_nodes(folder, vec![y], &mut obs());

        assert_eq!(
            tree.trim(folder, &HashSet::new(), &mut obs()),
            TrimResult::Keep
        );
        assert!(tree.contains(folder));
        assert!(tree.file_nodes(folder).is_empty());
    }

    #[test]
    fn keeper_short_circuits_its_subtree() {
        let mut tree = NodeTree::new();
        let project = tree.new_project_node("/work/app/Cargo.toml");
        tree.add_project_nodes(tree.root(), vec![project], &mut obs());
        let folder = tree.new_folder_node("/work/app/src", None);
        tree.add_folder_nodes(project, vec![folder], &mut obs());
        let y = tree.new_file_node("/work/app/src/y.rs", FileKind::Source, false, None);
        tree.add_file_nodes(folder, vec![y], &mut obs());

        let keepers = HashSet::from([folder]);
        assert_eq!(tree.trim(folder, &keepers, &mut obs()), TrimResult::Keep);
        assert!(tree.contains(y));
    }

    #[test]
    fn session_trim_removes_projects_in_lockstep() {
        let mut tree = NodeTree::new();
        let keep = tree.new_project_node("/work/a/Cargo.toml");
        let stale = tree.new_project_node("/work/b/Cargo.toml");
        tree.add_project_nodes(tree.root(), vec![keep, stale], &mut obs());

        let keepers = HashSet::from([keep]);
        assert_eq!(tree.trim(tree.root(), &keepers, &mut obs()), TrimResult::Keep);
        assert!(tree.contains(keep));
        assert!(!tree.contains(stale));
        assert_eq!(tree.project_nodes(tree.root()), &[keep]);
        assert_eq!(tree.folder_nodes(tree.root()), &[keep]);
    }

    #[test]
    fn project_kept_when_folder_pass_sheds() {
        let mut tree = NodeTree::new();
        let project = tree.new_project_node("/work/app/Cargo.toml");
        tree.add_project_nodes(tree.root(), vec![project], &mut obs());
        let file = tree.new_file_node("/work/app/main.rs", FileKind::Source, false, None);
        tree.add_file_nodes(project, vec![file], &mut obs());

        assert_eq!(
            tree.trim(project, &HashSet::new(), &mut obs()),
            TrimResult::Keep
        );
        assert!(tree.contains(project));
        assert!(tree.file_nodes(project).is_empty());
    }
}
