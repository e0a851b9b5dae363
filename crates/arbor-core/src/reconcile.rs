//! Diff-based reconciliation of a folder subtree against a fresh scan.

use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;
use itertools::{EitherOrBoth, Itertools};

use crate::node::{FileCandidate, NodeId, NodeKind};
use crate::observer::TreeObserver;
use crate::tree::NodeTree;

impl NodeTree {
    /// Resolve the folder chain for `directory` under `base`, creating
    /// plain folder nodes for missing segments. Each created folder's
    /// display name is its path segment. When `override_base_dir` is
    /// given, containment is resolved against it instead of the base
    /// node's own path; a directory outside the base entirely falls back
    /// to materializing its full path segment by segment.
    pub fn recursive_find_or_create_folder_node(
        &mut self,
        base: NodeId,
        directory: &Path,
        override_base_dir: Option<&Path>,
        observer: &mut dyn TreeObserver,
    ) -> NodeId {
        let base_path = override_base_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.node(base).path().to_path_buf());
        let (mut acc, rel) = match directory.strip_prefix(&base_path) {
            Ok(rel) => (base_path, rel.to_path_buf()),
            Err(_) => (PathBuf::new(), directory.to_path_buf()),
        };

        let mut current = base;
        for component in rel.components() {
            match component {
                Component::Normal(segment) => {
                    acc.push(segment);
                    current = match self.folder_node_at(current, &acc) {
                        Some(existing) => existing,
                        None => {
                            let created = self
                                .new_folder_node(acc.clone(), Some(&segment.to_string_lossy()));
                            self.add_folder_nodes(current, vec![created], observer);
                            created
                        }
                    };
                }
                Component::CurDir => {}
                other => acc.push(other.as_os_str()),
            }
        }
        current
    }

    /// Reconcile the file set under `base` with a freshly scanned
    /// candidate collection.
    ///
    /// Computes the symmetric difference by path between the subtree's
    /// current recursive file set and the candidates: new paths are
    /// inserted under lazily materialized folder chains, vanished paths
    /// are removed from their actual parents, and paths present on both
    /// sides simply drop the candidate duplicate. Folders left with no
    /// children are collapsed upward, stopping before `base`. Insertions
    /// and removals are batched per folder so each touched folder sees
    /// one notification pair.
    pub fn build_tree(
        &mut self,
        base: NodeId,
        candidates: Vec<FileCandidate>,
        override_base_dir: Option<&Path>,
        observer: &mut dyn TreeObserver,
    ) {
        let mut fresh = candidates;
        fresh.sort_by(|a, b| a.path.cmp(&b.path));
        fresh.dedup_by(|a, b| a.path == b.path);

        let mut existing = self.recursive_file_nodes(base);
        existing.sort_by(|&a, &b| self.node(a).path().cmp(self.node(b).path()));

        let mut to_add: Vec<FileCandidate> = Vec::new();
        let mut to_remove: Vec<NodeId> = Vec::new();
        for pair in fresh
            .into_iter()
            .merge_join_by(existing, |candidate, &node| {
                candidate.path.as_path().cmp(self.node(node).path())
            })
        {
            match pair {
                EitherOrBoth::Left(candidate) => to_add.push(candidate),
                EitherOrBoth::Right(node) => to_remove.push(node),
                EitherOrBoth::Both(_, _) => {}
            }
        }
        if !to_add.is_empty() || !to_remove.is_empty() {
            tracing::debug!(
                added = to_add.len(),
                removed = to_remove.len(),
                "reconciling subtree"
            );
        }

        let mut additions: IndexMap<NodeId, Vec<NodeId>> = IndexMap::new();
        for candidate in to_add {
            let directory = candidate
                .path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            let folder = self.recursive_find_or_create_folder_node(
                base,
                &directory,
                override_base_dir,
                observer,
            );
            let file = self.file_node_from(candidate);
            additions.entry(folder).or_default().push(file);
        }
        for (folder, files) in additions {
            self.add_file_nodes(folder, files, observer);
        }

        let mut removals: IndexMap<NodeId, Vec<NodeId>> = IndexMap::new();
        for node in to_remove {
            let parent = self
                .node(node)
                .parent()
                .expect("tracked file has a parent folder");
            removals.entry(parent).or_default().push(node);
        }
        for (parent, files) in removals {
            self.remove_file_nodes(parent, files, observer);
            self.collapse_empty_folders(base, parent, observer);
        }
    }

    /// Walk from `folder` toward `base`, removing each folder that ended
    /// up with no children. Stops before `base` and never collapses
    /// project or session nodes.
    fn collapse_empty_folders(
        &mut self,
        base: NodeId,
        folder: NodeId,
        observer: &mut dyn TreeObserver,
    ) {
        let mut current = folder;
        loop {
            if current == base || !self.contains(current) {
                return;
            }
            if !matches!(
                self.node(current).kind(),
                NodeKind::Folder | NodeKind::VirtualFolder
            ) {
                return;
            }
            if !self.file_nodes(current).is_empty() || !self.folder_nodes(current).is_empty() {
                return;
            }
            let Some(parent) = self.node(current).parent() else {
                return;
            };
            self.remove_folder_nodes(parent, vec![current], observer);
            current = parent;
        }
    }
}
