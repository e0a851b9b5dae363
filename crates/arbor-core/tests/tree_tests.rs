use std::collections::HashSet;
use std::path::{Path, PathBuf};

use arbor_core::{
    FileCandidate, FileKind, NodeId, NodeTree, NullObserver, ProjectAction, ProjectOps,
    RecordingObserver, TreeEvent, TrimResult,
};

fn obs() -> NullObserver {
    NullObserver
}

/// Check that every sibling list under `id` is sorted and that every
/// reachable child's parent link points back at its owner.
fn assert_tree_consistent(tree: &NodeTree, id: NodeId) {
    let files = tree.file_nodes(id);
    let folders = tree.folder_nodes(id);
    for window in files.windows(2) {
        assert!(
            tree.node(window[0]).sort_key() <= tree.node(window[1]).sort_key(),
            "file children out of order"
        );
    }
    for window in folders.windows(2) {
        assert!(
            tree.node(window[0]).sort_key() <= tree.node(window[1]).sort_key(),
            "folder children out of order"
        );
    }
    for &child in files.iter().chain(folders) {
        assert_eq!(tree.parent_folder(child), Some(id), "stale parent link");
        let siblings = if tree.node(child).is_file() {
            files
        } else {
            folders
        };
        assert_eq!(
            siblings.iter().filter(|&&n| n == child).count(),
            1,
            "child appears more than once"
        );
    }
    for &sub in folders {
        assert_tree_consistent(tree, sub);
    }
}

fn session_with_project(tree: &mut NodeTree, base: &str) -> NodeId {
    let project = tree.new_project_node(base);
    tree.add_project_nodes(tree.root(), vec![project], &mut obs());
    project
}

#[test]
fn test_sort_invariant_survives_mixed_operations() {
    let mut tree = NodeTree::new();
    let project = session_with_project(&mut tree, "/w/app");

    tree.build_tree(
        project,
        vec![
            FileCandidate::new("/w/app/src/z.rs"),
            FileCandidate::new("/w/app/src/a.rs"),
            FileCandidate::new("/w/app/Cargo.toml"),
            FileCandidate::new("/w/app/tests/t.rs"),
        ],
        None,
        &mut obs(),
    );
    assert_tree_consistent(&tree, tree.root());

    let extra = tree.new_file_node("/w/app/src/m.rs", FileKind::Source, false, None);
    let src = tree.folder_node_at(project, Path::new("/w/app/src")).unwrap();
    tree.add_file_nodes(src, vec![extra], &mut obs());
    assert_tree_consistent(&tree, tree.root());

    let virt = tree.new_virtual_folder_node("/w/app/src", 30);
    tree.add_folder_nodes(project, vec![virt], &mut obs());
    // Virtual folders sort ahead of real ones at equal priority and path.
    let folders = tree.folder_nodes(project);
    assert!(
        folders.iter().position(|&n| n == virt).unwrap()
            < folders.iter().position(|&n| n == src).unwrap()
    );
    assert_tree_consistent(&tree, tree.root());

    let a = tree.find_file_node(project, Path::new("/w/app/src/a.rs")).unwrap();
    tree.remove_file_nodes(src, vec![a], &mut obs());
    assert_tree_consistent(&tree, tree.root());
}

#[test]
fn test_notification_pairing_brackets_each_batch() {
    let mut tree = NodeTree::new();
    let project = session_with_project(&mut tree, "/w/app");

    let mut rec = RecordingObserver::new();
    let a = tree.new_file_node("/w/app/a.rs", FileKind::Source, false, None);
    let b = tree.new_file_node("/w/app/b.rs", FileKind::Source, false, None);
    tree.add_file_nodes(project, vec![a, b], &mut rec);

    assert_eq!(
        rec.events,
        vec![
            TreeEvent::FilesAboutToBeAdded {
                folder: project,
                files: vec![a, b],
            },
            TreeEvent::FilesAdded {
                folder: project,
                files: vec![a, b],
            },
        ]
    );

    rec.clear();
    tree.remove_file_nodes(project, vec![b, a], &mut rec);
    // One pair for the whole batch, payload in tree order.
    assert_eq!(
        rec.events,
        vec![
            TreeEvent::FilesAboutToBeRemoved {
                folder: project,
                files: vec![a, b],
            },
            TreeEvent::FilesRemoved {
                folder: project,
                files: vec![a, b],
            },
        ]
    );
}

#[test]
fn test_set_path_emits_sort_key_pair_then_updated() {
    let mut tree = NodeTree::new();
    let project = session_with_project(&mut tree, "/w/app");
    let a = tree.new_file_node("/w/app/a.rs", FileKind::Source, false, None);
    let b = tree.new_file_node("/w/app/b.rs", FileKind::Source, false, None);
    tree.add_file_nodes(project, vec![a, b], &mut obs());

    let mut rec = RecordingObserver::new();
    tree.set_path_and_line(a, "/w/app/z.rs", None, &mut rec);
    assert_eq!(
        rec.events,
        vec![
            TreeEvent::SortKeyAboutToChange(a),
            TreeEvent::SortKeyChanged(a),
            TreeEvent::NodeUpdated(a),
        ]
    );
    // The node moved behind its sibling under the new key.
    assert_eq!(tree.file_nodes(project), &[b, a]);

    // Unchanged path and line is a no-op.
    rec.clear();
    tree.set_path_and_line(a, "/w/app/z.rs", None, &mut rec);
    assert!(rec.events.is_empty());
}

#[test]
fn test_reconciliation_minimality_keeps_node_identity() {
    let mut tree = NodeTree::new();
    let project = session_with_project(&mut tree, "/w/app");
    tree.build_tree(
        project,
        vec![
            FileCandidate::new("/w/app/a.rs"),
            FileCandidate::new("/w/app/b.rs"),
            FileCandidate::new("/w/app/c.rs"),
        ],
        None,
        &mut obs(),
    );
    let b = tree.find_file_node(project, Path::new("/w/app/b.rs")).unwrap();
    let c = tree.find_file_node(project, Path::new("/w/app/c.rs")).unwrap();

    let mut rec = RecordingObserver::new();
    tree.build_tree(
        project,
        vec![
            FileCandidate::new("/w/app/b.rs"),
            FileCandidate::new("/w/app/c.rs"),
            FileCandidate::new("/w/app/d.rs"),
        ],
        None,
        &mut rec,
    );

    assert_eq!(tree.find_file_node(project, Path::new("/w/app/a.rs")), None);
    assert_eq!(tree.find_file_node(project, Path::new("/w/app/b.rs")), Some(b));
    assert_eq!(tree.find_file_node(project, Path::new("/w/app/c.rs")), Some(c));
    assert!(tree.find_file_node(project, Path::new("/w/app/d.rs")).is_some());

    // Exactly one add batch of one file and one remove batch of one file.
    assert_eq!(
        rec.count(|e| matches!(e, TreeEvent::FilesAdded { files, .. } if files.len() == 1)),
        1
    );
    assert_eq!(
        rec.count(|e| matches!(e, TreeEvent::FilesRemoved { files, .. } if files.len() == 1)),
        1
    );
    assert_tree_consistent(&tree, tree.root());
}

#[test]
fn test_empty_folder_collapse_stops_at_reconciliation_root() {
    let mut tree = NodeTree::new();
    let project = session_with_project(&mut tree, "/w/app");
    tree.build_tree(
        project,
        vec![FileCandidate::new("/w/app/deep/er/still/x.rs")],
        None,
        &mut obs(),
    );
    let deep = tree.folder_node_at(project, Path::new("/w/app/deep"));
    assert!(deep.is_some());

    tree.build_tree(project, Vec::new(), None, &mut obs());
    assert_eq!(tree.folder_node_at(project, Path::new("/w/app/deep")), None);
    assert!(tree.contains(project));
    assert!(tree.file_nodes(project).is_empty());
    assert!(tree.folder_nodes(project).is_empty());
}

#[test]
fn test_trim_asymmetry() {
    let mut tree = NodeTree::new();
    let project = session_with_project(&mut tree, "/w/app");
    let touched = tree.new_folder_node("/w/app/touched", None);
    let untouched = tree.new_folder_node("/w/app/untouched", None);
    tree.add_folder_nodes(project, vec![touched, untouched], &mut obs());
    let x = tree.new_file_node("/w/app/touched/x.rs", FileKind::Source, false, None);
    let y = tree.new_file_node("/w/app/touched/y.rs", FileKind::Source, false, None);
    tree.add_file_nodes(touched, vec![x, y], &mut obs());

    let keepers = HashSet::from([x]);
    assert_eq!(tree.trim(project, &keepers, &mut obs()), TrimResult::Keep);

    // The folder that shed y survives with x; the folder with nothing to
    // shed was offered up and removed by its parent's pass.
    assert!(tree.contains(touched));
    assert_eq!(tree.file_nodes(touched), &[x]);
    assert!(!tree.contains(untouched));
    assert_tree_consistent(&tree, tree.root());
}

#[test]
fn test_sub_project_lifecycle() {
    let mut tree = NodeTree::new();
    let outer = session_with_project(&mut tree, "/w/outer");
    let sub_b = tree.new_project_node("/w/outer/b/Cargo.toml");
    let sub_a = tree.new_project_node("/w/outer/a/Cargo.toml");

    let mut rec = RecordingObserver::new();
    tree.add_project_nodes(outer, vec![sub_b, sub_a], &mut rec);
    assert_eq!(tree.project_nodes(outer), &[sub_a, sub_b]);
    assert_eq!(tree.folder_nodes(outer), &[sub_a, sub_b]);
    // Sub-projects ride the folder notification pair.
    assert_eq!(
        rec.count(|e| matches!(e, TreeEvent::FoldersAboutToBeAdded { .. })),
        1
    );
    assert_eq!(rec.count(|e| matches!(e, TreeEvent::FoldersAdded { .. })), 1);

    tree.remove_project_nodes(outer, vec![sub_a], &mut obs());
    assert_eq!(tree.project_nodes(outer), &[sub_b]);
    assert_eq!(tree.folder_nodes(outer), &[sub_b]);
    assert!(!tree.contains(sub_a));
    assert_tree_consistent(&tree, tree.root());
}

/// Minimal ops override confirming capability calls route to the
/// managing project and surface its refusals.
#[derive(Debug)]
struct ListingOps {
    refused: Vec<PathBuf>,
}

impl ProjectOps for ListingOps {
    fn supported_actions(&self) -> Vec<ProjectAction> {
        vec![ProjectAction::AddNewFile]
    }

    fn add_files(&mut self, paths: &[PathBuf], not_added: Option<&mut Vec<PathBuf>>) -> bool {
        if let Some(out) = not_added {
            out.extend(self.refused.iter().cloned());
        }
        paths.iter().all(|p| !self.refused.contains(p))
    }
}

#[test]
fn test_capabilities_route_to_managing_project() {
    let mut tree = NodeTree::new();
    let project = session_with_project(&mut tree, "/w/app");
    tree.set_project_ops(
        project,
        Box::new(ListingOps {
            refused: vec![PathBuf::from("/w/app/locked.rs")],
        }),
    );
    let folder = tree.new_folder_node("/w/app/src", None);
    tree.add_folder_nodes(project, vec![folder], &mut obs());

    let mut not_added = Vec::new();
    let ok = tree.add_files(
        folder,
        &[PathBuf::from("/w/app/src/new.rs")],
        Some(&mut not_added),
    );
    assert!(ok);
    assert_eq!(not_added, vec![PathBuf::from("/w/app/locked.rs")]);

    let refused = tree.add_files(folder, &[PathBuf::from("/w/app/locked.rs")], None);
    assert!(!refused);
}

#[test]
fn test_supported_actions_inherit_from_parent() {
    let mut tree = NodeTree::new();
    let project = session_with_project(&mut tree, "/w/app");
    tree.set_project_ops(project, Box::new(ListingOps { refused: Vec::new() }));
    let folder = tree.new_folder_node("/w/app/src", None);
    tree.add_folder_nodes(project, vec![folder], &mut obs());

    assert_eq!(
        tree.supported_actions(project),
        vec![ProjectAction::AddNewFile]
    );
    assert_eq!(
        tree.supported_actions(folder),
        vec![ProjectAction::AddNewFile, ProjectAction::InheritedFromParent]
    );
    assert!(tree.supported_actions(tree.root()).is_empty());
}

#[test]
fn test_ownership_invariant_after_reconcile_churn() {
    let mut tree = NodeTree::new();
    let project = session_with_project(&mut tree, "/w/app");

    // Three rounds of overlapping candidate sets.
    let rounds: [Vec<&str>; 3] = [
        vec!["/w/app/a.rs", "/w/app/src/b.rs", "/w/app/src/net/c.rs"],
        vec!["/w/app/src/b.rs", "/w/app/src/net/d.rs", "/w/app/docs/e.md"],
        vec!["/w/app/a.rs"],
    ];
    for round in rounds {
        let candidates = round.into_iter().map(FileCandidate::new).collect();
        tree.build_tree(project, candidates, None, &mut obs());
        assert_tree_consistent(&tree, tree.root());
    }
    assert!(tree.find_file_node(project, Path::new("/w/app/a.rs")).is_some());
    assert_eq!(tree.folder_node_at(project, Path::new("/w/app/src")), None);
}
