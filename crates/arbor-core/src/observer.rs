//! Structural change notifications.
//!
//! Every tree mutation emits exactly one about-to/done pair bracketing
//! the change; batched operations emit one pair for the whole batch.
//! The observer is injected per mutating call rather than reached
//! through a process-wide singleton, so trees are testable without a
//! live UI. Re-entering the mutation API from a callback is unsupported.

use crate::node::NodeId;

/// Sink for structural change events.
///
/// The "about to" callback observes the pre-mutation tree, the paired
/// "done" callback the post-mutation tree.
pub trait TreeObserver {
    fn files_about_to_be_added(&mut self, _folder: NodeId, _files: &[NodeId]) {}
    fn files_added(&mut self, _folder: NodeId, _files: &[NodeId]) {}
    fn files_about_to_be_removed(&mut self, _folder: NodeId, _files: &[NodeId]) {}
    fn files_removed(&mut self, _folder: NodeId, _files: &[NodeId]) {}
    fn folders_about_to_be_added(&mut self, _folder: NodeId, _subfolders: &[NodeId]) {}
    fn folders_added(&mut self, _folder: NodeId, _subfolders: &[NodeId]) {}
    fn folders_about_to_be_removed(&mut self, _folder: NodeId, _subfolders: &[NodeId]) {}
    fn folders_removed(&mut self, _folder: NodeId, _subfolders: &[NodeId]) {}
    fn node_sort_key_about_to_change(&mut self, _node: NodeId) {}
    fn node_sort_key_changed(&mut self, _node: NodeId) {}
    fn node_updated(&mut self, _node: NodeId) {}
}

/// Observer that ignores every event; the default for callers that do
/// not track structure.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl TreeObserver for NullObserver {}

/// A recorded structural change event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
    FilesAboutToBeAdded { folder: NodeId, files: Vec<NodeId> },
    FilesAdded { folder: NodeId, files: Vec<NodeId> },
    FilesAboutToBeRemoved { folder: NodeId, files: Vec<NodeId> },
    FilesRemoved { folder: NodeId, files: Vec<NodeId> },
    FoldersAboutToBeAdded { folder: NodeId, subfolders: Vec<NodeId> },
    FoldersAdded { folder: NodeId, subfolders: Vec<NodeId> },
    FoldersAboutToBeRemoved { folder: NodeId, subfolders: Vec<NodeId> },
    FoldersRemoved { folder: NodeId, subfolders: Vec<NodeId> },
    SortKeyAboutToChange(NodeId),
    SortKeyChanged(NodeId),
    NodeUpdated(NodeId),
}

/// Observer that keeps an ordered log of every event it sees.
///
/// Used by the test suites to pin notification pairing, and handy for
/// diagnosing reconciliation traffic.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub events: Vec<TreeEvent>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Number of recorded events matching a predicate.
    pub fn count(&self, pred: impl Fn(&TreeEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl TreeObserver for RecordingObserver {
    fn files_about_to_be_added(&mut self, folder: NodeId, files: &[NodeId]) {
        self.events.push(TreeEvent::FilesAboutToBeAdded {
            folder,
            files: files.to_vec(),
        });
    }

    fn files_added(&mut self, folder: NodeId, files: &[NodeId]) {
        self.events.push(TreeEvent::FilesAdded {
            folder,
            files: files.to_vec(),
        });
    }

    fn files_about_to_be_removed(&mut self, folder: NodeId, files: &[NodeId]) {
        self.events.push(TreeEvent::FilesAboutToBeRemoved {
            folder,
            files: files.to_vec(),
        });
    }

    fn files_removed(&mut self, folder: NodeId, files: &[NodeId]) {
        self.events.push(TreeEvent::FilesRemoved {
            folder,
            files: files.to_vec(),
        });
    }

    fn folders_about_to_be_added(&mut self, folder: NodeId, subfolders: &[NodeId]) {
        self.events.push(TreeEvent::FoldersAboutToBeAdded {
            folder,
            subfolders: subfolders.to_vec(),
        });
    }

    fn folders_added(&mut self, folder: NodeId, subfolders: &[NodeId]) {
        self.events.push(TreeEvent::FoldersAdded {
            folder,
            subfolders: subfolders.to_vec(),
        });
    }

    fn folders_about_to_be_removed(&mut self, folder: NodeId, subfolders: &[NodeId]) {
        self.events.push(TreeEvent::FoldersAboutToBeRemoved {
            folder,
            subfolders: subfolders.to_vec(),
        });
    }

    fn folders_removed(&mut self, folder: NodeId, subfolders: &[NodeId]) {
        self.events.push(TreeEvent::FoldersRemoved {
            folder,
            subfolders: subfolders.to_vec(),
        });
    }

    fn node_sort_key_about_to_change(&mut self, node: NodeId) {
        self.events.push(TreeEvent::SortKeyAboutToChange(node));
    }

    fn node_sort_key_changed(&mut self, node: NodeId) {
        self.events.push(TreeEvent::SortKeyChanged(node));
    }

    fn node_updated(&mut self, node: NodeId) {
        self.events.push(TreeEvent::NodeUpdated(node));
    }
}
