//! Core types and algorithms for arbor.
//!
//! This crate provides the in-memory project node tree: file, folder,
//! virtual-folder, project, and session nodes held in an arena, with
//! sorted sibling order, diff-based reconciliation against fresh scans,
//! keep-set pruning, and pre-order visitation. Mutations emit paired
//! before/after notifications through an injected [`TreeObserver`].

mod config;
mod error;
mod node;
mod observer;
mod project;
mod reconcile;
mod tree;
mod trim;
mod vcs;
mod visitor;

pub use config::{DEFAULT_PROGRESS_RANGE, ScanOptions, ScanOptionsBuilder};
pub use error::{ScanError, ScanWarning, WarningKind};
pub use node::{
    DEFAULT_FILE_PRIORITY, DEFAULT_FOLDER_PRIORITY, DEFAULT_PROJECT_FILE_PRIORITY,
    DEFAULT_PROJECT_PRIORITY, FileCandidate, FileData, FileKind, FolderData, Node, NodeData,
    NodeId, NodeKind, ProjectData, SessionData, SortKey,
};
pub use observer::{NullObserver, RecordingObserver, TreeEvent, TreeObserver};
pub use project::{DefaultProjectOps, ProjectAction, ProjectOps};
pub use tree::NodeTree;
pub use trim::TrimResult;
pub use vcs::{VcsController, VcsLookup};
pub use visitor::NodesVisitor;
