//! Filesystem scanning engine for arbor.
//!
//! This crate walks a directory tree and produces detached
//! [`FileCandidate`] values for the core tree's reconciliation to
//! absorb. Key properties:
//!
//! - **Loop safe**: canonicalized directory paths are tracked in a
//!   visited set, so symlink cycles terminate.
//! - **Progress updates** via broadcast channels, monotonic over a
//!   fixed range established before the walk starts.
//! - **Cooperative cancellation** between directory entries; a
//!   cancelled scan yields the partial result gathered so far.
//! - **VCS aware**: entries an injected [`VcsLookup`] classifies as
//!   internal metadata are skipped.
//!
//! # Example
//!
//! ```rust,no_run
//! use arbor_scan::{FileCandidate, ScanOptions, TreeScanner};
//! use tokio_util::sync::CancellationToken;
//!
//! let scanner = TreeScanner::new();
//! let options = ScanOptions::new("/path/to/project");
//! let outcome = scanner
//!     .scan(&options, &CancellationToken::new(), None, |p| FileCandidate::new(p))
//!     .unwrap();
//!
//! println!("Found {} files", outcome.files.len());
//! ```

mod progress;
mod scanner;

pub use progress::ScanProgress;
pub use scanner::{ScanOutcome, TreeScanner};

// Re-export core types for convenience
pub use arbor_core::{
    FileCandidate, FileKind, ScanError, ScanOptions, ScanWarning, VcsController, VcsLookup,
    WarningKind,
};
