//! Recursive directory scanner producing detached file candidates.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use arbor_core::{
    FileCandidate, ScanError, ScanOptions, ScanWarning, VcsLookup,
};

use crate::progress::{ProgressGauge, ScanProgress};

/// Result of a scan. A cancelled scan is a partial success, never an
/// error: `files` holds what was gathered before the stop.
#[derive(Debug)]
pub struct ScanOutcome {
    /// Detached candidates for the files found.
    pub files: Vec<FileCandidate>,
    /// Non-fatal problems encountered along the way.
    pub warnings: Vec<ScanWarning>,
    /// True when the scan stopped early on cancellation.
    pub cancelled: bool,
}

/// Depth-first scanner with broadcast progress and cooperative
/// cancellation.
///
/// The scanner never touches a live node tree: it yields detached
/// [`FileCandidate`] values for the tree's reconciliation to absorb.
pub struct TreeScanner {
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl TreeScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self { progress_tx }
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Scan the options' root directory.
    ///
    /// Progress covers the fixed range `[0, options.progress_range]`,
    /// apportioned to each subtree by its share of entries at the parent
    /// level. Cancellation is checked before every entry; entries the
    /// injected VCS collaborator classifies as internal metadata are
    /// skipped, as is any directory whose canonical path was already
    /// visited (symlink loops). The factory turns each discovered file
    /// path into a candidate.
    pub fn scan<F>(
        &self,
        options: &ScanOptions,
        cancel: &CancellationToken,
        vcs: Option<&dyn VcsLookup>,
        factory: F,
    ) -> Result<ScanOutcome, ScanError>
    where
        F: Fn(&Path) -> FileCandidate,
    {
        let root = options
            .root
            .canonicalize()
            .map_err(|e| ScanError::io(&options.root, e))?;
        if !root.is_dir() {
            return Err(ScanError::NotADirectory { path: root });
        }
        let ignore = options.build_ignore_set()?;
        tracing::debug!(root = %root.display(), "starting scan");

        let mut walk = Walk {
            ignore,
            cancel,
            vcs,
            factory,
            gauge: ProgressGauge::new(&self.progress_tx, options.progress_range),
            visited: HashSet::from([root.clone()]),
            files: Vec::new(),
            warnings: Vec::new(),
            cancelled: false,
        };
        walk.descend(&root, options.progress_range as f64);
        if !walk.cancelled {
            walk.gauge.finish();
        }

        tracing::debug!(
            files = walk.files.len(),
            warnings = walk.warnings.len(),
            cancelled = walk.cancelled,
            "scan finished"
        );
        Ok(ScanOutcome {
            files: walk.files,
            warnings: walk.warnings,
            cancelled: walk.cancelled,
        })
    }
}

impl Default for TreeScanner {
    fn default() -> Self {
        Self::new()
    }
}

struct Walk<'a, F> {
    ignore: globset::GlobSet,
    cancel: &'a CancellationToken,
    vcs: Option<&'a dyn VcsLookup>,
    factory: F,
    gauge: ProgressGauge<'a>,
    visited: HashSet<PathBuf>,
    files: Vec<FileCandidate>,
    warnings: Vec<ScanWarning>,
    cancelled: bool,
}

impl<F> Walk<'_, F>
where
    F: Fn(&Path) -> FileCandidate,
{
    /// Walk one directory, spending at most `budget` progress units on
    /// its subtree.
    fn descend(&mut self, dir: &Path, budget: f64) {
        let entries = match std::fs::read_dir(dir) {
            Ok(iter) => {
                let mut entries: Vec<_> = iter.filter_map(Result::ok).collect();
                entries.sort_by_key(|e| e.file_name());
                entries
            }
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
                self.warnings.push(ScanWarning::read_error(dir, &e));
                self.gauge.add(budget);
                return;
            }
        };
        if entries.is_empty() {
            self.gauge.add(budget);
            return;
        }
        let share = budget / entries.len() as f64;
        let controller = self.vcs.and_then(|v| v.find_controller(dir));

        for entry in entries {
            if self.cancel.is_cancelled() {
                self.cancelled = true;
                return;
            }
            let path = entry.path();
            let name = entry.file_name();
            if self.ignore.is_match(Path::new(&name))
                || controller
                    .as_ref()
                    .is_some_and(|c| c.is_vcs_metadata(&path))
            {
                self.gauge.add(share);
                continue;
            }
            let metadata = match std::fs::metadata(&path) {
                Ok(m) => m,
                Err(e) => {
                    self.warnings.push(ScanWarning::read_error(&path, &e));
                    self.gauge.add(share);
                    continue;
                }
            };
            if metadata.is_dir() {
                match path.canonicalize() {
                    Ok(canonical) => {
                        if self.visited.insert(canonical) {
                            self.descend(&path, share);
                            if self.cancelled {
                                return;
                            }
                        } else {
                            // Already walked through another link.
                            self.gauge.add(share);
                        }
                    }
                    Err(e) => {
                        self.warnings.push(ScanWarning::canonicalize_error(&path, &e));
                        self.gauge.add(share);
                    }
                }
            } else {
                self.files.push((self.factory)(&path));
                self.gauge.add(share);
            }
        }
    }
}
