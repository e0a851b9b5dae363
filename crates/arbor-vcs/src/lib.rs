//! Git implementation of arbor's version-control collaborator.
//!
//! [`GitVcs`] resolves directories to the git repository managing them
//! via `git2`'s discovery walk, caching work-tree roots so repeated
//! lookups during a scan stay cheap.

use std::path::{Path, PathBuf};

use dashmap::DashMap;
use git2::Repository;

use arbor_core::{VcsController, VcsLookup};

/// Directory-to-repository resolver backed by `git2`.
pub struct GitVcs {
    // directory -> discovered work-tree root (None caches the miss)
    roots: DashMap<PathBuf, Option<PathBuf>>,
}

impl GitVcs {
    /// Create a resolver with an empty discovery cache.
    pub fn new() -> Self {
        Self {
            roots: DashMap::new(),
        }
    }

    fn workdir_root(&self, directory: &Path) -> Option<PathBuf> {
        if let Some(cached) = self.roots.get(directory) {
            return cached.clone();
        }
        let root = Repository::discover(directory)
            .ok()
            .and_then(|repo| repo.workdir().map(Path::to_path_buf));
        match &root {
            Some(found) => {
                tracing::debug!(dir = %directory.display(), root = %found.display(), "discovered git work tree")
            }
            None => tracing::debug!(dir = %directory.display(), "no git repository"),
        }
        self.roots.insert(directory.to_path_buf(), root.clone());
        root
    }
}

impl Default for GitVcs {
    fn default() -> Self {
        Self::new()
    }
}

impl VcsLookup for GitVcs {
    fn find_controller(&self, directory: &Path) -> Option<Box<dyn VcsController + '_>> {
        let root = self.workdir_root(directory)?;
        Some(Box::new(GitController { root }))
    }
}

/// Controller for one discovered git work tree.
pub struct GitController {
    root: PathBuf,
}

impl GitController {
    /// Root of the work tree this controller manages.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl VcsController for GitController {
    fn is_vcs_metadata(&self, path: &Path) -> bool {
        path.components().any(|c| c.as_os_str() == ".git")
    }

    fn topic(&self, directory: &Path) -> String {
        Repository::discover(directory)
            .ok()
            .and_then(|repo| {
                repo.head()
                    .ok()
                    .and_then(|head| head.shorthand().map(str::to_owned))
            })
            .unwrap_or_default()
    }
}
