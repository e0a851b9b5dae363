//! Version-control collaborator interface.
//!
//! The tree and the scanner only need two things from a VCS: "is this
//! entry internal bookkeeping I should skip" and "what topic is this
//! directory on". Concrete backends live elsewhere (see the git
//! implementation crate).

use std::path::Path;

/// Resolves a directory to the version-control system managing it.
pub trait VcsLookup {
    /// Controller for the system managing `directory`, if any.
    fn find_controller(&self, directory: &Path) -> Option<Box<dyn VcsController + '_>>;
}

/// Operations on one version-controlled directory tree.
pub trait VcsController {
    /// Whether `path` is internal VCS metadata rather than working-tree
    /// content.
    fn is_vcs_metadata(&self, path: &Path) -> bool;

    /// Current topic (branch or equivalent) for `directory`; empty when
    /// it cannot be determined.
    fn topic(&self, directory: &Path) -> String;
}
