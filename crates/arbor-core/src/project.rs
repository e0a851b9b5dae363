//! Project capability extension point.

use std::path::{Path, PathBuf};

/// Actions a UI collaborator may offer on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectAction {
    AddNewFile,
    AddExistingFile,
    RemoveFile,
    DeleteFile,
    Rename,
    AddSubProject,
    RemoveSubProject,
    /// Marker appended whenever an action list was inherited from the
    /// parent rather than declared locally.
    InheritedFromParent,
}

/// Mutation hooks a concrete project kind can implement.
///
/// Every method has a default that encodes "unsupported": callers probe
/// capability through the returned bool, so failure here is soft rather
/// than an error path. A concrete project kind overrides the subset it
/// actually supports and is responsible for persisting its own file
/// list. Note the intentional asymmetry: `can_rename_file` defaults to
/// true while `rename_file` itself defaults to false.
pub trait ProjectOps {
    fn supported_actions(&self) -> Vec<ProjectAction> {
        Vec::new()
    }

    fn can_add_sub_project(&self, _project_file: &Path) -> bool {
        false
    }

    fn add_sub_projects(&mut self, _project_files: &[PathBuf]) -> bool {
        false
    }

    fn remove_sub_projects(&mut self, _project_files: &[PathBuf]) -> bool {
        false
    }

    fn add_files(&mut self, _paths: &[PathBuf], _not_added: Option<&mut Vec<PathBuf>>) -> bool {
        false
    }

    fn remove_files(&mut self, _paths: &[PathBuf], _not_removed: Option<&mut Vec<PathBuf>>) -> bool {
        false
    }

    fn delete_files(&mut self, _paths: &[PathBuf]) -> bool {
        false
    }

    fn can_rename_file(&self, _path: &Path, _new_path: &Path) -> bool {
        true
    }

    fn rename_file(&mut self, _path: &Path, _new_path: &Path) -> bool {
        false
    }
}

/// The all-defaults implementation used when a project kind declares no
/// capabilities of its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultProjectOps;

impl ProjectOps for DefaultProjectOps {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_refuse_everything_but_rename_probe() {
        let mut ops = DefaultProjectOps;
        let paths = [PathBuf::from("/p/a.rs")];

        assert!(!ops.can_add_sub_project(Path::new("/p/sub/Cargo.toml")));
        assert!(!ops.add_sub_projects(&paths));
        assert!(!ops.remove_sub_projects(&paths));
        assert!(!ops.add_files(&paths, None));
        assert!(!ops.remove_files(&paths, None));
        assert!(!ops.delete_files(&paths));
        assert!(!ops.rename_file(Path::new("/p/a.rs"), Path::new("/p/b.rs")));
        assert!(ops.supported_actions().is_empty());

        // The probe succeeds even though the rename itself is unsupported.
        assert!(ops.can_rename_file(Path::new("/p/a.rs"), Path::new("/p/b.rs")));
    }
}
