//! Node identity, variants, and sort keys.

use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::project::ProjectOps;

/// Unique identifier for a node within a tree. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Create a new NodeId from a u64.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Default sort weight for ordinary files.
pub const DEFAULT_FILE_PRIORITY: i32 = 100_000;
/// Default sort weight for project descriptor files, so they sort ahead
/// of ordinary files among siblings.
pub const DEFAULT_PROJECT_FILE_PRIORITY: i32 = 500_000;
/// Default sort weight for on-disk folders.
pub const DEFAULT_FOLDER_PRIORITY: i32 = 30;
/// Default sort weight for project nodes, ahead of plain folders.
pub const DEFAULT_PROJECT_PRIORITY: i32 = 100;

/// Discriminant over the closed set of node variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum NodeKind {
    /// Leaf file node.
    File,
    /// On-disk folder.
    Folder,
    /// Grouping folder with no on-disk correspondence.
    VirtualFolder,
    /// Project node, owning a distinguished sub-project list.
    Project,
    /// The tree root, owning top-level projects.
    Session,
}

/// Classification of a file node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum FileKind {
    /// Source code.
    Source,
    /// Header / interface file.
    Header,
    /// Asset consumed at build or run time.
    Resource,
    /// Build-system project descriptor.
    ProjectDescriptor,
    /// Anything else.
    Unknown,
}

impl FileKind {
    /// Classify a path by its file name and extension.
    pub fn classify(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match name.as_str() {
            "cargo.toml" | "cmakelists.txt" | "meson.build" | "makefile" | "package.json" => {
                return FileKind::ProjectDescriptor;
            }
            _ => {}
        }
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "rs" | "c" | "cc" | "cpp" | "cxx" | "go" | "py" | "js" | "ts" => FileKind::Source,
            "h" | "hh" | "hpp" | "hxx" | "pyi" => FileKind::Header,
            "png" | "svg" | "ico" | "qrc" | "css" | "ttf" | "wav" => FileKind::Resource,
            "pro" | "pri" | "cbp" | "vcxproj" => FileKind::ProjectDescriptor,
            _ => FileKind::Unknown,
        }
    }

    /// Default sibling sort weight for a file of this kind.
    pub fn default_priority(self) -> i32 {
        match self {
            FileKind::ProjectDescriptor => DEFAULT_PROJECT_FILE_PRIORITY,
            _ => DEFAULT_FILE_PRIORITY,
        }
    }
}

/// A detached file produced by a scan, not yet owned by any tree.
///
/// `NodeTree::build_tree` reconciles a batch of candidates against the
/// live subtree; candidates whose paths are already present are simply
/// dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCandidate {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Classification, usually via [`FileKind::classify`].
    pub kind: FileKind,
    /// Whether the file is produced by a build step rather than authored.
    pub generated: bool,
}

impl FileCandidate {
    /// Candidate with the kind inferred from the path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = FileKind::classify(&path);
        Self {
            path,
            kind,
            generated: false,
        }
    }

    /// Candidate with an explicit kind.
    pub fn with_kind(path: impl Into<PathBuf>, kind: FileKind) -> Self {
        Self {
            path: path.into(),
            kind,
            generated: false,
        }
    }
}

/// Payload of a file node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileData {
    /// Classification of the file.
    pub kind: FileKind,
    /// True if produced by a build step.
    pub generated: bool,
}

/// Payload shared by all composite nodes: ordered file and folder children.
///
/// Both child lists stay sorted by [`SortKey`] at all times; every element's
/// parent link points back at the owning node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderData {
    pub(crate) display_name: CompactString,
    pub(crate) files: Vec<NodeId>,
    pub(crate) folders: Vec<NodeId>,
}

impl FolderData {
    pub(crate) fn named(display_name: impl Into<CompactString>) -> Self {
        Self {
            display_name: display_name.into(),
            files: Vec::new(),
            folders: Vec::new(),
        }
    }
}

/// Payload of a project node. `projects` is a subset view of the inherited
/// folder children, mutated in lockstep with it.
pub struct ProjectData {
    pub(crate) folder: FolderData,
    pub(crate) projects: Vec<NodeId>,
    pub(crate) ops: Box<dyn ProjectOps>,
}

impl fmt::Debug for ProjectData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectData")
            .field("folder", &self.folder)
            .field("projects", &self.projects)
            .finish_non_exhaustive()
    }
}

/// Payload of the session root, mirroring [`ProjectData`]'s lockstep
/// project list without the capability extension point.
#[derive(Debug, Default)]
pub struct SessionData {
    pub(crate) folder: FolderData,
    pub(crate) projects: Vec<NodeId>,
}

/// Per-variant payload of a node.
#[derive(Debug)]
pub enum NodeData {
    File(FileData),
    Folder(FolderData),
    VirtualFolder(FolderData),
    Project(ProjectData),
    Session(SessionData),
}

impl NodeData {
    /// The bare discriminant.
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::File(_) => NodeKind::File,
            NodeData::Folder(_) => NodeKind::Folder,
            NodeData::VirtualFolder(_) => NodeKind::VirtualFolder,
            NodeData::Project(_) => NodeKind::Project,
            NodeData::Session(_) => NodeKind::Session,
        }
    }

    pub(crate) fn folder_data(&self) -> Option<&FolderData> {
        match self {
            NodeData::File(_) => None,
            NodeData::Folder(f) | NodeData::VirtualFolder(f) => Some(f),
            NodeData::Project(p) => Some(&p.folder),
            NodeData::Session(s) => Some(&s.folder),
        }
    }

    pub(crate) fn folder_data_mut(&mut self) -> Option<&mut FolderData> {
        match self {
            NodeData::File(_) => None,
            NodeData::Folder(f) | NodeData::VirtualFolder(f) => Some(f),
            NodeData::Project(p) => Some(&mut p.folder),
            NodeData::Session(s) => Some(&mut s.folder),
        }
    }

    pub(crate) fn projects(&self) -> Option<&Vec<NodeId>> {
        match self {
            NodeData::Project(p) => Some(&p.projects),
            NodeData::Session(s) => Some(&s.projects),
            _ => None,
        }
    }

    pub(crate) fn projects_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            NodeData::Project(p) => Some(&mut p.projects),
            NodeData::Session(s) => Some(&mut s.projects),
            _ => None,
        }
    }
}

/// A single node of the project tree.
///
/// Nodes live in a [`crate::NodeTree`] arena; the parent link is a
/// non-owning back-reference, ownership runs strictly parent to child
/// through the sorted child-id lists.
#[derive(Debug)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) path: PathBuf,
    pub(crate) line: Option<u32>,
    pub(crate) priority: i32,
    pub(crate) enabled: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) data: NodeData,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Path of the file or directory this node represents.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Source line, when the node points into a file.
    pub fn line(&self) -> Option<u32> {
        self.line
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    /// Sibling sort weight; higher sorts earlier.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// This node's own enable flag, ignoring ancestors.
    /// Use [`crate::NodeTree::is_enabled`] for the inherited state.
    pub fn enabled_flag(&self) -> bool {
        self.enabled
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn file_data(&self) -> Option<&FileData> {
        match &self.data {
            NodeData::File(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self.data, NodeData::File(_))
    }

    pub fn is_project(&self) -> bool {
        matches!(self.data, NodeData::Project(_))
    }

    pub fn is_session(&self) -> bool {
        matches!(self.data, NodeData::Session(_))
    }

    /// Whether this node carries folder machinery (any non-file variant).
    pub fn is_folder_like(&self) -> bool {
        self.data.folder_data().is_some()
    }

    /// Name shown in a view: the folder display name when one is set,
    /// otherwise the last path segment.
    pub fn display_name(&self) -> CompactString {
        if let Some(folder) = self.data.folder_data() {
            if !folder.display_name.is_empty() {
                return folder.display_name.clone();
            }
        }
        self.path
            .file_name()
            .map(|n| CompactString::new(n.to_string_lossy()))
            .unwrap_or_else(|| CompactString::new(self.path.to_string_lossy()))
    }

    /// Owned snapshot of the sibling-order key.
    pub fn sort_key(&self) -> SortKey {
        SortKey {
            priority: self.priority,
            rank: match self.kind() {
                NodeKind::VirtualFolder => 0,
                _ => 1,
            },
            path: self.path.clone(),
            name: self.display_name(),
        }
    }
}

/// Total sibling order: priority descending, virtual folders ahead of
/// real ones, then path, then display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    priority: i32,
    rank: u8,
    path: PathBuf,
    name: CompactString,
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| self.rank.cmp(&other.rank))
            .then_with(|| self.path.cmp(&other.path))
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_node(path: &str, priority: i32) -> Node {
        Node {
            id: NodeId::new(0),
            path: PathBuf::from(path),
            line: None,
            priority,
            enabled: true,
            parent: None,
            data: NodeData::File(FileData {
                kind: FileKind::classify(Path::new(path)),
                generated: false,
            }),
        }
    }

    #[test]
    fn classify_by_extension() {
        assert_eq!(FileKind::classify(Path::new("/p/main.rs")), FileKind::Source);
        assert_eq!(FileKind::classify(Path::new("/p/util.hpp")), FileKind::Header);
        assert_eq!(FileKind::classify(Path::new("/p/logo.svg")), FileKind::Resource);
        assert_eq!(
            FileKind::classify(Path::new("/p/Cargo.toml")),
            FileKind::ProjectDescriptor
        );
        assert_eq!(FileKind::classify(Path::new("/p/notes.txt")), FileKind::Unknown);
    }

    #[test]
    fn project_descriptors_outrank_plain_files() {
        assert!(
            FileKind::ProjectDescriptor.default_priority() > FileKind::Source.default_priority()
        );
    }

    #[test]
    fn sort_key_orders_by_priority_then_path() {
        let high = file_node("/p/z.rs", 200).sort_key();
        let low_a = file_node("/p/a.rs", 100).sort_key();
        let low_b = file_node("/p/b.rs", 100).sort_key();

        // Higher priority sorts first even with a later path.
        assert!(high < low_a);
        assert!(low_a < low_b);
    }

    #[test]
    fn virtual_folders_sort_before_real_at_equal_priority() {
        let virt = Node {
            id: NodeId::new(1),
            path: PathBuf::from("/p/src"),
            line: None,
            priority: 30,
            enabled: true,
            parent: None,
            data: NodeData::VirtualFolder(FolderData::named("Sources")),
        };
        let real = Node {
            id: NodeId::new(2),
            path: PathBuf::from("/p/src"),
            line: None,
            priority: 30,
            enabled: true,
            parent: None,
            data: NodeData::Folder(FolderData::named("src")),
        };
        assert!(virt.sort_key() < real.sort_key());
    }

    #[test]
    fn display_name_falls_back_to_last_segment() {
        let node = file_node("/work/proj/lib.rs", DEFAULT_FILE_PRIORITY);
        assert_eq!(node.display_name().as_str(), "lib.rs");
    }
}
