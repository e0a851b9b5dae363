//! The node tree arena and its mutation operations.

use std::collections::HashMap;
use std::mem;
use std::path::{Component, Path, PathBuf};

use compact_str::CompactString;

use crate::node::{
    DEFAULT_FOLDER_PRIORITY, DEFAULT_PROJECT_PRIORITY, FileCandidate, FileData, FolderData, Node,
    NodeData, NodeId, NodeKind, ProjectData, SessionData, SortKey,
};
use crate::observer::TreeObserver;
use crate::project::{DefaultProjectOps, ProjectAction, ProjectOps};
use crate::vcs::VcsLookup;

/// The mutable project node tree.
///
/// Nodes are arena-allocated and addressed by [`NodeId`]; the session
/// root is created with the tree. All mutation goes through methods on
/// this type and must happen from a single logical owner thread — the
/// tree performs no internal locking.
///
/// Contract violations (adding an already-parented node, removing a node
/// from a folder that does not contain it, routing project nodes through
/// the plain folder paths) are programming errors and panic.
pub struct NodeTree {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    next_id: u64,
}

impl NodeTree {
    /// Create a tree holding only the session root.
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: HashMap::new(),
            root: NodeId::new(0),
            next_id: 0,
        };
        let root = tree.alloc(
            PathBuf::from("session"),
            None,
            0,
            NodeData::Session(SessionData::default()),
        );
        tree.root = root;
        tree
    }

    fn alloc(&mut self, path: PathBuf, line: Option<u32>, priority: i32, data: NodeData) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                id,
                path,
                line,
                priority,
                enabled: true,
                parent: None,
                data,
            },
        );
        id
    }

    /// The session root.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, including the root.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Borrow a node. Panics on a stale or foreign id.
    pub fn node(&self, id: NodeId) -> &Node {
        self.nodes.get(&id).expect("stale node id")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes.get_mut(&id).expect("stale node id")
    }

    fn folder_data_of(&self, id: NodeId) -> &FolderData {
        self.node(id)
            .data
            .folder_data()
            .expect("node is not a folder")
    }

    fn folder_data_mut_of(&mut self, id: NodeId) -> &mut FolderData {
        self.node_mut(id)
            .data
            .folder_data_mut()
            .expect("node is not a folder")
    }

    pub(crate) fn sort_key_of(&self, id: NodeId) -> SortKey {
        self.node(id).sort_key()
    }

    // ---- constructors -----------------------------------------------------

    /// Create a detached file node. Attach it with [`Self::add_file_nodes`].
    pub fn new_file_node(
        &mut self,
        path: impl Into<PathBuf>,
        kind: crate::node::FileKind,
        generated: bool,
        line: Option<u32>,
    ) -> NodeId {
        self.alloc(
            path.into(),
            line,
            kind.default_priority(),
            NodeData::File(FileData { kind, generated }),
        )
    }

    /// Materialize a scanned candidate as a detached file node.
    pub fn file_node_from(&mut self, candidate: FileCandidate) -> NodeId {
        self.new_file_node(candidate.path, candidate.kind, candidate.generated, None)
    }

    /// Create a detached folder node. The display name defaults to the
    /// last path segment.
    pub fn new_folder_node(
        &mut self,
        path: impl Into<PathBuf>,
        display_name: Option<&str>,
    ) -> NodeId {
        let path = path.into();
        let display = display_name
            .map(CompactString::new)
            .unwrap_or_default();
        self.alloc(
            path,
            None,
            DEFAULT_FOLDER_PRIORITY,
            NodeData::Folder(FolderData::named(display)),
        )
    }

    /// Create a detached virtual folder with an explicit priority.
    pub fn new_virtual_folder_node(&mut self, path: impl Into<PathBuf>, priority: i32) -> NodeId {
        self.alloc(
            path.into(),
            None,
            priority,
            NodeData::VirtualFolder(FolderData::default()),
        )
    }

    /// Create a detached project node with default (all-refusing) ops.
    pub fn new_project_node(&mut self, project_file_path: impl Into<PathBuf>) -> NodeId {
        self.new_project_node_with_ops(project_file_path, Box::new(DefaultProjectOps))
    }

    /// Create a detached project node with a concrete capability impl.
    pub fn new_project_node_with_ops(
        &mut self,
        project_file_path: impl Into<PathBuf>,
        ops: Box<dyn ProjectOps>,
    ) -> NodeId {
        let path = project_file_path.into();
        let display = path
            .file_name()
            .map(|n| CompactString::new(n.to_string_lossy()))
            .unwrap_or_default();
        self.alloc(
            path,
            None,
            DEFAULT_PROJECT_PRIORITY,
            NodeData::Project(ProjectData {
                folder: FolderData::named(display),
                projects: Vec::new(),
                ops,
            }),
        )
    }

    /// Replace the capability impl of a project node.
    pub fn set_project_ops(&mut self, id: NodeId, ops: Box<dyn ProjectOps>) {
        match &mut self.node_mut(id).data {
            NodeData::Project(p) => p.ops = ops,
            _ => panic!("node is not a project"),
        }
    }

    // ---- upward queries ---------------------------------------------------

    /// Effective enabled state: a node is enabled only if itself and all
    /// ancestors are enabled.
    pub fn is_enabled(&self, id: NodeId) -> bool {
        let node = self.node(id);
        if !node.enabled {
            return false;
        }
        match node.parent {
            Some(parent) => self.is_enabled(parent),
            None => true,
        }
    }

    pub fn parent_folder(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// First ancestor of Project variant, if any.
    pub fn parent_project(&self, id: NodeId) -> Option<NodeId> {
        let mut cur = self.node(id).parent;
        while let Some(p) = cur {
            if self.node(p).is_project() {
                return Some(p);
            }
            cur = self.node(p).parent;
        }
        None
    }

    /// The project that owns and manages this node: the session has
    /// none, a project without an enclosing project manages itself.
    pub fn managing_project(&self, id: NodeId) -> Option<NodeId> {
        if self.node(id).is_session() {
            return None;
        }
        self.parent_project(id)
            .or_else(|| self.node(id).is_project().then_some(id))
    }

    /// Actions available on a node. Inherited lists are tagged with
    /// [`ProjectAction::InheritedFromParent`] so the UI can grey them out.
    pub fn supported_actions(&self, id: NodeId) -> Vec<ProjectAction> {
        match &self.node(id).data {
            NodeData::Session(_) => Vec::new(),
            NodeData::Project(p) => p.ops.supported_actions(),
            _ => match self.node(id).parent {
                Some(parent) => {
                    let mut actions = self.supported_actions(parent);
                    actions.push(ProjectAction::InheritedFromParent);
                    actions
                }
                None => Vec::new(),
            },
        }
    }

    // ---- simple mutators --------------------------------------------------

    /// Set the node's own enable flag; emits `node_updated` when the
    /// value actually changes and the node is attached.
    pub fn set_enabled(&mut self, id: NodeId, enabled: bool, observer: &mut dyn TreeObserver) {
        if self.node(id).enabled == enabled {
            return;
        }
        self.node_mut(id).enabled = enabled;
        if self.node(id).parent.is_some() {
            observer.node_updated(id);
        }
    }

    /// Change the sibling sort weight. Must be called before the node is
    /// inserted anywhere; sibling lists are not re-sorted.
    pub fn set_priority(&mut self, id: NodeId, priority: i32) {
        assert!(
            self.node(id).parent.is_none(),
            "priority can only be changed on detached nodes"
        );
        self.node_mut(id).priority = priority;
    }

    /// Re-point the node at a new path and line. Identity key material
    /// changes, so the sort-key pair brackets the mutation and siblings
    /// are re-indexed in between.
    pub fn set_path_and_line(
        &mut self,
        id: NodeId,
        path: impl Into<PathBuf>,
        line: Option<u32>,
        observer: &mut dyn TreeObserver,
    ) {
        let path = path.into();
        let node = self.node(id);
        if node.path == path && node.line == line {
            return;
        }
        let attached = node.parent.is_some();
        if attached {
            observer.node_sort_key_about_to_change(id);
        }
        let node = self.node_mut(id);
        node.path = path;
        node.line = line;
        self.reposition_among_siblings(id);
        if attached {
            observer.node_sort_key_changed(id);
            observer.node_updated(id);
        }
    }

    /// Rename a folder-like node's display name, re-indexing siblings
    /// between the sort-key pair.
    pub fn set_display_name(
        &mut self,
        id: NodeId,
        name: impl Into<CompactString>,
        observer: &mut dyn TreeObserver,
    ) {
        let name = name.into();
        if self.folder_data_of(id).display_name == name {
            return;
        }
        let attached = self.node(id).parent.is_some();
        if attached {
            observer.node_sort_key_about_to_change(id);
        }
        self.folder_data_mut_of(id).display_name = name;
        self.reposition_among_siblings(id);
        if attached {
            observer.node_sort_key_changed(id);
            observer.node_updated(id);
        }
    }

    /// Root-scope hook surfacing a project rename as a sort-key change.
    pub fn project_display_name_changed(&mut self, id: NodeId, observer: &mut dyn TreeObserver) {
        observer.node_sort_key_about_to_change(id);
        self.reposition_among_siblings(id);
        observer.node_sort_key_changed(id);
    }

    fn reposition_among_siblings(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).parent else {
            return;
        };
        if self.node(id).is_file() {
            let mut list = mem::take(&mut self.folder_data_mut_of(parent).files);
            list.retain(|&n| n != id);
            self.insert_sorted(&mut list, id);
            self.folder_data_mut_of(parent).files = list;
        } else {
            let mut list = mem::take(&mut self.folder_data_mut_of(parent).folders);
            list.retain(|&n| n != id);
            self.insert_sorted(&mut list, id);
            self.folder_data_mut_of(parent).folders = list;
            if self.node(id).is_project() {
                if let Some(projects) = self.node_mut(parent).data.projects_mut() {
                    let mut list = mem::take(projects);
                    list.retain(|&n| n != id);
                    self.insert_sorted(&mut list, id);
                    *self
                        .node_mut(parent)
                        .data
                        .projects_mut()
                        .expect("parent lost its project list")
                        = list;
                }
            }
        }
    }

    // ---- child access -----------------------------------------------------

    /// File children of a folder-like node, in sibling order. Empty for
    /// leaves.
    pub fn file_nodes(&self, id: NodeId) -> &[NodeId] {
        self.node(id)
            .data
            .folder_data()
            .map_or(&[], |f| f.files.as_slice())
    }

    /// Folder children (including projects) in sibling order.
    pub fn folder_nodes(&self, id: NodeId) -> &[NodeId] {
        self.node(id)
            .data
            .folder_data()
            .map_or(&[], |f| f.folders.as_slice())
    }

    /// The distinguished sub-project subset of a project or session.
    pub fn project_nodes(&self, id: NodeId) -> &[NodeId] {
        self.node(id)
            .data
            .projects()
            .map_or(&[], |p| p.as_slice())
    }

    /// Direct file child with the given path.
    pub fn file_node_at(&self, folder: NodeId, path: &Path) -> Option<NodeId> {
        self.file_nodes(folder)
            .iter()
            .copied()
            .find(|&f| self.node(f).path == path)
    }

    /// Direct folder child with the given path.
    pub fn folder_node_at(&self, folder: NodeId, path: &Path) -> Option<NodeId> {
        self.folder_nodes(folder)
            .iter()
            .copied()
            .find(|&f| self.node(f).path == path)
    }

    /// Find a file anywhere under `folder` by walking the folder chain
    /// that its path dictates.
    pub fn find_file_node(&self, folder: NodeId, file: &Path) -> Option<NodeId> {
        let dir = file.parent()?;
        let base = self.node(folder).path.clone();
        let rel = dir.strip_prefix(&base).ok()?;
        let mut acc = base;
        let mut cur = folder;
        for comp in rel.components() {
            let Component::Normal(part) = comp else {
                continue;
            };
            acc.push(part);
            cur = self.folder_node_at(cur, &acc)?;
        }
        self.file_node_at(cur, file)
    }

    /// All file nodes in this subtree, pre-order.
    pub fn recursive_file_nodes(&self, folder: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        self.collect_files(folder, &mut result);
        result
    }

    fn collect_files(&self, folder: NodeId, out: &mut Vec<NodeId>) {
        out.extend_from_slice(self.file_nodes(folder));
        for &sub in self.folder_nodes(folder) {
            self.collect_files(sub, out);
        }
    }

    // ---- sorted insertion / removal ---------------------------------------

    /// Insert into a sorted sibling list, appending directly when the new
    /// node already sorts after the current last element.
    pub(crate) fn insert_sorted(&self, list: &mut Vec<NodeId>, id: NodeId) {
        let key = self.sort_key_of(id);
        match list.last() {
            None => list.push(id),
            Some(&last) if self.sort_key_of(last) < key => list.push(id),
            _ => {
                let pos = list.partition_point(|&n| self.sort_key_of(n) < key);
                list.insert(pos, id);
            }
        }
    }

    /// Attach detached file nodes to a folder, preserving sibling order.
    /// One notification pair brackets the whole batch.
    pub fn add_file_nodes(
        &mut self,
        folder: NodeId,
        files: Vec<NodeId>,
        observer: &mut dyn TreeObserver,
    ) {
        if files.is_empty() {
            return;
        }
        observer.files_about_to_be_added(folder, &files);

        for &file in &files {
            let node = self.node_mut(file);
            assert!(node.is_file(), "only file nodes can be added as file children");
            assert!(
                node.parent.is_none(),
                "file node already has a parent folder"
            );
            node.parent = Some(folder);
        }
        let mut list = mem::take(&mut self.folder_data_mut_of(folder).files);
        for &file in &files {
            self.insert_sorted(&mut list, file);
        }
        self.folder_data_mut_of(folder).files = list;

        observer.files_added(folder, &files);
    }

    /// Remove and destroy file children. Naming a node not present in
    /// `folder` is a contract violation.
    pub fn remove_file_nodes(
        &mut self,
        folder: NodeId,
        files: Vec<NodeId>,
        observer: &mut dyn TreeObserver,
    ) {
        if files.is_empty() {
            return;
        }
        let mut to_remove = files;
        to_remove.sort_by(|&a, &b| self.sort_key_of(a).cmp(&self.sort_key_of(b)));

        observer.files_about_to_be_removed(folder, &to_remove);

        let mut list = mem::take(&mut self.folder_data_mut_of(folder).files);
        let mut cursor = 0usize;
        for &victim in &to_remove {
            loop {
                assert!(
                    cursor < list.len(),
                    "file to remove is not part of this folder"
                );
                if list[cursor] == victim {
                    break;
                }
                cursor += 1;
            }
            list.remove(cursor);
            self.destroy_subtree(victim);
        }
        self.folder_data_mut_of(folder).files = list;

        observer.files_removed(folder, &to_remove);
    }

    /// Attach detached folder nodes, preserving sibling order. Project
    /// nodes must go through [`Self::add_project_nodes`] instead.
    pub fn add_folder_nodes(
        &mut self,
        folder: NodeId,
        subfolders: Vec<NodeId>,
        observer: &mut dyn TreeObserver,
    ) {
        if subfolders.is_empty() {
            return;
        }
        observer.folders_about_to_be_added(folder, &subfolders);

        for &sub in &subfolders {
            assert!(
                !matches!(self.node(sub).kind(), NodeKind::Project | NodeKind::Session),
                "project nodes have to be added via add_project_nodes"
            );
            let node = self.node_mut(sub);
            assert!(
                node.data.folder_data_mut().is_some(),
                "only folder nodes can be added as folder children"
            );
            assert!(
                node.parent.is_none(),
                "folder node already has a parent folder"
            );
            node.parent = Some(folder);
        }
        let mut list = mem::take(&mut self.folder_data_mut_of(folder).folders);
        for &sub in &subfolders {
            self.insert_sorted(&mut list, sub);
        }
        self.folder_data_mut_of(folder).folders = list;

        observer.folders_added(folder, &subfolders);
    }

    /// Remove and destroy folder children with their whole subtrees.
    pub fn remove_folder_nodes(
        &mut self,
        folder: NodeId,
        subfolders: Vec<NodeId>,
        observer: &mut dyn TreeObserver,
    ) {
        if subfolders.is_empty() {
            return;
        }
        let mut to_remove = subfolders;
        to_remove.sort_by(|&a, &b| self.sort_key_of(a).cmp(&self.sort_key_of(b)));

        observer.folders_about_to_be_removed(folder, &to_remove);

        let mut list = mem::take(&mut self.folder_data_mut_of(folder).folders);
        let mut cursor = 0usize;
        for &victim in &to_remove {
            assert!(
                !matches!(self.node(victim).kind(), NodeKind::Project | NodeKind::Session),
                "project nodes have to be removed via remove_project_nodes"
            );
            loop {
                assert!(
                    cursor < list.len(),
                    "folder to remove is not part of this folder"
                );
                if list[cursor] == victim {
                    break;
                }
                cursor += 1;
            }
            list.remove(cursor);
            self.destroy_subtree(victim);
        }
        self.folder_data_mut_of(folder).folders = list;

        observer.folders_removed(folder, &to_remove);
    }

    /// Attach sub-projects to a project or session node, keeping the
    /// project subset and the folder children in lockstep. Sub-project
    /// churn is rare, so this appends and re-sorts rather than inserting.
    pub fn add_project_nodes(
        &mut self,
        parent: NodeId,
        projects: Vec<NodeId>,
        observer: &mut dyn TreeObserver,
    ) {
        if projects.is_empty() {
            return;
        }
        assert!(
            self.node(parent).data.projects().is_some(),
            "node cannot own sub-projects"
        );
        observer.folders_about_to_be_added(parent, &projects);

        for &project in &projects {
            let node = self.node_mut(project);
            assert!(
                matches!(node.data, NodeData::Project(_)),
                "only project nodes can be added as sub-projects"
            );
            assert!(node.parent.is_none(), "project node already has a parent");
            node.parent = Some(parent);
        }
        let mut folders = mem::take(&mut self.folder_data_mut_of(parent).folders);
        let mut subset = mem::take(
            self.node_mut(parent)
                .data
                .projects_mut()
                .expect("checked above"),
        );
        folders.extend_from_slice(&projects);
        subset.extend_from_slice(&projects);
        folders.sort_by(|&a, &b| self.sort_key_of(a).cmp(&self.sort_key_of(b)));
        subset.sort_by(|&a, &b| self.sort_key_of(a).cmp(&self.sort_key_of(b)));
        self.folder_data_mut_of(parent).folders = folders;
        *self
            .node_mut(parent)
            .data
            .projects_mut()
            .expect("checked above") = subset;

        observer.folders_added(parent, &projects);
    }

    /// Remove and destroy sub-projects, in lockstep across both lists.
    pub fn remove_project_nodes(
        &mut self,
        parent: NodeId,
        projects: Vec<NodeId>,
        observer: &mut dyn TreeObserver,
    ) {
        if projects.is_empty() {
            return;
        }
        assert!(
            self.node(parent).data.projects().is_some(),
            "node cannot own sub-projects"
        );
        let mut to_remove = projects;
        to_remove.sort_by(|&a, &b| self.sort_key_of(a).cmp(&self.sort_key_of(b)));

        observer.folders_about_to_be_removed(parent, &to_remove);

        let mut folders = mem::take(&mut self.folder_data_mut_of(parent).folders);
        let mut subset = mem::take(
            self.node_mut(parent)
                .data
                .projects_mut()
                .expect("checked above"),
        );
        let mut folder_cursor = 0usize;
        let mut subset_cursor = 0usize;
        for &victim in &to_remove {
            loop {
                assert!(
                    subset_cursor < subset.len(),
                    "project to remove is not part of this node"
                );
                if subset[subset_cursor] == victim {
                    break;
                }
                subset_cursor += 1;
            }
            loop {
                assert!(
                    folder_cursor < folders.len(),
                    "project to remove is not part of this node"
                );
                if folders[folder_cursor] == victim {
                    break;
                }
                folder_cursor += 1;
            }
            subset.remove(subset_cursor);
            folders.remove(folder_cursor);
            self.destroy_subtree(victim);
        }
        self.folder_data_mut_of(parent).folders = folders;
        *self
            .node_mut(parent)
            .data
            .projects_mut()
            .expect("checked above") = subset;

        observer.folders_removed(parent, &to_remove);
    }

    /// Drop a node and everything it owns from the arena. The parent
    /// lists referencing it must already have been updated.
    pub(crate) fn destroy_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                if let Some(folder) = node.data.folder_data() {
                    stack.extend_from_slice(&folder.files);
                    stack.extend_from_slice(&folder.folders);
                }
            }
        }
    }

    // ---- capability delegation --------------------------------------------

    /// Add files through the managing project's capability impl. Returns
    /// false when no project manages this node or the project refuses.
    pub fn add_files(
        &mut self,
        id: NodeId,
        paths: &[PathBuf],
        not_added: Option<&mut Vec<PathBuf>>,
    ) -> bool {
        match self.managing_project(id) {
            Some(project) => match &mut self.node_mut(project).data {
                NodeData::Project(p) => p.ops.add_files(paths, not_added),
                _ => false,
            },
            None => false,
        }
    }

    pub fn remove_files(
        &mut self,
        id: NodeId,
        paths: &[PathBuf],
        not_removed: Option<&mut Vec<PathBuf>>,
    ) -> bool {
        match self.managing_project(id) {
            Some(project) => match &mut self.node_mut(project).data {
                NodeData::Project(p) => p.ops.remove_files(paths, not_removed),
                _ => false,
            },
            None => false,
        }
    }

    pub fn delete_files(&mut self, id: NodeId, paths: &[PathBuf]) -> bool {
        match self.managing_project(id) {
            Some(project) => match &mut self.node_mut(project).data {
                NodeData::Project(p) => p.ops.delete_files(paths),
                _ => false,
            },
            None => false,
        }
    }

    pub fn can_rename_file(&self, id: NodeId, path: &Path, new_path: &Path) -> bool {
        match self.managing_project(id) {
            Some(project) => match &self.node(project).data {
                NodeData::Project(p) => p.ops.can_rename_file(path, new_path),
                _ => false,
            },
            None => false,
        }
    }

    pub fn rename_file(&mut self, id: NodeId, path: &Path, new_path: &Path) -> bool {
        match self.managing_project(id) {
            Some(project) => match &mut self.node_mut(project).data {
                NodeData::Project(p) => p.ops.rename_file(path, new_path),
                _ => false,
            },
            None => false,
        }
    }

    /// Probe whether a project node accepts the given sub-project file.
    pub fn can_add_sub_project(&self, id: NodeId, project_file: &Path) -> bool {
        match &self.node(id).data {
            NodeData::Project(p) => p.ops.can_add_sub_project(project_file),
            _ => false,
        }
    }

    pub fn add_sub_projects(&mut self, id: NodeId, project_files: &[PathBuf]) -> bool {
        match &mut self.node_mut(id).data {
            NodeData::Project(p) => p.ops.add_sub_projects(project_files),
            _ => false,
        }
    }

    pub fn remove_sub_projects(&mut self, id: NodeId, project_files: &[PathBuf]) -> bool {
        match &mut self.node_mut(id).data {
            NodeData::Project(p) => p.ops.remove_sub_projects(project_files),
            _ => false,
        }
    }

    /// Version-control topic for the directory containing this node;
    /// empty when no VCS is associated.
    pub fn vcs_topic(&self, id: NodeId, vcs: &dyn VcsLookup) -> String {
        let Some(dir) = self.node(id).path.parent().map(Path::to_path_buf) else {
            return String::new();
        };
        match vcs.find_controller(&dir) {
            Some(controller) => controller.topic(&dir),
            None => String::new(),
        }
    }
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}
