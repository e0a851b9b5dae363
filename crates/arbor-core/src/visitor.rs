//! Pre-order traversal over the folder structure of a tree.

use crate::node::{NodeData, NodeId};
use crate::tree::NodeTree;

/// Visitor over the composite nodes of a tree. File nodes are leaves of
/// this traversal and get no callback; read them off the visited folder
/// via [`NodeTree::file_nodes`].
pub trait NodesVisitor {
    fn visit_session(&mut self, _tree: &NodeTree, _session: NodeId) {}
    fn visit_project(&mut self, _tree: &NodeTree, _project: NodeId) {}
    fn visit_folder(&mut self, _tree: &NodeTree, _folder: NodeId) {}
}

impl NodeTree {
    /// Walk the subtree at `id` pre-order: the node itself, then its
    /// children in sibling order. A session descends into its projects,
    /// projects and folders into their folder children.
    pub fn accept(&self, id: NodeId, visitor: &mut dyn NodesVisitor) {
        match self.node(id).data() {
            NodeData::File(_) => {}
            NodeData::Session(_) => {
                visitor.visit_session(self, id);
                for &project in self.project_nodes(id) {
                    self.accept(project, visitor);
                }
            }
            NodeData::Project(_) => {
                visitor.visit_project(self, id);
                for &child in self.folder_nodes(id) {
                    self.accept(child, visitor);
                }
            }
            NodeData::Folder(_) | NodeData::VirtualFolder(_) => {
                visitor.visit_folder(self, id);
                for &child in self.folder_nodes(id) {
                    self.accept(child, visitor);
                }
            }
        }
    }
}
