//! Scene graph and hierarchical scene organization.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Each node keeps
//! its parent id and an ordered list of child ids, so ownership is an
//! explicit tree without reference cycles: removing a node removes its whole
//! subtree. Materials are kept in a separate [`MaterialTable`] and shared by
//! id.
//!
//! World transforms are cached per node and refreshed by
//! [`SceneGraph::update_world_transforms`], which composes every node's
//! local transform with its parent's world transform.

use thiserror::Error;

use crate::{
    data_structures::{
        instance::Instance,
        material::{MaterialId, MaterialTable},
    },
    resources::{geometry::Geometry, label::Label},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SceneError {
    #[error("scene node {0:?} does not exist")]
    UnknownNode(NodeId),
    #[error("cannot attach {child:?} below its own descendant {parent:?}")]
    Cycle { child: NodeId, parent: NodeId },
}

/// What a node draws, if anything.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh {
        geometry: Geometry,
        material: MaterialId,
    },
    /// A camera-facing quad textured with a label bitmap.
    Sprite(Label),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub local: Instance,
    world: Instance,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            local: Instance::default(),
            world: Instance::default(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn group(name: &str) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn mesh(name: &str, geometry: Geometry, material: MaterialId) -> Self {
        Self::new(name, NodeKind::Mesh { geometry, material })
    }

    pub fn sprite(name: &str, label: Label) -> Self {
        Self::new(name, NodeKind::Sprite(label))
    }

    pub fn with_transform(mut self, local: Instance) -> Self {
        // until the next update the node's world transform is its local one
        self.world = local.clone();
        self.local = local;
        self
    }

    pub fn world(&self) -> &Instance {
        &self.world
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<Option<Node>>,
    roots: Vec<NodeId>,
    pub materials: MaterialTable,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `node` at the root of the scene.
    pub fn add(&mut self, mut node: Node) -> NodeId {
        node.parent = None;
        node.children.clear();
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(node));
        self.roots.push(id);
        id
    }

    /// Adds `node` as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> Result<NodeId, SceneError> {
        let parent_world = self.node(parent)?.world.clone();
        node.parent = Some(parent);
        node.children.clear();
        node.world = &parent_world * &node.local;
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(node));
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Moves `child` (with its subtree) below `parent`, or to the root for `None`.
    pub fn attach(&mut self, child: NodeId, parent: Option<NodeId>) -> Result<(), SceneError> {
        self.node(child)?;
        if let Some(parent) = parent {
            self.node(parent)?;
            if parent == child || self.is_ancestor(child, parent) {
                return Err(SceneError::Cycle { child, parent });
            }
        }
        self.detach(child);
        match parent {
            Some(parent) => self.node_mut(parent)?.children.push(child),
            None => self.roots.push(child),
        }
        self.node_mut(child)?.parent = parent;
        Ok(())
    }

    /// Removes `id` and all of its descendants, returning them in depth-first order.
    pub fn remove(&mut self, id: NodeId) -> Result<Vec<Node>, SceneError> {
        self.node(id)?;
        self.detach(id);
        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current.0).and_then(Option::take) {
                stack.extend(node.children.iter().rev().copied());
                removed.push(node);
            }
        }
        Ok(removed)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, SceneError> {
        self.get(id).ok_or(SceneError::UnknownNode(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        self.get_mut(id).ok_or(SceneError::UnknownNode(id))
    }

    pub fn local_transform_mut(&mut self, id: NodeId) -> Result<&mut Instance, SceneError> {
        Ok(&mut self.node_mut(id)?.local)
    }

    /// Cached world transform as of the last [`Self::update_world_transforms`].
    pub fn world_transform(&self, id: NodeId) -> Result<&Instance, SceneError> {
        Ok(&self.node(id)?.world)
    }

    /// Recomputes every node's world transform from its ancestors.
    pub fn update_world_transforms(&mut self) {
        let mut stack: Vec<(NodeId, Instance)> = self
            .roots
            .iter()
            .rev()
            .map(|&root| (root, Instance::default()))
            .collect();
        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.get_mut(id) else {
                log::warn!("Scene graph references the removed node {:?}", id);
                continue;
            };
            node.world = &parent_world * &node.local;
            let world = node.world.clone();
            stack.extend(node.children.iter().rev().map(|&child| (child, world.clone())));
        }
    }

    /// Walks `id`'s ancestors and composes a fresh world transform, ignoring the cache.
    pub fn compute_world_transform(&self, id: NodeId) -> Result<Instance, SceneError> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id)?;
            chain.push(&node.local);
            current = node.parent;
        }
        Ok(chain
            .into_iter()
            .rev()
            .fold(Instance::default(), |world, local| &world * local))
    }

    /// Whether `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.get(id).and_then(Node::parent);
        while let Some(node_id) = current {
            if node_id == ancestor {
                return true;
            }
            current = self.get(node_id).and_then(Node::parent);
        }
        false
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.iter().find(|(_, node)| node.name == name).map(|(id, _)| id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| node.as_ref().map(|node| (NodeId(i), node)))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn detach(&mut self, id: NodeId) {
        match self.get(id).and_then(Node::parent) {
            Some(parent) => {
                if let Some(parent) = self.get_mut(parent) {
                    parent.children.retain(|&c| c != id);
                }
            }
            None => self.roots.retain(|&r| r != id),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use cgmath::Vector3;

    use super::*;

    fn at(x: f32, y: f32, z: f32) -> Instance {
        Instance::from(Vector3::new(x, y, z))
    }

    #[test]
    fn world_transforms_compose_ancestors() {
        let mut graph = SceneGraph::new();
        let root = graph.add(Node::group("root").with_transform(at(1.0, 0.0, 0.0)));
        let mid = graph
            .add_child(root, Node::group("mid").with_transform(at(0.0, 2.0, 0.0)))
            .unwrap();
        let leaf = graph
            .add_child(mid, Node::group("leaf").with_transform(at(0.0, 0.0, 3.0)))
            .unwrap();
        graph.update_world_transforms();
        assert_relative_eq!(
            graph.world_transform(leaf).unwrap().position,
            Vector3::new(1.0, 2.0, 3.0)
        );
        assert_eq!(
            graph.compute_world_transform(leaf).unwrap(),
            *graph.world_transform(leaf).unwrap()
        );
    }

    #[test]
    fn children_follow_a_moved_parent() {
        let mut graph = SceneGraph::new();
        let parent = graph.add(Node::group("parent"));
        let child = graph
            .add_child(parent, Node::group("child").with_transform(at(0.0, 2.0, 0.0)))
            .unwrap();
        graph.local_transform_mut(parent).unwrap().position = Vector3::new(5.0, 0.0, -1.0);
        graph.update_world_transforms();
        assert_relative_eq!(
            graph.world_transform(child).unwrap().position,
            Vector3::new(5.0, 2.0, -1.0)
        );
    }

    #[test]
    fn removing_a_parent_removes_its_subtree() {
        let mut graph = SceneGraph::new();
        let keep = graph.add(Node::group("keep"));
        let parent = graph.add(Node::group("parent"));
        let child = graph.add_child(parent, Node::group("child")).unwrap();
        let grandchild = graph.add_child(child, Node::group("grandchild")).unwrap();

        let removed = graph.remove(parent).unwrap();
        let names: Vec<_> = removed.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["parent", "child", "grandchild"]);
        assert!(graph.get(grandchild).is_none());
        assert_eq!(graph.roots(), &[keep]);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.remove(child), Err(SceneError::UnknownNode(child)));
    }

    #[test]
    fn attach_rejects_cycles() {
        let mut graph = SceneGraph::new();
        let a = graph.add(Node::group("a"));
        let b = graph.add_child(a, Node::group("b")).unwrap();
        assert_eq!(
            graph.attach(a, Some(b)),
            Err(SceneError::Cycle { child: a, parent: b })
        );
        assert_eq!(
            graph.attach(a, Some(a)),
            Err(SceneError::Cycle { child: a, parent: a })
        );
    }

    #[test]
    fn attach_moves_between_parents() {
        let mut graph = SceneGraph::new();
        let a = graph.add(Node::group("a").with_transform(at(1.0, 0.0, 0.0)));
        let b = graph.add(Node::group("b").with_transform(at(0.0, 0.0, 7.0)));
        let c = graph.add_child(a, Node::group("c")).unwrap();
        graph.attach(c, Some(b)).unwrap();
        assert!(graph.node(a).unwrap().children().is_empty());
        assert_eq!(graph.node(b).unwrap().children(), &[c]);
        assert_eq!(graph.node(c).unwrap().parent(), Some(b));
        graph.update_world_transforms();
        assert_relative_eq!(
            graph.world_transform(c).unwrap().position,
            Vector3::new(0.0, 0.0, 7.0)
        );

        graph.attach(c, None).unwrap();
        assert_eq!(graph.roots(), &[a, b, c]);
        assert!(!graph.is_ancestor(b, c));
    }

    #[test]
    fn find_looks_up_by_name() {
        let mut graph = SceneGraph::new();
        let a = graph.add(Node::group("a"));
        assert_eq!(graph.find("a"), Some(a));
        assert_eq!(graph.find("z"), None);
    }
}
