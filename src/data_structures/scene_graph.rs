//! Scene graph and hierarchical scene organization.
//!
//! A [`Scene`] is the root of a tree of [`Node`]s. Nodes are shared as
//! [`NodeRef`] (`Rc<RefCell<Node>>`) so that scene elements, frame hooks and
//! debug bindings can keep a handle to the node they animate or tune while
//! the scene owns the hierarchy.

use std::{
    cell::RefCell,
    collections::HashSet,
    rc::Rc,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::data_structures::{
    color::Color, geometry::Geometry, instance::Transform, material::Material,
};

pub type NodeRef = Rc<RefCell<Node>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A renderable: one geometry drawn with one material.
///
/// Both are reference counted and may be shared by many meshes.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub geometry: Rc<Geometry>,
    pub material: Rc<Material>,
}

/// A light infinitely far away shining from the node's position towards the
/// world origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    /// Set when the light casts shadows.
    pub shadow: Option<LightShadow>,
}

/// Orthographic shadow camera of a directional light, looking from the
/// light's position at the world origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightShadow {
    /// Width and height of the square shadow map in texels.
    pub map_size: u32,
    pub near: f32,
    pub far: f32,
    /// Half the width of the area the shadow camera covers.
    pub extent: f32,
}

impl Default for LightShadow {
    fn default() -> Self {
        Self {
            map_size: 1024,
            near: 0.5,
            far: 15.0,
            extent: 5.0,
        }
    }
}

#[derive(Debug)]
pub enum NodeKind {
    Group,
    Mesh(Mesh),
    DirectionalLight(DirectionalLight),
}

#[derive(Debug)]
pub struct Node {
    id: NodeId,
    pub name: String,
    pub transform: Transform,
    pub visible: bool,
    pub kind: NodeKind,
    children: Vec<NodeRef>,
}

impl Node {
    fn new_ref(name: &str, kind: NodeKind) -> NodeRef {
        Rc::new(RefCell::new(Self {
            id: NodeId::next(),
            name: name.to_string(),
            transform: Transform::default(),
            visible: true,
            kind,
            children: Vec::new(),
        }))
    }

    pub fn group(name: &str) -> NodeRef {
        Self::new_ref(name, NodeKind::Group)
    }

    pub fn mesh(name: &str, geometry: Rc<Geometry>, material: Rc<Material>) -> NodeRef {
        Self::new_ref(name, NodeKind::Mesh(Mesh { geometry, material }))
    }

    pub fn directional_light(name: &str, light: DirectionalLight) -> NodeRef {
        Self::new_ref(name, NodeKind::DirectionalLight(light))
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn add(&mut self, child: NodeRef) {
        self.children.push(child);
    }

    /// Detaches `child` if it is a direct child. Returns whether it was.
    pub fn remove(&mut self, child: &NodeRef) -> bool {
        let before = self.children.len();
        self.children.retain(|c| !Rc::ptr_eq(c, child));
        before != self.children.len()
    }

    pub fn children(&self) -> &[NodeRef] {
        &self.children
    }

    pub fn as_mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn as_light(&self) -> Option<&DirectionalLight> {
        match &self.kind {
            NodeKind::DirectionalLight(light) => Some(light),
            _ => None,
        }
    }

    pub fn as_light_mut(&mut self) -> Option<&mut DirectionalLight> {
        match &mut self.kind {
            NodeKind::DirectionalLight(light) => Some(light),
            _ => None,
        }
    }
}

/// Linear distance fog.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fog {
    pub color: Color,
    pub near: f32,
    pub far: f32,
}

/// Everything reachable from a scene root, each geometry and material
/// listed once regardless of how many meshes reference it.
#[derive(Debug, Default)]
pub struct SceneResources {
    pub nodes: Vec<NodeRef>,
    pub geometries: Vec<Rc<Geometry>>,
    pub materials: Vec<Rc<Material>>,
}

/// The root of the scene graph.
#[derive(Debug)]
pub struct Scene {
    children: Vec<NodeRef>,
    pub background: Color,
    fog: Option<Rc<RefCell<Fog>>>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            background: Color::BLACK,
            fog: None,
        }
    }

    pub fn add(&mut self, node: NodeRef) {
        self.children.push(node);
    }

    /// Detaches `node` if it is a direct child of the root.
    pub fn remove(&mut self, node: &NodeRef) -> bool {
        let before = self.children.len();
        self.children.retain(|c| !Rc::ptr_eq(c, node));
        before != self.children.len()
    }

    pub fn children(&self) -> &[NodeRef] {
        &self.children
    }

    /// Whether `node` is anywhere in the tree.
    pub fn contains(&self, node: &NodeRef) -> bool {
        let mut found = false;
        self.traverse(&mut |n| found |= Rc::ptr_eq(n, node));
        found
    }

    pub fn fog(&self) -> Option<Fog> {
        self.fog.as_ref().map(|fog| *fog.borrow())
    }

    pub fn fog_handle(&self) -> Option<&Rc<RefCell<Fog>>> {
        self.fog.as_ref()
    }

    pub fn set_fog(&mut self, fog: Option<Rc<RefCell<Fog>>>) {
        self.fog = fog;
    }

    /// Depth-first, pre-order visit of every node below the root.
    pub fn traverse(&self, visit: &mut dyn FnMut(&NodeRef)) {
        for child in &self.children {
            traverse_node(child, visit);
        }
    }

    /// Visits visible nodes together with their world transform. Invisible
    /// nodes hide their whole subtree.
    pub fn traverse_world(&self, visit: &mut dyn FnMut(&Node, &Transform)) {
        let root = Transform::default();
        for child in &self.children {
            traverse_world_node(child, &root, visit);
        }
    }

    /// Collects all nodes plus the distinct geometries and materials of the
    /// meshes among them.
    pub fn collect_resources(&self) -> SceneResources {
        let mut resources = SceneResources::default();
        let mut seen_geometries = HashSet::new();
        let mut seen_materials = HashSet::new();

        self.traverse(&mut |node| {
            resources.nodes.push(node.clone());
            if let Some(mesh) = node.borrow().as_mesh() {
                if seen_geometries.insert(mesh.geometry.id()) {
                    resources.geometries.push(mesh.geometry.clone());
                }
                if seen_materials.insert(mesh.material.id()) {
                    resources.materials.push(mesh.material.clone());
                }
            }
        });
        resources
    }

    /// Detaches every node from the root and from its parent.
    pub fn clear(&mut self, nodes: &[NodeRef]) {
        for node in nodes {
            self.remove(node);
            node.borrow_mut().children.clear();
        }
        self.children.clear();
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

fn traverse_node(node: &NodeRef, visit: &mut dyn FnMut(&NodeRef)) {
    visit(node);
    // Cloning the handles keeps the node unborrowed while children are visited.
    let children = node.borrow().children.clone();
    for child in &children {
        traverse_node(child, visit);
    }
}

fn traverse_world_node(
    node: &NodeRef,
    parent: &Transform,
    visit: &mut dyn FnMut(&Node, &Transform),
) {
    let node = node.borrow();
    if !node.visible {
        return;
    }
    let world = parent * &node.transform;
    visit(&node, &world);
    for child in &node.children {
        traverse_world_node(child, &world, visit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared_mesh(geometry: &Rc<Geometry>, material: &Rc<Material>) -> NodeRef {
        Node::mesh("m", geometry.clone(), material.clone())
    }

    #[test]
    fn traverse_visits_nested_nodes_in_pre_order() {
        let mut scene = Scene::new();
        let parent = Node::group("parent");
        let child = Node::group("child");
        parent.borrow_mut().add(child.clone());
        scene.add(parent.clone());

        let mut names = Vec::new();
        scene.traverse(&mut |n| names.push(n.borrow().name.clone()));

        assert_eq!(names, vec!["parent", "child"]);
        assert!(scene.contains(&child));
    }

    #[test]
    fn collect_resources_deduplicates_shared_meshes() {
        let geometry = Rc::new(Geometry::cuboid(1.0, 1.0, 1.0));
        let material = Rc::new(Material::standard(0xff0000));
        let mut scene = Scene::new();
        let group = Node::group("g");
        for _ in 0..3 {
            group.borrow_mut().add(shared_mesh(&geometry, &material));
        }
        scene.add(group);
        scene.add(shared_mesh(&geometry, &material));

        let resources = scene.collect_resources();

        assert_eq!(resources.nodes.len(), 5);
        assert_eq!(resources.geometries.len(), 1);
        assert_eq!(resources.materials.len(), 1);
    }

    #[test]
    fn world_traversal_composes_parent_transforms() {
        let mut scene = Scene::new();
        let parent = Node::group("parent");
        parent.borrow_mut().transform.position = cgmath::Vector3::new(0.0, 2.0, 0.0);
        let child = Node::group("child");
        child.borrow_mut().transform.position = cgmath::Vector3::new(1.0, 0.0, 0.0);
        parent.borrow_mut().add(child);
        scene.add(parent);

        let mut positions = Vec::new();
        scene.traverse_world(&mut |_, world| positions.push(world.position));

        assert_eq!(positions[1], cgmath::Vector3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn hidden_nodes_hide_their_subtree() {
        let mut scene = Scene::new();
        let parent = Node::group("parent");
        parent.borrow_mut().add(Node::group("child"));
        parent.borrow_mut().visible = false;
        scene.add(parent);

        let mut visited = 0;
        scene.traverse_world(&mut |_, _| visited += 1);
        assert_eq!(visited, 0);
    }
}
