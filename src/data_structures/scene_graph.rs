//! Scene graph and hierarchical scene organization.
//!
//! The graph is an owned tree of named [`SceneNode`]s mirroring the node
//! hierarchy of the loaded asset. Nodes keep a local and a world [`Instance`];
//! world transforms are refreshed top-down with `update_world_transforms` after
//! anything touched a local transform.

use cgmath::{InnerSpace, Vector3};

use crate::data_structures::{
    instance::Instance,
    light::{Light, WorldLight},
};

#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
    pub name: String,
    /// Index of the node in the asset it was imported from. Animation channels
    /// address nodes by this index.
    pub source: Option<usize>,
    pub local: Instance,
    pub world: Instance,
    /// A hidden node hides its whole subtree, lights included.
    pub visible: bool,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    /// Index of the mesh (model) drawn at this node.
    pub mesh: Option<usize>,
    /// Index of the camera definition attached to this node.
    pub camera: Option<usize>,
    pub light: Option<Light>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            source: None,
            local: Instance::default(),
            world: Instance::default(),
            visible: true,
            cast_shadow: false,
            receive_shadow: false,
            mesh: None,
            camera: None,
            light: None,
            children: Vec::new(),
        }
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    /// Recomputes this node's world transform and those of its descendants.
    pub fn update_world_transforms(&mut self, parent: &Instance) {
        self.world = parent * &self.local;
        let world = self.world.clone();
        for child in self.children.iter_mut() {
            child.update_world_transforms(&world);
        }
    }

    /// Depth-first, pre-order search by exact name.
    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(name))
    }

    pub fn find_by_source_mut(&mut self, source: usize) -> Option<&mut SceneNode> {
        if self.source == Some(source) {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_by_source_mut(source))
    }

    /// Visits this node and every descendant, visible or not.
    pub fn traverse_mut(&mut self, f: &mut dyn FnMut(&mut SceneNode)) {
        f(self);
        for child in self.children.iter_mut() {
            child.traverse_mut(f);
        }
    }

    pub fn traverse(&self, f: &mut dyn FnMut(&SceneNode)) {
        f(self);
        for child in self.children.iter() {
            child.traverse(f);
        }
    }

    /// Visits visible nodes only; a hidden node prunes its subtree.
    pub fn traverse_visible(&self, f: &mut dyn FnMut(&SceneNode)) {
        if !self.visible {
            return;
        }
        f(self);
        for child in self.children.iter() {
            child.traverse_visible(f);
        }
    }

    /// Sets shadow flags on the meshes directly below this node, and on the
    /// node itself when `include_node` is set.
    pub fn set_shadow_flags(
        &mut self,
        cast: Option<bool>,
        receive: Option<bool>,
        include_node: bool,
    ) {
        let apply = |node: &mut SceneNode| {
            if let Some(cast) = cast {
                node.cast_shadow = cast;
            }
            if let Some(receive) = receive {
                node.receive_shadow = receive;
            }
        };
        if include_node {
            apply(self);
        }
        self.children
            .iter_mut()
            .filter(|child| child.mesh.is_some())
            .for_each(|child| apply(child));
    }
}

/// The loaded scene: the top-level nodes of the asset's default scene.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneGraph {
    pub roots: Vec<SceneNode>,
}

impl SceneGraph {
    pub fn new(roots: Vec<SceneNode>) -> Self {
        let mut graph = Self { roots };
        graph.update_world_transforms();
        graph
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn clear(&mut self) {
        self.roots.clear();
    }

    pub fn update_world_transforms(&mut self) {
        let identity = Instance::default();
        for root in self.roots.iter_mut() {
            root.update_world_transforms(&identity);
        }
    }

    /// First node with the given name anywhere in the tree.
    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        self.roots.iter().find_map(|root| root.find(name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut SceneNode> {
        self.roots.iter_mut().find_map(|root| root.find_mut(name))
    }

    pub fn find_by_source_mut(&mut self, source: usize) -> Option<&mut SceneNode> {
        self.roots
            .iter_mut()
            .find_map(|root| root.find_by_source_mut(source))
    }

    pub fn traverse_mut(&mut self, f: &mut dyn FnMut(&mut SceneNode)) {
        for root in self.roots.iter_mut() {
            root.traverse_mut(f);
        }
    }

    pub fn traverse(&self, f: &mut dyn FnMut(&SceneNode)) {
        for root in self.roots.iter() {
            root.traverse(f);
        }
    }

    pub fn traverse_visible(&self, f: &mut dyn FnMut(&SceneNode)) {
        for root in self.roots.iter() {
            root.traverse_visible(f);
        }
    }

    /// `(camera index, world transform)` of every node carrying a camera.
    pub fn cameras(&self) -> Vec<(usize, Instance)> {
        let mut cameras = Vec::new();
        self.traverse(&mut |node| {
            if let Some(camera) = node.camera {
                cameras.push((camera, node.world.clone()));
            }
        });
        cameras
    }

    /// Lights of visible nodes, in world space. glTF lights shine down their local -Z.
    pub fn world_lights(&self) -> Vec<WorldLight> {
        let mut lights = Vec::new();
        self.traverse_visible(&mut |node| {
            if let Some(light) = &node.light {
                let direction = node.world.rotation * Vector3::new(0.0, 0.0, -1.0);
                lights.push(WorldLight {
                    light: light.clone(),
                    position: node.world.position,
                    direction: direction.normalize(),
                });
            }
        });
        lights
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Vector3;

    use super::*;
    use crate::data_structures::light::LightKind;

    fn graph() -> SceneGraph {
        let mut base = SceneNode::new("base");
        base.local = Instance::from(Vector3::new(0.0, 1.0, 0.0));
        let mut board = SceneNode::new("board");
        board.local = Instance::from(Vector3::new(2.0, 0.0, 0.0));
        let mut fire = SceneNode::new("kagaribi_light");
        fire.light = Some(Light::new("fire", LightKind::Point));
        board.add_child(fire);
        base.add_child(board);
        base.add_child(SceneNode::new("base_mesh"));
        SceneGraph::new(vec![base])
    }

    #[test]
    fn world_transforms_compose_down_the_tree() {
        let graph = graph();
        let board = graph.find("board").unwrap();
        assert_eq!(board.world.position, Vector3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn hidden_nodes_prune_lights() {
        let mut graph = graph();
        assert_eq!(graph.world_lights().len(), 1);
        graph.find_mut("board").unwrap().visible = false;
        assert!(graph.world_lights().is_empty());
    }

    #[test]
    fn shadow_flags_reach_direct_child_meshes_only() {
        let mut graph = graph();
        graph.find_mut("base_mesh").unwrap().mesh = Some(0);
        graph.roots[0].set_shadow_flags(None, Some(true), true);
        let base = &graph.roots[0];
        assert!(base.receive_shadow);
        assert!(base.find("base_mesh").unwrap().receive_shadow);
        // "board" is a group without a mesh of its own
        assert!(!base.find("board").unwrap().receive_shadow);
        assert!(!base.find("kagaribi_light").unwrap().receive_shadow);
    }

    #[test]
    fn shadow_flags_can_leave_the_node_itself_alone() {
        let mut wall = SceneNode::new("wall");
        wall.mesh = Some(0);
        let mut panel = SceneNode::new("wall_panel");
        panel.mesh = Some(1);
        wall.add_child(panel);

        wall.set_shadow_flags(Some(true), Some(true), false);
        assert!(!wall.cast_shadow && !wall.receive_shadow);
        assert!(wall.children[0].cast_shadow && wall.children[0].receive_shadow);
    }
}
