//! Scene graph seam and role bindings
//!
//! The 3D asset pipeline is external: the driver only needs to find nodes by
//! name and set their transform, visibility and colour.

use nalgebra::Vector3;
use std::collections::HashMap;

/// Opaque node handle handed out by a [`SceneGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// Minimal interface to a loaded scene
pub trait SceneGraph {
    /// Node with this exact name
    fn find_by_name(&self, name: &str) -> Option<NodeId>;
    /// World position of a node
    fn position(&self, node: NodeId) -> Option<Vector3<f64>>;
    /// Move a node
    fn set_position(&mut self, node: NodeId, position: Vector3<f64>);
    /// Show or hide a node
    fn set_visible(&mut self, node: NodeId, visible: bool);
    /// Set a node's material colour, components in `0.0..=1.0`
    fn set_color_hsl(&mut self, node: NodeId, hue: f64, saturation: f64, lightness: f64);
}

/// Scene objects the driver animates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneRole {
    /// Moving upper platen
    PressTop,
    /// Marker lit while bread is detected
    BreadIndicator,
    /// Marker lit while a hand is detected
    HandIndicator,
    /// Heated plate tinted by temperature
    ColorPlate,
}

impl SceneRole {
    /// Every role
    pub const ALL: [SceneRole; 4] = [
        SceneRole::PressTop,
        SceneRole::BreadIndicator,
        SceneRole::HandIndicator,
        SceneRole::ColorPlate,
    ];

    /// Node names tried in order when binding
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            SceneRole::PressTop => &["topo_movel"],
            SceneRole::BreadIndicator => &["pao", "bread", "pao_001"],
            SceneRole::HandIndicator => &["mao", "hand", "mao_001"],
            SceneRole::ColorPlate => &["placa"],
        }
    }
}

/// A role resolved to a node, with the node's resting position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binding {
    /// Resolved node
    pub node: NodeId,
    /// Position at bind time
    pub baseline: Vector3<f64>,
}

/// Role bindings for one loaded scene
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneBindings {
    bound: HashMap<SceneRole, Binding>,
}

impl SceneBindings {
    /// Resolve every role once. Roles whose node is missing stay unbound.
    pub fn resolve<S: SceneGraph + ?Sized>(scene: &S) -> Self {
        let mut bound = HashMap::new();
        for role in SceneRole::ALL {
            let found = role
                .aliases()
                .iter()
                .find_map(|name| scene.find_by_name(name));
            match found {
                Some(node) => {
                    let baseline = scene.position(node).unwrap_or_else(Vector3::zeros);
                    bound.insert(role, Binding { node, baseline });
                }
                None => tracing::debug!("scene has no node for {role:?}"),
            }
        }
        Self { bound }
    }

    /// Binding for a role, if it resolved
    pub fn get(&self, role: SceneRole) -> Option<&Binding> {
        self.bound.get(&role)
    }

    /// Check if a role resolved
    pub fn is_bound(&self, role: SceneRole) -> bool {
        self.bound.contains_key(&role)
    }
}

/// Rendered properties of one in-memory node
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    /// Node name
    pub name: String,
    /// World position
    pub position: Vector3<f64>,
    /// Whether the node is drawn
    pub visible: bool,
    /// `(hue, saturation, lightness)`
    pub color: Option<(f64, f64, f64)>,
}

/// Scene kept in memory, used by the headless monitor and tests
#[derive(Debug, Clone, Default)]
pub struct InMemoryScene {
    nodes: Vec<SceneNode>,
}

impl InMemoryScene {
    /// Empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Scene with the press model's animated nodes at their resting positions
    pub fn press_model() -> Self {
        let mut scene = Self::new();
        scene.add_node("topo_movel", Vector3::new(0.0, 1.2, 0.0));
        scene.add_node("pao", Vector3::new(0.0, 0.45, 0.0));
        scene.add_node("mao", Vector3::new(0.4, 0.6, 0.3));
        scene.add_node("placa", Vector3::new(0.0, 0.4, 0.0));
        scene
    }

    /// Add a visible node and return its id
    pub fn add_node(&mut self, name: &str, position: Vector3<f64>) -> NodeId {
        self.nodes.push(SceneNode {
            name: name.to_string(),
            position,
            visible: true,
            color: None,
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Node by id
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    /// First node with this name
    pub fn node_named(&self, name: &str) -> Option<&SceneNode> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

impl SceneGraph for InMemoryScene {
    fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    fn position(&self, node: NodeId) -> Option<Vector3<f64>> {
        self.node(node).map(|n| n.position)
    }

    fn set_position(&mut self, node: NodeId, position: Vector3<f64>) {
        if let Some(n) = self.nodes.get_mut(node.0) {
            n.position = position;
        }
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) {
        if let Some(n) = self.nodes.get_mut(node.0) {
            n.visible = visible;
        }
    }

    fn set_color_hsl(&mut self, node: NodeId, hue: f64, saturation: f64, lightness: f64) {
        if let Some(n) = self.nodes.get_mut(node.0) {
            n.color = Some((hue, saturation, lightness));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_resolve_in_order() {
        let mut scene = InMemoryScene::new();
        scene.add_node("bread", Vector3::new(0.0, 1.0, 0.0));
        scene.add_node("pao_001", Vector3::new(0.0, 2.0, 0.0));
        scene.add_node("mao_001", Vector3::new(1.0, 0.0, 0.0));

        let bindings = SceneBindings::resolve(&scene);
        let bread = bindings.get(SceneRole::BreadIndicator).unwrap();
        assert_eq!(bread.baseline, Vector3::new(0.0, 1.0, 0.0));
        assert!(bindings.is_bound(SceneRole::HandIndicator));
        assert!(!bindings.is_bound(SceneRole::PressTop));
        assert!(!bindings.is_bound(SceneRole::ColorPlate));
    }

    #[test]
    fn test_press_model_binds_everything() {
        let bindings = SceneBindings::resolve(&InMemoryScene::press_model());
        for role in SceneRole::ALL {
            assert!(bindings.is_bound(role), "{role:?} unbound");
        }
    }
}
