//! Reusable scene content.
//!
//! Every element knows how to put itself into a [`Scene`] and which of its
//! properties a [`DebugPanel`] may tune. Elements own their geometry and
//! material; handles such as [`BoxElement::node`] let frame hooks animate
//! them after they were attached.

use std::{cell::RefCell, rc::Rc};

use cgmath::{Deg, Rotation3, Vector3};

use crate::{
    data_structures::{
        color::Color,
        geometry::Geometry,
        material::Material,
        scene_graph::{DirectionalLight, Fog, LightShadow, Node, NodeRef, Scene},
    },
    debug::{DebugPanel, NumberRange},
};

pub const POSITION_RANGE: NumberRange = NumberRange::new(-10.0, 10.0, 0.001);
pub const INTENSITY_RANGE: NumberRange = NumberRange::new(0.0, 10.0, 0.001);
pub const FOG_NEAR_RANGE: NumberRange = NumberRange::new(0.0, 50.0, 0.01);
pub const FOG_FAR_RANGE: NumberRange = NumberRange::new(0.0, 100.0, 0.01);

pub trait SceneElement {
    /// Adds the element to `scene`. Attaching an element that is already in
    /// the scene does nothing and returns false.
    fn attach(&mut self, scene: &mut Scene) -> bool;

    /// Registers the element's tunable properties with `panel`.
    fn expose_debug_controls(&self, panel: &mut DebugPanel);
}

fn attach_node(scene: &mut Scene, node: &NodeRef) -> bool {
    if scene.contains(node) {
        log::warn!(
            "{} is already part of the scene, not attaching it twice",
            node.borrow().name
        );
        return false;
    }
    scene.add(node.clone());
    true
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxDimensions {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl From<[f32; 3]> for BoxDimensions {
    fn from([width, height, depth]: [f32; 3]) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }
}

fn add_axis(panel: &mut DebugPanel, label: &str, node: &NodeRef, axis: usize) {
    let (get, set) = (node.clone(), node.clone());
    panel.add_number(
        label,
        POSITION_RANGE,
        move || get.borrow().transform.position[axis],
        move |v| set.borrow_mut().transform.position[axis] = v,
    );
}

fn add_material_color(panel: &mut DebugPanel, label: &str, material: &Rc<Material>) {
    let (get, set) = (material.clone(), material.clone());
    panel.add_color(label, move || get.color(), move |c| set.set_color(c));
}

/// A solid box with its own geometry and material.
pub struct BoxElement {
    material: Rc<Material>,
    node: NodeRef,
}

impl BoxElement {
    pub fn new(dimensions: impl Into<BoxDimensions>, color: impl Into<Color>) -> Self {
        let d = dimensions.into();
        let material = Rc::new(Material::standard(color));
        let geometry = Rc::new(Geometry::cuboid(d.width, d.height, d.depth));
        let node = Node::mesh("box", geometry, material.clone());
        Self { material, node }
    }

    pub fn with_position(self, position: Vector3<f32>) -> Self {
        self.node.borrow_mut().transform.position = position;
        self
    }

    pub fn node(&self) -> NodeRef {
        self.node.clone()
    }
}

impl SceneElement for BoxElement {
    fn attach(&mut self, scene: &mut Scene) -> bool {
        attach_node(scene, &self.node)
    }

    fn expose_debug_controls(&self, panel: &mut DebugPanel) {
        add_material_color(panel, "Box color", &self.material);
        add_axis(panel, "Box X", &self.node, 0);
        add_axis(panel, "Box Y", &self.node, 1);
        add_axis(panel, "Box Z", &self.node, 2);
    }
}

/// A flat, horizontal rectangle, e.g. a floor.
pub struct Plane {
    material: Rc<Material>,
    node: NodeRef,
}

impl Plane {
    pub fn new(width: f32, height: f32, color: impl Into<Color>) -> Self {
        let material = Rc::new(Material::standard(color));
        let geometry = Rc::new(Geometry::plane(width, height));
        let node = Node::mesh("plane", geometry, material.clone());
        // The generated quad faces +Z; lay it down so it faces +Y.
        node.borrow_mut().transform.rotation = cgmath::Quaternion::from_angle_x(Deg(-90.0));
        Self { material, node }
    }

    pub fn with_height(self, y: f32) -> Self {
        self.node.borrow_mut().transform.position.y = y;
        self
    }

    pub fn node(&self) -> NodeRef {
        self.node.clone()
    }
}

impl SceneElement for Plane {
    fn attach(&mut self, scene: &mut Scene) -> bool {
        attach_node(scene, &self.node)
    }

    fn expose_debug_controls(&self, panel: &mut DebugPanel) {
        add_material_color(panel, "Plane color", &self.material);
        add_axis(panel, "Plane Y", &self.node, 1);
    }
}

/// A shadow-casting directional light placed at `position`, shining towards
/// the origin, with a small marker showing where it sits.
pub struct DirectionalLighting {
    node: NodeRef,
    helper: NodeRef,
    helper_material: Rc<Material>,
}

impl DirectionalLighting {
    pub const DEFAULT_INTENSITY: f32 = 3.0;
    /// Edge length of the light's marker cube.
    pub const HELPER_SIZE: f32 = 0.3;

    pub fn new(color: impl Into<Color>, intensity: f32, position: Vector3<f32>) -> Self {
        let color = color.into();
        let light = DirectionalLight {
            color,
            intensity,
            shadow: Some(LightShadow::default()),
        };
        let node = Node::directional_light("directional light", light);
        node.borrow_mut().transform.position = position;

        let helper_material = Rc::new(Material::unlit(color));
        let helper = Node::mesh(
            "directional light helper",
            Rc::new(Geometry::cuboid(Self::HELPER_SIZE, Self::HELPER_SIZE, Self::HELPER_SIZE)),
            helper_material.clone(),
        );
        node.borrow_mut().add(helper.clone());
        Self {
            node,
            helper,
            helper_material,
        }
    }

    /// Turns shadow casting off, or changes the shadow camera.
    pub fn with_shadow(self, shadow: Option<LightShadow>) -> Self {
        if let Some(light) = self.node.borrow_mut().as_light_mut() {
            light.shadow = shadow;
        }
        self
    }

    pub fn node(&self) -> NodeRef {
        self.node.clone()
    }

    /// The marker mesh; a child of [`Self::node`].
    pub fn helper(&self) -> NodeRef {
        self.helper.clone()
    }
}

impl SceneElement for DirectionalLighting {
    fn attach(&mut self, scene: &mut Scene) -> bool {
        attach_node(scene, &self.node)
    }

    fn expose_debug_controls(&self, panel: &mut DebugPanel) {
        let (get, set) = (self.node.clone(), self.node.clone());
        let helper = self.helper_material.clone();
        panel.add_color(
            "Light color",
            move || get.borrow().as_light().map_or(Color::BLACK, |l| l.color),
            move |c| {
                if let Some(light) = set.borrow_mut().as_light_mut() {
                    light.color = c;
                }
                helper.set_color(c);
            },
        );
        add_axis(panel, "Light X", &self.node, 0);
        add_axis(panel, "Light Y", &self.node, 1);
        add_axis(panel, "Light Z", &self.node, 2);
        let (get, set) = (self.node.clone(), self.node.clone());
        panel.add_number(
            "Light intensity",
            INTENSITY_RANGE,
            move || get.borrow().as_light().map_or(0.0, |l| l.intensity),
            move |v| {
                if let Some(light) = set.borrow_mut().as_light_mut() {
                    light.intensity = v;
                }
            },
        );
    }
}

/// Scene-wide linear fog.
pub struct Smoke {
    fog: Rc<RefCell<Fog>>,
}

impl Smoke {
    pub fn new(color: impl Into<Color>, near: f32, far: f32) -> Self {
        let fog = Fog {
            color: color.into(),
            near,
            far,
        };
        Self {
            fog: Rc::new(RefCell::new(fog)),
        }
    }
}

impl SceneElement for Smoke {
    fn attach(&mut self, scene: &mut Scene) -> bool {
        if scene.fog_handle().is_some_and(|fog| Rc::ptr_eq(fog, &self.fog)) {
            log::warn!("fog is already part of the scene, not attaching it twice");
            return false;
        }
        scene.set_fog(Some(self.fog.clone()));
        true
    }

    fn expose_debug_controls(&self, panel: &mut DebugPanel) {
        let (get, set) = (self.fog.clone(), self.fog.clone());
        panel.add_color(
            "Fog color",
            move || get.borrow().color,
            move |c| set.borrow_mut().color = c,
        );
        let (get, set) = (self.fog.clone(), self.fog.clone());
        panel.add_number(
            "Fog near",
            FOG_NEAR_RANGE,
            move || get.borrow().near,
            move |v| set.borrow_mut().near = v,
        );
        let (get, set) = (self.fog.clone(), self.fog.clone());
        panel.add_number(
            "Fog far",
            FOG_FAR_RANGE,
            move || get.borrow().far,
            move |v| set.borrow_mut().far = v,
        );
    }
}
