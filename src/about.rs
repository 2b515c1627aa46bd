//! The decorative scene of the about page.

use std::{f32::consts::TAU, rc::Rc};

use cgmath::{Deg, Point3, Rotation3, Vector3};

use crate::{
    data_structures::{
        color::Color,
        geometry::Geometry,
        material::Material,
        scene_graph::{Node, NodeRef},
    },
    elements::{BoxElement, DirectionalLighting, Plane, Smoke},
    flow,
    render::{RenderSettings, Renderer},
    scene::{FrameHook, SceneManager, SceneParameters},
};

const BACKGROUND: u32 = 0x1b1d23;
const RING_SIZE: usize = 12;
const RING_RADIUS: f32 = 4.0;
const BOB_HEIGHT: f32 = 0.35;
/// Radians per second.
const BOB_SPEED: f32 = 1.6;
const RING_SPIN: Deg<f32> = Deg(6.0);

/// Adds the floor, light, fog, a tunable box and the bobbing ring.
pub fn populate<R: Renderer>(scene: &mut SceneManager<R>) {
    scene.add_element(&mut Plane::new(20.0, 20.0, 0x3c4150).with_height(-1.0));
    scene.add_element(&mut DirectionalLighting::new(
        0xffffff,
        DirectionalLighting::DEFAULT_INTENSITY,
        Vector3::new(4.0, 8.0, 6.0),
    ));
    scene.add_element(&mut Smoke::new(BACKGROUND, 6.0, 30.0));
    scene.add_element(&mut BoxElement::new([1.0, 1.0, 1.0], 0x44aa88));

    scene.configure(|scene, camera, _| {
        scene.background = Color::from_hex(BACKGROUND);
        camera.position = Point3::new(0.0, 3.0, 8.0);
        camera.target = Point3::new(0.0, 0.0, 0.0);

        let ring = ring();
        scene.add(ring.clone());
        Some(bob(ring))
    });
}

/// Boxes on a circle, all sharing one geometry and one material.
fn ring() -> NodeRef {
    let geometry = Rc::new(Geometry::cuboid(0.4, 0.4, 0.4));
    let material = Rc::new(Material::standard(0xe0a458).with_roughness(0.6));
    let ring = Node::group("ring");
    for i in 0..RING_SIZE {
        let angle = TAU * i as f32 / RING_SIZE as f32;
        let node = Node::mesh("ring box", geometry.clone(), material.clone());
        node.borrow_mut().transform.position =
            Vector3::new(RING_RADIUS * angle.cos(), 0.0, RING_RADIUS * angle.sin());
        ring.borrow_mut().add(node);
    }
    ring
}

/// Frame hook moving each ring box on a sine wave and spinning the ring.
fn bob(ring: NodeRef) -> FrameHook {
    let mut elapsed = 0.0f32;
    Box::new(move |dt| {
        elapsed += dt.as_secs_f32();
        let mut ring = ring.borrow_mut();
        ring.transform.rotation = cgmath::Quaternion::from_angle_y(RING_SPIN * elapsed);
        let count = ring.children().len().max(1) as f32;
        for (i, child) in ring.children().iter().enumerate() {
            let phase = TAU * i as f32 / count;
            child.borrow_mut().transform.position.y = BOB_HEIGHT * (elapsed * BOB_SPEED + phase).sin();
        }
    })
}

pub fn scene_parameters() -> SceneParameters {
    SceneParameters {
        orbit_controls: true,
        debug_menu: true,
        ..Default::default()
    }
}

/// Opens the about scene in a window (the page canvas on the web).
pub fn run() -> anyhow::Result<()> {
    flow::run(
        scene_parameters(),
        RenderSettings::default(),
        Box::new(|scene| populate(scene)),
    )
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(js_name = runAbout)]
pub fn run_about() -> Result<(), wasm_bindgen::JsValue> {
    run().map_err(|e| wasm_bindgen::JsValue::from_str(&e.to_string()))
}
