//! Scene lifecycle management.
//!
//! A [`SceneManager`] owns everything a 3D view needs: the scene graph root,
//! a perspective camera, a renderer, and optionally orbit controls and a
//! debug panel. Its hooks follow the life of the view that hosts it:
//!
//! 1. construction starts the self-scheduling frame loop,
//! 2. [`SceneManager::configure`] and [`SceneManager::add_element`] populate
//!    the scene,
//! 3. [`SceneManager::on_resize`] follows the host's viewport,
//! 4. [`SceneManager::on_destroy`] stops the loop and releases every GPU
//!    resource exactly once.

use std::{fmt, sync::Arc};

use instant::Duration;
use winit::{event::WindowEvent, window::Window};

use crate::{
    camera::{OrbitControls, PerspectiveCamera},
    data_structures::scene_graph::Scene,
    debug::DebugPanel,
    elements::SceneElement,
    frame::{Clock, FrameScheduler, Lifetime, WindowScheduler},
    render::{RenderSettings, Renderer, WgpuRenderer},
};

/// Device pixel ratios above this are rendered at this ratio.
pub const MAX_PIXEL_RATIO: f64 = 2.0;

pub const CAMERA_FOV_DEGREES: f32 = 75.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 100.0;

/// Called once per frame with the time since the previous frame.
pub type FrameHook = Box<dyn FnMut(Duration)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SceneParameters {
    /// Viewport width in logical pixels.
    pub width: u32,
    /// Viewport height in logical pixels.
    pub height: u32,
    pub orbit_controls: bool,
    pub debug_menu: bool,
}

impl Default for SceneParameters {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            orbit_controls: false,
            debug_menu: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneState {
    Running,
    Destroyed,
}

/// What [`SceneManager::on_destroy`] released.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisposalReport {
    pub nodes: usize,
    pub geometries: usize,
    pub materials: usize,
}

pub struct SceneManager<R: Renderer> {
    parameters: SceneParameters,
    scene: Scene,
    camera: PerspectiveCamera,
    renderer: R,
    controls: Option<OrbitControls>,
    debug_panel: Option<DebugPanel>,
    frame_hook: Option<FrameHook>,
    scheduler: Box<dyn FrameScheduler>,
    clock: Clock,
    lifetime: Lifetime,
    device_pixel_ratio: f64,
    state: SceneState,
}

impl SceneManager<WgpuRenderer> {
    /// Builds a wgpu renderer for `window` and starts a scene on it.
    pub async fn for_window(
        window: Arc<Window>,
        parameters: SceneParameters,
        settings: RenderSettings,
    ) -> anyhow::Result<Self> {
        let device_pixel_ratio = window.scale_factor();
        let renderer = WgpuRenderer::for_window(window.clone(), settings).await?;
        let scheduler = Box::new(WindowScheduler::new(window));
        Ok(Self::new(renderer, scheduler, parameters, device_pixel_ratio))
    }
}

impl<R: Renderer> SceneManager<R> {
    pub fn new(
        mut renderer: R,
        scheduler: Box<dyn FrameScheduler>,
        parameters: SceneParameters,
        device_pixel_ratio: f64,
    ) -> Self {
        let camera = PerspectiveCamera::new(
            CAMERA_FOV_DEGREES,
            parameters.width as f32 / parameters.height.max(1) as f32,
            CAMERA_NEAR,
            CAMERA_FAR,
        );
        renderer.resize(
            parameters.width,
            parameters.height,
            cap_pixel_ratio(device_pixel_ratio),
        );

        let controls = parameters
            .orbit_controls
            .then(|| OrbitControls::from_camera(&camera));
        let debug_panel = parameters.debug_menu.then(|| DebugPanel::new("Debug"));

        let manager = Self {
            parameters,
            scene: Scene::new(),
            camera,
            renderer,
            controls,
            debug_panel,
            frame_hook: None,
            scheduler,
            clock: Clock::new(),
            lifetime: Lifetime::new(),
            device_pixel_ratio,
            state: SceneState::Running,
        };
        log::info!(
            "scene started at {}x{} (pixel ratio {})",
            parameters.width,
            parameters.height,
            manager.capped_pixel_ratio()
        );
        manager.scheduler.request_frame();
        manager
    }

    /// Runs `callback` once with the scene, camera and renderer. A returned
    /// hook replaces the active frame hook; `None` keeps the current one.
    pub fn configure<F>(&mut self, callback: F)
    where
        F: FnOnce(&mut Scene, &mut PerspectiveCamera, &mut R) -> Option<FrameHook>,
    {
        if self.state == SceneState::Destroyed {
            log::warn!("ignoring configure on a destroyed scene");
            return;
        }
        if let Some(hook) = callback(&mut self.scene, &mut self.camera, &mut self.renderer) {
            if self.frame_hook.replace(hook).is_some() {
                log::debug!("replaced the active frame hook");
            }
        }
        // The callback may have moved the camera.
        if let Some(controls) = &mut self.controls {
            *controls = OrbitControls::from_camera(&self.camera);
        }
    }

    /// Attaches `element`. Its debug fields are registered only when it was
    /// newly attached and a debug panel exists.
    pub fn add_element(&mut self, element: &mut dyn SceneElement) -> bool {
        if self.state == SceneState::Destroyed {
            log::warn!("ignoring add_element on a destroyed scene");
            return false;
        }
        let attached = element.attach(&mut self.scene);
        if let (true, Some(panel)) = (attached, &mut self.debug_panel) {
            element.expose_debug_controls(panel);
        }
        attached
    }

    pub fn on_resize(&mut self, width: u32, height: u32) {
        if self.state == SceneState::Destroyed {
            log::warn!("ignoring resize of a destroyed scene");
            return;
        }
        if width == 0 || height == 0 {
            log::debug!("ignoring resize to {}x{}", width, height);
            return;
        }
        self.parameters.width = width;
        self.parameters.height = height;
        self.camera.aspect = width as f32 / height as f32;
        self.camera.update_projection_matrix();
        self.renderer.resize(width, height, self.capped_pixel_ratio());
    }

    /// Stores the host's device pixel ratio and re-applies the capped ratio.
    pub fn set_device_pixel_ratio(&mut self, ratio: f64) {
        self.device_pixel_ratio = ratio;
        if self.state == SceneState::Running {
            self.renderer.set_pixel_ratio(self.capped_pixel_ratio());
        }
    }

    pub fn capped_pixel_ratio(&self) -> f64 {
        cap_pixel_ratio(self.device_pixel_ratio)
    }

    /// Advances one frame and asks for the next while the scene is alive.
    pub(crate) fn on_frame(&mut self) {
        if !self.lifetime.is_alive() {
            return;
        }
        let dt = self.clock.tick();
        if let Some(controls) = &mut self.controls {
            controls.update(&mut self.camera, dt);
        }
        if let Some(hook) = &mut self.frame_hook {
            hook(dt);
        }
        if let Err(e) = self.renderer.render(&self.scene, &self.camera) {
            log::error!("Unable to render {}", e);
        }
        if self.lifetime.is_alive() {
            self.scheduler.request_frame();
        }
    }

    /// Stops the frame loop, detaches every node and disposes each distinct
    /// geometry and material once. Calling it again does nothing.
    pub fn on_destroy(&mut self) -> DisposalReport {
        if self.state == SceneState::Destroyed {
            return DisposalReport::default();
        }
        self.lifetime.cancel();

        let resources = self.scene.collect_resources();
        self.scene.clear(&resources.nodes);
        self.scene.set_fog(None);
        for material in &resources.materials {
            self.renderer.dispose_material(material);
        }
        for geometry in &resources.geometries {
            self.renderer.dispose_geometry(geometry);
        }
        self.frame_hook = None;
        if let Some(panel) = &mut self.debug_panel {
            panel.clear();
        }
        self.state = SceneState::Destroyed;

        let report = DisposalReport {
            nodes: resources.nodes.len(),
            geometries: resources.geometries.len(),
            materials: resources.materials.len(),
        };
        log::info!("scene destroyed: {:?}", report);
        report
    }

    /// Forwards input to the orbit controls. Returns true if consumed.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match (&mut self.controls, self.state) {
            (Some(controls), SceneState::Running) => controls.handle_window_event(event),
            _ => false,
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn parameters(&self) -> &SceneParameters {
        &self.parameters
    }

    pub fn controls(&self) -> Option<&OrbitControls> {
        self.controls.as_ref()
    }

    pub fn debug_panel(&self) -> Option<&DebugPanel> {
        self.debug_panel.as_ref()
    }

    pub fn state(&self) -> SceneState {
        self.state
    }

    /// A handle to the token that keeps the frame loop going.
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime.clone()
    }
}

fn cap_pixel_ratio(ratio: f64) -> f64 {
    if ratio.is_finite() && ratio > 0.0 {
        ratio.min(MAX_PIXEL_RATIO)
    } else {
        1.0
    }
}

impl<R: Renderer> fmt::Debug for SceneManager<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneManager")
            .field("parameters", &self.parameters)
            .field("state", &self.state)
            .field("nodes", &self.scene.children().len())
            .field("has_frame_hook", &self.frame_hook.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use cgmath::Vector3;

    use super::*;
    use crate::{
        data_structures::{geometry::Geometry, material::Material, scene_graph::Node},
        elements::{BoxElement, Smoke},
        testing::{RecordingRenderer, RecordingScheduler},
    };

    fn manager(parameters: SceneParameters, dpr: f64) -> (SceneManager<RecordingRenderer>, RecordingScheduler) {
        let scheduler = RecordingScheduler::default();
        let manager = SceneManager::new(
            RecordingRenderer::default(),
            Box::new(scheduler.clone()),
            parameters,
            dpr,
        );
        (manager, scheduler)
    }

    #[test]
    fn construction_schedules_the_first_frame() {
        let (manager, scheduler) = manager(SceneParameters::default(), 1.0);

        assert_eq!(scheduler.requests(), 1);
        assert_eq!(manager.state(), SceneState::Running);
        assert_eq!(manager.renderer().size, (800, 600));
        assert_eq!(manager.camera().aspect, 800.0 / 600.0);
        assert!(manager.controls().is_none());
        assert!(manager.debug_panel().is_none());
    }

    #[test]
    fn shared_resources_are_disposed_once() {
        let (mut manager, _) = manager(SceneParameters::default(), 1.0);
        let geometry = Rc::new(Geometry::cuboid(1.0, 1.0, 1.0));
        let material = Rc::new(Material::standard(0x44aa88));

        manager.configure(|scene, _, _| {
            for i in 0..20 {
                let node = Node::mesh("box", geometry.clone(), material.clone());
                node.borrow_mut().transform.position = Vector3::new(i as f32, 0.0, 0.0);
                scene.add(node);
            }
            None
        });
        let report = manager.on_destroy();

        assert_eq!(
            report,
            DisposalReport {
                nodes: 20,
                geometries: 1,
                materials: 1
            }
        );
        assert_eq!(manager.renderer().disposed_geometries, vec![geometry.id()]);
        assert_eq!(manager.renderer().disposed_materials, vec![material.id()]);
        assert!(manager.scene().children().is_empty());
    }

    #[test]
    fn destroy_is_idempotent() {
        let (mut manager, _) = manager(SceneParameters::default(), 1.0);
        manager.add_element(&mut BoxElement::new([1.0, 1.0, 1.0], 0xff0000));

        assert_eq!(manager.on_destroy().geometries, 1);
        assert_eq!(manager.on_destroy(), DisposalReport::default());
        assert_eq!(manager.renderer().disposed_geometries.len(), 1);
    }

    #[test]
    fn resize_sets_exact_aspect() {
        let (mut manager, _) = manager(SceneParameters::default(), 1.0);

        manager.on_resize(1366, 768);

        assert_eq!(manager.camera().aspect, 1366.0 / 768.0);
        assert_eq!(manager.parameters().width, 1366);
        assert_eq!(manager.renderer().size, (1366, 768));
    }

    #[test]
    fn resize_applies_the_drawing_buffer_once() {
        let (mut manager, _) = manager(SceneParameters::default(), 3.0);
        assert_eq!(manager.renderer().size_applications, 1);

        manager.on_resize(1024, 768);

        assert_eq!(manager.renderer().size_applications, 2);
        assert_eq!(manager.renderer().size, (1024, 768));
        assert_eq!(manager.renderer().pixel_ratio, MAX_PIXEL_RATIO);
    }

    #[test]
    fn zero_sized_resize_is_ignored() {
        let (mut manager, _) = manager(SceneParameters::default(), 1.0);

        manager.on_resize(0, 768);

        assert_eq!(manager.parameters().width, 800);
        assert_eq!(manager.camera().aspect, 800.0 / 600.0);
    }

    #[test]
    fn pixel_ratio_is_capped_at_two() {
        let (mut manager, _) = manager(SceneParameters::default(), 3.0);
        assert_eq!(manager.renderer().pixel_ratio, 2.0);

        manager.set_device_pixel_ratio(1.5);
        assert_eq!(manager.renderer().pixel_ratio, 1.5);

        manager.set_device_pixel_ratio(4.0);
        manager.on_resize(640, 480);
        assert_eq!(manager.renderer().pixel_ratio, MAX_PIXEL_RATIO);
    }

    #[test]
    fn frames_reschedule_until_destroyed() {
        let (mut manager, scheduler) = manager(SceneParameters::default(), 1.0);

        manager.on_frame();
        manager.on_frame();
        assert_eq!(scheduler.requests(), 3);
        assert_eq!(manager.renderer().renders, 2);

        manager.on_destroy();
        manager.on_frame();

        assert_eq!(scheduler.requests(), 3);
        assert_eq!(manager.renderer().renders, 2);
    }

    #[test]
    fn cancelling_during_a_frame_stops_the_loop() {
        let (mut manager, scheduler) = manager(SceneParameters::default(), 1.0);
        let lifetime = manager.lifetime();

        manager.configure(move |_, _, _| Some(Box::new(move |_| lifetime.cancel())));
        manager.on_frame();

        assert_eq!(manager.renderer().renders, 1);
        assert_eq!(scheduler.requests(), 1);
    }

    #[test]
    fn render_errors_do_not_stop_the_loop() {
        let (mut manager, scheduler) = manager(SceneParameters::default(), 1.0);
        manager.renderer_mut().fail_renders = true;

        manager.on_frame();

        assert_eq!(scheduler.requests(), 2);
    }

    #[test]
    fn configure_replaces_the_hook_only_when_one_is_returned() {
        let (mut manager, _) = manager(SceneParameters::default(), 1.0);
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));

        let counter = first.clone();
        manager.configure(move |_, _, _| Some(Box::new(move |_| counter.set(counter.get() + 1))));
        manager.on_frame();
        manager.configure(|_, _, _| None);
        manager.on_frame();
        let counter = second.clone();
        manager.configure(move |_, _, _| Some(Box::new(move |_| counter.set(counter.get() + 1))));
        manager.on_frame();

        assert_eq!(first.get(), 2);
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn elements_expose_debug_fields_once() {
        let parameters = SceneParameters {
            debug_menu: true,
            ..Default::default()
        };
        let (mut manager, _) = manager(parameters, 1.0);
        let mut element = BoxElement::new([1.0, 1.0, 1.0], 0xff0000);
        let mut smoke = Smoke::new(0x000000, 1.0, 10.0);

        assert!(manager.add_element(&mut element));
        assert!(!manager.add_element(&mut element));
        assert!(manager.add_element(&mut smoke));

        assert_eq!(manager.scene().children().len(), 1);
        assert_eq!(manager.debug_panel().map(|p| p.len()), Some(4 + 3));
    }

    #[test]
    fn calls_after_destroy_are_ignored() {
        let (mut manager, _) = manager(SceneParameters::default(), 1.0);
        manager.on_destroy();

        manager.on_resize(1024, 768);
        let attached = manager.add_element(&mut BoxElement::new([1.0, 1.0, 1.0], 0xff0000));
        let mut called = false;
        manager.configure(|_, _, _| {
            called = true;
            None
        });

        assert!(!attached);
        assert!(!called);
        assert_eq!(manager.parameters().width, 800);
        assert!(manager.scene().children().is_empty());
    }

    #[test]
    fn orbit_controls_follow_the_camera() {
        let parameters = SceneParameters {
            orbit_controls: true,
            ..Default::default()
        };
        let (mut manager, _) = manager(parameters, 1.0);
        manager.configure(|_, camera, _| {
            camera.position = cgmath::Point3::new(0.0, 0.0, 10.0);
            None
        });

        manager.on_frame();

        assert!(manager.controls().is_some_and(|c| (c.distance() - 10.0).abs() < 1e-4));
        assert!((manager.camera().position.z - 10.0).abs() < 1e-4);
    }
}
