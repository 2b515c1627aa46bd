//! Perspective camera and orbit controls.

use std::f32::consts::PI;

use cgmath::{EuclideanSpace, InnerSpace, Point3, Vector2, Vector3};
use instant::Duration;
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

/// cgmath produces OpenGL clip space (z in -1..1); wgpu expects z in 0..1.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Clone, Debug)]
pub struct PerspectiveCamera {
    pub fov_y: cgmath::Deg<f32>,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    projection: cgmath::Matrix4<f32>,
}

impl PerspectiveCamera {
    pub fn new(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov_y: cgmath::Deg(fov_y_degrees),
            aspect,
            near,
            far,
            position: Point3::new(0.0, 0.0, 5.0),
            target: Point3::origin(),
            projection: cgmath::Matrix4::from_scale(1.0),
        };
        camera.update_projection_matrix();
        camera
    }

    /// Must be called after changing `fov_y`, `aspect`, `near` or `far`.
    pub fn update_projection_matrix(&mut self) {
        self.projection = cgmath::perspective(self.fov_y, self.aspect, self.near, self.far);
    }

    pub fn projection_matrix(&self) -> cgmath::Matrix4<f32> {
        self.projection
    }

    pub fn view_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::look_at_rh(self.position, self.target, Vector3::unit_y())
    }

    pub fn view_projection(&self) -> cgmath::Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * self.projection * self.view_matrix()
    }
}

const POLAR_EPSILON: f32 = 1e-3;

/// Orbits the camera around a target: left-drag rotates, the wheel zooms.
///
/// Input is accumulated from window events and applied once per frame in
/// [`OrbitControls::update`].
#[derive(Debug)]
pub struct OrbitControls {
    pub target: Point3<f32>,
    /// Radians per dragged pixel.
    pub rotate_speed: f32,
    /// Distance factor per wheel notch.
    pub zoom_scale: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    radius: f32,
    azimuth: f32,
    polar: f32,
    dragging: bool,
    cursor: Option<PhysicalPosition<f64>>,
    pending_rotation: Vector2<f32>,
    pending_zoom: f32,
}

impl OrbitControls {
    pub fn from_camera(camera: &PerspectiveCamera) -> Self {
        let offset = camera.position - camera.target;
        let radius = offset.magnitude().max(f32::EPSILON);
        Self {
            target: camera.target,
            rotate_speed: 0.005,
            zoom_scale: 0.95,
            min_distance: 0.5,
            max_distance: 50.0,
            radius,
            azimuth: offset.x.atan2(offset.z),
            polar: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            dragging: false,
            cursor: None,
            pending_rotation: Vector2::new(0.0, 0.0),
            pending_zoom: 0.0,
        }
    }

    pub fn distance(&self) -> f32 {
        self.radius
    }

    /// Feeds a window event into the controls. Returns true if consumed.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = *state == ElementState::Pressed;
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let (true, Some(last)) = (self.dragging, self.cursor) {
                    self.rotate((position.x - last.x) as f32, (position.y - last.y) as f32);
                }
                self.cursor = Some(*position);
                self.dragging
            }
            WindowEvent::CursorLeft { .. } => {
                self.dragging = false;
                self.cursor = None;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                match delta {
                    MouseScrollDelta::LineDelta(_, y) => self.zoom(*y),
                    MouseScrollDelta::PixelDelta(p) => self.zoom(p.y as f32 / 100.0),
                }
                true
            }
            _ => false,
        }
    }

    /// Queue a rotation in dragged pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.pending_rotation += Vector2::new(dx, dy);
    }

    /// Queue a zoom in wheel notches; positive moves closer.
    pub fn zoom(&mut self, notches: f32) {
        self.pending_zoom += notches;
    }

    pub fn update(&mut self, camera: &mut PerspectiveCamera, _dt: Duration) {
        self.azimuth -= self.pending_rotation.x * self.rotate_speed;
        self.polar = (self.polar - self.pending_rotation.y * self.rotate_speed)
            .clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        self.radius = (self.radius * self.zoom_scale.powf(self.pending_zoom))
            .clamp(self.min_distance, self.max_distance);
        self.pending_rotation = Vector2::new(0.0, 0.0);
        self.pending_zoom = 0.0;

        let (sin_polar, cos_polar) = self.polar.sin_cos();
        let (sin_azimuth, cos_azimuth) = self.azimuth.sin_cos();
        let offset = Vector3::new(
            self.radius * sin_polar * sin_azimuth,
            self.radius * cos_polar,
            self.radius * sin_polar * cos_azimuth,
        );
        camera.target = self.target;
        camera.position = self.target + offset;
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use cgmath::MetricSpace;

    use super::*;

    #[test]
    fn update_without_input_keeps_the_camera_in_place() {
        let mut camera = PerspectiveCamera::new(75.0, 1.5, 0.1, 100.0);
        camera.position = Point3::new(3.0, 2.0, 4.0);
        let mut controls = OrbitControls::from_camera(&camera);

        controls.update(&mut camera, Duration::from_millis(16));

        assert_relative_eq!(camera.position.x, 3.0, epsilon = 1e-4);
        assert_relative_eq!(camera.position.y, 2.0, epsilon = 1e-4);
        assert_relative_eq!(camera.position.z, 4.0, epsilon = 1e-4);
    }

    #[test]
    fn rotating_keeps_the_distance_to_the_target() {
        let mut camera = PerspectiveCamera::new(75.0, 1.5, 0.1, 100.0);
        let mut controls = OrbitControls::from_camera(&camera);

        controls.rotate(120.0, -40.0);
        controls.update(&mut camera, Duration::from_millis(16));

        assert_relative_eq!(camera.position.distance(camera.target), 5.0, epsilon = 1e-4);
        assert!(camera.position.x.abs() > 0.1);
    }

    #[test]
    fn zoom_is_clamped_to_min_distance() {
        let mut camera = PerspectiveCamera::new(75.0, 1.5, 0.1, 100.0);
        let mut controls = OrbitControls::from_camera(&camera);

        controls.zoom(500.0);
        controls.update(&mut camera, Duration::from_millis(16));

        assert_relative_eq!(controls.distance(), controls.min_distance);
    }
}
