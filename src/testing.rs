//! Stand-ins for the GPU and the display refresh used by in-crate tests.

use std::{cell::Cell, rc::Rc};

use crate::{
    camera::PerspectiveCamera,
    data_structures::{ResourceId, geometry::Geometry, material::Material, scene_graph::Scene},
    frame::FrameScheduler,
    render::Renderer,
};

#[derive(Debug, Default)]
pub(crate) struct RecordingRenderer {
    pub size: (u32, u32),
    pub pixel_ratio: f64,
    /// How often the drawing buffer size was applied.
    pub size_applications: usize,
    pub renders: usize,
    pub fail_renders: bool,
    pub disposed_geometries: Vec<ResourceId>,
    pub disposed_materials: Vec<ResourceId>,
}

impl Renderer for RecordingRenderer {
    fn resize(&mut self, width: u32, height: u32, pixel_ratio: f64) {
        self.size = (width, height);
        self.pixel_ratio = pixel_ratio;
        self.size_applications += 1;
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.pixel_ratio = ratio;
        self.size_applications += 1;
    }

    fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn render(&mut self, _scene: &Scene, _camera: &PerspectiveCamera) -> anyhow::Result<()> {
        self.renders += 1;
        if self.fail_renders {
            anyhow::bail!("surface timed out");
        }
        Ok(())
    }

    fn dispose_geometry(&mut self, geometry: &Geometry) {
        self.disposed_geometries.push(geometry.id());
    }

    fn dispose_material(&mut self, material: &Material) {
        self.disposed_materials.push(material.id());
    }
}

/// Counts frame requests; clones share the count.
#[derive(Clone, Debug, Default)]
pub(crate) struct RecordingScheduler {
    requests: Rc<Cell<usize>>,
}

impl RecordingScheduler {
    pub fn requests(&self) -> usize {
        self.requests.get()
    }
}

impl FrameScheduler for RecordingScheduler {
    fn request_frame(&self) {
        self.requests.set(self.requests.get() + 1);
    }
}
