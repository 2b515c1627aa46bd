use std::cell::Cell;

use crate::data_structures::{ResourceId, color::Color};

/// A lit surface material.
///
/// Properties sit behind `Cell`s: materials are shared through `Rc` between
/// meshes and debug-panel bindings, and a write from the panel must show up
/// on the next frame for every mesh using the material.
#[derive(Debug)]
pub struct Material {
    id: ResourceId,
    pub name: String,
    color: Cell<Color>,
    roughness: Cell<f32>,
    metalness: Cell<f32>,
    unlit: bool,
}

impl Material {
    pub fn standard(color: impl Into<Color>) -> Self {
        Self {
            id: ResourceId::next(),
            name: "standard".to_string(),
            color: Cell::new(color.into()),
            roughness: Cell::new(1.0),
            metalness: Cell::new(0.0),
            unlit: false,
        }
    }

    /// A flat colour that ignores lights and neither casts nor receives
    /// shadows. Used for helpers.
    pub fn unlit(color: impl Into<Color>) -> Self {
        Self {
            name: "unlit".to_string(),
            unlit: true,
            ..Self::standard(color)
        }
    }

    pub fn with_roughness(self, roughness: f32) -> Self {
        self.roughness.set(roughness.clamp(0.0, 1.0));
        self
    }

    pub fn with_metalness(self, metalness: f32) -> Self {
        self.metalness.set(metalness.clamp(0.0, 1.0));
        self
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn color(&self) -> Color {
        self.color.get()
    }

    pub fn set_color(&self, color: Color) {
        self.color.set(color);
    }

    pub fn roughness(&self) -> f32 {
        self.roughness.get()
    }

    pub fn metalness(&self) -> f32 {
        self.metalness.get()
    }

    pub fn is_unlit(&self) -> bool {
        self.unlit
    }

    pub(crate) fn to_uniform(&self) -> MaterialUniform {
        let [r, g, b] = self.color().to_linear();
        MaterialUniform {
            color: [r, g, b, 1.0],
            params: [
                self.roughness(),
                self.metalness(),
                if self.unlit { 1.0 } else { 0.0 },
                0.0,
            ],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    color: [f32; 4],
    // x: roughness, y: metalness, z: unlit
    params: [f32; 4],
}
