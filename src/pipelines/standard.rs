use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Vector3};
use wgpu::util::DeviceExt;

use crate::{
    camera::{OPENGL_TO_WGPU_MATRIX, PerspectiveCamera},
    data_structures::{
        geometry::{ModelVertex, Vertex},
        instance::InstanceRaw,
        material::{Material, MaterialUniform},
        scene_graph::{LightShadow, NodeKind, Scene},
        texture::{ShadowMap, Texture},
    },
    render::{RenderSettings, ToneMapping},
};

/// Directional lights beyond this count are ignored by the shader.
pub const MAX_LIGHTS: usize = 4;

/// Depth offset, in shadow map depth units, against shadow acne.
const SHADOW_BIAS: f32 = 0.002;

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    // xyz: direction the light travels, w: intensity
    direction: [f32; 4],
    // rgb: linear colour, w unused
    color: [f32; 4],
}

/// Per-frame data shared by every draw call.
///
/// Everything is packed into `vec4`s so the layout is identical under the
/// WebGL uniform rules. Only the first shadow-casting light gets a shadow
/// map.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniform {
    view_proj: [[f32; 4]; 4],
    light_view_proj: [[f32; 4]; 4],
    // xyz: camera position, w: active light count
    camera_position: [f32; 4],
    // rgb: linear fog colour, w: fog near
    fog_color: [f32; 4],
    // x: fog far, y: fog enabled, z: tone mapping enabled, w: exposure
    fog_params: [f32; 4],
    // rgb: ambient irradiance
    ambient: [f32; 4],
    // x: shadows enabled, y: index of the casting light, z: depth bias,
    // w: shadow map size in texels
    shadow_params: [f32; 4],
    lights: [LightUniform; MAX_LIGHTS],
}

impl SceneUniform {
    pub fn new(scene: &Scene, camera: &PerspectiveCamera, settings: &RenderSettings) -> Self {
        let mut lights = [LightUniform::default(); MAX_LIGHTS];
        let mut light_count = 0;
        let mut light_view_proj = Matrix4::from_scale(1.0);
        let mut shadow_params = [0.0; 4];
        let mut has_caster = false;
        scene.traverse_world(&mut |node, world| {
            if let NodeKind::DirectionalLight(light) = &node.kind {
                if light_count == MAX_LIGHTS {
                    log::debug!("ignoring light {}: at most {} are drawn", node.name, MAX_LIGHTS);
                    return;
                }
                let direction = light_direction(world.position);
                let [r, g, b] = light.color.to_linear();
                lights[light_count] = LightUniform {
                    direction: [direction.x, direction.y, direction.z, light.intensity],
                    color: [r, g, b, 0.0],
                };
                if let (Some(shadow), false) = (&light.shadow, has_caster) {
                    light_view_proj = light_view_projection(world.position, shadow);
                    shadow_params = [1.0, light_count as f32, SHADOW_BIAS, shadow.map_size as f32];
                    has_caster = true;
                }
                light_count += 1;
            }
        });

        let (fog_color, fog_params) = match scene.fog() {
            Some(fog) => {
                let [r, g, b] = fog.color.to_linear();
                ([r, g, b, fog.near], [fog.far, 1.0, 0.0, 0.0])
            }
            None => ([0.0; 4], [0.0; 4]),
        };
        let tone_mapping = match settings.tone_mapping {
            ToneMapping::AcesFilmic => 1.0,
            ToneMapping::None => 0.0,
        };
        let [ar, ag, ab] = settings.ambient_color.to_linear();
        let p = camera.position;

        Self {
            view_proj: camera.view_projection().into(),
            light_view_proj: light_view_proj.into(),
            camera_position: [p.x, p.y, p.z, light_count as f32],
            fog_color,
            fog_params: [fog_params[0], fog_params[1], tone_mapping, settings.exposure],
            ambient: [
                ar * settings.ambient_intensity,
                ag * settings.ambient_intensity,
                ab * settings.ambient_intensity,
                0.0,
            ],
            shadow_params,
            lights,
        }
    }

    pub fn light_count(&self) -> usize {
        self.camera_position[3] as usize
    }

    /// Size of the shadow map the casting light asks for, if any light casts
    /// shadows.
    pub fn shadow_map_size(&self) -> Option<u32> {
        (self.shadow_params[0] > 0.5).then_some(self.shadow_params[3] as u32)
    }
}

/// Lights shine from their position towards the world origin.
fn light_direction(position: Vector3<f32>) -> Vector3<f32> {
    if position.magnitude2() <= f32::EPSILON {
        -Vector3::unit_y()
    } else {
        -position.normalize()
    }
}

/// Clip space of the shadow camera of a light at `position`.
pub fn light_view_projection(position: Vector3<f32>, shadow: &LightShadow) -> Matrix4<f32> {
    let direction = light_direction(position);
    let up = if direction.y.abs() > 0.99 {
        Vector3::unit_z()
    } else {
        Vector3::unit_y()
    };
    let view = Matrix4::look_to_rh(Point3::from_vec(position), direction, up);
    let e = shadow.extent;
    let projection = cgmath::ortho(-e, e, -e, e, shadow.near, shadow.far);
    OPENGL_TO_WGPU_MATRIX * projection * view
}

fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some(label),
    })
}

/// A uniform buffer together with the bind group exposing it.
#[derive(Debug)]
pub struct UniformBinding {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl UniformBinding {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str, contents: &[u8]) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some(label),
        });
        Self { buffer, bind_group }
    }
}

/// The scene uniform, bound once with the shadow map for the lit pass and
/// once on its own for the shadow pass.
#[derive(Debug)]
pub struct SceneBinding {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub shadow_bind_group: wgpu::BindGroup,
}

/// The lit, opaque pipeline every mesh is drawn with, and the depth-only
/// pipeline rendering shadow casters from the light.
#[derive(Debug)]
pub struct StandardPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub shadow_pipeline: wgpu::RenderPipeline,
    pub scene_layout: wgpu::BindGroupLayout,
    pub shadow_layout: wgpu::BindGroupLayout,
    pub material_layout: wgpu::BindGroupLayout,
}

impl StandardPipeline {
    pub fn new(device: &wgpu::Device, color_format: wgpu::TextureFormat) -> Self {
        let scene_layout = scene_layout(device);
        let shadow_layout = uniform_layout(device, "shadow_bind_group_layout");
        let material_layout = uniform_layout(device, "material_bind_group_layout");
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Standard Pipeline Layout"),
            bind_group_layouts: &[&scene_layout, &material_layout],
            push_constant_ranges: &[],
        });
        let pipeline = super::mk_render_pipeline(
            device,
            &layout,
            color_format,
            Some(wgpu::BlendState::REPLACE),
            Some(Texture::DEPTH_FORMAT),
            &[ModelVertex::desc(), InstanceRaw::desc()],
            shader(),
        );
        let shadow_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shadow Pipeline Layout"),
            bind_group_layouts: &[&shadow_layout],
            push_constant_ranges: &[],
        });
        let shadow_pipeline = super::shadow::mk_shadow_pipeline(
            device,
            &shadow_pipeline_layout,
            &[ModelVertex::desc(), InstanceRaw::desc()],
            shader(),
        );
        Self {
            pipeline,
            shadow_pipeline,
            scene_layout,
            shadow_layout,
            material_layout,
        }
    }

    pub fn scene_binding(
        &self,
        device: &wgpu::Device,
        uniform: &SceneUniform,
        shadow_map: &ShadowMap,
    ) -> SceneBinding {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("scene_uniform"),
            contents: bytemuck::cast_slice(&[*uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = self.lit_bind_group(device, &buffer, shadow_map);
        let shadow_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.shadow_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("shadow_bind_group"),
        });
        SceneBinding {
            buffer,
            bind_group,
            shadow_bind_group,
        }
    }

    /// Binds `binding` to a new shadow map, e.g. after the casting light
    /// asked for another map size.
    pub fn rebind_shadow_map(&self, device: &wgpu::Device, binding: &mut SceneBinding, shadow_map: &ShadowMap) {
        binding.bind_group = self.lit_bind_group(device, &binding.buffer, shadow_map);
    }

    fn lit_bind_group(&self, device: &wgpu::Device, buffer: &wgpu::Buffer, shadow_map: &ShadowMap) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.scene_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&shadow_map.depth.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&shadow_map.sampler),
                },
            ],
            label: Some("scene_bind_group"),
        })
    }

    pub fn material_binding(&self, device: &wgpu::Device, material: &Material) -> UniformBinding {
        let uniform: MaterialUniform = material.to_uniform();
        UniformBinding::new(
            device,
            &self.material_layout,
            &material.name,
            bytemuck::cast_slice(&[uniform]),
        )
    }
}

fn shader() -> wgpu::ShaderModuleDescriptor<'static> {
    wgpu::ShaderModuleDescriptor {
        label: Some("Standard Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("standard.wgsl").into()),
    }
}

fn scene_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Depth,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                count: None,
            },
        ],
        label: Some("scene_bind_group_layout"),
    })
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use approx::assert_relative_eq;

    use super::*;
    use crate::data_structures::{
        color::Color,
        scene_graph::{DirectionalLight, Fog, Node},
    };

    fn light_at(position: Vector3<f32>) -> crate::data_structures::scene_graph::NodeRef {
        shadow_light_at(position, None)
    }

    fn shadow_light_at(
        position: Vector3<f32>,
        shadow: Option<LightShadow>,
    ) -> crate::data_structures::scene_graph::NodeRef {
        let node = Node::directional_light(
            "light",
            DirectionalLight {
                color: Color::WHITE,
                intensity: 3.0,
                shadow,
            },
        );
        node.borrow_mut().transform.position = position;
        node
    }

    #[test]
    fn lights_point_at_the_origin_and_are_capped() {
        let mut scene = Scene::new();
        for _ in 0..(MAX_LIGHTS + 2) {
            scene.add(light_at(Vector3::new(0.0, 10.0, 0.0)));
        }
        let camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 100.0);

        let uniform = SceneUniform::new(&scene, &camera, &RenderSettings::default());

        assert_eq!(uniform.light_count(), MAX_LIGHTS);
        assert_relative_eq!(uniform.lights[0].direction[1], -1.0);
        assert_relative_eq!(uniform.lights[0].direction[3], 3.0);
    }

    #[test]
    fn fog_is_disabled_without_fog() {
        let mut scene = Scene::new();
        let camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 100.0);

        let uniform = SceneUniform::new(&scene, &camera, &RenderSettings::default());
        assert_eq!(uniform.fog_params[1], 0.0);

        scene.set_fog(Some(Rc::new(RefCell::new(Fog {
            color: Color::BLACK,
            near: 2.0,
            far: 30.0,
        }))));
        let uniform = SceneUniform::new(&scene, &camera, &RenderSettings::default());
        assert_eq!(uniform.fog_params[..2], [30.0, 1.0]);
        assert_eq!(uniform.fog_color[3], 2.0);
    }

    #[test]
    fn shadows_follow_the_first_casting_light() {
        let mut scene = Scene::new();
        let camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 100.0);
        scene.add(light_at(Vector3::new(0.0, 5.0, 5.0)));

        let uniform = SceneUniform::new(&scene, &camera, &RenderSettings::default());
        assert_eq!(uniform.shadow_map_size(), None);

        scene.add(shadow_light_at(Vector3::new(0.0, 10.0, 0.0), Some(LightShadow::default())));
        scene.add(shadow_light_at(
            Vector3::new(3.0, 3.0, 3.0),
            Some(LightShadow {
                map_size: 256,
                ..Default::default()
            }),
        ));
        let uniform = SceneUniform::new(&scene, &camera, &RenderSettings::default());

        assert_eq!(uniform.shadow_map_size(), Some(1024));
        assert_eq!(uniform.shadow_params[1], 1.0);
    }

    #[test]
    fn shadow_camera_looks_at_the_origin() {
        let shadow = LightShadow::default();
        let m = light_view_projection(Vector3::new(0.0, 10.0, 0.0), &shadow);

        let origin = m * cgmath::Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(origin.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(origin.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(origin.z, (10.0 - shadow.near) / (shadow.far - shadow.near), epsilon = 1e-5);

        let edge = m * cgmath::Vector4::new(shadow.extent, 0.0, 0.0, 1.0);
        assert_relative_eq!(edge.x.abs(), 1.0, epsilon = 1e-5);
    }
}
