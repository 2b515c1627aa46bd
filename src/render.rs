//! Drawing a [`Scene`] through a [`PerspectiveCamera`].
//!
//! [`Renderer`] is the seam between the scene lifecycle and the GPU. The
//! [`WgpuRenderer`] uploads geometries and materials on first use and keeps
//! them keyed by [`ResourceId`], so meshes sharing a geometry share its
//! buffers. Every frame, meshes are batched by (geometry, material) and drawn
//! instanced from a single instance buffer. When a light casts shadows, a
//! depth pass from the light fills the shadow map first; unlit meshes (light
//! helpers) do not cast.
//!
//! Sizes passed to a renderer are logical (CSS) pixels; the drawing buffer is
//! `size * pixel_ratio` physical pixels.

use std::{collections::HashMap, iter, rc::Rc, sync::Arc};

use winit::window::Window;

use crate::{
    camera::PerspectiveCamera,
    context::Context,
    data_structures::{
        ResourceId,
        color::Color,
        geometry::Geometry,
        instance::InstanceRaw,
        material::Material,
        scene_graph::{LightShadow, NodeKind, Scene},
        texture::ShadowMap,
    },
    pipelines::standard::{SceneBinding, SceneUniform, StandardPipeline, UniformBinding},
};

pub trait Renderer {
    /// Sets the viewport size in logical pixels together with the pixel
    /// ratio, applying the drawing buffer size once.
    fn resize(&mut self, width: u32, height: u32, pixel_ratio: f64);
    fn size(&self) -> (u32, u32);
    fn set_pixel_ratio(&mut self, ratio: f64);
    fn pixel_ratio(&self) -> f64;
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> anyhow::Result<()>;
    /// Releases the GPU data of `geometry`. Disposing something that was
    /// never uploaded is a no-op.
    fn dispose_geometry(&mut self, geometry: &Geometry);
    fn dispose_material(&mut self, material: &Material);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ToneMapping {
    #[default]
    AcesFilmic,
    None,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderSettings {
    pub tone_mapping: ToneMapping,
    pub exposure: f32,
    pub ambient_color: Color,
    pub ambient_intensity: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            tone_mapping: ToneMapping::AcesFilmic,
            exposure: 1.0,
            ambient_color: Color::WHITE,
            ambient_intensity: 0.4,
        }
    }
}

/// Drawing buffer size for a logical size at `ratio`.
pub fn physical_size(width: u32, height: u32, ratio: f64) -> (u32, u32) {
    (
        (width as f64 * ratio).round() as u32,
        (height as f64 * ratio).round() as u32,
    )
}

#[derive(Debug)]
struct GpuGeometry {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// Meshes drawn with one draw call.
struct Batch {
    geometry: Rc<Geometry>,
    material: Rc<Material>,
    instances: Vec<InstanceRaw>,
}

const MIN_INSTANCE_CAPACITY: usize = 16;

pub struct WgpuRenderer {
    ctx: Context,
    settings: RenderSettings,
    pipeline: StandardPipeline,
    scene_binding: SceneBinding,
    shadow_map: ShadowMap,
    geometries: HashMap<ResourceId, GpuGeometry>,
    materials: HashMap<ResourceId, UniformBinding>,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    size: (u32, u32),
    pixel_ratio: f64,
}

impl WgpuRenderer {
    pub fn new(ctx: Context, settings: RenderSettings) -> Self {
        let pipeline = StandardPipeline::new(&ctx.device, ctx.config.format);
        let camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 100.0);
        let shadow_map = ShadowMap::new(&ctx.device, LightShadow::default().map_size);
        let scene_binding = pipeline.scene_binding(
            &ctx.device,
            &SceneUniform::new(&Scene::new(), &camera, &settings),
            &shadow_map,
        );
        let instance_buffer = create_instance_buffer(&ctx.device, MIN_INSTANCE_CAPACITY);
        let size = (ctx.config.width, ctx.config.height);
        Self {
            ctx,
            settings,
            pipeline,
            scene_binding,
            shadow_map,
            geometries: HashMap::new(),
            materials: HashMap::new(),
            instance_buffer,
            instance_capacity: MIN_INSTANCE_CAPACITY,
            size,
            pixel_ratio: 1.0,
        }
    }

    /// Creates the GPU context for `window` and a renderer on top of it.
    pub async fn for_window(window: Arc<Window>, settings: RenderSettings) -> anyhow::Result<Self> {
        let ctx = Context::new(window).await?;
        Ok(Self::new(ctx, settings))
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn settings_mut(&mut self) -> &mut RenderSettings {
        &mut self.settings
    }

    fn apply_size(&mut self) {
        let (width, height) = physical_size(self.size.0, self.size.1, self.pixel_ratio);
        if !self.ctx.resize(width, height) {
            log::debug!("not resizing the drawing buffer to {}x{}", width, height);
        }
    }

    /// Recreates the shadow map when the casting light asks for another size.
    fn ensure_shadow_map(&mut self, size: u32) {
        if self.shadow_map.size() == size.max(1) {
            return;
        }
        log::debug!("resizing the shadow map to {}x{}", size, size);
        self.shadow_map.depth.texture.destroy();
        self.shadow_map = ShadowMap::new(&self.ctx.device, size);
        self.pipeline
            .rebind_shadow_map(&self.ctx.device, &mut self.scene_binding, &self.shadow_map);
    }

    fn upload_geometry(&mut self, geometry: &Geometry) {
        if self.geometries.contains_key(&geometry.id()) {
            return;
        }
        use wgpu::util::DeviceExt;
        log::debug!("uploading geometry {} ({:?})", geometry.name, geometry.id());
        let vertex_buffer = self
            .ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Vertex Buffer", geometry.name)),
                contents: bytemuck::cast_slice(geometry.vertices()),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Index Buffer", geometry.name)),
                contents: bytemuck::cast_slice(geometry.indices()),
                usage: wgpu::BufferUsages::INDEX,
            });
        self.geometries.insert(
            geometry.id(),
            GpuGeometry {
                vertex_buffer,
                index_buffer,
                index_count: geometry.indices().len() as u32,
            },
        );
    }

    fn upload_material(&mut self, material: &Material) {
        match self.materials.get(&material.id()) {
            Some(binding) => self.ctx.queue.write_buffer(
                &binding.buffer,
                0,
                bytemuck::cast_slice(&[material.to_uniform()]),
            ),
            None => {
                let binding = self.pipeline.material_binding(&self.ctx.device, material);
                self.materials.insert(material.id(), binding);
            }
        }
    }

    fn write_instances(&mut self, instances: &[InstanceRaw]) {
        if instances.len() > self.instance_capacity {
            self.instance_capacity = instances.len().next_power_of_two();
            self.instance_buffer.destroy();
            self.instance_buffer = create_instance_buffer(&self.ctx.device, self.instance_capacity);
        }
        if !instances.is_empty() {
            self.ctx
                .queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(instances));
        }
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Instance Buffer"),
        size: (capacity * std::mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn collect_batches(scene: &Scene) -> Vec<Batch> {
    let mut batches: Vec<Batch> = Vec::new();
    let mut index: HashMap<(ResourceId, ResourceId), usize> = HashMap::new();
    scene.traverse_world(&mut |node, world| {
        if let NodeKind::Mesh(mesh) = &node.kind {
            let key = (mesh.geometry.id(), mesh.material.id());
            let i = *index.entry(key).or_insert_with(|| {
                batches.push(Batch {
                    geometry: mesh.geometry.clone(),
                    material: mesh.material.clone(),
                    instances: Vec::new(),
                });
                batches.len() - 1
            });
            batches[i].instances.push(world.to_raw());
        }
    });
    batches
}

impl Renderer for WgpuRenderer {
    fn resize(&mut self, width: u32, height: u32, pixel_ratio: f64) {
        self.size = (width, height);
        self.pixel_ratio = pixel_ratio;
        self.apply_size();
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.pixel_ratio = ratio;
        self.apply_size();
    }

    fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> anyhow::Result<()> {
        let batches = collect_batches(scene);
        for batch in &batches {
            self.upload_geometry(&batch.geometry);
            self.upload_material(&batch.material);
        }
        let instances: Vec<InstanceRaw> = batches
            .iter()
            .flat_map(|b| b.instances.iter().copied())
            .collect();
        self.write_instances(&instances);

        let uniform = SceneUniform::new(scene, camera, &self.settings);
        let shadow_map_size = uniform.shadow_map_size();
        if let Some(size) = shadow_map_size {
            self.ensure_shadow_map(size);
        }
        self.ctx.queue.write_buffer(
            &self.scene_binding.buffer,
            0,
            bytemuck::cast_slice(&[uniform]),
        );

        let output = match self.ctx.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost or outdated, reconfiguring");
                self.ctx.reconfigure();
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        if shadow_map_size.is_some() {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_map.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            shadow_pass.set_pipeline(&self.pipeline.shadow_pipeline);
            shadow_pass.set_bind_group(0, &self.scene_binding.shadow_bind_group, &[]);
            shadow_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            let mut first_instance = 0u32;
            for batch in &batches {
                let count = batch.instances.len() as u32;
                if let (false, Some(geometry)) = (
                    batch.material.is_unlit(),
                    self.geometries.get(&batch.geometry.id()),
                ) {
                    shadow_pass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
                    shadow_pass
                        .set_index_buffer(geometry.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    shadow_pass.draw_indexed(
                        0..geometry.index_count,
                        0,
                        first_instance..first_instance + count,
                    );
                }
                first_instance += count;
            }
        }
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(scene.background.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.pipeline.pipeline);
            render_pass.set_bind_group(0, &self.scene_binding.bind_group, &[]);
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

            let mut first_instance = 0u32;
            for batch in &batches {
                let count = batch.instances.len() as u32;
                let (Some(geometry), Some(material)) = (
                    self.geometries.get(&batch.geometry.id()),
                    self.materials.get(&batch.material.id()),
                ) else {
                    first_instance += count;
                    continue;
                };
                render_pass.set_bind_group(1, &material.bind_group, &[]);
                render_pass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
                render_pass.set_index_buffer(geometry.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(
                    0..geometry.index_count,
                    0,
                    first_instance..first_instance + count,
                );
                first_instance += count;
            }
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn dispose_geometry(&mut self, geometry: &Geometry) {
        if let Some(gpu) = self.geometries.remove(&geometry.id()) {
            gpu.vertex_buffer.destroy();
            gpu.index_buffer.destroy();
        }
    }

    fn dispose_material(&mut self, material: &Material) {
        if let Some(binding) = self.materials.remove(&material.id()) {
            binding.buffer.destroy();
        }
    }
}
