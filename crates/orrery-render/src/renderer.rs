//! Frame orchestration: turns a draw list into batched instanced draws.

use std::collections::HashMap;

use glam::Vec3;
use orrery_system::{Blend, DrawItem, Lighting, Shape, Star};

use crate::buffer::{BufferAllocator, DynamicVertexBuffer, MeshBuffer};
use crate::camera::Camera;
use crate::depth::DepthBuffer;
use crate::gpu::{RenderContext, SurfaceError};
use crate::mesh;
use crate::pass::{FrameEncoder, RenderPassBuilder};
use crate::scene_pipeline::{SceneInstance, ScenePipeline, SceneUniform};
use crate::star_pipeline::StarPipeline;

/// Ring radii quantized to a thousandth of a unit, so rings with the same
/// band share one mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RingKey {
    inner: i32,
    outer: i32,
}

impl RingKey {
    pub fn new(inner: f32, outer: f32) -> Self {
        Self {
            inner: (inner * 1000.0).round() as i32,
            outer: (outer * 1000.0).round() as i32,
        }
    }

    pub fn radii(self) -> (f32, f32) {
        (self.inner as f32 / 1000.0, self.outer as f32 / 1000.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshKey {
    Sphere,
    Ring(RingKey),
}

impl MeshKey {
    fn of(shape: Shape) -> Self {
        match shape {
            Shape::Sphere => MeshKey::Sphere,
            Shape::Ring { inner, outer } => MeshKey::Ring(RingKey::new(inner, outer)),
        }
    }

    fn double_sided(self) -> bool {
        matches!(self, MeshKey::Ring(_))
    }
}

/// A run of consecutive instances sharing a mesh and a blend mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub mesh: MeshKey,
    pub blend: Blend,
    pub instances: std::ops::Range<u32>,
}

/// Instance data and draw batches for one frame.
///
/// Opaque items keep their order. Blended items are drawn farthest first
/// within their blend group. Groups go opaque, alpha, additive.
pub fn plan_batches(items: &[DrawItem], eye: Vec3) -> (Vec<SceneInstance>, Vec<Batch>) {
    let mut order: Vec<&DrawItem> = items.iter().collect();
    order.sort_by(|a, b| {
        a.blend.cmp(&b.blend).then_with(|| {
            if a.blend == Blend::Opaque {
                std::cmp::Ordering::Equal
            } else {
                let da = a.origin().distance_squared(eye);
                let db = b.origin().distance_squared(eye);
                db.total_cmp(&da)
            }
        })
    });

    let mut instances = Vec::with_capacity(order.len());
    let mut batches: Vec<Batch> = Vec::new();
    for item in order {
        let index = instances.len() as u32;
        instances.push(SceneInstance::from_item(item));
        let mesh = MeshKey::of(item.shape);
        match batches.last_mut() {
            Some(last) if last.mesh == mesh && last.blend == item.blend => {
                last.instances.end = index + 1;
            }
            _ => batches.push(Batch {
                mesh,
                blend: item.blend,
                instances: index..index + 1,
            }),
        }
    }
    (instances, batches)
}

#[derive(Debug, Clone, Copy)]
pub struct RendererSettings {
    pub sphere_subdivisions: u32,
    pub ring_segments: u32,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            sphere_subdivisions: 3,
            ring_segments: 64,
        }
    }
}

/// Counters for the last rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub instances: u32,
}

pub struct SceneRenderer {
    scene_pipeline: ScenePipeline,
    stars: StarPipeline,
    depth: DepthBuffer,
    uniform_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    sphere: MeshBuffer,
    rings: HashMap<RingKey, MeshBuffer>,
    instances: DynamicVertexBuffer,
    settings: RendererSettings,
    pub lighting: Lighting,
}

impl SceneRenderer {
    pub fn new(ctx: &RenderContext, settings: RendererSettings, stars: &[Star]) -> Self {
        let device = &ctx.device;
        let (width, height) = ctx.size();
        let scene_pipeline = ScenePipeline::new(device, ctx.surface_format);
        let star_pipeline = StarPipeline::new(
            device,
            ctx.surface_format,
            &scene_pipeline.scene_bind_group_layout,
            stars,
        );

        let allocator = BufferAllocator::new(device);
        let uniform = SceneUniform::new(&Camera::default(), &Lighting::default());
        let uniform_buffer =
            allocator.create_uniform_buffer("scene-uniform", bytemuck::bytes_of(&uniform));
        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene-bind-group"),
            layout: &scene_pipeline.scene_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let sphere_data = mesh::icosphere(settings.sphere_subdivisions);
        log::info!(
            "Sphere mesh: {} triangles (subdivision {})",
            sphere_data.triangle_count(),
            settings.sphere_subdivisions
        );
        let sphere = sphere_data.upload(&allocator, "sphere");

        Self {
            scene_pipeline,
            stars: star_pipeline,
            depth: DepthBuffer::new(device, width, height),
            uniform_buffer,
            scene_bind_group,
            sphere,
            rings: HashMap::new(),
            instances: DynamicVertexBuffer::new(device, "scene-instances"),
            settings,
            lighting: Lighting::default(),
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth.resize(device, width, height);
    }

    /// Draw one frame and present it.
    pub fn render(
        &mut self,
        ctx: &RenderContext,
        camera: &Camera,
        items: &[DrawItem],
    ) -> Result<FrameStats, SurfaceError> {
        let (instances, batches) = plan_batches(items, camera.eye);
        self.prepare_meshes(&ctx.device, &batches);

        let uniform = SceneUniform::new(camera, &self.lighting);
        ctx.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
        self.instances
            .write(&ctx.device, &ctx.queue, bytemuck::cast_slice(&instances));

        let surface_texture = ctx.get_current_texture()?;
        let mut frame = FrameEncoder::new(&ctx.device, ctx.queue.clone(), surface_texture);
        let builder = RenderPassBuilder::new().depth(&self.depth).label("scene-pass");
        let mut stats = FrameStats {
            draw_calls: 0,
            instances: instances.len() as u32,
        };
        {
            let mut pass = frame.begin_render_pass(&builder);
            pass.set_bind_group(0, &self.scene_bind_group, &[]);
            pass.set_vertex_buffer(1, self.instances.buffer().slice(..));

            let mut stars_drawn = false;
            for batch in &batches {
                if batch.blend != Blend::Opaque && !stars_drawn {
                    self.stars.draw(&mut pass, &self.scene_bind_group);
                    pass.set_vertex_buffer(1, self.instances.buffer().slice(..));
                    stars_drawn = true;
                    stats.draw_calls += 1;
                }
                let Some(mesh) = self.mesh(batch.mesh) else {
                    continue;
                };
                pass.set_pipeline(self.scene_pipeline.variant(batch.blend, batch.mesh.double_sided()));
                mesh.bind(&mut pass);
                mesh.draw_instanced(&mut pass, batch.instances.clone());
                stats.draw_calls += 1;
            }
            if !stars_drawn {
                self.stars.draw(&mut pass, &self.scene_bind_group);
                stats.draw_calls += 1;
            }
        }
        frame.submit();
        Ok(stats)
    }

    fn mesh(&self, key: MeshKey) -> Option<&MeshBuffer> {
        match key {
            MeshKey::Sphere => Some(&self.sphere),
            MeshKey::Ring(ring) => self.rings.get(&ring),
        }
    }

    fn prepare_meshes(&mut self, device: &wgpu::Device, batches: &[Batch]) {
        for batch in batches {
            if let MeshKey::Ring(key) = batch.mesh
                && !self.rings.contains_key(&key)
            {
                let (inner, outer) = key.radii();
                let data = mesh::ring(inner, outer, self.settings.ring_segments);
                let buffer = data.upload(&BufferAllocator::new(device), "ring");
                log::debug!("Cached ring mesh {inner:.3}..{outer:.3}");
                self.rings.insert(key, buffer);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;
    use orrery_system::Rgb;

    fn item(shape: Shape, blend: Blend, at: Vec3) -> DrawItem {
        DrawItem {
            shape,
            transform: Mat4::from_translation(at),
            color: Rgb::WHITE,
            emissive: Rgb::WHITE,
            emissive_intensity: 0.0,
            opacity: 1.0,
            blend,
            lit: true,
        }
    }

    #[test]
    fn test_ring_key_quantizes() {
        assert_eq!(RingKey::new(15.9, 16.1), RingKey::new(15.9001, 16.0999));
        assert_ne!(RingKey::new(15.9, 16.1), RingKey::new(19.9, 20.1));
        let (inner, outer) = RingKey::new(2.5, 3.2).radii();
        assert!((inner - 2.5).abs() < 1e-6 && (outer - 3.2).abs() < 1e-6);
    }

    #[test]
    fn test_consecutive_spheres_share_a_batch() {
        let items: Vec<DrawItem> = (0..5)
            .map(|i| item(Shape::Sphere, Blend::Opaque, Vec3::X * i as f32))
            .collect();
        let (instances, batches) = plan_batches(&items, Vec3::ZERO);
        assert_eq!(instances.len(), 5);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].instances, 0..5);
    }

    #[test]
    fn test_batches_tile_the_instance_range() {
        let items = vec![
            item(Shape::Sphere, Blend::Opaque, Vec3::ZERO),
            item(Shape::Sphere, Blend::Alpha, Vec3::X),
            item(Shape::Sphere, Blend::Additive, Vec3::Y),
        ];
        let (instances, batches) = plan_batches(&items, Vec3::ZERO);
        let mut next = 0;
        for batch in batches.iter().cloned() {
            assert_eq!(batch.instances.start, next);
            next = batch.instances.end;
        }
        assert_eq!(next as usize, instances.len());
    }

    #[test]
    fn test_blend_groups_ordered() {
        let items = [
            item(Shape::Sphere, Blend::Additive, Vec3::ZERO),
            item(Shape::Sphere, Blend::Opaque, Vec3::ZERO),
            item(Shape::Sphere, Blend::Alpha, Vec3::ZERO),
        ];
        let (_, batches) = plan_batches(&items, Vec3::Z * 50.0);
        let blends: Vec<Blend> = batches.iter().map(|b| b.blend).collect();
        assert_eq!(blends, vec![Blend::Opaque, Blend::Alpha, Blend::Additive]);
    }

    #[test]
    fn test_blended_items_far_to_near() {
        let ring = Shape::Ring {
            inner: 1.0,
            outer: 2.0,
        };
        let items = [
            item(ring, Blend::Alpha, Vec3::new(0.0, 0.0, 40.0)),
            item(ring, Blend::Alpha, Vec3::new(0.0, 0.0, -40.0)),
        ];
        let (instances, batches) = plan_batches(&items, Vec3::new(0.0, 0.0, 50.0));
        assert_eq!(instances[0].model[3][2], -40.0);
        assert_eq!(instances[1].model[3][2], 40.0);
        assert_eq!(batches.len(), 1);
    }

    #[test]
    fn test_different_rings_split_batches() {
        let items = [
            item(
                Shape::Ring {
                    inner: 1.0,
                    outer: 2.0,
                },
                Blend::Alpha,
                Vec3::ZERO,
            ),
            item(
                Shape::Ring {
                    inner: 3.0,
                    outer: 4.0,
                },
                Blend::Alpha,
                Vec3::ZERO,
            ),
        ];
        let (_, batches) = plan_batches(&items, Vec3::Z);
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|b| b.mesh.double_sided()));
    }

    #[test]
    fn test_full_scene_batches_cover_every_item() {
        let belt = orrery_system::AsteroidBelt::generate(3, 200);
        let items = orrery_system::scene::compose(
            &orrery_system::OrbitState::new(),
            &orrery_system::UiState::default(),
            None,
            &belt,
        );
        let (instances, batches) = plan_batches(&items, Vec3::new(0.0, 20.0, 50.0));
        assert_eq!(instances.len(), items.len());
        let covered: u32 = batches.iter().map(|b| b.instances.len() as u32).sum();
        assert_eq!(covered as usize, items.len());
        // Planets and rocks are opaque spheres and collapse into one draw.
        assert_eq!(batches[0].instances.len(), 1 + 8 + 200);
    }
}
