//! Instanced pipeline for every sphere and ring in the scene.
//!
//! One shader, six pipeline variants: opaque, alpha-blended and additive,
//! each with back-face culling (spheres) or without it (rings). Lit
//! instances get ambient plus point plus directional Lambert shading; unlit
//! ones keep their flat color.

use std::f32::consts::PI;
use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use orrery_system::{Blend, DrawItem, Lighting};

use crate::buffer::VertexPositionNormal;
use crate::camera::Camera;
use crate::depth::DepthBuffer;

pub const SCENE_SHADER_SOURCE: &str = include_str!("scene.wgsl");

/// Per-frame camera and lights, `@group(0) @binding(0)`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SceneUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub ambient: [f32; 4],
    pub point_light: [f32; 4],
    pub point_color: [f32; 4],
    pub directional: [f32; 4],
}

impl SceneUniform {
    pub fn new(camera: &Camera, lighting: &Lighting) -> Self {
        let [pr, pg, pb] = lighting.point_color.to_linear();
        let p = lighting.point_position;
        let d = lighting.directional_from.normalize_or_zero();
        Self {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            camera_pos: [camera.eye.x, camera.eye.y, camera.eye.z, 1.0],
            ambient: [lighting.ambient, lighting.ambient, lighting.ambient, 0.0],
            // Physical point intensity to Lambert irradiance.
            point_light: [p.x, p.y, p.z, lighting.point_intensity / PI],
            point_color: [pr, pg, pb, 0.0],
            directional: [d.x, d.y, d.z, lighting.directional_intensity],
        }
    }
}

/// Per-instance data, vertex buffer slot 1.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SceneInstance {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub emissive: [f32; 4],
}

impl SceneInstance {
    const ATTRIBUTES: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }

    pub fn from_item(item: &DrawItem) -> Self {
        let [r, g, b] = item.color.to_linear();
        let [er, eg, eb] = item.emissive.to_linear().map(|c| c * item.emissive_intensity);
        Self {
            model: item.transform.to_cols_array_2d(),
            color: [r, g, b, item.opacity],
            emissive: [er, eg, eb, if item.lit { 1.0 } else { 0.0 }],
        }
    }
}

fn blend_state(blend: Blend) -> Option<wgpu::BlendState> {
    match blend {
        Blend::Opaque => None,
        Blend::Alpha => Some(wgpu::BlendState::ALPHA_BLENDING),
        Blend::Additive => Some(wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::Zero,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        }),
    }
}

const BLENDS: [Blend; 3] = [Blend::Opaque, Blend::Alpha, Blend::Additive];

fn variant_index(blend: Blend, double_sided: bool) -> usize {
    let b = match blend {
        Blend::Opaque => 0,
        Blend::Alpha => 1,
        Blend::Additive => 2,
    };
    b * 2 + usize::from(double_sided)
}

pub struct ScenePipeline {
    variants: Vec<wgpu::RenderPipeline>,
    pub scene_bind_group_layout: wgpu::BindGroupLayout,
}

impl ScenePipeline {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene-shader"),
            source: wgpu::ShaderSource::Wgsl(SCENE_SHADER_SOURCE.into()),
        });

        let scene_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("scene-bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(
                            std::mem::size_of::<SceneUniform>() as u64
                        ),
                    },
                    count: None,
                }],
            });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene-pipeline-layout"),
            bind_group_layouts: &[&scene_bind_group_layout],
            immediate_size: 0,
        });

        let mut variants = Vec::with_capacity(6);
        for blend in BLENDS {
            for double_sided in [false, true] {
                debug_assert_eq!(variants.len(), variant_index(blend, double_sided));
                variants.push(create_variant(
                    device,
                    &layout,
                    &shader,
                    surface_format,
                    blend,
                    double_sided,
                ));
            }
        }
        log::debug!("Created {} scene pipeline variants", variants.len());

        Self {
            variants,
            scene_bind_group_layout,
        }
    }

    pub fn variant(&self, blend: Blend, double_sided: bool) -> &wgpu::RenderPipeline {
        &self.variants[variant_index(blend, double_sided)]
    }
}

fn create_variant(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    surface_format: wgpu::TextureFormat,
    blend: Blend,
    double_sided: bool,
) -> wgpu::RenderPipeline {
    let label = format!("scene-{blend:?}-{}", if double_sided { "double" } else { "single" });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[VertexPositionNormal::layout(), SceneInstance::layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: if double_sided {
                None
            } else {
                Some(wgpu::Face::Back)
            },
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: Some(DepthBuffer::stencil_state(blend == Blend::Opaque)),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: blend_state(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};
    use orrery_system::{Rgb, Shape};

    #[test]
    fn test_uniform_and_instance_sizes() {
        assert_eq!(std::mem::size_of::<SceneUniform>(), 144);
        assert_eq!(std::mem::size_of::<SceneInstance>(), 96);
        assert_eq!(SceneInstance::layout().attributes.len(), 6);
    }

    #[test]
    fn test_variant_indices_unique() {
        let mut seen = Vec::new();
        for blend in BLENDS {
            for double_sided in [false, true] {
                seen.push(variant_index(blend, double_sided));
            }
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_opaque_has_no_blend() {
        assert!(blend_state(Blend::Opaque).is_none());
        let additive = blend_state(Blend::Additive).unwrap();
        assert_eq!(additive.color.dst_factor, wgpu::BlendFactor::One);
    }

    #[test]
    fn test_instance_from_item() {
        let item = DrawItem {
            shape: Shape::Sphere,
            transform: Mat4::from_translation(Vec3::new(16.0, 0.0, 0.0)),
            color: Rgb::WHITE,
            emissive: Rgb::WHITE,
            emissive_intensity: 0.2,
            opacity: 0.8,
            blend: Blend::Alpha,
            lit: true,
        };
        let instance = SceneInstance::from_item(&item);
        assert_eq!(instance.model[3], [16.0, 0.0, 0.0, 1.0]);
        assert_eq!(instance.color, [1.0, 1.0, 1.0, 0.8]);
        assert!((instance.emissive[0] - 0.2).abs() < 1e-6);
        assert_eq!(instance.emissive[3], 1.0);
    }

    #[test]
    fn test_uniform_lights() {
        let uniform = SceneUniform::new(&Camera::default(), &Lighting::default());
        assert_eq!(uniform.ambient[0], 0.4);
        assert!((uniform.point_light[3] - 4.0 / PI).abs() < 1e-6);
        let d = Vec3::from_slice(&uniform.directional[..3]);
        assert!((d.length() - 1.0).abs() < 1e-5);
        assert_eq!(uniform.directional[3], 0.5);
    }

    #[test]
    fn test_pipeline_creation() {
        let Some((device, _queue)) = crate::depth::create_test_device() else {
            return;
        };
        let pipeline = ScenePipeline::new(&device, wgpu::TextureFormat::Bgra8UnormSrgb);
        assert_eq!(pipeline.variants.len(), 6);
    }
}
