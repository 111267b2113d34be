//! Background stars as a static point list.

use bytemuck::{Pod, Zeroable};
use orrery_system::Star;

use crate::buffer::BufferAllocator;
use crate::depth::DepthBuffer;

pub const STAR_SHADER_SOURCE: &str = include_str!("stars.wgsl");

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct StarVertex {
    pub position: [f32; 3],
    pub brightness: f32,
}

impl StarVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

impl From<&Star> for StarVertex {
    fn from(star: &Star) -> Self {
        Self {
            position: star.position.to_array(),
            brightness: star.brightness,
        }
    }
}

/// Star points and the pipeline that draws them. Depth tested against the
/// scene but never written.
pub struct StarPipeline {
    pipeline: wgpu::RenderPipeline,
    vertices: wgpu::Buffer,
    count: u32,
}

impl StarPipeline {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        scene_bind_group_layout: &wgpu::BindGroupLayout,
        stars: &[Star],
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("star-shader"),
            source: wgpu::ShaderSource::Wgsl(STAR_SHADER_SOURCE.into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("star-pipeline-layout"),
            bind_group_layouts: &[scene_bind_group_layout],
            immediate_size: 0,
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("star-pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[StarVertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::PointList,
                ..Default::default()
            },
            depth_stencil: Some(DepthBuffer::stencil_state(false)),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        let data: Vec<StarVertex> = stars.iter().map(StarVertex::from).collect();
        let vertices =
            BufferAllocator::new(device).create_vertex_buffer("star-vertices", bytemuck::cast_slice(&data));
        log::info!("Star backdrop: {} points", data.len());

        Self {
            pipeline,
            vertices,
            count: data.len() as u32,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, scene_bind_group: &wgpu::BindGroup) {
        if self.count == 0 {
            return;
        }
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, scene_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertices.slice(..));
        render_pass.draw(0..self.count, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_star_vertex_layout() {
        assert_eq!(StarVertex::layout().array_stride, 16);
        assert_eq!(StarVertex::layout().attributes[1].offset, 12);
    }

    #[test]
    fn test_star_vertex_from_star() {
        let star = Star {
            position: Vec3::new(300.0, 0.0, 0.0),
            brightness: 0.7,
            size: 1.5,
        };
        let v = StarVertex::from(&star);
        assert_eq!(v.position, [300.0, 0.0, 0.0]);
        assert_eq!(v.brightness, 0.7);
    }
}
