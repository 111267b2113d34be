//! wgpu rendering for the orrery: device and surface, reverse-Z depth,
//! generated meshes, the instanced scene pipeline and the star backdrop.

pub mod buffer;
pub mod camera;
pub mod depth;
pub mod gpu;
pub mod mesh;
pub mod pass;
pub mod renderer;
pub mod scene_pipeline;
pub mod star_pipeline;

pub use buffer::{BufferAllocator, DynamicVertexBuffer, IndexData, MeshBuffer, VertexPositionNormal};
pub use camera::Camera;
pub use depth::DepthBuffer;
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use mesh::{MeshData, icosphere, ring};
pub use pass::{FrameEncoder, RenderPassBuilder, SPACE_BLACK};
pub use renderer::{Batch, FrameStats, MeshKey, RendererSettings, RingKey, SceneRenderer, plan_batches};
pub use scene_pipeline::{SceneInstance, ScenePipeline, SceneUniform};
pub use star_pipeline::{StarPipeline, StarVertex};
