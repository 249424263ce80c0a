//! # Render Engine
//!
//! A Vulkan resource and frame-orchestration core.
//!
//! ## Features
//!
//! - **RAII resource wrappers**: buffers, images, textures, and uniform
//!   buffers that own their Vulkan handles and memory
//! - **Descriptor layer**: positional binding accumulation with validated
//!   one-write-per-binding updates
//! - **Pipeline builder**: graphics and compute pipelines over a shared
//!   interleaved vertex layout
//! - **Frame orchestration**: N frames in flight with per-frame fences and
//!   semaphores, swapchain recreation on resize
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use render_engine::prelude::*;
//!
//! struct EmptyScene {
//!     renderables: Vec<Renderable>,
//! }
//!
//! impl Scene for EmptyScene {
//!     fn update(&mut self, _stats: &FrameStats) {}
//!
//!     fn renderables(&self) -> &[Renderable] {
//!         &self.renderables
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::new(EngineConfig::default())?;
//!     let mut scene = EmptyScene { renderables: Vec::new() };
//!     engine.run(&mut scene)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod foundation;
pub mod render;

mod engine;

pub use engine::{Engine, EngineConfig, EngineError, Scene};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        foundation::time::{FrameStats, FrameTimer},
        render::{
            mesh::MeshData,
            renderer::{FrameOutcome, Renderer, RendererConfig},
            vulkan::{
                DescriptorBindings, DescriptorPoolManager, DescriptorSetLayout,
                FixedFunctionState, ImageDesc, IndexBuffer, Pipeline, ShaderSet, Texture,
                TextureDescriptor, TextureParams, UboDescriptor, UboType, UniformBuffer,
                Vertex, VertexBuffer, VulkanError, VulkanResult,
            },
            Camera, DescriptorSetSource, Renderable,
        },
        Engine, EngineConfig, EngineError, Scene,
    };
}
