//! Vulkan rendering backend
//!
//! Low-level wrappers over the ash API following RAII ownership rules:
//! every resource owns its handle and releases it on drop, in reverse
//! order of creation.

pub mod buffer;
pub mod commands;
pub mod context;
pub mod descriptor;
pub mod framebuffer;
pub mod image;
pub mod layout;
pub mod memory;
pub mod pipeline;
pub mod render_pass;
pub mod shader;
pub mod swapchain;
pub mod sync;
pub mod texture;
pub mod uniform_buffer;
pub mod vertex_layout;
pub mod window;

use ash::vk;
use thiserror::Error;

/// Vulkan-specific error types
#[derive(Error, Debug)]
pub enum VulkanError {
    /// General Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// Invalid operation attempted
    #[error("Invalid operation: {reason}")]
    InvalidOperation {
        /// Description of why the operation is invalid
        reason: String,
    },

    /// Vulkan context initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// No memory type satisfies both the type filter and the property flags
    #[error("No suitable memory type found")]
    NoSuitableMemoryType,

    /// Image layout transition pair without a defined barrier mapping
    #[error("Unsupported image layout transition: {old:?} -> {new:?}")]
    UnsupportedLayoutTransition {
        /// Layout the image is currently in
        old: vk::ImageLayout,
        /// Layout that was requested
        new: vk::ImageLayout,
    },
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;

pub use buffer::{Buffer, IndexBuffer, StagingBuffer, VertexBuffer};
pub use commands::{CommandPool, TransferSession};
pub use context::{LogicalDevice, PhysicalDeviceInfo, VulkanContext, VulkanInstance};
pub use descriptor::{
    BindingKind, DescriptorBindings, DescriptorPoolManager, DescriptorResource,
    DescriptorSetLayout, TextureDescriptor, UboDescriptor,
};
pub use framebuffer::{attachment_plan, DepthBuffer, Framebuffer};
pub use image::{Image, ImageDesc};
pub use layout::{barrier_masks, transition_image_layout, TransitionMasks};
pub use memory::find_memory_type;
pub use pipeline::{group_count, run_compute, FixedFunctionState, Pipeline};
pub use render_pass::{forward_attachments, RenderPass};
pub use shader::{ComputeShader, ShaderModule, ShaderSet};
pub use swapchain::{Swapchain, SwapchainStatus, SwapchainSupport};
pub use sync::{Fence, FrameSync, FrameSyncPool, Semaphore, DEFAULT_FRAMES_IN_FLIGHT};
pub use texture::{Texture, TextureParams};
pub use uniform_buffer::{UboType, UniformBuffer};
pub use vertex_layout::{Vertex, VulkanVertexLayout};
pub use window::{Window, WindowConfig, WindowError};
