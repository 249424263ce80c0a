//! Frame synchronization primitives
//!
//! Each frame in flight owns two semaphores and a fence: image acquisition
//! signals the first semaphore, rendering signals the second, and the fence
//! serializes CPU reuse of the frame's command buffer. The pool rotates
//! through a fixed number of frames.

use ash::{vk, Device};

use crate::render::vulkan::{VulkanError, VulkanResult};

/// Frames the CPU may record ahead of the GPU
pub const DEFAULT_FRAMES_IN_FLIGHT: usize = 2;

/// Binary semaphore
pub struct Semaphore {
    device: Device,
    semaphore: vk::Semaphore,
}

impl Semaphore {
    /// Create an unsignaled semaphore.
    pub fn new(device: Device) -> VulkanResult<Self> {
        let semaphore = unsafe {
            device
                .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                .map_err(VulkanError::Api)?
        };
        Ok(Self { device, semaphore })
    }

    /// Get the semaphore handle
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_semaphore(self.semaphore, None);
        }
    }
}

/// Fence created signaled so the first wait on each frame passes
pub struct Fence {
    device: Device,
    fence: vk::Fence,
}

impl Fence {
    /// Create a fence, signaled so the first frame does not block forever.
    pub fn new_signaled(device: Device) -> VulkanResult<Self> {
        let fence_info = vk::FenceCreateInfo::builder().flags(vk::FenceCreateFlags::SIGNALED);
        let fence = unsafe {
            device
                .create_fence(&fence_info, None)
                .map_err(VulkanError::Api)?
        };
        Ok(Self { device, fence })
    }

    /// Get the fence handle
    pub fn handle(&self) -> vk::Fence {
        self.fence
    }

    /// Block until the fence signals.
    pub fn wait(&self) -> VulkanResult<()> {
        unsafe {
            self.device
                .wait_for_fences(&[self.fence], true, u64::MAX)
                .map_err(VulkanError::Api)
        }
    }

    /// Return the fence to the unsignaled state.
    pub fn reset(&self) -> VulkanResult<()> {
        unsafe {
            self.device
                .reset_fences(&[self.fence])
                .map_err(VulkanError::Api)
        }
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_fence(self.fence, None);
        }
    }
}

/// Synchronization objects for one frame in flight
pub struct FrameSync {
    /// Signaled when the swapchain image is ready to render to
    pub image_available: Semaphore,
    /// Signaled when rendering to the image has finished
    pub render_finished: Semaphore,
    /// Signaled when the frame's submission has completed
    pub in_flight: Fence,
}

impl FrameSync {
    /// Create the semaphore pair and a signaled fence.
    pub fn new(device: Device) -> VulkanResult<Self> {
        Ok(Self {
            image_available: Semaphore::new(device.clone())?,
            render_finished: Semaphore::new(device.clone())?,
            in_flight: Fence::new_signaled(device)?,
        })
    }
}

/// Rotating pool of per-frame synchronization objects
pub struct FrameSyncPool {
    frames: Vec<FrameSync>,
    current: usize,
}

impl FrameSyncPool {
    /// Create a pool of `frames_in_flight` frames. Zero is clamped to one.
    pub fn new(device: Device, frames_in_flight: usize) -> VulkanResult<Self> {
        let count = frames_in_flight.max(1);
        let mut frames = Vec::with_capacity(count);
        for _ in 0..count {
            frames.push(FrameSync::new(device.clone())?);
        }
        Ok(Self { frames, current: 0 })
    }

    /// Synchronization objects for the current frame
    pub fn current(&self) -> &FrameSync {
        &self.frames[self.current]
    }

    /// Index of the current frame in flight
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Number of frames the pool rotates through
    pub fn frames_in_flight(&self) -> usize {
        self.frames.len()
    }

    /// Move to the next frame, wrapping at the pool size.
    pub fn advance(&mut self) {
        self.current = (self.current + 1) % self.frames.len();
    }
}
