//! Uniform buffers
//!
//! Static uniform buffers hold one copy of the data shared by every frame.
//! Dynamic uniform buffers hold one copy per swapchain image so a frame in
//! flight never reads data being written for the next one. Updates that do
//! not match the buffer's type are logged and dropped rather than racing
//! the GPU.

use ash::{vk, Device};
use bytemuck::Pod;
use log::warn;

use crate::render::vulkan::buffer::Buffer;
use crate::render::vulkan::{VulkanError, VulkanResult};

/// Update cadence of a uniform buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UboType {
    /// One shared copy, written before rendering starts
    Static,
    /// One copy per swapchain image, written every frame
    Dynamic,
}

/// Check whether a per-image update is legal for a buffer of the given
/// type and backing count.
fn per_image_update_allowed(ubo_type: UboType, buffer_count: usize, image_index: usize) -> bool {
    ubo_type == UboType::Dynamic && image_index < buffer_count
}

/// Backing buffers needed for the given type and swapchain image count.
/// A dynamic buffer for zero images would have nothing to index into.
fn backing_buffer_count(ubo_type: UboType, image_count: usize) -> VulkanResult<usize> {
    match ubo_type {
        UboType::Static => Ok(1),
        UboType::Dynamic if image_count > 0 => Ok(image_count),
        UboType::Dynamic => Err(VulkanError::InvalidOperation {
            reason: "dynamic uniform buffer requires at least one swapchain image".to_string(),
        }),
    }
}

/// Host-visible uniform data with per-type update rules
pub struct UniformBuffer {
    buffers: Vec<Buffer>,
    ubo_type: UboType,
    data_size: vk::DeviceSize,
}

impl UniformBuffer {
    /// Create a uniform buffer of `data_size` bytes. A dynamic buffer
    /// allocates one backing buffer per swapchain image and rejects a
    /// zero image count; a static buffer allocates a single one
    /// regardless of `image_count`.
    pub fn new(
        device: Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        ubo_type: UboType,
        data_size: vk::DeviceSize,
        image_count: usize,
    ) -> VulkanResult<Self> {
        let buffer_count = backing_buffer_count(ubo_type, image_count)?;

        let mut buffers = Vec::with_capacity(buffer_count);
        for _ in 0..buffer_count {
            buffers.push(Buffer::new(
                device.clone(),
                memory_properties,
                vk::BufferUsageFlags::UNIFORM_BUFFER,
                vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
                data_size,
                1,
            )?);
        }

        Ok(Self {
            buffers,
            ubo_type,
            data_size,
        })
    }

    /// Write the copy belonging to one swapchain image.
    ///
    /// Only valid for dynamic buffers with an image index inside the
    /// allocated range; anything else is logged and ignored.
    pub fn update_for_image<T: Pod>(&self, image_index: usize, data: &T) -> VulkanResult<()> {
        if !per_image_update_allowed(self.ubo_type, self.buffers.len(), image_index) {
            warn!(
                "Ignoring uniform update for image {} ({:?} buffer, {} copies)",
                image_index,
                self.ubo_type,
                self.buffers.len()
            );
            return Ok(());
        }
        self.buffers[image_index].write_data(std::slice::from_ref(data))
    }

    /// Write every copy of the buffer. For a static buffer this is the
    /// single shared copy.
    pub fn update_all<T: Pod>(&self, data: &T) -> VulkanResult<()> {
        for buffer in &self.buffers {
            buffer.write_data(std::slice::from_ref(data))?;
        }
        Ok(())
    }

    /// Update cadence this buffer was created with
    pub fn ubo_type(&self) -> UboType {
        self.ubo_type
    }

    /// Size in bytes of the uniform data
    pub fn data_size(&self) -> vk::DeviceSize {
        self.data_size
    }

    /// Number of backing buffers (1 for static, image count for dynamic)
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Descriptor info for the copy used with the given swapchain image.
    /// A static buffer resolves every image index to its single copy.
    pub fn descriptor_info(&self, image_index: usize) -> vk::DescriptorBufferInfo {
        let buffer = match self.ubo_type {
            UboType::Static => &self.buffers[0],
            UboType::Dynamic => &self.buffers[image_index % self.buffers.len()],
        };
        vk::DescriptorBufferInfo {
            buffer: buffer.handle(),
            offset: 0,
            range: self.data_size,
        }
    }

    /// Descriptor infos for every backing buffer, in image order
    pub fn buffer_infos(&self) -> Vec<vk::DescriptorBufferInfo> {
        self.buffers
            .iter()
            .map(|buffer| vk::DescriptorBufferInfo {
                buffer: buffer.handle(),
                offset: 0,
                range: self.data_size,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_buffers_reject_per_image_updates() {
        assert!(!per_image_update_allowed(UboType::Static, 1, 0));
        assert!(!per_image_update_allowed(UboType::Static, 1, 2));
    }

    #[test]
    fn dynamic_updates_require_index_in_range() {
        assert!(per_image_update_allowed(UboType::Dynamic, 3, 0));
        assert!(per_image_update_allowed(UboType::Dynamic, 3, 2));
        assert!(!per_image_update_allowed(UboType::Dynamic, 3, 3));
    }

    #[test]
    fn backing_count_follows_type() {
        assert_eq!(backing_buffer_count(UboType::Static, 3).unwrap(), 1);
        assert_eq!(backing_buffer_count(UboType::Static, 0).unwrap(), 1);
        assert_eq!(backing_buffer_count(UboType::Dynamic, 3).unwrap(), 3);
    }

    #[test]
    fn dynamic_buffer_rejects_zero_images() {
        let result = backing_buffer_count(UboType::Dynamic, 0);
        assert!(matches!(
            result,
            Err(VulkanError::InvalidOperation { .. })
        ));
    }
}
