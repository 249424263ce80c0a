//! GPU buffer wrappers
//!
//! A buffer owns its handle and backing memory, sized as an element stride
//! times an element count. Memory is bound at creation and released on drop.

use ash::{vk, Device};
use bytemuck::Pod;

use crate::render::vulkan::memory::find_memory_type;
use crate::render::vulkan::{VulkanError, VulkanResult};

/// Byte size of a buffer holding `element_count` elements of `stride`
/// bytes each. Buffers are sized to exactly this, never padded.
fn buffer_byte_size(stride: vk::DeviceSize, element_count: vk::DeviceSize) -> vk::DeviceSize {
    stride * element_count
}

/// Whether a write of `write_len` bytes stays inside a buffer of
/// `buffer_size` bytes.
fn write_fits(buffer_size: vk::DeviceSize, write_len: usize) -> bool {
    write_len as vk::DeviceSize <= buffer_size
}

/// Buffer with bound device memory
pub struct Buffer {
    device: Device,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    stride: vk::DeviceSize,
    element_count: vk::DeviceSize,
}

impl Buffer {
    /// Create a buffer of `stride * element_count` bytes and bind memory
    /// matching the requested property flags.
    pub fn new(
        device: Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
        stride: vk::DeviceSize,
        element_count: vk::DeviceSize,
    ) -> VulkanResult<Self> {
        let size = buffer_byte_size(stride, element_count);
        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe {
            device
                .create_buffer(&buffer_info, None)
                .map_err(VulkanError::Api)?
        };

        let mem_requirements = unsafe { device.get_buffer_memory_requirements(buffer) };

        let memory_type_index = match find_memory_type(
            memory_properties,
            mem_requirements.memory_type_bits,
            properties,
        ) {
            Ok(index) => index,
            Err(e) => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(e);
            }
        };

        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(mem_requirements.size)
            .memory_type_index(memory_type_index);

        let memory = match unsafe { device.allocate_memory(&alloc_info, None) } {
            Ok(memory) => memory,
            Err(e) => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(VulkanError::Api(e));
            }
        };

        unsafe {
            if let Err(e) = device.bind_buffer_memory(buffer, memory, 0) {
                device.destroy_buffer(buffer, None);
                device.free_memory(memory, None);
                return Err(VulkanError::Api(e));
            }
        }

        Ok(Self {
            device,
            buffer,
            memory,
            stride,
            element_count,
        })
    }

    /// Copy raw bytes into the buffer's memory. Requires host-visible memory.
    pub fn write_bytes(&self, bytes: &[u8]) -> VulkanResult<()> {
        if !write_fits(self.size(), bytes.len()) {
            return Err(VulkanError::InvalidOperation {
                reason: format!(
                    "write of {} bytes exceeds buffer size {}",
                    bytes.len(),
                    self.size()
                ),
            });
        }

        unsafe {
            let mapped = self
                .device
                .map_memory(self.memory, 0, self.size(), vk::MemoryMapFlags::empty())
                .map_err(VulkanError::Api)?;
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), mapped.cast::<u8>(), bytes.len());
            self.device.unmap_memory(self.memory);
        }

        Ok(())
    }

    /// Copy a slice of plain-old-data elements into the buffer's memory.
    pub fn write_data<T: Pod>(&self, data: &[T]) -> VulkanResult<()> {
        self.write_bytes(bytemuck::cast_slice(data))
    }

    /// Get the buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Element stride in bytes
    pub fn stride(&self) -> vk::DeviceSize {
        self.stride
    }

    /// Number of elements the buffer was sized for
    pub fn element_count(&self) -> vk::DeviceSize {
        self.element_count
    }

    /// Total requested size in bytes (stride times element count)
    pub fn size(&self) -> vk::DeviceSize {
        buffer_byte_size(self.stride, self.element_count)
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_buffer(self.buffer, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

/// Host-visible staging buffer for one-shot transfers to the GPU
pub struct StagingBuffer {
    buffer: Buffer,
}

impl StagingBuffer {
    /// Create a staging buffer pre-filled with the given bytes.
    pub fn with_bytes(
        device: Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        stride: vk::DeviceSize,
        element_count: vk::DeviceSize,
        bytes: &[u8],
    ) -> VulkanResult<Self> {
        let buffer = Buffer::new(
            device,
            memory_properties,
            vk::BufferUsageFlags::TRANSFER_SRC,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            stride,
            element_count,
        )?;
        buffer.write_bytes(bytes)?;
        Ok(Self { buffer })
    }

    /// Get the buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer.handle()
    }
}

/// Vertex buffer holding interleaved vertex data
pub struct VertexBuffer {
    buffer: Buffer,
    vertex_count: u32,
}

impl VertexBuffer {
    /// Create a host-visible vertex buffer filled with the given vertices.
    pub fn new<T: Pod>(
        device: Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        vertices: &[T],
    ) -> VulkanResult<Self> {
        let buffer = Buffer::new(
            device,
            memory_properties,
            vk::BufferUsageFlags::VERTEX_BUFFER,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            std::mem::size_of::<T>() as vk::DeviceSize,
            vertices.len() as vk::DeviceSize,
        )?;
        buffer.write_data(vertices)?;

        Ok(Self {
            buffer,
            vertex_count: vertices.len() as u32,
        })
    }

    /// Get the buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer.handle()
    }

    /// Number of vertices in the buffer
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}

/// Index buffer holding `u32` indices
pub struct IndexBuffer {
    buffer: Buffer,
    index_count: u32,
}

impl IndexBuffer {
    /// Create a host-visible index buffer filled with the given indices.
    pub fn new(
        device: Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        indices: &[u32],
    ) -> VulkanResult<Self> {
        let buffer = Buffer::new(
            device,
            memory_properties,
            vk::BufferUsageFlags::INDEX_BUFFER,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            std::mem::size_of::<u32>() as vk::DeviceSize,
            indices.len() as vk::DeviceSize,
        )?;
        buffer.write_data(indices)?;

        Ok(Self {
            buffer,
            index_count: indices.len() as u32,
        })
    }

    /// Get the buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer.handle()
    }

    /// Number of indices in the buffer
    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_is_exactly_stride_times_count() {
        assert_eq!(buffer_byte_size(56, 100), 5600);
        assert_eq!(buffer_byte_size(4, 36), 144);
        assert_eq!(buffer_byte_size(64, 1), 64);
        assert_eq!(buffer_byte_size(16, 0), 0);
    }

    #[test]
    fn writes_must_stay_inside_the_buffer() {
        assert!(write_fits(144, 144));
        assert!(write_fits(144, 100));
        assert!(write_fits(144, 0));
        assert!(!write_fits(144, 145));
    }
}
