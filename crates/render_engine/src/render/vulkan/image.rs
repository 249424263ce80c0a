//! GPU image wrappers
//!
//! An image owns its handle, backing device-local memory, and a view. The
//! view is created only after memory is bound; cleanup runs in the order
//! view, image, memory.

use ash::{vk, Device};

use crate::render::vulkan::memory::find_memory_type;
use crate::render::vulkan::{VulkanError, VulkanResult};

/// Creation parameters for an [`Image`]
#[derive(Debug, Clone, Copy)]
pub struct ImageDesc {
    /// Image dimensionality
    pub image_type: vk::ImageType,
    /// View dimensionality (2D, cube, ...)
    pub view_type: vk::ImageViewType,
    /// Texel format
    pub format: vk::Format,
    /// Usage flags the image is created with
    pub usage: vk::ImageUsageFlags,
    /// Aspect the view covers (color or depth)
    pub aspect: vk::ImageAspectFlags,
    /// Width and height in texels
    pub extent: vk::Extent2D,
    /// Array layer count (6 for cube maps)
    pub array_layers: u32,
    /// Mip level count
    pub mip_levels: u32,
    /// Extra create flags (cube-compatible, ...)
    pub flags: vk::ImageCreateFlags,
}

impl ImageDesc {
    /// A plain sampled/transfer-destination 2D color image.
    pub fn color_2d(format: vk::Format, usage: vk::ImageUsageFlags, width: u32, height: u32) -> Self {
        Self {
            image_type: vk::ImageType::TYPE_2D,
            view_type: vk::ImageViewType::TYPE_2D,
            format,
            usage,
            aspect: vk::ImageAspectFlags::COLOR,
            extent: vk::Extent2D { width, height },
            array_layers: 1,
            mip_levels: 1,
            flags: vk::ImageCreateFlags::empty(),
        }
    }

    /// A depth attachment image.
    pub fn depth_2d(format: vk::Format, width: u32, height: u32) -> Self {
        Self {
            image_type: vk::ImageType::TYPE_2D,
            view_type: vk::ImageViewType::TYPE_2D,
            format,
            usage: vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
            aspect: vk::ImageAspectFlags::DEPTH,
            extent: vk::Extent2D { width, height },
            array_layers: 1,
            mip_levels: 1,
            flags: vk::ImageCreateFlags::empty(),
        }
    }

    /// A cube map with six array layers.
    pub fn cube(format: vk::Format, usage: vk::ImageUsageFlags, size: u32) -> Self {
        Self {
            image_type: vk::ImageType::TYPE_2D,
            view_type: vk::ImageViewType::CUBE,
            format,
            usage,
            aspect: vk::ImageAspectFlags::COLOR,
            extent: vk::Extent2D {
                width: size,
                height: size,
            },
            array_layers: 6,
            mip_levels: 1,
            flags: vk::ImageCreateFlags::CUBE_COMPATIBLE,
        }
    }
}

/// Image with bound device-local memory and a matching view
pub struct Image {
    device: Device,
    image: vk::Image,
    memory: vk::DeviceMemory,
    view: vk::ImageView,
    desc: ImageDesc,
}

impl Image {
    /// Create an image, bind device-local memory, then create its view.
    pub fn new(
        device: Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        desc: ImageDesc,
    ) -> VulkanResult<Self> {
        let image_info = vk::ImageCreateInfo::builder()
            .image_type(desc.image_type)
            .extent(vk::Extent3D {
                width: desc.extent.width,
                height: desc.extent.height,
                depth: 1,
            })
            .mip_levels(desc.mip_levels)
            .array_layers(desc.array_layers)
            .format(desc.format)
            .tiling(vk::ImageTiling::OPTIMAL)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(desc.usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .samples(vk::SampleCountFlags::TYPE_1)
            .flags(desc.flags);

        let image = unsafe {
            device
                .create_image(&image_info, None)
                .map_err(VulkanError::Api)?
        };

        let mem_requirements = unsafe { device.get_image_memory_requirements(image) };

        let memory_type_index = match find_memory_type(
            memory_properties,
            mem_requirements.memory_type_bits,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        ) {
            Ok(index) => index,
            Err(e) => {
                unsafe { device.destroy_image(image, None) };
                return Err(e);
            }
        };

        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(mem_requirements.size)
            .memory_type_index(memory_type_index);

        let memory = match unsafe { device.allocate_memory(&alloc_info, None) } {
            Ok(memory) => memory,
            Err(e) => {
                unsafe { device.destroy_image(image, None) };
                return Err(VulkanError::Api(e));
            }
        };

        unsafe {
            if let Err(e) = device.bind_image_memory(image, memory, 0) {
                device.destroy_image(image, None);
                device.free_memory(memory, None);
                return Err(VulkanError::Api(e));
            }
        }

        // View creation requires bound memory.
        let view_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(desc.view_type)
            .format(desc.format)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: desc.aspect,
                base_mip_level: 0,
                level_count: desc.mip_levels,
                base_array_layer: 0,
                layer_count: desc.array_layers,
            });

        let view = match unsafe { device.create_image_view(&view_info, None) } {
            Ok(view) => view,
            Err(e) => {
                unsafe {
                    device.destroy_image(image, None);
                    device.free_memory(memory, None);
                }
                return Err(VulkanError::Api(e));
            }
        };

        Ok(Self {
            device,
            image,
            memory,
            view,
            desc,
        })
    }

    /// Get the image handle
    pub fn handle(&self) -> vk::Image {
        self.image
    }

    /// Get the image view handle
    pub fn view(&self) -> vk::ImageView {
        self.view
    }

    /// Width and height in texels
    pub fn extent(&self) -> vk::Extent2D {
        self.desc.extent
    }

    /// Texel format
    pub fn format(&self) -> vk::Format {
        self.desc.format
    }

    /// Array layer count
    pub fn array_layers(&self) -> u32 {
        self.desc.array_layers
    }

    /// Mip level count
    pub fn mip_levels(&self) -> u32 {
        self.desc.mip_levels
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_image_view(self.view, None);
            self.device.destroy_image(self.image, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_desc_has_six_layers() {
        let desc = ImageDesc::cube(
            vk::Format::R8G8B8A8_UNORM,
            vk::ImageUsageFlags::SAMPLED,
            256,
        );
        assert_eq!(desc.array_layers, 6);
        assert_eq!(desc.view_type, vk::ImageViewType::CUBE);
        assert!(desc.flags.contains(vk::ImageCreateFlags::CUBE_COMPATIBLE));
    }

    #[test]
    fn depth_desc_uses_depth_aspect() {
        let desc = ImageDesc::depth_2d(vk::Format::D32_SFLOAT, 1280, 720);
        assert_eq!(desc.aspect, vk::ImageAspectFlags::DEPTH);
        assert!(desc
            .usage
            .contains(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT));
    }
}
