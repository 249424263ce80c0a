//! Sampled textures
//!
//! A texture couples an [`Image`] with a sampler and caches the descriptor
//! image info handed to descriptor writes. Pixel upload is two-phase:
//! `upload` stages the bytes and copies them while the image sits in
//! `TRANSFER_DST_OPTIMAL`; the transition into the final layout is the
//! caller's explicit step, so compute pipelines can route the image through
//! `GENERAL` first.

use ash::{vk, Device};
use log::debug;

use crate::render::vulkan::buffer::StagingBuffer;
use crate::render::vulkan::commands::TransferSession;
use crate::render::vulkan::image::{Image, ImageDesc};
use crate::render::vulkan::layout::transition_image_layout;
use crate::render::vulkan::{VulkanError, VulkanResult};

/// Sampler configuration for a texture
#[derive(Debug, Clone, Copy)]
pub struct TextureParams {
    /// Magnification and minification filter
    pub filter: vk::Filter,
    /// Address mode for all three coordinates
    pub address_mode: vk::SamplerAddressMode,
    /// Layout the texture is sampled in
    pub final_layout: vk::ImageLayout,
}

impl Default for TextureParams {
    fn default() -> Self {
        Self {
            filter: vk::Filter::LINEAR,
            address_mode: vk::SamplerAddressMode::REPEAT,
            final_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        }
    }
}

/// Image plus sampler, ready to bind as a combined image sampler
pub struct Texture {
    device: Device,
    image: Image,
    sampler: vk::Sampler,
    descriptor_info: vk::DescriptorImageInfo,
}

impl Texture {
    /// Create the image and sampler. The image starts in `UNDEFINED`
    /// layout with no pixel data; see [`Texture::upload`].
    pub fn new(
        device: Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        desc: ImageDesc,
        params: TextureParams,
    ) -> VulkanResult<Self> {
        let image = Image::new(device.clone(), memory_properties, desc)?;

        let sampler_info = vk::SamplerCreateInfo::builder()
            .mag_filter(params.filter)
            .min_filter(params.filter)
            .address_mode_u(params.address_mode)
            .address_mode_v(params.address_mode)
            .address_mode_w(params.address_mode)
            .anisotropy_enable(false)
            .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
            .unnormalized_coordinates(false)
            .compare_enable(false)
            .compare_op(vk::CompareOp::ALWAYS)
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR);

        let sampler = unsafe {
            device
                .create_sampler(&sampler_info, None)
                .map_err(VulkanError::Api)?
        };

        let descriptor_info = vk::DescriptorImageInfo {
            sampler,
            image_view: image.view(),
            image_layout: params.final_layout,
        };

        Ok(Self {
            device,
            image,
            sampler,
            descriptor_info,
        })
    }

    /// Stage pixel bytes and copy them into the image, leaving it in
    /// `TRANSFER_DST_OPTIMAL`.
    ///
    /// The byte slice must cover every array layer; `pixel_stride` is the
    /// byte size of one texel (4 for `R8G8B8A8`). The caller transitions
    /// the image into its final layout afterwards, usually via
    /// [`Texture::finish_upload`].
    pub fn upload(
        &self,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        command_pool: vk::CommandPool,
        queue: vk::Queue,
        pixels: &[u8],
        pixel_stride: u32,
    ) -> VulkanResult<()> {
        let extent = self.image.extent();
        let expected = extent.width as usize
            * extent.height as usize
            * pixel_stride as usize
            * self.image.array_layers() as usize;
        if pixels.len() != expected {
            return Err(VulkanError::InvalidOperation {
                reason: format!(
                    "pixel upload of {} bytes does not match image size {}",
                    pixels.len(),
                    expected
                ),
            });
        }

        let staging = StagingBuffer::with_bytes(
            self.device.clone(),
            memory_properties,
            1,
            pixels.len() as vk::DeviceSize,
            pixels,
        )?;

        transition_image_layout(
            &self.device,
            command_pool,
            queue,
            self.image.handle(),
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            self.image.mip_levels(),
            self.image.array_layers(),
        )?;

        let mut session = TransferSession::begin(self.device.clone(), command_pool)?;
        session.copy_buffer_to_image(
            staging.handle(),
            self.image.handle(),
            extent,
            self.image.array_layers(),
        );
        session.finish(queue)?;

        debug!(
            "Uploaded {}x{} texture ({} layers)",
            extent.width,
            extent.height,
            self.image.array_layers()
        );

        Ok(())
    }

    /// Transition the image from `TRANSFER_DST_OPTIMAL` into the layout
    /// the descriptor info was created with.
    pub fn finish_upload(
        &self,
        command_pool: vk::CommandPool,
        queue: vk::Queue,
    ) -> VulkanResult<()> {
        transition_image_layout(
            &self.device,
            command_pool,
            queue,
            self.image.handle(),
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            self.descriptor_info.image_layout,
            self.image.mip_levels(),
            self.image.array_layers(),
        )
    }

    /// Create, upload, and transition in one call for the common sampled
    /// texture path.
    #[allow(clippy::too_many_arguments)]
    pub fn from_pixels(
        device: Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        command_pool: vk::CommandPool,
        queue: vk::Queue,
        desc: ImageDesc,
        params: TextureParams,
        pixels: &[u8],
    ) -> VulkanResult<Self> {
        let texture = Self::new(device, memory_properties, desc, params)?;
        texture.upload(memory_properties, command_pool, queue, pixels, 4)?;
        texture.finish_upload(command_pool, queue)?;
        Ok(texture)
    }

    /// Get the underlying image
    pub fn image(&self) -> &Image {
        &self.image
    }

    /// Get the sampler handle
    pub fn sampler(&self) -> vk::Sampler {
        self.sampler
    }

    /// Cached descriptor info for combined image sampler writes
    pub fn descriptor_info(&self) -> vk::DescriptorImageInfo {
        self.descriptor_info
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_sampler(self.sampler, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_sample_linear_repeat() {
        let params = TextureParams::default();
        assert_eq!(params.filter, vk::Filter::LINEAR);
        assert_eq!(params.address_mode, vk::SamplerAddressMode::REPEAT);
        assert_eq!(
            params.final_layout,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
        );
    }
}
