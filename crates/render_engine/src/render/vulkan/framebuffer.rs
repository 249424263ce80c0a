//! Framebuffers and the depth attachment
//!
//! One framebuffer per swapchain image view, all sharing a single depth
//! buffer. Framebuffers are recreated together with the swapchain.

use ash::{vk, Device};

use crate::render::vulkan::image::{Image, ImageDesc};
use crate::render::vulkan::render_pass::RenderPass;
use crate::render::vulkan::{VulkanError, VulkanResult};

/// Depth attachment backing every framebuffer of a swapchain
pub struct DepthBuffer {
    image: Image,
}

impl DepthBuffer {
    /// Create a depth image sized to the swapchain extent.
    pub fn new(
        device: Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        format: vk::Format,
        extent: vk::Extent2D,
    ) -> VulkanResult<Self> {
        let image = Image::new(
            device,
            memory_properties,
            ImageDesc::depth_2d(format, extent.width, extent.height),
        )?;
        Ok(Self { image })
    }

    /// View bound as the depth attachment
    pub fn view(&self) -> vk::ImageView {
        self.image.view()
    }

    /// Depth format the image was created with
    pub fn format(&self) -> vk::Format {
        self.image.format()
    }
}

/// Attachment lists for one framebuffer per swapchain view, each sharing
/// the depth view when one is given.
pub fn attachment_plan(
    color_views: &[vk::ImageView],
    depth_view: Option<vk::ImageView>,
) -> Vec<Vec<vk::ImageView>> {
    color_views
        .iter()
        .map(|&color| {
            let mut attachments = vec![color];
            if let Some(depth) = depth_view {
                attachments.push(depth);
            }
            attachments
        })
        .collect()
}

/// Framebuffer binding one swapchain view (and the shared depth view) to a
/// render pass
pub struct Framebuffer {
    device: Device,
    framebuffer: vk::Framebuffer,
    extent: vk::Extent2D,
}

impl Framebuffer {
    /// Create a framebuffer over one entry of an [`attachment_plan`]. The
    /// attachment count must match what the render pass declares.
    pub fn new(
        device: Device,
        render_pass: &RenderPass,
        attachments: Vec<vk::ImageView>,
        extent: vk::Extent2D,
    ) -> VulkanResult<Self> {
        let expected = if render_pass.has_depth() { 2 } else { 1 };
        if attachments.len() != expected {
            return Err(VulkanError::InvalidOperation {
                reason: format!(
                    "render pass expects {expected} attachments, {} supplied",
                    attachments.len()
                ),
            });
        }

        let framebuffer_info = vk::FramebufferCreateInfo::builder()
            .render_pass(render_pass.handle())
            .attachments(&attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = unsafe {
            device
                .create_framebuffer(&framebuffer_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self {
            device,
            framebuffer,
            extent,
        })
    }

    /// Get the framebuffer handle
    pub fn handle(&self) -> vk::Framebuffer {
        self.framebuffer
    }

    /// Width and height the framebuffer was created for
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    #[test]
    fn one_framebuffer_per_swapchain_view() {
        let colors = [
            vk::ImageView::from_raw(1),
            vk::ImageView::from_raw(2),
            vk::ImageView::from_raw(3),
        ];
        let depth = vk::ImageView::from_raw(9);

        let plan = attachment_plan(&colors, Some(depth));
        assert_eq!(plan.len(), colors.len());
        for (i, attachments) in plan.iter().enumerate() {
            assert_eq!(attachments.len(), 2);
            assert_eq!(attachments[0], colors[i]);
            assert_eq!(attachments[1], depth);
        }
    }

    #[test]
    fn plan_without_depth_has_single_attachment() {
        let colors = [vk::ImageView::from_raw(1), vk::ImageView::from_raw(2)];
        let plan = attachment_plan(&colors, None);
        assert_eq!(plan.len(), 2);
        assert!(plan.iter().all(|attachments| attachments.len() == 1));
    }
}
