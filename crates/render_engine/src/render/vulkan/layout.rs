//! Image layout transitions
//!
//! Layout changes are a small explicit state machine: each supported
//! (old, new) pair maps to one stage/access mask combination. Pairs outside
//! the table are rejected instead of issuing an incorrect barrier.

use ash::{vk, Device};

use crate::render::vulkan::commands::TransferSession;
use crate::render::vulkan::{VulkanError, VulkanResult};

/// Pipeline stage and access masks for one layout transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionMasks {
    /// Stage that must complete before the barrier
    pub src_stage: vk::PipelineStageFlags,
    /// Stage that waits on the barrier
    pub dst_stage: vk::PipelineStageFlags,
    /// Accesses that must be made available
    pub src_access: vk::AccessFlags,
    /// Accesses that wait for visibility
    pub dst_access: vk::AccessFlags,
}

/// Resolve the barrier masks for a layout transition pair.
///
/// Supported transitions:
/// - Undefined -> TransferDst (upload target preparation)
/// - TransferDst -> ShaderReadOnly (sampled after upload)
/// - Undefined -> ShaderReadOnly (sampled without an upload)
/// - TransferDst -> General (read by a compute shader)
/// - General -> ShaderReadOnly (compute-written image sampled by graphics)
pub fn barrier_masks(
    old: vk::ImageLayout,
    new: vk::ImageLayout,
) -> VulkanResult<TransitionMasks> {
    match (old, new) {
        (vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL) => {
            Ok(TransitionMasks {
                src_stage: vk::PipelineStageFlags::TOP_OF_PIPE,
                dst_stage: vk::PipelineStageFlags::TRANSFER,
                src_access: vk::AccessFlags::empty(),
                dst_access: vk::AccessFlags::TRANSFER_WRITE,
            })
        }
        (vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL) => {
            Ok(TransitionMasks {
                src_stage: vk::PipelineStageFlags::TRANSFER,
                dst_stage: vk::PipelineStageFlags::FRAGMENT_SHADER,
                src_access: vk::AccessFlags::TRANSFER_WRITE,
                dst_access: vk::AccessFlags::SHADER_READ,
            })
        }
        (vk::ImageLayout::UNDEFINED, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL) => {
            Ok(TransitionMasks {
                src_stage: vk::PipelineStageFlags::TOP_OF_PIPE,
                dst_stage: vk::PipelineStageFlags::FRAGMENT_SHADER,
                src_access: vk::AccessFlags::empty(),
                dst_access: vk::AccessFlags::SHADER_READ,
            })
        }
        (vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::GENERAL) => Ok(TransitionMasks {
            src_stage: vk::PipelineStageFlags::TRANSFER,
            dst_stage: vk::PipelineStageFlags::COMPUTE_SHADER,
            src_access: vk::AccessFlags::TRANSFER_WRITE,
            dst_access: vk::AccessFlags::SHADER_READ,
        }),
        (vk::ImageLayout::GENERAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL) => {
            Ok(TransitionMasks {
                src_stage: vk::PipelineStageFlags::COMPUTE_SHADER,
                dst_stage: vk::PipelineStageFlags::FRAGMENT_SHADER,
                src_access: vk::AccessFlags::SHADER_WRITE,
                dst_access: vk::AccessFlags::SHADER_READ,
            })
        }
        (old, new) => Err(VulkanError::UnsupportedLayoutTransition { old, new }),
    }
}

/// Transition an image between layouts with a blocking one-shot submission.
///
/// Records the pipeline barrier for the (old, new) pair in a
/// [`TransferSession`] and waits for the queue to finish. The transition
/// covers `mip_levels` levels and `array_layers` layers of the color aspect.
#[allow(clippy::too_many_arguments)]
pub fn transition_image_layout(
    device: &Device,
    command_pool: vk::CommandPool,
    queue: vk::Queue,
    image: vk::Image,
    old: vk::ImageLayout,
    new: vk::ImageLayout,
    mip_levels: u32,
    array_layers: u32,
) -> VulkanResult<()> {
    let masks = barrier_masks(old, new)?;

    let range = vk::ImageSubresourceRange {
        aspect_mask: vk::ImageAspectFlags::COLOR,
        base_mip_level: 0,
        level_count: mip_levels,
        base_array_layer: 0,
        layer_count: array_layers,
    };

    let mut session = TransferSession::begin(device.clone(), command_pool)?;
    session.image_barrier(image, old, new, masks, range);
    session.finish(queue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_to_transfer_dst_masks() {
        let masks = barrier_masks(
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        )
        .unwrap();
        assert_eq!(masks.src_access, vk::AccessFlags::empty());
        assert_eq!(masks.dst_access, vk::AccessFlags::TRANSFER_WRITE);
        assert_eq!(masks.src_stage, vk::PipelineStageFlags::TOP_OF_PIPE);
        assert_eq!(masks.dst_stage, vk::PipelineStageFlags::TRANSFER);
    }

    #[test]
    fn transfer_dst_to_shader_read_masks() {
        let masks = barrier_masks(
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        )
        .unwrap();
        assert_eq!(masks.src_access, vk::AccessFlags::TRANSFER_WRITE);
        assert_eq!(masks.dst_access, vk::AccessFlags::SHADER_READ);
        assert_eq!(masks.src_stage, vk::PipelineStageFlags::TRANSFER);
        assert_eq!(masks.dst_stage, vk::PipelineStageFlags::FRAGMENT_SHADER);
    }

    #[test]
    fn compute_transitions_resolve() {
        assert!(barrier_masks(
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::GENERAL
        )
        .is_ok());
        assert!(barrier_masks(
            vk::ImageLayout::GENERAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
        )
        .is_ok());
    }

    #[test]
    fn unknown_pair_is_rejected() {
        let result = barrier_masks(
            vk::ImageLayout::PRESENT_SRC_KHR,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        );
        assert!(matches!(
            result,
            Err(VulkanError::UnsupportedLayoutTransition { .. })
        ));
    }

    #[test]
    fn reversed_pair_is_rejected() {
        let result = barrier_masks(
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        );
        assert!(matches!(
            result,
            Err(VulkanError::UnsupportedLayoutTransition { .. })
        ));
    }
}
