//! Render orchestrator
//!
//! Owns the render pass, depth buffer, framebuffers, per-frame command
//! buffers, and the frame sync pool. Each tick runs the fixed sequence:
//! wait fence, acquire, record, submit, present, advance. An out-of-date
//! swapchain at acquire or present triggers recreation of the swapchain
//! and everything sized to it.

use ash::{vk, Device};
use log::{debug, warn};

use crate::render::vulkan::commands::CommandPool;
use crate::render::vulkan::context::VulkanContext;
use crate::render::vulkan::framebuffer::{attachment_plan, DepthBuffer, Framebuffer};
use crate::render::vulkan::render_pass::RenderPass;
use crate::render::vulkan::swapchain::SwapchainStatus;
use crate::render::vulkan::sync::{FrameSyncPool, DEFAULT_FRAMES_IN_FLIGHT};
use crate::render::vulkan::{VulkanError, VulkanResult};
use crate::render::Renderable;

/// Renderer configuration
#[derive(Debug, Clone, Copy)]
pub struct RendererConfig {
    /// Frames the CPU may record ahead of the GPU
    pub frames_in_flight: usize,
    /// Color the frame is cleared to
    pub clear_color: [f32; 4],
    /// Depth attachment format
    pub depth_format: vk::Format,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            frames_in_flight: DEFAULT_FRAMES_IN_FLIGHT,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            depth_format: vk::Format::D32_SFLOAT,
        }
    }
}

/// What a frame tick produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was rendered and presented
    Rendered,
    /// The swapchain was stale and has been recreated; nothing was drawn
    SwapchainRecreated,
}

/// Frame orchestration over a Vulkan context
pub struct Renderer {
    device: Device,
    render_pass: RenderPass,
    depth_buffer: DepthBuffer,
    framebuffers: Vec<Framebuffer>,
    command_pool: CommandPool,
    command_buffers: Vec<vk::CommandBuffer>,
    sync: FrameSyncPool,
    config: RendererConfig,
}

impl Renderer {
    /// Create the renderer's pass, attachments, command buffers, and sync
    /// objects for the context's current swapchain.
    pub fn new(context: &VulkanContext, config: RendererConfig) -> VulkanResult<Self> {
        let device = context.raw_device();
        let swapchain = context.swapchain();

        let render_pass = RenderPass::new_forward(
            device.clone(),
            swapchain.format(),
            Some(config.depth_format),
        )?;

        let depth_buffer = DepthBuffer::new(
            device.clone(),
            context.memory_properties(),
            config.depth_format,
            swapchain.extent(),
        )?;

        let framebuffers =
            Self::create_framebuffers(&device, context, &render_pass, &depth_buffer)?;

        let command_pool = CommandPool::new(
            device.clone(),
            context.physical_device.graphics_family,
        )?;
        let frames_in_flight = config.frames_in_flight.max(1);
        let command_buffers = command_pool.allocate(frames_in_flight as u32)?;

        let sync = FrameSyncPool::new(device.clone(), frames_in_flight)?;

        Ok(Self {
            device,
            render_pass,
            depth_buffer,
            framebuffers,
            command_pool,
            command_buffers,
            sync,
            config,
        })
    }

    fn create_framebuffers(
        device: &Device,
        context: &VulkanContext,
        render_pass: &RenderPass,
        depth_buffer: &DepthBuffer,
    ) -> VulkanResult<Vec<Framebuffer>> {
        let swapchain = context.swapchain();
        attachment_plan(swapchain.views(), Some(depth_buffer.view()))
            .into_iter()
            .map(|attachments| {
                Framebuffer::new(
                    device.clone(),
                    render_pass,
                    attachments,
                    swapchain.extent(),
                )
            })
            .collect()
    }

    /// Render pass the pipelines must be compatible with
    pub fn render_pass(&self) -> &RenderPass {
        &self.render_pass
    }

    /// Frames the renderer rotates through
    pub fn frames_in_flight(&self) -> usize {
        self.sync.frames_in_flight()
    }

    /// Run one frame: draw the renderables in order and present.
    ///
    /// `framebuffer_size` is consulted only when the swapchain has to be
    /// recreated.
    pub fn render_frame(
        &mut self,
        context: &mut VulkanContext,
        renderables: &[Renderable],
        framebuffer_size: (u32, u32),
    ) -> VulkanResult<FrameOutcome> {
        let frame = self.sync.current();
        frame.in_flight.wait()?;

        let image_index = match context
            .swapchain()
            .acquire_next_image(frame.image_available.handle())?
        {
            SwapchainStatus::Ready(index) => index,
            SwapchainStatus::OutOfDate => {
                self.recreate(context, framebuffer_size)?;
                return Ok(FrameOutcome::SwapchainRecreated);
            }
        };

        frame.in_flight.reset()?;

        let command_buffer = self.command_buffers[self.sync.current_index()];
        self.record(command_buffer, image_index as usize, renderables)?;

        let wait_semaphores = [frame.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [frame.render_finished.handle()];
        let command_buffers = [command_buffer];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.device
                .queue_submit(
                    context.graphics_queue(),
                    &[submit_info.build()],
                    frame.in_flight.handle(),
                )
                .map_err(VulkanError::Api)?;
        }

        let present_status = context.swapchain().present(
            context.present_queue(),
            image_index,
            frame.render_finished.handle(),
        )?;

        self.sync.advance();

        if present_status == SwapchainStatus::OutOfDate {
            self.recreate(context, framebuffer_size)?;
            return Ok(FrameOutcome::SwapchainRecreated);
        }

        Ok(FrameOutcome::Rendered)
    }

    fn record(
        &self,
        command_buffer: vk::CommandBuffer,
        image_index: usize,
        renderables: &[Renderable],
    ) -> VulkanResult<()> {
        let framebuffer = &self.framebuffers[image_index];

        unsafe {
            self.device
                .reset_command_buffer(command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(VulkanError::Api)?;

            let begin_info = vk::CommandBufferBeginInfo::builder();
            self.device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(VulkanError::Api)?;

            let clear_values = [
                vk::ClearValue {
                    color: vk::ClearColorValue {
                        float32: self.config.clear_color,
                    },
                },
                vk::ClearValue {
                    depth_stencil: vk::ClearDepthStencilValue {
                        depth: 1.0,
                        stencil: 0,
                    },
                },
            ];

            let render_pass_begin = vk::RenderPassBeginInfo::builder()
                .render_pass(self.render_pass.handle())
                .framebuffer(framebuffer.handle())
                .render_area(vk::Rect2D {
                    offset: vk::Offset2D { x: 0, y: 0 },
                    extent: framebuffer.extent(),
                })
                .clear_values(&clear_values);

            self.device.cmd_begin_render_pass(
                command_buffer,
                &render_pass_begin,
                vk::SubpassContents::INLINE,
            );

            for renderable in renderables {
                // A renderable with an unresolvable set slot cannot be
                // bound correctly; drop it from the frame with a warning.
                let sets: Option<Vec<vk::DescriptorSet>> = renderable
                    .descriptor_sets
                    .iter()
                    .map(|source| source.resolve(image_index))
                    .collect();
                let Some(sets) = sets else {
                    warn!("Skipping renderable with an empty per-image descriptor set list");
                    continue;
                };

                self.device.cmd_bind_pipeline(
                    command_buffer,
                    vk::PipelineBindPoint::GRAPHICS,
                    renderable.pipeline,
                );

                if !sets.is_empty() {
                    self.device.cmd_bind_descriptor_sets(
                        command_buffer,
                        vk::PipelineBindPoint::GRAPHICS,
                        renderable.pipeline_layout,
                        0,
                        &sets,
                        &[],
                    );
                }

                self.device.cmd_bind_vertex_buffers(
                    command_buffer,
                    0,
                    &[renderable.vertex_buffer],
                    &[0],
                );

                match renderable.index_buffer {
                    Some(index_buffer) => {
                        self.device.cmd_bind_index_buffer(
                            command_buffer,
                            index_buffer,
                            0,
                            vk::IndexType::UINT32,
                        );
                        self.device.cmd_draw_indexed(
                            command_buffer,
                            renderable.index_count,
                            1,
                            0,
                            0,
                            0,
                        );
                    }
                    None => {
                        self.device
                            .cmd_draw(command_buffer, renderable.vertex_count, 1, 0, 0);
                    }
                }
            }

            self.device.cmd_end_render_pass(command_buffer);
            self.device
                .end_command_buffer(command_buffer)
                .map_err(VulkanError::Api)?;
        }

        Ok(())
    }

    /// Recreate the swapchain and everything sized to it.
    fn recreate(
        &mut self,
        context: &mut VulkanContext,
        framebuffer_size: (u32, u32),
    ) -> VulkanResult<()> {
        context.recreate_swapchain(framebuffer_size)?;

        // Old framebuffers reference the destroyed views; rebuild before
        // the next frame records.
        self.framebuffers.clear();
        self.depth_buffer = DepthBuffer::new(
            self.device.clone(),
            context.memory_properties(),
            self.config.depth_format,
            context.swapchain().extent(),
        )?;
        self.framebuffers = Self::create_framebuffers(
            &self.device,
            context,
            &self.render_pass,
            &self.depth_buffer,
        )?;

        debug!(
            "Renderer resized to {}x{}",
            context.swapchain().extent().width,
            context.swapchain().extent().height
        );
        Ok(())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        // Command buffers are in flight until the device drains.
        unsafe {
            let _ = self.device.device_wait_idle();
        }
    }
}
