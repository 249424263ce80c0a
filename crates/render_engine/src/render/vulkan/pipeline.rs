//! Pipeline creation
//!
//! Graphics pipelines are assembled from a shader set, the shared vertex
//! layout, and a small fixed-function state block. Viewport and scissor
//! are baked to the swapchain extent, so pipelines are recreated with the
//! swapchain.

use ash::{vk, Device};
use log::debug;

use crate::render::vulkan::commands::TransferSession;
use crate::render::vulkan::render_pass::RenderPass;
use crate::render::vulkan::shader::{ComputeShader, ShaderSet};
use crate::render::vulkan::vertex_layout::VulkanVertexLayout;
use crate::render::vulkan::{VulkanError, VulkanResult};

/// Fixed-function settings that vary between pipelines
#[derive(Debug, Clone, Copy)]
pub struct FixedFunctionState {
    /// Primitive topology
    pub topology: vk::PrimitiveTopology,
    /// Polygon rasterization mode
    pub polygon_mode: vk::PolygonMode,
    /// Faces culled during rasterization
    pub cull_mode: vk::CullModeFlags,
    /// Winding order treated as front-facing
    pub front_face: vk::FrontFace,
    /// Whether depth testing and writing are enabled
    pub depth_test: bool,
}

impl Default for FixedFunctionState {
    fn default() -> Self {
        Self {
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::BACK,
            front_face: vk::FrontFace::COUNTER_CLOCKWISE,
            depth_test: true,
        }
    }
}

impl FixedFunctionState {
    /// State for rendering a skybox: no culling, depth test without write.
    pub fn skybox() -> Self {
        Self {
            cull_mode: vk::CullModeFlags::NONE,
            ..Self::default()
        }
    }
}

/// Pipeline and its layout, graphics or compute
pub struct Pipeline {
    device: Device,
    pipeline: vk::Pipeline,
    layout: vk::PipelineLayout,
    bind_point: vk::PipelineBindPoint,
}

impl Pipeline {
    /// Create a graphics pipeline over the engine's interleaved vertex
    /// layout.
    #[allow(clippy::too_many_arguments)]
    pub fn new_graphics(
        device: Device,
        render_pass: &RenderPass,
        set_layouts: &[vk::DescriptorSetLayout],
        push_constant_ranges: &[vk::PushConstantRange],
        shaders: &ShaderSet,
        extent: vk::Extent2D,
        state: FixedFunctionState,
    ) -> VulkanResult<Self> {
        let layout = Self::create_layout(&device, set_layouts, push_constant_ranges)?;

        let stages = shaders.stage_infos();

        let binding_descriptions = [VulkanVertexLayout::binding_description()];
        let attribute_descriptions = VulkanVertexLayout::attribute_descriptions();
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::builder()
            .vertex_binding_descriptions(&binding_descriptions)
            .vertex_attribute_descriptions(&attribute_descriptions);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(state.topology)
            .primitive_restart_enable(false);

        let viewports = [vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }];
        let scissors = [vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        }];
        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewports(&viewports)
            .scissors(&scissors);

        let rasterizer = vk::PipelineRasterizationStateCreateInfo::builder()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(state.polygon_mode)
            .line_width(1.0)
            .cull_mode(state.cull_mode)
            .front_face(state.front_face)
            .depth_bias_enable(false);

        let multisampling = vk::PipelineMultisampleStateCreateInfo::builder()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::builder()
            .depth_test_enable(state.depth_test)
            .depth_write_enable(state.depth_test)
            .depth_compare_op(vk::CompareOp::LESS)
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let color_blend_attachments = [vk::PipelineColorBlendAttachmentState {
            color_write_mask: vk::ColorComponentFlags::RGBA,
            blend_enable: vk::FALSE,
            ..Default::default()
        }];
        let color_blending = vk::PipelineColorBlendStateCreateInfo::builder()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let pipeline_info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(&stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterizer)
            .multisample_state(&multisampling)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blending)
            .layout(layout)
            .render_pass(render_pass.handle())
            .subpass(0);

        let pipeline = match unsafe {
            device.create_graphics_pipelines(
                vk::PipelineCache::null(),
                &[pipeline_info.build()],
                None,
            )
        } {
            Ok(pipelines) => pipelines[0],
            Err((_, e)) => {
                unsafe { device.destroy_pipeline_layout(layout, None) };
                return Err(VulkanError::Api(e));
            }
        };

        debug!("Created graphics pipeline ({}x{})", extent.width, extent.height);

        Ok(Self {
            device,
            pipeline,
            layout,
            bind_point: vk::PipelineBindPoint::GRAPHICS,
        })
    }

    /// Create a compute pipeline.
    pub fn new_compute(
        device: Device,
        set_layouts: &[vk::DescriptorSetLayout],
        push_constant_ranges: &[vk::PushConstantRange],
        shader: &ComputeShader,
    ) -> VulkanResult<Self> {
        let layout = Self::create_layout(&device, set_layouts, push_constant_ranges)?;

        let pipeline_info = vk::ComputePipelineCreateInfo::builder()
            .stage(shader.stage_info())
            .layout(layout);

        let pipeline = match unsafe {
            device.create_compute_pipelines(
                vk::PipelineCache::null(),
                &[pipeline_info.build()],
                None,
            )
        } {
            Ok(pipelines) => pipelines[0],
            Err((_, e)) => {
                unsafe { device.destroy_pipeline_layout(layout, None) };
                return Err(VulkanError::Api(e));
            }
        };

        Ok(Self {
            device,
            pipeline,
            layout,
            bind_point: vk::PipelineBindPoint::COMPUTE,
        })
    }

    fn create_layout(
        device: &Device,
        set_layouts: &[vk::DescriptorSetLayout],
        push_constant_ranges: &[vk::PushConstantRange],
    ) -> VulkanResult<vk::PipelineLayout> {
        let layout_info = vk::PipelineLayoutCreateInfo::builder()
            .set_layouts(set_layouts)
            .push_constant_ranges(push_constant_ranges);
        unsafe {
            device
                .create_pipeline_layout(&layout_info, None)
                .map_err(VulkanError::Api)
        }
    }

    /// Get the pipeline handle
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    /// Get the pipeline layout handle
    pub fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }

    /// Bind point the pipeline was created for
    pub fn bind_point(&self) -> vk::PipelineBindPoint {
        self.bind_point
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
            self.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}

/// Workgroups needed to cover `global_size` invocations with workgroups
/// of `local_size`, rounding up so the tail is covered.
pub fn group_count(global_size: u32, local_size: u32) -> u32 {
    let local_size = local_size.max(1);
    global_size.div_ceil(local_size)
}

/// Run a compute pipeline as a blocking one-shot submission.
///
/// Binds the pipeline and descriptor sets, dispatches the workgroup
/// counts, and waits for the queue to finish before returning.
pub fn run_compute(
    device: &Device,
    command_pool: vk::CommandPool,
    queue: vk::Queue,
    pipeline: &Pipeline,
    descriptor_sets: &[vk::DescriptorSet],
    group_counts: (u32, u32, u32),
) -> VulkanResult<()> {
    let mut session = TransferSession::begin(device.clone(), command_pool)?;
    session.dispatch(
        pipeline.handle(),
        pipeline.layout(),
        descriptor_sets,
        group_counts,
    );
    session.finish(queue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_culls_back_faces_with_depth() {
        let state = FixedFunctionState::default();
        assert_eq!(state.cull_mode, vk::CullModeFlags::BACK);
        assert!(state.depth_test);
        assert_eq!(state.topology, vk::PrimitiveTopology::TRIANGLE_LIST);
    }

    #[test]
    fn skybox_state_disables_culling() {
        let state = FixedFunctionState::skybox();
        assert_eq!(state.cull_mode, vk::CullModeFlags::NONE);
    }

    #[test]
    fn group_count_rounds_up_partial_workgroups() {
        assert_eq!(group_count(1024, 16), 64);
        assert_eq!(group_count(1000, 16), 63);
        assert_eq!(group_count(1, 16), 1);
        assert_eq!(group_count(0, 16), 0);
    }

    #[test]
    fn group_count_tolerates_zero_local_size() {
        assert_eq!(group_count(7, 0), 7);
    }
}
