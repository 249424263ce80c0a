//! Rendering layer
//!
//! Scene-facing types (renderables, camera matrices) over the Vulkan
//! backend. The scene hands the renderer an ordered renderable list each
//! tick; the list is read-only for the duration of the frame.

pub mod mesh;
pub mod renderer;
pub mod vulkan;

use ash::vk;
use nalgebra::{Matrix4, Point3, Vector3};

/// Descriptor sets for one binding slot of a renderable
///
/// Static resources bind the same set every frame; resources with one
/// copy per swapchain image carry a set per image.
#[derive(Debug, Clone)]
pub enum DescriptorSetSource {
    /// Same set regardless of swapchain image
    Fixed(vk::DescriptorSet),
    /// One set per swapchain image, indexed by acquired image
    PerImage(Vec<vk::DescriptorSet>),
}

impl DescriptorSetSource {
    /// Resolve the set to bind for the acquired swapchain image.
    /// An empty per-image list has nothing to bind and resolves to `None`.
    pub fn resolve(&self, image_index: usize) -> Option<vk::DescriptorSet> {
        match self {
            DescriptorSetSource::Fixed(set) => Some(*set),
            DescriptorSetSource::PerImage(sets) => {
                if sets.is_empty() {
                    None
                } else {
                    Some(sets[image_index % sets.len()])
                }
            }
        }
    }
}

/// One draw: pipeline, descriptor sets, and geometry buffers
///
/// Renderables hold raw handles; the resources they point at must outlive
/// the frame that draws them.
#[derive(Debug, Clone)]
pub struct Renderable {
    /// Graphics pipeline to bind
    pub pipeline: vk::Pipeline,
    /// Layout the descriptor sets are bound against
    pub pipeline_layout: vk::PipelineLayout,
    /// Descriptor set sources in set-number order
    pub descriptor_sets: Vec<DescriptorSetSource>,
    /// Interleaved vertex buffer
    pub vertex_buffer: vk::Buffer,
    /// Vertices available in the vertex buffer
    pub vertex_count: u32,
    /// Index buffer; absent for non-indexed draws
    pub index_buffer: Option<vk::Buffer>,
    /// Indices to draw when an index buffer is present
    pub index_count: u32,
}

/// View and projection matrices handed over by the scene each tick
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    /// World-to-view transform
    pub view: Matrix4<f32>,
    /// View-to-clip transform, Vulkan clip conventions
    pub projection: Matrix4<f32>,
}

impl Camera {
    /// Build a camera from a look-at view and a perspective projection.
    /// The projection's Y axis is flipped for Vulkan's clip space.
    pub fn perspective(
        eye: Point3<f32>,
        target: Point3<f32>,
        up: Vector3<f32>,
        fovy: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let view = Matrix4::look_at_rh(&eye, &target, &up);
        let mut projection = Matrix4::new_perspective(aspect, fovy, near, far);
        projection[(1, 1)] *= -1.0;
        Self { view, projection }
    }

    /// Combined view-projection matrix
    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection * self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ash::vk::Handle;

    #[test]
    fn fixed_source_ignores_image_index() {
        let set = vk::DescriptorSet::from_raw(7);
        let source = DescriptorSetSource::Fixed(set);
        assert_eq!(source.resolve(0), Some(set));
        assert_eq!(source.resolve(2), Some(set));
    }

    #[test]
    fn per_image_source_selects_by_index() {
        let sets = vec![
            vk::DescriptorSet::from_raw(1),
            vk::DescriptorSet::from_raw(2),
            vk::DescriptorSet::from_raw(3),
        ];
        let source = DescriptorSetSource::PerImage(sets.clone());
        assert_eq!(source.resolve(0), Some(sets[0]));
        assert_eq!(source.resolve(2), Some(sets[2]));
    }

    #[test]
    fn empty_per_image_source_resolves_to_nothing() {
        let source = DescriptorSetSource::PerImage(Vec::new());
        assert_eq!(source.resolve(0), None);
        assert_eq!(source.resolve(5), None);
    }

    #[test]
    fn projection_flips_y_for_vulkan() {
        let camera = Camera::perspective(
            Point3::new(0.0, 0.0, 2.0),
            Point3::origin(),
            Vector3::y(),
            std::f32::consts::FRAC_PI_4,
            16.0 / 9.0,
            0.1,
            100.0,
        );
        assert!(camera.projection[(1, 1)] < 0.0);
        let unflipped = Matrix4::new_perspective(16.0 / 9.0, std::f32::consts::FRAC_PI_4, 0.1, 100.0);
        assert_relative_eq!(camera.projection[(1, 1)], -unflipped[(1, 1)]);
    }
}
