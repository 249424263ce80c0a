//! Descriptor layer
//!
//! Layouts are declared by accumulating bindings in order; binding numbers
//! are positional. Writing a set supplies exactly one resource per binding,
//! in the same order the layout declared them, and mismatches are rejected
//! before anything reaches the driver.

use ash::{vk, Device};

use crate::render::vulkan::texture::Texture;
use crate::render::vulkan::uniform_buffer::UniformBuffer;
use crate::render::vulkan::{VulkanError, VulkanResult};

/// Kind of resource bound at one descriptor binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// Uniform buffer
    UniformBuffer,
    /// Combined image sampler
    CombinedImageSampler,
    /// Storage image written by compute shaders
    StorageImage,
}

impl BindingKind {
    fn descriptor_type(self) -> vk::DescriptorType {
        match self {
            BindingKind::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
            BindingKind::CombinedImageSampler => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
            BindingKind::StorageImage => vk::DescriptorType::STORAGE_IMAGE,
        }
    }
}

/// Ordered accumulation of descriptor bindings
///
/// The position a binding is added at becomes its binding number in the
/// layout.
#[derive(Debug, Default, Clone)]
pub struct DescriptorBindings {
    bindings: Vec<(BindingKind, vk::ShaderStageFlags)>,
}

impl DescriptorBindings {
    /// Start an empty binding list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a uniform buffer binding visible to the given stages.
    pub fn uniform_buffer(mut self, stages: vk::ShaderStageFlags) -> Self {
        self.bindings.push((BindingKind::UniformBuffer, stages));
        self
    }

    /// Append a combined image sampler binding visible to the given stages.
    pub fn texture(mut self, stages: vk::ShaderStageFlags) -> Self {
        self.bindings
            .push((BindingKind::CombinedImageSampler, stages));
        self
    }

    /// Append a storage image binding visible to the given stages.
    pub fn storage_image(mut self, stages: vk::ShaderStageFlags) -> Self {
        self.bindings.push((BindingKind::StorageImage, stages));
        self
    }

    /// Number of bindings accumulated so far
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no bindings have been added
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Kinds in binding order
    pub fn kinds(&self) -> Vec<BindingKind> {
        self.bindings.iter().map(|(kind, _)| *kind).collect()
    }

    fn layout_bindings(&self) -> Vec<vk::DescriptorSetLayoutBinding> {
        self.bindings
            .iter()
            .enumerate()
            .map(|(i, (kind, stages))| vk::DescriptorSetLayoutBinding {
                binding: i as u32,
                descriptor_type: kind.descriptor_type(),
                descriptor_count: 1,
                stage_flags: *stages,
                ..Default::default()
            })
            .collect()
    }
}

/// One resource supplied to a descriptor write, positionally matched
/// against the layout's bindings
#[derive(Debug, Clone, Copy)]
pub enum DescriptorResource {
    /// Buffer region for a uniform buffer binding
    Buffer(vk::DescriptorBufferInfo),
    /// Sampled image for a combined image sampler binding
    SampledImage(vk::DescriptorImageInfo),
    /// Storage image for a compute binding
    StorageImage(vk::DescriptorImageInfo),
}

impl DescriptorResource {
    fn matches(&self, kind: BindingKind) -> bool {
        matches!(
            (self, kind),
            (DescriptorResource::Buffer(_), BindingKind::UniformBuffer)
                | (
                    DescriptorResource::SampledImage(_),
                    BindingKind::CombinedImageSampler
                )
                | (DescriptorResource::StorageImage(_), BindingKind::StorageImage)
        )
    }
}

/// Check that a write supplies one correctly typed resource per binding.
fn validate_writes(kinds: &[BindingKind], resources: &[DescriptorResource]) -> VulkanResult<()> {
    if kinds.len() != resources.len() {
        return Err(VulkanError::InvalidOperation {
            reason: format!(
                "descriptor write supplies {} resources for {} bindings",
                resources.len(),
                kinds.len()
            ),
        });
    }
    for (i, (kind, resource)) in kinds.iter().zip(resources).enumerate() {
        if !resource.matches(*kind) {
            return Err(VulkanError::InvalidOperation {
                reason: format!("descriptor write resource at binding {i} does not match {kind:?}"),
            });
        }
    }
    Ok(())
}

/// Descriptor set layout with its binding kinds retained for validation
pub struct DescriptorSetLayout {
    device: Device,
    layout: vk::DescriptorSetLayout,
    kinds: Vec<BindingKind>,
}

impl DescriptorSetLayout {
    /// Create a layout from an ordered binding list.
    pub fn new(device: Device, bindings: &DescriptorBindings) -> VulkanResult<Self> {
        let layout_bindings = bindings.layout_bindings();
        let layout_info =
            vk::DescriptorSetLayoutCreateInfo::builder().bindings(&layout_bindings);

        let layout = unsafe {
            device
                .create_descriptor_set_layout(&layout_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self {
            device,
            layout,
            kinds: bindings.kinds(),
        })
    }

    /// Get the layout handle
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }

    /// Binding kinds in declaration order
    pub fn kinds(&self) -> &[BindingKind] {
        &self.kinds
    }

    /// Write one resource per binding into a set allocated against this
    /// layout. Resource count and kinds must match the layout positionally.
    pub fn write_set(
        &self,
        set: vk::DescriptorSet,
        resources: &[DescriptorResource],
    ) -> VulkanResult<()> {
        validate_writes(&self.kinds, resources)?;

        // Info structs must outlive the write array that borrows them.
        let mut buffer_infos = Vec::new();
        let mut image_infos = Vec::new();
        for resource in resources {
            match resource {
                DescriptorResource::Buffer(info) => buffer_infos.push(*info),
                DescriptorResource::SampledImage(info)
                | DescriptorResource::StorageImage(info) => image_infos.push(*info),
            }
        }

        let mut buffer_cursor = 0;
        let mut image_cursor = 0;
        let mut writes = Vec::with_capacity(resources.len());
        for (i, resource) in resources.iter().enumerate() {
            let write = vk::WriteDescriptorSet::builder()
                .dst_set(set)
                .dst_binding(i as u32)
                .dst_array_element(0);
            let write = match resource {
                DescriptorResource::Buffer(_) => {
                    let info = &buffer_infos[buffer_cursor..buffer_cursor + 1];
                    buffer_cursor += 1;
                    write
                        .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                        .buffer_info(info)
                }
                DescriptorResource::SampledImage(_) => {
                    let info = &image_infos[image_cursor..image_cursor + 1];
                    image_cursor += 1;
                    write
                        .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                        .image_info(info)
                }
                DescriptorResource::StorageImage(_) => {
                    let info = &image_infos[image_cursor..image_cursor + 1];
                    image_cursor += 1;
                    write
                        .descriptor_type(vk::DescriptorType::STORAGE_IMAGE)
                        .image_info(info)
                }
            };
            writes.push(write.build());
        }

        unsafe {
            self.device.update_descriptor_sets(&writes, &[]);
        }

        Ok(())
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_set_layout(self.layout, None);
        }
    }
}

/// Descriptor pool sized per descriptor type
pub struct DescriptorPoolManager {
    device: Device,
    pool: vk::DescriptorPool,
}

impl DescriptorPoolManager {
    /// Create a pool able to serve `max_sets` sets, with per-type capacity
    /// derived from the binding kinds it will allocate for.
    pub fn new(device: Device, kinds: &[BindingKind], max_sets: u32) -> VulkanResult<Self> {
        let mut counts: Vec<(vk::DescriptorType, u32)> = Vec::new();
        for kind in kinds {
            let ty = kind.descriptor_type();
            match counts.iter_mut().find(|(t, _)| *t == ty) {
                Some((_, count)) => *count += max_sets,
                None => counts.push((ty, max_sets)),
            }
        }

        let pool_sizes: Vec<vk::DescriptorPoolSize> = counts
            .into_iter()
            .map(|(ty, descriptor_count)| vk::DescriptorPoolSize {
                ty,
                descriptor_count,
            })
            .collect();

        let pool_info = vk::DescriptorPoolCreateInfo::builder()
            .pool_sizes(&pool_sizes)
            .max_sets(max_sets);

        let pool = unsafe {
            device
                .create_descriptor_pool(&pool_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self { device, pool })
    }

    /// Get the pool handle
    pub fn handle(&self) -> vk::DescriptorPool {
        self.pool
    }

    /// Allocate `count` sets against one layout.
    pub fn allocate(
        &self,
        layout: &DescriptorSetLayout,
        count: usize,
    ) -> VulkanResult<Vec<vk::DescriptorSet>> {
        let layouts = vec![layout.handle(); count];
        let alloc_info = vk::DescriptorSetAllocateInfo::builder()
            .descriptor_pool(self.pool)
            .set_layouts(&layouts);

        unsafe {
            self.device
                .allocate_descriptor_sets(&alloc_info)
                .map_err(VulkanError::Api)
        }
    }
}

impl Drop for DescriptorPoolManager {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_pool(self.pool, None);
        }
    }
}

/// Per-swapchain-image descriptor sets for a uniform buffer
pub struct UboDescriptor {
    sets: Vec<vk::DescriptorSet>,
}

impl UboDescriptor {
    /// Allocate one set per swapchain image and point each at the uniform
    /// buffer copy for that image. The layout must consist of a single
    /// uniform buffer binding, and at least one set must be requested.
    pub fn new(
        pool: &DescriptorPoolManager,
        layout: &DescriptorSetLayout,
        ubo: &UniformBuffer,
        image_count: usize,
    ) -> VulkanResult<Self> {
        if image_count == 0 {
            return Err(VulkanError::InvalidOperation {
                reason: "uniform descriptor requires at least one swapchain image".to_string(),
            });
        }
        let sets = pool.allocate(layout, image_count)?;
        for (i, set) in sets.iter().enumerate() {
            layout.write_set(
                *set,
                &[DescriptorResource::Buffer(ubo.descriptor_info(i))],
            )?;
        }
        Ok(Self { sets })
    }

    /// Set to bind while rendering to the given swapchain image
    pub fn set(&self, image_index: usize) -> vk::DescriptorSet {
        self.sets[image_index % self.sets.len()]
    }
}

/// Single descriptor set exposing a texture to shaders
pub struct TextureDescriptor {
    set: vk::DescriptorSet,
}

impl TextureDescriptor {
    /// Allocate one set and write the texture's cached image info into it.
    /// The layout must consist of a single combined image sampler binding.
    pub fn new(
        pool: &DescriptorPoolManager,
        layout: &DescriptorSetLayout,
        texture: &Texture,
    ) -> VulkanResult<Self> {
        let set = pool.allocate(layout, 1)?[0];
        layout.write_set(
            set,
            &[DescriptorResource::SampledImage(texture.descriptor_info())],
        )?;
        Ok(Self { set })
    }

    /// Set to bind while sampling the texture
    pub fn set(&self) -> vk::DescriptorSet {
        self.set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings_are_positional() {
        let bindings = DescriptorBindings::new()
            .uniform_buffer(vk::ShaderStageFlags::VERTEX)
            .texture(vk::ShaderStageFlags::FRAGMENT);

        let layout_bindings = bindings.layout_bindings();
        assert_eq!(layout_bindings.len(), 2);
        assert_eq!(layout_bindings[0].binding, 0);
        assert_eq!(
            layout_bindings[0].descriptor_type,
            vk::DescriptorType::UNIFORM_BUFFER
        );
        assert_eq!(layout_bindings[1].binding, 1);
        assert_eq!(
            layout_bindings[1].descriptor_type,
            vk::DescriptorType::COMBINED_IMAGE_SAMPLER
        );
    }

    #[test]
    fn write_count_must_match_binding_count() {
        let kinds = [BindingKind::UniformBuffer, BindingKind::CombinedImageSampler];
        let resources = [DescriptorResource::Buffer(
            vk::DescriptorBufferInfo::default(),
        )];

        let result = validate_writes(&kinds, &resources);
        assert!(matches!(
            result,
            Err(VulkanError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn write_kinds_must_match_positionally() {
        let kinds = [BindingKind::UniformBuffer, BindingKind::CombinedImageSampler];
        let resources = [
            DescriptorResource::SampledImage(vk::DescriptorImageInfo::default()),
            DescriptorResource::Buffer(vk::DescriptorBufferInfo::default()),
        ];

        let result = validate_writes(&kinds, &resources);
        assert!(matches!(
            result,
            Err(VulkanError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn matching_writes_validate() {
        let kinds = [
            BindingKind::UniformBuffer,
            BindingKind::CombinedImageSampler,
            BindingKind::StorageImage,
        ];
        let resources = [
            DescriptorResource::Buffer(vk::DescriptorBufferInfo::default()),
            DescriptorResource::SampledImage(vk::DescriptorImageInfo::default()),
            DescriptorResource::StorageImage(vk::DescriptorImageInfo::default()),
        ];

        assert!(validate_writes(&kinds, &resources).is_ok());
    }
}
