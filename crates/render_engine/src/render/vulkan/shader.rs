//! Shader modules
//!
//! SPIR-V words come in as raw bytes; length and alignment are checked
//! before handing them to the driver.

use std::ffi::CStr;

use ash::{vk, Device};

use crate::render::vulkan::{VulkanError, VulkanResult};

const SHADER_ENTRY_POINT: &CStr = unsafe { CStr::from_bytes_with_nul_unchecked(b"main\0") };

/// Compiled SPIR-V shader module
pub struct ShaderModule {
    device: Device,
    module: vk::ShaderModule,
}

impl ShaderModule {
    /// Create a module from raw SPIR-V bytes. The byte length must be a
    /// multiple of four.
    pub fn from_spirv_bytes(device: Device, bytes: &[u8]) -> VulkanResult<Self> {
        if bytes.is_empty() || bytes.len() % 4 != 0 {
            return Err(VulkanError::InvalidOperation {
                reason: format!("SPIR-V byte length {} is not a multiple of 4", bytes.len()),
            });
        }

        let mut cursor = std::io::Cursor::new(bytes);
        let words = ash::util::read_spv(&mut cursor).map_err(|e| {
            VulkanError::InvalidOperation {
                reason: format!("SPIR-V decode failed: {e}"),
            }
        })?;

        let module_info = vk::ShaderModuleCreateInfo::builder().code(&words);
        let module = unsafe {
            device
                .create_shader_module(&module_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self { device, module })
    }

    /// Create a module from a SPIR-V file on disk.
    pub fn from_spirv_file(device: Device, path: &std::path::Path) -> VulkanResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| VulkanError::InvalidOperation {
            reason: format!("failed to read shader {}: {e}", path.display()),
        })?;
        Self::from_spirv_bytes(device, &bytes)
    }

    /// Get the module handle
    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }

    /// Stage create info for this module at the given stage, using the
    /// `main` entry point.
    pub fn stage_info(&self, stage: vk::ShaderStageFlags) -> vk::PipelineShaderStageCreateInfo {
        vk::PipelineShaderStageCreateInfo::builder()
            .stage(stage)
            .module(self.module)
            .name(SHADER_ENTRY_POINT)
            .build()
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}

/// Vertex and fragment modules for one graphics pipeline
pub struct ShaderSet {
    vertex: ShaderModule,
    fragment: ShaderModule,
}

impl ShaderSet {
    /// Create both modules from SPIR-V bytes.
    pub fn new(device: Device, vertex_spirv: &[u8], fragment_spirv: &[u8]) -> VulkanResult<Self> {
        let vertex = ShaderModule::from_spirv_bytes(device.clone(), vertex_spirv)?;
        let fragment = ShaderModule::from_spirv_bytes(device, fragment_spirv)?;
        Ok(Self { vertex, fragment })
    }

    /// Stage infos in pipeline order (vertex, fragment)
    pub fn stage_infos(&self) -> [vk::PipelineShaderStageCreateInfo; 2] {
        [
            self.vertex.stage_info(vk::ShaderStageFlags::VERTEX),
            self.fragment.stage_info(vk::ShaderStageFlags::FRAGMENT),
        ]
    }
}

/// Compute module for a compute pipeline
pub struct ComputeShader {
    module: ShaderModule,
}

impl ComputeShader {
    /// Create the module from SPIR-V bytes.
    pub fn new(device: Device, spirv: &[u8]) -> VulkanResult<Self> {
        Ok(Self {
            module: ShaderModule::from_spirv_bytes(device, spirv)?,
        })
    }

    /// Stage info for the compute stage
    pub fn stage_info(&self) -> vk::PipelineShaderStageCreateInfo {
        self.module.stage_info(vk::ShaderStageFlags::COMPUTE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_point_is_main() {
        assert_eq!(SHADER_ENTRY_POINT.to_bytes(), b"main");
    }
}
