//! Vertex assembly from raw attribute arrays
//!
//! Asset loaders hand over positions, normals, texture coordinates,
//! tangents, and bitangents as parallel arrays. This module interleaves
//! them into the engine's vertex format. Positions drive the vertex count;
//! missing optional attributes are zero-filled, mismatched ones are an
//! error.

use crate::render::vulkan::vertex_layout::Vertex;
use crate::render::vulkan::{VulkanError, VulkanResult};

/// Raw per-vertex attribute arrays as delivered by an asset provider
#[derive(Debug, Default, Clone)]
pub struct MeshData {
    /// Object-space positions, one per vertex (required)
    pub positions: Vec<[f32; 3]>,
    /// Object-space normals (optional, zero-filled when absent)
    pub normals: Vec<[f32; 3]>,
    /// Texture coordinates (optional)
    pub uvs: Vec<[f32; 2]>,
    /// Tangents (optional)
    pub tangents: Vec<[f32; 3]>,
    /// Bitangents (optional)
    pub bitangents: Vec<[f32; 3]>,
    /// Triangle indices into the vertex arrays
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Interleave the attribute arrays into vertex structs.
    ///
    /// Every non-empty attribute array must match the position count, and
    /// every index must point at an existing vertex.
    pub fn interleave(&self) -> VulkanResult<Vec<Vertex>> {
        let count = self.positions.len();
        if count == 0 {
            return Err(VulkanError::InvalidOperation {
                reason: "mesh has no positions".to_string(),
            });
        }

        for (name, len) in [
            ("normals", self.normals.len()),
            ("uvs", self.uvs.len()),
            ("tangents", self.tangents.len()),
            ("bitangents", self.bitangents.len()),
        ] {
            if len != 0 && len != count {
                return Err(VulkanError::InvalidOperation {
                    reason: format!("mesh has {count} positions but {len} {name}"),
                });
            }
        }

        if let Some(&bad) = self.indices.iter().find(|&&i| i as usize >= count) {
            return Err(VulkanError::InvalidOperation {
                reason: format!("mesh index {bad} out of range for {count} vertices"),
            });
        }

        let vertices = (0..count)
            .map(|i| Vertex {
                position: self.positions[i],
                normal: self.normals.get(i).copied().unwrap_or([0.0; 3]),
                uv: self.uvs.get(i).copied().unwrap_or([0.0; 2]),
                tangent: self.tangents.get(i).copied().unwrap_or([0.0; 3]),
                bitangent: self.bitangents.get(i).copied().unwrap_or([0.0; 3]),
            })
            .collect();

        Ok(vertices)
    }

    /// Number of vertices described by the position array
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of indices
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> MeshData {
        MeshData {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            uvs: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            indices: vec![0, 1, 2],
            ..Default::default()
        }
    }

    #[test]
    fn interleaves_in_position_order() {
        let mesh = triangle();
        let vertices = mesh.interleave().unwrap();
        assert_eq!(vertices.len(), 3);
        assert_eq!(vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(vertices[1].uv, [1.0, 0.0]);
        assert_eq!(vertices[1].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn missing_attributes_are_zero_filled() {
        let mesh = MeshData {
            positions: vec![[1.0, 2.0, 3.0]],
            ..Default::default()
        };
        let vertices = mesh.interleave().unwrap();
        assert_eq!(vertices[0].tangent, [0.0; 3]);
        assert_eq!(vertices[0].bitangent, [0.0; 3]);
        assert_eq!(vertices[0].uv, [0.0; 2]);
    }

    #[test]
    fn mismatched_attribute_counts_are_rejected() {
        let mut mesh = triangle();
        mesh.normals.pop();
        assert!(matches!(
            mesh.interleave(),
            Err(VulkanError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut mesh = triangle();
        mesh.indices.push(3);
        assert!(matches!(
            mesh.interleave(),
            Err(VulkanError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn empty_mesh_is_rejected() {
        let mesh = MeshData::default();
        assert!(mesh.interleave().is_err());
    }
}
