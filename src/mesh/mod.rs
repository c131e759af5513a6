//! OBJ mesh import and GPU resource packing
//!
//! The pipeline turns a parsed OBJ/MTL pair into a [`MeshPackage`]: a
//! deduplicated vertex buffer, a `u32` index buffer split into one contiguous
//! range per material, and a material table whose last entry is always the
//! implicit default material.

mod batch;
mod dedup;
mod error;
mod loader;
mod material;

pub use batch::BatchPartitioner;
pub use dedup::{VertexDeduplicator, DEFAULT_NORMAL, DEFAULT_TEX_COORD};
pub use error::{Attribute, MeshError};
pub use loader::load_mesh;
pub use material::{
    build_material_table, texture_base_dir, DEFAULT_ALPHA, DEFAULT_DIFFUSE, DEFAULT_SHININESS,
    DEFAULT_SPECULAR,
};

use std::path::{Path, PathBuf};

/// Interleaved vertex as uploaded to the GPU: position, normal, texcoord.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
}

/// Identity of a logical vertex: the source attribute indices of one face corner.
///
/// Two corners are the same vertex only when all three indices match, even if
/// the floats they point at happen to be equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexKey {
    pub position: u32,
    pub normal: Option<u32>,
    pub texcoord: Option<u32>,
}

impl VertexKey {
    #[must_use]
    pub const fn new(position: u32, normal: Option<u32>, texcoord: Option<u32>) -> Self {
        Self {
            position,
            normal,
            texcoord,
        }
    }
}

/// Flat attribute arrays as produced by the OBJ parser.
///
/// Positions and normals have a stride of 3 floats, texcoords a stride of 2.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAttributes {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub texcoords: Vec<f32>,
}

impl RawAttributes {
    #[must_use]
    pub fn position_count(&self) -> usize {
        self.positions.len() / 3
    }

    #[must_use]
    pub fn normal_count(&self) -> usize {
        self.normals.len() / 3
    }

    #[must_use]
    pub fn texcoord_count(&self) -> usize {
        self.texcoords.len() / 2
    }
}

/// One polygon; its vertex count is `corners.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFace {
    pub material_id: Option<usize>,
    pub corners: Vec<VertexKey>,
}

/// Parser-neutral mesh: attributes plus faces in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMesh {
    pub attributes: RawAttributes,
    pub faces: Vec<RawFace>,
}

/// Material record as declared in an MTL file. Absent fields stay `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMaterial {
    pub name: String,
    pub diffuse: Option<[f32; 3]>,
    pub specular: Option<[f32; 3]>,
    pub shininess: Option<f32>,
    pub dissolve: Option<f32>,
    pub diffuse_texture: Option<String>,
}

impl From<&obj::Material> for RawMaterial {
    fn from(material: &obj::Material) -> Self {
        Self {
            name: material.name.clone(),
            diffuse: material.kd,
            specular: material.ks,
            shininess: material.ns,
            dissolve: material.d,
            diffuse_texture: material.map_kd.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub shininess: f32,
    pub alpha: f32,
    /// Mesh directory joined with the MTL `map_Kd` filename. `None` means untextured.
    pub texture_path: Option<PathBuf>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse: DEFAULT_DIFFUSE,
            specular: DEFAULT_SPECULAR,
            shininess: DEFAULT_SHININESS,
            alpha: DEFAULT_ALPHA,
            texture_path: None,
        }
    }
}

/// A contiguous run of the shared index buffer drawn with one material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submesh {
    pub index_offset: u32,
    pub index_count: u32,
    pub material_index: u32,
}

impl Submesh {
    #[must_use]
    pub fn index_range(&self) -> std::ops::Range<usize> {
        let start = self.index_offset as usize;
        start..start + self.index_count as usize
    }
}

/// Immutable output of an import, ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshPackage {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    materials: Vec<Material>,
    submeshes: Vec<Submesh>,
}

impl MeshPackage {
    /// Runs dedup, material table construction and batch partitioning over a
    /// parsed mesh. `base_dir` is joined onto texture filenames.
    ///
    /// # Errors
    /// Returns [`MeshError::AttributeOutOfRange`] for a corner pointing past its
    /// attribute array, and [`MeshError::DegenerateMesh`] when no vertex or index
    /// is produced.
    pub fn from_raw(
        raw: &RawMesh,
        raw_materials: &[RawMaterial],
        base_dir: &Path,
    ) -> Result<Self, MeshError> {
        let materials = build_material_table(raw_materials, base_dir);
        let declared = raw_materials.len();

        let mut deduplicator = VertexDeduplicator::new(&raw.attributes);
        let mut partitioner = BatchPartitioner::new(materials.len());

        for face in &raw.faces {
            let slot = BatchPartitioner::resolve_slot(face.material_id, declared);
            for key in &face.corners {
                let index = deduplicator.resolve(*key)?;
                partitioner.push(slot, index);
            }
        }

        let vertices = deduplicator.into_vertices();
        let (indices, submeshes) = partitioner.finish();

        if vertices.is_empty() || indices.is_empty() {
            return Err(MeshError::DegenerateMesh {
                vertices: vertices.len(),
                indices: indices.len(),
            });
        }

        Ok(Self {
            vertices,
            indices,
            materials,
            submeshes,
        })
    }

    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[must_use]
    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    #[must_use]
    pub fn submeshes(&self) -> &[Submesh] {
        &self.submeshes
    }

    /// Index of the implicit fallback material, always the last entry.
    #[must_use]
    pub fn default_material_index(&self) -> usize {
        self.materials.len() - 1
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_attributes() -> RawAttributes {
        RawAttributes {
            positions: vec![
                0.0, 0.0, 0.0, //
                1.0, 0.0, 0.0, //
                1.0, 1.0, 0.0, //
                0.0, 1.0, 0.0,
            ],
            normals: vec![0.0, 0.0, 1.0],
            texcoords: vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0],
        }
    }

    fn corner(p: u32) -> VertexKey {
        VertexKey::new(p, Some(0), Some(p))
    }

    fn triangle(material_id: Option<usize>, a: u32, b: u32, c: u32) -> RawFace {
        RawFace {
            material_id,
            corners: vec![corner(a), corner(b), corner(c)],
        }
    }

    fn red() -> RawMaterial {
        RawMaterial {
            name: "red".to_string(),
            diffuse: Some([1.0, 0.0, 0.0]),
            ..RawMaterial::default()
        }
    }

    #[test]
    fn test_shared_corners_are_deduplicated() {
        let raw = RawMesh {
            attributes: quad_attributes(),
            faces: vec![triangle(None, 0, 1, 2), triangle(None, 0, 2, 3)],
        };

        let package = MeshPackage::from_raw(&raw, &[], Path::new("")).unwrap();
        assert_eq!(package.vertices().len(), 4);
        assert_eq!(package.indices(), &[0, 1, 2, 0, 2, 3]);
        assert_eq!(package.triangle_count(), 2);
    }

    #[test]
    fn test_empty_material_list_routes_everything_to_default() {
        let raw = RawMesh {
            attributes: quad_attributes(),
            faces: vec![triangle(None, 0, 1, 2), triangle(Some(0), 0, 2, 3)],
        };

        let package = MeshPackage::from_raw(&raw, &[], Path::new("")).unwrap();
        assert_eq!(package.materials().len(), 1);
        assert_eq!(package.default_material_index(), 0);
        assert_eq!(
            package.submeshes(),
            &[Submesh {
                index_offset: 0,
                index_count: 6,
                material_index: 0,
            }]
        );
    }

    #[test]
    fn test_batches_follow_material_slot_order() {
        // Default-material face comes first in the file, the declared one second.
        let raw = RawMesh {
            attributes: quad_attributes(),
            faces: vec![triangle(Some(7), 0, 1, 2), triangle(Some(0), 0, 2, 3)],
        };

        let package = MeshPackage::from_raw(&raw, &[red()], Path::new("")).unwrap();
        assert_eq!(package.materials().len(), 2);
        assert_eq!(
            package.submeshes(),
            &[
                Submesh {
                    index_offset: 0,
                    index_count: 3,
                    material_index: 0,
                },
                Submesh {
                    index_offset: 3,
                    index_count: 3,
                    material_index: 1,
                },
            ]
        );
        // Vertex numbering still follows face order.
        assert_eq!(package.indices(), &[0, 2, 3, 0, 1, 2]);
    }

    #[test]
    fn test_submeshes_cover_index_buffer() {
        let raw = RawMesh {
            attributes: quad_attributes(),
            faces: vec![
                triangle(Some(1), 0, 1, 2),
                triangle(None, 1, 2, 3),
                triangle(Some(0), 0, 2, 3),
                triangle(Some(1), 3, 2, 1),
            ],
        };

        let package = MeshPackage::from_raw(&raw, &[red(), red()], Path::new("")).unwrap();
        let mut expected_offset = 0;
        for submesh in package.submeshes() {
            assert_eq!(submesh.index_offset, expected_offset);
            assert!(submesh.index_count > 0);
            expected_offset += submesh.index_count;
        }
        assert_eq!(expected_offset as usize, package.indices().len());
    }

    #[test]
    fn test_no_faces_is_degenerate() {
        let raw = RawMesh {
            attributes: quad_attributes(),
            faces: Vec::new(),
        };

        let err = MeshPackage::from_raw(&raw, &[red()], Path::new("")).unwrap_err();
        assert!(matches!(
            err,
            MeshError::DegenerateMesh {
                vertices: 0,
                indices: 0
            }
        ));
    }

    #[test]
    fn test_out_of_range_position_is_rejected() {
        let raw = RawMesh {
            attributes: quad_attributes(),
            faces: vec![triangle(None, 0, 1, 9)],
        };

        let err = MeshPackage::from_raw(&raw, &[], Path::new("")).unwrap_err();
        assert!(matches!(
            err,
            MeshError::AttributeOutOfRange {
                attribute: Attribute::Position,
                index: 9,
                available: 4,
            }
        ));
    }

    #[test]
    fn test_vertex_layout_is_eight_floats() {
        assert_eq!(std::mem::size_of::<Vertex>(), 8 * std::mem::size_of::<f32>());
        assert_eq!(std::mem::offset_of!(Vertex, normal), 12);
        assert_eq!(std::mem::offset_of!(Vertex, tex_coord), 24);
    }
}
