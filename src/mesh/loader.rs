use super::{
    texture_base_dir, MeshError, MeshPackage, RawAttributes, RawFace, RawMaterial, RawMesh,
    VertexKey,
};
use obj::{IndexTuple, Mtl, Obj, ObjData, ObjMaterial};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Loads an OBJ file (and its MTL libraries) into a [`MeshPackage`].
///
/// Reads only the OBJ and MTL files; identical input bytes always produce an
/// identical package. A missing or unreadable MTL file is logged and the faces
/// that name its materials fall back to the default material.
///
/// # Errors
/// Returns [`MeshError::Parse`] if the OBJ cannot be read or parsed,
/// [`MeshError::AttributeOutOfRange`] if a face points past an attribute list,
/// and [`MeshError::DegenerateMesh`] if it contains no faces.
pub fn load_mesh(path: impl AsRef<Path>) -> Result<MeshPackage, MeshError> {
    let path = path.as_ref();
    let mut obj = Obj::load(path)?;

    if let Err(e) = obj.load_mtls() {
        warn!(
            "Failed to load materials for {}: {e:?}, using default material",
            path.display()
        );
    }

    let raw_materials = declared_materials(&obj.data.material_libs);
    let raw = raw_mesh_from_obj(&obj.data, &raw_materials);
    let package = MeshPackage::from_raw(&raw, &raw_materials, texture_base_dir(path))?;

    debug!(
        "Imported {}: {} vertices, {} indices, {} materials, {} submeshes",
        path.display(),
        package.vertices().len(),
        package.indices().len(),
        package.materials().len(),
        package.submeshes().len()
    );

    Ok(package)
}

/// Every material of every library, in `mtllib` then declaration order.
fn declared_materials(libs: &[Mtl]) -> Vec<RawMaterial> {
    libs.iter()
        .flat_map(|lib| lib.materials.iter())
        .map(|material| RawMaterial::from(material.as_ref()))
        .collect()
}

/// Flattens the parsed file into one attribute space and a triangle list.
///
/// Corner indices stay the file's global indices, so a corner reused under
/// several `o`/`g`/`usemtl` runs keeps one identity.
fn raw_mesh_from_obj(data: &ObjData, materials: &[RawMaterial]) -> RawMesh {
    let slots = material_slots(materials);
    let mut faces = Vec::new();

    for group in data.objects.iter().flat_map(|object| object.groups.iter()) {
        let material_id = group
            .material
            .as_ref()
            .and_then(|material| slots.get(material_name(material)).copied());

        for polygon in &group.polys {
            for corners in fan_triangulate(&polygon.0) {
                faces.push(RawFace {
                    material_id,
                    corners: corners.to_vec(),
                });
            }
        }
    }

    RawMesh {
        attributes: RawAttributes {
            positions: data.position.iter().flatten().copied().collect(),
            normals: data.normal.iter().flatten().copied().collect(),
            texcoords: data.texture.iter().flatten().copied().collect(),
        },
        faces,
    }
}

/// Material name → slot. A name declared twice resolves to its first slot.
fn material_slots(materials: &[RawMaterial]) -> HashMap<&str, usize> {
    let mut slots = HashMap::with_capacity(materials.len());
    for (slot, material) in materials.iter().enumerate() {
        slots.entry(material.name.as_str()).or_insert(slot);
    }
    slots
}

fn material_name(material: &ObjMaterial) -> &str {
    match material {
        ObjMaterial::Ref(name) => name,
        ObjMaterial::Mtl(material) => &material.name,
    }
}

/// Splits a polygon into triangles around its first corner. Points and lines
/// yield nothing.
fn fan_triangulate(polygon: &[IndexTuple]) -> Vec<[VertexKey; 3]> {
    let Some((first, rest)) = polygon.split_first() else {
        return Vec::new();
    };
    let first = corner_key(first);

    rest.windows(2)
        .map(|pair| [first, corner_key(&pair[0]), corner_key(&pair[1])])
        .collect()
}

/// Indices that do not fit in `u32` saturate and are rejected by the
/// deduplicator's bounds check.
fn corner_key(corner: &IndexTuple) -> VertexKey {
    let narrow = |index: usize| u32::try_from(index).unwrap_or(u32::MAX);
    let IndexTuple(position, texcoord, normal) = corner;
    VertexKey::new(narrow(*position), normal.map(narrow), texcoord.map(narrow))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corner(position: usize, texcoord: Option<usize>, normal: Option<usize>) -> IndexTuple {
        IndexTuple(position, texcoord, normal)
    }

    #[test]
    fn test_corner_key_reorders_tuple() {
        let key = corner_key(&corner(4, Some(2), Some(7)));
        assert_eq!(key, VertexKey::new(4, Some(7), Some(2)));

        let bare = corner_key(&corner(0, None, None));
        assert_eq!(bare, VertexKey::new(0, None, None));
    }

    #[test]
    fn test_oversized_index_saturates() {
        let key = corner_key(&corner(usize::MAX, None, None));
        assert_eq!(key.position, u32::MAX);
    }

    #[test]
    fn test_fan_triangulation() {
        let pentagon: Vec<_> = (0..5).map(|i| corner(i, None, None)).collect();
        let triangles = fan_triangulate(&pentagon);

        let positions: Vec<[u32; 3]> = triangles
            .iter()
            .map(|t| [t[0].position, t[1].position, t[2].position])
            .collect();
        assert_eq!(positions, vec![[0, 1, 2], [0, 2, 3], [0, 3, 4]]);
    }

    #[test]
    fn test_points_and_lines_produce_no_triangles() {
        assert!(fan_triangulate(&[]).is_empty());
        assert!(fan_triangulate(&[corner(0, None, None)]).is_empty());
        assert!(fan_triangulate(&[corner(0, None, None), corner(1, None, None)]).is_empty());
    }

    #[test]
    fn test_duplicate_material_name_keeps_first_slot() {
        let named = |name: &str| RawMaterial {
            name: name.to_string(),
            ..RawMaterial::default()
        };
        let materials = [named("stone"), named("wood"), named("stone")];

        let slots = material_slots(&materials);
        assert_eq!(slots.get("stone"), Some(&0));
        assert_eq!(slots.get("wood"), Some(&1));
        assert_eq!(slots.get("glass"), None);
    }
}
