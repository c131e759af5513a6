use super::{Material, RawMaterial};
use std::path::Path;

pub const DEFAULT_DIFFUSE: [f32; 3] = [1.0, 1.0, 1.0];
pub const DEFAULT_SPECULAR: [f32; 3] = [0.0, 0.0, 0.0];
pub const DEFAULT_SHININESS: f32 = 32.0;
pub const DEFAULT_ALPHA: f32 = 1.0;

/// Directory holding `mesh_path`, or an empty path for a bare filename.
///
/// Works on the raw path so non-UTF-8 directory names survive.
#[must_use]
pub fn texture_base_dir(mesh_path: &Path) -> &Path {
    mesh_path.parent().unwrap_or(Path::new(""))
}

/// Converts declared materials 1:1 and appends the default material last.
///
/// Texture filenames are joined verbatim onto `base_dir`; whether the file
/// exists is left to the texture loader.
#[must_use]
pub fn build_material_table(raw_materials: &[RawMaterial], base_dir: &Path) -> Vec<Material> {
    let mut materials = Vec::with_capacity(raw_materials.len() + 1);

    for raw in raw_materials {
        materials.push(Material {
            diffuse: raw.diffuse.unwrap_or(DEFAULT_DIFFUSE),
            specular: raw.specular.unwrap_or(DEFAULT_SPECULAR),
            shininess: raw.shininess.unwrap_or(DEFAULT_SHININESS),
            alpha: raw.dissolve.unwrap_or(DEFAULT_ALPHA),
            texture_path: raw
                .diffuse_texture
                .as_deref()
                .filter(|name| !name.is_empty())
                .map(|name| base_dir.join(name)),
        });
    }

    materials.push(Material::default());
    materials
}
