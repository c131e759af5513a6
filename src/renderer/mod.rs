//! GPU side of the viewer
//!
//! The Metal renderer only exists on macOS. The GPU-facing record layouts
//! live here so they can be checked on every platform.

#[cfg(target_os = "macos")]
mod mesh_renderer;

#[cfg(target_os = "macos")]
pub use mesh_renderer::MeshRenderer;

use crate::config::MaterialConfig;
use crate::math::Mat4;
use crate::mesh::Material;

/// Per-material constants, matching `MaterialData` in `mesh.metal`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpuMaterial {
    pub diffuse_shininess: [f32; 4],
    pub specular_alpha: [f32; 4],
    pub uv_scale: [f32; 2],
    pub uv_scroll_speed: [f32; 2],
    pub use_texture: u32,
    pub _padding: [u32; 3],
}

impl GpuMaterial {
    /// `has_texture` is whether a texture actually loaded, not whether one was named.
    #[must_use]
    pub fn new(material: &Material, has_texture: bool, config: &MaterialConfig) -> Self {
        let [dr, dg, db] = material.diffuse;
        let [sr, sg, sb] = material.specular;
        // UV animation only makes sense when something is sampled.
        let (uv_scale, uv_scroll_speed) = if has_texture {
            (config.uv_scale, config.uv_scroll_speed)
        } else {
            ([1.0, 1.0], [0.0, 0.0])
        };

        Self {
            diffuse_shininess: [dr, dg, db, material.shininess],
            specular_alpha: [sr, sg, sb, material.alpha],
            uv_scale,
            uv_scroll_speed,
            use_texture: u32::from(has_texture),
            _padding: [0; 3],
        }
    }

    #[must_use]
    pub fn is_translucent(&self) -> bool {
        self.specular_alpha[3] < 1.0
    }
}

/// Per-frame constants, matching `FrameUniforms` in `mesh.metal`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FrameUniforms {
    pub view_projection: Mat4,
    pub camera_position: [f32; 4],
    pub time: f32,
    pub _padding: [f32; 3],
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_layouts_match_shader() {
        assert_eq!(std::mem::size_of::<GpuMaterial>(), 64);
        assert_eq!(std::mem::offset_of!(GpuMaterial, use_texture), 48);
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 96);
        assert_eq!(std::mem::offset_of!(FrameUniforms, time), 80);
    }

    #[test]
    fn test_packs_material_fields() {
        let material = Material {
            diffuse: [0.5, 0.6, 0.7],
            specular: [0.1, 0.2, 0.3],
            shininess: 16.0,
            alpha: 0.25,
            texture_path: Some(PathBuf::from("a.png")),
        };

        let gpu = GpuMaterial::new(&material, true, &MaterialConfig::default());
        assert_eq!(gpu.diffuse_shininess, [0.5, 0.6, 0.7, 16.0]);
        assert_eq!(gpu.specular_alpha, [0.1, 0.2, 0.3, 0.25]);
        assert_eq!(gpu.uv_scale, [2.0, 2.0]);
        assert_eq!(gpu.use_texture, 1);
        assert!(gpu.is_translucent());
    }

    #[test]
    fn test_untextured_material_has_no_uv_animation() {
        let gpu = GpuMaterial::new(&Material::default(), false, &MaterialConfig::default());
        assert_eq!(gpu.use_texture, 0);
        assert_eq!(gpu.uv_scale, [1.0, 1.0]);
        assert_eq!(gpu.uv_scroll_speed, [0.0, 0.0]);
        assert!(!gpu.is_translucent());
    }
}
