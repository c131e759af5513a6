//! A minimal OBJ mesh viewer for macOS using Metal
//!
//! The import pipeline in [`mesh`] turns a Wavefront OBJ file and its MTL
//! library into a single GPU-ready package: deduplicated vertices, one `u32`
//! index buffer grouped by material, a material table with a trailing default
//! material, and one submesh per non-empty material group. It is portable and
//! has no GPU dependency.
//!
//! On macOS, [`app::App`] opens a window and draws the package with a
//! free-fly camera.
//!
//! # Example
//! ```no_run
//! use mesh_viewer::mesh::load_mesh;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mesh = load_mesh("assets/model.obj")?;
//!     for submesh in mesh.submeshes() {
//!         println!("material {} -> {:?}", submesh.material_index, submesh.index_range());
//!     }
//!     Ok(())
//! }
//! ```

#[cfg(target_os = "macos")]
pub mod app;
pub mod config;
pub mod core;
pub mod input;
pub mod math;
pub mod mesh;
pub mod renderer;
pub mod scene;
