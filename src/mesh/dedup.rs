use super::{Attribute, MeshError, RawAttributes, Vertex, VertexKey};
use std::collections::HashMap;

/// Normal given to corners that reference no normal.
pub const DEFAULT_NORMAL: [f32; 3] = [0.0, 1.0, 0.0];
/// Texcoord given to corners that reference no texcoord.
pub const DEFAULT_TEX_COORD: [f32; 2] = [0.0, 0.0];

/// Assigns each distinct [`VertexKey`] a sequential output index in order of
/// first appearance, building the unique vertex array alongside.
pub struct VertexDeduplicator<'a> {
    attributes: &'a RawAttributes,
    lookup: HashMap<VertexKey, u32>,
    vertices: Vec<Vertex>,
}

impl<'a> VertexDeduplicator<'a> {
    #[must_use]
    pub fn new(attributes: &'a RawAttributes) -> Self {
        Self {
            attributes,
            lookup: HashMap::new(),
            vertices: Vec::new(),
        }
    }

    /// Returns the output index for `key`, appending a new vertex the first
    /// time the key is seen.
    ///
    /// # Errors
    /// Returns [`MeshError::AttributeOutOfRange`] if any index in `key` points
    /// past its attribute array. Nothing is appended in that case.
    pub fn resolve(&mut self, key: VertexKey) -> Result<u32, MeshError> {
        if let Some(&index) = self.lookup.get(&key) {
            return Ok(index);
        }

        let vertex = self.build_vertex(key)?;
        let index = self.vertices.len() as u32;
        self.vertices.push(vertex);
        self.lookup.insert(key, index);
        Ok(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[must_use]
    pub fn into_vertices(self) -> Vec<Vertex> {
        self.vertices
    }

    fn build_vertex(&self, key: VertexKey) -> Result<Vertex, MeshError> {
        let attrs = self.attributes;

        let position = fetch::<3>(&attrs.positions, key.position, Attribute::Position)?;
        let normal = match key.normal {
            Some(index) => fetch::<3>(&attrs.normals, index, Attribute::Normal)?,
            None => DEFAULT_NORMAL,
        };
        let tex_coord = match key.texcoord {
            Some(index) => fetch::<2>(&attrs.texcoords, index, Attribute::TexCoord)?,
            None => DEFAULT_TEX_COORD,
        };

        Ok(Vertex {
            position,
            normal,
            tex_coord,
        })
    }
}

fn fetch<const N: usize>(
    data: &[f32],
    index: u32,
    attribute: Attribute,
) -> Result<[f32; N], MeshError> {
    let start = index as usize * N;
    data.get(start..start + N)
        .and_then(|slice| <[f32; N]>::try_from(slice).ok())
        .ok_or(MeshError::AttributeOutOfRange {
            attribute,
            index,
            available: data.len() / N,
        })
}
