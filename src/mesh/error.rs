use std::fmt;
use thiserror::Error;

/// Which attribute array a face corner pointed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Position,
    Normal,
    TexCoord,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Position => "position",
            Self::Normal => "normal",
            Self::TexCoord => "texcoord",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum MeshError {
    #[error("failed to parse obj file: {0}")]
    Parse(#[from] obj::ObjError),

    #[error("mesh has no drawable geometry ({vertices} vertices, {indices} indices)")]
    DegenerateMesh { vertices: usize, indices: usize },

    #[error("{attribute} index {index} out of range ({available} available)")]
    AttributeOutOfRange {
        attribute: Attribute,
        index: u32,
        available: usize,
    },
}
