//! Error types for ductflow.
//!
//! Only building a surface mesh can fail. The per-frame simulation path never
//! returns errors: degenerate geometry simply disables the contributor that
//! hit it for that sub-step.

use std::fmt;

/// Errors that can occur while building a [`SurfaceMesh`](crate::SurfaceMesh).
#[derive(Debug, Clone, PartialEq)]
pub enum MeshError {
    /// The mesh has no vertices or no triangles.
    Empty,
    /// A triangle soup whose length is not a multiple of three.
    IncompleteTriangle {
        /// Number of vertices supplied.
        vertex_count: usize,
    },
    /// A triangle references a vertex that does not exist.
    IndexOutOfRange {
        /// Offending triangle.
        triangle: usize,
        /// Offending vertex index.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },
    /// A vertex coordinate is NaN or infinite.
    NonFiniteVertex {
        /// Offending vertex index.
        index: usize,
    },
    /// Every triangle has zero area.
    AllDegenerate,
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshError::Empty => write!(f, "Surface mesh has no triangles"),
            MeshError::IncompleteTriangle { vertex_count } => write!(
                f,
                "Triangle soup has {} vertices, which is not a multiple of 3",
                vertex_count
            ),
            MeshError::IndexOutOfRange {
                triangle,
                index,
                vertex_count,
            } => write!(
                f,
                "Triangle {} references vertex {} but the mesh only has {} vertices",
                triangle, index, vertex_count
            ),
            MeshError::NonFiniteVertex { index } => {
                write!(f, "Vertex {} has a non-finite coordinate", index)
            }
            MeshError::AllDegenerate => write!(f, "Every triangle in the mesh has zero area"),
        }
    }
}

impl std::error::Error for MeshError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mentions_counts() {
        let err = MeshError::IndexOutOfRange {
            triangle: 3,
            index: 17,
            vertex_count: 8,
        };
        let msg = err.to_string();
        assert!(msg.contains("17"));
        assert!(msg.contains('8'));
    }
}
