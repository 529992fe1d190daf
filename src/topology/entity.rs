use nalgebra::Point3;

use crate::{
    curve::{NurbsCurve2D, NurbsCurve3D},
    surface::NurbsSurface3D,
};

/// Index of a face in a geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceId(pub usize);

/// Index of an edge in a geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub usize);

/// Index of a vertex in a geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub usize);

/// A vertex of the boundary representation
#[derive(Debug, Clone, PartialEq)]
pub enum Vertex {
    /// Fixed point in space
    Point(Point3<f64>),
    /// Point of an edge at the parameter `t`
    OnEdge { edge: EdgeId, t: f64 },
    /// Point of a face surface at the parameters `(u, v)`
    OnFace { face: FaceId, u: f64, v: f64 },
}

/// Underlying curve of an edge
#[derive(Debug, Clone)]
pub enum EdgeCurve {
    /// Curve in space
    Free(NurbsCurve3D<f64>),
    /// Curve in the parameter space of a face, mapped onto its surface
    OnFace {
        face: FaceId,
        pcurve: NurbsCurve2D<f64>,
    },
}

/// Direction in which a loop traverses an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Forward,
    Reversed,
}

impl Orientation {
    pub fn is_forward(&self) -> bool {
        matches!(self, Orientation::Forward)
    }
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub(crate) curve: EdgeCurve,
    pub(crate) vertices: Option<(VertexId, VertexId)>,
}

impl Edge {
    pub fn curve(&self) -> &EdgeCurve {
        &self.curve
    }

    /// Start and end vertices, if assigned
    pub fn vertices(&self) -> Option<(VertexId, VertexId)> {
        self.vertices
    }

    /// Start and end vertices in the direction of the orientation
    pub fn oriented_vertices(&self, orientation: Orientation) -> Option<(VertexId, VertexId)> {
        self.vertices.map(|(a, b)| match orientation {
            Orientation::Forward => (a, b),
            Orientation::Reversed => (b, a),
        })
    }
}

/// A closed sequence of oriented edges
#[derive(Debug, Clone, Default)]
pub struct EdgeLoop {
    segments: Vec<(EdgeId, Orientation)>,
}

impl EdgeLoop {
    pub fn new(segments: Vec<(EdgeId, Orientation)>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[(EdgeId, Orientation)] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// A surface trimmed by loops
/// The first loop is the outer boundary, the rest are holes
#[derive(Debug, Clone)]
pub struct Face {
    pub(crate) surface: NurbsSurface3D<f64>,
    pub(crate) loops: Vec<EdgeLoop>,
}

impl Face {
    pub fn surface(&self) -> &NurbsSurface3D<f64> {
        &self.surface
    }

    pub fn loops(&self) -> &[EdgeLoop] {
        &self.loops
    }
}
