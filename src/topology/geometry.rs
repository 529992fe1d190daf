use argmin::core::{Executor, State};
use nalgebra::{Point2, Point3, Vector3, U3};

use crate::{
    closest_parameter::{ClosestParameterNewton, CurveClosestParameterProblem, CurveDerivatives},
    misc::segment_closest_point,
};

use super::{Edge, EdgeCurve, EdgeId, Face, FaceId, Vertex, VertexId};

/// Validated collection of faces, edges and vertices
/// Created by `GeometryBuilder::build`
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    pub(crate) faces: Vec<Face>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) vertices: Vec<Vertex>,
}

impl Geometry {
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> {
        (0..self.faces.len()).map(FaceId)
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> {
        (0..self.edges.len()).map(EdgeId)
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> {
        (0..self.vertices.len()).map(VertexId)
    }

    pub fn face(&self, id: FaceId) -> anyhow::Result<&Face> {
        self.faces
            .get(id.0)
            .ok_or(anyhow::anyhow!("Face {} does not exist", id.0))
    }

    pub fn edge(&self, id: EdgeId) -> anyhow::Result<&Edge> {
        self.edges
            .get(id.0)
            .ok_or(anyhow::anyhow!("Edge {} does not exist", id.0))
    }

    pub fn vertex(&self, id: VertexId) -> anyhow::Result<&Vertex> {
        self.vertices
            .get(id.0)
            .ok_or(anyhow::anyhow!("Vertex {} does not exist", id.0))
    }

    /// Position of a vertex in space
    pub fn vertex_point(&self, id: VertexId) -> anyhow::Result<Point3<f64>> {
        match self.vertex(id)? {
            Vertex::Point(p) => Ok(*p),
            Vertex::OnEdge { edge, t } => self.edge_point_at(*edge, *t),
            Vertex::OnFace { face, u, v } => Ok(self.face(*face)?.surface.point_at(*u, *v)),
        }
    }

    /// Parameter domain of an edge
    pub fn edge_range(&self, id: EdgeId) -> anyhow::Result<(f64, f64)> {
        Ok(match &self.edge(id)?.curve {
            EdgeCurve::Free(curve) => curve.knots_domain(),
            EdgeCurve::OnFace { pcurve, .. } => pcurve.knots_domain(),
        })
    }

    pub fn edge_point_at(&self, id: EdgeId, t: f64) -> anyhow::Result<Point3<f64>> {
        match &self.edge(id)?.curve {
            EdgeCurve::Free(curve) => Ok(curve.point_at(t)),
            EdgeCurve::OnFace { face, pcurve } => {
                let uv = pcurve.point_at(t);
                Ok(self.face(*face)?.surface.point_at(uv.x, uv.y))
            }
        }
    }

    /// First derivative of an edge with respect to its parameter
    pub fn edge_derivative_at(&self, id: EdgeId, t: f64) -> anyhow::Result<Vector3<f64>> {
        let ders = self.edge_derivatives(id, t)?;
        Ok(ders[1])
    }

    /// Position, first and second derivatives of an edge
    /// Edges on a face are differentiated through the surface by the chain rule
    pub fn edge_derivatives(&self, id: EdgeId, t: f64) -> anyhow::Result<[Vector3<f64>; 3]> {
        match &self.edge(id)?.curve {
            EdgeCurve::Free(curve) => {
                let d = curve.rational_derivatives(t, 2);
                Ok([d[0], d[1], d[2]])
            }
            EdgeCurve::OnFace { face, pcurve } => {
                let c = pcurve.rational_derivatives(t, 2);
                let (uv, duv, dduv) = (c[0], c[1], c[2]);
                let s = self.face(*face)?.surface.rational_derivatives(uv.x, uv.y, 2);
                let (su, sv) = (s[1][0], s[0][1]);
                let (suu, suv, svv) = (s[2][0], s[1][1], s[0][2]);
                let first = su * duv.x + sv * duv.y;
                let second = suu * (duv.x * duv.x)
                    + suv * (2. * duv.x * duv.y)
                    + svv * (duv.y * duv.y)
                    + su * dduv.x
                    + sv * dduv.y;
                Ok([s[0][0], first, second])
            }
        }
    }

    /// Parameters of an edge point in the parameter space of a face
    /// Taken from the pcurve when the edge lies on the face, otherwise found by inverse evaluation
    pub fn edge_params_on_face(
        &self,
        edge: EdgeId,
        face: FaceId,
        t: f64,
    ) -> anyhow::Result<Point2<f64>> {
        match &self.edge(edge)?.curve {
            EdgeCurve::OnFace { face: f, pcurve } if *f == face => Ok(pcurve.point_at(t)),
            _ => {
                let p = self.edge_point_at(edge, t)?;
                let (u, v) = self.face(face)?.surface.find_closest_parameter(&p)?;
                Ok(Point2::new(u, v))
            }
        }
    }

    /// Find the parameter of the edge closest to a point
    pub fn edge_closest_parameter(&self, id: EdgeId, point: &Point3<f64>) -> anyhow::Result<f64> {
        let (start, end) = self.edge_range(id)?;
        let samples = 64;
        let pts = (0..=samples)
            .map(|i| {
                let t = start + (end - start) * i as f64 / samples as f64;
                self.edge_point_at(id, t).map(|p| (t, p))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let mut min = f64::MAX;
        let mut seed = start;
        for w in pts.windows(2) {
            let (t, p) = segment_closest_point(point, &w[0].1, &w[1].1, w[0].0, w[1].0);
            let d = (point - p).norm();
            if d < min {
                min = d;
                seed = t;
            }
        }

        let edge = EdgeView {
            geometry: self,
            edge: id,
        };
        let problem = CurveClosestParameterProblem::new(point, &edge);
        let res = Executor::new(problem, ClosestParameterNewton::new((start, end)))
            .configure(|state| state.param(seed).max_iters(16))
            .run()?;
        let best = res.state().get_best_param().cloned().unwrap_or(seed);
        log::trace!("closest parameter on edge {}: seed {} -> {}", id.0, seed, best);
        Ok(best)
    }
}

/// An edge seen as a curve in space
struct EdgeView<'a> {
    geometry: &'a Geometry,
    edge: EdgeId,
}

impl CurveDerivatives<f64, U3> for EdgeView<'_> {
    fn derivatives_at(&self, t: f64, n: usize) -> anyhow::Result<Vec<Vector3<f64>>> {
        anyhow::ensure!(n <= 2, "Edges provide at most second derivatives");
        let ders = self.geometry.edge_derivatives(self.edge, t)?;
        Ok(ders[..=n].to_vec())
    }
}
