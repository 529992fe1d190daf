use nalgebra::{Point2, Point3};

use crate::{curve::NurbsCurve2D, misc::signed_area, surface::NurbsSurface3D};

use super::{
    Edge, EdgeCurve, EdgeId, EdgeLoop, Face, FaceId, Geometry, Orientation, Vertex, VertexId,
};

/// Number of samples per edge used to check the orientation of a loop
const LOOP_SAMPLES_PER_EDGE: usize = 8;

/// Incremental construction of a `Geometry`
/// Entities are referenced by the ids returned from the `add_*` methods,
/// and the whole topology is validated by `build`.
///
/// # Example
/// ```
/// use wingshell::prelude::*;
/// use nalgebra::Point4;
///
/// let plane = NurbsSurface3D::try_new(
///     1,
///     1,
///     vec![0., 0., 1., 1.],
///     vec![0., 0., 1., 1.],
///     vec![
///         vec![Point4::new(0., 0., 0., 1.), Point4::new(0., 1., 0., 1.)],
///         vec![Point4::new(1., 0., 0., 1.), Point4::new(1., 1., 0., 1.)],
///     ],
/// ).unwrap();
///
/// let mut builder = GeometryBuilder::new();
/// let face = builder.add_surface(plane);
/// builder.add_natural_boundary(face).unwrap();
/// let geometry = builder.build().unwrap();
/// assert_eq!(geometry.edges().len(), 4);
/// assert_eq!(geometry.vertices().len(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct GeometryBuilder {
    geometry: Geometry,
    tolerance: f64,
}

impl Default for GeometryBuilder {
    fn default() -> Self {
        Self {
            geometry: Geometry::default(),
            tolerance: 1e-6,
        }
    }
}

impl GeometryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Distance below which a vertex is considered to lie on an edge end
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Read access to the entities added so far
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn add_surface(&mut self, surface: NurbsSurface3D<f64>) -> FaceId {
        self.geometry.faces.push(Face {
            surface,
            loops: vec![],
        });
        FaceId(self.geometry.faces.len() - 1)
    }

    pub fn add_edge(&mut self, curve: EdgeCurve) -> EdgeId {
        self.geometry.edges.push(Edge {
            curve,
            vertices: None,
        });
        EdgeId(self.geometry.edges.len() - 1)
    }

    pub fn add_vertex(&mut self, vertex: Vertex) -> VertexId {
        self.geometry.vertices.push(vertex);
        VertexId(self.geometry.vertices.len() - 1)
    }

    /// Add a vertex on the edge at the parameter closest to the given point
    pub fn add_vertex_on_edge_near(
        &mut self,
        edge: EdgeId,
        point: &Point3<f64>,
    ) -> anyhow::Result<VertexId> {
        let t = self.geometry.edge_closest_parameter(edge, point)?;
        Ok(self.add_vertex(Vertex::OnEdge { edge, t }))
    }

    /// Assign the start and end vertices of an edge
    /// Both vertices must coincide with the edge ends within the tolerance
    pub fn set_edge_vertices(
        &mut self,
        edge: EdgeId,
        start: VertexId,
        end: VertexId,
    ) -> anyhow::Result<()> {
        let (t0, t1) = self.geometry.edge_range(edge)?;
        let ends = [
            (start, self.geometry.edge_point_at(edge, t0)?, "start"),
            (end, self.geometry.edge_point_at(edge, t1)?, "end"),
        ];
        for (vertex, expected, which) in ends {
            let p = self.geometry.vertex_point(vertex)?;
            let distance = (p - expected).norm();
            anyhow::ensure!(
                distance <= self.tolerance,
                "Vertex {} is {} away from the {} of edge {}",
                vertex.0,
                distance,
                which,
                edge.0
            );
        }
        self.geometry.edges[edge.0].vertices = Some((start, end));
        Ok(())
    }

    /// Append a loop of oriented edges to a face
    pub fn add_loop(
        &mut self,
        face: FaceId,
        segments: Vec<(EdgeId, Orientation)>,
    ) -> anyhow::Result<()> {
        self.geometry.face(face)?;
        self.geometry.faces[face.0]
            .loops
            .push(EdgeLoop::new(segments));
        Ok(())
    }

    /// Bound a face by the four borders of its parameter domain
    /// The loop runs counter-clockwise in parameter space starting at (u0, v0)
    pub fn add_natural_boundary(&mut self, face: FaceId) -> anyhow::Result<()> {
        let surface = &self.geometry.face(face)?.surface;
        let (u0, u1) = surface.u_knots_domain();
        let (v0, v1) = surface.v_knots_domain();
        let corners = [
            Point2::new(u0, v0),
            Point2::new(u1, v0),
            Point2::new(u1, v1),
            Point2::new(u0, v1),
        ];

        let vertices = corners
            .iter()
            .map(|c| {
                self.add_vertex(Vertex::OnFace {
                    face,
                    u: c.x,
                    v: c.y,
                })
            })
            .collect::<Vec<_>>();

        let mut segments = vec![];
        for i in 0..4 {
            let j = (i + 1) % 4;
            let pcurve = NurbsCurve2D::polyline(&[corners[i], corners[j]])?;
            let edge = self.add_edge(EdgeCurve::OnFace { face, pcurve });
            self.set_edge_vertices(edge, vertices[i], vertices[j])?;
            segments.push((edge, Orientation::Forward));
        }

        self.add_loop(face, segments)
    }

    /// Validate the topology and return the geometry
    pub fn build(self) -> anyhow::Result<Geometry> {
        let geometry = self.geometry;

        for (i, vertex) in geometry.vertices.iter().enumerate() {
            match vertex {
                Vertex::OnEdge { edge, .. } => {
                    anyhow::ensure!(
                        edge.0 < geometry.edges.len(),
                        "Vertex {} refers to missing edge {}",
                        i,
                        edge.0
                    );
                }
                Vertex::OnFace { face, .. } => {
                    anyhow::ensure!(
                        face.0 < geometry.faces.len(),
                        "Vertex {} refers to missing face {}",
                        i,
                        face.0
                    );
                }
                Vertex::Point(_) => {}
            }
        }

        for (i, edge) in geometry.edges.iter().enumerate() {
            if let EdgeCurve::OnFace { face, .. } = &edge.curve {
                anyhow::ensure!(
                    face.0 < geometry.faces.len(),
                    "Edge {} refers to missing face {}",
                    i,
                    face.0
                );
            }
            if let Some((a, b)) = edge.vertices {
                anyhow::ensure!(
                    a.0 < geometry.vertices.len() && b.0 < geometry.vertices.len(),
                    "Edge {} refers to a missing vertex",
                    i
                );
            }
        }

        for (f, face) in geometry.faces.iter().enumerate() {
            for (l, edge_loop) in face.loops.iter().enumerate() {
                validate_loop(&geometry, FaceId(f), l, edge_loop)?;
            }
        }

        log::info!(
            "geometry: {} faces, {} edges, {} vertices",
            geometry.faces.len(),
            geometry.edges.len(),
            geometry.vertices.len()
        );

        Ok(geometry)
    }
}

/// Check that a loop is closed and oriented
/// The outer loop (index 0) must run counter-clockwise in parameter space, holes clockwise
fn validate_loop(
    geometry: &Geometry,
    face: FaceId,
    index: usize,
    edge_loop: &EdgeLoop,
) -> anyhow::Result<()> {
    anyhow::ensure!(
        !edge_loop.is_empty(),
        "Loop {} of face {} is empty",
        index,
        face.0
    );

    let mut ends = vec![];
    for (edge, orientation) in edge_loop.segments() {
        let e = geometry.edge(*edge)?;
        let vertices = e.oriented_vertices(*orientation).ok_or(anyhow::anyhow!(
            "Edge {} in loop {} of face {} has no vertices",
            edge.0,
            index,
            face.0
        ))?;
        ends.push(vertices);
    }

    for i in 0..ends.len() {
        let next = (i + 1) % ends.len();
        anyhow::ensure!(
            ends[i].1 == ends[next].0,
            "Loop {} of face {} is not closed between edge {} and edge {}",
            index,
            face.0,
            edge_loop.segments()[i].0 .0,
            edge_loop.segments()[next].0 .0
        );
    }

    let mut polygon = vec![];
    for (edge, orientation) in edge_loop.segments() {
        let (t0, t1) = geometry.edge_range(*edge)?;
        for k in 0..LOOP_SAMPLES_PER_EDGE {
            let s = k as f64 / LOOP_SAMPLES_PER_EDGE as f64;
            let t = match orientation {
                Orientation::Forward => t0 + (t1 - t0) * s,
                Orientation::Reversed => t1 - (t1 - t0) * s,
            };
            polygon.push(geometry.edge_params_on_face(*edge, face, t)?);
        }
    }

    let area = signed_area(&polygon);
    if index == 0 {
        anyhow::ensure!(
            area > 0.,
            "Outer loop of face {} must run counter-clockwise in parameter space",
            face.0
        );
    } else {
        anyhow::ensure!(
            area < 0.,
            "Hole loop {} of face {} must run clockwise in parameter space",
            index,
            face.0
        );
    }

    Ok(())
}
