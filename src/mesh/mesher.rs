use std::collections::BTreeMap;

use gauss_quad::GaussLegendre;
use nalgebra::Point2;

use crate::topology::{EdgeId, FaceId, Geometry, Orientation};

use super::{MeshOptions, QuadMesh};

/// Number of Gauss-Legendre points per arc length interval
const ARC_LENGTH_QUADRATURE: usize = 8;

/// Upper bound on the number of segments of a single edge
pub const MAX_EDGE_DIVISIONS: usize = 100_000;

/// Cumulative arc length of an edge sampled at regular parameters
#[derive(Clone, Debug)]
struct ArcLengthTable {
    params: Vec<f64>,
    lengths: Vec<f64>,
}

impl ArcLengthTable {
    fn try_new(geometry: &Geometry, edge: EdgeId, intervals: usize) -> anyhow::Result<Self> {
        let (t0, t1) = geometry.edge_range(edge)?;
        // fail early on dangling references, the integrand below cannot report errors
        geometry.edge_derivative_at(edge, t0)?;

        let gauss = GaussLegendre::new(ARC_LENGTH_QUADRATURE)
            .map_err(|e| anyhow::anyhow!("Invalid Gauss-Legendre rule: {:?}", e))?;
        let params = (0..=intervals)
            .map(|i| t0 + (t1 - t0) * i as f64 / intervals as f64)
            .collect::<Vec<_>>();

        let mut lengths = vec![0.];
        for w in params.windows(2) {
            let l = gauss.integrate(w[0], w[1], |t| {
                geometry
                    .edge_derivative_at(edge, t)
                    .map(|d| d.norm())
                    .unwrap_or(0.)
            });
            let last = lengths[lengths.len() - 1];
            lengths.push(last + l);
        }

        Ok(Self { params, lengths })
    }

    fn length(&self) -> f64 {
        self.lengths[self.lengths.len() - 1]
    }

    /// Parameter at the given arc length, linearly interpolated inside the table
    fn parameter_at(&self, s: f64) -> f64 {
        let i = self.lengths.partition_point(|l| *l < s);
        if i == 0 {
            return self.params[0];
        }
        if i >= self.lengths.len() {
            return self.params[self.params.len() - 1];
        }
        let (l0, l1) = (self.lengths[i - 1], self.lengths[i]);
        let (t0, t1) = (self.params[i - 1], self.params[i]);
        if l1 - l0 <= f64::EPSILON {
            t0
        } else {
            t0 + (t1 - t0) * (s - l0) / (l1 - l0)
        }
    }
}

/// Nodes of a meshed edge from its start vertex to its end vertex
#[derive(Clone, Debug)]
struct EdgeDiscretization {
    nodes: Vec<usize>,
    params: Vec<f64>,
}

/// Mapped quadrilateral mesher
/// Every face must be bounded by a single loop of four edges.
/// Opposite edges of a face receive the same number of segments and the interior is filled by
/// transfinite interpolation in parameter space.
pub struct Mesher<'a> {
    geometry: &'a Geometry,
}

impl<'a> Mesher<'a> {
    pub fn new(geometry: &'a Geometry) -> Self {
        Self { geometry }
    }

    pub fn mesh(&self, options: &MeshOptions) -> anyhow::Result<QuadMesh> {
        anyhow::ensure!(
            options.element_size.is_finite() && options.element_size > 0.,
            "Element size must be positive, got {}",
            options.element_size
        );
        anyhow::ensure!(
            options.arc_length_intervals > 0,
            "Arc length table needs at least one interval"
        );

        let face_edges = self.face_edges()?;

        let mut mesh = QuadMesh::default();
        for id in self.geometry.vertex_ids() {
            mesh.points.push(self.geometry.vertex_point(id)?);
        }

        // initial segment counts from the arc length of every bounding edge
        let mut tables = BTreeMap::new();
        let mut counts = BTreeMap::new();
        for (_, edges) in face_edges.iter() {
            for (edge, _) in edges {
                if tables.contains_key(edge) {
                    continue;
                }
                let table =
                    ArcLengthTable::try_new(self.geometry, *edge, options.arc_length_intervals)?;
                let divisions = (table.length() / options.element_size)
                    .ceil()
                    .max(options.min_edge_divisions as f64)
                    .max(1.);
                anyhow::ensure!(
                    divisions <= MAX_EDGE_DIVISIONS as f64,
                    "Edge {} of length {} needs {} segments at element size {}, the limit is {}",
                    edge.0,
                    table.length(),
                    divisions,
                    options.element_size,
                    MAX_EDGE_DIVISIONS
                );
                let n = divisions as usize;
                counts.insert(*edge, n);
                tables.insert(*edge, table);
            }
        }

        harmonize_counts(&face_edges, &mut counts);

        let mut discretizations = BTreeMap::new();
        for (edge, table) in tables.iter() {
            let n = counts[edge];
            let discretization = self.discretize_edge(&mut mesh, *edge, table, n)?;
            log::debug!(
                "edge {}: length {:.4}, {} segments",
                edge.0,
                table.length(),
                n
            );
            discretizations.insert(*edge, discretization);
        }

        for (face, edges) in face_edges.iter() {
            self.mesh_face(&mut mesh, *face, edges, &discretizations)?;
        }

        log::info!(
            "mesh: {} points, {} quads",
            mesh.num_points(),
            mesh.num_quads()
        );

        Ok(mesh)
    }

    /// Collect the four oriented edges of every face
    fn face_edges(&self) -> anyhow::Result<Vec<(FaceId, [(EdgeId, Orientation); 4])>> {
        self.geometry
            .face_ids()
            .map(|id| {
                let face = self.geometry.face(id)?;
                anyhow::ensure!(!face.loops().is_empty(), "Face {} has no loops", id.0);
                anyhow::ensure!(
                    face.loops().len() == 1,
                    "Face {} has {} loops, mapped meshing supports a single loop",
                    id.0,
                    face.loops().len()
                );
                let segments = face.loops()[0].segments();
                let edges: [(EdgeId, Orientation); 4] = segments.try_into().map_err(|_| {
                    anyhow::anyhow!(
                        "Face {} is bounded by {} edges, mapped meshing requires 4",
                        id.0,
                        segments.len()
                    )
                })?;
                Ok((id, edges))
            })
            .collect()
    }

    /// Place `n - 1` interior nodes of an edge at equal arc length spacing
    fn discretize_edge(
        &self,
        mesh: &mut QuadMesh,
        edge: EdgeId,
        table: &ArcLengthTable,
        n: usize,
    ) -> anyhow::Result<EdgeDiscretization> {
        let (start, end) = self
            .geometry
            .edge(edge)?
            .vertices()
            .ok_or(anyhow::anyhow!("Edge {} has no vertices", edge.0))?;
        let (t0, t1) = self.geometry.edge_range(edge)?;
        let length = table.length();

        let mut nodes = vec![start.0];
        let mut params = vec![t0];
        for k in 1..n {
            let t = table.parameter_at(length * k as f64 / n as f64);
            mesh.points.push(self.geometry.edge_point_at(edge, t)?);
            nodes.push(mesh.points.len() - 1);
            params.push(t);
        }
        nodes.push(end.0);
        params.push(t1);

        Ok(EdgeDiscretization { nodes, params })
    }

    /// Fill a face by discrete transfinite interpolation of its boundary nodes
    fn mesh_face(
        &self,
        mesh: &mut QuadMesh,
        face: FaceId,
        edges: &[(EdgeId, Orientation); 4],
        discretizations: &BTreeMap<EdgeId, EdgeDiscretization>,
    ) -> anyhow::Result<()> {
        // boundary nodes and parameters of every side in loop direction
        let mut sides = vec![];
        for (edge, orientation) in edges.iter() {
            let d = &discretizations[edge];
            let mut side = d
                .nodes
                .iter()
                .zip(d.params.iter())
                .map(|(node, t)| {
                    self.geometry
                        .edge_params_on_face(*edge, face, *t)
                        .map(|uv| (*node, uv))
                })
                .collect::<anyhow::Result<Vec<(usize, Point2<f64>)>>>()?;
            if !orientation.is_forward() {
                side.reverse();
            }
            sides.push(side);
        }

        let nu = sides[0].len() - 1;
        let nv = sides[1].len() - 1;
        anyhow::ensure!(
            sides[2].len() == nu + 1 && sides[3].len() == nv + 1,
            "Opposite edges of face {} have different segment counts",
            face.0
        );

        // sides 2 and 3 run backwards in (i, j)
        let bottom = |i: usize| sides[0][i];
        let right = |j: usize| sides[1][j];
        let top = |i: usize| sides[2][nu - i];
        let left = |j: usize| sides[3][nv - j];

        let corners = [bottom(0).1, bottom(nu).1, top(nu).1, top(0).1];
        let surface = self.geometry.face(face)?.surface();

        let mut grid = vec![vec![0; nv + 1]; nu + 1];
        for i in 0..=nu {
            grid[i][0] = bottom(i).0;
            grid[i][nv] = top(i).0;
        }
        for j in 0..=nv {
            grid[0][j] = left(j).0;
            grid[nu][j] = right(j).0;
        }

        for i in 1..nu {
            let xi = i as f64 / nu as f64;
            for j in 1..nv {
                let eta = j as f64 / nv as f64;
                let uv = (1. - eta) * bottom(i).1.coords
                    + eta * top(i).1.coords
                    + (1. - xi) * left(j).1.coords
                    + xi * right(j).1.coords
                    - ((1. - xi) * (1. - eta) * corners[0].coords
                        + xi * (1. - eta) * corners[1].coords
                        + xi * eta * corners[2].coords
                        + (1. - xi) * eta * corners[3].coords);
                mesh.points.push(surface.point_at(uv.x, uv.y));
                grid[i][j] = mesh.points.len() - 1;
            }
        }

        for i in 0..nu {
            for j in 0..nv {
                mesh.quads.push([
                    grid[i][j],
                    grid[i + 1][j],
                    grid[i + 1][j + 1],
                    grid[i][j + 1],
                ]);
                mesh.faces.push(face);
            }
        }

        log::debug!("face {}: {} x {} quads", face.0, nu, nv);

        Ok(())
    }
}

/// Raise segment counts until opposite edges of every face match
/// Counts only increase, so the iteration reaches a fixed point
fn harmonize_counts(
    face_edges: &[(FaceId, [(EdgeId, Orientation); 4])],
    counts: &mut BTreeMap<EdgeId, usize>,
) {
    loop {
        let mut changed = false;
        for (_, edges) in face_edges {
            for (a, b) in [(edges[0].0, edges[2].0), (edges[1].0, edges[3].0)] {
                let n = counts[&a].max(counts[&b]);
                for e in [a, b] {
                    if counts[&e] != n {
                        counts.insert(e, n);
                        changed = true;
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::harmonize_counts;
    use crate::topology::{EdgeId, FaceId, Orientation};

    #[test]
    fn harmonize_propagates_through_shared_edges() {
        let f = Orientation::Forward;
        // two faces sharing edge 1, which is opposite edge 3 in face 0 and edge 5 in face 1
        let faces = vec![
            (FaceId(0), [(EdgeId(0), f), (EdgeId(1), f), (EdgeId(2), f), (EdgeId(3), f)]),
            (FaceId(1), [(EdgeId(4), f), (EdgeId(5), f), (EdgeId(6), f), (EdgeId(1), f)]),
        ];
        let mut counts: BTreeMap<EdgeId, usize> =
            [(0, 2), (1, 3), (2, 4), (3, 5), (4, 1), (5, 1), (6, 7)]
                .into_iter()
                .map(|(e, n)| (EdgeId(e), n))
                .collect();
        harmonize_counts(&faces, &mut counts);
        assert_eq!(counts[&EdgeId(0)], 4);
        assert_eq!(counts[&EdgeId(2)], 4);
        assert_eq!(counts[&EdgeId(1)], 5);
        assert_eq!(counts[&EdgeId(3)], 5);
        assert_eq!(counts[&EdgeId(5)], 5);
        assert_eq!(counts[&EdgeId(4)], 7);
        assert_eq!(counts[&EdgeId(6)], 7);
    }
}
