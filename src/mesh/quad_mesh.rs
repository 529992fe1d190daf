use nalgebra::Point3;

use crate::topology::FaceId;

/// Quadrilateral surface mesh
/// Quads are ordered counter-clockwise in the parameter space of their face
#[derive(Clone, Debug, Default)]
pub struct QuadMesh {
    pub(crate) points: Vec<Point3<f64>>,
    pub(crate) quads: Vec<[usize; 4]>,
    pub(crate) faces: Vec<FaceId>,
}

impl QuadMesh {
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn quads(&self) -> &[[usize; 4]] {
        &self.quads
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn num_quads(&self) -> usize {
        self.quads.len()
    }

    /// Face that a quad was generated on
    pub fn face_of(&self, quad: usize) -> Option<FaceId> {
        self.faces.get(quad).copied()
    }

    /// Connectivity in tensor product order `(0,0) (1,0) (0,1) (1,1)`
    pub fn tensor_connectivity(&self) -> Vec<[usize; 4]> {
        let mut quads = self.quads.clone();
        swap_quad_ordering(&mut quads);
        quads
    }

    /// Compressed row connectivity `(ptr, conn)` in tensor product order
    /// The nodes of quad `i` are `conn[ptr[i]..ptr[i + 1]]`
    pub fn csr_connectivity(&self) -> (Vec<usize>, Vec<usize>) {
        let ptr = (0..=self.quads.len()).map(|i| 4 * i).collect();
        let conn = self
            .tensor_connectivity()
            .into_iter()
            .flatten()
            .collect();
        (ptr, conn)
    }

    /// Coordinates as `[x0, y0, z0, x1, y1, z1, ...]`
    pub fn flattened_points(&self) -> Vec<f64> {
        self.points
            .iter()
            .flat_map(|p| [p.x, p.y, p.z])
            .collect()
    }
}

/// Swap the third and fourth node of every quad
/// Converts between counter-clockwise and tensor product node order in both directions
/// # Example
/// ```
/// use wingshell::prelude::*;
/// let mut quads = [[0, 1, 2, 3], [1, 4, 5, 2]];
/// swap_quad_ordering(&mut quads);
/// assert_eq!(quads, [[0, 1, 3, 2], [1, 4, 2, 5]]);
/// ```
pub fn swap_quad_ordering(quads: &mut [[usize; 4]]) {
    quads.iter_mut().for_each(|q| q.swap(2, 3));
}
