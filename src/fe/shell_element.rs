use std::sync::Arc;

use nalgebra::{Matrix2, Point3, Vector2, Vector3};

use super::{Element, ElementKind, IsoFsdtStiffness, ShellStrain};

/// Variables per node: displacements u, v, w and rotations rx, ry, rz
pub const SHELL_VARS_PER_NODE: usize = 6;

/// 2 x 2 Gauss-Legendre abscissae on [-1, 1], all weights are 1
const GAUSS_POINTS: [f64; 2] = [-0.577_350_269_189_625_8, 0.577_350_269_189_625_8];

/// Four node bilinear shell element (MITC-style, transverse shear evaluated at the centroid)
/// Nodes are ordered as a tensor product: `(0,0) (1,0) (0,1) (1,1)`
#[derive(Debug, Clone)]
pub struct ShellElement {
    stiffness: Arc<IsoFsdtStiffness>,
}

/// Local tangent frame and planar geometry of an element at a parametric point
struct LocalFrame {
    e1: Vector3<f64>,
    e2: Vector3<f64>,
    normal: Vector3<f64>,
    /// Derivatives of the shape functions with respect to the local x and y
    dn: [Vector2<f64>; 4],
}

impl ShellElement {
    /// Create a shell element of the given order
    /// Only order 2 (four nodes) is supported
    pub fn try_new(order: usize, stiffness: Arc<IsoFsdtStiffness>) -> anyhow::Result<Self> {
        anyhow::ensure!(
            order == 2,
            "Unsupported shell element order {}, only order 2 is available",
            order
        );
        Ok(Self { stiffness })
    }

    pub fn stiffness(&self) -> &Arc<IsoFsdtStiffness> {
        &self.stiffness
    }

    fn shape_functions(xi: f64, eta: f64) -> [f64; 4] {
        [
            0.25 * (1. - xi) * (1. - eta),
            0.25 * (1. + xi) * (1. - eta),
            0.25 * (1. - xi) * (1. + eta),
            0.25 * (1. + xi) * (1. + eta),
        ]
    }

    /// Derivatives of the shape functions with respect to xi and eta
    fn shape_derivatives(xi: f64, eta: f64) -> ([f64; 4], [f64; 4]) {
        (
            [
                -0.25 * (1. - eta),
                0.25 * (1. - eta),
                -0.25 * (1. + eta),
                0.25 * (1. + eta),
            ],
            [
                -0.25 * (1. - xi),
                -0.25 * (1. + xi),
                0.25 * (1. - xi),
                0.25 * (1. + xi),
            ],
        )
    }

    fn check_nodes(&self, xpts: &[Point3<f64>]) -> anyhow::Result<()> {
        anyhow::ensure!(
            xpts.len() == 4,
            "Shell element expects 4 nodes, got {}",
            xpts.len()
        );
        Ok(())
    }

    /// Tangent vectors of the isoparametric map
    fn tangents(xpts: &[Point3<f64>], xi: f64, eta: f64) -> (Vector3<f64>, Vector3<f64>) {
        let (dxi, deta) = Self::shape_derivatives(xi, eta);
        let mut x_xi = Vector3::zeros();
        let mut x_eta = Vector3::zeros();
        for (i, p) in xpts.iter().enumerate() {
            x_xi += p.coords * dxi[i];
            x_eta += p.coords * deta[i];
        }
        (x_xi, x_eta)
    }

    fn local_frame(xpts: &[Point3<f64>], xi: f64, eta: f64) -> anyhow::Result<LocalFrame> {
        let (x_xi, x_eta) = Self::tangents(xpts, xi, eta);
        let normal = x_xi.cross(&x_eta);
        let area = normal.norm();
        anyhow::ensure!(area > f64::EPSILON, "Degenerate shell element");

        let normal = normal / area;
        let e1 = x_xi.normalize();
        let e2 = normal.cross(&e1);

        // planar jacobian in the local frame
        let jacobian = Matrix2::new(x_xi.dot(&e1), x_xi.dot(&e2), x_eta.dot(&e1), x_eta.dot(&e2));
        let inverse = jacobian
            .try_inverse()
            .ok_or(anyhow::anyhow!("Singular shell element jacobian"))?;

        let (dxi, deta) = Self::shape_derivatives(xi, eta);
        let dn = [0, 1, 2, 3].map(|i| inverse * Vector2::new(dxi[i], deta[i]));

        Ok(LocalFrame {
            e1,
            e2,
            normal,
            dn,
        })
    }
}

impl Element for ShellElement {
    fn kind(&self) -> ElementKind {
        ElementKind::Shell
    }

    fn num_nodes(&self) -> usize {
        4
    }

    fn vars_per_node(&self) -> usize {
        SHELL_VARS_PER_NODE
    }

    fn thickness(&self) -> f64 {
        self.stiffness.thickness()
    }

    fn area(&self, xpts: &[Point3<f64>]) -> anyhow::Result<f64> {
        Ok(self.quadrature_normals(xpts)?.iter().map(|n| n.norm()).sum())
    }

    fn mass(&self, xpts: &[Point3<f64>]) -> anyhow::Result<f64> {
        Ok(self.stiffness.mass_moments()[0] * self.area(xpts)?)
    }

    fn centroid_strain(&self, xpts: &[Point3<f64>], vars: &[f64]) -> anyhow::Result<ShellStrain> {
        self.check_nodes(xpts)?;
        anyhow::ensure!(
            vars.len() == 4 * SHELL_VARS_PER_NODE,
            "Shell element expects {} variables, got {}",
            4 * SHELL_VARS_PER_NODE,
            vars.len()
        );

        let frame = Self::local_frame(xpts, 0., 0.)?;
        let n = Self::shape_functions(0., 0.);

        let mut strain = ShellStrain::zeros();
        let mut beta = Vector2::zeros();
        let mut w_grad = Vector2::zeros();
        for (i, dn) in frame.dn.iter().enumerate() {
            let d = Vector3::new(
                vars[6 * i],
                vars[6 * i + 1],
                vars[6 * i + 2],
            );
            let r = Vector3::new(
                vars[6 * i + 3],
                vars[6 * i + 4],
                vars[6 * i + 5],
            );
            let (u, v, w) = (d.dot(&frame.e1), d.dot(&frame.e2), d.dot(&frame.normal));
            // rotation of the normal: u(z) = z * ry, v(z) = -z * rx
            let (bx, by) = (r.dot(&frame.e2), -r.dot(&frame.e1));

            strain[0] += dn.x * u;
            strain[1] += dn.y * v;
            strain[2] += dn.y * u + dn.x * v;
            strain[3] += dn.x * bx;
            strain[4] += dn.y * by;
            strain[5] += dn.y * bx + dn.x * by;
            w_grad += dn * w;
            beta += Vector2::new(bx, by) * n[i];
        }
        strain[6] = w_grad.y + beta.y;
        strain[7] = w_grad.x + beta.x;

        Ok(strain)
    }

    fn failure(&self, xpts: &[Point3<f64>], vars: &[f64]) -> anyhow::Result<f64> {
        let strain = self.centroid_strain(xpts, vars)?;
        Ok(self.stiffness.failure(&strain))
    }

    fn quadrature_normals(&self, xpts: &[Point3<f64>]) -> anyhow::Result<Vec<Vector3<f64>>> {
        self.check_nodes(xpts)?;
        Ok(GAUSS_POINTS
            .iter()
            .flat_map(|eta| {
                GAUSS_POINTS.iter().map(move |xi| {
                    let (x_xi, x_eta) = Self::tangents(xpts, *xi, *eta);
                    x_xi.cross(&x_eta)
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    use super::*;
    use crate::fe::IsoShellProperties;

    fn element() -> ShellElement {
        let stiffness = IsoFsdtStiffness::try_new(IsoShellProperties::default()).unwrap();
        ShellElement::try_new(2, Arc::new(stiffness)).unwrap()
    }

    /// 2 x 1 rectangle in tensor product order
    fn rectangle() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0., 0., 0.),
            Point3::new(2., 0., 0.),
            Point3::new(0., 1., 0.),
            Point3::new(2., 1., 0.),
        ]
    }

    fn vars_from(f: impl Fn(&Point3<f64>) -> [f64; 6]) -> Vec<f64> {
        rectangle().iter().flat_map(f).collect()
    }

    #[test]
    fn only_order_two_is_supported() {
        let stiffness = Arc::new(IsoFsdtStiffness::try_new(IsoShellProperties::default()).unwrap());
        assert!(ShellElement::try_new(3, stiffness.clone()).is_err());
        assert!(ShellElement::try_new(2, stiffness).is_ok());
    }

    #[test]
    fn area_and_mass() {
        let e = element();
        assert_relative_eq!(e.area(&rectangle()).unwrap(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(e.mass(&rectangle()).unwrap(), 2.0 * 2500. * 0.02, epsilon = 1e-9);
        assert!(e.area(&rectangle()[..3]).is_err());
    }

    #[test]
    fn rigid_translation_is_strain_free() {
        let e = element();
        let vars = vars_from(|_| [0.1, -0.2, 0.3, 0., 0., 0.]);
        let strain = e.centroid_strain(&rectangle(), &vars).unwrap();
        assert_relative_eq!(strain.norm(), 0., epsilon = 1e-12);
    }

    #[test]
    fn uniform_stretch() {
        let e = element();
        let vars = vars_from(|p| [1e-3 * p.x, 0., 0., 0., 0., 0.]);
        let strain = e.centroid_strain(&rectangle(), &vars).unwrap();
        assert_relative_eq!(strain[0], 1e-3, epsilon = 1e-12);
        assert_relative_eq!(strain[1], 0., epsilon = 1e-12);
        assert_relative_eq!(strain[2], 0., epsilon = 1e-12);
    }

    #[test]
    fn pure_shear_and_bending() {
        let e = element();
        let vars = vars_from(|p| [0., 0., 0., 0., 2e-3 * p.x, 0.]);
        let strain = e.centroid_strain(&rectangle(), &vars).unwrap();
        // the normal rotation about y grows linearly in x
        assert_relative_eq!(strain[3], 2e-3, epsilon = 1e-12);
        assert_relative_eq!(strain[7], 2e-3 * 1.0, epsilon = 1e-12);
        assert_relative_eq!(strain[6], 0., epsilon = 1e-12);

        let vars = vars_from(|p| [0., 0., 1e-3 * p.y, 0., 0., 0.]);
        let strain = e.centroid_strain(&rectangle(), &vars).unwrap();
        assert_relative_eq!(strain[6], 1e-3, epsilon = 1e-12);
        assert_relative_eq!(strain[7], 0., epsilon = 1e-12);
    }

    #[test]
    fn quadrature_normals_flip_for_inverted_element() {
        let e = element();
        let normals = e.quadrature_normals(&rectangle()).unwrap();
        assert_eq!(normals.len(), 4);
        assert!(normals.iter().all(|n| n.dot(&Vector3::z()) > 0.));

        // bow tie: counter-clockwise node order instead of tensor product order
        let mut bow_tie = rectangle();
        bow_tie.swap(2, 3);
        let normals = e.quadrature_normals(&bow_tie).unwrap();
        assert!(normals.iter().any(|n| n.dot(&normals[0]) <= 0.));
    }
}
