use argmin::core::{ArgminFloat, Executor, State};
use nalgebra::{
    allocator::Allocator, Const, DefaultAllocator, DimName, DimNameDiff, DimNameSub, OPoint,
    OVector, Point3, Vector2, Vector3, U1,
};

use crate::{
    closest_parameter::{SurfaceClosestParameterNewton, SurfaceClosestParameterProblem},
    curve::{dehomogenize, NurbsCurve},
    knot::KnotVector,
    misc::{binomial::Binomial, FloatingPoint},
};

/// NURBS surface representation
/// by generics, it can be used for 2D or 3D surfaces with f32 or f64 scalar types
#[derive(Clone, Debug)]
pub struct NurbsSurface<T: FloatingPoint, D: DimName>
where
    DefaultAllocator: Allocator<D>,
{
    /// control points with homogeneous coordinates, indexed by [u][v]
    /// the last element of the vector is the `weight`
    control_points: Vec<Vec<OPoint<T, D>>>,
    u_degree: usize,
    v_degree: usize,
    u_knots: KnotVector<T>,
    v_knots: KnotVector<T>,
}

/// 2D NURBS surface alias
pub type NurbsSurface2D<T> = NurbsSurface<T, Const<3>>;
/// 3D NURBS surface alias
pub type NurbsSurface3D<T> = NurbsSurface<T, Const<4>>;

impl<T: FloatingPoint, D: DimName> NurbsSurface<T, D>
where
    DefaultAllocator: Allocator<D>,
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    /// Create a new NURBS surface
    /// # Failures
    /// - if the control point net is empty or not rectangular
    /// - if a knot vector does not match `# of control points + degree + 1` in its direction
    pub fn try_new(
        u_degree: usize,
        v_degree: usize,
        u_knots: Vec<T>,
        v_knots: Vec<T>,
        control_points: Vec<Vec<OPoint<T, D>>>,
    ) -> anyhow::Result<Self> {
        let nu = control_points.len();
        anyhow::ensure!(
            nu > u_degree,
            "Too few control points in u direction for degree {}",
            u_degree
        );
        let nv = control_points[0].len();
        anyhow::ensure!(
            nv > v_degree,
            "Too few control points in v direction for degree {}",
            v_degree
        );
        if let Some(i) = control_points.iter().position(|row| row.len() != nv) {
            anyhow::bail!(
                "Control point row {} has {} points, expected {}",
                i,
                control_points[i].len(),
                nv
            );
        }
        anyhow::ensure!(
            u_knots.len() == nu + u_degree + 1,
            "Invalid number of u knots, got {}, expected {}",
            u_knots.len(),
            nu + u_degree + 1
        );
        anyhow::ensure!(
            v_knots.len() == nv + v_degree + 1,
            "Invalid number of v knots, got {}, expected {}",
            v_knots.len(),
            nv + v_degree + 1
        );

        Ok(Self {
            u_degree,
            v_degree,
            u_knots: KnotVector::new(u_knots),
            v_knots: KnotVector::new(v_knots),
            control_points,
        })
    }

    pub fn u_degree(&self) -> usize {
        self.u_degree
    }

    pub fn v_degree(&self) -> usize {
        self.v_degree
    }

    pub fn u_knots(&self) -> &KnotVector<T> {
        &self.u_knots
    }

    pub fn v_knots(&self) -> &KnotVector<T> {
        &self.v_knots
    }

    pub fn control_points(&self) -> &Vec<Vec<OPoint<T, D>>> {
        &self.control_points
    }

    /// Get the u domain of the knot vector by degree
    pub fn u_knots_domain(&self) -> (T, T) {
        self.u_knots.domain(self.u_degree)
    }

    /// Get the v domain of the knot vector by degree
    pub fn v_knots_domain(&self) -> (T, T) {
        self.v_knots.domain(self.v_degree)
    }

    /// Evaluate the surface at the given u, v parameters to get a point
    pub fn point_at(&self, u: T, v: T) -> OPoint<T, DimNameDiff<D, U1>> {
        let p = self.point(u, v);
        dehomogenize(&p).unwrap_or_else(OPoint::origin)
    }

    /// Evaluate the surface at the given u, v parameters to get a point in homogeneous coordinates
    pub(crate) fn point(&self, u: T, v: T) -> OPoint<T, D> {
        let (span_u, span_v) = self.knot_spans(u, v);
        let basis_u = self.u_knots.basis_functions(span_u, u, self.u_degree);
        let basis_v = self.v_knots.basis_functions(span_v, v, self.v_degree);
        OPoint::from(self.contract(span_u, span_v, &basis_u, &basis_v))
    }

    fn knot_spans(&self, u: T, v: T) -> (usize, usize) {
        let n = self.control_points.len() - 1;
        let m = self.control_points[0].len() - 1;
        (
            self.u_knots.find_knot_span_index(n, self.u_degree, u),
            self.v_knots.find_knot_span_index(m, self.v_degree, v),
        )
    }

    /// Compute a regularly spaced grid of `(divs_u + 1) x (divs_v + 1)` points on the surface
    /// The basis functions are computed once per row and column
    pub fn regular_sample_points(
        &self,
        divs_u: usize,
        divs_v: usize,
    ) -> Vec<Vec<OPoint<T, DimNameDiff<D, U1>>>> {
        let (knot_spans_u, bases_u) = self
            .u_knots
            .regularly_spaced_basis_functions(self.u_degree, divs_u.max(1));
        let (knot_spans_v, bases_v) = self
            .v_knots
            .regularly_spaced_basis_functions(self.v_degree, divs_v.max(1));

        knot_spans_u
            .iter()
            .zip(bases_u.iter())
            .map(|(span_u, basis_u)| {
                knot_spans_v
                    .iter()
                    .zip(bases_v.iter())
                    .map(|(span_v, basis_v)| {
                        let pt = OPoint::from(self.contract(*span_u, *span_v, basis_u, basis_v));
                        dehomogenize(&pt).unwrap_or_else(OPoint::origin)
                    })
                    .collect()
            })
            .collect()
    }

    /// Weighted sum of the control points in the patch selected by the knot spans
    /// `weights_u` and `weights_v` are basis function values or their derivatives
    fn contract(
        &self,
        span_u: usize,
        span_v: usize,
        weights_u: &[T],
        weights_v: &[T],
    ) -> OVector<T, D> {
        let rows = &self.control_points[(span_u - self.u_degree)..=span_u];
        rows.iter()
            .zip(weights_u.iter())
            .fold(OVector::<T, D>::zeros(), |acc, (row, wu)| {
                let column = row[(span_v - self.v_degree)..=span_v]
                    .iter()
                    .zip(weights_v.iter())
                    .fold(OVector::<T, D>::zeros(), |acc, (cp, wv)| {
                        acc + &cp.coords * *wv
                    });
                acc + column * *wu
            })
    }

    /// Extract the isocurve at the given v parameter, running along the u direction
    pub fn try_isocurve_u(&self, v: T) -> anyhow::Result<NurbsCurve<T, D>> {
        let m = self.v_knots.len() - self.v_degree - 2;
        let span = self.v_knots.find_knot_span_index(m, self.v_degree, v);
        let basis = self.v_knots.basis_functions(span, v, self.v_degree);
        let control_points = self
            .control_points
            .iter()
            .map(|row| {
                let mut p = OPoint::<T, D>::origin();
                for (l, b) in basis.iter().enumerate() {
                    p.coords += &row[span - self.v_degree + l].coords * *b;
                }
                p
            })
            .collect();
        NurbsCurve::try_new(self.u_degree, control_points, self.u_knots.to_vec())
    }

    /// Evaluate the rational derivatives at the given u, v parameters
    /// `ders[k][l]` is the k-th derivative in u and l-th derivative in v
    pub fn rational_derivatives(
        &self,
        u: T,
        v: T,
        derivs: usize,
    ) -> Vec<Vec<OVector<T, DimNameDiff<D, U1>>>> {
        let ders = self.derivatives(u, v, derivs);
        rational_derivatives(&ders, derivs)
    }

    /// Evaluate the homogeneous derivatives at the given u, v parameters
    /// `ders[k][l]` is only filled for `k + l <= derivs`
    fn derivatives(&self, u: T, v: T, derivs: usize) -> Vec<Vec<OVector<T, D>>> {
        let (span_u, span_v) = self.knot_spans(u, v);
        let uders = self.u_knots.derivative_basis_functions(
            span_u,
            u,
            self.u_degree,
            derivs.min(self.u_degree),
        );
        let vders = self.v_knots.derivative_basis_functions(
            span_v,
            v,
            self.v_degree,
            derivs.min(self.v_degree),
        );

        (0..=derivs)
            .map(|k| {
                (0..=derivs)
                    .map(|l| match (uders.get(k), vders.get(l)) {
                        (Some(wu), Some(wv)) if k + l <= derivs => {
                            self.contract(span_u, span_v, wu, wv)
                        }
                        _ => OVector::<T, D>::zeros(),
                    })
                    .collect()
            })
            .collect()
    }
}

/// Compute the rational derivatives from the homogeneous derivatives (Piegl & Tiller A4.4)
fn rational_derivatives<T, D>(
    ders: &[Vec<OVector<T, D>>],
    derivs: usize,
) -> Vec<Vec<OVector<T, DimNameDiff<D, U1>>>>
where
    T: FloatingPoint,
    D: DimName,
    DefaultAllocator: Allocator<D>,
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    let dim = D::dim() - 1;
    let weight = |k: usize, l: usize| ders[k][l][dim];
    let numerator = |k: usize, l: usize| {
        OVector::<T, DimNameDiff<D, U1>>::from_iterator(ders[k][l].iter().take(dim).cloned())
    };

    let mut binomial = Binomial::<T>::new();
    let mut out: Vec<Vec<OVector<T, DimNameDiff<D, U1>>>> = Vec::with_capacity(derivs + 1);
    for k in 0..=derivs {
        let mut row: Vec<OVector<T, DimNameDiff<D, U1>>> = Vec::with_capacity(derivs - k + 1);
        for l in 0..=(derivs - k) {
            let mut v = numerator(k, l);
            for j in 1..=l {
                v -= &row[l - j] * (binomial.get(l, j) * weight(0, j));
            }
            for i in 1..=k {
                let bki = binomial.get(k, i);
                v -= &out[k - i][l] * (bki * weight(i, 0));
                for j in 1..=l {
                    v -= &out[k - i][l - j] * (bki * binomial.get(l, j) * weight(i, j));
                }
            }
            row.push(v / weight(0, 0));
        }
        out.push(row);
    }
    out
}

impl<T: FloatingPoint> NurbsSurface3D<T> {
    /// Evaluate the (unnormalized) normal at the given u, v parameters
    pub fn normal_at(&self, u: T, v: T) -> Vector3<T> {
        let deriv = self.rational_derivatives(u, v, 1);
        deriv[1][0].cross(&deriv[0][1])
    }

    /// Find the closest parameter on the surface to a given point
    /// The solver starts from the closest point of a regular sample grid
    /// # Example
    /// ```
    /// use wingshell::prelude::*;
    /// use nalgebra::{Point3, Point4};
    /// use approx::assert_relative_eq;
    ///
    /// let plane = NurbsSurface3D::try_new(
    ///     1,
    ///     1,
    ///     vec![0., 0., 1., 1.],
    ///     vec![0., 0., 1., 1.],
    ///     vec![
    ///         vec![Point4::new(0., 0., 0., 1.), Point4::new(0., 2., 0., 1.)],
    ///         vec![Point4::new(4., 0., 0., 1.), Point4::new(4., 2., 0., 1.)],
    ///     ],
    /// ).unwrap();
    /// let (u, v) = plane.find_closest_parameter(&Point3::new(1., 1.5, 3.)).unwrap();
    /// assert_relative_eq!(u, 0.25, epsilon = 1e-6);
    /// assert_relative_eq!(v, 0.75, epsilon = 1e-6);
    /// ```
    pub fn find_closest_parameter(&self, point: &Point3<T>) -> anyhow::Result<(T, T)>
    where
        T: ArgminFloat,
    {
        let u_domain = self.u_knots_domain();
        let v_domain = self.v_knots_domain();

        let divs_u = self.control_points.len() * self.u_degree.max(1) * 2;
        let divs_v = self.control_points[0].len() * self.v_degree.max(1) * 2;
        let samples = self.regular_sample_points(divs_u, divs_v);

        let step_u = (u_domain.1 - u_domain.0) / T::from_usize(divs_u).unwrap();
        let step_v = (v_domain.1 - v_domain.0) / T::from_usize(divs_v).unwrap();

        let mut min = (T::zero(), u_domain.0, v_domain.0);
        let mut first = true;
        for (i, row) in samples.iter().enumerate() {
            for (j, pt) in row.iter().enumerate() {
                let d = (pt - point).norm_squared();
                if first || d < min.0 {
                    first = false;
                    min = (
                        d,
                        u_domain.0 + step_u * T::from_usize(i).unwrap(),
                        v_domain.0 + step_v * T::from_usize(j).unwrap(),
                    );
                }
            }
        }

        let seed = Vector2::new(min.1, min.2);
        let solver = SurfaceClosestParameterNewton::new((u_domain, v_domain));
        let res = Executor::new(SurfaceClosestParameterProblem::new(point, self), solver)
            .configure(|state| state.param(seed).max_iters(32))
            .run()?;
        let best = res
            .state()
            .get_best_param()
            .cloned()
            .unwrap_or(seed);
        log::trace!(
            "closest parameter on surface: seed {:?} -> {:?}",
            seed,
            best
        );
        Ok((best.x, best.y))
    }
}
