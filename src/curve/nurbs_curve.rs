use argmin::core::{ArgminFloat, Executor, State};
use gauss_quad::GaussLegendre;
use nalgebra::allocator::Allocator;
use nalgebra::{
    Const, DefaultAllocator, DimName, DimNameDiff, DimNameSub, OPoint, OVector, RealField, U1,
};

use crate::closest_parameter::{
    ClosestParameterNewton, CurveClosestParameterProblem, CurveDerivatives,
};
use crate::misc::binomial::Binomial;
use crate::misc::trigonometry::segment_closest_point;
use crate::misc::FloatingPoint;
use crate::prelude::KnotVector;

/// NURBS curve representation
/// By generics, it can be used for 2D or 3D curves with f32 or f64 scalar types
#[derive(Clone, Debug)]
pub struct NurbsCurve<T: FloatingPoint, D: DimName>
where
    DefaultAllocator: Allocator<D>,
{
    /// control points with homogeneous coordinates
    /// the last element of the vector is the `weight`
    control_points: Vec<OPoint<T, D>>,
    degree: usize,
    /// the length of the knot vector is equal to the `# of control points + degree + 1`
    knots: KnotVector<T>,
}

/// 2D NURBS curve alias, used for curves in the parameter space of a surface
pub type NurbsCurve2D<T> = NurbsCurve<T, Const<3>>;

/// 3D NURBS curve alias
pub type NurbsCurve3D<T> = NurbsCurve<T, Const<4>>;

impl<T: FloatingPoint, D: DimName> NurbsCurve<T, D>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    /// Create a new NURBS curve
    /// # Failures
    /// - if the number of control points is not greater than the degree
    /// - the number of knots is not equal to the number of control points + the degree + 1
    ///
    /// # Example
    /// ```
    /// use wingshell::prelude::*;
    /// use nalgebra::Point3;
    ///
    /// let control_points = vec![
    ///     Point3::new(0., 0., 1.),
    ///     Point3::new(1., 2., 1.),
    ///     Point3::new(3., 2., 1.),
    ///     Point3::new(4., 0., 1.),
    /// ];
    /// let curve = NurbsCurve2D::try_new(3, control_points, vec![0., 0., 0., 0., 1., 1., 1., 1.]);
    /// assert!(curve.is_ok());
    /// let curve = NurbsCurve2D::try_new(3, vec![Point3::new(0., 0., 1.)], vec![0., 1.]);
    /// assert!(curve.is_err());
    /// ```
    pub fn try_new(
        degree: usize,
        control_points: Vec<OPoint<T, D>>,
        knots: Vec<T>,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(
            control_points.len() > degree,
            "Too few control points for curve of degree {}",
            degree
        );
        anyhow::ensure!(
            knots.len() == control_points.len() + degree + 1,
            "Invalid number of knots, got {}, expected {}",
            knots.len(),
            control_points.len() + degree + 1
        );
        anyhow::ensure!(
            knots.iter().all(|k| k.is_finite()),
            "Knot vector contains non finite values"
        );

        let mut knots = knots;
        knots.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        Ok(Self {
            degree,
            control_points,
            knots: KnotVector::new(knots),
        })
    }

    /// Create a polyline (degree 1) curve passing through the given points
    /// The knots are placed by normalized chord length so that the domain is [0, 1]
    /// # Example
    /// ```
    /// use wingshell::prelude::*;
    /// use nalgebra::Point2;
    /// use approx::assert_relative_eq;
    ///
    /// let line = NurbsCurve2D::polyline(&[Point2::new(0.1, 0.), Point2::new(0.4, 0.)]).unwrap();
    /// assert_eq!(line.knots_domain(), (0., 1.));
    /// assert_relative_eq!(line.point_at(0.5), Point2::new(0.25, 0.));
    /// ```
    pub fn polyline(points: &[OPoint<T, DimNameDiff<D, U1>>]) -> anyhow::Result<Self> {
        anyhow::ensure!(points.len() >= 2, "A polyline needs at least two points");

        let mut lengths = vec![T::zero()];
        for w in points.windows(2) {
            let last = lengths[lengths.len() - 1];
            lengths.push(last + (&w[1] - &w[0]).norm());
        }
        let total = lengths[lengths.len() - 1];
        anyhow::ensure!(
            total > T::default_epsilon(),
            "A polyline must have a non zero length"
        );

        let mut knots = vec![T::zero()];
        knots.extend(lengths.iter().map(|l| *l / total));
        knots.push(T::one());

        Ok(Self {
            degree: 1,
            control_points: points.iter().map(|p| homogenize(p, T::one())).collect(),
            knots: KnotVector::new(knots),
        })
    }

    /// Return the dehomogenized control points
    pub fn dehomogenized_control_points(&self) -> Vec<OPoint<T, DimNameDiff<D, U1>>> {
        self.control_points
            .iter()
            .filter_map(|p| dehomogenize(p))
            .collect()
    }

    pub fn weights(&self) -> Vec<T> {
        self.control_points
            .iter()
            .map(|p| p[D::dim() - 1])
            .collect()
    }

    /// Evaluate the curve at a given parameter to get a dehomonogenized point
    pub fn point_at(&self, t: T) -> OPoint<T, DimNameDiff<D, U1>> {
        let p = self.point(t);
        dehomogenize(&p).unwrap_or_else(OPoint::origin)
    }

    /// Sample the curve at a given number of points between the start and end parameters
    pub fn sample_regular_range(
        &self,
        start: T,
        end: T,
        samples: usize,
    ) -> Vec<OPoint<T, DimNameDiff<D, U1>>> {
        self.sample_regular_range_with_parameter(start, end, samples)
            .into_iter()
            .map(|(_, p)| p)
            .collect()
    }

    #[allow(clippy::type_complexity)]
    /// Sample the curve at a given number of points between the start and end
    /// Return the vector of tuples of parameter and point
    pub fn sample_regular_range_with_parameter(
        &self,
        start: T,
        end: T,
        samples: usize,
    ) -> Vec<(T, OPoint<T, DimNameDiff<D, U1>>)> {
        let samples = samples.max(2);
        let step = (end - start) / T::from_usize(samples - 1).unwrap();
        (0..samples)
            .map(|i| {
                let t = if i == samples - 1 {
                    end
                } else {
                    start + T::from_usize(i).unwrap() * step
                };
                (t, self.point_at(t))
            })
            .collect()
    }

    /// Evaluate the curve at a given parameter to get a point in homogeneous coordinates
    pub(crate) fn point(&self, t: T) -> OPoint<T, D> {
        let n = self.control_points.len() - 1;
        let span = self.knots.find_knot_span_index(n, self.degree, t);
        let basis = self.knots.basis_functions(span, t, self.degree);
        let coords = self.control_points[(span - self.degree)..=span]
            .iter()
            .zip(basis)
            .fold(OVector::<T, D>::zeros(), |acc, (cp, b)| acc + &cp.coords * b);
        OPoint::from(coords)
    }

    /// Evaluate the curve at a given parameter to get a tangent vector
    pub fn tangent_at(&self, u: T) -> OVector<T, DimNameDiff<D, U1>> {
        let deriv = self.rational_derivatives(u, 1);
        deriv[1].clone()
    }

    /// Evaluate the rational derivatives at a given parameter
    /// The first element is the position, the k-th element is the k-th derivative
    pub fn rational_derivatives(&self, u: T, derivs: usize) -> Vec<OVector<T, DimNameDiff<D, U1>>> {
        let homogeneous = self.derivatives(u, derivs);
        let w = D::dim() - 1;
        let mut binomial = Binomial::<T>::new();

        let mut rational: Vec<OVector<T, DimNameDiff<D, U1>>> = Vec::with_capacity(derivs + 1);
        for (k, h) in homogeneous.iter().enumerate() {
            let mut v = OVector::<T, DimNameDiff<D, U1>>::from_iterator(h.iter().take(w).cloned());
            for i in 1..=k {
                v -= &rational[k - i] * (binomial.get(k, i) * homogeneous[i][w]);
            }
            rational.push(v / homogeneous[0][w]);
        }
        rational
    }

    /// Evaluate the homogeneous derivatives at a given parameter
    /// Derivatives above the degree vanish
    fn derivatives(&self, u: T, derivs: usize) -> Vec<OVector<T, D>> {
        let n = self.control_points.len() - 1;
        let p = self.degree;
        let span = self.knots.find_knot_span_index(n, p, u);
        let nders = self
            .knots
            .derivative_basis_functions(span, u, p, derivs.min(p));
        let cps = &self.control_points[(span - p)..=span];

        (0..=derivs)
            .map(|k| match nders.get(k) {
                Some(row) => cps
                    .iter()
                    .zip(row.iter())
                    .fold(OVector::<T, D>::zeros(), |acc, (cp, b)| acc + &cp.coords * *b),
                None => OVector::<T, D>::zeros(),
            })
            .collect()
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn knots(&self) -> &KnotVector<T> {
        &self.knots
    }

    pub fn control_points(&self) -> &Vec<OPoint<T, D>> {
        &self.control_points
    }

    pub fn knots_domain(&self) -> (T, T) {
        self.knots.domain(self.degree)
    }

    /// Check if the curve is clamped
    pub fn is_clamped(&self) -> bool {
        self.knots.is_clamped(self.degree)
    }

    /// Compute the length of the curve by gauss-legendre quadrature over each knot span
    /// # Example
    /// ```
    /// use wingshell::prelude::*;
    /// use nalgebra::Point3;
    /// use approx::assert_relative_eq;
    ///
    /// let line = NurbsCurve3D::polyline(&[
    ///     Point3::new(0., 0., 0.),
    ///     Point3::new(3., 4., 0.),
    ///     Point3::new(3., 4., 2.),
    /// ]).unwrap();
    /// assert_relative_eq!(line.try_length().unwrap(), 7.0, epsilon = 1e-10);
    /// ```
    pub fn try_length(&self) -> anyhow::Result<T> {
        let (start, end) = self.knots_domain();
        anyhow::ensure!(end > start, "The curve has an empty knot domain");

        let gauss = GaussLegendre::new(16 + self.degree)
            .map_err(|e| anyhow::anyhow!("Invalid Gauss-Legendre rule: {:?}", e))?;
        let spans = self
            .knots
            .multiplicity()
            .into_iter()
            .map(|(k, _)| k)
            .filter(|k| *k >= start && *k <= end)
            .collect::<Vec<_>>();

        let length = spans
            .windows(2)
            .map(|w| {
                let a = w[0].to_f64().unwrap_or(0.);
                let b = w[1].to_f64().unwrap_or(0.);
                gauss.integrate(a, b, |x| {
                    let t = T::from_f64(x).unwrap();
                    self.rational_derivatives(t, 1)[1]
                        .norm()
                        .to_f64()
                        .unwrap_or(0.)
                })
            })
            .sum::<f64>();
        Ok(T::from_f64(length).unwrap())
    }

    /// Try to refine the curve by inserting knots (Piegl & Tiller A5.4)
    /// The shape of the curve is preserved
    pub fn try_refine_knot(&mut self, knots_to_insert: Vec<T>) -> anyhow::Result<()> {
        anyhow::ensure!(self.is_clamped(), "Curve must be clamped to refine knots");

        if knots_to_insert.is_empty() {
            return Ok(());
        }

        let mut x = knots_to_insert;
        x.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let (start, end) = self.knots_domain();
        anyhow::ensure!(
            x.iter().all(|k| *k >= start && *k <= end),
            "Inserted knots must lie inside the knot domain"
        );

        let p = self.degree;
        let knots = self.knots.as_slice();
        let cps = &self.control_points;
        let n = cps.len() - 1;
        let r = x.len() - 1;
        let a = self.knots.find_knot_span_index(n, p, x[0]);
        let b = self.knots.find_knot_span_index(n, p, x[r]) + 1;

        // unaffected control points and knots keep their place at both ends
        let mut q = Vec::with_capacity(n + r + 2);
        q.extend_from_slice(&cps[..=(a - p)]);
        q.resize(b + r, OPoint::<T, D>::origin());
        q.extend_from_slice(&cps[(b - 1)..]);

        let mut refined = Vec::with_capacity(knots.len() + r + 1);
        refined.extend_from_slice(&knots[..=a]);
        refined.resize(b + p + r + 1, T::zero());
        refined.extend_from_slice(&knots[(b + p)..]);

        let mut i = b + p - 1;
        let mut k = b + p + r;
        for j in (0..=r).rev() {
            while x[j] <= knots[i] && i > a {
                q[k - p - 1] = cps[i - p - 1].clone();
                refined[k] = knots[i];
                k -= 1;
                i -= 1;
            }

            q[k - p - 1] = q[k - p].clone();
            for l in 1..=p {
                let ind = k - p + l;
                let numer = refined[k + l] - x[j];
                if numer.abs() < T::default_epsilon() {
                    q[ind - 1] = q[ind].clone();
                    continue;
                }
                let denom = refined[k + l] - knots[i - p + l];
                let alpha = if denom.abs() > T::zero() {
                    numer / denom
                } else {
                    T::zero()
                };
                q[ind - 1] = q[ind - 1].lerp(&q[ind], T::one() - alpha);
            }

            refined[k] = x[j];
            k -= 1;
        }

        self.knots = KnotVector::new(refined);
        self.control_points = q;

        Ok(())
    }

    /// Reparameterize the curve so that its knot domain becomes [0, 1]
    pub fn normalize_knots(&mut self) {
        self.knots = self.knots.normalized(self.degree);
    }

    /// Find the closest parameter on the curve to a given point with Newton's method
    /// # Example
    /// ```
    /// use wingshell::prelude::*;
    /// use nalgebra::Point3;
    /// use approx::assert_relative_eq;
    ///
    /// let line = NurbsCurve3D::polyline(&[Point3::new(0., 0., 0.), Point3::new(2., 0., 0.)]).unwrap();
    /// let t = line.find_closest_parameter(&Point3::new(0.5, 1.0, 0.)).unwrap();
    /// assert_relative_eq!(t, 0.25, epsilon = 1e-8);
    /// ```
    pub fn find_closest_parameter(&self, point: &OPoint<T, DimNameDiff<D, U1>>) -> anyhow::Result<T>
    where
        T: ArgminFloat,
    {
        let (min_u, max_u) = self.knots_domain();
        let samples = self.control_points.len() * self.degree.max(1) * 2;
        let pts = self.sample_regular_range_with_parameter(min_u, max_u, samples);

        let mut min = <T as RealField>::max_value().unwrap_or(T::one() / T::default_epsilon());
        let mut u = min_u;
        for w in pts.windows(2) {
            let (proj_u, proj_pt) = segment_closest_point(point, &w[0].1, &w[1].1, w[0].0, w[1].0);
            let d = (point - proj_pt).norm();
            if d < min {
                min = d;
                u = proj_u;
            }
        }

        if self.degree == 1 {
            return Ok(u);
        }

        let solver = ClosestParameterNewton::new((min_u, max_u));
        let res = Executor::new(CurveClosestParameterProblem::new(point, self), solver)
            .configure(|state| state.param(u).max_iters(8))
            .run()?;
        let best = res
            .state()
            .get_best_param()
            .cloned()
            .ok_or(anyhow::anyhow!("No best parameter found"))?;
        log::trace!("closest parameter on curve: seed {:?} -> {:?}", u, best);
        Ok(best)
    }
}

impl<T: FloatingPoint, D: DimName> CurveDerivatives<T, DimNameDiff<D, U1>> for NurbsCurve<T, D>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    fn derivatives_at(&self, t: T, n: usize) -> anyhow::Result<Vec<OVector<T, DimNameDiff<D, U1>>>> {
        Ok(self.rational_derivatives(t, n))
    }
}

/// Lift a point into homogeneous coordinates with the given weight
pub fn homogenize<T: FloatingPoint, D: DimName>(
    point: &OPoint<T, DimNameDiff<D, U1>>,
    weight: T,
) -> OPoint<T, D>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    let coords: Vec<T> = point
        .coords
        .iter()
        .map(|c| *c * weight)
        .chain(std::iter::once(weight))
        .collect();
    OPoint::from_slice(&coords)
}

/// Dehomogenize a point
pub fn dehomogenize<T: FloatingPoint, D: DimName>(
    point: &OPoint<T, D>,
) -> Option<OPoint<T, DimNameDiff<D, U1>>>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    let v = &point.coords;
    let idx = D::dim() - 1;
    let w = v[idx];
    if w != T::zero() {
        let coords =
            v.generic_view((0, 0), (<D as DimNameSub<U1>>::Output::name(), Const::<1>)) / w;
        Some(OPoint { coords })
    } else {
        None
    }
}
