use nalgebra::{
    allocator::Allocator, DMatrix, DVector, DefaultAllocator, DimName, DimNameDiff, DimNameSub,
    OPoint, U1,
};

use crate::{
    curve::{homogenize, KnotStyle, NurbsCurve},
    knot::KnotVector,
    misc::FloatingPoint,
};

/// Builder for a NURBS curve passing through (or near) a set of points
/// # Example
/// ```
/// use wingshell::prelude::*;
/// use nalgebra::Point3;
/// use approx::assert_relative_eq;
///
/// let points: Vec<Point3<f64>> = (0..20)
///     .map(|i| {
///         let t = i as f64 / 19.;
///         Point3::new(t, (t * std::f64::consts::PI).sin(), 0.)
///     })
///     .collect();
///
/// // least squares fit with 8 control points, order 4 (cubic)
/// let curve: NurbsCurve3D<f64> = CurveInterpolation::new(points.clone())
///     .with_num_control_points(8)
///     .try_create_curve(4)
///     .unwrap();
/// assert_eq!(curve.degree(), 3);
/// assert_eq!(curve.control_points().len(), 8);
/// assert_eq!(curve.knots_domain(), (0., 1.));
/// assert_relative_eq!(curve.point_at(0.), points[0], epsilon = 1e-10);
/// assert_relative_eq!(curve.point_at(1.), points[19], epsilon = 1e-10);
/// ```
#[derive(Clone, Debug)]
pub struct CurveInterpolation<T: FloatingPoint, D: DimName>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    points: Vec<OPoint<T, DimNameDiff<D, U1>>>,
    num_control_points: Option<usize>,
    knot_style: KnotStyle,
}

impl<T: FloatingPoint, D: DimName> CurveInterpolation<T, D>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    pub fn new(points: Vec<OPoint<T, DimNameDiff<D, U1>>>) -> Self {
        Self {
            points,
            num_control_points: None,
            knot_style: KnotStyle::default(),
        }
    }

    /// Fix the number of control points of the resulting curve
    /// If it is less than the number of points, the curve approximates them in the least squares sense
    pub fn with_num_control_points(mut self, n: usize) -> Self {
        self.num_control_points = Some(n);
        self
    }

    pub fn with_knot_style(mut self, knot_style: KnotStyle) -> Self {
        self.knot_style = knot_style;
        self
    }

    pub fn points(&self) -> &[OPoint<T, DimNameDiff<D, U1>>] {
        &self.points
    }

    /// Try to create the curve with the given order (degree + 1)
    pub fn try_create_curve(&self, order: usize) -> anyhow::Result<NurbsCurve<T, D>> {
        let m = self.points.len();
        anyhow::ensure!(m >= 2, "At least two points are required, got {}", m);
        anyhow::ensure!(order >= 2, "Order must be at least 2, got {}", order);

        let n = self.num_control_points.unwrap_or(m);
        anyhow::ensure!(
            n <= m,
            "Number of control points {} exceeds the number of points {}",
            n,
            m
        );
        anyhow::ensure!(
            n >= order,
            "Number of control points {} is less than the order {}",
            n,
            order
        );

        let degree = order - 1;
        let params = self.knot_style.parameterize(&self.points);
        let knots = if n == m {
            KnotVector::averaged(&params, degree)
        } else {
            KnotVector::approximating(&params, degree, n)
        };

        let rows = self
            .points
            .iter()
            .map(|p| DVector::from_iterator(p.coords.len(), p.coords.iter().copied()))
            .collect::<Vec<_>>();
        let solved = try_fit_control_points(&rows, &params, &knots, degree)?;

        let control_points: Vec<OPoint<T, D>> = solved
            .iter()
            .map(|v| homogenize(&OPoint::from_slice(v.as_slice()), T::one()))
            .collect();
        NurbsCurve::try_new(degree, control_points, knots.to_vec())
    }
}

/// Solve the control points of a B-spline with the given knots passing through (or near) `points`
/// at `params`.
///
/// The number of control points is `knots.len() - degree - 1`.
/// When it equals the number of points the system is solved exactly,
/// otherwise the interior control points are the least squares solution of the normal equations
/// with the first and last points reproduced exactly.
pub fn try_fit_control_points<T: FloatingPoint>(
    points: &[DVector<T>],
    params: &[T],
    knots: &KnotVector<T>,
    degree: usize,
) -> anyhow::Result<Vec<DVector<T>>> {
    let m = points.len();
    anyhow::ensure!(
        m == params.len(),
        "Parameter count {} does not match point count {}",
        params.len(),
        m
    );
    anyhow::ensure!(
        knots.len() > degree + 1,
        "Knot vector is too short for degree {}",
        degree
    );
    let n = knots.len() - degree - 1;
    anyhow::ensure!(
        n >= degree + 1 && n <= m,
        "Cannot fit {} control points to {} points",
        n,
        m
    );

    let dim = points[0].len();
    anyhow::ensure!(
        points.iter().all(|p| p.len() == dim),
        "All points must have the same dimension"
    );

    let basis = basis_matrix(params, knots, degree, n);

    if n == m {
        let lu = basis.lu();
        let mut control_points = vec![DVector::<T>::zeros(dim); n];
        for d in 0..dim {
            let b = DVector::from_iterator(m, points.iter().map(|p| p[d]));
            let x = lu
                .solve(&b)
                .ok_or(anyhow::anyhow!("Interpolation system is singular"))?;
            for i in 0..n {
                control_points[i][d] = x[i];
            }
        }
        return Ok(control_points);
    }

    let first = &points[0];
    let last = &points[m - 1];
    let mut control_points = vec![DVector::<T>::zeros(dim); n];
    control_points[0] = first.clone();
    control_points[n - 1] = last.clone();

    if n == 2 {
        return Ok(control_points);
    }

    // interior points with the contribution of the fixed end control points removed
    let interior = basis.view((1, 1), (m - 2, n - 2)).into_owned();
    let normal = interior.transpose() * &interior;
    let cholesky = normal
        .cholesky()
        .ok_or(anyhow::anyhow!("Least squares normal equations are singular"))?;

    for d in 0..dim {
        let r = DVector::from_iterator(
            m - 2,
            (1..(m - 1)).map(|k| {
                points[k][d] - basis[(k, 0)] * first[d] - basis[(k, n - 1)] * last[d]
            }),
        );
        let x = cholesky.solve(&(interior.transpose() * r));
        for i in 0..(n - 2) {
            control_points[i + 1][d] = x[i];
        }
    }

    Ok(control_points)
}

/// Dense matrix of basis function values, one row per parameter
fn basis_matrix<T: FloatingPoint>(
    params: &[T],
    knots: &KnotVector<T>,
    degree: usize,
    num_control_points: usize,
) -> DMatrix<T> {
    let last = num_control_points - 1;
    let mut m_a = DMatrix::<T>::zeros(params.len(), num_control_points);
    for (i, u) in params.iter().enumerate() {
        let span = knots.find_knot_span_index(last, degree, *u);
        let basis = knots.basis_functions(span, *u, degree);
        for (j, b) in basis.into_iter().enumerate() {
            m_a[(i, span - degree + j)] = b;
        }
    }
    m_a
}
