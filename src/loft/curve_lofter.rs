use nalgebra::{
    allocator::Allocator, DVector, DefaultAllocator, DimName, DimNameDiff, DimNameSub, OPoint, U1,
};

use crate::{
    curve::NurbsCurve,
    interpolation::try_fit_control_points,
    knot::KnotVector,
    misc::{from_usize, transpose_control_points, FloatingPoint},
    surface::NurbsSurface,
};

/// Skinning of a sequence of section curves into a surface
/// The u direction of the surface runs along the sections and the v direction across them
/// # Example
/// ```
/// use wingshell::prelude::*;
/// use nalgebra::Point3;
/// use approx::assert_relative_eq;
///
/// let sections = (0..3)
///     .map(|i| {
///         let z = i as f64;
///         NurbsCurve3D::polyline(&[Point3::new(0., 0., z), Point3::new(1. + z, 0., z)]).unwrap()
///     })
///     .collect::<Vec<_>>();
/// let surface = CurveLofter::new(&sections).try_create_surface(4).unwrap();
/// assert_eq!(surface.u_degree(), 1);
/// assert_eq!(surface.v_degree(), 2);
/// assert_relative_eq!(surface.point_at(1., 1.), Point3::new(3., 0., 2.), epsilon = 1e-10);
/// ```
pub struct CurveLofter<'a, T: FloatingPoint, D: DimName>
where
    DefaultAllocator: Allocator<D>,
{
    curves: &'a [NurbsCurve<T, D>],
}

impl<'a, T: FloatingPoint, D: DimName> CurveLofter<'a, T, D>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    pub fn new(curves: &'a [NurbsCurve<T, D>]) -> Self {
        Self { curves }
    }

    /// Try to create the lofted surface with the given order (degree + 1) across the sections
    pub fn try_create_surface(&self, order_v: usize) -> anyhow::Result<NurbsSurface<T, D>> {
        anyhow::ensure!(
            self.curves.len() >= 2,
            "At least two curves are required to loft, got {}",
            self.curves.len()
        );
        anyhow::ensure!(order_v >= 2, "Order must be at least 2, got {}", order_v);

        let sections = try_unify_curve_knot_vectors(self.curves)?;
        let u_degree = sections[0].degree();
        let u_knots = sections[0].knots().clone();
        let columns = sections[0].control_points().len();

        let v_degree = (order_v - 1).min(sections.len() - 1);
        let v_params = skinning_parameters(&sections);
        let v_knots = KnotVector::averaged(&v_params, v_degree);

        let net = sections
            .iter()
            .map(|c| c.control_points().clone())
            .collect::<Vec<_>>();
        let control_points = transpose_control_points(&net)
            .iter()
            .map(|across| {
                let column = across
                    .iter()
                    .map(|p| DVector::from_iterator(D::dim(), p.coords.iter().copied()))
                    .collect::<Vec<_>>();
                let solved = try_fit_control_points(&column, &v_params, &v_knots, v_degree)?;
                Ok(solved
                    .iter()
                    .map(|v| OPoint::<T, D>::from_slice(v.as_slice()))
                    .collect::<Vec<_>>())
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        log::debug!(
            "lofted {} sections: {} x {} control points, degrees ({}, {})",
            sections.len(),
            columns,
            sections.len(),
            u_degree,
            v_degree
        );

        NurbsSurface::try_new(
            u_degree,
            v_degree,
            u_knots.to_vec(),
            v_knots.to_vec(),
            control_points,
        )
    }
}

/// Bring all curves to the same normalized knot vector by knot refinement
fn try_unify_curve_knot_vectors<T, D>(
    curves: &[NurbsCurve<T, D>],
) -> anyhow::Result<Vec<NurbsCurve<T, D>>>
where
    T: FloatingPoint,
    D: DimName,
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    let degree = curves[0].degree();
    if let Some(i) = curves.iter().position(|c| c.degree() != degree) {
        anyhow::bail!(
            "Curve {} has degree {}, expected {}",
            i,
            curves[i].degree(),
            degree
        );
    }

    let mut curves = curves.to_vec();
    curves.iter_mut().for_each(|c| c.normalize_knots());

    let tolerance = T::from_f64(1e-10).unwrap();
    let mut merged = curves[0].knots().clone();
    for c in curves.iter().skip(1) {
        let missing = merged.missing_from(c.knots(), tolerance);
        if !missing.is_empty() {
            let mut knots = merged.to_vec();
            knots.extend(missing);
            knots.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            merged = KnotVector::new(knots);
        }
    }

    for c in curves.iter_mut() {
        let missing = c.knots().missing_from(&merged, tolerance);
        c.try_refine_knot(missing)?;
    }

    Ok(curves)
}

/// Average the normalized chord length parameters of every control point column
fn skinning_parameters<T, D>(sections: &[NurbsCurve<T, D>]) -> Vec<T>
where
    T: FloatingPoint,
    D: DimName,
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    let k = sections.len();
    let points = sections
        .iter()
        .map(|c| c.dehomogenized_control_points())
        .collect::<Vec<_>>();
    let columns = points[0].len();

    let mut params = vec![T::zero(); k];
    let mut used = 0;
    for i in 0..columns {
        let chords = (1..k)
            .map(|j| (&points[j][i] - &points[j - 1][i]).norm())
            .collect::<Vec<_>>();
        let total = chords.iter().fold(T::zero(), |acc, c| acc + *c);
        if total <= T::default_epsilon() {
            continue;
        }
        let mut acc = T::zero();
        for j in 1..k {
            acc += chords[j - 1];
            params[j] += acc / total;
        }
        used += 1;
    }

    if used == 0 {
        return (0..k)
            .map(|j| from_usize::<T>(j) / from_usize::<T>(k - 1))
            .collect();
    }

    let inv = T::one() / from_usize::<T>(used);
    params.iter_mut().for_each(|p| *p *= inv);
    params[k - 1] = T::one();
    params
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    use crate::prelude::*;

    fn section(scale: f64, z: f64) -> NurbsCurve3D<f64> {
        let points = (0..12)
            .map(|i| {
                let t = i as f64 / 11. * std::f64::consts::PI;
                Point3::new(scale * t.cos(), scale * 0.2 * t.sin(), z)
            })
            .collect::<Vec<_>>();
        CurveInterpolation::new(points)
            .with_num_control_points(7)
            .try_create_curve(4)
            .unwrap()
    }

    #[test]
    fn loft_interpolates_sections() {
        let stations = [(3., 0.), (2., 1.), (1.5, 3.), (1., 6.)];
        let sections = stations
            .iter()
            .map(|(s, z)| section(*s, *z))
            .collect::<Vec<_>>();
        let surface = CurveLofter::new(&sections).try_create_surface(4).unwrap();
        assert_eq!(surface.u_degree(), 3);
        assert_eq!(surface.v_degree(), 3);
        assert_eq!(surface.v_knots_domain(), (0., 1.));

        // v = 0 and v = 1 reproduce the end sections
        for i in 0..=10 {
            let u = i as f64 / 10.;
            assert_relative_eq!(surface.point_at(u, 0.), sections[0].point_at(u), epsilon = 1e-9);
            assert_relative_eq!(surface.point_at(u, 1.), sections[3].point_at(u), epsilon = 1e-9);
        }

        // interior sections are hit at the interior skinning parameter
        let p = sections[1].point_at(0.5);
        let (u, v) = surface.find_closest_parameter(&p).unwrap();
        assert_relative_eq!(surface.point_at(u, v), p, epsilon = 1e-6);
    }

    #[test]
    fn loft_degree_is_limited_by_section_count() {
        let sections = vec![section(2., 0.), section(1., 2.)];
        let surface = CurveLofter::new(&sections).try_create_surface(4).unwrap();
        assert_eq!(surface.v_degree(), 1);
    }

    #[test]
    fn loft_unifies_knot_vectors() {
        let a = NurbsCurve3D::polyline(&[
            Point3::new(0., 0., 0.),
            Point3::new(1., 0., 0.),
            Point3::new(3., 0., 0.),
        ])
        .unwrap();
        let b = NurbsCurve3D::polyline(&[Point3::new(0., 1., 1.), Point3::new(3., 1., 1.)]).unwrap();
        let surface = CurveLofter::new(&[a.clone(), b.clone()])
            .try_create_surface(2)
            .unwrap();
        for i in 0..=6 {
            let u = i as f64 / 6.;
            assert_relative_eq!(surface.point_at(u, 0.), a.point_at(u), epsilon = 1e-10);
            assert_relative_eq!(surface.point_at(u, 1.), b.point_at(u), epsilon = 1e-10);
        }
    }

    #[test]
    fn loft_rejects_invalid_input() {
        let one = vec![section(1., 0.)];
        assert!(CurveLofter::new(&one).try_create_surface(4).is_err());

        let two = vec![section(1., 0.), section(1., 1.)];
        assert!(CurveLofter::new(&two).try_create_surface(1).is_err());

        let line = NurbsCurve3D::polyline(&[Point3::new(0., 0., 2.), Point3::new(1., 0., 2.)]).unwrap();
        let mixed = vec![section(1., 0.), line];
        assert!(CurveLofter::new(&mixed).try_create_surface(2).is_err());
    }
}
