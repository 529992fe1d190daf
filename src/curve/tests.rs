use approx::assert_relative_eq;
use nalgebra::{Point2, Point3, Point4};

use super::{NurbsCurve2D, NurbsCurve3D};

fn arch() -> NurbsCurve3D<f64> {
    NurbsCurve3D::try_new(
        3,
        vec![
            Point4::new(0., 0., 0., 1.),
            Point4::new(1., 2., 0., 1.),
            Point4::new(2., 3., 1., 1.),
            Point4::new(4., 2., 0., 1.),
            Point4::new(5., 0., 0., 1.),
        ],
        vec![0., 0., 0., 0., 0.5, 1., 1., 1., 1.],
    )
    .unwrap()
}

#[test]
fn end_points_are_interpolated() {
    let curve = arch();
    assert_relative_eq!(curve.point_at(0.), Point3::new(0., 0., 0.));
    assert_relative_eq!(curve.point_at(1.), Point3::new(5., 0., 0.));
}

#[test]
fn refine_knot_preserves_shape() {
    let curve = arch();
    let mut refined = curve.clone();
    refined.try_refine_knot(vec![0.25, 0.5, 0.75]).unwrap();
    assert_eq!(refined.control_points().len(), curve.control_points().len() + 3);
    assert_eq!(
        refined.knots().len(),
        refined.control_points().len() + refined.degree() + 1
    );
    for i in 0..=10 {
        let t = i as f64 / 10.;
        assert_relative_eq!(refined.point_at(t), curve.point_at(t), epsilon = 1e-10);
    }
}

#[test]
fn refine_knot_rejects_parameters_outside_domain() {
    let mut curve = arch();
    assert!(curve.try_refine_knot(vec![1.5]).is_err());
}

#[test]
fn tangent_matches_finite_difference() {
    let curve = arch();
    let h = 1e-6;
    for t in [0.1, 0.4, 0.6, 0.9] {
        let fd = (curve.point_at(t + h) - curve.point_at(t - h)) / (2. * h);
        assert_relative_eq!(curve.tangent_at(t), fd, epsilon = 1e-5);
    }
}

#[test]
fn rational_quarter_circle_length() {
    let w = std::f64::consts::FRAC_1_SQRT_2;
    let quarter = NurbsCurve2D::try_new(
        2,
        vec![
            Point3::new(1., 0., 1.),
            Point3::new(w, w, w),
            Point3::new(0., 1., 1.),
        ],
        vec![0., 0., 0., 1., 1., 1.],
    )
    .unwrap();
    let p = quarter.point_at(0.5);
    assert_relative_eq!(p.coords.norm(), 1.0, epsilon = 1e-12);
    assert_relative_eq!(
        quarter.try_length().unwrap(),
        std::f64::consts::FRAC_PI_2,
        epsilon = 1e-8
    );
}

#[test]
fn closest_parameter_on_cubic() {
    let curve = arch();
    let target = curve.point_at(0.37);
    let t = curve.find_closest_parameter(&target).unwrap();
    assert_relative_eq!(t, 0.37, epsilon = 1e-6);
}

#[test]
fn polyline_requires_two_distinct_points() {
    assert!(NurbsCurve2D::<f64>::polyline(&[Point2::new(0., 0.)]).is_err());
    assert!(NurbsCurve2D::<f64>::polyline(&[Point2::new(1., 1.), Point2::new(1., 1.)]).is_err());
}

#[test]
fn normalize_knots_keeps_shape() {
    let mut curve = NurbsCurve2D::try_new(
        1,
        vec![Point3::new(0., 0., 1.), Point3::new(2., 0., 1.)],
        vec![2., 2., 6., 6.],
    )
    .unwrap();
    let mid = curve.point_at(4.);
    curve.normalize_knots();
    assert_eq!(curve.knots_domain(), (0., 1.));
    assert_relative_eq!(curve.point_at(0.5), mid);
}
