use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, OPoint, RealField};

/// Find the closest point on a segment
/// * `pt` - point to project
/// * `start` - start point of segment
/// * `end` - end point of segment
/// * `u0` - first param of segment
/// * `u1` - second param of segment
pub fn segment_closest_point<T: RealField + Copy, D: DimName>(
    pt: &OPoint<T, D>,
    start: &OPoint<T, D>,
    end: &OPoint<T, D>,
    u0: T,
    u1: T,
) -> (T, OPoint<T, D>)
where
    DefaultAllocator: Allocator<D>,
{
    let dif = end - start;
    let l = dif.norm();

    if l < T::default_epsilon() {
        return (u0, start.clone());
    }

    let r = dif / l;
    let projected = (pt - start).dot(&r);

    if projected < T::zero() {
        (u0, start.clone())
    } else if projected > l {
        (u1, end.clone())
    } else {
        (
            u0 + (u1 - u0) * projected / l,
            (r * projected + &start.coords).into(),
        )
    }
}

/// Signed area of a closed polygon in the plane (shoelace formula)
/// positive when the polygon runs counter-clockwise
pub fn signed_area<T: RealField + Copy>(polygon: &[nalgebra::Point2<T>]) -> T {
    let n = polygon.len();
    if n < 3 {
        return T::zero();
    }
    let two = T::one() + T::one();
    (0..n).fold(T::zero(), |acc, i| {
        let a = &polygon[i];
        let b = &polygon[(i + 1) % n];
        acc + (a.x * b.y - b.x * a.y)
    }) / two
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::{Point2, Point3};

    use super::*;

    #[test]
    fn closest_point_inside_segment() {
        let (u, p) = segment_closest_point(
            &Point3::new(0.5, 1.0, 0.0),
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            2.0,
            4.0,
        );
        assert_relative_eq!(u, 3.0);
        assert_relative_eq!(p, Point3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn closest_point_clamps_to_ends() {
        let (u, _) = segment_closest_point(
            &Point2::new(-1.0, 0.0),
            &Point2::new(0.0, 0.0),
            &Point2::new(1.0, 0.0),
            0.0,
            1.0,
        );
        assert_eq!(u, 0.0);
    }

    #[test]
    fn signed_area_orientation() {
        let square = [
            Point2::new(0., 0.),
            Point2::new(1., 0.),
            Point2::new(1., 1.),
            Point2::new(0., 1.),
        ];
        assert_relative_eq!(signed_area(&square), 1.0);
        let mut reversed = square.to_vec();
        reversed.reverse();
        assert_relative_eq!(signed_area(&reversed), -1.0);
    }
}
