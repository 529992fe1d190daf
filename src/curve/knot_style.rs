use itertools::Itertools;
use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, OPoint};

use crate::misc::FloatingPoint;

/// Parameterization of points for curve fitting
/// https://en.wikipedia.org/wiki/Centripetal_Catmull%E2%80%93Rom_spline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KnotStyle {
    Uniform,
    #[default]
    Chordal,
    Centripetal,
}

impl KnotStyle {
    /// Assign a parameter in [0, 1] to each point
    /// Coincident points share the parameter of their predecessor
    /// # Example
    /// ```
    /// use wingshell::prelude::KnotStyle;
    /// use nalgebra::Point2;
    /// let points = [Point2::new(0., 0.), Point2::new(1., 0.), Point2::new(3., 0.)];
    /// let params = KnotStyle::Chordal.parameterize(&points);
    /// assert_eq!(params, vec![0., 1. / 3., 1.]);
    /// let params = KnotStyle::Uniform.parameterize(&points);
    /// assert_eq!(params, vec![0., 0.5, 1.]);
    /// ```
    pub fn parameterize<T: FloatingPoint, D: DimName>(&self, points: &[OPoint<T, D>]) -> Vec<T>
    where
        DefaultAllocator: Allocator<D>,
    {
        let n = points.len();
        if n < 2 {
            return vec![T::zero(); n];
        }

        let steps: Vec<T> = match self {
            KnotStyle::Uniform => vec![T::one(); n - 1],
            KnotStyle::Chordal | KnotStyle::Centripetal => {
                let alpha = self.alpha::<T>();
                points
                    .iter()
                    .tuple_windows()
                    .map(|(a, b)| (b - a).norm().powf(alpha))
                    .collect()
            }
        };

        let total = steps.iter().fold(T::zero(), |acc, s| acc + *s);
        if total <= T::zero() {
            let inv = T::one() / T::from_usize(n - 1).unwrap();
            return (0..n).map(|i| T::from_usize(i).unwrap() * inv).collect();
        }

        let mut params = Vec::with_capacity(n);
        let mut acc = T::zero();
        params.push(T::zero());
        for s in steps.iter().take(n - 2) {
            acc += *s;
            params.push(acc / total);
        }
        params.push(T::one());
        params
    }

    fn alpha<T: FloatingPoint>(&self) -> T {
        match self {
            KnotStyle::Centripetal => T::from_f64(0.5).unwrap(),
            _ => T::one(),
        }
    }
}
