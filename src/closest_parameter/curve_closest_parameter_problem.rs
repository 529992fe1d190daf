use argmin::core::{Gradient, Hessian};
use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, OPoint, OVector};

use crate::misc::FloatingPoint;

/// A one parameter path that can be differentiated, such as a curve or an edge of a face
pub trait CurveDerivatives<T: FloatingPoint, N: DimName>
where
    DefaultAllocator: Allocator<N>,
{
    /// Point and its first `n` derivatives at `t`
    fn derivatives_at(&self, t: T, n: usize) -> anyhow::Result<Vec<OVector<T, N>>>;
}

/// Squared distance between a path and a target point, minimized over the path parameter
/// gradient: C'(t) . (C(t) - P)
/// hessian: C''(t) . (C(t) - P) + C'(t) . C'(t)
pub struct CurveClosestParameterProblem<'a, T: FloatingPoint, N: DimName, C>
where
    DefaultAllocator: Allocator<N>,
{
    target: &'a OPoint<T, N>,
    path: &'a C,
}

impl<'a, T: FloatingPoint, N: DimName, C> CurveClosestParameterProblem<'a, T, N, C>
where
    C: CurveDerivatives<T, N>,
    DefaultAllocator: Allocator<N>,
{
    pub fn new(target: &'a OPoint<T, N>, path: &'a C) -> Self {
        Self { target, path }
    }

    fn evaluate(&self, t: T, n: usize) -> anyhow::Result<(OVector<T, N>, Vec<OVector<T, N>>)> {
        let ders = self.path.derivatives_at(t, n)?;
        anyhow::ensure!(ders.len() > n, "Expected {} derivatives, got {}", n, ders.len());
        let delta = &ders[0] - &self.target.coords;
        Ok((delta, ders))
    }
}

impl<T: FloatingPoint, N: DimName, C> Gradient for CurveClosestParameterProblem<'_, T, N, C>
where
    C: CurveDerivatives<T, N>,
    DefaultAllocator: Allocator<N>,
{
    type Param = T;
    type Gradient = T;

    fn gradient(&self, param: &Self::Param) -> Result<Self::Gradient, anyhow::Error> {
        let (delta, ders) = self.evaluate(*param, 1)?;
        Ok(ders[1].dot(&delta))
    }
}

impl<T: FloatingPoint, N: DimName, C> Hessian for CurveClosestParameterProblem<'_, T, N, C>
where
    C: CurveDerivatives<T, N>,
    DefaultAllocator: Allocator<N>,
{
    type Param = T;
    type Hessian = T;

    fn hessian(&self, param: &Self::Param) -> Result<Self::Hessian, anyhow::Error> {
        let (delta, ders) = self.evaluate(*param, 2)?;
        Ok(ders[2].dot(&delta) + ders[1].norm_squared())
    }
}
