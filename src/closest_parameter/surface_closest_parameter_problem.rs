use argmin::core::{CostFunction, Gradient, Hessian};
use nalgebra::{Point3, Vector2, Vector3};

use crate::{misc::FloatingPoint, surface::NurbsSurface3D};

/// Cost, gradient & Hessian provider for finding the closest parameter on a surface to a given point.
/// The "gradient" is the difference vector S(u, v) - P and the "Hessian" the rational derivatives,
/// the solver combines both into the normal equations.
pub struct SurfaceClosestParameterProblem<'a, T: FloatingPoint> {
    point: &'a Point3<T>,
    surface: &'a NurbsSurface3D<T>,
}

impl<'a, T: FloatingPoint> SurfaceClosestParameterProblem<'a, T> {
    pub fn new(point: &'a Point3<T>, surface: &'a NurbsSurface3D<T>) -> Self {
        Self { point, surface }
    }
}

impl<T: FloatingPoint> CostFunction for SurfaceClosestParameterProblem<'_, T> {
    type Param = Vector2<T>;
    type Output = T;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, anyhow::Error> {
        let p = self.surface.point_at(param.x, param.y);
        Ok((p - self.point).norm())
    }
}

impl<T: FloatingPoint> Gradient for SurfaceClosestParameterProblem<'_, T> {
    type Param = Vector2<T>;
    type Gradient = Vector3<T>;

    fn gradient(&self, param: &Self::Param) -> Result<Self::Gradient, anyhow::Error> {
        let p = self.surface.point_at(param.x, param.y);
        Ok(p - self.point)
    }
}

impl<T: FloatingPoint> Hessian for SurfaceClosestParameterProblem<'_, T> {
    type Param = Vector2<T>;
    type Hessian = Vec<Vec<Vector3<T>>>;

    fn hessian(&self, param: &Self::Param) -> Result<Self::Hessian, anyhow::Error> {
        Ok(self.surface.rational_derivatives(param.x, param.y, 2))
    }
}
