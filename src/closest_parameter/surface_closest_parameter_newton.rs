use argmin::{argmin_error_closure, core::*, float};
use nalgebra::{Matrix2, Vector2, Vector3};

/// Damped Newton's method on the (u, v) parameter of a surface
/// The step is rejected when the distance to the target point increases
#[derive(Clone, Copy)]
pub struct SurfaceClosestParameterNewton<F> {
    gamma: F,
    domain: ((F, F), (F, F)),
}

impl<F: ArgminFloat> SurfaceClosestParameterNewton<F> {
    pub fn new(domain: ((F, F), (F, F))) -> Self {
        SurfaceClosestParameterNewton {
            gamma: float!(0.5),
            domain,
        }
    }
}

type SurfaceState<F> = IterState<Vector2<F>, Vector2<F>, (), (), (), F>;

impl<O, F> Solver<O, SurfaceState<F>> for SurfaceClosestParameterNewton<F>
where
    F: crate::misc::FloatingPoint + ArgminFloat,
    O: CostFunction<Param = Vector2<F>, Output = F>
        + Gradient<Param = Vector2<F>, Gradient = Vector3<F>>
        + Hessian<Param = Vector2<F>, Hessian = Vec<Vec<Vector3<F>>>>,
{
    const NAME: &'static str = "Surface closest parameter newton method";

    fn init(
        &mut self,
        problem: &mut Problem<O>,
        state: SurfaceState<F>,
    ) -> Result<(SurfaceState<F>, Option<KV>), Error> {
        let x0 = state.get_param().ok_or_else(argmin_error_closure!(
            NotInitialized,
            "`SurfaceClosestParameterNewton` requires an initial parameter."
        ))?;
        let cost = problem.cost(x0)?;
        Ok((state.cost(cost), None))
    }

    fn next_iter(
        &mut self,
        problem: &mut Problem<O>,
        state: SurfaceState<F>,
    ) -> Result<(SurfaceState<F>, Option<KV>), Error> {
        let param = *state.get_param().ok_or_else(argmin_error_closure!(
            NotInitialized,
            "`SurfaceClosestParameterNewton` requires an initial parameter."
        ))?;

        let dif = problem.gradient(&param)?;
        let e = problem.hessian(&param)?;

        let s_u = &e[1][0];
        let s_v = &e[0][1];
        let s_uu = &e[2][0];
        let s_vv = &e[0][2];
        let s_uv = &e[1][1];

        if dif.norm() < float!(1e-10) {
            return Ok((state.param(param), None));
        }

        let grad = Vector2::new(s_u.dot(&dif), s_v.dot(&dif));
        let j00 = s_u.dot(s_u) + s_uu.dot(&dif);
        let j01 = s_u.dot(s_v) + s_uv.dot(&dif);
        let j11 = s_v.dot(s_v) + s_vv.dot(&dif);
        let jacobian = Matrix2::new(j00, j01, j01, j11);
        let delta = match jacobian.lu().solve(&-grad) {
            Some(delta) => delta,
            None => return Ok((state.param(param), None)),
        };

        let next = param + delta * self.gamma;
        let next = Vector2::new(
            clamp(next.x, self.domain.0),
            clamp(next.y, self.domain.1),
        );

        let cost = problem.cost(&next)?;
        if state.get_cost() < cost {
            Ok((state.param(param), None))
        } else {
            Ok((state.cost(cost).param(next), None))
        }
    }

    fn terminate(&mut self, state: &SurfaceState<F>) -> TerminationStatus {
        if state.iter > state.max_iters {
            return TerminationStatus::Terminated(TerminationReason::MaxItersReached);
        }

        match (state.get_param(), state.get_prev_param()) {
            (Some(current), Some(prev)) => {
                if (current - prev).norm() < F::default_epsilon() {
                    TerminationStatus::Terminated(TerminationReason::SolverConverged)
                } else {
                    TerminationStatus::NotTerminated
                }
            }
            _ => TerminationStatus::NotTerminated,
        }
    }
}

fn clamp<F: ArgminFloat>(parameter: F, domain: (F, F)) -> F {
    if parameter < domain.0 {
        domain.0
    } else if parameter > domain.1 {
        domain.1
    } else {
        parameter
    }
}
