use argmin::{argmin_error_closure, core::*, float};

/// Newton's method on a scalar parameter, clamped to a closed domain
/// Used to find the closest parameter on a curve to a point
/// Based on https://argmin-rs.github.io/argmin/argmin/solver/newton/struct.Newton.html
#[derive(Clone, Copy)]
pub struct ClosestParameterNewton<F> {
    domain: (F, F),
}

impl<F: ArgminFloat> ClosestParameterNewton<F> {
    pub fn new(domain: (F, F)) -> Self {
        ClosestParameterNewton { domain }
    }
}

impl<O, F> Solver<O, IterState<F, F, (), F, (), F>> for ClosestParameterNewton<F>
where
    O: Gradient<Param = F, Gradient = F> + Hessian<Param = F, Hessian = F>,
    F: ArgminFloat,
{
    const NAME: &'static str = "Closest parameter newton method";

    fn next_iter(
        &mut self,
        problem: &mut Problem<O>,
        state: IterState<F, F, (), F, (), F>,
    ) -> Result<(IterState<F, F, (), F, (), F>, Option<KV>), Error> {
        let param = *state.get_param().ok_or_else(argmin_error_closure!(
            NotInitialized,
            "`ClosestParameterNewton` requires an initial parameter."
        ))?;

        let grad = problem.gradient(&param)?;
        let hessian = problem.hessian(&param)?;
        if hessian == float!(0.0) {
            return Ok((state.param(param), None));
        }

        let next = param - grad / hessian;
        let next = if next < self.domain.0 {
            self.domain.0
        } else if next > self.domain.1 {
            self.domain.1
        } else {
            next
        };

        Ok((state.param(next), None))
    }

    fn terminate(&mut self, state: &IterState<F, F, (), F, (), F>) -> TerminationStatus {
        if state.iter > state.max_iters {
            return TerminationStatus::Terminated(TerminationReason::MaxItersReached);
        }

        match (state.get_param(), state.get_prev_param()) {
            (Some(current), Some(prev)) => {
                if num_traits::Float::abs(*current - *prev) < F::epsilon() {
                    TerminationStatus::Terminated(TerminationReason::SolverConverged)
                } else {
                    TerminationStatus::NotTerminated
                }
            }
            _ => TerminationStatus::NotTerminated,
        }
    }
}
