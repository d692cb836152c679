//! Convergence tracking & tolerance checks for iterative solvers.

/// Stopping criteria & stats.
#[derive(Clone, Debug)]
pub struct Convergence<T> {
    /// Required reduction of the residual norm relative to the initial one.
    pub tol: T,
    pub max_iters: usize,
}

/// Outcome of one solve.
///
/// `iterations` counts half-steps of BiCGStab as 0.5, hence the float.
#[derive(Clone, Debug, PartialEq)]
pub struct SolveStats<T> {
    pub iterations: f64,
    /// Final residual norm relative to the initial one.
    pub final_residual: T,
    pub converged: bool,
}

impl<T: Copy + num_traits::Float> Convergence<T> {
    /// Relative residual reached the tolerance.
    pub fn is_converged(&self, res_norm: T, res0_norm: T) -> bool {
        res_norm <= self.tol * res0_norm
    }

    /// Returns (should_stop, stats) given current `res_norm` and iteration `i`.
    pub fn check(&self, res_norm: T, res0_norm: T, i: f64) -> (bool, SolveStats<T>) {
        let converged = self.is_converged(res_norm, res0_norm);
        let rel = if res0_norm > T::zero() { res_norm / res0_norm } else { T::zero() };
        (
            converged || i >= self.max_iters as f64,
            SolveStats {
                iterations: i,
                final_residual: rel,
                converged,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_on_tolerance_or_budget() {
        let conv = Convergence { tol: 1e-2, max_iters: 10 };
        let (stop, stats) = conv.check(0.5e-2, 1.0, 3.0);
        assert!(stop && stats.converged);
        let (stop, stats) = conv.check(0.5, 1.0, 10.0);
        assert!(stop && !stats.converged);
        let (stop, _) = conv.check(0.5, 1.0, 9.5);
        assert!(!stop);
    }
}
