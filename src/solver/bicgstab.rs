//! Preconditioned BiCGStab solver (Saad §7.4.2, right preconditioning).
//!
//! The stopping test is a reduction of the residual norm relative to the
//! initial residual. Iterations are counted in half steps: the residual is
//! checked after the BiCG half step and after the stabilizing half step.
//!
//! A breakdown (vanishing ⟨r̂, r⟩, ⟨r̂, v⟩, ⟨t, t⟩ or ω) stops the iteration and
//! is reported as non-convergence, never as an error: the caller decides how
//! to react to an unconverged solve.

use crate::core::traits::{InnerProduct, MatVec};
use crate::error::TracerError;
use crate::preconditioner::{Identity, Preconditioner};
use crate::solver::LinearSolver;
use crate::utils::convergence::{Convergence, SolveStats};
use num_traits::Float;

/// Scalars at or below this magnitude count as a breakdown.
const BREAKDOWN: f64 = 1e-80;
/// Initial residuals below this norm are already converged.
const TINY_RESIDUAL: f64 = 1e-30;

pub struct BiCgStabSolver<T> {
    pub conv: Convergence<T>,
    /// 0: silent, 1: summary per solve, 2: every half step.
    pub verbosity: u8,
}

/// y ← y + a·x
fn axpy<T: Float>(y: &mut [T], a: T, x: &[T]) {
    for (yi, &xi) in y.iter_mut().zip(x) {
        *yi = *yi + a * xi;
    }
}

impl<T: Float> BiCgStabSolver<T> {
    pub fn new(tol: T, max_iters: usize) -> Self {
        Self { conv: Convergence { tol, max_iters }, verbosity: 0 }
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    fn finish(&self, stats: SolveStats<T>) -> SolveStats<T> {
        if self.verbosity >= 1 {
            log::info!(
                "BiCGStab: converged={} iterations={} reduction={:e}",
                stats.converged,
                stats.iterations,
                stats.final_residual.to_f64().unwrap_or(f64::NAN)
            );
        }
        stats
    }

    fn breakdown(&self, what: &str, iterations: f64, res: T, res0: T) -> SolveStats<T> {
        log::debug!("BiCGStab breakdown ({what}) after {iterations} iterations");
        self.finish(SolveStats {
            iterations,
            final_residual: res / res0,
            converged: false,
        })
    }

    /// Solve `A x = b` starting from the given `x`, with an explicit
    /// operator, scalar product and preconditioner.
    pub fn solve_with<M, S, A, P>(
        &self,
        a: &M,
        sp: &S,
        pc: &P,
        b: &Vec<T>,
        x: &mut Vec<T>,
    ) -> Result<SolveStats<T>, TracerError>
    where
        M: MatVec<Vec<T>>,
        S: InnerProduct<Vec<T>, Scalar = T>,
        P: Preconditioner<A, Vec<T>> + ?Sized,
    {
        let n = b.len();
        if x.len() != n {
            return Err(TracerError::DimensionMismatch(format!(
                "solution of length {} for right-hand side of length {}",
                x.len(),
                n
            )));
        }
        let eps = T::from(BREAKDOWN).unwrap_or_else(T::min_positive_value);
        let tiny = T::from(TINY_RESIDUAL).unwrap_or_else(T::min_positive_value);

        // r = b - A x
        let mut r = vec![T::zero(); n];
        a.matvec(x, &mut r);
        for (ri, &bi) in r.iter_mut().zip(b) {
            *ri = bi - *ri;
        }
        let r_hat = r.clone();
        let mut p = vec![T::zero(); n];
        let mut v = vec![T::zero(); n];
        let mut t = vec![T::zero(); n];
        let mut y = vec![T::zero(); n];
        let mut rho = T::one();
        let mut alpha = T::one();
        let mut omega = T::one();

        let res0 = sp.norm(&r);
        if res0 <= tiny {
            return Ok(self.finish(SolveStats {
                iterations: 0.0,
                final_residual: T::zero(),
                converged: true,
            }));
        }
        let mut res = res0;

        for k in 1..=self.conv.max_iters {
            let half = k as f64 - 0.5;
            let rho_new = sp.dot(&r_hat, &r);
            if rho_new.abs() <= eps {
                return Ok(self.breakdown("rho", half - 0.5, res, res0));
            }
            if k == 1 {
                p.copy_from_slice(&r);
            } else {
                let beta = (rho_new / rho) * (alpha / omega);
                for ((pj, &rj), &vj) in p.iter_mut().zip(&r).zip(&v) {
                    *pj = rj + beta * (*pj - omega * vj);
                }
            }

            // y = M⁻¹ p, v = A y
            pc.apply(&p, &mut y)?;
            a.matvec(&y, &mut v);
            let h = sp.dot(&r_hat, &v);
            if h.abs() <= eps {
                return Ok(self.breakdown("<r_hat, v>", half - 0.5, res, res0));
            }
            alpha = rho_new / h;
            axpy(x, alpha, &y);
            axpy(&mut r, -alpha, &v);
            res = sp.norm(&r);
            if self.verbosity >= 2 {
                log::trace!("BiCGStab {half:>5.1}: {:e}", (res / res0).to_f64().unwrap_or(f64::NAN));
            }
            if self.conv.is_converged(res, res0) {
                return Ok(self.finish(SolveStats {
                    iterations: half,
                    final_residual: res / res0,
                    converged: true,
                }));
            }

            // y = M⁻¹ r, t = A y
            pc.apply(&r, &mut y)?;
            a.matvec(&y, &mut t);
            let tt = sp.dot(&t, &t);
            if tt <= eps {
                return Ok(self.breakdown("<t, t>", half, res, res0));
            }
            omega = sp.dot(&t, &r) / tt;
            axpy(x, omega, &y);
            axpy(&mut r, -omega, &t);
            rho = rho_new;
            res = sp.norm(&r);
            if self.verbosity >= 2 {
                log::trace!("BiCGStab {:>5.1}: {:e}", k as f64, (res / res0).to_f64().unwrap_or(f64::NAN));
            }
            let (stop, stats) = self.conv.check(res, res0, k as f64);
            if stop {
                return Ok(self.finish(stats));
            }
            if omega.abs() <= eps {
                return Ok(self.breakdown("omega", k as f64, res, res0));
            }
        }

        Ok(self.finish(SolveStats {
            iterations: self.conv.max_iters as f64,
            final_residual: res / res0,
            converged: false,
        }))
    }
}

impl<M, T> LinearSolver<M, Vec<T>> for BiCgStabSolver<T>
where
    M: MatVec<Vec<T>>,
    T: Float + Send + Sync,
{
    type Error = TracerError;
    type Scalar = T;

    fn solve(
        &mut self,
        a: &M,
        pc: Option<&dyn Preconditioner<M, Vec<T>>>,
        b: &Vec<T>,
        x: &mut Vec<T>,
    ) -> Result<SolveStats<T>, TracerError> {
        match pc {
            Some(pc) => self.solve_with(a, &(), pc, b, x),
            None => {
                let id: &dyn Preconditioner<M, Vec<T>> = &Identity;
                self.solve_with(a, &(), id, b, x)
            }
        }
    }
}
