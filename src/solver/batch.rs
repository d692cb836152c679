//! Many right-hand sides against one prepared operator.

use crate::error::TracerError;
use crate::utils::convergence::SolveStats;

/// Per right-hand-side results of a batch, in input order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchOutcome {
    pub stats: Vec<SolveStats<f64>>,
}

impl BatchOutcome {
    /// Logical AND of the individual convergence flags; true for an empty batch.
    pub fn converged(&self) -> bool {
        self.stats.iter().all(|s| s.converged)
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}

/// Zero each `xs[i]` and solve it against `bs[i]` with `solve_one`.
///
/// All right-hand sides are attempted even after a failed one, so converged
/// solutions are available when the batch as a whole is not. Lengths are
/// checked up front so that a malformed batch leaves every `x` untouched.
pub fn run_batch<F>(
    dim: usize,
    xs: &mut [Vec<f64>],
    bs: &[Vec<f64>],
    mut solve_one: F,
) -> Result<BatchOutcome, TracerError>
where
    F: FnMut(&mut Vec<f64>, &Vec<f64>) -> Result<SolveStats<f64>, TracerError>,
{
    if xs.len() != bs.len() {
        return Err(TracerError::DimensionMismatch(format!(
            "{} solution vectors for {} right-hand sides",
            xs.len(),
            bs.len()
        )));
    }
    if let Some((i, _)) = xs
        .iter()
        .zip(bs)
        .enumerate()
        .find(|(_, (x, b))| x.len() != dim || b.len() != dim)
    {
        return Err(TracerError::DimensionMismatch(format!(
            "right-hand side {i} does not match the system dimension {dim}"
        )));
    }

    let mut outcome = BatchOutcome { stats: Vec::with_capacity(bs.len()) };
    for (x, b) in xs.iter_mut().zip(bs) {
        x.iter_mut().for_each(|v| *v = 0.0);
        outcome.stats.push(solve_one(x, b)?);
    }
    if !outcome.converged() {
        let failed = outcome.stats.iter().filter(|s| !s.converged).count();
        log::warn!("{failed} of {} tracer solves did not converge", outcome.len());
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(converged: bool) -> SolveStats<f64> {
        SolveStats { iterations: 1.0, final_residual: 0.0, converged }
    }

    #[test]
    fn failure_does_not_stop_the_batch() {
        let mut xs = vec![vec![9.0; 2]; 3];
        let bs = vec![vec![1.0; 2]; 3];
        let mut calls = 0;
        let outcome = run_batch(2, &mut xs, &bs, |x, b| {
            calls += 1;
            assert!(x.iter().all(|&v| v == 0.0));
            x.copy_from_slice(b);
            Ok(stats(calls != 1))
        })
        .unwrap();
        assert_eq!(calls, 3);
        assert!(!outcome.converged());
        assert_eq!(xs[2], vec![1.0; 2]);
    }

    #[test]
    fn mismatched_batch_is_rejected_before_solving() {
        let mut xs = vec![vec![5.0; 2], vec![5.0; 3]];
        let bs = vec![vec![1.0; 2], vec![1.0; 2]];
        let res = run_batch(2, &mut xs, &bs, |_, _| Ok(stats(true)));
        assert!(matches!(res, Err(TracerError::DimensionMismatch(_))));
        assert_eq!(xs[0], vec![5.0; 2]);
    }

    #[test]
    fn empty_batch_converges() {
        let outcome = run_batch(4, &mut [], &[], |_, _| Ok(stats(false))).unwrap();
        assert!(outcome.converged());
        assert!(outcome.is_empty());
    }
}
