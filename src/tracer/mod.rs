//! Passive tracer transport.
//!
//! [`TracerModel`] owns the per-tracer concentration and storage fields, the
//! cartesian-to-active index map and the transport matrix whose structure is
//! derived from the grid stencil. The host assembles matrix values and
//! right-hand sides every timestep and hands them back to the model's solve
//! entry points.
//!
//! ```rust,ignore
//! let tracers = [TracerDefinition::new("SEA", Phase::Water).with_cartesian_values(seawater)];
//! let mut model = TracerModel::new(&grid, &comm, &tracers);
//! model.initialize(false, grid.num_cells(), PhaseIndices::new(2, 1, 0))?;
//! // assemble into model.matrix_mut()?, then
//! let outcome = model.solve_concentrations(&rhs)?;
//! ```

pub mod definition;
pub mod depth_table;
pub mod index_map;

pub use definition::{InitialValue, Phase, PhaseIndices, TracerDefinition};
pub use depth_table::{DepthTable, DepthTableColumns};
pub use index_map::CartesianIndexMap;

use crate::assembly::{allocate_matrix, build_sparsity};
use crate::config::SolverOptions;
use crate::context::KspContext;
use crate::error::TracerError;
use crate::grid::GridTopology;
use crate::matrix::CsrMatrix;
use crate::parallel::Comm;
use crate::solver::BatchOutcome;

struct TracerState {
    concentration: Vec<Vec<f64>>,
    storage: Vec<Vec<f64>>,
    phase_idx: Vec<usize>,
    residual: Vec<f64>,
    matrix: CsrMatrix<f64>,
    index_map: CartesianIndexMap,
}

/// Tracer state store and solve entry points for one simulation run.
pub struct TracerModel<'a> {
    grid: &'a dyn GridTopology,
    comm: &'a dyn Comm,
    tracers: &'a [TracerDefinition],
    options: SolverOptions,
    initialized: bool,
    state: Option<TracerState>,
}

/// Initial concentration of `tracer` on every active cell.
fn initial_field(grid: &dyn GridTopology, tracer: &TracerDefinition) -> Result<Vec<f64>, TracerError> {
    let n = grid.num_cells();
    match &tracer.initial {
        Some(InitialValue::Cartesian(table)) => {
            if table.len() < grid.cartesian_size() {
                return Err(TracerError::TableSizeMismatch {
                    tracer: tracer.name.clone(),
                    got: table.len(),
                    expected: grid.cartesian_size(),
                });
            }
            Ok((0..n).map(|cell| table[grid.cartesian_index(cell)]).collect())
        }
        Some(InitialValue::DepthTable(table)) => {
            Ok((0..n).map(|cell| table.evaluate(grid.centroid(cell)[2])).collect())
        }
        None => Err(TracerError::MissingInitialValue(format!(
            "no initial value specified for tracer {}",
            tracer.name
        ))),
    }
}

fn not_ready(initialized: bool) -> TracerError {
    if initialized {
        TracerError::Logic("tracer transport is disabled".into())
    } else {
        TracerError::Logic("tracer model used before initialization".into())
    }
}

impl<'a> TracerModel<'a> {
    pub fn new(grid: &'a dyn GridTopology, comm: &'a dyn Comm, tracers: &'a [TracerDefinition]) -> Self {
        Self {
            grid,
            comm,
            tracers,
            options: SolverOptions::default(),
            initialized: false,
            state: None,
        }
    }

    pub fn with_options(mut self, options: SolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    /// Size the tracer fields, populate initial values and allocate the
    /// transport matrix.
    ///
    /// On restart the fields are left at zero for the host to overwrite from
    /// persisted state. Nothing is committed unless every tracer succeeds;
    /// a failed call also discards the state of an earlier successful one.
    pub fn initialize(
        &mut self,
        is_restart: bool,
        num_active_cells: usize,
        phases: PhaseIndices,
    ) -> Result<(), TracerError> {
        self.state = None;
        self.initialized = false;
        if self.tracers.is_empty() {
            self.initialized = true;
            log::debug!("no tracers defined, tracer transport disabled");
            return Ok(());
        }
        if num_active_cells != self.grid.num_cells() {
            return Err(TracerError::Logic(format!(
                "{} active cells requested, grid has {}",
                num_active_cells,
                self.grid.num_cells()
            )));
        }

        let mut concentration = Vec::with_capacity(self.tracers.len());
        let mut storage = Vec::with_capacity(self.tracers.len());
        let mut phase_idx = Vec::with_capacity(self.tracers.len());
        for tracer in self.tracers {
            phase_idx.push(phases.resolve(tracer.phase));
            storage.push(vec![0.0; num_active_cells]);
            if is_restart {
                concentration.push(vec![0.0; num_active_cells]);
            } else {
                concentration.push(initial_field(self.grid, tracer)?);
            }
        }

        let index_map = CartesianIndexMap::build(self.grid);
        let pattern = build_sparsity(self.grid);
        let matrix = allocate_matrix(&pattern)?;
        log::info!(
            "initialized {} tracer(s) on {} active cells, {} matrix nonzeros{}",
            self.tracers.len(),
            num_active_cells,
            matrix.nnz(),
            if is_restart { " (restart)" } else { "" }
        );

        self.state = Some(TracerState {
            concentration,
            storage,
            phase_idx,
            residual: vec![0.0; num_active_cells],
            matrix,
            index_map,
        });
        self.initialized = true;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Initialized with at least one tracer.
    pub fn is_enabled(&self) -> bool {
        self.state.is_some()
    }

    pub fn tracer_count(&self) -> usize {
        self.tracers.len()
    }

    pub fn name(&self, tracer: usize) -> &str {
        &self.tracers[tracer].name
    }

    pub fn output_file_tag(&self, tracer: usize) -> String {
        self.tracers[tracer].output_file_tag()
    }

    pub fn phase(&self, tracer: usize) -> Phase {
        self.tracers[tracer].phase
    }

    /// Host phase index of `tracer`, resolved at initialization.
    pub fn phase_of(&self, tracer: usize) -> Option<usize> {
        self.state.as_ref().map(|s| s.phase_idx[tracer])
    }

    /// Zero while the subsystem is disabled.
    pub fn concentration(&self, tracer: usize, cell: usize) -> f64 {
        self.state.as_ref().map_or(0.0, |s| s.concentration[tracer][cell])
    }

    pub fn set_concentration(&mut self, tracer: usize, cell: usize, value: f64) {
        if let Some(s) = self.state.as_mut() {
            s.concentration[tracer][cell] = value;
        }
    }

    pub fn concentration_field(&self, tracer: usize) -> &[f64] {
        self.state
            .as_ref()
            .map_or(&[] as &[f64], |s| s.concentration[tracer].as_slice())
    }

    pub fn storage(&self, tracer: usize, cell: usize) -> f64 {
        self.state.as_ref().map_or(0.0, |s| s.storage[tracer][cell])
    }

    pub fn set_storage(&mut self, tracer: usize, cell: usize, value: f64) {
        if let Some(s) = self.state.as_mut() {
            s.storage[tracer][cell] = value;
        }
    }

    pub fn cartesian_to_active(&self, cart: usize) -> Option<usize> {
        self.state.as_ref().and_then(|s| s.index_map.active(cart))
    }

    fn state(&self) -> Result<&TracerState, TracerError> {
        self.state.as_ref().ok_or_else(|| not_ready(self.initialized))
    }

    fn state_mut(&mut self) -> Result<&mut TracerState, TracerError> {
        let initialized = self.initialized;
        self.state.as_mut().ok_or_else(|| not_ready(initialized))
    }

    pub fn residual_mut(&mut self) -> Result<&mut [f64], TracerError> {
        Ok(&mut self.state_mut()?.residual)
    }

    pub fn matrix(&self) -> Result<&CsrMatrix<f64>, TracerError> {
        Ok(&self.state()?.matrix)
    }

    /// Values may be rewritten freely; the structure is fixed.
    pub fn matrix_mut(&mut self) -> Result<&mut CsrMatrix<f64>, TracerError> {
        Ok(&mut self.state_mut()?.matrix)
    }

    /// Solver selector bound to this model's grid and communicator.
    pub fn solver_context(&self) -> KspContext<'a> {
        KspContext::new(self.options.clone(), self.comm, self.grid)
    }

    /// Solve `matrix x = b`; `x` is zeroed first. Returns the convergence flag.
    pub fn solve(&self, matrix: &CsrMatrix<f64>, x: &mut Vec<f64>, b: &Vec<f64>) -> Result<bool, TracerError> {
        Ok(self.solver_context().solve(matrix, x, b)?.converged)
    }

    /// Solve all right-hand sides; true only if every one converged.
    pub fn solve_batch(
        &self,
        matrix: &CsrMatrix<f64>,
        xs: &mut [Vec<f64>],
        bs: &[Vec<f64>],
    ) -> Result<bool, TracerError> {
        Ok(self.solve_batch_with_stats(matrix, xs, bs)?.converged())
    }

    pub fn solve_batch_with_stats(
        &self,
        matrix: &CsrMatrix<f64>,
        xs: &mut [Vec<f64>],
        bs: &[Vec<f64>],
    ) -> Result<BatchOutcome, TracerError> {
        self.solver_context().solve_batch(matrix, xs, bs)
    }

    /// Solve the owned matrix against one right-hand side per tracer,
    /// writing the solutions into the concentration fields.
    pub fn solve_concentrations(&mut self, rhs: &[Vec<f64>]) -> Result<BatchOutcome, TracerError> {
        let ctx = self.solver_context();
        let state = self.state_mut()?;
        if rhs.len() != state.concentration.len() {
            return Err(TracerError::DimensionMismatch(format!(
                "{} right-hand sides for {} tracers",
                rhs.len(),
                state.concentration.len()
            )));
        }
        ctx.solve_batch(&state.matrix, &mut state.concentration, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CartesianGrid;
    use crate::parallel::SerialComm;
    use approx::assert_abs_diff_eq;

    fn phases() -> PhaseIndices {
        PhaseIndices::new(2, 1, 0)
    }

    #[test]
    fn empty_table_disables_transport() {
        let grid = CartesianGrid::new([2, 2, 1], [1.0; 3]).unwrap();
        let mut model = TracerModel::new(&grid, &SerialComm, &[]);
        model.initialize(false, 4, phases()).unwrap();
        assert!(model.is_initialized());
        assert!(!model.is_enabled());
        assert_eq!(model.tracer_count(), 0);
        assert_eq!(model.concentration(0, 3), 0.0);
        model.set_concentration(0, 3, 1.0);
        assert_eq!(model.concentration(0, 3), 0.0);
        assert!(matches!(model.matrix(), Err(TracerError::Logic(_))));
    }

    #[test]
    fn matrix_requires_initialization() {
        let grid = CartesianGrid::new([2, 1, 1], [1.0; 3]).unwrap();
        let tracers = [TracerDefinition::new("T", Phase::Oil).with_cartesian_values(vec![0.0; 2])];
        let mut model = TracerModel::new(&grid, &SerialComm, &tracers);
        assert!(matches!(model.matrix_mut(), Err(TracerError::Logic(_))));
        assert!(model.residual_mut().is_err());
        model.initialize(false, 2, phases()).unwrap();
        assert_eq!(model.matrix().unwrap().nnz(), 4);
        assert_eq!(model.residual_mut().unwrap().len(), 2);
        assert_eq!(model.phase_of(0), Some(1));
    }

    #[test]
    fn depth_table_is_evaluated_at_centroids() {
        let grid = CartesianGrid::new([1, 1, 2], [1.0, 1.0, 50.0]).unwrap().with_top(25.0);
        let table = DepthTable::from_points(&[(0.0, 0.1), (100.0, 0.9)]).unwrap();
        let tracers = [TracerDefinition::new("D", Phase::Gas).with_depth_table(table)];
        let mut model = TracerModel::new(&grid, &SerialComm, &tracers);
        model.initialize(false, 2, phases()).unwrap();
        assert_abs_diff_eq!(model.concentration(0, 0), 0.5, epsilon = 1e-14);
        assert_eq!(model.concentration(0, 1), 0.9);
        assert_eq!(model.phase_of(0), Some(2));
    }

    #[test]
    fn restart_leaves_fields_for_the_host() {
        let grid = CartesianGrid::new([3, 1, 1], [1.0; 3]).unwrap();
        let tracers = [TracerDefinition::new("R", Phase::Water)];
        let mut model = TracerModel::new(&grid, &SerialComm, &tracers);
        model.initialize(true, 3, phases()).unwrap();
        assert_eq!(model.concentration_field(0), &[0.0; 3]);
        model.set_concentration(0, 1, 0.7);
        model.set_storage(0, 1, 0.3);
        assert_eq!(model.concentration(0, 1), 0.7);
        assert_eq!(model.storage(0, 1), 0.3);
    }

    #[test]
    fn missing_initial_value_names_the_tracer() {
        let grid = CartesianGrid::new([2, 1, 1], [1.0; 3]).unwrap();
        let tracers = [
            TracerDefinition::new("OK", Phase::Water).with_cartesian_values(vec![1.0, 2.0]),
            TracerDefinition::new("BAD", Phase::Water),
        ];
        let mut model = TracerModel::new(&grid, &SerialComm, &tracers);
        let err = model.initialize(false, 2, phases()).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("BAD"));
        assert!(!model.is_initialized());
        assert_eq!(model.concentration(0, 0), 0.0);
    }

    #[test]
    fn active_cell_count_must_match_grid() {
        let grid = CartesianGrid::new([2, 1, 1], [1.0; 3]).unwrap();
        let tracers = [TracerDefinition::new("T", Phase::Water).with_cartesian_values(vec![1.0, 2.0])];
        let mut model = TracerModel::new(&grid, &SerialComm, &tracers);
        assert!(matches!(model.initialize(false, 3, phases()), Err(TracerError::Logic(_))));
    }

    #[test]
    fn concentrations_are_updated_in_place() {
        let grid = CartesianGrid::new([3, 1, 1], [1.0; 3]).unwrap();
        let tracers = [
            TracerDefinition::new("A", Phase::Water).with_cartesian_values(vec![9.0; 3]),
            TracerDefinition::new("B", Phase::Oil).with_cartesian_values(vec![9.0; 3]),
        ];
        let mut model = TracerModel::new(&grid, &SerialComm, &tracers);
        model.initialize(false, 3, phases()).unwrap();
        let a = model.matrix_mut().unwrap();
        for i in 0..3 {
            a.add_to(i, i, 2.0).unwrap();
        }
        let rhs = vec![vec![2.0, 4.0, 6.0], vec![1.0, 1.0, 1.0]];
        let outcome = model.solve_concentrations(&rhs).unwrap();
        assert!(outcome.converged());
        assert_eq!(outcome.len(), 2);
        assert_abs_diff_eq!(model.concentration(0, 2), 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(model.concentration(1, 0), 0.5, epsilon = 1e-12);
        assert!(model.solve_concentrations(&rhs[..1]).is_err());
    }
}
