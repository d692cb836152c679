use thiserror::Error;

// Unified error type for tracerflow

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TracerError {
    #[error("wrong size of initial concentration table for tracer {tracer}: {got} values, cartesian grid has {expected} cells")]
    TableSizeMismatch {
        tracer: String,
        got: usize,
        expected: usize,
    },
    #[error("can not initialize tracer: {0}")]
    MissingInitialValue(String),
    #[error("invalid depth table: {0}")]
    InvalidTable(String),
    #[error("invalid grid: {0}")]
    InvalidGrid(String),
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    #[error("logic error: {0}")]
    Logic(String),
}

impl TracerError {
    /// True for errors caused by an invalid tracer or table definition.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            TracerError::TableSizeMismatch { .. }
                | TracerError::MissingInitialValue(_)
                | TracerError::InvalidTable(_)
        )
    }
}
