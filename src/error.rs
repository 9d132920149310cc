use thiserror::Error;

/// Errors surfaced by the forcing pipeline. Precondition violations are
/// reported before the partitioning pass writes anything; all failures are
/// fatal to the current run.
#[derive(Error, Debug)]
pub enum ForcingError {
    #[error("netCDF error: {0}")]
    Netcdf(#[from] netcdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("malformed timestamp at step {step}: {value}")]
    BadTimestamp { step: usize, value: f64 },

    #[error("time axis is not monotonically non-decreasing at step {0}")]
    UnsortedTime(usize),

    #[error("no input series for configured variable: {0}")]
    MissingSeries(String),

    #[error("series {name} has {got} time steps, expected {expected}")]
    LengthMismatch {
        name: String,
        got: usize,
        expected: usize,
    },

    #[error("field for {name} has shape {got:?}, expected {expected:?}")]
    ShapeMismatch {
        name: String,
        got: (usize, usize),
        expected: (usize, usize),
    },

    #[error("variable not found in input file: {0}")]
    MissingVariable(String),

    #[error("data conversion error for {0}")]
    Conversion(String),
}
