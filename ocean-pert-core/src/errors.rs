use thiserror::Error;

/// Error type for invalid operations.
#[derive(Error, Debug)]
pub enum OceanPertError {
    #[error("shapes {0:?} and {1:?} are not broadcast compatible")]
    ShapeMismatch(Vec<usize>, Vec<usize>),
    #[error("depth axis has {actual} levels but the field has {expected} along its vertical axis")]
    DepthAxisMismatch { expected: usize, actual: usize },
    #[error(
        "salinity balancing did not converge within {iterations} iterations \
         (max density residual {residual:e} kg/m^3)"
    )]
    NonConvergence { iterations: usize, residual: f64 },
}

/// Convenience type for `Result<T, OceanPertError>`.
pub type OceanPertResult<T> = Result<T, OceanPertError>;
