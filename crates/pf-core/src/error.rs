use thiserror::Error;

pub type CalcResult<T> = Result<T, CalcError>;

/// Structural validation errors.
///
/// Physically degenerate but well-shaped input is never reported here; the
/// solvers return NaN, infinity or `converged = false` for that instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    #[error("Insufficient curve data for {what}: need at least {required} points, got {actual}")]
    InsufficientCurveData {
        what: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("Duplicate abscissa x={x} in {what}")]
    DuplicateAbscissa { what: &'static str, x: f64 },

    #[error("Invalid arrangement: {what}")]
    InvalidArrangement { what: String },

    #[error("Singular matrix: {what}")]
    SingularMatrix { what: &'static str },

    #[error("Invalid model config: {what}")]
    InvalidModelConfig { what: String },

    #[error("Curve is not strictly monotonic: {what}")]
    NonMonotonicCurve { what: &'static str },

    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },
}

impl CalcError {
    pub fn config(what: impl Into<String>) -> Self {
        CalcError::InvalidModelConfig { what: what.into() }
    }

    pub fn arrangement(what: impl Into<String>) -> Self {
        CalcError::InvalidArrangement { what: what.into() }
    }
}
