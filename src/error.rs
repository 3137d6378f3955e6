use thiserror::Error;

/// Hard failures. Expected conditions (missing key, wrong kind, collisions)
/// are reported through return values and never show up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VatError {
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    #[error("no tokio runtime available to schedule expiration")]
    NoTimerRuntime,

    #[error("invalid seed entry {0:?}, expected key=value")]
    InvalidSeed(String),
}
