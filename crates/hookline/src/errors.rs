use thiserror::Error;

/// Errors raised while turning a hook request into an event stream.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RelayError {
    /// The request payload is missing a required field or has the wrong shape.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Opening or consuming the upstream converse stream failed.
    #[error("{0:#}")]
    Upstream(#[from] anyhow::Error),

    /// An event could not be encoded as a JSON line.
    #[error("{0}")]
    Serialization(#[from] serde_json::Error),
}

pub type RelayResult<T> = Result<T, RelayError>;
