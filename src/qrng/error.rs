use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The randomness provider could not be reached or answered with a failure status.
    #[error("random byte source unavailable: {0}")]
    SourceUnavailable(#[from] reqwest::Error),
    /// The provider answered, but not with exactly one byte under `data`.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
}

pub type Result<T> = std::result::Result<T, Error>;
