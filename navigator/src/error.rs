use thiserror::Error;

#[derive(Debug, Error)]
pub enum NavigatorError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid route or fix definition: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse GPX track: {0}")]
    Gpx(#[from] gpx::errors::GpxError),
    #[error("non-finite value in {0}")]
    NonFiniteInput(&'static str),
    #[error("configuration error: {0}")]
    Config(String),
}
