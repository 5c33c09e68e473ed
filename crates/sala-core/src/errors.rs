use thiserror::Error;

#[derive(Debug, Error)]
pub enum SalaError {
    #[error("media capture failed: {0}")]
    Capture(String),
    #[error("membership channel error: {0}")]
    Channel(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}
