use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Vector search unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Empty query")]
    EmptyQuery,

    #[error("Knowledge store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, Error>;
