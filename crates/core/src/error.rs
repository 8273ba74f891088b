use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("config not found: {0}")]
    ConfigNotFound(String),
    #[error("config parse error: {0}")]
    ConfigParse(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
