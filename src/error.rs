use thiserror::Error;

#[derive(Debug, Error)]
pub enum BandsweepError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Allocation error: {0}")]
    Allocation(String),

    #[error("Communication error: {0}")]
    Communication(String),
}

pub type Result<T> = std::result::Result<T, BandsweepError>;
