use thiserror::Error;

use crate::settings::ConfigError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("output failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("no item could be loaded")]
    NoItems,
    #[error("item {position} is out of range (loaded {count})")]
    SelectionOutOfRange { position: usize, count: usize },
    #[error("metadata task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("failed to initialize logging: {0}")]
    Logging(String),
}
