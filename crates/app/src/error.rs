use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Engine(#[from] engine::EngineError),
}

impl AppError {
    /// `true` when the user simply has not uploaded the needed file yet.
    pub fn is_no_records(&self) -> bool {
        matches!(self, AppError::Engine(err) if err.is_no_records())
    }
}
