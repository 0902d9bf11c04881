use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    #[error("engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("engine not ready")]
    EngineNotReady,

    #[error("analysis timeout")]
    AnalysisTimeout,

    #[error("engine error: {0}")]
    Engine(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
