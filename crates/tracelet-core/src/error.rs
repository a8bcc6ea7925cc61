use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("session store error: {0}")]
    Session(String),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
