use thiserror::Error;

#[derive(Error, Debug)]
pub enum RevtextError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timed out {0}")]
    Timeout(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RevtextError>;
