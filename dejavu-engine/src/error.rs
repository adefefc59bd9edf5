use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("History unavailable: {0}")]
    History(String),

    #[error("Annotation sink failed: {0}")]
    Sink(String),

    #[error("Unknown toggle: {0}")]
    UnknownToggle(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
