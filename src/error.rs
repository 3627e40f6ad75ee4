use thiserror::Error;

/// Every failure the engine can report. None of these are transient; they
/// all indicate bad input data or a misuse of the API.
#[derive(Debug, Error)]
pub enum NnError {
    #[error("unknown activation function '{0}'")]
    UnknownActivation(String),

    #[error("unknown loss function '{0}'")]
    UnknownLoss(String),

    #[error("unknown metric '{0}'")]
    UnknownMetric(String),

    #[error("no loss function bound; call `set_loss` before `backpropagation`")]
    MissingLoss,

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("malformed archive: {0}")]
    MalformedArchive(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NnError>;
