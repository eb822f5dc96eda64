use std::fmt::{Display, Formatter};

/// Error type for the downmix stage, its engine binding, and settings IO.
#[derive(Debug)]
pub enum DownmixError {
    /// A setter or settings file carried a value outside its valid range.
    InvalidParameter(String),
    /// The mix engine refused to open with the projected configuration.
    EngineOpen(String),
    /// The mix engine failed while processing a chunk.
    EngineProcess(String),
    /// A cycle was requested while the stage is closed.
    StageClosed(String),
    /// The downstream sink rejected mixed samples.
    Sink(String),
    /// A settings payload could not be parsed.
    Settings(String),
    Io(std::io::Error),
}

impl DownmixError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }
}

impl Display for DownmixError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidParameter(err) => write!(f, "invalid parameter: {}", err),
            Self::EngineOpen(err) => write!(f, "mix engine open failed: {}", err),
            Self::EngineProcess(err) => write!(f, "mix engine process failed: {}", err),
            Self::StageClosed(err) => write!(f, "downmix stage closed: {}", err),
            Self::Sink(err) => write!(f, "sink write failed: {}", err),
            Self::Settings(err) => write!(f, "invalid settings: {}", err),
            Self::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for DownmixError {}

impl From<std::io::Error> for DownmixError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for DownmixError {
    fn from(value: serde_json::Error) -> Self {
        Self::Settings(value.to_string())
    }
}
