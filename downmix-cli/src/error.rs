use std::fmt::{Display, Formatter};

use downmix_lib::DownmixError;

#[derive(Debug)]
pub enum CliError {
    Downmix(DownmixError),
    /// Input could not be opened or decoded.
    Decode(String),
    Wav(hound::Error),
    /// A command line value failed to parse.
    Usage(String),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Downmix(err) => write!(f, "{}", err),
            Self::Decode(err) => write!(f, "decode error: {}", err),
            Self::Wav(err) => write!(f, "wav error: {}", err),
            Self::Usage(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CliError {}

impl From<DownmixError> for CliError {
    fn from(err: DownmixError) -> Self {
        Self::Downmix(err)
    }
}

impl From<hound::Error> for CliError {
    fn from(err: hound::Error) -> Self {
        Self::Wav(err)
    }
}

impl From<symphonia::core::errors::Error> for CliError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
