use thiserror::Error;

use quotegate_core::{LookupError, LookupErrorKind};

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Lookup(error) => match error.kind() {
                LookupErrorKind::InvalidSymbol => 2,
                LookupErrorKind::RateLimited => 3,
                LookupErrorKind::UpstreamAuth => 4,
                LookupErrorKind::Upstream => 5,
            },
            Self::Serialization(_) => 6,
            Self::Io(_) => 10,
        }
    }
}
