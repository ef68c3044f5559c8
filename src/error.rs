use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the I/O collaborators around the frame renderer.
///
/// Frame composition itself never fails; everything here happens before the
/// first frame (decode, config, fonts) or after it (encoding).
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("audio decode failed for {path}: {message}")]
    AudioDecode { path: PathBuf, message: String },

    #[error("transcript error: {0}")]
    Transcript(String),

    #[error("logo error for {path}: {message}")]
    Logo { path: PathBuf, message: String },

    #[error("font error for {path}: {message}")]
    Font { path: PathBuf, message: String },

    #[error("ffmpeg encode failed: {0}")]
    Encode(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CollaboratorError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode(message.into())
    }

    pub fn transcript(message: impl Into<String>) -> Self {
        Self::Transcript(message.into())
    }
}

pub type CollabResult<T> = std::result::Result<T, CollaboratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(CollaboratorError::config("x")
            .to_string()
            .starts_with("invalid configuration:"));
        assert!(CollaboratorError::encode("x")
            .to_string()
            .starts_with("ffmpeg encode failed:"));
        assert!(CollaboratorError::transcript("x")
            .to_string()
            .starts_with("transcript error:"));
    }

    #[test]
    fn io_errors_convert() {
        let err: CollaboratorError = std::io::Error::other("boom").into();
        assert!(err.to_string().contains("boom"));
    }
}
