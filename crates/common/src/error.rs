//! Error types for Sutr

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using Sutr Error
pub type Result<T> = std::result::Result<T, Error>;

/// Sutr error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Error loading \"{}\"\nReason: {reason}", path.display())]
    InvalidFile { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("An error occurred while loading slot definition \"{slot}\"\nReason: {source}")]
    SlotDefinition {
        slot: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Process exit code associated with this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::NotFound { .. } => 404,
            Error::InvalidFile { .. }
            | Error::InvalidConfig(_)
            | Error::Serialization(_)
            | Error::SlotDefinition { .. } => 400,
            Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound => 404,
            Error::Io(_) => 500,
        }
    }

    /// Map an IO failure on a known input file, keeping "missing" distinct
    pub fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound { path }
        } else {
            Error::InvalidFile {
                path,
                reason: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_maps_to_404() {
        let err = Error::from_io(
            "/nope/intents.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(err.exit_code(), 404);
    }

    #[test]
    fn test_unreadable_file_maps_to_400() {
        let err = Error::from_io(
            "/locked/skill.utr",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.exit_code(), 400);
        assert!(err.to_string().contains("skill.utr"));
    }
}
