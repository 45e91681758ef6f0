//! Client store errors.

use std::path::PathBuf;
use thiserror::Error;

/// Underlying cause of a failed document read or write.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

/// Client store error types.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Load from file {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },

    #[error("Save in file {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },

    #[error("Item not found")]
    NotFound,

    #[error("Stored phone number could not be decrypted: {0}")]
    Decryption(String),

    #[error("Operation not supported: {0}")]
    Unsupported(&'static str),
}

impl StoreError {
    /// Stable kind name, used as the prefix of user-facing messages.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Load { .. } => "LoadError",
            StoreError::Save { .. } => "SaveError",
            StoreError::NotFound => "NotFoundError",
            StoreError::Decryption(_) => "DecryptionError",
            StoreError::Unsupported(_) => "UnsupportedError",
        }
    }

    pub(crate) fn load(path: impl Into<PathBuf>, source: impl Into<DocumentError>) -> Self {
        StoreError::Load {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn save(path: impl Into<PathBuf>, source: impl Into<DocumentError>) -> Self {
        StoreError::Save {
            path: path.into(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = StoreError::NotFound;
        assert_eq!(err.kind(), "NotFoundError");
        assert_eq!(err.to_string(), "Item not found");
    }

    #[test]
    fn test_save_error_names_file() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StoreError::save("/data/clients.json", io);

        assert_eq!(err.kind(), "SaveError");
        assert_eq!(err.to_string(), "Save in file /data/clients.json: denied");
        assert!(std::error::Error::source(&err).is_some());
    }
}
