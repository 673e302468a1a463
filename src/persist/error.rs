use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// Why a save attempt ended in failure
///
/// Underlying causes sit behind `Arc` so errors can travel inside UI
/// messages, which must be `Clone`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SaveError {
    #[error("storage unavailable at {}: {reason}", path.display())]
    StorageUnavailable { path: PathBuf, reason: String },

    #[error("failed to write {}: {source}", path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("failed to encode {}: {source}", path.display())]
    EncodingError {
        path: PathBuf,
        #[source]
        source: Arc<image::ImageError>,
    },

    #[error("media index did not register {}", path.display())]
    RegistrationFailed { path: PathBuf },
}

impl SaveError {
    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SaveError::WriteError {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// The path the failure is about
    pub fn path(&self) -> &PathBuf {
        match self {
            SaveError::StorageUnavailable { path, .. }
            | SaveError::WriteError { path, .. }
            | SaveError::EncodingError { path, .. }
            | SaveError::RegistrationFailed { path } => path,
        }
    }

    /// What the user gets told. Users can't act on the finer distinction.
    pub fn user_message(&self) -> &'static str {
        match self {
            SaveError::RegistrationFailed { .. } => "Scan failed",
            _ => "Save failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        let scan = SaveError::RegistrationFailed {
            path: PathBuf::from("/pics/lolcats/1.png"),
        };
        let write = SaveError::write("/pics/lolcats/1.png", io::Error::other("disk full"));

        assert_eq!(scan.user_message(), "Scan failed");
        assert_eq!(write.user_message(), "Save failed");
        assert_eq!(write.path(), &PathBuf::from("/pics/lolcats/1.png"));
        assert!(write.to_string().contains("disk full"));
    }
}
