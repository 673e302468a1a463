/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the persistence layer, the media index and the UI layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Scheme + authority prefix of references handed out by the media index
pub const MEDIA_URI_PREFIX: &str = "content://lolcat/media/";

/// Opaque reference to a photo the user picked
///
/// Accepted forms:
/// - a plain filesystem path
/// - a `file://` URI
/// - a `content://lolcat/media/<id>` reference from the media index
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PhotoUri(String);

impl PhotoUri {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// Wrap a local path picked from the file dialog
    pub fn from_path(path: &std::path::Path) -> Self {
        match url::Url::from_file_path(path) {
            Ok(url) => Self(url.to_string()),
            // Relative paths can't become file:// URIs, keep them verbatim
            Err(()) => Self(path.to_string_lossy().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if this points into the media index rather than the filesystem
    pub fn is_media_reference(&self) -> bool {
        self.0.starts_with(MEDIA_URI_PREFIX)
    }
}

impl fmt::Display for PhotoUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference returned by the media index once a saved file is registered
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ExternalUri(String);

impl ExternalUri {
    /// Build the reference for a media index row
    pub fn for_media_id(id: i64) -> Self {
        Self(format!("{}{}", MEDIA_URI_PREFIX, id))
    }

    pub fn parse(uri: &str) -> Option<Self> {
        Self(uri.to_string()).media_id().map(|_| Self(uri.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Row id encoded in the reference, if it is well formed
    pub fn media_id(&self) -> Option<i64> {
        self.0.strip_prefix(MEDIA_URI_PREFIX)?.parse().ok()
    }
}

impl fmt::Display for ExternalUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ExternalUri> for PhotoUri {
    fn from(uri: ExternalUri) -> Self {
        PhotoUri(uri.0)
    }
}

/// A composited image that made it to disk
///
/// `external_uri` stays `None` until the media index has registered the file.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedArtifact {
    /// Full path of the written PNG
    pub file_path: PathBuf,
    /// Media index reference, present once registration succeeded
    pub external_uri: Option<ExternalUri>,
}

impl PersistedArtifact {
    pub fn written(file_path: PathBuf) -> Self {
        Self {
            file_path,
            external_uri: None,
        }
    }

    pub fn registered(mut self, uri: ExternalUri) -> Self {
        self.external_uri = Some(uri);
        self
    }
}
