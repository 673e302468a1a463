/// Session state carried across restarts
///
/// Everything needed to put the editor back the way the user left it:
/// which photo was open, its captions and where they were dragged to,
/// and the last picture saved from it. Stored as JSON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::caption::CaptionLayer;
use super::data::{ExternalUri, PersistedArtifact, PhotoUri};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Session {
    pub photo_uri: Option<PhotoUri>,
    pub saved_image_filename: Option<PathBuf>,
    pub saved_image_uri: Option<ExternalUri>,
    pub top_caption: Option<String>,
    pub bottom_caption: Option<String>,
    /// `[top_x, top_y, bottom_x, bottom_y]`
    pub caption_positions: Option<[i32; 4]>,
}

impl Session {
    /// Snapshot the editor state
    pub fn capture(
        photo_uri: Option<&PhotoUri>,
        layer: Option<&CaptionLayer>,
        saved: Option<&PersistedArtifact>,
    ) -> Self {
        Self {
            photo_uri: photo_uri.cloned(),
            saved_image_filename: saved.map(|a| a.file_path.clone()),
            saved_image_uri: saved.and_then(|a| a.external_uri.clone()),
            top_caption: layer.and_then(|l| l.top()).map(str::to_string),
            bottom_caption: layer.and_then(|l| l.bottom()).map(str::to_string),
            caption_positions: layer
                .filter(|l| l.has_valid_caption())
                .map(CaptionLayer::positions),
        }
    }

    /// Re-apply the stored captions to a freshly loaded photo
    pub fn restore_captions(&self, layer: &mut CaptionLayer) {
        if !self.has_captions() {
            return;
        }
        layer.set_captions(self.top_caption.as_deref(), self.bottom_caption.as_deref());
        layer.set_positions(self.caption_positions);
    }

    /// The saved picture recorded in this session, if any
    pub fn saved_artifact(&self) -> Option<PersistedArtifact> {
        self.saved_image_filename.as_ref().map(|path| PersistedArtifact {
            file_path: path.clone(),
            external_uri: self.saved_image_uri.clone(),
        })
    }

    pub fn has_captions(&self) -> bool {
        [&self.top_caption, &self.bottom_caption]
            .iter()
            .any(|c| c.as_deref().is_some_and(|t| !t.is_empty()))
    }

    /// Convert to JSON string for the session file
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from JSON string (from the session file)
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read a session file. A missing file is not an error, just no session.
    pub fn load(path: &Path) -> Result<Option<Self>, SessionError> {
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(path)?;
        Ok(Some(Self::from_json(&json)?))
    }

    pub fn store(&self, path: &Path) -> Result<(), SessionError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::caption::CaptionLine;

    fn captioned_layer() -> CaptionLayer {
        let mut layer = CaptionLayer::new(640, 480);
        layer.set_captions(Some("I CAN HAS"), Some("CHEEZBURGER"));
        layer.set_position(CaptionLine::Bottom, 300, 400);
        layer
    }

    #[test]
    fn test_default_is_empty() {
        let session = Session::default();
        assert!(!session.has_captions());
        assert!(session.saved_artifact().is_none());
    }

    #[test]
    fn test_capture_and_restore_captions() {
        let uri = PhotoUri::new("file:///pics/cat.jpg");
        let session = Session::capture(Some(&uri), Some(&captioned_layer()), None);

        assert_eq!(session.photo_uri, Some(uri));
        assert_eq!(session.caption_positions, Some([320, 20, 300, 400]));

        let mut restored = CaptionLayer::new(640, 480);
        session.restore_captions(&mut restored);
        assert_eq!(restored, captioned_layer());
    }

    #[test]
    fn test_store_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let saved = PersistedArtifact::written(PathBuf::from("/pics/lolcats/1.png"))
            .registered(ExternalUri::for_media_id(3));

        let session = Session::capture(
            Some(&PhotoUri::new("file:///pics/cat.jpg")),
            Some(&captioned_layer()),
            Some(&saved),
        );
        session.store(&path).unwrap();

        let loaded = Session::load(&path).unwrap().unwrap();
        assert_eq!(loaded, session);
        assert_eq!(loaded.saved_artifact(), Some(saved));
    }

    #[test]
    fn test_missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Session::load(&dir.path().join("session.json")).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(Session::load(&path), Err(SessionError::Json(_))));
    }

    #[test]
    fn test_missing_fields_default() {
        let session = Session::from_json(r#"{ "top_caption": "OH HAI" }"#).unwrap();
        assert_eq!(session.top_caption.as_deref(), Some("OH HAI"));
        assert!(session.photo_uri.is_none());
        assert!(session.has_captions());
    }
}
