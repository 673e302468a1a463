use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::data::ExternalUri;
use crate::persist::Registrar;

/// Errors from the media index catalog
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("media index database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("media index I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{} can't be indexed: {reason}", path.display())]
    NotIndexable { path: PathBuf, reason: String },
}

/// The MediaIndex manages the SQLite catalog of saved pictures.
///
/// Registering a file gives back a `content://lolcat/media/<id>` reference,
/// which is what the saved-picture screen hands to viewers and the clipboard.
///
/// Only the database path is held: rusqlite::Connection is not Send, so every
/// caller (including background registration) opens its own connection.
#[derive(Clone)]
pub struct MediaIndex {
    db_path: PathBuf,
}

impl MediaIndex {
    /// Point at a catalog without touching the disk.
    ///
    /// Problems surface later, as failed registrations.
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    /// Open (or create) the catalog and make sure the schema exists.
    pub fn open(db_path: PathBuf) -> Result<Self, IndexError> {
        let index = Self::new(db_path);
        index.connect()?;
        info!("📁 Media index ready at: {}", index.db_path.display());
        Ok(index)
    }

    fn connect(&self) -> Result<Connection, IndexError> {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&self.db_path)?;
        init_schema(&conn)?;
        Ok(conn)
    }

    /// Number of registered pictures
    pub fn count(&self) -> Result<i64, IndexError> {
        let conn = self.connect()?;
        let count = conn.query_row("SELECT COUNT(*) FROM media", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Register a file synchronously.
    ///
    /// The file must exist and decode as an image. Registering the same path
    /// twice refreshes its row and returns the same reference.
    pub fn register_blocking(&self, path: &Path) -> Result<ExternalUri, IndexError> {
        let not_indexable = |reason: String| IndexError::NotIndexable {
            path: path.to_path_buf(),
            reason,
        };

        if !path.is_file() {
            return Err(not_indexable("file does not exist".to_string()));
        }
        let (width, height) =
            image::image_dimensions(path).map_err(|e| not_indexable(e.to_string()))?;
        let mime_type = image::ImageFormat::from_path(path)
            .map(|format| format.to_mime_type())
            .unwrap_or("application/octet-stream");

        let path_str = path.to_string_lossy().to_string();
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO media (path, mime_type, width, height, added_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(path) DO UPDATE SET
                mime_type = excluded.mime_type,
                width = excluded.width,
                height = excluded.height,
                added_at = excluded.added_at",
            rusqlite::params![&path_str, mime_type, width, height, Utc::now().timestamp_millis()],
        )?;

        let id: i64 = conn.query_row(
            "SELECT id FROM media WHERE path = ?1",
            [&path_str],
            |row| row.get(0),
        )?;

        debug!("registered {} as media #{}", path.display(), id);
        Ok(ExternalUri::for_media_id(id))
    }

    /// Look up the file behind a reference
    pub fn resolve(&self, uri: &ExternalUri) -> Result<Option<PathBuf>, IndexError> {
        let Some(id) = uri.media_id() else {
            return Ok(None);
        };
        let conn = self.connect()?;
        let path: Option<String> = conn
            .query_row("SELECT path FROM media WHERE id = ?1", [id], |row| row.get(0))
            .optional()?;
        Ok(path.map(PathBuf::from))
    }

    /// Forget pictures whose files have been deleted
    /// Returns how many rows were removed
    pub fn prune_missing(&self) -> Result<usize, IndexError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT id, path FROM media")?;

        let rows: Vec<(i64, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .filter_map(|r| r.ok())
            .collect();

        let mut removed = 0;
        for (id, file_path) in rows {
            if !Path::new(&file_path).exists() {
                conn.execute("DELETE FROM media WHERE id = ?1", [id])?;
                removed += 1;
            }
        }

        if removed > 0 {
            info!("🔄 Pruned {} missing pictures from the media index", removed);
        }

        Ok(removed)
    }

    /// `prune_missing` on the blocking pool; it stats every indexed file
    pub async fn prune_missing_async(self) -> Result<usize, IndexError> {
        tokio::task::spawn_blocking(move || self.prune_missing())
            .await
            .map_err(|e| IndexError::Io(std::io::Error::other(e.to_string())))?
    }
}

impl Registrar for MediaIndex {
    fn request_registration(&self, path: &Path) -> oneshot::Receiver<Option<ExternalUri>> {
        let (reply, receiver) = oneshot::channel();
        let index = self.clone();
        let path = path.to_path_buf();

        tokio::task::spawn_blocking(move || {
            let uri = match index.register_blocking(&path) {
                Ok(uri) => Some(uri),
                Err(e) => {
                    warn!("⚠️  Registration failed: {}", e);
                    None
                }
            };
            // The requester may have gone away; nothing to do then
            let _ = reply.send(uri);
        });

        receiver
    }
}

/// Create tables and indexes if they don't exist.
fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS media (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            path        TEXT NOT NULL UNIQUE,
            mime_type   TEXT NOT NULL,
            width       INTEGER,
            height      INTEGER,
            added_at    INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_media_added_at
         ON media(added_at DESC)",
        [],
    )?;

    Ok(())
}

// Implement Debug for better error messages
impl std::fmt::Debug for MediaIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaIndex")
            .field("db_path", &self.db_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn write_png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255])).save(&path).unwrap();
        path
    }

    #[test]
    fn test_register_and_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let index = MediaIndex::open(dir.path().join("db").join("media.db")).unwrap();
        let picture = write_png(dir.path(), "1.png");

        let uri = index.register_blocking(&picture).unwrap();
        assert_eq!(index.resolve(&uri).unwrap(), Some(picture.clone()));
        assert_eq!(index.count().unwrap(), 1);

        // Same file, same reference
        assert_eq!(index.register_blocking(&picture).unwrap(), uri);
        assert_eq!(index.count().unwrap(), 1);
    }

    #[test]
    fn test_non_images_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let index = MediaIndex::open(dir.path().join("media.db")).unwrap();
        let bogus = dir.path().join("notes.png");
        std::fs::write(&bogus, b"not pixels").unwrap();

        assert!(matches!(
            index.register_blocking(&bogus),
            Err(IndexError::NotIndexable { .. })
        ));
        assert!(matches!(
            index.register_blocking(&dir.path().join("missing.png")),
            Err(IndexError::NotIndexable { .. })
        ));
    }

    #[test]
    fn test_prune_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let index = MediaIndex::open(dir.path().join("media.db")).unwrap();
        let kept = write_png(dir.path(), "kept.png");
        let gone = write_png(dir.path(), "gone.png");
        index.register_blocking(&kept).unwrap();
        let gone_uri = index.register_blocking(&gone).unwrap();

        std::fs::remove_file(&gone).unwrap();

        assert_eq!(index.prune_missing().unwrap(), 1);
        assert_eq!(index.resolve(&gone_uri).unwrap(), None);
        assert_eq!(index.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_prune_off_the_calling_thread() {
        let dir = tempfile::tempdir().unwrap();
        let index = MediaIndex::open(dir.path().join("media.db")).unwrap();
        let gone = write_png(dir.path(), "gone.png");
        index.register_blocking(&gone).unwrap();
        std::fs::remove_file(&gone).unwrap();

        assert_eq!(index.clone().prune_missing_async().await.unwrap(), 1);
        assert_eq!(index.prune_missing_async().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_registration_replies_once() {
        let dir = tempfile::tempdir().unwrap();
        let index = MediaIndex::open(dir.path().join("media.db")).unwrap();
        let picture = write_png(dir.path(), "1.png");

        let reply = index.request_registration(&picture).await.unwrap();
        let uri = reply.expect("registration should succeed");
        assert_eq!(index.resolve(&uri).unwrap(), Some(picture));

        let reply = index
            .request_registration(&dir.path().join("missing.png"))
            .await
            .unwrap();
        assert_eq!(reply, None);
    }
}
