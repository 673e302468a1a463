/// Photo loader
///
/// Turns a photo reference into a decoded RGBA raster. Decoding a
/// full-size camera JPEG takes long enough to stall the window, so the
/// work runs on tokio's blocking pool.

use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task;
use tracing::{debug, info};

use crate::state::data::{ExternalUri, PhotoUri};
use crate::state::media_index::MediaIndex;

/// A decoded photo, shared read-only between the UI and the compositor
#[derive(Debug, Clone)]
pub struct SourceImage {
    uri: PhotoUri,
    pixels: Arc<RgbaImage>,
}

impl SourceImage {
    pub fn new(uri: PhotoUri, pixels: RgbaImage) -> Self {
        Self {
            uri,
            pixels: Arc::new(pixels),
        }
    }

    /// Reference the photo was loaded from
    pub fn uri(&self) -> &PhotoUri {
        &self.uri
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Why a photo couldn't be loaded
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error("photo not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("can't resolve photo reference {uri}")]
    Unresolved { uri: String },

    #[error("can't decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: Arc<image::ImageError>,
    },

    #[error("photo loader stopped: {0}")]
    Worker(String),
}

/// Load and decode the photo behind `uri`
///
/// `content://lolcat/media/<id>` references are looked up in `index`.
pub async fn load_photo(uri: PhotoUri, index: MediaIndex) -> Result<SourceImage, LoadError> {
    task::spawn_blocking(move || load_photo_blocking(uri, &index))
        .await
        .map_err(|e| LoadError::Worker(e.to_string()))?
}

fn load_photo_blocking(uri: PhotoUri, index: &MediaIndex) -> Result<SourceImage, LoadError> {
    let path = resolve_path(&uri, index)?;
    debug!(uri = %uri, path = %path.display(), "resolved photo reference");

    if !path.is_file() {
        return Err(LoadError::NotFound { path });
    }

    let pixels = decode(&path)?;
    info!(
        "📷 Loaded photo {}x{} from {}",
        pixels.width(),
        pixels.height(),
        path.display()
    );

    Ok(SourceImage::new(uri, pixels))
}

/// Map a photo reference to a file on disk
pub fn resolve_path(uri: &PhotoUri, index: &MediaIndex) -> Result<PathBuf, LoadError> {
    let unresolved = || LoadError::Unresolved {
        uri: uri.to_string(),
    };
    let raw = uri.as_str();

    if uri.is_media_reference() {
        let media = ExternalUri::parse(raw).ok_or_else(unresolved)?;
        return match index.resolve(&media) {
            Ok(Some(path)) => Ok(path),
            Ok(None) => Err(unresolved()),
            Err(e) => {
                debug!("media index lookup for {} failed: {}", raw, e);
                Err(unresolved())
            }
        };
    }

    if raw.starts_with("file:") {
        let url = url::Url::parse(raw).map_err(|_| unresolved())?;
        return url.to_file_path().map_err(|()| unresolved());
    }

    // Any other scheme is something we can't open
    if raw.contains("://") {
        return Err(unresolved());
    }

    Ok(PathBuf::from(raw))
}

fn decode(path: &Path) -> Result<RgbaImage, LoadError> {
    let image = image::open(path).map_err(|e| LoadError::Decode {
        path: path.to_path_buf(),
        source: Arc::new(e),
    })?;
    Ok(image.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn write_png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(12, 8, Rgba([200, 100, 50, 255]))
            .save(&path)
            .unwrap();
        path
    }

    fn scratch_index(dir: &Path) -> MediaIndex {
        MediaIndex::open(dir.join("index.db")).unwrap()
    }

    #[tokio::test]
    async fn test_load_plain_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "cat.png");

        let uri = PhotoUri::new(path.to_string_lossy());
        let source = load_photo(uri.clone(), scratch_index(dir.path())).await.unwrap();

        assert_eq!((source.width(), source.height()), (12, 8));
        assert_eq!(source.uri(), &uri);
        assert_eq!(*source.pixels().get_pixel(0, 0), Rgba([200, 100, 50, 255]));
    }

    #[tokio::test]
    async fn test_load_file_uri() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "cat.png");

        let source = load_photo(PhotoUri::from_path(&path), scratch_index(dir.path()))
            .await
            .unwrap();
        assert_eq!(source.width(), 12);
    }

    #[tokio::test]
    async fn test_load_media_reference() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "cat.png");
        let index = scratch_index(dir.path());
        let media = index.register_blocking(&path).unwrap();

        let source = load_photo(media.into(), index).await.unwrap();
        assert_eq!(source.height(), 8);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_photo(
            PhotoUri::new("/nonexistent/path/cat.png"),
            scratch_index(dir.path()),
        )
        .await;
        assert!(matches!(result, Err(LoadError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_garbage_file_fails_to_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_a_cat.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let result = load_photo(PhotoUri::new(path.to_string_lossy()), scratch_index(dir.path())).await;
        assert!(matches!(result, Err(LoadError::Decode { .. })));
    }

    #[test]
    fn test_unknown_references_do_not_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let index = scratch_index(dir.path());

        for raw in [
            "content://lolcat/media/999",
            "content://lolcat/media/nope",
            "https://example.com/cat.png",
        ] {
            let result = resolve_path(&PhotoUri::new(raw), &index);
            assert!(matches!(result, Err(LoadError::Unresolved { .. })), "{raw}");
        }
    }
}
