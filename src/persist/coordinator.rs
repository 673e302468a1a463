/// Save pipeline for composited pictures
///
/// One save attempt moves through:
///
/// ```text
/// Idle -> Writing -> AwaitingRegistration -> Succeeded
///            |                |
///            +----------------+--> Failed(reason)
/// ```
///
/// Writing (path choice, storage checks, PNG encode) runs on tokio's
/// blocking pool. Registration is only requested once the file is closed,
/// and exactly one reply is awaited for it.

use chrono::Utc;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tokio::task;
use tracing::{error, info, warn};

use super::error::SaveError;
use super::registrar::Registrar;
use super::storage::StorageVolume;
use crate::render::CompositeImage;
use crate::state::data::PersistedArtifact;

/// Where a save attempt currently is
#[derive(Debug, Clone, Default)]
pub enum SavePhase {
    #[default]
    Idle,
    Writing,
    AwaitingRegistration,
    Succeeded,
    Failed(SaveError),
}

impl SavePhase {
    /// A save has started and not reached a terminal phase yet
    pub fn is_in_flight(&self) -> bool {
        matches!(self, SavePhase::Writing | SavePhase::AwaitingRegistration)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SavePhase::Idle => "idle",
            SavePhase::Writing => "writing",
            SavePhase::AwaitingRegistration => "awaiting-registration",
            SavePhase::Succeeded => "succeeded",
            SavePhase::Failed(_) => "failed",
        }
    }
}

/// Writes composites to a storage volume and gets them registered
///
/// Holds no per-attempt state, so one coordinator serves any number of
/// consecutive saves. Cloning is cheap.
pub struct PersistenceCoordinator<R> {
    volume: StorageVolume,
    registrar: Arc<R>,
}

impl<R> Clone for PersistenceCoordinator<R> {
    fn clone(&self) -> Self {
        Self {
            volume: self.volume.clone(),
            registrar: Arc::clone(&self.registrar),
        }
    }
}

impl<R: Registrar> PersistenceCoordinator<R> {
    pub fn new(volume: StorageVolume, registrar: R) -> Self {
        Self {
            volume,
            registrar: Arc::new(registrar),
        }
    }

    pub fn volume(&self) -> &StorageVolume {
        &self.volume
    }

    /// Run a whole save attempt
    pub async fn save(&self, image: CompositeImage) -> Result<PersistedArtifact, SaveError> {
        self.save_with_progress(image, |_| {}).await
    }

    /// Run a whole save attempt, reporting every phase it enters
    pub async fn save_with_progress(
        &self,
        image: CompositeImage,
        mut progress: impl FnMut(&SavePhase),
    ) -> Result<PersistedArtifact, SaveError> {
        progress(&SavePhase::Writing);

        let result = match self.write(image).await {
            Ok(written) => {
                progress(&SavePhase::AwaitingRegistration);
                self.register(written).await
            }
            Err(e) => Err(e),
        };

        match &result {
            Ok(_) => progress(&SavePhase::Succeeded),
            Err(e) => progress(&SavePhase::Failed(e.clone())),
        }
        result
    }

    /// Writing phase: encode `image` into a fresh file on the volume
    ///
    /// The returned artifact has its file path but no external reference yet.
    pub async fn write(&self, image: CompositeImage) -> Result<PersistedArtifact, SaveError> {
        let volume = self.volume.clone();
        let save_dir = volume.save_dir();

        let result = task::spawn_blocking(move || {
            write_blocking(&volume, &image, Utc::now().timestamp_millis())
        })
        .await
        .map_err(|e| SaveError::write(save_dir, std::io::Error::other(e.to_string())))?;

        match &result {
            Ok(artifact) => info!("💾 Saved! {}", artifact.file_path.display()),
            Err(e) => error!("❌ Save failed: {}", e),
        }
        result
    }

    /// Registration phase: ask the registrar for a reference and wait for it
    ///
    /// Waits as long as the registrar takes. On failure the file stays on disk.
    pub async fn register(
        &self,
        written: PersistedArtifact,
    ) -> Result<PersistedArtifact, SaveError> {
        info!("🔍 Requesting registration for {}", written.file_path.display());
        let reply = self.registrar.request_registration(&written.file_path);

        // The receiver is consumed here, which releases the channel
        match reply.await {
            Ok(Some(uri)) => {
                info!("✅ Registered {} as {}", written.file_path.display(), uri);
                Ok(written.registered(uri))
            }
            Ok(None) | Err(_) => {
                warn!("⚠️  Registration failed for {}", written.file_path.display());
                Err(SaveError::RegistrationFailed {
                    path: written.file_path,
                })
            }
        }
    }
}

/// Steps 1 to 5 of a save, on a blocking thread
fn write_blocking(
    volume: &StorageVolume,
    image: &CompositeImage,
    unix_millis: i64,
) -> Result<PersistedArtifact, SaveError> {
    let path = volume.destination_for(unix_millis);
    info!("- filename: '{}'", path.display());

    volume.ensure_writable()?;
    volume.ensure_save_dir()?;
    let file = volume.create_destination(&path)?;
    encode_png(file, image, &path)?;

    Ok(PersistedArtifact::written(path))
}

/// Stream `image` as PNG into `file`
///
/// The file is closed on every path. A failed encode leaves whatever was
/// written so far in place.
fn encode_png(file: File, image: &CompositeImage, path: &Path) -> Result<(), SaveError> {
    let mut writer = BufWriter::new(file);
    let pixels = image.pixels();

    PngEncoder::new(&mut writer)
        .write_image(
            pixels.as_raw(),
            pixels.width(),
            pixels.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| SaveError::EncodingError {
            path: path.to_path_buf(),
            source: Arc::new(e),
        })?;

    writer.flush().map_err(|e| SaveError::write(path, e))
}
