use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use super::error::SaveError;

/// Directory under the storage root that receives saved pictures
pub const SAVE_DIRECTORY: &str = "lolcats";

/// Extension of saved pictures. Must match the PNG encoder used for them.
pub const SAVED_IMAGE_EXTENSION: &str = ".png";

/// Mime type of saved pictures, for anything that shares them
pub const SAVED_IMAGE_MIME_TYPE: &str = "image/png";

/// What the storage root looks like right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageState {
    /// Present and writable
    Mounted,
    /// Present, but we may only read it
    MountedReadOnly,
    /// Missing, or not a directory
    Unmounted,
}

impl fmt::Display for StorageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StorageState::Mounted => "mounted",
            StorageState::MountedReadOnly => "mounted read-only",
            StorageState::Unmounted => "unmounted",
        };
        f.write_str(label)
    }
}

/// The volume saved pictures go to
///
/// The root itself is never created: if it's gone, the volume is treated
/// as unmounted rather than silently writing somewhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageVolume {
    root: PathBuf,
}

impl StorageVolume {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/lolcats`
    pub fn save_dir(&self) -> PathBuf {
        self.root.join(SAVE_DIRECTORY)
    }

    /// `<root>/lolcats/<unix-millis>.png`
    ///
    /// Two saves within the same millisecond get the same name.
    pub fn destination_for(&self, unix_millis: i64) -> PathBuf {
        self.save_dir()
            .join(format!("{}{}", unix_millis, SAVED_IMAGE_EXTENSION))
    }

    pub fn state(&self) -> StorageState {
        match fs::metadata(&self.root) {
            Ok(meta) if !meta.is_dir() => StorageState::Unmounted,
            Ok(meta) if meta.permissions().readonly() => StorageState::MountedReadOnly,
            Ok(_) => StorageState::Mounted,
            Err(_) => StorageState::Unmounted,
        }
    }

    /// Fail unless the volume is mounted read-write
    pub fn ensure_writable(&self) -> Result<(), SaveError> {
        match self.state() {
            StorageState::Mounted => Ok(()),
            state => Err(SaveError::StorageUnavailable {
                path: self.root.clone(),
                reason: format!("storage is {}", state),
            }),
        }
    }

    /// Create `<root>/lolcats` (and anything between) if needed
    pub fn ensure_save_dir(&self) -> Result<PathBuf, SaveError> {
        if !self.root.is_dir() {
            return Err(SaveError::StorageUnavailable {
                path: self.root.clone(),
                reason: "storage root is missing".to_string(),
            });
        }

        let dir = self.save_dir();
        fs::create_dir_all(&dir).map_err(|e| SaveError::StorageUnavailable {
            path: dir.clone(),
            reason: e.to_string(),
        })?;
        Ok(dir)
    }

    /// Open the destination for writing, creating it if it doesn't exist yet
    pub fn create_destination(&self, path: &Path) -> Result<File, SaveError> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| SaveError::write(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_layout() {
        let volume = StorageVolume::new("/media/sdcard");
        assert_eq!(
            volume.destination_for(1_372_636_800_000),
            PathBuf::from("/media/sdcard/lolcats/1372636800000.png")
        );
    }

    #[test]
    fn test_existing_directory_is_mounted() {
        let dir = tempfile::tempdir().unwrap();
        let volume = StorageVolume::new(dir.path());
        assert_eq!(volume.state(), StorageState::Mounted);
        assert!(volume.ensure_writable().is_ok());
    }

    #[test]
    fn test_missing_root_is_unmounted() {
        let dir = tempfile::tempdir().unwrap();
        let volume = StorageVolume::new(dir.path().join("sdcard"));

        assert_eq!(volume.state(), StorageState::Unmounted);
        assert!(matches!(
            volume.ensure_writable(),
            Err(SaveError::StorageUnavailable { .. })
        ));
        assert!(matches!(
            volume.ensure_save_dir(),
            Err(SaveError::StorageUnavailable { .. })
        ));
        // The mount point itself is never created
        assert!(!dir.path().join("sdcard").exists());
    }

    #[test]
    fn test_plain_file_root_is_unmounted() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("sdcard");
        fs::write(&file, b"").unwrap();

        assert_eq!(StorageVolume::new(&file).state(), StorageState::Unmounted);
    }

    #[test]
    fn test_read_only_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut perms = fs::metadata(dir.path()).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(dir.path(), perms.clone()).unwrap();

        let volume = StorageVolume::new(dir.path());
        let state = volume.state();
        let writable = volume.ensure_writable();

        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);
        fs::set_permissions(dir.path(), perms).unwrap();

        assert_eq!(state, StorageState::MountedReadOnly);
        assert!(matches!(writable, Err(SaveError::StorageUnavailable { .. })));
    }

    #[test]
    fn test_destination_that_is_a_directory_cannot_be_created() {
        let dir = tempfile::tempdir().unwrap();
        let volume = StorageVolume::new(dir.path());
        let taken = volume.ensure_save_dir().unwrap().join("1.png");
        fs::create_dir(&taken).unwrap();

        match volume.create_destination(&taken) {
            Err(SaveError::WriteError { path, .. }) => assert_eq!(path, taken),
            other => panic!("expected a write error, got {:?}", other.map(|_| ())),
        }
        assert!(taken.is_dir());
    }

    #[test]
    fn test_save_dir_is_created_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let volume = StorageVolume::new(dir.path());

        let save_dir = volume.ensure_save_dir().unwrap();
        assert_eq!(save_dir, dir.path().join("lolcats"));
        assert!(save_dir.is_dir());

        // Second call is a no-op
        assert!(volume.ensure_save_dir().is_ok());
    }
}
