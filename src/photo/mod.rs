/// Photo loading module
///
/// This module handles:
/// - Resolving photo references (paths, file:// URIs, media index references)
/// - Decoding the photo off the UI thread

pub mod loader;

pub use loader::{load_photo, LoadError, SourceImage};
