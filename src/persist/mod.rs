/// Persistence pipeline
///
/// This module handles:
/// - Checking the storage volume before anything is written
/// - Encoding composites as PNG into `<storage-root>/lolcats/`
/// - Handing the written file to the registrar and waiting for its reply

pub mod coordinator;
pub mod error;
pub mod registrar;
pub mod storage;

pub use coordinator::{PersistenceCoordinator, SavePhase};
pub use error::SaveError;
pub use registrar::Registrar;
pub use storage::StorageVolume;
