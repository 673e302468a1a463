use std::path::Path;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::state::data::ExternalUri;

/// External registration of saved files
///
/// Registration turns a raw file path into an opaque reference other
/// consumers can resolve. Implementations answer each request exactly once
/// on the returned channel, whenever they get to it: `Some(uri)` on success,
/// `None` on failure. Dropping the sender without replying also counts as
/// a failure.
pub trait Registrar: Send + Sync + 'static {
    fn request_registration(&self, path: &Path) -> oneshot::Receiver<Option<ExternalUri>>;
}

impl<R: Registrar + ?Sized> Registrar for Arc<R> {
    fn request_registration(&self, path: &Path) -> oneshot::Receiver<Option<ExternalUri>> {
        (**self).request_registration(path)
    }
}
