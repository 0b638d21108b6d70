//! The `Watcher` port (§6): out-of-scope transports (pub/sub, Redis, …)
//! notify other processes that a policy changed, and re-load on receipt of
//! someone else's change. Only the trait is defined here.

use async_trait::async_trait;

use crate::error::AdapterError;

/// Invoked by the enforcer after a local mutation (unless made through a
/// `self_*` path, which suppresses notification to avoid an echo), and
/// expected to invoke the registered callback when a remote change arrives
/// so the caller can re-load from its [`crate::adapter::Adapter`].
#[async_trait]
pub trait Watcher: Send + Sync {
    /// Registers the callback fired when a remote change notification is
    /// received. Typically wraps "re-run `load_policy` and rebuild role
    /// links".
    fn set_update_callback(&mut self, callback: Box<dyn Fn() + Send + Sync>);

    /// Notifies other watchers that a local mutation just happened.
    async fn update(&self) -> Result<(), AdapterError>;
}
