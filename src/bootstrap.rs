use std::time::Duration;
use tokio::sync::OnceCell;

use crate::auth::{Session, SessionStore};

/// SessionBootstrapper
///
/// Performs the start-up identity check exactly once per dashboard lifetime. Later
/// checks go through `SessionStore::refresh`.
///
/// `splash_delay` is a floor on how long `loading` stays set, so a branding splash can
/// finish; the identity request runs concurrently with it. Zero disables it.
pub struct SessionBootstrapper {
    store: SessionStore,
    splash_delay: Duration,
    ran: OnceCell<()>,
}

impl SessionBootstrapper {
    pub fn new(store: SessionStore, splash_delay: Duration) -> Self {
        Self {
            store,
            splash_delay,
            ran: OnceCell::new(),
        }
    }

    /// run
    ///
    /// Resolves the session. Concurrent and repeated callers share the first run and all
    /// get the store's current value once it has finished.
    pub async fn run(&self) -> Session {
        self.ran
            .get_or_init(|| async {
                let splash_ms = u64::try_from(self.splash_delay.as_millis()).unwrap_or(u64::MAX);
                tracing::debug!(splash_ms, "bootstrapping session");
                self.store.mark_loading();
                let (session, _) = tokio::join!(
                    self.store.identify(),
                    tokio::time::sleep(self.splash_delay)
                );
                tracing::info!(authenticated = session.is_authenticated, "session bootstrapped");
                self.store.publish(session);
            })
            .await;
        self.store.current()
    }

    pub fn has_run(&self) -> bool {
        self.ran.initialized()
    }
}
