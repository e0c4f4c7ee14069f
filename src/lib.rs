use std::sync::Arc;
use tokio::sync::watch;

// --- Module Structure ---

// Configuration, errors and wire models.
pub mod config;
pub mod error;
pub mod models;

// Transport and the typed endpoint layer on top of it.
pub mod api;
pub mod backend;

// Session ownership, start-up check and access control.
pub mod auth;
pub mod bootstrap;
pub mod guard;

// Navigation split by audience (public, admin, user).
pub mod routes;

// The repeated list/create/update/delete surface.
pub mod notify;
pub mod panel;
pub mod resource;

// --- Public Re-exports ---

pub use api::{ApiClient, Page};
pub use auth::{Session, SessionStore};
pub use backend::{Backend, BackendState, HttpBackend, MockBackend};
pub use bootstrap::SessionBootstrapper;
pub use config::{AppConfig, Env};
pub use error::{ApiError, ConfigError};
pub use guard::{GuardDecision, GuardState, RouteGuard};
pub use notify::{Notice, Notifier};
pub use panel::{Outcome, Pagination, ResourcePanel};
pub use resource::{Creatable, ListScope, Resource, ResourceKind, Updatable};
pub use routes::{Layout, NavLink, Shell};

/// Dashboard
///
/// The single context object of a running dashboard: configuration, the shared backend
/// handle, the session store and its bootstrapper. Components receive what they need
/// from it instead of reaching for globals.
///
/// Lifecycle: `new` (or `connect`) at start, `start` to run the identity check, and
/// `shutdown` at teardown, which aborts every panel opened through `panel`.
pub struct Dashboard {
    config: AppConfig,
    api: ApiClient,
    session: SessionStore,
    bootstrapper: SessionBootstrapper,
    notifier: Notifier,
    shutdown: watch::Sender<bool>,
}

impl Dashboard {
    pub fn new(config: AppConfig, backend: BackendState, notifier: Notifier) -> Self {
        let api = ApiClient::new(backend);
        let session = SessionStore::new(api.clone(), notifier.clone());
        let bootstrapper = SessionBootstrapper::new(session.clone(), config.splash_delay);
        let (shutdown, _) = watch::channel(false);

        Self {
            config,
            api,
            session,
            bootstrapper,
            notifier,
            shutdown,
        }
    }

    /// connect
    ///
    /// Builds a dashboard talking HTTP to `config.api_url`.
    pub fn connect(config: AppConfig, notifier: Notifier) -> Result<Self, ApiError> {
        let backend = HttpBackend::new(&config.api_url, config.request_timeout)?;
        Ok(Self::new(config, Arc::new(backend), notifier))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// start
    ///
    /// Runs the start-up identity check (once per dashboard) and returns the session.
    pub async fn start(&self) -> Session {
        self.bootstrapper.run().await
    }

    pub fn route_guard(&self) -> RouteGuard {
        RouteGuard::new(self.config.login_path.clone())
    }

    /// panel
    ///
    /// Opens a panel for `R` sized from the configured page limits and tied to this
    /// dashboard's shutdown signal.
    pub fn panel<R: Resource>(&self, scope: ListScope) -> ResourcePanel<R> {
        let limits = self.config.page_limits;
        let limit = match R::KIND {
            ResourceKind::Blog => limits.blogs,
            ResourceKind::Project => limits.projects,
            ResourceKind::Message => limits.messages,
            ResourceKind::User => limits.users,
        };
        self.panel_with_limit(scope, limit)
    }

    pub fn panel_with_limit<R: Resource>(&self, scope: ListScope, limit: u32) -> ResourcePanel<R> {
        ResourcePanel::with_shutdown(
            self.api.clone(),
            scope,
            limit,
            self.notifier.clone(),
            self.shutdown.subscribe(),
        )
    }

    /// shutdown
    ///
    /// Tears down every panel opened from this dashboard. Idempotent.
    pub fn shutdown(&self) {
        if !self.shutdown.send_replace(true) {
            tracing::info!("dashboard shut down");
        }
    }
}
