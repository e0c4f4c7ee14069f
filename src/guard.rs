use tokio::sync::watch;

use crate::auth::Session;
use crate::models::User;
use crate::routes::Layout;

/// GuardState
///
/// `Pending` until the identity check resolves. `Denied` holds until the next bootstrap
/// or refresh starts; `Granted` holds until the session is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Pending,
    Denied,
    Granted,
}

/// GuardDecision
///
/// What the protected area should do for the session it was shown.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardDecision {
    /// Render the blocking loading indicator. Never accompanied by a redirect.
    Loading,
    /// Navigate to the login entry point. Issued once per entry into `Denied`.
    Redirect { to: String },
    /// Still denied; the redirect has already been issued.
    Denied,
    /// Render the protected content inside this layout.
    Granted { layout: Layout, user: User },
}

/// RouteGuard
///
/// Wraps the dashboard. Feed it every session value it should react to (`observe`) or let
/// it follow the store directly (`resolve`).
#[derive(Debug)]
pub struct RouteGuard {
    state: GuardState,
    login_path: String,
    granted: Option<User>,
    redirects: usize,
}

impl RouteGuard {
    pub fn new(login_path: impl Into<String>) -> Self {
        Self {
            state: GuardState::Pending,
            login_path: login_path.into(),
            granted: None,
            redirects: 0,
        }
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    /// How many redirects this guard has issued.
    pub fn redirects(&self) -> usize {
        self.redirects
    }

    /// observe
    ///
    /// Advances the state machine with one session value.
    pub fn observe(&mut self, session: &Session) -> GuardDecision {
        if session.loading {
            // A refresh under an already granted session keeps the content on screen.
            if self.state == GuardState::Granted {
                if let Some(user) = &self.granted {
                    return GuardDecision::Granted {
                        layout: Layout::for_role(user.role),
                        user: user.clone(),
                    };
                }
            }
            self.state = GuardState::Pending;
            return GuardDecision::Loading;
        }

        match session.user.as_ref().filter(|_| session.is_authenticated) {
            Some(user) => {
                if self.state != GuardState::Granted {
                    tracing::debug!(user_id = %user.id, role = ?user.role, "route guard granted");
                }
                self.state = GuardState::Granted;
                self.granted = Some(user.clone());
                GuardDecision::Granted {
                    layout: Layout::for_role(user.role),
                    user: user.clone(),
                }
            }
            None if self.state == GuardState::Denied => GuardDecision::Denied,
            None => {
                self.state = GuardState::Denied;
                self.granted = None;
                self.redirects += 1;
                tracing::info!(to = %self.login_path, "route guard denied; redirecting");
                GuardDecision::Redirect {
                    to: self.login_path.clone(),
                }
            }
        }
    }

    /// resolve
    ///
    /// Waits on the store until the session is no longer loading and returns the first
    /// non-loading decision. Returns `Loading` only if the store went away mid-check.
    pub async fn resolve(&mut self, sessions: &mut watch::Receiver<Session>) -> GuardDecision {
        loop {
            let session = sessions.borrow_and_update().clone();
            let decision = self.observe(&session);
            if decision != GuardDecision::Loading {
                return decision;
            }
            if sessions.changed().await.is_err() {
                return decision;
            }
        }
    }
}
