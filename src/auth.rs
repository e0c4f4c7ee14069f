use std::sync::Arc;
use tokio::sync::watch;

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::models::{LoginRequest, RegisterUserRequest, Role, UpdateProfileRequest, User};
use crate::notify::Notifier;

/// Session
///
/// The dashboard's belief about who is signed in. `loading` stays set while an identity
/// check is in flight; guards must not act on the other fields until it clears.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub is_authenticated: bool,
    pub user: Option<User>,
    pub loading: bool,
}

impl Session {
    /// The state before the first identity check resolves.
    pub fn pending() -> Self {
        Self {
            is_authenticated: false,
            user: None,
            loading: true,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            is_authenticated: false,
            user: None,
            loading: false,
        }
    }

    pub fn signed_in(user: User) -> Self {
        Self {
            is_authenticated: true,
            user: Some(user),
            loading: false,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|user| user.role)
    }
}

/// SessionStore
///
/// Sole owner of the `Session`. Everyone else reads it through `current()` or a
/// `subscribe()` receiver; only the operations below write to it.
#[derive(Clone)]
pub struct SessionStore {
    api: ApiClient,
    state: Arc<watch::Sender<Session>>,
    notifier: Notifier,
}

impl SessionStore {
    pub fn new(api: ApiClient, notifier: Notifier) -> Self {
        let (state, _) = watch::channel(Session::pending());
        Self {
            api,
            state: Arc::new(state),
            notifier,
        }
    }

    pub fn current(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// refresh
    ///
    /// Re-runs the identity check and overwrites the stored session with its outcome.
    pub async fn refresh(&self) -> Session {
        self.mark_loading();
        let session = self.identify().await;
        self.publish(session.clone());
        session
    }

    /// login
    ///
    /// Exchanges credentials for an access token, installs it on the backend and then
    /// refreshes the session so the stored user comes from `/user/me`.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<Session, ApiError> {
        match self.api.login(credentials).await {
            Ok(reply) => {
                self.api
                    .backend()
                    .set_access_token(Some(reply.access_token));
                self.notifier
                    .success(reply.message.unwrap_or_else(|| "Login successful".to_string()));
                Ok(self.refresh().await)
            }
            Err(err) => {
                tracing::warn!(error = %err, "login failed");
                self.notifier.error(err.user_message("Login failed"));
                Err(err)
            }
        }
    }

    /// logout
    ///
    /// Best effort towards the backend, unconditional locally: whatever the logout call
    /// returns, the token is dropped and the session reset, so the dashboard never keeps
    /// believing it is signed in.
    pub async fn logout(&self) {
        if let Err(err) = self.api.logout().await {
            tracing::warn!(error = %err, "logout call failed; clearing local session anyway");
        }
        self.api.backend().set_access_token(None);
        self.publish(Session::signed_out());
        tracing::info!("session cleared");
    }

    /// update_profile
    ///
    /// Sends the new `name`/`phone`; once the backend accepts them the stored user is
    /// updated in place. Nothing else about the user changes.
    pub async fn update_profile(
        &self,
        name: &str,
        phone: Option<String>,
    ) -> Result<User, ApiError> {
        let Some(user) = self.current().user else {
            let err = ApiError::Validation("Not signed in".to_string());
            self.notifier.error(err.user_message("Failed to update profile"));
            return Err(err);
        };

        let request = UpdateProfileRequest {
            user_id: user.id.clone(),
            name: name.to_string(),
            phone: phone.clone(),
        };

        match self.api.update_profile(&request).await {
            Ok(_) => {
                self.state.send_modify(|session| {
                    if let Some(stored) = session.user.as_mut().filter(|u| u.id == user.id) {
                        stored.name = request.name.clone();
                        stored.phone = phone;
                    }
                });
                self.notifier.success("Profile updated successfully!");
                self.current()
                    .user
                    .ok_or_else(|| ApiError::Validation("Not signed in".to_string()))
            }
            Err(err) => {
                tracing::warn!(error = %err, user_id = %user.id, "profile update failed");
                self.notifier.error(err.user_message("Failed to update profile"));
                Err(err)
            }
        }
    }

    /// register
    ///
    /// Creates a new account. The current session is left alone; the visitor signs in
    /// afterwards.
    pub async fn register(&self, request: &RegisterUserRequest) -> Result<User, ApiError> {
        match self.api.create::<User>(request).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "account registered");
                self.notifier
                    .success("Registration successful! Redirecting to login...");
                Ok(user)
            }
            Err(err) => {
                tracing::warn!(error = %err, "registration failed");
                self.notifier.error(err.user_message("Registration failed"));
                Err(err)
            }
        }
    }

    // --- Bootstrap hooks ---

    pub(crate) fn mark_loading(&self) {
        self.state.send_modify(|session| session.loading = true);
    }

    /// Runs the identity check without touching the store. A failed check or an empty
    /// payload both mean "not signed in"; neither is surfaced to the user.
    pub(crate) async fn identify(&self) -> Session {
        match self.api.me().await {
            Ok(Some(user)) => {
                tracing::info!(user_id = %user.id, role = ?user.role, "identity resolved");
                Session::signed_in(user)
            }
            Ok(None) => {
                tracing::debug!("identity check returned no user");
                Session::signed_out()
            }
            Err(err) => {
                tracing::warn!(error = %err, "identity check failed; treating as signed out");
                Session::signed_out()
            }
        }
    }

    pub(crate) fn publish(&self, session: Session) {
        self.state.send_replace(session);
    }
}
