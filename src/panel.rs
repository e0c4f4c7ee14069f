use parking_lot::Mutex;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::models::{UpdateUserRequest, User};
use crate::notify::Notifier;
use crate::resource::{Creatable, ListScope, Resource, Updatable};

/// Pagination
///
/// Cursor over a paginated collection. After every applied list
/// `total_pages == ceil(total / limit)` and `1 <= page <= max(total_pages, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl Pagination {
    pub fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit: limit.max(1),
            total_pages: 0,
        }
    }

    pub fn pages_for(total: u64, limit: u32) -> u32 {
        let limit = u64::from(limit.max(1));
        u32::try_from(total.div_ceil(limit)).unwrap_or(u32::MAX)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Outcome
///
/// How a panel action ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The server confirmed and the local list now reflects it.
    Applied,
    /// Prev/Next at a boundary; nothing was requested.
    Unchanged,
    /// The user did not confirm a delete; nothing was requested.
    Declined,
    /// The same item already has an update or delete in flight.
    Duplicate,
    /// A newer list request was issued meanwhile; this response was dropped.
    Discarded,
}

struct PanelState<R: Resource> {
    items: Vec<R>,
    pagination: Pagination,
    loading: bool,
    // Bumped for every list request; only the latest one may write `items`.
    generation: u64,
    in_flight: HashSet<R::Id>,
}

struct PanelInner<R: Resource> {
    api: ApiClient,
    scope: ListScope,
    notifier: Notifier,
    state: Mutex<PanelState<R>>,
    closer: watch::Sender<bool>,
    parent: Option<watch::Receiver<bool>>,
}

/// ResourcePanel
///
/// The list/create/update/delete surface for one backend collection. The panel caches
/// a single page; page navigation refetches it, and item mutations are applied to the
/// cache only after the server confirms them. Clones share the same panel.
///
/// Closing the panel (or its owner's shutdown signal) aborts in-flight requests; their
/// responses never reach the cache.
pub struct ResourcePanel<R: Resource> {
    inner: Arc<PanelInner<R>>,
}

impl<R: Resource> Clone for ResourcePanel<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Resource> ResourcePanel<R> {
    pub fn new(api: ApiClient, scope: ListScope, limit: u32, notifier: Notifier) -> Self {
        Self::build(api, scope, limit, notifier, None)
    }

    /// Like `new`, but the panel also closes when `shutdown` flips to `true`.
    pub fn with_shutdown(
        api: ApiClient,
        scope: ListScope,
        limit: u32,
        notifier: Notifier,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self::build(api, scope, limit, notifier, Some(shutdown))
    }

    fn build(
        api: ApiClient,
        scope: ListScope,
        limit: u32,
        notifier: Notifier,
        parent: Option<watch::Receiver<bool>>,
    ) -> Self {
        let (closer, _) = watch::channel(false);
        Self {
            inner: Arc::new(PanelInner {
                api,
                scope,
                notifier,
                state: Mutex::new(PanelState {
                    items: Vec::new(),
                    pagination: Pagination::new(limit),
                    loading: false,
                    generation: 0,
                    in_flight: HashSet::new(),
                }),
                closer,
                parent,
            }),
        }
    }

    // --- Read Access ---

    pub fn items(&self) -> Vec<R> {
        self.inner.state.lock().items.clone()
    }

    pub fn pagination(&self) -> Pagination {
        self.inner.state.lock().pagination
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.lock().loading
    }

    pub fn scope(&self) -> ListScope {
        self.inner.scope
    }

    pub fn is_closed(&self) -> bool {
        *self.inner.closer.borrow() || self.inner.parent.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// close
    ///
    /// Tears the panel down. Pending requests resolve to `ApiError::Cancelled`.
    pub fn close(&self) {
        self.inner.closer.send_replace(true);
    }

    // --- List & Pagination ---

    /// list
    ///
    /// Fetches `page` and replaces the cached list with it. A failure leaves the list and
    /// cursor exactly as they were.
    pub async fn list(&self, page: u32) -> Result<Outcome, ApiError> {
        if self.is_closed() {
            return Err(ApiError::Cancelled);
        }
        let page = page.max(1);
        let (generation, limit) = {
            let mut state = self.inner.state.lock();
            state.generation += 1;
            state.loading = true;
            (state.generation, state.pagination.limit)
        };

        let result = self
            .guarded(self.inner.api.list::<R>(self.inner.scope, page, limit))
            .await;

        let mut state = self.inner.state.lock();
        if state.generation != generation {
            tracing::debug!(kind = ?R::KIND, generation, latest = state.generation, "discarding stale list response");
            return Ok(Outcome::Discarded);
        }
        state.loading = false;

        match result {
            Ok(_) if self.is_closed() => Err(ApiError::Cancelled),
            Ok(fetched) => {
                let total_pages = if fetched.paginated {
                    Pagination::pages_for(fetched.total, limit)
                } else {
                    // Unpaginated endpoints hand back everything at once.
                    u32::from(fetched.total > 0)
                };
                state.pagination.total_pages = total_pages;
                state.pagination.page = page.min(total_pages.max(1));
                state.items = fetched.items;
                tracing::debug!(kind = ?R::KIND, page, total = fetched.total, total_pages, "page loaded");
                Ok(Outcome::Applied)
            }
            Err(err) if err.is_cancelled() => Err(err),
            Err(err) => {
                drop(state);
                tracing::warn!(kind = ?R::KIND, page, error = %err, "list failed");
                self.inner
                    .notifier
                    .error(err.user_message(&format!("Failed to fetch {}s", R::LABEL.to_lowercase())));
                Err(err)
            }
        }
    }

    /// Re-fetches the current page.
    pub async fn reload(&self) -> Result<Outcome, ApiError> {
        let page = self.pagination().page;
        self.list(page).await
    }

    pub async fn prev(&self) -> Result<Outcome, ApiError> {
        let pagination = self.pagination();
        if !pagination.has_prev() {
            return Ok(Outcome::Unchanged);
        }
        self.list(pagination.page - 1).await
    }

    pub async fn next(&self) -> Result<Outcome, ApiError> {
        let pagination = self.pagination();
        if !pagination.has_next() {
            return Ok(Outcome::Unchanged);
        }
        self.list(pagination.page + 1).await
    }

    // --- Removal ---

    /// delete
    ///
    /// Asks `confirm` first; only a confirmed delete is sent. On success the item leaves
    /// the local list.
    pub async fn delete<F>(&self, id: &R::Id, confirm: F) -> Result<Outcome, ApiError>
    where
        F: FnOnce(&str) -> bool,
    {
        if self.is_closed() {
            return Err(ApiError::Cancelled);
        }
        let prompt = format!(
            "Are you sure you want to delete this {}?",
            R::LABEL.to_lowercase()
        );
        if !confirm(&prompt) {
            return Ok(Outcome::Declined);
        }
        let Some(_claim) = self.claim(id) else {
            tracing::debug!(kind = ?R::KIND, %id, "delete already in flight; ignoring");
            return Ok(Outcome::Duplicate);
        };

        let result = self.guarded(self.inner.api.delete::<R>(id)).await;

        match result {
            Ok(()) if self.is_closed() => Err(ApiError::Cancelled),
            Ok(()) => {
                self.inner
                    .state
                    .lock()
                    .items
                    .retain(|item| item.id() != id);
                tracing::info!(kind = ?R::KIND, %id, "item deleted");
                self.inner
                    .notifier
                    .success(format!("{} deleted successfully", R::LABEL));
                Ok(Outcome::Applied)
            }
            Err(err) => Err(self.surface(err, "delete")),
        }
    }

    // --- Internals ---

    /// Races `request` against the panel's teardown signals.
    async fn guarded<T>(
        &self,
        request: impl Future<Output = Result<T, ApiError>>,
    ) -> Result<T, ApiError> {
        let own = self.inner.closer.subscribe();
        let parent = self.inner.parent.clone();
        tokio::select! {
            biased;
            _ = closed(Some(own)) => Err(ApiError::Cancelled),
            _ = closed(parent) => Err(ApiError::Cancelled),
            result = request => result,
        }
    }

    /// Marks `id` busy until the returned claim drops; `None` if it already is.
    fn claim(&self, id: &R::Id) -> Option<Claim<R>> {
        let fresh = self.inner.state.lock().in_flight.insert(id.clone());
        fresh.then(|| Claim {
            inner: Arc::clone(&self.inner),
            id: id.clone(),
        })
    }

    fn surface(&self, err: ApiError, action: &str) -> ApiError {
        if !err.is_cancelled() {
            tracing::warn!(kind = ?R::KIND, action, error = %err, "panel action failed");
            self.inner.notifier.error(err.user_message(&format!(
                "Failed to {action} {}",
                R::LABEL.to_lowercase()
            )));
        }
        err
    }
}

impl<R: Creatable> ResourcePanel<R> {
    /// create
    ///
    /// Validates and sends `fields`; the server's item (with its assigned id) goes to the
    /// head of the local list.
    pub async fn create(&self, fields: R::Create) -> Result<R, ApiError> {
        if self.is_closed() {
            return Err(ApiError::Cancelled);
        }
        let result = self.guarded(self.inner.api.create::<R>(&fields)).await;

        match result {
            Ok(_) if self.is_closed() => Err(ApiError::Cancelled),
            Ok(item) => {
                self.inner.state.lock().items.insert(0, item.clone());
                tracing::info!(kind = ?R::KIND, id = %item.id(), "item created");
                self.inner
                    .notifier
                    .success(format!("{} created successfully", R::LABEL));
                Ok(item)
            }
            Err(err) => Err(self.surface(err, "create")),
        }
    }
}

impl<R: Updatable> ResourcePanel<R> {
    /// update
    ///
    /// Sends a partial update for `id` and swaps the server's copy into the local list.
    pub async fn update(&self, id: &R::Id, fields: R::Update) -> Result<Outcome, ApiError> {
        if self.is_closed() {
            return Err(ApiError::Cancelled);
        }
        let Some(_claim) = self.claim(id) else {
            tracing::debug!(kind = ?R::KIND, %id, "update already in flight; ignoring");
            return Ok(Outcome::Duplicate);
        };

        let result = self.guarded(self.inner.api.update::<R>(id, &fields)).await;

        match result {
            Ok(_) if self.is_closed() => Err(ApiError::Cancelled),
            Ok(updated) => {
                {
                    let mut state = self.inner.state.lock();
                    if let Some(slot) = state.items.iter_mut().find(|item| item.id() == id) {
                        *slot = updated;
                    }
                }
                tracing::info!(kind = ?R::KIND, %id, "item updated");
                self.inner
                    .notifier
                    .success(format!("{} updated successfully", R::LABEL));
                Ok(Outcome::Applied)
            }
            Err(err) => Err(self.surface(err, "update")),
        }
    }
}

impl ResourcePanel<User> {
    /// toggle_status
    ///
    /// Flips a listed user between `ACTIVE` and `INACTIVE`.
    pub async fn toggle_status(&self, id: &str) -> Result<Outcome, ApiError> {
        let current = self
            .items()
            .into_iter()
            .find(|user| user.id == id)
            .map(|user| user.status)
            .ok_or_else(|| ApiError::Validation(format!("User {id} is not on this page")))?;

        self.update(
            &id.to_string(),
            UpdateUserRequest {
                status: Some(current.toggled()),
                ..Default::default()
            },
        )
        .await
    }
}

struct Claim<R: Resource> {
    inner: Arc<PanelInner<R>>,
    id: R::Id,
}

impl<R: Resource> Drop for Claim<R> {
    fn drop(&mut self) {
        self.inner.state.lock().in_flight.remove(&self.id);
    }
}

/// Resolves once the signal reads `true` or its sender is gone. Never resolves for `None`.
async fn closed(signal: Option<watch::Receiver<bool>>) {
    match signal {
        Some(mut rx) => {
            let _ = rx.wait_for(|closed| *closed).await;
        }
        None => std::future::pending::<()>().await,
    }
}
