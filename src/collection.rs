use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    api::ShortenerApi,
    error::Result,
    models::{AnalyticsSnapshot, CreateUrlInput, ShortUrl},
    sequence::{InFlight, Sequencer, Settled},
    token_store::TokenStore,
};

pub const FETCH_FAILED: &str = "Error fetching URLs";
pub const CREATE_FAILED: &str = "Error creating URL";
pub const DELETE_FAILED: &str = "Error deleting URL";
pub const ANALYTICS_FAILED: &str = "Error fetching analytics";

/// The user's links plus the analytics snapshot of the link being viewed.
///
/// `items` keeps the server's order, with newly created links in front.
/// `analytics` is replaced whole on every successful fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlCollectionState {
    pub items: Vec<ShortUrl>,
    pub analytics: Option<AnalyticsSnapshot>,
    pub loading: bool,
    pub error: Option<String>,
}

/// CRUD state machine over the signed-in user's links.
///
/// Every operation sets `loading` while its call is pending. A rejected call
/// stores its message in `error` and leaves `items` and `analytics`
/// untouched.
pub struct UrlCollection {
    api: Arc<dyn ShortenerApi>,
    credentials: Arc<dyn TokenStore>,
    state: watch::Sender<UrlCollectionState>,
    items_seq: Sequencer,
    analytics_seq: Sequencer,
    in_flight: InFlight,
}

impl UrlCollection {
    pub fn new(api: Arc<dyn ShortenerApi>, credentials: Arc<dyn TokenStore>) -> Self {
        let (state, _) = watch::channel(UrlCollectionState::default());
        Self {
            api,
            credentials,
            state,
            items_seq: Sequencer::new(),
            analytics_seq: Sequencer::new(),
            in_flight: InFlight::default(),
        }
    }

    pub fn snapshot(&self) -> UrlCollectionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<UrlCollectionState> {
        self.state.subscribe()
    }

    /// Replace `items` with the server's list.
    ///
    /// Ignored if a newer fetch was dispatched, or a create/delete landed,
    /// while this one was pending. A superseded call yields
    /// [`Settled::Superseded`] even if its own request failed.
    pub async fn fetch_all(&self) -> Result<Settled<()>> {
        let ticket = self.items_seq.issue();
        self.begin();
        let token = self.credentials.get();

        let result = self.api.list_urls(token.as_deref()).await;
        let current = self.items_seq.is_current(ticket);

        match result {
            Ok(items) if current => {
                tracing::debug!(count = items.len(), "Fetched links");
                self.settle(|s| {
                    s.items = items;
                    s.error = None;
                });
                Ok(Settled::Applied(()))
            }
            Err(e) if current => {
                tracing::warn!("Fetching links failed: {}", e);
                let message = e.message_or(FETCH_FAILED);
                self.settle(|s| s.error = Some(message));
                Err(e)
            }
            _ => {
                tracing::warn!("Discarding superseded link list");
                self.settle(|_| {});
                Ok(Settled::Superseded)
            }
        }
    }

    /// Create a link and put it at the front of `items`.
    ///
    /// Input is validated locally first; invalid input is rejected without
    /// a request.
    pub async fn create(&self, input: CreateUrlInput) -> Result<ShortUrl> {
        self.begin();

        let result = match input.validate() {
            Ok(()) => {
                let token = self.credentials.get();
                self.api.create_url(token.as_deref(), &input).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(url) => {
                tracing::info!(code = %url.short_code, "Link created");
                // Any list fetched before this point may lack the new link
                self.items_seq.invalidate();
                let created = url.clone();
                self.settle(|s| {
                    s.items.retain(|item| item.id != created.id);
                    s.items.insert(0, created);
                    s.error = None;
                });
                Ok(url)
            }
            Err(e) => {
                tracing::warn!("Creating link failed: {}", e);
                let message = e.message_or(CREATE_FAILED);
                self.settle(|s| s.error = Some(message));
                Err(e)
            }
        }
    }

    /// Delete a link and drop it from `items`.
    ///
    /// Callers must follow up with [`fetch_all`](Self::fetch_all) to resync
    /// with the server; [`delete_and_resync`](Self::delete_and_resync) does both.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.begin();
        let token = self.credentials.get();

        let result = self.api.delete_url(token.as_deref(), id).await;

        match result {
            Ok(()) => {
                tracing::info!(%id, "Link deleted");
                self.items_seq.invalidate();
                self.settle(|s| {
                    if let Some(pos) = s.items.iter().position(|item| item.id == id) {
                        s.items.remove(pos);
                    }
                    s.error = None;
                });
                Ok(())
            }
            Err(e) => {
                tracing::warn!(%id, "Deleting link failed: {}", e);
                let message = e.message_or(DELETE_FAILED);
                self.settle(|s| s.error = Some(message));
                Err(e)
            }
        }
    }

    /// Delete, then re-fetch the full list. The re-fetch only runs if the
    /// delete succeeded.
    pub async fn delete_and_resync(&self, id: &str) -> Result<()> {
        self.delete(id).await?;
        self.fetch_all().await.map(|_| ())
    }

    /// Load analytics for one link, replacing any previous snapshot.
    ///
    /// Returns the snapshot this call stored, so callers never have to read
    /// it back out of the shared slot.
    pub async fn fetch_analytics(&self, id: &str) -> Result<Settled<AnalyticsSnapshot>> {
        let ticket = self.analytics_seq.issue();
        self.begin();
        let token = self.credentials.get();

        let result = self.api.url_analytics(token.as_deref(), id).await;
        let current = self.analytics_seq.is_current(ticket);

        match result {
            Ok(snapshot) if current => {
                tracing::debug!(%id, "Fetched analytics");
                let stored = snapshot.clone();
                self.settle(|s| {
                    s.analytics = Some(stored);
                    s.error = None;
                });
                Ok(Settled::Applied(snapshot))
            }
            Err(e) if current => {
                tracing::warn!(%id, "Fetching analytics failed: {}", e);
                let message = e.message_or(ANALYTICS_FAILED);
                self.settle(|s| s.error = Some(message));
                Err(e)
            }
            _ => {
                tracing::warn!(%id, "Discarding superseded analytics");
                self.settle(|_| {});
                Ok(Settled::Superseded)
            }
        }
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.error = None);
    }

    // ── Private helpers ────────────────────────────────────────────────────

    fn begin(&self) {
        self.in_flight.start();
        self.state.send_modify(|s| s.loading = true);
    }

    /// Apply the outcome of one call and recompute `loading`.
    fn settle(&self, apply: impl FnOnce(&mut UrlCollectionState)) {
        let still_loading = self.in_flight.finish();
        self.state.send_modify(|s| {
            apply(s);
            s.loading = still_loading;
        });
    }
}
