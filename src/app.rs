use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;

use crate::{
    api::{HttpApi, ShortenerApi},
    charts::ChartSet,
    collection::UrlCollection,
    config::ClientConfig,
    error::Result,
    models::{AnalyticsSnapshot, CreateUrlInput, ShortUrl},
    session::AuthSession,
    token_store::{FileTokenStore, TokenStore},
    view::{self, ListingState},
};

/// Analytics of one link, as fetched and as charted.
#[derive(Debug, Clone)]
pub struct AnalyticsView {
    pub snapshot: AnalyticsSnapshot,
    pub charts: ChartSet,
}

// ── Shared application state ───────────────────────────────────────────────

/// Controller tying the session and the link collection together.
///
/// Loading is driven by explicit calls here rather than by whichever view
/// happens to be on screen.
pub struct App {
    pub config: ClientConfig,
    pub session: AuthSession,
    pub links: UrlCollection,
}

impl App {
    /// Wire up the HTTP client and the file-backed token store from `config`.
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let api = HttpApi::new(&config)?;
        let store = FileTokenStore::open(&config.token_path).with_context(|| {
            format!(
                "failed to read token file {}",
                config.token_path.display()
            )
        })?;
        Ok(Self::with_parts(config, Arc::new(api), Arc::new(store)))
    }

    pub fn with_parts(
        config: ClientConfig,
        api: Arc<dyn ShortenerApi>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            session: AuthSession::new(api.clone(), store.clone()),
            links: UrlCollection::new(api, store),
            config,
        }
    }

    /// Resolve the stored session, then load links if it is valid.
    pub async fn start(&self) -> Result<()> {
        self.session.load_user().await?;
        self.refresh().await
    }

    /// Log in, then load the user record and links.
    ///
    /// The login response has no user, so `load_user` always follows it.
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        self.session.login(email, password).await?;
        self.session.load_user().await?;
        self.refresh().await
    }

    pub fn logout(&self) {
        self.session.logout();
    }

    /// Re-fetch the link list. A rejected token ends the session.
    ///
    /// A fetch overtaken by a newer one is not an error, whatever its own
    /// response was.
    pub async fn refresh(&self) -> Result<()> {
        let result = self.links.fetch_all().await;
        self.check_auth(result).map(|_| ())
    }

    pub async fn create(&self, input: CreateUrlInput) -> Result<ShortUrl> {
        let result = self.links.create(input).await;
        self.check_auth(result)
    }

    /// Delete a link and resync the list with the server.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let result = self.links.delete_and_resync(id).await;
        self.check_auth(result)
    }

    /// Fetch analytics for `id` and shape them for charts.
    ///
    /// `None` when another analytics fetch was dispatched before this one
    /// settled; that later call owns the view.
    pub async fn open_analytics(&self, id: &str) -> Result<Option<AnalyticsView>> {
        let result = self.links.fetch_analytics(id).await;
        let view = self.check_auth(result)?.applied().map(|snapshot| AnalyticsView {
            charts: ChartSet::from_snapshot(&snapshot),
            snapshot,
        });
        Ok(view)
    }

    /// Short link for `code` under the configured API host.
    pub fn short_link(&self, code: &str) -> String {
        view::short_link(&self.config.api_url, code)
    }

    /// Render the current page of links as plain text lines.
    pub fn listing_lines(&self, listing: &ListingState) -> Vec<String> {
        let state = self.links.snapshot();
        let page = listing.project(&state.items, Utc::now());

        let mut lines: Vec<String> = page
            .rows
            .iter()
            .map(|row| {
                format!(
                    "{:<24} {:<8} {:>6}  {}  {}",
                    row.url.id,
                    row.status.label(),
                    row.url.clicks,
                    self.short_link(&row.url.short_code),
                    row.url.original_url,
                )
            })
            .collect();

        if lines.is_empty() {
            lines.push("No URLs found. Create your first shortened URL!".to_owned());
        } else if page.shows_pager() {
            lines.push(format!(
                "Page {} of {} ({} matching)",
                listing.page(),
                page.total_pages,
                page.matched
            ));
        }
        lines
    }

    fn check_auth<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_auth() {
                self.session
                    .invalidate(e.message_or(crate::session::LOAD_USER_FAILED));
            }
        }
        result
    }
}
