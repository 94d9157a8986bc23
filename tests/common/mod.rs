//! In-memory stand-ins for the shortener API and the token store.

#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    io,
    num::NonZeroUsize,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::oneshot;

use linkly_client::{
    api::ShortenerApi,
    error::{ApiError, Result},
    models::{AnalyticsSnapshot, Breakdown, ClicksOnDate, CreateUrlInput, ShortUrl, User},
    token_store::{MemoryTokenStore, TokenStore},
    ClientConfig,
};

pub const EMAIL: &str = "ada@example.com";
pub const PASSWORD: &str = "hunter2";
pub const TOKEN: &str = "valid-token";

pub fn user() -> User {
    User {
        id: "u1".into(),
        email: EMAIL.into(),
        name: Some("Ada".into()),
    }
}

pub fn url(id: &str, original: &str, code: &str) -> ShortUrl {
    ShortUrl {
        id: id.into(),
        original_url: original.into(),
        short_code: code.into(),
        clicks: 0,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        expires_at: None,
    }
}

pub fn analytics_for(url: &ShortUrl) -> AnalyticsSnapshot {
    AnalyticsSnapshot {
        url: url.clone(),
        clicks_over_time: vec![ClicksOnDate {
            date: "2024-01-01".into(),
            clicks: url.clicks,
        }],
        device_breakdown: vec![
            Breakdown {
                category: "mobile".into(),
                count: 3,
            },
            Breakdown {
                category: "desktop".into(),
                count: 5,
            },
        ],
        browser_breakdown: vec![Breakdown {
            category: "Firefox".into(),
            count: 8,
        }],
    }
}

pub fn config() -> ClientConfig {
    ClientConfig {
        api_url: "http://localhost:5000".into(),
        token_path: "unused".into(),
        page_size: NonZeroUsize::new(5).unwrap(),
        request_timeout: Duration::from_secs(1),
    }
}

// ── Fake API ───────────────────────────────────────────────────────────────

/// Operation names used for failure injection and call counting.
pub mod op {
    pub const USER: &str = "current_user";
    pub const LOGIN: &str = "login";
    pub const LIST: &str = "list_urls";
    pub const CREATE: &str = "create_url";
    pub const DELETE: &str = "delete_url";
    pub const ANALYTICS: &str = "url_analytics";
}

/// Server double. Holds its own copy of the link list so resyncs can observe
/// changes made "elsewhere".
#[derive(Default)]
pub struct FakeApi {
    pub server_urls: Mutex<Vec<ShortUrl>>,
    failures: Mutex<HashMap<&'static str, ApiError>>,
    calls: Mutex<Vec<(&'static str, Option<String>)>>,
    user_gates: Mutex<VecDeque<oneshot::Receiver<Result<User>>>>,
    login_gates: Mutex<VecDeque<oneshot::Receiver<Result<String>>>>,
    list_gates: Mutex<VecDeque<oneshot::Receiver<Result<Vec<ShortUrl>>>>>,
    analytics_gates: Mutex<VecDeque<oneshot::Receiver<Result<AnalyticsSnapshot>>>>,
    create_replies: Mutex<VecDeque<ShortUrl>>,
    next_id: Mutex<u32>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_urls(urls: Vec<ShortUrl>) -> Arc<Self> {
        let api = Self::default();
        *api.server_urls.lock().unwrap() = urls;
        Arc::new(api)
    }

    /// Make every later call to `op` fail with `err`.
    pub fn fail(&self, op: &'static str, err: ApiError) {
        self.failures.lock().unwrap().insert(op, err);
    }

    pub fn heal(&self, op: &'static str) {
        self.failures.lock().unwrap().remove(op);
    }

    pub fn calls(&self, op: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| *name == op)
            .count()
    }

    /// Tokens presented, in call order.
    pub fn tokens(&self) -> Vec<Option<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, token)| token.clone())
            .collect()
    }

    /// The next `current_user` call waits for the returned sender.
    pub fn gate_user(&self) -> oneshot::Sender<Result<User>> {
        let (tx, rx) = oneshot::channel();
        self.user_gates.lock().unwrap().push_back(rx);
        tx
    }

    pub fn gate_login(&self) -> oneshot::Sender<Result<String>> {
        let (tx, rx) = oneshot::channel();
        self.login_gates.lock().unwrap().push_back(rx);
        tx
    }

    pub fn gate_list(&self) -> oneshot::Sender<Result<Vec<ShortUrl>>> {
        let (tx, rx) = oneshot::channel();
        self.list_gates.lock().unwrap().push_back(rx);
        tx
    }

    pub fn gate_analytics(&self) -> oneshot::Sender<Result<AnalyticsSnapshot>> {
        let (tx, rx) = oneshot::channel();
        self.analytics_gates.lock().unwrap().push_back(rx);
        tx
    }

    /// The next `create_url` call answers with `url` as-is.
    pub fn reply_to_create(&self, url: ShortUrl) {
        self.create_replies.lock().unwrap().push_back(url);
    }

    fn record(&self, op: &'static str, token: Option<&str>) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((op, token.map(str::to_owned)));
        match self.failures.lock().unwrap().get(op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn require_token(token: Option<&str>) -> Result<()> {
        match token {
            Some(TOKEN) => Ok(()),
            _ => Err(ApiError::Auth {
                message: Some("Token is not valid".into()),
            }),
        }
    }
}

async fn wait<T>(gate: Option<oneshot::Receiver<Result<T>>>) -> Option<Result<T>> {
    match gate {
        Some(rx) => Some(rx.await.expect("gate sender dropped")),
        None => None,
    }
}

#[async_trait]
impl ShortenerApi for FakeApi {
    async fn current_user(&self, token: Option<&str>) -> Result<User> {
        self.record(op::USER, token)?;
        let gate = self.user_gates.lock().unwrap().pop_front();
        if let Some(result) = wait(gate).await {
            return result;
        }
        Self::require_token(token)?;
        Ok(user())
    }

    async fn login(&self, email: &str, password: &str) -> Result<String> {
        self.record(op::LOGIN, None)?;
        let gate = self.login_gates.lock().unwrap().pop_front();
        if let Some(result) = wait(gate).await {
            return result;
        }
        if email == EMAIL && password == PASSWORD {
            Ok(TOKEN.into())
        } else {
            Err(ApiError::Auth {
                message: Some("Invalid Credentials".into()),
            })
        }
    }

    async fn list_urls(&self, token: Option<&str>) -> Result<Vec<ShortUrl>> {
        self.record(op::LIST, token)?;
        let gate = self.list_gates.lock().unwrap().pop_front();
        if let Some(result) = wait(gate).await {
            return result;
        }
        Self::require_token(token)?;
        Ok(self.server_urls.lock().unwrap().clone())
    }

    async fn create_url(&self, token: Option<&str>, input: &CreateUrlInput) -> Result<ShortUrl> {
        self.record(op::CREATE, token)?;
        Self::require_token(token)?;
        if let Some(reply) = self.create_replies.lock().unwrap().pop_front() {
            return Ok(reply);
        }

        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            format!("new-{}", *next)
        };
        let code = input
            .custom_alias
            .clone()
            .unwrap_or_else(|| format!("gen{id}"));
        let mut created = url(&id, &input.original_url, &code);
        created.expires_at = input.expiration_date;

        self.server_urls.lock().unwrap().insert(0, created.clone());
        Ok(created)
    }

    async fn delete_url(&self, token: Option<&str>, id: &str) -> Result<()> {
        self.record(op::DELETE, token)?;
        Self::require_token(token)?;

        let mut urls = self.server_urls.lock().unwrap();
        match urls.iter().position(|u| u.id == id) {
            Some(pos) => {
                urls.remove(pos);
                Ok(())
            }
            None => Err(ApiError::NotFound {
                message: Some("URL not found".into()),
            }),
        }
    }

    async fn url_analytics(&self, token: Option<&str>, id: &str) -> Result<AnalyticsSnapshot> {
        self.record(op::ANALYTICS, token)?;
        let gate = self.analytics_gates.lock().unwrap().pop_front();
        if let Some(result) = wait(gate).await {
            return result;
        }
        Self::require_token(token)?;

        let urls = self.server_urls.lock().unwrap();
        urls.iter()
            .find(|u| u.id == id)
            .map(analytics_for)
            .ok_or(ApiError::NotFound {
                message: Some("URL not found".into()),
            })
    }
}

// ── Recording token store ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Get,
    Set(String),
    Clear,
}

/// Token store that logs every access.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryTokenStore,
    ops: Mutex<Vec<StoreOp>>,
}

impl RecordingStore {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn holding(token: &str) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryTokenStore::with_token(token),
            ops: Mutex::default(),
        })
    }

    pub fn ops(&self) -> Vec<StoreOp> {
        self.ops.lock().unwrap().clone()
    }

    /// Writes only; reads are noise for most assertions.
    pub fn writes(&self) -> Vec<StoreOp> {
        self.ops()
            .into_iter()
            .filter(|op| *op != StoreOp::Get)
            .collect()
    }

    pub fn peek(&self) -> Option<String> {
        self.inner.get()
    }
}

impl TokenStore for RecordingStore {
    fn get(&self) -> Option<String> {
        self.ops.lock().unwrap().push(StoreOp::Get);
        self.inner.get()
    }

    fn set(&self, token: &str) -> io::Result<()> {
        self.ops.lock().unwrap().push(StoreOp::Set(token.to_owned()));
        self.inner.set(token)
    }

    fn clear(&self) -> io::Result<()> {
        self.ops.lock().unwrap().push(StoreOp::Clear);
        self.inner.clear()
    }
}
