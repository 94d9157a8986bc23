use dashmap::DashMap;
use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

/// Key the bearer token is stored under.
pub const TOKEN_KEY: &str = "token";

/// Persistent home of the bearer token.
///
/// Read once when the session starts, written on login, cleared on logout
/// and on a failed `load_user`. Passed into [`AuthSession`](crate::session::AuthSession)
/// explicitly so tests can substitute a fake.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<String>;
    fn set(&self, token: &str) -> io::Result<()>;
    fn clear(&self) -> io::Result<()>;
}

/// Process-local token store backed by a keyed DashMap.
///
/// Holds at most one entry, under [`TOKEN_KEY`].
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenStore {
    inner: Arc<DashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with an existing token.
    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.inner.insert(TOKEN_KEY.to_owned(), token.into());
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.inner.get(TOKEN_KEY).map(|v| v.clone())
    }

    fn set(&self, token: &str) -> io::Result<()> {
        self.inner.insert(TOKEN_KEY.to_owned(), token.to_owned());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        self.inner.remove(TOKEN_KEY);
        Ok(())
    }
}

/// Token store persisted to a single file.
///
/// The file is read once in [`FileTokenStore::open`]; afterwards the in-memory
/// copy answers reads and every write goes through to disk.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    cached: MemoryTokenStore,
}

impl FileTokenStore {
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let cached = MemoryTokenStore::new();

        match fs::read_to_string(&path) {
            Ok(contents) => {
                let token = contents.trim();
                if !token.is_empty() {
                    cached.set(token)?;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        tracing::debug!(
            path = %path.display(),
            has_token = cached.get().is_some(),
            "Token store opened"
        );
        Ok(Self { path, cached })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        self.cached.get()
    }

    fn set(&self, token: &str) -> io::Result<()> {
        self.cached.set(token)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = owner_only().open(&self.path)?;
        restrict_to_owner(&file)?;
        file.write_all(token.as_bytes())
    }

    fn clear(&self) -> io::Result<()> {
        self.cached.clear()?;
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// The token is a bearer credential: only the owner may read the file.
fn owner_only() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
}

/// `mode` only applies to newly created files; tighten one left behind by an
/// older version too.
#[cfg(unix)]
fn restrict_to_owner(file: &fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_to_owner(_file: &fs::File) -> io::Result<()> {
    Ok(())
}
