//! Credential storage: where the username and the token pair live between
//! calls (and, for [`FileCredentialStore`], between runs).
//!
//! The store is a dumb key-value map. It does not validate, expire, or
//! refresh anything; the [`AuthGuard`](crate::AuthGuard) decides what the
//! stored values mean.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use lobbyist_protocol::{AccessToken, Username};

use crate::StoreError;

// ---------------------------------------------------------------------------
// Keys and escaping
// ---------------------------------------------------------------------------

/// The three values the client keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CredentialKey {
    UserName,
    AccessToken,
    RefreshToken,
}

impl CredentialKey {
    pub const ALL: [CredentialKey; 3] =
        [Self::UserName, Self::AccessToken, Self::RefreshToken];

    /// The flat key name used in persisted form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserName => "user-name",
            Self::AccessToken => "access-token",
            Self::RefreshToken => "refresh-token",
        }
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Makes a token safe to append to a query string: every `+` becomes
/// `%2B`. Tokens are stored in this form.
pub fn escape_token(raw: &str) -> String {
    raw.replace('+', "%2B")
}

/// Inverse of [`escape_token`] for strings it produced.
pub fn unescape_token(escaped: &str) -> String {
    escaped.replace("%2B", "+")
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// Key-value storage for the three credential entries.
///
/// Reads cannot fail: an entry that cannot be read is simply absent,
/// which the guard treats as "not logged in". Writes report failures so
/// a login that could not be persisted is not reported as successful.
pub trait CredentialStore: Send + 'static {
    fn get(&self, key: CredentialKey) -> Option<String>;
    fn set(&mut self, key: CredentialKey, value: &str) -> Result<(), StoreError>;
    fn clear(&mut self, key: CredentialKey) -> Result<(), StoreError>;
}

/// In-memory store; forgets everything when the process exits.
#[derive(Debug, Default, Clone)]
pub struct MemoryCredentialStore {
    values: HashMap<CredentialKey, String>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: CredentialKey) -> Option<String> {
        self.values.get(&key).cloned()
    }

    fn set(&mut self, key: CredentialKey, value: &str) -> Result<(), StoreError> {
        self.values.insert(key, value.to_string());
        Ok(())
    }

    fn clear(&mut self, key: CredentialKey) -> Result<(), StoreError> {
        self.values.remove(&key);
        Ok(())
    }
}

/// Durable store backed by a small JSON file:
///
/// ```json
/// { "access-token": "...", "refresh-token": "...", "user-name": "maex" }
/// ```
///
/// The whole map is rewritten on every change, first to a sibling
/// temporary file which is then renamed over the real one, so a crash
/// mid-write leaves either the old or the new content.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileCredentialStore {
    /// Opens the store at `path`. A missing file is an empty store; the
    /// file is created on the first write.
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] if the file exists but cannot be read,
    /// and [`StoreError::Format`] if it is not a JSON string map.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), entries = values.len(), "credential store opened");
        Ok(Self { path, values })
    }

    /// The file this store writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("tmp");
        let bytes = serde_json::to_vec_pretty(&self.values)?;
        {
            let mut file = owner_only(fs::OpenOptions::new().write(true).create(true).truncate(true))
                .open(&tmp)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                // A leftover temp file keeps its old mode through `open`.
                file.set_permissions(fs::Permissions::from_mode(0o600))?;
            }
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Bearer tokens are readable by the owning user only.
#[cfg(unix)]
fn owner_only(options: &mut fs::OpenOptions) -> &mut fs::OpenOptions {
    use std::os::unix::fs::OpenOptionsExt;
    options.mode(0o600)
}

#[cfg(not(unix))]
fn owner_only(options: &mut fs::OpenOptions) -> &mut fs::OpenOptions {
    options
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, key: CredentialKey) -> Option<String> {
        self.values.get(key.as_str()).cloned()
    }

    fn set(&mut self, key: CredentialKey, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.as_str().to_string(), value.to_string());
        self.persist()
    }

    fn clear(&mut self, key: CredentialKey) -> Result<(), StoreError> {
        if self.values.remove(key.as_str()).is_some() {
            self.persist()?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CredentialSet
// ---------------------------------------------------------------------------

/// A complete set of stored credentials.
///
/// Only exists when all three entries are present and non-empty; a
/// partial set reads as "not logged in".
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialSet {
    pub username: Username,
    /// Escaped, ready to put on the wire.
    pub access_token: AccessToken,
    /// Escaped. Kept for completeness; nothing refreshes with it.
    pub refresh_token: String,
}

impl CredentialSet {
    /// Reads a complete set from `store`, or `None` if any entry is
    /// missing or empty.
    pub fn load<S: CredentialStore + ?Sized>(store: &S) -> Option<Self> {
        let present = |key| store.get(key).filter(|v| !v.is_empty());
        Some(Self {
            username: Username::new(&present(CredentialKey::UserName)?),
            access_token: AccessToken::new(present(CredentialKey::AccessToken)?),
            refresh_token: present(CredentialKey::RefreshToken)?,
        })
    }
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
