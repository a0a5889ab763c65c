// Client-side storage: identity cookies with expiry plus a small local-storage area.
// This is the only place that touches persisted identity.

use crate::models::{Role, UserId};
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const USER_ID_KEY: &str = "user_id";
pub const ROLE_KEY: &str = "role";

// Older builds wrote the id under these names
const LEGACY_USER_ID_KEYS: [&str; 2] = ["id", "Id"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    pub user_id: Option<UserId>,
    pub role: Option<Role>,
}

impl Session {
    pub fn is_logged_in(&self) -> bool {
        self.user_id.is_some()
    }
}

// Identity accessor injected into the API client and the access gate
pub trait SessionStore: Send + Sync + 'static {
    // Total: missing, expired or unparsable fields read as absent
    fn get(&self) -> Session;

    // Writes each field as its own entry expiring after `ttl_days`
    fn set(&self, fields: &[(&str, String)], ttl_days: i64);

    // Removes every identity key, legacy names included
    fn clear(&self);
}

// Non-expiring key/value area (the browser's localStorage)
pub trait LocalStorage: Send + Sync + 'static {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: String);
    fn remove_item(&self, key: &str);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CookieEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CookieEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

// On-disk form of the storage file
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    cookies: BTreeMap<String, CookieEntry>,
    #[serde(default)]
    local: BTreeMap<String, String>,
}

pub struct ClientStorage {
    cookies: DashMap<String, CookieEntry>,
    local: DashMap<String, String>,
    path: Option<PathBuf>,
    // Serializes snapshot writes so concurrent mutations cannot interleave files
    write_lock: Mutex<()>,
}

impl ClientStorage {
    pub fn in_memory() -> Self {
        Self {
            cookies: DashMap::new(),
            local: DashMap::new(),
            path: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Opens storage mirrored to `path`.
    ///
    /// A missing file starts empty. A file that is not valid JSON is logged and
    /// ignored, matching how a browser treats a garbled cookie jar. Other I/O
    /// failures are returned.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let snapshot = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<Snapshot>(&content).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Discarding unreadable client storage");
                Snapshot::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Snapshot::default(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read client storage {}", path.display()))
            }
        };

        let now = Utc::now();
        let storage = Self {
            cookies: snapshot
                .cookies
                .into_iter()
                .filter(|(_, entry)| !entry.is_expired(now))
                .collect(),
            local: snapshot.local.into_iter().collect(),
            path: Some(path),
            write_lock: Mutex::new(()),
        };
        Ok(storage)
    }

    pub fn from_config(config: &crate::config::ClientConfig) -> anyhow::Result<Self> {
        match &config.storage_path {
            Some(path) => Self::open(path.clone()),
            None => Ok(Self::in_memory()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // Returns the cookie value if present and not expired; expired entries are dropped
    pub fn cookie(&self, key: &str) -> Option<String> {
        let now = Utc::now();
        let expired = match self.cookies.get(key) {
            Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            self.cookies.remove(key);
            debug!(key, "Dropped expired cookie");
            self.persist();
        }
        None
    }

    pub fn set_cookie(&self, key: &str, value: String, expires_at: DateTime<Utc>) {
        self.cookies
            .insert(key.to_string(), CookieEntry { value, expires_at });
        self.persist();
    }

    pub fn remove_cookie(&self, key: &str) -> bool {
        let removed = self.cookies.remove(key).is_some();
        if removed {
            self.persist();
        }
        removed
    }

    /// Writes the current contents to the backing file, if any.
    pub fn flush(&self) -> anyhow::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let _guard = self.write_lock.lock();

        let snapshot = Snapshot {
            cookies: self
                .cookies
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect(),
            local: self
                .local
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect(),
        };
        let json = serde_json::to_string_pretty(&snapshot)
            .context("Failed to serialize client storage")?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write client storage {}", path.display()))?;
        Ok(())
    }

    // Mutations never fail for the caller; a lost write only costs persistence
    fn persist(&self) {
        if let Err(e) = self.flush() {
            warn!(error = %e, "Client storage not persisted");
        }
    }
}

impl SessionStore for ClientStorage {
    fn get(&self) -> Session {
        let user_id = std::iter::once(USER_ID_KEY)
            .chain(LEGACY_USER_ID_KEYS)
            .find_map(|key| self.cookie(key))
            .and_then(|raw| raw.trim().parse::<UserId>().ok());
        let role = self.cookie(ROLE_KEY).and_then(|raw| Role::from_code(&raw));

        Session { user_id, role }
    }

    fn set(&self, fields: &[(&str, String)], ttl_days: i64) {
        let Some(expires_at) =
            Duration::try_days(ttl_days).and_then(|ttl| Utc::now().checked_add_signed(ttl))
        else {
            warn!(ttl_days, "Identity fields not stored: expiry out of range");
            return;
        };
        for (key, value) in fields {
            self.cookies.insert(
                key.to_string(),
                CookieEntry {
                    value: value.clone(),
                    expires_at,
                },
            );
        }
        debug!(count = fields.len(), ttl_days, "Stored identity fields");
        self.persist();
    }

    fn clear(&self) {
        for key in std::iter::once(USER_ID_KEY)
            .chain(std::iter::once(ROLE_KEY))
            .chain(LEGACY_USER_ID_KEYS)
        {
            self.cookies.remove(key);
        }
        debug!("Cleared identity fields");
        self.persist();
    }
}

impl LocalStorage for ClientStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.local.get(key).map(|v| v.value().clone())
    }

    fn set_item(&self, key: &str, value: String) {
        self.local.insert(key.to_string(), value);
        self.persist();
    }

    fn remove_item(&self, key: &str) {
        if self.local.remove(key).is_some() {
            self.persist();
        }
    }
}
