use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::warn;

use chowbot_core::domain::intent::GuildId;

use super::{
    add_unique, normalize_style, remove_one_based, RepositoryError, StyleRepository,
    WishlistRepository,
};

/// A JSON object keyed by guild id, rewritten in full on every change.
struct JsonMapFile {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonMapFile {
    fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    async fn load<V: DeserializeOwned>(&self) -> BTreeMap<String, V> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return BTreeMap::new(),
            Err(error) => {
                warn!(
                    event_name = "storage.json.read_failed",
                    path = %self.path.display(),
                    error = %error,
                    "treating unreadable store as empty"
                );
                return BTreeMap::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|error| {
            warn!(
                event_name = "storage.json.corrupt",
                path = %self.path.display(),
                error = %error,
                "treating corrupt store as empty"
            );
            BTreeMap::new()
        })
    }

    async fn save<V: Serialize>(&self, data: &BTreeMap<String, V>) -> Result<(), RepositoryError> {
        let body = serde_json::to_string_pretty(data)?;
        tokio::fs::write(&self.path, body).await.map_err(|source| RepositoryError::Io {
            path: self.path.display().to_string(),
            source,
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Wishlist store: `{ "<guild id>": ["item", ...] }`.
pub struct JsonWishlistRepository {
    file: JsonMapFile,
}

impl JsonWishlistRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { file: JsonMapFile::new(path) }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[async_trait::async_trait]
impl WishlistRepository for JsonWishlistRepository {
    async fn list(&self, guild: GuildId) -> Vec<String> {
        let mut data = self.file.load::<Vec<String>>().await;
        data.remove(&guild.storage_key()).unwrap_or_default()
    }

    async fn add(&self, guild: GuildId, item: &str) -> Result<bool, RepositoryError> {
        let _guard = self.file.write_lock.lock().await;
        let mut data = self.file.load::<Vec<String>>().await;
        let added = add_unique(data.entry(guild.storage_key()).or_default(), item);
        if added {
            self.file.save(&data).await?;
        }
        Ok(added)
    }

    async fn remove(&self, guild: GuildId, index: usize) -> Result<Option<String>, RepositoryError> {
        let _guard = self.file.write_lock.lock().await;
        let mut data = self.file.load::<Vec<String>>().await;
        let removed = data.get_mut(&guild.storage_key()).and_then(|items| remove_one_based(items, index));
        if removed.is_some() {
            self.file.save(&data).await?;
        }
        Ok(removed)
    }
}

/// Style store: `{ "<guild id>": "style text" }`.
pub struct JsonStyleRepository {
    file: JsonMapFile,
}

impl JsonStyleRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { file: JsonMapFile::new(path) }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[async_trait::async_trait]
impl StyleRepository for JsonStyleRepository {
    async fn get(&self, guild: GuildId) -> Option<String> {
        let data = self.file.load::<serde_json::Value>().await;
        match data.get(&guild.storage_key())? {
            serde_json::Value::String(style) => normalize_style(style),
            serde_json::Value::Null => None,
            other => normalize_style(&other.to_string()),
        }
    }

    async fn set(&self, guild: GuildId, style: &str) -> Result<(), RepositoryError> {
        let _guard = self.file.write_lock.lock().await;
        let mut data = self.file.load::<serde_json::Value>().await;
        data.insert(guild.storage_key(), serde_json::Value::String(style.to_string()));
        self.file.save(&data).await
    }
}
