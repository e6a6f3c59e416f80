use async_trait::async_trait;
use thiserror::Error;

use chowbot_core::domain::intent::GuildId;

pub mod json;
pub mod memory;

pub use json::{JsonStyleRepository, JsonWishlistRepository};
pub use memory::{InMemoryStyleRepository, InMemoryWishlistRepository};

/// Only writes can fail; reads of a missing or corrupt store yield empty data.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("io error on `{path}`: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[async_trait]
pub trait WishlistRepository: Send + Sync {
    async fn list(&self, guild: GuildId) -> Vec<String>;

    /// `false` when the item is already present.
    async fn add(&self, guild: GuildId, item: &str) -> Result<bool, RepositoryError>;

    /// Removes the 1-based `index`; `None` when it is out of range.
    async fn remove(&self, guild: GuildId, index: usize) -> Result<Option<String>, RepositoryError>;
}

#[async_trait]
pub trait StyleRepository: Send + Sync {
    /// Trimmed style text, `None` when unset or blank.
    async fn get(&self, guild: GuildId) -> Option<String>;

    async fn set(&self, guild: GuildId, style: &str) -> Result<(), RepositoryError>;
}

pub(crate) fn normalize_style(style: &str) -> Option<String> {
    let trimmed = style.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub(crate) fn add_unique(items: &mut Vec<String>, item: &str) -> bool {
    if items.iter().any(|existing| existing == item) {
        return false;
    }
    items.push(item.to_string());
    true
}

pub(crate) fn remove_one_based(items: &mut Vec<String>, index: usize) -> Option<String> {
    if index == 0 || index > items.len() {
        return None;
    }
    Some(items.remove(index - 1))
}
