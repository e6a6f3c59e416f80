use std::collections::HashMap;

use tokio::sync::RwLock;

use chowbot_core::domain::intent::GuildId;

use super::{
    add_unique, normalize_style, remove_one_based, RepositoryError, StyleRepository,
    WishlistRepository,
};

#[derive(Default)]
pub struct InMemoryWishlistRepository {
    items: RwLock<HashMap<GuildId, Vec<String>>>,
}

impl InMemoryWishlistRepository {
    pub fn with_items(guild: GuildId, items: &[&str]) -> Self {
        let seeded = items.iter().map(|item| (*item).to_string()).collect();
        Self { items: RwLock::new(HashMap::from([(guild, seeded)])) }
    }
}

#[async_trait::async_trait]
impl WishlistRepository for InMemoryWishlistRepository {
    async fn list(&self, guild: GuildId) -> Vec<String> {
        let items = self.items.read().await;
        items.get(&guild).cloned().unwrap_or_default()
    }

    async fn add(&self, guild: GuildId, item: &str) -> Result<bool, RepositoryError> {
        let mut items = self.items.write().await;
        Ok(add_unique(items.entry(guild).or_default(), item))
    }

    async fn remove(&self, guild: GuildId, index: usize) -> Result<Option<String>, RepositoryError> {
        let mut items = self.items.write().await;
        Ok(items.get_mut(&guild).and_then(|list| remove_one_based(list, index)))
    }
}

#[derive(Default)]
pub struct InMemoryStyleRepository {
    styles: RwLock<HashMap<GuildId, String>>,
}

#[async_trait::async_trait]
impl StyleRepository for InMemoryStyleRepository {
    async fn get(&self, guild: GuildId) -> Option<String> {
        let styles = self.styles.read().await;
        styles.get(&guild).and_then(|style| normalize_style(style))
    }

    async fn set(&self, guild: GuildId, style: &str) -> Result<(), RepositoryError> {
        let mut styles = self.styles.write().await;
        styles.insert(guild, style.to_string());
        Ok(())
    }
}
