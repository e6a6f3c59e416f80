use std::collections::HashMap;

use chowbot_core::domain::intent::GuildId;
use tokio::sync::RwLock;

/// Process-lifetime chat toggles per guild. Not persisted; a restart turns
/// every guild back on. Concurrent toggles are last-write-wins.
#[derive(Debug, Default)]
pub struct GuildRuntimeState {
    enabled: RwLock<HashMap<GuildId, bool>>,
}

impl GuildRuntimeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_enabled(&self, guild: GuildId) -> bool {
        self.enabled.read().await.get(&guild).copied().unwrap_or(true)
    }

    pub async fn set_enabled(&self, guild: GuildId, enabled: bool) {
        self.enabled.write().await.insert(guild, enabled);
    }
}

#[cfg(test)]
mod tests {
    use chowbot_core::domain::intent::GuildId;

    use super::GuildRuntimeState;

    #[tokio::test]
    async fn guilds_default_to_enabled_and_toggle_independently() {
        let state = GuildRuntimeState::new();
        assert!(state.is_enabled(GuildId(1)).await);

        state.set_enabled(GuildId(1), false).await;
        assert!(!state.is_enabled(GuildId(1)).await);
        assert!(state.is_enabled(GuildId(2)).await);

        state.set_enabled(GuildId(1), true).await;
        assert!(state.is_enabled(GuildId(1)).await);
    }
}
