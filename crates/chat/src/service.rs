use async_trait::async_trait;
use chowbot_agent::{AgentReply, AgentRuntime, FoodAnswer};
use chowbot_core::domain::intent::GuildId;
use chowbot_core::spin::SpinSource;
use chowbot_db::RepositoryError;

/// What the transport needs from the agent side. `AgentRuntime` is the
/// production implementation; handler tests script their own.
#[async_trait]
pub trait BotService: Send + Sync {
    async fn handle_message(&self, text: &str, guild: Option<GuildId>) -> AgentReply;

    async fn recommend_food(&self, text: &str, guild: Option<GuildId>) -> FoodAnswer;

    async fn nutrition(&self, food: &str, guild: Option<GuildId>) -> String;

    async fn recipe_nutrition(&self, ingredients: &str, guild: Option<GuildId>) -> String;

    async fn spin_candidates(
        &self,
        guild: Option<GuildId>,
        items: Vec<String>,
        source: SpinSource,
    ) -> Vec<String>;

    async fn wishlist(&self, guild: GuildId) -> Vec<String>;

    async fn add_to_wishlist(&self, guild: GuildId, item: &str) -> Result<bool, RepositoryError>;

    async fn remove_from_wishlist(
        &self,
        guild: GuildId,
        index: usize,
    ) -> Result<Option<String>, RepositoryError>;

    async fn style(&self, guild: GuildId) -> Option<String>;

    async fn set_style(&self, guild: GuildId, style: &str) -> Result<(), RepositoryError>;
}

#[async_trait]
impl BotService for AgentRuntime {
    async fn handle_message(&self, text: &str, guild: Option<GuildId>) -> AgentReply {
        AgentRuntime::handle_message(self, text, guild).await
    }

    async fn recommend_food(&self, text: &str, guild: Option<GuildId>) -> FoodAnswer {
        AgentRuntime::recommend_food(self, text, guild).await
    }

    async fn nutrition(&self, food: &str, guild: Option<GuildId>) -> String {
        self.nutrition_for(food, guild).await
    }

    async fn recipe_nutrition(&self, ingredients: &str, guild: Option<GuildId>) -> String {
        AgentRuntime::recipe_nutrition(self, ingredients, guild).await
    }

    async fn spin_candidates(
        &self,
        guild: Option<GuildId>,
        items: Vec<String>,
        source: SpinSource,
    ) -> Vec<String> {
        AgentRuntime::spin_candidates(self, guild, items, source).await
    }

    async fn wishlist(&self, guild: GuildId) -> Vec<String> {
        AgentRuntime::wishlist(self).list(guild).await
    }

    async fn add_to_wishlist(&self, guild: GuildId, item: &str) -> Result<bool, RepositoryError> {
        AgentRuntime::wishlist(self).add(guild, item).await
    }

    async fn remove_from_wishlist(
        &self,
        guild: GuildId,
        index: usize,
    ) -> Result<Option<String>, RepositoryError> {
        AgentRuntime::wishlist(self).remove(guild, index).await
    }

    async fn style(&self, guild: GuildId) -> Option<String> {
        self.styles().get(guild).await
    }

    async fn set_style(&self, guild: GuildId, style: &str) -> Result<(), RepositoryError> {
        self.styles().set(guild, style).await
    }
}
