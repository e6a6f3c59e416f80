use std::sync::Arc;

use chowbot_core::domain::intent::GuildId;
use chowbot_db::StyleRepository;
use tracing::debug;

use crate::llm::LlmClient;

fn rewrite_prompt(style: &str, text: &str) -> String {
    format!(
        "請用以下風格改寫回覆，保留所有事實、數字、店名與連結，不要新增資訊，只輸出改寫後的內容。\n\
         風格：{style}\n\
         原文：\n{text}"
    )
}

/// Per-guild tone rewrite. Failures return the input unchanged.
pub struct StyleRewriter {
    llm: Arc<dyn LlmClient>,
    styles: Arc<dyn StyleRepository>,
}

impl StyleRewriter {
    pub fn new(llm: Arc<dyn LlmClient>, styles: Arc<dyn StyleRepository>) -> Self {
        Self { llm, styles }
    }

    pub async fn apply(&self, text: &str, guild: Option<GuildId>) -> String {
        let Some(guild) = guild else {
            return text.to_string();
        };
        if !self.llm.is_configured() {
            return text.to_string();
        }
        let Some(style) = self.styles.get(guild).await else {
            return text.to_string();
        };

        match self.llm.complete(&rewrite_prompt(&style, text)).await {
            Ok(rewritten) if !rewritten.trim().is_empty() => rewritten.trim().to_string(),
            Ok(_) => text.to_string(),
            Err(error) => {
                debug!(event_name = "agent.style.rewrite_failed", guild = %guild, error = %error, "keeping original text");
                text.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chowbot_core::domain::intent::GuildId;
    use chowbot_db::{InMemoryStyleRepository, StyleRepository};

    use super::StyleRewriter;
    use crate::llm::GeneratorError;
    use crate::testing::ScriptedLlm;

    async fn styled_repo() -> Arc<InMemoryStyleRepository> {
        let styles = Arc::new(InMemoryStyleRepository::default());
        let _ = styles.set(GuildId(1), "可愛").await;
        styles
    }

    #[tokio::test]
    async fn rewrites_when_guild_has_a_style() {
        let llm = Arc::new(ScriptedLlm::always("  今天好熱喔～  "));
        let rewriter = StyleRewriter::new(llm.clone(), styled_repo().await);

        assert_eq!(rewriter.apply("今天很熱。", Some(GuildId(1))).await, "今天好熱喔～");
        assert!(llm.prompts()[0].contains("風格：可愛"));
    }

    #[tokio::test]
    async fn skips_without_guild_style_or_generator() {
        let llm = Arc::new(ScriptedLlm::always("rewritten"));
        let rewriter = StyleRewriter::new(llm.clone(), styled_repo().await);
        assert_eq!(rewriter.apply("原文", None).await, "原文");
        assert_eq!(rewriter.apply("原文", Some(GuildId(2))).await, "原文");
        assert_eq!(llm.call_count(), 0);

        let offline = StyleRewriter::new(Arc::new(ScriptedLlm::unconfigured()), styled_repo().await);
        assert_eq!(offline.apply("原文", Some(GuildId(1))).await, "原文");
    }

    #[tokio::test]
    async fn failure_keeps_the_original() {
        let llm = ScriptedLlm::new(|_| Err(GeneratorError::Transport("reset".to_string())));
        let rewriter = StyleRewriter::new(Arc::new(llm), styled_repo().await);
        assert_eq!(rewriter.apply("原文", Some(GuildId(1))).await, "原文");
    }
}
