use std::sync::Arc;

use crate::llm::LlmClient;
use crate::pipeline::llm_failure_message;

fn chat_prompt(text: &str) -> String {
    format!(
        "你是一個友善的聊天夥伴，使用繁體中文，簡潔自然地回覆。\
         如果使用者主動問吃什麼，才進入美食推薦；否則就是閒聊。\n\
         使用者：{text}\n\
         請直接回覆，不要多餘的系統訊息。"
    )
}

pub struct ChatHandler {
    llm: Arc<dyn LlmClient>,
}

impl ChatHandler {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn run(&self, text: &str) -> String {
        self.llm.complete(&chat_prompt(text)).await.unwrap_or_else(|error| llm_failure_message(error))
    }
}
