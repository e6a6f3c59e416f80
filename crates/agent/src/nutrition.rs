use std::sync::Arc;

use chowbot_core::errors::GatewayError;
use chowbot_core::heuristics;
use chowbot_gateway::NutritionProvider;
use tracing::warn;

use crate::llm::LlmClient;

pub const MISSING_KEY_MESSAGE: &str = "（未設定 USDA_API_KEY，無法查詢）";
pub const NOT_FOUND_MESSAGE: &str = "（查無結果，請換更明確的食物名稱）";
pub const RECIPE_USAGE: &str = "請輸入食材列表，例如：1 cup rice, 200g chicken, 1 tbsp oil";
const FIRST_INGREDIENT_NOTE: &str = "（提示：目前以第一個食材做查詢）\n";

fn translate_line_prompt(text: &str) -> String {
    format!(
        "請把以下中文食物或份量轉成營養資料庫可解析的英文食材描述。\
         只輸出一行英文，不要解釋、不加編號；若已是英文就原樣輸出。\n{text}"
    )
}

fn translate_list_prompt(lines: &[String]) -> String {
    format!(
        "請把以下中文食材清單轉成營養資料庫可解析的英文食材描述。\
         每個食材一行輸出，不要編號、不加解釋；已是英文就原樣輸出。\n{}",
        lines.join("\n")
    )
}

/// The note stays outside any style rewrite.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecipeLookup {
    pub note: Option<&'static str>,
    pub result: String,
}

impl RecipeLookup {
    pub fn render(&self, result: &str) -> String {
        format!("{}{result}", self.note.unwrap_or_default())
    }
}

/// USDA lookups with generator translation in front. `provider` is `None`
/// when no USDA key is configured.
pub struct NutritionHandler {
    llm: Arc<dyn LlmClient>,
    provider: Option<Arc<dyn NutritionProvider>>,
}

impl NutritionHandler {
    pub fn new(llm: Arc<dyn LlmClient>, provider: Option<Arc<dyn NutritionProvider>>) -> Self {
        Self { llm, provider }
    }

    /// Free-text question: strip the nutrient words, translate, look up.
    pub async fn run(&self, text: &str) -> String {
        let target = heuristics::extract_nutrition_target(text);
        let translated = self.translate_list(vec![target.clone()]).await;
        let query = translated.into_iter().next().unwrap_or(target);
        self.lookup(&query).await
    }

    /// A single food name, translated as one line.
    pub async fn run_single(&self, food: &str) -> String {
        let query = self.translate_line(food).await;
        self.lookup(&query).await
    }

    /// Comma-separated ingredients; only the first is looked up. `None` for an empty list.
    pub async fn run_recipe(&self, ingredients: &str) -> Option<RecipeLookup> {
        let lines: Vec<String> = ingredients
            .split(|ch: char| ch == ',' || ch == '，')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        let first = lines.first()?.clone();

        let multiple = lines.len() > 1;
        let translated = self.translate_list(lines).await;
        let query = translated.into_iter().next().unwrap_or(first);
        Some(RecipeLookup { note: multiple.then_some(FIRST_INGREDIENT_NOTE), result: self.lookup(&query).await })
    }

    pub async fn lookup(&self, query: &str) -> String {
        let Some(provider) = &self.provider else {
            return MISSING_KEY_MESSAGE.to_string();
        };
        match provider.lookup(query).await {
            Ok(facts) => facts.render(),
            Err(error) if error.is_not_found() => NOT_FOUND_MESSAGE.to_string(),
            Err(error) => lookup_failed(query, error),
        }
    }

    async fn translate_line(&self, text: &str) -> String {
        if !self.llm.is_configured() {
            return text.to_string();
        }
        match self.llm.complete(&translate_line_prompt(text)).await {
            Ok(line) if !line.trim().is_empty() => line.trim().to_string(),
            _ => text.to_string(),
        }
    }

    /// One output line per input line; the input comes back on any failure.
    async fn translate_list(&self, lines: Vec<String>) -> Vec<String> {
        if !self.llm.is_configured() {
            return lines;
        }
        let Ok(output) = self.llm.complete(&translate_list_prompt(&lines)).await else {
            return lines;
        };
        let converted: Vec<String> = output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        if converted.is_empty() {
            lines
        } else {
            converted
        }
    }
}

fn lookup_failed(query: &str, error: GatewayError) -> String {
    warn!(event_name = "agent.nutrition.lookup_failed", query = %query, error = %error, "nutrition lookup failed");
    format!("抱歉，查詢營養失敗：{}", error.message)
}
