use std::sync::Arc;

use chowbot_core::domain::intent::Intent;
use tracing::{debug, info};

use crate::llm::LlmClient;

const NUTRITION_KEYWORDS: &[&str] = &["營養", "熱量", "卡路里", "蛋白質", "碳水", "脂肪", "營養成分"];
const WEATHER_KEYWORDS: &[&str] = &["天氣", "氣溫", "溫度", "下雨", "冷不冷", "熱不熱"];
const FOOD_KEYWORDS: &[&str] =
    &["吃", "餐廳", "午餐", "晚餐", "宵夜", "早餐", "便當", "拉麵", "美食", "吃什麼", "吃啥"];

fn classification_prompt(text: &str) -> String {
    format!(
        "你是一個路由器，只回覆以下其中一個標籤：\n\
         food / weather / nutrition / spin / chat\n\
         判斷使用者是否要找餐廳推薦、查天氣、查營養、轉盤隨機選餐，否則為 chat。\n\
         只輸出標籤，不要其他文字。\n\
         使用者：{text}"
    )
}

/// Maps a generator label to an intent, tolerating verbose answers.
pub fn normalize_label(label: &str) -> Intent {
    let label = label.trim().to_lowercase();
    if let Some(intent) = Intent::from_label(&label) {
        return intent;
    }
    if label.contains("food") {
        Intent::Food
    } else if label.contains("weather") {
        Intent::Weather
    } else if label.contains("nutrition") {
        Intent::Nutrition
    } else if ["spin", "wheel", "random"].iter().any(|word| label.contains(word)) {
        Intent::Spin
    } else if label.contains("chat") {
        Intent::Chat
    } else {
        Intent::Unknown
    }
}

/// Keyword dispatch for `unknown`: nutrition vocabulary is checked before the
/// broader food words, so "午餐熱量" is a nutrition question.
pub fn fallback_intent(text: &str) -> Intent {
    let contains_any = |keywords: &[&str]| keywords.iter().any(|keyword| text.contains(keyword));
    if contains_any(NUTRITION_KEYWORDS) {
        Intent::Nutrition
    } else if contains_any(WEATHER_KEYWORDS) {
        Intent::Weather
    } else if contains_any(FOOD_KEYWORDS) {
        Intent::Food
    } else {
        Intent::Chat
    }
}

pub struct IntentRouter {
    llm: Arc<dyn LlmClient>,
}

impl IntentRouter {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Never fails: any backend error classifies as `Unknown`.
    pub async fn classify(&self, text: &str) -> Intent {
        match self.llm.complete(&classification_prompt(text)).await {
            Ok(label) => normalize_label(&label),
            Err(error) => {
                debug!(event_name = "agent.router.backend_failed", error = %error, "router falling back to keywords");
                Intent::Unknown
            }
        }
    }

    /// `classify`, then the keyword fallback when the label is unknown. Never `Unknown`.
    pub async fn route(&self, text: &str) -> Intent {
        let classified = self.classify(text).await;
        let (intent, source) = match classified {
            Intent::Unknown => (fallback_intent(text), "keyword"),
            intent => (intent, "model"),
        };
        info!(event_name = "agent.router.classified", intent = intent.as_str(), source, "message routed");
        intent
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chowbot_core::domain::intent::Intent;

    use super::{fallback_intent, normalize_label, IntentRouter};
    use crate::testing::ScriptedLlm;

    #[test]
    fn labels_match_exactly_then_by_substring() {
        assert_eq!(normalize_label(" Weather \n"), Intent::Weather);
        assert_eq!(normalize_label("Label: nutrition."), Intent::Nutrition);
        assert_eq!(normalize_label("let's spin the wheel"), Intent::Spin);
        assert_eq!(normalize_label("random pick"), Intent::Spin);
        assert_eq!(normalize_label("我不知道"), Intent::Unknown);
    }

    #[test]
    fn fallback_prefers_nutrition_over_food_words() {
        assert_eq!(fallback_intent("午餐吃雞腿便當熱量多少"), Intent::Nutrition);
        assert_eq!(fallback_intent("明天會下雨嗎"), Intent::Weather);
        assert_eq!(fallback_intent("晚餐吃什麼"), Intent::Food);
        assert_eq!(fallback_intent("你好呀"), Intent::Chat);
    }

    #[tokio::test]
    async fn backend_failure_classifies_unknown_and_routes_by_keyword() {
        let router = IntentRouter::new(Arc::new(ScriptedLlm::unconfigured()));
        assert_eq!(router.classify("台南天氣如何").await, Intent::Unknown);
        assert_eq!(router.route("台南天氣如何").await, Intent::Weather);
    }

    #[tokio::test]
    async fn model_label_wins_over_keywords() {
        let llm = Arc::new(ScriptedLlm::always("spin"));
        let router = IntentRouter::new(llm.clone());
        assert_eq!(router.route("晚餐吃什麼").await, Intent::Spin);
        assert_eq!(llm.call_count(), 1);
        assert!(llm.prompts()[0].contains("使用者：晚餐吃什麼"));
    }
}
