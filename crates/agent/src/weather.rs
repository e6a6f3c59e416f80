use std::sync::Arc;

use chowbot_core::heuristics;
use chowbot_gateway::WeatherProvider;
use tracing::warn;

use crate::llm::LlmClient;
use crate::pipeline::llm_failure_message;

fn weather_prompt(city: &str, weather_json: &str) -> String {
    format!(
        "你是一個簡潔的天氣小幫手，使用繁體中文回答。\n\
         城市：{city}\n\
         天氣資料：{weather_json}\n\
         請告訴使用者目前溫度、風速，並給穿著或出門建議。"
    )
}

pub struct WeatherHandler {
    llm: Arc<dyn LlmClient>,
    weather: Arc<dyn WeatherProvider>,
}

impl WeatherHandler {
    pub fn new(llm: Arc<dyn LlmClient>, weather: Arc<dyn WeatherProvider>) -> Self {
        Self { llm, weather }
    }

    /// Unstyled answer; the runtime applies the guild style.
    pub async fn run(&self, text: &str) -> String {
        let city = heuristics::extract_city(text);
        let snapshot = match self.weather.weather_for_city(&city).await {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(event_name = "agent.weather.lookup_failed", city = %city, error = %error, "weather lookup failed");
                return format!("抱歉，查天氣失敗：{}", error.message);
            }
        };

        match self.llm.complete(&weather_prompt(&city, &snapshot.to_prompt_json())).await {
            Ok(answer) => answer,
            Err(error) => llm_failure_message(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::WeatherHandler;
    use crate::testing::{FakeWeather, ScriptedLlm};

    #[tokio::test]
    async fn prompt_names_the_extracted_city() {
        let llm = Arc::new(ScriptedLlm::always("台北 27 度，記得防曬。"));
        let handler = WeatherHandler::new(llm.clone(), Arc::new(FakeWeather::sunny()));

        assert_eq!(handler.run("台北今天天氣如何").await, "台北 27 度，記得防曬。");
        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("城市：Taipei"));
        assert!(prompt.contains("\"temperature_c\":27.5"));
    }

    #[tokio::test]
    async fn lookup_failure_is_an_apology() {
        let llm = Arc::new(ScriptedLlm::always("unused"));
        let handler = WeatherHandler::new(llm.clone(), Arc::new(FakeWeather::failing()));

        assert_eq!(handler.run("火星天氣").await, "抱歉，查天氣失敗：找不到城市：Tainan");
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn generator_failure_is_reported() {
        let handler = WeatherHandler::new(Arc::new(ScriptedLlm::unconfigured()), Arc::new(FakeWeather::sunny()));
        assert_eq!(handler.run("天氣").await, "抱歉，呼叫 LLM 失敗：LLM_API_KEY 未設定");
    }
}
