use std::sync::Arc;

use async_trait::async_trait;
use chowbot_core::domain::food::TravelFilters;
use chowbot_core::heuristics;
use tracing::debug;

use crate::guardrails::{f64_field, parse_json_object, string_field, u32_field, ExtractionError};
use crate::llm::LlmClient;

/// Two-tier extraction: the model answer when it parses, the deterministic
/// heuristic on any failure.
#[async_trait]
pub trait Extractor: Send + Sync {
    type Output: Send;

    fn name(&self) -> &'static str;

    async fn try_model(&self, text: &str) -> Result<Self::Output, ExtractionError>;

    fn heuristic(&self, text: &str) -> Self::Output;

    async fn extract(&self, text: &str) -> Self::Output {
        match self.try_model(text).await {
            Ok(output) => output,
            Err(error) => {
                debug!(
                    event_name = "agent.extractor.fallback",
                    extractor = self.name(),
                    error = %error,
                    "model extraction failed; using heuristic"
                );
                self.heuristic(text)
            }
        }
    }
}

/// Raw `(dish, location)` pair; empty strings mean "not mentioned".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractedPlace {
    pub dish: String,
    pub location: String,
}

pub struct FoodQueryExtractor {
    llm: Arc<dyn LlmClient>,
}

impl FoodQueryExtractor {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

fn food_query_prompt(text: &str) -> String {
    format!(
        "你是資訊擷取器。從使用者訊息擷取「地點」與「想吃的食物」。\n\
         只輸出一個 JSON 物件，格式：{{\"location\": \"...\", \"dish\": \"...\"}}\n\
         沒有提到的欄位請填空字串，不要輸出其他文字。\n\
         使用者訊息：{text}"
    )
}

#[async_trait]
impl Extractor for FoodQueryExtractor {
    type Output = ExtractedPlace;

    fn name(&self) -> &'static str {
        "food_query"
    }

    async fn try_model(&self, text: &str) -> Result<ExtractedPlace, ExtractionError> {
        let response = self.llm.complete(&food_query_prompt(text)).await?;
        let object = parse_json_object(&response)?;
        Ok(ExtractedPlace {
            dish: string_field(&object, "dish"),
            location: string_field(&object, "location"),
        })
    }

    fn heuristic(&self, _text: &str) -> ExtractedPlace {
        ExtractedPlace::default()
    }
}

pub struct FoodFiltersExtractor {
    llm: Arc<dyn LlmClient>,
    defaults: TravelFilters,
}

impl FoodFiltersExtractor {
    pub fn new(llm: Arc<dyn LlmClient>, defaults: TravelFilters) -> Self {
        Self { llm, defaults }
    }
}

fn food_filters_prompt(text: &str) -> String {
    format!(
        "你是資訊擷取器。從使用者訊息擷取找餐廳的篩選條件。\n\
         只輸出一個 JSON 物件，欄位：\n\
         \"max_travel_time\": 最長交通時間（整數分鐘）或 null\n\
         \"min_rating\": 最低評分（0 到 5 的小數）或 null\n\
         \"min_reviews\": 最少評論數（整數）或 null\n\
         \"travel_mode\": \"walking\" / \"driving\" / \"bicycling\" / \"transit\" 其中之一或 null\n\
         沒有提到的欄位請填 null，不要輸出其他文字。\n\
         使用者訊息：{text}"
    )
}

#[async_trait]
impl Extractor for FoodFiltersExtractor {
    type Output = TravelFilters;

    fn name(&self) -> &'static str {
        "food_filters"
    }

    async fn try_model(&self, text: &str) -> Result<TravelFilters, ExtractionError> {
        let response = self.llm.complete(&food_filters_prompt(text)).await?;
        let object = parse_json_object(&response)?;

        let mut filters = self.defaults;
        if let Some(minutes) = u32_field(&object, "max_travel_time").filter(|minutes| *minutes > 0) {
            filters.max_travel_minutes = minutes;
        }
        if let Some(rating) = f64_field(&object, "min_rating").filter(|rating| (0.0..=5.0).contains(rating)) {
            filters.min_rating = rating;
        }
        if let Some(reviews) = u32_field(&object, "min_reviews") {
            filters.min_review_count = reviews;
        }
        if let Some(mode) = object
            .get("travel_mode")
            .and_then(|value| value.as_str())
            .and_then(|mode| mode.parse().ok())
        {
            filters.travel_mode = mode;
        }
        Ok(filters)
    }

    fn heuristic(&self, text: &str) -> TravelFilters {
        heuristics::extract_food_filters(text, self.defaults)
    }
}

/// Facade over the two generator-backed extractors.
#[derive(Clone)]
pub struct GenerativeExtractor {
    llm: Arc<dyn LlmClient>,
}

impl GenerativeExtractor {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn extract_food_query(&self, text: &str) -> ExtractedPlace {
        FoodQueryExtractor::new(self.llm.clone()).extract(text).await
    }

    pub async fn extract_food_filters(&self, text: &str, defaults: TravelFilters) -> TravelFilters {
        FoodFiltersExtractor::new(self.llm.clone(), defaults).extract(text).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chowbot_core::domain::food::{TravelFilters, TravelMode};

    use super::{ExtractedPlace, GenerativeExtractor};
    use crate::llm::GeneratorError;
    use crate::testing::ScriptedLlm;

    fn extractor_answering(answer: &'static str) -> GenerativeExtractor {
        GenerativeExtractor::new(Arc::new(ScriptedLlm::always(answer)))
    }

    fn place(dish: &str, location: &str) -> ExtractedPlace {
        ExtractedPlace { dish: dish.to_string(), location: location.to_string() }
    }

    #[tokio::test]
    async fn food_query_reads_clean_json() {
        let extractor = extractor_answering(r#"{"location":"Tainan","dish":"ramen"}"#);
        assert_eq!(extractor.extract_food_query("anything").await, place("ramen", "Tainan"));
    }

    #[tokio::test]
    async fn food_query_repairs_embedded_object() {
        let extractor = extractor_answering(r#"sure thing!! {"dish":"x"} hope that helps"#);
        assert_eq!(extractor.extract_food_query("anything").await, place("x", ""));
    }

    #[tokio::test]
    async fn food_query_without_json_is_empty() {
        let extractor = extractor_answering("I could not find anything");
        assert_eq!(extractor.extract_food_query("anything").await, ExtractedPlace::default());
    }

    #[tokio::test]
    async fn food_query_absorbs_generator_failure() {
        let llm = ScriptedLlm::new(|_| Err(GeneratorError::Transport("timed out".to_string())));
        let extractor = GenerativeExtractor::new(Arc::new(llm));
        assert_eq!(extractor.extract_food_query("拉麵").await, ExtractedPlace::default());
    }

    #[tokio::test]
    async fn filters_keep_defaults_for_bad_fields_only() {
        let extractor = extractor_answering(
            r#"{"max_travel_time": "abc", "min_rating": 4.2, "min_reviews": 300, "travel_mode": "teleport"}"#,
        );
        let defaults = TravelFilters { max_travel_minutes: 25, ..TravelFilters::default() };

        let filters = extractor.extract_food_filters("anything", defaults).await;
        assert_eq!(filters.max_travel_minutes, 25);
        assert_eq!(filters.min_rating, 4.2);
        assert_eq!(filters.min_review_count, 300);
        assert_eq!(filters.travel_mode, TravelMode::Walking);
    }

    #[tokio::test]
    async fn filters_null_fields_keep_defaults() {
        let extractor = extractor_answering(
            r#"{"max_travel_time": 15, "min_rating": null, "min_reviews": null, "travel_mode": "driving"}"#,
        );
        let filters = extractor.extract_food_filters("anything", TravelFilters::default()).await;
        assert_eq!(filters.max_travel_minutes, 15);
        assert_eq!(filters.min_rating, 3.5);
        assert_eq!(filters.min_review_count, 0);
        assert_eq!(filters.travel_mode, TravelMode::Driving);
    }

    #[tokio::test]
    async fn filters_fall_back_to_heuristics_when_unparseable() {
        let extractor = extractor_answering("抱歉我不懂");
        let filters = extractor
            .extract_food_filters("20分鐘內 4星以上 500則評論以上 走路", TravelFilters::default())
            .await;
        assert_eq!(filters.max_travel_minutes, 20);
        assert_eq!(filters.min_rating, 4.0);
        assert_eq!(filters.min_review_count, 500);
        assert_eq!(filters.travel_mode, TravelMode::Walking);
    }
}
