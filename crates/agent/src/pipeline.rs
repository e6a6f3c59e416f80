//! Restaurant recommendation: free text in, one generator-written answer out.
//!
//! The query is resolved from the generator first and text heuristics second.
//! Candidates are checked one at a time in discovery order and collection
//! stops at [`MAX_CANDIDATES`], so a run makes at most one details and one
//! travel-time call per search hit.

use std::fmt::Write as _;
use std::sync::Arc;

use chowbot_core::domain::food::{non_empty, FoodQuery, TravelFilters};
use chowbot_core::domain::intent::GuildId;
use chowbot_core::domain::meal::MealSource;
use chowbot_core::domain::place::{fallback_map_url, Coordinates, PlaceCandidate};
use chowbot_core::domain::weather::WeatherSnapshot;
use chowbot_core::errors::GatewayError;
use chowbot_core::format::extract_restaurant_names;
use chowbot_core::heuristics;
use chowbot_db::StyleRepository;
use chowbot_gateway::{extract_recommended_dishes, top_review_snippet, PlaceProvider, WeatherProvider};
use serde_json::json;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::extraction::GenerativeExtractor;
use crate::llm::LlmClient;

pub const MAX_CANDIDATES: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FoodOutcome {
    Recommended,
    NoCandidates,
    Failed,
}

/// `display` is what the user sees; `raw` never carries the debug line and is
/// the input for restaurant-name extraction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FoodAnswer {
    pub display: String,
    pub raw: String,
    pub outcome: FoodOutcome,
}

impl FoodAnswer {
    fn plain(text: String, outcome: FoodOutcome) -> Self {
        Self { display: text.clone(), raw: text, outcome }
    }

    /// Names for the wishlist buttons; only recommendation answers have any.
    pub fn restaurant_names(&self) -> Vec<String> {
        match self.outcome {
            FoodOutcome::Recommended => extract_restaurant_names(&self.raw),
            FoodOutcome::NoCandidates | FoodOutcome::Failed => Vec::new(),
        }
    }
}

pub fn llm_failure_message(error: impl std::fmt::Display) -> String {
    format!("抱歉，呼叫 LLM 失敗：{error}")
}

#[derive(Clone, Copy, Debug)]
pub struct PipelineSettings {
    pub search_radius_m: u32,
    pub default_filters: TravelFilters,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self { search_radius_m: 2_000, default_filters: TravelFilters::default() }
    }
}

pub struct FoodQueryPipeline {
    llm: Arc<dyn LlmClient>,
    extractor: GenerativeExtractor,
    places: Arc<dyn PlaceProvider>,
    weather: Arc<dyn WeatherProvider>,
    styles: Arc<dyn StyleRepository>,
    clock: Arc<dyn Clock>,
    settings: PipelineSettings,
}

impl FoodQueryPipeline {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        places: Arc<dyn PlaceProvider>,
        weather: Arc<dyn WeatherProvider>,
        styles: Arc<dyn StyleRepository>,
        clock: Arc<dyn Clock>,
        settings: PipelineSettings,
    ) -> Self {
        let extractor = GenerativeExtractor::new(llm.clone());
        Self { llm, extractor, places, weather, styles, clock, settings }
    }

    /// Extraction never fails; every field ends up resolved.
    pub async fn resolve_query(&self, text: &str) -> FoodQuery {
        let extracted = self.extractor.extract_food_query(text).await;
        let detected = heuristics::detect_food_location(text);

        let dish = non_empty(extracted.dish).or_else(|| heuristics::fallback_dish(text));
        let location_label = non_empty(extracted.location)
            .or_else(|| heuristics::fallback_location_label(text))
            .unwrap_or(detected.label);

        let (meal_period, meal_source) = match heuristics::detect_meal_from_text(text) {
            Some(period) => (period, MealSource::FromText),
            None => (heuristics::infer_meal_by_time(&self.clock.now()), MealSource::FromTime),
        };

        let filters = self.extractor.extract_food_filters(text, self.settings.default_filters).await;

        FoodQuery {
            raw_text: text.to_string(),
            dish,
            location_label: Some(location_label),
            resolved_city: detected.city,
            meal_period,
            meal_source,
            filters,
        }
    }

    pub async fn run(&self, text: &str, guild: Option<GuildId>) -> FoodAnswer {
        let query = self.resolve_query(text).await;
        let label = query.location_label.clone().unwrap_or_default();
        let keyword = query.search_keyword();

        let origin = match self.places.geocode(&label).await {
            Ok(origin) => origin,
            Err(error) => return geocode_failed(&query, &label, error),
        };
        let weather = self.resolve_weather(&query, origin).await;

        let candidates = match self.find_candidates(&keyword, origin, &query.filters).await {
            Ok(candidates) => candidates,
            Err(error) => return search_failed(&query, error),
        };

        if candidates.is_empty() {
            info!(
                event_name = "agent.pipeline.no_candidates",
                location = %label,
                keyword = %keyword,
                "no place passed the filters"
            );
            return FoodAnswer::plain(no_candidates_message(&query, &label, &keyword), FoodOutcome::NoCandidates);
        }

        let style = match guild {
            Some(guild) => self.styles.get(guild).await,
            None => None,
        };
        let prompt = synthesis_prompt(
            &query,
            &label,
            &self.clock.now().format("%H:%M").to_string(),
            &weather_json(&weather, &query.resolved_city),
            &format_candidates(&query, &label, &keyword, &candidates),
            style.as_deref(),
        );

        match self.llm.complete(&prompt).await {
            Ok(raw) => {
                info!(
                    event_name = "agent.pipeline.completed",
                    candidates = candidates.len(),
                    "recommendation generated"
                );
                FoodAnswer {
                    display: format!("{}\n\n{raw}", debug_line(&query, &label)),
                    raw,
                    outcome: FoodOutcome::Recommended,
                }
            }
            Err(error) => {
                warn!(event_name = "agent.pipeline.generator_failed", error = %error, "synthesis failed");
                FoodAnswer::plain(llm_failure_message(error), FoodOutcome::Failed)
            }
        }
    }

    /// Weather at the search origin, else by the resolved city name.
    async fn resolve_weather(&self, query: &FoodQuery, origin: Coordinates) -> Result<WeatherSnapshot, GatewayError> {
        match self.weather.weather_at(origin).await {
            Ok(snapshot) => Ok(WeatherSnapshot { city: query.resolved_city.clone(), ..snapshot }),
            Err(_) => self.weather.weather_for_city(&query.resolved_city).await,
        }
    }

    pub async fn find_candidates(
        &self,
        keyword: &str,
        origin: Coordinates,
        filters: &TravelFilters,
    ) -> Result<Vec<PlaceCandidate>, GatewayError> {
        let stubs = self.places.search_places(keyword, origin, self.settings.search_radius_m).await?;
        let mut candidates = Vec::new();

        for stub in stubs {
            let details = self.places.place_details(&stub.place_id).await?;
            if !filters.admits(details.rating, details.review_count) {
                continue;
            }

            let travel_minutes =
                self.places.travel_minutes(origin, stub.location, filters.travel_mode).await?;
            if !filters.within_reach(travel_minutes) {
                continue;
            }

            candidates.push(PlaceCandidate {
                name: details.name,
                rating: details.rating,
                review_count: details.review_count,
                price_level: details.price_level,
                address: details.address,
                map_url: details.map_url.unwrap_or_else(|| fallback_map_url(&stub.place_id)),
                opening_hours_text: details.opening_hours.first().cloned(),
                travel_minutes,
                recommended_dishes: extract_recommended_dishes(&details.reviews),
                review_snippet: top_review_snippet(&details.reviews),
            });
            if candidates.len() >= MAX_CANDIDATES {
                break;
            }
        }

        Ok(candidates)
    }
}

/// An unknown place gets its own hint; other failures keep provider detail in the log.
fn geocode_failed(query: &FoodQuery, label: &str, error: GatewayError) -> FoodAnswer {
    if !error.is_not_found() {
        return search_failed(query, error);
    }
    warn!(
        event_name = "agent.pipeline.location_not_found",
        provider = error.provider.as_str(),
        location = %label,
        error = %error,
        "search location could not be geocoded"
    );
    FoodAnswer::plain(
        format!("找不到「{label}」這個地點，換個地名或說得更具體一點再試試。"),
        FoodOutcome::Failed,
    )
}

fn search_failed(query: &FoodQuery, error: GatewayError) -> FoodAnswer {
    warn!(
        event_name = "agent.pipeline.search_failed",
        provider = error.provider.as_str(),
        city = %query.resolved_city,
        error = %error,
        "place search aborted"
    );
    FoodAnswer::plain(format!("抱歉，搜尋餐廳失敗：{}", error.message), FoodOutcome::Failed)
}

fn debug_line(query: &FoodQuery, label: &str) -> String {
    format!("🔎 解析：地點「{label}」｜料理「{}」", query.dish.as_deref().unwrap_or("未指定"))
}

fn weather_json(weather: &Result<WeatherSnapshot, GatewayError>, city: &str) -> String {
    match weather {
        Ok(snapshot) => snapshot.to_prompt_json(),
        Err(error) => json!({ "city": city, "error": error.message }).to_string(),
    }
}

fn no_candidates_message(query: &FoodQuery, label: &str, keyword: &str) -> String {
    let filters = &query.filters;
    format!(
        "在 {label} 附近找不到符合條件的「{keyword}」餐廳。\n\
         可以試試：\n\
         ・放寬交通時間（目前是{mode} {minutes} 分鐘內）\n\
         ・降低評分或評論數門檻（目前是 {rating} 星以上、{reviews} 則評論以上）\n\
         ・換個關鍵字或地點，例如「成大 拉麵」或「台南火車站 牛肉湯」",
        mode = filters.travel_mode.label(),
        minutes = filters.max_travel_minutes,
        rating = filters.min_rating,
        reviews = filters.min_review_count,
    )
}

pub fn format_candidates(
    query: &FoodQuery,
    label: &str,
    keyword: &str,
    candidates: &[PlaceCandidate],
) -> String {
    let mode = query.filters.travel_mode.label();
    let mut output = format!("以下是 {label} 附近推薦的「{keyword}」餐廳：\n\n");

    for (index, place) in candidates.iter().enumerate() {
        let price = place.price_level.map_or_else(|| "未知".to_string(), |level| level.to_string());
        let dishes = if place.recommended_dishes.is_empty() {
            "暫無明確推薦".to_string()
        } else {
            place.recommended_dishes.join(", ")
        };
        let snippet = if place.review_snippet.is_empty() {
            "（評論過少，暫無精選）"
        } else {
            place.review_snippet.as_str()
        };

        let _ = writeln!(
            output,
            "{number}. {name}\n   ⏱️ 約 {minutes} 分鐘{mode}\n   ⭐ 評分 {rating}（{reviews} 則評論）\n   \
             💰 價位等級：{price}\n   ⏰ 營業：{hours}\n   🍽️ 必點：{dishes}\n   💬 精選評論：{snippet}\n   \
             📍 地址：{address}\n   🗺️ 地圖：{map}\n",
            number = index + 1,
            name = place.name,
            minutes = place.travel_minutes,
            rating = place.rating,
            reviews = place.review_count,
            hours = place.opening_hours_text.as_deref().unwrap_or("營業時間未提供"),
            address = place.address,
            map = place.map_url,
        );
    }

    output.push_str("請根據天氣、距離與價位，選出 3–5 家最適合的並給出簡短推薦理由。");
    output
}

fn synthesis_prompt(
    query: &FoodQuery,
    label: &str,
    local_time: &str,
    weather_json: &str,
    candidate_text: &str,
    style: Option<&str>,
) -> String {
    let filters = &query.filters;
    let style_line = style
        .map(|style| format!("回覆風格：{style}（只調整語氣與用字，店名、數字與連結保持原樣）\n"))
        .unwrap_or_default();

    format!(
        "你是台灣在地的美食推薦助理。\n\
         {style_line}\
         使用者需求：{text}\n\
         搜尋地點：{label}\n\
         篩選條件：{mode} {minutes} 分鐘內、評分 {rating} 以上、評論數 {reviews} 以上\n\
         餐別：{meal}（來源：{source}）\n\
         現在時間（台灣）：{local_time}\n\
         天氣資料：{weather_json}\n\
         搜尋結果（包含距離/評分/評論數/價位/必點/評論摘要）：\n\
         {candidate_text}\n\n\
         請用繁中給 3~5 家推薦，格式示例：\n\
         1. 店名\n\
         \x20  距離/時間：xx\n\
         \x20  價位：xx\n\
         \x20  評分：xx\n\
         \x20  必點：菜名1；菜名2；菜名3（若沒有必點請寫：暫無明確推薦）\n\
         \x20  地圖：直接貼上 Google Maps 連結（必填，不可省略）\n\
         \x20  推薦理由：一句話\n\
         \x20  營業：營業時間或未提供\n\
         必須把「必點」欄位列出具體菜名，避免只寫“推薦招牌”；每家都要附 Google Maps 連結。",
        text = query.raw_text,
        mode = filters.travel_mode.label(),
        minutes = filters.max_travel_minutes,
        rating = filters.min_rating,
        reviews = filters.min_review_count,
        meal = query.meal_period.label(),
        source = query.meal_source.label(),
    )
}
