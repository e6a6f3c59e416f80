use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::food::{TravelFilters, TravelMode};

static DRIVING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(車程|開車|駕車|行車|車行|汽車)").expect("valid driving regex"));
static WALKING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(步行|走路)").expect("valid walking regex"));
static BICYCLING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(騎車|自行車|腳踏車|單車)").expect("valid bicycling regex")
});
static MINUTES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:車程|開車|駕車|行車|車行|步行|走路|騎車|自行車|腳踏車|單車)?\s*(\d{1,3})\s*分(?:鐘)?\s*(?:內|以內|左右)?",
    )
    .expect("valid minutes regex")
});
static RATING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:評分|評價)?\s*([0-5](?:\.\d)?)\s*星?\s*(?:以上|起|或以上)")
        .expect("valid rating regex")
});
static REVIEWS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:至少|最少)?\s*(\d{2,6})\s*(?:則|个|個)?\s*評?論(?:數量)?\s*(?:以上|起|或以上)?",
    )
    .expect("valid reviews regex")
});

/// Regex-only filter extraction. Each field is matched independently and keeps
/// the value from `defaults` when its pattern is absent.
pub fn extract_food_filters(text: &str, defaults: TravelFilters) -> TravelFilters {
    let mut filters = defaults;

    if DRIVING.is_match(text) {
        filters.travel_mode = TravelMode::Driving;
    } else if WALKING.is_match(text) {
        filters.travel_mode = TravelMode::Walking;
    } else if BICYCLING.is_match(text) {
        filters.travel_mode = TravelMode::Bicycling;
    }

    if let Some(minutes) = first_capture(&MINUTES, text).and_then(|raw| raw.parse().ok()) {
        filters.max_travel_minutes = minutes;
    }
    if let Some(rating) = first_capture(&RATING, text).and_then(|raw| raw.parse().ok()) {
        filters.min_rating = rating;
    }
    if let Some(reviews) = first_capture(&REVIEWS, text).and_then(|raw| raw.parse().ok()) {
        filters.min_review_count = reviews;
    }

    filters
}

fn first_capture<'t>(pattern: &Regex, text: &'t str) -> Option<&'t str> {
    pattern.captures(text).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}
