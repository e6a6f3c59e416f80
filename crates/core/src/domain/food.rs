use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::meal::{MealPeriod, MealSource};

pub const DEFAULT_MAX_TRAVEL_MINUTES: u32 = 20;
pub const DEFAULT_MIN_RATING: f64 = 3.5;
pub const DEFAULT_MIN_REVIEW_COUNT: u32 = 0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    #[default]
    Walking,
    Driving,
    Bicycling,
    Transit,
}

impl TravelMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Walking => "walking",
            Self::Driving => "driving",
            Self::Bicycling => "bicycling",
            Self::Transit => "transit",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Walking => "步行",
            Self::Driving => "車程",
            Self::Bicycling => "騎車",
            Self::Transit => "大眾運輸",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownTravelMode(pub String);

impl fmt::Display for UnknownTravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown travel mode `{}`", self.0)
    }
}

impl std::error::Error for UnknownTravelMode {}

impl FromStr for TravelMode {
    type Err = UnknownTravelMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "walking" => Ok(Self::Walking),
            "driving" => Ok(Self::Driving),
            "bicycling" => Ok(Self::Bicycling),
            "transit" => Ok(Self::Transit),
            other => Err(UnknownTravelMode(other.to_string())),
        }
    }
}

/// Constraints bounding the place search. Every field always carries a value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TravelFilters {
    pub max_travel_minutes: u32,
    pub min_rating: f64,
    pub min_review_count: u32,
    pub travel_mode: TravelMode,
}

impl Default for TravelFilters {
    fn default() -> Self {
        Self {
            max_travel_minutes: DEFAULT_MAX_TRAVEL_MINUTES,
            min_rating: DEFAULT_MIN_RATING,
            min_review_count: DEFAULT_MIN_REVIEW_COUNT,
            travel_mode: TravelMode::Walking,
        }
    }
}

impl TravelFilters {
    pub fn admits(&self, rating: f64, review_count: u32) -> bool {
        rating >= self.min_rating && review_count >= self.min_review_count
    }

    pub fn within_reach(&self, travel_minutes: u32) -> bool {
        travel_minutes <= self.max_travel_minutes
    }
}

/// Structured intent for one food request. Built per message and dropped after the reply.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FoodQuery {
    pub raw_text: String,
    pub dish: Option<String>,
    pub location_label: Option<String>,
    pub resolved_city: String,
    pub meal_period: MealPeriod,
    pub meal_source: MealSource,
    pub filters: TravelFilters,
}

impl FoodQuery {
    /// Search keyword: the dish alone when the text named a meal, else the meal
    /// label prefixed to the dish or, lacking one, the raw text.
    pub fn search_keyword(&self) -> String {
        let subject = self.dish.as_deref().unwrap_or(&self.raw_text);
        match self.meal_source {
            MealSource::FromText => subject.to_string(),
            MealSource::FromTime => format!("{} {}", self.meal_period.label(), subject),
        }
    }
}

pub fn non_empty(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{FoodQuery, TravelFilters, TravelMode};
    use crate::domain::meal::{MealPeriod, MealSource};

    fn query(dish: Option<&str>, meal_source: MealSource) -> FoodQuery {
        FoodQuery {
            raw_text: "台南成大附近拉麵".to_string(),
            dish: dish.map(str::to_string),
            location_label: None,
            resolved_city: "Tainan".to_string(),
            meal_period: MealPeriod::Dinner,
            meal_source,
            filters: TravelFilters::default(),
        }
    }

    #[test]
    fn defaults_match_documented_values() {
        let filters = TravelFilters::default();
        assert_eq!(filters.max_travel_minutes, 20);
        assert_eq!(filters.min_rating, 3.5);
        assert_eq!(filters.min_review_count, 0);
        assert_eq!(filters.travel_mode, TravelMode::Walking);
    }

    #[test]
    fn travel_mode_parses_known_values_only() {
        assert_eq!("Driving".parse::<TravelMode>(), Ok(TravelMode::Driving));
        assert!("teleport".parse::<TravelMode>().is_err());
    }

    #[test]
    fn search_keyword_prefixes_meal_only_when_inferred_from_time() {
        assert_eq!(query(Some("拉麵"), MealSource::FromText).search_keyword(), "拉麵");
        assert_eq!(query(Some("拉麵"), MealSource::FromTime).search_keyword(), "晚餐 拉麵");
        assert_eq!(query(None, MealSource::FromTime).search_keyword(), "晚餐 台南成大附近拉麵");
    }

    #[test]
    fn filters_check_rating_reviews_and_reach() {
        let filters = TravelFilters { min_review_count: 100, ..TravelFilters::default() };
        assert!(filters.admits(4.0, 100));
        assert!(!filters.admits(3.4, 500));
        assert!(!filters.admits(4.8, 99));
        assert!(filters.within_reach(20));
        assert!(!filters.within_reach(21));
    }
}
