//! Deterministic text heuristics. No I/O; the only failure mode is "no match".

pub mod dish;
pub mod filters;
pub mod location;
pub mod meal;
pub mod nutrition;

pub use dish::fallback_dish;
pub use filters::extract_food_filters;
pub use location::{
    detect_food_location, extract_city, extract_english_location, fallback_location_label,
    LocationMatch, DEFAULT_CITY, DEFAULT_LOCATION_LABEL,
};
pub use meal::{detect_meal_from_text, infer_meal_by_time, taipei_now};
pub use nutrition::extract_nutrition_target;
