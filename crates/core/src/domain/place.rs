use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Rendered as `lat,lng`, the form the places and distance APIs accept.
impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// A raw text-search hit before details are fetched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaceStub {
    pub place_id: String,
    pub name: String,
    pub location: Coordinates,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetails {
    pub name: String,
    pub rating: f64,
    pub review_count: u32,
    pub price_level: Option<u8>,
    pub address: String,
    pub map_url: Option<String>,
    pub opening_hours: Vec<String>,
    pub reviews: Vec<Review>,
}

/// A search result that passed the rating, review and travel-time filters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaceCandidate {
    pub name: String,
    pub rating: f64,
    pub review_count: u32,
    pub price_level: Option<u8>,
    pub address: String,
    pub map_url: String,
    pub opening_hours_text: Option<String>,
    pub travel_minutes: u32,
    pub recommended_dishes: Vec<String>,
    pub review_snippet: String,
}

pub fn fallback_map_url(place_id: &str) -> String {
    format!("https://www.google.com/maps/place/?q=place_id:{place_id}")
}
