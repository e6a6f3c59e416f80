//! Scripted collaborators shared by the unit tests in this crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chowbot_core::domain::food::TravelMode;
use chowbot_core::domain::place::{Coordinates, PlaceDetails, PlaceStub};
use chowbot_core::domain::weather::WeatherSnapshot;
use chowbot_core::errors::{GatewayError, Provider};
use chowbot_gateway::{FoodMatch, NutrientEntry, NutritionProvider, PlaceProvider, WeatherProvider};

use crate::llm::{GeneratorError, LlmClient};

type Script = Box<dyn Fn(&str) -> Result<String, GeneratorError> + Send + Sync>;

pub struct ScriptedLlm {
    script: Script,
    configured: bool,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(script: impl Fn(&str) -> Result<String, GeneratorError> + Send + Sync + 'static) -> Self {
        Self { script: Box::new(script), configured: true, prompts: Mutex::new(Vec::new()) }
    }

    pub fn always(answer: &'static str) -> Self {
        Self::new(move |_| Ok(answer.to_string()))
    }

    pub fn unconfigured() -> Self {
        Self { configured: false, ..Self::new(|_| Err(GeneratorError::NotConfigured)) }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|prompts| prompts.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts().len()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String, GeneratorError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        (self.script)(prompt)
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

/// Place provider over a fixed set of stubs; travel time is keyed by place id.
#[derive(Default)]
pub struct FakePlaces {
    pub origin: Option<Coordinates>,
    pub stubs: Vec<PlaceStub>,
    pub details: HashMap<String, PlaceDetails>,
    pub minutes: HashMap<String, u32>,
    pub searches: Mutex<Vec<String>>,
    pub geocoded: Mutex<Vec<String>>,
    pub detail_calls: AtomicUsize,
    pub travel_calls: AtomicUsize,
}

impl FakePlaces {
    pub fn near(origin: Coordinates) -> Self {
        Self { origin: Some(origin), ..Self::default() }
    }

    pub fn with_place(mut self, id: &str, rating: f64, reviews: u32, minutes: u32) -> Self {
        let index = self.stubs.len() as f64;
        self.stubs.push(PlaceStub {
            place_id: id.to_string(),
            name: id.to_string(),
            location: Coordinates::new(23.0 + index / 100.0, 120.2),
        });
        self.details.insert(
            id.to_string(),
            PlaceDetails {
                name: id.to_string(),
                rating,
                review_count: reviews,
                address: format!("{id} 地址"),
                ..PlaceDetails::default()
            },
        );
        self.minutes.insert(id.to_string(), minutes);
        self
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().map(|searches| searches.clone()).unwrap_or_default()
    }

    pub fn geocoded(&self) -> Vec<String> {
        self.geocoded.lock().map(|labels| labels.clone()).unwrap_or_default()
    }

    fn id_at(&self, destination: Coordinates) -> Option<&str> {
        self.stubs.iter().find(|stub| stub.location == destination).map(|stub| stub.place_id.as_str())
    }
}

#[async_trait]
impl PlaceProvider for FakePlaces {
    async fn geocode(&self, location: &str) -> Result<Coordinates, GatewayError> {
        if let Ok(mut labels) = self.geocoded.lock() {
            labels.push(location.to_string());
        }
        self.origin.ok_or_else(|| GatewayError::not_found(Provider::GoogleMaps, format!("Geocode failed for location: {location}")))
    }

    async fn search_places(
        &self,
        query: &str,
        _origin: Coordinates,
        _radius_m: u32,
    ) -> Result<Vec<PlaceStub>, GatewayError> {
        if let Ok(mut searches) = self.searches.lock() {
            searches.push(query.to_string());
        }
        Ok(self.stubs.clone())
    }

    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, GatewayError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.details
            .get(place_id)
            .cloned()
            .ok_or_else(|| GatewayError::not_found(Provider::GoogleMaps, place_id.to_string()))
    }

    async fn travel_minutes(
        &self,
        _origin: Coordinates,
        destination: Coordinates,
        _mode: TravelMode,
    ) -> Result<u32, GatewayError> {
        self.travel_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.id_at(destination).and_then(|id| self.minutes.get(id).copied()).unwrap_or(999))
    }
}

pub struct FakeWeather {
    pub snapshot: Option<WeatherSnapshot>,
}

impl FakeWeather {
    pub fn sunny() -> Self {
        Self {
            snapshot: Some(WeatherSnapshot {
                city: String::new(),
                temperature_c: Some(27.5),
                wind_speed: Some(8.0),
                weather_code: Some(1),
            }),
        }
    }

    pub fn failing() -> Self {
        Self { snapshot: None }
    }
}

#[async_trait]
impl WeatherProvider for FakeWeather {
    async fn geocode_city(&self, city: &str) -> Result<Coordinates, GatewayError> {
        match self.snapshot {
            Some(_) => Ok(Coordinates::new(22.99, 120.21)),
            None => Err(GatewayError::not_found(Provider::OpenMeteo, format!("找不到城市：{city}"))),
        }
    }

    async fn weather_at(&self, _coords: Coordinates) -> Result<WeatherSnapshot, GatewayError> {
        self.snapshot
            .clone()
            .ok_or_else(|| GatewayError::transport(Provider::OpenMeteo, "request timed out"))
    }
}

/// Nutrition provider that knows one food.
pub struct FakeNutrition {
    pub known: &'static str,
    pub queries: Mutex<Vec<String>>,
}

impl FakeNutrition {
    pub fn knowing(known: &'static str) -> Self {
        Self { known, queries: Mutex::new(Vec::new()) }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|queries| queries.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl NutritionProvider for FakeNutrition {
    async fn search_food(&self, query: &str) -> Result<FoodMatch, GatewayError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.to_string());
        }
        if query.eq_ignore_ascii_case(self.known) {
            Ok(FoodMatch { fdc_id: 171_077, description: self.known.to_string() })
        } else {
            Err(GatewayError::not_found(Provider::Usda, query.to_string()))
        }
    }

    async fn food_nutrients(&self, _fdc_id: u64) -> Result<Vec<NutrientEntry>, GatewayError> {
        Ok(vec![
            NutrientEntry::named("Energy", 165.0, "KCAL"),
            NutrientEntry::named("Protein", 31.0, "G"),
            NutrientEntry::named("Sodium, Na", 74.0, "MG"),
        ])
    }
}
