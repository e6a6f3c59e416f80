//! Adapters to the external data providers: place search and travel time,
//! city weather and food nutrients. Each adapter maps one request to a
//! structured result and reports failures as [`GatewayError`].

pub mod dishes;
pub mod google;
mod http;
pub mod open_meteo;
pub mod usda;

use async_trait::async_trait;
use chowbot_core::domain::food::TravelMode;
use chowbot_core::domain::place::{Coordinates, PlaceDetails, PlaceStub};
use chowbot_core::domain::weather::WeatherSnapshot;
use chowbot_core::errors::GatewayError;

pub use dishes::{extract_recommended_dishes, top_review_snippet};
pub use google::{GoogleMapsClient, UNREACHABLE_MINUTES};
pub use open_meteo::OpenMeteoClient;
pub use usda::{FoodMatch, NutrientEntry, NutritionFacts, UsdaClient};

#[async_trait]
pub trait PlaceProvider: Send + Sync {
    /// `NotFound` when the provider returns no results.
    async fn geocode(&self, location: &str) -> Result<Coordinates, GatewayError>;

    async fn search_places(
        &self,
        query: &str,
        origin: Coordinates,
        radius_m: u32,
    ) -> Result<Vec<PlaceStub>, GatewayError>;

    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, GatewayError>;

    /// [`UNREACHABLE_MINUTES`] when the provider has no route for the pair.
    async fn travel_minutes(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        mode: TravelMode,
    ) -> Result<u32, GatewayError>;
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn geocode_city(&self, city: &str) -> Result<Coordinates, GatewayError>;

    async fn weather_at(&self, coords: Coordinates) -> Result<WeatherSnapshot, GatewayError>;

    async fn weather_for_city(&self, city: &str) -> Result<WeatherSnapshot, GatewayError> {
        let coords = self.geocode_city(city).await?;
        let snapshot = self.weather_at(coords).await?;
        Ok(WeatherSnapshot { city: city.to_string(), ..snapshot })
    }
}

#[async_trait]
pub trait NutritionProvider: Send + Sync {
    /// `NotFound` when the search returns no foods.
    async fn search_food(&self, query: &str) -> Result<FoodMatch, GatewayError>;

    async fn food_nutrients(&self, fdc_id: u64) -> Result<Vec<NutrientEntry>, GatewayError>;

    async fn lookup(&self, query: &str) -> Result<NutritionFacts, GatewayError> {
        let found = self.search_food(query).await?;
        let nutrients = self.food_nutrients(found.fdc_id).await?;
        Ok(NutritionFacts::from_nutrients(found.description, &nutrients))
    }
}
