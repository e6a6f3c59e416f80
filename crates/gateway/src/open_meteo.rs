use async_trait::async_trait;
use chowbot_core::domain::place::Coordinates;
use chowbot_core::domain::weather::WeatherSnapshot;
use chowbot_core::errors::{GatewayError, Provider};
use reqwest::Client;
use serde::Deserialize;

use crate::http::{build_client, get_json};
use crate::WeatherProvider;

const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Open-Meteo needs no credential.
pub struct OpenMeteoClient {
    client: Client,
}

impl OpenMeteoClient {
    pub fn new(timeout_secs: u64) -> Result<Self, GatewayError> {
        Ok(Self { client: build_client(Provider::OpenMeteo, timeout_secs)? })
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    async fn geocode_city(&self, city: &str) -> Result<Coordinates, GatewayError> {
        let params = [
            ("name", city.to_string()),
            ("count", "1".to_string()),
            ("language", "zh".to_string()),
            ("format", "json".to_string()),
        ];
        let response: CitySearchResponse =
            get_json(&self.client, Provider::OpenMeteo, GEOCODING_URL, &params).await?;
        parse_city_search(response, city)
    }

    async fn weather_at(&self, coords: Coordinates) -> Result<WeatherSnapshot, GatewayError> {
        let params = [
            ("latitude", coords.lat.to_string()),
            ("longitude", coords.lng.to_string()),
            ("current_weather", "true".to_string()),
        ];
        let response: ForecastResponse =
            get_json(&self.client, Provider::OpenMeteo, FORECAST_URL, &params).await?;
        Ok(parse_forecast(response))
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CitySearchResponse {
    #[serde(default)]
    results: Vec<CityResult>,
}

#[derive(Debug, Deserialize)]
struct CityResult {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ForecastResponse {
    current_weather: Option<CurrentWeather>,
}

#[derive(Debug, Default, Deserialize)]
struct CurrentWeather {
    temperature: Option<f64>,
    windspeed: Option<f64>,
    weathercode: Option<i64>,
}

pub(crate) fn parse_city_search(
    response: CitySearchResponse,
    city: &str,
) -> Result<Coordinates, GatewayError> {
    response
        .results
        .into_iter()
        .next()
        .map(|result| Coordinates::new(result.latitude, result.longitude))
        .ok_or_else(|| GatewayError::not_found(Provider::OpenMeteo, format!("找不到城市：{city}")))
}

pub(crate) fn parse_forecast(response: ForecastResponse) -> WeatherSnapshot {
    let current = response.current_weather.unwrap_or_default();
    WeatherSnapshot {
        city: String::new(),
        temperature_c: current.temperature,
        wind_speed: current.windspeed,
        weather_code: current.weathercode,
    }
}
