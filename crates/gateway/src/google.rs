use async_trait::async_trait;
use chowbot_core::domain::food::TravelMode;
use chowbot_core::domain::place::{Coordinates, PlaceDetails, PlaceStub, Review};
use chowbot_core::errors::{GatewayError, Provider};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::http::{build_client, get_json};
use crate::PlaceProvider;

const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const TEXT_SEARCH_URL: &str = "https://maps.googleapis.com/maps/api/place/textsearch/json";
const DETAILS_URL: &str = "https://maps.googleapis.com/maps/api/place/details/json";
const DISTANCE_MATRIX_URL: &str = "https://maps.googleapis.com/maps/api/distancematrix/json";
const LANGUAGE: &str = "zh-TW";
const DETAIL_FIELDS: &str = "name,rating,user_ratings_total,price_level,formatted_address,reviews,opening_hours,opening_hours.weekday_text,url";

/// Travel time reported when the distance matrix has no route.
pub const UNREACHABLE_MINUTES: u32 = 999;

pub struct GoogleMapsClient {
    client: Client,
    api_key: SecretString,
}

impl GoogleMapsClient {
    /// Fails when no key is configured so a missing credential surfaces at startup.
    pub fn new(api_key: Option<&str>, timeout_secs: u64) -> Result<Self, GatewayError> {
        let api_key = api_key.map(str::trim).filter(|key| !key.is_empty()).ok_or_else(|| {
            GatewayError::configuration(
                Provider::GoogleMaps,
                "GOOGLE_API_KEY is not set (gateway.google_api_key)",
            )
        })?;

        Ok(Self {
            client: build_client(Provider::GoogleMaps, timeout_secs)?,
            api_key: SecretString::from(api_key.to_string()),
        })
    }

    fn params(&self, extra: &[(&'static str, String)]) -> Vec<(&'static str, String)> {
        let mut params = extra.to_vec();
        params.push(("key", self.api_key.expose_secret().to_string()));
        params.push(("language", LANGUAGE.to_string()));
        params
    }
}

#[async_trait]
impl PlaceProvider for GoogleMapsClient {
    async fn geocode(&self, location: &str) -> Result<Coordinates, GatewayError> {
        let params = self.params(&[("address", location.to_string())]);
        let response: GeocodeResponse =
            get_json(&self.client, Provider::GoogleMaps, GEOCODE_URL, &params).await?;
        parse_geocode(response, location)
    }

    async fn search_places(
        &self,
        query: &str,
        origin: Coordinates,
        radius_m: u32,
    ) -> Result<Vec<PlaceStub>, GatewayError> {
        let params = self.params(&[
            ("query", format!("{query} 餐廳")),
            ("location", origin.to_string()),
            ("radius", radius_m.to_string()),
        ]);
        let response: TextSearchResponse =
            get_json(&self.client, Provider::GoogleMaps, TEXT_SEARCH_URL, &params).await?;
        parse_text_search(response)
    }

    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, GatewayError> {
        let params = self.params(&[
            ("place_id", place_id.to_string()),
            ("fields", DETAIL_FIELDS.to_string()),
            ("review_sort", "newest".to_string()),
        ]);
        let response: DetailsResponse =
            get_json(&self.client, Provider::GoogleMaps, DETAILS_URL, &params).await?;
        Ok(parse_details(response))
    }

    async fn travel_minutes(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        mode: TravelMode,
    ) -> Result<u32, GatewayError> {
        let params = self.params(&[
            ("origins", origin.to_string()),
            ("destinations", destination.to_string()),
            ("mode", mode.as_str().to_string()),
        ]);
        let response: DistanceMatrixResponse =
            get_json(&self.client, Provider::GoogleMaps, DISTANCE_MATRIX_URL, &params).await?;
        parse_distance_matrix(response)
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GeocodeResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TextSearchResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    results: Vec<TextSearchResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextSearchResult {
    place_id: Option<String>,
    #[serde(default)]
    name: String,
    geometry: Option<Geometry>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DetailsResponse {
    result: Option<DetailsResult>,
}

#[derive(Debug, Default, Deserialize)]
struct DetailsResult {
    #[serde(default)]
    name: String,
    rating: Option<f64>,
    user_ratings_total: Option<u32>,
    price_level: Option<u8>,
    #[serde(default)]
    formatted_address: String,
    #[serde(default)]
    reviews: Vec<ReviewResult>,
    opening_hours: Option<OpeningHours>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReviewResult {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpeningHours {
    #[serde(default)]
    weekday_text: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DistanceMatrixResponse {
    #[serde(default)]
    rows: Vec<DistanceRow>,
}

#[derive(Debug, Deserialize)]
struct DistanceRow {
    #[serde(default)]
    elements: Vec<DistanceElement>,
}

#[derive(Debug, Deserialize)]
struct DistanceElement {
    #[serde(default)]
    status: String,
    duration: Option<DistanceValue>,
}

#[derive(Debug, Deserialize)]
struct DistanceValue {
    value: f64,
}

fn check_status(status: &str, error_message: Option<&str>) -> Result<(), GatewayError> {
    match status {
        "" | "OK" | "ZERO_RESULTS" => Ok(()),
        other => Err(GatewayError::invalid_response(
            Provider::GoogleMaps,
            match error_message {
                Some(message) => format!("{other}: {message}"),
                None => other.to_string(),
            },
        )),
    }
}

pub(crate) fn parse_geocode(
    response: GeocodeResponse,
    location: &str,
) -> Result<Coordinates, GatewayError> {
    check_status(&response.status, response.error_message.as_deref())?;
    let first = response.results.into_iter().next().ok_or_else(|| {
        GatewayError::not_found(Provider::GoogleMaps, format!("Geocode failed for location: {location}"))
    })?;
    Ok(Coordinates::new(first.geometry.location.lat, first.geometry.location.lng))
}

pub(crate) fn parse_text_search(
    response: TextSearchResponse,
) -> Result<Vec<PlaceStub>, GatewayError> {
    check_status(&response.status, response.error_message.as_deref())?;
    let stubs: Vec<PlaceStub> = response
        .results
        .into_iter()
        .filter_map(|result| {
            let place_id = result.place_id?;
            let geometry = result.geometry?;
            Some(PlaceStub {
                place_id,
                name: result.name,
                location: Coordinates::new(geometry.location.lat, geometry.location.lng),
            })
        })
        .collect();
    debug!(event_name = "gateway.google.search_results", count = stubs.len(), "text search done");
    Ok(stubs)
}

/// A missing `result` object yields empty details, which every rating filter rejects.
pub(crate) fn parse_details(response: DetailsResponse) -> PlaceDetails {
    let result = response.result.unwrap_or_default();
    PlaceDetails {
        name: result.name,
        rating: result.rating.unwrap_or(0.0),
        review_count: result.user_ratings_total.unwrap_or(0),
        price_level: result.price_level,
        address: result.formatted_address,
        map_url: result.url.filter(|url| !url.trim().is_empty()),
        opening_hours: result.opening_hours.map(|hours| hours.weekday_text).unwrap_or_default(),
        reviews: result
            .reviews
            .into_iter()
            .map(|review| Review { text: review.text.unwrap_or_default() })
            .collect(),
    }
}

pub(crate) fn parse_distance_matrix(response: DistanceMatrixResponse) -> Result<u32, GatewayError> {
    let element = response
        .rows
        .into_iter()
        .next()
        .and_then(|row| row.elements.into_iter().next())
        .ok_or_else(|| {
            GatewayError::invalid_response(Provider::GoogleMaps, "distance matrix has no elements")
        })?;

    if element.status != "OK" {
        return Ok(UNREACHABLE_MINUTES);
    }

    let seconds = element.duration.map(|duration| duration.value).ok_or_else(|| {
        GatewayError::invalid_response(Provider::GoogleMaps, "distance element has no duration")
    })?;
    Ok((seconds / 60.0) as u32)
}
