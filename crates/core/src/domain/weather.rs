use serde::{Deserialize, Serialize};

/// Current conditions as reported by the weather provider. Fields the provider omits stay `None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city: String,
    #[serde(rename = "temperature_c")]
    pub temperature_c: Option<f64>,
    #[serde(rename = "windspeed")]
    pub wind_speed: Option<f64>,
    #[serde(rename = "weathercode")]
    pub weather_code: Option<i64>,
}

impl WeatherSnapshot {
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
