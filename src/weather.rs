use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::models::{WeatherCondition, WeatherSample};

pub const OPEN_METEO_BASE_URL: &str = "https://api.open-meteo.com/v1";

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temperature_2m: f64,
    is_day: u8,
    weather_code: u16,
}

impl WeatherCondition {
    /// Maps a WMO weather interpretation code.
    pub fn from_wmo_code(code: u16) -> Self {
        match code {
            1 | 2 => WeatherCondition::PartlyCloudy,
            3 => WeatherCondition::Cloudy,
            51..=67 | 80..=82 => WeatherCondition::Rain,
            71..=77 | 85..=86 => WeatherCondition::Snow,
            95..=99 => WeatherCondition::Thunderstorm,
            _ => WeatherCondition::Clear,
        }
    }

    pub fn icon_name(&self, is_day: bool) -> &'static str {
        match (self, is_day) {
            (WeatherCondition::Clear, true) => "weather-sunny",
            (WeatherCondition::Clear, false) => "weather-night",
            (WeatherCondition::PartlyCloudy, true) => "weather-partly-cloudy",
            (WeatherCondition::PartlyCloudy, false) => "weather-night-partly-cloudy",
            (WeatherCondition::Cloudy, _) => "weather-cloudy",
            (WeatherCondition::Rain, _) => "weather-rainy",
            (WeatherCondition::Snow, _) => "weather-snowy",
            (WeatherCondition::Thunderstorm, _) => "weather-lightning-rainy",
        }
    }
}

/// Current-conditions lookup against Open-Meteo. No API key needed.
#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: String,
}

impl Default for WeatherClient {
    fn default() -> Self {
        Self::new(OPEN_METEO_BASE_URL)
    }
}

impl WeatherClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn fetch_current(&self, latitude: f64, longitude: f64) -> Result<WeatherSample> {
        let url = format!("{}/forecast", self.base_url);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current", "temperature_2m,is_day,weather_code".to_string()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Weather lookup failed: {} - {}", status, body));
        }

        let forecast: ForecastResponse = resp.json().await?;
        Ok(WeatherSample {
            temperature: forecast.current.temperature_2m.round(),
            condition: WeatherCondition::from_wmo_code(forecast.current.weather_code),
            is_day: forecast.current.is_day == 1,
        })
    }

    /// Like [`fetch_current`](Self::fetch_current), but a failed lookup is
    /// logged and reported as no reading.
    #[instrument(skip(self))]
    pub async fn current(&self, latitude: f64, longitude: f64) -> Option<WeatherSample> {
        match self.fetch_current(latitude, longitude).await {
            Ok(sample) => Some(sample),
            Err(e) => {
                warn!("weather unavailable: {:#}", e);
                None
            }
        }
    }
}
