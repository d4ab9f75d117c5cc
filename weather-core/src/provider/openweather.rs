use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::ProviderSettings;
use crate::error::{ConfigError, WeatherError};

use super::WeatherProvider;

/// Client for the OpenWeather `data/2.5` API.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    language: String,
    http: Client,
}

impl OpenWeatherClient {
    /// Build a client from validated settings. Never touches the network.
    pub fn new(settings: &ProviderSettings) -> Result<Self, ConfigError> {
        let api_key = settings.api_key.trim();
        if api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        let base_url = settings.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|_| ConfigError::InvalidBaseUrl(base_url.clone()))?;

        if settings.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            api_key: api_key.to_string(),
            base_url,
            language: settings.language.clone(),
            http,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        city: &str,
        country: &str,
        extra: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let location = format!("{city},{country}");

        let mut query: Vec<(&str, String)> = vec![
            ("q", location),
            ("appid", self.api_key.clone()),
            ("units", "metric".to_string()),
            ("lang", self.language.clone()),
        ];
        query.extend(extra.iter().cloned());

        tracing::debug!(endpoint, city, country, "requesting OpenWeather");

        let res = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| WeatherError::from_transport(e, city))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::warn!(endpoint, city, %status, "OpenWeather request failed");
            return Err(WeatherError::from_status(status, city, &body));
        }

        res.json::<T>()
            .await
            .map_err(|e| WeatherError::from_transport(e, city))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn fetch_current(
        &self,
        city: &str,
        country: &str,
    ) -> Result<OwCurrentResponse, WeatherError> {
        self.get_json("weather", city, country, &[]).await
    }

    async fn fetch_forecast(
        &self,
        city: &str,
        country: &str,
        sample_count: u32,
    ) -> Result<OwForecastResponse, WeatherError> {
        self.get_json("forecast", city, country, &[("cnt", sample_count.to_string())])
            .await
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwMain {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub pressure: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwWeather {
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwWind {
    pub speed: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwSys {
    #[serde(default)]
    pub country: String,
}

/// Payload of `/weather`.
#[derive(Debug, Clone, Deserialize)]
pub struct OwCurrentResponse {
    pub name: String,
    pub main: OwMain,
    #[serde(default)]
    pub weather: Vec<OwWeather>,
    pub wind: OwWind,
    /// Meters.
    #[serde(default)]
    pub visibility: Option<f64>,
    pub sys: OwSys,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwCity {
    pub name: String,
    #[serde(default)]
    pub country: String,
    /// Shift in seconds from UTC.
    #[serde(default)]
    pub timezone: i32,
}

/// One 3-hour sample of `/forecast`.
#[derive(Debug, Clone, Deserialize)]
pub struct OwForecastEntry {
    pub dt: i64,
    pub main: OwMain,
    #[serde(default)]
    pub weather: Vec<OwWeather>,
    pub wind: OwWind,
    #[serde(default)]
    pub visibility: Option<f64>,
}

/// Payload of `/forecast`.
#[derive(Debug, Clone, Deserialize)]
pub struct OwForecastResponse {
    pub city: OwCity,
    #[serde(default)]
    pub list: Vec<OwForecastEntry>,
}
