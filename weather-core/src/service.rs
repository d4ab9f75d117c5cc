//! Request-level facade: defaults, validation, one provider call, normalization.

use chrono::Utc;

use crate::aggregate::{self, DayBoundary};
use crate::config::{DEFAULT_COUNTRY, ProviderSettings};
use crate::error::{ConfigError, WeatherError};
use crate::model::WeatherRecord;
use crate::provider::{OpenWeatherClient, WeatherProvider, sample_count_for};

/// Forecast length used when the caller does not ask for one.
pub const DEFAULT_FORECAST_DAYS: u32 = 5;

#[derive(Debug)]
pub struct WeatherService<P = OpenWeatherClient> {
    provider: P,
    default_country: String,
    day_boundary: DayBoundary,
}

impl WeatherService<OpenWeatherClient> {
    /// Build a service backed by OpenWeather.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, ConfigError> {
        let provider = OpenWeatherClient::new(settings)?;
        Ok(Self::new(provider)
            .with_default_country(settings.default_country.clone())
            .with_day_boundary(settings.day_boundary))
    }
}

impl<P: WeatherProvider> WeatherService<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            default_country: DEFAULT_COUNTRY.to_string(),
            day_boundary: DayBoundary::default(),
        }
    }

    pub fn with_default_country(mut self, country: impl Into<String>) -> Self {
        self.default_country = country.into();
        self
    }

    pub fn with_day_boundary(mut self, boundary: DayBoundary) -> Self {
        self.day_boundary = boundary;
        self
    }

    pub fn default_country(&self) -> &str {
        &self.default_country
    }

    pub fn day_boundary(&self) -> DayBoundary {
        self.day_boundary
    }

    /// Current conditions for `city`. `country` falls back to the configured default.
    pub async fn get_current_weather(
        &self,
        city: &str,
        country: Option<&str>,
    ) -> Result<WeatherRecord, WeatherError> {
        let city = validate_city(city)?;
        let country = self.resolve_country(country);

        tracing::info!(city, country, "fetching current weather");

        let payload = self
            .provider
            .fetch_current(city, country)
            .await
            .inspect_err(|e| log_failure("current weather", city, country, e))?;

        Ok(aggregate::normalize_current(&payload, Utc::now()))
    }

    /// Daily forecast for `city`, oldest day first, at most `days` entries
    /// (default [`DEFAULT_FORECAST_DAYS`]).
    pub async fn get_weather_forecast(
        &self,
        city: &str,
        country: Option<&str>,
        days: Option<u32>,
    ) -> Result<Vec<WeatherRecord>, WeatherError> {
        let city = validate_city(city)?;
        let country = self.resolve_country(country);
        let days = days.unwrap_or(DEFAULT_FORECAST_DAYS);
        if days == 0 {
            return Err(WeatherError::InvalidRequest(
                "days must be at least 1".to_string(),
            ));
        }

        tracing::info!(city, country, days, "fetching weather forecast");

        let payload = self
            .provider
            .fetch_forecast(city, country, sample_count_for(days))
            .await
            .inspect_err(|e| log_failure("forecast", city, country, e))?;

        let records = aggregate::normalize_forecast(&payload, days as usize, self.day_boundary);
        tracing::debug!(
            samples = payload.list.len(),
            days = records.len(),
            boundary = %self.day_boundary,
            "aggregated forecast"
        );

        Ok(records)
    }

    fn resolve_country<'a>(&'a self, country: Option<&'a str>) -> &'a str {
        country
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(&self.default_country)
    }
}

fn log_failure(request: &str, city: &str, country: &str, err: &WeatherError) {
    if err.is_client_error() {
        tracing::info!(request, city, country, error = %err, "request rejected");
    } else {
        tracing::warn!(request, city, country, error = %err, "request failed");
    }
}

fn validate_city(city: &str) -> Result<&str, WeatherError> {
    let city = city.trim();
    if city.is_empty() {
        return Err(WeatherError::InvalidRequest(
            "city must not be empty".to_string(),
        ));
    }
    Ok(city)
}
