use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::WeatherError;

pub mod openweather;

pub use openweather::{OpenWeatherClient, OwCurrentResponse, OwForecastResponse};

/// Samples per day in the provider's 3-hour forecast.
pub const SAMPLES_PER_DAY: u32 = 8;

/// The forecast endpoint never serves more than five days of samples.
pub const MAX_FORECAST_SAMPLES: u32 = 5 * SAMPLES_PER_DAY;

/// Upstream source of raw weather payloads.
///
/// Each call issues exactly one request and returns the provider-shaped
/// payload, or a classified [`WeatherError`].
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_current(
        &self,
        city: &str,
        country: &str,
    ) -> Result<OwCurrentResponse, WeatherError>;

    async fn fetch_forecast(
        &self,
        city: &str,
        country: &str,
        sample_count: u32,
    ) -> Result<OwForecastResponse, WeatherError>;
}

/// Number of 3-hour samples covering `days` days, capped at what the
/// provider can return.
pub fn sample_count_for(days: u32) -> u32 {
    days.saturating_mul(SAMPLES_PER_DAY).min(MAX_FORECAST_SAMPLES)
}
