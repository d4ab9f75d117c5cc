use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Normalized weather reading, either current conditions or one forecast day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRecord {
    /// °C, whole degrees.
    pub temperature: i64,
    /// °C, whole degrees.
    pub feels_like: i64,
    /// Percent.
    pub humidity: i64,
    /// m/s, one decimal.
    pub wind_speed: f64,
    pub description: String,
    /// km, one decimal.
    pub visibility: f64,
    /// hPa.
    pub pressure: i64,
    pub city: String,
    pub country: String,
    /// Retrieval time for current weather (UTC). For forecast entries, the
    /// start of the day in the zone the samples were grouped by.
    pub timestamp: DateTime<FixedOffset>,
}
