//! Conversion of raw provider payloads into [`WeatherRecord`]s.
//!
//! Rounding rule used everywhere: nearest value, halves away from zero
//! (`f64::round`), so `20.5 → 21` and `-2.5 → -3`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta,
    TimeZone, Utc,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::WeatherRecord;
use crate::provider::openweather::{
    OwCurrentResponse, OwForecastEntry, OwForecastResponse, OwWeather,
};

/// Used when a sample carries no visibility.
pub const DEFAULT_VISIBILITY_M: f64 = 10_000.0;

const UNKNOWN_DESCRIPTION: &str = "Unknown";

/// Which calendar a forecast sample's timestamp is read in when grouping by day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayBoundary {
    /// UTC calendar days. Deterministic regardless of host settings.
    #[default]
    Utc,
    /// The time zone of the running process.
    Local,
    /// The queried city's own UTC offset, as reported by the provider.
    City,
}

impl DayBoundary {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayBoundary::Utc => "utc",
            DayBoundary::Local => "local",
            DayBoundary::City => "city",
        }
    }

    /// Calendar date of `at` under this policy.
    pub fn date_of(&self, at: DateTime<Utc>, city_offset_secs: i32) -> NaiveDate {
        match self {
            DayBoundary::Utc => at.date_naive(),
            DayBoundary::Local => at.with_timezone(&Local).date_naive(),
            DayBoundary::City => at.with_timezone(&city_offset(city_offset_secs)).date_naive(),
        }
    }

    /// Instant at which `date` begins under this policy, carrying that zone's
    /// offset so the local calendar date survives formatting.
    pub fn start_of(&self, date: NaiveDate, city_offset_secs: i32) -> DateTime<FixedOffset> {
        let midnight = date.and_time(NaiveTime::default());
        match self {
            DayBoundary::Utc => midnight.and_utc().fixed_offset(),
            DayBoundary::Local => in_zone(&Local, midnight),
            DayBoundary::City => in_zone(&city_offset(city_offset_secs), midnight),
        }
    }
}

impl fmt::Display for DayBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayBoundary {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "utc" => Ok(DayBoundary::Utc),
            "local" => Ok(DayBoundary::Local),
            "city" => Ok(DayBoundary::City),
            _ => Err(ConfigError::InvalidDayBoundary(value.to_string())),
        }
    }
}

fn city_offset(secs: i32) -> FixedOffset {
    FixedOffset::east_opt(secs).unwrap_or_else(|| Utc.fix())
}

/// Longest run of nonexistent local time searched for after `local`.
const MAX_GAP_STEPS: i32 = 48;

fn in_zone<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> DateTime<FixedOffset> {
    // A DST gap can swallow midnight; the day then starts at the first local
    // time that exists.
    let step = TimeDelta::minutes(30);
    (0..MAX_GAP_STEPS)
        .find_map(|i| tz.from_local_datetime(&(local + step * i)).earliest())
        .map(|dt| dt.fixed_offset())
        .unwrap_or_else(|| local.and_utc().fixed_offset())
}

/// Round to the nearest whole number.
pub fn round_whole(value: f64) -> i64 {
    value.round() as i64
}

/// Round to one decimal place (scale by 10, round, scale back).
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Meters to kilometers, one decimal.
pub fn meters_to_km(meters: f64) -> f64 {
    round_tenth(meters / 1000.0)
}

fn first_description(weather: &[OwWeather]) -> String {
    weather
        .first()
        .map(|w| w.description.clone())
        .unwrap_or_else(|| UNKNOWN_DESCRIPTION.to_string())
}

/// Normalize a current-conditions payload. `now` becomes the record's timestamp.
pub fn normalize_current(payload: &OwCurrentResponse, now: DateTime<Utc>) -> WeatherRecord {
    WeatherRecord {
        temperature: round_whole(payload.main.temp),
        feels_like: round_whole(payload.main.feels_like),
        humidity: round_whole(payload.main.humidity),
        wind_speed: round_tenth(payload.wind.speed),
        description: first_description(&payload.weather),
        visibility: meters_to_km(payload.visibility.unwrap_or(DEFAULT_VISIBILITY_M)),
        pressure: round_whole(payload.main.pressure),
        city: payload.name.clone(),
        country: payload.sys.country.clone(),
        timestamp: now.fixed_offset(),
    }
}

/// Collapse 3-hour samples into at most `days` per-day records, oldest first.
///
/// Numeric readings are averaged over each day; description and visibility
/// come from the first sample received for that day.
pub fn normalize_forecast(
    payload: &OwForecastResponse,
    days: usize,
    boundary: DayBoundary,
) -> Vec<WeatherRecord> {
    let offset = payload.city.timezone;

    let mut by_date: BTreeMap<NaiveDate, Vec<&OwForecastEntry>> = BTreeMap::new();
    for entry in &payload.list {
        let Some(at) = DateTime::from_timestamp(entry.dt, 0) else {
            tracing::warn!(dt = entry.dt, "skipping forecast sample with invalid timestamp");
            continue;
        };
        by_date
            .entry(boundary.date_of(at, offset))
            .or_default()
            .push(entry);
    }

    by_date
        .into_iter()
        .take(days)
        .map(|(date, entries)| summarize_day(payload, boundary.start_of(date, offset), &entries))
        .collect()
}

/// `entries` is never empty: buckets are only created on insert.
fn summarize_day(
    payload: &OwForecastResponse,
    day_start: DateTime<FixedOffset>,
    entries: &[&OwForecastEntry],
) -> WeatherRecord {
    let count = entries.len() as f64;
    let mean = |f: fn(&OwForecastEntry) -> f64| entries.iter().map(|e| f(e)).sum::<f64>() / count;

    let representative = entries[0];

    WeatherRecord {
        temperature: round_whole(mean(|e| e.main.temp)),
        feels_like: round_whole(mean(|e| e.main.feels_like)),
        humidity: round_whole(mean(|e| e.main.humidity)),
        wind_speed: round_tenth(mean(|e| e.wind.speed)),
        description: first_description(&representative.weather),
        visibility: meters_to_km(representative.visibility.unwrap_or(DEFAULT_VISIBILITY_M)),
        pressure: round_whole(mean(|e| e.main.pressure)),
        city: payload.city.name.clone(),
        country: payload.city.country.clone(),
        timestamp: day_start,
    }
}
