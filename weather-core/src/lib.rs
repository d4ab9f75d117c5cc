//! Core library for the `weather` tool.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client and its error classification
//! - Normalization of current weather and per-day forecast aggregation
//! - [`WeatherService`], the call contract used by the CLI, HTTP API and tool adapter

pub mod aggregate;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod service;

pub use aggregate::DayBoundary;
pub use config::{Config, ProviderSettings};
pub use error::{ConfigError, WeatherError};
pub use model::WeatherRecord;
pub use provider::{OpenWeatherClient, WeatherProvider};
pub use service::{DEFAULT_FORECAST_DAYS, WeatherService};
