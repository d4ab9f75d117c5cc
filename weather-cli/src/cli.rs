use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use weather_core::{Config, WeatherService};

use crate::{display, http, mcp};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Current weather and daily forecasts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and default country.
    Configure,

    /// Show current weather for a city.
    Current {
        city: String,

        /// ISO 3166 alpha-2 country code; defaults to the configured country.
        #[arg(long)]
        country: Option<String>,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Show a daily forecast for a city.
    Forecast {
        city: String,

        #[arg(long)]
        country: Option<String>,

        /// Number of days.
        #[arg(long, default_value_t = weather_core::DEFAULT_FORECAST_DAYS)]
        days: u32,

        #[arg(long)]
        json: bool,
    },

    /// Serve the HTTP JSON API.
    Serve {
        #[arg(long, env = "WEATHER_ADDR", default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
    },

    /// Serve the agent tool adapter on stdin/stdout.
    Mcp,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Current {
                city,
                country,
                json,
            } => {
                let service = build_service()?;
                let record = service
                    .get_current_weather(&city, country.as_deref())
                    .await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&record)?);
                } else {
                    print!("{}", display::format_current(&record));
                }
                Ok(())
            }
            Command::Forecast {
                city,
                country,
                days,
                json,
            } => {
                let service = build_service()?;
                let records = service
                    .get_weather_forecast(&city, country.as_deref(), Some(days))
                    .await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&records)?);
                } else {
                    print!("{}", display::format_forecast(&records));
                }
                Ok(())
            }
            Command::Serve { addr } => {
                let service = Arc::new(build_service()?);
                http::run(addr, service).await;
                Ok(())
            }
            Command::Mcp => {
                let service = Arc::new(build_service()?);
                mcp::serve_stdio(service).await
            }
        }
    }
}

/// Config file, then environment, then validation. Fails before any network call
/// when no API key is available.
fn build_service() -> anyhow::Result<WeatherService> {
    let settings = Config::load()?.with_env_overrides()?.provider_settings()?;
    tracing::debug!(
        base_url = %settings.base_url,
        language = %settings.language,
        country = %settings.default_country,
        boundary = %settings.day_boundary,
        "provider settings"
    );
    Ok(WeatherService::from_settings(&settings)?)
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if config.is_configured() {
        println!("An API key is already configured; entering a new one replaces it.");
    }

    let api_key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;
    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        anyhow::bail!("API key must not be empty");
    }
    config.set_api_key(api_key);

    let current_country = config
        .default_country
        .clone()
        .unwrap_or_else(|| weather_core::config::DEFAULT_COUNTRY.to_string());
    let country = inquire::Text::new("Default country code:")
        .with_default(&current_country)
        .prompt()
        .context("Failed to read default country")?;
    config.default_country = Some(country.trim().to_uppercase());

    config.save()?;
    println!(
        "Saved configuration to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}
