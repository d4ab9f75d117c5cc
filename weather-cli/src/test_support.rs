//! Canned provider shared by the HTTP and tool adapter tests.

use std::sync::Arc;

use async_trait::async_trait;
use weather_core::provider::openweather::{
    OwCity, OwCurrentResponse, OwForecastEntry, OwForecastResponse, OwMain, OwSys, OwWeather,
    OwWind,
};
use weather_core::{WeatherError, WeatherProvider, WeatherService};

/// Answers every request for "Tokyo"; any other city is not found.
#[derive(Debug, Default)]
pub struct CannedProvider {
    pub fail_with: Option<WeatherError>,
}

fn main(temp: f64) -> OwMain {
    OwMain {
        temp,
        feels_like: temp + 1.0,
        humidity: 65.0,
        pressure: 1013.0,
    }
}

impl CannedProvider {
    fn check(&self, city: &str) -> Result<(), WeatherError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        if city != "Tokyo" {
            return Err(WeatherError::CityNotFound(city.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl WeatherProvider for CannedProvider {
    async fn fetch_current(
        &self,
        city: &str,
        country: &str,
    ) -> Result<OwCurrentResponse, WeatherError> {
        self.check(city)?;
        Ok(OwCurrentResponse {
            name: city.to_string(),
            main: main(20.5),
            weather: vec![OwWeather {
                description: "曇り".into(),
            }],
            wind: OwWind { speed: 3.2 },
            visibility: Some(10_000.0),
            sys: OwSys {
                country: country.to_string(),
            },
        })
    }

    async fn fetch_forecast(
        &self,
        city: &str,
        country: &str,
        sample_count: u32,
    ) -> Result<OwForecastResponse, WeatherError> {
        self.check(city)?;
        // 2022-01-01T00:00:00Z onwards, every 3 hours.
        let list = (0..i64::from(sample_count))
            .map(|i| OwForecastEntry {
                dt: 1_640_995_200 + i * 3 * 3600,
                main: main(15.0),
                weather: vec![OwWeather {
                    description: "晴れ".into(),
                }],
                wind: OwWind { speed: 2.5 },
                visibility: Some(9_000.0),
            })
            .collect();
        Ok(OwForecastResponse {
            city: OwCity {
                name: city.to_string(),
                country: country.to_string(),
                timezone: 0,
            },
            list,
        })
    }
}

pub fn service() -> Arc<WeatherService<CannedProvider>> {
    Arc::new(WeatherService::new(CannedProvider::default()))
}

pub fn failing_service(err: WeatherError) -> Arc<WeatherService<CannedProvider>> {
    Arc::new(WeatherService::new(CannedProvider {
        fail_with: Some(err),
    }))
}
