//! Error types shared by the provider client and the service facade.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Classified failure of a weather request.
///
/// The provider client produces these, and the service propagates them
/// unchanged. How they are presented (HTTP status, tool text) is up to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WeatherError {
    #[error("City \"{0}\" not found")]
    CityNotFound(String),

    #[error("Invalid API key")]
    InvalidCredentials,

    #[error("Weather provider request failed: {0}")]
    ProviderError(String),

    #[error("Unexpected error: {0}")]
    UnexpectedError(String),

    /// Caller input rejected before any network call was made.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl WeatherError {
    /// Classify a non-success HTTP status returned by the provider.
    pub fn from_status(status: StatusCode, city: &str, body: &str) -> Self {
        match status {
            StatusCode::NOT_FOUND => Self::CityNotFound(city.to_string()),
            StatusCode::UNAUTHORIZED => Self::InvalidCredentials,
            _ => {
                let detail = provider_message(body).unwrap_or_else(|| truncate_body(body));
                if detail.is_empty() {
                    Self::ProviderError(format!("status {status}"))
                } else {
                    Self::ProviderError(format!("status {status}: {detail}"))
                }
            }
        }
    }

    /// Classify a transport-level failure, using its status code when it has one.
    pub fn from_transport(err: reqwest::Error, city: &str) -> Self {
        match err.status() {
            Some(status) => Self::from_status(status, city, ""),
            None => Self::UnexpectedError(err.to_string()),
        }
    }

    /// Whether the failure came from the caller's input rather than the provider.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::CityNotFound(_) | Self::InvalidRequest(_))
    }
}

/// Failure to build a usable provider client from configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "No OpenWeather API key configured.\n\
         Hint: set OPENWEATHER_API_KEY or run `weather configure`."
    )]
    MissingApiKey,

    #[error("Invalid provider base URL '{0}'")]
    InvalidBaseUrl(String),

    #[error("Invalid day boundary '{0}'. Supported values: utc, local, city.")]
    InvalidDayBoundary(String),

    #[error("Request timeout must be at least one second")]
    ZeroTimeout,

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: String,
}

/// OpenWeather error bodies look like `{"cod": "500", "message": "..."}`.
fn provider_message(body: &str) -> Option<String> {
    serde_json::from_str::<OwErrorBody>(body)
        .ok()
        .map(|b| b.message)
        .filter(|m| !m.is_empty())
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    let body = body.trim();
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_city_not_found_with_city_name() {
        let err = WeatherError::from_status(StatusCode::NOT_FOUND, "Atlantis", "");
        assert_eq!(err, WeatherError::CityNotFound("Atlantis".into()));
        assert!(err.to_string().contains("\"Atlantis\""));
    }

    #[test]
    fn unauthorized_maps_to_invalid_credentials() {
        let err = WeatherError::from_status(StatusCode::UNAUTHORIZED, "Tokyo", "");
        assert_eq!(err, WeatherError::InvalidCredentials);
    }

    #[test]
    fn other_statuses_map_to_provider_error() {
        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::FORBIDDEN,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            let err = WeatherError::from_status(status, "Tokyo", "");
            assert!(
                matches!(err, WeatherError::ProviderError(_)),
                "{status} classified as {err:?}"
            );
        }
    }

    #[test]
    fn provider_error_uses_message_from_json_body() {
        let body = r#"{"cod":"500","message":"Internal error"}"#;
        let err = WeatherError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "Tokyo", body);

        let msg = err.to_string();
        assert!(msg.contains("500"));
        assert!(msg.contains("Internal error"));
        assert!(!msg.contains("cod"));
    }

    #[test]
    fn provider_error_truncates_long_plain_bodies() {
        let body = "x".repeat(500);
        let WeatherError::ProviderError(msg) =
            WeatherError::from_status(StatusCode::BAD_GATEWAY, "Tokyo", &body)
        else {
            panic!("expected provider error");
        };

        assert!(msg.ends_with("..."));
        assert!(msg.len() < 300);
    }

    #[test]
    fn client_errors() {
        assert!(WeatherError::CityNotFound("x".into()).is_client_error());
        assert!(WeatherError::InvalidRequest("x".into()).is_client_error());
        assert!(!WeatherError::InvalidCredentials.is_client_error());
        assert!(!WeatherError::UnexpectedError("x".into()).is_client_error());
    }
}
