//! HTTP JSON API over [`WeatherService`].

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use weather_core::{WeatherError, WeatherProvider, WeatherService};

pub async fn run<P>(address: SocketAddr, service: Arc<WeatherService<P>>)
where
    P: WeatherProvider + 'static,
{
    tracing::info!(%address, "weather API listening");
    warp::serve(routes(service)).run(address).await
}

pub fn routes<P>(
    service: Arc<WeatherService<P>>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone
where
    P: WeatherProvider + 'static,
{
    let index_route = warp::path::end().and(warp::get()).map(index);

    let current_route = warp::path!("weather" / String)
        .and(warp::get())
        .and(warp::query::<WeatherQuery>())
        .and(with_service(service.clone()))
        .and_then(current_weather::<P>);

    let forecast_route = warp::path!("weather" / String / "forecast")
        .and(warp::get())
        .and(warp::query::<WeatherQuery>())
        .and(with_service(service))
        .and_then(weather_forecast::<P>);

    let cors = warp::cors().allow_any_origin().allow_methods(vec!["GET"]);

    index_route
        .or(current_route)
        .or(forecast_route)
        .with(cors)
        .recover(rejection)
        .with(warp::trace::request())
}

fn with_service<P>(
    service: Arc<WeatherService<P>>,
) -> impl Filter<Extract = (Arc<WeatherService<P>>,), Error = Infallible> + Clone
where
    P: WeatherProvider + 'static,
{
    warp::any().map(move || service.clone())
}

#[derive(Debug, Deserialize)]
struct WeatherQuery {
    country: Option<String>,
    days: Option<u32>,
}

#[derive(Serialize)]
struct ServiceInfo {
    name: &'static str,
    version: &'static str,
    description: &'static str,
    endpoints: Endpoints,
}

#[derive(Serialize)]
struct Endpoints {
    #[serde(rename = "/weather/:city")]
    current: &'static str,
    #[serde(rename = "/weather/:city/forecast")]
    forecast: &'static str,
}

fn index() -> impl Reply {
    warp::reply::json(&ServiceInfo {
        name: "weather-mcp-server",
        version: env!("CARGO_PKG_VERSION"),
        description: "Current weather and daily forecasts as JSON",
        endpoints: Endpoints {
            current: "Current weather for a city (?country=XX)",
            forecast: "Daily forecast for a city (?country=XX&days=N)",
        },
    })
}

#[derive(Serialize)]
struct Success<T> {
    success: bool,
    data: T,
}

#[derive(Serialize)]
struct Failure {
    success: bool,
    error: String,
}

fn success<T: Serialize>(data: T) -> Response {
    warp::reply::json(&Success {
        success: true,
        data,
    })
    .into_response()
}

fn failure(code: StatusCode, message: impl Into<String>) -> Response {
    let json = warp::reply::json(&Failure {
        success: false,
        error: message.into(),
    });
    warp::reply::with_status(json, code).into_response()
}

pub fn status_for(err: &WeatherError) -> StatusCode {
    match err {
        WeatherError::CityNotFound(_) => StatusCode::NOT_FOUND,
        WeatherError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        WeatherError::InvalidCredentials | WeatherError::ProviderError(_) => {
            StatusCode::BAD_GATEWAY
        }
        WeatherError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: WeatherError) -> Response {
    let code = status_for(&err);
    if code.is_server_error() {
        tracing::error!(error = %err, "weather request failed");
    }
    failure(code, err.to_string())
}

fn decode_city(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

async fn current_weather<P: WeatherProvider>(
    city: String,
    query: WeatherQuery,
    service: Arc<WeatherService<P>>,
) -> Result<Response, Infallible> {
    let city = decode_city(&city);
    let reply = match service
        .get_current_weather(&city, query.country.as_deref())
        .await
    {
        Ok(record) => success(record),
        Err(err) => error_response(err),
    };
    Ok(reply)
}

async fn weather_forecast<P: WeatherProvider>(
    city: String,
    query: WeatherQuery,
    service: Arc<WeatherService<P>>,
) -> Result<Response, Infallible> {
    let city = decode_city(&city);
    let reply = match service
        .get_weather_forecast(&city, query.country.as_deref(), query.days)
        .await
    {
        Ok(records) => success(records),
        Err(err) => error_response(err),
    };
    Ok(reply)
}

async fn rejection(err: Rejection) -> Result<Response, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Endpoint not found".to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, format!("Invalid query: {e}"))
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else if let Some(e) = err.find::<warp::filters::cors::CorsForbidden>() {
        (StatusCode::FORBIDDEN, e.to_string())
    } else {
        tracing::error!("unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    };

    Ok(failure(code, message))
}
