//! Model Context Protocol tool server over stdio.
//!
//! Exposes `get_current_weather` and `get_weather_forecast` to agent clients.
//! Weather failures come back as tool results with `isError: true`; protocol
//! framing and argument validation are left to `rmcp`.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::transport::stdio;
use rmcp::{ErrorData as McpError, ServerHandler, ServiceExt, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;

use weather_core::{WeatherError, WeatherProvider, WeatherService};

use crate::display;

const SERVER_NAME: &str = "weather-mcp-server";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CurrentArgs {
    /// City name, e.g. Tokyo
    pub city: String,
    /// ISO 3166 alpha-2 country code (default JP)
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ForecastArgs {
    /// City name, e.g. Tokyo
    pub city: String,
    /// ISO 3166 alpha-2 country code (default JP)
    #[serde(default)]
    pub country: Option<String>,
    /// Number of days (default 5; the provider serves at most 5)
    #[serde(default)]
    pub days: Option<u32>,
}

pub struct WeatherTools<P> {
    service: Arc<WeatherService<P>>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl<P: WeatherProvider + 'static> WeatherTools<P> {
    pub fn new(service: Arc<WeatherService<P>>) -> Self {
        Self {
            service,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Get the current weather for a city")]
    async fn get_current_weather(
        &self,
        Parameters(args): Parameters<CurrentArgs>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self
            .service
            .get_current_weather(&args.city, args.country.as_deref())
            .await
            .map(|record| display::format_current(&record));
        Ok(tool_result("get_current_weather", outcome))
    }

    #[tool(description = "Get a daily weather forecast for a city")]
    async fn get_weather_forecast(
        &self,
        Parameters(args): Parameters<ForecastArgs>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self
            .service
            .get_weather_forecast(&args.city, args.country.as_deref(), args.days)
            .await
            .map(|records| display::format_forecast(&records));
        Ok(tool_result("get_weather_forecast", outcome))
    }
}

#[tool_handler]
impl<P: WeatherProvider + 'static> ServerHandler for WeatherTools<P> {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "Current weather and daily forecasts from OpenWeather. \
                 Country defaults to the configured one."
                    .to_string(),
            ),
            ..Default::default()
        }
    }
}

fn tool_result(tool: &str, outcome: Result<String, WeatherError>) -> CallToolResult {
    match outcome {
        Ok(text) => CallToolResult::success(vec![Content::text(text)]),
        Err(err) => {
            tracing::warn!(tool, error = %err, "tool call failed");
            CallToolResult::error(vec![Content::text(err.to_string())])
        }
    }
}

/// Serve tool requests on stdin/stdout until the client disconnects.
pub async fn serve_stdio<P: WeatherProvider + 'static>(
    service: Arc<WeatherService<P>>,
) -> Result<()> {
    tracing::info!("tool adapter ready on stdio");

    let running = WeatherTools::new(service)
        .serve(stdio())
        .await
        .context("Failed to start tool adapter")?;
    let reason = running.waiting().await.context("Tool adapter stopped unexpectedly")?;

    tracing::info!(?reason, "tool adapter stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, CannedProvider};
    use serde_json::{Value, json};
    use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

    fn tools() -> WeatherTools<CannedProvider> {
        WeatherTools::new(test_support::service())
    }

    fn as_json(result: &CallToolResult) -> Value {
        serde_json::to_value(result).unwrap()
    }

    fn text(result: &CallToolResult) -> String {
        as_json(result)["content"][0]["text"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn server_info_advertises_tools() {
        let info = tools().get_info();

        assert_eq!(info.server_info.name, SERVER_NAME);
        assert!(info.capabilities.tools.is_some());
    }

    #[test]
    fn lists_both_tools_with_schemas() {
        let listed = serde_json::to_value(tools().tool_router.list_all()).unwrap();

        let mut names: Vec<_> = listed
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect();
        names.sort();
        assert_eq!(names, ["get_current_weather", "get_weather_forecast"]);

        let forecast = listed
            .as_array()
            .unwrap()
            .iter()
            .find(|t| t["name"] == "get_weather_forecast")
            .unwrap();
        let schema = &forecast["inputSchema"];
        assert!(schema["properties"]["days"].is_object());
        assert!(schema["properties"]["days"].get("maximum").is_none());
        assert_eq!(schema["required"], json!(["city"]));
    }

    #[tokio::test]
    async fn current_weather_tool_returns_text() {
        let args = CurrentArgs {
            city: "Tokyo".into(),
            country: None,
        };

        let result = tools().get_current_weather(Parameters(args)).await.unwrap();

        assert_eq!(result.is_error, Some(false));
        let text = text(&result);
        assert!(text.contains("Tokyo, JP"));
        assert!(text.contains("21°C"));
    }

    #[tokio::test]
    async fn forecast_tool_honours_days() {
        let args = ForecastArgs {
            city: "Tokyo".into(),
            country: Some("JP".into()),
            days: Some(2),
        };

        let result = tools().get_weather_forecast(Parameters(args)).await.unwrap();

        assert!(text(&result).starts_with("2-day forecast for Tokyo, JP"));
    }

    #[tokio::test]
    async fn weather_failures_are_tool_errors() {
        let args = CurrentArgs {
            city: "Atlantis".into(),
            country: None,
        };

        let result = tools().get_current_weather(Parameters(args)).await.unwrap();

        assert_eq!(result.is_error, Some(true));
        assert!(text(&result).contains("\"Atlantis\""));
        assert_eq!(as_json(&result)["isError"], true);
    }

    #[tokio::test]
    async fn invalid_credentials_surface_as_tool_error() {
        let tools = WeatherTools::new(test_support::failing_service(
            WeatherError::InvalidCredentials,
        ));
        let args = ForecastArgs {
            city: "Tokyo".into(),
            country: None,
            days: None,
        };

        let result = tools.get_weather_forecast(Parameters(args)).await.unwrap();

        assert_eq!(result.is_error, Some(true));
        assert_eq!(text(&result), "Invalid API key");
    }

    #[tokio::test]
    async fn zero_days_is_a_tool_error() {
        let args = ForecastArgs {
            city: "Tokyo".into(),
            country: None,
            days: Some(0),
        };

        let result = tools().get_weather_forecast(Parameters(args)).await.unwrap();

        assert_eq!(result.is_error, Some(true));
    }

    async fn send(writer: &mut (impl AsyncWrite + Unpin), message: Value) {
        let mut line = message.to_string();
        line.push('\n');
        writer.write_all(line.as_bytes()).await.unwrap();
    }

    /// Drives the server over an in-memory pipe the way a stdio client would.
    #[tokio::test]
    async fn speaks_json_rpc_over_a_byte_stream() {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server);
        let server = tokio::spawn(async move {
            let running = tools().serve((server_read, server_write)).await.unwrap();
            running.waiting().await
        });

        let (client_read, mut writer) = tokio::io::split(client);
        let mut lines = BufReader::new(client_read).lines();

        send(&mut writer, json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": { "name": "test-client", "version": "0.0.0" }
            }
        }))
        .await;
        let reply: Value = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(reply["id"], 1);
        assert_eq!(reply["result"]["serverInfo"]["name"], SERVER_NAME);
        assert!(reply["result"]["capabilities"]["tools"].is_object());

        send(&mut writer, json!({ "jsonrpc": "2.0", "method": "notifications/initialized" })).await;
        send(&mut writer, json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "tools/call",
            "params": { "name": "get_current_weather", "arguments": { "city": "Atlantis" } }
        }))
        .await;
        let reply: Value = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(reply["id"], 2);
        assert_eq!(reply["result"]["isError"], true);

        send(&mut writer, json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": { "name": "get_current_weather", "arguments": {} }
        }))
        .await;
        let reply: Value = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(reply["id"], 3);
        assert_eq!(reply["error"]["code"], -32602);

        server.abort();
    }
}
