//! Weather Tool
//!
//! Current weather for a city via OpenWeatherMap. All failure modes,
//! including a missing API key, surface as ordinary output text so the
//! orchestrator never sees them as errors.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

use agent_core::{
    Result,
    tool::{ParameterSchema, Tool, ToolSchema},
};

const API_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Weather tool configuration
#[derive(Clone, Debug)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key; empty means unconfigured
    pub api_key: String,

    /// City used when the model omits one
    pub default_city: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            default_city: "Moscow".into(),
        }
    }
}

impl WeatherConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("OPENWEATHER_API_KEY").unwrap_or_default(),
            default_city: std::env::var("DEFAULT_CITY").unwrap_or_else(|_| "Moscow".into()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct WeatherData {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    weather: Vec<WeatherEntry>,
    #[serde(default)]
    main: MainData,
    #[serde(default)]
    wind: WindData,
}

#[derive(Debug, Default, Deserialize)]
struct WeatherEntry {
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MainData {
    #[serde(default)]
    temp: Option<f64>,
    #[serde(default)]
    feels_like: Option<f64>,
    #[serde(default)]
    humidity: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct WindData {
    #[serde(default)]
    speed: Option<f64>,
}

fn num(value: Option<f64>) -> String {
    value.map_or_else(|| "?".into(), |n| n.to_string())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Render the one-line weather report
fn format_report(fallback_city: &str, data: &WeatherData) -> String {
    let name = data.name.as_deref().unwrap_or(fallback_city);
    let description = data
        .weather
        .first()
        .and_then(|w| w.description.as_deref())
        .unwrap_or("N/A");

    format!(
        "Weather in {}: {}. Temp {}°C (feels {}°C), humidity {}%, wind {} m/s.",
        name,
        capitalize(description),
        num(data.main.temp),
        num(data.main.feels_like),
        num(data.main.humidity),
        num(data.wind.speed),
    )
}

/// Tool for looking up current weather
pub struct WeatherTool {
    http: reqwest::Client,
    config: WeatherConfig,
}

impl WeatherTool {
    pub fn new(config: WeatherConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_weather".into(),
            description: "Get current weather for a city via OpenWeatherMap".into(),
            parameters: vec![ParameterSchema {
                name: "city".into(),
                param_type: "string".into(),
                description: "City name".into(),
                required: false,
                default: Some(Value::String(self.config.default_city.clone())),
            }],
        }
    }

    async fn execute(&self, arguments: &Map<String, Value>) -> Result<String> {
        if self.config.api_key.is_empty() {
            return Ok("OpenWeather API key is not configured.".into());
        }

        let city = arguments
            .get("city")
            .and_then(Value::as_str)
            .unwrap_or(&self.config.default_city);

        let response = self
            .http
            .get(API_URL)
            .query(&[
                ("q", city),
                ("appid", &self.config.api_key),
                ("units", "metric"),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) if e.is_timeout() => return Ok("Weather service timed out.".into()),
            Err(e) => return Ok(format!("Weather service error: {e}")),
        };

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Ok("OpenWeather API key is invalid.".into());
        }

        let data: WeatherData = match response.error_for_status() {
            Ok(r) => match r.json().await {
                Ok(data) => data,
                Err(e) => return Ok(format!("Weather service error: {e}")),
            },
            Err(e) => return Ok(format!("Weather service error: {e}")),
        };

        Ok(format_report(city, &data))
    }
}
