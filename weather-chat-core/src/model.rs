use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

impl ChatResponse {
    pub fn new(response: impl Into<String>) -> Self {
        Self { response: response.into() }
    }
}

/// Classification of a chat message.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    General,
    Weather(WeatherQuery),
}

impl Intent {
    pub fn is_weather_query(&self) -> bool {
        matches!(self, Intent::Weather(_))
    }
}

/// Only current conditions are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    #[default]
    Current,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherQuery {
    pub location: String,
    pub parameters: Vec<String>,
    pub timeframe: Timeframe,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl WeatherQuery {
    /// Both coordinates, if present and inside valid ranges.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lat = self.latitude.filter(|v| (-90.0..=90.0).contains(v))?;
        let lon = self.longitude.filter(|v| (-180.0..=180.0).contains(v))?;
        Some((lat, lon))
    }
}

/// Body of the forecast response: current values and their units, keyed by
/// provider parameter code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherPayload {
    #[serde(default)]
    pub current: BTreeMap<String, Value>,
    #[serde(default)]
    pub current_units: BTreeMap<String, String>,
}

/// One requested value ready to be phrased.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub code: String,
    pub value: Value,
    pub unit: Option<String>,
}

impl std::fmt::Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.unit {
            Some(unit) => write!(f, "{}: {} {}", self.code, self.value, unit),
            None => write!(f, "{}: {}", self.code, self.value),
        }
    }
}

/// Response of `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub status: String,
    pub service: String,
    pub version: String,
}

impl ServiceStatus {
    pub fn online() -> Self {
        Self {
            status: "online".to_string(),
            service: "AI Weather Chatbot".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self { status: "healthy".to_string() }
    }
}
