//! First pipeline stage: decide whether a message asks about the weather.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    llm::{LanguageModel, Message},
    model::{Intent, Timeframe, WeatherQuery},
};

const SYSTEM_PROMPT: &str = r#"You are a weather query analyzer. Your task is to determine if the user's message is asking about weather and extract relevant information.

You must respond with ONLY valid JSON in this exact format:

For weather queries:
{
  "is_weather_query": true,
  "location": "City Name",
  "parameters": ["temperature", "humidity"],
  "timeframe": "current",
  "latitude": 28.6139,
  "longitude": 77.2090
}

For non-weather queries:
{
  "is_weather_query": false
}

Important rules:
1. Extract the city/location name from the query
2. Determine what weather parameters the user wants (temperature, humidity, precipitation, wind_speed, etc.)
3. Provide accurate latitude and longitude for the location
4. If no specific parameters are mentioned, default to ["temperature"]
5. Timeframe should always be "current" for now
6. Return ONLY the JSON, no other text or explanation"#;

const DEFAULT_PARAMETER: &str = "temperature";
const UNKNOWN_LOCATION: &str = "Unknown";

/// Shape the model is asked to produce. Everything is optional so that a
/// sloppy answer still classifies.
#[derive(Debug, Default, Deserialize)]
struct RawIntent {
    #[serde(default, alias = "isWeatherQuery")]
    is_weather_query: bool,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    parameters: Option<Vec<String>>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
}

impl From<RawIntent> for Intent {
    fn from(raw: RawIntent) -> Self {
        if !raw.is_weather_query {
            return Intent::General;
        }

        let location = raw
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());

        let parameters = raw
            .parameters
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_PARAMETER.to_string()]);

        Intent::Weather(WeatherQuery {
            location,
            parameters,
            timeframe: Timeframe::Current,
            latitude: raw.latitude,
            longitude: raw.longitude,
        })
    }
}

#[derive(Debug, Clone)]
pub struct IntentDetector {
    llm: Arc<dyn LanguageModel>,
}

impl IntentDetector {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Classify `message`. Never fails: anything unexpected is treated as a
    /// general question.
    pub async fn detect_intent(&self, message: &str) -> Intent {
        let messages = [Message::system(SYSTEM_PROMPT), Message::user(message)];

        let reply = match self.llm.complete(&messages).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(error = %err, "intent detection call failed, treating as general query");
                return Intent::General;
            }
        };

        match parse_intent(&reply) {
            Some(intent) => {
                debug!(?intent, "detected intent");
                intent
            }
            None => {
                warn!(reply = %reply, "could not parse intent, treating as general query");
                Intent::General
            }
        }
    }
}

/// Parse a model reply, ignoring any prose around the JSON object.
pub fn parse_intent(reply: &str) -> Option<Intent> {
    let json = extract_json_object(reply).unwrap_or(reply);
    serde_json::from_str::<RawIntent>(json).ok().map(Intent::from)
}

/// First balanced `{...}` in `text`. Braces inside JSON strings are ignored.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}
