//! Last pipeline stage: turn raw readings into a friendly sentence.

use std::{collections::BTreeMap, sync::Arc};
use tracing::warn;

use crate::{
    llm::{LanguageModel, Message},
    model::{Reading, WeatherPayload},
    params::ParameterMap,
};

const SYSTEM_PROMPT: &str = "You are a friendly weather assistant. Format the provided weather data into a natural, conversational response.

Rules:
1. Use ONLY the data provided - do not make up or hallucinate information
2. Include units properly (°C, %, mm, etc.)
3. Keep the response concise and friendly
4. Mention the location clearly
5. If data is missing, acknowledge it politely";

#[derive(Debug, Clone)]
pub struct ResponseFormatter {
    llm: Arc<dyn LanguageModel>,
    params: Arc<ParameterMap>,
}

impl ResponseFormatter {
    pub fn new(llm: Arc<dyn LanguageModel>, params: Arc<ParameterMap>) -> Self {
        Self { llm, params }
    }

    /// Requested values from `payload`, in request order, with their units.
    pub fn readings(&self, payload: &WeatherPayload, parameters: &[String]) -> Vec<Reading> {
        self.params
            .codes(parameters)
            .into_iter()
            .filter_map(|code| {
                let value = payload.current.get(&code)?.clone();
                let unit = payload.current_units.get(&code).cloned();
                Some(Reading { code, value, unit })
            })
            .collect()
    }

    /// Phrase the readings for `location`. Falls back to plain text when
    /// the model is unavailable.
    pub async fn format_response(
        &self,
        location: &str,
        payload: &WeatherPayload,
        parameters: &[String],
    ) -> String {
        let readings = self.readings(payload, parameters);
        let messages = [Message::system(SYSTEM_PROMPT), Message::user(user_prompt(location, &readings))];

        match self.llm.complete(&messages).await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => {
                warn!(location, "formatter returned empty text, using plain fallback");
                fallback_text(location, &readings)
            }
            Err(err) => {
                warn!(location, error = %err, "formatting call failed, using plain fallback");
                fallback_text(location, &readings)
            }
        }
    }
}

fn user_prompt(location: &str, readings: &[Reading]) -> String {
    let data: BTreeMap<&str, &serde_json::Value> =
        readings.iter().map(|r| (r.code.as_str(), &r.value)).collect();
    let units: BTreeMap<&str, &str> = readings
        .iter()
        .filter_map(|r| Some((r.code.as_str(), r.unit.as_deref()?)))
        .collect();

    format!(
        "Location: {location}\n\nWeather Data: {}\n\nUnits: {}\n\nFormat this into a natural conversational response.",
        to_pretty_json(&data),
        to_pretty_json(&units),
    )
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Deterministic text used when the model cannot phrase the answer.
pub fn fallback_text(location: &str, readings: &[Reading]) -> String {
    if readings.is_empty() {
        return format!("Weather data for {location}: no readings available");
    }

    let joined = readings.iter().map(Reading::to_string).collect::<Vec<_>>().join(", ");
    format!("Weather data for {location}: {joined}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records the last prompt and answers with a fixed result.
    #[derive(Debug, Default)]
    struct Recorder {
        reply: Option<String>,
        last_user_prompt: Mutex<Option<String>>,
    }

    #[async_trait]
    impl LanguageModel for Recorder {
        async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
            if let Ok(mut slot) = self.last_user_prompt.lock() {
                *slot = messages.last().map(|m| m.content.clone());
            }
            self.reply.clone().ok_or(LlmError::EmptyResponse)
        }
    }

    fn paris_payload() -> WeatherPayload {
        serde_json::from_value(json!({
            "current": {
                "time": "2026-10-19T12:00",
                "interval": 900,
                "temperature_2m": 15.2,
                "relative_humidity_2m": 71
            },
            "current_units": {
                "time": "iso8601",
                "interval": "seconds",
                "temperature_2m": "°C",
                "relative_humidity_2m": "%"
            }
        }))
        .expect("payload must parse")
    }

    fn formatter(reply: Option<&str>) -> (ResponseFormatter, Arc<Recorder>) {
        let recorder = Arc::new(Recorder { reply: reply.map(str::to_string), ..Default::default() });
        let formatter = ResponseFormatter::new(recorder.clone(), Arc::new(ParameterMap::open_meteo()));
        (formatter, recorder)
    }

    #[test]
    fn readings_keep_only_requested_codes_in_order() {
        let (formatter, _) = formatter(None);
        let readings =
            formatter.readings(&paris_payload(), &["humidity".to_string(), "temperature".to_string()]);

        let codes: Vec<_> = readings.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["relative_humidity_2m", "temperature_2m"]);
        assert_eq!(readings[1].unit.as_deref(), Some("°C"));
    }

    #[test]
    fn readings_skip_values_the_provider_did_not_return() {
        let (formatter, _) = formatter(None);
        let readings = formatter.readings(&paris_payload(), &["pressure".to_string()]);
        assert!(readings.is_empty());
    }

    #[test]
    fn fallback_lists_values_with_units() {
        let (formatter, _) = formatter(None);
        let readings = formatter.readings(&paris_payload(), &["temperature".to_string()]);

        assert_eq!(fallback_text("Paris", &readings), "Weather data for Paris: temperature_2m: 15.2 °C");
        assert_eq!(fallback_text("Paris", &[]), "Weather data for Paris: no readings available");
    }

    #[tokio::test]
    async fn uses_model_text_when_available() {
        let (formatter, recorder) = formatter(Some("It's 15.2°C in Paris right now."));
        let text = formatter
            .format_response("Paris", &paris_payload(), &["temperature".to_string()])
            .await;

        assert_eq!(text, "It's 15.2°C in Paris right now.");

        let prompt = recorder.last_user_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("Location: Paris"));
        assert!(prompt.contains("\"temperature_2m\": 15.2"));
        assert!(!prompt.contains("relative_humidity_2m"));
        assert!(!prompt.contains("iso8601"));
    }

    #[tokio::test]
    async fn falls_back_when_model_fails() {
        let (formatter, _) = formatter(None);
        let text = formatter
            .format_response("Paris", &paris_payload(), &["temperature".to_string()])
            .await;

        assert!(text.contains("Paris"));
        assert!(text.contains("15.2"));
        assert!(text.contains("°C"));
    }
}
