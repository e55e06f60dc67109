//! The chat pipeline: intent detection, weather lookup, reply formatting.

use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    config::Config,
    error::ChatError,
    formatter::ResponseFormatter,
    general::GeneralConversation,
    intent::IntentDetector,
    llm::{LanguageModel, OpenAiChatClient},
    model::{ChatResponse, Intent},
    params::ParameterMap,
    provider::{OpenMeteoProvider, WeatherProvider},
};

pub const MISSING_COORDINATES_REPLY: &str = "I couldn't determine the location coordinates. Could you please be more specific about the location?";

/// Apology used when the forecast provider could not be reached.
pub fn fetch_failed_reply(location: &str) -> String {
    format!(
        "I'm sorry, I couldn't fetch the weather data for {location} at the moment. Please try again later."
    )
}

/// How a chat message was answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    /// Not about the weather; answered by the general handler.
    General(String),
    /// Weather question, but the location could not be pinned down.
    MissingCoordinates,
    /// Weather question whose forecast lookup failed.
    FetchFailed { location: String },
    /// Weather question answered from fetched data.
    Answered(String),
}

impl ChatOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::General(_) => "general",
            Self::MissingCoordinates => "missing_coordinates",
            Self::FetchFailed { .. } => "fetch_failed",
            Self::Answered(_) => "answered",
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::General(text) | Self::Answered(text) => text,
            Self::MissingCoordinates => MISSING_COORDINATES_REPLY.to_string(),
            Self::FetchFailed { location } => fetch_failed_reply(&location),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatOrchestrator {
    intent: IntentDetector,
    weather: Arc<dyn WeatherProvider>,
    formatter: ResponseFormatter,
    general: GeneralConversation,
}

impl ChatOrchestrator {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        weather: Arc<dyn WeatherProvider>,
        params: Arc<ParameterMap>,
    ) -> Self {
        Self {
            intent: IntentDetector::new(llm.clone()),
            formatter: ResponseFormatter::new(llm.clone(), params),
            general: GeneralConversation::new(llm),
            weather,
        }
    }

    /// Wire up the real HTTP clients. Fails if the API key is missing.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api_key = config.require_api_key()?.to_owned();
        let params = Arc::new(ParameterMap::open_meteo());

        let llm = OpenAiChatClient::new(&config.llm, api_key, &config.http)
            .context("Failed to build language model client")?;
        let weather = OpenMeteoProvider::new(&config.weather, params.clone(), &config.http)
            .context("Failed to build weather client")?;

        Ok(Self::new(Arc::new(llm), Arc::new(weather), params))
    }

    /// Answer one chat message. Only an empty message is rejected; every
    /// collaborator failure turns into reply text.
    pub async fn handle_chat(&self, message: &str) -> Result<ChatResponse, ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let outcome = self.run(message).await;
        info!(outcome = outcome.kind(), "chat handled");

        Ok(ChatResponse::new(outcome.into_text()))
    }

    pub async fn run(&self, message: &str) -> ChatOutcome {
        let query = match self.intent.detect_intent(message).await {
            Intent::General => {
                return ChatOutcome::General(self.general.handle_general_query(message).await);
            }
            Intent::Weather(query) => query,
        };

        let Some((latitude, longitude)) = query.coordinates() else {
            warn!(location = %query.location, "weather query without usable coordinates");
            return ChatOutcome::MissingCoordinates;
        };

        let payload = match self
            .weather
            .fetch_weather(latitude, longitude, &query.parameters)
            .await
        {
            Ok(payload) => payload,
            Err(err) => {
                warn!(location = %query.location, error = %err, "weather fetch failed");
                return ChatOutcome::FetchFailed { location: query.location };
            }
        };

        let text = self
            .formatter
            .format_response(&query.location, &payload, &query.parameters)
            .await;

        ChatOutcome::Answered(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::LlmError, error::WeatherError, llm::Message, model::WeatherPayload};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers by looking at which stage is asking.
    #[derive(Debug)]
    struct ScriptedModel {
        intent: &'static str,
        format: Option<&'static str>,
        general: &'static str,
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
            let system = &messages[0].content;
            if system.contains("weather query analyzer") {
                Ok(self.intent.to_string())
            } else if system.contains("friendly weather assistant") {
                self.format.map(str::to_string).ok_or(LlmError::EmptyResponse)
            } else {
                Ok(self.general.to_string())
            }
        }
    }

    #[derive(Debug, Default)]
    struct FakeWeather {
        fail: bool,
        calls: AtomicUsize,
        last_request: Mutex<Option<(f64, f64, Vec<String>)>>,
    }

    #[async_trait]
    impl WeatherProvider for FakeWeather {
        async fn fetch_weather(
            &self,
            latitude: f64,
            longitude: f64,
            parameters: &[String],
        ) -> Result<WeatherPayload, WeatherError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some((latitude, longitude, parameters.to_vec()));

            if self.fail {
                return Err(WeatherError::Timeout);
            }
            Ok(serde_json::from_value(json!({
                "current": {"temperature_2m": 15.2},
                "current_units": {"temperature_2m": "°C"}
            }))
            .unwrap())
        }
    }

    const PARIS_INTENT: &str = r#"{"is_weather_query": true, "location": "Paris", "parameters": ["temperature"], "latitude": 48.8566, "longitude": 2.3522}"#;

    fn orchestrator(model: ScriptedModel, weather: Arc<FakeWeather>) -> ChatOrchestrator {
        ChatOrchestrator::new(Arc::new(model), weather, Arc::new(ParameterMap::open_meteo()))
    }

    #[tokio::test]
    async fn non_weather_message_uses_general_handler() {
        let weather = Arc::new(FakeWeather::default());
        let orch = orchestrator(
            ScriptedModel {
                intent: r#"{"is_weather_query": false}"#,
                format: None,
                general: "Why did the cloud break up with the fog? It needed space.",
            },
            weather.clone(),
        );

        let response = orch.handle_chat("Tell me a joke").await.unwrap();

        assert_eq!(response.response, "Why did the cloud break up with the fog? It needed space.");
        assert_eq!(weather.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unparsable_intent_falls_back_to_general() {
        let weather = Arc::new(FakeWeather::default());
        let orch = orchestrator(
            ScriptedModel { intent: "not json at all", format: None, general: "general answer" },
            weather.clone(),
        );

        let outcome = orch.run("What's up?").await;

        assert_eq!(outcome, ChatOutcome::General("general answer".into()));
        assert_eq!(weather.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_coordinates_ask_for_clarification() {
        let weather = Arc::new(FakeWeather::default());
        let orch = orchestrator(
            ScriptedModel {
                intent: r#"{"is_weather_query": true, "location": "Springfield", "latitude": 39.8}"#,
                format: Some("unused"),
                general: "unused",
            },
            weather.clone(),
        );

        let response = orch.handle_chat("Weather in Springfield?").await.unwrap();

        assert_eq!(response.response, MISSING_COORDINATES_REPLY);
        assert_eq!(weather.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fetch_failure_apologizes_with_location() {
        let weather = Arc::new(FakeWeather { fail: true, ..Default::default() });
        let orch = orchestrator(
            ScriptedModel { intent: PARIS_INTENT, format: Some("unused"), general: "unused" },
            weather.clone(),
        );

        let response = orch.handle_chat("What's the temperature in Paris?").await.unwrap();

        assert_eq!(
            response.response,
            "I'm sorry, I couldn't fetch the weather data for Paris at the moment. Please try again later."
        );
        assert_eq!(weather.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn paris_temperature_end_to_end() {
        let weather = Arc::new(FakeWeather::default());
        let orch = orchestrator(
            ScriptedModel {
                intent: PARIS_INTENT,
                format: Some("It's currently 15.2°C in Paris."),
                general: "unused",
            },
            weather.clone(),
        );

        let response = orch.handle_chat("What's the temperature in Paris?").await.unwrap();

        assert!(response.response.contains("Paris"));
        assert!(response.response.contains("15.2"));
        assert!(response.response.contains("°C"));

        let (lat, lon, params) = weather.last_request.lock().unwrap().clone().unwrap();
        assert_eq!((lat, lon), (48.8566, 2.3522));
        assert_eq!(params, vec!["temperature".to_string()]);
    }

    #[tokio::test]
    async fn paris_survives_formatter_failure() {
        let weather = Arc::new(FakeWeather::default());
        let orch = orchestrator(
            ScriptedModel { intent: PARIS_INTENT, format: None, general: "unused" },
            weather,
        );

        let outcome = orch.run("What's the temperature in Paris?").await;

        assert_eq!(
            outcome,
            ChatOutcome::Answered("Weather data for Paris: temperature_2m: 15.2 °C".into())
        );
    }

    #[tokio::test]
    async fn omitted_parameters_default_to_temperature() {
        let weather = Arc::new(FakeWeather::default());
        let orch = orchestrator(
            ScriptedModel {
                intent: r#"{"is_weather_query": true, "location": "Paris", "latitude": 48.8566, "longitude": 2.3522}"#,
                format: Some("fine"),
                general: "unused",
            },
            weather.clone(),
        );

        orch.handle_chat("How's Paris?").await.unwrap();

        let (_, _, params) = weather.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(params, vec!["temperature".to_string()]);
    }

    #[tokio::test]
    async fn empty_message_is_rejected_before_any_call() {
        let weather = Arc::new(FakeWeather::default());
        let orch = orchestrator(
            ScriptedModel { intent: PARIS_INTENT, format: None, general: "unused" },
            weather.clone(),
        );

        let err = orch.handle_chat("   ").await.unwrap_err();

        assert!(matches!(err, ChatError::EmptyMessage));
        assert_eq!(weather.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn from_config_requires_api_key() {
        let err = ChatOrchestrator::from_config(&Config::default()).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }
}
