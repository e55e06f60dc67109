//! Core library for the weather chat service.
//!
//! This crate defines:
//! - Configuration loading (defaults, TOML file, environment)
//! - The chat-completions client and the Open-Meteo weather provider
//! - The pipeline stages: intent detection, weather lookup, reply formatting
//! - `ChatOrchestrator`, which chains those stages with their fallbacks
//!
//! It is used by `weather-chat-server`, but can also be embedded elsewhere.

pub mod config;
pub mod error;
pub mod formatter;
pub mod general;
pub mod intent;
pub mod llm;
pub mod model;
pub mod orchestrator;
pub mod params;
pub mod provider;

pub use config::Config;
pub use error::{ChatError, LlmError, WeatherError};
pub use llm::{LanguageModel, Message, OpenAiChatClient, Role};
pub use model::{ChatRequest, ChatResponse, HealthStatus, Intent, ServiceStatus, WeatherPayload};
pub use orchestrator::{ChatOrchestrator, ChatOutcome};
pub use params::ParameterMap;
pub use provider::{OpenMeteoProvider, WeatherProvider};
