use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::WeatherError, model::WeatherPayload};

pub mod open_meteo;

pub use open_meteo::OpenMeteoProvider;

/// Source of current weather conditions.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Fetch current values for the user-facing `parameters` at a point.
    async fn fetch_weather(
        &self,
        latitude: f64,
        longitude: f64,
        parameters: &[String],
    ) -> Result<WeatherPayload, WeatherError>;
}
