use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tracing::debug;

use crate::{
    config::{HttpConfig, WeatherConfig},
    error::{WeatherError, truncate_body},
    model::WeatherPayload,
    params::ParameterMap,
};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    endpoint: String,
    params: Arc<ParameterMap>,
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new(
        config: &WeatherConfig,
        params: Arc<ParameterMap>,
        http: &HttpConfig,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(http.timeout()).build()?;

        Ok(Self { endpoint: config.endpoint.clone(), params, http: client })
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    async fn fetch_weather(
        &self,
        latitude: f64,
        longitude: f64,
        parameters: &[String],
    ) -> Result<WeatherPayload, WeatherError> {
        let current = self.params.codes(parameters).join(",");
        debug!(latitude, longitude, %current, "fetching current weather");

        let res = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current", current),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(WeatherError::Status { status, body: truncate_body(&body) });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
