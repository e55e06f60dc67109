use anyhow::Context;
use clap::Parser;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use weather_chat_core::{ChatOrchestrator, Config};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-chat", version, about = "AI weather chatbot HTTP service")]
pub struct Cli {
    /// Path to a TOML config file. Defaults to the platform config directory.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Address to bind, overriding the config file.
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind, overriding the config file.
    #[arg(long, short)]
    pub port: Option<u16>,
}

impl Cli {
    /// Resolve configuration from file, environment and flags.
    pub fn config(&self) -> anyhow::Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        config.apply_env();

        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }

        Ok(config)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let config = self.config()?;
        let orchestrator = Arc::new(ChatOrchestrator::from_config(&config)?);

        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .with_context(|| {
                format!("Invalid bind address {}:{}", config.server.host, config.server.port)
            })?;

        tracing::info!(%addr, model = %config.llm.model, "starting weather chat service");
        warp::serve(crate::routes::routes(orchestrator)).run(addr).await;

        Ok(())
    }
}
