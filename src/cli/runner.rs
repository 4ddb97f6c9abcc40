//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::TapConfig;
use crate::context::Context;
use crate::engine::{self, SyncConfig, SyncEngine, SyncStats};
use crate::error::{Error, Result};
use crate::output::{JsonLinesWriter, MessageSink};
use crate::state::StateManager;
use crate::stream::RecordFetcher;
use crate::streams::{self, discover_streams};
use serde_json::{json, Value};
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Spec => {
                Self::output_message(&Self::spec());
                Ok(())
            }
            Commands::Check => {
                Self::output_message(&self.check().await?);
                Ok(())
            }
            Commands::Discover => {
                Self::output_message(&self.discover()?);
                Ok(())
            }
            Commands::Read { .. } => {
                let mut writer = JsonLinesWriter::stdout();
                self.read(&mut writer).await.map(|_| ())
            }
        }
    }

    /// SPEC message
    pub fn spec() -> Value {
        json!({
            "type": "SPEC",
            "spec": TapConfig::spec()
        })
    }

    /// Fetch the first repositories page and report the outcome
    pub async fn check(&self) -> Result<Value> {
        let config = self.load_config()?;
        config.validate()?;

        let fetcher = Self::fetcher(&config)?;
        let repositories = streams::repositories();
        let status = match fetcher
            .fetch_page(&repositories, &Context::new(), None)
            .await
        {
            Ok(_) => json!({
                "status": "SUCCEEDED",
                "message": "Connection successful"
            }),
            Err(e) => json!({
                "status": "FAILED",
                "message": format!("Connection failed: {e}")
            }),
        };

        Ok(json!({
            "type": "CONNECTION_STATUS",
            "connectionStatus": status
        }))
    }

    /// CATALOG message
    pub fn discover(&self) -> Result<Value> {
        let config = self.load_config()?;
        Ok(json!({
            "type": "CATALOG",
            "catalog": engine::catalog(&discover_streams(&config))
        }))
    }

    /// Run the sync, writing messages to `sink`
    pub async fn read(&self, sink: &mut dyn MessageSink) -> Result<SyncStats> {
        let config = self.load_config()?;
        config.validate()?;
        let state = self.load_state()?;

        let mut sync_config = SyncConfig::new();
        if let Commands::Read { streams } = &self.cli.command {
            if !streams.is_empty() {
                sync_config = sync_config.with_streams(streams.iter().map(|s| s.trim()));
            }
        }

        let fetcher = Self::fetcher(&config)?;
        info!(base_url = fetcher.base_url(), "Starting read");
        let mut engine =
            SyncEngine::new(fetcher, discover_streams(&config), state)?.with_config(sync_config);
        engine.sync(sink).await
    }

    /// Config from `--config-json` or `--config`
    pub fn load_config(&self) -> Result<TapConfig> {
        if let Some(json) = &self.cli.config_json {
            TapConfig::from_json(json)
        } else if let Some(path) = &self.cli.config {
            TapConfig::from_file(path)
        } else {
            Err(Error::config(
                "No configuration provided; pass --config or --config-json",
            ))
        }
    }

    /// State from `--state-json` or `--state`, empty when neither is given
    pub fn load_state(&self) -> Result<StateManager> {
        if let Some(json) = &self.cli.state_json {
            StateManager::from_json(json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    fn fetcher(config: &TapConfig) -> Result<RecordFetcher> {
        Ok(RecordFetcher::new(config.http_client()?, config.base_url()?))
    }

    /// Output a message
    fn output_message(msg: &Value) {
        println!("{}", serde_json::to_string(msg).unwrap_or_default());
    }
}
