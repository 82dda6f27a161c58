use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{CustomType, Select, Text};
use weather_core::{BackendProvider, Config, Engine, StaleResponses, Update};

use crate::{render, session};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather lookup client")]
pub struct Cli {
    /// Backend endpoint to use for this run, e.g. "http://localhost:8080".
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the backend endpoint and lookup behaviour.
    Configure,

    /// Show current weather and outlook for a city.
    Show {
        /// City or location name.
        city: String,
    },

    /// Start an interactive session with clock and search history.
    Interactive,

    /// Check that the backend is reachable.
    Health,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;
        if let Some(endpoint) = self.endpoint {
            config.set_endpoint(endpoint);
        }

        match self.command {
            Command::Configure => configure(config),
            Command::Show { city } => show(&config, &city).await,
            Command::Interactive => {
                let engine = Engine::from_config(&config)?;
                session::run(engine).await
            }
            Command::Health => {
                config.validate()?;
                BackendProvider::new(config.endpoint(), config.request_timeout())
                    .health()
                    .await?;
                println!("{} is healthy", config.endpoint());
                Ok(())
            }
        }
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let current_endpoint = config.endpoint().to_owned();
    let endpoint = Text::new("Backend endpoint:")
        .with_default(&current_endpoint)
        .prompt()
        .context("Failed to read endpoint")?;

    let timeout_secs = CustomType::<u64>::new("Request timeout (seconds):")
        .with_default(config.request_timeout().as_secs())
        .with_error_message("Please enter a whole number of seconds")
        .prompt()
        .context("Failed to read timeout")?;

    let policies = vec!["discard", "apply"];
    let starting = match config.stale_responses {
        StaleResponses::Discard => 0,
        StaleResponses::Apply => 1,
    };
    let policy = Select::new("Responses to superseded lookups:", policies)
        .with_starting_cursor(starting)
        .with_help_message("discard: only the latest lookup counts; apply: last response wins")
        .prompt()
        .context("Failed to read stale response policy")?;

    config.set_endpoint(endpoint);
    config.timeout_secs = Some(timeout_secs);
    config.stale_responses = match policy {
        "apply" => StaleResponses::Apply,
        _ => StaleResponses::Discard,
    };
    config.validate()?;
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(config: &Config, city: &str) -> anyhow::Result<()> {
    let mut engine = Engine::from_config(config)?;
    tracing::debug!(city, endpoint = config.endpoint(), "one-shot lookup");

    if engine.submit_lookup(Some(city)).is_some() {
        loop {
            if let Update::LookupSucceeded { .. } | Update::LookupFailed { .. } =
                engine.next_update().await
            {
                break;
            }
        }
    }

    println!("{}", render::render_state(engine.state()));
    let failure = engine.state().status.error().map(str::to_owned);
    engine.shutdown().await;

    if let Some(reason) = failure {
        bail!(reason);
    }
    Ok(())
}
