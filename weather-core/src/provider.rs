use crate::{Config, LookupError, WeatherSnapshot, provider::backend::BackendProvider};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod backend;

/// Resolves a location name to the current weather.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn lookup(&self, location: &str) -> Result<WeatherSnapshot, LookupError>;
}

/// Construct the backend provider described by `config`.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    config.validate()?;

    let provider: Arc<dyn WeatherProvider> =
        Arc::new(BackendProvider::new(config.endpoint(), config.request_timeout()));

    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_default_config() {
        let cfg = Config::default();
        let provider = provider_from_config(&cfg).expect("default config is valid");
        assert!(format!("{provider:?}").contains("localhost:8080"));
    }

    #[test]
    fn provider_from_config_rejects_bad_endpoint() {
        let mut cfg = Config::default();
        cfg.set_endpoint("not a url");

        let err = provider_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("Invalid endpoint"));
    }
}
