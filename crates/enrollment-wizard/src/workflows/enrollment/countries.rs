use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::IntegrationConfig;

#[derive(Debug, thiserror::Error)]
pub enum CountryFetchError {
    #[error("country request failed: {0}")]
    Transport(String),
    #[error("country source responded with HTTP {status}")]
    Status { status: u16 },
    #[error("unable to decode country list: {0}")]
    Decode(String),
}

/// Source of the country names offered on the first step.
#[async_trait]
pub trait CountrySource: Send + Sync {
    async fn fetch_countries(&self) -> Result<Vec<String>, CountryFetchError>;
}

/// REST Countries style endpoint returning `[{ "name": { "common": ... } }, ...]`.
#[derive(Debug, Clone)]
pub struct RestCountriesClient {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct CountryEntry {
    name: CountryName,
}

#[derive(Debug, Deserialize)]
struct CountryName {
    common: String,
}

impl RestCountriesClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_config(config: &IntegrationConfig) -> Result<Self, reqwest::Error> {
        Self::new(config.countries_url.clone(), config.request_timeout)
    }
}

#[async_trait]
impl CountrySource for RestCountriesClient {
    async fn fetch_countries(&self) -> Result<Vec<String>, CountryFetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|err| CountryFetchError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CountryFetchError::Status {
                status: status.as_u16(),
            });
        }

        let entries: Vec<CountryEntry> = response
            .json()
            .await
            .map_err(|err| CountryFetchError::Decode(err.to_string()))?;

        Ok(normalize_names(
            entries.into_iter().map(|entry| entry.name.common),
        ))
    }
}

/// Trimmed, de-duplicated, alphabetical.
pub fn normalize_names(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut names: Vec<String> = names
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    names.sort();
    names.dedup();
    names
}
