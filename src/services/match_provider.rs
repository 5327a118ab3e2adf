use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::settings::ProviderSettings;
use crate::models::match_data::{Match, ProviderRoundPayload};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request for round {round} timed out")]
    Timeout { round: u32 },

    #[error("provider request for round {round} failed: {source}")]
    Http {
        round: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("provider returned status {status} for round {round}")]
    Status { round: u32, status: u16 },

    #[error("malformed provider payload for round {round}: {reason}")]
    Decode { round: u32, reason: String },
}

/// External source of fixtures, one round at a time. Stateless; failures are
/// returned and never cause side effects.
#[async_trait]
pub trait MatchProvider: Send + Sync {
    async fn fetch_round(&self, round: u32) -> Result<Vec<Match>, ProviderError>;
}

#[derive(Debug, Clone)]
pub struct HttpMatchProvider {
    client: Client,
    base_url: String,
    round_path: String,
}

impl HttpMatchProvider {
    pub fn new(settings: &ProviderSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            round_path: settings.round_path.clone(),
        })
    }

    pub fn round_url(&self, round: u32) -> String {
        let path = self.round_path.replace("{round}", &round.to_string());
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

fn classify(round: u32, error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout { round }
    } else if error.is_decode() {
        ProviderError::Decode { round, reason: error.to_string() }
    } else {
        ProviderError::Http { round, source: error }
    }
}

#[async_trait]
impl MatchProvider for HttpMatchProvider {
    async fn fetch_round(&self, round: u32) -> Result<Vec<Match>, ProviderError> {
        let url = self.round_url(round);
        debug!("Fetching round {} from {}", round, url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| classify(round, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status { round, status: status.as_u16() });
        }

        let payload: ProviderRoundPayload = response.json().await.map_err(|e| classify(round, e))?;

        payload
            .matches
            .into_iter()
            .map(|m| m.into_match(round))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| ProviderError::Decode { round, reason })
    }
}
