//! Client for the joke endpoint.
//!
//! One GET, no body, no auth, no retries. The response is an envelope with
//! the joke text nested inside: `{ "value": { "joke": "..." } }`.

use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::resource::LoadError;

pub const DEFAULT_ENDPOINT: &str = "https://api.icndb.com/jokes/random";

pub struct JokeApi {
    client: reqwest::Client,
    endpoint: String,
}

impl JokeApi {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Fetch one joke, honoring `cancel` at every await point.
    ///
    /// Cancellation settles as [`LoadError::Cancelled`]; everything else the
    /// transport or the decoder can do wrong settles as
    /// [`LoadError::Failed`].
    pub async fn fetch_joke(&self, cancel: CancellationToken) -> Result<String, LoadError> {
        let request = self.client.get(self.endpoint.as_str()).send();

        let response = tokio::select! {
            () = cancel.cancelled() => return Err(LoadError::Cancelled),
            response = request => response.map_err(LoadError::failed)?,
        };
        let response = response.error_for_status().map_err(LoadError::failed)?;

        let envelope = tokio::select! {
            () = cancel.cancelled() => return Err(LoadError::Cancelled),
            envelope = response.json::<JokeEnvelope>() => envelope.map_err(LoadError::failed)?,
        };

        Ok(envelope.value.joke)
    }
}

impl Default for JokeApi {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

#[derive(Debug, Deserialize)]
struct JokeEnvelope {
    value: JokeValue,
}

#[derive(Debug, Deserialize)]
struct JokeValue {
    joke: String,
}
