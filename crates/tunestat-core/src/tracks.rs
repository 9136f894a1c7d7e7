//! Track data endpoints.
//!
//! Typed records for `/top-tracks`, `/saved-tracks` and `/taste-visualizer`.
//! Payloads are validated at the boundary: an `{ "error": ... }` envelope,
//! a non-2xx status, or a record missing a field is an error, not a partial list.

use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, COOKIE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::Config;

/// One of the user's top tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopTrack {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub album: String,
    pub image: String,
}

/// A saved track with album art and stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedTrack {
    pub name: String,
    pub artist: String,
    pub album: String,
    pub image: String,
    pub release_date: String,
    /// Preformatted, e.g. `3m 25s`.
    pub duration: String,
    /// 0-100.
    pub popularity: u8,
}

/// A point of the taste scatter plot: popularity (x) against duration in seconds (y).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizerPoint {
    pub name: String,
    pub artist: String,
    pub image: String,
    pub x: f64,
    pub y: f64,
    pub explicit: bool,
    pub release_year: String,
}

#[derive(Debug, Deserialize)]
struct TopTracksBody {
    tracks: Vec<TopTrack>,
}

#[derive(Debug, Deserialize)]
struct SavedTracksBody {
    album_covers: Vec<SavedTrack>,
}

#[derive(Debug, Deserialize)]
struct VisualizerBody {
    tracks: Vec<VisualizerPoint>,
}

/// Client for the backend's data endpoints.
#[derive(Debug, Clone)]
pub struct TracksClient {
    client: reqwest::Client,
    config: Config,
    token: String,
}

impl TracksClient {
    /// Creates a client that authenticates with `token`.
    ///
    /// # Errors
    /// Returns an error if the backend URL is invalid or the HTTP client cannot be built.
    pub fn new(config: &Config, token: impl Into<String>) -> Result<Self> {
        config.backend()?;
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            config: config.clone(),
            token: token.into(),
        })
    }

    /// # Errors
    /// Returns an error if the request fails or the payload is invalid.
    pub async fn top_tracks(&self) -> Result<Vec<TopTrack>> {
        let body: TopTracksBody = self.get_json("top-tracks").await?;
        Ok(body.tracks)
    }

    /// # Errors
    /// Returns an error if the request fails or the payload is invalid.
    pub async fn saved_tracks(&self) -> Result<Vec<SavedTrack>> {
        let body: SavedTracksBody = self.get_json("saved-tracks").await?;
        Ok(body.album_covers)
    }

    /// # Errors
    /// Returns an error if the request fails or the payload is invalid.
    pub async fn taste_visualizer(&self) -> Result<Vec<VisualizerPoint>> {
        let body: VisualizerBody = self.get_json("taste-visualizer").await?;
        Ok(body.tracks)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url: Url = self.config.endpoint(endpoint)?;
        let mut request = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .bearer_auth(&self.token);
        if let Some(cookie) = &self.config.session_cookie {
            request = request.header(COOKIE, cookie);
        }
        tracing::debug!(%url, "fetching track data");

        let response = request
            .timeout(self.config.data_timeout())
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read response from {url}"))?;

        decode_payload(endpoint, status.as_u16(), &text)
    }
}

/// Validates a data-endpoint response body.
fn decode_payload<T: DeserializeOwned>(endpoint: &str, status: u16, body: &str) -> Result<T> {
    let value: serde_json::Value = serde_json::from_str(body).with_context(|| {
        if (200..300).contains(&status) {
            format!("{endpoint}: response is not JSON")
        } else {
            format!("{endpoint}: HTTP {status}")
        }
    })?;

    if let Some(message) = error_message(&value) {
        anyhow::bail!("{endpoint}: {message}");
    }
    if !(200..300).contains(&status) {
        anyhow::bail!("{endpoint}: HTTP {status}");
    }

    serde_json::from_value(value).with_context(|| format!("{endpoint}: unexpected payload shape"))
}

/// Extracts `error` or FastAPI-style `detail` from an error envelope.
fn error_message(value: &serde_json::Value) -> Option<String> {
    let object = value.as_object()?;
    ["error", "detail"].iter().find_map(|key| {
        object.get(*key).map(|v| match v.as_str() {
            Some(s) => s.to_string(),
            None => v.to_string(),
        })
    })
}
