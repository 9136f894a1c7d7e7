//! Session probe against the backend's `/auth-status` endpoint.
//!
//! A probe is a single request with no retries. Failures come back as
//! [`ProbeError`], which means "unknown", never "logged out".

use std::fmt;
use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, COOKIE};
use serde::Deserialize;
use url::Url;

use super::ProbeResult;
use crate::config::Config;

/// Category of a failed probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeErrorKind {
    /// Connection or transport failure.
    Network,
    /// No answer within the configured timeout.
    Timeout,
    /// Non-2xx status.
    HttpStatus,
    /// Body did not match `{ logged_in: bool, token: string|null }`.
    Malformed,
}

impl fmt::Display for ProbeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeErrorKind::Network => write!(f, "network"),
            ProbeErrorKind::Timeout => write!(f, "timeout"),
            ProbeErrorKind::HttpStatus => write!(f, "http_status"),
            ProbeErrorKind::Malformed => write!(f, "malformed"),
        }
    }
}

/// A probe that could not produce an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeError {
    pub kind: ProbeErrorKind,
    pub message: String,
}

impl ProbeError {
    pub fn new(kind: ProbeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            ProbeErrorKind::Timeout,
            format!("auth-status did not answer within {}s", after.as_secs()),
        )
    }

    pub fn http_status(status: u16) -> Self {
        Self::new(ProbeErrorKind::HttpStatus, format!("HTTP {status}"))
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ProbeErrorKind::Malformed, message)
    }

    fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::new(ProbeErrorKind::Timeout, err.to_string());
        }
        if err.is_decode() {
            return Self::malformed(err.to_string());
        }
        Self::new(ProbeErrorKind::Network, err.to_string())
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ProbeError {}

/// Asks the backend whether the current session is authenticated.
pub trait SessionProbe {
    fn probe(&self) -> impl Future<Output = Result<ProbeResult, ProbeError>> + Send;
}

/// Wire shape of `/auth-status`.
#[derive(Debug, Deserialize)]
struct AuthStatusBody {
    logged_in: bool,
    #[serde(default)]
    token: Option<String>,
}

/// Validates an `/auth-status` body.
///
/// `logged_in = true` without a non-empty token is rejected: an authenticated
/// answer that carries no credential is not a usable answer.
///
/// # Errors
/// Returns `Malformed` for any body outside the contract.
pub fn parse_auth_status(body: &str) -> Result<ProbeResult, ProbeError> {
    let parsed: AuthStatusBody = serde_json::from_str(body)
        .map_err(|e| ProbeError::malformed(format!("invalid auth-status body: {e}")))?;

    if !parsed.logged_in {
        return Ok(ProbeResult::unauthenticated());
    }

    match parsed.token.filter(|t| !t.trim().is_empty()) {
        Some(token) => Ok(ProbeResult::authenticated(token)),
        None => Err(ProbeError::malformed(
            "auth-status reported logged_in without a token",
        )),
    }
}

/// Production probe over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSessionProbe {
    client: reqwest::Client,
    url: Url,
    session_cookie: Option<String>,
    timeout: Duration,
}

impl HttpSessionProbe {
    /// Builds a probe from config.
    ///
    /// # Errors
    /// Returns an error if the backend URL is invalid or the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            url: config.endpoint("auth-status")?,
            session_cookie: config.session_cookie.clone(),
            timeout: config.probe_timeout(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn fetch(&self) -> Result<ProbeResult, ProbeError> {
        let mut request = self
            .client
            .get(self.url.clone())
            .header(ACCEPT, "application/json");
        if let Some(cookie) = &self.session_cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProbeError::from_reqwest(&e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::http_status(status.as_u16()));
        }
        let body = response
            .text()
            .await
            .map_err(|e| ProbeError::from_reqwest(&e))?;
        parse_auth_status(&body)
    }
}

impl SessionProbe for HttpSessionProbe {
    async fn probe(&self) -> Result<ProbeResult, ProbeError> {
        tracing::debug!(url = %self.url, "probing session");
        match tokio::time::timeout(self.timeout, self.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::timeout(self.timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config_for(server: &MockServer) -> Config {
        Config {
            backend_url: server.uri(),
            probe_timeout_secs: 1,
            ..Config::default()
        }
    }

    #[test]
    fn logged_out_ignores_token_field() {
        let result = parse_auth_status(r#"{"logged_in": false, "token": "stale"}"#).unwrap();
        assert_eq!(result, ProbeResult::unauthenticated());
    }

    #[test]
    fn logged_in_requires_token() {
        let err = parse_auth_status(r#"{"logged_in": true, "token": null}"#).unwrap_err();
        assert_eq!(err.kind, ProbeErrorKind::Malformed);

        let err = parse_auth_status(r#"{"logged_in": true, "token": ""}"#).unwrap_err();
        assert_eq!(err.kind, ProbeErrorKind::Malformed);
    }

    #[test]
    fn wrong_shapes_are_malformed() {
        for body in [
            "",
            "not json",
            "[]",
            r#"{"token": "abc"}"#,
            r#"{"logged_in": "yes", "token": "abc"}"#,
        ] {
            let err = parse_auth_status(body).unwrap_err();
            assert_eq!(err.kind, ProbeErrorKind::Malformed, "body: {body:?}");
        }
    }

    #[tokio::test]
    async fn probe_sends_cookie_and_parses_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth-status"))
            .and(header("cookie", "spotify_token=abc"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"logged_in": true, "token": "abc"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let config = Config {
            session_cookie: Some("spotify_token=abc".to_string()),
            ..config_for(&server)
        };
        let probe = HttpSessionProbe::from_config(&config).unwrap();
        assert_eq!(probe.probe().await.unwrap(), ProbeResult::authenticated("abc"));
    }

    #[tokio::test]
    async fn server_error_is_not_a_logout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth-status"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let probe = HttpSessionProbe::from_config(&config_for(&server)).unwrap();
        let err = probe.probe().await.unwrap_err();
        assert_eq!(err, ProbeError::http_status(503));
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth-status"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"logged_in": false, "token": null}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let probe = HttpSessionProbe::from_config(&config_for(&server)).unwrap();
        let err = probe.probe().await.unwrap_err();
        assert_eq!(err.kind, ProbeErrorKind::Timeout);
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() {
        let config = Config {
            backend_url: "http://127.0.0.1:9".to_string(),
            probe_timeout_secs: 2,
            ..Config::default()
        };
        let probe = HttpSessionProbe::from_config(&config).unwrap();
        let err = probe.probe().await.unwrap_err();
        assert!(matches!(
            err.kind,
            ProbeErrorKind::Network | ProbeErrorKind::Timeout
        ));
    }
}
