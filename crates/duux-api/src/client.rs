// Duux cloud HTTP client
//
// Wraps `reqwest::Client` with the vendor's URL layout, bearer auth, and
// status-code classification. One client addresses one fan. No caching and
// no retries: failure counting belongs to the caller.

use std::time::Duration;

use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::auth::{Credentials, DeviceId};
use crate::command::{Command, CommandEncoding, Field, Protocol};
use crate::error::Error;
use crate::model::DeviceState;
use crate::transport::TransportConfig;

/// Production endpoint of the vendor cloud.
pub const DEFAULT_API_URL: &str = "https://v5.api.cloudgarden.nl";

/// Request/response translator for a single fan.
///
/// `GET /data/{device}/status` reads the full [`DeviceState`];
/// `POST /sensor/{device}/commands` writes one or more fields using the
/// configured [`Protocol`].
#[derive(Debug)]
pub struct DuuxClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    protocol: Protocol,
    encoding: &'static dyn CommandEncoding,
    timeout: Duration,
}

impl DuuxClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the API root, normally [`DEFAULT_API_URL`].
    pub fn new(
        base_url: Url,
        credentials: Credentials,
        protocol: Protocol,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            credentials,
            protocol,
            encoding: protocol.encoding(),
            timeout: transport.timeout,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        credentials: Credentials,
        protocol: Protocol,
    ) -> Self {
        Self {
            http,
            base_url,
            credentials,
            protocol,
            encoding: protocol.encoding(),
            timeout: crate::transport::DEFAULT_TIMEOUT,
        }
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.credentials.device_id
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/data/{device}/status`
    pub(crate) fn status_url(&self) -> Result<Url, Error> {
        self.device_url("data", "status")
    }

    /// `{base}/sensor/{device}/commands`
    pub(crate) fn commands_url(&self) -> Result<Url, Error> {
        self.device_url("sensor", "commands")
    }

    fn device_url(&self, scope: &str, leaf: &str) -> Result<Url, Error> {
        let full = format!(
            "{}/{scope}/{}/{leaf}",
            self.base_url.as_str().trim_end_matches('/'),
            self.credentials.device_id
        );
        Ok(Url::parse(&full)?)
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Read the fan's complete state.
    pub async fn fetch_status(&self) -> Result<DeviceState, Error> {
        let url = self.status_url()?;
        debug!(path = url.path(), "GET status");

        let resp = self
            .http
            .get(url)
            .bearer_auth(self.credentials.jwt_token.expose_secret())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let body = self.checked_body(resp).await?;
        DeviceState::from_envelope(&body)
    }

    /// Write one field. `value` is validated against the field's domain
    /// before anything is sent.
    pub async fn send_command(&self, field: Field, value: i64) -> Result<(), Error> {
        let command = Command::new(field, value)?;
        self.send_commands(&[command]).await
    }

    /// Write several already-validated fields.
    ///
    /// The numeric protocol packs them into one request; the text protocol
    /// sends one request per field, stopping at the first failure.
    pub async fn send_commands(&self, commands: &[Command]) -> Result<(), Error> {
        for body in self.encoding.encode(commands) {
            self.post_command(&body).await?;
        }
        Ok(())
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn post_command(&self, body: &Value) -> Result<(), Error> {
        let url = self.commands_url()?;
        debug!(path = url.path(), protocol = %self.protocol, %body, "POST command");

        let resp = self
            .http
            .post(url)
            .bearer_auth(self.credentials.jwt_token.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let reply = self.checked_body(resp).await?;
        debug!(reply = %reply, "command accepted");
        Ok(())
    }

    /// Classify the HTTP status, returning the body text on success.
    async fn checked_body(&self, resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;

        if status.is_success() {
            return Ok(body);
        }

        match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Err(Error::Authentication {
                    status: status.as_u16(),
                    message: if body.is_empty() {
                        "token expired or invalid".into()
                    } else {
                        body
                    },
                })
            }
            reqwest::StatusCode::NOT_FOUND => Err(Error::NotFound {
                device_id: self.credentials.device_id.to_string(),
            }),
            _ => Err(Error::Http {
                status: status.as_u16(),
                body,
            }),
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }
}
