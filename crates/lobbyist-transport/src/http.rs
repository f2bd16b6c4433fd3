//! `reqwest` implementation of [`LobbyApi`].

use std::time::Duration;

use lobbyist_protocol::{
    AccessToken, Authority, Codec, CollectionSnapshot, CreateSessionForm,
    JsonCodec, SessionId, TokenReply, Username, VersionDigest, VersionToken,
};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};

use crate::{LobbyApi, PollOutcome, TransportError};

/// Status the long-poll endpoint uses to say "nothing changed before my
/// timeout".
const LONG_POLL_TIMEOUT: StatusCode = StatusCode::REQUEST_TIMEOUT;

/// Connection settings for the lobby service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Scheme, host and port of the lobby service, without a trailing path.
    pub base_url: String,

    /// OAuth client identity sent as HTTP basic auth on the token exchange.
    pub client_id: String,
    pub client_secret: String,

    /// Upper bound on establishing a TCP/TLS connection. There is no
    /// overall request timeout: long-polls are held open by the server.
    pub connect_timeout: Duration,

    /// Digest the service compares the long-poll `hash` against.
    pub version_digest: VersionDigest,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:4242".to_string(),
            client_id: "bgp-client-name".to_string(),
            client_secret: "bgp-client-pw".to_string(),
            connect_timeout: Duration::from_secs(5),
            version_digest: VersionDigest::Md5,
        }
    }
}

/// Talks to the lobby service over HTTP.
///
/// Cheap to share: `reqwest::Client` pools connections internally, so
/// one `HttpTransport` behind an `Arc` serves every task.
#[derive(Debug)]
pub struct HttpTransport<C: Codec = JsonCodec> {
    client: reqwest::Client,
    config: HttpConfig,
    codec: C,
}

impl HttpTransport<JsonCodec> {
    /// Creates a transport that decodes bodies as JSON.
    pub fn new(config: HttpConfig) -> Result<Self, TransportError> {
        Self::with_codec(config, JsonCodec)
    }
}

impl<C: Codec> HttpTransport<C> {
    /// Creates a transport with a custom codec.
    pub fn with_codec(
        config: HttpConfig,
        codec: C,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(TransportError::Request)?;
        Ok(Self {
            client,
            config,
            codec,
        })
    }

    /// Returns the configuration this transport was built with.
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Builds an absolute URL from a path (and optional query).
    ///
    /// The string is assembled by hand instead of through
    /// `Url::query_pairs_mut` because access tokens are stored
    /// pre-escaped: `%2B` must reach the server as-is, not as `%252B`.
    fn url(&self, path_and_query: &str) -> Result<reqwest::Url, TransportError> {
        let raw = format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            path_and_query
        );
        reqwest::Url::parse(&raw).map_err(|_| TransportError::InvalidUrl(raw))
    }

    fn authorized_url(
        &self,
        path: &str,
        token: &AccessToken,
    ) -> Result<reqwest::Url, TransportError> {
        self.url(&format!("{path}?access_token={}", token.as_str()))
    }

    /// Sends a request and returns the status and raw body.
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<(StatusCode, Vec<u8>), TransportError> {
        let response = request.send().await.map_err(classify)?;
        let status = response.status();
        let body = response.bytes().await.map_err(classify)?;
        Ok((status, body.to_vec()))
    }

    /// Sends a request and fails on any non-success status.
    async fn expect_success(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Vec<u8>, TransportError> {
        let (status, body) = self.execute(request).await?;
        if !status.is_success() {
            return Err(TransportError::from_status(
                status.as_u16(),
                String::from_utf8_lossy(&body),
            ));
        }
        Ok(body)
    }

    async fn session_action(
        &self,
        method: Method,
        url: reqwest::Url,
        session: &SessionId,
    ) -> Result<(), TransportError> {
        tracing::debug!(%method, %session, "sending session action");
        self.expect_success(self.client.request(method, url))
            .await
            .map(|_| ())
    }
}

/// Separates "never reached the server" from other client failures.
fn classify(err: reqwest::Error) -> TransportError {
    if err.is_connect() || err.is_timeout() {
        TransportError::Unreachable(err.to_string())
    } else {
        TransportError::Request(err)
    }
}

impl<C: Codec> LobbyApi for HttpTransport<C> {
    async fn exchange_credentials(
        &self,
        username: &Username,
        password: &str,
    ) -> Result<TokenReply, TransportError> {
        let url = self.url("/oauth/token")?;
        let request = self
            .client
            .post(url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", username.as_str()),
                ("password", password),
            ]);

        let (status, body) = self.execute(request).await?;

        // Some OAuth servers answer a bad password with 400 instead of
        // 200; the body still carries `error`, which is what counts.
        match self.codec.decode::<TokenReply>(&body) {
            Ok(reply) if status.is_success() || reply.error.is_some() => Ok(reply),
            Ok(_) => Err(TransportError::from_status(
                status.as_u16(),
                String::from_utf8_lossy(&body),
            )),
            Err(_) if !status.is_success() => Err(TransportError::from_status(
                status.as_u16(),
                String::from_utf8_lossy(&body),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn roles(
        &self,
        token: &AccessToken,
    ) -> Result<Vec<Authority>, TransportError> {
        let url = self.authorized_url("/oauth/role", token)?;
        let body = self.expect_success(self.client.get(url)).await?;
        Ok(self.codec.decode(&body)?)
    }

    async fn game_services(&self) -> Result<Vec<String>, TransportError> {
        let url = self.url("/api/gameservices")?;
        let body = self.expect_success(self.client.get(url)).await?;
        Ok(self.codec.decode(&body)?)
    }

    async fn create_session(
        &self,
        token: &AccessToken,
        form: &CreateSessionForm,
    ) -> Result<(), TransportError> {
        let url = self.authorized_url("/api/sessions", token)?;
        let body = self.codec.encode(form)?;
        let request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, C::CONTENT_TYPE)
            .body(body);
        self.expect_success(request).await.map(|_| ())
    }

    async fn join_session(
        &self,
        token: &AccessToken,
        session: &SessionId,
        player: &Username,
    ) -> Result<(), TransportError> {
        let url = self.authorized_url(
            &format!("/api/sessions/{session}/players/{player}"),
            token,
        )?;
        self.session_action(Method::PUT, url, session).await
    }

    async fn leave_session(
        &self,
        token: &AccessToken,
        session: &SessionId,
        player: &Username,
    ) -> Result<(), TransportError> {
        let url = self.authorized_url(
            &format!("/api/sessions/{session}/players/{player}"),
            token,
        )?;
        self.session_action(Method::DELETE, url, session).await
    }

    async fn delete_session(
        &self,
        token: &AccessToken,
        session: &SessionId,
    ) -> Result<(), TransportError> {
        let url = self.authorized_url(&format!("/api/sessions/{session}"), token)?;
        self.session_action(Method::DELETE, url, session).await
    }

    async fn launch_session(
        &self,
        token: &AccessToken,
        session: &SessionId,
    ) -> Result<(), TransportError> {
        let url = self.authorized_url(&format!("/api/sessions/{session}"), token)?;
        self.session_action(Method::POST, url, session).await
    }

    async fn poll_sessions(
        &self,
        version: &VersionToken,
    ) -> Result<PollOutcome, TransportError> {
        let url = self.url(&format!("/api/sessions?hash={}", version.as_str()))?;
        let (status, body) = self.execute(self.client.get(url)).await?;

        if status == LONG_POLL_TIMEOUT {
            return Ok(PollOutcome::Unchanged);
        }
        if !status.is_success() {
            return Err(TransportError::from_status(
                status.as_u16(),
                String::from_utf8_lossy(&body),
            ));
        }

        let snapshot =
            CollectionSnapshot::from_body_with(&self.codec, &body, self.config.version_digest)?;
        Ok(PollOutcome::Changed(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base_url: &str) -> HttpTransport {
        HttpTransport::new(HttpConfig {
            base_url: base_url.to_string(),
            ..HttpConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_url_strips_trailing_slash_of_base() {
        let url = transport("http://lobby:4242/").url("/api/sessions").unwrap();
        assert_eq!(url.as_str(), "http://lobby:4242/api/sessions");
    }

    #[test]
    fn test_authorized_url_keeps_escaped_plus() {
        let url = transport("http://lobby:4242")
            .authorized_url("/api/sessions/1", &AccessToken::new("ab%2Bcd"))
            .unwrap();
        assert_eq!(url.query(), Some("access_token=ab%2Bcd"));
    }

    #[test]
    fn test_url_invalid_base_returns_invalid_url() {
        let result = transport("not a url").url("/api/sessions");
        assert!(matches!(result, Err(TransportError::InvalidUrl(_))));
    }

    #[test]
    fn test_http_config_default_uses_platform_client_identity() {
        let config = HttpConfig::default();
        assert_eq!(config.client_id, "bgp-client-name");
        assert_eq!(config.client_secret, "bgp-client-pw");
    }
}
