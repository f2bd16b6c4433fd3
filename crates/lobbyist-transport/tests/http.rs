//! Integration tests for the HTTP transport.
//!
//! These tests spin up a tiny HTTP responder on a random port and point a
//! real `HttpTransport` at it, so we check what actually goes over the
//! wire: methods, paths, query strings, headers, and how status codes are
//! mapped back.

#[cfg(feature = "http")]
mod http {
    use lobbyist_protocol::{
        AccessToken, Codec, CreateSessionForm, JsonCodec, SessionId, TokenGrant,
        Username, VersionDigest, VersionToken,
    };
    use lobbyist_transport::{
        HttpConfig, HttpTransport, LobbyApi, PollOutcome, TransportError,
    };
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// What the stub saw for one request.
    #[derive(Debug)]
    struct Captured {
        request_line: String,
        headers: Vec<String>,
        body: String,
    }

    impl Captured {
        fn header(&self, name: &str) -> Option<String> {
            let prefix = format!("{}:", name.to_ascii_lowercase());
            self.headers.iter().find_map(|h| {
                h.to_ascii_lowercase()
                    .starts_with(&prefix)
                    .then(|| h[prefix.len()..].trim().to_string())
            })
        }
    }

    /// Serves exactly one request with the given status line and body,
    /// and hands back what the client sent.
    async fn serve_once(
        reply_status: &'static str,
        reply_body: &'static str,
    ) -> (HttpTransport, JoinHandle<Captured>) {
        serve_once_with(HttpConfig::default(), reply_status, reply_body).await
    }

    /// [`serve_once`] with a transport built from `config`.
    async fn serve_once_with(
        config: HttpConfig,
        reply_status: &'static str,
        reply_body: &'static str,
    ) -> (HttpTransport, JoinHandle<Captured>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept");

            // Read until the end of the headers, then the declared body.
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            let header_end = loop {
                let n = stream.read(&mut chunk).await.expect("read");
                assert!(n > 0, "client closed before sending headers");
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
            let mut lines = head.split("\r\n").filter(|l| !l.is_empty());
            let request_line = lines.next().unwrap_or_default().to_string();
            let headers: Vec<String> = lines.map(str::to_string).collect();

            let content_length = headers
                .iter()
                .find_map(|h| {
                    h.to_ascii_lowercase()
                        .strip_prefix("content-length:")
                        .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                })
                .unwrap_or(0);
            while buf.len() < header_end + content_length {
                let n = stream.read(&mut chunk).await.expect("read body");
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

            let response = format!(
                "HTTP/1.1 {reply_status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{reply_body}",
                reply_body.len(),
            );
            stream.write_all(response.as_bytes()).await.expect("write");
            stream.shutdown().await.ok();

            Captured {
                request_line,
                headers,
                body,
            }
        });

        let transport = HttpTransport::new(HttpConfig { base_url, ..config })
            .expect("transport should build");
        (transport, handle)
    }

    // =====================================================================
    // Token exchange
    // =====================================================================

    #[tokio::test]
    async fn test_exchange_credentials_sends_password_grant_form() {
        let (transport, server) = serve_once(
            "200 OK",
            r#"{"access_token":"a+b","refresh_token":"r","token_type":"bearer"}"#,
        )
        .await;

        let reply = transport
            .exchange_credentials(&Username::new("Maex"), "abc123_ABC123")
            .await
            .expect("exchange should succeed");

        let seen = server.await.unwrap();
        assert_eq!(seen.request_line, "POST /oauth/token HTTP/1.1");
        assert_eq!(
            seen.body,
            "grant_type=password&username=maex&password=abc123_ABC123"
        );
        assert_eq!(
            seen.header("content-type").as_deref(),
            Some("application/x-www-form-urlencoded")
        );
        // base64("bgp-client-name:bgp-client-pw")
        assert_eq!(
            seen.header("authorization").as_deref(),
            Some("Basic YmdwLWNsaWVudC1uYW1lOmJncC1jbGllbnQtcHc=")
        );
        assert!(matches!(reply.into_grant(), Ok(TokenGrant::Granted(_))));
    }

    #[tokio::test]
    async fn test_exchange_credentials_error_body_on_400_is_a_reply() {
        let (transport, server) = serve_once(
            "400 Bad Request",
            r#"{"error":"invalid_grant","error_description":"Bad credentials"}"#,
        )
        .await;

        let reply = transport
            .exchange_credentials(&Username::new("maex"), "wrong")
            .await
            .expect("a rejection is still a reply");
        server.await.unwrap();

        assert_eq!(
            reply.into_grant().unwrap(),
            TokenGrant::Denied {
                reason: "Bad credentials".into()
            }
        );
    }

    // =====================================================================
    // Session actions
    // =====================================================================

    #[tokio::test]
    async fn test_join_session_puts_player_with_escaped_token() {
        let (transport, server) = serve_once("200 OK", "").await;

        transport
            .join_session(
                &AccessToken::new("tok%2Ben"),
                &SessionId::from("7412"),
                &Username::new("bob"),
            )
            .await
            .expect("join should succeed");

        let seen = server.await.unwrap();
        assert_eq!(
            seen.request_line,
            "PUT /api/sessions/7412/players/bob?access_token=tok%2Ben HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn test_launch_session_posts_to_session() {
        let (transport, server) = serve_once("200 OK", "").await;

        transport
            .launch_session(&AccessToken::new("t"), &SessionId::from("9"))
            .await
            .expect("launch should succeed");

        let seen = server.await.unwrap();
        assert_eq!(
            seen.request_line,
            "POST /api/sessions/9?access_token=t HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn test_create_session_posts_json_form() {
        let (transport, server) = serve_once("200 OK", "").await;
        let form = CreateSessionForm {
            creator: Username::new("alice"),
            game: "Splendor".into(),
            savegame: String::new(),
        };

        transport
            .create_session(&AccessToken::new("t"), &form)
            .await
            .expect("create should succeed");

        let seen = server.await.unwrap();
        assert_eq!(
            seen.request_line,
            "POST /api/sessions?access_token=t HTTP/1.1"
        );
        assert_eq!(
            seen.header("content-type").as_deref(),
            Some(JsonCodec::CONTENT_TYPE)
        );
        let body: serde_json::Value = serde_json::from_str(&seen.body).unwrap();
        assert_eq!(body["creator"], "alice");
        assert_eq!(body["game"], "Splendor");
    }

    #[tokio::test]
    async fn test_delete_session_401_is_unauthorized() {
        let (transport, server) = serve_once("401 Unauthorized", "{}").await;

        let result = transport
            .delete_session(&AccessToken::new("expired"), &SessionId::from("1"))
            .await;
        server.await.unwrap();

        assert!(matches!(result, Err(TransportError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_launch_session_400_is_status_error() {
        let (transport, server) = serve_once("400 Bad Request", "already launched").await;

        let result = transport
            .launch_session(&AccessToken::new("t"), &SessionId::from("1"))
            .await;
        server.await.unwrap();

        assert!(matches!(
            result,
            Err(TransportError::Status { status: 400, .. })
        ));
    }

    // =====================================================================
    // Long-poll
    // =====================================================================

    #[tokio::test]
    async fn test_poll_sessions_200_returns_snapshot_with_body_version() {
        let body = r#"{"sessions":{"1":{"creator":"alice","gameParameters":{"location":"http://g","maxSessionPlayers":4,"minSessionPlayers":2,"name":"G"},"launched":false,"players":["alice"]}}}"#;
        let (transport, server) = serve_once("200 OK", body).await;

        let outcome = transport
            .poll_sessions(&VersionToken::initial())
            .await
            .expect("poll should succeed");

        let seen = server.await.unwrap();
        assert_eq!(seen.request_line, "GET /api/sessions?hash= HTTP/1.1");
        match outcome {
            PollOutcome::Changed(snapshot) => {
                assert_eq!(snapshot.len(), 1);
                assert_eq!(
                    snapshot.version(),
                    &VersionDigest::Md5.token(body.as_bytes())
                );
            }
            other => panic!("expected Changed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_poll_sessions_uses_configured_digest() {
        let body = r#"{"sessions":{}}"#;
        let config = HttpConfig {
            version_digest: VersionDigest::Sha256,
            ..HttpConfig::default()
        };
        let (transport, server) = serve_once_with(config, "200 OK", body).await;

        let outcome = transport
            .poll_sessions(&VersionToken::initial())
            .await
            .expect("poll should succeed");

        server.await.unwrap();
        match outcome {
            PollOutcome::Changed(snapshot) => assert_eq!(
                snapshot.version(),
                &VersionDigest::Sha256.token(body.as_bytes())
            ),
            other => panic!("expected Changed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_poll_sessions_408_is_unchanged() {
        let (transport, server) = serve_once("408 Request Timeout", "").await;
        let version = VersionToken::of(b"previous");

        let outcome = transport.poll_sessions(&version).await.expect("poll");

        let seen = server.await.unwrap();
        assert_eq!(
            seen.request_line,
            format!("GET /api/sessions?hash={} HTTP/1.1", version.as_str())
        );
        assert_eq!(outcome, PollOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_poll_sessions_nobody_listening_is_unreachable() {
        // Bind to grab a free port, then close it again.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new(HttpConfig {
            base_url: format!("http://{addr}"),
            ..HttpConfig::default()
        })
        .unwrap();

        let result = transport.poll_sessions(&VersionToken::initial()).await;
        assert!(matches!(result, Err(TransportError::Unreachable(_))));
    }
}
