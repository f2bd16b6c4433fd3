use lobbyist_protocol::ProtocolError;

/// Errors that can occur while talking to the lobby service.
///
/// The variants are split by what a caller can do about them: an
/// `Unauthorized` reply ends the login session, a `Status` reply means the
/// server refused the request on its merits, and everything else means
/// the request never produced a usable answer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The server answered 401: the access token is missing, expired, or
    /// revoked.
    #[error("unauthorized")]
    Unauthorized,

    /// The server answered with any other non-success status.
    #[error("server replied {status}: {body}")]
    Status { status: u16, body: String },

    /// The server could not be reached.
    #[error("lobby service unreachable: {0}")]
    Unreachable(String),

    /// The server answered, but the body was not what we expected.
    #[error(transparent)]
    Decode(#[from] ProtocolError),

    /// A request URL could not be built from the configured base URL.
    #[error("invalid url {0}")]
    InvalidUrl(String),

    /// The HTTP client failed (connect, TLS, body read, ...).
    #[cfg(feature = "http")]
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
}

impl TransportError {
    /// Maps a non-success HTTP status to the matching variant.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        if status == 401 {
            Self::Unauthorized
        } else {
            Self::Status {
                status,
                body: body.into(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_401_is_unauthorized() {
        assert!(matches!(
            TransportError::from_status(401, "ignored"),
            TransportError::Unauthorized
        ));
    }

    #[test]
    fn test_from_status_other_keeps_status_and_body() {
        let err = TransportError::from_status(400, "already launched");
        assert!(matches!(
            &err,
            TransportError::Status { status: 400, body } if body == "already launched"
        ));
        assert_eq!(err.to_string(), "server replied 400: already launched");
    }
}
