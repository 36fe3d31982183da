use std::fmt;

use reqwest::{Body, Request};
use tracing::debug;

use super::ConjurError;
use super::auth::BoxFuture;
use super::request::PreparedRequest;

/// Status and body text of a response, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// The HTTP status code.
    pub status: u16,
    /// The body, decoded as text.
    pub body: String,
}

impl RawResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Executes one prepared request.
///
/// Implementations return `Ok` for every response the server sent, whatever
/// its status; only a missing response (connection refused, reset, timeout)
/// is an error, of kind [`ErrorKind::TransportError`](super::ErrorKind::TransportError).
pub trait Transport: fmt::Debug + Send + Sync {
    /// Sends `request` and reads the whole response body.
    fn send(&self, request: PreparedRequest) -> BoxFuture<'_, Result<RawResponse, ConjurError>>;
}

/// [`Transport`] backed by a [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Wraps an existing client, sharing its connection pool.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Builds a client sending `user_agent`.
    ///
    /// # Errors
    ///
    /// Fails if the TLS backend or the system configuration cannot be loaded.
    pub fn with_user_agent(user_agent: &str) -> Result<Self, ConjurError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|err| ConjurError::TransportSetup {
                message: err.to_string(),
            })?;
        Ok(Self { client })
    }

    fn build_request(prepared: PreparedRequest) -> Request {
        let PreparedRequest {
            method,
            url,
            headers,
            body,
            timeout,
        } = prepared;

        let mut request = Request::new(method, url);
        *request.headers_mut() = headers;
        if let Some(body) = body {
            *request.body_mut() = Some(Body::from(body));
        }
        *request.timeout_mut() = timeout;
        request
    }

    async fn exchange(&self, prepared: PreparedRequest) -> Result<RawResponse, ConjurError> {
        let request = Self::build_request(prepared);

        debug!(method = %request.method(), url = %request.url(), "sending...");
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|err| ConjurError::transport(err.to_string()))?;
        let status = response.status().as_u16();
        debug!(status, "...receiving");

        let body = response
            .text()
            .await
            .map_err(|err| ConjurError::transport(format!("unable to read response body: {err}")))?;
        Ok(RawResponse { status, body })
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: PreparedRequest) -> BoxFuture<'_, Result<RawResponse, ConjurError>> {
        Box::pin(self.exchange(request))
    }
}


#[cfg(test)]
mod tests {
    use std::time::Duration;

    use http::Method;
    use http::header::AUTHORIZATION;
    use url::Url;

    use super::*;
    use crate::client::{AuthToken, Authenticator, RequestBuilder};

    #[tokio::test]
    async fn should_build_reqwest_request() {
        let base: Url = "http://localhost:8080/api".parse().expect("valid url");
        let prepared = RequestBuilder::new(&base, Method::POST, "/users")
            .add_param("login", "alice")
            .timeout(Duration::from_secs(3))
            .build()
            .prepare()
            .expect("prepared");
        let prepared = Authenticator::token(AuthToken::new("t"))
            .authenticate(prepared)
            .await
            .expect("authenticated");

        let request = ReqwestTransport::build_request(prepared);

        assert_eq!(request.method(), &Method::POST);
        insta::assert_snapshot!(request.url(), @"http://localhost:8080/api/users");
        assert!(request.headers().contains_key(AUTHORIZATION));
        assert_eq!(request.timeout(), Some(&Duration::from_secs(3)));
        let body = request.body().and_then(Body::as_bytes).expect("body");
        assert_eq!(body, b"login=alice");
    }

    #[tokio::test]
    async fn should_report_connection_failure_as_transport_error() {
        let transport = ReqwestTransport::default();
        // Port 9 (discard) is not expected to accept connections
        let base: Url = "http://127.0.0.1:9".parse().expect("valid url");
        let prepared = RequestBuilder::new(&base, Method::GET, "/users/alice")
            .timeout(Duration::from_secs(2))
            .build()
            .prepare()
            .expect("prepared");

        let error = transport.send(prepared).await.expect_err("no server");

        assert!(error.is_retryable());
        assert_eq!(error.status(), None);
    }
}
