//! Authenticated request pipeline shared by the service clients.
//!
//! A call goes through four steps:
//!
//! 1. a [`Request`] is built with [`RequestBuilder`], relative to the client
//!    endpoint;
//! 2. the [`Authenticator`] adds the `Authorization` header, logging in first
//!    if needed;
//! 3. the [`Transport`] sends it;
//! 4. [`AuthenticatedClient::execute`] maps the status to the body text or to
//!    a [`ConjurError`].
//!
//! In credential mode a `401 Unauthorized` answer drops the cached token and
//! the call is sent once more with a fresh one. A second `401` is returned to
//! the caller.

use std::sync::Arc;
use std::time::Duration;

use http::Method;
use tracing::{debug, warn};
use url::Url;

mod auth;
pub use self::auth::{
    Authenticator, AuthenticationError, BoxFuture, Credentials, CredentialsAuthenticator,
    SecureString, TokenProvider,
};

mod builder;
pub use self::builder::{AuthenticatedClientBuilder, DEFAULT_USER_AGENT};

mod endpoint;
pub use self::endpoint::{
    APPLIANCE_URL_VAR, AUTHN_URL_VAR, CORE_URL_VAR, EndpointSource, Endpoints, SECRETS_URL_VAR,
    Service,
};

mod error;
pub use self::error::{ConjurError, ErrorKind};
pub(crate) use self::error::ensure_not_blank;

mod path;
pub use self::path::{ResourcePath, encode_segment};

mod request;
pub use self::request::{PreparedRequest, Request, RequestBuilder};

mod retry;
pub use self::retry::{default_backoff, retry_transport};

mod token;
pub use self::token::{AuthToken, DEFAULT_TOKEN_TTL};
use self::token::Lease;

mod transport;
pub use self::transport::{RawResponse, ReqwestTransport, Transport};
#[cfg(test)]
pub(crate) use self::transport::scripted;

/// HTTP client bound to one service endpoint and one identity.
///
/// Cloning is cheap and clones share the token cache, so a login done by one
/// clone serves all of them.
///
/// ```rust
/// use conjur_core::{AuthToken, AuthenticatedClient};
/// use http::Method;
///
/// # async fn example() -> Result<(), conjur_core::ConjurError> {
/// let client = AuthenticatedClient::builder()
///     .with_endpoint("https://conjur.example.com/api")
///     .with_token(AuthToken::new("token"))
///     .build()?;
///
/// let request = client
///     .request_builder(Method::GET, "/variables/db-password/value")
///     .add_param("version", "2")
///     .build();
/// let value = client.execute(request).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedClient {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    endpoint: Url,
    service: Service,
    authenticator: Authenticator,
    transport: Arc<dyn Transport>,
    default_timeout: Option<Duration>,
}

impl AuthenticatedClient {
    /// Starts building a client.
    pub fn builder() -> AuthenticatedClientBuilder {
        AuthenticatedClientBuilder::default()
    }

    /// The resolved base URL.
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// The service this client talks to.
    pub fn service(&self) -> Service {
        self.inner.service
    }

    /// How requests are authenticated.
    pub fn authenticator(&self) -> &Authenticator {
        &self.inner.authenticator
    }

    /// A request without parameters nor body, rooted at the client endpoint.
    pub fn request(&self, method: Method, path: impl Into<String>) -> Request {
        self.request_builder(method, path).build()
    }

    /// A [`RequestBuilder`] rooted at the client endpoint.
    pub fn request_builder(&self, method: Method, path: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(&self.inner.endpoint, method, path)
    }

    /// Authenticates and sends `request`, returning the body of a
    /// `200..=399` response.
    ///
    /// # Errors
    ///
    /// - an HTTP failure status gives the [`ErrorKind`] mapped from it, with
    ///   the status and the body text;
    /// - no response (connection failure, or login plus exchange exceeding the
    ///   timeout) gives [`ErrorKind::TransportError`];
    /// - a failed login is returned as the provider reported it.
    pub async fn execute(&self, request: Request) -> Result<String, ConjurError> {
        let timeout = request.timeout().or(self.inner.default_timeout);
        let prepared = request.prepare()?.with_timeout(timeout);

        let (response, lease) = self.send(prepared.clone()).await?;
        let response = if response.status == 401 && self.inner.authenticator.refreshes() {
            warn!(url = %prepared.url, "token rejected, logging in again");
            self.inner.authenticator.reject(lease).await;
            let (response, _) = self.send(prepared).await?;
            response
        } else {
            response
        };

        match ErrorKind::from_status(response.status) {
            None => Ok(response.body),
            Some(kind) => {
                debug!(status = response.status, %kind, "call failed");
                Err(ConjurError::Http {
                    kind,
                    status: response.status,
                    body: response.body,
                })
            }
        }
    }

    async fn send(
        &self,
        prepared: PreparedRequest,
    ) -> Result<(RawResponse, Option<Lease>), ConjurError> {
        let timeout = prepared.timeout;
        let exchange = async {
            let (prepared, lease) = self.inner.authenticator.attach(prepared).await?;

            debug!(?prepared, "sending...");
            let response = self.inner.transport.send(prepared).await?;
            debug!(status = response.status, "...receiving");

            Ok::<_, ConjurError>((response, lease))
        };

        // The login, when one is needed, counts against the same limit
        match timeout {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .map_err(|_| ConjurError::transport(format!("no response after {limit:?}")))?,
            None => exchange.await,
        }
    }
}
