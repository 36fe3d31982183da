use std::sync::Arc;
use std::time::Duration;

use super::{
    AuthenticatedClient, Authenticator, ClientInner, ConjurError, EndpointSource, ReqwestTransport,
    Service, Transport,
};

/// `User-Agent` sent by the default transport.
pub const DEFAULT_USER_AGENT: &str = concat!("conjur-core/", env!("CARGO_PKG_VERSION"));

/// Builder for [`AuthenticatedClient`].
///
/// An endpoint and an authenticator are required. The service defaults to
/// [`Service::Directory`], the transport to a [`ReqwestTransport`] sending
/// [`DEFAULT_USER_AGENT`], and requests have no timeout unless one is set
/// here or on the request.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use conjur_core::{AuthToken, AuthenticatedClient, Endpoints, Service};
///
/// # fn example() -> Result<(), conjur_core::ConjurError> {
/// let endpoints = Endpoints::from_appliance_url("https://conjur.example.com")?;
/// let client = AuthenticatedClient::builder()
///     .with_endpoint(endpoints)
///     .with_service(Service::Secrets)
///     .with_token(AuthToken::new("token-from-elsewhere"))
///     .with_timeout(Duration::from_secs(10))
///     .build()?;
///
/// assert_eq!(client.endpoint().as_str(), "https://conjur.example.com/");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedClientBuilder {
    endpoint: Option<EndpointSource>,
    service: Service,
    authenticator: Option<Authenticator>,
    transport: Option<Arc<dyn Transport>>,
    default_timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl Default for AuthenticatedClientBuilder {
    fn default() -> Self {
        Self {
            endpoint: None,
            service: Service::Directory,
            authenticator: None,
            transport: None,
            default_timeout: None,
            user_agent: None,
        }
    }
}

impl AuthenticatedClientBuilder {
    /// Builds the client, resolving the endpoint for the selected service.
    ///
    /// # Errors
    ///
    /// Fails if the endpoint or the authenticator is missing, if the endpoint
    /// is not an absolute `http`/`https` URL, or if the default transport
    /// cannot be created.
    pub fn build(self) -> Result<AuthenticatedClient, ConjurError> {
        let Self {
            endpoint,
            service,
            authenticator,
            transport,
            default_timeout,
            user_agent,
        } = self;

        let endpoint = endpoint
            .ok_or(ConjurError::MissingConfiguration { name: "endpoint" })?
            .resolve(service)?;
        let authenticator =
            authenticator.ok_or(ConjurError::MissingConfiguration { name: "authenticator" })?;
        let transport = match transport {
            Some(transport) => transport,
            None => {
                let user_agent = user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
                Arc::new(ReqwestTransport::with_user_agent(user_agent)?)
            }
        };

        Ok(AuthenticatedClient {
            inner: Arc::new(ClientInner {
                endpoint,
                service,
                authenticator,
                transport,
                default_timeout,
            }),
        })
    }

    /// Sets where the base URL comes from: a [`url::Url`], a string, or an
    /// [`Endpoints`](super::Endpoints) registry.
    pub fn with_endpoint(mut self, endpoint: impl Into<EndpointSource>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Selects the service, used to pick the URL out of a registry.
    pub fn with_service(mut self, service: Service) -> Self {
        self.service = service;
        self
    }

    /// Sets how requests are authenticated.
    pub fn with_authenticator(mut self, authenticator: Authenticator) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// Shorthand for [`Authenticator::token`].
    pub fn with_token(self, token: super::AuthToken) -> Self {
        self.with_authenticator(Authenticator::token(token))
    }

    /// Replaces the default reqwest transport.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Timeout applied to requests that do not set their own.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// `User-Agent` of the default transport; ignored with a custom transport.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}
