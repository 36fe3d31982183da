//! Raw secret values on the secrets service.

use std::sync::Arc;

use http::Method;

use crate::client::{
    AuthToken, AuthenticatedClient, Authenticator, ConjurError, Credentials, EndpointSource,
    ResourcePath, Service, TokenProvider, ensure_not_blank,
};

const SECRETS: &str = "secrets";

/// Client of the secrets service.
///
/// Variable ids are sent as they are when reading, and percent-encoded when
/// writing: the server accepts `GET /secrets/dev/db` but needs
/// `POST /secrets/dev%2Fdb`.
///
/// ```rust,no_run
/// use conjur_core::{AuthToken, Endpoints, ResourceClient};
///
/// # async fn example() -> Result<(), conjur_core::ConjurError> {
/// let endpoints = Endpoints::from_appliance_url("https://conjur.example.com")?;
/// let secrets = ResourceClient::with_token(endpoints, AuthToken::new("token"))?;
///
/// secrets.add_secret("dev/db/password", "s3cr3t").await?;
/// let value = secrets.retrieve_secret("dev/db/password").await?;
/// assert_eq!(value, "s3cr3t");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ResourceClient {
    client: AuthenticatedClient,
}

impl ResourceClient {
    /// Wraps a client already bound to the secrets endpoint.
    pub fn new(client: AuthenticatedClient) -> Self {
        Self { client }
    }

    /// Client authenticated with a token obtained elsewhere.
    ///
    /// # Errors
    ///
    /// Fails if the endpoint is invalid or the HTTP transport cannot be created.
    pub fn with_token(
        endpoint: impl Into<EndpointSource>,
        token: AuthToken,
    ) -> Result<Self, ConjurError> {
        Self::with_authenticator(endpoint, Authenticator::token(token))
    }

    /// Client logging in with `credentials` through `provider` when needed.
    ///
    /// # Errors
    ///
    /// Fails if the endpoint is invalid or the HTTP transport cannot be created.
    pub fn with_credentials(
        endpoint: impl Into<EndpointSource>,
        credentials: Credentials,
        provider: Arc<dyn TokenProvider>,
    ) -> Result<Self, ConjurError> {
        Self::with_authenticator(endpoint, Authenticator::credentials(credentials, provider))
    }

    fn with_authenticator(
        endpoint: impl Into<EndpointSource>,
        authenticator: Authenticator,
    ) -> Result<Self, ConjurError> {
        let client = AuthenticatedClient::builder()
            .with_endpoint(endpoint)
            .with_service(Service::Secrets)
            .with_authenticator(authenticator)
            .build()?;
        Ok(Self { client })
    }

    /// The underlying client.
    pub fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    /// Reads the current value of `variable_id`.
    ///
    /// # Errors
    ///
    /// `NotFound` if the variable does not exist or has no value,
    /// `Forbidden` without the execute privilege.
    pub async fn retrieve_secret(&self, variable_id: &str) -> Result<String, ConjurError> {
        ensure_not_blank("variable_id", variable_id)?;
        let path = ResourcePath::new(SECRETS).raw(variable_id);
        self.client.execute(self.client.request(Method::GET, path)).await
    }

    /// Stores `secret` as the new value of `variable_id`.
    ///
    /// # Errors
    ///
    /// `NotFound` if the variable does not exist, `Forbidden` without the
    /// update privilege.
    pub async fn add_secret(&self, variable_id: &str, secret: &str) -> Result<(), ConjurError> {
        ensure_not_blank("variable_id", variable_id)?;
        let path = ResourcePath::new(SECRETS).encoded(variable_id);
        let request = self
            .client
            .request_builder(Method::POST, path)
            .text_body(secret)
            .build();
        self.client.execute(request).await?;
        Ok(())
    }
}

impl From<AuthenticatedClient> for ResourceClient {
    fn from(client: AuthenticatedClient) -> Self {
        Self::new(client)
    }
}
