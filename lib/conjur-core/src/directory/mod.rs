//! Users and variables of the directory service.

use std::sync::Arc;

use http::Method;

use crate::client::{
    AuthToken, AuthenticatedClient, Authenticator, ConjurError, Credentials, EndpointSource,
    ResourcePath, Service, TokenProvider, ensure_not_blank,
};
use crate::codec::{ExistsExt, LookupExt, decode_json};

mod user;
pub use self::user::User;

mod variable;
pub use self::variable::{DEFAULT_MIME_TYPE, Variable};

const USERS: &str = "users";
const VARIABLES: &str = "variables";

/// Client of the directory service.
///
/// Identifiers returned by the server are put in paths as they are; the
/// caller must not pre-encode them.
///
/// # Example
///
/// ```rust,no_run
/// use conjur_core::{AuthToken, DirectoryClient};
///
/// # async fn example() -> Result<(), conjur_core::ConjurError> {
/// let directory = DirectoryClient::with_token(
///     "https://conjur.example.com/api",
///     AuthToken::new("token"),
/// )?;
///
/// if !directory.user_exists("alice").await? {
///     let alice = directory.create_user("alice").await?;
///     println!("created {}", alice.login);
/// }
///
/// let variable = directory.create_variable("database password").await?;
/// directory.add_variable_value(&variable.id, "s3cr3t").await?;
/// let value = directory.get_variable_value(&variable.id).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    client: AuthenticatedClient,
}

impl DirectoryClient {
    /// Wraps a client already bound to the directory endpoint.
    pub fn new(client: AuthenticatedClient) -> Self {
        Self { client }
    }

    /// Client authenticated with a token obtained elsewhere.
    ///
    /// A [`Endpoints`](crate::Endpoints) registry resolves to its directory URL.
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
            .with_service(Service::Directory)
            .with_authenticator(authenticator)
            .build()?;
        Ok(Self { client })
    }

    /// The underlying client.
    pub fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    // Users

    /// Creates a user that authenticates with an API key only.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a blank login, `Conflict` if the login is taken,
    /// `Forbidden` without the privilege to create users.
    pub async fn create_user(&self, login: &str) -> Result<User, ConjurError> {
        self.create_user_with(login, None).await
    }

    /// Creates a user with a password.
    ///
    /// # Errors
    ///
    /// As [`DirectoryClient::create_user`], and `InvalidArgument` for a blank
    /// password.
    pub async fn create_user_with_password(
        &self,
        login: &str,
        password: &str,
    ) -> Result<User, ConjurError> {
        self.create_user_with(login, Some(password)).await
    }

    async fn create_user_with(
        &self,
        login: &str,
        password: Option<&str>,
    ) -> Result<User, ConjurError> {
        ensure_not_blank("login", login)?;
        if let Some(password) = password {
            ensure_not_blank("password", password)?;
        }

        let request = self
            .client
            .request_builder(Method::POST, ResourcePath::new(USERS))
            .add_param("login", login)
            .add_optional_param("password", password)
            .build();
        let body = self.client.execute(request).await?;
        decode_json("user", &body)
    }

    /// Fetches the user called `login`.
    ///
    /// # Errors
    ///
    /// `NotFound` if there is no such user, `Forbidden` if it cannot be read.
    pub async fn get_user(&self, login: &str) -> Result<User, ConjurError> {
        ensure_not_blank("login", login)?;
        let path = ResourcePath::new(USERS).raw(login);
        let body = self.client.execute(self.client.request(Method::GET, path)).await?;
        decode_json("user", &body)
    }

    /// Like [`DirectoryClient::get_user`], with `None` for a missing user.
    ///
    /// # Errors
    ///
    /// Every failure but `NotFound`.
    pub async fn try_get_user(&self, login: &str) -> Result<Option<User>, ConjurError> {
        self.get_user(login).await.absent_if_not_found()
    }

    /// Whether a user called `login` exists.
    ///
    /// A user that cannot be read counts as existing, since creating it would
    /// fail as well.
    ///
    /// # Errors
    ///
    /// Every failure but `NotFound` and `Forbidden`.
    pub async fn user_exists(&self, login: &str) -> Result<bool, ConjurError> {
        self.try_get_user(login).await.exists_unless_forbidden()
    }

    // Variables

    /// Creates a `text/plain` variable with a generated id.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a blank kind, `Forbidden` without the privilege
    /// to create variables.
    pub async fn create_variable(&self, kind: &str) -> Result<Variable, ConjurError> {
        self.create_variable_with(kind, None, None).await
    }

    /// Creates a variable with a generated id.
    ///
    /// # Errors
    ///
    /// As [`DirectoryClient::create_variable`].
    pub async fn create_variable_with_mime(
        &self,
        kind: &str,
        mime_type: &str,
    ) -> Result<Variable, ConjurError> {
        self.create_variable_with(kind, Some(mime_type), None).await
    }

    /// Creates a variable.
    ///
    /// `mime_type` defaults to [`DEFAULT_MIME_TYPE`]; without `id` the server
    /// generates one.
    ///
    /// # Errors
    ///
    /// As [`DirectoryClient::create_variable`], and `Conflict` if `id` is
    /// taken.
    pub async fn create_variable_with(
        &self,
        kind: &str,
        mime_type: Option<&str>,
        id: Option<&str>,
    ) -> Result<Variable, ConjurError> {
        ensure_not_blank("kind", kind)?;

        let request = self
            .client
            .request_builder(Method::POST, ResourcePath::new(VARIABLES))
            .add_param("mime_type", mime_type.unwrap_or(DEFAULT_MIME_TYPE))
            .add_param("kind", kind)
            .add_optional_param("id", id)
            .build();
        let body = self.client.execute(request).await?;
        decode_json("variable", &body)
    }

    /// Fetches the variable `id`.
    ///
    /// # Errors
    ///
    /// `NotFound` if there is no such variable, `Forbidden` if it cannot be
    /// read.
    pub async fn get_variable(&self, id: &str) -> Result<Variable, ConjurError> {
        ensure_not_blank("id", id)?;
        let path = variable_path(id);
        let body = self.client.execute(self.client.request(Method::GET, path)).await?;
        decode_json("variable", &body)
    }

    /// Like [`DirectoryClient::get_variable`], with `None` for a missing
    /// variable.
    ///
    /// # Errors
    ///
    /// Every failure but `NotFound`.
    pub async fn try_get_variable(&self, id: &str) -> Result<Option<Variable>, ConjurError> {
        self.get_variable(id).await.absent_if_not_found()
    }

    /// Whether the variable `id` exists; a variable that cannot be read counts
    /// as existing.
    ///
    /// # Errors
    ///
    /// Every failure but `NotFound` and `Forbidden`.
    pub async fn variable_exists(&self, id: &str) -> Result<bool, ConjurError> {
        self.try_get_variable(id).await.exists_unless_forbidden()
    }

    /// Adds a new version to the variable `id`.
    ///
    /// # Errors
    ///
    /// `NotFound` if there is no such variable, `Forbidden` without the update
    /// privilege.
    pub async fn add_variable_value(&self, id: &str, value: &str) -> Result<(), ConjurError> {
        ensure_not_blank("id", id)?;
        let request = self
            .client
            .request_builder(Method::POST, variable_path(id).raw("values"))
            .add_param("value", value)
            .build();
        self.client.execute(request).await?;
        Ok(())
    }

    /// Reads the latest value of the variable `id`.
    ///
    /// # Errors
    ///
    /// `NotFound` if the variable does not exist or has no value yet.
    pub async fn get_variable_value(&self, id: &str) -> Result<String, ConjurError> {
        self.read_value(id, None).await
    }

    /// Reads one version of the variable `id`, starting at 1.
    ///
    /// # Errors
    ///
    /// `NotFound` if the variable or the version does not exist.
    pub async fn get_variable_value_version(
        &self,
        id: &str,
        version: u32,
    ) -> Result<String, ConjurError> {
        self.read_value(id, Some(version)).await
    }

    async fn read_value(&self, id: &str, version: Option<u32>) -> Result<String, ConjurError> {
        ensure_not_blank("id", id)?;
        let request = self
            .client
            .request_builder(Method::GET, variable_path(id).raw("value"))
            .add_optional_param("version", version.map(|version| version.to_string()))
            .build();
        self.client.execute(request).await
    }
}

impl From<AuthenticatedClient> for DirectoryClient {
    fn from(client: AuthenticatedClient) -> Self {
        Self::new(client)
    }
}

fn variable_path(id: &str) -> ResourcePath {
    ResourcePath::new(VARIABLES).raw(id)
}
