use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::request::PreparedRequest;
use super::token::{AuthToken, DEFAULT_TOKEN_TTL, Lease, TokenCache};
use super::ConjurError;

/// Boxed future returned by the collaborator traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors raised while turning a token into a request header.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display)]
pub enum AuthenticationError {
    /// The token cannot be carried by an HTTP header.
    #[display("Token cannot be sent: {message}")]
    InvalidToken {
        /// Description of the invalid characters or format issue.
        message: String,
    },
}

/// Secure wrapper for sensitive string data that automatically zeroes memory on drop.
///
/// Used for passwords and API keys.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecureString(String);

impl SecureString {
    /// Creates a new secure string from the provided value.
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Returns a reference to the inner string value.
    ///
    /// # Security Note
    /// The returned reference should not be stored for extended periods
    /// to minimize exposure time of sensitive data.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Masks sensitive data for display/logging purposes.
    fn mask_sensitive(value: &str) -> String {
        let count = value.chars().count();
        if count <= 8 {
            return "***".to_string();
        }
        let head = value.chars().take(4).collect::<String>();
        let tail = value.chars().skip(count - 4).collect::<String>();
        format!("{head}...{tail}")
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureString")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Self::mask_sensitive(&self.0))
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl Serialize for SecureString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecureString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// Long-lived credentials a [`TokenProvider`] exchanges for an [`AuthToken`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Credentials {
    /// A username and its password.
    Password {
        /// The login of the user or host.
        username: String,
        /// The password.
        password: SecureString,
    },
    /// A login and its API key.
    ApiKey {
        /// The login of the user or host.
        login: String,
        /// The API key.
        api_key: SecureString,
    },
}

impl Credentials {
    /// Username + password credentials.
    pub fn password(username: impl Into<String>, password: impl Into<SecureString>) -> Self {
        Self::Password {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Login + API key credentials.
    pub fn api_key(login: impl Into<String>, api_key: impl Into<SecureString>) -> Self {
        Self::ApiKey {
            login: login.into(),
            api_key: api_key.into(),
        }
    }

    /// Returns the login these credentials belong to.
    pub fn login(&self) -> &str {
        match self {
            Self::Password { username, .. } => username,
            Self::ApiKey { login, .. } => login,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            Self::ApiKey { login, .. } => f
                .debug_struct("ApiKey")
                .field("login", login)
                .field("api_key", &"[REDACTED]")
                .finish(),
        }
    }
}

/// The authentication exchange: turns credentials into a fresh token.
///
/// Implementations talk to the authentication service; this crate only
/// consumes them. A rejected login should fail with
/// [`ErrorKind::Unauthorized`](super::ErrorKind::Unauthorized), an unreachable
/// service with [`ErrorKind::TransportError`](super::ErrorKind::TransportError).
///
/// # Example
///
/// ```rust
/// use conjur_core::{AuthToken, BoxFuture, ConjurError, Credentials, TokenProvider};
///
/// #[derive(Debug)]
/// struct FixedProvider;
///
/// impl TokenProvider for FixedProvider {
///     fn login<'a>(
///         &'a self,
///         credentials: &'a Credentials,
///     ) -> BoxFuture<'a, Result<AuthToken, ConjurError>> {
///         Box::pin(async move { Ok(AuthToken::new(format!("token-for-{}", credentials.login()))) })
///     }
/// }
/// ```
pub trait TokenProvider: fmt::Debug + Send + Sync {
    /// Performs one login exchange.
    fn login<'a>(
        &'a self,
        credentials: &'a Credentials,
    ) -> BoxFuture<'a, Result<AuthToken, ConjurError>>;
}

/// Attaches proof of identity to outgoing requests.
///
/// - [`Authenticator::Static`] sends one externally obtained token verbatim and
///   never refreshes it: an `Unauthorized` response reaches the caller as is.
/// - [`Authenticator::Credentials`] logs in lazily, caches the token, and logs
///   in again once after the server rejects it.
#[derive(Clone)]
pub enum Authenticator {
    /// A token obtained out-of-band.
    Static(AuthToken),
    /// Credentials exchanged for tokens on demand.
    Credentials(CredentialsAuthenticator),
}

impl Authenticator {
    /// Static-token mode.
    pub fn token(token: AuthToken) -> Self {
        Self::Static(token)
    }

    /// Credential mode backed by `provider`.
    pub fn credentials(credentials: Credentials, provider: Arc<dyn TokenProvider>) -> Self {
        Self::Credentials(CredentialsAuthenticator::new(credentials, provider))
    }

    /// Returns `true` if a rejected token can be replaced by logging in again.
    pub fn refreshes(&self) -> bool {
        matches!(self, Self::Credentials(_))
    }

    /// Adds the `Authorization` header to `request`.
    ///
    /// In credential mode this may perform a login exchange.
    ///
    /// # Errors
    ///
    /// Fails if the login exchange fails or the token cannot be carried by a
    /// header.
    pub async fn authenticate(
        &self,
        request: PreparedRequest,
    ) -> Result<PreparedRequest, ConjurError> {
        self.attach(request).await.map(|(request, _)| request)
    }

    pub(in crate::client) async fn attach(
        &self,
        mut request: PreparedRequest,
    ) -> Result<(PreparedRequest, Option<Lease>), ConjurError> {
        let (value, lease) = match self {
            Self::Static(token) => (token.to_header_value()?, None),
            Self::Credentials(credentials) => {
                let lease = credentials.lease().await?;
                (lease.token.to_header_value()?, Some(lease))
            }
        };
        request.headers.insert(AUTHORIZATION, value);
        Ok((request, lease))
    }

    /// Forgets the token the server just rejected.
    pub(in crate::client) async fn reject(&self, lease: Option<Lease>) {
        if let (Self::Credentials(credentials), Some(lease)) = (self, lease)
            && credentials.cache.invalidate(lease.generation).await
        {
            debug!(login = %credentials.credentials.login(), "token rejected, dropped from cache");
        }
    }
}

impl From<AuthToken> for Authenticator {
    fn from(token: AuthToken) -> Self {
        Self::Static(token)
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(_) => f.debug_tuple("Static").field(&"[REDACTED]").finish(),
            Self::Credentials(credentials) => f.debug_tuple("Credentials").field(credentials).finish(),
        }
    }
}

/// Credential-mode state shared by all clones of a client.
#[derive(Clone)]
pub struct CredentialsAuthenticator {
    credentials: Arc<Credentials>,
    provider: Arc<dyn TokenProvider>,
    cache: Arc<TokenCache>,
}

impl CredentialsAuthenticator {
    /// Creates the authenticator; no login happens until the first request.
    pub fn new(credentials: Credentials, provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            credentials: Arc::new(credentials),
            provider,
            cache: Arc::default(),
        }
    }

    /// Returns the cached token, logging in first if there is none.
    async fn lease(&self) -> Result<Lease, ConjurError> {
        if let Some(lease) = self.cache.get().await {
            return Ok(lease);
        }

        let _login = self.cache.lock_login().await;
        // Another caller may have logged in while we were waiting
        if let Some(lease) = self.cache.get().await {
            return Ok(lease);
        }

        debug!(login = %self.credentials.login(), "logging in");
        let token = self
            .provider
            .login(&self.credentials)
            .await?
            .or_expiry(DEFAULT_TOKEN_TTL);
        // A token that cannot be sent is never cached
        token.to_header_value()?;
        Ok(self.cache.set(token).await)
    }
}

impl fmt::Debug for CredentialsAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsAuthenticator")
            .field("credentials", &self.credentials)
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}
