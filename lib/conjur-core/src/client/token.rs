//! Authentication tokens and the per-client token cache.

use std::fmt;
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::HeaderValue;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::auth::AuthenticationError;

/// Lifetime the directory grants to a freshly issued token.
///
/// Applied to tokens a [`TokenProvider`](super::TokenProvider) returns without
/// an expiry, so they are replaced before the server starts rejecting them.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(8 * 60);

/// An opaque, time-bounded credential issued by the authentication service.
///
/// The token text is sent verbatim (base64-encoded) in the `Authorization`
/// header. The memory holding it is cleared on drop, and `Debug` never shows
/// it.
///
/// ```rust
/// use std::time::Duration;
/// use conjur_core::AuthToken;
///
/// let token = AuthToken::with_expiry(r#"{"data":"alice"}"#, Duration::from_secs(480));
/// assert!(!token.is_expired());
/// assert!(!format!("{token:?}").contains("alice"));
/// ```
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AuthToken {
    raw: String,
    #[zeroize(skip)]
    expires_at: Option<Instant>,
}

impl AuthToken {
    /// Creates a token without a known expiry.
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            expires_at: None,
        }
    }

    /// Creates a token that expires after `expires_in`.
    pub fn with_expiry(raw: impl Into<String>, expires_in: Duration) -> Self {
        Self {
            raw: raw.into(),
            expires_at: Some(Instant::now() + expires_in),
        }
    }

    /// Returns the token text as issued.
    ///
    /// # Security Note
    /// The returned reference should not be stored or logged.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Checks if the token is known to be expired.
    ///
    /// Returns `false` if the token has no expiration time.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() >= exp)
    }

    /// Returns the time until expiration, if known.
    pub fn time_until_expiry(&self) -> Option<Duration> {
        self.expires_at
            .and_then(|exp| exp.checked_duration_since(Instant::now()))
    }

    /// Sets the expiry to `ttl` from now, unless one is already known.
    #[must_use]
    pub fn or_expiry(mut self, ttl: Duration) -> Self {
        if self.expires_at.is_none() {
            self.expires_at = Some(Instant::now() + ttl);
        }
        self
    }

    /// Renders the `Authorization` header value: `Token token="<base64>"`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError::InvalidToken`] if the token is blank.
    pub fn to_header_value(&self) -> Result<HeaderValue, AuthenticationError> {
        if self.raw.trim().is_empty() {
            return Err(AuthenticationError::InvalidToken {
                message: "token is blank".to_string(),
            });
        }
        let encoded = STANDARD.encode(self.raw.as_bytes());
        let mut value = HeaderValue::from_str(&format!("Token token=\"{encoded}\"")).map_err(
            |err| AuthenticationError::InvalidToken {
                message: err.to_string(),
            },
        )?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("raw", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// A token handed out by the cache, tagged with the cache generation it came
/// from.
#[derive(Debug, Clone)]
pub(in crate::client) struct Lease {
    pub(in crate::client) token: AuthToken,
    pub(in crate::client) generation: u64,
}

#[derive(Debug, Default)]
struct Slot {
    token: Option<AuthToken>,
    generation: u64,
}

/// Per-client token cache.
///
/// Reads go through an [`RwLock`]; logins are serialized by a separate
/// [`Mutex`] so at most one login exchange is in flight per client.
#[derive(Debug, Default)]
pub(in crate::client) struct TokenCache {
    slot: RwLock<Slot>,
    login: Mutex<()>,
}

impl TokenCache {
    /// Returns the cached token if it exists and is not expired.
    pub(in crate::client) async fn get(&self) -> Option<Lease> {
        let guard = self.slot.read().await;
        guard
            .token
            .as_ref()
            .filter(|token| !token.is_expired())
            .map(|token| Lease {
                token: token.clone(),
                generation: guard.generation,
            })
    }

    /// Stores a fresh token and returns its lease.
    pub(in crate::client) async fn set(&self, token: AuthToken) -> Lease {
        let mut guard = self.slot.write().await;
        guard.generation += 1;
        guard.token = Some(token.clone());
        Lease {
            token,
            generation: guard.generation,
        }
    }

    /// Drops the cached token, unless it was replaced since `generation`.
    ///
    /// Returns `true` if a token was dropped.
    pub(in crate::client) async fn invalidate(&self, generation: u64) -> bool {
        let mut guard = self.slot.write().await;
        if guard.generation != generation || guard.token.is_none() {
            return false;
        }
        guard.token = None;
        true
    }

    /// Waits for the login slot.
    pub(in crate::client) async fn lock_login(&self) -> MutexGuard<'_, ()> {
        self.login.lock().await
    }
}
