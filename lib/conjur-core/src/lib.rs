//! # Conjur Core
//!
//! Authenticated client for the Conjur directory and secrets services.
//!
//! - **[`DirectoryClient`]** creates and looks up users and variables, and
//!   reads or adds variable values;
//! - **[`ResourceClient`]** reads and writes raw secrets;
//! - both sit on an **[`AuthenticatedClient`]** that attaches the token to
//!   every request and maps HTTP failures to an [`ErrorKind`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use conjur_core::{AuthToken, DirectoryClient, Endpoints, ErrorKind};
//!
//! # async fn example() -> Result<(), conjur_core::ConjurError> {
//! let endpoints = Endpoints::from_env()?;
//! let directory = DirectoryClient::with_token(endpoints, AuthToken::new("token"))?;
//!
//! match directory.get_user("alice").await {
//!     Ok(user) => println!("found {}", user.login),
//!     Err(error) if error.kind() == ErrorKind::NotFound => println!("no alice"),
//!     Err(error) => return Err(error),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Authentication
//!
//! A client authenticates either with a token obtained elsewhere
//! ([`Authenticator::token`]) or with [`Credentials`] exchanged for tokens by
//! a [`TokenProvider`] ([`Authenticator::credentials`]). In the second mode the
//! token is fetched on the first call, shared by all clones of the client,
//! and replaced once when the server rejects it.
//!
//! ```rust
//! use std::sync::Arc;
//! use conjur_core::{
//!     AuthToken, BoxFuture, ConjurError, Credentials, Endpoints, ResourceClient, TokenProvider,
//! };
//!
//! #[derive(Debug)]
//! struct MyAuthn;
//!
//! impl TokenProvider for MyAuthn {
//!     fn login<'a>(
//!         &'a self,
//!         credentials: &'a Credentials,
//!     ) -> BoxFuture<'a, Result<AuthToken, ConjurError>> {
//!         Box::pin(async move { Ok(AuthToken::new(credentials.login())) })
//!     }
//! }
//!
//! # fn example() -> Result<(), ConjurError> {
//! let endpoints = Endpoints::from_appliance_url("https://conjur.example.com")?;
//! let secrets = ResourceClient::with_credentials(
//!     endpoints,
//!     Credentials::api_key("host/app", "3ahcddy39"),
//!     Arc::new(MyAuthn),
//! )?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Every operation returns [`ConjurError`]. [`ConjurError::kind`] gives the
//! [`ErrorKind`] to branch on; HTTP failures also keep the status and the
//! body text. Only [`ErrorKind::TransportError`] is worth retrying, see
//! [`client::retry_transport`].
//!
//! ## Features
//!
//! - `default-tls` (default): HTTPS support in the reqwest transport;
//! - `yaml`: `Endpoints::from_yaml`.

pub mod client;
pub mod codec;
pub mod directory;
pub mod secrets;

#[cfg(feature = "yaml")]
mod yaml;

pub use self::client::{
    AuthToken, AuthenticatedClient, AuthenticatedClientBuilder, Authenticator, BoxFuture,
    ConjurError, Credentials, EndpointSource, Endpoints, ErrorKind, Request, RequestBuilder,
    SecureString, Service, TokenProvider, Transport,
};
pub use self::codec::{ExistsExt, LookupExt};
pub use self::directory::{DirectoryClient, User, Variable};
pub use self::secrets::ResourceClient;
