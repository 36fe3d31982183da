use std::env;

use serde::{Deserialize, Serialize};
use url::Url;

use super::ConjurError;

/// Environment variable holding the appliance base URL.
pub const APPLIANCE_URL_VAR: &str = "CONJUR_APPLIANCE_URL";
/// Environment variable overriding the authentication service URL.
pub const AUTHN_URL_VAR: &str = "CONJUR_AUTHN_URL";
/// Environment variable overriding the directory service URL.
pub const CORE_URL_VAR: &str = "CONJUR_CORE_URL";
/// Environment variable overriding the secrets service URL.
pub const SECRETS_URL_VAR: &str = "CONJUR_SECRETS_URL";

/// The logical services a client can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    /// Token issuing service.
    #[display("authn")]
    Authn,
    /// Users and variables.
    #[display("directory")]
    Directory,
    /// Raw secret values.
    #[display("secrets")]
    Secrets,
}

/// Base URLs of the three services.
///
/// ```rust
/// use conjur_core::{Endpoints, Service};
///
/// # fn example() -> Result<(), conjur_core::ConjurError> {
/// let endpoints = Endpoints::from_appliance_url("https://conjur.example.com")?;
/// assert_eq!(endpoints.get(Service::Directory).as_str(), "https://conjur.example.com/api");
/// assert_eq!(endpoints.get(Service::Authn).as_str(), "https://conjur.example.com/authn");
/// assert_eq!(endpoints.get(Service::Secrets).as_str(), "https://conjur.example.com/");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    /// Authentication service.
    pub authn: Url,
    /// Directory service.
    pub directory: Url,
    /// Secrets service.
    pub secrets: Url,
}

impl Endpoints {
    /// Creates a registry from explicit URLs.
    ///
    /// # Errors
    ///
    /// Fails if one of the URLs is not an absolute `http`/`https` URL.
    pub fn new(authn: Url, directory: Url, secrets: Url) -> Result<Self, ConjurError> {
        let endpoints = Self {
            authn,
            directory,
            secrets,
        };
        endpoints.validate()?;
        Ok(endpoints)
    }

    /// Derives all services from one appliance URL: `{url}/authn`, `{url}/api`
    /// and `{url}` for secrets.
    ///
    /// # Errors
    ///
    /// Fails if `appliance_url` is not an absolute `http`/`https` URL.
    pub fn from_appliance_url(appliance_url: &str) -> Result<Self, ConjurError> {
        let base = parse_endpoint(appliance_url)?;
        let root = base.as_str().trim_end_matches('/');
        Ok(Self {
            authn: parse_endpoint(&format!("{root}/authn"))?,
            directory: parse_endpoint(&format!("{root}/api"))?,
            secrets: base,
        })
    }

    /// Reads the endpoints from the environment.
    ///
    /// `CONJUR_APPLIANCE_URL` provides defaults for every service;
    /// `CONJUR_AUTHN_URL`, `CONJUR_CORE_URL` and `CONJUR_SECRETS_URL` override
    /// them one by one. Without an appliance URL all three overrides are
    /// required.
    ///
    /// # Errors
    ///
    /// Fails if a variable is missing or holds an invalid URL.
    pub fn from_env() -> Result<Self, ConjurError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConjurError> {
        let defaults = lookup(APPLIANCE_URL_VAR)
            .filter(|url| !url.trim().is_empty())
            .map(|url| Self::from_appliance_url(&url))
            .transpose()?;

        let pick = |name: &'static str, default: Option<&Url>| -> Result<Url, ConjurError> {
            match (lookup(name).filter(|url| !url.trim().is_empty()), default) {
                (Some(url), _) => parse_endpoint(&url),
                (None, Some(url)) => Ok(url.clone()),
                (None, None) => Err(ConjurError::InvalidEndpoint {
                    endpoint: name.to_string(),
                    message: format!("neither {name} nor {APPLIANCE_URL_VAR} is set"),
                }),
            }
        };

        Ok(Self {
            authn: pick(AUTHN_URL_VAR, defaults.as_ref().map(|it| &it.authn))?,
            directory: pick(CORE_URL_VAR, defaults.as_ref().map(|it| &it.directory))?,
            secrets: pick(SECRETS_URL_VAR, defaults.as_ref().map(|it| &it.secrets))?,
        })
    }

    /// Returns the base URL of `service`.
    pub fn get(&self, service: Service) -> &Url {
        match service {
            Service::Authn => &self.authn,
            Service::Directory => &self.directory,
            Service::Secrets => &self.secrets,
        }
    }

    /// Checks that every URL is usable, e.g. after deserialization.
    ///
    /// # Errors
    ///
    /// Fails on the first URL that is not an absolute `http`/`https` URL.
    pub fn validate(&self) -> Result<(), ConjurError> {
        for url in [&self.authn, &self.directory, &self.secrets] {
            check_endpoint(url)?;
        }
        Ok(())
    }
}

/// Where a client finds its base URL.
///
/// The source is resolved once, when the client is built; a registry is
/// resolved with the [`Service`] the client is built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointSource {
    /// An explicit URL.
    Url(Url),
    /// A URL still to be parsed.
    Str(String),
    /// A registry, indexed by service.
    Registry(Endpoints),
}

impl EndpointSource {
    /// Resolves the base URL for `service`.
    ///
    /// # Errors
    ///
    /// Fails if the URL is empty, relative, or not `http`/`https`.
    pub fn resolve(&self, service: Service) -> Result<Url, ConjurError> {
        match self {
            Self::Url(url) => {
                check_endpoint(url)?;
                Ok(url.clone())
            }
            Self::Str(value) => parse_endpoint(value),
            Self::Registry(endpoints) => {
                let url = endpoints.get(service);
                check_endpoint(url)?;
                Ok(url.clone())
            }
        }
    }
}

impl From<Url> for EndpointSource {
    fn from(url: Url) -> Self {
        Self::Url(url)
    }
}

impl From<&str> for EndpointSource {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for EndpointSource {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Endpoints> for EndpointSource {
    fn from(endpoints: Endpoints) -> Self {
        Self::Registry(endpoints)
    }
}

fn parse_endpoint(value: &str) -> Result<Url, ConjurError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConjurError::InvalidEndpoint {
            endpoint: value.to_string(),
            message: "endpoint is empty".to_string(),
        });
    }
    let url = Url::parse(trimmed).map_err(|err| ConjurError::InvalidEndpoint {
        endpoint: value.to_string(),
        message: err.to_string(),
    })?;
    check_endpoint(&url)?;
    Ok(url)
}

fn check_endpoint(url: &Url) -> Result<(), ConjurError> {
    let message = if !matches!(url.scheme(), "http" | "https") {
        format!("unsupported scheme '{}'", url.scheme())
    } else if !url.has_host() {
        "missing host".to_string()
    } else {
        return Ok(());
    };
    Err(ConjurError::InvalidEndpoint {
        endpoint: url.to_string(),
        message,
    })
}
