//! YAML endpoint files, using serde-saphyr.
//!
//! Only available with the `yaml` feature.
//!
//! ```yaml
//! authn: https://conjur.example.com/authn
//! directory: https://conjur.example.com/api
//! secrets: https://conjur.example.com
//! ```

use crate::client::{ConjurError, Endpoints};

impl Endpoints {
    /// Reads endpoints from a YAML document.
    ///
    /// # Errors
    ///
    /// Fails if the document is not valid YAML, misses a service, or holds a
    /// URL that is not absolute `http`/`https`.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConjurError> {
        let endpoints: Self =
            serde_saphyr::from_str(yaml).map_err(|err| ConjurError::InvalidEndpoint {
                endpoint: "<yaml>".to_string(),
                message: err.to_string(),
            })?;
        endpoints.validate()?;
        Ok(endpoints)
    }
}
