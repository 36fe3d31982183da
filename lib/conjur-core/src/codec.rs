//! Response decoding and the lookup policies shared by the service clients.

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::client::{ConjurError, ErrorKind};

/// Decodes a JSON response body into `T`.
///
/// `target` names the record in the error, e.g. `"user"`.
///
/// # Errors
///
/// Returns [`ConjurError::Decode`] with the JSON path of the first mismatch.
pub fn decode_json<T>(target: &'static str, body: &str) -> Result<T, ConjurError>
where
    T: DeserializeOwned,
{
    let deserializer = &mut serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(deserializer).map_err(|error| {
        warn!(record = target, path = %error.path(), "cannot decode response");
        ConjurError::Decode {
            target,
            error,
            body: body.to_string(),
        }
    })
}

/// Lookup policies applied on top of a get-by-id result.
///
/// ```rust
/// use conjur_core::{ConjurError, ExistsExt, LookupExt};
///
/// # fn example() -> Result<(), ConjurError> {
/// let missing: Result<String, ConjurError> = Err(ConjurError::from_status(404, ""));
/// assert_eq!(missing.absent_if_not_found()?, None);
///
/// let hidden: Result<String, ConjurError> = Err(ConjurError::from_status(403, ""));
/// assert!(hidden.absent_if_not_found().exists_unless_forbidden()?);
/// # Ok(())
/// # }
/// ```
pub trait LookupExt<T> {
    /// `Ok(None)` when the lookup failed with `NotFound`; any other error is
    /// kept.
    ///
    /// # Errors
    ///
    /// Every failure but `NotFound`.
    fn absent_if_not_found(self) -> Result<Option<T>, ConjurError>;
}

impl<T> LookupExt<T> for Result<T, ConjurError> {
    fn absent_if_not_found(self) -> Result<Option<T>, ConjurError> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error),
        }
    }
}

/// Existence check on top of an optional lookup.
pub trait ExistsExt {
    /// `Ok(true)` if present, `Ok(false)` if absent.
    ///
    /// A `Forbidden` failure also answers `true`: the caller may not read the
    /// resource, but it is there.
    ///
    /// # Errors
    ///
    /// Every failure but `Forbidden`.
    fn exists_unless_forbidden(self) -> Result<bool, ConjurError>;
}

impl<T> ExistsExt for Result<Option<T>, ConjurError> {
    fn exists_unless_forbidden(self) -> Result<bool, ConjurError> {
        match self {
            Ok(value) => Ok(value.is_some()),
            Err(error) if error.kind() == ErrorKind::Forbidden => Ok(true),
            Err(error) => Err(error),
        }
    }
}
