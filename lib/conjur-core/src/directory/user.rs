use serde::{Deserialize, Serialize};

use crate::client::SecureString;

/// A directory user.
///
/// `api_key` is only returned when the user is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The login, unique in the directory.
    pub login: String,
    /// Fully qualified id of the user.
    #[serde(default)]
    pub userid: Option<String>,
    /// Role owning the user.
    #[serde(default)]
    pub ownerid: Option<String>,
    /// POSIX uid.
    #[serde(default)]
    pub uidnumber: Option<u32>,
    /// Role id of the user.
    #[serde(default)]
    pub roleid: Option<String>,
    /// Resource id of the user.
    #[serde(default)]
    pub resource_identifier: Option<String>,
    /// API key, for a user just created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecureString>,
}
