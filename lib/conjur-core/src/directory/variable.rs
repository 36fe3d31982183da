use serde::{Deserialize, Serialize};

/// Mime type given to variables created without one.
pub const DEFAULT_MIME_TYPE: &str = "text/plain";

/// An encrypted, versioned directory variable.
///
/// The record only describes the variable; values are read and added with
/// [`DirectoryClient::get_variable_value`](super::DirectoryClient::get_variable_value)
/// and [`DirectoryClient::add_variable_value`](super::DirectoryClient::add_variable_value).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// Identifier, generated by the server unless given at creation.
    pub id: String,
    /// Fully qualified id of the creator.
    #[serde(default)]
    pub userid: Option<String>,
    /// Mime type of the values.
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
    /// Free-form kind, e.g. `"database password"`.
    #[serde(default)]
    pub kind: Option<String>,
    /// Role owning the variable.
    #[serde(default)]
    pub ownerid: Option<String>,
    /// Resource id of the variable.
    #[serde(default)]
    pub resource_identifier: Option<String>,
    /// Number of values added so far.
    #[serde(default)]
    pub version_count: u32,
}

fn default_mime_type() -> String {
    DEFAULT_MIME_TYPE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_json;

    #[test]
    fn should_decode_variable() {
        let variable: Variable = decode_json(
            "variable",
            r#"{
                "id": "dev/db/password",
                "userid": "admin",
                "mime_type": "text/plain",
                "kind": "database password",
                "ownerid": "demo:user:admin",
                "resource_identifier": "demo:variable:dev/db/password",
                "version_count": 3
            }"#,
        )
        .expect("valid variable");

        insta::assert_debug_snapshot!(variable, @r#"
        Variable {
            id: "dev/db/password",
            userid: Some(
                "admin",
            ),
            mime_type: "text/plain",
            kind: Some(
                "database password",
            ),
            ownerid: Some(
                "demo:user:admin",
            ),
            resource_identifier: Some(
                "demo:variable:dev/db/password",
            ),
            version_count: 3,
        }
        "#);
    }

    #[test]
    fn should_default_missing_fields() {
        let variable: Variable =
            decode_json("variable", r#"{"id":"abc"}"#).expect("valid variable");

        assert_eq!(variable.mime_type, DEFAULT_MIME_TYPE);
        assert_eq!(variable.version_count, 0);
        assert!(variable.kind.is_none());
    }

    #[test]
    fn should_report_wrong_version_count() {
        let error = decode_json::<Variable>("variable", r#"{"id":"abc","version_count":"many"}"#)
            .expect_err("invalid count");

        assert_eq!(error.kind(), crate::client::ErrorKind::DecodeError);
        assert!(
            error
                .to_string()
                .starts_with(r#"Failed to decode variable at 'version_count': invalid type: string "many""#)
        );
    }
}
