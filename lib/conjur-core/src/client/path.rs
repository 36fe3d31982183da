use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters escaped in a path segment: everything but the unreserved set.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encodes a caller-supplied value so it stays a single path segment.
///
/// ```rust
/// use conjur_core::client::encode_segment;
///
/// assert_eq!(encode_segment("db/password"), "db%2Fpassword");
/// assert_eq!(encode_segment("prod-db_1.key"), "prod-db_1.key");
/// ```
pub fn encode_segment(value: &str) -> String {
    utf8_percent_encode(value, SEGMENT).to_string()
}

/// A resource path built segment by segment.
///
/// Server-issued identifiers are appended with [`ResourcePath::raw`], values
/// that may contain reserved characters with [`ResourcePath::encoded`].
///
/// ```rust
/// use conjur_core::client::ResourcePath;
///
/// let path = ResourcePath::new("variables").raw("abc").raw("value");
/// assert_eq!(path.as_str(), "/variables/abc/value");
///
/// let path = ResourcePath::new("secrets").encoded("db/password");
/// assert_eq!(path.as_str(), "/secrets/db%2Fpassword");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath(String);

impl ResourcePath {
    /// Starts a path with the collection name, e.g. `users`.
    pub fn new(collection: &str) -> Self {
        Self(format!("/{}", collection.trim_matches('/')))
    }

    /// Appends `segment` verbatim.
    #[must_use]
    pub fn raw(mut self, segment: &str) -> Self {
        self.0.push('/');
        self.0.push_str(segment);
        self
    }

    /// Appends `segment` percent-encoded.
    #[must_use]
    pub fn encoded(self, segment: &str) -> Self {
        let segment = encode_segment(segment);
        self.raw(&segment)
    }

    /// The path text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ResourcePath> for String {
    fn from(path: ResourcePath) -> Self {
        path.0
    }
}
