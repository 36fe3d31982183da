use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use headers::{ContentType, HeaderMapExt};
use http::{HeaderMap, Method};
use url::Url;

use super::ConjurError;

/// Builds a [`Request`] for a resource path relative to an endpoint.
///
/// Parameters keep their insertion order; optional parameters that are
/// `None` are left out entirely rather than sent empty.
///
/// # Example
///
/// ```rust
/// use conjur_core::RequestBuilder;
/// use http::Method;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let endpoint = "https://conjur.example.com/api".parse()?;
/// let request = RequestBuilder::new(&endpoint, Method::POST, "/variables")
///     .add_param("mime_type", "text/plain")
///     .add_param("kind", "password")
///     .add_optional_param("id", None::<String>)
///     .build();
///
/// assert_eq!(request.params().len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RequestBuilder {
    base: Url,
    method: Method,
    path: String,
    params: Vec<(String, String)>,
    body: Option<String>,
    timeout: Option<Duration>,
}

impl RequestBuilder {
    /// Starts a request for `path`, resolved against `base` when sent.
    pub fn new(base: &Url, method: Method, path: impl Into<String>) -> Self {
        Self {
            base: base.clone(),
            method,
            path: path.into(),
            params: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    /// Appends a parameter.
    pub fn add_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Appends a parameter only if `value` is present.
    pub fn add_optional_param<V>(self, name: impl Into<String>, value: Option<V>) -> Self
    where
        V: Into<String>,
    {
        match value {
            Some(value) => self.add_param(name, value),
            None => self,
        }
    }

    /// Sends `body` as `text/plain`.
    ///
    /// Parameters of a request with a text body go to the query string.
    pub fn text_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Fails the request with a transport error if no response arrives in time.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Finishes the request description.
    pub fn build(self) -> Request {
        let Self {
            base,
            method,
            path,
            params,
            body,
            timeout,
        } = self;
        Request {
            base,
            method,
            path,
            params,
            body,
            timeout,
        }
    }
}

impl fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("params", &ParamNames(&self.params))
            .finish_non_exhaustive()
    }
}

/// A transport-independent request description.
///
/// Built once per call with [`RequestBuilder`]; authentication is applied
/// when it is executed.
#[derive(Clone)]
pub struct Request {
    base: Url,
    method: Method,
    path: String,
    params: Vec<(String, String)>,
    body: Option<String>,
    timeout: Option<Duration>,
}

impl Request {
    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The resource path, relative to the endpoint.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The parameters, in insertion order.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Returns the value of the first parameter called `name`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The raw text body, if any.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// The timeout set on this request, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Whether the parameters are sent in the query string rather than as a
    /// form body.
    pub fn params_in_query(&self) -> bool {
        self.body.is_some() || matches!(self.method, Method::GET | Method::HEAD | Method::DELETE)
    }

    /// Resolves the path against the endpoint, without parameters.
    ///
    /// # Errors
    ///
    /// Fails if the path carries a query or fragment delimiter (`?`, `#`),
    /// or if the joined URL cannot be parsed.
    pub fn url(&self) -> Result<Url, ConjurError> {
        if self.path.contains(['?', '#']) {
            return Err(ConjurError::invalid_argument(
                "path",
                format!("'{}' must not contain '?' or '#'", self.path),
            ));
        }
        let url = format!(
            "{}/{}",
            self.base.as_str().trim_end_matches('/'),
            self.path.trim_start_matches('/')
        );
        Ok(url.parse::<Url>()?)
    }

    /// Renders the request for a [`Transport`](super::Transport): absolute URL,
    /// query string or form body, and content type.
    ///
    /// # Errors
    ///
    /// Fails if the URL cannot be built or the parameters cannot be encoded.
    pub fn prepare(&self) -> Result<PreparedRequest, ConjurError> {
        let mut url = self.url()?;
        let mut headers = HeaderMap::new();

        let body = if let Some(text) = &self.body {
            headers.typed_insert(ContentType::text_utf8());
            Some(Bytes::from(text.clone()))
        } else if self.params_in_query() || self.params.is_empty() {
            None
        } else {
            headers.typed_insert(ContentType::form_url_encoded());
            Some(Bytes::from(serde_urlencoded::to_string(&self.params)?))
        };

        if self.params_in_query() && !self.params.is_empty() {
            let query = serde_urlencoded::to_string(&self.params)?;
            url.set_query(Some(&query));
        }

        Ok(PreparedRequest {
            method: self.method.clone(),
            url,
            headers,
            body,
            timeout: self.timeout,
        })
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("base", &self.base.as_str())
            .field("path", &self.path)
            .field("params", &ParamNames(&self.params))
            .field("body", &self.body.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Parameter values may hold passwords or secrets, only names are shown.
struct ParamNames<'a>(&'a [(String, String)]);

impl fmt::Debug for ParamNames<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter().map(|(name, _)| name)).finish()
    }
}

/// A request ready for the wire.
#[derive(Clone, derive_more::Debug)]
pub struct PreparedRequest {
    pub(in crate::client) method: Method,
    pub(in crate::client) url: Url,
    pub(in crate::client) headers: HeaderMap,
    #[debug(ignore)]
    pub(in crate::client) body: Option<Bytes>,
    pub(in crate::client) timeout: Option<Duration>,
}

impl PreparedRequest {
    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The absolute URL, including the query string.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The headers, including `Authorization` once authenticated.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The body bytes, if any.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// The timeout requested for this call, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Overrides the timeout.
    pub(in crate::client) fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}
