use reqwest::RequestBuilder;
use std::fmt;

/// Opaque credentials attached to every forum request
///
/// The mirror never interprets these values. The hosting environment supplies
/// them and they are handed to each sync entry point explicitly.
#[derive(Clone, Default)]
pub struct Credentials {
    authorization: Option<String>,
    cookie: Option<String>,
}

impl Credentials {
    pub fn new(authorization: Option<String>, cookie: Option<String>) -> Self {
        Self {
            authorization: authorization.filter(|v| !v.is_empty()),
            cookie: cookie.filter(|v| !v.is_empty()),
        }
    }

    /// Credentials that add no headers
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_anonymous(&self) -> bool {
        self.authorization.is_none() && self.cookie.is_none()
    }

    pub(crate) fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match &self.authorization {
            Some(value) => request.header("authorization", value),
            None => request,
        };
        match &self.cookie {
            Some(value) => request.header("cookie", value),
            None => request,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("authorization", &redact(&self.authorization))
            .field("cookie", &redact(&self.cookie))
            .finish()
    }
}
