//! The fixed set of HTTP methods routes can be bound to.

use axum::http::Method;
use std::fmt;

/// HTTP methods accepted by [`Mapper::bind`](crate::routing::Mapper::bind).
///
/// `LINK` and `UNLINK` are extension methods; they are matched by name
/// since `http::Method` has no constants for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
    Link,
    Unlink,
}

impl HttpMethod {
    /// Every supported method, in declaration order.
    pub const ALL: [HttpMethod; 9] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Link,
        HttpMethod::Unlink,
    ];

    /// Upper-case wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Link => "LINK",
            HttpMethod::Unlink => "UNLINK",
        }
    }

    /// Map a request method onto the supported set.
    ///
    /// Returns `None` for anything else (`TRACE`, `CONNECT`, custom verbs).
    pub fn from_method(method: &Method) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == method.as_str())
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
