//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. The client builds `HttpRequest`
//! values and parses `HttpResponse` values without touching the network;
//! a `Transport` (or the host) performs the round-trip.
//!
//! The builder does not validate the URL or method. A malformed descriptor
//! fails at the transport, never here.

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Assemble a descriptor from its parts.
    pub fn new(
        method: HttpMethod,
        headers: Vec<(String, String)>,
        url: impl Into<String>,
        body: Option<String>,
    ) -> Self {
        Self {
            method,
            url: url.into(),
            headers,
            body,
        }
    }

    /// A descriptor that carries no body.
    pub fn bodyless(method: HttpMethod, headers: Vec<(String, String)>, url: impl Into<String>) -> Self {
        Self::new(method, headers, url, None)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
///
/// Constructed by the transport after executing an `HttpRequest`, then
/// handed to `ProjectApiClient::parse_*` methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Mirrors `Response.ok`: any 2xx status.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bodyless_request_has_no_body() {
        let req = HttpRequest::bodyless(HttpMethod::Delete, Vec::new(), "/api/v4/projects/3");
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.url, "/api/v4/projects/3");
        assert!(req.body.is_none());
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = HttpRequest::new(
            HttpMethod::Post,
            vec![("Content-Type".to_string(), "application/json".to_string())],
            "/x",
            Some("{}".to_string()),
        );
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("authorization"), None);
    }

    #[test]
    fn only_2xx_is_ok() {
        assert!(HttpResponse::new(200, "").is_ok());
        assert!(HttpResponse::new(204, "").is_ok());
        assert!(!HttpResponse::new(199, "").is_ok());
        assert!(!HttpResponse::new(301, "").is_ok());
        assert!(!HttpResponse::new(404, "").is_ok());
    }
}
