//! Executing request descriptors.
//!
//! The client never performs I/O itself. A `Transport` turns an
//! `HttpRequest` into an `HttpResponse`; any non-2xx status must come back
//! as data so the client can interpret it. Only failures that produce no
//! response at all become `ApiError::Transport`.
//!
//! Response bodies are read fully into memory. `UreqTransport` caps them at
//! `DEFAULT_MAX_BODY_BYTES` unless built with
//! [`UreqTransport::with_body_limit`]; a larger body is reported as
//! `ApiError::BodyTooLarge` together with the status that was received.

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

/// Default cap on a buffered response body: 64 MiB.
pub const DEFAULT_MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

#[cfg(feature = "ureq")]
pub use self::blocking::UreqTransport;

#[cfg(feature = "ureq")]
mod blocking {
    use tracing::{debug, warn};

    use super::{Transport, DEFAULT_MAX_BODY_BYTES};
    use crate::error::ApiError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// Blocking transport over a shared `ureq::Agent`.
    ///
    /// Status-code-as-error is disabled, so 4xx/5xx responses are returned
    /// as data.
    #[derive(Clone)]
    pub struct UreqTransport {
        agent: ureq::Agent,
        max_body_bytes: u64,
    }

    impl std::fmt::Debug for UreqTransport {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("UreqTransport")
                .field("max_body_bytes", &self.max_body_bytes)
                .finish_non_exhaustive()
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl UreqTransport {
        pub fn new() -> Self {
            Self::with_body_limit(DEFAULT_MAX_BODY_BYTES)
        }

        /// Buffer at most `max_body_bytes` of any response body.
        pub fn with_body_limit(max_body_bytes: u64) -> Self {
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent();
            Self {
                agent,
                max_body_bytes,
            }
        }

        pub fn body_limit(&self) -> u64 {
            self.max_body_bytes
        }
    }

    fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &[(String, String)]) -> ureq::RequestBuilder<B> {
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    impl Transport for UreqTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            let url = request.url.as_str();
            let headers = &request.headers;
            debug!(method = request.method.as_str(), url, "executing request");

            let result = match (request.method, request.body.as_deref()) {
                (HttpMethod::Get, _) => with_headers(self.agent.get(url), headers).call(),
                (HttpMethod::Delete, _) => with_headers(self.agent.delete(url), headers).call(),
                (HttpMethod::Post, Some(body)) => {
                    with_headers(self.agent.post(url), headers).send(body.as_bytes())
                }
                (HttpMethod::Post, None) => with_headers(self.agent.post(url), headers).send_empty(),
                (HttpMethod::Put, Some(body)) => {
                    with_headers(self.agent.put(url), headers).send(body.as_bytes())
                }
                (HttpMethod::Put, None) => with_headers(self.agent.put(url), headers).send_empty(),
            };
            let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response
                .body_mut()
                .with_config()
                .limit(self.max_body_bytes)
                .read_to_string()
                .map_err(|e| match e {
                    ureq::Error::BodyExceedsLimit(limit) => {
                        warn!(status, limit, "response body over limit");
                        ApiError::BodyTooLarge { status, limit }
                    }
                    other => ApiError::Transport(other.to_string()),
                })?;
            debug!(status, "received response");

            Ok(HttpResponse { status, headers, body })
        }
    }
}
