//! The transport seam between the client core and an HTTP implementation.
//!
//! The core only needs "send method + URL + headers + body, get back status +
//! headers + body stream". Connection pooling, TLS, redirects and timeouts
//! stay inside the implementation.

use crate::error::Error;
use crate::http::{HttpRequest, HttpResponse};

/// Executes one HTTP exchange.
///
/// Implementations must return 4xx/5xx responses as `Ok`; only failures to
/// complete the exchange are errors.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, Error>;
}

#[cfg(feature = "ureq")]
pub use self::ureq_transport::UreqTransport;

#[cfg(feature = "ureq")]
mod ureq_transport {
    use log::debug;
    use ureq::typestate::{WithBody, WithoutBody};

    use super::Transport;
    use crate::error::Error;
    use crate::http::{Body, HttpMethod, HttpRequest, HttpResponse};

    /// Blocking transport backed by a `ureq::Agent`.
    ///
    /// Status codes are never turned into errors so the response classifier
    /// sees every 4xx/5xx body.
    #[derive(Debug, Clone)]
    pub struct UreqTransport {
        agent: ureq::Agent,
    }

    impl UreqTransport {
        pub fn new() -> Self {
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent();
            Self { agent }
        }

        /// Wrap a preconfigured agent. The agent should have
        /// `http_status_as_error(false)` set.
        pub fn from_agent(agent: ureq::Agent) -> Self {
            Self { agent }
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    fn with_headers<B>(
        mut builder: ureq::RequestBuilder<B>,
        headers: &[(String, String)],
    ) -> ureq::RequestBuilder<B> {
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    type UreqResult = Result<ureq::http::Response<ureq::Body>, ureq::Error>;

    /// Verbs without a conventional body still carry one when the request
    /// has it installed.
    fn send_without_body(
        builder: ureq::RequestBuilder<WithoutBody>,
        body: Option<&[u8]>,
    ) -> UreqResult {
        match body {
            Some(body) => builder.force_send_body().send(body),
            None => builder.call(),
        }
    }

    fn send_with_body(
        builder: ureq::RequestBuilder<WithBody>,
        body: Option<&[u8]>,
    ) -> UreqResult {
        match body {
            Some(body) => builder.send(body),
            None => builder.send_empty(),
        }
    }

    impl Transport for UreqTransport {
        fn send(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
            let url = request.url.as_str();
            let headers = request.headers.as_slice();
            let body = request.body.as_deref();
            debug!("ureq {} {}", request.method, url);

            let agent = &self.agent;
            let result = match request.method {
                HttpMethod::Head => send_without_body(with_headers(agent.head(url), headers), body),
                HttpMethod::Get => send_without_body(with_headers(agent.get(url), headers), body),
                HttpMethod::Delete => {
                    send_without_body(with_headers(agent.delete(url), headers), body)
                }
                HttpMethod::Options => {
                    send_without_body(with_headers(agent.options(url), headers), body)
                }
                HttpMethod::Post => send_with_body(with_headers(agent.post(url), headers), body),
                HttpMethod::Put => send_with_body(with_headers(agent.put(url), headers), body),
                HttpMethod::Patch => send_with_body(with_headers(agent.patch(url), headers), body),
            };
            let response = result.map_err(|e| Error::Transport(e.to_string()))?;

            let (parts, body) = response.into_parts();
            let headers = parts
                .headers
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();

            // Streamed without a size limit; closing the Body drops the
            // reader and with it the connection.
            Ok(HttpResponse {
                status: parts.status.as_u16(),
                headers,
                body: Body::new(body.into_reader()),
            })
        }
    }
}
