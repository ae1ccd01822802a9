//! Client configuration shared by every request it builds.
//!
//! # Design
//! `Client` is cheap to clone: the codec registry and transport sit behind
//! `Arc`s. The base URL's query string becomes the client's default query
//! parameters, and each request starts from a copy of them.

use std::fmt;
use std::sync::Arc;

use serde::de::IgnoredAny;
use url::Url;

use crate::codec::CodecRegistry;
use crate::error::Error;
use crate::query::QueryParams;
use crate::request::Request;
use crate::transport::Transport;

#[derive(Clone)]
pub struct Client {
    base_url: Url,
    query: QueryParams,
    headers: Vec<(String, String)>,
    codecs: Arc<CodecRegistry>,
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Client using the blocking ureq transport and the default codecs.
    #[cfg(feature = "ureq")]
    pub fn new(base_url: &str) -> Result<Self, Error> {
        Self::with_transport(base_url, Arc::new(crate::transport::UreqTransport::new()))
    }

    pub fn with_transport(base_url: &str, transport: Arc<dyn Transport>) -> Result<Self, Error> {
        let mut base_url =
            Url::parse(base_url).map_err(|e| Error::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(format!("{base_url}: cannot be a base")));
        }
        let query = QueryParams::from_url(&base_url);
        base_url.set_query(None);
        Ok(Self {
            base_url,
            query,
            headers: Vec::new(),
            codecs: Arc::new(CodecRegistry::default()),
            transport,
        })
    }

    /// Replace the codec registry.
    pub fn with_codecs(mut self, codecs: Arc<CodecRegistry>) -> Self {
        self.codecs = codecs;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn codecs(&self) -> &Arc<CodecRegistry> {
        &self.codecs
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Default query parameters copied into every new request.
    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut QueryParams {
        &mut self.query
    }

    /// Default headers copied into every new request.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Set a default header, replacing any value with the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        set_header(&mut self.headers, name.into(), value.into());
    }

    /// Resolve `raw` against the base URL; the result carries no query.
    /// The query of `raw` is layered over the client defaults.
    pub fn resolve(&self, raw: &str) -> Result<(Url, QueryParams), Error> {
        let mut url = self
            .base_url
            .join(raw)
            .map_err(|e| Error::InvalidUrl(format!("{raw}: {e}")))?;
        let mut query = self.query.clone();
        query.merge(&QueryParams::from_url(&url));
        url.set_query(None);
        Ok((url, query))
    }

    /// Start a GET-ready request for `raw` with no declared error target.
    pub fn new_request(&self, raw: &str) -> Result<Request<'static, IgnoredAny>, Error> {
        let (url, query) = self.resolve(raw)?;
        Ok(Request::new(self.clone(), url, query))
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("query", &self.query)
            .field("headers", &self.headers)
            .field("codecs", &self.codecs)
            .finish_non_exhaustive()
    }
}

pub(crate) fn set_header(headers: &mut Vec<(String, String)>, name: String, value: String) {
    headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
    headers.push((name, value));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::canned::CannedTransport;

    fn client(base: &str) -> Client {
        Client::with_transport(base, Arc::new(CannedTransport::new(200, None, ""))).unwrap()
    }

    #[test]
    fn base_query_becomes_defaults() {
        let c = client("http://localhost:3000?a=1&b=1");
        assert_eq!(c.query().get("a"), Some("1"));
        assert_eq!(c.query().get("b"), Some("1"));
        assert_eq!(c.base_url().as_str(), "http://localhost:3000/");
    }

    #[test]
    fn resolves_relative_paths() {
        let c = client("http://localhost:3000/api/");
        let (url, _) = c.resolve("user").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/user");
        let (url, _) = c.resolve("/q").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/q");
    }

    #[test]
    fn url_query_overrides_defaults() {
        let mut c = client("http://localhost:3000?a=1&b=1");
        c.query_mut().set("b", "2");
        let (url, query) = c.resolve("/q?b=3&d=4").unwrap();
        assert_eq!(url.query(), None);
        assert_eq!(query.encode(), "a=1&b=3&d=4");
    }

    #[test]
    fn rejects_invalid_base() {
        let err = Client::with_transport("not a url", Arc::new(CannedTransport::new(200, None, "")))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn set_header_replaces_case_insensitively() {
        let mut c = client("http://localhost:3000");
        c.set_header("Accept", "text/plain");
        c.set_header("accept", "application/json");
        assert_eq!(
            c.headers(),
            [("accept".to_string(), "application/json".to_string())]
        );
    }
}
