//! A single request: query, headers, an optional encoded body and an
//! optional declared error target.
//!
//! Executing a verb consumes the request; its body cannot be sent twice.

use std::fmt;

use log::{debug, warn};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use url::Url;

use crate::client::{set_header, Client};
use crate::error::Error;
use crate::http::{find_header, HttpMethod, HttpRequest};
use crate::mediatype::MediaType;
use crate::query::QueryParams;
use crate::response::Response;

/// A request bound to a `Client`.
///
/// `E` is the type decoded from 4xx/5xx bodies when an error target was
/// declared with `with_api_error`.
pub struct Request<'e, E = IgnoredAny> {
    client: Client,
    url: Url,
    query: QueryParams,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    content_length: Option<u64>,
    api_error: Option<&'e mut E>,
}

impl Request<'static, IgnoredAny> {
    pub(crate) fn new(client: Client, url: Url, query: QueryParams) -> Self {
        let headers = client.headers().to_vec();
        Self {
            client,
            url,
            query,
            headers,
            body: None,
            content_length: None,
            api_error: None,
        }
    }
}

impl<'e, E> Request<'e, E>
where
    E: DeserializeOwned + fmt::Debug,
{
    /// Decode error responses into `target`.
    pub fn with_api_error<'f, F>(self, target: &'f mut F) -> Request<'f, F>
    where
        F: DeserializeOwned + fmt::Debug,
    {
        Request {
            client: self.client,
            url: self.url,
            query: self.query,
            headers: self.headers,
            body: self.body,
            content_length: self.content_length,
            api_error: Some(target),
        }
    }

    /// The resolved URL, without its query string.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut QueryParams {
        &mut self.query
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        set_header(&mut self.headers, name.into(), value.into());
    }

    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Encode `value` as `media_type` and install it as the body, along with
    /// its length and Content-Type. On failure the request is left as it was.
    pub fn set_body<T>(&mut self, media_type: &MediaType, value: &T) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
    {
        let bytes = media_type.encode(self.client.codecs(), value)?;
        self.content_length = Some(bytes.len() as u64);
        self.body = Some(bytes);
        set_header(
            &mut self.headers,
            "Content-Type".to_string(),
            media_type.to_string(),
        );
        Ok(())
    }

    pub fn head<T: DeserializeOwned>(self, output: &mut T) -> Response {
        self.execute(HttpMethod::Head, Some(output))
    }

    pub fn get<T: DeserializeOwned>(self, output: &mut T) -> Response {
        self.execute(HttpMethod::Get, Some(output))
    }

    pub fn post<T: DeserializeOwned>(self, output: &mut T) -> Response {
        self.execute(HttpMethod::Post, Some(output))
    }

    pub fn put<T: DeserializeOwned>(self, output: &mut T) -> Response {
        self.execute(HttpMethod::Put, Some(output))
    }

    pub fn patch<T: DeserializeOwned>(self, output: &mut T) -> Response {
        self.execute(HttpMethod::Patch, Some(output))
    }

    pub fn delete<T: DeserializeOwned>(self, output: &mut T) -> Response {
        self.execute(HttpMethod::Delete, Some(output))
    }

    pub fn options<T: DeserializeOwned>(self, output: &mut T) -> Response {
        self.execute(HttpMethod::Options, Some(output))
    }

    /// Execute without a success target. A successful body is left open for
    /// the caller to read.
    pub fn send(self, method: HttpMethod) -> Response {
        self.execute::<IgnoredAny>(method, None)
    }

    /// Execute `method`, decoding into `output` on success or into the
    /// declared error target on a 4xx/5xx status.
    pub fn execute<T>(self, method: HttpMethod, output: Option<&mut T>) -> Response
    where
        T: DeserializeOwned,
    {
        let Request {
            client,
            mut url,
            query,
            headers,
            body,
            content_length,
            api_error,
        } = self;
        query.apply_to(&mut url);

        let request = HttpRequest {
            method,
            url: url.into(),
            headers,
            body,
            content_length,
        };
        debug!("{} {}", method, request.url);

        match client.transport().send(request) {
            Ok(raw) => Response::classify(raw, method, client.codecs(), output, api_error),
            Err(err) => {
                warn!("{method} failed: {err}");
                Response::failed(err)
            }
        }
    }
}

impl<E> fmt::Debug for Request<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("url", &self.url.as_str())
            .field("query", &self.query)
            .field("headers", &self.headers)
            .field("content_length", &self.content_length)
            .field("api_error", &self.api_error.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use serde::Deserialize;

    use super::*;
    use crate::transport::canned::CannedTransport;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct User {
        #[serde(default)]
        id: i64,
        #[serde(default)]
        login: String,
    }

    fn setup(status: u16, content_type: Option<&str>, body: &str) -> (Client, Arc<CannedTransport>) {
        let transport = Arc::new(CannedTransport::new(status, content_type, body));
        let client = Client::with_transport("http://localhost:3000?a=1&b=1", transport.clone()).unwrap();
        (client, transport)
    }

    #[test]
    fn set_body_installs_bytes_length_and_content_type() {
        let (client, transport) = setup(201, Some("application/json"), r#"{"login":"sawyer2"}"#);
        let mt = MediaType::parse("application/json").unwrap();
        let mut user = User {
            id: 0,
            login: "sawyer".to_string(),
        };

        let mut req = client.new_request("users").unwrap();
        req.set_body(&mt, &user).unwrap();
        assert_eq!(req.content_length(), Some(req.body().unwrap().len() as u64));
        assert_eq!(req.header("content-type"), Some("application/json"));

        let res = req.post(&mut user);
        assert!(!res.is_error());
        assert_eq!(user.login, "sawyer2");

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.method, HttpMethod::Post);
        assert_eq!(sent.header("Content-Type"), Some(mt.to_string().as_str()));
        let body: serde_json::Value = serde_json::from_slice(sent.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["login"], "sawyer");
        assert_eq!(sent.content_length, sent.body.as_ref().map(|b| b.len() as u64));
    }

    #[test]
    fn set_body_without_codec_leaves_request_unset() {
        let (client, _) = setup(200, None, "");
        let mt = MediaType::parse("application/booya+booya").unwrap();
        let mut req = client.new_request("users").unwrap();

        let err = req.set_body(&mt, &User::default()).unwrap_err();
        assert_eq!(err, Error::EncoderNotFound("booya".to_string()));
        assert!(req.body().is_none());
        assert!(req.content_length().is_none());
        assert!(req.header("content-type").is_none());
    }

    #[test]
    fn set_body_encode_failure_leaves_request_unset() {
        let (client, _) = setup(200, None, "");
        let mt = MediaType::parse("application/json").unwrap();
        let mut req = client.new_request("users").unwrap();

        let mut bad = HashMap::new();
        bad.insert((1, 2), "tuple keys are not json object keys");
        let err = req.set_body(&mt, &bad).unwrap_err();
        assert!(matches!(err, Error::Encode(_)));
        assert!(req.body().is_none());
    }

    #[test]
    fn request_query_layers_over_client_defaults() {
        let (mut client, transport) = setup(200, None, "ok");
        client.query_mut().set("b", "2");
        client.query_mut().set("c", "3");

        let mut req = client.new_request("/q?d=4").unwrap();
        req.query_mut().set("b", "4");
        req.query_mut().set("c", "3");
        req.query_mut().set("d", "2");
        req.query_mut().set("e", "1");
        let res = req.send(HttpMethod::Get);
        assert!(!res.is_error());

        let sent = transport.last_request().unwrap();
        let url = Url::parse(&sent.url).unwrap();
        assert_eq!(url.path(), "/q");
        let q = QueryParams::from_url(&url);
        assert_eq!(q.get("a"), Some("1"));
        assert_eq!(q.get("b"), Some("4"));
        assert_eq!(q.get("c"), Some("3"));
        assert_eq!(q.get("d"), Some("2"));
        assert_eq!(q.get("e"), Some("1"));
        assert_eq!(q.get_all("b").len(), 1);
    }

    #[test]
    fn client_headers_are_copied_and_overridable() {
        let (mut client, transport) = setup(200, None, "");
        client.set_header("Accept", "application/json");
        client.set_header("User-Agent", "sawyer");

        let mut req = client.new_request("user").unwrap();
        req.set_header("accept", "application/vnd.sawyer+json");
        let _ = req.send(HttpMethod::Head);

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.method, HttpMethod::Head);
        assert_eq!(sent.header("Accept"), Some("application/vnd.sawyer+json"));
        assert_eq!(sent.header("user-agent"), Some("sawyer"));
    }

    #[test]
    fn every_verb_sends_its_method() {
        type Verb = fn(Request<'static, IgnoredAny>, &mut IgnoredAny) -> Response;
        let verbs: [(HttpMethod, Verb); 7] = [
            (HttpMethod::Head, |r, o| r.head(o)),
            (HttpMethod::Get, |r, o| r.get(o)),
            (HttpMethod::Post, |r, o| r.post(o)),
            (HttpMethod::Put, |r, o| r.put(o)),
            (HttpMethod::Patch, |r, o| r.patch(o)),
            (HttpMethod::Delete, |r, o| r.delete(o)),
            (HttpMethod::Options, |r, o| r.options(o)),
        ];
        for (method, verb) in verbs {
            let (client, transport) = setup(204, None, "");
            let req = client.new_request("user").unwrap();
            let res = verb(req, &mut IgnoredAny);
            assert_eq!(res.status(), 204);
            assert_eq!(transport.last_request().unwrap().method, method);
        }
    }
}
