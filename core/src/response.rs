//! Response classification and content-negotiated decoding.
//!
//! # Design
//! Classification is on status alone: >= 400 selects the declared error
//! target, anything else the success target. The Content-Type picks the
//! codec. Whenever a decode is attempted the body is closed afterwards, on
//! success and on failure alike; when no target applies the body stays open
//! for the caller.
//!
//! A missing codec or a failed decode is stored on the response rather than
//! returned, and outranks the status when reporting `error`. On a 4xx/5xx
//! response the reported error still carries the status, as
//! `Error::UndecodedStatus`.

use std::fmt;

use log::warn;
use serde::de::DeserializeOwned;

use crate::codec::CodecRegistry;
use crate::error::Error;
use crate::http::{find_header, Body, HttpMethod, HttpResponse};
use crate::mediatype::MediaType;

#[derive(Debug)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    media_type: Option<MediaType>,
    body: Body,
    error: Option<Error>,
    api_error: Option<String>,
}

impl Response {
    pub(crate) fn classify<T, E>(
        raw: HttpResponse,
        method: HttpMethod,
        codecs: &CodecRegistry,
        output: Option<&mut T>,
        api_error: Option<&mut E>,
    ) -> Self
    where
        T: DeserializeOwned,
        E: DeserializeOwned + fmt::Debug,
    {
        let media_type = raw
            .header("content-type")
            .and_then(|value| match MediaType::parse(value) {
                Ok(media_type) => Some(media_type),
                Err(err) => {
                    warn!("not decoding response body: {err}");
                    None
                }
            });
        let bodyless = method == HttpMethod::Head || matches!(raw.status, 204 | 304);

        let mut response = Self {
            status: raw.status,
            headers: raw.headers,
            media_type,
            body: raw.body,
            error: None,
            api_error: None,
        };

        if response.status >= 400 {
            if let Some(target) = api_error {
                if response.decode_into(codecs, &mut *target, bodyless) {
                    response.api_error = Some(format!("{target:?}"));
                }
            }
        } else if let Some(target) = output {
            response.decode_into(codecs, target, bodyless);
        }
        response
    }

    /// A response standing in for an exchange the transport could not
    /// complete. Its status is 0.
    pub(crate) fn failed(err: Error) -> Self {
        let mut body = Body::empty();
        body.close();
        Self {
            status: 0,
            headers: Vec::new(),
            media_type: None,
            body,
            error: Some(err),
            api_error: None,
        }
    }

    /// Returns true when a decode was attempted and succeeded.
    fn decode_into<T>(&mut self, codecs: &CodecRegistry, target: &mut T, bodyless: bool) -> bool
    where
        T: DeserializeOwned,
    {
        if bodyless {
            self.body.close();
            return false;
        }
        let Some(media_type) = &self.media_type else {
            return false;
        };
        let result = media_type.decode(codecs, target, &mut self.body);
        self.body.close();
        match result {
            Ok(()) => true,
            Err(err) => {
                warn!("response {} body not decoded: {err}", self.status);
                self.error = Some(err);
                false
            }
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First header value matching `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// The parsed Content-Type, if present and well formed.
    pub fn media_type(&self) -> Option<&MediaType> {
        self.media_type.as_ref()
    }

    /// The body stream. Already closed if a decode ran.
    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    pub fn body_closed(&self) -> bool {
        self.body.is_closed()
    }

    /// Close the body if the caller is done with it. Idempotent.
    pub fn close(&mut self) {
        self.body.close();
    }

    /// True for a status >= 400, or when decoding or the transport failed.
    pub fn is_error(&self) -> bool {
        self.status >= 400 || self.error.is_some()
    }

    /// Codec lookup, decode or transport failure recorded on this response.
    pub fn decode_error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Debug rendering of the decoded error target, for 4xx/5xx responses
    /// that declared one.
    pub fn api_error(&self) -> Option<&str> {
        self.api_error.as_deref()
    }

    /// Message describing why `is_error` is true, or `None`.
    pub fn error(&self) -> Option<String> {
        self.to_error().map(|err| err.to_string())
    }

    /// `Ok(self)` unless `is_error`.
    pub fn into_result(self) -> Result<Self, Error> {
        match self.to_error() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }

    fn to_error(&self) -> Option<Error> {
        if let Some(err) = &self.error {
            if self.status >= 400 {
                return Some(Error::UndecodedStatus {
                    status: self.status,
                    source: Box::new(err.clone()),
                });
            }
            return Some(err.clone());
        }
        (self.status >= 400).then(|| Error::Status {
            status: self.status,
            detail: self.api_error.clone(),
        })
    }
}
