//! Content-negotiating HTTP client core.
//!
//! # Overview
//! Requests carry bodies encoded for a declared `MediaType`; responses are
//! classified by status and decoded, by their Content-Type, into either the
//! caller's success target or its declared error target. Codecs are looked up
//! per format token (`json` for both `application/json` and
//! `application/vnd.github.v3+json`) in an explicit `CodecRegistry`.
//!
//! # Design
//! - The HTTP exchange itself goes through the `Transport` trait; a ureq
//!   implementation ships behind the default `ureq` feature.
//! - Codecs pivot through `serde_json::Value`, so callers work with plain
//!   serde types whatever the wire format.
//! - Decode and transport failures are recorded on `Response` instead of
//!   being returned, so status and headers stay inspectable.

pub mod client;
pub mod codec;
pub mod error;
pub mod http;
pub mod mediatype;
pub mod query;
pub mod request;
pub mod response;
pub mod transport;

pub use client::Client;
pub use codec::{Codec, CodecRegistry, Decoder, Encoder, JsonCodec};
pub use error::{CodecError, Error};
pub use http::{Body, HttpMethod, HttpRequest, HttpResponse};
pub use mediatype::MediaType;
pub use query::QueryParams;
pub use request::Request;
pub use response::Response;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use transport::Transport;
