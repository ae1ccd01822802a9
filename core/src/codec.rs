//! Codec registry keyed by media-type format token.
//!
//! # Design
//! Codecs translate between wire bytes and the `serde_json::Value` data
//! model. That keeps `Encoder` and `Decoder` object-safe, so formats can be
//! registered at runtime, while callers stay typed through serde on either
//! side of the pivot.
//!
//! The registry is an explicit object held by the `Client` (behind an `Arc`).
//! Lookups take a shared lock; registration is expected at startup or in
//! tests and simply overwrites.

use std::collections::HashMap;
use std::fmt;
use std::io::{BufReader, Read};
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;
use serde_json::Value;

use crate::error::CodecError;

/// Serializes a value into the bytes of one format.
pub trait Encoder: Send + Sync {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError>;
}

/// Deserializes a byte stream of one format.
pub trait Decoder: Send + Sync {
    fn decode(&self, reader: &mut dyn Read) -> Result<Value, CodecError>;
}

impl<F> Encoder for F
where
    F: Fn(&Value) -> Result<Vec<u8>, CodecError> + Send + Sync,
{
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        self(value)
    }
}

impl<F> Decoder for F
where
    F: Fn(&mut dyn Read) -> Result<Value, CodecError> + Send + Sync,
{
    fn decode(&self, reader: &mut dyn Read) -> Result<Value, CodecError> {
        self(reader)
    }
}

/// The built-in `json` codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Encoder for JsonCodec {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(value)?)
    }
}

impl Decoder for JsonCodec {
    fn decode(&self, reader: &mut dyn Read) -> Result<Value, CodecError> {
        Ok(serde_json::from_reader(BufReader::new(reader))?)
    }
}

/// An encoder/decoder pair registered for one format token.
#[derive(Clone)]
pub struct Codec {
    encoder: Arc<dyn Encoder>,
    decoder: Arc<dyn Decoder>,
}

impl Codec {
    pub fn new(encoder: impl Encoder + 'static, decoder: impl Decoder + 'static) -> Self {
        Self {
            encoder: Arc::new(encoder),
            decoder: Arc::new(decoder),
        }
    }

    pub fn encoder(&self) -> &dyn Encoder {
        self.encoder.as_ref()
    }

    pub fn decoder(&self) -> &dyn Decoder {
        self.decoder.as_ref()
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec").finish_non_exhaustive()
    }
}

/// Process-wide, read-mostly mapping from format token to `Codec`.
///
/// Format tokens are case-insensitive.
pub struct CodecRegistry {
    codecs: RwLock<HashMap<String, Codec>>,
}

impl CodecRegistry {
    /// A registry with no codecs at all.
    pub fn empty() -> Self {
        Self {
            codecs: RwLock::new(HashMap::new()),
        }
    }

    /// Register `encoder`/`decoder` for `format`, replacing any earlier
    /// registration.
    pub fn register(
        &self,
        format: &str,
        encoder: impl Encoder + 'static,
        decoder: impl Decoder + 'static,
    ) {
        self.register_codec(format, Codec::new(encoder, decoder));
    }

    pub fn register_codec(&self, format: &str, codec: Codec) {
        let format = format.to_ascii_lowercase();
        debug!("registering codec for format {format}");
        self.codecs.write().insert(format, codec);
    }

    /// Remove the codec for `format`, returning it if one was registered.
    pub fn unregister(&self, format: &str) -> Option<Codec> {
        self.codecs.write().remove(&format.to_ascii_lowercase())
    }

    /// Absence is a normal outcome; callers turn it into a not-found error.
    pub fn lookup(&self, format: &str) -> Option<Codec> {
        self.codecs.read().get(&format.to_ascii_lowercase()).cloned()
    }

    pub fn contains(&self, format: &str) -> bool {
        self.codecs
            .read()
            .contains_key(&format.to_ascii_lowercase())
    }

    /// Registered format tokens, sorted.
    pub fn formats(&self) -> Vec<String> {
        let mut formats: Vec<String> = self.codecs.read().keys().cloned().collect();
        formats.sort();
        formats
    }
}

impl Default for CodecRegistry {
    /// A registry holding the `json` codec.
    fn default() -> Self {
        let registry = Self::empty();
        registry.register("json", JsonCodec, JsonCodec);
        registry
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("formats", &self.formats())
            .finish()
    }
}
