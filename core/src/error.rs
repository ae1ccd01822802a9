//! Error types for the sawyer client.
//!
//! # Design
//! Parse and encode failures are returned straight to the caller. Decode,
//! codec-lookup and transport failures are captured on the `Response` so
//! status and headers stay inspectable; `Response::into_result` turns them
//! back into this type for `?` propagation.

/// Errors produced while building requests or classifying responses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A media type string is not `type/subtype[+suffix][;params]`.
    #[error("invalid media type {input:?}: {reason}")]
    Parse { input: String, reason: &'static str },

    /// No codec is registered for the format of an outgoing body.
    #[error("No encoder found for format {0}")]
    EncoderNotFound(String),

    /// No codec is registered for the format of an incoming body.
    #[error("No decoder found for format {0}")]
    DecoderNotFound(String),

    /// The codec failed to serialize an outgoing body.
    #[error("encode failed: {0}")]
    Encode(String),

    /// The codec failed to deserialize an incoming body into the target.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The request URL could not be resolved against the client base.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The transport could not complete the exchange.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a status >= 400.
    #[error("{}", status_message(.status, .detail))]
    Status { status: u16, detail: Option<String> },

    /// The server answered with a status >= 400 and its error body could
    /// not be decoded into the declared error target.
    #[error("{source} (HTTP {status})")]
    UndecodedStatus { status: u16, source: Box<Error> },
}

impl Error {
    /// True when no codec matched the body's format, in either direction.
    pub fn is_codec_not_found(&self) -> bool {
        match self {
            Error::EncoderNotFound(_) | Error::DecoderNotFound(_) => true,
            Error::UndecodedStatus { source, .. } => source.is_codec_not_found(),
            _ => false,
        }
    }
}

fn status_message(status: &u16, detail: &Option<String>) -> String {
    match detail {
        Some(detail) => detail.clone(),
        None => format!("HTTP {status}"),
    }
}

/// Failure reported by an `Encoder` or `Decoder` implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CodecError {
    message: String,
}

impl CodecError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        CodecError::new(err.to_string())
    }
}
