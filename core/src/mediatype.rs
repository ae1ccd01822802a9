//! Structured media types and codec dispatch by format token.
//!
//! # Design
//! A `MediaType` is parsed once and never mutated. Its `format` is the
//! registry key: the structured-syntax suffix when present
//! (`application/vnd.github.v3+json` -> `json`), otherwise the subtype
//! (`application/json` -> `json`). Type, subtype and parameter names compare
//! case-insensitively and are stored lowercase, so `to_string` is stable for
//! equivalent inputs.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::str::FromStr;

use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::CodecRegistry;
use crate::error::Error;

/// A parsed `type/subtype[+suffix][;params]` media type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType {
    main_type: String,
    sub_type: String,
    suffix: Option<String>,
    vendor: Option<String>,
    version: Option<String>,
    format: String,
    params: BTreeMap<String, String>,
}

impl MediaType {
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let fail = |reason| Error::Parse {
            input: raw.to_string(),
            reason,
        };

        let mut parts = raw.split(';');
        let essence = parts.next().unwrap_or_default().trim();
        if essence.is_empty() {
            return Err(fail("empty media type"));
        }
        let (main_type, sub_type) = essence
            .split_once('/')
            .ok_or_else(|| fail("missing '/' between type and subtype"))?;
        if !is_token(main_type) {
            return Err(fail("invalid type"));
        }
        if !is_token(sub_type) {
            return Err(fail("invalid subtype"));
        }
        let main_type = main_type.to_ascii_lowercase();
        let sub_type = sub_type.to_ascii_lowercase();

        let mut params = BTreeMap::new();
        for param in parts {
            let param = param.trim();
            if param.is_empty() {
                continue;
            }
            let (name, value) = param
                .split_once('=')
                .ok_or_else(|| fail("parameter without '='"))?;
            let name = name.trim();
            if !is_token(name) {
                return Err(fail("invalid parameter name"));
            }
            let value = unquote(value.trim()).ok_or_else(|| fail("invalid parameter value"))?;
            params.insert(name.to_ascii_lowercase(), value);
        }

        let (tree, suffix) = match sub_type.rsplit_once('+') {
            Some((tree, suffix)) if !tree.is_empty() && !suffix.is_empty() => {
                (tree, Some(suffix.to_string()))
            }
            Some(_) => return Err(fail("empty subtype or suffix around '+'")),
            None => (sub_type.as_str(), None),
        };

        let (vendor, version) = match tree.strip_prefix("vnd.") {
            Some(rest) => {
                let mut segments = rest.split('.');
                let vendor = segments.next().filter(|s| !s.is_empty()).map(str::to_string);
                let version = segments.next().filter(|s| !s.is_empty()).map(str::to_string);
                (vendor, version)
            }
            None => (None, None),
        };

        let format = suffix.clone().unwrap_or_else(|| sub_type.clone());

        Ok(Self {
            main_type,
            sub_type,
            suffix,
            vendor,
            version,
            format,
            params,
        })
    }

    /// `application` in `application/vnd.github.v3+json`.
    pub fn main_type(&self) -> &str {
        &self.main_type
    }

    /// `vnd.github.v3+json` in `application/vnd.github.v3+json`.
    pub fn sub_type(&self) -> &str {
        &self.sub_type
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    pub fn vendor(&self) -> Option<&str> {
        self.vendor.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The codec lookup key.
    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Serialize `value` with the codec registered for this format.
    pub fn encode<T>(&self, codecs: &CodecRegistry, value: &T) -> Result<Vec<u8>, Error>
    where
        T: Serialize + ?Sized,
    {
        let codec = codecs
            .lookup(&self.format)
            .ok_or_else(|| Error::EncoderNotFound(self.format.clone()))?;
        let value = serde_json::to_value(value).map_err(|e| Error::Encode(e.to_string()))?;
        codec
            .encoder()
            .encode(&value)
            .map_err(|e| Error::Encode(e.to_string()))
    }

    /// Decode `reader` into `target` with the codec registered for this
    /// format. `target` is only overwritten when decoding succeeds.
    pub fn decode<T>(
        &self,
        codecs: &CodecRegistry,
        target: &mut T,
        reader: &mut dyn Read,
    ) -> Result<(), Error>
    where
        T: DeserializeOwned,
    {
        let codec = codecs
            .lookup(&self.format)
            .ok_or_else(|| Error::DecoderNotFound(self.format.clone()))?;
        debug!("decoding {} body", self.format);
        let value = codec
            .decoder()
            .decode(reader)
            .map_err(|e| Error::Decode(e.to_string()))?;
        *target = serde_json::from_value(value).map_err(|e| Error::Decode(e.to_string()))?;
        Ok(())
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.sub_type)?;
        for (name, value) in &self.params {
            if is_token(value) {
                write!(f, "; {name}={value}")?;
            } else {
                write!(f, "; {name}=\"")?;
                for c in value.chars() {
                    if c == '"' || c == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("\"")?;
            }
        }
        Ok(())
    }
}

impl FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn is_tchar(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

fn is_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_tchar)
}

/// Token values pass through; quoted strings lose their quotes and escapes.
fn unquote(value: &str) -> Option<String> {
    let Some(inner) = value.strip_prefix('"') else {
        return is_token(value).then(|| value.to_string());
    };
    let inner = inner.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push(chars.next()?),
            '"' => return None,
            c => out.push(c),
        }
    }
    Some(out)
}
