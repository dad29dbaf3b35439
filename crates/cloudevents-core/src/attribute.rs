//! The CloudEvents attribute type system.
//!
//! Every context attribute carries a value of one of seven kinds. Each kind
//! has a canonical string form used on the wire and by transport bindings:
//! URIs print as their string form, timestamps as RFC 3339, integers as
//! base-10, booleans as `true`/`false`, and binary values as base64.

use std::borrow::Cow;
use std::fmt;
use std::num::IntErrorKind;

use base64::Engine;
use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat};
use serde_json::Value;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum AttributeError {
    #[error("invalid {kind} value for attribute '{name}'")]
    InvalidFormat { name: String, kind: AttributeKind },
    #[error("integer attribute '{name}' is outside the 32-bit signed range")]
    OutOfRange { name: String },
}

/// The declared type of a context attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    String,
    Uri,
    UriRef,
    Timestamp,
    Integer,
    Boolean,
    Binary,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributeKind::String => "String",
            AttributeKind::Uri => "URI",
            AttributeKind::UriRef => "URI-Reference",
            AttributeKind::Timestamp => "Timestamp",
            AttributeKind::Integer => "Integer",
            AttributeKind::Boolean => "Boolean",
            AttributeKind::Binary => "Binary",
        };
        f.write_str(name)
    }
}

impl AttributeKind {
    /// Parses the canonical string form of this kind into a typed value.
    ///
    /// `name` is only used for error context.
    pub fn parse(self, name: &str, raw: &str) -> Result<AttributeValue, AttributeError> {
        let invalid = || AttributeError::InvalidFormat {
            name: name.to_string(),
            kind: self,
        };
        match self {
            AttributeKind::String => Ok(AttributeValue::String(raw.to_string())),
            AttributeKind::Uri => Url::parse(raw)
                .map(AttributeValue::Uri)
                .map_err(|_| invalid()),
            AttributeKind::UriRef => parse_uri_ref(raw)
                .map(AttributeValue::UriRef)
                .ok_or_else(invalid),
            AttributeKind::Timestamp => parse_timestamp(raw)
                .map(AttributeValue::Timestamp)
                .ok_or_else(invalid),
            AttributeKind::Integer => match raw.parse::<i32>() {
                Ok(n) => Ok(AttributeValue::Integer(n)),
                Err(err)
                    if matches!(
                        err.kind(),
                        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow
                    ) =>
                {
                    Err(AttributeError::OutOfRange {
                        name: name.to_string(),
                    })
                }
                Err(_) => Err(invalid()),
            },
            AttributeKind::Boolean => match raw {
                "true" => Ok(AttributeValue::Boolean(true)),
                "false" => Ok(AttributeValue::Boolean(false)),
                _ => Err(invalid()),
            },
            AttributeKind::Binary => base64::engine::general_purpose::STANDARD
                .decode(raw)
                .map(AttributeValue::Binary)
                .map_err(|_| invalid()),
        }
    }
}

fn parse_uri_ref(raw: &str) -> Option<String> {
    match Url::parse(raw) {
        Ok(_) => Some(raw.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            // Relative references are validated by resolution against a
            // throwaway base; the original text is what gets stored.
            let base = Url::parse("ref-base://host/").expect("static base url parses");
            base.join(raw).ok().map(|_| raw.to_string())
        }
        Err(_) => None,
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts);
    }
    // An offset-less timestamp is assumed to be UTC.
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().fixed_offset())
}

/// A typed attribute value.
///
/// `Opaque` holds the raw JSON shape of an extension attribute that was
/// never declared with a kind; it round-trips through the codec verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Uri(Url),
    UriRef(String),
    Timestamp(DateTime<FixedOffset>),
    Integer(i32),
    Boolean(bool),
    Binary(Vec<u8>),
    Opaque(Value),
}

impl AttributeValue {
    /// The kind this value satisfies, or `None` for `Opaque`.
    pub fn kind(&self) -> Option<AttributeKind> {
        match self {
            AttributeValue::String(_) => Some(AttributeKind::String),
            AttributeValue::Uri(_) => Some(AttributeKind::Uri),
            AttributeValue::UriRef(_) => Some(AttributeKind::UriRef),
            AttributeValue::Timestamp(_) => Some(AttributeKind::Timestamp),
            AttributeValue::Integer(_) => Some(AttributeKind::Integer),
            AttributeValue::Boolean(_) => Some(AttributeKind::Boolean),
            AttributeValue::Binary(_) => Some(AttributeKind::Binary),
            AttributeValue::Opaque(_) => None,
        }
    }

    /// Formats the value in its canonical wire form.
    pub fn to_canonical_string(&self) -> String {
        match self {
            AttributeValue::String(s) => s.clone(),
            AttributeValue::Uri(u) => u.as_str().to_string(),
            AttributeValue::UriRef(s) => s.clone(),
            AttributeValue::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            AttributeValue::Integer(n) => n.to_string(),
            AttributeValue::Boolean(b) => b.to_string(),
            AttributeValue::Binary(bytes) => {
                base64::engine::general_purpose::STANDARD.encode(bytes)
            }
            AttributeValue::Opaque(v) => v.to_string(),
        }
    }

    /// The value as a string slice, when it is string-shaped.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) | AttributeValue::UriRef(s) => Some(s),
            AttributeValue::Uri(u) => Some(u.as_str()),
            AttributeValue::Opaque(Value::String(s)) => Some(s),
            _ => None,
        }
    }
}

/// The declaration of one attribute: its name, kind, and role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDefinition {
    name: Cow<'static, str>,
    kind: AttributeKind,
    required: bool,
    is_version: bool,
    is_content_type: bool,
}

impl AttributeDefinition {
    pub const fn core(name: &'static str, kind: AttributeKind, required: bool) -> Self {
        Self {
            name: Cow::Borrowed(name),
            kind,
            required,
            is_version: false,
            is_content_type: false,
        }
    }

    pub const fn version(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            kind: AttributeKind::String,
            required: true,
            is_version: true,
            is_content_type: false,
        }
    }

    pub const fn content_type(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            kind: AttributeKind::String,
            required: false,
            is_version: false,
            is_content_type: true,
        }
    }

    /// Declares a producer-defined extension attribute.
    pub fn extension(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            kind,
            required: false,
            is_version: false,
            is_content_type: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether this is the spec-version attribute of its version.
    pub fn is_version(&self) -> bool {
        self.is_version
    }

    /// Whether this is the data-content-type attribute of its version.
    pub fn is_content_type(&self) -> bool {
        self.is_content_type
    }
}
