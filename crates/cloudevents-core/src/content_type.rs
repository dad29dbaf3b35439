//! Media-type parsing for the data-content-type attribute.
//!
//! A content type is `type/subtype` plus optional `;key=value` parameters.
//! The charset parameter governs how payload bytes are (de)coded; the
//! media type itself selects the payload encoding rule.
//!
//! # Example
//!
//! ```
//! use cloudevents_core::content_type::ContentType;
//!
//! let ct = ContentType::parse("text/plain; charset=iso-8859-1").unwrap();
//! assert_eq!(ct.essence(), "text/plain");
//! assert!(ct.is_text());
//! assert_eq!(ct.charset(), Some("iso-8859-1"));
//! ```

use std::fmt;

use encoding_rs::{Encoding, UTF_8};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentTypeError {
    #[error("invalid content type '{0}'")]
    InvalidContentType(String),
    #[error("unknown charset '{0}'")]
    UnknownCharset(String),
}

/// A parsed media type with its parameters in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    type_: String,
    subtype: String,
    params: Vec<(String, String)>,
}

impl ContentType {
    /// Parses `type/subtype[;key=value...]`.
    ///
    /// Parameter names are lowercased; quoted parameter values are
    /// unquoted. Empty parameter segments (a trailing `;`) are tolerated.
    pub fn parse(raw: &str) -> Result<Self, ContentTypeError> {
        let invalid = || ContentTypeError::InvalidContentType(raw.to_string());

        let mut segments = raw.split(';');
        let essence = segments.next().ok_or_else(invalid)?.trim();
        let (type_, subtype) = essence.split_once('/').ok_or_else(invalid)?;
        if type_.is_empty()
            || subtype.is_empty()
            || type_.contains(char::is_whitespace)
            || subtype.contains(char::is_whitespace)
        {
            return Err(invalid());
        }

        let mut params = Vec::new();
        for segment in segments {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let (key, value) = segment.split_once('=').ok_or_else(invalid)?;
            let key = key.trim();
            if key.is_empty() {
                return Err(invalid());
            }
            let value = value.trim().trim_matches('"');
            params.push((key.to_ascii_lowercase(), value.to_string()));
        }

        Ok(Self {
            type_: type_.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            params,
        })
    }

    /// `type/subtype`, lowercased, without parameters.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.type_, self.subtype)
    }

    /// The value of the charset parameter, if declared.
    pub fn charset(&self) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == "charset")
            .map(|(_, value)| value.as_str())
    }

    /// Whether payloads of this type are JSON: `application/json` or any
    /// subtype with the `+json` suffix.
    pub fn is_json(&self) -> bool {
        (self.type_ == "application" && self.subtype == "json") || self.subtype.ends_with("+json")
    }

    /// Whether this is a `text/*` type.
    pub fn is_text(&self) -> bool {
        self.type_ == "text"
    }

    /// Resolves the declared charset to an encoding, defaulting to UTF-8.
    pub fn encoding(&self) -> Result<&'static Encoding, ContentTypeError> {
        match self.charset() {
            None => Ok(UTF_8),
            Some(label) => Encoding::for_label(label.as_bytes())
                .ok_or_else(|| ContentTypeError::UnknownCharset(label.to_string())),
        }
    }

    /// The default content type applied when an event declares none.
    pub fn json() -> Self {
        Self {
            type_: "application".to_string(),
            subtype: "json".to_string(),
            params: Vec::new(),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.type_, self.subtype)?;
        for (key, value) in &self.params {
            write!(f, "; {key}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_essence_and_params() {
        let ct = ContentType::parse("Application/CloudEvents+JSON; charset=UTF-8")
            .expect("media type parses");
        assert_eq!(ct.essence(), "application/cloudevents+json");
        assert_eq!(ct.charset(), Some("UTF-8"));
        assert!(ct.is_json());
    }

    #[test]
    fn quoted_charset_is_unquoted() {
        let ct = ContentType::parse("text/plain; charset=\"utf-8\"").expect("media type parses");
        assert_eq!(ct.charset(), Some("utf-8"));
    }

    #[test]
    fn plus_json_suffix_counts_as_json() {
        let ct = ContentType::parse("application/ld+json").expect("media type parses");
        assert!(ct.is_json());
        assert!(!ContentType::parse("application/octet-stream")
            .expect("media type parses")
            .is_json());
    }

    #[test]
    fn malformed_types_are_rejected() {
        for raw in ["plain", "/plain", "text/", "te xt/plain", "text/plain; charset"] {
            assert_matches!(
                ContentType::parse(raw),
                Err(ContentTypeError::InvalidContentType(_)),
                "{raw:?} should not parse"
            );
        }
    }

    #[test]
    fn trailing_semicolon_is_tolerated() {
        let ct = ContentType::parse("text/plain;").expect("media type parses");
        assert_eq!(ct.essence(), "text/plain");
    }

    #[test]
    fn charset_resolution() {
        let latin = ContentType::parse("text/plain; charset=iso-8859-1").expect("parses");
        assert_eq!(latin.encoding().expect("known charset").name(), "windows-1252");

        let unknown = ContentType::parse("text/plain; charset=klingon").expect("parses");
        assert_matches!(unknown.encoding(), Err(ContentTypeError::UnknownCharset(_)));

        assert_eq!(ContentType::json().encoding().expect("default").name(), "UTF-8");
    }

    #[test]
    fn display_round_trip() {
        let ct = ContentType::parse("text/plain; charset=utf-8").expect("parses");
        assert_eq!(ct.to_string(), "text/plain; charset=utf-8");
    }
}
