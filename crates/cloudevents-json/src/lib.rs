//! JSON Event Format codec for CloudEvents.
//!
//! Two content modes over the model in `cloudevents-core`:
//!
//! - [`structured`]: the whole event as a single JSON document, with
//!   `specversion` first and one of `data`/`data_base64` for the payload.
//! - [`binary`]: only the payload, interpreted through the event's
//!   effective data content type; attributes travel as transport headers
//!   produced by the binding layer from
//!   [`CloudEvent::populated_attributes`](cloudevents_core::CloudEvent::populated_attributes).
//!
//! Everything is a synchronous pure transformation; the async entry points
//! suspend only while buffering the input stream.

use thiserror::Error;

use cloudevents_core::{AttributeError, ContentTypeError, EventError, SpecVersionError};

pub mod binary;
mod payload;
pub mod structured;

pub use payload::effective_content_type;

#[derive(Debug, Error)]
pub enum JsonFormatError {
    /// The document has no spec-version marker at all.
    #[error("not a CloudEvent: no spec version property found")]
    NotACloudEvent,
    /// A core attribute's JSON value has the wrong token type.
    #[error("attribute '{attribute}' expects a {expected} JSON value")]
    TypeMismatch {
        attribute: String,
        expected: &'static str,
    },
    #[error("'data' and 'data_base64' are mutually exclusive")]
    ConflictingDataProperties,
    #[error("no encoding rule for content type '{content_type}' and the event's data shape")]
    UnsupportedDataType { content_type: String },
    #[error("invalid base64 in 'data_base64'")]
    InvalidBase64,
    #[error("payload bytes are malformed for charset '{0}'")]
    MalformedCharset(String),
    #[error(transparent)]
    Version(#[from] SpecVersionError),
    #[error(transparent)]
    Event(#[from] EventError),
    #[error(transparent)]
    Attribute(#[from] AttributeError),
    #[error(transparent)]
    ContentType(#[from] ContentTypeError),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
