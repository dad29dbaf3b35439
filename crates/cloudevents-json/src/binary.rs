//! Binary content mode: payload bytes only.
//!
//! In binary mode the context attributes travel as transport headers, which
//! the binding layer renders from `populated_attributes()`. This module
//! handles just the payload, interpreted through the event's effective data
//! content type.

use serde_json::Value;
use tracing::debug;

use cloudevents_core::{CloudEvent, Data};

use crate::payload::{decode_text, effective_content_type, encode_text};
use crate::JsonFormatError;

/// Renders the event's payload as raw body bytes.
///
/// JSON media types serialize the data as a JSON document in the declared
/// charset; `text/*` writes string data in the declared charset; binary
/// data passes through unchanged. An event without data yields an empty
/// body.
pub fn encode_data(event: &CloudEvent) -> Result<Vec<u8>, JsonFormatError> {
    event.validate_for_conversion()?;
    let ct = effective_content_type(event)?;

    match event.data() {
        Data::None => Ok(Vec::new()),
        Data::Binary(bytes) => Ok(bytes.clone()),
        Data::String(s) if ct.is_text() => encode_text(s, &ct),
        Data::String(s) if ct.is_json() => {
            let text = serde_json::to_string(s)?;
            encode_text(&text, &ct)
        }
        Data::Json(v) if ct.is_json() => {
            // JSON mandates Unicode, but a declared exotic charset is
            // honored rather than rejected.
            let text = serde_json::to_string(v)?;
            encode_text(&text, &ct)
        }
        _ => Err(JsonFormatError::UnsupportedDataType {
            content_type: ct.to_string(),
        }),
    }
}

/// Stores raw body bytes into an event whose attributes were already set
/// from transport headers.
///
/// JSON media types parse the body (an empty body means no data); `text/*`
/// decodes it in the declared charset; anything else is kept as raw bytes.
/// Parse failures propagate as the underlying error.
pub fn decode_data(event: &mut CloudEvent, payload: &[u8]) -> Result<(), JsonFormatError> {
    let ct = effective_content_type(event)?;
    debug!(len = payload.len(), content_type = %ct, "decoding binary-mode payload");

    if ct.is_json() {
        if payload.is_empty() {
            event.set_data(Data::None);
            return Ok(());
        }
        let text = decode_text(payload, &ct)?;
        let value: Value = serde_json::from_str(&text)?;
        event.set_data(value);
    } else if ct.is_text() {
        event.set_data(decode_text(payload, &ct)?);
    } else {
        event.set_data(payload.to_vec());
    }
    Ok(())
}
