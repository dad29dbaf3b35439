//! Structured content mode: the whole event as one JSON document.

use base64::Engine;
use serde_json::{Map, Value};
use tracing::debug;

use cloudevents_core::{
    AttributeDefinition, AttributeKind, AttributeValue, CloudEvent, ContentType, Data,
    SpecVersion, ALL_VERSIONS,
};

use crate::payload::{decode_text, effective_content_type};
use crate::JsonFormatError;

/// The media type of structured-mode output.
pub const CONTENT_TYPE: &str = "application/cloudevents+json; charset=utf-8";

fn mismatch(attribute: &str, expected: &'static str) -> JsonFormatError {
    JsonFormatError::TypeMismatch {
        attribute: attribute.to_string(),
        expected,
    }
}

fn unsupported(ct: &ContentType) -> JsonFormatError {
    JsonFormatError::UnsupportedDataType {
        content_type: ct.to_string(),
    }
}

/// Encodes a validated event as JSON Event Format bytes.
///
/// The output document is deterministic: `specversion` first, core
/// attributes in their version-declared order, extensions in insertion
/// order. Pair the bytes with [`CONTENT_TYPE`] on the wire.
pub fn encode(event: &CloudEvent) -> Result<Vec<u8>, JsonFormatError> {
    Ok(serde_json::to_vec(&encode_value(event)?)?)
}

/// Like [`encode`], but returns the JSON value for callers that embed
/// events in a larger document (batches, envelopes).
pub fn encode_value(event: &CloudEvent) -> Result<Value, JsonFormatError> {
    event.validate_for_conversion()?;

    let mut root = Map::new();
    for (def, value) in event.populated_attributes() {
        let json = match value {
            AttributeValue::Integer(n) => Value::from(*n),
            AttributeValue::Boolean(b) => Value::Bool(*b),
            AttributeValue::Opaque(v) => v.clone(),
            other => Value::String(other.to_canonical_string()),
        };
        root.insert(def.name().to_string(), json);
    }

    match event.data() {
        Data::None => {}
        Data::String(s) => {
            let ct = effective_content_type(event)?;
            if ct.is_json() || ct.is_text() {
                root.insert("data".to_string(), Value::String(s.clone()));
            } else {
                return Err(unsupported(&ct));
            }
        }
        Data::Binary(bytes) => {
            root.insert(
                "data_base64".to_string(),
                Value::String(base64::engine::general_purpose::STANDARD.encode(bytes)),
            );
        }
        Data::Json(v) => {
            let ct = effective_content_type(event)?;
            if ct.is_json() {
                root.insert("data".to_string(), v.clone());
            } else {
                return Err(unsupported(&ct));
            }
        }
    }

    Ok(Value::Object(root))
}

/// Decodes one JSON Event Format document.
///
/// `declared` is the transport-level content type of the document itself;
/// its charset (default UTF-8) governs how `bytes` become text.
pub fn decode(bytes: &[u8], declared: Option<&ContentType>) -> Result<CloudEvent, JsonFormatError> {
    debug!(len = bytes.len(), "decoding structured-mode document");
    let default_ct;
    let ct = match declared {
        Some(ct) => ct,
        None => {
            default_ct = ContentType::json();
            &default_ct
        }
    };
    let text = decode_text(bytes, ct)?;
    let doc: Value = serde_json::from_str(&text)?;
    decode_value(&doc)
}

/// Decodes an already-parsed JSON document.
pub fn decode_value(doc: &Value) -> Result<CloudEvent, JsonFormatError> {
    let root = doc.as_object().ok_or(JsonFormatError::NotACloudEvent)?;

    // Each version names its spec-version attribute differently
    // (`cloudEventsVersion` before 0.2), so probe them all.
    let (marker, id) = ALL_VERSIONS
        .iter()
        .find_map(|version| {
            let name = version.version_attribute().name();
            root.get(name).and_then(Value::as_str).map(|id| (name, id))
        })
        .ok_or(JsonFormatError::NotACloudEvent)?;
    let version = SpecVersion::from_id(id)?;

    if root.contains_key("data") && root.contains_key("data_base64") {
        return Err(JsonFormatError::ConflictingDataProperties);
    }

    let mut event = CloudEvent::new(version);
    for (key, value) in root {
        if key == marker || key == "data" || key == "data_base64" || value.is_null() {
            continue;
        }
        match version.attribute(key) {
            Some(def) => {
                let canonical = canonical_core(def, key, value)?;
                event.set_attribute_from_string(key, &canonical)?;
            }
            // Extensions are not type-checked before conversion: strings go
            // through the normal parse path, everything else is kept
            // verbatim for the producer that understands it.
            None => match value {
                Value::String(s) => event.set_attribute_from_string(key, s)?,
                other => {
                    debug!(attribute = %key, "storing untyped extension verbatim");
                    event.set_attribute(key, AttributeValue::Opaque(other.clone()))?;
                }
            },
        }
    }

    if let Some(b64) = root.get("data_base64").filter(|v| !v.is_null()) {
        let text = b64.as_str().ok_or_else(|| mismatch("data_base64", "string"))?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(text)
            .map_err(|_| JsonFormatError::InvalidBase64)?;
        event.set_data(bytes);
    } else if let Some(data) = root.get("data").filter(|v| !v.is_null()) {
        let ct = effective_content_type(&event)?;
        match data {
            Value::String(s) if ct.is_text() => event.set_data(s.as_str()),
            other => event.set_data(other.clone()),
        }
    }

    event.validate_for_conversion()?;
    Ok(event)
}

fn canonical_core(
    def: &AttributeDefinition,
    key: &str,
    value: &Value,
) -> Result<String, JsonFormatError> {
    match def.kind() {
        AttributeKind::Boolean => match value {
            Value::Bool(b) => Ok(b.to_string()),
            _ => Err(mismatch(key, "boolean")),
        },
        AttributeKind::Integer => value
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .map(|n| n.to_string())
            .ok_or_else(|| mismatch(key, "int32 number")),
        _ => match value {
            Value::String(s) => Ok(s.clone()),
            _ => Err(mismatch(key, "string")),
        },
    }
}

/// Reads a structured-mode document to its end, then decodes it.
pub fn decode_from_reader<R: std::io::Read>(
    mut reader: R,
    declared: Option<&ContentType>,
) -> Result<CloudEvent, JsonFormatError> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    decode(&buf, declared)
}

/// Async variant of [`decode_from_reader`]: suspends only while buffering
/// the stream, never inside parse or validation logic. Cancel the
/// underlying read to cancel.
pub async fn decode_from_async_reader<R>(
    mut reader: R,
    declared: Option<&ContentType>,
) -> Result<CloudEvent, JsonFormatError>
where
    R: tokio::io::AsyncRead + Unpin,
{
    use tokio::io::AsyncReadExt;

    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    decode(&buf, declared)
}
