//! Charset and content-type plumbing shared by both content modes.

use cloudevents_core::{CloudEvent, ContentType};

use crate::JsonFormatError;

/// The content type that governs payload encoding: the event's declared
/// data content type, or `application/json` when none is set.
pub fn effective_content_type(event: &CloudEvent) -> Result<ContentType, JsonFormatError> {
    Ok(event.content_type()?.unwrap_or_else(ContentType::json))
}

/// Decodes payload bytes as text in the declared charset (default UTF-8).
pub(crate) fn decode_text(bytes: &[u8], ct: &ContentType) -> Result<String, JsonFormatError> {
    let encoding = ct.encoding()?;
    let (text, _, malformed) = encoding.decode(bytes);
    if malformed {
        return Err(JsonFormatError::MalformedCharset(encoding.name().to_string()));
    }
    Ok(text.into_owned())
}

/// Encodes text as payload bytes in the declared charset (default UTF-8).
pub(crate) fn encode_text(text: &str, ct: &ContentType) -> Result<Vec<u8>, JsonFormatError> {
    let encoding = ct.encoding()?;
    let (bytes, _, _) = encoding.encode(text);
    Ok(bytes.into_owned())
}
