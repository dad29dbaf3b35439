use assert_matches::assert_matches;
use serde_json::json;

use cloudevents_core::{CloudEvent, Data};
use cloudevents_json::{binary, JsonFormatError};

fn event_with_content_type(ct: Option<&str>) -> CloudEvent {
    let mut event = CloudEvent::v1();
    event.set_id("1").expect("id sets");
    event.set_type("com.example.test").expect("type sets");
    event.set_source("/src").expect("source sets");
    if let Some(ct) = ct {
        event.set_data_content_type(ct).expect("content type sets");
    }
    event
}

#[test]
fn opaque_payload_round_trips_byte_identical() {
    let payload = vec![0u8, 255, 17, 204, 128];
    let mut event = event_with_content_type(Some("application/octet-stream"));
    event.set_data(payload.clone());

    let body = binary::encode_data(&event).expect("payload encodes");
    assert_eq!(body, payload);

    let mut received = event_with_content_type(Some("application/octet-stream"));
    binary::decode_data(&mut received, &body).expect("payload decodes");
    assert_eq!(received.data(), &Data::Binary(payload));
}

#[test]
fn text_payload_honors_declared_charset() {
    let mut event = event_with_content_type(Some("text/plain; charset=iso-8859-1"));
    event.set_data("café");

    let body = binary::encode_data(&event).expect("payload encodes");
    // latin-1: é is a single byte.
    assert_eq!(body, b"caf\xe9");

    let mut received = event_with_content_type(Some("text/plain; charset=iso-8859-1"));
    binary::decode_data(&mut received, &body).expect("payload decodes");
    assert_eq!(received.data(), &Data::String("café".to_string()));
}

#[test]
fn json_payload_is_parsed() {
    let mut event = event_with_content_type(None);
    binary::decode_data(&mut event, br#"{"temperature": 21.5}"#).expect("payload decodes");
    assert_eq!(event.data(), &Data::Json(json!({"temperature": 21.5})));
}

#[test]
fn empty_json_payload_means_no_data() {
    let mut event = event_with_content_type(Some("application/json"));
    event.set_data(json!({"stale": true}));
    binary::decode_data(&mut event, b"").expect("empty payload decodes");
    assert!(event.data().is_none());
}

#[test]
fn json_data_encodes_as_json_text() {
    let mut event = event_with_content_type(None);
    event.set_data(json!({"n": 1}));
    let body = binary::encode_data(&event).expect("payload encodes");
    assert_eq!(body, br#"{"n":1}"#.to_vec());
}

#[test]
fn string_data_with_json_content_type_encodes_as_json_string() {
    let mut event = event_with_content_type(Some("application/json"));
    event.set_data("hello");
    let body = binary::encode_data(&event).expect("payload encodes");
    assert_eq!(body, br#""hello""#.to_vec());
}

#[test]
fn structured_data_with_text_content_type_has_no_rule() {
    let mut event = event_with_content_type(Some("text/plain"));
    event.set_data(json!([1, 2, 3]));
    assert_matches!(
        binary::encode_data(&event),
        Err(JsonFormatError::UnsupportedDataType { .. })
    );
}

#[test]
fn malformed_json_payload_propagates_the_parse_error() {
    let mut event = event_with_content_type(Some("application/json"));
    assert_matches!(
        binary::decode_data(&mut event, b"{not json"),
        Err(JsonFormatError::Json(_))
    );
}

#[test]
fn unknown_payload_types_pass_through_as_bytes() {
    let mut event = event_with_content_type(Some("image/png"));
    binary::decode_data(&mut event, &[1, 2, 3]).expect("payload decodes");
    assert_eq!(event.data(), &Data::Binary(vec![1, 2, 3]));
}
