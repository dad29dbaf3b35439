use assert_matches::assert_matches;
use cloudevents_core::{CloudEvent, Data, EventError, SpecVersion};

fn v0_1_event() -> CloudEvent {
    let mut event = CloudEvent::new(SpecVersion::V0_1);
    event.set_attribute_from_string("eventType", "com.example.order").expect("eventType");
    event.set_attribute_from_string("eventTypeVersion", "2").expect("eventTypeVersion");
    event.set_attribute_from_string("eventID", "A234-1234").expect("eventID");
    event.set_attribute_from_string("source", "/mycontext").expect("source");
    event.set_attribute_from_string("eventTime", "2018-04-05T17:31:00Z").expect("eventTime");
    event.set_attribute_from_string("contentType", "text/xml").expect("contentType");
    event
}

#[test]
fn v0_1_to_v1_0_renames_and_drops() {
    let converted = v0_1_event()
        .into_version(SpecVersion::V1_0)
        .expect("conversion succeeds");

    assert_eq!(converted.spec_version(), SpecVersion::V1_0);
    assert_eq!(converted.attribute_string("type").as_deref(), Some("com.example.order"));
    assert_eq!(converted.attribute_string("id").as_deref(), Some("A234-1234"));
    assert_eq!(converted.attribute_string("source").as_deref(), Some("/mycontext"));
    assert_eq!(
        converted.attribute_string("time").as_deref(),
        Some("2018-04-05T17:31:00Z")
    );
    assert_eq!(converted.attribute_string("datacontenttype").as_deref(), Some("text/xml"));

    // No v1.0 equivalent exists for eventTypeVersion.
    assert!(converted.attribute("eventTypeVersion").is_none());
    assert_eq!(converted.attribute_string("specversion").as_deref(), Some("1.0"));
}

#[test]
fn round_trip_back_to_v0_1() {
    let back = v0_1_event()
        .into_version(SpecVersion::V1_0)
        .expect("forward conversion")
        .into_version(SpecVersion::V0_1)
        .expect("backward conversion");

    assert_eq!(back.attribute_string("eventType").as_deref(), Some("com.example.order"));
    assert_eq!(back.attribute_string("eventID").as_deref(), Some("A234-1234"));
    assert_eq!(back.attribute_string("contentType").as_deref(), Some("text/xml"));
}

#[test]
fn schema_attribute_follows_the_alias_chain() {
    let mut event = CloudEvent::new(SpecVersion::V0_2);
    event.set_attribute_from_string("type", "com.example.order").expect("type");
    event.set_attribute_from_string("id", "1").expect("id");
    event.set_attribute_from_string("source", "/mycontext").expect("source");
    event
        .set_attribute_from_string("schemaurl", "https://example.com/schema")
        .expect("schemaurl");

    let converted = event.into_version(SpecVersion::V1_0).expect("conversion succeeds");
    assert_eq!(
        converted.attribute_string("dataschema").as_deref(),
        Some("https://example.com/schema")
    );
}

#[test]
fn conversion_revalidates_required_attributes() {
    let mut incomplete = CloudEvent::new(SpecVersion::V0_1);
    incomplete.set_attribute_from_string("eventType", "com.example.order").expect("eventType");
    incomplete.set_attribute_from_string("eventID", "1").expect("eventID");
    // source never set; required in every version.

    assert_matches!(
        incomplete.into_version(SpecVersion::V1_0),
        Err(EventError::MissingRequiredAttribute(name)) if name == "source"
    );
}

#[test]
fn conversion_preserves_data() {
    let mut event = v0_1_event();
    event.set_data("payload");

    let converted = event.into_version(SpecVersion::V0_2).expect("conversion succeeds");
    assert_eq!(converted.data(), &Data::String("payload".to_string()));
}
