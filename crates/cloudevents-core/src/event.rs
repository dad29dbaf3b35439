//! The mutable CloudEvent aggregate.
//!
//! An event is a spec version, an insertion-ordered map of typed context
//! attributes, and an optional payload. Setters validate and normalize each
//! value against its declared kind; `validate_for_conversion` is the gate a
//! codec runs before producing any wire representation.
//!
//! Instances are single-owner mutable: share one across tasks only after
//! treating it as immutable (e.g. past `validate_for_conversion`).

use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

use crate::attribute::{AttributeDefinition, AttributeError, AttributeKind, AttributeValue};
use crate::content_type::{ContentType, ContentTypeError};
use crate::specversion::{CoreAttribute, SpecVersion, SpecVersionError};

#[derive(Debug, Error)]
pub enum EventError {
    #[error("unknown attribute '{0}'")]
    UnknownAttribute(String),
    #[error("missing required attribute '{0}'")]
    MissingRequiredAttribute(String),
    #[error("attribute '{name}' expects a {expected} value")]
    TypeMismatch {
        name: String,
        expected: AttributeKind,
    },
    #[error("the spec version attribute '{0}' is not settable")]
    ReadOnlyAttribute(String),
    #[error("extension '{0}' collides with a core attribute name")]
    ExtensionNameCollision(String),
    #[error(transparent)]
    Attribute(#[from] AttributeError),
    #[error(transparent)]
    Version(#[from] SpecVersionError),
    #[error(transparent)]
    ContentType(#[from] ContentTypeError),
}

/// The runtime shape of an event payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Data {
    #[default]
    None,
    String(String),
    Binary(Vec<u8>),
    /// A parsed JSON value held for later strongly-typed deserialization.
    Json(Value),
}

impl Data {
    pub fn is_none(&self) -> bool {
        matches!(self, Data::None)
    }
}

impl From<String> for Data {
    fn from(s: String) -> Self {
        Data::String(s)
    }
}

impl From<&str> for Data {
    fn from(s: &str) -> Self {
        Data::String(s.to_string())
    }
}

impl From<Vec<u8>> for Data {
    fn from(bytes: Vec<u8>) -> Self {
        Data::Binary(bytes)
    }
}

impl From<Value> for Data {
    fn from(v: Value) -> Self {
        Data::Json(v)
    }
}

/// A CloudEvent: spec version, context attributes, payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudEvent {
    version: SpecVersion,
    version_value: AttributeValue,
    attributes: IndexMap<String, AttributeValue>,
    extensions: IndexMap<String, AttributeDefinition>,
    data: Data,
}

impl CloudEvent {
    pub fn new(version: SpecVersion) -> Self {
        Self {
            version,
            version_value: AttributeValue::String(version.id().to_string()),
            attributes: IndexMap::new(),
            extensions: IndexMap::new(),
            data: Data::None,
        }
    }

    /// Shorthand for a CloudEvents 1.0 event.
    pub fn v1() -> Self {
        Self::new(SpecVersion::V1_0)
    }

    pub fn spec_version(&self) -> SpecVersion {
        self.version
    }

    /// Declares an extension attribute with an explicit kind.
    ///
    /// Undeclared extensions are still accepted by the setters and default
    /// to the String kind.
    pub fn declare_extension(
        &mut self,
        name: impl Into<String>,
        kind: AttributeKind,
    ) -> Result<(), EventError> {
        let name = name.into();
        if self.version.attribute(&name).is_some() {
            return Err(EventError::ExtensionNameCollision(name));
        }
        let def = AttributeDefinition::extension(name.clone(), kind);
        self.extensions.insert(name, def);
        Ok(())
    }

    /// The declaration governing `name`: core table first, then declared
    /// extensions.
    pub fn definition(&self, name: &str) -> Option<&AttributeDefinition> {
        self.version.attribute(name).or_else(|| self.extensions.get(name))
    }

    /// Parses and stores an attribute from its canonical string form.
    ///
    /// Unknown attributes are stored as String-kinded extensions: the
    /// fail-valid policy that keeps forward compatibility with extensions
    /// this process has never heard of.
    pub fn set_attribute_from_string(
        &mut self,
        name: &str,
        raw: &str,
    ) -> Result<(), EventError> {
        self.set_from_string(name, raw, false)
    }

    /// Like [`Self::set_attribute_from_string`] but fails with
    /// `UnknownAttribute` instead of applying the fail-valid policy.
    pub fn set_attribute_from_string_strict(
        &mut self,
        name: &str,
        raw: &str,
    ) -> Result<(), EventError> {
        self.set_from_string(name, raw, true)
    }

    fn set_from_string(&mut self, name: &str, raw: &str, strict: bool) -> Result<(), EventError> {
        if name == self.version.version_attribute().name() {
            return Err(EventError::ReadOnlyAttribute(name.to_string()));
        }
        let kind = match self.definition(name) {
            Some(def) => def.kind(),
            None if strict => return Err(EventError::UnknownAttribute(name.to_string())),
            None => {
                self.extensions.insert(
                    name.to_string(),
                    AttributeDefinition::extension(name, AttributeKind::String),
                );
                AttributeKind::String
            }
        };
        let value = kind.parse(name, raw)?;
        self.attributes.insert(name.to_string(), value);
        Ok(())
    }

    /// Stores an already-typed attribute value, checking it against the
    /// attribute's declared kind.
    ///
    /// `Opaque` values are only accepted for extension attributes.
    pub fn set_attribute(
        &mut self,
        name: &str,
        value: AttributeValue,
    ) -> Result<(), EventError> {
        if name == self.version.version_attribute().name() {
            return Err(EventError::ReadOnlyAttribute(name.to_string()));
        }
        match self.definition(name) {
            Some(def) => match value.kind() {
                Some(kind) if kind == def.kind() => {}
                None if self.version.attribute(name).is_none() => {}
                _ => {
                    return Err(EventError::TypeMismatch {
                        name: name.to_string(),
                        expected: def.kind(),
                    })
                }
            },
            None => {
                let kind = value.kind().unwrap_or(AttributeKind::String);
                self.extensions.insert(
                    name.to_string(),
                    AttributeDefinition::extension(name, kind),
                );
            }
        }
        self.attributes.insert(name.to_string(), value);
        Ok(())
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        if name == self.version.version_attribute().name() {
            return Some(&self.version_value);
        }
        self.attributes.get(name)
    }

    /// The canonical string form of an attribute, if set.
    pub fn attribute_string(&self, name: &str) -> Option<String> {
        self.attribute(name).map(AttributeValue::to_canonical_string)
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<AttributeValue> {
        self.attributes.shift_remove(name)
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn set_data(&mut self, data: impl Into<Data>) {
        self.data = data.into();
    }

    pub fn take_data(&mut self) -> Data {
        std::mem::take(&mut self.data)
    }

    /// Parses the event's data-content-type attribute, when set.
    pub fn content_type(&self) -> Result<Option<ContentType>, EventError> {
        let name = self.version.content_type_attribute().name();
        match self.attribute_string(name) {
            Some(raw) => Ok(Some(ContentType::parse(&raw)?)),
            None => Ok(None),
        }
    }

    /// Every populated attribute in encoding order: the spec-version
    /// attribute first, then core attributes in their version-declared
    /// order, then extensions in insertion order. Absent optionals are
    /// skipped.
    ///
    /// Transport bindings consume this to emit headers; the structured-mode
    /// encoder consumes it for deterministic output.
    pub fn populated_attributes(
        &self,
    ) -> impl Iterator<Item = (AttributeDefinition, &AttributeValue)> {
        let head = std::iter::once((self.version.version_attribute().clone(), &self.version_value));
        let core = self
            .version
            .attributes()
            .iter()
            .filter(|def| !def.is_version())
            .filter_map(|def| self.attributes.get(def.name()).map(|v| (def.clone(), v)));
        let extensions = self
            .attributes
            .iter()
            .filter(|(name, _)| self.version.attribute(name).is_none())
            .map(|(name, value)| (self.extension_definition(name), value));
        head.chain(core).chain(extensions)
    }

    fn extension_definition(&self, name: &str) -> AttributeDefinition {
        self.extensions
            .get(name)
            .cloned()
            .unwrap_or_else(|| AttributeDefinition::extension(name, AttributeKind::String))
    }

    /// Checks that every attribute required by the active spec version is
    /// present. Returns the event unchanged so codecs can use it as a
    /// fluent gate.
    pub fn validate_for_conversion(&self) -> Result<&Self, EventError> {
        for def in self.version.attributes() {
            if def.is_version() || !def.is_required() {
                continue;
            }
            if !self.attributes.contains_key(def.name()) {
                return Err(EventError::MissingRequiredAttribute(def.name().to_string()));
            }
        }
        Ok(self)
    }

    /// Converts the event to another spec version.
    ///
    /// Core attributes keep their name when the target declares it and are
    /// renamed per the historical alias table otherwise; attributes with no
    /// equivalent in the target are dropped. The result is re-validated, so
    /// converting an incomplete event fails with
    /// `MissingRequiredAttribute`.
    pub fn into_version(self, target: SpecVersion) -> Result<CloudEvent, EventError> {
        if target == self.version {
            return Ok(self);
        }
        let mut converted = CloudEvent::new(target);
        for (def, value) in self.populated_attributes() {
            if def.is_version() {
                continue;
            }
            let target_name = if self.version.attribute(def.name()).is_none() {
                // Extensions have no entry in any version's table.
                continue;
            } else if target.attribute(def.name()).is_some() {
                def.name()
            } else {
                match self.version.rename_to(def.name(), target) {
                    Some(name) => name,
                    None => continue,
                }
            };
            // Re-parse through the canonical form: the target may declare a
            // different kind for the same slot (schemaurl is a
            // URI-Reference, dataschema a URI).
            converted.set_attribute_from_string(target_name, &value.to_canonical_string())?;
        }
        converted.data = self.data;
        converted.validate_for_conversion()?;
        Ok(converted)
    }

    // Typed convenience setters, resolved through the version-independent
    // attribute identities so they work on any spec version.

    pub fn set_id(&mut self, id: impl Into<String>) -> Result<(), EventError> {
        let name = self.version.attribute_name(CoreAttribute::Id);
        self.set_attribute(name, AttributeValue::String(id.into()))
    }

    pub fn set_type(&mut self, ty: impl Into<String>) -> Result<(), EventError> {
        let name = self.version.attribute_name(CoreAttribute::Type);
        self.set_attribute(name, AttributeValue::String(ty.into()))
    }

    pub fn set_source(&mut self, source: &str) -> Result<(), EventError> {
        self.set_attribute_from_string("source", source)
    }

    pub fn set_time(&mut self, time: chrono::DateTime<chrono::FixedOffset>) -> Result<(), EventError> {
        let name = self.version.attribute_name(CoreAttribute::Time);
        self.set_attribute(name, AttributeValue::Timestamp(time))
    }

    pub fn set_data_content_type(&mut self, raw: &str) -> Result<(), EventError> {
        // Validate eagerly so a malformed media type fails at set time.
        ContentType::parse(raw)?;
        let name = self.version.attribute_name(CoreAttribute::ContentType);
        self.set_attribute(name, AttributeValue::String(raw.to_string()))
    }

    pub fn set_data_schema(&mut self, raw: &str) -> Result<(), EventError> {
        let name = self.version.attribute_name(CoreAttribute::Schema);
        self.set_attribute_from_string(name, raw)
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) -> Result<(), EventError> {
        self.set_attribute("subject", AttributeValue::String(subject.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn minimal_v1() -> CloudEvent {
        let mut event = CloudEvent::v1();
        event.set_id("42").expect("id sets");
        event.set_type("com.example.test").expect("type sets");
        event.set_source("/source").expect("source sets");
        event
    }

    #[test]
    fn spec_version_attribute_is_read_only() {
        let mut event = CloudEvent::v1();
        assert_matches!(
            event.set_attribute_from_string("specversion", "0.2"),
            Err(EventError::ReadOnlyAttribute(_))
        );
        assert_eq!(event.attribute_string("specversion").as_deref(), Some("1.0"));
    }

    #[test]
    fn unknown_attribute_fails_valid_by_default() {
        let mut event = minimal_v1();
        event
            .set_attribute_from_string("comexampleext", "payload")
            .expect("fail-valid stores unknown extensions");
        assert_eq!(
            event.attribute("comexampleext"),
            Some(&AttributeValue::String("payload".to_string()))
        );

        assert_matches!(
            event.set_attribute_from_string_strict("otherext", "x"),
            Err(EventError::UnknownAttribute(name)) if name == "otherext"
        );
    }

    #[test]
    fn declared_extensions_enforce_their_kind() {
        let mut event = minimal_v1();
        event
            .declare_extension("sequence", AttributeKind::Integer)
            .expect("extension declares");
        event
            .set_attribute_from_string("sequence", "12")
            .expect("integer extension parses");
        assert_eq!(event.attribute("sequence"), Some(&AttributeValue::Integer(12)));

        assert_matches!(
            event.set_attribute_from_string("sequence", "twelve"),
            Err(EventError::Attribute(AttributeError::InvalidFormat { .. }))
        );
    }

    #[test]
    fn extension_cannot_shadow_core_attribute() {
        let mut event = CloudEvent::v1();
        assert_matches!(
            event.declare_extension("type", AttributeKind::String),
            Err(EventError::ExtensionNameCollision(_))
        );
    }

    #[test]
    fn typed_set_checks_kind() {
        let mut event = CloudEvent::v1();
        assert_matches!(
            event.set_attribute("time", AttributeValue::String("not a time".to_string())),
            Err(EventError::TypeMismatch { expected: AttributeKind::Timestamp, .. })
        );
    }

    #[test]
    fn populated_attributes_ordering() {
        let mut event = minimal_v1();
        // Insertion order: b before a, deliberately not alphabetical.
        event.set_attribute_from_string("b", "1").expect("ext b");
        event.set_attribute_from_string("a", "2").expect("ext a");
        event.set_subject("orders/42").expect("subject sets");

        let names: Vec<String> = event
            .populated_attributes()
            .map(|(def, _)| def.name().to_string())
            .collect();
        assert_eq!(
            names,
            ["specversion", "type", "source", "id", "subject", "b", "a"]
        );
    }

    #[test]
    fn validate_reports_first_missing_required() {
        let mut event = CloudEvent::v1();
        event.set_id("1").expect("id sets");
        assert_matches!(
            event.validate_for_conversion(),
            Err(EventError::MissingRequiredAttribute(name)) if name == "type"
        );
    }

    #[test]
    fn content_type_parses_from_attribute() {
        let mut event = minimal_v1();
        assert!(event.content_type().expect("no attribute is fine").is_none());
        event.set_data_content_type("text/plain; charset=utf-8").expect("ct sets");
        let ct = event.content_type().expect("parses").expect("present");
        assert!(ct.is_text());
    }
}
