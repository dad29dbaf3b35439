//! Registry of supported CloudEvents spec versions.
//!
//! Each version owns a static, ordered table of its context attribute
//! definitions, with the spec-version attribute always first. The tables are
//! process-wide read-only data and safe for unsynchronized concurrent reads.

use thiserror::Error;

use crate::attribute::{AttributeDefinition, AttributeKind};

#[derive(Debug, Error)]
pub enum SpecVersionError {
    #[error("unsupported CloudEvents spec version '{0}'")]
    UnsupportedVersion(String),
}

/// A supported CloudEvents specification version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecVersion {
    V0_1,
    V0_2,
    V1_0,
}

/// All supported versions, oldest first.
pub const ALL_VERSIONS: [SpecVersion; 3] =
    [SpecVersion::V0_1, SpecVersion::V0_2, SpecVersion::V1_0];

/// Version-independent identity of a core attribute, used for renames when
/// converting an event between spec versions.
///
/// v0.1's `eventTypeVersion` and v1.0's `subject` have no identity here:
/// they exist in exactly one version and drop on conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreAttribute {
    Version,
    Type,
    Source,
    Id,
    Time,
    Schema,
    ContentType,
}

const V0_1_ATTRIBUTES: &[AttributeDefinition] = &[
    AttributeDefinition::version("cloudEventsVersion"),
    AttributeDefinition::core("eventType", AttributeKind::String, true),
    AttributeDefinition::core("eventTypeVersion", AttributeKind::String, false),
    AttributeDefinition::core("source", AttributeKind::UriRef, true),
    AttributeDefinition::core("eventID", AttributeKind::String, true),
    AttributeDefinition::core("eventTime", AttributeKind::Timestamp, false),
    AttributeDefinition::core("schemaURL", AttributeKind::UriRef, false),
    AttributeDefinition::content_type("contentType"),
];

const V0_2_ATTRIBUTES: &[AttributeDefinition] = &[
    AttributeDefinition::version("specversion"),
    AttributeDefinition::core("type", AttributeKind::String, true),
    AttributeDefinition::core("source", AttributeKind::UriRef, true),
    AttributeDefinition::core("id", AttributeKind::String, true),
    AttributeDefinition::core("time", AttributeKind::Timestamp, false),
    AttributeDefinition::core("schemaurl", AttributeKind::UriRef, false),
    AttributeDefinition::content_type("contenttype"),
];

const V1_0_ATTRIBUTES: &[AttributeDefinition] = &[
    AttributeDefinition::version("specversion"),
    AttributeDefinition::core("type", AttributeKind::String, true),
    AttributeDefinition::core("source", AttributeKind::UriRef, true),
    AttributeDefinition::core("id", AttributeKind::String, true),
    AttributeDefinition::content_type("datacontenttype"),
    AttributeDefinition::core("dataschema", AttributeKind::Uri, false),
    AttributeDefinition::core("subject", AttributeKind::String, false),
    AttributeDefinition::core("time", AttributeKind::Timestamp, false),
];

impl SpecVersion {
    /// The wire identifier of this version.
    pub fn id(self) -> &'static str {
        match self {
            SpecVersion::V0_1 => "0.1",
            SpecVersion::V0_2 => "0.2",
            SpecVersion::V1_0 => "1.0",
        }
    }

    /// Looks a version up by its wire identifier.
    pub fn from_id(id: &str) -> Result<Self, SpecVersionError> {
        match id {
            "0.1" => Ok(SpecVersion::V0_1),
            "0.2" => Ok(SpecVersion::V0_2),
            "1.0" => Ok(SpecVersion::V1_0),
            other => Err(SpecVersionError::UnsupportedVersion(other.to_string())),
        }
    }

    /// The ordered attribute table of this version, spec-version attribute
    /// first. This ordering drives deterministic structured-mode encoding.
    pub fn attributes(self) -> &'static [AttributeDefinition] {
        match self {
            SpecVersion::V0_1 => V0_1_ATTRIBUTES,
            SpecVersion::V0_2 => V0_2_ATTRIBUTES,
            SpecVersion::V1_0 => V1_0_ATTRIBUTES,
        }
    }

    /// Case-sensitive lookup of a core attribute definition by name.
    pub fn attribute(self, name: &str) -> Option<&'static AttributeDefinition> {
        self.attributes().iter().find(|def| def.name() == name)
    }

    /// The spec-version attribute of this version.
    pub fn version_attribute(self) -> &'static AttributeDefinition {
        // First table entry by construction.
        &self.attributes()[0]
    }

    /// The data-content-type attribute of this version.
    pub fn content_type_attribute(self) -> &'static AttributeDefinition {
        self.attributes()
            .iter()
            .find(|def| def.is_content_type())
            .expect("every version declares a content-type attribute")
    }

    /// Maps one of this version's core attribute names to its
    /// version-independent identity.
    pub fn core_attribute(self, name: &str) -> Option<CoreAttribute> {
        let key = match (self, name) {
            (_, "source") => CoreAttribute::Source,
            (SpecVersion::V0_1, "cloudEventsVersion") => CoreAttribute::Version,
            (SpecVersion::V0_1, "eventType") => CoreAttribute::Type,
            (SpecVersion::V0_1, "eventID") => CoreAttribute::Id,
            (SpecVersion::V0_1, "eventTime") => CoreAttribute::Time,
            (SpecVersion::V0_1, "schemaURL") => CoreAttribute::Schema,
            (SpecVersion::V0_1, "contentType") => CoreAttribute::ContentType,
            (SpecVersion::V0_2 | SpecVersion::V1_0, "specversion") => CoreAttribute::Version,
            (SpecVersion::V0_2 | SpecVersion::V1_0, "type") => CoreAttribute::Type,
            (SpecVersion::V0_2 | SpecVersion::V1_0, "id") => CoreAttribute::Id,
            (SpecVersion::V0_2 | SpecVersion::V1_0, "time") => CoreAttribute::Time,
            (SpecVersion::V0_2, "schemaurl") => CoreAttribute::Schema,
            (SpecVersion::V0_2, "contenttype") => CoreAttribute::ContentType,
            (SpecVersion::V1_0, "dataschema") => CoreAttribute::Schema,
            (SpecVersion::V1_0, "datacontenttype") => CoreAttribute::ContentType,
            _ => return None,
        };
        Some(key)
    }

    /// The name this version gives to a version-independent core attribute.
    pub fn attribute_name(self, key: CoreAttribute) -> &'static str {
        match (self, key) {
            (_, CoreAttribute::Source) => "source",
            (SpecVersion::V0_1, CoreAttribute::Version) => "cloudEventsVersion",
            (SpecVersion::V0_1, CoreAttribute::Type) => "eventType",
            (SpecVersion::V0_1, CoreAttribute::Id) => "eventID",
            (SpecVersion::V0_1, CoreAttribute::Time) => "eventTime",
            (SpecVersion::V0_1, CoreAttribute::Schema) => "schemaURL",
            (SpecVersion::V0_1, CoreAttribute::ContentType) => "contentType",
            (SpecVersion::V0_2 | SpecVersion::V1_0, CoreAttribute::Version) => "specversion",
            (SpecVersion::V0_2 | SpecVersion::V1_0, CoreAttribute::Type) => "type",
            (SpecVersion::V0_2 | SpecVersion::V1_0, CoreAttribute::Id) => "id",
            (SpecVersion::V0_2 | SpecVersion::V1_0, CoreAttribute::Time) => "time",
            (SpecVersion::V0_2, CoreAttribute::Schema) => "schemaurl",
            (SpecVersion::V0_2, CoreAttribute::ContentType) => "contenttype",
            (SpecVersion::V1_0, CoreAttribute::Schema) => "dataschema",
            (SpecVersion::V1_0, CoreAttribute::ContentType) => "datacontenttype",
        }
    }

    /// The historical rename of `name` when moving to `target`, if any.
    pub fn rename_to(self, name: &str, target: SpecVersion) -> Option<&'static str> {
        self.core_attribute(name)
            .map(|key| target.attribute_name(key))
    }
}
