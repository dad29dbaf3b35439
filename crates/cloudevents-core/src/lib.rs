//! CloudEvents attribute model.
//!
//! The pieces, leaves first: [`specversion`] enumerates the supported spec
//! versions and their attribute tables; [`attribute`] is the seven-kind
//! attribute type system; [`content_type`] parses the data-content-type
//! attribute; [`event`] is the mutable [`CloudEvent`] aggregate that ties
//! them together. Wire formats live in sibling codec crates.

pub mod attribute;
pub mod content_type;
pub mod event;
pub mod specversion;

pub use attribute::{AttributeDefinition, AttributeError, AttributeKind, AttributeValue};
pub use content_type::{ContentType, ContentTypeError};
pub use event::{CloudEvent, Data, EventError};
pub use specversion::{CoreAttribute, SpecVersion, SpecVersionError, ALL_VERSIONS};

/// Returns the crate version at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
