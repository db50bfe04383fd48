//! Compliance artifact generation

pub mod document;
pub mod fingerprint;
pub mod generator;

pub use document::{ComplianceDocument, MEDIA_TYPE, SCHEMA_VERSION};
pub use generator::{ArtifactGenerator, ExportArtifact};
