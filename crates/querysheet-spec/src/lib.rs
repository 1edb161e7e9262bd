//! Report manifest: the YAML document that tells querysheet which queries to
//! run, against which connections, and where each result lands.

pub mod manifest;
pub mod validation;

pub use manifest::{
    CURRENT_SPEC_VERSION, Connection, QuerySpec, ReportManifest, ReportMeta, SPEC_IDENT, SpecVersion,
};
pub use querysheet_common::{Edge, PlacementRange};
pub use validation::{ManifestIssue, ValidationError};
