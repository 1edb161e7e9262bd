use std::collections::HashSet;
use std::fmt;

use querysheet_common::{Edge, PlacementRange};
use regex::Regex;
use semver::Version;
use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::validation::{ManifestIssue, ValidationError};

/// Current supported report manifest version.
pub const CURRENT_SPEC_VERSION: &str = "0.1.0";
/// Constant identifier for this manifest format.
pub const SPEC_IDENT: &str = "qsr";

/// A report: named connections plus the queries rendered into a workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportManifest {
    /// Must be `qsr`.
    pub spec: String,
    pub spec_version: SpecVersion,
    pub report: ReportMeta,
    #[serde(default)]
    pub connections: Vec<Connection>,
    /// Rendered in order.
    pub queries: Vec<QuerySpec>,
}

impl ReportManifest {
    pub fn from_yaml_reader<R: std::io::Read>(reader: R) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_reader(reader)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn connection(&self, name: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.name == name)
    }

    /// Validate the manifest and return every issue found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.spec != SPEC_IDENT {
            issues.push(ManifestIssue::new(
                "spec",
                format!(
                    "expected spec identifier `{}`, found `{}`",
                    SPEC_IDENT, self.spec
                ),
            ));
        }

        let current_version = Version::parse(CURRENT_SPEC_VERSION)
            .expect("CURRENT_SPEC_VERSION must be valid semver");
        if self.spec_version.0.major != current_version.major {
            issues.push(ManifestIssue::new(
                "spec_version",
                format!(
                    "incompatible major version `{}` (expected `{}`)",
                    self.spec_version.0, current_version.major
                ),
            ));
        }

        let report_id_pattern = Regex::new(r"^[a-z0-9][a-z0-9-]{1,62}[a-z0-9]$")
            .expect("report id regex must compile");
        if !report_id_pattern.is_match(&self.report.id) {
            issues.push(ManifestIssue::new(
                "report.id",
                "id must be lowercase alphanumeric with hyphens, 3-64 chars",
            ));
        }

        let mut seen_connections = HashSet::new();
        for (idx, conn) in self.connections.iter().enumerate() {
            if conn.name.trim().is_empty() {
                issues.push(ManifestIssue::new(
                    format!("connections[{idx}].name"),
                    "connection name must not be empty",
                ));
            } else if !seen_connections.insert(conn.name.as_str()) {
                issues.push(ManifestIssue::new(
                    format!("connections[{idx}].name"),
                    format!("duplicate connection name `{}`", conn.name),
                ));
            }
            if conn.driver.trim().is_empty() {
                issues.push(ManifestIssue::new(
                    format!("connections[{idx}].driver"),
                    "driver must not be empty",
                ));
            }
        }

        if self.queries.is_empty() {
            issues.push(ManifestIssue::new(
                "queries",
                "report must define at least one query",
            ));
        }

        let query_id_pattern =
            Regex::new(r"^[a-z0-9]+([_-][a-z0-9]+)*$").expect("query id regex must compile");
        let mut seen_queries = HashSet::new();
        for (idx, query) in self.queries.iter().enumerate() {
            let path = format!("queries[{idx}].id");
            if !query_id_pattern.is_match(&query.id) {
                issues.push(ManifestIssue::new(
                    &path,
                    "query id must contain lowercase alphanumeric characters optionally separated by '-' or '_'",
                ));
            }
            if !seen_queries.insert(query.id.as_str()) {
                issues.push(ManifestIssue::new(
                    &path,
                    format!("duplicate query id `{}`", query.id),
                ));
            }

            if self.connection(&query.connection).is_none() {
                issues.push(ManifestIssue::new(
                    format!("queries[{idx}].connection"),
                    format!("unknown connection `{}`", query.connection),
                ));
            }
            if query.sql.trim().is_empty() {
                issues.push(ManifestIssue::new(
                    format!("queries[{idx}].sql"),
                    "sql must not be empty",
                ));
            }
            if query.sheet.trim().is_empty() {
                issues.push(ManifestIssue::new(
                    format!("queries[{idx}].sheet"),
                    "sheet must not be empty",
                ));
            }

            check_range(idx, &query.range, &mut issues);
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(issues))
        }
    }
}

// Only the shape is checked here; fitting the result happens at render time.
fn check_range(idx: usize, range: &PlacementRange, issues: &mut Vec<ManifestIssue>) {
    if range.open_edges() == 2 {
        issues.push(ManifestIssue::new(
            format!("queries[{idx}].range"),
            "at most one of x2 and y2 may be open",
        ));
    }
    if let Edge::At(x2) = range.x2
        && x2 <= range.x1
    {
        issues.push(ManifestIssue::new(
            format!("queries[{idx}].range.x2"),
            format!("x2 ({x2}) must be greater than x1 ({})", range.x1),
        ));
    }
    if let Edge::At(y2) = range.y2
        && y2 <= range.y1
    {
        issues.push(ManifestIssue::new(
            format!("queries[{idx}].range.y2"),
            format!("y2 ({y2}) must be greater than y1 ({})", range.y1),
        ));
    }
}

impl std::str::FromStr for ReportManifest {
    type Err = serde_yaml::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportManifest::from_yaml_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportMeta {
    /// Lowercase, hyphenated, 3-64 chars.
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A named database connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Connection {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Driver name as registered with the engine, e.g. `sqlite` or `postgres`.
    pub driver: String,
    /// Passed verbatim to the driver.
    pub connection_string: String,
}

/// One query and the place its result is written to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuerySpec {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Name of an entry in `connections`.
    pub connection: String,
    pub sql: String,
    /// Created in the workbook when missing.
    pub sheet: String,
    pub range: PlacementRange,
}

/// Wrapper around semver::Version for serde compatibility.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpecVersion(pub Version);

impl SpecVersion {
    pub fn new(version: Version) -> Self {
        Self(version)
    }
}

impl Serialize for SpecVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for SpecVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct VersionVisitor;

        impl Visitor<'_> for VersionVisitor {
            type Value = SpecVersion;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("semantic version string (e.g. 0.1.0)")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Version::parse(v)
                    .map(SpecVersion)
                    .map_err(|err| de::Error::custom(format!("invalid spec_version: {err}")))
            }
        }

        deserializer.deserialize_str(VersionVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
spec: qsr
spec_version: "0.1.0"
report:
  id: weekly-sales
  name: Weekly sales
connections:
  - name: main
    driver: sqlite
    connection_string: "sqlite::memory:"
queries:
  - id: totals
    connection: main
    sql: SELECT 1
    sheet: Data
    range: { x1: 0, y1: 0, x2: n, y2: 1 }
"#;

    #[test]
    fn minimal_manifest_parses_and_validates() {
        let manifest = ReportManifest::from_yaml_str(MINIMAL).unwrap();
        manifest.validate().unwrap();
        assert_eq!(manifest.queries[0].range.x2, Edge::Open);
        assert_eq!(manifest.connection("main").unwrap().driver, "sqlite");
        assert!(manifest.connection("other").is_none());
    }

    #[test]
    fn yaml_round_trips() {
        let manifest: ReportManifest = MINIMAL.parse().unwrap();
        let yaml = manifest.to_yaml().unwrap();
        assert_eq!(ReportManifest::from_yaml_str(&yaml).unwrap(), manifest);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let yaml = MINIMAL.replace("sheet: Data", "sheet: Data\n    extra: 1");
        assert!(ReportManifest::from_yaml_str(&yaml).is_err());
    }

    #[test]
    fn bad_version_string_fails_to_parse() {
        let yaml = MINIMAL.replace("\"0.1.0\"", "\"one\"");
        let err = ReportManifest::from_yaml_str(&yaml).unwrap_err();
        assert!(err.to_string().contains("invalid spec_version"), "{err}");
    }

    #[test]
    fn range_shape_is_checked() {
        let mut manifest = ReportManifest::from_yaml_str(MINIMAL).unwrap();
        manifest.queries[0].range = PlacementRange::new(2, 3, Edge::Open, Edge::Open);
        let err = manifest.validate().unwrap_err();
        assert_eq!(err.issues()[0].path, "queries[0].range");

        manifest.queries[0].range = PlacementRange::fixed(2, 3, 2, 1);
        let paths: Vec<_> = manifest
            .validate()
            .unwrap_err()
            .into_issues()
            .into_iter()
            .map(|i| i.path)
            .collect();
        assert_eq!(paths, vec!["queries[0].range.x2", "queries[0].range.y2"]);
    }
}
