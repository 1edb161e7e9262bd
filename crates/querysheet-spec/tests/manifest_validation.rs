use querysheet_spec::{Edge, ReportManifest};

fn load_fixture(name: &str) -> ReportManifest {
    let path = format!("tests/fixtures/{}.yaml", name);
    let text = std::fs::read_to_string(path).expect("failed to read fixture");
    ReportManifest::from_yaml_str(&text).expect("fixture should deserialize")
}

#[test]
fn weekly_sales_fixture_validates() {
    let manifest = load_fixture("weekly_sales");
    manifest.validate().expect("fixture should validate");
    assert_eq!(manifest.queries.len(), 3);
    assert_eq!(manifest.queries[1].range.y2, Edge::Open);
    assert_eq!(manifest.connection("ledger").unwrap().driver, "postgres");
}

#[test]
fn every_issue_is_reported_at_once() {
    let mut manifest = load_fixture("weekly_sales");
    manifest.spec = "xlsx".to_string();
    manifest.report.id = "Weekly Sales".to_string();
    manifest.connections[1].name = "warehouse".to_string();
    manifest.queries[1].id = "region-totals".to_string();
    manifest.queries[2].connection = "missing".to_string();
    manifest.queries[2].sheet = "  ".to_string();

    let err = manifest.validate().expect_err("validation should fail");
    let paths: Vec<&str> = err.issues().iter().map(|i| i.path.as_str()).collect();
    insta::assert_debug_snapshot!(paths, @r###"
    [
        "spec",
        "report.id",
        "connections[1].name",
        "queries[1].id",
        "queries[2].connection",
        "queries[2].sheet",
    ]
    "###);
    assert_eq!(
        err.issues()[3].message,
        "duplicate query id `region-totals`"
    );
    assert_eq!(err.to_string(), "manifest validation failed with 6 issue(s)");
}

#[test]
fn incompatible_major_version_is_rejected() {
    let mut manifest = load_fixture("weekly_sales");
    manifest.spec_version = querysheet_spec::manifest::SpecVersion::new("1.0.0".parse().unwrap());
    let err = manifest.validate().expect_err("major bump should fail");
    assert_eq!(err.issues().len(), 1);
    assert_eq!(err.issues()[0].path, "spec_version");
}
