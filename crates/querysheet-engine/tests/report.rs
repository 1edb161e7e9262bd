use querysheet_engine::io::{CellValue, UmyaWorkbook, WorkbookWriter};
use querysheet_engine::spec::ReportManifest;
use querysheet_engine::{DriverRegistry, EngineError, ReportProgress, ReportRunner};
use querysheet_testkit::{Fixture, build_workbook, sales_database};

fn manifest(db: &Fixture) -> ReportManifest {
    let yaml = format!(
        r#"
spec: qsr
spec_version: "0.1.0"
report:
  id: weekly-sales
  name: Weekly sales
connections:
  - name: warehouse
    driver: sqlite
    connection_string: "{url}"
queries:
  - id: regions
    connection: warehouse
    sql: SELECT region, total FROM sales ORDER BY id
    sheet: Summary
    range: {{ x1: 1, y1: 0, x2: n, y2: 2 }}
  - id: broken
    connection: warehouse
    sql: SELECT nope FROM sales
    sheet: Summary
    range: {{ x1: 10, y1: 0, x2: n, y2: 1 }}
  - id: ids-across
    connection: warehouse
    sql: SELECT id FROM sales ORDER BY id
    sheet: Ids
    range: {{ x1: 0, y1: 0, x2: 1, y2: n }}
"#,
        url = db.sqlite_url()
    );
    ReportManifest::from_yaml_str(&yaml).unwrap()
}

#[test]
fn failing_query_does_not_stop_the_report() {
    let db = sales_database();
    let template = build_workbook(|book| {
        let sheet = book.new_sheet("Summary").unwrap();
        sheet.get_cell_mut("A1").set_value_string("Region");
        sheet.get_cell_mut("B1").set_value_string("Total");
    });
    let mut workbook = UmyaWorkbook::open_path(template.path()).unwrap();
    let registry = DriverRegistry::with_defaults();
    let mut events: Vec<ReportProgress> = Vec::new();

    let summary = ReportRunner::new(&registry)
        .with_progress(|p| events.push(p.clone()))
        .run(&manifest(&db), &mut workbook)
        .unwrap();

    assert!(!summary.is_success());
    let failed: Vec<&str> = summary.failures().map(|o| o.query.as_str()).collect();
    assert_eq!(failed, vec!["broken"]);
    assert!(matches!(
        summary.outcomes[1].result,
        Err(EngineError::Query(_))
    ));
    assert_eq!(summary.cells_written(), 9);

    assert_eq!(events.len(), 4);
    assert_eq!(events[0].percent, 33);
    assert!(events[1].message.starts_with("query `broken` failed"));
    let last = events.last().unwrap();
    assert_eq!((last.completed, last.total, last.percent), (3, 3, 100));
    assert_eq!(last.message, "report generated");

    let out = template.sibling("weekly.xlsx");
    workbook.save_to_path(&out).unwrap();
    let book = UmyaWorkbook::open_path(&out).unwrap();
    assert_eq!(
        book.read_value("Summary", 0, 0),
        Some(CellValue::Text("Region".into()))
    );
    assert_eq!(
        book.read_value("Summary", 1, 0),
        Some(CellValue::Text("north".into()))
    );
    assert_eq!(
        book.read_value("Summary", 3, 1),
        Some(CellValue::Number(42.25))
    );
    assert_eq!(book.read_value("Summary", 10, 0), None);
    assert_eq!(
        book.read_value("Ids", 0, 2),
        Some(CellValue::Number(3.0))
    );
}

#[test]
fn invalid_manifest_fails_the_run() {
    let db = sales_database();
    let mut manifest = manifest(&db);
    manifest.queries[2].connection = "elsewhere".to_string();
    let registry = DriverRegistry::with_defaults();
    let mut workbook = UmyaWorkbook::new();

    let err = ReportRunner::new(&registry)
        .run(&manifest, &mut workbook)
        .unwrap_err();
    match err {
        EngineError::Manifest(validation) => {
            assert_eq!(validation.issues()[0].path, "queries[2].connection");
        }
        other => panic!("expected manifest error, got {other:?}"),
    }
    assert!(!workbook.has_sheet("Ids"));
}

#[test]
fn timestamps_land_as_dates() {
    let db = sales_database();
    let registry = DriverRegistry::with_defaults();
    let mut workbook = UmyaWorkbook::new();
    let mut manifest = manifest(&db);
    manifest.queries.truncate(1);
    manifest.queries[0].sql = "SELECT region, booked_at FROM sales WHERE id = 1".to_string();

    let summary = ReportRunner::new(&registry)
        .run(&manifest, &mut workbook)
        .unwrap();
    assert!(summary.is_success());

    let bytes = workbook.save_to_bytes().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dates.xlsx");
    std::fs::write(&path, bytes).unwrap();
    let book = UmyaWorkbook::open_path(&path).unwrap();
    let expected = chrono::NaiveDate::from_ymd_opt(2024, 1, 5)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    assert_eq!(
        book.read_value("Summary", 1, 1),
        Some(CellValue::DateTime(expected))
    );
}
