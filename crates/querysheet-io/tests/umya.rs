// Integration tests for the umya backend; run with `--features umya`.
use chrono::NaiveDate;
use querysheet_io::{
    CellValue, CellWriter, MAX_EXACT_INT, SheetWriter, UmyaWorkbook, WorkbookWriter,
};
use querysheet_testkit::build_workbook;

#[test]
fn typed_writes_survive_save_and_reopen() {
    let fixture = build_workbook(|_| {});
    let dt = NaiveDate::from_ymd_opt(2024, 3, 9)
        .unwrap()
        .and_hms_opt(17, 45, 10)
        .unwrap();

    let mut wb = UmyaWorkbook::open_path(fixture.path()).unwrap();
    {
        let sheet = wb.sheet_mut("Sheet1").unwrap();
        sheet.cell_mut(0, 0).set_int(42);
        sheet.cell_mut(0, 1).set_float(2.5);
        sheet.cell_mut(1, 0).set_bool(true);
        sheet.cell_mut(1, 1).set_text("007");
        sheet.cell_mut(2, 0).set_datetime(dt);
    }
    wb.save().unwrap();

    let reopened = UmyaWorkbook::open_path(fixture.path()).unwrap();
    assert_eq!(
        reopened.read_value("Sheet1", 0, 0),
        Some(CellValue::Number(42.0))
    );
    assert_eq!(
        reopened.read_value("Sheet1", 0, 1),
        Some(CellValue::Number(2.5))
    );
    assert_eq!(
        reopened.read_value("Sheet1", 1, 0),
        Some(CellValue::Boolean(true))
    );
    // text that looks numeric stays text
    assert_eq!(
        reopened.read_value("Sheet1", 1, 1),
        Some(CellValue::Text("007".into()))
    );
    assert_eq!(
        reopened.read_value("Sheet1", 2, 0),
        Some(CellValue::DateTime(dt))
    );
    assert_eq!(reopened.read_value("Sheet1", 5, 5), None);
}

#[test]
fn integers_past_float_precision_keep_their_digits() {
    let fixture = build_workbook(|_| {});
    let mut wb = UmyaWorkbook::open_path(fixture.path()).unwrap();
    {
        let sheet = wb.sheet_mut("Sheet1").unwrap();
        sheet.cell_mut(0, 0).set_int(MAX_EXACT_INT);
        sheet.cell_mut(0, 1).set_int(MAX_EXACT_INT + 1);
        sheet.cell_mut(0, 2).set_int(i64::MAX);
        sheet.cell_mut(0, 3).set_int(i64::MIN);
    }
    wb.save().unwrap();

    let reopened = UmyaWorkbook::open_path(fixture.path()).unwrap();
    assert_eq!(
        reopened.read_value("Sheet1", 0, 0),
        Some(CellValue::Number(9_007_199_254_740_992.0))
    );
    assert_eq!(
        reopened.read_value("Sheet1", 0, 1),
        Some(CellValue::Text("9007199254740993".into()))
    );
    assert_eq!(
        reopened.read_value("Sheet1", 0, 2),
        Some(CellValue::Text(i64::MAX.to_string()))
    );
    assert_eq!(
        reopened.read_value("Sheet1", 0, 3),
        Some(CellValue::Text(i64::MIN.to_string()))
    );
}

#[test]
fn zero_based_coordinates_map_to_a1() {
    let mut wb = UmyaWorkbook::new();
    wb.sheet_mut("Sheet1").unwrap().cell_mut(1, 2).set_int(7);
    let ws = wb.spreadsheet().get_sheet_by_name("Sheet1").unwrap();
    assert_eq!(ws.get_value("C2"), "7");
}

#[test]
fn missing_sheets_are_created_and_template_cells_kept() {
    let fixture = build_workbook(|book| {
        let sh = book.get_sheet_by_name_mut("Sheet1").unwrap();
        sh.get_cell_mut("A1").set_value_string("Title");
    });
    let mut wb = UmyaWorkbook::open_path(fixture.path()).unwrap();
    assert!(!wb.has_sheet("Data"));
    wb.sheet_mut("Data").unwrap().cell_mut(0, 0).set_text("x");
    assert_eq!(wb.sheet_names(), vec!["Sheet1".to_string(), "Data".to_string()]);

    let out = fixture.sibling("out.xlsx");
    wb.save_to_path(&out).unwrap();
    let reopened = UmyaWorkbook::open_path(&out).unwrap();
    assert_eq!(
        reopened.read_value("Sheet1", 0, 0),
        Some(CellValue::Text("Title".into()))
    );
    assert_eq!(
        reopened.read_value("Data", 0, 0),
        Some(CellValue::Text("x".into()))
    );
}

#[test]
fn new_workbook_saves_to_bytes_but_not_in_place() {
    let mut wb = UmyaWorkbook::new();
    wb.sheet_mut("Sheet1").unwrap().cell_mut(0, 0).set_float(1.0);
    let err = wb.save().expect_err("new workbooks have no original path");
    assert!(err.to_string().contains("no original path"), "{err}");

    let bytes = wb.save_to_bytes().unwrap();
    assert!(bytes.len() > 100, "expected non-trivial xlsx output");
}
