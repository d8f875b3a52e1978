use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use estate_sheets::io::backend::SheetStore;
use estate_sheets::model::{
    CellValue, ListingRow, ListingTable, SheetKind, derive_columns,
};
use estate_sheets::session::SessionContext;
use estate_sheets::{Result, SheetError, filter, reconcile, sync};

/// In-memory stand-in for the spreadsheet backend.
struct MemorySheets {
    sheets: HashMap<SheetKind, ListingTable>,
    fetches: RefCell<usize>,
}

impl MemorySheets {
    fn new() -> Self {
        Self {
            sheets: HashMap::new(),
            fetches: RefCell::new(0),
        }
    }

    fn seed(&mut self, table: ListingTable) {
        self.sheets.insert(table.sheet, table);
    }

    fn rows(&self, sheet: SheetKind) -> &[ListingRow] {
        self.sheets
            .get(&sheet)
            .map(|table| table.rows.as_slice())
            .unwrap_or(&[])
    }

    fn fetch_count(&self) -> usize {
        *self.fetches.borrow()
    }
}

impl SheetStore for MemorySheets {
    fn fetch(&self, sheet: SheetKind) -> Result<ListingTable> {
        *self.fetches.borrow_mut() += 1;
        Ok(self
            .sheets
            .get(&sheet)
            .cloned()
            .unwrap_or_else(|| ListingTable::new(sheet)))
    }

    fn replace(&mut self, sheet: SheetKind, table: &ListingTable) -> Result<()> {
        self.sheets.insert(sheet, table.clone());
        Ok(())
    }

    fn append(&mut self, sheet: SheetKind, columns: &[String], rows: &[ListingRow]) -> Result<()> {
        let entry = self
            .sheets
            .entry(sheet)
            .or_insert_with(|| ListingTable::new(sheet));
        if entry.columns.is_empty() {
            entry.columns = columns.to_vec();
        }
        entry.rows.extend(rows.iter().cloned());
        Ok(())
    }
}

fn row(fields: &[(&str, &str)]) -> ListingRow {
    let mut row = ListingRow::new();
    for (column, value) in fields {
        row.set(*column, CellValue::from_field(value));
    }
    row
}

fn table(sheet: SheetKind, rows: Vec<ListingRow>) -> ListingTable {
    let columns = derive_columns(&rows);
    ListingTable {
        sheet,
        columns,
        rows,
    }
}

fn gangnam_office() -> ListingRow {
    row(&[
        ("지역_구", "강남구"),
        ("번지", "50-1"),
        ("면적", "33.0"),
        ("보증금", "5000"),
        ("월차임", "200"),
    ])
}

fn seocho_shop() -> ListingRow {
    row(&[
        ("지역_구", "서초구"),
        ("번지", "12-3"),
        ("면적", "41"),
        ("보증금", "3000"),
        ("월차임", "150"),
    ])
}

fn seeded_rental() -> MemorySheets {
    let mut store = MemorySheets::new();
    store.seed(table(
        SheetKind::Rental,
        vec![gangnam_office(), seocho_shop()],
    ));
    store
}

#[test]
fn delete_rewrites_the_source_without_the_matched_row() {
    let mut store = seeded_rental();
    let selection = vec![gangnam_office()];

    let report =
        sync::delete_rows(&mut store, SheetKind::Rental, &selection).expect("delete succeeds");

    assert!(report.success);
    assert_eq!(report.removed, 1);
    let remaining = store.rows(SheetKind::Rental);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].display("지역_구"), "서초구");
}

#[test]
fn delete_against_a_drifted_sheet_changes_nothing() {
    let mut store = MemorySheets::new();
    let mut drifted = gangnam_office();
    drifted.set("번지", CellValue::from_field("50-2"));
    store.seed(table(SheetKind::Rental, vec![drifted]));

    let selection = vec![gangnam_office()];
    let error =
        sync::delete_rows(&mut store, SheetKind::Rental, &selection).expect_err("no match");

    assert!(matches!(error, SheetError::NoMatch { .. }));
    assert_eq!(store.rows(SheetKind::Rental).len(), 1);
}

#[test]
fn move_appends_to_the_destination_then_rewrites_the_source() {
    let mut store = seeded_rental();
    let selection = vec![gangnam_office()];

    let report = sync::move_rows(
        &mut store,
        SheetKind::Rental,
        SheetKind::Rental.closed(),
        &selection,
    )
    .expect("move succeeds");

    assert!(report.success);
    assert_eq!(report.removed, 1);
    assert_eq!(report.appended, 1);
    assert_eq!(store.rows(SheetKind::Rental).len(), 1);
    let archived = store.rows(SheetKind::RentalClosed);
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].display("번지"), "50-1");
}

#[test]
fn copy_leaves_the_source_untouched_and_round_trips_by_signature() {
    let mut store = seeded_rental();
    let selection = vec![gangnam_office()];

    let report = sync::copy_rows(
        &mut store,
        SheetKind::Rental,
        SheetKind::Rental.briefing(),
        &selection,
    )
    .expect("copy succeeds");

    assert!(report.success);
    assert_eq!(report.removed, 0);
    assert_eq!(report.appended, 1);
    assert_eq!(store.rows(SheetKind::Rental).len(), 2);

    // The copied row must be findable again on the briefing sheet.
    let briefing = store.fetch(SheetKind::RentalBriefing).expect("fetch");
    let outcome = reconcile::reconcile(&selection, &briefing).expect("round trip matches");
    assert_eq!(outcome.matched.len(), 1);
}

#[test]
fn duplicate_key_fields_all_match_and_the_count_says_so() {
    let mut store = MemorySheets::new();
    store.seed(table(
        SheetKind::Rental,
        vec![gangnam_office(), gangnam_office(), seocho_shop()],
    ));

    let report = sync::delete_rows(&mut store, SheetKind::Rental, &[gangnam_office()])
        .expect("delete succeeds");

    // Known gap: identical key fields cannot be told apart, so both physical
    // rows go; the report exposes the real count.
    assert_eq!(report.removed, 2);
    assert_eq!(store.rows(SheetKind::Rental).len(), 1);
}

#[test]
fn restore_moves_rows_back_to_the_active_sheet() {
    let mut store = MemorySheets::new();
    store.seed(table(SheetKind::RentalClosed, vec![gangnam_office()]));
    store.seed(table(SheetKind::Rental, vec![seocho_shop()]));

    let report = sync::restore_rows(&mut store, SheetKind::RentalClosed, &[gangnam_office()])
        .expect("restore succeeds");

    assert!(report.success);
    assert!(store.rows(SheetKind::RentalClosed).is_empty());
    assert_eq!(store.rows(SheetKind::Rental).len(), 2);
}

#[test]
fn restore_refuses_sheets_that_are_not_archives() {
    let mut store = seeded_rental();
    let error = sync::restore_rows(&mut store, SheetKind::Rental, &[gangnam_office()])
        .expect_err("active sheet");
    assert!(matches!(error, SheetError::NotClosed(_)));
}

#[test]
fn append_listing_adds_one_row_with_the_sheet_columns() {
    let mut store = seeded_rental();
    let entry = row(&[
        ("지역_구", "송파구"),
        ("번지", "7-2"),
        ("면적", "52"),
        ("보증금", "4000"),
        ("월차임", "180"),
    ]);

    let report =
        sync::append_listing(&mut store, SheetKind::Rental, &entry).expect("append succeeds");

    assert!(report.success);
    assert_eq!(report.appended, 1);
    assert_eq!(store.rows(SheetKind::Rental).len(), 3);
}

#[test]
fn new_listings_are_refused_outside_the_active_sheets() {
    let mut store = MemorySheets::new();
    let entry = row(&[("지역_구", "송파구"), ("번지", "7-2")]);

    let error = sync::append_listing(&mut store, SheetKind::RentalClosed, &entry)
        .expect_err("archives are read-only for new entries");
    assert!(matches!(error, SheetError::NotActive(_)));
}

#[test]
fn raw_headers_are_normalized_before_matching() {
    let mut store = MemorySheets::new();
    // The remote sheet still uses historical headers.
    let remote = row(&[
        ("지역(구)", "강남구"),
        ("지번", "50-1"),
        ("전용면적", "33"),
        ("보증금(만원)", "5,000"),
        ("월세", "200"),
    ]);
    let sheet = ListingTable {
        sheet: SheetKind::Rental,
        columns: vec![
            "지역(구)".to_string(),
            "지번".to_string(),
            "전용면적".to_string(),
            "보증금(만원)".to_string(),
            "월세".to_string(),
        ],
        rows: vec![remote],
    };
    store.seed(sheet);

    let report = sync::delete_rows(&mut store, SheetKind::Rental, &[gangnam_office()])
        .expect("aliases resolve to the same signature");
    assert_eq!(report.removed, 1);
}

#[test]
fn session_serves_cached_tables_until_invalidated() {
    let store = seeded_rental();
    let mut session = SessionContext::new(Duration::from_secs(3600));

    session.listings(&store, 1, 20).expect("first load");
    session.listings(&store, 1, 20).expect("cached load");
    assert_eq!(store.fetch_count(), 1);

    session.invalidate(SheetKind::Rental);
    session.listings(&store, 1, 20).expect("reload");
    assert_eq!(store.fetch_count(), 2);
}

#[test]
fn a_zero_ttl_session_refetches_every_time() {
    let store = seeded_rental();
    let mut session = SessionContext::new(Duration::ZERO);

    session.listings(&store, 1, 20).expect("first load");
    session.listings(&store, 1, 20).expect("expired load");
    assert_eq!(store.fetch_count(), 2);
}

#[test]
fn session_mutations_resolve_ids_and_invalidate_the_cache() {
    let mut store = seeded_rental();
    let mut session = SessionContext::new(Duration::from_secs(3600));

    let page = session.listings(&store, 1, 20).expect("load");
    assert_eq!(page.total, 2);
    let target = page
        .rows
        .iter()
        .find(|row| row.display("지역_구") == "강남구")
        .expect("target listed")
        .id;
    let fetches_before = store.fetch_count();

    let report = session.delete(&mut store, &[target]);
    assert!(report.success, "{}", report.message);
    assert_eq!(report.removed, 1);

    // The cache was dropped, so the next view refetches and no longer shows
    // the deleted listing.
    let page = session.listings(&store, 1, 20).expect("reload");
    assert!(store.fetch_count() > fetches_before + 1);
    assert_eq!(page.total, 1);
    assert_eq!(page.rows[0].display("지역_구"), "서초구");
}

#[test]
fn session_move_invalidates_both_sheets() {
    let mut store = seeded_rental();
    let mut session = SessionContext::new(Duration::from_secs(3600));
    session.set_current(SheetKind::Rental);

    let page = session.listings(&store, 1, 20).expect("load");
    let target = page.rows[0].id;

    let report = session.move_to(&mut store, &[target], SheetKind::RentalClosed);
    assert!(report.success, "{}", report.message);

    session.set_current(SheetKind::RentalClosed);
    let archive = session.listings(&store, 1, 20).expect("archive view");
    assert_eq!(archive.total, 1);
}

#[test]
fn session_reports_failures_instead_of_propagating_them() {
    let mut store = seeded_rental();
    let mut session = SessionContext::new(Duration::from_secs(3600));

    let page = session.listings(&store, 1, 20).expect("load");
    let target = page.rows[0].id;

    // The sheet drifts behind the session's back.
    store.sheets.clear();
    store.seed(table(SheetKind::Rental, vec![seocho_shop()]));

    let report = session.delete(&mut store, &[target]);
    assert!(!report.success);
    assert!(report.message.contains("no rows"));
}

#[test]
fn session_reset_clears_filters_and_cache() {
    let store = seeded_rental();
    let mut session = SessionContext::new(Duration::from_secs(3600));
    session.set_filter(filter::ListingFilter {
        district: Some("강남".to_string()),
        ..Default::default()
    });
    session.set_current(SheetKind::Sale);
    session.listings(&store, 1, 20).expect("load");

    session.reset();

    assert!(session.filter().is_empty());
    assert_eq!(session.current(), SheetKind::Rental);
    session.listings(&store, 1, 20).expect("reload");
    assert_eq!(store.fetch_count(), 2);
}
