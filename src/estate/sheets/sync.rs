//! Mutation orchestration over the shared spreadsheet.
//!
//! Every operation is one synchronous pass: read the source sheet fresh,
//! normalize its headers, match the selection by content signature, then
//! write. Matching failures abort before anything is written. A move is two
//! independent remote writes (append to the destination, then rewrite the
//! source); there is no cross-sheet transaction, so a failure between them
//! leaves the rows duplicated and is only surfaced to the operator.

use serde::Serialize;
use tracing::{info, instrument};

use crate::estate::sheets::error::{Result, SheetError};
use crate::estate::sheets::io::backend::SheetStore;
use crate::estate::sheets::model::{ListingRow, ListingTable, SheetKind, derive_columns};
use crate::estate::sheets::normalize;
use crate::estate::sheets::reconcile;

/// Operator-facing outcome of a mutation: a success flag plus message. The
/// surface shows the message either way; nothing here is fatal to the
/// process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpReport {
    pub success: bool,
    pub message: String,
    /// Rows taken out of the source sheet.
    pub removed: usize,
    /// Rows appended to the destination sheet.
    pub appended: usize,
}

impl OpReport {
    fn ok(message: String, removed: usize, appended: usize) -> Self {
        Self {
            success: true,
            message,
            removed,
            appended,
        }
    }

    pub fn failure(error: &SheetError) -> Self {
        Self {
            success: false,
            message: error.to_string(),
            removed: 0,
            appended: 0,
        }
    }
}

/// Deletes the rows matching `selection` from `sheet` by rewriting the sheet
/// without them.
#[instrument(level = "info", skip(store, selection), fields(sheet = %sheet, selected = selection.len()))]
pub fn delete_rows<S: SheetStore>(
    store: &mut S,
    sheet: SheetKind,
    selection: &[ListingRow],
) -> Result<OpReport> {
    let mut source = store.fetch(sheet)?;
    normalize::normalize_table(&mut source);

    let outcome = reconcile::reconcile(selection, &source)?;
    let removed = outcome.removed();
    source.rows = outcome.retained;
    store.replace(sheet, &source)?;

    info!(removed, "rows deleted");
    Ok(OpReport::ok(
        format!("deleted {removed} row(s) from '{sheet}'"),
        removed,
        0,
    ))
}

/// Moves the rows matching `selection` from `source` to `destination`:
/// append to the destination first, then rewrite the source without them.
/// The freshly matched remote rows are appended, not the in-memory
/// selection, so a move never writes data the operator was no longer
/// looking at.
#[instrument(
    level = "info",
    skip(store, selection),
    fields(source = %source, destination = %destination, selected = selection.len())
)]
pub fn move_rows<S: SheetStore>(
    store: &mut S,
    source: SheetKind,
    destination: SheetKind,
    selection: &[ListingRow],
) -> Result<OpReport> {
    let mut from = store.fetch(source)?;
    normalize::normalize_table(&mut from);
    let outcome = reconcile::reconcile(selection, &from)?;

    let columns = destination_columns(store, destination, &outcome.matched)?;
    store.append(destination, &columns, &outcome.matched)?;

    let removed = outcome.removed();
    from.rows = outcome.retained;
    store.replace(source, &from)?;

    info!(moved = removed, "rows moved");
    Ok(OpReport::ok(
        format!("moved {removed} row(s) from '{source}' to '{destination}'"),
        removed,
        removed,
    ))
}

/// Copies the rows matching `selection` to `destination`; the source sheet
/// is untouched. The copy still reconciles first so a stale selection fails
/// with the zero-match diagnostic instead of silently appending drifted
/// data.
#[instrument(
    level = "info",
    skip(store, selection),
    fields(source = %source, destination = %destination, selected = selection.len())
)]
pub fn copy_rows<S: SheetStore>(
    store: &mut S,
    source: SheetKind,
    destination: SheetKind,
    selection: &[ListingRow],
) -> Result<OpReport> {
    let mut from = store.fetch(source)?;
    normalize::normalize_table(&mut from);
    let outcome = reconcile::reconcile(selection, &from)?;

    let columns = destination_columns(store, destination, &outcome.matched)?;
    store.append(destination, &columns, &outcome.matched)?;

    let appended = outcome.matched.len();
    info!(copied = appended, "rows copied");
    Ok(OpReport::ok(
        format!("copied {appended} row(s) from '{source}' to '{destination}'"),
        0,
        appended,
    ))
}

/// Moves rows from a closed archive back to its active sheet.
#[instrument(level = "info", skip(store, selection), fields(source = %source))]
pub fn restore_rows<S: SheetStore>(
    store: &mut S,
    source: SheetKind,
    selection: &[ListingRow],
) -> Result<OpReport> {
    if !source.is_closed() {
        return Err(SheetError::NotClosed(source.name().to_string()));
    }
    move_rows(store, source, source.active(), selection)
}

/// Appends a single new listing to a sheet (the new-entry form submit).
#[instrument(level = "info", skip(store, row), fields(sheet = %sheet))]
pub fn append_listing<S: SheetStore>(
    store: &mut S,
    sheet: SheetKind,
    row: &ListingRow,
) -> Result<OpReport> {
    if !sheet.is_active() {
        return Err(SheetError::NotActive(sheet.name().to_string()));
    }
    let mut table = store.fetch(sheet)?;
    normalize::normalize_table(&mut table);

    let columns = if table.columns.is_empty() {
        row.values.keys().cloned().collect()
    } else {
        table.columns.clone()
    };
    store.append(sheet, &columns, std::slice::from_ref(row))?;

    info!("listing added");
    Ok(OpReport::ok(format!("added listing to '{sheet}'"), 0, 1))
}

/// Column order used when appending to `destination`: the destination's own
/// headers, or the appended rows' columns when the sheet is still blank.
fn destination_columns<S: SheetStore>(
    store: &S,
    destination: SheetKind,
    rows: &[ListingRow],
) -> Result<Vec<String>> {
    let mut to: ListingTable = store.fetch(destination)?;
    normalize::normalize_table(&mut to);
    if to.columns.is_empty() {
        Ok(derive_columns(rows))
    } else {
        Ok(to.columns)
    }
}
