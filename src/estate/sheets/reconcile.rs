//! Diffs an in-memory selection against the freshly read remote sheet.

use std::collections::HashSet;

use crate::estate::sheets::error::{Result, SheetError};
use crate::estate::sheets::model::{ListingRow, ListingTable, derive_columns};
use crate::estate::sheets::signature;

/// Number of signatures from each side included in zero-match diagnostics.
const DIAGNOSTIC_SAMPLE: usize = 3;

/// Outcome of matching a selection against the live sheet.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// Remote rows whose signature appeared in the selection.
    pub matched: Vec<ListingRow>,
    /// Remote rows to keep when the source sheet is rewritten.
    pub retained: Vec<ListingRow>,
}

impl Reconciliation {
    /// Number of remote rows a delete or move takes out of the sheet.
    pub fn removed(&self) -> usize {
        self.matched.len()
    }
}

/// Matches `selection` against `remote` by content signature.
///
/// Signatures are recomputed on both sides on every call because the remote
/// sheet may have changed since the selection was loaded. Rows with
/// identical key fields share a signature, so one selected row can match
/// several physical rows; no tie-break is applied and the caller sees the
/// actual matched count.
///
/// A selection that matches nothing is an error, not an empty result: a
/// zero-match write would silently do nothing while the operator believes
/// rows were removed. The error carries a signature sample from both sides
/// to make schema drift or concurrent edits diagnosable.
pub fn reconcile(selection: &[ListingRow], remote: &ListingTable) -> Result<Reconciliation> {
    if selection.is_empty() {
        return Err(SheetError::EmptySelection);
    }

    let local_columns = derive_columns(selection);
    let keys = signature::shared_keys(&local_columns, &remote.columns)?;

    let local: HashSet<String> = selection
        .iter()
        .map(|row| signature::row_signature(row, &keys))
        .collect();

    let mut matched = Vec::new();
    let mut retained = Vec::new();
    for row in &remote.rows {
        if local.contains(&signature::row_signature(row, &keys)) {
            matched.push(row.clone());
        } else {
            retained.push(row.clone());
        }
    }

    if matched.is_empty() {
        let mut local_sample: Vec<String> = local.into_iter().collect();
        local_sample.sort();
        local_sample.truncate(DIAGNOSTIC_SAMPLE);
        let remote_sample = remote
            .rows
            .iter()
            .take(DIAGNOSTIC_SAMPLE)
            .map(|row| signature::row_signature(row, &keys))
            .collect();
        return Err(SheetError::NoMatch {
            sheet: remote.sheet.name().to_string(),
            local_sample,
            remote_sample,
        });
    }

    Ok(Reconciliation { matched, retained })
}
