//! Per-session state: current sheet, filter values, and the table cache.
//!
//! One context is created per user session and passed to each handler;
//! nothing here is global. Cached tables live for a fixed TTL and are
//! dropped immediately after any successful mutation so the next read is
//! consistent with the just-applied write. Two sessions acting on the same
//! sheet can still race; the zero-match check in the reconciler is the only
//! detection mechanism.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::time::{Duration, Instant};

use tracing::debug;
use uuid::Uuid;

use crate::estate::sheets::error::{Result, SheetError};
use crate::estate::sheets::filter::{self, ListingFilter, Page};
use crate::estate::sheets::io::backend::SheetStore;
use crate::estate::sheets::model::{ListingRow, ListingTable, SheetKind};
use crate::estate::sheets::normalize;
use crate::estate::sheets::sync::{self, OpReport};

struct CachedTable {
    table: ListingTable,
    fetched_at: Instant,
}

/// Explicit session context passed to each handler.
pub struct SessionContext {
    current: SheetKind,
    filter: ListingFilter,
    cache: HashMap<SheetKind, CachedTable>,
    ttl: Duration,
}

impl SessionContext {
    pub fn new(ttl: Duration) -> Self {
        Self {
            current: SheetKind::Rental,
            filter: ListingFilter::default(),
            cache: HashMap::new(),
            ttl,
        }
    }

    pub fn current(&self) -> SheetKind {
        self.current
    }

    pub fn set_current(&mut self, sheet: SheetKind) {
        self.current = sheet;
    }

    pub fn filter(&self) -> &ListingFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: ListingFilter) {
        self.filter = filter;
    }

    /// Returns the table for `sheet`, served from the cache while the entry
    /// is younger than the session TTL, refetched (and normalized) past it.
    pub fn table<S: SheetStore>(&mut self, store: &S, sheet: SheetKind) -> Result<&ListingTable> {
        match self.cache.entry(sheet) {
            Entry::Occupied(slot) if slot.get().fetched_at.elapsed() < self.ttl => {
                Ok(&slot.into_mut().table)
            }
            Entry::Occupied(slot) => {
                let table = load(store, sheet)?;
                let cached = slot.into_mut();
                *cached = CachedTable {
                    table,
                    fetched_at: Instant::now(),
                };
                Ok(&cached.table)
            }
            Entry::Vacant(slot) => {
                let table = load(store, sheet)?;
                let cached = slot.insert(CachedTable {
                    table,
                    fetched_at: Instant::now(),
                });
                Ok(&cached.table)
            }
        }
    }

    /// Filtered, paginated view of the current sheet.
    pub fn listings<S: SheetStore>(
        &mut self,
        store: &S,
        page: usize,
        per_page: usize,
    ) -> Result<Page> {
        let sheet = self.current;
        let active_filter = self.filter.clone();
        let table = self.table(store, sheet)?;
        let visible = active_filter.apply(table);
        Ok(filter::paginate(&visible, page, per_page))
    }

    /// Resolves selection ids against the cached table for `sheet`. The ids
    /// only exist within this session; an unknown id means the selection
    /// outlived a reload.
    pub fn selection<S: SheetStore>(
        &mut self,
        store: &S,
        sheet: SheetKind,
        ids: &[Uuid],
    ) -> Result<Vec<ListingRow>> {
        let table = self.table(store, sheet)?;
        let mut rows = Vec::with_capacity(ids.len());
        for id in ids {
            let row = table.row_by_id(*id).ok_or(SheetError::UnknownRow(*id))?;
            rows.push(row.clone());
        }
        Ok(rows)
    }

    /// Deletes the selected rows from the current sheet.
    pub fn delete<S: SheetStore>(&mut self, store: &mut S, ids: &[Uuid]) -> OpReport {
        let sheet = self.current;
        let report = match self.selection(&*store, sheet, ids) {
            Ok(selection) => sync::delete_rows(store, sheet, &selection),
            Err(error) => Err(error),
        };
        self.finish(report, &[sheet])
    }

    /// Moves the selected rows from the current sheet to `destination`.
    pub fn move_to<S: SheetStore>(
        &mut self,
        store: &mut S,
        ids: &[Uuid],
        destination: SheetKind,
    ) -> OpReport {
        let sheet = self.current;
        let report = match self.selection(&*store, sheet, ids) {
            Ok(selection) => sync::move_rows(store, sheet, destination, &selection),
            Err(error) => Err(error),
        };
        self.finish(report, &[sheet, destination])
    }

    /// Copies the selected rows from the current sheet to `destination`.
    pub fn copy_to<S: SheetStore>(
        &mut self,
        store: &mut S,
        ids: &[Uuid],
        destination: SheetKind,
    ) -> OpReport {
        let sheet = self.current;
        let report = match self.selection(&*store, sheet, ids) {
            Ok(selection) => sync::copy_rows(store, sheet, destination, &selection),
            Err(error) => Err(error),
        };
        self.finish(report, &[sheet, destination])
    }

    /// Restores the selected rows from the current (closed) sheet back to
    /// its active counterpart.
    pub fn restore<S: SheetStore>(&mut self, store: &mut S, ids: &[Uuid]) -> OpReport {
        let sheet = self.current;
        let report = match self.selection(&*store, sheet, ids) {
            Ok(selection) => sync::restore_rows(store, sheet, &selection),
            Err(error) => Err(error),
        };
        self.finish(report, &[sheet, sheet.active()])
    }

    /// Drops the cached table for `sheet`; the next read refetches.
    pub fn invalidate(&mut self, sheet: SheetKind) {
        self.cache.remove(&sheet);
    }

    /// Clears filters and cache and returns to the default sheet.
    pub fn reset(&mut self) {
        *self = SessionContext::new(self.ttl);
    }

    fn finish(&mut self, result: Result<OpReport>, touched: &[SheetKind]) -> OpReport {
        match result {
            Ok(report) => {
                for sheet in touched {
                    self.invalidate(*sheet);
                }
                report
            }
            Err(error) => OpReport::failure(&error),
        }
    }
}

fn load<S: SheetStore>(store: &S, sheet: SheetKind) -> Result<ListingTable> {
    let mut table = store.fetch(sheet)?;
    normalize::normalize_table(&mut table);
    debug!(sheet = %sheet, rows = table.len(), "sheet loaded into session cache");
    Ok(table)
}
