use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::estate::sheets::normalize;

/// A single cell of a listing row. The backing store is untyped text, so a
/// cell is either the raw text, a plainly numeric value, or empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Plainly numeric field.
    Number(f64),
    /// Free-form text field.
    Text(String),
    /// Blank field.
    Empty,
}

impl CellValue {
    /// Parses a raw delimited-text field. Only plain decimal forms become
    /// numbers; grouped values such as `1,000` stay text and are interpreted
    /// numerically on demand by [`CellValue::numeric`].
    pub fn from_field(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        match plain_number(trimmed) {
            Some(number) => CellValue::Number(number),
            None => CellValue::Text(trimmed.to_string()),
        }
    }

    /// Numeric view of the cell: numbers directly, numeric-looking text
    /// after dropping thousands separators.
    pub fn numeric(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) => Some(*value),
            CellValue::Text(value) => {
                let cleaned: String = value
                    .chars()
                    .filter(|ch| !matches!(ch, ',' | ' '))
                    .collect();
                plain_number(&cleaned)
            }
            CellValue::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Display form used in lists, briefing text, and sheet writes. Whole
    /// numbers are rendered without a decimal part.
    pub fn display(&self) -> String {
        match self {
            CellValue::Number(value) => {
                if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
                    format!("{}", *value as i64)
                } else {
                    value.to_string()
                }
            }
            CellValue::Text(value) => value.clone(),
            CellValue::Empty => String::new(),
        }
    }
}

/// Accepts only plain decimal forms: optional leading minus, digits, at most
/// a fractional part. Anything else (grouped digits, lot numbers such as
/// `50-1`, scientific notation) is rejected.
fn plain_number(field: &str) -> Option<f64> {
    let mut digits = false;
    for (index, ch) in field.char_indices() {
        match ch {
            '0'..='9' => digits = true,
            '-' if index == 0 => {}
            '.' => {}
            _ => return None,
        }
    }
    if digits { field.parse().ok() } else { None }
}

fn generated_id() -> Uuid {
    Uuid::new_v4()
}

/// One listing, keyed by canonical column names.
///
/// The `id` is regenerated on every load and keys UI selection state within
/// a single session only; it is never written back to the store. Matching
/// against the live sheet always goes through content signatures instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRow {
    #[serde(skip, default = "generated_id")]
    pub id: Uuid,
    #[serde(flatten)]
    pub values: BTreeMap<String, CellValue>,
}

impl ListingRow {
    pub fn new() -> Self {
        Self {
            id: generated_id(),
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.values.get(column)
    }

    pub fn set(&mut self, column: impl Into<String>, value: CellValue) {
        self.values.insert(column.into(), value);
    }

    /// Display form of a cell, empty when the column is absent.
    pub fn display(&self, column: &str) -> String {
        self.get(column).map(CellValue::display).unwrap_or_default()
    }

    /// Numeric view of a cell, `None` when absent or not numeric.
    pub fn numeric(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(CellValue::numeric)
    }

    /// Free-form address assembled from the location columns, suitable as
    /// geocoder input.
    pub fn address(&self) -> String {
        [normalize::DISTRICT, normalize::NEIGHBOURHOOD, normalize::LOT]
            .iter()
            .map(|column| self.display(column))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for ListingRow {
    fn default() -> Self {
        Self::new()
    }
}

/// Sorted union of the columns present across `rows`.
pub fn derive_columns(rows: &[ListingRow]) -> Vec<String> {
    let mut columns = BTreeSet::new();
    for row in rows {
        for column in row.values.keys() {
            columns.insert(column.clone());
        }
    }
    columns.into_iter().collect()
}

/// An ordered collection of listing rows for one named sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingTable {
    pub sheet: SheetKind,
    pub columns: Vec<String>,
    pub rows: Vec<ListingRow>,
}

impl ListingTable {
    pub fn new(sheet: SheetKind) -> Self {
        Self {
            sheet,
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn with_columns(sheet: SheetKind, columns: Vec<String>) -> Self {
        Self {
            sheet,
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_by_id(&self, id: Uuid) -> Option<&ListingRow> {
        self.rows.iter().find(|row| row.id == id)
    }
}

/// The six fixed sheets of the backing document: rental and sale listings,
/// each with a closed archive and a briefing digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SheetKind {
    Rental,
    Sale,
    RentalClosed,
    SaleClosed,
    RentalBriefing,
    SaleBriefing,
}

impl SheetKind {
    pub const ALL: [SheetKind; 6] = [
        SheetKind::Rental,
        SheetKind::Sale,
        SheetKind::RentalClosed,
        SheetKind::SaleClosed,
        SheetKind::RentalBriefing,
        SheetKind::SaleBriefing,
    ];

    /// Fixed sheet name within the backing document.
    pub fn name(&self) -> &'static str {
        match self {
            SheetKind::Rental => "rental",
            SheetKind::Sale => "sale",
            SheetKind::RentalClosed => "rental (closed)",
            SheetKind::SaleClosed => "sale (closed)",
            SheetKind::RentalBriefing => "rental (briefing)",
            SheetKind::SaleBriefing => "sale (briefing)",
        }
    }

    /// The active listing sheet this sheet archives or digests; active
    /// sheets return themselves.
    pub fn active(&self) -> SheetKind {
        match self {
            SheetKind::Rental | SheetKind::RentalClosed | SheetKind::RentalBriefing => {
                SheetKind::Rental
            }
            SheetKind::Sale | SheetKind::SaleClosed | SheetKind::SaleBriefing => SheetKind::Sale,
        }
    }

    /// The closed archive belonging to this sheet's market.
    pub fn closed(&self) -> SheetKind {
        match self.active() {
            SheetKind::Rental => SheetKind::RentalClosed,
            _ => SheetKind::SaleClosed,
        }
    }

    /// The briefing digest belonging to this sheet's market.
    pub fn briefing(&self) -> SheetKind {
        match self.active() {
            SheetKind::Rental => SheetKind::RentalBriefing,
            _ => SheetKind::SaleBriefing,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SheetKind::Rental | SheetKind::Sale)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, SheetKind::RentalClosed | SheetKind::SaleClosed)
    }
}

impl fmt::Display for SheetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
