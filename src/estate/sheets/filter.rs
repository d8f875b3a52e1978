//! List-screen filtering and pagination.

use serde::{Deserialize, Serialize};

use crate::estate::sheets::model::{ListingRow, ListingTable};
use crate::estate::sheets::normalize;

/// Filter values held by the list screen. Unset bounds pass everything;
/// rows missing a bounded column also pass, so a sparse sheet never hides
/// listings the operator could still act on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingFilter {
    /// Substring match on the district column.
    pub district: Option<String>,
    /// Upper bound on the deposit.
    pub max_deposit: Option<f64>,
    /// Upper bound on the monthly rent.
    pub max_rent: Option<f64>,
    /// Upper bound on the sale price.
    pub max_price: Option<f64>,
    /// Lower bound on the floor area.
    pub min_area: Option<f64>,
    /// Free-text needle matched against every column.
    pub query: Option<String>,
}

impl ListingFilter {
    pub fn is_empty(&self) -> bool {
        self == &ListingFilter::default()
    }

    /// Whether a row passes every set bound.
    pub fn matches(&self, row: &ListingRow) -> bool {
        if let Some(district) = &self.district {
            let district = district.trim();
            if !district.is_empty() && !row.display(normalize::DISTRICT).contains(district) {
                return false;
            }
        }

        if !within_max(row, normalize::DEPOSIT, self.max_deposit) {
            return false;
        }
        if !within_max(row, normalize::RENT, self.max_rent) {
            return false;
        }
        if !within_max(row, normalize::PRICE, self.max_price) {
            return false;
        }

        if let Some(min_area) = self.min_area {
            if let Some(area) = row.numeric(normalize::AREA) {
                if area < min_area {
                    return false;
                }
            }
        }

        if let Some(query) = &self.query {
            let needle = query.trim();
            if !needle.is_empty() {
                let hit = row
                    .values
                    .values()
                    .any(|value| value.display().contains(needle));
                if !hit {
                    return false;
                }
            }
        }

        true
    }

    /// Rows of `table` passing every set bound, in sheet order.
    pub fn apply<'a>(&self, table: &'a ListingTable) -> Vec<&'a ListingRow> {
        table.rows.iter().filter(|row| self.matches(row)).collect()
    }

    /// Indices of the passing rows, for surfaces that need the sheet
    /// ordinal alongside the row.
    pub fn visible_indices(&self, table: &ListingTable) -> Vec<usize> {
        table
            .rows
            .iter()
            .enumerate()
            .filter_map(|(index, row)| self.matches(row).then_some(index))
            .collect()
    }
}

fn within_max(row: &ListingRow, column: &str, bound: Option<f64>) -> bool {
    match (bound, row.numeric(column)) {
        (Some(max), Some(value)) => value <= max,
        _ => true,
    }
}

/// One page of filtered rows; pages are 1-based.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub rows: Vec<ListingRow>,
    pub page: usize,
    pub pages: usize,
    pub total: usize,
}

/// Fixed-size pagination over the filtered rows. An out-of-range page is
/// clamped instead of rejected.
pub fn paginate(rows: &[&ListingRow], page: usize, per_page: usize) -> Page {
    let per_page = per_page.max(1);
    let total = rows.len();
    let pages = total.div_ceil(per_page).max(1);
    let page = page.clamp(1, pages);

    let slice = rows
        .iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .map(|row| (*row).clone())
        .collect();

    Page {
        rows: slice,
        page,
        pages,
        total,
    }
}
