//! One-click text briefing for the digest sheets.
//!
//! The generator renders plain text the surface puts on the clipboard; no
//! markup, fixed indentation, one block per listing.

use chrono::Local;

use crate::estate::sheets::model::ListingRow;
use crate::estate::sheets::normalize;

/// Square-metre to pyeong conversion factor.
const PYEONG_PER_SQM: f64 = 0.3025;

/// Renders the briefing digest for the given rows: a date-stamped title
/// line followed by one block per listing.
pub fn briefing_text(title: &str, rows: &[ListingRow]) -> String {
    let mut text = format!("[{title}] {}\n", Local::now().format("%Y-%m-%d"));
    for (index, row) in rows.iter().enumerate() {
        text.push('\n');
        text.push_str(&listing_block(index + 1, row));
    }
    text
}

/// Renders one listing block of the digest.
pub fn listing_block(ordinal: usize, row: &ListingRow) -> String {
    let mut block = format!("{ordinal}. {}", location_line(row));

    if let Some(area) = row.numeric(normalize::AREA) {
        let pyeong = area * PYEONG_PER_SQM;
        block.push_str(&format!(
            "\n   면적 {}㎡ ({pyeong:.1}평)",
            trim_decimal(area)
        ));
    }

    let mut money = Vec::new();
    if let Some(deposit) = row.numeric(normalize::DEPOSIT) {
        money.push(format!("보증금 {}만원", group_digits(deposit)));
    }
    if let Some(rent) = row.numeric(normalize::RENT) {
        money.push(format!("월차임 {}만원", group_digits(rent)));
    }
    if let Some(price) = row.numeric(normalize::PRICE) {
        money.push(format!("매매가 {}만원", group_digits(price)));
    }
    if let Some(maintenance) = row.numeric(normalize::MAINTENANCE) {
        money.push(format!("관리비 {}만원", group_digits(maintenance)));
    }
    if !money.is_empty() {
        block.push_str(&format!("\n   {}", money.join(" / ")));
    }

    let description = row.display(normalize::DESCRIPTION);
    if !description.is_empty() {
        block.push_str(&format!("\n   {description}"));
    }

    block.push('\n');
    block
}

fn location_line(row: &ListingRow) -> String {
    let mut parts: Vec<String> = [
        normalize::DISTRICT,
        normalize::NEIGHBOURHOOD,
        normalize::LOT,
        normalize::BUILDING,
    ]
    .iter()
    .map(|column| row.display(column))
    .filter(|part| !part.is_empty())
    .collect();

    let floor = row.display(normalize::FLOOR);
    if !floor.is_empty() {
        parts.push(format!("{floor}층"));
    }
    parts.join(" ")
}

/// Whole numbers without a decimal part, everything else with one decimal.
fn trim_decimal(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value:.1}")
    }
}

/// Renders a money amount with thousands separators, e.g. `5,000`.
fn group_digits(value: f64) -> String {
    let whole = value.round() as i64;
    let digits = whole.abs().to_string();

    let mut grouped = String::new();
    for (offset, ch) in digits.chars().enumerate() {
        if offset > 0 && (digits.len() - offset) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if whole < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
