//! Content signatures used to match in-memory selections against the live
//! sheet.
//!
//! The backing store has no stable row identifier and the in-memory row id is
//! regenerated on every load, so rows are identified by a signature derived
//! from a fixed subset of canonical columns. Signatures are never stored:
//! both sides recompute them immediately before every mutating operation.

use crate::estate::sheets::error::{Result, SheetError};
use crate::estate::sheets::model::{CellValue, ListingRow};
use crate::estate::sheets::normalize;

/// How a key column participates in the signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Kept as text with every character outside ASCII alphanumerics and
    /// Hangul syllables removed.
    Text,
    /// Parsed as a number (thousands separators stripped, unparseable values
    /// treated as zero), rounded to one decimal, rendered without a trailing
    /// zero decimal.
    Numeric,
    /// Text key truncated to its first [`DESCRIPTION_PREFIX`] characters
    /// before cleaning.
    Description,
}

/// One column of the fixed signature key set.
#[derive(Debug, Clone, Copy)]
pub struct SignatureKey {
    pub column: &'static str,
    pub kind: KeyKind,
}

/// The fixed, ordered key set the signature concatenates.
pub const SIGNATURE_KEYS: &[SignatureKey] = &[
    SignatureKey {
        column: normalize::DISTRICT,
        kind: KeyKind::Text,
    },
    SignatureKey {
        column: normalize::LOT,
        kind: KeyKind::Text,
    },
    SignatureKey {
        column: normalize::FLOOR,
        kind: KeyKind::Text,
    },
    SignatureKey {
        column: normalize::AREA,
        kind: KeyKind::Numeric,
    },
    SignatureKey {
        column: normalize::DEPOSIT,
        kind: KeyKind::Numeric,
    },
    SignatureKey {
        column: normalize::PRICE,
        kind: KeyKind::Numeric,
    },
    SignatureKey {
        column: normalize::RENT,
        kind: KeyKind::Numeric,
    },
    SignatureKey {
        column: normalize::DESCRIPTION,
        kind: KeyKind::Description,
    },
];

/// Minimum number of key columns that must exist on both sides before a
/// signature is considered discriminating enough to act on.
pub const MIN_SHARED_KEYS: usize = 2;

/// Characters of the description key that participate in the signature.
pub const DESCRIPTION_PREFIX: usize = 20;

/// Selects the signature keys present in both schemas, refusing when fewer
/// than [`MIN_SHARED_KEYS`] remain.
pub fn shared_keys(local: &[String], remote: &[String]) -> Result<Vec<SignatureKey>> {
    let keys: Vec<SignatureKey> = SIGNATURE_KEYS
        .iter()
        .copied()
        .filter(|key| {
            local.iter().any(|column| column == key.column)
                && remote.iter().any(|column| column == key.column)
        })
        .collect();

    if keys.len() < MIN_SHARED_KEYS {
        return Err(SheetError::InsufficientKeys {
            available: keys.len(),
            required: MIN_SHARED_KEYS,
        });
    }
    Ok(keys)
}

/// Derives the deduplication signature of a row over the given key columns.
/// The transformed fields are concatenated in key order with no separator.
pub fn row_signature(row: &ListingRow, keys: &[SignatureKey]) -> String {
    let mut signature = String::new();
    for key in keys {
        let cell = row.get(key.column);
        match key.kind {
            KeyKind::Numeric => signature.push_str(&numeric_component(cell)),
            KeyKind::Text => signature.push_str(&text_component(cell, None)),
            KeyKind::Description => {
                signature.push_str(&text_component(cell, Some(DESCRIPTION_PREFIX)));
            }
        }
    }
    signature
}

fn numeric_component(cell: Option<&CellValue>) -> String {
    let value = cell.and_then(CellValue::numeric).unwrap_or(0.0);
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded:.1}")
    }
}

fn text_component(cell: Option<&CellValue>, prefix: Option<usize>) -> String {
    let raw = cell.map(CellValue::display).unwrap_or_default();
    let truncated: String = match prefix {
        Some(limit) => raw.chars().take(limit).collect(),
        None => raw,
    };
    truncated
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '가'..='힣'))
        .collect()
}
