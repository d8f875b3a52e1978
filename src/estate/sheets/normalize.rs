//! Canonical column schema and header normalization.
//!
//! The shared spreadsheet has accumulated years of header variants. Every
//! load runs through this module so the rest of the crate only ever sees the
//! canonical names below.

use crate::estate::sheets::model::ListingTable;

/// District part of the address, e.g. `강남구`.
pub const DISTRICT: &str = "지역_구";
/// Neighbourhood part of the address, e.g. `역삼동`.
pub const NEIGHBOURHOOD: &str = "지역_동";
/// Lot number, e.g. `50-1`.
pub const LOT: &str = "번지";
/// Building name.
pub const BUILDING: &str = "건물명";
/// Floor, kept as text to preserve forms such as `B1`.
pub const FLOOR: &str = "층";
/// Floor area in square metres.
pub const AREA: &str = "면적";
/// Deposit, in units of 10,000 KRW.
pub const DEPOSIT: &str = "보증금";
/// Sale price, in units of 10,000 KRW.
pub const PRICE: &str = "매매가";
/// Monthly rent, in units of 10,000 KRW.
pub const RENT: &str = "월차임";
/// Monthly maintenance fee, in units of 10,000 KRW.
pub const MAINTENANCE: &str = "관리비";
/// Premium paid to the outgoing tenant, in units of 10,000 KRW.
pub const PREMIUM: &str = "권리금";
/// Free-form description.
pub const DESCRIPTION: &str = "내용";
/// Contact number.
pub const CONTACT: &str = "연락처";
/// Agent in charge.
pub const AGENT: &str = "담당자";

/// One canonical column together with its historical header aliases, listed
/// in priority order.
#[derive(Debug, Clone, Copy)]
pub struct CanonicalColumn {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

/// The canonical schema. A canonical name never appears as an alias of a
/// different canonical column, which keeps normalization idempotent.
pub const CANONICAL_COLUMNS: &[CanonicalColumn] = &[
    CanonicalColumn {
        name: DISTRICT,
        aliases: &["지역(구)", "지역구", "소재지_구", "구"],
    },
    CanonicalColumn {
        name: NEIGHBOURHOOD,
        aliases: &["지역(동)", "지역동", "소재지_동", "동"],
    },
    CanonicalColumn {
        name: LOT,
        aliases: &["지번", "번지수", "본번지"],
    },
    CanonicalColumn {
        name: BUILDING,
        aliases: &["빌딩명", "건물이름", "건물"],
    },
    CanonicalColumn {
        name: FLOOR,
        aliases: &["해당층", "층수"],
    },
    CanonicalColumn {
        name: AREA,
        aliases: &["면적(㎡)", "전용면적", "임대면적"],
    },
    CanonicalColumn {
        name: DEPOSIT,
        aliases: &["보증금(만원)", "임대보증금"],
    },
    CanonicalColumn {
        name: PRICE,
        aliases: &["매매가(만원)", "매매가격", "매매금액"],
    },
    CanonicalColumn {
        name: RENT,
        aliases: &["월차임(만원)", "월세", "차임", "월임대료"],
    },
    CanonicalColumn {
        name: MAINTENANCE,
        aliases: &["관리비(만원)", "월관리비"],
    },
    CanonicalColumn {
        name: PREMIUM,
        aliases: &["권리금(만원)", "바닥권리금"],
    },
    CanonicalColumn {
        name: DESCRIPTION,
        aliases: &["설명", "비고", "특이사항", "상세내용"],
    },
    CanonicalColumn {
        name: CONTACT,
        aliases: &["전화번호", "연락처1", "핸드폰"],
    },
    CanonicalColumn {
        name: AGENT,
        aliases: &["담당", "담당자명"],
    },
];

/// Strips whitespace from every header, then renames the first known alias
/// of each canonical column to the canonical name. A column already carrying
/// the canonical name is left alone, so applying this twice yields the same
/// result.
pub fn normalize_headers(headers: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = headers.iter().map(|header| header.trim().to_string()).collect();

    for canonical in CANONICAL_COLUMNS {
        if normalized.iter().any(|header| header == canonical.name) {
            continue;
        }
        for alias in canonical.aliases {
            if let Some(position) = normalized.iter().position(|header| header == alias) {
                normalized[position] = canonical.name.to_string();
                break;
            }
        }
    }

    normalized
}

/// Applies header normalization to a loaded table, rekeying every row to the
/// renamed headers.
pub fn normalize_table(table: &mut ListingTable) {
    let normalized = normalize_headers(&table.columns);

    let renames: Vec<(String, String)> = table
        .columns
        .iter()
        .zip(&normalized)
        .filter(|(old, new)| old != new)
        .map(|(old, new)| (old.clone(), new.clone()))
        .collect();

    if !renames.is_empty() {
        for row in &mut table.rows {
            for (old, new) in &renames {
                if let Some(value) = row.values.remove(old) {
                    row.values.entry(new.clone()).or_insert(value);
                }
            }
        }
    }

    table.columns = normalized;
}
