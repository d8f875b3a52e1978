//! Environment-driven configuration.
//!
//! Everything the clients need to reach the backing document and the map
//! service comes from the environment (a local `.env` is honoured by the
//! binary), so the same build can point at the production document or at a
//! staging copy.

use std::env;
use std::time::Duration;

use crate::estate::sheets::error::{Result, SheetError};
use crate::estate::sheets::model::SheetKind;

/// Default lifetime of a cached sheet before the next read refetches it.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Per-sheet numeric export handles of the backing document. The handle
/// assignment belongs to the document, not the code, so it is configuration.
#[derive(Debug, Clone, Copy)]
pub struct SheetHandles([u64; 6]);

impl SheetHandles {
    pub fn new(handles: [u64; 6]) -> Self {
        Self(handles)
    }

    pub fn get(&self, sheet: SheetKind) -> u64 {
        self.0[sheet as usize]
    }
}

/// Spreadsheet backend settings.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the backing document.
    pub base_url: String,
    /// Bearer token for the update calls.
    pub api_token: String,
    pub handles: SheetHandles,
}

/// Map backend settings.
#[derive(Debug, Clone)]
pub struct MapsConfig {
    pub geocode_url: String,
    pub static_map_url: String,
    pub api_key: String,
}

/// Complete runtime configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    pub maps: MapsConfig,
    pub cache_ttl: Duration,
}

impl Config {
    /// Reads configuration from the environment. `ESTATE_SHEET_URL` and
    /// `ESTATE_SHEET_TOKEN` are required; everything else has defaults.
    pub fn from_env() -> Result<Self> {
        let backend = BackendConfig {
            base_url: required("ESTATE_SHEET_URL")?,
            api_token: required("ESTATE_SHEET_TOKEN")?,
            handles: SheetHandles(read_handles()?),
        };

        let maps = MapsConfig {
            geocode_url: with_default(
                "ESTATE_MAPS_GEOCODE_URL",
                "https://naveropenapi.apigw.ntruss.com/map-geocode/v2/geocode",
            ),
            static_map_url: with_default(
                "ESTATE_MAPS_STATIC_URL",
                "https://naveropenapi.apigw.ntruss.com/map-static/v2/raster",
            ),
            api_key: with_default("ESTATE_MAPS_KEY", ""),
        };

        let cache_ttl = match env::var("ESTATE_CACHE_TTL_SECS") {
            Ok(raw) => Duration::from_secs(parse_number(&raw, "ESTATE_CACHE_TTL_SECS")?),
            Err(_) => DEFAULT_CACHE_TTL,
        };

        Ok(Self {
            backend,
            maps,
            cache_ttl,
        })
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).map_err(|_| SheetError::Config(format!("{key} is not set")))
}

fn with_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_number(raw: &str, key: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| SheetError::Config(format!("{key} is not a number: '{raw}'")))
}

fn read_handles() -> Result<[u64; 6]> {
    const KEYS: [(&str, u64); 6] = [
        ("ESTATE_GID_RENTAL", 0),
        ("ESTATE_GID_SALE", 1),
        ("ESTATE_GID_RENTAL_CLOSED", 2),
        ("ESTATE_GID_SALE_CLOSED", 3),
        ("ESTATE_GID_RENTAL_BRIEFING", 4),
        ("ESTATE_GID_SALE_BRIEFING", 5),
    ];

    let mut handles = [0; 6];
    for (slot, (key, default)) in KEYS.iter().enumerate() {
        handles[slot] = match env::var(key) {
            Ok(raw) => parse_number(&raw, key)?,
            Err(_) => *default,
        };
    }
    Ok(handles)
}
