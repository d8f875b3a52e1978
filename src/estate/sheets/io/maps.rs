//! Map backend adapter: address geocoding and static raster map requests.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::estate::sheets::config::MapsConfig;
use crate::estate::sheets::error::{Result, SheetError};

/// Height cap enforced by the static map service; larger requests are
/// clamped rather than rejected.
pub const MAX_MAP_HEIGHT: u32 = 640;

/// Zoom level used by the detail screen when none is given.
pub const DEFAULT_ZOOM: u8 = 16;

/// Geographic coordinates returned by the geocoder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A static raster map request for one listing's position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StaticMap {
    pub center: Coordinates,
    pub zoom: u8,
    pub width: u32,
    pub height: u32,
}

impl StaticMap {
    /// Builds a request with the height clamped to [`MAX_MAP_HEIGHT`].
    pub fn new(center: Coordinates, zoom: u8, width: u32, height: u32) -> Self {
        Self {
            center,
            zoom,
            width,
            height: height.min(MAX_MAP_HEIGHT),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    addresses: Vec<GeocodeAddress>,
}

/// The geocoder returns coordinates as decimal strings, longitude in `x`.
#[derive(Debug, Deserialize)]
struct GeocodeAddress {
    x: String,
    y: String,
}

/// HTTP client for the map backend.
pub struct MapClient {
    http: reqwest::blocking::Client,
    config: MapsConfig,
}

impl MapClient {
    pub fn new(config: MapsConfig) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            config,
        }
    }

    /// Geocodes a free-form address to coordinates.
    pub fn geocode(&self, address: &str) -> Result<Coordinates> {
        let response = self
            .http
            .get(&self.config.geocode_url)
            .query(&[("query", address)])
            .header("X-API-KEY", &self.config.api_key)
            .send()?;

        if !response.status().is_success() {
            return Err(SheetError::Backend {
                endpoint: self.config.geocode_url.clone(),
                status: response.status().as_u16(),
            });
        }

        let body: GeocodeResponse = response.json()?;
        let first = body
            .addresses
            .first()
            .ok_or_else(|| SheetError::Geocode(address.to_string()))?;

        let lng = first
            .x
            .parse()
            .map_err(|_| SheetError::Geocode(address.to_string()))?;
        let lat = first
            .y
            .parse()
            .map_err(|_| SheetError::Geocode(address.to_string()))?;

        let coordinates = Coordinates { lat, lng };
        debug!(address, lat = coordinates.lat, lng = coordinates.lng, "address geocoded");
        Ok(coordinates)
    }

    /// URL of the raster image for a static map request, suitable for
    /// embedding by the detail screen.
    pub fn static_map_url(&self, map: &StaticMap) -> String {
        format!(
            "{}?center={},{}&level={}&w={}&h={}",
            self.config.static_map_url, map.center.lng, map.center.lat, map.zoom, map.width, map.height
        )
    }

    /// Fetches the raster image bytes for a static map request.
    pub fn static_map(&self, map: &StaticMap) -> Result<Vec<u8>> {
        let endpoint = self.static_map_url(map);
        let response = self
            .http
            .get(&endpoint)
            .header("X-API-KEY", &self.config.api_key)
            .send()?;

        if !response.status().is_success() {
            return Err(SheetError::Backend {
                endpoint,
                status: response.status().as_u16(),
            });
        }
        Ok(response.bytes()?.to_vec())
    }
}
