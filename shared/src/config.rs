//! Application defaults shared by the CLI and the web client.

use std::time::Duration;

use crate::model::LatLng;

pub const APP_NAME: &str = "Open RouteFinder";

/// Fallback map center (London).
pub const DEFAULT_CENTER: LatLng = LatLng {
    lat: 51.505,
    lng: -0.09,
};
pub const DEFAULT_ZOOM: f64 = 6.0;
pub const MAX_ZOOM: f64 = 18.0;
/// Zoom levels accepted from a URL.
pub const MIN_URL_ZOOM: f64 = 1.0;
pub const MAX_URL_ZOOM: f64 = 20.0;
/// Zoom applied when the map jumps to a selected place.
pub const PLACE_ZOOM: f64 = 12.0;

pub const MAX_PLACE_INPUTS: usize = 50;

pub const URL_SYNC_DELAY: Duration = Duration::from_millis(500);
pub const SUGGESTION_DELAY: Duration = Duration::from_millis(200);
pub const MIN_SEARCH_LENGTH: usize = 2;
pub const SUGGESTION_COUNT: usize = 8;

pub const DEFAULT_API_BASE_URL: &str = "https://api.openrouteservice.org";
pub const DEFAULT_TILE_PROVIDER: &str = "osm";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileProvider {
    pub id: &'static str,
    pub name: &'static str,
    pub url: &'static str,
    pub attribution: &'static str,
    pub max_zoom: u8,
}

pub const TILE_PROVIDERS: [TileProvider; 5] = [
    TileProvider {
        id: "osm",
        name: "OpenStreetMap",
        url: "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
        attribution: "&copy; <a target=\"_blank\" href=\"https://osm.org/copyright\">OpenStreetMap</a> contributors",
        max_zoom: 19,
    },
    TileProvider {
        id: "satellite",
        name: "Satellite",
        url: "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
        attribution: "Tiles &copy; Esri &mdash; Source: Esri, i-cubed, USDA, USGS, AEX, GeoEye, Getmapping, Aerogrid, IGN, IGP, UPR-EGP, and the GIS User Community",
        max_zoom: 19,
    },
    TileProvider {
        id: "google-maps",
        name: "Google Maps Style",
        url: "https://mt1.google.com/vt/lyrs=m&x={x}&y={y}&z={z}",
        attribution: "&copy; Google",
        max_zoom: 20,
    },
    TileProvider {
        id: "google-satellite",
        name: "Google Satellite",
        url: "https://mt1.google.com/vt/lyrs=s&x={x}&y={y}&z={z}",
        attribution: "&copy; Google",
        max_zoom: 20,
    },
    TileProvider {
        id: "google-hybrid",
        name: "Google Hybrid",
        url: "https://mt1.google.com/vt/lyrs=y&x={x}&y={y}&z={z}",
        attribution: "&copy; Google",
        max_zoom: 20,
    },
];

/// Looks up a provider by id, falling back to the first one.
pub fn tile_provider(id: &str) -> &'static TileProvider {
    TILE_PROVIDERS
        .iter()
        .find(|provider| provider.id == id)
        .unwrap_or(&TILE_PROVIDERS[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_provider_lookup() {
        assert_eq!(tile_provider("satellite").name, "Satellite");
        assert_eq!(tile_provider("google-hybrid").max_zoom, 20);
    }

    #[test]
    fn test_unknown_tile_provider_falls_back_to_osm() {
        assert_eq!(tile_provider("nope").id, DEFAULT_TILE_PROVIDER);
    }
}
