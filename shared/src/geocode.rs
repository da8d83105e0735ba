//! Geocoding responses and the suggestion list built from them.

use serde::{Deserialize, Serialize};

use crate::model::{LatLng, Waypoint, coordinate_label};

const CURRENT_LOCATION: &str = "Current Location";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResponse {
    #[serde(default)]
    pub features: Vec<GeocodeFeature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeFeature {
    pub geometry: PointGeometry,
    #[serde(default)]
    pub properties: PlaceProperties,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointGeometry {
    /// `[lng, lat]`
    pub coordinates: [f64; 2],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl GeocodeFeature {
    pub fn position(&self) -> LatLng {
        let [lng, lat] = self.geometry.coordinates;
        LatLng { lat, lng }
    }

    /// Label, else name. Empty strings count as missing.
    pub fn title(&self) -> Option<&str> {
        let props = &self.properties;
        props
            .label
            .as_deref()
            .filter(|label| !label.is_empty())
            .or_else(|| props.name.as_deref().filter(|name| !name.is_empty()))
    }

    pub fn to_waypoint(&self) -> Waypoint {
        let LatLng { lat, lng } = self.position();
        Waypoint {
            lat: Some(lat),
            lng: Some(lng),
            name: self.title().unwrap_or("Unknown").to_string(),
            address: self.properties.label.clone(),
        }
    }
}

/// Place picked by clicking the map at `(lat, lng)`.
///
/// With a reverse-geocoding hit the hit's own coordinates are used;
/// otherwise the clicked point is named after its coordinates.
pub fn waypoint_from_map_pick(lat: f64, lng: f64, hit: Option<&GeocodeFeature>) -> Waypoint {
    match hit {
        Some(feature) => {
            let position = feature.position();
            Waypoint {
                lat: Some(position.lat),
                lng: Some(position.lng),
                name: feature
                    .title()
                    .map(str::to_string)
                    .unwrap_or_else(|| coordinate_label(lat, lng)),
                address: feature.properties.label.clone(),
            }
        }
        None => {
            let label = coordinate_label(lat, lng);
            Waypoint {
                lat: Some(lat),
                lng: Some(lng),
                name: label.clone(),
                address: Some(label),
            }
        }
    }
}

/// The user's own position as a place.
///
/// A reverse-geocoding hit supplies the coordinates and the name; otherwise the
/// raw position is kept and the coordinates go into the address.
pub fn current_location_waypoint(lat: f64, lng: f64, hit: Option<&GeocodeFeature>) -> Waypoint {
    match hit {
        Some(feature) => {
            let position = feature.position();
            Waypoint {
                lat: Some(position.lat),
                lng: Some(position.lng),
                name: feature.title().unwrap_or(CURRENT_LOCATION).to_string(),
                address: feature.properties.label.clone(),
            }
        }
        None => Waypoint {
            lat: Some(lat),
            lng: Some(lng),
            name: CURRENT_LOCATION.to_string(),
            address: Some(coordinate_label(lat, lng)),
        },
    }
}

/// Drops suggestions that repeat what was typed, and "current location" entries.
pub fn filter_suggestions(term: &str, features: Vec<GeocodeFeature>) -> Vec<GeocodeFeature> {
    let normalized = term.trim().to_lowercase();
    features
        .into_iter()
        .filter(|feature| {
            let label = feature.title().unwrap_or_default().to_lowercase();
            label != normalized && !label.contains("current location")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(label: Option<&str>, name: Option<&str>, lng: f64, lat: f64) -> GeocodeFeature {
        GeocodeFeature {
            geometry: PointGeometry {
                coordinates: [lng, lat],
            },
            properties: PlaceProperties {
                label: label.map(str::to_string),
                name: name.map(str::to_string),
                ..PlaceProperties::default()
            },
        }
    }

    #[test]
    fn test_deserialize_service_payload() {
        let payload = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [-0.0877, 51.5079]},
                "properties": {"label": "London Bridge, London, England, United Kingdom",
                               "name": "London Bridge", "layer": "venue", "country": "United Kingdom",
                               "confidence": 0.8}
            }]
        }"#;
        let response: GeocodeResponse = serde_json::from_str(payload).unwrap();
        let place = response.features[0].to_waypoint();
        assert_eq!(place.lat, Some(51.5079));
        assert_eq!(place.lng, Some(-0.0877));
        assert_eq!(place.name, "London Bridge, London, England, United Kingdom");
        assert_eq!(response.features[0].properties.layer.as_deref(), Some("venue"));
    }

    #[test]
    fn test_missing_features_is_empty() {
        let response: GeocodeResponse = serde_json::from_str("{}").unwrap();
        assert!(response.features.is_empty());
    }

    #[test]
    fn test_waypoint_name_fallbacks() {
        assert_eq!(feature(None, Some("Paris"), 2.35, 48.85).to_waypoint().name, "Paris");
        assert_eq!(feature(Some(""), None, 2.35, 48.85).to_waypoint().name, "Unknown");
    }

    #[test]
    fn test_map_pick_with_and_without_hit() {
        let hit = feature(None, None, 2.3522, 48.8566);
        let picked = waypoint_from_map_pick(48.85, 2.35, Some(&hit));
        assert_eq!(picked.lat, Some(48.8566));
        assert_eq!(picked.name, "48.8500, 2.3500");

        let raw = waypoint_from_map_pick(48.85, 2.35, None);
        assert_eq!(raw.lat, Some(48.85));
        assert_eq!(raw.address.as_deref(), Some("48.8500, 2.3500"));
    }

    #[test]
    fn test_current_location_naming() {
        let hit = feature(Some("Place Bellecour, Lyon"), None, 4.8320, 45.7578);
        let named = current_location_waypoint(45.7579, 4.8321, Some(&hit));
        assert_eq!(named.name, "Place Bellecour, Lyon");
        assert_eq!(named.lng, Some(4.8320));

        let unnamed = current_location_waypoint(45.7579, 4.8321, Some(&feature(None, None, 4.83, 45.75)));
        assert_eq!(unnamed.name, "Current Location");
    }

    #[test]
    fn test_filter_suggestions() {
        let features = vec![
            feature(Some("Paris"), None, 2.35, 48.85),
            feature(Some("Paris, Texas"), None, -95.5, 33.6),
            feature(Some("Current Location"), None, 0.0, 0.0),
            feature(None, Some("PARIS"), 2.35, 48.85),
        ];
        let filtered = filter_suggestions("  paris ", features);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].title(), Some("Paris, Texas"));
    }
}
