use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// `true` when either axis differs by more than `tolerance` degrees.
    pub fn moved_from(self, other: Self, tolerance: f64) -> bool {
        (self.lat - other.lat).abs() > tolerance || (self.lng - other.lng).abs() > tolerance
    }

    /// `[lng, lat]` order expected by the routing service.
    pub fn to_lng_lat(self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

/// Display name used when a place has no name of its own, e.g. `"51.5050, -0.0900"`.
pub fn coordinate_label(lat: f64, lng: f64) -> String {
    format!("{lat:.4}, {lng:.4}")
}

/// One place in a route, or the origin of an isochrone.
///
/// Fresh input slots carry no coordinates and an empty name. A waypoint is
/// *resolved* once both coordinates are finite numbers; only resolved
/// waypoints are sent to the routing service or written to the URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Waypoint {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(lat: f64, lng: f64, name: impl Into<String>) -> Self {
        Self {
            lat: Some(lat),
            lng: Some(lng),
            name: name.into(),
            address: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.position().is_some()
    }

    pub fn position(&self) -> Option<LatLng> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => {
                Some(LatLng { lat, lng })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Place,
    Directions,
    Isochrones,
    Search,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Place, Mode::Directions, Mode::Isochrones, Mode::Search];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Place => "place",
            Mode::Directions => "directions",
            Mode::Isochrones => "isochrones",
            Mode::Search => "search",
        }
    }

    /// Minimum number of input slots the sidebar shows in this mode.
    pub fn min_slots(self) -> usize {
        match self {
            Mode::Directions => 2,
            _ => 1,
        }
    }

    /// Upper bound on input slots, `None` when the list may grow.
    pub fn max_slots(self) -> Option<usize> {
        match self {
            Mode::Directions => None,
            _ => Some(1),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value `{0}`")]
pub struct UnknownVariant(pub String);

impl FromStr for Mode {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// Travel profiles understood by the routing service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    #[default]
    DrivingCar,
    DrivingHgv,
    CyclingRegular,
    CyclingRoad,
    FootWalking,
    FootHiking,
}

impl Profile {
    pub const ALL: [Profile; 6] = [
        Profile::DrivingCar,
        Profile::DrivingHgv,
        Profile::CyclingRegular,
        Profile::CyclingRoad,
        Profile::FootWalking,
        Profile::FootHiking,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Profile::DrivingCar => "driving-car",
            Profile::DrivingHgv => "driving-hgv",
            Profile::CyclingRegular => "cycling-regular",
            Profile::CyclingRoad => "cycling-road",
            Profile::FootWalking => "foot-walking",
            Profile::FootHiking => "foot-hiking",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Profile::DrivingCar => "Car",
            Profile::DrivingHgv => "Truck",
            Profile::CyclingRegular => "Bicycle",
            Profile::CyclingRoad => "Road Bike",
            Profile::FootWalking => "Walking",
            Profile::FootHiking => "Hiking",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Profile::ALL
            .into_iter()
            .find(|profile| profile.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeType {
    #[default]
    Time,
    Distance,
}

impl RangeType {
    pub fn as_str(self) -> &'static str {
        match self {
            RangeType::Time => "time",
            RangeType::Distance => "distance",
        }
    }
}

impl FromStr for RangeType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time" => Ok(RangeType::Time),
            "distance" => Ok(RangeType::Distance),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapViewport {
    pub center: LatLng,
    pub zoom: f64,
}

/// Route line as returned by the routing service (`[lng, lat(, elevation)]` positions).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineGeometry {
    #[serde(rename = "type", default = "line_string")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: Vec<Vec<f64>>,
}

fn line_string() -> String {
    "LineString".to_string()
}

impl LineGeometry {
    pub fn points(&self) -> impl Iterator<Item = LatLng> + '_ {
        self.coordinates.iter().filter_map(|position| match position.as_slice() {
            [lng, lat, ..] => Some(LatLng::new(*lat, *lng)),
            _ => None,
        })
    }

    pub fn elevations(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.coordinates.iter().map(|position| position.get(2).copied())
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub geometry: LineGeometry,
    /// As reported by the service (meters, or km when requested in km).
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
    #[serde(default)]
    pub segments: Vec<Value>,
}

/// Polygons reachable from an origin, as a GeoJSON `FeatureCollection`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IsochroneResult {
    #[serde(default)]
    pub features: Vec<IsochroneFeature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsochroneFeature {
    pub geometry: Value,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl IsochroneFeature {
    /// The range value (seconds or meters) this polygon was computed for.
    pub fn range_value(&self) -> Option<f64> {
        self.properties.get("value").and_then(Value::as_f64)
    }
}
