//! Request arguments and endpoints of the routing service
//! (openrouteservice-compatible HTTP API).

use serde::Serialize;
use serde_json::Value;

use crate::config::{DEFAULT_CENTER, SUGGESTION_COUNT};
use crate::error::ValidationError;
use crate::isochrone::IsochroneOptions;
use crate::model::{LatLng, Profile, RangeType, Waypoint};
use crate::url_state::UrlParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    GeocodeSearch,
    GeocodeReverse,
    Directions(Profile),
    Isochrones(Profile),
}

impl Endpoint {
    pub fn path(&self) -> String {
        match self {
            Endpoint::GeocodeSearch => "/geocode/search".to_string(),
            Endpoint::GeocodeReverse => "/geocode/reverse".to_string(),
            Endpoint::Directions(profile) => format!("/v2/directions/{profile}/geojson"),
            Endpoint::Isochrones(profile) => format!("/v2/isochrones/{profile}"),
        }
    }

    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path())
    }

    pub fn url_with_query(&self, base_url: &str, params: &UrlParams) -> String {
        let url = self.url(base_url);
        if params.is_empty() {
            url
        } else {
            format!("{url}?{}", params.to_query_string())
        }
    }
}

/// Forward geocoding (autocomplete) arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceSearchArgs {
    pub text: String,
    pub size: usize,
    /// `[lat, lng]` the search is biased towards.
    pub focus_point: [f64; 2],
}

impl PlaceSearchArgs {
    pub fn new(text: impl Into<String>, focus: Option<LatLng>) -> Self {
        let focus = focus.unwrap_or(DEFAULT_CENTER);
        Self {
            text: text.into(),
            size: SUGGESTION_COUNT,
            focus_point: [focus.lat, focus.lng],
        }
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn to_params(&self) -> UrlParams {
        let [lat, lng] = self.focus_point;
        UrlParams::from_iter([
            ("text", self.text.clone()),
            ("size", self.size.to_string()),
            ("focus.point.lat", lat.to_string()),
            ("focus.point.lon", lng.to_string()),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReversePoint {
    pub lat_lng: [f64; 2],
    /// Kilometers.
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReverseSearchArgs {
    pub point: ReversePoint,
    pub size: usize,
}

impl ReverseSearchArgs {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            point: ReversePoint {
                lat_lng: [lat, lng],
                radius: 1.0,
            },
            size: SUGGESTION_COUNT,
        }
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn to_params(&self) -> UrlParams {
        let [lat, lng] = self.point.lat_lng;
        UrlParams::from_iter([
            ("point.lat", lat.to_string()),
            ("point.lon", lng.to_string()),
            ("boundary.circle.radius", self.point.radius.to_string()),
            ("size", self.size.to_string()),
        ])
    }
}

/// Directions request. `profile` and `format` travel in the URL path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingArgs {
    /// `[lng, lat]` pairs in travel order.
    pub coordinates: Vec<[f64; 2]>,
    #[serde(skip)]
    pub format: &'static str,
    pub elevation: bool,
    pub instructions_format: &'static str,
    pub language: &'static str,
    pub units: &'static str,
    #[serde(skip)]
    pub profile: Profile,
}

impl RoutingArgs {
    pub fn from_places(places: &[Waypoint], profile: Profile) -> Result<Self, ValidationError> {
        let coordinates: Vec<[f64; 2]> = places
            .iter()
            .filter_map(Waypoint::position)
            .map(LatLng::to_lng_lat)
            .collect();

        if coordinates.len() < 2 {
            return Err(ValidationError::NotEnoughPlaces {
                required: 2,
                found: coordinates.len(),
            });
        }

        Ok(Self {
            coordinates,
            format: "geojson",
            elevation: true,
            instructions_format: "html",
            language: "en",
            units: "km",
            profile,
        })
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::Directions(self.profile)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IsochroneArgs {
    pub locations: Vec<[f64; 2]>,
    /// Seconds for `time`, meters for `distance`.
    pub range: Vec<f64>,
    pub range_type: RangeType,
    #[serde(skip)]
    pub profile: Profile,
    #[serde(skip)]
    pub format: &'static str,
}

impl IsochroneArgs {
    pub fn from_places(
        places: &[Waypoint],
        options: &IsochroneOptions,
    ) -> Result<Self, ValidationError> {
        if places.is_empty() {
            return Err(ValidationError::NoPlace);
        }
        let locations: Vec<[f64; 2]> = places
            .iter()
            .filter_map(Waypoint::position)
            .map(LatLng::to_lng_lat)
            .collect();
        if locations.is_empty() {
            return Err(ValidationError::NoResolvedPlace);
        }
        if options.ranges().is_empty() {
            return Err(ValidationError::EmptyRanges);
        }

        Ok(Self {
            locations,
            range: options.ranges().to_vec(),
            range_type: options.range_type(),
            profile: options.profile,
            format: "geojson",
        })
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::Isochrones(self.profile)
    }
}

/// Message carried by an error body, `{"error": {"message": ..}}` or `{"error": ".."}`.
pub fn service_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_urls() {
        let base = "https://api.openrouteservice.org/";
        assert_eq!(
            Endpoint::Directions(Profile::FootHiking).url(base),
            "https://api.openrouteservice.org/v2/directions/foot-hiking/geojson"
        );
        assert_eq!(
            Endpoint::Isochrones(Profile::DrivingCar).url(base),
            "https://api.openrouteservice.org/v2/isochrones/driving-car"
        );
        assert_eq!(
            Endpoint::GeocodeReverse.url_with_query(base, &UrlParams::new()),
            "https://api.openrouteservice.org/geocode/reverse"
        );
    }

    #[test]
    fn test_place_search_focuses_on_map_center() {
        let args = PlaceSearchArgs::new("Big Ben", None);
        assert_eq!(args.size, 8);
        assert_eq!(args.focus_point, [51.505, -0.09]);

        let query = args.to_params().to_query_string();
        assert_eq!(
            query,
            "text=Big%20Ben&size=8&focus.point.lat=51.505&focus.point.lon=-0.09"
        );
    }

    #[test]
    fn test_reverse_search_params() {
        let args = ReverseSearchArgs::new(48.85, 2.35).with_size(1);
        let params = args.to_params();
        assert_eq!(params.get("point.lat"), Some("48.85"));
        assert_eq!(params.get("boundary.circle.radius"), Some("1"));
        assert_eq!(params.get("size"), Some("1"));
    }

    #[test]
    fn test_routing_args_need_two_resolved_places() {
        let places = [
            Waypoint::new(51.505, -0.09, "London"),
            Waypoint::empty(),
        ];
        assert_eq!(
            RoutingArgs::from_places(&places, Profile::DrivingCar),
            Err(ValidationError::NotEnoughPlaces {
                required: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_routing_args_body() {
        let places = [
            Waypoint::new(51.505, -0.09, "London"),
            Waypoint::empty(),
            Waypoint::new(48.8566, 2.3522, "Paris"),
        ];
        let args = RoutingArgs::from_places(&places, Profile::CyclingRoad).unwrap();
        assert_eq!(args.coordinates, vec![[-0.09, 51.505], [2.3522, 48.8566]]);
        assert_eq!(args.endpoint(), Endpoint::Directions(Profile::CyclingRoad));

        let body = serde_json::to_value(&args).unwrap();
        assert_eq!(body["units"], "km");
        assert_eq!(body["elevation"], true);
        assert!(body.get("profile").is_none());
    }

    #[test]
    fn test_isochrone_args_validation() {
        let options = IsochroneOptions::default();
        assert_eq!(
            IsochroneArgs::from_places(&[], &options),
            Err(ValidationError::NoPlace)
        );
        assert_eq!(
            IsochroneArgs::from_places(&[Waypoint::empty()], &options),
            Err(ValidationError::NoResolvedPlace)
        );

        let args =
            IsochroneArgs::from_places(&[Waypoint::new(51.505, -0.09, "London")], &options)
                .unwrap();
        let body = serde_json::to_value(&args).unwrap();
        assert_eq!(body["range"], serde_json::json!([600.0]));
        assert_eq!(body["range_type"], "time");
        assert_eq!(body["locations"], serde_json::json!([[-0.09, 51.505]]));
    }

    #[test]
    fn test_service_error_message_shapes() {
        assert_eq!(
            service_error_message(
                r#"{"error":{"code":2010,"message":"Could not find routable point"}}"#
            )
            .as_deref(),
            Some("Could not find routable point")
        );
        assert_eq!(
            service_error_message(r#"{"error":"Access to this API has been disallowed"}"#)
                .as_deref(),
            Some("Access to this API has been disallowed")
        );
        assert_eq!(service_error_message("<html>bad gateway</html>"), None);
        assert_eq!(service_error_message(r#"{"features":[]}"#), None);
    }
}
