//! Shareable URL state.
//!
//! Mode, waypoints, map center and zoom are mirrored into the query string
//! so a view can be bookmarked, shared, and restored on reload.
//!
//! ```text
//! ?mode=directions&places=51.505000,-0.090000,London|48.856600,2.352200,Paris&center=51.505,-0.09&zoom=6
//! ```
//!
//! Decoding is forgiving: malformed pieces are dropped, never reported.

use serde::{Deserialize, Serialize};

use crate::config::{MAX_URL_ZOOM, MIN_URL_ZOOM};
use crate::model::{LatLng, Mode, Waypoint, coordinate_label};

pub const MODE_KEY: &str = "mode";
pub const PLACES_KEY: &str = "places";
pub const CENTER_KEY: &str = "center";
pub const ZOOM_KEY: &str = "zoom";

const PLACE_SEPARATOR: char = '|';

/// Encodes resolved waypoints as `lat,lng,name` triples joined by `|`.
///
/// Coordinates use six fixed decimals and names are percent-encoded, so the
/// only raw commas in a triple are the two field separators. Unresolved
/// waypoints are skipped.
pub fn serialize_places(places: &[Waypoint]) -> String {
    places
        .iter()
        .filter_map(|place| {
            let position = place.position()?;
            Some(format!(
                "{},{},{}",
                fixed6(position.lat),
                fixed6(position.lng),
                urlencoding::encode(&place.name)
            ))
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// Decodes the output of [`serialize_places`]; malformed segments are omitted.
pub fn deserialize_places(raw: &str) -> Vec<Waypoint> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    raw.split(PLACE_SEPARATOR)
        .filter_map(|segment| {
            let place = deserialize_place(segment);
            if place.is_none() {
                tracing::debug!("dropping malformed place segment {segment:?}");
            }
            place
        })
        .collect()
}

fn deserialize_place(segment: &str) -> Option<Waypoint> {
    let (lat, rest) = segment.split_once(',')?;
    let (lng, encoded_name) = rest.split_once(',')?;
    let lat = parse_float(lat)?;
    let lng = parse_float(lng)?;

    let decoded = decode_component(encoded_name).unwrap_or_else(|| encoded_name.to_string());
    let address = (!decoded.is_empty()).then(|| decoded.clone());
    let name = if decoded.is_empty() {
        coordinate_label(lat, lng)
    } else {
        decoded
    };

    Some(Waypoint {
        lat: Some(lat),
        lng: Some(lng),
        name,
        address,
    })
}

pub fn serialize_map_center(center: Option<LatLng>) -> String {
    match center {
        Some(LatLng { lat, lng }) if lat.is_finite() && lng.is_finite() => format!("{lat},{lng}"),
        _ => String::new(),
    }
}

pub fn deserialize_map_center(raw: &str) -> Option<LatLng> {
    if raw.trim().is_empty() {
        return None;
    }
    let mut parts = raw.split(',');
    let lat = parse_float(parts.next()?)?;
    let lng = parse_float(parts.next()?)?;
    Some(LatLng { lat, lng })
}

/// Ordered query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParams {
    pairs: Vec<(String, String)>,
}

impl UrlParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Replaces every value under `key` with a single one, keeping its position.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.pairs.iter().position(|(k, _)| k == key) {
            Some(idx) => {
                self.pairs[idx].1 = value;
                let mut seen = 0;
                self.pairs.retain(|(k, _)| {
                    if k == key {
                        seen += 1;
                        seen == 1
                    } else {
                        true
                    }
                });
            }
            None => self.pairs.push((key.to_string(), value)),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Renders `k=v&k=v` with keys and values percent-encoded.
    pub fn to_query_string(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Parses a query string, with or without its leading `?`.
    pub fn from_query_string(query: &str) -> Self {
        let pairs = query
            .trim_start_matches('?')
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                (form_decode(k), form_decode(v))
            })
            .collect();
        Self { pairs }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for UrlParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// The slice of application state mirrored into the URL.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UrlStateView<'a> {
    pub mode: Mode,
    pub places: &'a [Waypoint],
    pub map_center: Option<LatLng>,
    pub zoom: Option<f64>,
}

pub fn build_url_params(state: &UrlStateView<'_>) -> UrlParams {
    let mut params = UrlParams::new();

    if state.mode != Mode::Place {
        params.set(MODE_KEY, state.mode.as_str());
    }

    let places = serialize_places(state.places);
    if !places.is_empty() {
        params.set(PLACES_KEY, places);
    }

    let center = serialize_map_center(state.map_center);
    if !center.is_empty() {
        params.set(CENTER_KEY, center);
    }

    if let Some(zoom) = state.zoom {
        params.set(ZOOM_KEY, zoom.to_string());
    }

    params
}

/// Sparse state recovered from a URL. Absent keys must not touch existing state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UrlState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub places: Option<Vec<Waypoint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_center: Option<LatLng>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
}

impl UrlState {
    pub fn is_empty(&self) -> bool {
        self.mode.is_none() && self.places.is_none() && self.map_center.is_none() && self.zoom.is_none()
    }

    /// Whether the URL pinned a location (places or center).
    pub fn has_location(&self) -> bool {
        self.places.is_some() || self.map_center.is_some()
    }
}

pub fn parse_url_params(params: &UrlParams) -> UrlState {
    let mut state = UrlState::default();

    if let Some(raw) = non_empty(params.get(MODE_KEY)) {
        match raw.parse::<Mode>() {
            Ok(mode) => state.mode = Some(mode),
            Err(err) => tracing::debug!("ignoring url mode: {err}"),
        }
    }

    if let Some(raw) = non_empty(params.get(PLACES_KEY)) {
        let places = deserialize_places(raw);
        if !places.is_empty() {
            state.places = Some(places);
        }
    }

    if let Some(raw) = non_empty(params.get(CENTER_KEY)) {
        state.map_center = deserialize_map_center(raw);
    }

    if let Some(raw) = non_empty(params.get(ZOOM_KEY)) {
        state.zoom = parse_float(raw).filter(|zoom| (MIN_URL_ZOOM..=MAX_URL_ZOOM).contains(zoom));
        if state.zoom.is_none() {
            tracing::debug!("ignoring url zoom {raw:?}");
        }
    }

    state
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn fixed6(value: f64) -> String {
    // adding 0.0 turns -0.0 into 0.0
    format!("{:.6}", value + 0.0)
}

/// Parses the longest numeric prefix after leading whitespace
/// (`"51.5abc"` is `51.5`). Only finite results are returned.
pub fn parse_float(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;

    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Strict percent-decoding: any `%` not followed by two hex digits, or
/// escapes that do not form UTF-8, fail the whole component.
fn decode_component(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'%' {
            let valid = bytes
                .get(idx + 1..idx + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return None;
            }
            idx += 3;
        } else {
            idx += 1;
        }
    }
    urlencoding::decode(raw).ok().map(|decoded| decoded.into_owned())
}

fn form_decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    decode_component(&spaced).unwrap_or(spaced)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn london() -> Waypoint {
        Waypoint::new(51.505, -0.09, "London")
    }

    fn paris() -> Waypoint {
        Waypoint::new(48.8566, 2.3522, "Paris")
    }

    fn view(mode: Mode, places: &[Waypoint], center: Option<LatLng>, zoom: Option<f64>) -> UrlStateView<'_> {
        UrlStateView {
            mode,
            places,
            map_center: center,
            zoom,
        }
    }

    #[test]
    fn test_serialize_places_fixed_precision() {
        assert_eq!(
            serialize_places(&[london(), paris()]),
            "51.505000,-0.090000,London|48.856600,2.352200,Paris"
        );
    }

    #[test]
    fn test_serialize_places_skips_unresolved() {
        let places = [Waypoint::empty(), london(), Waypoint::empty()];
        assert_eq!(serialize_places(&places), "51.505000,-0.090000,London");
        assert_eq!(serialize_places(&[Waypoint::empty()]), "");
        assert_eq!(serialize_places(&[]), "");
    }

    #[test]
    fn test_serialize_places_encodes_names() {
        let place = Waypoint::new(1.0, 2.0, "Rue de Rivoli, Paris");
        assert_eq!(
            serialize_places(&[place]),
            "1.000000,2.000000,Rue%20de%20Rivoli%2C%20Paris"
        );
    }

    #[test]
    fn test_serialize_places_negative_zero() {
        let place = Waypoint::new(-0.0, 0.0, "Null Island");
        assert_eq!(serialize_places(&[place]), "0.000000,0.000000,Null%20Island");
    }

    #[test]
    fn test_round_trip_scenario() {
        let encoded = serialize_places(&[london(), paris()]);
        let decoded = deserialize_places(&encoded);
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].lat, Some(51.505));
        assert_eq!(decoded[0].lng, Some(-0.09));
        assert_eq!(decoded[0].name, "London");
        assert_eq!(decoded[1].lat, Some(48.8566));
        assert_eq!(decoded[1].lng, Some(2.3522));
        assert_eq!(decoded[1].name, "Paris");
        assert_eq!(decoded[1].address.as_deref(), Some("Paris"));
    }

    #[test]
    fn test_deserialize_empty() {
        assert!(deserialize_places("").is_empty());
        assert!(deserialize_places("   ").is_empty());
    }

    #[test]
    fn test_deserialize_missing_name_field_is_dropped() {
        assert!(deserialize_places("51.5,-0.09").is_empty());
    }

    #[test]
    fn test_deserialize_drops_only_malformed_segments() {
        let decoded = deserialize_places("abc,1,x|51.5,-0.09,London|1,2|48.85,xyz,Paris");
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].name, "London");
    }

    #[test]
    fn test_deserialize_empty_name_uses_coordinates() {
        let decoded = deserialize_places("51.505,-0.09,");
        assert_eq!(decoded[0].name, "51.5050, -0.0900");
        assert_eq!(decoded[0].address, None);
    }

    #[test]
    fn test_deserialize_keeps_raw_commas_in_name() {
        let decoded = deserialize_places("1,2,a,b,c");
        assert_eq!(decoded[0].name, "a,b,c");
    }

    #[test]
    fn test_deserialize_bad_escape_falls_back_to_raw() {
        let decoded = deserialize_places("1,2,100%25%zz");
        assert_eq!(decoded[0].name, "100%25%zz");

        let invalid_utf8 = deserialize_places("1,2,%E9t%E9");
        assert_eq!(invalid_utf8[0].name, "%E9t%E9");
    }

    #[test]
    fn test_deserialize_accepts_js_style_escapes() {
        // encodeURIComponent leaves ' ( ) unescaped
        let decoded = deserialize_places("1,2,St%20John's%20(North)");
        assert_eq!(decoded[0].name, "St John's (North)");
    }

    #[test]
    fn test_map_center_codec() {
        assert_eq!(serialize_map_center(Some(LatLng::new(51.505, -0.09))), "51.505,-0.09");
        assert_eq!(serialize_map_center(Some(LatLng::new(45.0, 5.0))), "45,5");
        assert_eq!(serialize_map_center(None), "");
        assert_eq!(serialize_map_center(Some(LatLng::new(f64::INFINITY, -0.09))), "");
        assert_eq!(serialize_map_center(Some(LatLng::new(51.505, f64::NEG_INFINITY))), "");
        assert_eq!(serialize_map_center(Some(LatLng::new(f64::NAN, 0.0))), "");

        assert_eq!(deserialize_map_center("51.505,-0.09"), Some(LatLng::new(51.505, -0.09)));
        assert_eq!(deserialize_map_center("51.505,-0.09,extra"), Some(LatLng::new(51.505, -0.09)));
        assert_eq!(deserialize_map_center("51.505"), None);
        assert_eq!(deserialize_map_center("north,south"), None);
        assert_eq!(deserialize_map_center(""), None);
    }

    #[test]
    fn test_build_url_params_defaults_are_empty() {
        let params = build_url_params(&view(Mode::Place, &[], None, None));
        assert!(params.is_empty());
        assert_eq!(params.to_query_string(), "");
    }

    #[test]
    fn test_build_url_params_full_state() {
        let places = [london(), paris()];
        let params = build_url_params(&view(
            Mode::Directions,
            &places,
            Some(LatLng::new(51.505, -0.09)),
            Some(6.0),
        ));
        let keys: Vec<_> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![MODE_KEY, PLACES_KEY, CENTER_KEY, ZOOM_KEY]);
        assert_eq!(params.get(MODE_KEY), Some("directions"));
        assert_eq!(params.get(CENTER_KEY), Some("51.505,-0.09"));
        assert_eq!(params.get(ZOOM_KEY), Some("6"));
    }

    #[test]
    fn test_build_url_params_omits_unresolved_places() {
        let places = [Waypoint::empty(), Waypoint::empty()];
        let params = build_url_params(&view(Mode::Isochrones, &places, None, Some(12.5)));
        assert!(!params.contains(PLACES_KEY));
        assert_eq!(params.get(ZOOM_KEY), Some("12.5"));
    }

    #[test]
    fn test_parse_url_params_zoom_range() {
        let parsed = parse_url_params(&UrlParams::from_query_string("zoom=25"));
        assert_eq!(parsed.zoom, None);
        assert!(parsed.is_empty());

        let parsed = parse_url_params(&UrlParams::from_query_string("zoom=10"));
        assert_eq!(parsed.zoom, Some(10.0));

        for edge in ["1", "20"] {
            let parsed = parse_url_params(&[(ZOOM_KEY, edge)].into_iter().collect());
            assert!(parsed.zoom.is_some(), "zoom {edge} should be accepted");
        }
        for rejected in ["0.5", "20.01", "abc", "-3"] {
            let parsed = parse_url_params(&[(ZOOM_KEY, rejected)].into_iter().collect());
            assert_eq!(parsed.zoom, None, "zoom {rejected} should be dropped");
        }
    }

    #[test]
    fn test_parse_url_params_unknown_mode_is_absent() {
        let parsed = parse_url_params(&UrlParams::from_query_string("mode=bogus"));
        assert_eq!(parsed.mode, None);

        let parsed = parse_url_params(&UrlParams::from_query_string("mode=search"));
        assert_eq!(parsed.mode, Some(Mode::Search));
    }

    #[test]
    fn test_parse_url_params_sparse() {
        let parsed = parse_url_params(&UrlParams::from_query_string(
            "?places=garbage&center=51.5,-0.09",
        ));
        assert_eq!(parsed.places, None);
        assert_eq!(parsed.mode, None);
        assert_eq!(parsed.map_center, Some(LatLng::new(51.5, -0.09)));
        assert!(parsed.has_location());
    }

    #[test]
    fn test_query_string_round_trip() {
        let places = [Waypoint::new(51.505, -0.09, "London Bridge|North"), paris()];
        let params = build_url_params(&view(
            Mode::Directions,
            &places,
            Some(LatLng::new(51.505, -0.09)),
            Some(12.0),
        ));
        let query = params.to_query_string();
        assert!(query.contains("London%2520Bridge"), "{query}");

        let parsed = parse_url_params(&UrlParams::from_query_string(&query));
        assert_eq!(parsed.mode, Some(Mode::Directions));
        assert_eq!(parsed.zoom, Some(12.0));
        let names: Vec<_> = parsed.places.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["London Bridge|North", "Paris"]);
    }

    #[test]
    fn test_from_query_string_form_rules() {
        let params = UrlParams::from_query_string("?a=1+2&&b&c=%zz&a=second");
        assert_eq!(params.get("a"), Some("1 2"));
        assert_eq!(params.get("b"), Some(""));
        assert_eq!(params.get("c"), Some("%zz"));
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn test_url_params_set_replaces_in_place() {
        let mut params: UrlParams = [("a", "1"), ("b", "2"), ("a", "3")].into_iter().collect();
        params.set("a", "x");
        assert_eq!(params.to_query_string(), "a=x&b=2");
    }

    #[test]
    fn test_parse_float_prefix_rules() {
        assert_eq!(parse_float("51.5"), Some(51.5));
        assert_eq!(parse_float("  -0.09"), Some(-0.09));
        assert_eq!(parse_float("51.5abc"), Some(51.5));
        assert_eq!(parse_float(".5"), Some(0.5));
        assert_eq!(parse_float("5."), Some(5.0));
        assert_eq!(parse_float("1e3x"), Some(1000.0));
        assert_eq!(parse_float("1e"), Some(1.0));
        assert_eq!(parse_float("-"), None);
        assert_eq!(parse_float("."), None);
        assert_eq!(parse_float("abc"), None);
        assert_eq!(parse_float("Infinity"), None);
        assert_eq!(parse_float("1e999"), None);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn resolved_waypoint() -> impl Strategy<Value = Waypoint> {
            (-90.0..=90.0f64, -180.0..=180.0f64, "[^|]{0,24}")
                .prop_map(|(lat, lng, name)| Waypoint::new(lat, lng, name))
        }

        fn rounded(value: f64) -> f64 {
            format!("{:.6}", value + 0.0).parse().unwrap()
        }

        proptest! {
            #[test]
            fn prop_places_round_trip(places in prop::collection::vec(resolved_waypoint(), 0..8)) {
                let decoded = deserialize_places(&serialize_places(&places));
                prop_assert_eq!(decoded.len(), places.len());

                for (original, restored) in places.iter().zip(&decoded) {
                    let lat = rounded(original.lat.unwrap());
                    let lng = rounded(original.lng.unwrap());
                    prop_assert_eq!(restored.lat, Some(lat));
                    prop_assert_eq!(restored.lng, Some(lng));

                    let expected_name = if original.name.is_empty() {
                        coordinate_label(lat, lng)
                    } else {
                        original.name.clone()
                    };
                    prop_assert_eq!(&restored.name, &expected_name);
                }
            }

            #[test]
            fn prop_unresolved_places_are_dropped(
                places in prop::collection::vec(resolved_waypoint(), 0..5),
                blanks in 0usize..4
            ) {
                let mut mixed = places.clone();
                mixed.extend(std::iter::repeat_n(Waypoint::empty(), blanks));
                prop_assert_eq!(serialize_places(&mixed), serialize_places(&places));
            }

            #[test]
            fn prop_url_zoom_always_in_range(raw in ".{0,12}") {
                let params: UrlParams = [(ZOOM_KEY, raw)].into_iter().collect();
                if let Some(zoom) = parse_url_params(&params).zoom {
                    prop_assert!((MIN_URL_ZOOM..=MAX_URL_ZOOM).contains(&zoom));
                }
            }

            #[test]
            fn prop_deserialize_never_panics(raw in ".{0,64}") {
                let _ = deserialize_places(&raw);
                let _ = deserialize_map_center(&raw);
            }
        }
    }
}
