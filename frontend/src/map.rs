//! Bindings to `map_bridge.js` and the payloads passed to it.

use serde::Serialize;
use serde_json::json;
use serde_wasm_bindgen::Serializer;
use shared::config::TileProvider;
use shared::model::{IsochroneResult, MapViewport, RouteResult, Waypoint};
use wasm_bindgen::prelude::{JsValue, wasm_bindgen};

#[wasm_bindgen(module = "/map_bridge.js")]
extern "C" {
    #[wasm_bindgen(js_name = initMap)]
    pub fn init_map(container_id: &str, lat: f64, lng: f64, zoom: f64);
    #[wasm_bindgen(js_name = setView)]
    fn set_view(lat: f64, lng: f64, zoom: f64);
    #[wasm_bindgen(js_name = setTileLayer)]
    fn set_tile_layer(url: &str, attribution: &str, max_zoom: u8);
    #[wasm_bindgen(js_name = updateMarkers)]
    fn update_markers(places: JsValue);
    #[wasm_bindgen(js_name = updateRoute)]
    fn update_route(lat_lngs: JsValue);
    #[wasm_bindgen(js_name = updateIsochrones)]
    fn update_isochrones(collection: JsValue);
    #[wasm_bindgen(js_name = setPickCursor)]
    fn set_pick_cursor(active: bool);
}

/// Plain JS objects and arrays, never `Map`s.
fn to_js<T: Serialize>(value: &T) -> JsValue {
    value
        .serialize(&Serializer::json_compatible())
        .unwrap_or(JsValue::NULL)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub lat: f64,
    pub lng: f64,
    pub name: String,
}

/// Markers for the resolved places, in input order.
pub fn markers(places: &[Waypoint]) -> Vec<Marker> {
    places
        .iter()
        .filter_map(|place| {
            let position = place.position()?;
            Some(Marker {
                lat: position.lat,
                lng: position.lng,
                name: place.name.clone(),
            })
        })
        .collect()
}

/// Route line as `[lat, lng]` pairs, the order Leaflet expects.
pub fn route_line(route: &RouteResult) -> Vec<[f64; 2]> {
    route
        .geometry
        .points()
        .map(|point| [point.lat, point.lng])
        .collect()
}

/// GeoJSON for the polygons, each wrapped as a `Feature`.
pub fn feature_collection(result: &IsochroneResult) -> serde_json::Value {
    let features: Vec<_> = result
        .features
        .iter()
        .map(|feature| {
            json!({
                "type": "Feature",
                "geometry": feature.geometry,
                "properties": feature.properties,
            })
        })
        .collect();
    json!({"type": "FeatureCollection", "features": features})
}

/// What was last sent to the map, so only changes are pushed.
#[derive(Debug, Default)]
pub struct MapSync {
    viewport: Option<MapViewport>,
    tile_provider: Option<&'static str>,
    markers: Option<Vec<Marker>>,
    route: Option<Option<RouteResult>>,
    isochrones: Option<Option<IsochroneResult>>,
    picking: Option<bool>,
}

impl MapSync {
    /// Records a viewport the map already shows, e.g. after the user panned.
    pub fn observed_viewport(&mut self, viewport: MapViewport) {
        self.viewport = Some(viewport);
    }

    pub fn viewport(&mut self, viewport: MapViewport) {
        if self.viewport.replace(viewport) != Some(viewport) {
            set_view(viewport.center.lat, viewport.center.lng, viewport.zoom);
        }
    }

    pub fn tile_provider(&mut self, provider: &'static TileProvider) {
        if self.tile_provider.replace(provider.id) != Some(provider.id) {
            set_tile_layer(provider.url, provider.attribution, provider.max_zoom);
        }
    }

    pub fn markers(&mut self, places: &[Waypoint]) {
        let markers = markers(places);
        if self.markers.as_ref() == Some(&markers) {
            return;
        }
        update_markers(to_js(&markers));
        self.markers = Some(markers);
    }

    pub fn route(&mut self, route: Option<&RouteResult>) {
        if self.route.as_ref().map(Option::as_ref) == Some(route) {
            return;
        }
        let line = route.map(route_line).unwrap_or_default();
        update_route(to_js(&line));
        self.route = Some(route.cloned());
    }

    pub fn isochrones(&mut self, isochrones: Option<&IsochroneResult>) {
        if self.isochrones.as_ref().map(Option::as_ref) == Some(isochrones) {
            return;
        }
        let value = match isochrones {
            Some(result) => to_js(&feature_collection(result)),
            None => JsValue::NULL,
        };
        update_isochrones(value);
        self.isochrones = Some(isochrones.cloned());
    }

    pub fn picking(&mut self, active: bool) {
        if self.picking.replace(active) != Some(active) {
            set_pick_cursor(active);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::model::LineGeometry;

    #[test]
    fn test_markers_skip_unresolved_places() {
        let places = [
            Waypoint::new(45.764, 4.8357, "Lyon"),
            Waypoint::empty(),
            Waypoint::new(45.7578, 4.8322, "Bellecour"),
        ];
        let markers = markers(&places);
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[1].name, "Bellecour");
    }

    #[test]
    fn test_marker_names_reach_the_bridge_verbatim() {
        let places = shared::url_state::deserialize_places("1,2,%3Cimg%20src%3Dx%20onerror%3Dalert(1)%3E");
        let payload = serde_json::to_value(markers(&places)).unwrap();
        assert_eq!(payload[0]["name"], "<img src=x onerror=alert(1)>");
    }

    #[test]
    fn test_feature_collection_wraps_polygons() {
        let result: IsochroneResult = serde_json::from_value(json!({
            "features": [{"geometry": {"type": "Polygon", "coordinates": []}, "properties": {"value": 600}}]
        }))
        .unwrap();
        let collection = feature_collection(&result);
        assert_eq!(collection["type"], "FeatureCollection");
        assert_eq!(collection["features"][0]["type"], "Feature");
        assert_eq!(collection["features"][0]["properties"]["value"], 600);
    }

    #[test]
    fn test_route_line_is_lat_lng() {
        let route = RouteResult {
            geometry: LineGeometry {
                kind: "LineString".into(),
                coordinates: vec![vec![4.8357, 45.764, 170.0], vec![4.8322, 45.7578]],
            },
            distance: 1.0,
            duration: 60.0,
            segments: Vec::new(),
        };
        assert_eq!(route_line(&route), vec![[45.764, 4.8357], [45.7578, 4.8322]]);
    }
}
