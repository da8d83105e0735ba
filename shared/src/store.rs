//! The application state container.
//!
//! `AppState` is the single owner of everything the sidebar, the map and the
//! URL show. All mutation goes through its methods. Setters never fail: bad
//! input is coerced to a safe default.

use serde_json::Value;

use crate::config::{
    DEFAULT_CENTER, DEFAULT_TILE_PROVIDER, DEFAULT_ZOOM, MAX_PLACE_INPUTS, MAX_ZOOM, PLACE_ZOOM,
    TileProvider, tile_provider,
};
use crate::directions::parse_directions;
use crate::error::ValidationError;
use crate::geocode::{GeocodeFeature, current_location_waypoint, waypoint_from_map_pick};
use crate::isochrone::IsochroneOptions;
use crate::model::{IsochroneResult, LatLng, MapViewport, Mode, Profile, RouteResult, Waypoint};
use crate::ors::{IsochroneArgs, RoutingArgs};
use crate::url_state::{UrlState, UrlStateView, serialize_places};

const MOVE_TOLERANCE: f64 = 1e-4;
const ZOOM_TOLERANCE: f64 = 0.1;
const DEFAULT_CENTER_TOLERANCE: f64 = 0.001;
const CURRENT_LOCATION_ZOOM: f64 = 15.0;

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    map_center: LatLng,
    zoom: f64,
    max_zoom: f64,
    tile_provider: String,
    mode: Mode,
    places: Vec<Waypoint>,
    route: Option<RouteResult>,
    isochrones: Option<IsochroneResult>,
    sidebar_open: bool,
    loading: bool,
    error: Option<String>,
    active_input_index: Option<usize>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            map_center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            max_zoom: MAX_ZOOM,
            tile_provider: DEFAULT_TILE_PROVIDER.to_string(),
            mode: Mode::Place,
            places: Vec::new(),
            route: None,
            isochrones: None,
            sidebar_open: false,
            loading: false,
            error: None,
            active_input_index: None,
        }
    }
}

/// What the URL sync compares to decide whether anything changed.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlFingerprint {
    pub places: String,
    pub mode: Mode,
    pub center: String,
    pub zoom: f64,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map_center(&self) -> LatLng {
        self.map_center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn max_zoom(&self) -> f64 {
        self.max_zoom
    }

    pub fn viewport(&self) -> MapViewport {
        MapViewport {
            center: self.map_center,
            zoom: self.zoom,
        }
    }

    pub fn tile_provider_id(&self) -> &str {
        &self.tile_provider
    }

    pub fn tile_provider(&self) -> &'static TileProvider {
        tile_provider(&self.tile_provider)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn places(&self) -> &[Waypoint] {
        &self.places
    }

    pub fn route(&self) -> Option<&RouteResult> {
        self.route.as_ref()
    }

    pub fn isochrones(&self) -> Option<&IsochroneResult> {
        self.isochrones.as_ref()
    }

    pub fn sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn active_input_index(&self) -> Option<usize> {
        self.active_input_index
    }

    // -- setters --------------------------------------------------------

    /// `None` resets to the default center.
    pub fn set_map_center(&mut self, center: Option<LatLng>) {
        self.map_center = center.unwrap_or(DEFAULT_CENTER);
    }

    /// `None`, zero and NaN reset to the default zoom. Any other value is
    /// stored as given; range checks happen when reading a URL.
    pub fn set_zoom(&mut self, zoom: Option<f64>) {
        self.zoom = match zoom {
            Some(z) if z != 0.0 && !z.is_nan() => z,
            _ => DEFAULT_ZOOM,
        };
    }

    pub fn set_mode(&mut self, mode: Option<Mode>) {
        self.mode = mode.unwrap_or_default();
    }

    pub fn set_places(&mut self, places: Vec<Waypoint>) {
        self.places = places;
    }

    pub fn set_route(&mut self, route: Option<RouteResult>) {
        self.route = route;
    }

    pub fn set_isochrones(&mut self, isochrones: Option<IsochroneResult>) {
        self.isochrones = isochrones;
    }

    pub fn set_sidebar_open(&mut self, open: bool) {
        self.sidebar_open = open;
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// `None` or an empty id selects the default provider.
    pub fn set_tile_provider(&mut self, id: Option<&str>) {
        self.tile_provider = id
            .filter(|id| !id.is_empty())
            .unwrap_or(DEFAULT_TILE_PROVIDER)
            .to_string();
    }

    /// Marks slot `index` as waiting for a map click, replacing any previous one.
    pub fn set_active_input_index(&mut self, index: Option<usize>) {
        self.active_input_index = index;
    }

    pub fn clear_active_input_index(&mut self) {
        self.active_input_index = None;
    }

    /// Drops the route together with its places.
    pub fn clear_route(&mut self) {
        self.route = None;
        self.places.clear();
    }

    /// Drops the isochrones together with their places.
    pub fn clear_isochrone(&mut self) {
        self.isochrones = None;
        self.places.clear();
    }

    // -- mode -----------------------------------------------------------

    /// Changes mode from the UI. Results of the previous mode are dropped.
    pub fn switch_mode(&mut self, mode: Mode) {
        if mode != self.mode {
            tracing::debug!(from = %self.mode, to = %mode, "switching mode");
            self.route = None;
            self.isochrones = None;
            self.mode = mode;
        }
        self.ensure_slots_for_mode();
    }

    /// Brings the slot list in line with the current mode: directions get at
    /// least two slots, every other mode exactly one.
    pub fn ensure_slots_for_mode(&mut self) {
        let min = self.mode.min_slots();
        if self.places.len() < min {
            self.places.resize_with(min, Waypoint::empty);
        }
        if let Some(max) = self.mode.max_slots() {
            self.places.truncate(max);
        }
        if self
            .active_input_index
            .is_some_and(|index| index >= self.places.len())
        {
            self.active_input_index = None;
        }
    }

    // -- place editing --------------------------------------------------

    /// Stores `place` in slot `index`; a resolved place also recenters the map.
    pub fn select_place(&mut self, index: usize, place: Waypoint) {
        let position = place.position();
        let Some(slot) = self.slot_mut(index) else {
            return;
        };
        *slot = place;
        if let Some(center) = position {
            self.set_map_center(Some(center));
            self.set_zoom(Some(PLACE_ZOOM));
        }
    }

    /// Updates the typed name only; coordinates stay as they are.
    pub fn rename_place(&mut self, index: usize, text: &str) {
        if let Some(slot) = self.slot_mut(index) {
            slot.name = text.to_string();
        }
    }

    pub fn clear_place(&mut self, index: usize) {
        if let Some(slot) = self.slot_mut(index) {
            *slot = Waypoint::empty();
        }
    }

    /// Returns `false` once the input limit is reached.
    pub fn add_place(&mut self) -> bool {
        if self.places.len() >= MAX_PLACE_INPUTS {
            return false;
        }
        self.places.push(Waypoint::empty());
        true
    }

    /// The last remaining slot cannot be removed.
    pub fn remove_place(&mut self, index: usize) -> bool {
        if self.places.len() <= 1 || index >= self.places.len() {
            return false;
        }
        self.places.remove(index);
        match self.active_input_index {
            Some(active) if active == index => self.active_input_index = None,
            Some(active) if active > index => self.active_input_index = Some(active - 1),
            _ => {}
        }
        true
    }

    pub fn reverse_places(&mut self) -> bool {
        if self.places.len() < 2 {
            return false;
        }
        self.places.reverse();
        true
    }

    /// Resets the inputs to the mode's empty layout and drops the route.
    pub fn clear_all_places(&mut self) {
        self.clear_route();
        self.ensure_slots_for_mode();
    }

    /// Slots the sidebar shows: only the origin in isochrones mode.
    pub fn visible_places(&self) -> &[Waypoint] {
        match self.mode {
            Mode::Isochrones => &self.places[..self.places.len().min(1)],
            _ => &self.places,
        }
    }

    pub fn resolved_places(&self) -> impl Iterator<Item = &Waypoint> {
        self.places.iter().filter(|place| place.is_resolved())
    }

    /// Slot `index`, growing the list with empty slots up to it.
    /// `None` past the input limit.
    fn slot_mut(&mut self, index: usize) -> Option<&mut Waypoint> {
        if index >= MAX_PLACE_INPUTS {
            tracing::debug!(index, "place index past the input limit");
            return None;
        }
        if index >= self.places.len() {
            self.places.resize_with(index + 1, Waypoint::empty);
        }
        self.places.get_mut(index)
    }

    // -- map events -----------------------------------------------------

    /// Fills the active slot from a map click at `(lat, lng)`.
    ///
    /// `hit` is the reverse-geocoding result for the click, if any. Returns
    /// `false` when no slot was waiting for a click.
    pub fn pick_from_map(&mut self, lat: f64, lng: f64, hit: Option<&GeocodeFeature>) -> bool {
        let Some(index) = self.active_input_index.take() else {
            return false;
        };
        let Some(slot) = self.slot_mut(index) else {
            return false;
        };
        *slot = waypoint_from_map_pick(lat, lng, hit);
        if hit.is_some() {
            self.set_map_center(Some(LatLng::new(lat, lng)));
            self.set_zoom(Some(PLACE_ZOOM));
        }
        tracing::debug!(index, lat, lng, found = hit.is_some(), "place picked from map");
        true
    }

    /// Fills slot `index` with the user's own position.
    ///
    /// `hit` is the reverse-geocoding result for that position, if any.
    pub fn select_current_location(
        &mut self,
        index: usize,
        lat: f64,
        lng: f64,
        hit: Option<&GeocodeFeature>,
    ) {
        let Some(slot) = self.slot_mut(index) else {
            return;
        };
        *slot = current_location_waypoint(lat, lng, hit);
        self.set_map_center(Some(LatLng::new(lat, lng)));
        self.set_zoom(Some(CURRENT_LOCATION_ZOOM));
    }

    /// Whether the map still shows the fallback center.
    pub fn is_at_default_center(&self) -> bool {
        !self.map_center.moved_from(DEFAULT_CENTER, DEFAULT_CENTER_TOLERANCE)
    }

    /// Recenters on the user's position found at startup.
    pub fn center_on_user(&mut self, lat: f64, lng: f64) {
        self.set_map_center(Some(LatLng::new(lat, lng)));
        self.set_zoom(Some(PLACE_ZOOM));
    }

    /// Returns whether the stored center changed.
    pub fn on_move_end(&mut self, center: LatLng) -> bool {
        if !center.moved_from(self.map_center, MOVE_TOLERANCE) {
            return false;
        }
        self.set_map_center(Some(center));
        true
    }

    /// Returns whether the stored zoom changed.
    pub fn on_zoom_end(&mut self, zoom: f64) -> bool {
        if (zoom - self.zoom).abs() <= ZOOM_TOLERANCE {
            return false;
        }
        self.set_zoom(Some(zoom));
        true
    }

    // -- requests -------------------------------------------------------

    /// Validates the places and marks a directions request as in flight.
    ///
    /// On a validation error the message is shown and nothing is sent.
    pub fn begin_directions(&mut self, profile: Profile) -> Result<RoutingArgs, ValidationError> {
        let args = RoutingArgs::from_places(&self.places, profile).inspect_err(|err| {
            self.error = Some(err.to_string());
        })?;
        self.loading = true;
        self.error = None;
        Ok(args)
    }

    /// Stores the routing service answer, or the failure message.
    pub fn complete_directions(&mut self, response: Result<Value, String>) {
        let parsed = response.and_then(|data| parse_directions(&data).map_err(|err| err.to_string()));
        match parsed {
            Ok(parsed) => {
                tracing::info!(
                    distance = parsed.route.distance,
                    duration = parsed.route.duration,
                    source = ?parsed.summary_source,
                    "route computed"
                );
                self.route = Some(parsed.route);
                self.loading = false;
                self.error = None;
            }
            Err(message) => self.fail_request(message),
        }
    }

    pub fn begin_isochrones(
        &mut self,
        options: &IsochroneOptions,
    ) -> Result<IsochroneArgs, ValidationError> {
        let args = IsochroneArgs::from_places(self.visible_places(), options).inspect_err(|err| {
            self.error = Some(err.to_string());
        })?;
        self.loading = true;
        self.error = None;
        Ok(args)
    }

    pub fn complete_isochrones(&mut self, response: Result<IsochroneResult, String>) {
        match response {
            Ok(result) => {
                tracing::info!(polygons = result.features.len(), "isochrones computed");
                self.isochrones = Some(result);
                self.loading = false;
                self.error = None;
            }
            Err(message) => self.fail_request(message),
        }
    }

    /// Shows a service failure. Results and places are kept.
    pub fn fail_request(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("request failed: {message}");
        self.error = Some(message);
        self.loading = false;
    }

    // -- url ------------------------------------------------------------

    pub fn url_view(&self) -> UrlStateView<'_> {
        UrlStateView {
            mode: self.mode,
            places: &self.places,
            map_center: Some(self.map_center),
            zoom: Some(self.zoom),
        }
    }

    pub fn url_fingerprint(&self) -> UrlFingerprint {
        UrlFingerprint {
            places: serialize_places(&self.places),
            mode: self.mode,
            center: format!("{:.6},{:.6}", self.map_center.lat, self.map_center.lng),
            zoom: self.zoom,
        }
    }

    /// Merges the keys present in `state`; absent keys leave the current
    /// values alone.
    pub fn apply_url_state(&mut self, state: UrlState) {
        if let Some(mode) = state.mode {
            self.set_mode(Some(mode));
        }
        if let Some(places) = state.places.filter(|places| !places.is_empty()) {
            self.set_places(places);
        }
        if let Some(center) = state.map_center {
            self.set_map_center(Some(center));
        }
        if let Some(zoom) = state.zoom {
            self.set_zoom(Some(zoom));
        }
        self.ensure_slots_for_mode();
    }
}
