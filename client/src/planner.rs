//! Drives an [`AppState`] through routing service calls, the way the web
//! frontend does, but awaiting each answer in turn.

use shared::directions::DirectionsError;
use shared::geocode::filter_suggestions;
use shared::model::{IsochroneResult, RouteResult};
use shared::ors::{PlaceSearchArgs, ReverseSearchArgs};
use shared::{AppState, GeocodeFeature, IsochroneOptions, Profile, Waypoint};

use crate::error::{ClientError, ClientResult};
use crate::service::RoutingService;

pub struct Planner<S> {
    service: S,
    state: AppState,
}

impl<S: RoutingService> Planner<S> {
    pub fn new(service: S) -> Self {
        Self::with_state(service, AppState::new())
    }

    pub fn with_state(service: S, state: AppState) -> Self {
        Self { service, state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub fn into_state(self) -> AppState {
        self.state
    }

    /// Place suggestions for `text`, biased towards the current map center.
    pub async fn search_places(
        &mut self,
        text: &str,
        size: usize,
    ) -> ClientResult<Vec<GeocodeFeature>> {
        let args = PlaceSearchArgs::new(text, Some(self.state.map_center())).with_size(size);
        let features = self
            .service
            .geocode(&args)
            .await
            .inspect_err(|err| self.state.fail_request(err.user_message()))?;
        Ok(filter_suggestions(text, features))
    }

    /// Fills slot `index` as if the map had been clicked at `(lat, lng)`.
    ///
    /// A failed lookup is treated like an empty answer: the slot is named
    /// after the coordinates.
    pub async fn pick_place(&mut self, index: usize, lat: f64, lng: f64) -> ClientResult<Waypoint> {
        self.state.set_active_input_index(Some(index));
        self.state.set_loading(true);
        self.state.clear_error();

        let args = ReverseSearchArgs::new(lat, lng).with_size(1);
        let hits = self
            .service
            .reverse_geocode(&args)
            .await
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, lat, lng, "reverse geocoding failed, keeping raw coordinates");
                Vec::new()
            });

        self.state.pick_from_map(lat, lng, hits.first());
        self.state.set_loading(false);
        Ok(self.state.places().get(index).cloned().unwrap_or_default())
    }

    /// Routes through the resolved places in order.
    pub async fn route(&mut self, profile: Profile) -> ClientResult<RouteResult> {
        let args = self.state.begin_directions(profile)?;
        let data = match self.service.directions(&args).await {
            Ok(data) => data,
            Err(err) => {
                self.state.fail_request(err.user_message());
                return Err(err);
            }
        };

        self.state.complete_directions(Ok(data));
        match (self.state.error(), self.state.route()) {
            (None, Some(route)) => Ok(route.clone()),
            _ => Err(ClientError::Directions(DirectionsError::UnexpectedFormat)),
        }
    }

    pub async fn isochrones(&mut self, options: &IsochroneOptions) -> ClientResult<IsochroneResult> {
        let args = self.state.begin_isochrones(options)?;
        match self.service.isochrones(&args).await {
            Ok(result) => {
                self.state.complete_isochrones(Ok(result.clone()));
                Ok(result)
            }
            Err(err) => {
                self.state.complete_isochrones(Err(err.user_message()));
                Err(err)
            }
        }
    }
}
