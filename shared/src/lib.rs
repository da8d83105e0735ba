//! Domain types and state shared by the route planner's wasm frontend and
//! its native client.

pub mod config;
pub mod debounce;
pub mod directions;
pub mod error;
pub mod geocode;
pub mod isochrone;
pub mod model;
pub mod ors;
pub mod store;
pub mod suggestions;
pub mod url_state;

pub use debounce::Debouncer;
pub use directions::{DirectionsError, RouteInfo, parse_directions};
pub use error::ValidationError;
pub use geocode::{GeocodeFeature, GeocodeResponse};
pub use isochrone::IsochroneOptions;
pub use model::{
    IsochroneResult, LatLng, LineGeometry, MapViewport, Mode, Profile, RangeType, RouteResult,
    Waypoint,
};
pub use store::{AppState, UrlFingerprint};
pub use suggestions::SuggestionBoard;
pub use url_state::{
    UrlParams, UrlState, UrlStateView, build_url_params, deserialize_map_center,
    deserialize_places, parse_url_params, serialize_map_center, serialize_places,
};
