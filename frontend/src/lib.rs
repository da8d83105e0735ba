mod api;
mod geolocation;
mod map;

use seed::{prelude::*, virtual_dom::AtValue, *};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::config::{APP_NAME, SUGGESTION_DELAY, TILE_PROVIDERS, URL_SYNC_DELAY};
use shared::directions::RouteInfo;
use shared::geocode::GeocodeFeature;
use shared::model::{IsochroneResult, LatLng, Mode, Profile, RangeType, Waypoint};
use shared::ors::{PlaceSearchArgs, ReverseSearchArgs};
use shared::url_state::{UrlParams, build_url_params, parse_url_params};
use shared::{AppState, Debouncer, IsochroneOptions, SuggestionBoard, UrlFingerprint};
use wasm_bindgen::JsCast;

use crate::geolocation::{CURRENT_LOCATION_FIX, PositionError, STARTUP_FIX};
use crate::map::MapSync;

const MAP_CONTAINER: &str = "map";
const LOCATION_UNSUPPORTED: &str = "Geolocation is not supported by your browser";
const LOCATION_FAILED: &str =
    "Failed to get your current location. Please check your browser permissions.";
const LOCATION_ADDRESS_FAILED: &str = "Failed to get address for current location";
const SIDEBAR_MODES: [Mode; 3] = [Mode::Place, Mode::Directions, Mode::Isochrones];

pub struct Model {
    state: AppState,
    profile: Profile,
    isochrone_options: IsochroneOptions,
    range_input: String,
    suggestions: SuggestionBoard<CmdHandle>,
    focused_input: Option<usize>,
    url_sync: Debouncer<CmdHandle>,
    url_fingerprint: UrlFingerprint,
    map: MapSync,
}

pub enum Msg {
    SwitchMode(Mode),
    PlaceInput { index: usize, text: String },
    SuggestDue(usize),
    SuggestionsFetched {
        index: usize,
        term: String,
        result: Result<Vec<GeocodeFeature>, String>,
    },
    SuggestionChosen { index: usize, choice: usize },
    InputFocused(usize),
    CloseSuggestions(usize),
    UseCurrentLocation(usize),
    CurrentPosition {
        index: usize,
        result: Result<LatLng, PositionError>,
    },
    CurrentLocationResolved {
        index: usize,
        position: LatLng,
        result: Result<Vec<GeocodeFeature>, String>,
    },
    StartupPosition(Result<LatLng, PositionError>),
    ClearPlace(usize),
    AddPlace,
    RemovePlace(usize),
    ReversePlaces,
    ClearAllPlaces,
    PickOnMap(usize),
    CancelPick,
    MapClicked { lat: f64, lng: f64 },
    PickResolved {
        lat: f64,
        lng: f64,
        result: Result<Vec<GeocodeFeature>, String>,
    },
    MapMoved { lat: f64, lng: f64, zoom: f64 },
    ProfileChanged(String),
    ComputeRoute,
    DirectionsFetched(Result<Value, String>),
    ClearRoute,
    RangeTypeChanged(String),
    RangeInput(String),
    ComputeIsochrones,
    IsochronesFetched(Result<IsochroneResult, String>),
    ClearIsochrones,
    TileProviderChanged(String),
    ToggleSidebar,
    DismissError,
    UrlSyncDue,
}

#[derive(Deserialize)]
struct MapEventPayload {
    lat: f64,
    lng: f64,
    #[serde(default)]
    zoom: Option<f64>,
}

fn event_detail<T: DeserializeOwned>(event: web_sys::Event) -> Option<T> {
    let event = event.dyn_into::<web_sys::CustomEvent>().ok()?;
    serde_wasm_bindgen::from_value(event.detail()).ok()
}

pub fn init(_: Url, orders: &mut impl Orders<Msg>) -> Model {
    orders
        .stream(streams::window_event(Ev::from("map-click"), |event| {
            let payload: MapEventPayload = event_detail(event)?;
            Some(Msg::MapClicked {
                lat: payload.lat,
                lng: payload.lng,
            })
        }))
        .stream(streams::window_event(Ev::from("map-moveend"), |event| {
            let payload: MapEventPayload = event_detail(event)?;
            Some(Msg::MapMoved {
                lat: payload.lat,
                lng: payload.lng,
                zoom: payload.zoom?,
            })
        }))
        .stream(streams::window_event(Ev::KeyDown, |event| {
            let key = event.unchecked_into::<web_sys::KeyboardEvent>().key();
            (key == "Escape").then_some(Msg::CancelPick)
        }));

    let mut state = AppState::new();
    let search = window().location().search().unwrap_or_default();
    let restored = parse_url_params(&UrlParams::from_query_string(&search));
    if !restored.is_empty() {
        web_sys::console::debug_1(&format!("[frontend] restoring {restored:?}").into());
    }
    let pinned = restored.has_location();
    state.apply_url_state(restored);
    state.set_sidebar_open(true);
    if !pinned && state.is_at_default_center() {
        geolocation::request_position(orders, STARTUP_FIX, Msg::StartupPosition);
    }

    let viewport = state.viewport();
    map::init_map(
        MAP_CONTAINER,
        viewport.center.lat,
        viewport.center.lng,
        viewport.zoom,
    );

    let isochrone_options = IsochroneOptions::default();
    let mut model = Model {
        range_input: isochrone_options.range_input_text(),
        isochrone_options,
        profile: Profile::default(),
        suggestions: SuggestionBoard::new(SUGGESTION_DELAY),
        focused_input: None,
        url_sync: Debouncer::new(URL_SYNC_DELAY),
        url_fingerprint: state.url_fingerprint(),
        map: MapSync::default(),
        state,
    };
    model.map.observed_viewport(viewport);
    sync_map(&mut model);
    model
}

pub fn update(msg: Msg, model: &mut Model, orders: &mut impl Orders<Msg>) {
    match msg {
        Msg::SwitchMode(mode) => {
            model.state.switch_mode(mode);
            model.suggestions.clear();
        }
        Msg::PlaceInput { index, text } => {
            model.state.rename_place(index, &text);
            model.suggestions.on_input(index, &text, |delay| {
                orders.perform_cmd_with_handle(cmds::timeout(millis(delay), move || {
                    Msg::SuggestDue(index)
                }))
            });
        }
        Msg::SuggestDue(index) => {
            if let Some(term) = model.suggestions.fire(index) {
                let args = PlaceSearchArgs::new(term.trim(), Some(model.state.map_center()));
                orders.perform_cmd(async move {
                    let result = api::geocode(args).await;
                    Msg::SuggestionsFetched {
                        index,
                        term,
                        result,
                    }
                });
            }
        }
        Msg::SuggestionsFetched {
            index,
            term,
            result,
        } => match result {
            Ok(features) => model.suggestions.apply(index, &term, features),
            Err(err) => {
                web_sys::console::error_1(&format!("[frontend] geocode failed: {err}").into());
            }
        },
        Msg::SuggestionChosen { index, choice } => {
            if let Some(feature) = model.suggestions.suggestions(index).get(choice) {
                let place = feature.to_waypoint();
                model.state.select_place(index, place);
            }
            model.suggestions.dismiss(index);
        }
        Msg::InputFocused(index) => model.focused_input = Some(index),
        Msg::CloseSuggestions(index) => {
            if model.focused_input == Some(index) {
                model.focused_input = None;
            }
            model.suggestions.dismiss(index);
        }
        Msg::UseCurrentLocation(index) => {
            model.focused_input = None;
            model.suggestions.dismiss(index);
            model.state.set_loading(true);
            model.state.clear_error();
            geolocation::request_position(orders, CURRENT_LOCATION_FIX, move |result| {
                Msg::CurrentPosition { index, result }
            });
        }
        Msg::CurrentPosition { index, result } => match result {
            Ok(position) => {
                let args = ReverseSearchArgs::new(position.lat, position.lng).with_size(1);
                orders.perform_cmd(async move {
                    let result = api::reverse_geocode(args).await;
                    Msg::CurrentLocationResolved {
                        index,
                        position,
                        result,
                    }
                });
            }
            Err(PositionError::Unsupported) => model.state.fail_request(LOCATION_UNSUPPORTED),
            Err(PositionError::Unavailable) => model.state.fail_request(LOCATION_FAILED),
        },
        Msg::CurrentLocationResolved {
            index,
            position,
            result,
        } => match result {
            Ok(hits) => {
                model
                    .state
                    .select_current_location(index, position.lat, position.lng, hits.first());
                model.state.set_loading(false);
            }
            Err(err) => {
                web_sys::console::error_1(&format!("[frontend] reverse geocode failed: {err}").into());
                model.state.fail_request(LOCATION_ADDRESS_FAILED);
            }
        },
        Msg::StartupPosition(result) => match result {
            Ok(position) => model.state.center_on_user(position.lat, position.lng),
            Err(err) => {
                web_sys::console::debug_1(
                    &format!("[frontend] keeping default location: {err:?}").into(),
                );
            }
        },
        Msg::ClearPlace(index) => {
            model.state.clear_place(index);
            model.suggestions.dismiss(index);
        }
        Msg::AddPlace => {
            model.state.add_place();
        }
        Msg::RemovePlace(index) => {
            if model.state.remove_place(index) {
                model.suggestions.remove(index);
                model.focused_input = None;
            }
        }
        Msg::ReversePlaces => {
            if model.state.reverse_places() {
                model.suggestions.clear();
            }
        }
        Msg::ClearAllPlaces => {
            model.state.clear_all_places();
            model.suggestions.clear();
        }
        Msg::PickOnMap(index) => model.state.set_active_input_index(Some(index)),
        Msg::CancelPick => model.state.clear_active_input_index(),
        Msg::MapClicked { lat, lng } => {
            if model.state.active_input_index().is_none() {
                return;
            }
            web_sys::console::debug_1(
                &format!("[frontend] map pick lat={lat:.5} lng={lng:.5}").into(),
            );
            model.state.set_loading(true);
            model.state.clear_error();
            let args = ReverseSearchArgs::new(lat, lng).with_size(1);
            orders.perform_cmd(async move {
                let result = api::reverse_geocode(args).await;
                Msg::PickResolved { lat, lng, result }
            });
        }
        Msg::PickResolved { lat, lng, result } => match result {
            Ok(hits) => {
                model.state.pick_from_map(lat, lng, hits.first());
                model.state.set_loading(false);
            }
            Err(err) => {
                web_sys::console::error_1(&format!("[frontend] reverse geocode failed: {err}").into());
                model.state.pick_from_map(lat, lng, None);
                model.state.set_loading(false);
            }
        },
        Msg::MapMoved { lat, lng, zoom } => {
            let moved = model.state.on_move_end(LatLng::new(lat, lng));
            let zoomed = model.state.on_zoom_end(zoom);
            if moved || zoomed {
                model.map.observed_viewport(model.state.viewport());
            }
        }
        Msg::ProfileChanged(value) => {
            if let Ok(profile) = value.parse::<Profile>() {
                model.profile = profile;
                model.isochrone_options.profile = profile;
            }
        }
        Msg::ComputeRoute => match model.state.begin_directions(model.profile) {
            Ok(args) => {
                orders.perform_cmd(async move { Msg::DirectionsFetched(api::directions(args).await) });
            }
            Err(err) => web_sys::console::debug_1(&format!("[frontend] {err}").into()),
        },
        Msg::DirectionsFetched(result) => model.state.complete_directions(result),
        Msg::ClearRoute => {
            model.state.clear_route();
            model.state.ensure_slots_for_mode();
            model.suggestions.clear();
        }
        Msg::RangeTypeChanged(value) => {
            if let Ok(range_type) = value.parse::<RangeType>() {
                model.isochrone_options.set_range_type(range_type);
                model.range_input = model.isochrone_options.range_input_text();
            }
        }
        Msg::RangeInput(text) => {
            model.isochrone_options.set_range_input(&text);
            model.range_input = text;
        }
        Msg::ComputeIsochrones => match model.state.begin_isochrones(&model.isochrone_options) {
            Ok(args) => {
                orders.perform_cmd(async move { Msg::IsochronesFetched(api::isochrones(args).await) });
            }
            Err(err) => web_sys::console::debug_1(&format!("[frontend] {err}").into()),
        },
        Msg::IsochronesFetched(result) => model.state.complete_isochrones(result),
        Msg::ClearIsochrones => {
            model.state.clear_isochrone();
            model.state.ensure_slots_for_mode();
            model.suggestions.clear();
        }
        Msg::TileProviderChanged(id) => model.state.set_tile_provider(Some(&id)),
        Msg::ToggleSidebar => {
            let open = model.state.sidebar_open();
            model.state.set_sidebar_open(!open);
        }
        Msg::DismissError => model.state.clear_error(),
        Msg::UrlSyncDue => {
            if model.url_sync.fire() {
                write_url(&model.state);
            }
            return;
        }
    }

    sync_map(model);
    schedule_url_sync(model, orders);
}

fn millis(delay: std::time::Duration) -> u32 {
    u32::try_from(delay.as_millis()).unwrap_or(u32::MAX)
}

fn sync_map(model: &mut Model) {
    let state = &model.state;
    model.map.viewport(state.viewport());
    model.map.tile_provider(state.tile_provider());
    model.map.markers(state.visible_places());
    model.map.route(state.route());
    model.map.isochrones(state.isochrones());
    model.map.picking(state.active_input_index().is_some());
}

/// Restarts the URL timer when anything mirrored in the URL changed.
fn schedule_url_sync(model: &mut Model, orders: &mut impl Orders<Msg>) {
    let fingerprint = model.state.url_fingerprint();
    if fingerprint == model.url_fingerprint {
        return;
    }
    model.url_fingerprint = fingerprint;
    model.url_sync.schedule(|delay| {
        orders.perform_cmd_with_handle(cmds::timeout(millis(delay), || Msg::UrlSyncDue))
    });
}

fn write_url(state: &AppState) {
    let query = build_url_params(&state.url_view()).to_query_string();
    let window = window();
    let location = window.location();
    let current = location.search().unwrap_or_default();
    if !needs_url_write(&current, &query) {
        return;
    }
    let url = page_url(&location.pathname().unwrap_or_default(), &query);
    let written = window
        .history()
        .and_then(|history| history.replace_state_with_url(&JsValue::NULL, "", Some(&url)));
    if let Err(err) = written {
        web_sys::console::error_1(&err);
    }
}

fn needs_url_write(current_search: &str, query: &str) -> bool {
    current_search.trim_start_matches('?') != query
}

fn page_url(pathname: &str, query: &str) -> String {
    if query.is_empty() {
        pathname.to_string()
    } else {
        format!("{pathname}?{query}")
    }
}

/// An empty focused input offers the user's own position.
fn offers_current_location(focused: Option<usize>, index: usize, place: &Waypoint) -> bool {
    focused == Some(index) && place.name.trim().is_empty()
}

fn placeholder(mode: Mode, index: usize, count: usize) -> &'static str {
    match mode {
        Mode::Directions if index == 0 => "Start",
        Mode::Directions if index + 1 == count => "Destination",
        Mode::Directions => "Via",
        Mode::Isochrones => "Origin",
        Mode::Place | Mode::Search => "Search a place",
    }
}

fn mode_label(mode: Mode) -> &'static str {
    match mode {
        Mode::Place => "Place",
        Mode::Directions => "Directions",
        Mode::Isochrones => "Isochrones",
        Mode::Search => "Search",
    }
}

pub fn view(model: &Model) -> Node<Msg> {
    let open = model.state.sidebar_open();
    div![
        C!["app-container", IF!(open => "sidebar-open")],
        header![
            C!["app-header"],
            button![
                C!["sidebar-toggle"],
                if open { "⟨" } else { "☰" },
                ev(Ev::Click, |_| Msg::ToggleSidebar),
            ],
            h1![APP_NAME],
        ],
        IF!(open => view_sidebar(model)),
        view_layer_switcher(model),
        view_status(model),
    ]
}

fn view_sidebar(model: &Model) -> Node<Msg> {
    let mode = model.state.mode();
    aside![
        C!["sidebar"],
        div![
            C!["mode-selector"],
            SIDEBAR_MODES.iter().map(|&candidate| {
                button![
                    C![IF!(candidate == mode => "active")],
                    mode_label(candidate),
                    ev(Ev::Click, move |_| Msg::SwitchMode(candidate)),
                ]
            }),
        ],
        view_places(model),
        match mode {
            Mode::Directions => view_directions_panel(model),
            Mode::Isochrones => view_isochrones_panel(model),
            Mode::Place | Mode::Search => empty![],
        },
    ]
}

fn view_places(model: &Model) -> Node<Msg> {
    let mode = model.state.mode();
    let places = model.state.visible_places();
    let removable = mode == Mode::Directions && places.len() > 2;
    div![
        C!["places"],
        places
            .iter()
            .enumerate()
            .map(|(index, place)| view_place_input(model, index, place, places.len(), removable)),
        IF!(mode == Mode::Directions => div![
            C!["place-actions"],
            button!["+ Add place", ev(Ev::Click, |_| Msg::AddPlace)],
            button!["⇅ Reverse", ev(Ev::Click, |_| Msg::ReversePlaces)],
            button!["Clear all", ev(Ev::Click, |_| Msg::ClearAllPlaces)],
        ]),
    ]
}

fn view_place_input(
    model: &Model,
    index: usize,
    place: &Waypoint,
    count: usize,
    removable: bool,
) -> Node<Msg> {
    let suggestions = model.suggestions.suggestions(index);
    let current_location = offers_current_location(model.focused_input, index, place);
    let picking = model.state.active_input_index() == Some(index);
    div![
        C!["place-input", IF!(place.is_resolved() => "resolved")],
        input![
            attrs! {
                At::Value => &place.name,
                At::Placeholder => placeholder(model.state.mode(), index, count),
                At::AutoComplete => "off",
                At::SpellCheck => "false",
            },
            input_ev(Ev::Input, move |text| Msg::PlaceInput { index, text }),
            ev(Ev::Focus, move |_| Msg::InputFocused(index)),
            ev(Ev::Blur, move |_| Msg::CloseSuggestions(index)),
        ],
        button![
            C!["pick", IF!(picking => "active")],
            attrs! { At::Title => "Pick on map" },
            "⌖",
            ev(Ev::Click, move |_| if picking {
                Msg::CancelPick
            } else {
                Msg::PickOnMap(index)
            }),
        ],
        IF!(!place.name.is_empty() => button![
            C!["clear"],
            "×",
            ev(Ev::Click, move |_| Msg::ClearPlace(index)),
        ]),
        IF!(removable => button![
            C!["remove"],
            "−",
            ev(Ev::Click, move |_| Msg::RemovePlace(index)),
        ]),
        IF!(current_location || !suggestions.is_empty() => ul![
            C!["suggestions"],
            IF!(current_location => li![
                C!["current-location"],
                "Current location",
                ev(Ev::MouseDown, move |event| {
                    event.prevent_default();
                    Msg::UseCurrentLocation(index)
                }),
            ]),
            suggestions.iter().enumerate().map(|(choice, feature)| {
                li![
                    feature.title().unwrap_or("Unknown"),
                    ev(Ev::MouseDown, move |event| {
                        event.prevent_default();
                        Msg::SuggestionChosen { index, choice }
                    }),
                ]
            }),
        ]),
    ]
}

fn view_profile_select(selected: Profile) -> Node<Msg> {
    select![
        Profile::ALL.iter().map(|&profile| {
            option![
                attrs! {
                    At::Value => profile.as_str(),
                    At::Selected => bool_attr(profile == selected),
                },
                profile.label(),
            ]
        }),
        input_ev(Ev::Change, Msg::ProfileChanged),
    ]
}

fn view_directions_panel(model: &Model) -> Node<Msg> {
    let route = model.state.route().map(RouteInfo::from_route);
    div![
        C!["panel", "directions"],
        view_profile_select(model.profile),
        button![
            "Get directions",
            attrs! { At::Disabled => bool_attr(model.state.loading()) },
            ev(Ev::Click, |_| Msg::ComputeRoute),
        ],
        match route {
            Some(info) => div![
                C!["route-info"],
                strong![info.distance_text()],
                span![info.duration_text()],
                button!["Clear route", ev(Ev::Click, |_| Msg::ClearRoute)],
            ],
            None => empty![],
        },
    ]
}

fn view_isochrones_panel(model: &Model) -> Node<Msg> {
    let options = &model.isochrone_options;
    let polygons = model.state.isochrones().map(|result| result.features.len());
    div![
        C!["panel", "isochrones"],
        view_profile_select(options.profile),
        select![
            [RangeType::Time, RangeType::Distance].iter().map(|&range_type| {
                option![
                    attrs! {
                        At::Value => range_type.as_str(),
                        At::Selected => bool_attr(range_type == options.range_type()),
                    },
                    match range_type {
                        RangeType::Time => "Time",
                        RangeType::Distance => "Distance",
                    },
                ]
            }),
            input_ev(Ev::Change, Msg::RangeTypeChanged),
        ],
        label![options.unit_label()],
        input![
            attrs! { At::Value => &model.range_input, At::Placeholder => "10, 20, 30" },
            input_ev(Ev::Input, Msg::RangeInput),
        ],
        button![
            "Calculate isochrones",
            attrs! { At::Disabled => bool_attr(model.state.loading()) },
            ev(Ev::Click, |_| Msg::ComputeIsochrones),
        ],
        match polygons {
            Some(count) => div![
                C!["isochrone-info"],
                span![format!("{count} area(s)")],
                button!["Clear", ev(Ev::Click, |_| Msg::ClearIsochrones)],
            ],
            None => empty![],
        },
    ]
}

fn view_layer_switcher(model: &Model) -> Node<Msg> {
    let current = model.state.tile_provider().id;
    div![
        C!["layer-switcher"],
        select![
            TILE_PROVIDERS.iter().map(|provider| {
                option![
                    attrs! {
                        At::Value => provider.id,
                        At::Selected => bool_attr(provider.id == current),
                    },
                    provider.name,
                ]
            }),
            input_ev(Ev::Change, Msg::TileProviderChanged),
        ],
    ]
}

fn view_status(model: &Model) -> Node<Msg> {
    div![
        C!["status"],
        IF!(model.state.loading() => div![C!["loading"], "Loading…"]),
        IF!(model.state.active_input_index().is_some() => div![
            C!["pick-hint"],
            "Click on the map to pick a place (Esc to cancel)",
        ]),
        model.state.error().map(|error| {
            div![
                C!["error"],
                span![error],
                button!["×", ev(Ev::Click, |_| Msg::DismissError)],
            ]
        }),
    ]
}

#[wasm_bindgen(start)]
pub fn start() {
    App::start("app", init, update, view);
}

fn bool_attr(value: bool) -> AtValue {
    if value {
        AtValue::Some("true".into())
    } else {
        AtValue::Ignored
    }
}
