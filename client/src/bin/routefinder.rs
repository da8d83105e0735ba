use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use client::gpx_export::write_route_gpx;
use client::{ClientConfig, ClientError, ClientResult, OrsClient, Planner};
use shared::config::SUGGESTION_COUNT;
use shared::model::{LatLng, RangeType, coordinate_label};
use shared::url_state::{build_url_params, deserialize_map_center, parse_url_params};
use shared::{AppState, IsochroneOptions, Mode, Profile, RouteInfo, UrlParams, UrlState, Waypoint};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "routefinder", about = "Route planning against an openrouteservice API")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search places by name
    Geocode {
        text: String,
        #[arg(long, default_value_t = SUGGESTION_COUNT)]
        size: usize,
    },
    /// Name the place at a coordinate
    #[command(allow_negative_numbers = true)]
    Reverse { lat: f64, lng: f64 },
    /// Route through two or more places
    Route {
        /// `lat,lng[,name]`, repeat in travel order
        #[arg(long = "place", required = true, allow_hyphen_values = true, value_parser = parse_place)]
        places: Vec<Waypoint>,
        #[arg(long, default_value = "driving-car")]
        profile: Profile,
        /// Also write the route as GPX
        #[arg(long)]
        gpx: Option<PathBuf>,
    },
    /// Areas reachable from a place
    Isochrones {
        #[arg(long, allow_hyphen_values = true, value_parser = parse_place)]
        place: Waypoint,
        #[arg(long, default_value = "driving-car")]
        profile: Profile,
        #[arg(long, default_value = "time")]
        range_type: RangeType,
        /// Minutes for `time`, kilometers for `distance`
        #[arg(long, default_value = "10")]
        ranges: String,
    },
    /// Print the shareable query string for a planner state
    Share {
        #[arg(long)]
        mode: Option<Mode>,
        #[arg(long = "place", allow_hyphen_values = true, value_parser = parse_place)]
        places: Vec<Waypoint>,
        #[arg(long, allow_hyphen_values = true)]
        center: Option<String>,
        #[arg(long)]
        zoom: Option<f64>,
    },
    /// Show what a query string restores, as JSON
    Inspect { query: String },
}

fn parse_place(raw: &str) -> Result<Waypoint, String> {
    let mut parts = raw.splitn(3, ',');
    let mut coordinate = |what: &str| -> Result<f64, String> {
        parts
            .next()
            .map(str::trim)
            .and_then(|value| value.parse::<f64>().ok())
            .filter(|value| value.is_finite())
            .ok_or_else(|| format!("expected lat,lng[,name], bad {what} in {raw:?}"))
    };
    let lat = coordinate("latitude")?;
    let lng = coordinate("longitude")?;
    let name = parts
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| coordinate_label(lat, lng));
    Ok(Waypoint::new(lat, lng, name))
}

fn planner() -> ClientResult<Planner<OrsClient>> {
    Ok(Planner::new(OrsClient::new(ClientConfig::from_env()?)?))
}

fn share_query(state: &AppState) -> String {
    build_url_params(&state.url_view()).to_query_string()
}

async fn run(command: Command) -> ClientResult<()> {
    match command {
        Command::Geocode { text, size } => {
            let mut planner = planner()?;
            for feature in planner.search_places(&text, size).await? {
                let LatLng { lat, lng } = feature.position();
                println!("{:.6},{:.6}\t{}", lat, lng, feature.title().unwrap_or("Unknown"));
            }
        }
        Command::Reverse { lat, lng } => {
            let mut planner = planner()?;
            planner.state_mut().switch_mode(Mode::Place);
            let place = planner.pick_place(0, lat, lng).await?;
            println!("{}", serde_json::to_string_pretty(&place)?);
        }
        Command::Route {
            places,
            profile,
            gpx,
        } => {
            let mut planner = planner()?;
            let state = planner.state_mut();
            state.switch_mode(Mode::Directions);
            state.set_places(places);
            state.ensure_slots_for_mode();

            let route = planner.route(profile).await?;
            let info = RouteInfo::from_route(&route);
            println!("{} ({})", info.distance_text(), info.duration_text());
            println!("?{}", share_query(planner.state()));

            if let Some(path) = gpx {
                let name = planner
                    .state()
                    .resolved_places()
                    .map(|place| place.name.as_str())
                    .collect::<Vec<_>>()
                    .join(" - ");
                write_route_gpx(&route, &name, &path)?;
            }
        }
        Command::Isochrones {
            place,
            profile,
            range_type,
            ranges,
        } => {
            let mut options = IsochroneOptions::default();
            options.profile = profile;
            options.set_range_type(range_type);
            if !options.set_range_input(&ranges) {
                return Err(shared::ValidationError::EmptyRanges.into());
            }

            let mut planner = planner()?;
            let state = planner.state_mut();
            state.switch_mode(Mode::Isochrones);
            state.select_place(0, place);

            let result = planner.isochrones(&options).await?;
            for feature in &result.features {
                match feature.range_value() {
                    Some(value) => println!("{value} {}", range_type.as_str()),
                    None => println!("polygon without range"),
                }
            }
        }
        Command::Share {
            mode,
            places,
            center,
            zoom,
        } => {
            let map_center = match center {
                Some(raw) => Some(
                    deserialize_map_center(&raw)
                        .ok_or_else(|| ClientError::config(format!("bad center {raw:?}")))?,
                ),
                None => None,
            };
            let mut state = AppState::new();
            state.apply_url_state(UrlState {
                mode,
                places: Some(places),
                map_center,
                zoom,
            });
            println!("?{}", share_query(&state));
        }
        Command::Inspect { query } => {
            let parsed = parse_url_params(&UrlParams::from_query_string(&query));
            println!("{}", serde_json::to_string_pretty(&parsed)?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "routefinder=info,client=info,shared=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!("{err:?}");
            eprintln!("error: {}", err.user_message());
            ExitCode::FAILURE
        }
    }
}
