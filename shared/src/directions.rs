//! Directions payload parsing.
//!
//! The routing service answers in one of two layouts:
//!
//! ```text
//! GeoJSON: { features: [{ geometry, properties: { summary, segments } }], summary? }
//! JSON:    { routes:   [{ geometry, summary, segments }], summary? }
//! ```
//!
//! The summary (distance, duration) is looked up in a fixed order:
//! feature properties, then the top level, then the route itself.

use serde_json::Value;

use crate::model::{LineGeometry, RouteResult};
use crate::url_state::parse_float;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectionsError {
    #[error("Unexpected route data format")]
    UnexpectedFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    GeoJson,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummarySource {
    FeatureProperties,
    TopLevel,
    RouteLevel,
    Missing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRoute {
    pub format: PayloadFormat,
    pub summary_source: SummarySource,
    pub route: RouteResult,
}

pub fn parse_directions(data: &Value) -> Result<ParsedRoute, DirectionsError> {
    let (format, feature) = first_of(data, "features")
        .map(|feature| (PayloadFormat::GeoJson, feature))
        .or_else(|| first_of(data, "routes").map(|route| (PayloadFormat::Json, route)))
        .ok_or(DirectionsError::UnexpectedFormat)?;

    let properties = feature.get("properties");
    let (summary_source, summary) = [
        (
            SummarySource::FeatureProperties,
            properties.and_then(|props| props.get("summary")),
        ),
        (SummarySource::TopLevel, data.get("summary")),
        (SummarySource::RouteLevel, feature.get("summary")),
    ]
    .into_iter()
    .find_map(|(source, summary)| summary.filter(|s| s.is_object()).map(|s| (source, s)))
    .unwrap_or((SummarySource::Missing, &Value::Null));

    let geometry = match feature.get("geometry") {
        Some(raw) => serde_json::from_value::<LineGeometry>(raw.clone()).unwrap_or_else(|err| {
            tracing::debug!("route geometry is not a line string: {err}");
            LineGeometry::default()
        }),
        None => LineGeometry::default(),
    };

    let segments = properties
        .and_then(|props| props.get("segments"))
        .and_then(Value::as_array)
        .or_else(|| feature.get("segments").and_then(Value::as_array))
        .cloned()
        .unwrap_or_default();

    Ok(ParsedRoute {
        format,
        summary_source,
        route: RouteResult {
            geometry,
            distance: lenient_number(summary.get("distance")),
            duration: lenient_number(summary.get("duration")),
            segments,
        },
    })
}

fn first_of<'a>(data: &'a Value, key: &str) -> Option<&'a Value> {
    data.get(key).and_then(Value::as_array).and_then(|items| items.first())
}

/// Numbers, or numeric strings; anything else counts as zero.
fn lenient_number(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
        Some(Value::String(text)) => parse_float(text).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Distance and duration as shown next to a computed route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteInfo {
    pub distance_km: f64,
    pub duration_min: u64,
}

impl RouteInfo {
    pub fn from_route(route: &RouteResult) -> Self {
        // distances of 1000 and above are meters
        let distance_km = if route.distance >= 1000.0 {
            route.distance / 1000.0
        } else {
            route.distance
        };
        let duration_min = if route.duration > 0.0 {
            (route.duration / 60.0).round() as u64
        } else {
            0
        };
        Self {
            distance_km,
            duration_min,
        }
    }

    pub fn distance_text(&self) -> String {
        if self.distance_km > 0.0 {
            format!("{:.2} km", self.distance_km)
        } else {
            "0.00 km".to_string()
        }
    }

    pub fn duration_text(&self) -> String {
        format!("{} min", self.duration_min)
    }
}
