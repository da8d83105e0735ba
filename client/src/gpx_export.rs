use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use geo_types::Point;
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};
use shared::config::APP_NAME;
use shared::model::RouteResult;

use crate::error::ClientResult;

/// Builds a GPX 1.1 document with the route line as a single track.
pub fn route_to_gpx(route: &RouteResult, name: &str) -> Gpx {
    let mut gpx = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some(APP_NAME.into()),
        ..Default::default()
    };
    let mut track = Track {
        name: Some(name.into()),
        ..Default::default()
    };

    let mut segment = TrackSegment::new();
    for (point, elevation) in route.geometry.points().zip(route.geometry.elevations()) {
        let mut waypoint = Waypoint::new(Point::new(point.lng, point.lat));
        waypoint.elevation = elevation;
        segment.points.push(waypoint);
    }
    track.segments.push(segment);
    gpx.tracks.push(track);
    gpx
}

pub fn encode_route_as_gpx(route: &RouteResult, name: &str) -> ClientResult<String> {
    let mut buffer = Vec::new();
    gpx::write(&route_to_gpx(route, name), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub fn write_route_gpx(route: &RouteResult, name: &str, path: &Path) -> ClientResult<()> {
    let writer = BufWriter::new(File::create(path)?);
    gpx::write(&route_to_gpx(route, name), writer)?;
    tracing::info!("wrote {} points to {}", route.geometry.coordinates.len(), path.display());
    Ok(())
}
