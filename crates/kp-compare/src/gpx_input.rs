//! Conversion of GPX documents into route parts and event records
//!
//! Track segments become route parts, in file order. Files without tracks fall
//! back to their GPX routes. Named waypoints become events, with the waypoint
//! index as the source reference and a numeric comment read as a declared KP.

use crate::error::{CliError, Result};
use geo::Coord;
use kp_lib::{EventRecord, GeodesicDistance, ReferenceFrame, RouteModel};
use std::path::Path;

/// Read and parse a GPX file
pub fn read_gpx(path: &Path) -> Result<gpx::Gpx> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let gpx = gpx::read(reader)?;
    tracing::debug!(
        "Read {}: {} track(s), {} route(s), {} waypoint(s)",
        path.display(),
        gpx.tracks.len(),
        gpx.routes.len(),
        gpx.waypoints.len()
    );
    Ok(gpx)
}

#[inline]
fn to_coord(waypoint: &gpx::Waypoint) -> Coord<f64> {
    waypoint.point().0
}

/// Route parts from the tracks of a GPX document, or from its routes if it has
/// no track points
///
/// Empty segments are skipped; any other malformed part is left for the route
/// model to reject.
pub fn route_parts(gpx: &gpx::Gpx) -> Vec<Vec<Coord<f64>>> {
    let from_tracks: Vec<Vec<Coord<f64>>> = gpx
        .tracks
        .iter()
        .flat_map(|track| track.segments.iter())
        .filter(|segment| !segment.points.is_empty())
        .map(|segment| segment.points.iter().map(to_coord).collect())
        .collect();
    if !from_tracks.is_empty() {
        return from_tracks;
    }

    gpx.routes
        .iter()
        .filter(|route| !route.points.is_empty())
        .map(|route| route.points.iter().map(to_coord).collect())
        .collect()
}

/// Event records for the named waypoints of a GPX document
pub fn events(gpx: &gpx::Gpx) -> Vec<EventRecord<usize>> {
    gpx.waypoints
        .iter()
        .enumerate()
        .filter_map(|(index, waypoint)| {
            let Some(name) = waypoint.name.as_deref() else {
                tracing::trace!("Skipping unnamed waypoint {index}");
                return None;
            };
            let mut event = EventRecord::new(name, to_coord(waypoint), index);
            if let Some(kp) = waypoint
                .comment
                .as_deref()
                .and_then(|c| c.trim().parse::<f64>().ok())
                .filter(|kp| kp.is_finite())
            {
                event = event.with_declared_kp(kp);
            }
            Some(event)
        })
        .collect()
}

/// Build a route model from a parsed GPX document
pub fn load_route<D: GeodesicDistance>(
    path: &Path,
    gpx: &gpx::Gpx,
    distance: D,
    frame: Option<&str>,
) -> Result<RouteModel<D>> {
    let parts = route_parts(gpx);
    if parts.is_empty() {
        return Err(CliError::NoRoute {
            path: path.to_path_buf(),
        });
    }

    let route = RouteModel::new(parts, distance)?;
    tracing::info!(
        "Loaded {}: {} part(s), {} vertices, {:.1} m",
        path.display(),
        route.part_count(),
        route.vertex_count(),
        route.total_length()
    );

    Ok(match frame {
        Some(tag) => route.with_frame(ReferenceFrame::new(tag)),
        None => route,
    })
}
