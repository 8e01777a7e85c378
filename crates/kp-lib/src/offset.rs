//! Offsets between matched source and target locations
//!
//! All route-relative metrics are measured against the *source* route: the target
//! location is projected onto it and compared with the source event's own
//! projection.

use crate::alter_course::distances_to_alter_courses;
use crate::{AlterCourse, GeodesicDistance, MatchRecord, Result, RouteModel};
use geo::Coord;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Planar compass bearing from one coordinate to another
///
/// `0` is north (positive y), `90` is east (positive x); the result is in
/// `[0, 360)`. This is a flat-plane approximation, valid for the short baselines
/// between matched events; it is not an ellipsoidal initial bearing.
pub fn bearing_deg(from: Coord<f64>, to: Coord<f64>) -> f64 {
    let bearing = (to.x - from.x)
        .atan2(to.y - from.y)
        .to_degrees()
        .rem_euclid(360.0);
    // rem_euclid can round tiny negative angles up to exactly 360
    if bearing >= 360.0 { 0.0 } else { bearing }
}

/// Side of the source route the target location lies on, looking along the
/// direction of increasing chainage
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CrossTrackSide {
    Port,
    Starboard,
    OnRoute,
}

impl CrossTrackSide {
    /// Sign applied to the unsigned cross-track distance
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            CrossTrackSide::Starboard => 1.0,
            CrossTrackSide::Port => -1.0,
            CrossTrackSide::OnRoute => 0.0,
        }
    }
}

/// Offsets between one matched pair of events
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OffsetRecord<R> {
    pub matched: MatchRecord<R>,
    /// Chainage of the source event projected onto the source route
    pub source_kp: f64,
    /// Chainage of the target event projected onto the target route
    pub target_kp: f64,
    /// Straight point-to-point distance
    pub radial_m: f64,
    /// Perpendicular distance of the target event from the source route, `>= 0`
    pub cross_track_m: f64,
    pub cross_track_side: CrossTrackSide,
    /// `cross_track_m` signed positive to starboard, negative to port
    pub cross_track_signed_m: f64,
    /// Positive when the target event is further along the source route
    pub along_track_signed_m: f64,
    pub bearing_deg: f64,
    /// Distance back along the source route to the previous alter course
    pub prev_ac_distance_m: Option<f64>,
    /// Distance forward along the source route to the next alter course
    pub next_ac_distance_m: Option<f64>,
}

/// Computes [`OffsetRecord`]s against a source route
pub struct OffsetCalculator<'a, D: GeodesicDistance> {
    source_route: &'a RouteModel<D>,
    target_route: &'a RouteModel<D>,
    alter_courses: Vec<AlterCourse>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<'a, D: GeodesicDistance> OffsetCalculator<'a, D> {
    /// Create a calculator for a pair of routes
    ///
    /// Fails with `InconsistentReferenceFrame` if both routes carry different
    /// frame tags.
    pub fn new(source_route: &'a RouteModel<D>, target_route: &'a RouteModel<D>) -> Result<Self> {
        source_route.ensure_same_frame(target_route)?;
        Ok(Self {
            source_route,
            target_route,
            alter_courses: Vec::new(),
        })
    }

    /// Report distances to these alter courses of the source route
    pub fn with_alter_courses(mut self, alter_courses: Vec<AlterCourse>) -> Self {
        self.alter_courses = alter_courses;
        self
    }

    /// Straight point-to-point distance, independent of any route
    #[inline]
    pub fn radial(&self, source_point: Coord<f64>, target_point: Coord<f64>) -> f64 {
        self.source_route.measure(source_point, target_point)
    }

    /// Perpendicular distance of a point from the source route
    #[inline]
    pub fn cross_track(&self, point: Coord<f64>) -> f64 {
        self.source_route.project(point).perpendicular_distance
    }

    /// Signed displacement along the source route from `source_point` to the
    /// projection of `target_point`
    pub fn along_track_signed(&self, source_point: Coord<f64>, target_point: Coord<f64>) -> f64 {
        let at_source = self.source_route.project(source_point).chainage;
        let at_target = self.source_route.project(target_point).chainage;
        at_target - at_source
    }

    /// Compute every metric for a matched pair
    pub fn compute<R>(&self, matched: MatchRecord<R>) -> OffsetRecord<R> {
        let source_point = matched.source.point;
        let target_point = matched.target.point;

        let source_projection = self.source_route.project(source_point);
        let target_on_source = self.source_route.project(target_point);
        let target_kp = self.target_route.project(target_point).chainage;

        let cross_track_m = target_on_source.perpendicular_distance;
        let cross_track_side = if cross_track_m == 0.0 {
            CrossTrackSide::OnRoute
        } else {
            self.side_of(target_on_source.segment, target_on_source.point, target_point)
        };

        let (prev_ac_distance_m, next_ac_distance_m) =
            distances_to_alter_courses(&self.alter_courses, source_projection.chainage);

        OffsetRecord {
            source_kp: source_projection.chainage,
            target_kp,
            radial_m: self.radial(source_point, target_point),
            cross_track_m,
            cross_track_side,
            cross_track_signed_m: cross_track_m * cross_track_side.sign(),
            along_track_signed_m: target_on_source.chainage - source_projection.chainage,
            bearing_deg: bearing_deg(source_point, target_point),
            prev_ac_distance_m,
            next_ac_distance_m,
            matched,
        }
    }

    /// Which side of the source route `point` lies on, relative to its foot on
    /// segment `segment`
    ///
    /// Only called for points off the route. A point on the extension of the
    /// route beyond either end has a collinear offset and counts as starboard,
    /// so the signed distance never loses its magnitude.
    fn side_of(&self, segment: usize, foot: Coord<f64>, point: Coord<f64>) -> CrossTrackSide {
        let Some(direction) = self.direction_near(segment) else {
            return CrossTrackSide::Starboard;
        };
        let offset = point - foot;
        // Positive cross product: offset points to the left of the direction
        let cross = direction.x * offset.y - direction.y * offset.x;
        if cross > 0.0 {
            CrossTrackSide::Port
        } else {
            CrossTrackSide::Starboard
        }
    }

    /// Chord direction of a segment, falling back to the nearest non-degenerate
    /// segment before, then after it
    fn direction_near(&self, segment: usize) -> Option<Coord<f64>> {
        let route = self.source_route;
        let chord = |i: usize| {
            route
                .segment(i)
                .map(|s| s.end - s.start)
                .filter(|d| d.x != 0.0 || d.y != 0.0)
        };
        chord(segment)
            .or_else(|| (0..segment).rev().find_map(chord))
            .or_else(|| (segment + 1..route.segment_count()).find_map(chord))
    }
}
