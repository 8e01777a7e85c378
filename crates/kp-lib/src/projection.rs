//! Nearest point on a route
//!
//! Projection walks every segment of a [`RouteModel`], computes the clamped foot of
//! the perpendicular on the segment chord in the coordinate plane, and measures the
//! resulting offset with the route's distance function. The global minimum wins;
//! on ties the occurrence with the lowest chainage is kept, which makes looping and
//! self-intersecting routes deterministic.

use crate::{GeodesicDistance, RouteModel, Segment};
use geo::Coord;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Offsets closer than this are treated as equal when comparing segments
const TIE_TOLERANCE_M: f64 = 1e-9;

/// Result of projecting a coordinate onto a route
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProjectionResult {
    /// Nearest point on the route
    pub point: Coord<f64>,
    /// Index of the segment holding the nearest point
    pub segment: usize,
    /// Fraction along that segment's chord, in `[0, 1]`
    pub fraction: f64,
    /// Distance from the query coordinate to `point`, in meters
    pub perpendicular_distance: f64,
    /// Chainage of `point`, in meters
    pub chainage: f64,
}

/// Clamped foot of the perpendicular from `p` onto the chord `a`-`b`
///
/// Returns the foot and its fraction along the chord. Degenerate chords resolve
/// to `a` with fraction 0.
#[inline]
pub(crate) fn closest_on_chord(a: Coord<f64>, b: Coord<f64>, p: Coord<f64>) -> (Coord<f64>, f64) {
    let ab = b - a;
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    if len_sq == 0.0 {
        return (a, 0.0);
    }
    let ap = p - a;
    let t = ((ap.x * ab.x + ap.y * ab.y) / len_sq).clamp(0.0, 1.0);
    if t == 1.0 {
        return (b, 1.0);
    }
    (a + ab * t, t)
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<D: GeodesicDistance> RouteModel<D> {
    /// Find the nearest point on the route to an arbitrary coordinate
    ///
    /// O(number of vertices) per query.
    pub fn project(&self, point: Coord<f64>) -> ProjectionResult {
        let mut best = self.project_onto(&self.segment_at(0), point);

        for index in 1..self.segment_count() {
            let candidate = self.project_onto(&self.segment_at(index), point);
            if candidate.perpendicular_distance < best.perpendicular_distance - TIE_TOLERANCE_M {
                best = candidate;
            }
        }

        best
    }

    /// Project a coordinate onto a single segment
    ///
    /// Returns `None` if the segment index is out of range.
    pub fn project_onto_segment(
        &self,
        index: usize,
        point: Coord<f64>,
    ) -> Option<ProjectionResult> {
        self.segment(index).map(|segment| self.project_onto(&segment, point))
    }

    fn project_onto(&self, segment: &Segment, point: Coord<f64>) -> ProjectionResult {
        let (foot, fraction) = closest_on_chord(segment.start, segment.end, point);

        let chainage = if fraction == 0.0 {
            segment.start_chainage
        } else if fraction == 1.0 {
            segment.end_chainage
        } else {
            // The chord fraction and the measured length may disagree slightly on
            // non-planar metrics; never step past the segment end.
            (segment.start_chainage + self.measure(segment.start, foot)).min(segment.end_chainage)
        };

        ProjectionResult {
            point: foot,
            segment: segment.index,
            fraction,
            perpendicular_distance: self.measure(point, foot),
            chainage,
        }
    }
}
