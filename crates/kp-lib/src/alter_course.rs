//! Alter course (AC) detection
//!
//! An alter course is a route vertex where the heading changes by more than a
//! threshold. Headings are planar bearings of the segment chords, the same
//! approximation used for event bearings.

use crate::offset::bearing_deg;
use crate::{GeodesicDistance, KpError, Result, RouteModel};
use geo::Coord;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A heading change at a route vertex
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlterCourse {
    /// Chainage of the vertex, in meters
    pub kp: f64,
    /// Flattened vertex index
    pub vertex: usize,
    pub point: Coord<f64>,
    pub bearing_in_deg: f64,
    pub bearing_out_deg: f64,
    /// Smallest angle between the two headings, in `[0, 180]`
    pub change_deg: f64,
}

/// Smallest angular difference between two bearings, in degrees
#[inline]
fn heading_change(a: f64, b: f64) -> f64 {
    let d = (a - b).abs().rem_euclid(360.0);
    d.min(360.0 - d)
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<D: GeodesicDistance> RouteModel<D> {
    /// Find every vertex where the heading changes by more than `threshold_deg`
    ///
    /// Zero-length segments carry no heading and are skipped, so a repeated vertex
    /// does not hide a turn. Results are in chainage order.
    pub fn alter_courses(&self, threshold_deg: f64) -> Result<Vec<AlterCourse>> {
        if !threshold_deg.is_finite() || threshold_deg < 0.0 {
            return Err(KpError::InvalidParameter(format!(
                "Alter course threshold must be non-negative degrees, got {threshold_deg}"
            )));
        }

        let mut courses = Vec::new();
        let mut previous_bearing: Option<f64> = None;

        for segment in self.segments() {
            if segment.start == segment.end {
                continue;
            }
            let bearing = bearing_deg(segment.start, segment.end);
            if let Some(bearing_in) = previous_bearing {
                let change = heading_change(bearing_in, bearing);
                if change > threshold_deg {
                    courses.push(AlterCourse {
                        kp: segment.start_chainage,
                        vertex: segment.index,
                        point: segment.start,
                        bearing_in_deg: bearing_in,
                        bearing_out_deg: bearing,
                        change_deg: change,
                    });
                }
            }
            previous_bearing = Some(bearing);
        }

        tracing::debug!(
            "Detected {} alter course(s) above {threshold_deg} deg",
            courses.len()
        );
        Ok(courses)
    }
}

/// Distances along the route from `kp` to the nearest alter course strictly
/// before and strictly after it
///
/// `courses` must be in chainage order, as returned by
/// [`RouteModel::alter_courses`].
pub(crate) fn distances_to_alter_courses(
    courses: &[AlterCourse],
    kp: f64,
) -> (Option<f64>, Option<f64>) {
    let before = courses.partition_point(|ac| ac.kp < kp);
    let after = courses.partition_point(|ac| ac.kp <= kp);

    let prev = before.checked_sub(1).map(|i| kp - courses[i].kp);
    let next = courses.get(after).map(|ac| ac.kp - kp);
    (prev, next)
}
