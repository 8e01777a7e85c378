//! Chainage to coordinate resolution
//!
//! The inverse of projection: given a chainage value, locate the bracketing segment
//! with a binary search and interpolate linearly along its chord. Also hosts the
//! derived chainage utilities (regular KP markers and section extraction).

use crate::{GeodesicDistance, KpError, Result, RouteModel, Segment};
use geo::{Coord, LineString};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point placed at a regular chainage interval along a route
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KpMarker {
    /// Chainage from the route start, in meters
    pub kp: f64,
    /// Chainage from the route end, in meters
    pub reverse_kp: f64,
    pub point: Coord<f64>,
}

/// Upper bound on the markers a single call may place
pub const MAX_KP_MARKERS: usize = 1_000_000;

#[inline]
fn interpolate(segment: &Segment, kp: f64) -> Coord<f64> {
    let length = segment.length();
    if length <= 0.0 {
        return segment.start;
    }
    let fraction = ((kp - segment.start_chainage) / length).clamp(0.0, 1.0);
    segment.start + (segment.end - segment.start) * fraction
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<D: GeodesicDistance> RouteModel<D> {
    /// Interpolate the coordinate at a chainage value
    ///
    /// Fails with `ChainageOutOfRange` outside `[0, total_length]`; there is no
    /// extrapolation.
    pub fn point_at_chainage(&self, kp: f64) -> Result<Coord<f64>> {
        let segment = self
            .segment_at_chainage(kp)
            .ok_or(KpError::ChainageOutOfRange {
                kp,
                length: self.total_length(),
            })?;
        Ok(interpolate(&segment, kp))
    }

    /// Place a marker every `interval_m` meters strictly inside the route
    ///
    /// The first marker sits at `interval_m`; the route start and end are not
    /// marked.
    pub fn kp_markers(&self, interval_m: f64) -> Result<Vec<KpMarker>> {
        #[cfg(feature = "profiling")]
        profiling::scope!("chainage::kp_markers");

        if !interval_m.is_finite() || interval_m <= 0.0 {
            return Err(KpError::InvalidParameter(format!(
                "Marker interval must be a positive number of meters, got {interval_m}"
            )));
        }

        let length = self.total_length();
        let expected = (length / interval_m).ceil();
        if expected > MAX_KP_MARKERS as f64 {
            return Err(KpError::InvalidParameter(format!(
                "Marker interval of {interval_m} m is too small for a {length:.3} m route"
            )));
        }

        let mut markers = Vec::with_capacity(expected as usize);
        let mut step = 1u64;
        loop {
            // Multiply instead of accumulating to avoid drift on long routes
            let kp = interval_m * step as f64;
            if kp >= length {
                break;
            }
            markers.push(KpMarker {
                kp,
                reverse_kp: length - kp,
                point: self.point_at_chainage(kp)?,
            });
            step += 1;
        }

        tracing::debug!(
            "Placed {} marker(s) at {interval_m} m intervals over {length:.3} m",
            markers.len()
        );
        Ok(markers)
    }

    /// Extract the part of the route between two chainage values
    ///
    /// The bounds may be given in either order. The result starts and ends at
    /// interpolated points and contains every vertex strictly between them.
    pub fn extract_section(&self, start_kp: f64, end_kp: f64) -> Result<LineString<f64>> {
        let (from, to) = if start_kp <= end_kp {
            (start_kp, end_kp)
        } else {
            (end_kp, start_kp)
        };
        if from == to {
            return Err(KpError::InvalidParameter(format!(
                "Section bounds must differ, both are {from} m"
            )));
        }

        let first = self.point_at_chainage(from)?;
        let last = self.point_at_chainage(to)?;

        let mut coords = vec![first];
        let chainage = self.chainages();
        let begin = chainage.partition_point(|&c| c <= from);
        let end = chainage.partition_point(|&c| c < to);
        coords.extend(self.vertices()[begin..end].iter().map(|v| v.coord));
        coords.push(last);

        Ok(LineString::new(coords))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlanarDistance;
    use crate::route::tests::{c, l_route, straight_route};

    #[test]
    fn test_point_at_chainage() {
        let route = l_route();
        assert_eq!(route.point_at_chainage(0.0).unwrap(), c(0.0, 0.0));
        assert_eq!(route.point_at_chainage(5.0).unwrap(), c(5.0, 0.0));
        assert_eq!(route.point_at_chainage(10.0).unwrap(), c(10.0, 0.0));
        assert_eq!(route.point_at_chainage(15.0).unwrap(), c(10.0, 5.0));
        assert_eq!(route.point_at_chainage(20.0).unwrap(), c(10.0, 10.0));
    }

    #[test]
    fn test_out_of_range_fails() {
        let route = straight_route();
        let length = route.total_length();

        assert!(matches!(
            route.point_at_chainage(-1.0),
            Err(KpError::ChainageOutOfRange { .. })
        ));
        assert!(matches!(
            route.point_at_chainage(length + 1.0),
            Err(KpError::ChainageOutOfRange { .. })
        ));
        assert!(route.point_at_chainage(f64::NAN).is_err());
    }

    #[test]
    fn test_round_trip_through_projection() {
        let route = RouteModel::new(
            vec![
                vec![c(0.0, 0.0), c(3.0, 4.0), c(9.0, 4.0), c(9.0, -6.0)],
                vec![c(12.0, -6.0), c(20.0, 0.0)],
            ],
            PlanarDistance,
        )
        .unwrap();

        let length = route.total_length();
        for i in 0..=100 {
            let kp = length * i as f64 / 100.0;
            let point = route.point_at_chainage(kp).unwrap();
            let projected = route.project(point);
            assert!(
                (projected.chainage - kp).abs() < 1e-6,
                "kp {kp} came back as {}",
                projected.chainage
            );
        }
    }

    #[test]
    fn test_zero_length_segment_interpolation() {
        let route = RouteModel::new(
            vec![vec![c(0.0, 0.0), c(5.0, 0.0), c(5.0, 0.0), c(10.0, 0.0)]],
            PlanarDistance,
        )
        .unwrap();
        assert_eq!(route.point_at_chainage(5.0).unwrap(), c(5.0, 0.0));
        assert_eq!(route.point_at_chainage(7.5).unwrap(), c(7.5, 0.0));
    }

    #[test]
    fn test_kp_markers() {
        let route = l_route();
        let markers = route.kp_markers(4.0).unwrap();

        let kps: Vec<f64> = markers.iter().map(|m| m.kp).collect();
        assert_eq!(kps, vec![4.0, 8.0, 12.0, 16.0]);
        assert!((markers[2].reverse_kp - 8.0).abs() < 1e-12);
        assert_eq!(markers[2].point, c(10.0, 2.0));

        // The route end is never marked, even on an exact multiple
        assert_eq!(route.kp_markers(10.0).unwrap().len(), 1);
        assert!(route.kp_markers(25.0).unwrap().is_empty());
    }

    #[test]
    fn test_kp_markers_invalid_interval() {
        let route = l_route();
        assert!(matches!(
            route.kp_markers(0.0),
            Err(KpError::InvalidParameter(_))
        ));
        assert!(route.kp_markers(-5.0).is_err());
        assert!(route.kp_markers(f64::INFINITY).is_err());
    }

    #[test]
    fn test_kp_markers_count_is_bounded() {
        let route = straight_route();
        assert!(matches!(
            route.kp_markers(1e-6),
            Err(KpError::InvalidParameter(_))
        ));
        assert!(matches!(
            route.kp_markers(f64::MIN_POSITIVE),
            Err(KpError::InvalidParameter(_))
        ));
        assert_eq!(route.kp_markers(0.25).unwrap().len(), 39);
    }

    #[test]
    fn test_extract_section() {
        let route = l_route();

        let section = route.extract_section(5.0, 15.0).unwrap();
        assert_eq!(section.0, vec![c(5.0, 0.0), c(10.0, 0.0), c(10.0, 5.0)]);

        // Reversed bounds give the same section
        let reversed = route.extract_section(15.0, 5.0).unwrap();
        assert_eq!(section, reversed);

        // Bounds on a vertex do not duplicate it
        let from_vertex = route.extract_section(10.0, 20.0).unwrap();
        assert_eq!(from_vertex.0, vec![c(10.0, 0.0), c(10.0, 10.0)]);
    }

    #[test]
    fn test_extract_section_errors() {
        let route = l_route();
        assert!(matches!(
            route.extract_section(5.0, 5.0),
            Err(KpError::InvalidParameter(_))
        ));
        assert!(matches!(
            route.extract_section(5.0, 25.0),
            Err(KpError::ChainageOutOfRange { .. })
        ));
    }
}
