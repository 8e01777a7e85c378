//! Route storage and chainage table
//!
//! This module provides the `RouteModel` struct: the ordered vertex parts of a
//! route together with a precomputed cumulative-chainage array. A model is built
//! once and never mutated; all queries borrow it immutably.

use crate::{GeodesicDistance, KpError, Result};
use geo::{Coord, LineString};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier of the coordinate reference frame a route is expressed in
/// (for example `"EPSG:4326"`).
///
/// The engine never transforms coordinates; the tag only guards against mixing
/// routes that the caller knows to be incomparable.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReferenceFrame(pub String);

impl ReferenceFrame {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReferenceFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A route vertex with its position in the original part structure
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vertex {
    pub coord: Coord<f64>,
    /// Index of the part this vertex belongs to
    pub part_index: usize,
    /// Index of this vertex within its part
    pub index_in_part: usize,
}

/// A segment between two consecutive vertices of the flattened vertex sequence
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    /// Index of the segment; it joins vertex `index` and vertex `index + 1`
    pub index: usize,
    pub start: Coord<f64>,
    pub end: Coord<f64>,
    pub start_chainage: f64,
    pub end_chainage: f64,
    /// True for the implicit segment bridging the last vertex of one part and
    /// the first vertex of the next
    pub connector: bool,
}

impl Segment {
    /// Length of the segment as measured by the route's distance function
    #[inline]
    pub fn length(&self) -> f64 {
        self.end_chainage - self.start_chainage
    }
}

/// Immutable chainage model of a single route
///
/// Multi-part routes are treated as one continuous route: the gap between the
/// end of a part and the start of the next is measured and added to the chainage
/// like any other segment.
#[derive(Clone, Debug)]
pub struct RouteModel<D: GeodesicDistance> {
    /// Number of vertices of each part, in order
    part_sizes: Vec<usize>,
    /// All vertices of all parts, flattened in route order
    vertices: Vec<Vertex>,
    /// Cumulative chainage aligned with `vertices`
    chainage: Vec<f64>,
    /// Distance function used for every measurement on this route
    distance: D,
    /// Optional reference-frame tag
    frame: Option<ReferenceFrame>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<D: GeodesicDistance> RouteModel<D> {
    /// Build a route model from ordered parts
    ///
    /// # Arguments
    /// * `parts` - Ordered vertex sequences; every part needs at least 2 coordinates
    /// * `distance` - Distance function for chainage and offsets
    ///
    /// # Returns
    /// The model, or `InvalidGeometry` if there are no parts, a part is too short,
    /// a coordinate is not finite, or the distance function returns an invalid length
    pub fn new<P, I>(parts: P, distance: D) -> Result<Self>
    where
        P: IntoIterator<Item = I>,
        I: IntoIterator<Item = Coord<f64>>,
    {
        #[cfg(feature = "profiling")]
        profiling::scope!("route::new");

        let mut part_sizes = Vec::new();
        let mut vertices: Vec<Vertex> = Vec::new();

        for (part_index, part) in parts.into_iter().enumerate() {
            let start = vertices.len();
            for (index_in_part, coord) in part.into_iter().enumerate() {
                if !coord.x.is_finite() || !coord.y.is_finite() {
                    return Err(KpError::InvalidGeometry(format!(
                        "Non-finite coordinate ({}, {}) in part {part_index} at {index_in_part}",
                        coord.x, coord.y
                    )));
                }
                vertices.push(Vertex {
                    coord,
                    part_index,
                    index_in_part,
                });
            }
            let size = vertices.len() - start;
            if size < 2 {
                return Err(KpError::InvalidGeometry(format!(
                    "Part {part_index} has {size} coordinate(s), at least 2 are required"
                )));
            }
            part_sizes.push(size);
        }

        if part_sizes.is_empty() {
            return Err(KpError::InvalidGeometry("Route has no parts".to_string()));
        }

        let chainage = Self::compute_chainage(&vertices, &distance)?;

        tracing::debug!(
            "Built route model: {} part(s), {} vertices, length {:.3} m",
            part_sizes.len(),
            vertices.len(),
            chainage[chainage.len() - 1]
        );

        Ok(Self {
            part_sizes,
            vertices,
            chainage,
            distance,
            frame: None,
        })
    }

    /// Attach a reference-frame tag to this model
    pub fn with_frame(mut self, frame: ReferenceFrame) -> Self {
        self.frame = Some(frame);
        self
    }

    /// Cumulative chainage in a single pass over the flattened vertices
    fn compute_chainage(vertices: &[Vertex], distance: &D) -> Result<Vec<f64>> {
        let mut chainage = Vec::with_capacity(vertices.len());
        chainage.push(0.0);

        for (i, pair) in vertices.windows(2).enumerate() {
            let (prev, next) = (pair[0], pair[1]);
            let step = distance.distance(prev.coord, next.coord);
            if !step.is_finite() || step < 0.0 {
                return Err(KpError::InvalidGeometry(format!(
                    "Distance function returned {step} between vertices {i} and {}",
                    i + 1
                )));
            }
            if prev.part_index != next.part_index {
                tracing::debug!(
                    "Bridging gap of {step:.3} m between part {} and part {}",
                    prev.part_index,
                    next.part_index
                );
            } else if step == 0.0 {
                tracing::trace!("Zero-length segment at vertex {i}");
            }
            chainage.push(chainage[i] + step);
        }

        Ok(chainage)
    }

    /// Total route length in meters
    #[inline]
    pub fn total_length(&self) -> f64 {
        self.chainage[self.chainage.len() - 1]
    }

    /// Number of parts the route was built from
    #[inline]
    pub fn part_count(&self) -> usize {
        self.part_sizes.len()
    }

    /// Number of vertices across all parts
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of segments, including part connectors
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.vertices.len() - 1
    }

    /// Reference-frame tag, if any
    #[inline]
    pub fn frame(&self) -> Option<&ReferenceFrame> {
        self.frame.as_ref()
    }

    /// The distance function this model measures with
    #[inline]
    pub fn distance_fn(&self) -> &D {
        &self.distance
    }

    /// Distance between two coordinates using this route's distance function
    #[inline]
    pub fn measure(&self, a: Coord<f64>, b: Coord<f64>) -> f64 {
        self.distance.distance(a, b)
    }

    /// Cumulative chainage array aligned with [`Self::vertices`]
    #[inline]
    pub fn chainages(&self) -> &[f64] {
        &self.chainage
    }

    /// All vertices in route order
    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Chainage of a flattened vertex index
    #[inline]
    pub fn chainage_at_vertex(&self, index: usize) -> Option<f64> {
        self.chainage.get(index).copied()
    }

    /// Get a single segment by index
    pub fn segment(&self, index: usize) -> Option<Segment> {
        if index + 1 >= self.vertices.len() {
            return None;
        }
        Some(self.segment_at(index))
    }

    /// Segment by index; `index` must be below [`Self::segment_count`]
    #[inline]
    pub(crate) fn segment_at(&self, index: usize) -> Segment {
        let start = self.vertices[index];
        let end = self.vertices[index + 1];
        Segment {
            index,
            start: start.coord,
            end: end.coord,
            start_chainage: self.chainage[index],
            end_chainage: self.chainage[index + 1],
            connector: start.part_index != end.part_index,
        }
    }

    /// Iterate over all segments in chainage order
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        (0..self.segment_count()).map(move |i| self.segment_at(i))
    }

    /// Vertices of each part, in order
    pub fn parts(&self) -> impl Iterator<Item = &[Vertex]> + '_ {
        let mut offset = 0;
        self.part_sizes.iter().map(move |&size| {
            let part = &self.vertices[offset..offset + size];
            offset += size;
            part
        })
    }

    /// The whole route as a single line string, part connectors included
    pub fn to_line_string(&self) -> LineString<f64> {
        self.vertices.iter().map(|v| v.coord).collect()
    }

    /// Binary-search the segment bracketing a chainage value
    ///
    /// Returns the last segment whose start chainage is `<= kp`, so a value that
    /// falls exactly on a vertex resolves to the segment starting there (or the
    /// final segment for the route end). Returns `None` outside `[0, length]`.
    pub fn segment_at_chainage(&self, kp: f64) -> Option<Segment> {
        if !(0.0..=self.total_length()).contains(&kp) {
            return None;
        }
        let index = self
            .chainage
            .partition_point(|&c| c <= kp)
            .saturating_sub(1)
            .min(self.segment_count() - 1);
        Some(self.segment_at(index))
    }

    /// Check that another route may be compared with this one
    ///
    /// Untagged routes are compatible with anything; two tags must be equal.
    pub fn ensure_same_frame<E: GeodesicDistance>(&self, other: &RouteModel<E>) -> Result<()> {
        match (&self.frame, &other.frame) {
            (Some(a), Some(b)) if a != b => Err(KpError::InconsistentReferenceFrame {
                source_frame: a.to_string(),
                target_frame: b.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::PlanarDistance;

    pub(crate) fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    pub(crate) fn straight_route() -> RouteModel<PlanarDistance> {
        RouteModel::new(vec![vec![c(0.0, 0.0), c(10.0, 0.0)]], PlanarDistance).unwrap()
    }

    pub(crate) fn l_route() -> RouteModel<PlanarDistance> {
        RouteModel::new(
            vec![vec![c(0.0, 0.0), c(10.0, 0.0), c(10.0, 10.0)]],
            PlanarDistance,
        )
        .unwrap()
    }

    #[test]
    fn test_route_creation() {
        let route = l_route();
        assert_eq!(route.vertex_count(), 3);
        assert_eq!(route.segment_count(), 2);
        assert_eq!(route.part_count(), 1);
        assert!((route.total_length() - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_route_fails() {
        let result = RouteModel::new(Vec::<Vec<Coord<f64>>>::new(), PlanarDistance);
        assert!(matches!(result, Err(KpError::InvalidGeometry(_))));
    }

    #[test]
    fn test_short_part_fails() {
        let result = RouteModel::new(
            vec![vec![c(0.0, 0.0), c(1.0, 0.0)], vec![c(5.0, 5.0)]],
            PlanarDistance,
        );
        assert!(matches!(result, Err(KpError::InvalidGeometry(_))));
    }

    #[test]
    fn test_non_finite_coordinate_fails() {
        let result = RouteModel::new(vec![vec![c(0.0, 0.0), c(f64::NAN, 0.0)]], PlanarDistance);
        assert!(matches!(result, Err(KpError::InvalidGeometry(_))));
    }

    #[test]
    fn test_invalid_distance_function_fails() {
        let broken = |_: Coord<f64>, _: Coord<f64>| -1.0;
        let result = RouteModel::new(vec![vec![c(0.0, 0.0), c(1.0, 0.0)]], broken);
        assert!(matches!(result, Err(KpError::InvalidGeometry(_))));
    }

    #[test]
    fn test_chainage_invariants() {
        let route = RouteModel::new(
            vec![
                vec![c(0.0, 0.0), c(3.0, 4.0), c(3.0, 4.0), c(6.0, 8.0)],
                vec![c(6.0, 11.0), c(6.0, 20.0)],
            ],
            PlanarDistance,
        )
        .unwrap();

        let chainage = route.chainages();
        assert_eq!(chainage[0], 0.0);
        assert_eq!(chainage[chainage.len() - 1], route.total_length());
        assert!(chainage.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_multipart_gap_is_measured() {
        // Two parts with a 5 m gap between (10, 0) and (10, 5)
        let route = RouteModel::new(
            vec![
                vec![c(0.0, 0.0), c(10.0, 0.0)],
                vec![c(10.0, 5.0), c(10.0, 15.0)],
            ],
            PlanarDistance,
        )
        .unwrap();

        assert_eq!(route.chainages(), &[0.0, 10.0, 15.0, 25.0]);
        let connector = route.segment(1).unwrap();
        assert!(connector.connector);
        assert!((connector.length() - 5.0).abs() < 1e-12);
        assert!(!route.segment(0).unwrap().connector);
        assert!(!route.segment(2).unwrap().connector);
    }

    #[test]
    fn test_vertex_identity() {
        let route = RouteModel::new(
            vec![vec![c(0.0, 0.0), c(1.0, 0.0)], vec![c(2.0, 0.0), c(3.0, 0.0)]],
            PlanarDistance,
        )
        .unwrap();

        let v = route.vertices()[3];
        assert_eq!(v.part_index, 1);
        assert_eq!(v.index_in_part, 1);

        let parts: Vec<_> = route.parts().collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1][0].coord, c(2.0, 0.0));
    }

    #[test]
    fn test_segment_at_chainage() {
        let route = l_route();
        assert_eq!(route.segment_at_chainage(0.0).unwrap().index, 0);
        assert_eq!(route.segment_at_chainage(5.0).unwrap().index, 0);
        // Exactly on the interior vertex resolves to the segment starting there
        assert_eq!(route.segment_at_chainage(10.0).unwrap().index, 1);
        // Route end resolves to the final segment
        assert_eq!(route.segment_at_chainage(20.0).unwrap().index, 1);
        assert!(route.segment_at_chainage(-0.1).is_none());
        assert!(route.segment_at_chainage(20.1).is_none());
    }

    #[test]
    fn test_reference_frames() {
        let a = straight_route().with_frame(ReferenceFrame::new("EPSG:4326"));
        let b = straight_route().with_frame(ReferenceFrame::new("EPSG:32631"));
        let untagged = straight_route();

        assert!(a.ensure_same_frame(&a.clone()).is_ok());
        assert!(a.ensure_same_frame(&untagged).is_ok());
        assert!(untagged.ensure_same_frame(&b).is_ok());
        assert!(matches!(
            a.ensure_same_frame(&b),
            Err(KpError::InconsistentReferenceFrame { .. })
        ));
    }

    #[test]
    fn test_to_line_string() {
        let route = l_route();
        let line = route.to_line_string();
        assert_eq!(line.0.len(), 3);
        assert_eq!(line.0[2], c(10.0, 10.0));
    }
}
