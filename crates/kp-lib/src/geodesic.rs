//! Point-to-point distance primitives
//!
//! The engine never assumes a Euclidean metric for chainage or offsets: every
//! length it reports comes from a [`GeodesicDistance`] supplied by the caller.
//! The implementations here cover the common cases through `geo`'s metric spaces.

use geo::{Coord, Distance, Point};

/// Distance in meters between two coordinates, reflecting the caller's active
/// ellipsoid and coordinate reference system.
pub trait GeodesicDistance: Send + Sync {
    fn distance(&self, a: Coord<f64>, b: Coord<f64>) -> f64;
}

impl<F> GeodesicDistance for F
where
    F: Fn(Coord<f64>, Coord<f64>) -> f64 + Send + Sync,
{
    #[inline]
    fn distance(&self, a: Coord<f64>, b: Coord<f64>) -> f64 {
        self(a, b)
    }
}

/// Straight-line distance in the coordinate plane.
///
/// Appropriate for projected coordinates already expressed in meters.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlanarDistance;

impl GeodesicDistance for PlanarDistance {
    #[inline]
    fn distance(&self, a: Coord<f64>, b: Coord<f64>) -> f64 {
        geo::Euclidean.distance(Point::from(a), Point::from(b))
    }
}

/// Great-circle distance on a sphere of mean Earth radius.
///
/// Coordinates are `x = longitude`, `y = latitude`, in degrees.
#[derive(Clone, Copy, Debug, Default)]
pub struct HaversineDistance;

impl GeodesicDistance for HaversineDistance {
    #[inline]
    fn distance(&self, a: Coord<f64>, b: Coord<f64>) -> f64 {
        geo::Haversine.distance(Point::from(a), Point::from(b))
    }
}

/// Shortest path on the WGS84 ellipsoid (Karney's algorithm).
///
/// Coordinates are `x = longitude`, `y = latitude`, in degrees.
#[derive(Clone, Copy, Debug, Default)]
pub struct EllipsoidalDistance;

impl GeodesicDistance for EllipsoidalDistance {
    #[inline]
    fn distance(&self, a: Coord<f64>, b: Coord<f64>) -> f64 {
        geo::Geodesic.distance(Point::from(a), Point::from(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planar_distance() {
        let d = PlanarDistance.distance(Coord { x: 0.0, y: 0.0 }, Coord { x: 3.0, y: 4.0 });
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_haversine_one_degree_of_latitude() {
        let d = HaversineDistance.distance(Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 1.0 });
        // Roughly 111 km on the mean-radius sphere
        assert!((d - 111_195.0).abs() < 200.0);
    }

    #[test]
    fn test_ellipsoidal_close_to_haversine() {
        let a = Coord {
            x: -0.1278,
            y: 51.5074,
        };
        let b = Coord {
            x: -0.1178,
            y: 51.5174,
        };
        let haversine = HaversineDistance.distance(a, b);
        let ellipsoidal = EllipsoidalDistance.distance(a, b);
        assert!(haversine > 1000.0);
        // Spherical and ellipsoidal models agree to well under one percent here
        assert!((haversine - ellipsoidal).abs() / ellipsoidal < 0.01);
    }

    #[test]
    fn test_closure_as_distance() {
        let manhattan = |a: Coord<f64>, b: Coord<f64>| (a.x - b.x).abs() + (a.y - b.y).abs();
        let d = manhattan.distance(Coord { x: 0.0, y: 0.0 }, Coord { x: 3.0, y: 4.0 });
        assert!((d - 7.0).abs() < 1e-12);
    }
}
