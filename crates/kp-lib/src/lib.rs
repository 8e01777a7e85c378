//! KP Library - Linear Referencing and Route Comparison Engine
//!
//! This library computes and consumes KP (chainage, the cumulative distance from a
//! route's start) over polyline routes, and cross-references two independently
//! surveyed routes of the same physical path (typically a *design* and an *as-laid*
//! route) to quantify how far and in which direction matching locations drifted.
//!
//! # Architecture
//!
//! - **[`GeodesicDistance`]**: Point-to-point distance in meters, supplied by the caller
//! - **[`RouteModel`]**: Immutable chainage table built once from ordered vertex parts
//! - **Projector** ([`RouteModel::project`]): Nearest point on a route with chainage and offset
//! - **ChainageResolver** ([`RouteModel::point_at_chainage`]): Chainage back to a coordinate
//! - **[`RouteTranslator`]**: Maps a chainage on one route to its counterpart on another
//! - **[`OffsetCalculator`]**: Radial, cross-track, along-track and bearing metrics
//! - **EventNormalizer** ([`events`]): Name normalization and duplicate-aware matching
//! - **[`Comparator`]**: Binds everything into the "compare two routes' events" workflow
//!
//! # Performance Characteristics
//!
//! - **Build Time**: O(N) per route
//! - **Projection**: O(N) per query, no spatial index
//! - **Chainage lookup**: O(log N) per query
//!
//! A built [`RouteModel`] is read-only and `Sync`, so any number of queries may run
//! concurrently against it without locking.

mod alter_course;
mod chainage;
mod compare;
pub mod events;
mod geodesic;
mod offset;
mod projection;
mod route;
mod translate;

// Public API exports
pub use alter_course::AlterCourse;
pub use chainage::{KpMarker, MAX_KP_MARKERS};
pub use compare::{CompareConfig, Comparator, ComparisonReport};
pub use events::{EventGroups, EventRecord, MatchOutcome, MatchRecord};
pub use geodesic::{EllipsoidalDistance, GeodesicDistance, HaversineDistance, PlanarDistance};
pub use offset::{CrossTrackSide, OffsetCalculator, OffsetRecord, bearing_deg};
pub use projection::ProjectionResult;
pub use route::{ReferenceFrame, RouteModel, Segment, Vertex};
pub use translate::{CrossReference, RouteTranslator, TranslationResult};

/// Error types for the engine
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KpError {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Chainage {kp} m is outside the route range [0, {length}] m")]
    ChainageOutOfRange { kp: f64, length: f64 },

    #[error("Inconsistent reference frames: source is {source_frame}, target is {target_frame}")]
    InconsistentReferenceFrame {
        source_frame: String,
        target_frame: String,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, KpError>;
