//! Cross-route chainage translation
//!
//! A chainage on the source route is resolved to a coordinate, and that
//! coordinate is projected onto the target route. The spatial offset between the
//! two is always returned; deciding whether a translation is trustworthy is left
//! to the caller.

use crate::{EventRecord, GeodesicDistance, Result, RouteModel};
use geo::Coord;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A chainage on the source route mapped onto the target route
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TranslationResult {
    pub source_kp: f64,
    pub source_point: Coord<f64>,
    pub target_kp: f64,
    /// Distance from the source point to the target route
    pub spatial_offset_m: f64,
    pub target_point: Coord<f64>,
}

/// An event point located on the target route
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CrossReference<R> {
    pub event: EventRecord<R>,
    pub target_kp: f64,
    pub spatial_offset_m: f64,
    pub target_point: Coord<f64>,
}

/// Maps chainage values between two routes
#[derive(Clone, Copy, Debug)]
pub struct RouteTranslator<'a, D: GeodesicDistance> {
    source: &'a RouteModel<D>,
    target: &'a RouteModel<D>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<'a, D: GeodesicDistance> RouteTranslator<'a, D> {
    /// Create a translator between two routes
    ///
    /// Fails with `InconsistentReferenceFrame` if both routes carry different
    /// frame tags.
    pub fn new(source: &'a RouteModel<D>, target: &'a RouteModel<D>) -> Result<Self> {
        source.ensure_same_frame(target)?;
        Ok(Self { source, target })
    }

    #[inline]
    pub fn source(&self) -> &'a RouteModel<D> {
        self.source
    }

    #[inline]
    pub fn target(&self) -> &'a RouteModel<D> {
        self.target
    }

    /// Translate one source chainage onto the target route
    ///
    /// Fails with `ChainageOutOfRange` if `source_kp` is outside the source route.
    pub fn translate(&self, source_kp: f64) -> Result<TranslationResult> {
        let source_point = self.source.point_at_chainage(source_kp)?;
        let projection = self.target.project(source_point);

        Ok(TranslationResult {
            source_kp,
            source_point,
            target_kp: projection.chainage,
            spatial_offset_m: projection.perpendicular_distance,
            target_point: projection.point,
        })
    }

    /// Translate many chainages, one result per input
    ///
    /// A value outside the source route fails on its own without affecting the
    /// others.
    pub fn translate_all(&self, source_kps: &[f64]) -> Vec<Result<TranslationResult>> {
        #[cfg(feature = "profiling")]
        profiling::scope!("translate::translate_all");

        source_kps.iter().map(|&kp| self.translate(kp)).collect()
    }

    /// Locate event points on the target route
    pub fn cross_reference<R>(
        &self,
        events: impl IntoIterator<Item = EventRecord<R>>,
    ) -> Vec<CrossReference<R>> {
        events
            .into_iter()
            .map(|event| {
                let projection = self.target.project(event.point);
                CrossReference {
                    target_kp: projection.chainage,
                    spatial_offset_m: projection.perpendicular_distance,
                    target_point: projection.point,
                    event,
                }
            })
            .collect()
    }
}
