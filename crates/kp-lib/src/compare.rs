//! Comparator - Top-level "compare two routes' events" workflow
//!
//! This module provides the high-level API that binds matching, alter course
//! detection and offset computation into a single comparison run. Every run owns
//! its intermediate state; nothing is cached across runs.

use crate::events::match_events;
use crate::{
    AlterCourse, EventGroups, EventRecord, GeodesicDistance, KpError, OffsetCalculator,
    OffsetRecord, Result, RouteModel,
};

use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for a comparison run
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompareConfig {
    /// Minimum heading change, in degrees, for a source route vertex to count as
    /// an alter course. Default: 2.0
    pub alter_course_threshold_deg: f64,
    /// Compute offsets for matched events on the rayon thread pool.
    /// Default: true
    pub parallel: bool,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            alter_course_threshold_deg: 2.0,
            parallel: true,
        }
    }
}

/// Everything a comparison run produces
///
/// `offsets` are sorted by source chainage, then by normalized event name.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ComparisonReport<R> {
    pub offsets: Vec<OffsetRecord<R>>,
    pub duplicates_source: Vec<String>,
    pub duplicates_target: Vec<String>,
    pub unmatched_source: Vec<EventRecord<R>>,
    pub unmatched_target: Vec<EventRecord<R>>,
    /// Alter courses detected on the source route
    pub alter_courses: Vec<AlterCourse>,
    pub source_length_m: f64,
    pub target_length_m: f64,
}

/// Compares the events of a source (design) and a target (as-laid) route
pub struct Comparator<'a, D: GeodesicDistance> {
    source_route: &'a RouteModel<D>,
    target_route: &'a RouteModel<D>,
    config: CompareConfig,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<'a, D: GeodesicDistance> Comparator<'a, D> {
    /// Create a comparator for two routes
    ///
    /// Fails with `InconsistentReferenceFrame` if both routes carry different
    /// frame tags, or `InvalidParameter` for an unusable configuration.
    pub fn new(
        source_route: &'a RouteModel<D>,
        target_route: &'a RouteModel<D>,
        config: CompareConfig,
    ) -> Result<Self> {
        source_route.ensure_same_frame(target_route)?;
        let threshold = config.alter_course_threshold_deg;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(KpError::InvalidParameter(format!(
                "Alter course threshold must be a non-negative number of degrees, got {threshold}"
            )));
        }
        Ok(Self {
            source_route,
            target_route,
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    /// Match events by name and compute offsets for every unambiguous pair
    ///
    /// Ambiguous or unpaired events are reported in the result, never raised as
    /// errors.
    pub fn compare<R: Send>(
        &self,
        source_events: Vec<EventRecord<R>>,
        target_events: Vec<EventRecord<R>>,
    ) -> Result<ComparisonReport<R>> {
        #[cfg(feature = "profiling")]
        profiling::scope!("compare::compare");

        tracing::info!(
            "Matching {} source event(s) against {} target event(s)",
            source_events.len(),
            target_events.len()
        );
        let outcome = match_events(
            EventGroups::build(source_events),
            EventGroups::build(target_events),
        );
        Self::log_outcome(
            outcome.matches.len(),
            &outcome.duplicates_source,
            &outcome.duplicates_target,
            &outcome.unmatched_source,
            &outcome.unmatched_target,
        );

        let alter_courses = self
            .source_route
            .alter_courses(self.config.alter_course_threshold_deg)?;
        tracing::info!(
            "Detected {} alter course(s) on the source route",
            alter_courses.len()
        );

        let calculator = OffsetCalculator::new(self.source_route, self.target_route)?
            .with_alter_courses(alter_courses.clone());

        let mut offsets: Vec<OffsetRecord<R>> = if self.config.parallel {
            outcome
                .matches
                .into_par_iter()
                .map(|matched| calculator.compute(matched))
                .collect()
        } else {
            outcome
                .matches
                .into_iter()
                .map(|matched| calculator.compute(matched))
                .collect()
        };

        offsets.sort_by(|a, b| {
            a.source_kp
                .total_cmp(&b.source_kp)
                .then_with(|| a.matched.normalized_name().cmp(b.matched.normalized_name()))
        });

        tracing::info!("Comparison complete: {} offset record(s)", offsets.len());

        Ok(ComparisonReport {
            offsets,
            duplicates_source: outcome.duplicates_source,
            duplicates_target: outcome.duplicates_target,
            unmatched_source: outcome.unmatched_source,
            unmatched_target: outcome.unmatched_target,
            alter_courses,
            source_length_m: self.source_route.total_length(),
            target_length_m: self.target_route.total_length(),
        })
    }

    fn log_outcome<R>(
        matched: usize,
        duplicates_source: &[String],
        duplicates_target: &[String],
        unmatched_source: &[EventRecord<R>],
        unmatched_target: &[EventRecord<R>],
    ) {
        if !duplicates_source.is_empty() {
            tracing::warn!(
                "Source has duplicate events (case/whitespace variants): {} - omitting",
                duplicates_source.join(", ")
            );
        }
        if !duplicates_target.is_empty() {
            tracing::warn!(
                "Target has duplicate events (case/whitespace variants): {} - omitting",
                duplicates_target.join(", ")
            );
        }
        if !unmatched_source.is_empty() {
            tracing::warn!("Unmatched source events: {}", raw_names(unmatched_source));
        }
        if !unmatched_target.is_empty() {
            tracing::warn!("Unmatched target events: {}", raw_names(unmatched_target));
        }
        tracing::info!("Matched {matched} event(s) after normalization");
    }
}

fn raw_names<R>(events: &[EventRecord<R>]) -> String {
    events
        .iter()
        .map(|e| e.raw_name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
