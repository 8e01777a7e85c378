//! Event name normalization and duplicate-aware matching
//!
//! Events from the two datasets are paired by name. Names are compared after
//! trimming and lowercasing; inner whitespace is kept as-is, so `"Repeater  1"`
//! and `"Repeater 1"` stay distinct. A name that occurs more than once on a side
//! is ambiguous: it is reported and every record carrying it is left unmatched,
//! rather than guessing which occurrence was meant.

use geo::Coord;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Normalize an event name for matching: trim leading/trailing whitespace and
/// lowercase. Idempotent.
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A named point of interest along a route
///
/// `R` is an opaque reference back to the caller's source record (a feature id,
/// row number, or a richer attribute struct).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventRecord<R> {
    pub raw_name: String,
    pub normalized_name: String,
    pub point: Coord<f64>,
    /// KP attribute supplied with the event, copied through untouched
    pub declared_kp: Option<f64>,
    pub source: R,
}

impl<R> EventRecord<R> {
    pub fn new(name: impl Into<String>, point: Coord<f64>, source: R) -> Self {
        let raw_name = name.into();
        let normalized_name = normalize(&raw_name);
        Self {
            raw_name,
            normalized_name,
            point,
            declared_kp: None,
            source,
        }
    }

    pub fn with_declared_kp(mut self, kp: f64) -> Self {
        self.declared_kp = Some(kp);
        self
    }
}

/// One event from each side, paired by an unambiguous normalized name
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchRecord<R> {
    pub source: EventRecord<R>,
    pub target: EventRecord<R>,
}

impl<R> MatchRecord<R> {
    #[inline]
    pub fn normalized_name(&self) -> &str {
        &self.source.normalized_name
    }
}

/// Events of one dataset grouped by normalized name
#[derive(Clone, Debug)]
pub struct EventGroups<R> {
    groups: BTreeMap<String, Vec<EventRecord<R>>>,
}

impl<R> EventGroups<R> {
    /// Group events by normalized name, preserving input order within a group
    ///
    /// The key is always recomputed from `raw_name`, and each record's
    /// `normalized_name` is overwritten with it.
    pub fn build(events: impl IntoIterator<Item = EventRecord<R>>) -> Self {
        let mut groups: BTreeMap<String, Vec<EventRecord<R>>> = BTreeMap::new();
        for mut event in events {
            event.normalized_name = normalize(&event.raw_name);
            groups
                .entry(event.normalized_name.clone())
                .or_default()
                .push(event);
        }
        Self { groups }
    }

    #[inline]
    pub fn get(&self, normalized_name: &str) -> Option<&[EventRecord<R>]> {
        self.groups.get(normalized_name).map(Vec::as_slice)
    }

    #[inline]
    pub fn is_duplicate(&self, normalized_name: &str) -> bool {
        self.groups
            .get(normalized_name)
            .is_some_and(|members| members.len() > 1)
    }

    /// Normalized names carried by more than one event, sorted
    pub fn duplicates(&self) -> Vec<String> {
        self.groups
            .iter()
            .filter(|(_, members)| members.len() > 1)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Number of distinct normalized names
    #[inline]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of events across all groups
    pub fn event_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

/// Outcome of matching two event sets
///
/// Per side, every input record ends up in exactly one place: inside a match or in
/// that side's unmatched list. The duplicate lists name the ambiguous normalized
/// names, whose records are all in the unmatched lists.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchOutcome<R> {
    pub matches: Vec<MatchRecord<R>>,
    pub duplicates_source: Vec<String>,
    pub duplicates_target: Vec<String>,
    pub unmatched_source: Vec<EventRecord<R>>,
    pub unmatched_target: Vec<EventRecord<R>>,
}

/// Pair source and target events by normalized name
///
/// Names are visited in sorted order, so the output is deterministic.
pub fn match_events<R>(source: EventGroups<R>, target: EventGroups<R>) -> MatchOutcome<R> {
    let duplicates_source = source.duplicates();
    let duplicates_target = target.duplicates();

    let mut matches = Vec::new();
    let mut unmatched_source = Vec::new();
    let mut unmatched_target = Vec::new();

    let mut target_groups = target.groups;

    for (name, mut source_members) in source.groups {
        let Some(mut target_members) = target_groups.remove(&name) else {
            unmatched_source.extend(source_members);
            continue;
        };

        if source_members.len() == 1 && target_members.len() == 1 {
            if let (Some(s), Some(t)) = (source_members.pop(), target_members.pop()) {
                matches.push(MatchRecord {
                    source: s,
                    target: t,
                });
            }
        } else {
            tracing::debug!(
                "Skipping ambiguous event '{name}' ({} source, {} target occurrence(s))",
                source_members.len(),
                target_members.len()
            );
            unmatched_source.extend(source_members);
            unmatched_target.extend(target_members);
        }
    }

    // Names only present on the target side
    for (_, members) in target_groups {
        unmatched_target.extend(members);
    }

    MatchOutcome {
        matches,
        duplicates_source,
        duplicates_target,
        unmatched_source,
        unmatched_target,
    }
}
