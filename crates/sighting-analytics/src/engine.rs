//! In-memory analytics engine over a loaded sighting collection.

use crate::config::AnalyticsConfig;
use crate::error::{AnalyticsError, Result};
use crate::loader::load_sightings;
use chrono::NaiveDate;
use sighting_domain::{Coordinate, Sighting, distance};
use std::cmp::Reverse;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Query engine over an immutable sighting collection.
///
/// Every query borrows the collection and derives a fresh result; nothing
/// is cached or mutated, so a shared engine can be queried from many threads.
#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    pub(crate) sightings: Vec<Sighting>,
    pub(crate) config: AnalyticsConfig,
}

impl AnalyticsEngine {
    /// Create an engine over already-decoded records.
    #[must_use]
    pub const fn new(sightings: Vec<Sighting>, config: AnalyticsConfig) -> Self {
        Self { sightings, config }
    }

    /// Load a CSV file with the configured malformed-row policy.
    pub fn from_csv<P: AsRef<Path>>(path: P, config: AnalyticsConfig) -> Result<Self> {
        let outcome = load_sightings(path, config.malformed_rows)?;
        Ok(Self::new(outcome.sightings, config))
    }

    /// The records, in load order.
    #[must_use]
    pub fn sightings(&self) -> &[Sighting] {
        &self.sightings
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sightings.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sightings.is_empty()
    }

    /// Distance between two points under the configured metric.
    #[must_use]
    pub fn distance(&self, a: &Coordinate, b: &Coordinate) -> f64 {
        distance(a, b, self.config.metric)
    }

    // -------------------------------------------------------------------------
    // Counting / filtering
    // -------------------------------------------------------------------------

    /// Number of sightings observed on `date`.
    #[must_use]
    pub fn count_on_date(&self, date: NaiveDate) -> usize {
        self.sightings.iter().filter(|s| s.date() == date).count()
    }

    /// Number of distinct shapes seen in any of `states` (case-sensitive).
    #[must_use]
    pub fn distinct_shapes_in_states(&self, states: &HashSet<&str>) -> usize {
        self.sightings
            .iter()
            .filter(|s| states.contains(s.state()))
            .map(Sighting::shape)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Total duration in seconds of the sightings in `state`.
    ///
    /// Accumulated in `u128` so no collection of `u64` durations can overflow.
    #[must_use]
    pub fn total_duration_in_state(&self, state: &str) -> u128 {
        self.sightings
            .iter()
            .filter(|s| s.state() == state)
            .map(|s| u128::from(s.duration_seconds()))
            .sum()
    }

    /// Sightings strictly closer than `radius` to `center`.
    ///
    /// Set semantics: records with identical fields collapse.
    #[must_use]
    pub fn sightings_near(&self, center: &Coordinate, radius: f64) -> HashSet<&Sighting> {
        let near: HashSet<&Sighting> = self
            .sightings
            .iter()
            .filter(|s| self.distance(&s.location(), center) < radius)
            .collect();
        debug!(
            %center,
            radius,
            unit = self.config.metric.unit(),
            selected = near.len(),
            "Proximity selection"
        );
        near
    }

    // -------------------------------------------------------------------------
    // Extremal queries
    // -------------------------------------------------------------------------

    /// Longest sighting of `shape`. The first in load order wins ties.
    pub fn longest_sighting_of_shape(&self, shape: &str) -> Result<&Sighting> {
        self.sightings
            .iter()
            .filter(|s| s.shape() == shape)
            .min_by_key(|s| Reverse(s.duration_seconds()))
            .ok_or_else(|| {
                AnalyticsError::EmptySelection(format!("no sightings with shape {shape:?}"))
            })
    }

    /// `(duration, comments)` of the longest sighting within `radius` of
    /// `center`, comparing the pair as a tuple. `None` radius falls back to
    /// the configured default; `None` result means nothing was in range.
    #[must_use]
    pub fn longest_near(
        &self,
        center: &Coordinate,
        radius: Option<f64>,
    ) -> Option<(u64, String)> {
        let radius = radius.unwrap_or(self.config.default_radius);
        self.sightings_near(center, radius)
            .into_iter()
            .map(|s| (s.duration_seconds(), s.comments()))
            .max()
            .map(|(duration, comments)| (duration, comments.to_string()))
    }

    /// Sighting from `year` with the longest comment among those whose
    /// comment contains `keyword`, ignoring case. The first in load order wins
    /// ties.
    pub fn longest_comment(&self, year: i32, keyword: &str) -> Result<&Sighting> {
        let keyword = keyword.to_lowercase();
        self.sightings
            .iter()
            .filter(|s| s.year() == year && s.comments().to_lowercase().contains(&keyword))
            .min_by_key(|s| Reverse(s.comment_len()))
            .ok_or_else(|| {
                AnalyticsError::EmptySelection(format!(
                    "no sightings in {year} mentioning {keyword:?}"
                ))
            })
    }

    // -------------------------------------------------------------------------
    // Range / ordered queries
    // -------------------------------------------------------------------------

    /// Sightings dated within `[start, end]`, most recent first. Either bound
    /// may be open. Equal timestamps keep load order.
    #[must_use]
    pub fn sightings_between(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Vec<&Sighting> {
        let mut selected: Vec<&Sighting> = self
            .sightings
            .iter()
            .filter(|s| {
                let date = s.date();
                start.is_none_or(|from| from <= date) && end.is_none_or(|to| date <= to)
            })
            .collect();
        selected.sort_by(|a, b| b.observed_at().cmp(&a.observed_at()));
        selected
    }

    /// Mean number of days between chronologically consecutive sightings,
    /// optionally restricted to one year. `None` when fewer than two
    /// sightings are available.
    #[must_use]
    pub fn mean_days_between(&self, year: Option<i32>) -> Option<f64> {
        let mut selected: Vec<&Sighting> = self
            .sightings
            .iter()
            .filter(|s| year.is_none_or(|y| s.year() == y))
            .collect();
        selected.sort_by_key(|s| s.observed_at());

        let gaps: Vec<f64> = selected
            .windows(2)
            .map(|pair| (pair[1].date() - pair[0].date()).num_days() as f64)
            .collect();
        debug!(?year, pairs = gaps.len(), "Consecutive gap computation");

        if gaps.is_empty() {
            None
        } else {
            Some(statrs::statistics::Statistics::mean(gaps.iter()))
        }
    }
}
