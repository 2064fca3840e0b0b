//! Grouping and indexing queries.
//!
//! Every mapping is a `BTreeMap`, so iteration order is by key and does not
//! depend on hashing. Where a query picks the group with the largest count,
//! ties go to the smallest key.

use crate::engine::AnalyticsEngine;
use crate::error::{AnalyticsError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sighting_domain::Sighting;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

/// Records kept per state by [`AnalyticsEngine::top_by_duration_per_state`]
/// when callers have no preference.
pub const DEFAULT_TOP_N: usize = 3;

/// States returned by [`AnalyticsEngine::top_states`] when callers have no
/// preference.
pub const DEFAULT_TOP_STATES: usize = 5;

/// Record count for one state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCount {
    /// State code
    pub state: String,
    /// Number of sightings in the state
    pub sightings: usize,
}

/// Key with the largest count; the smallest key wins ties.
fn argmax<K: Ord + Copy>(counts: &BTreeMap<K, usize>) -> Option<K> {
    let mut best: Option<(K, usize)> = None;
    for (&key, &count) in counts {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((key, count));
        }
    }
    best.map(|(key, _)| key)
}

fn count_by<'a, K, F>(sightings: impl Iterator<Item = &'a Sighting>, key: F) -> BTreeMap<K, usize>
where
    K: Ord,
    F: Fn(&'a Sighting) -> K,
{
    let mut counts = BTreeMap::new();
    for s in sightings {
        *counts.entry(key(s)).or_insert(0) += 1;
    }
    counts
}

impl AnalyticsEngine {
    /// Sightings grouped by state, load order kept within each group.
    #[must_use]
    pub fn sightings_by_state(&self) -> BTreeMap<&str, Vec<&Sighting>> {
        let mut groups: BTreeMap<&str, Vec<&Sighting>> = BTreeMap::new();
        for s in &self.sightings {
            groups.entry(s.state()).or_default().push(s);
        }
        groups
    }

    /// Sightings grouped by calendar date.
    #[must_use]
    pub fn sightings_by_date(&self) -> BTreeMap<NaiveDate, HashSet<&Sighting>> {
        let mut groups: BTreeMap<NaiveDate, HashSet<&Sighting>> = BTreeMap::new();
        for s in &self.sightings {
            groups.entry(s.date()).or_default().insert(s);
        }
        groups
    }

    /// Distinct shapes keyed by the configured name of the month they were
    /// seen in. Months without sightings are absent.
    #[must_use]
    pub fn shapes_by_month(&self) -> BTreeMap<&str, BTreeSet<&str>> {
        let months = &self.config.month_names;
        let mut groups: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for s in &self.sightings {
            groups.entry(months.name(s.month())).or_default().insert(s.shape());
        }
        groups
    }

    /// Sightings per calendar year.
    #[must_use]
    pub fn count_by_year(&self) -> BTreeMap<i32, usize> {
        count_by(self.sightings.iter(), Sighting::year)
    }

    /// Sightings per month name, across all years.
    #[must_use]
    pub fn count_by_month(&self) -> BTreeMap<&str, usize> {
        let months = &self.config.month_names;
        count_by(self.sightings.iter(), |s| months.name(s.month()))
    }

    /// Sightings per state.
    #[must_use]
    pub fn count_by_state(&self) -> BTreeMap<&str, usize> {
        count_by(self.sightings.iter(), Sighting::state)
    }

    /// Sightings per hour of day.
    #[must_use]
    pub fn count_by_hour(&self) -> BTreeMap<u32, usize> {
        count_by(self.sightings.iter(), Sighting::hour)
    }

    /// State with the most sightings; `None` on an empty collection.
    #[must_use]
    pub fn busiest_state(&self) -> Option<&str> {
        argmax(&self.count_by_state())
    }

    /// Hour of day (0-23) with the most sightings; `None` on an empty
    /// collection.
    #[must_use]
    pub fn busiest_hour(&self) -> Option<u32> {
        argmax(&self.count_by_hour())
    }

    /// Year with the most sightings of `shape`; `None` if the shape never
    /// appears.
    #[must_use]
    pub fn busiest_year_for_shape(&self, shape: &str) -> Option<i32> {
        let counts = count_by(
            self.sightings.iter().filter(|s| s.shape() == shape),
            Sighting::year,
        );
        argmax(&counts)
    }

    /// Up to `n` states ordered by sighting count, largest first; equal
    /// counts are ordered by state.
    #[must_use]
    pub fn top_states(&self, n: usize) -> Vec<StateCount> {
        let mut counts: Vec<(&str, usize)> = self.count_by_state().into_iter().collect();
        // BTreeMap order plus a stable sort keeps equal counts by state
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
            .into_iter()
            .take(n)
            .map(|(state, sightings)| StateCount {
                state: state.to_string(),
                sightings,
            })
            .collect()
    }

    /// Mean comment length in characters, per state.
    #[must_use]
    pub fn mean_comment_length_by_state(&self) -> BTreeMap<&str, f64> {
        self.sightings_by_state()
            .into_iter()
            .map(|(state, group)| {
                let lengths = group.iter().map(|s| s.comment_len() as f64);
                (state, statrs::statistics::Statistics::mean(lengths))
            })
            .collect()
    }

    /// Share of sightings per shape, in percent. With `year`, both the
    /// counts and the total are restricted to that year.
    ///
    /// Fails with [`AnalyticsError::Undefined`] when the population is empty.
    pub fn shape_percentages(&self, year: Option<i32>) -> Result<BTreeMap<&str, f64>> {
        let counts = count_by(
            self.sightings
                .iter()
                .filter(|s| year.is_none_or(|y| s.year() == y)),
            Sighting::shape,
        );
        let total: usize = counts.values().sum();
        debug!(?year, total, shapes = counts.len(), "Shape share computation");

        if total == 0 {
            return Err(AnalyticsError::Undefined(match year {
                Some(y) => format!("no sightings in {y} to compute shape shares"),
                None => "no sightings to compute shape shares".to_string(),
            }));
        }

        Ok(counts
            .into_iter()
            .map(|(shape, count)| (shape, 100.0 * count as f64 / total as f64))
            .collect())
    }

    /// Per state, the `n` longest sightings, longest first. Equal durations
    /// keep load order.
    #[must_use]
    pub fn top_by_duration_per_state(&self, n: usize) -> BTreeMap<&str, Vec<&Sighting>> {
        let mut groups = self.sightings_by_state();
        for group in groups.values_mut() {
            group.sort_by(|a, b| b.duration_seconds().cmp(&a.duration_seconds()));
            group.truncate(n);
        }
        groups
    }

    /// Timestamp of the most recent sighting in each state.
    #[must_use]
    pub fn latest_sighting_per_state(&self) -> BTreeMap<&str, NaiveDateTime> {
        let mut latest: BTreeMap<&str, NaiveDateTime> = BTreeMap::new();
        for s in &self.sightings {
            latest
                .entry(s.state())
                .and_modify(|ts| *ts = (*ts).max(s.observed_at()))
                .or_insert_with(|| s.observed_at());
        }
        latest
    }

    /// Total duration in seconds per year, for one state.
    #[must_use]
    pub fn duration_per_year(&self, state: &str) -> BTreeMap<i32, u128> {
        let mut totals: BTreeMap<i32, u128> = BTreeMap::new();
        for s in self.sightings.iter().filter(|s| s.state() == state) {
            *totals.entry(s.year()).or_insert(0) += u128::from(s.duration_seconds());
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalyticsConfig, MonthNames};
    use sighting_domain::Coordinate;

    fn sighting(ts: &str, state: &str, shape: &str, duration: u64, comments: &str) -> Sighting {
        Sighting::new(
            NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M").unwrap(),
            "somewhere",
            state,
            shape,
            duration,
            comments,
            Coordinate::new(0.0, 0.0),
        )
    }

    fn sample() -> AnalyticsEngine {
        AnalyticsEngine::new(
            vec![
                sighting("2004-01-05 21:00", "ca", "light", 30, "abcd"),
                sighting("2004-01-05 22:00", "ca", "disk", 300, "ab"),
                sighting("2005-02-11 21:30", "nv", "light", 300, ""),
                sighting("2005-06-30 03:00", "tx", "circle", 10, "abcdefgh"),
                sighting("2005-06-30 22:10", "nv", "light", 45, "a"),
                sighting("2006-01-01 00:00", "ca", "light", 300, "xyz"),
            ],
            AnalyticsConfig::default(),
        )
    }

    #[test]
    fn test_argmax_prefers_smallest_key() {
        let counts = BTreeMap::from([("nv", 2), ("ca", 2), ("tx", 1)]);
        assert_eq!(argmax(&counts), Some("ca"));
        assert_eq!(argmax::<&str>(&BTreeMap::new()), None);
    }

    #[test]
    fn test_sightings_by_date() {
        let e = sample();
        let groups = e.sightings_by_date();
        assert_eq!(groups.len(), 4);
        assert_eq!(groups[&NaiveDate::from_ymd_opt(2004, 1, 5).unwrap()].len(), 2);
        assert_eq!(groups.values().map(HashSet::len).sum::<usize>(), e.len());
    }

    #[test]
    fn test_shapes_by_month_uses_injected_names() {
        let config = AnalyticsConfig {
            month_names: MonthNames::spanish(),
            ..AnalyticsConfig::default()
        };
        let e = AnalyticsEngine::new(sample().sightings().to_vec(), config);
        let groups = e.shapes_by_month();
        assert_eq!(groups["Enero"], BTreeSet::from(["disk", "light"]));
        assert_eq!(groups["Junio"], BTreeSet::from(["circle", "light"]));
        assert!(!groups.contains_key("January"));
    }

    #[test]
    fn test_counts() {
        let e = sample();
        assert_eq!(e.count_by_year(), BTreeMap::from([(2004, 2), (2005, 3), (2006, 1)]));
        assert_eq!(
            e.count_by_month(),
            BTreeMap::from([("January", 3), ("February", 1), ("June", 2)])
        );
    }

    #[test]
    fn test_busiest_state_and_hour() {
        let e = sample();
        assert_eq!(e.busiest_state(), Some("ca"));
        // hours 21 and 22 both have two sightings
        assert_eq!(e.busiest_hour(), Some(21));

        let empty = AnalyticsEngine::new(vec![], AnalyticsConfig::default());
        assert_eq!(empty.busiest_state(), None);
        assert_eq!(empty.busiest_hour(), None);
    }

    #[test]
    fn test_busiest_year_for_shape() {
        let e = sample();
        // light: one in 2004, two in 2005, one in 2006
        assert_eq!(e.busiest_year_for_shape("light"), Some(2005));
        assert_eq!(e.busiest_year_for_shape("disk"), Some(2004));
        assert_eq!(e.busiest_year_for_shape("cigar"), None);
    }

    #[test]
    fn test_top_states() {
        let e = sample();
        let top = e.top_states(2);
        assert_eq!(
            top,
            vec![
                StateCount { state: "ca".into(), sightings: 3 },
                StateCount { state: "nv".into(), sightings: 2 },
            ]
        );
        assert_eq!(e.top_states(DEFAULT_TOP_STATES).len(), 3);
        assert!(e.top_states(0).is_empty());
    }

    #[test]
    fn test_mean_comment_length_by_state() {
        let sample = sample();
        let means = sample.mean_comment_length_by_state();
        assert!((means["ca"] - 3.0).abs() < 1e-12);
        assert!((means["nv"] - 0.5).abs() < 1e-12);
        assert!((means["tx"] - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_shape_percentages() {
        let e = sample();
        let all = e.shape_percentages(None).unwrap();
        assert!((all["light"] - 400.0 / 6.0).abs() < 1e-9);
        assert!((all.values().sum::<f64>() - 100.0).abs() < 1e-9);

        let y2005 = e.shape_percentages(Some(2005)).unwrap();
        assert!((y2005["light"] - 200.0 / 3.0).abs() < 1e-9);
        assert!(!y2005.contains_key("disk"));

        assert!(matches!(
            e.shape_percentages(Some(1950)),
            Err(AnalyticsError::Undefined(_))
        ));
    }

    #[test]
    fn test_top_by_duration_per_state() {
        let e = sample();
        let top = e.top_by_duration_per_state(DEFAULT_TOP_N);
        let ca: Vec<u64> = top["ca"].iter().map(|s| s.duration_seconds()).collect();
        assert_eq!(ca, vec![300, 300, 30]);
        // equal durations keep load order
        assert_eq!(top["ca"][0].shape(), "disk");

        let one = e.top_by_duration_per_state(1);
        assert!(one.values().all(|v| v.len() == 1));
    }

    #[test]
    fn test_latest_sighting_per_state() {
        let sample = sample();
        let latest = sample.latest_sighting_per_state();
        assert_eq!(latest["ca"].to_string(), "2006-01-01 00:00:00");
        assert_eq!(latest["nv"].to_string(), "2005-06-30 22:10:00");
    }

    #[test]
    fn test_duration_per_year() {
        let e = sample();
        assert_eq!(e.duration_per_year("ca"), BTreeMap::from([(2004, 330), (2006, 300)]));
        assert!(e.duration_per_year("zz").is_empty());

        let huge = AnalyticsEngine::new(
            vec![
                sighting("2010-05-01 12:00", "ca", "light", u64::MAX, ""),
                sighting("2010-09-01 12:00", "ca", "disk", u64::MAX, ""),
            ],
            AnalyticsConfig::default(),
        );
        assert_eq!(
            huge.duration_per_year("ca"),
            BTreeMap::from([(2010, 2 * u128::from(u64::MAX))])
        );
    }
}
