//! Report generation for analytics data.

use crate::engine::AnalyticsEngine;
use crate::error::{AnalyticsError, Result};
use crate::queries::{DEFAULT_TOP_STATES, StateCount};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary of a sighting collection, assembled from the individual queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    /// When the report was produced, RFC 3339
    pub generated_at: String,
    /// Year the year-scoped sections were restricted to
    pub year: Option<i32>,
    /// Records in the collection
    pub total_sightings: usize,
    /// Records per calendar year
    pub sightings_per_year: BTreeMap<i32, usize>,
    /// Records per configured month name
    pub sightings_per_month: BTreeMap<String, usize>,
    /// State with the most records
    pub busiest_state: Option<String>,
    /// Hour of day with the most records
    pub busiest_hour: Option<u32>,
    /// States with the most records, largest first
    pub top_states: Vec<StateCount>,
    /// Percent of records per shape; `None` when the population is empty
    pub shape_percentages: Option<BTreeMap<String, f64>>,
    /// Mean days between consecutive sightings
    pub mean_days_between: Option<f64>,
    /// Mean comment length per state
    pub mean_comment_length: BTreeMap<String, f64>,
    /// Most recent sighting per state
    pub latest_per_state: BTreeMap<String, NaiveDateTime>,
}

fn owned_keys<V>(map: BTreeMap<&str, V>) -> BTreeMap<String, V> {
    map.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

impl AnalyticsEngine {
    /// Generate a report. Shape shares and day gaps are restricted to `year`
    /// when given; the other sections cover the whole collection.
    pub fn generate_report(&self, year: Option<i32>) -> Result<AnalyticsReport> {
        let shape_percentages = match self.shape_percentages(year) {
            Ok(shares) => Some(owned_keys(shares)),
            Err(AnalyticsError::Undefined(_)) => None,
            Err(err) => return Err(err),
        };

        Ok(AnalyticsReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            year,
            total_sightings: self.len(),
            sightings_per_year: self.count_by_year(),
            sightings_per_month: owned_keys(self.count_by_month()),
            busiest_state: self.busiest_state().map(str::to_string),
            busiest_hour: self.busiest_hour(),
            top_states: self.top_states(DEFAULT_TOP_STATES),
            shape_percentages,
            mean_days_between: self.mean_days_between(year),
            mean_comment_length: owned_keys(self.mean_comment_length_by_state()),
            latest_per_state: owned_keys(self.latest_sighting_per_state()),
        })
    }

    /// Generate report as JSON string.
    pub fn generate_report_json(&self, year: Option<i32>) -> Result<String> {
        let report = self.generate_report(year)?;
        Ok(serde_json::to_string_pretty(&report)?)
    }
}
