//! # Analytics Configuration
//!
//! Explicit configuration for the engine and loader. Month names, the
//! proximity metric and the malformed-row policy are injected here instead of
//! being read from process-wide locale state.

use crate::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};
use sighting_domain::DistanceMetric;
use std::env;
use std::str::FromStr;

const ENGLISH_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const SPANISH_MONTHS: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// The twelve month names used as grouping keys, January first.
///
/// Deserialising goes through [`MonthNames::new`], so a stored list is held
/// to the same checks as one built in code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>")]
pub struct MonthNames(Vec<String>);

impl MonthNames {
    /// Build from exactly twelve names.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.len() != 12 {
            return Err(AnalyticsError::InvalidParameter(format!(
                "expected 12 month names, got {}",
                names.len()
            )));
        }
        if names.iter().any(|n| n.trim().is_empty()) {
            return Err(AnalyticsError::InvalidParameter(
                "month names must not be blank".to_string(),
            ));
        }
        Ok(Self(names))
    }

    /// English month names.
    #[must_use]
    pub fn english() -> Self {
        Self(ENGLISH_MONTHS.iter().map(|m| (*m).to_string()).collect())
    }

    /// Spanish month names, capitalised.
    #[must_use]
    pub fn spanish() -> Self {
        Self(SPANISH_MONTHS.iter().map(|m| (*m).to_string()).collect())
    }

    /// Name for a 1-based month number.
    ///
    /// # Panics
    ///
    /// Panics if `month` is not in `1..=12`; chrono never yields such a month.
    #[must_use]
    pub fn name(&self, month: u32) -> &str {
        &self.0[month as usize - 1]
    }
}

impl TryFrom<Vec<String>> for MonthNames {
    type Error = AnalyticsError;

    fn try_from(names: Vec<String>) -> Result<Self> {
        Self::new(names)
    }
}

impl Default for MonthNames {
    fn default() -> Self {
        Self::english()
    }
}

/// What the loader does with a row it cannot decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedRowPolicy {
    /// Stop loading and return the decode error
    #[default]
    Abort,
    /// Log a warning, count the row and keep going
    Skip,
}

impl FromStr for MalformedRowPolicy {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" | "fail" => Ok(Self::Abort),
            "skip" | "warn" => Ok(Self::Skip),
            other => Err(AnalyticsError::Config(format!(
                "unknown malformed-row policy: {other}"
            ))),
        }
    }
}

/// Engine and loader configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Grouping keys for month-based queries
    pub month_names: MonthNames,

    /// Metric used everywhere proximity is evaluated
    pub metric: DistanceMetric,

    /// Radius used when a caller does not give one, in `metric` units
    pub default_radius: f64,

    /// Loader behaviour on undecodable rows
    pub malformed_rows: MalformedRowPolicy,

    /// Logging level
    pub log_level: String,
}

impl AnalyticsConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup; unset keys keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let month_names = match lookup("SIGHTINGS_MONTH_NAMES") {
            Some(v) => MonthNames::new(v.split(',').map(str::trim))?,
            None => defaults.month_names,
        };

        let metric: DistanceMetric = match lookup("SIGHTINGS_DISTANCE_METRIC") {
            Some(v) => v.parse()?,
            None => defaults.metric,
        };

        let default_radius = match lookup("SIGHTINGS_DEFAULT_RADIUS") {
            Some(v) => {
                let r: f64 = v.trim().parse().map_err(|_| {
                    AnalyticsError::Config(format!("invalid SIGHTINGS_DEFAULT_RADIUS: {v}"))
                })?;
                if !r.is_finite() || r < 0.0 {
                    return Err(AnalyticsError::Config(format!(
                        "SIGHTINGS_DEFAULT_RADIUS must be a non-negative number, got {v}"
                    )));
                }
                r
            }
            None => defaults.default_radius,
        };

        let malformed_rows: MalformedRowPolicy = match lookup("SIGHTINGS_MALFORMED_ROWS") {
            Some(v) => v.parse()?,
            None => defaults.malformed_rows,
        };

        Ok(Self {
            month_names,
            metric,
            default_radius,
            malformed_rows,
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            month_names: MonthNames::default(),
            metric: DistanceMetric::Planar,
            default_radius: 0.5,
            malformed_rows: MalformedRowPolicy::Abort,
            log_level: "info".to_string(),
        }
    }
}
