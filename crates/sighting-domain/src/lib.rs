//! # Sighting Analytics - Domain Model
//!
//! Core value objects shared by the loader, the query engine and the CLI:
//! geographic coordinates with their distance metrics, and the immutable
//! sighting record.

#![forbid(unsafe_code)]
#![warn(clippy::all, missing_docs)]

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

// =============================================================================
// VALUE OBJECTS
// =============================================================================

/// Mean Earth radius used by the haversine metric.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Geographic point in decimal degrees.
///
/// Equality and hashing compare the bit patterns of both axes, so two
/// coordinates are equal exactly when they were built from the same floats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, expected in `[-90, 90]`
    pub latitude: f64,
    /// Longitude in degrees, expected in `[-180, 180]`
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate without range checks.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Build a coordinate, rejecting values outside the valid degree ranges.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(DomainError::InvalidCoordinates {
                lat: latitude,
                lon: longitude,
            });
        }
        Ok(Self::new(latitude, longitude))
    }

    /// Round both axes to `ndigits` decimal places.
    #[must_use]
    pub fn rounded(&self, ndigits: i32) -> Self {
        Self::new(
            round_coordinate(self.latitude, ndigits),
            round_coordinate(self.longitude, ndigits),
        )
    }

    /// Euclidean distance on raw degrees. Only meaningful for coarse local
    /// comparisons.
    #[must_use]
    pub fn planar_distance(&self, other: &Self) -> f64 {
        (self.latitude - other.latitude).hypot(self.longitude - other.longitude)
    }

    /// Calculate great-circle distance to another point (Haversine formula)
    #[must_use]
    pub fn haversine_km(&self, other: &Self) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let delta_lat = (other.latitude - self.latitude).to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        // Rounding can push `a` marginally past 1 for antipodal points
        let c = 2.0 * a.sqrt().min(1.0).asin();

        EARTH_RADIUS_KM * c
    }
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.latitude.to_bits() == other.latitude.to_bits()
            && self.longitude.to_bits() == other.longitude.to_bits()
    }
}

impl Eq for Coordinate {}

impl Hash for Coordinate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.latitude.to_bits().hash(state);
        self.longitude.to_bits().hash(state);
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Round `value` to `ndigits` decimal places, halves away from zero.
///
/// Negative `ndigits` rounds to tens, hundreds, and so on. A value that
/// already has no digits beyond `ndigits` comes back unchanged.
#[must_use]
pub fn round_coordinate(value: f64, ndigits: i32) -> f64 {
    // every f64 at or above 2^52 is integral
    const INTEGRAL: f64 = 4_503_599_627_370_496.0;

    let factor = 10f64.powi(ndigits);
    if factor < f64::MIN_POSITIVE {
        return 0.0_f64.copysign(value);
    }
    let scaled = value * factor;
    if !scaled.is_finite() || scaled.abs() >= INTEGRAL {
        return value;
    }
    scaled.round() / factor
}

// =============================================================================
// DISTANCE METRICS
// =============================================================================

/// Interchangeable distance metrics between two coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Euclidean distance on raw latitude/longitude degrees
    #[default]
    Planar,
    /// Great-circle distance in kilometres
    Haversine,
}

impl DistanceMetric {
    /// Unit the metric reports distances in.
    #[must_use]
    pub const fn unit(&self) -> &'static str {
        match self {
            Self::Planar => "deg",
            Self::Haversine => "km",
        }
    }

    /// Lowercase name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Planar => "planar",
            Self::Haversine => "haversine",
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "planar" | "euclidean" => Ok(Self::Planar),
            "haversine" | "km" => Ok(Self::Haversine),
            other => Err(DomainError::InvalidDistanceMetric(other.to_string())),
        }
    }
}

/// Non-negative distance between `a` and `b` under `metric`.
#[must_use]
pub fn distance(a: &Coordinate, b: &Coordinate, metric: DistanceMetric) -> f64 {
    match metric {
        DistanceMetric::Planar => a.planar_distance(b),
        DistanceMetric::Haversine => a.haversine_km(b),
    }
}

// =============================================================================
// ENTITY TYPES
// =============================================================================

/// One observed event.
///
/// Fields are fixed at construction. Equality and hashing are structural, so
/// records with identical field values collapse when collected into a set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sighting {
    observed_at: NaiveDateTime,
    city: String,
    state: String,
    shape: String,
    duration_seconds: u64,
    comments: String,
    location: Coordinate,
}

impl Sighting {
    /// Assemble a record from already-decoded fields.
    #[must_use]
    pub fn new(
        observed_at: NaiveDateTime,
        city: impl Into<String>,
        state: impl Into<String>,
        shape: impl Into<String>,
        duration_seconds: u64,
        comments: impl Into<String>,
        location: Coordinate,
    ) -> Self {
        Self {
            observed_at,
            city: city.into(),
            state: state.into(),
            shape: shape.into(),
            duration_seconds,
            comments: comments.into(),
            location,
        }
    }

    /// Timestamp as given in the source, minute precision.
    #[must_use]
    pub const fn observed_at(&self) -> NaiveDateTime {
        self.observed_at
    }

    /// City the sighting was reported from.
    #[must_use]
    pub fn city(&self) -> &str {
        &self.city
    }

    /// State code, case preserved.
    #[must_use]
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Reported shape category, case preserved.
    #[must_use]
    pub fn shape(&self) -> &str {
        &self.shape
    }

    /// Reported duration in seconds.
    #[must_use]
    pub const fn duration_seconds(&self) -> u64 {
        self.duration_seconds
    }

    /// Free-text commentary; may be empty.
    #[must_use]
    pub fn comments(&self) -> &str {
        &self.comments
    }

    /// Where the sighting was observed.
    #[must_use]
    pub const fn location(&self) -> Coordinate {
        self.location
    }

    /// Calendar date of the observation.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.observed_at.date()
    }

    /// Calendar year of the observation.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.observed_at.year()
    }

    /// Month of the observation, 1-based.
    #[must_use]
    pub fn month(&self) -> u32 {
        self.observed_at.month()
    }

    /// Hour of day, 0 to 23.
    #[must_use]
    pub fn hour(&self) -> u32 {
        self.observed_at.hour()
    }

    /// Comment length in characters (not bytes).
    #[must_use]
    pub fn comment_len(&self) -> usize {
        self.comments.chars().count()
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Domain-level errors
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// Latitude or longitude outside the valid degree range
    #[error("Invalid coordinates: lat={lat}, lon={lon}")]
    InvalidCoordinates {
        /// Offending latitude
        lat: f64,
        /// Offending longitude
        lon: f64,
    },

    /// Unknown distance metric name
    #[error("Unknown distance metric: {0}")]
    InvalidDistanceMetric(String),
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
