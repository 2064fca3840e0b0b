//! # Sighting Analytics
//!
//! In-memory analytics engine over an immutable collection of sightings.
//! Load once, query many times.
//!
//! ## Features
//!
//! - Counting and filtering by date, state and shape
//! - Proximity selection under a configurable distance metric
//! - Extremal and date-range queries
//! - Groupings by date, month, year, hour and state
//! - Structured summary reports

#![forbid(unsafe_code)]
#![warn(clippy::all, missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod queries;
pub mod reports;

pub use config::{AnalyticsConfig, MalformedRowPolicy, MonthNames};
pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use loader::{LoadOutcome, load_sightings, read_sightings};
pub use sighting_domain::{Coordinate, DistanceMetric, Sighting};
