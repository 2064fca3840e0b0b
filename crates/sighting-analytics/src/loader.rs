//! CSV decoding of sighting records.
//!
//! Expected columns, after one header row:
//! `datetime,city,state,shape,duration,comments,latitude,longitude`
//! with timestamps formatted as `month/day/year hour:minute`.

use crate::config::MalformedRowPolicy;
use crate::error::{AnalyticsError, Result};
use chrono::NaiveDateTime;
use serde::Deserialize;
use sighting_domain::{Coordinate, Sighting};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Timestamp layout of the source file.
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %H:%M";

/// Result of a load: decoded records in file order plus skipped row count.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    /// Decoded records, in file order
    pub sightings: Vec<Sighting>,
    /// Rows dropped under [`MalformedRowPolicy::Skip`]
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    datetime: String,
    city: String,
    state: String,
    shape: String,
    duration: String,
    comments: String,
    latitude: String,
    longitude: String,
}

/// Load sightings from a CSV file on disk.
pub fn load_sightings<P: AsRef<Path>>(path: P, policy: MalformedRowPolicy) -> Result<LoadOutcome> {
    let path = path.as_ref();
    debug!(path = %path.display(), "Opening sightings file");
    let file = File::open(path)?;
    let outcome = read_sightings(file, policy)?;
    info!(
        path = %path.display(),
        loaded = outcome.sightings.len(),
        skipped = outcome.skipped,
        "Sightings loaded"
    );
    Ok(outcome)
}

/// Decode sightings from any CSV byte stream.
pub fn read_sightings<R: Read>(reader: R, policy: MalformedRowPolicy) -> Result<LoadOutcome> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let mut outcome = LoadOutcome::default();

    for result in rdr.records() {
        let decoded = match result {
            Ok(record) => {
                let line = record.position().map_or(0, csv::Position::line);
                record
                    .deserialize::<RawRow>(None)
                    .map_err(|e| AnalyticsError::Decode {
                        line,
                        reason: e.to_string(),
                    })
                    .and_then(|raw| decode_row(raw, line))
            }
            Err(err) => match err.kind() {
                csv::ErrorKind::Io(_) => return Err(err.into()),
                _ => Err(AnalyticsError::Decode {
                    line: err.position().map_or(0, csv::Position::line),
                    reason: err.to_string(),
                }),
            },
        };

        match decoded {
            Ok(sighting) => outcome.sightings.push(sighting),
            Err(err) if policy == MalformedRowPolicy::Skip => {
                warn!(error = %err, "Skipping malformed sighting row");
                outcome.skipped += 1;
            }
            Err(err) => return Err(err),
        }
    }

    Ok(outcome)
}

fn decode_row(raw: RawRow, line: u64) -> Result<Sighting> {
    let fail = |reason: String| AnalyticsError::Decode { line, reason };

    let observed_at = NaiveDateTime::parse_from_str(raw.datetime.trim(), TIMESTAMP_FORMAT)
        .map_err(|e| fail(format!("bad timestamp {:?}: {e}", raw.datetime)))?;
    let duration_seconds: u64 = raw
        .duration
        .trim()
        .parse()
        .map_err(|e| fail(format!("bad duration {:?}: {e}", raw.duration)))?;
    let latitude: f64 = raw
        .latitude
        .trim()
        .parse()
        .map_err(|e| fail(format!("bad latitude {:?}: {e}", raw.latitude)))?;
    let longitude: f64 = raw
        .longitude
        .trim()
        .parse()
        .map_err(|e| fail(format!("bad longitude {:?}: {e}", raw.longitude)))?;

    Ok(Sighting::new(
        observed_at,
        raw.city,
        raw.state,
        raw.shape,
        duration_seconds,
        raw.comments,
        Coordinate::new(latitude, longitude),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "datetime,city,state,shape,duration,comments,latitude,longitude\n";

    #[test]
    fn test_reads_rows_in_order() {
        let data = format!(
            "{HEADER}\
             10/10/1999 20:30,san marcos,tx,cylinder,2700,\"This event took place, early fall\",29.8830556,-97.9411111\n\
             03/01/2005 06:05,lackland afb,tx,light,7200,,29.38421,-98.581082\n"
        );
        let outcome = read_sightings(data.as_bytes(), MalformedRowPolicy::Abort).unwrap();

        assert_eq!(outcome.skipped, 0);
        assert_eq!(outcome.sightings.len(), 2);
        let first = &outcome.sightings[0];
        assert_eq!(first.city(), "san marcos");
        assert_eq!(first.duration_seconds(), 2700);
        assert_eq!(first.comments(), "This event took place, early fall");
        assert_eq!(first.hour(), 20);
        assert_eq!(outcome.sightings[1].comments(), "");
    }

    #[test]
    fn test_abort_reports_line() {
        let data = format!(
            "{HEADER}\
             10/10/1999 20:30,a,tx,disk,10,ok,29.0,-97.0\n\
             13/45/1999 20:30,b,tx,disk,10,bad date,29.0,-97.0\n"
        );
        let err = read_sightings(data.as_bytes(), MalformedRowPolicy::Abort).unwrap_err();
        match err {
            AnalyticsError::Decode { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_skip_counts_bad_rows() {
        let data = format!(
            "{HEADER}\
             10/10/1999 20:30,a,tx,disk,ten,bad duration,29.0,-97.0\n\
             10/11/1999 20:30,b,tx,disk,10,ok,29.0,-97.0\n\
             10/12/1999 20:30,c,tx,disk,10,missing column,29.0\n\
             10/13/1999 20:30,d,tx,disk,10,bad lat,north,-97.0\n"
        );
        let outcome = read_sightings(data.as_bytes(), MalformedRowPolicy::Skip).unwrap();
        assert_eq!(outcome.sightings.len(), 1);
        assert_eq!(outcome.sightings[0].city(), "b");
        assert_eq!(outcome.skipped, 3);
    }

    #[test]
    fn test_header_only_is_empty() {
        let outcome = read_sightings(HEADER.as_bytes(), MalformedRowPolicy::Abort).unwrap();
        assert!(outcome.sightings.is_empty());
    }
}
