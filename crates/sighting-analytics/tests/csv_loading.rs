use std::io::Write;

use chrono::NaiveDate;
use tempfile::NamedTempFile;

use sighting_analytics::{
    AnalyticsConfig, AnalyticsEngine, AnalyticsError, Coordinate, MalformedRowPolicy,
    load_sightings,
};

const SAMPLE: &str = "\
datetime,city,state,shape,duration,comments,latitude,longitude
10/10/1999 20:30,san marcos,tx,cylinder,2700,This event took place in early fall around 1949-50.,29.8830556,-97.9411111
10/10/1999 21:00,lackland afb,tx,light,7200,1949 Lackland AFB&#44 TX.  Lights racing across the sky,29.38421,-98.581082
10/10/2005 17:00,chester (uk/england),,circle,20,Green/Orange circular disc over Chester&#44 England,53.2,-2.916667
10/11/2005 21:00,edna,tx,circle,20,My older brother and twin sister were leaving the only Edna theater,28.9783333,-96.6458333
";

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn loads_file_and_answers_queries() {
    let file = write_temp(SAMPLE);
    let engine = AnalyticsEngine::from_csv(file.path(), AnalyticsConfig::default()).unwrap();

    assert_eq!(engine.len(), 4);
    assert_eq!(engine.count_on_date(NaiveDate::from_ymd_opt(1999, 10, 10).unwrap()), 2);
    assert_eq!(engine.total_duration_in_state("tx"), 9920);
    assert_eq!(engine.busiest_state(), Some("tx"));

    // empty state field is kept as-is
    assert_eq!(engine.count_by_state()[""], 1);

    let near = engine.longest_near(&Coordinate::new(29.5, -98.3), None).unwrap();
    assert_eq!(near.0, 7200);
}

#[test]
fn malformed_row_aborts_by_default() {
    let file = write_temp(&format!("{SAMPLE}not a date,x,tx,light,1,c,1.0,2.0\n"));
    let err = AnalyticsEngine::from_csv(file.path(), AnalyticsConfig::default()).unwrap_err();
    assert!(matches!(err, AnalyticsError::Decode { line: 6, .. }));
}

#[test]
fn malformed_row_is_skipped_when_configured() {
    let file = write_temp(&format!("{SAMPLE}10/12/2005 21:00,x,tx,light,-5,c,1.0,2.0\n"));
    let outcome = load_sightings(file.path(), MalformedRowPolicy::Skip).unwrap();
    assert_eq!(outcome.sightings.len(), 4);
    assert_eq!(outcome.skipped, 1);
}

#[test]
fn largest_durations_sum_without_overflow() {
    let file = write_temp(
        "datetime,city,state,shape,duration,comments,latitude,longitude\n\
         01/02/2010 10:00,fresno,ca,light,18446744073709551615,long one,36.7,-119.8\n\
         03/04/2010 11:00,fresno,ca,light,1,short one,36.7,-119.8\n",
    );
    let engine = AnalyticsEngine::from_csv(file.path(), AnalyticsConfig::default()).unwrap();

    let expected = u128::from(u64::MAX) + 1;
    assert_eq!(engine.total_duration_in_state("ca"), expected);
    assert_eq!(engine.duration_per_year("ca")[&2010], expected);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_sightings(dir.path().join("absent.csv"), MalformedRowPolicy::Abort).unwrap_err();
    assert!(matches!(err, AnalyticsError::Io(_)));
}
