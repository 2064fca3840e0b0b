//! # Sightings CLI
//!
//! Loads a sightings CSV, prints a JSON report on stdout and logs any
//! focused lookups requested on the command line.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use sighting_analytics::queries::DEFAULT_TOP_N;
use sighting_analytics::{AnalyticsConfig, AnalyticsEngine, MalformedRowPolicy};
use sighting_domain::{Coordinate, DistanceMetric};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "sightings")]
#[command(about = "Query and summarise a sightings dataset")]
struct Args {
    /// CSV file with one sighting per row, header first
    #[arg(short, long)]
    file: PathBuf,

    /// Restrict shape shares, day gaps and comment search to this year
    #[arg(short, long)]
    year: Option<i32>,

    /// State to report total and yearly durations for
    #[arg(short, long)]
    state: Option<String>,

    /// Shape to report the longest sighting and busiest year for
    #[arg(long)]
    shape: Option<String>,

    /// Keyword for the longest-comment lookup (needs --year)
    #[arg(short, long, requires = "year")]
    keyword: Option<String>,

    /// Latitude of a proximity lookup
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude of a proximity lookup
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Proximity radius; defaults to the configured radius
    #[arg(long)]
    radius: Option<f64>,

    /// Distance metric (planar or haversine); overrides the environment
    #[arg(long)]
    metric: Option<DistanceMetric>,

    /// First date of a range lookup (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last date of a range lookup (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Skip undecodable rows instead of failing
    #[arg(long)]
    skip_malformed: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let mut config = AnalyticsConfig::from_env().context("invalid configuration")?;
    if let Some(metric) = args.metric {
        config.metric = metric;
    }
    if args.skip_malformed {
        config.malformed_rows = MalformedRowPolicy::Skip;
    }

    init_tracing(&config.log_level, args.json_logs);

    info!(
        file = %args.file.display(),
        metric = config.metric.as_str(),
        malformed_rows = ?config.malformed_rows,
        "Loading sightings"
    );

    let engine = AnalyticsEngine::from_csv(&args.file, config)
        .with_context(|| format!("failed to load {}", args.file.display()))?;

    run_lookups(&engine, &args);

    println!("{}", engine.generate_report_json(args.year)?);
    Ok(())
}

fn init_tracing(default_level: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn run_lookups(engine: &AnalyticsEngine, args: &Args) {
    if let Some(state) = &args.state {
        info!(
            state = %state,
            total_seconds = engine.total_duration_in_state(state),
            per_year = ?engine.duration_per_year(state),
            "State durations"
        );
        if let Some(top) = engine.top_by_duration_per_state(DEFAULT_TOP_N).get(state.as_str()) {
            for (rank, s) in top.iter().enumerate() {
                info!(
                    rank = rank + 1,
                    observed_at = %s.observed_at(),
                    city = s.city(),
                    duration = s.duration_seconds(),
                    "Longest in state"
                );
            }
        }
    }

    if let Some(shape) = &args.shape {
        match engine.longest_sighting_of_shape(shape) {
            Ok(s) => info!(
                shape = %shape,
                observed_at = %s.observed_at(),
                duration = s.duration_seconds(),
                busiest_year = ?engine.busiest_year_for_shape(shape),
                "Longest sighting of shape"
            ),
            Err(err) => warn!(shape = %shape, "{}", err),
        }
    }

    if let (Some(year), Some(keyword)) = (args.year, &args.keyword) {
        match engine.longest_comment(year, keyword) {
            Ok(s) => info!(
                year,
                keyword = %keyword,
                comments = s.comments(),
                "Longest matching comment"
            ),
            Err(err) => warn!(year, keyword = %keyword, "{}", err),
        }
    }

    if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
        let center = Coordinate::new(lat, lon);
        let radius = args.radius.unwrap_or(engine.config().default_radius);
        let near = engine.sightings_near(&center, radius);
        match engine.longest_near(&center, Some(radius)) {
            Some((duration, comments)) => info!(
                %center,
                radius,
                nearby = near.len(),
                duration,
                comments = %comments,
                "Longest nearby sighting"
            ),
            None => warn!(%center, radius, "No sightings within radius"),
        }
    }

    if args.from.is_some() || args.to.is_some() {
        let selected = engine.sightings_between(args.from, args.to);
        info!(
            from = ?args.from,
            to = ?args.to,
            matched = selected.len(),
            most_recent = ?selected.first().map(|s| s.observed_at()),
            "Date range"
        );
    }
}
