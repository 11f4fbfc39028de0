// odscan - Main Entry Point
//
// Batch pipeline: load and clean pings, pick a shared UTM projection,
// segment each entity into stays and moves, tag origins/destinations
// and write the three output tables.

use clap::Parser;
use odscan::config::Config;
use odscan::error::OdscanError;
use odscan::geodesy::{utm_epsg, Projection};
use odscan::ingest;
use odscan::output;
use odscan::pipeline::{self, Params};
use std::time::Instant;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    init_logging(config.verbose);

    if !config.input_crs.eq_ignore_ascii_case("EPSG:4326") {
        return Err(OdscanError::UnsupportedCrs(config.input_crs.clone()).into());
    }

    let started = Instant::now();
    info!(input = %config.input.display(), "loading pings");

    let pings = ingest::load_pings(&config.input)?;
    if pings.is_empty() {
        return Err(OdscanError::EmptyInput.into());
    }

    let epsg = match &config.projected_crs {
        Some(crs) => crs.clone(),
        None => {
            let (lat, lon) = ingest::median_coordinate(&pings)?;
            utm_epsg(lat, lon)?
        }
    };
    let projection = Projection::from_epsg(&epsg)?;
    info!(crs = %epsg, "projecting coordinates");

    let trajectories = ingest::into_trajectories(pings, &projection);
    info!(entities = trajectories.len(), "processing trajectories");

    let params = Params {
        thres_walk: config.thres_walk,
        thres_stay: config.thres_stay,
        thres_warp: config.thres_warp,
        step_secs: config.step_secs(),
        projection,
    };
    let results = pipeline::run(&trajectories, &params)?;

    let base_name = config
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pings".to_string());
    output::write_tables(&config.output_dir, &base_name, &results)?;

    let trips: usize = results.iter().map(|(_, r)| r.trips.len()).sum();
    info!(
        entities = results.len(),
        trips,
        elapsed_secs = started.elapsed().as_secs_f64(),
        "done"
    );

    Ok(())
}

/// Initialize logging subsystem
fn init_logging(verbose: bool) {
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    if verbose {
        subscriber.with_max_level(tracing::Level::DEBUG).init();
        info!("Verbose logging enabled (DEBUG level)");
    } else {
        subscriber.with_max_level(tracing::Level::INFO).init();
    }
}
