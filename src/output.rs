// CSV output tables
//
// Serializes the merged per-entity results into the three result
// tables: interpolated points, observations and trips. Field
// formatting is fixed so identical input and configuration produce
// byte-identical files.

use crate::error::Result;
use crate::pipeline::EntityResult;
use chrono::NaiveDateTime;
use std::path::Path;
use tracing::info;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn fmt_time(t: NaiveDateTime) -> String {
    t.format(DATETIME_FORMAT).to_string()
}

fn fmt_flag(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

fn stay_str(stay: bool) -> &'static str {
    if stay {
        "stay"
    } else {
        "move"
    }
}

/// Writes the three output tables under `out_dir`, named after the
/// input file's base name.
pub fn write_tables(
    out_dir: &Path,
    base_name: &str,
    results: &[(String, EntityResult)],
) -> Result<()> {
    std::fs::create_dir_all(out_dir)?;

    write_interpolated(
        &out_dir.join(format!("{}_interpolated.csv", base_name)),
        results,
    )?;
    write_observations(
        &out_dir.join(format!("{}_observation.csv", base_name)),
        results,
    )?;
    write_trips(&out_dir.join(format!("{}_trip.csv", base_name)), results)?;

    Ok(())
}

fn write_interpolated(path: &Path, results: &[(String, EntityResult)]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "id",
        "datetime",
        "latitude",
        "longitude",
        "interpolate",
        "stay",
        "stay_str",
    ])?;

    let mut rows = 0usize;
    for (id, result) in results {
        for row in &result.interpolated {
            writer.write_record([
                id.as_str(),
                &fmt_time(row.time),
                &format!("{:.6}", row.latitude),
                &format!("{:.6}", row.longitude),
                fmt_flag(row.interpolated),
                fmt_flag(row.stay),
                stay_str(row.stay),
            ])?;
            rows += 1;
        }
    }
    writer.flush()?;

    info!(path = %path.display(), rows, "wrote interpolated points");
    Ok(())
}

fn write_observations(path: &Path, results: &[(String, EntityResult)]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "id",
        "datetime",
        "latitude",
        "longitude",
        "interpolate",
        "stay",
        "stay_str",
        "odw",
        "time_diff_secs",
    ])?;

    let mut rows = 0usize;
    for (id, result) in results {
        for obs in &result.observations {
            let gap = obs
                .gap_prev_secs
                .map(|g| g.to_string())
                .unwrap_or_default();
            writer.write_record([
                id.as_str(),
                &fmt_time(obs.time),
                &format!("{:.6}", obs.latitude),
                &format!("{:.6}", obs.longitude),
                "0",
                fmt_flag(obs.stay),
                stay_str(obs.stay),
                obs.tag.as_str(),
                &gap,
            ])?;
            rows += 1;
        }
    }
    writer.flush()?;

    info!(path = %path.display(), rows, "wrote observations");
    Ok(())
}

fn write_trips(path: &Path, results: &[(String, EntityResult)]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "id",
        "datetime_o",
        "longitude_o",
        "latitude_o",
        "datetime_d",
        "longitude_d",
        "latitude_d",
        "duration_secs",
        "direct_dist_m",
        "direct_vel_kmh",
    ])?;

    let mut rows = 0usize;
    for (_, result) in results {
        for trip in &result.trips {
            writer.write_record([
                trip.entity_id.as_str(),
                &fmt_time(trip.origin_time),
                &format!("{:.6}", trip.origin_longitude),
                &format!("{:.6}", trip.origin_latitude),
                &fmt_time(trip.destination_time),
                &format!("{:.6}", trip.destination_longitude),
                &format!("{:.6}", trip.destination_latitude),
                &trip.duration_secs.to_string(),
                &format!("{:.3}", trip.distance_m),
                &format!("{:.3}", trip.speed_kmh),
            ])?;
            rows += 1;
        }
    }
    writer.flush()?;

    info!(path = %path.display(), rows, "wrote trips");
    Ok(())
}
