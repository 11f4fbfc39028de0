// CSV ingestion and cleaning
//
// Reads the raw ping table (id, datetime, latitude, longitude), drops
// rows with missing coordinates, drops ALL copies of duplicate
// (id, datetime) rows, projects to planar coordinates and groups the
// result into per-entity time-sorted trajectories.

use crate::error::{OdscanError, Result};
use crate::geodesy::Projection;
use crate::types::Ping;
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::debug;

/// A ping as it appears in the input file, before projection.
#[derive(Debug, Clone)]
pub struct RawPing {
    pub entity_id: String,
    pub time: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
struct CsvRecord {
    id: String,
    datetime: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// Accepted timestamp layouts, tried in order after RFC 3339.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
];

fn parse_timestamp(value: &str, record: u64) -> Result<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_utc());
    }
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(dt);
        }
    }
    Err(OdscanError::TimestampParse {
        value: value.to_string(),
        record,
    })
}

/// Loads and cleans the input table.
///
/// Rows with a missing latitude or longitude are dropped silently.
/// Duplicate (id, datetime) rows are dropped entirely: neither copy
/// survives, matching the data-quality rule that a contradictory fix
/// is worse than no fix. The result is sorted by (id, time).
pub fn load_pings(path: &Path) -> Result<Vec<RawPing>> {
    let mut reader = csv::Reader::from_path(path)?;

    let mut pings: Vec<RawPing> = Vec::new();
    let mut missing = 0usize;

    for (idx, row) in reader.deserialize().enumerate() {
        let record: CsvRecord = row?;
        let (latitude, longitude) = match (record.latitude, record.longitude) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => {
                missing += 1;
                continue;
            }
        };
        pings.push(RawPing {
            entity_id: record.id,
            time: parse_timestamp(&record.datetime, idx as u64 + 1)?,
            latitude,
            longitude,
        });
    }

    let before = pings.len();
    let pings = drop_duplicates(pings);
    debug!(
        missing_coords = missing,
        duplicates = before - pings.len(),
        kept = pings.len(),
        "cleaned input"
    );

    Ok(pings)
}

/// Removes every row whose (id, time) key occurs more than once.
fn drop_duplicates(pings: Vec<RawPing>) -> Vec<RawPing> {
    let mut counts: HashMap<(String, NaiveDateTime), usize> = HashMap::new();
    for p in &pings {
        *counts.entry((p.entity_id.clone(), p.time)).or_insert(0) += 1;
    }

    let mut kept: Vec<RawPing> = pings
        .into_iter()
        .filter(|p| counts[&(p.entity_id.clone(), p.time)] == 1)
        .collect();
    kept.sort_by(|a, b| (&a.entity_id, a.time).cmp(&(&b.entity_id, b.time)));
    kept
}

/// Median latitude and longitude of the cleaned input, used for UTM
/// zone auto-selection. The median is taken over the whole input, not
/// per entity, so all entities share one projection.
pub fn median_coordinate(pings: &[RawPing]) -> Result<(f64, f64)> {
    if pings.is_empty() {
        return Err(OdscanError::EmptyInput);
    }

    let mut lats: Vec<f64> = pings.iter().map(|p| p.latitude).collect();
    let mut lons: Vec<f64> = pings.iter().map(|p| p.longitude).collect();
    Ok((median(&mut lats), median(&mut lons)))
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

/// Projects cleaned pings and groups them into per-entity trajectories,
/// each strictly ordered by time with no duplicate timestamps.
pub fn into_trajectories(
    pings: Vec<RawPing>,
    projection: &Projection,
) -> BTreeMap<String, Vec<Ping>> {
    let mut trajectories: BTreeMap<String, Vec<Ping>> = BTreeMap::new();
    for p in pings {
        let (x, y) = projection.forward(p.latitude, p.longitude);
        trajectories.entry(p.entity_id.clone()).or_default().push(Ping {
            entity_id: p.entity_id,
            time: p.time,
            latitude: p.latitude,
            longitude: p.longitude,
            x,
            y,
        });
    }
    // Input was sorted by (id, time), so each trajectory already is.
    trajectories
}
