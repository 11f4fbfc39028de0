// Per-entity pipeline and parallel fan-out
//
// Each entity's trajectory is processed by a pure function
// (resample -> cluster -> propagate -> tag -> pair); entities never
// share mutable state, so the fan-out is a plain rayon map with the
// per-entity results merged back in deterministic entity order.

use crate::cluster::{cluster_whole_minute, propagate_labels};
use crate::error::Result;
use crate::geodesy::Projection;
use crate::odwarp::tag_observations;
use crate::resample::resample;
use crate::trips::build_trips;
use crate::types::{InterpolatedRow, Observation, Ping, Trip};
use chrono::NaiveDateTime;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// Algorithm parameters, one set per run.
#[derive(Debug, Clone, Copy)]
pub struct Params {
    /// Metres per minute a walking entity may cover inside a stay.
    pub thres_walk: f64,
    /// Minimum stay duration in minutes.
    pub thres_stay: f64,
    /// Minimum observation gap in minutes treated as a sensor dropout.
    pub thres_warp: f64,
    /// Resampling grid step in seconds.
    pub step_secs: i64,
    /// Shared planar projection for the whole run.
    pub projection: Projection,
}

/// Everything the pipeline produces for one entity.
#[derive(Debug, Clone)]
pub struct EntityResult {
    pub interpolated: Vec<InterpolatedRow>,
    pub observations: Vec<Observation>,
    pub trips: Vec<Trip>,
}

/// Runs the full pipeline for one entity.
///
/// `trajectory` must be non-empty and strictly time-ordered.
pub fn process_entity(
    entity_id: &str,
    trajectory: &[Ping],
    params: &Params,
) -> Result<EntityResult> {
    let grid = resample(trajectory, params.step_secs);

    let minute_labels = cluster_whole_minute(&grid, params.thres_walk, params.thres_stay);

    // Propagate whole-minute labels over the union of grid instants
    // and observed instants, so off-grid pings get a label too.
    let mut union: Vec<NaiveDateTime> = grid
        .iter()
        .map(|s| s.time)
        .chain(trajectory.iter().map(|p| p.time))
        .collect();
    union.sort();
    union.dedup();
    let filled = propagate_labels(&union, &minute_labels);
    let label_at: BTreeMap<NaiveDateTime, bool> = union.into_iter().zip(filled).collect();

    let interpolated: Vec<InterpolatedRow> = grid
        .iter()
        .map(|s| {
            let (latitude, longitude) = params.projection.inverse(s.x, s.y);
            InterpolatedRow {
                time: s.time,
                latitude,
                longitude,
                interpolated: s.interpolated,
                stay: label_at[&s.time],
            }
        })
        .collect();

    let times: Vec<NaiveDateTime> = trajectory.iter().map(|p| p.time).collect();
    let stays: Vec<bool> = times.iter().map(|t| label_at[t]).collect();
    let tags = tag_observations(&times, &stays, params.thres_warp);

    let observations: Vec<Observation> = trajectory
        .iter()
        .enumerate()
        .map(|(i, p)| Observation {
            time: p.time,
            latitude: p.latitude,
            longitude: p.longitude,
            x: p.x,
            y: p.y,
            stay: stays[i],
            tag: tags[i],
            gap_prev_secs: if i > 0 {
                Some((p.time - trajectory[i - 1].time).num_seconds())
            } else {
                None
            },
        })
        .collect();

    let trips = build_trips(entity_id, &observations)?;

    debug!(
        entity = entity_id,
        grid = interpolated.len(),
        observations = observations.len(),
        trips = trips.len(),
        "entity processed"
    );

    Ok(EntityResult {
        interpolated,
        observations,
        trips,
    })
}

/// Processes all entities in parallel and merges results in entity
/// order. Entities with empty trajectories produce no rows.
pub fn run(
    trajectories: &BTreeMap<String, Vec<Ping>>,
    params: &Params,
) -> Result<Vec<(String, EntityResult)>> {
    let entities: Vec<(&String, &Vec<Ping>)> = trajectories
        .iter()
        .filter(|(_, pings)| !pings.is_empty())
        .collect();

    entities
        .par_iter()
        .map(|(id, pings)| process_entity(id, pings, params).map(|r| ((*id).clone(), r)))
        .collect()
}
