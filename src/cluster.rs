// Space-time stay detection
//
// Labels each whole-minute grid sample of one entity as stationary or
// moving via density-based clustering in (x, y, z), where z is the
// unix time scaled so that one minute of elapsed time weighs the same
// as `thres_walk` metres of travel. A density-connected region in that
// space is a period of staying within `thres_walk` m/min for at least
// `thres_stay` minutes.

use crate::constants::SECS_PER_MINUTE;
use crate::types::GridSample;
use chrono::{NaiveDateTime, Timelike};
use std::collections::BTreeMap;

/// Noise marker in DBSCAN labels.
const NOISE: i32 = -1;
/// Not-yet-visited marker, only used during expansion.
const UNVISITED: i32 = -2;

/// Clusters the whole-minute subset of one entity's grid samples and
/// returns `time -> stay` for exactly that subset.
///
/// A sample is a stay iff it belongs to any cluster, core or reachable;
/// noise points are moves. Entities are clustered independently, so
/// cluster identities are never compared across entities.
pub fn cluster_whole_minute(
    samples: &[GridSample],
    thres_walk: f64,
    thres_stay: f64,
) -> BTreeMap<NaiveDateTime, bool> {
    let minute_marks: Vec<&GridSample> = samples
        .iter()
        .filter(|s| s.time.second() == 0)
        .collect();

    let z_scale = thres_walk * 3.0_f64.sqrt() / SECS_PER_MINUTE;
    let points: Vec<[f64; 3]> = minute_marks
        .iter()
        .map(|s| {
            let z = s.time.and_utc().timestamp() as f64 * z_scale;
            [s.x, s.y, z]
        })
        .collect();

    let eps = thres_walk * thres_stay / 2.0;
    let min_pts = (thres_stay / 2.0).floor() as usize;
    let labels = dbscan(&points, eps, min_pts);

    minute_marks
        .iter()
        .zip(labels)
        .map(|(s, label)| (s.time, label != NOISE))
        .collect()
}

/// Plain DBSCAN with an exhaustive neighbourhood scan.
///
/// The neighbourhood of a point includes the point itself, so a core
/// point needs `min_pts` points within `eps` counting itself. Returns
/// one label per point; -1 is noise.
fn dbscan(points: &[[f64; 3]], eps: f64, min_pts: usize) -> Vec<i32> {
    let mut labels = vec![UNVISITED; points.len()];
    let mut cluster = 0i32;

    for i in 0..points.len() {
        if labels[i] != UNVISITED {
            continue;
        }

        let neighbours = region_query(points, i, eps);
        if neighbours.len() < min_pts {
            labels[i] = NOISE;
            continue;
        }

        labels[i] = cluster;
        let mut queue: Vec<usize> = neighbours;
        let mut head = 0;
        while head < queue.len() {
            let j = queue[head];
            head += 1;

            if labels[j] == NOISE {
                // Border point reachable from a core point.
                labels[j] = cluster;
            }
            if labels[j] != UNVISITED {
                continue;
            }
            labels[j] = cluster;

            let next = region_query(points, j, eps);
            if next.len() >= min_pts {
                queue.extend(next);
            }
        }

        cluster += 1;
    }

    labels
}

fn region_query(points: &[[f64; 3]], i: usize, eps: f64) -> Vec<usize> {
    let eps_sq = eps * eps;
    let p = points[i];
    points
        .iter()
        .enumerate()
        .filter(|(_, q)| {
            let dx = p[0] - q[0];
            let dy = p[1] - q[1];
            let dz = p[2] - q[2];
            dx * dx + dy * dy + dz * dz <= eps_sq
        })
        .map(|(j, _)| j)
        .collect()
}

/// Propagates whole-minute stay labels onto an arbitrary ascending
/// timeline (grid samples and observed pings alike).
///
/// Forward-fills the most recent known label; instants before the
/// first known label are backward-filled from it; a timeline with no
/// known labels at all defaults to move.
pub fn propagate_labels(
    times: &[NaiveDateTime],
    known: &BTreeMap<NaiveDateTime, bool>,
) -> Vec<bool> {
    let mut labels: Vec<Option<bool>> = times.iter().map(|t| known.get(t).copied()).collect();

    let mut last: Option<bool> = None;
    for label in labels.iter_mut() {
        match label {
            Some(v) => last = Some(*v),
            None => *label = last,
        }
    }

    let mut next: Option<bool> = None;
    for label in labels.iter_mut().rev() {
        match label {
            Some(v) => next = Some(*v),
            None => *label = next,
        }
    }

    labels.into_iter().map(|l| l.unwrap_or(false)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(min: u32, sec: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 9, 4)
            .unwrap()
            .and_hms_opt(10, min, sec)
            .unwrap()
    }

    fn sample(min: u32, sec: u32, x: f64) -> GridSample {
        GridSample {
            time: ts(min, sec),
            x,
            y: 0.0,
            interpolated: false,
        }
    }

    #[test]
    fn test_dbscan_two_clusters_and_noise() {
        let points = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [100.0, 100.0, 0.0],
            [101.0, 100.0, 0.0],
            [500.0, 500.0, 0.0],
        ];
        let labels = dbscan(&points, 2.0, 2);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[0], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_ne!(labels[0], labels[3]);
        assert_eq!(labels[5], NOISE);
    }

    #[test]
    fn test_dbscan_neighbourhood_counts_self() {
        // With min_pts = 2 a pair within eps is already a cluster.
        let points = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let labels = dbscan(&points, 1.5, 2);
        assert_eq!(labels[0], 0);
        assert_eq!(labels[1], 0);
    }

    #[test]
    fn test_dbscan_singleton_is_noise() {
        let labels = dbscan(&[[0.0, 0.0, 0.0]], 10.0, 2);
        assert_eq!(labels, vec![NOISE]);
    }

    #[test]
    fn test_border_point_joins_cluster() {
        // Middle points are core; the chain ends are border points
        // reachable from them.
        let points = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [3.0, 0.0, 0.0],
        ];
        let labels = dbscan(&points, 1.1, 3);
        assert!(labels.iter().all(|&l| l == 0), "labels: {:?}", labels);
    }

    #[test]
    fn test_stationary_run_is_a_stay() {
        // 10 minutes at one spot: consecutive minute marks are within
        // eps of each other through the z axis alone.
        let samples: Vec<GridSample> = (0..10).map(|m| sample(m, 0, 0.0)).collect();
        let stays = cluster_whole_minute(&samples, 50.0, 5.0);
        assert_eq!(stays.len(), 10);
        assert!(stays.values().all(|&s| s));
    }

    #[test]
    fn test_fast_movement_is_noise() {
        // 200 m per minute: consecutive samples are farther apart than
        // eps = 125 m, so nothing clusters.
        let samples: Vec<GridSample> = (0..10).map(|m| sample(m, 0, m as f64 * 200.0)).collect();
        let stays = cluster_whole_minute(&samples, 50.0, 5.0);
        assert!(stays.values().all(|&s| !s));
    }

    #[test]
    fn test_only_whole_minute_samples_are_clustered() {
        let samples = vec![sample(0, 0, 0.0), sample(0, 30, 0.0), sample(1, 0, 0.0)];
        let stays = cluster_whole_minute(&samples, 50.0, 5.0);
        assert_eq!(stays.len(), 2);
        assert!(!stays.contains_key(&ts(0, 30)));
    }

    #[test]
    fn test_propagation_forward_then_backward() {
        let times: Vec<NaiveDateTime> = (0..5).map(|m| ts(m, 0)).collect();
        let mut known = BTreeMap::new();
        known.insert(ts(1, 0), true);
        known.insert(ts(3, 0), false);
        let labels = propagate_labels(&times, &known);
        // t0 backward-fills from t1; t2 forward-fills from t1;
        // t4 forward-fills from t3.
        assert_eq!(labels, vec![true, true, true, false, false]);
    }

    #[test]
    fn test_propagation_defaults_to_move() {
        let times = vec![ts(0, 10), ts(0, 50)];
        let labels = propagate_labels(&times, &BTreeMap::new());
        assert_eq!(labels, vec![false, false]);
    }
}
