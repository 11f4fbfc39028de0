// Temporal resampling
//
// Builds a regular time grid per entity and linearly interpolates the
// projected position onto it. The grid spans [min(time), max(time)] of
// the trajectory inclusive; no sample is created beyond the last
// observed instant.

use crate::types::{GridSample, Ping};
use chrono::Duration;

/// Resamples one entity's trajectory onto a regular grid.
///
/// `trajectory` must be non-empty, strictly time-ordered and free of
/// duplicate timestamps (the ingestion layer guarantees all three).
/// `step_secs` is the grid step in seconds, at least 1.
///
/// A grid instant that coincides exactly with an observed ping takes
/// the observed position verbatim and is marked as not interpolated.
/// All other instants interpolate x and y independently, linearly in
/// time, between the bounding observed pings. A single-ping trajectory
/// produces exactly one non-interpolated sample.
pub fn resample(trajectory: &[Ping], step_secs: i64) -> Vec<GridSample> {
    debug_assert!(!trajectory.is_empty());
    debug_assert!(step_secs >= 1);

    let t0 = trajectory[0].time;
    let tn = trajectory[trajectory.len() - 1].time;

    let mut samples = Vec::new();
    let mut lower = 0usize; // last observed index with time <= t

    let mut t = t0;
    while t <= tn {
        while lower + 1 < trajectory.len() && trajectory[lower + 1].time <= t {
            lower += 1;
        }

        let a = &trajectory[lower];
        if a.time == t {
            samples.push(GridSample {
                time: t,
                x: a.x,
                y: a.y,
                interpolated: false,
            });
        } else {
            // Grid is bounded by tn, so a following ping always exists.
            let b = &trajectory[lower + 1];
            let span = (b.time - a.time).num_milliseconds() as f64;
            let frac = (t - a.time).num_milliseconds() as f64 / span;
            samples.push(GridSample {
                time: t,
                x: a.x + (b.x - a.x) * frac,
                y: a.y + (b.y - a.y) * frac,
                interpolated: true,
            });
        }

        t += Duration::seconds(step_secs);
    }

    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(min: u32, sec: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 9, 4)
            .unwrap()
            .and_hms_opt(10, min, sec)
            .unwrap()
    }

    fn ping(min: u32, sec: u32, x: f64, y: f64) -> Ping {
        Ping {
            entity_id: "a".to_string(),
            time: ts(min, sec),
            latitude: 0.0,
            longitude: 0.0,
            x,
            y,
        }
    }

    #[test]
    fn test_grid_covers_observed_span() {
        let traj = vec![ping(0, 0, 0.0, 0.0), ping(5, 0, 500.0, 0.0)];
        let grid = resample(&traj, 60);
        assert_eq!(grid.len(), 6);
        assert_eq!(grid.first().unwrap().time, ts(0, 0));
        assert_eq!(grid.last().unwrap().time, ts(5, 0));
        for pair in grid.windows(2) {
            assert_eq!((pair[1].time - pair[0].time).num_seconds(), 60);
        }
    }

    #[test]
    fn test_no_sample_beyond_last_observation() {
        // Span of 150s with a 60s step: samples at 0, 60 and 120 only.
        let traj = vec![ping(0, 0, 0.0, 0.0), ping(2, 30, 150.0, 0.0)];
        let grid = resample(&traj, 60);
        assert_eq!(grid.len(), 3);
        assert_eq!(grid.last().unwrap().time, ts(2, 0));
    }

    #[test]
    fn test_linear_interpolation_proportional_to_time() {
        let traj = vec![ping(0, 0, 0.0, 100.0), ping(4, 0, 400.0, 500.0)];
        let grid = resample(&traj, 60);
        assert!(grid[1].interpolated);
        assert!((grid[1].x - 100.0).abs() < 1e-9);
        assert!((grid[1].y - 200.0).abs() < 1e-9);
        assert!((grid[3].x - 300.0).abs() < 1e-9);
        assert!((grid[3].y - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_observed_instants_verbatim() {
        let traj = vec![
            ping(0, 0, 0.0, 0.0),
            ping(1, 0, 123.456, -7.0),
            ping(2, 0, 200.0, 0.0),
        ];
        let grid = resample(&traj, 60);
        assert!(!grid[1].interpolated);
        assert_eq!(grid[1].x, 123.456);
        assert_eq!(grid[1].y, -7.0);
    }

    #[test]
    fn test_off_grid_observation_is_skipped_but_bounds_interpolation() {
        // Ping at 0:30 is not on the grid; samples at 0:00 and 1:00
        // interpolate across it piecewise.
        let traj = vec![
            ping(0, 0, 0.0, 0.0),
            ping(0, 30, 300.0, 0.0),
            ping(1, 30, 300.0, 0.0),
        ];
        let grid = resample(&traj, 60);
        assert_eq!(grid.len(), 2);
        assert!(!grid[0].interpolated);
        assert!(grid[1].interpolated);
        // 1:00 is halfway between 0:30 and 1:30, both at x = 300.
        assert!((grid[1].x - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_ping_yields_single_sample() {
        let traj = vec![ping(3, 17, 42.0, 43.0)];
        let grid = resample(&traj, 60);
        assert_eq!(grid.len(), 1);
        assert_eq!(grid[0].time, ts(3, 17));
        assert!(!grid[0].interpolated);
        assert_eq!(grid[0].x, 42.0);
    }

    #[test]
    fn test_sub_minute_step() {
        let traj = vec![ping(0, 0, 0.0, 0.0), ping(1, 0, 60.0, 0.0)];
        let grid = resample(&traj, 15);
        assert_eq!(grid.len(), 5);
        assert!((grid[1].x - 15.0).abs() < 1e-9);
        assert!((grid[2].x - 30.0).abs() < 1e-9);
    }
}
