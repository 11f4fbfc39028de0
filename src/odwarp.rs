// Origin/destination tagging with warp handling
//
// A single forward scan over one entity's time-ordered observations
// turns the stay/move label stream into raw o/d/w tags; a second scan
// over the tagged subsequence demotes origins and destinations that
// sit next to a sensor gap, where continuity of movement cannot be
// assumed. Boundary cleanup finally demotes a leading destination and
// a trailing origin, since a trajectory cannot begin or end mid-trip.

use crate::constants::SECS_PER_MINUTE;
use crate::types::OdTag;
use chrono::NaiveDateTime;

/// Raw tag emitted by the transition scan, before warp consolidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawTag {
    None,
    O,
    D,
    W,
}

/// Tags one entity's observations.
///
/// `times` and `stays` are parallel, strictly time-ordered slices of
/// the entity's observed pings with their propagated stay labels.
/// Returns the final tag for every observation.
pub fn tag_observations(
    times: &[NaiveDateTime],
    stays: &[bool],
    thres_warp: f64,
) -> Vec<OdTag> {
    debug_assert_eq!(times.len(), stays.len());
    let n = times.len();

    let raw = transition_scan(times, stays, thres_warp);
    consolidate(raw, n)
}

/// Pass 1: transition detection plus warp override.
fn transition_scan(times: &[NaiveDateTime], stays: &[bool], thres_warp: f64) -> Vec<RawTag> {
    let n = times.len();
    let mut raw = vec![RawTag::None; n];

    for i in 1..n {
        match (stays[i - 1], stays[i]) {
            // Movement ends: the current sample is a destination.
            (false, true) => raw[i] = RawTag::D,
            // Movement begins: the previous sample was the origin.
            (true, false) => raw[i - 1] = RawTag::O,
            _ => {}
        }
    }

    // A move sample bordering a gap of thres_warp minutes or more is a
    // warp; warp takes precedence over any o/d already assigned.
    let warp_secs = thres_warp * SECS_PER_MINUTE;
    for i in 0..n {
        if stays[i] {
            continue;
        }
        let gap_prev = i > 0 && (times[i] - times[i - 1]).num_seconds() as f64 >= warp_secs;
        let gap_next =
            i + 1 < n && (times[i + 1] - times[i]).num_seconds() as f64 >= warp_secs;
        if gap_prev || gap_next {
            raw[i] = RawTag::W;
        }
    }

    raw
}

/// Pass 2: warp consolidation over the tagged subsequence, then
/// boundary cleanup over what is left.
///
/// Expressed as a transition table on (previous final tag, current raw
/// tag) so each rewrite rule is explicit:
/// - a destination directly after a warp or another destination is
///   unreliable and becomes `dw`;
/// - an origin directly followed by another origin, or by a warp,
///   never reached a destination and becomes `ow`.
fn consolidate(raw: Vec<RawTag>, n: usize) -> Vec<OdTag> {
    let mut tags: Vec<OdTag> = raw
        .iter()
        .map(|r| match r {
            RawTag::None => OdTag::None,
            RawTag::O => OdTag::Origin,
            RawTag::D => OdTag::Destination,
            RawTag::W => OdTag::Warp,
        })
        .collect();

    let tagged: Vec<usize> = (0..n).filter(|&i| raw[i] != RawTag::None).collect();

    for pair in tagged.windows(2) {
        let (prev, cur) = (pair[0], pair[1]);
        match (tags[prev], raw[cur]) {
            (OdTag::Warp | OdTag::Destination | OdTag::DestinationWarp, RawTag::D) => {
                tags[cur] = OdTag::DestinationWarp;
            }
            (OdTag::Origin, RawTag::O) | (OdTag::Origin, RawTag::W) => {
                tags[prev] = OdTag::OriginWarp;
            }
            _ => {}
        }
    }

    // Boundary cleanup on the surviving o/d subsequence.
    let eligible: Vec<usize> = (0..n).filter(|&i| tags[i].is_trip_eligible()).collect();
    if let Some(&first) = eligible.first() {
        if tags[first] == OdTag::Destination {
            tags[first] = OdTag::DestinationWarp;
        }
    }
    if let Some(&last) = eligible.last() {
        if tags[last] == OdTag::Origin {
            tags[last] = OdTag::OriginWarp;
        }
    }

    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 9, 4)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    /// Builds a timeline from per-sample minute offsets.
    fn timeline(minutes: &[i64]) -> Vec<NaiveDateTime> {
        minutes.iter().map(|&m| base() + Duration::minutes(m)).collect()
    }

    #[test]
    fn test_simple_stay_move_stay() {
        let times = timeline(&[0, 1, 2, 3, 4, 5]);
        let stays = vec![true, true, false, false, true, true];
        let tags = tag_observations(&times, &stays, 30.0);
        assert_eq!(
            tags,
            vec![
                OdTag::None,
                OdTag::Origin,      // last stay before the move
                OdTag::None,
                OdTag::None,
                OdTag::Destination, // first stay after the move
                OdTag::None,
            ]
        );
    }

    #[test]
    fn test_warp_overrides_transition_tag() {
        // The move sample at index 2 is also next to a 40-minute gap.
        let times = timeline(&[0, 1, 2, 42, 43]);
        let stays = vec![true, true, false, true, true];
        let tags = tag_observations(&times, &stays, 30.0);
        // Raw tags would be o at 1, w at 2 (overriding nothing here),
        // d at 3. Consolidation demotes both neighbours of the warp.
        assert_eq!(tags[1], OdTag::OriginWarp);
        assert_eq!(tags[2], OdTag::Warp);
        assert_eq!(tags[3], OdTag::DestinationWarp);
    }

    #[test]
    fn test_stay_samples_never_warp() {
        // A 40-minute gap between two stay samples is not a warp.
        let times = timeline(&[0, 40]);
        let stays = vec![true, true];
        let tags = tag_observations(&times, &stays, 30.0);
        assert_eq!(tags, vec![OdTag::None, OdTag::None]);
    }

    #[test]
    fn test_double_origin_demotes_the_earlier() {
        // A one-sample stay both ends a move and starts the next one:
        // its d tag is overwritten by o, leaving two o tags in a row.
        let times = timeline(&[0, 1, 2, 3, 4, 5, 6]);
        let stays = vec![true, true, false, true, false, false, true];
        let tags = tag_observations(&times, &stays, 30.0);
        assert_eq!(tags[1], OdTag::OriginWarp); // earlier o, demoted
        assert_eq!(tags[3], OdTag::Origin);
        assert_eq!(tags[6], OdTag::Destination);
    }

    #[test]
    fn test_single_sample_stay_acts_as_origin() {
        // When a stay sample is both a destination and an origin, the
        // origin written later wins the slot and the pairing treats it
        // as the start of the next trip.
        let times = timeline(&[0, 1, 2, 3, 4]);
        let stays = vec![false, true, false, false, true];
        let tags = tag_observations(&times, &stays, 30.0);
        assert_eq!(tags[1], OdTag::Origin);
        assert_eq!(tags[4], OdTag::Destination);
    }

    #[test]
    fn test_boundary_leading_destination_demoted() {
        // Trajectory starts moving: the first stay is not a real
        // destination of an observed trip.
        let times = timeline(&[0, 1, 2, 3]);
        let stays = vec![false, false, true, true];
        let tags = tag_observations(&times, &stays, 30.0);
        assert_eq!(tags[2], OdTag::DestinationWarp);
    }

    #[test]
    fn test_boundary_trailing_origin_demoted() {
        let times = timeline(&[0, 1, 2, 3]);
        let stays = vec![true, true, false, false];
        let tags = tag_observations(&times, &stays, 30.0);
        assert_eq!(tags[1], OdTag::OriginWarp);
    }

    #[test]
    fn test_gap_to_next_also_warps() {
        // The move sample before the gap is warped even though its gap
        // to the previous sample is small.
        let times = timeline(&[0, 1, 2, 50, 51, 52]);
        let stays = vec![true, true, false, false, true, true];
        let tags = tag_observations(&times, &stays, 30.0);
        assert_eq!(tags[2], OdTag::Warp); // gap to next is 48 min
        assert_eq!(tags[3], OdTag::Warp); // gap to previous is 48 min
        assert_eq!(tags[1], OdTag::OriginWarp);
        assert_eq!(tags[4], OdTag::DestinationWarp);
    }

    #[test]
    fn test_no_tags_for_uniform_labels() {
        let times = timeline(&[0, 1, 2]);
        assert!(tag_observations(&times, &[true, true, true], 30.0)
            .iter()
            .all(|t| *t == OdTag::None));
        assert!(tag_observations(&times, &[false, false, false], 30.0)
            .iter()
            .all(|t| *t == OdTag::None));
    }

    #[test]
    fn test_empty_and_singleton() {
        assert!(tag_observations(&[], &[], 30.0).is_empty());
        let tags = tag_observations(&timeline(&[0]), &[false], 30.0);
        assert_eq!(tags, vec![OdTag::None]);
    }
}
