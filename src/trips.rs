// Trip construction
//
// Pairs each surviving origin with the next destination of the same
// entity and derives elapsed time, straight-line distance and average
// speed. The tag stream handed over by the od/warp passes must
// strictly alternate o, d, o, d; anything else is an upstream bug and
// is rejected instead of being silently paired.

use crate::constants::MPS_TO_KMH;
use crate::error::{OdscanError, Result};
use crate::types::{Observation, OdTag, Trip};
use tracing::warn;

/// Builds the trip table for one entity from its tagged observations.
///
/// Zero-duration pairs have no defined speed and are skipped with a
/// warning rather than producing a division by zero.
pub fn build_trips(entity_id: &str, observations: &[Observation]) -> Result<Vec<Trip>> {
    let eligible: Vec<&Observation> = observations
        .iter()
        .filter(|o| o.tag.is_trip_eligible())
        .collect();

    let mut trips = Vec::with_capacity(eligible.len() / 2);

    for pair in eligible.chunks(2) {
        let origin = pair[0];
        if origin.tag != OdTag::Origin {
            return Err(OdscanError::TagAlternation {
                id: entity_id.to_string(),
            });
        }
        let destination = match pair.get(1) {
            Some(d) if d.tag == OdTag::Destination => *d,
            // A trailing origin survived boundary cleanup, or two
            // origins ended up adjacent.
            _ => {
                return Err(OdscanError::TagAlternation {
                    id: entity_id.to_string(),
                })
            }
        };

        let duration_secs = (destination.time - origin.time).num_seconds();
        if duration_secs == 0 {
            warn!(
                entity = entity_id,
                time = %origin.time,
                "skipping zero-duration trip"
            );
            continue;
        }

        let dx = destination.x - origin.x;
        let dy = destination.y - origin.y;
        let distance_m = (dx * dx + dy * dy).sqrt();

        trips.push(Trip {
            entity_id: entity_id.to_string(),
            origin_time: origin.time,
            origin_longitude: origin.longitude,
            origin_latitude: origin.latitude,
            destination_time: destination.time,
            destination_longitude: destination.longitude,
            destination_latitude: destination.latitude,
            duration_secs,
            distance_m,
            speed_kmh: distance_m * MPS_TO_KMH / duration_secs as f64,
        });
    }

    Ok(trips)
}
