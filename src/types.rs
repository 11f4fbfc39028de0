// Core data types for the segmentation pipeline.
//
// Everything here is plain data. Pings are immutable once ingested;
// grid samples and observations are produced per entity and never
// shared across entities.

use chrono::NaiveDateTime;

/// A single cleaned positional ping.
///
/// `x`/`y` are planar coordinates in metres, produced by projecting
/// `latitude`/`longitude` once at ingestion time. Unique per
/// (entity, time): duplicate pings are dropped entirely before this
/// type is constructed.
#[derive(Debug, Clone)]
pub struct Ping {
    pub entity_id: String,
    pub time: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
    /// Projected easting in metres.
    pub x: f64,
    /// Projected northing in metres.
    pub y: f64,
}

/// One sample on the regular resampling grid of a single entity.
#[derive(Debug, Clone, Copy)]
pub struct GridSample {
    pub time: NaiveDateTime,
    pub x: f64,
    pub y: f64,
    /// False only when the grid instant coincides exactly with an
    /// observed ping; true for synthesized positions.
    pub interpolated: bool,
}

/// Origin/destination/warp tag attached to an observation.
///
/// `Warp` marks a sensor gap long enough that movement across it
/// cannot be inferred. `OriginWarp`/`DestinationWarp` are origins and
/// destinations demoted for sitting next to such a gap (or at a
/// trajectory boundary); they never participate in trip pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OdTag {
    None,
    Origin,
    Destination,
    Warp,
    OriginWarp,
    DestinationWarp,
}

impl OdTag {
    /// Short form used in the observation table.
    pub fn as_str(&self) -> &'static str {
        match self {
            OdTag::None => "",
            OdTag::Origin => "o",
            OdTag::Destination => "d",
            OdTag::Warp => "w",
            OdTag::OriginWarp => "ow",
            OdTag::DestinationWarp => "dw",
        }
    }

    /// Only plain origins and destinations form trips.
    pub fn is_trip_eligible(&self) -> bool {
        matches!(self, OdTag::Origin | OdTag::Destination)
    }
}

/// An observed ping annotated with its propagated stay label, final
/// od/warp tag and the time gap to the previous observation of the
/// same entity.
#[derive(Debug, Clone)]
pub struct Observation {
    pub time: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
    pub x: f64,
    pub y: f64,
    /// True when the entity was stationary at this instant.
    pub stay: bool,
    pub tag: OdTag,
    /// Seconds since the previous observation; None for the first.
    pub gap_prev_secs: Option<i64>,
}

/// One row of the interpolated-points output table.
#[derive(Debug, Clone)]
pub struct InterpolatedRow {
    pub time: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
    pub interpolated: bool,
    pub stay: bool,
}

/// One inferred movement from an origin stay to the next destination
/// stay of the same entity. Immutable once created.
#[derive(Debug, Clone)]
pub struct Trip {
    pub entity_id: String,
    pub origin_time: NaiveDateTime,
    pub origin_longitude: f64,
    pub origin_latitude: f64,
    pub destination_time: NaiveDateTime,
    pub destination_longitude: f64,
    pub destination_latitude: f64,
    pub duration_secs: i64,
    /// Straight-line distance between origin and destination, metres.
    pub distance_m: f64,
    /// Average speed over the straight-line distance, km/h.
    pub speed_kmh: f64,
}
