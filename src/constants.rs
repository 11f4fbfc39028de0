// Shared unit conversions

/// Metres per second to kilometres per hour.
pub const MPS_TO_KMH: f64 = 3.6;

/// Seconds in one minute.
pub const SECS_PER_MINUTE: f64 = 60.0;
