// Error types shared across the pipeline

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OdscanError {
    /// UTM zones are only defined between 80S and 84N.
    #[error("latitude {0} is outside the UTM domain (80S to 84N)")]
    UtmLatitudeOutOfRange(f64),

    #[error("unsupported CRS '{0}': expected EPSG:4326 input or a UTM code (EPSG:326xx/327xx)")]
    UnsupportedCrs(String),

    /// Auto-selecting a projected CRS needs at least one valid ping.
    #[error("no valid pings left after cleaning")]
    EmptyInput,

    #[error("could not parse timestamp '{value}' on record {record}")]
    TimestampParse { value: String, record: u64 },

    /// Origin/destination tags must strictly alternate o, d, o, d after
    /// warp consolidation and boundary cleanup. Anything else means the
    /// tagging passes are broken and pairing would fabricate trips.
    #[error("entity {id}: origin/destination tags do not alternate")]
    TagAlternation { id: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OdscanError>;
