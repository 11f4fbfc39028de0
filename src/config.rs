use clap::Parser;
use std::path::PathBuf;

/// Stay/move segmentation and trip extraction for positional ping logs
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Input CSV with id, datetime, latitude and longitude columns
    #[arg(long, value_name = "FILE")]
    pub input: PathBuf,

    /// Directory the three output tables are written to
    #[arg(long, value_name = "DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// Walking-speed threshold in metres per minute
    #[arg(long, value_name = "M_PER_MIN")]
    pub thres_walk: f64,

    /// Minimum stay duration in minutes
    #[arg(long, value_name = "MINUTES")]
    pub thres_stay: f64,

    /// Observation gap in minutes treated as a sensor dropout
    #[arg(long, value_name = "MINUTES")]
    pub thres_warp: f64,

    /// Resampling grid frequency in minutes
    #[arg(long, value_name = "MINUTES", default_value_t = 1.0)]
    pub interp_freq: f64,

    /// CRS of the input coordinates (only EPSG:4326 is supported)
    #[arg(long, value_name = "CRS", default_value = "EPSG:4326")]
    pub input_crs: String,

    /// Projected UTM CRS, e.g. EPSG:32654; derived from the data when omitted
    #[arg(long, value_name = "CRS")]
    pub projected_crs: Option<String>,

    /// Verbose logging (DEBUG level)
    #[arg(long, short, default_value_t = false)]
    pub verbose: bool,
}

impl Config {
    /// Grid step in whole seconds, never below one second.
    pub fn step_secs(&self) -> i64 {
        ((self.interp_freq * 60.0).round() as i64).max(1)
    }
}
