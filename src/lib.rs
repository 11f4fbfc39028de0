pub mod constants;
pub mod error;
pub mod types;
pub mod geodesy;
pub mod ingest;
pub mod resample;
pub mod cluster;
pub mod odwarp;
pub mod trips;
pub mod pipeline;
pub mod output;
pub mod config;
