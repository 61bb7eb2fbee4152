//! Utility functions for run identifiers and timestamps.

mod run_id;
mod timestamps;

pub use run_id::{generate_run_id, run_id_timestamp, RUN_ID_PREFIX};
pub use timestamps::{elapsed_seconds, iso_timestamp, now_utc, Timestamp};
