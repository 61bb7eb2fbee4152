//! Run identifier generation.

use super::Timestamp;
use chrono::{TimeZone, Utc};
use uuid::Uuid;

/// Prefix of every run identifier.
pub const RUN_ID_PREFIX: &str = "pipeline_";

/// Generates a run identifier derived from the current time.
///
/// The suffix is a UUID v7, which embeds the millisecond start timestamp
/// and stays unique across runs started in the same millisecond.
#[must_use]
pub fn generate_run_id() -> String {
    format!("{RUN_ID_PREFIX}{}", Uuid::now_v7().simple())
}

/// Recovers the start timestamp embedded in a run identifier.
#[must_use]
pub fn run_id_timestamp(run_id: &str) -> Option<Timestamp> {
    let uuid = Uuid::parse_str(run_id.strip_prefix(RUN_ID_PREFIX)?).ok()?;
    let (secs, nanos) = uuid.get_timestamp()?.to_unix();
    Utc.timestamp_opt(i64::try_from(secs).ok()?, nanos).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_run_id_prefix() {
        let id = generate_run_id();
        assert!(id.starts_with(RUN_ID_PREFIX));
        assert_eq!(id.len(), RUN_ID_PREFIX.len() + 32);
    }

    #[test]
    fn test_run_ids_unique() {
        let ids: HashSet<_> = (0..1000).map(|_| generate_run_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_run_id_timestamp_round_trip() {
        let before = Utc::now() - chrono::Duration::seconds(1);
        let id = generate_run_id();
        let ts = run_id_timestamp(&id).unwrap();
        assert!(ts >= before);
        assert!(ts <= Utc::now() + chrono::Duration::seconds(1));
    }

    #[test]
    fn test_run_id_timestamp_rejects_garbage() {
        assert!(run_id_timestamp("pipeline_nope").is_none());
        assert!(run_id_timestamp("other_0189a3f0e4b27c5e8d2f1a0b3c4d5e6f").is_none());
    }
}
