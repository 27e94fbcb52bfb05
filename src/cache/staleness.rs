//! Staleness Policy Module
//!
//! Decides whether a timestamped file is still fresh. Used with two
//! independent windows: the long entry lifespan and the short marker
//! write-timeout.

use std::time::{Duration, SystemTime};

// == Staleness Policy ==
/// Pure freshness check over a file modification time and a lifespan.
///
/// No I/O and no side effects; the timestamp is supplied by the caller, who
/// obtained it from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct StalenessPolicy;

impl StalenessPolicy {
    /// Checks freshness against the current wall clock.
    ///
    /// # Arguments
    /// * `modified` - Modification time of the file under evaluation
    /// * `lifespan` - Maximum age before the file counts as stale
    pub fn is_fresh(&self, modified: SystemTime, lifespan: Duration) -> bool {
        self.is_fresh_at(SystemTime::now(), modified, lifespan)
    }

    /// Checks freshness against an explicit clock reading.
    ///
    /// The file is fresh while `now - modified < lifespan`; an age exactly
    /// equal to the lifespan is stale. A modification time in the future
    /// counts as fresh.
    pub fn is_fresh_at(&self, now: SystemTime, modified: SystemTime, lifespan: Duration) -> bool {
        match now.duration_since(modified) {
            Ok(age) => age < lifespan,
            // modified is ahead of now
            Err(_) => true,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const LIFESPAN: Duration = Duration::from_secs(10);

    #[test]
    fn test_fresh_within_lifespan() {
        let policy = StalenessPolicy;
        let now = SystemTime::now();
        let modified = now - Duration::from_secs(9);

        assert!(policy.is_fresh_at(now, modified, LIFESPAN));
    }

    #[test]
    fn test_stale_past_lifespan() {
        let policy = StalenessPolicy;
        let now = SystemTime::now();
        let modified = now - Duration::from_secs(11);

        assert!(!policy.is_fresh_at(now, modified, LIFESPAN));
    }

    #[test]
    fn test_stale_at_exact_boundary() {
        let policy = StalenessPolicy;
        let now = SystemTime::now();
        let modified = now - LIFESPAN;

        assert!(!policy.is_fresh_at(now, modified, LIFESPAN));
    }

    #[test]
    fn test_future_modification_time_is_fresh() {
        let policy = StalenessPolicy;
        let now = SystemTime::now();
        let modified = now + Duration::from_secs(5);

        assert!(policy.is_fresh_at(now, modified, LIFESPAN));
    }

    #[test]
    fn test_zero_lifespan_is_always_stale() {
        let policy = StalenessPolicy;
        let now = SystemTime::now();

        assert!(!policy.is_fresh_at(now, now, Duration::ZERO));
    }
}
