//! Message identifier allocation.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeZone};
use rand::Rng;

/// Allocates `<epoch millis>.<10..99>` message ids.
///
/// The millisecond component is strictly increasing per generator, which
/// keeps ids unique even when two submissions land in the same millisecond.
///
/// A burst of `n` submissions inside one millisecond therefore allocates
/// `n` consecutive millisecond values, so under sustained load the id can
/// run ahead of the wall clock. It falls back in step once the submission
/// rate drops below one per millisecond. Ids are unique labels and do not
/// carry a reliable submission time.
#[derive(Debug, Default)]
pub struct MessageIdGenerator {
    last_millis: AtomicI64,
}

impl MessageIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next<Tz: TimeZone>(&self, submitted_at: &DateTime<Tz>) -> String {
        let now = submitted_at.timestamp_millis();
        let previous = self
            .last_millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        let millis = now.max(previous + 1);
        let suffix: u8 = rand::thread_rng().gen_range(10..99);
        format!("{}.{}", millis, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_format() {
        let generator = MessageIdGenerator::new();
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let id = generator.next(&at);
        let (millis, suffix) = id.split_once('.').unwrap();
        assert_eq!(millis, "1700000000123");
        let suffix: u8 = suffix.parse().unwrap();
        assert!((10..99).contains(&suffix));
    }

    #[test]
    fn test_same_millisecond_stays_unique() {
        let generator = MessageIdGenerator::new();
        let at = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let ids: HashSet<_> = (0..1_000).map(|_| generator.next(&at)).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn test_burst_runs_ahead_then_resyncs() {
        let generator = MessageIdGenerator::new();
        let at = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let millis = |id: String| -> i64 { id.split_once('.').unwrap().0.parse().unwrap() };

        let last = (0..5).map(|_| millis(generator.next(&at))).last().unwrap();
        assert_eq!(last, 1_700_000_000_004);

        let later = Utc.timestamp_millis_opt(1_700_000_000_010).unwrap();
        assert_eq!(millis(generator.next(&later)), 1_700_000_000_010);
    }

    #[test]
    fn test_unique_across_threads() {
        let generator = Arc::new(MessageIdGenerator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let generator = generator.clone();
                std::thread::spawn(move || {
                    (0..500).map(|_| generator.next(&Utc::now())).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(ids.insert(id));
            }
        }
        assert_eq!(ids.len(), 2_000);
    }
}
