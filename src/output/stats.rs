//! Run statistics
//!
//! Counters collected by the runner while a scrape is in progress, and the
//! end-of-run report printed by the binary.

use crate::url::ContentType;
use std::collections::BTreeMap;
use std::time::Duration;

/// Scrape run statistics summary
#[derive(Debug, Clone, Default)]
pub struct RunStatistics {
    /// Records emitted, by type
    pub records_by_type: BTreeMap<ContentType, u64>,

    /// Requests handed to the router, retries included
    pub requests: u64,

    /// Targets that produced a record
    pub targets_scraped: u64,

    /// URLs the classifier could not place
    pub skipped: u64,

    /// Targets abandoned after a fetch failure
    pub fetch_failures: u64,

    /// Documents that lacked the expected root object
    pub shape_mismatches: u64,

    /// Retry attempts of transient failures
    pub retries: u64,

    /// Enqueue attempts dropped as duplicates
    pub duplicates: u64,

    /// URLs left unprocessed because the request cap was reached
    pub over_cap: u64,

    /// Records acknowledged by the sink
    pub records_written: u64,

    pub duration: Duration,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_records(&self) -> u64 {
        self.records_by_type.values().sum()
    }

    pub fn add_records(&mut self, content_type: ContentType, count: u64) {
        if count > 0 {
            *self.records_by_type.entry(content_type).or_insert(0) += count;
        }
    }

    /// Targets that reached a final outcome
    pub fn total_targets(&self) -> u64 {
        self.targets_scraped + self.skipped + self.fetch_failures + self.shape_mismatches
    }

    /// Returns the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        let total = self.total_targets();
        if total == 0 {
            return 0.0;
        }
        (self.targets_scraped as f64 / total as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Scrape Statistics ===\n");

    println!("Overview:");
    println!("  Requests handled: {}", stats.requests);
    println!("  Records emitted: {}", stats.total_records());
    println!("  Records written: {}", stats.records_written);
    println!("  Duration: {:.1}s", stats.duration.as_secs_f64());
    println!();

    if !stats.records_by_type.is_empty() {
        println!("Records by Type:");
        let mut counts: Vec<_> = stats.records_by_type.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));

        for (content_type, count) in counts {
            println!("  {}: {}", content_type, count);
        }
        println!();
    }

    println!("Targets:");
    println!("  Scraped: {}", stats.targets_scraped);
    println!("  Skipped (unclassified): {}", stats.skipped);
    println!("  Fetch failures: {}", stats.fetch_failures);
    println!("  Shape mismatches: {}", stats.shape_mismatches);
    println!("  Retries: {}", stats.retries);
    if stats.duplicates > 0 || stats.over_cap > 0 {
        println!("  Duplicates dropped: {}", stats.duplicates);
        println!("  Over request cap: {}", stats.over_cap);
    }
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} targets scraped)",
        stats.success_rate(),
        stats.targets_scraped,
        stats.total_targets()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_records() {
        let mut stats = RunStatistics::new();
        stats.add_records(ContentType::Post, 10);
        stats.add_records(ContentType::Profile, 1);
        stats.add_records(ContentType::Post, 2);
        stats.add_records(ContentType::Comment, 0);

        assert_eq!(stats.total_records(), 13);
        assert_eq!(stats.records_by_type.get(&ContentType::Post), Some(&12));
        assert!(!stats.records_by_type.contains_key(&ContentType::Comment));
    }

    #[test]
    fn test_success_rate() {
        let mut stats = RunStatistics::new();
        stats.targets_scraped = 8;
        stats.fetch_failures = 1;
        stats.skipped = 1;

        assert!((stats.success_rate() - 80.0).abs() < 0.01);
    }

    #[test]
    fn test_success_rate_zero_targets() {
        assert_eq!(RunStatistics::new().success_rate(), 0.0);
    }
}
