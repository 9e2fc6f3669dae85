//! Load outcome accounting
//!
//! `LoadStats` is the semantic result that flows through the result queue:
//! each worker pushes one tally, the parser pushes its error count, and
//! the file pipeline sums them. The error rate only drives a
//! success/failure log line - it never triggers a retry.

/// Processed/error tally for one worker, one file or one whole batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Records successfully written (or dry-run logged)
    pub processed: u64,

    /// Records lost: structural parse errors, unknown shards, exhausted
    /// write retries
    pub errors: u64,
}

impl LoadStats {
    /// Fold another tally into this one
    pub fn merge(&mut self, other: LoadStats) {
        self.processed += other.processed;
        self.errors += other.errors;
    }

    /// Errors per processed record, with a floor of one processed
    pub fn error_rate(&self) -> f64 {
        self.errors as f64 / self.processed.max(1) as f64
    }

    /// Classify this tally against the error-rate threshold
    pub fn outcome(&self, threshold: f64) -> LoadOutcome {
        if self.processed == 0 {
            return LoadOutcome::NoRecords;
        }
        let rate = self.error_rate();
        if rate < threshold {
            LoadOutcome::Acceptable(rate)
        } else {
            LoadOutcome::High(rate)
        }
    }
}

/// Per-file verdict derived from the summed tallies
///
/// `NoRecords` is distinct from a high error rate: it usually means the
/// cache servers were never reachable or the file was empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadOutcome {
    /// Nothing was processed at all
    NoRecords,
    /// Error rate below the threshold - successful load
    Acceptable(f64),
    /// Error rate at or above the threshold - failed load
    High(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge() {
        let mut total = LoadStats::default();
        total.merge(LoadStats {
            processed: 10,
            errors: 1,
        });
        total.merge(LoadStats {
            processed: 5,
            errors: 0,
        });
        assert_eq!(total.processed, 15);
        assert_eq!(total.errors, 1);
    }

    #[test]
    fn test_error_rate_floors_processed() {
        let stats = LoadStats {
            processed: 0,
            errors: 3,
        };
        assert_eq!(stats.error_rate(), 3.0);
    }

    #[test]
    fn test_outcome_no_records() {
        let stats = LoadStats::default();
        assert_eq!(stats.outcome(0.01), LoadOutcome::NoRecords);
    }

    #[test]
    fn test_outcome_gating_at_threshold() {
        // 1/99 ≈ 1.01% is at/above a 1% threshold: failed load.
        let stats = LoadStats {
            processed: 99,
            errors: 1,
        };
        assert!(matches!(stats.outcome(0.01), LoadOutcome::High(_)));

        // 0/100 is below: successful load.
        let stats = LoadStats {
            processed: 100,
            errors: 0,
        };
        assert!(matches!(stats.outcome(0.01), LoadOutcome::Acceptable(_)));
    }

    #[test]
    fn test_outcome_exact_threshold_fails() {
        // errors/processed == threshold counts as failure, not success.
        let stats = LoadStats {
            processed: 100,
            errors: 1,
        };
        assert!(matches!(stats.outcome(0.01), LoadOutcome::High(_)));
    }
}
