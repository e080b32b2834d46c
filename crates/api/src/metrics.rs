use extract::ErrorKind;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

pub struct Metrics {
    // Analysis outcomes
    analyses_completed: AtomicUsize,
    empty_input: AtomicUsize,
    upstream_unavailable: AtomicUsize,
    upstream_rate_limited: AtomicUsize,
    parse_failed: AtomicUsize,
    schema_invalid: AtomicUsize,
    locale_mismatch: AtomicUsize,

    // Book fetches
    books_fetched: AtomicUsize,
    book_failures: AtomicUsize,

    // Timing (in microseconds)
    total_analyze_time_us: AtomicU64,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            analyses_completed: AtomicUsize::new(0),
            empty_input: AtomicUsize::new(0),
            upstream_unavailable: AtomicUsize::new(0),
            upstream_rate_limited: AtomicUsize::new(0),
            parse_failed: AtomicUsize::new(0),
            schema_invalid: AtomicUsize::new(0),
            locale_mismatch: AtomicUsize::new(0),
            books_fetched: AtomicUsize::new(0),
            book_failures: AtomicUsize::new(0),
            total_analyze_time_us: AtomicU64::new(0),
        })
    }

    pub fn record_analysis(&self, outcome: Result<(), ErrorKind>, duration: Duration) {
        let counter = match outcome {
            Ok(()) => &self.analyses_completed,
            Err(ErrorKind::EmptyInput) => &self.empty_input,
            Err(ErrorKind::UpstreamUnavailable) => &self.upstream_unavailable,
            Err(ErrorKind::UpstreamRateLimited) => &self.upstream_rate_limited,
            Err(ErrorKind::ParseFailed) => &self.parse_failed,
            Err(ErrorKind::SchemaInvalid) => &self.schema_invalid,
            Err(ErrorKind::LocaleMismatch) => &self.locale_mismatch,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.total_analyze_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_book_fetch(&self, success: bool) {
        if success {
            self.books_fetched.fetch_add(1, Ordering::Relaxed);
        } else {
            self.book_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let failures = [
            &self.empty_input,
            &self.upstream_unavailable,
            &self.upstream_rate_limited,
            &self.parse_failed,
            &self.schema_invalid,
            &self.locale_mismatch,
        ]
        .iter()
        .map(|c| c.load(Ordering::Relaxed))
        .sum::<usize>();
        let completed = self.analyses_completed.load(Ordering::Relaxed);
        let total = completed + failures;

        MetricsSnapshot {
            total_analyses: total,
            analyses_completed: completed,
            empty_input: self.empty_input.load(Ordering::Relaxed),
            upstream_unavailable: self.upstream_unavailable.load(Ordering::Relaxed),
            upstream_rate_limited: self.upstream_rate_limited.load(Ordering::Relaxed),
            parse_failed: self.parse_failed.load(Ordering::Relaxed),
            schema_invalid: self.schema_invalid.load(Ordering::Relaxed),
            locale_mismatch: self.locale_mismatch.load(Ordering::Relaxed),
            books_fetched: self.books_fetched.load(Ordering::Relaxed),
            book_failures: self.book_failures.load(Ordering::Relaxed),
            avg_analyze_time_ms: avg_time_ms(self.total_analyze_time_us.load(Ordering::Relaxed), total),
        }
    }
}

fn avg_time_ms(total_us: u64, count: usize) -> f64 {
    if count > 0 {
        total_us as f64 / count as f64 / 1000.0 // Convert to ms
    } else {
        0.0
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_analyses: usize,
    pub analyses_completed: usize,
    pub empty_input: usize,
    pub upstream_unavailable: usize,
    pub upstream_rate_limited: usize,
    pub parse_failed: usize,
    pub schema_invalid: usize,
    pub locale_mismatch: usize,
    pub books_fetched: usize,
    pub book_failures: usize,
    pub avg_analyze_time_ms: f64,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcomes_land_in_their_counters() {
        let metrics = Metrics::new();
        metrics.record_analysis(Ok(()), Duration::from_millis(4));
        metrics.record_analysis(Err(ErrorKind::LocaleMismatch), Duration::from_millis(2));
        metrics.record_analysis(Err(ErrorKind::ParseFailed), Duration::from_millis(3));
        metrics.record_book_fetch(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_analyses, 3);
        assert_eq!(snapshot.analyses_completed, 1);
        assert_eq!(snapshot.locale_mismatch, 1);
        assert_eq!(snapshot.parse_failed, 1);
        assert_eq!(snapshot.book_failures, 1);
        assert!((snapshot.avg_analyze_time_ms - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_snapshot_has_zero_average() {
        assert_eq!(Metrics::new().snapshot().avg_analyze_time_ms, 0.0);
    }
}
