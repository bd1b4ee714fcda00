//! Collector self-telemetry
//!
//! Process-wide atomic counters describing what the collector itself is
//! doing: passes run, replies decoded, timeouts, publications consumed.
//! These are about the collector, not about the broker objects it reports.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Global collector statistics
pub static COLLECTOR_STATS: Lazy<CollectorStats> = Lazy::new(CollectorStats::new);

/// Get reference to global collector statistics
pub fn collector_stats() -> &'static CollectorStats {
    &COLLECTOR_STATS
}

pub struct CollectorStats {
    sessions_connected: AtomicU64,
    connect_failures: AtomicU64,
    passes_started: AtomicU64,
    passes_completed: AtomicU64,
    passes_failed: AtomicU64,
    requests_sent: AtomicU64,
    replies_received: AtomicU64,
    decode_errors: AtomicU64,
    receive_timeouts: AtomicU64,
    publications_processed: AtomicU64,
    subscriptions_opened: AtomicU64,
    teardown_errors: AtomicU64,
    started_at: AtomicU64,

    // Last 1000 pass durations in milliseconds
    pass_times: Mutex<Vec<u64>>,
    per_class: Mutex<HashMap<String, ClassPassStats>>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ClassPassStats {
    pub passes: u64,
    pub failures: u64,
    pub last_instance_count: u64,
}

impl CollectorStats {
    pub fn new() -> Self {
        Self {
            sessions_connected: AtomicU64::new(0),
            connect_failures: AtomicU64::new(0),
            passes_started: AtomicU64::new(0),
            passes_completed: AtomicU64::new(0),
            passes_failed: AtomicU64::new(0),
            requests_sent: AtomicU64::new(0),
            replies_received: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            receive_timeouts: AtomicU64::new(0),
            publications_processed: AtomicU64::new(0),
            subscriptions_opened: AtomicU64::new(0),
            teardown_errors: AtomicU64::new(0),
            started_at: AtomicU64::new(current_timestamp()),
            pass_times: Mutex::new(Vec::new()),
            per_class: Mutex::new(HashMap::new()),
        }
    }

    pub fn session_connected(&self) {
        self.sessions_connected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connect_failed(&self) {
        self.connect_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pass_started(&self) {
        self.passes_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pass_completed(&self, class: &str, instances: usize, duration: Duration) {
        self.passes_completed.fetch_add(1, Ordering::Relaxed);
        self.record_pass_time(duration);
        if let Ok(mut per_class) = self.per_class.lock() {
            let entry = per_class.entry(class.to_string()).or_default();
            entry.passes += 1;
            entry.last_instance_count = instances as u64;
        }
    }

    pub fn pass_failed(&self, class: &str, duration: Duration) {
        self.passes_failed.fetch_add(1, Ordering::Relaxed);
        self.record_pass_time(duration);
        if let Ok(mut per_class) = self.per_class.lock() {
            let entry = per_class.entry(class.to_string()).or_default();
            entry.passes += 1;
            entry.failures += 1;
        }
    }

    pub fn request_sent(&self) {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reply_received(&self) {
        self.replies_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn receive_timeout(&self) {
        self.receive_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn publication_processed(&self) {
        self.publications_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn subscription_opened(&self) {
        self.subscriptions_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn teardown_error(&self) {
        self.teardown_errors.fetch_add(1, Ordering::Relaxed);
    }

    fn record_pass_time(&self, duration: Duration) {
        if let Ok(mut times) = self.pass_times.lock() {
            times.push(duration.as_millis() as u64);
            if times.len() > 1000 {
                times.remove(0);
            }
        }
    }

    fn pass_time_statistics(&self) -> (f64, f64, f64) {
        let Ok(times) = self.pass_times.lock() else {
            return (0.0, 0.0, 0.0);
        };
        if times.is_empty() {
            return (0.0, 0.0, 0.0);
        }
        let mut sorted = times.clone();
        sorted.sort_unstable();
        let avg = sorted.iter().sum::<u64>() as f64 / sorted.len() as f64;
        (avg, percentile(&sorted, 50.0), percentile(&sorted, 95.0))
    }

    /// Reset all counters (useful for testing)
    pub fn reset(&self) {
        for counter in [
            &self.sessions_connected,
            &self.connect_failures,
            &self.passes_started,
            &self.passes_completed,
            &self.passes_failed,
            &self.requests_sent,
            &self.replies_received,
            &self.decode_errors,
            &self.receive_timeouts,
            &self.publications_processed,
            &self.subscriptions_opened,
            &self.teardown_errors,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        self.started_at.store(current_timestamp(), Ordering::Relaxed);
        if let Ok(mut times) = self.pass_times.lock() {
            times.clear();
        }
        if let Ok(mut per_class) = self.per_class.lock() {
            per_class.clear();
        }
    }

    pub fn snapshot(&self) -> CollectorStatsSnapshot {
        let now = current_timestamp();
        let (avg, p50, p95) = self.pass_time_statistics();
        let per_class = self
            .per_class
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default();

        CollectorStatsSnapshot {
            sessions_connected: self.sessions_connected.load(Ordering::Relaxed),
            connect_failures: self.connect_failures.load(Ordering::Relaxed),
            passes_started: self.passes_started.load(Ordering::Relaxed),
            passes_completed: self.passes_completed.load(Ordering::Relaxed),
            passes_failed: self.passes_failed.load(Ordering::Relaxed),
            requests_sent: self.requests_sent.load(Ordering::Relaxed),
            replies_received: self.replies_received.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            receive_timeouts: self.receive_timeouts.load(Ordering::Relaxed),
            publications_processed: self.publications_processed.load(Ordering::Relaxed),
            subscriptions_opened: self.subscriptions_opened.load(Ordering::Relaxed),
            teardown_errors: self.teardown_errors.load(Ordering::Relaxed),
            avg_pass_time_ms: avg,
            pass_time_p50_ms: p50,
            pass_time_p95_ms: p95,
            per_class,
            uptime_seconds: now.saturating_sub(self.started_at.load(Ordering::Relaxed)),
            timestamp: now,
        }
    }
}

impl Default for CollectorStats {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectorStatsSnapshot {
    pub sessions_connected: u64,
    pub connect_failures: u64,
    pub passes_started: u64,
    pub passes_completed: u64,
    pub passes_failed: u64,
    pub requests_sent: u64,
    pub replies_received: u64,
    pub decode_errors: u64,
    pub receive_timeouts: u64,
    pub publications_processed: u64,
    pub subscriptions_opened: u64,
    pub teardown_errors: u64,
    pub avg_pass_time_ms: f64,
    pub pass_time_p50_ms: f64,
    pub pass_time_p95_ms: f64,
    pub per_class: HashMap<String, ClassPassStats>,
    pub uptime_seconds: u64,
    pub timestamp: u64,
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn percentile(sorted_data: &[u64], percentile: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }

    let len = sorted_data.len();
    let index = (percentile / 100.0) * (len - 1) as f64;

    if index.fract() == 0.0 {
        sorted_data[index as usize] as f64
    } else {
        let lower = sorted_data[index.floor() as usize] as f64;
        let upper = sorted_data[index.ceil() as usize] as f64;
        lower + (upper - lower) * index.fract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_counters() {
        let stats = CollectorStats::new();
        stats.pass_started();
        stats.pass_completed("queue", 3, Duration::from_millis(20));
        stats.pass_started();
        stats.pass_failed("channel", Duration::from_millis(40));

        let snap = stats.snapshot();
        assert_eq!(snap.passes_started, 2);
        assert_eq!(snap.passes_completed, 1);
        assert_eq!(snap.passes_failed, 1);
        assert_eq!(snap.per_class["queue"].last_instance_count, 3);
        assert_eq!(snap.per_class["channel"].failures, 1);
        assert_eq!(snap.avg_pass_time_ms, 30.0);
    }

    #[test]
    fn test_reset_clears_everything() {
        let stats = CollectorStats::new();
        stats.reply_received();
        stats.decode_error();
        stats.pass_completed("topic", 1, Duration::from_millis(5));
        stats.reset();

        let snap = stats.snapshot();
        assert_eq!(snap.replies_received, 0);
        assert_eq!(snap.decode_errors, 0);
        assert!(snap.per_class.is_empty());
        assert_eq!(snap.avg_pass_time_ms, 0.0);
    }

    #[test]
    fn test_pass_time_window_is_bounded() {
        let stats = CollectorStats::new();
        for i in 0..1100 {
            stats.pass_completed("queue", 0, Duration::from_millis(i));
        }
        let times = stats.pass_times.lock().unwrap();
        assert_eq!(times.len(), 1000);
        assert_eq!(times[0], 100);
    }

    #[test]
    fn test_percentile() {
        assert_eq!(percentile(&[], 50.0), 0.0);
        assert_eq!(percentile(&[10], 95.0), 10.0);
        assert_eq!(percentile(&[10, 20, 30], 50.0), 20.0);
        assert_eq!(percentile(&[10, 20], 50.0), 15.0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let stats = CollectorStats::new();
        stats.subscription_opened();
        let json = serde_json::to_value(stats.snapshot()).unwrap();
        assert_eq!(json["subscriptions_opened"], 1);
    }
}
