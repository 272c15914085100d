use std::sync::{Arc, Mutex};

// min_ms starts at infinity so the first sample always becomes the minimum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingStats {
    pub samples: u64,
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

impl Default for TimingStats {
    fn default() -> Self {
        Self {
            samples: 0,
            avg_ms: 0.0,
            min_ms: f64::INFINITY,
            max_ms: 0.0,
        }
    }
}

impl TimingStats {
    pub fn record(&mut self, elapsed_ms: f64) {
        self.samples += 1;
        let n = self.samples as f64;
        self.avg_ms = (self.avg_ms * (n - 1.0) + elapsed_ms) / n;
        if elapsed_ms < self.min_ms {
            self.min_ms = elapsed_ms;
        }
        if elapsed_ms > self.max_ms {
            self.max_ms = elapsed_ms;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplicationStats {
    pub frames_sent: u64,
    pub frames_received: u64,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub timing: TimingStats,
}

#[derive(Clone, Default)]
pub struct StatsHandle {
    inner: Arc<Mutex<ReplicationStats>>,
}

impl StatsHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ReplicationStats> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self) -> ReplicationStats {
        self.lock().clone()
    }

    pub fn set(&self, stats: ReplicationStats) {
        *self.lock() = stats;
    }

    pub fn reset(&self) {
        *self.lock() = ReplicationStats::default();
    }

    pub fn record_frame_sent(&self, bytes: usize, elapsed_ms: f64) {
        let mut stats = self.lock();
        stats.frames_sent += 1;
        stats.messages_sent += 1;
        stats.bytes_sent += bytes as u64;
        stats.timing.record(elapsed_ms);
    }

    pub fn record_frame_received(&self, bytes: usize) {
        let mut stats = self.lock();
        stats.frames_received += 1;
        stats.messages_received += 1;
        stats.bytes_received += bytes as u64;
    }

    pub fn record_message_sent(&self, bytes: usize) {
        let mut stats = self.lock();
        stats.messages_sent += 1;
        stats.bytes_sent += bytes as u64;
    }

    pub fn record_message_received(&self, bytes: usize) {
        let mut stats = self.lock();
        stats.messages_received += 1;
        stats.bytes_received += bytes as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_returns_zeroed_counters_and_rearms_min() {
        let handle = StatsHandle::new();
        handle.record_frame_sent(512, 2.0);
        handle.record_message_received(64);

        handle.reset();
        let stats = handle.get();

        assert_eq!(stats.frames_sent, 0);
        assert_eq!(stats.messages_received, 0);
        assert_eq!(stats.bytes_sent, 0);
        assert_eq!(stats.timing.samples, 0);
        assert_eq!(stats.timing.min_ms, f64::INFINITY);
    }

    #[test]
    fn first_sample_after_reset_becomes_minimum() {
        let handle = StatsHandle::new();
        handle.reset();
        handle.record_frame_sent(100, 40.0);

        let timing = handle.get().timing;
        assert_eq!(timing.min_ms, 40.0);
        assert_eq!(timing.max_ms, 40.0);
    }

    #[test]
    fn running_average_increments_count_before_averaging() {
        let mut timing = TimingStats::default();

        timing.record(10.0);
        assert_eq!(timing.samples, 1);
        assert_eq!(timing.avg_ms, 10.0);

        timing.record(20.0);
        assert_eq!(timing.samples, 2);
        assert_eq!(timing.avg_ms, 15.0);

        timing.record(30.0);
        assert_eq!(timing.samples, 3);
        assert_eq!(timing.avg_ms, 20.0);
    }

    #[test]
    fn min_max_track_extremes() {
        let mut timing = TimingStats::default();
        timing.record(5.0);
        timing.record(1.0);
        timing.record(9.0);

        assert_eq!(timing.min_ms, 1.0);
        assert_eq!(timing.max_ms, 9.0);
    }

    #[test]
    fn set_replaces_whole_state() {
        let handle = StatsHandle::new();
        handle.record_frame_sent(10, 1.0);

        let mut external = ReplicationStats::default();
        external.frames_sent = 99;
        handle.set(external.clone());

        assert_eq!(handle.get(), external);
    }

    #[test]
    fn frame_counters_also_count_as_messages() {
        let handle = StatsHandle::new();
        handle.record_frame_sent(128, 0.5);
        handle.record_message_sent(32);

        let stats = handle.get();
        assert_eq!(stats.frames_sent, 1);
        assert_eq!(stats.messages_sent, 2);
        assert_eq!(stats.bytes_sent, 160);
    }
}
