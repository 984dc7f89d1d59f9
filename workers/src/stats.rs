//! Per-worker performance counters.
//!
//! Only the owning worker writes; readers get a snapshot copy.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Bounded history size for recent task summaries.
const HISTORY_CAPACITY: usize = 100;

/// Summary of one executed task, kept in the ring buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSummary {
    pub succeeded: bool,
    pub processing_time_s: f64,
    pub confidence: f64,
    pub finished_at: DateTime<Utc>,
}

/// Snapshot of a worker's counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkerStats {
    pub total_tasks: u64,
    pub successful_tasks: u64,
    pub failed_tasks: u64,
    pub average_processing_time_s: f64,
    pub average_confidence: f64,
}

impl WorkerStats {
    pub fn success_rate(&self) -> f64 {
        if self.total_tasks == 0 {
            return 1.0;
        }
        self.successful_tasks as f64 / self.total_tasks as f64
    }
}

#[derive(Debug, Default)]
struct TrackerState {
    stats: WorkerStats,
    history: VecDeque<TaskSummary>,
}

/// Mutex-guarded counters with rolling averages and a bounded ring buffer
/// of recent task summaries.
#[derive(Debug, Default)]
pub struct WorkerTracker {
    state: Mutex<TrackerState>,
}

impl WorkerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, processing_time_s: f64, confidence: f64) {
        let mut state = self.state.lock();
        state.stats.total_tasks += 1;
        state.stats.successful_tasks += 1;
        let n = state.stats.total_tasks as f64;
        state.stats.average_processing_time_s +=
            (processing_time_s - state.stats.average_processing_time_s) / n;
        let successes = state.stats.successful_tasks as f64;
        state.stats.average_confidence +=
            (confidence - state.stats.average_confidence) / successes;
        Self::push_summary(&mut state, TaskSummary {
            succeeded: true,
            processing_time_s,
            confidence,
            finished_at: Utc::now(),
        });
    }

    pub fn record_failure(&self, processing_time_s: f64) {
        let mut state = self.state.lock();
        state.stats.total_tasks += 1;
        state.stats.failed_tasks += 1;
        let n = state.stats.total_tasks as f64;
        state.stats.average_processing_time_s +=
            (processing_time_s - state.stats.average_processing_time_s) / n;
        Self::push_summary(&mut state, TaskSummary {
            succeeded: false,
            processing_time_s,
            confidence: 0.0,
            finished_at: Utc::now(),
        });
    }

    fn push_summary(state: &mut TrackerState, summary: TaskSummary) {
        if state.history.len() == HISTORY_CAPACITY {
            state.history.pop_front();
        }
        state.history.push_back(summary);
    }

    pub fn snapshot(&self) -> WorkerStats {
        self.state.lock().stats.clone()
    }

    pub fn recent(&self, limit: usize) -> Vec<TaskSummary> {
        let state = self.state.lock();
        state.history.iter().rev().take(limit).cloned().collect()
    }

    /// Success rate over the ring buffer (1.0 when empty).
    pub fn recent_success_rate(&self) -> f64 {
        let state = self.state.lock();
        if state.history.is_empty() {
            return 1.0;
        }
        let ok = state.history.iter().filter(|s| s.succeeded).count();
        ok as f64 / state.history.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_roll_correctly() {
        let tracker = WorkerTracker::new();
        tracker.record_success(2.0, 0.8);
        tracker.record_success(4.0, 0.6);
        let stats = tracker.snapshot();
        assert_eq!(stats.total_tasks, 2);
        assert!((stats.average_processing_time_s - 3.0).abs() < 1e-9);
        assert!((stats.average_confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn failures_do_not_drag_confidence() {
        let tracker = WorkerTracker::new();
        tracker.record_success(1.0, 0.9);
        tracker.record_failure(1.0);
        let stats = tracker.snapshot();
        assert_eq!(stats.failed_tasks, 1);
        assert!((stats.average_confidence - 0.9).abs() < 1e-9);
        assert!((stats.success_rate() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn history_is_bounded() {
        let tracker = WorkerTracker::new();
        for _ in 0..150 {
            tracker.record_success(1.0, 0.5);
        }
        assert_eq!(tracker.recent(usize::MAX).len(), HISTORY_CAPACITY);
    }
}
