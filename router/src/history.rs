//! Routing history and derived statistics.
//!
//! The router is the only writer; readers receive snapshot copies.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use scriptorium_contracts::{Complexity, RoutingDecision, TaskKind, WorkerId};
use serde::{Deserialize, Serialize};

const HISTORY_CAPACITY: usize = 1_000;

/// One routed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingRecord {
    pub timestamp: DateTime<Utc>,
    pub task_kind: TaskKind,
    pub primary_worker: WorkerId,
    pub supporting_workers: Vec<WorkerId>,
    pub complexity: Complexity,
    pub estimated_duration_s: u64,
}

/// Per-worker usage counts.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WorkerUsage {
    pub primary: u64,
    pub supporting: u64,
}

impl WorkerUsage {
    pub fn total(&self) -> u64 {
        self.primary + self.supporting
    }
}

/// Snapshot of routing statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingStatistics {
    pub total_routed: u64,
    pub worker_usage: BTreeMap<WorkerId, WorkerUsage>,
    pub complexity_distribution: BTreeMap<Complexity, u64>,
    pub average_workers_per_task: f64,
}

/// Recommendations derived from routing history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimizationReport {
    /// Workers involved in more than 40% of routed requests.
    pub overused_workers: Vec<WorkerId>,
    pub suggestions: Vec<String>,
}

/// Bounded history of routing decisions.
#[derive(Debug, Default)]
pub struct RoutingHistory {
    records: VecDeque<RoutingRecord>,
    total_routed: u64,
}

impl RoutingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: TaskKind, decision: &RoutingDecision) {
        if self.records.len() == HISTORY_CAPACITY {
            self.records.pop_front();
        }
        self.records.push_back(RoutingRecord {
            timestamp: Utc::now(),
            task_kind: kind,
            primary_worker: decision.primary_worker,
            supporting_workers: decision.supporting_workers.clone(),
            complexity: decision.complexity,
            estimated_duration_s: decision.estimated_duration_s,
        });
        self.total_routed += 1;
    }

    pub fn statistics(&self) -> RoutingStatistics {
        let mut stats = RoutingStatistics {
            total_routed: self.total_routed,
            ..RoutingStatistics::default()
        };
        if self.records.is_empty() {
            return stats;
        }
        let mut workers_used = 0u64;
        for record in &self.records {
            stats.worker_usage.entry(record.primary_worker).or_default().primary += 1;
            for worker in &record.supporting_workers {
                stats.worker_usage.entry(*worker).or_default().supporting += 1;
            }
            *stats.complexity_distribution.entry(record.complexity).or_default() += 1;
            workers_used += 1 + record.supporting_workers.len() as u64;
        }
        stats.average_workers_per_task = workers_used as f64 / self.records.len() as f64;
        stats
    }

    pub fn optimization_report(&self) -> OptimizationReport {
        let stats = self.statistics();
        let window = self.records.len() as f64;
        let mut report = OptimizationReport::default();
        if window == 0.0 {
            return report;
        }
        for (worker, usage) in &stats.worker_usage {
            if usage.total() as f64 > window * 0.4 {
                report.overused_workers.push(*worker);
            }
        }
        if !report.overused_workers.is_empty() {
            let names: Vec<&str> =
                report.overused_workers.iter().map(|w| w.as_str()).collect();
            report.suggestions.push(format!(
                "Consider load balancing for heavily used workers: {}",
                names.join(", ")
            ));
        }
        report
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
