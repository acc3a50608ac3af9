//! Metrics aggregation: a time-keyed frame with forward-fill, normalized
//! and exported as CSV on [`Event::FinalReport`].
//!
//! [`Event::FinalReport`]: crate::event::Event::FinalReport

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;

/// One row of the metrics frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsRow {
    /// Aggregate CPU in use across all devices.
    pub cpu_current: f64,
    /// Aggregate GPU in use across all devices.
    pub gpu_current: f64,
    /// Aggregate memory in use across all devices.
    pub mem_current: f64,
    /// Aggregate disk in use across all devices.
    pub disk_current: f64,
    /// Aggregate bandwidth in use across all links.
    pub bw_current: f64,
    /// Running count of application arrivals.
    pub cumulative_app_arrival: u64,
    /// Running count of application departures (Undeploy).
    pub cumulative_app_departure: u64,
    /// Applications currently in WAITING (queued for retry).
    pub app_in_waiting: i64,
    /// Applications currently ACTIVE.
    pub currently_hosted_apps: i64,
    /// Processes currently deployed across all ACTIVE applications.
    pub currently_hosted_procs: i64,
    /// Running count of accepted placements.
    pub cumulative_app_accepted: u64,
    /// Running count of rejected placements.
    pub cumulative_app_rejected: u64,
}

/// A CSV record derived from a [`MetricsRow`] with resource columns
/// normalized to percent utilization.
#[derive(Debug, Serialize)]
struct ResultRecord {
    time: i64,
    cpu_avg: f64,
    gpu_avg: f64,
    memory_avg: f64,
    disk_avg: f64,
    cumulative_app_arrival: u64,
    cumulative_app_departure: u64,
    app_in_waiting: i64,
    currently_hosted_apps: i64,
    currently_hosted_procs: i64,
    cumulative_app_accepted: u64,
    cumulative_app_rejected: u64,
}

/// Time-indexed table of [`MetricsRow`]s; holds one row per time at which
/// state changed, not one row per tick.
#[derive(Debug, Default)]
pub struct MetricsFrame {
    rows: BTreeMap<i64, MetricsRow>,
}

impl MetricsFrame {
    /// An empty frame, seeded with an all-zero row at time 0.
    pub fn new() -> Self {
        let mut rows = BTreeMap::new();
        rows.insert(0, MetricsRow::default());
        Self { rows }
    }

    /// Forward-fill a new row from the previous one if `t` has no row yet,
    /// then hand it to `f` for mutation.
    pub fn apply(&mut self, t: i64, f: impl FnOnce(&mut MetricsRow)) {
        if !self.rows.contains_key(&t) {
            let prev = self.rows.range(..t).next_back().map(|(_, r)| *r).unwrap_or_default();
            self.rows.insert(t, prev);
        }
        f(self.rows.get_mut(&t).unwrap());
    }

    /// The row in effect at `t` (the last row at or before `t`).
    pub fn row_at(&self, t: i64) -> MetricsRow {
        self.rows.range(..=t).next_back().map(|(_, r)| *r).unwrap_or_default()
    }

    /// Write the frame to `path` as the normalized results CSV, normalizing
    /// each resource's aggregate usage against the network's total capacity
    /// for that resource to obtain percent utilization.
    pub fn export_csv(
        &self,
        path: impl AsRef<Path>,
        total_cpu: f64,
        total_gpu: f64,
        total_mem: f64,
        total_disk: f64,
    ) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        let pct = |used: f64, total: f64| if total > 0.0 { 100.0 * used / total } else { 0.0 };
        for (&time, row) in &self.rows {
            writer.serialize(ResultRecord {
                time,
                cpu_avg: pct(row.cpu_current, total_cpu),
                gpu_avg: pct(row.gpu_current, total_gpu),
                memory_avg: pct(row.mem_current, total_mem),
                disk_avg: pct(row.disk_current, total_disk),
                cumulative_app_arrival: row.cumulative_app_arrival,
                cumulative_app_departure: row.cumulative_app_departure,
                app_in_waiting: row.app_in_waiting,
                currently_hosted_apps: row.currently_hosted_apps,
                currently_hosted_procs: row.currently_hosted_procs,
                cumulative_app_accepted: row.cumulative_app_accepted,
                cumulative_app_rejected: row.cumulative_app_rejected,
            })?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_fills_missing_rows() {
        let mut m = MetricsFrame::new();
        m.apply(10, |r| r.cumulative_app_arrival += 1);
        m.apply(20, |r| r.cumulative_app_accepted += 1);
        let row20 = m.row_at(20);
        assert_eq!(row20.cumulative_app_arrival, 1);
        assert_eq!(row20.cumulative_app_accepted, 1);
    }

    #[test]
    fn row_at_uses_last_row_before_query_time() {
        let mut m = MetricsFrame::new();
        m.apply(10, |r| r.cumulative_app_arrival = 5);
        assert_eq!(m.row_at(15).cumulative_app_arrival, 5);
        assert_eq!(m.row_at(5).cumulative_app_arrival, 0);
    }
}
