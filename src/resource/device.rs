//! Device and the Resource Ledger operations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants::{Resource, RESOURCE_KINDS};
use crate::error::{DeviceId, Result, SimError};
use crate::topology::{OspfRoutingTable, RoutingTable};

/// Position in 3-space, used by synthetic topology generation and by the
/// batch optimizer's range constraint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl Position {
    /// Euclidean distance to another position.
    pub fn distance(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2) + (self.z - other.z).powi(2)).sqrt()
    }
}

/// Options controlling a single ledger operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllocateOpts {
    /// Skip the `t ≥ last_history_time[r]` precondition.
    pub force: bool,
    /// Allow theoretical usage to exceed the device's cap without being
    /// clamped to it.
    pub overconsume: bool,
}

/// A compute node with bounded, per-resource, time-stamped accounting.
#[derive(Debug, Clone)]
pub struct Device {
    /// Stable device identity.
    pub id: DeviceId,
    /// Position in 3-space.
    pub position: Position,
    /// Per-resource capacity.
    pub limit: HashMap<Resource, f64>,
    /// Per-resource current (clamped) usage.
    usage: HashMap<Resource, f64>,
    /// Per-resource theoretical (unclamped) usage.
    theoretical: HashMap<Resource, f64>,
    /// Per-resource step-function history of `(time, value)` samples.
    history: HashMap<Resource, Vec<(i64, f64)>>,
    /// Simple routing table: destination -> (next_hop, metric).
    pub routing_table: RoutingTable,
    /// OSPF-style routing table: destination -> [Route, ...].
    pub ospf_routing_table: OspfRoutingTable,
}

impl Device {
    /// A new device with the given resource caps, all usage at zero at
    /// time 0.
    pub fn new(id: DeviceId, position: Position, limit: HashMap<Resource, f64>) -> Self {
        let mut usage = HashMap::new();
        let mut theoretical = HashMap::new();
        let mut history = HashMap::new();
        for r in RESOURCE_KINDS {
            usage.insert(r, 0.0);
            theoretical.insert(r, 0.0);
            history.insert(r, vec![(0, 0.0)]);
        }
        Self {
            id,
            position,
            limit,
            usage,
            theoretical,
            history,
            routing_table: RoutingTable::new(id),
            ospf_routing_table: OspfRoutingTable::new(),
        }
    }

    /// Current (clamped) usage of `r`.
    pub fn current_usage(&self, r: Resource) -> f64 {
        *self.usage.get(&r).unwrap_or(&0.0)
    }

    fn last_history(&self, r: Resource) -> (i64, f64) {
        self.history.get(&r).and_then(|h| h.last().copied()).unwrap_or((0, 0.0))
    }

    /// Residual capacity of `r` before the cap is hit.
    pub fn residual(&self, r: Resource) -> f64 {
        self.limit.get(&r).copied().unwrap_or(0.0) - self.current_usage(r)
    }

    /// Integrity probe: the ledger's current usage must
    /// match the last recorded history sample.
    pub fn check_usage(&self, r: Resource) -> Result<f64> {
        let current = self.current_usage(r);
        let (_, last_value) = self.last_history(r);
        if (current - last_value).abs() > f64::EPSILON {
            return Err(SimError::LedgerInconsistent(self.id, r));
        }
        Ok(current)
    }

    /// Apply a signed resource delta at time `t`, returning the retrofit
    /// coefficient. `amount` may be negative (used by [`Device::release`]).
    pub fn allocate(&mut self, t: i64, r: Resource, amount: f64, opts: AllocateOpts) -> Result<f64> {
        let (last_time, _) = self.last_history(r);
        if t < last_time && !opts.force {
            return Err(SimError::TimeRegression { device: self.id, attempted: t, last: last_time });
        }

        let limit = self.limit.get(&r).copied().unwrap_or(0.0);
        let theoretical_prev = *self.theoretical.get(&r).unwrap_or(&0.0);
        let theoretical_new = (theoretical_prev + amount).max(0.0);
        self.theoretical.insert(r, theoretical_new);

        let old_current = self.current_usage(r);
        let (current, retrofit) = if opts.overconsume || theoretical_new <= limit {
            let retrofit = if theoretical_prev == 0.0 { 1.0 } else { theoretical_new / theoretical_prev };
            (theoretical_new, retrofit)
        } else {
            let retrofit = if theoretical_new == 0.0 { 1.0 } else { limit / theoretical_new };
            (limit, retrofit)
        };
        self.usage.insert(r, current);

        if (current - old_current).abs() > f64::EPSILON {
            let hist = self.history.entry(r).or_default();
            let (prev_time, prev_value) = hist.last().copied().unwrap_or((t, old_current));
            if prev_time == t {
                *hist.last_mut().unwrap() = (t, current);
            } else {
                hist.push((t - 1, prev_value));
                hist.push((t, current));
            }
        }

        Ok(retrofit)
    }

    /// `release(device, t, r, amount, opts)` is `allocate(..., -amount,
    /// ...)`.
    pub fn release(&mut self, t: i64, r: Resource, amount: f64, opts: AllocateOpts) -> Result<f64> {
        self.allocate(t, r, -amount, opts)
    }

    /// Allocate every resource in `request`. Partial failures are logged
    /// and do not abort the batch.
    pub fn allocate_all(&mut self, t: i64, request: &HashMap<Resource, f64>, opts: AllocateOpts) {
        for (&r, &amount) in request {
            if let Err(e) = self.allocate(t, r, amount, opts) {
                log::warn!("device {}: failed to allocate {} {:?}: {}", self.id, amount, r, e);
            }
        }
    }

    /// Release every resource in `request`. Partial failures are logged
    /// and do not abort the batch.
    pub fn release_all(&mut self, t: i64, request: &HashMap<Resource, f64>, opts: AllocateOpts) {
        for (&r, &amount) in request {
            if let Err(e) = self.release(t, r, amount, opts) {
                log::warn!("device {}: failed to release {} {:?}: {}", self.id, amount, r, e);
            }
        }
    }

    /// `report(device, t)`: appends the last value of every tracked
    /// resource at time `t`; no-op unless `force` or `t ≥ max_last_time`.
    pub fn report(&mut self, t: i64, force: bool) {
        let max_last_time = RESOURCE_KINDS.iter().map(|&r| self.last_history(r).0).max().unwrap_or(0);
        if !force && t < max_last_time {
            return;
        }
        for r in RESOURCE_KINDS {
            let value = self.current_usage(r);
            self.history.entry(r).or_default().push((t, value));
        }
    }

    /// Whether `request` fits in the device's residual capacity, i.e. the
    /// process is individually deployable.
    pub fn deployable(&self, request: &HashMap<Resource, f64>) -> bool {
        request.iter().all(|(&r, &amount)| {
            amount + self.current_usage(r) <= self.limit.get(&r).copied().unwrap_or(0.0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(cpu_limit: f64) -> Device {
        let mut limit = HashMap::new();
        limit.insert(Resource::Cpu, cpu_limit);
        limit.insert(Resource::Gpu, 0.0);
        limit.insert(Resource::Mem, 1024.0);
        limit.insert(Resource::Disk, 1024.0);
        Device::new(0, Position { x: 0.0, y: 0.0, z: 0.0 }, limit)
    }

    #[test]
    fn allocate_under_cap_sets_current_to_theoretical() {
        let mut d = device(4.0);
        d.allocate(10, Resource::Cpu, 2.0, AllocateOpts::default()).unwrap();
        assert_eq!(d.current_usage(Resource::Cpu), 2.0);
        d.check_usage(Resource::Cpu).unwrap();
    }

    #[test]
    fn allocate_over_cap_clamps_and_reports_retrofit() {
        let mut d = device(4.0);
        let retrofit = d.allocate(10, Resource::Cpu, 6.0, AllocateOpts::default()).unwrap();
        assert_eq!(d.current_usage(Resource::Cpu), 4.0);
        assert!((retrofit - 4.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn allocate_past_time_without_force_errors() {
        let mut d = device(4.0);
        d.allocate(10, Resource::Cpu, 1.0, AllocateOpts::default()).unwrap();
        let err = d.allocate(5, Resource::Cpu, 1.0, AllocateOpts::default());
        assert!(matches!(err, Err(SimError::TimeRegression { .. })));
    }

    #[test]
    fn history_replaces_same_time_sample() {
        let mut d = device(4.0);
        d.allocate(10, Resource::Cpu, 1.0, AllocateOpts::default()).unwrap();
        d.allocate(10, Resource::Cpu, 1.0, AllocateOpts::default()).unwrap();
        assert_eq!(d.last_history(Resource::Cpu), (10, 2.0));
    }

    #[test]
    fn history_steps_on_time_advance() {
        let mut d = device(4.0);
        d.allocate(10, Resource::Cpu, 1.0, AllocateOpts::default()).unwrap();
        d.allocate(20, Resource::Cpu, 1.0, AllocateOpts::default()).unwrap();
        let hist = d.history.get(&Resource::Cpu).unwrap();
        assert!(hist.contains(&(19, 1.0)));
        assert!(hist.contains(&(20, 2.0)));
    }

    #[test]
    fn release_is_negative_allocate() {
        let mut d = device(4.0);
        d.allocate(10, Resource::Cpu, 2.0, AllocateOpts::default()).unwrap();
        d.release(10, Resource::Cpu, 2.0, AllocateOpts::default()).unwrap();
        assert_eq!(d.current_usage(Resource::Cpu), 0.0);
    }

    #[test]
    fn deployable_checks_residual_capacity() {
        let d = device(4.0);
        let mut req = HashMap::new();
        req.insert(Resource::Cpu, 4.0);
        assert!(d.deployable(&req));
        req.insert(Resource::Cpu, 4.1);
        assert!(!d.deployable(&req));
    }
}
