//! Batch Optimizer (C6, optional): accumulate Placement arrivals into a
//! window and solve node+link mapping jointly.
//!
//! The solver is kept behind a trait so the simulator runs without it; the
//! greedy engine (C5) serves as the in-memory fallback.

use std::collections::HashMap;

use crate::application::Application;
use crate::error::{AppId, DeviceId};
use crate::path::Path;
use crate::placement;
use crate::resource::Device;
use crate::topology::PhysicalNetwork;

/// One pending arrival in a batch window: the application and the device
/// that received the arrival.
#[derive(Debug, Clone, Copy)]
pub struct BatchArrival {
    /// Application awaiting placement.
    pub app_id: AppId,
    /// Device that received the arrival.
    pub requesting_device: DeviceId,
}

/// Outcome of a batch solve: per-app node/link assignment for accepted
/// apps, and the set of apps to re-enqueue into the next batch (up to
/// 15 attempts) or finally reject.
#[derive(Debug, Default)]
pub struct BatchResult {
    /// Apps whose node and link mapping both succeeded.
    pub accepted: Vec<AppId>,
    /// `app id -> (process index -> device id)` for accepted apps.
    pub node_assignment: HashMap<AppId, HashMap<usize, DeviceId>>,
    /// `app id -> ((i, j) -> Path)` for accepted apps.
    pub link_allocation: HashMap<AppId, HashMap<(usize, usize), Path>>,
    /// Apps that did not fit in this window; re-enqueue into the next
    /// batch.
    pub deferred: Vec<AppId>,
}

/// Interface that both the MILP solver and the greedy fallback implement.
pub trait BatchOptimizer {
    /// Solve node+link mapping for every arrival in `batch`.
    fn optimize(
        &mut self,
        devices: &HashMap<DeviceId, Device>,
        network: &mut PhysicalNetwork,
        apps: &HashMap<AppId, Application>,
        batch: &[BatchArrival],
        range: f64,
    ) -> BatchResult;
}

/// In-memory fallback: runs the greedy per-arrival engine (C5) over each
/// arrival in the batch, in order. Used when the `batch-optimizer` feature
/// is disabled, or as the degenerate single-arrival case.
#[derive(Debug, Default)]
pub struct GreedyBatchOptimizer;

impl BatchOptimizer for GreedyBatchOptimizer {
    fn optimize(
        &mut self,
        devices: &HashMap<DeviceId, Device>,
        network: &mut PhysicalNetwork,
        apps: &HashMap<AppId, Application>,
        batch: &[BatchArrival],
        _range: f64,
    ) -> BatchResult {
        let mut result = BatchResult::default();
        for arrival in batch {
            let Some(app) = apps.get(&arrival.app_id) else { continue };
            match placement::attempt(devices, network, app, arrival.requesting_device) {
                Ok(success) => {
                    result.accepted.push(arrival.app_id);
                    result.node_assignment.insert(arrival.app_id, success.devices);
                    result.link_allocation.insert(arrival.app_id, success.link_allocation);
                }
                Err(_) => result.deferred.push(arrival.app_id),
            }
        }
        result
    }
}

#[cfg(feature = "batch-optimizer")]
mod milp {
    use super::*;
    use good_lp::{constraint, variable, ProblemVariables, SolverModel, Variable};

    /// Optimal Node Mapping, solved with `good_lp` + `coin_cbc`: maximize
    /// the number of accepted apps subject to (a) each component placed on
    /// at most one device, (b) an app is accepted iff all its components
    /// are placed, (c) range pruning — only devices within `range` of the
    /// requesting device are candidate targets for that app's components,
    /// (d) per-device per-resource capacity.
    ///
    /// Optimal Link Mapping is then run per accepted app via the same
    /// route-walking reservation C3/C5 use (Phase B); an app whose link
    /// mapping fails is deferred to the next batch rather than counted
    /// accepted.
    #[derive(Debug, Default)]
    pub struct MilpBatchOptimizer;

    impl BatchOptimizer for MilpBatchOptimizer {
        fn optimize(
            &mut self,
            devices: &HashMap<DeviceId, Device>,
            network: &mut PhysicalNetwork,
            apps: &HashMap<AppId, Application>,
            batch: &[BatchArrival],
            range: f64,
        ) -> BatchResult {
            let mut result = BatchResult::default();
            if batch.is_empty() {
                return result;
            }

            let mut vars = ProblemVariables::new();
            // x[(app_id, proc_idx, device_id)]
            let mut x: HashMap<(AppId, usize, DeviceId), Variable> = HashMap::new();
            // y[app_id]
            let mut y: HashMap<AppId, Variable> = HashMap::new();

            for arrival in batch {
                let Some(app) = apps.get(&arrival.app_id) else { continue };
                let requester = devices.get(&arrival.requesting_device);
                y.insert(arrival.app_id, vars.add(variable().binary()));
                for (proc_idx, proc) in app.processes.iter().enumerate() {
                    for (&dev_id, device) in devices {
                        let within_range = requester
                            .map(|r| r.position.distance(&device.position) <= range)
                            .unwrap_or(true);
                        if within_range && device.deployable(&proc.resource_request) {
                            x.insert((arrival.app_id, proc_idx, dev_id), vars.add(variable().binary()));
                        }
                    }
                }
            }

            let objective = y.values().fold(good_lp::Expression::from(0), |acc, &v| acc + v);
            let mut problem = good_lp::solvers::coin_cbc::coin_cbc(vars.maximise(objective));
            problem.set_parameter("logLevel", "0");
            problem.set_parameter("threads", &format!("{}", num_cpus::get()));

            // (a) each component placed on at most one device.
            for arrival in batch {
                let Some(app) = apps.get(&arrival.app_id) else { continue };
                for proc_idx in 0..app.num_procs() {
                    let sum = devices
                        .keys()
                        .filter_map(|&d| x.get(&(arrival.app_id, proc_idx, d)))
                        .fold(good_lp::Expression::from(0), |acc, &v| acc + v);
                    problem.add_constraint(constraint!(sum <= 1));
                }

                // (b) accepted iff every component is placed.
                let y_app = y[&arrival.app_id];
                for proc_idx in 0..app.num_procs() {
                    let sum = devices
                        .keys()
                        .filter_map(|&d| x.get(&(arrival.app_id, proc_idx, d)))
                        .fold(good_lp::Expression::from(0), |acc, &v| acc + v);
                    problem.add_constraint(constraint!(sum == y_app));
                }
            }

            // (d) per-device per-resource capacity.
            for (&dev_id, device) in devices {
                for r in crate::constants::RESOURCE_KINDS {
                    let residual = device.residual(r);
                    let mut sum = good_lp::Expression::from(0);
                    let mut any = false;
                    for arrival in batch {
                        let Some(app) = apps.get(&arrival.app_id) else { continue };
                        for (proc_idx, proc) in app.processes.iter().enumerate() {
                            if let Some(&v) = x.get(&(arrival.app_id, proc_idx, dev_id)) {
                                let amount = proc.request(r);
                                if amount > 0.0 {
                                    sum = sum + v * amount;
                                    any = true;
                                }
                            }
                        }
                    }
                    if any {
                        problem.add_constraint(constraint!(sum <= residual));
                    }
                }
            }

            let solution = match problem.solve() {
                Ok(s) => s,
                Err(e) => {
                    log::warn!("batch optimizer failed to solve: {e}");
                    result.deferred = batch.iter().map(|a| a.app_id).collect();
                    return result;
                }
            };

            use good_lp::Solution;
            for arrival in batch {
                let Some(app) = apps.get(&arrival.app_id) else { continue };
                let accepted = y.get(&arrival.app_id).map(|&v| solution.value(v).round() >= 1.0).unwrap_or(false);
                if !accepted {
                    result.deferred.push(arrival.app_id);
                    continue;
                }

                let mut assignment = HashMap::new();
                let mut ok = true;
                for proc_idx in 0..app.num_procs() {
                    let dev = devices.keys().find(|&&d| {
                        x.get(&(arrival.app_id, proc_idx, d)).map(|&v| solution.value(v).round() >= 1.0).unwrap_or(false)
                    });
                    match dev {
                        Some(&d) => {
                            assignment.insert(proc_idx, d);
                        }
                        None => {
                            ok = false;
                            break;
                        }
                    }
                }
                if !ok {
                    result.deferred.push(arrival.app_id);
                    continue;
                }

                match placement::phase_b(network, devices, app, &assignment) {
                    Some(link_allocation) => {
                        result.accepted.push(arrival.app_id);
                        result.node_assignment.insert(arrival.app_id, assignment);
                        result.link_allocation.insert(arrival.app_id, link_allocation);
                    }
                    None => result.deferred.push(arrival.app_id),
                }
            }

            result
        }
    }
}

#[cfg(feature = "batch-optimizer")]
pub use milp::MilpBatchOptimizer;
