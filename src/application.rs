//! Application.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{AppId, DeviceId};
use crate::path::Path;
use crate::process::Processus;

/// A DAG of processes with an inter-process bandwidth matrix and a
/// lifetime.
#[derive(Debug, Clone)]
pub struct Application {
    /// Stable application identity.
    pub id: AppId,
    /// Lifetime, in ticks, once deployed.
    pub duration: i64,
    /// Scheduling priority; contributes a fractional term to Placement's
    /// dispatch priority.
    pub priority: f64,
    /// Ordered list of processes.
    pub processes: Vec<Processus>,
    /// Symmetric `processes.len() x processes.len()` matrix of
    /// non-negative inter-process bandwidth requirements, zero on the
    /// diagonal.
    pub proc_links: Vec<Vec<f64>>,
    /// `process index -> device id`, populated once placed.
    pub deployment_info: HashMap<usize, DeviceId>,
    /// `(i, j) -> Path`, populated once link mapping succeeds.
    pub links_deployment_info: HashMap<(usize, usize), Path>,
}

impl Application {
    /// A new, undeployed application with `num_procs` empty processes and
    /// no inter-process links.
    pub fn new(id: AppId, duration: i64, num_procs: usize) -> Self {
        let processes = (0..num_procs).map(|i| Processus::new(i as u64, id)).collect();
        Self {
            id,
            duration,
            priority: 0.0,
            processes,
            proc_links: vec![vec![0.0; num_procs]; num_procs],
            deployment_info: HashMap::new(),
            links_deployment_info: HashMap::new(),
        }
    }

    /// Number of processes.
    pub fn num_procs(&self) -> usize {
        self.processes.len()
    }

    /// Ordered pairs `(i, j)` with `i < j` and a non-zero link demand.
    pub fn linked_pairs(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let n = self.num_procs();
        (0..n).flat_map(move |i| (i + 1..n).map(move |j| (i, j))).filter_map(|(i, j)| {
            let bw = self.proc_links[i][j];
            (bw > 0.0).then_some((i, j, bw))
        })
    }

    /// Whether every process has a device assignment.
    pub fn is_fully_placed(&self) -> bool {
        self.deployment_info.len() == self.num_procs()
    }

    /// Clear all deployment state, e.g. on Undeploy.
    pub fn clear_deployment(&mut self) {
        self.deployment_info.clear();
        self.links_deployment_info.clear();
    }
}

/// Wire format for the application catalog: `{ app_id, duration,
/// proc_list: [{proc_id, proc_resource_request}], proc_links }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRecord {
    /// Catalog application id.
    pub app_id: AppId,
    /// Lifetime in ticks.
    pub duration: i64,
    /// Per-process records.
    pub proc_list: Vec<ProcessusRecord>,
    /// Symmetric bandwidth-demand matrix.
    pub proc_links: Vec<Vec<f64>>,
}

/// A single process entry in [`ApplicationRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessusRecord {
    /// Process id, unique within the application.
    pub proc_id: u64,
    /// Per-resource request.
    pub proc_resource_request: HashMap<crate::constants::Resource, f64>,
}

impl From<&Application> for ApplicationRecord {
    fn from(app: &Application) -> Self {
        ApplicationRecord {
            app_id: app.id,
            duration: app.duration,
            proc_list: app
                .processes
                .iter()
                .map(|p| ProcessusRecord { proc_id: p.id, proc_resource_request: p.resource_request.clone() })
                .collect(),
            proc_links: app.proc_links.clone(),
        }
    }
}

impl From<ApplicationRecord> for Application {
    fn from(rec: ApplicationRecord) -> Self {
        let processes = rec
            .proc_list
            .into_iter()
            .map(|p| Processus { id: p.proc_id, app_id: rec.app_id, resource_request: p.proc_resource_request })
            .collect();
        Application {
            id: rec.app_id,
            duration: rec.duration,
            priority: 0.0,
            processes,
            proc_links: rec.proc_links,
            deployment_info: HashMap::new(),
            links_deployment_info: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linked_pairs_only_reports_upper_triangle_nonzero() {
        let mut app = Application::new(0, 100, 3);
        app.proc_links[0][1] = 10.0;
        app.proc_links[1][0] = 10.0;
        let pairs: Vec<_> = app.linked_pairs().collect();
        assert_eq!(pairs, vec![(0, 1, 10.0)]);
    }

    #[test]
    fn record_round_trips() {
        let app = Application::new(1, 500, 2);
        let rec = ApplicationRecord::from(&app);
        let back: Application = rec.into();
        assert_eq!(back.id, app.id);
        assert_eq!(back.num_procs(), app.num_procs());
    }
}
