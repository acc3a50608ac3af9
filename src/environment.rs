//! Environment Facade (C9): owns devices, applications, the physical
//! network, the event queue and clock, and the metrics frame. Runs the
//! dispatcher loop and holds every event handler (C7).

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::application::Application;
use crate::batch::{BatchArrival, BatchOptimizer, BatchResult};
use crate::config::Config;
use crate::constants::{
    BACKOFF, BATCH_WINDOW, DEFAULT_K_ROUTES, MAX_BATCH_TENTATIVES, MAX_TENTATIVES, RESOURCE_KINDS, Resource, SYNC_DELAY,
};
use crate::error::{AppId, DeviceId, LinkId, Result};
use crate::event::{
    placement_priority, BinaryHeapQueue, Event, EventQueue, BATCH_PROCESSING_PRIORITY, DEPLOY_PROC_PRIORITY,
    FINAL_REPORT_PRIORITY, PLACEMENT_BASE_PRIORITY, SYNC_PRIORITY, UNDEPLOY_PRIORITY,
};
use crate::metrics::MetricsFrame;
use crate::path::{self, Path};
use crate::placement;
use crate::resource::{AllocateOpts, Device, Position};
use crate::topology::metric::link_metric;
use crate::topology::routing::{k_shortest_paths, OspfRoutingTable, RoutingTable};
use crate::topology::{PhysicalLink, PhysicalNetwork};

/// Tally of rejection reasons accumulated across a single application's
/// retries, used to pick the dominant reason once `MAX_TENTATIVES` is
/// exhausted.
#[derive(Debug, Clone, Copy, Default)]
struct RejectionTally {
    devices: u32,
    links: u32,
}

impl RejectionTally {
    fn record(&mut self, reason: placement::Failure) {
        match reason {
            placement::Failure::Devices => self.devices += 1,
            placement::Failure::Links => self.links += 1,
        }
    }

    /// `unknown` soaks up any tentatives that failed for neither reason
    /// (e.g. the requesting device itself vanished), matching the
    /// source's `MAX_TENTATIVES - sum(reasons)` bookkeeping.
    fn dominant_reason(self) -> &'static str {
        let unknown = MAX_TENTATIVES.saturating_sub(self.devices + self.links);
        let mut best = ("unknown", unknown);
        if self.devices > best.1 {
            best = ("devices", self.devices);
        }
        if self.links > best.1 {
            best = ("links", self.links);
        }
        best.0
    }
}

/// Owns every piece of simulation state and drives the event loop.
pub struct Environment {
    /// Every known device, keyed by id.
    pub devices: HashMap<DeviceId, Device>,
    /// Every known application, keyed by id.
    pub applications: HashMap<AppId, Application>,
    /// The physical network (links + routing graph).
    pub network: PhysicalNetwork,
    /// Current simulated time.
    pub current_time: i64,
    /// Metrics frame, updated by every state-changing event.
    pub metrics: MetricsFrame,
    /// Active configuration.
    pub config: Config,
    queue: BinaryHeapQueue,
    next_device_id: DeviceId,
    next_app_id: AppId,
    waiting: HashSet<AppId>,
    currently_deployed: HashSet<AppId>,
    rejection_tally: HashMap<AppId, RejectionTally>,
    /// Final rejection reason for each rejected application.
    pub rejected_application_by_reason: HashMap<&'static str, Vec<AppId>>,
    batch_pending: Vec<BatchArrival>,
    batch_tentatives: HashMap<AppId, u32>,
    batch_optimizer: Box<dyn BatchOptimizer>,
    rng: StdRng,
}

impl Environment {
    /// A fresh environment with no devices or applications, seeded from
    /// `config.random_seed`.
    pub fn new(config: Config) -> Self {
        let seed = config.random_seed;
        Self {
            devices: HashMap::new(),
            applications: HashMap::new(),
            network: PhysicalNetwork::new(),
            current_time: 0,
            metrics: MetricsFrame::new(),
            config,
            queue: BinaryHeapQueue::new(),
            next_device_id: 0,
            next_app_id: 0,
            waiting: HashSet::new(),
            currently_deployed: HashSet::new(),
            rejection_tally: HashMap::new(),
            rejected_application_by_reason: HashMap::new(),
            batch_pending: Vec::new(),
            batch_tentatives: HashMap::new(),
            batch_optimizer: Self::default_optimizer(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    #[cfg(feature = "batch-optimizer")]
    fn default_optimizer() -> Box<dyn BatchOptimizer> {
        Box::new(crate::batch::MilpBatchOptimizer::default())
    }

    #[cfg(not(feature = "batch-optimizer"))]
    fn default_optimizer() -> Box<dyn BatchOptimizer> {
        Box::new(crate::batch::GreedyBatchOptimizer::default())
    }

    // -- id-centralized construction (replaces mutable global id counters) --

    /// Register a new device with the next free id, centralizing id
    /// allocation here rather than in a class-level counter.
    pub fn add_device(&mut self, position: Position, limit: HashMap<Resource, f64>) -> DeviceId {
        let id = self.next_device_id;
        self.next_device_id += 1;
        self.network.ensure_device(id);
        self.devices.insert(id, Device::new(id, position, limit));
        id
    }

    /// Register a new application with the next free id.
    pub fn add_application(&mut self, duration: i64, num_procs: usize, priority: f64) -> AppId {
        let id = self.next_app_id;
        self.next_app_id += 1;
        let mut app = Application::new(id, duration, num_procs);
        app.priority = priority;
        self.applications.insert(id, app);
        id
    }

    /// Import a device with an explicit id (catalog load), advancing the
    /// id counter so subsequently generated devices never collide.
    pub fn insert_device(&mut self, device: Device) {
        self.next_device_id = self.next_device_id.max(device.id + 1);
        self.network.ensure_device(device.id);
        self.devices.insert(device.id, device);
    }

    /// Import an application with an explicit id (catalog load).
    pub fn insert_application(&mut self, app: Application) {
        self.next_app_id = self.next_app_id.max(app.id + 1);
        self.applications.insert(app.id, app);
    }

    /// Add a physical link and seed both endpoints' simple routing tables
    /// with the direct-neighbor entry. Full shortest-path tables still
    /// require [`Environment::recompute_routing`].
    pub fn add_link(&mut self, origin: DeviceId, destination: DeviceId, bandwidth: f64, delay: f64) -> LinkId {
        let id = self.network.next_link_id();
        self.network.add_link(PhysicalLink::with_bandwidth(id, origin, destination, bandwidth, delay));
        let metric = link_metric(bandwidth, self.device_distance(origin, destination), delay);
        if let Some(d) = self.devices.get_mut(&origin) {
            d.routing_table.add_route(destination, destination, metric);
        }
        if let Some(d) = self.devices.get_mut(&destination) {
            d.routing_table.add_route(origin, origin, metric);
        }
        id
    }

    fn device_distance(&self, a: DeviceId, b: DeviceId) -> f64 {
        match (self.devices.get(&a), self.devices.get(&b)) {
            (Some(x), Some(y)) => x.position.distance(&y.position),
            _ => 0.0,
        }
    }

    fn edge_weight(&self, a: DeviceId, b: DeviceId) -> f64 {
        match self.network.link_between(a, b) {
            Some(link) => link_metric(link.bandwidth, self.device_distance(a, b), link.delay),
            None => f64::INFINITY,
        }
    }

    /// Recompute every device's simple and OSPF routing tables from
    /// scratch via Dijkstra / k-shortest-paths over the current topology.
    /// Call once after the topology is fully assembled.
    pub fn recompute_routing(&mut self) {
        let ids: Vec<DeviceId> = self.network.devices().collect();
        for &src in &ids {
            let mut table = RoutingTable::new(src);
            let mut ospf = OspfRoutingTable::new();
            for &dst in &ids {
                if dst == src {
                    continue;
                }
                for route in k_shortest_paths(&self.network, src, dst, DEFAULT_K_ROUTES, |a, b| self.edge_weight(a, b)) {
                    let next_hop = route.path.get(1).copied().unwrap_or(dst);
                    table.add_route(dst, next_hop, route.metric);
                    ospf.add_route(route);
                }
            }
            if let Some(device) = self.devices.get_mut(&src) {
                device.routing_table = table;
                device.ospf_routing_table = ospf;
            }
        }
    }

    /// Look up a device by id.
    pub fn get_device_by_id(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(&id)
    }

    /// Pick a device uniformly at random (used when a Placement's
    /// requesting device no longer exists).
    pub fn get_random_device(&mut self) -> Option<DeviceId> {
        let mut ids: Vec<DeviceId> = self.devices.keys().copied().collect();
        if ids.is_empty() {
            return None;
        }
        ids.sort_unstable();
        let idx = self.rng.gen_range(0..ids.len());
        Some(ids[idx])
    }

    /// Available bandwidth between every connected device pair; the
    /// petgraph view already exposed by [`PhysicalNetwork::graph`] serves
    /// the role the source's `extract_networkx_graph` played, so only the
    /// capacity-matrix extraction needs its own helper (used by the batch
    /// optimizer's link-capacity inputs).
    pub fn extract_bandwidth_matrix(&self) -> HashMap<(DeviceId, DeviceId), f64> {
        let mut matrix = HashMap::new();
        for link in self.network.links() {
            matrix.insert((link.origin, link.destination), link.available_bandwidth());
            matrix.insert((link.destination, link.origin), link.available_bandwidth());
        }
        matrix
    }

    // -- scheduling --

    /// Queue an arrival as a Placement event at `time` (clamped to
    /// `current_time` if already past).
    pub fn enqueue_arrival(&mut self, app_id: AppId, requesting_device: DeviceId, time: i64) {
        let priority = self.applications.get(&app_id).map(|a| placement_priority(a.priority)).unwrap_or(PLACEMENT_BASE_PRIORITY);
        self.schedule(time, priority, Event::Placement { app_id, requesting_device, tentative: 1 });
    }

    /// Queue a FinalReport at `time`.
    pub fn enqueue_final_report(&mut self, time: i64) {
        self.schedule(time, FINAL_REPORT_PRIORITY, Event::FinalReport);
    }

    fn schedule(&mut self, time: i64, priority: f64, event: Event) {
        let time = time.max(self.current_time);
        self.queue.push(time, priority, event);
    }

    /// Run the dispatcher to completion: pop the earliest event, advance
    /// the clock to its time, and dispatch it, until the queue is empty.
    pub fn run(&mut self) {
        while let Some(scheduled) = self.queue.pop() {
            self.current_time = scheduled.time;
            self.dispatch(scheduled.event);
        }
    }

    fn dispatch(&mut self, event: Event) {
        log::debug!("t={} dispatch {}", self.current_time, event.name());
        match event {
            Event::Placement { app_id, requesting_device, tentative } => self.handle_placement(app_id, requesting_device, tentative),
            Event::DeployProc { app_id, proc_index, device_id, last, sync_delay, devices, link_allocation } => {
                self.handle_deploy_proc(app_id, proc_index, device_id, last, sync_delay, devices, link_allocation)
            }
            Event::Sync { app_id, devices, link_allocation } => self.handle_sync(app_id, devices, link_allocation),
            Event::Undeploy { app_id } => self.handle_undeploy(app_id),
            Event::FinalReport => self.handle_final_report(),
            Event::BatchProcessing => self.handle_batch_processing(),
            Event::Organize => {}
            Event::Movement { .. } => {}
        }
    }

    // -- Placement --

    fn handle_placement(&mut self, app_id: AppId, requesting_device: DeviceId, tentative: u32) {
        let t = self.current_time;
        if tentative == 1 {
            self.metrics.apply(t, |r| r.cumulative_app_arrival += 1);
        }

        let Some(app) = self.applications.get(&app_id).cloned() else {
            log::warn!("placement event for unknown application {app_id}");
            return;
        };

        if self.config.dry_run {
            self.accept_dry_run(app_id, t);
            return;
        }

        if self.config.batch {
            self.enqueue_batch(app_id, requesting_device, t);
            return;
        }

        let requesting_device = if self.devices.contains_key(&requesting_device) {
            Some(requesting_device)
        } else {
            self.get_random_device()
        };
        let Some(requesting_device) = requesting_device else {
            log::warn!("no device available to place application {app_id}");
            return;
        };

        match placement::attempt(&self.devices, &mut self.network, &app, requesting_device) {
            Ok(success) => self.accept_placement(app_id, &app, success, t),
            Err(reason) => self.retry_or_reject(app_id, requesting_device, reason, t, tentative),
        }
    }

    fn accept_dry_run(&mut self, app_id: AppId, t: i64) {
        let Some(app) = self.applications.get_mut(&app_id) else { return };
        app.clear_deployment();
        let duration = app.duration;
        self.currently_deployed.insert(app_id);
        self.metrics.apply(t, |r| r.cumulative_app_accepted += 1);
        self.schedule(t + duration, UNDEPLOY_PRIORITY, Event::Undeploy { app_id });
    }

    fn accept_placement(&mut self, app_id: AppId, app: &Application, success: placement::Success, t: i64) {
        if self.waiting.remove(&app_id) {
            self.metrics.apply(t, |r| r.app_in_waiting -= 1);
        }
        self.rejection_tally.remove(&app_id);
        self.batch_tentatives.remove(&app_id);

        let bw_sum: f64 = success
            .link_allocation
            .iter()
            .filter(|(_, path)| !path.links.is_empty())
            .map(|(&(i, j), _)| app.proc_links[i][j])
            .sum();
        self.metrics.apply(t, |r| {
            r.cumulative_app_accepted += 1;
            r.bw_current += bw_sum;
        });

        let mut indices: Vec<usize> = success.devices.keys().copied().collect();
        if indices.is_empty() {
            // Empty application (boundary case): nothing to deploy, go
            // straight to Sync.
            self.schedule(t, SYNC_PRIORITY, Event::Sync { app_id, devices: success.devices, link_allocation: success.link_allocation });
            return;
        }
        indices.sort_unstable();
        let last_idx = *indices.last().unwrap();

        for &proc_idx in &indices {
            let device_id = success.devices[&proc_idx];
            let delay = success.node_metric.get(&proc_idx).copied().unwrap_or(0.0).round() as i64;
            self.schedule(
                t + delay,
                DEPLOY_PROC_PRIORITY,
                Event::DeployProc {
                    app_id,
                    proc_index: proc_idx,
                    device_id,
                    last: proc_idx == last_idx,
                    sync_delay: SYNC_DELAY,
                    devices: success.devices.clone(),
                    link_allocation: success.link_allocation.clone(),
                },
            );
        }
    }

    fn retry_or_reject(&mut self, app_id: AppId, requesting_device: DeviceId, reason: placement::Failure, t: i64, tentative: u32) {
        self.rejection_tally.entry(app_id).or_default().record(reason);

        if tentative < MAX_TENTATIVES {
            if tentative == 1 {
                self.waiting.insert(app_id);
                self.metrics.apply(t, |r| r.app_in_waiting += 1);
            }
            let priority = self.applications.get(&app_id).map(|a| placement_priority(a.priority)).unwrap_or(PLACEMENT_BASE_PRIORITY);
            self.schedule(t + BACKOFF, priority, Event::Placement { app_id, requesting_device, tentative: tentative + 1 });
        } else {
            self.reject(app_id, t);
        }
    }

    fn reject(&mut self, app_id: AppId, t: i64) {
        if self.waiting.remove(&app_id) {
            self.metrics.apply(t, |r| r.app_in_waiting -= 1);
        }
        self.batch_tentatives.remove(&app_id);
        let tally = self.rejection_tally.remove(&app_id).unwrap_or_default();
        self.rejected_application_by_reason.entry(tally.dominant_reason()).or_default().push(app_id);
        self.metrics.apply(t, |r| r.cumulative_app_rejected += 1);
    }

    // -- DeployProc / Sync / Undeploy --

    fn handle_deploy_proc(
        &mut self,
        app_id: AppId,
        proc_index: usize,
        device_id: DeviceId,
        last: bool,
        sync_delay: i64,
        devices: HashMap<usize, DeviceId>,
        link_allocation: HashMap<(usize, usize), Path>,
    ) {
        let t = self.current_time;
        let Some(request) = self.applications.get(&app_id).and_then(|a| a.processes.get(proc_index)).map(|p| p.resource_request.clone())
        else {
            return;
        };

        if let Some(device) = self.devices.get_mut(&device_id) {
            device.allocate_all(t, &request, AllocateOpts::default());
        }
        self.metrics.apply(t, |row| {
            row.cpu_current += request.get(&Resource::Cpu).copied().unwrap_or(0.0);
            row.gpu_current += request.get(&Resource::Gpu).copied().unwrap_or(0.0);
            row.mem_current += request.get(&Resource::Mem).copied().unwrap_or(0.0);
            row.disk_current += request.get(&Resource::Disk).copied().unwrap_or(0.0);
        });

        if last {
            self.schedule(t + sync_delay, SYNC_PRIORITY, Event::Sync { app_id, devices, link_allocation });
        }
    }

    fn handle_sync(&mut self, app_id: AppId, devices: HashMap<usize, DeviceId>, link_allocation: HashMap<(usize, usize), Path>) {
        let t = self.current_time;
        let Some(app) = self.applications.get_mut(&app_id) else { return };

        let num_procs = app.num_procs() as i64;
        app.deployment_info = devices;
        app.links_deployment_info = link_allocation;
        let duration = app.duration;

        // Bandwidth is reserved once, by Placement's Phase B; Sync only
        // records the mapping and does not re-reserve (open question,
        // resolved in favor of keeping invariant 2 intact).
        self.currently_deployed.insert(app_id);
        self.metrics.apply(t, |row| {
            row.currently_hosted_apps += 1;
            row.currently_hosted_procs += num_procs;
        });
        self.schedule(t + duration, UNDEPLOY_PRIORITY, Event::Undeploy { app_id });
    }

    fn handle_undeploy(&mut self, app_id: AppId) {
        let t = self.current_time;
        let Some(app) = self.applications.get(&app_id).cloned() else { return };

        let mut released: HashMap<Resource, f64> = HashMap::new();
        for (&proc_idx, &device_id) in &app.deployment_info {
            let Some(proc) = app.processes.get(proc_idx) else { continue };
            if let Some(device) = self.devices.get_mut(&device_id) {
                device.release_all(t, &proc.resource_request, AllocateOpts::default());
            }
            for &r in &RESOURCE_KINDS {
                *released.entry(r).or_insert(0.0) += proc.request(r);
            }
        }

        let mut bw_released = 0.0;
        for (&(i, j), path) in &app.links_deployment_info {
            let bw = app.proc_links[i][j];
            path::free(&mut self.network, &path.links, bw);
            if !path.links.is_empty() {
                bw_released += bw;
            }
        }

        self.currently_deployed.remove(&app_id);
        let num_procs = app.num_procs() as i64;
        self.metrics.apply(t, |row| {
            row.cpu_current -= released.get(&Resource::Cpu).copied().unwrap_or(0.0);
            row.gpu_current -= released.get(&Resource::Gpu).copied().unwrap_or(0.0);
            row.mem_current -= released.get(&Resource::Mem).copied().unwrap_or(0.0);
            row.disk_current -= released.get(&Resource::Disk).copied().unwrap_or(0.0);
            row.bw_current -= bw_released;
            row.cumulative_app_departure += 1;
            row.currently_hosted_apps -= 1;
            row.currently_hosted_procs -= num_procs;
        });

        if let Some(app) = self.applications.get_mut(&app_id) {
            app.clear_deployment();
        }
    }

    fn handle_final_report(&mut self) {
        let t = self.current_time;
        for device in self.devices.values_mut() {
            device.report(t, true);
        }
        if let Err(e) = self.export_metrics() {
            log::error!("failed to export metrics: {e}");
        }
    }

    fn export_metrics(&self) -> Result<()> {
        let total = |r: Resource| self.devices.values().map(|d| d.limit.get(&r).copied().unwrap_or(0.0)).sum();
        std::fs::create_dir_all(&self.config.output_folder)?;
        let path = std::path::Path::new(&self.config.output_folder).join("results.csv");
        self.metrics.export_csv(path, total(Resource::Cpu), total(Resource::Gpu), total(Resource::Mem), total(Resource::Disk))
    }

    // -- BatchProcessing --

    fn enqueue_batch(&mut self, app_id: AppId, requesting_device: DeviceId, t: i64) {
        if self.batch_pending.is_empty() {
            self.schedule(t + BATCH_WINDOW, BATCH_PROCESSING_PRIORITY, Event::BatchProcessing);
        }
        self.waiting.insert(app_id);
        self.metrics.apply(t, |r| r.app_in_waiting += 1);
        self.batch_pending.push(BatchArrival { app_id, requesting_device });
    }

    fn handle_batch_processing(&mut self) {
        let t = self.current_time;
        let batch = std::mem::take(&mut self.batch_pending);
        if batch.is_empty() {
            return;
        }

        let apps: HashMap<AppId, Application> =
            batch.iter().filter_map(|a| self.applications.get(&a.app_id).map(|app| (a.app_id, app.clone()))).collect();

        let range = self.config.wifi_range;
        let BatchResult { accepted, node_assignment, link_allocation, deferred } = self.run_optimizer(&apps, &batch, range);

        for app_id in accepted {
            let Some(app) = apps.get(&app_id) else { continue };
            let devices = node_assignment.get(&app_id).cloned().unwrap_or_default();
            let link_allocation = link_allocation.get(&app_id).cloned().unwrap_or_default();
            // The batch solver doesn't produce a per-process routing-table
            // delay the way C5's Phase A does; components deploy
            // immediately at the batch's resolution time.
            let success = placement::Success { devices, link_allocation, node_metric: HashMap::new() };
            self.accept_placement(app_id, app, success, t);
        }

        for app_id in deferred {
            let tentative = self.batch_tentatives.entry(app_id).or_insert(0);
            *tentative += 1;
            if *tentative >= MAX_BATCH_TENTATIVES {
                self.reject(app_id, t);
            } else {
                let requesting_device = batch.iter().find(|a| a.app_id == app_id).map(|a| a.requesting_device).unwrap_or_default();
                self.batch_pending.push(BatchArrival { app_id, requesting_device });
            }
        }

        if !self.batch_pending.is_empty() {
            self.schedule(t + BATCH_WINDOW, BATCH_PROCESSING_PRIORITY, Event::BatchProcessing);
        }
    }

    fn run_optimizer(&mut self, apps: &HashMap<AppId, Application>, batch: &[BatchArrival], range: f64) -> BatchResult {
        // Swap the optimizer out so it can borrow `self.devices` and
        // `self.network` independently of `self`.
        let mut optimizer = std::mem::replace(&mut self.batch_optimizer, Box::new(crate::batch::GreedyBatchOptimizer));
        let result = optimizer.optimize(&self.devices, &mut self.network, apps, batch, range);
        self.batch_optimizer = optimizer;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device_limit(cpu: f64) -> HashMap<Resource, f64> {
        let mut limit = HashMap::new();
        limit.insert(Resource::Cpu, cpu);
        limit.insert(Resource::Gpu, 0.0);
        limit.insert(Resource::Mem, 8192.0);
        limit.insert(Resource::Disk, 1_024_000.0);
        limit
    }

    #[test]
    fn single_process_single_device_happy_path() {
        let mut env = Environment::new(Config::default());
        let device = env.add_device(Position { x: 0.0, y: 0.0, z: 0.0 }, device_limit(8.0));
        env.recompute_routing();

        let app_id = env.add_application(1000, 1, 0.0);
        env.applications.get_mut(&app_id).unwrap().processes[0].resource_request.insert(Resource::Cpu, 1.0);

        env.enqueue_arrival(app_id, device, 0);
        env.enqueue_final_report(2000);
        env.run();

        assert_eq!(env.get_device_by_id(device).unwrap().current_usage(Resource::Cpu), 0.0);
        let row = env.metrics.row_at(2000);
        assert_eq!(row.cumulative_app_arrival, 1);
        assert_eq!(row.cumulative_app_accepted, 1);
        assert_eq!(row.cumulative_app_rejected, 0);
    }

    #[test]
    fn retry_exhaustion_rejects_with_devices_reason() {
        let mut env = Environment::new(Config::default());
        let device = env.add_device(Position { x: 0.0, y: 0.0, z: 0.0 }, device_limit(1.0));
        env.recompute_routing();

        let app_id = env.add_application(1000, 1, 0.0);
        env.applications.get_mut(&app_id).unwrap().processes[0].resource_request.insert(Resource::Cpu, 2.0);

        env.enqueue_arrival(app_id, device, 0);
        env.enqueue_final_report(1_000_000);
        env.run();

        assert_eq!(env.rejected_application_by_reason.get("devices"), Some(&vec![app_id]));
    }

    #[test]
    fn dry_run_bypasses_feasibility_checks() {
        let mut config = Config::default();
        config.dry_run = true;
        let mut env = Environment::new(config);
        let app_id = env.add_application(500, 1, 0.0);
        env.applications.get_mut(&app_id).unwrap().processes[0].resource_request.insert(Resource::Cpu, 999.0);

        env.enqueue_arrival(app_id, 0, 0);
        env.enqueue_final_report(600);
        env.run();

        let row = env.metrics.row_at(600);
        assert_eq!(row.cumulative_app_accepted, 1);
    }
}
