//! Catalog I/O (A2): JSON import/export of device, application and
//! placement catalogs, plus synthetic catalog generation.
//!
//! Grounded on the original's `Environment.importDevices`/
//! `exportDevices`/`importApplications`/`exportApplications` and the
//! standalone `DeviceGenerator`/`AppGenerator`/`PlacementGenerator`
//! scripts.

use std::collections::HashMap;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::application::{Application, ApplicationRecord};
use crate::constants::{Resource, DEFAULT_LINK_BANDWIDTH, DEFAULT_LINK_DELAY, TIME_PERIOD};
use crate::environment::Environment;
use crate::error::{AppId, DeviceId, Result};
use crate::resource::Position;

/// Wire format for a single device (Device JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Catalog device id.
    pub id: DeviceId,
    /// Position in 3-space.
    pub position: Position,
    /// Per-resource capacity.
    pub resource: HashMap<Resource, f64>,
}

/// Wire format for a single link (Device JSON `links` array).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Catalog link id.
    pub id: u64,
    /// Origin device id.
    pub source: DeviceId,
    /// Destination device id.
    pub target: DeviceId,
    /// Link metric weight.
    pub weight: f64,
}

/// Top-level Device JSON document: `{ devices: [...], links: [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceCatalog {
    /// Every device in the catalog.
    pub devices: Vec<DeviceRecord>,
    /// Every link in the catalog.
    #[serde(default)]
    pub links: Vec<LinkRecord>,
}

/// A single entry in the Placements JSON.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlacementRecord {
    /// Simulated arrival time, in ticks.
    pub placement_time: i64,
    /// Device that receives the arrival.
    pub requesting_device: DeviceId,
    /// Catalog application id.
    pub application: AppId,
}

/// Read a Device JSON document from `path`.
pub fn import_devices(path: impl AsRef<Path>) -> Result<DeviceCatalog> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Write a Device JSON document to `path`, pretty-printed to match the
/// source's `json.dumps(..., indent=4)` output.
pub fn export_devices(path: impl AsRef<Path>, catalog: &DeviceCatalog) -> Result<()> {
    let text = serde_json::to_string_pretty(catalog)?;
    std::fs::write(path, text)?;
    Ok(())
}

/// Read an Application JSON catalog (an array of `ApplicationRecord`) from
/// `path`.
pub fn import_applications(path: impl AsRef<Path>) -> Result<Vec<ApplicationRecord>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Write an Application JSON catalog to `path`.
pub fn export_applications(path: impl AsRef<Path>, apps: &[ApplicationRecord]) -> Result<()> {
    let text = serde_json::to_string_pretty(apps)?;
    std::fs::write(path, text)?;
    Ok(())
}

/// Read a Placements JSON document from `path`.
pub fn import_placements(path: impl AsRef<Path>) -> Result<Vec<PlacementRecord>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Write a Placements JSON document to `path`.
pub fn export_placements(path: impl AsRef<Path>, placements: &[PlacementRecord]) -> Result<()> {
    let text = serde_json::to_string_pretty(placements)?;
    std::fs::write(path, text)?;
    Ok(())
}

/// Load a [`DeviceCatalog`] into `env`: inserts every device (preserving
/// its catalog id) and wires every link, using the catalog's `weight` as
/// the direct routing-table metric between its two endpoints (the
/// catalog doesn't carry a separate bandwidth/delay split — only the
/// precomputed metric, matching the original's `link['weight']` usage).
pub fn load_devices(env: &mut Environment, catalog: DeviceCatalog) {
    for record in catalog.devices {
        env.insert_device(crate::resource::Device::new(record.id, record.position, record.resource));
    }
    for link in catalog.links {
        env.network.add_link(crate::topology::PhysicalLink::new(link.id, link.source, link.target));
        if let Some(device) = env.devices.get_mut(&link.source) {
            device.routing_table.add_route(link.target, link.target, link.weight);
        }
        if let Some(device) = env.devices.get_mut(&link.target) {
            device.routing_table.add_route(link.source, link.source, link.weight);
        }
    }
    env.recompute_routing();
}

/// Load an application catalog into `env`, preserving catalog ids.
pub fn load_applications(env: &mut Environment, records: Vec<ApplicationRecord>) {
    for record in records {
        env.insert_application(record.into());
    }
}

fn default_resource_limit() -> HashMap<Resource, f64> {
    let mut limit = HashMap::new();
    limit.insert(Resource::Cpu, 8.0);
    limit.insert(Resource::Gpu, 8.0);
    limit.insert(Resource::Mem, 8192.0);
    limit.insert(Resource::Disk, 1_024_000.0);
    limit
}

/// Generate `config.device_number` devices with random positions inside
/// `config.device_positionning`, and link every pair within `wifi_range`
/// of each other — the fallback path the original takes when no devices
/// template / links file is supplied.
pub fn generate_devices(env: &mut Environment, rng: &mut impl Rng) -> Vec<DeviceId> {
    let bounds = env.config.device_positionning;
    let n = env.config.device_number;
    let mut ids = Vec::with_capacity(n);
    for _ in 0..n {
        let position = Position {
            x: round2(rng.gen_range(bounds.x_min..=bounds.x_max)),
            y: round2(rng.gen_range(bounds.y_min..=bounds.y_max)),
            z: round2(rng.gen_range(bounds.z_min..=bounds.z_max)),
        };
        ids.push(env.add_device(position, default_resource_limit()));
    }

    let range = env.config.wifi_range;
    for i in 0..ids.len() {
        for j in (i + 1)..ids.len() {
            let (a, b) = (ids[i], ids[j]);
            let distance = env.get_device_by_id(a).zip(env.get_device_by_id(b)).map(|(da, db)| da.position.distance(&db.position));
            if distance.is_some_and(|d| d <= range) {
                env.add_link(a, b, DEFAULT_LINK_BANDWIDTH, DEFAULT_LINK_DELAY);
            }
        }
    }
    env.recompute_routing();
    ids
}

/// Snapshot `env`'s devices and links into an exportable [`DeviceCatalog`].
pub fn export_catalog_from_env(env: &Environment) -> DeviceCatalog {
    let mut devices: Vec<DeviceRecord> = env
        .devices
        .values()
        .map(|d| DeviceRecord { id: d.id, position: d.position, resource: d.limit.clone() })
        .collect();
    devices.sort_by_key(|d| d.id);

    let mut links: Vec<LinkRecord> = env
        .network
        .links()
        .map(|l| {
            let weight = env.get_device_by_id(l.origin).and_then(|d| d.routing_table.route_to(l.destination)).map(|(_, m)| m).unwrap_or(l.delay);
            LinkRecord { id: l.id, source: l.origin, target: l.destination, weight }
        })
        .collect();
    links.sort_by_key(|l| l.id);

    DeviceCatalog { devices, links }
}

/// Snapshot `env`'s applications into an exportable catalog, in id order.
pub fn export_catalog_applications(env: &Environment) -> Vec<ApplicationRecord> {
    let mut ids: Vec<AppId> = env.applications.keys().copied().collect();
    ids.sort_unstable();
    ids.into_iter().filter_map(|id| env.applications.get(&id).map(ApplicationRecord::from)).collect()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Generate `config.application_number` applications with a random
/// process count (1-5) and random per-process resource requests, honoring
/// `config.app_duration` as an override when non-zero (otherwise each
/// application gets a random duration up to [`TIME_PERIOD`]).
pub fn generate_applications(env: &mut Environment, rng: &mut impl Rng) -> Vec<AppId> {
    let n = env.config.application_number;
    let override_duration = env.config.app_duration;
    let mut ids = Vec::with_capacity(n);
    for _ in 0..n {
        let num_procs = rng.gen_range(1..=5);
        let duration = if override_duration > 0 { override_duration } else { rng.gen_range(1..=TIME_PERIOD) };
        let priority = rng.gen_range(0.0..10.0);
        let app_id = env.add_application(duration, num_procs, priority);
        if let Some(app) = env.applications.get_mut(&app_id) {
            randomize_requests(app, rng);
        }
        ids.push(app_id);
    }
    ids
}

fn randomize_requests(app: &mut Application, rng: &mut impl Rng) {
    for proc in &mut app.processes {
        proc.resource_request.insert(Resource::Cpu, rng.gen_range(1.0..4.0));
        proc.resource_request.insert(Resource::Gpu, 0.0);
        proc.resource_request.insert(Resource::Mem, rng.gen_range(128.0..2048.0));
        proc.resource_request.insert(Resource::Disk, rng.gen_range(512.0..8192.0));
    }
    let n = app.num_procs();
    for i in 0..n {
        for j in (i + 1)..n {
            let bw = rng.gen_range(0.0..2048.0);
            app.proc_links[i][j] = bw;
            app.proc_links[j][i] = bw;
        }
    }
}

/// Generate `config.application_number` Poisson-spaced arrivals over
/// [`TIME_PERIOD`], each targeting a uniformly random device (grounded on
/// `PlacementGenerator.py`'s `np.random.default_rng(...).poisson(lam)`
/// inter-arrival sampling).
pub fn generate_placements(env: &Environment, application_ids: &[AppId], rng: &mut impl Rng) -> Vec<PlacementRecord> {
    let n = application_ids.len().max(1);
    let lambda = TIME_PERIOD as f64 / n as f64;
    let device_ids: Vec<DeviceId> = {
        let mut ids: Vec<DeviceId> = env.devices.keys().copied().collect();
        ids.sort_unstable();
        ids
    };
    if device_ids.is_empty() {
        return Vec::new();
    }

    let mut time = 0i64;
    let mut placements = Vec::with_capacity(application_ids.len());
    for &app_id in application_ids {
        time += sample_poisson(rng, lambda).max(0) as i64;
        let requesting_device = device_ids[rng.gen_range(0..device_ids.len())];
        placements.push(PlacementRecord { placement_time: time, requesting_device, application: app_id });
    }
    placements
}

/// Knuth's algorithm for a Poisson-distributed sample with mean `lambda`.
fn sample_poisson(rng: &mut impl Rng, lambda: f64) -> u64 {
    if lambda <= 0.0 {
        return 0;
    }
    let l = (-lambda).exp();
    let mut k = 0u64;
    let mut p = 1.0;
    loop {
        k += 1;
        p *= rng.gen::<f64>();
        if p <= l {
            return k - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn device_catalog_round_trips_through_json() {
        let mut resource = HashMap::new();
        resource.insert(Resource::Cpu, 8.0);
        let catalog = DeviceCatalog {
            devices: vec![DeviceRecord { id: 0, position: Position { x: 1.0, y: 2.0, z: 0.0 }, resource }],
            links: vec![LinkRecord { id: 0, source: 0, target: 1, weight: 1.5 }],
        };
        let dir = std::env::temp_dir().join("fogscape-catalog-test-devices.json");
        export_devices(&dir, &catalog).unwrap();
        let back = import_devices(&dir).unwrap();
        assert_eq!(back.devices.len(), 1);
        assert_eq!(back.links[0].weight, 1.5);
        let _ = std::fs::remove_file(&dir);
    }

    #[test]
    fn generated_placements_are_monotonically_increasing() {
        let mut env = Environment::new(crate::config::Config::default());
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        generate_devices(&mut env, &mut rng);
        let apps = generate_applications(&mut env, &mut rng);
        let placements = generate_placements(&env, &apps, &mut rng);
        assert_eq!(placements.len(), apps.len());
        assert!(placements.windows(2).all(|w| w[0].placement_time <= w[1].placement_time));
    }
}
