//! Placement Engine (C5): per-arrival greedy two-phase mapping of an
//! application's components to devices.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};

use crate::application::Application;
use crate::error::DeviceId;
use crate::path::{free, min_available_bandwidth, path_from_route, reserve, Path};
use crate::process::{aggregate_requests, compare_size};
use crate::resource::Device;
use crate::topology::PhysicalNetwork;

/// Why a placement attempt failed, used to pick the dominant rejection
/// reason after `MAX_TENTATIVES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Phase A (node mapping) could not place every component.
    Devices,
    /// Phase B (link mapping) could not reserve every inter-process link.
    Links,
}

/// The outcome of a successful placement attempt.
#[derive(Debug, Clone)]
pub struct Success {
    /// `process index -> device id`.
    pub devices: HashMap<usize, DeviceId>,
    /// `(i, j) -> Path` for every linked pair.
    pub link_allocation: HashMap<(usize, usize), Path>,
    /// Per-process metric from the requesting device, used to offset each
    /// component's `DeployProc` dispatch time.
    pub node_metric: HashMap<usize, f64>,
}

/// Phase A: map every process to a device, co-locating by aggregated
/// residual capacity and evicting the smallest resident process when a
/// preferred device is contested.
pub fn phase_a(
    devices: &HashMap<DeviceId, Device>,
    app: &Application,
    requesting_device: DeviceId,
) -> Option<HashMap<usize, DeviceId>> {
    let requester = devices.get(&requesting_device)?;
    let mut distances: Vec<(DeviceId, f64)> = requester
        .routing_table
        .destinations()
        .filter_map(|d| requester.routing_table.route_to(d).map(|(_, m)| (d, m)))
        .collect();
    distances.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    if app.num_procs() == 0 {
        return Some(HashMap::new());
    }

    let mut pref: HashMap<usize, Vec<(DeviceId, f64)>> = HashMap::new();
    for (idx, proc) in app.processes.iter().enumerate() {
        let list: Vec<_> = distances
            .iter()
            .filter(|(d, _)| devices.get(d).map(|dev| dev.deployable(&proc.resource_request)).unwrap_or(false))
            .copied()
            .collect();
        pref.insert(idx, list);
    }

    let mut pointer: HashMap<usize, usize> = HashMap::new();
    let mut matched: HashMap<usize, DeviceId> = HashMap::new();
    let mut occupants: HashMap<DeviceId, Vec<usize>> = HashMap::new();
    let mut worklist: VecDeque<usize> = (0..app.num_procs()).collect();

    while let Some(proc_idx) = worklist.pop_front() {
        let list = pref.get(&proc_idx)?;
        let ptr = pointer.entry(proc_idx).or_insert(0);
        if *ptr >= list.len() {
            return None;
        }
        let (device_id, _metric) = list[*ptr];
        *ptr += 1;

        match occupants.get(&device_id).cloned() {
            None => {
                matched.insert(proc_idx, device_id);
                occupants.entry(device_id).or_default().push(proc_idx);
            }
            Some(existing) => {
                let device = devices.get(&device_id)?;
                let mut agg_procs: Vec<&crate::process::Processus> = existing.iter().map(|i| &app.processes[*i]).collect();
                agg_procs.push(&app.processes[proc_idx]);
                let agg = aggregate_requests(agg_procs);
                if device.deployable(&agg) {
                    matched.insert(proc_idx, device_id);
                    occupants.get_mut(&device_id).unwrap().push(proc_idx);
                } else {
                    let min_idx = *existing
                        .iter()
                        .min_by(|&&a, &&b| compare_size(&app.processes[a], &app.processes[b]))
                        .unwrap();
                    if compare_size(&app.processes[proc_idx], &app.processes[min_idx]) == Ordering::Greater {
                        occupants.get_mut(&device_id).unwrap().retain(|&i| i != min_idx);
                        matched.remove(&min_idx);
                        matched.insert(proc_idx, device_id);
                        occupants.get_mut(&device_id).unwrap().push(proc_idx);
                        worklist.push_back(min_idx);
                    } else {
                        worklist.push_back(proc_idx);
                    }
                }
            }
        }
    }

    Some(matched)
}

/// Phase B: for each linked pair, walk candidate routes in metric order
/// and reserve the first that fits; roll back every reservation made
/// during this phase if any pair fails.
pub fn phase_b(
    network: &mut PhysicalNetwork,
    devices: &HashMap<DeviceId, Device>,
    app: &Application,
    matched: &HashMap<usize, DeviceId>,
) -> Option<HashMap<(usize, usize), Path>> {
    let mut allocation = HashMap::new();
    let mut reservations: Vec<(Vec<u64>, f64)> = Vec::new();

    for (i, j, bw) in app.linked_pairs() {
        let src = *matched.get(&i)?;
        let dst = *matched.get(&j)?;
        let src_device = devices.get(&src)?;

        let mut placed = None;
        for route in src_device.ospf_routing_table.routes_to(dst) {
            let Some(path) = path_from_route(network, route) else { continue };
            if min_available_bandwidth(network, &path) < bw {
                continue;
            }
            if reserve(network, &path, bw) {
                placed = Some(path);
                break;
            }
        }
        // source == destination (co-located): trivial path, always reserves.
        let placed = placed.or_else(|| {
            (src == dst).then(|| Path::trivial(src)).filter(|p| reserve(network, p, bw))
        });

        match placed {
            Some(path) => {
                reservations.push((path.links.clone(), bw));
                allocation.insert((i, j), path);
            }
            None => {
                for (links, amount) in &reservations {
                    free(network, links, *amount);
                }
                return None;
            }
        }
    }

    Some(allocation)
}

/// Run both phases of the greedy placement algorithm for `app` arriving at
/// `requesting_device`.
pub fn attempt(
    devices: &HashMap<DeviceId, Device>,
    network: &mut PhysicalNetwork,
    app: &Application,
    requesting_device: DeviceId,
) -> Result<Success, Failure> {
    let matched = phase_a(devices, app, requesting_device).ok_or(Failure::Devices)?;

    let node_metric = matched
        .iter()
        .map(|(&idx, &dev_id)| {
            let metric = devices
                .get(&requesting_device)
                .and_then(|d| d.routing_table.route_to(dev_id))
                .map(|(_, m)| m)
                .unwrap_or(0.0);
            (idx, metric)
        })
        .collect();

    let link_allocation = phase_b(network, devices, app, &matched).ok_or(Failure::Links)?;

    Ok(Success { devices: matched, link_allocation, node_metric })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::Resource;
    use crate::resource::{AllocateOpts, Position};
    use crate::topology::link::PhysicalLink;

    fn device_with_cpu(id: DeviceId, cpu: f64) -> Device {
        let mut limit = HashMap::new();
        limit.insert(Resource::Cpu, cpu);
        limit.insert(Resource::Gpu, 0.0);
        limit.insert(Resource::Mem, 4096.0);
        limit.insert(Resource::Disk, 4096.0);
        Device::new(id, Position { x: 0.0, y: 0.0, z: 0.0 }, limit)
    }

    fn app_with_single_proc(cpu: f64) -> Application {
        let mut app = Application::new(0, 100, 1);
        app.processes[0].resource_request.insert(Resource::Cpu, cpu);
        app
    }

    #[test]
    fn single_process_single_device_happy_path() {
        let mut devices = HashMap::new();
        devices.insert(0, device_with_cpu(0, 8.0));
        let app = app_with_single_proc(1.0);
        let matched = phase_a(&devices, &app, 0).unwrap();
        assert_eq!(matched.get(&0), Some(&0));
    }

    #[test]
    fn co_location_via_aggregation() {
        let mut devices = HashMap::new();
        devices.insert(0, device_with_cpu(0, 4.0));
        let mut app = Application::new(0, 100, 2);
        app.processes[0].resource_request.insert(Resource::Cpu, 2.0);
        app.processes[1].resource_request.insert(Resource::Cpu, 2.0);
        app.proc_links[0][1] = 10.0 * 1024.0;
        app.proc_links[1][0] = 10.0 * 1024.0;
        let matched = phase_a(&devices, &app, 0).unwrap();
        assert_eq!(matched.get(&0), Some(&0));
        assert_eq!(matched.get(&1), Some(&0));

        let mut network = PhysicalNetwork::new();
        network.ensure_device(0);
        let allocation = phase_b(&mut network, &devices, &app, &matched).unwrap();
        let path = allocation.get(&(0, 1)).unwrap();
        assert!(path.links.is_empty());
    }

    #[test]
    fn devices_fails_when_no_device_fits() {
        let mut devices = HashMap::new();
        devices.insert(0, device_with_cpu(0, 1.0));
        let app = app_with_single_proc(2.0);
        assert!(phase_a(&devices, &app, 0).is_none());
    }

    #[test]
    fn links_fails_when_bandwidth_insufficient() {
        let mut devices = HashMap::new();
        devices.insert(1, device_with_cpu(1, 8.0));
        devices.insert(2, device_with_cpu(2, 8.0));
        devices.get_mut(&1).unwrap().routing_table.add_route(2, 2, 1.0);

        let mut network = PhysicalNetwork::new();
        network.add_link(PhysicalLink::with_bandwidth(0, 1, 2, 100.0, 1.0));

        let route = crate::topology::routing::Route { origin: 1, destination: 2, metric: 1.0, path: vec![1, 2] };
        devices.get_mut(&1).unwrap().ospf_routing_table.add_route(route);

        let mut app = Application::new(0, 100, 2);
        app.processes[0].resource_request.insert(Resource::Cpu, 1.0);
        app.processes[1].resource_request.insert(Resource::Cpu, 1.0);
        app.proc_links[0][1] = 150.0;
        app.proc_links[1][0] = 150.0;

        let mut matched = HashMap::new();
        matched.insert(0, 1);
        matched.insert(1, 2);
        assert!(phase_b(&mut network, &devices, &app, &matched).is_none());
        // no partial reservation should remain
        assert_eq!(network.link(0).unwrap().bandwidth_use, 0.0);
    }

    #[test]
    fn eviction_prefers_larger_incoming_process() {
        let mut devices = HashMap::new();
        devices.insert(0, device_with_cpu(0, 2.0));
        let mut app = Application::new(0, 100, 2);
        // proc 0 is small, placed first; proc 1 is larger and contests
        // the same (only) device.
        app.processes[0].resource_request.insert(Resource::Cpu, 1.0);
        app.processes[1].resource_request.insert(Resource::Gpu, 1.0);
        devices.get_mut(&0).unwrap().limit.insert(Resource::Gpu, 1.0);

        let matched = phase_a(&devices, &app, 0);
        assert!(matched.is_some());
        let _ = AllocateOpts::default();
    }
}
