//! Path & Bandwidth Reservation (C3).

use crate::constants::MAX_HOPS;
use crate::error::{DeviceId, LinkId};
use crate::topology::routing::Route;
use crate::topology::PhysicalNetwork;
use crate::topology::RoutingTable;

/// A concrete device-to-device path: an ordered device sequence and the
/// links connecting consecutive devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    /// Source device.
    pub source: DeviceId,
    /// Destination device.
    pub destination: DeviceId,
    /// Ordered device sequence, beginning at `source` and ending at
    /// `destination`.
    pub devices: Vec<DeviceId>,
    /// Ordered link ids, one shorter than `devices`; empty when
    /// `source == destination`.
    pub links: Vec<LinkId>,
}

impl Path {
    /// The degenerate path from a device to itself: empty links, minimum
    /// available bandwidth is +∞.
    pub fn trivial(device: DeviceId) -> Self {
        Self { source: device, destination: device, devices: vec![device], links: vec![] }
    }
}

/// Follow `src`'s routing table next-hop entries to build a concrete path
/// to `dst`, capped at [`MAX_HOPS`]. Returns `None` if the walk does not
/// reach `dst` within the bound (the path is unusable).
pub fn generate_path(network: &PhysicalNetwork, routing_table: &RoutingTable, src: DeviceId, dst: DeviceId) -> Option<Path> {
    if src == dst {
        return Some(Path::trivial(src));
    }

    let mut devices = vec![src];
    let mut links = vec![];
    let mut current = src;

    for _ in 0..MAX_HOPS {
        if current == dst {
            return Some(Path { source: src, destination: dst, devices, links });
        }
        let (next_hop, _) = routing_table.route_to(dst)?;
        let link = network.link_between(current, next_hop)?;
        links.push(link.id);
        devices.push(next_hop);
        current = next_hop;
    }

    None
}

/// Turn a [`Route`] (a device sequence) into a concrete [`Path`] by
/// resolving the link between each consecutive pair of devices. Returns
/// `None` if any consecutive pair isn't directly connected.
pub fn path_from_route(network: &PhysicalNetwork, route: &Route) -> Option<Path> {
    if route.path.len() <= 1 {
        return Some(Path::trivial(route.origin));
    }
    let mut links = Vec::with_capacity(route.path.len() - 1);
    for w in route.path.windows(2) {
        links.push(network.link_between(w[0], w[1])?.id);
    }
    Some(Path { source: route.origin, destination: route.destination, devices: route.path.clone(), links })
}

/// The minimum of `capacity - used` across all links on `path`. A trivial
/// (zero-length) path has infinite available bandwidth.
pub fn min_available_bandwidth(network: &PhysicalNetwork, path: &Path) -> f64 {
    if path.links.is_empty() {
        return f64::INFINITY;
    }
    path.links
        .iter()
        .filter_map(|id| network.link(*id))
        .map(|l| l.available_bandwidth())
        .fold(f64::INFINITY, f64::min)
}

/// Atomically reserve `bw` along every link of `path`. If any link fails,
/// every reservation already made by this call is rolled back and `false`
/// is returned.
pub fn reserve(network: &mut PhysicalNetwork, path: &Path, bw: f64) -> bool {
    let mut reserved = Vec::with_capacity(path.links.len());
    for &id in &path.links {
        let Some(link) = network.link_mut(id) else {
            free(network, &reserved, bw);
            return false;
        };
        if link.use_bandwidth(bw) {
            reserved.push(id);
        } else {
            free(network, &reserved, bw);
            return false;
        }
    }
    true
}

/// Release `bw` from every link in `path`, without clamping below zero.
pub fn free(network: &mut PhysicalNetwork, links: &[LinkId], bw: f64) {
    for &id in links {
        if let Some(link) = network.link_mut(id) {
            link.free_bandwidth(bw);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::link::PhysicalLink;

    fn two_device_network() -> (PhysicalNetwork, RoutingTable) {
        let mut net = PhysicalNetwork::new();
        net.add_link(PhysicalLink::with_bandwidth(0, 1, 2, 100.0, 1.0));
        let mut rt = RoutingTable::new(1);
        rt.add_route(2, 2, 1.0);
        (net, rt)
    }

    #[test]
    fn trivial_path_has_infinite_bandwidth() {
        let (net, _) = two_device_network();
        let p = Path::trivial(1);
        assert_eq!(min_available_bandwidth(&net, &p), f64::INFINITY);
    }

    #[test]
    fn generate_path_follows_next_hops() {
        let (net, rt) = two_device_network();
        let p = generate_path(&net, &rt, 1, 2).unwrap();
        assert_eq!(p.devices, vec![1, 2]);
        assert_eq!(p.links, vec![0]);
    }

    #[test]
    fn reserve_rolls_back_on_partial_failure() {
        let mut net = PhysicalNetwork::new();
        net.add_link(PhysicalLink::with_bandwidth(0, 1, 2, 100.0, 1.0));
        net.add_link(PhysicalLink::with_bandwidth(1, 2, 3, 10.0, 1.0));
        let path = Path { source: 1, destination: 3, devices: vec![1, 2, 3], links: vec![0, 1] };
        let before = net.link(0).unwrap().bandwidth_use;
        assert!(!reserve(&mut net, &path, 50.0));
        assert_eq!(net.link(0).unwrap().bandwidth_use, before);
    }

    #[test]
    fn reserve_then_free_round_trips() {
        let (mut net, rt) = two_device_network();
        let p = generate_path(&net, &rt, 1, 2).unwrap();
        let before = net.link(0).unwrap().bandwidth_use;
        assert!(reserve(&mut net, &p, 10.0));
        free(&mut net, &p.links, 10.0);
        assert_eq!(net.link(0).unwrap().bandwidth_use, before);
    }
}
