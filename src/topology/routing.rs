//! Routing tables and shortest-path bootstrap.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::error::DeviceId;
use crate::topology::metric::combine_metric;
use crate::topology::network::PhysicalNetwork;

/// `(origin, destination, metric, path)`. Equality is defined as same
/// destination and same device sequence.
#[derive(Debug, Clone)]
pub struct Route {
    /// Device the route starts from.
    pub origin: DeviceId,
    /// Device the route ends at.
    pub destination: DeviceId,
    /// Additive OSPF-style cost of the route.
    pub metric: f64,
    /// Ordered device sequence from origin to destination, inclusive.
    pub path: Vec<DeviceId>,
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        self.destination == other.destination && self.path == other.path
    }
}

/// Prepend a hop to an existing route, combining metrics additively.
pub fn prepend_hop(hop: DeviceId, hop_metric: f64, route: &Route) -> Route {
    let mut path = Vec::with_capacity(route.path.len() + 1);
    path.push(hop);
    path.extend_from_slice(&route.path);
    Route {
        origin: hop,
        destination: route.destination,
        metric: combine_metric(hop_metric, route.metric),
        path,
    }
}

/// Simple per-device routing table: `destination -> (next_hop, metric)`.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    entries: HashMap<DeviceId, (DeviceId, f64)>,
}

impl RoutingTable {
    /// A table with only the trivial self-route `(self, 0)`.
    pub fn new(self_id: DeviceId) -> Self {
        let mut t = Self::default();
        t.entries.insert(self_id, (self_id, 0.0));
        t
    }

    /// Add or update an entry, but only if `distance` strictly improves on
    /// the current best known distance to `destination`.
    pub fn add_route(&mut self, destination: DeviceId, next_hop: DeviceId, distance: f64) {
        let improves = self
            .entries
            .get(&destination)
            .map(|(_, d)| distance < *d)
            .unwrap_or(true);
        if improves {
            self.entries.insert(destination, (next_hop, distance));
        }
    }

    /// `(next_hop, metric)` for `destination`, if known.
    pub fn route_to(&self, destination: DeviceId) -> Option<(DeviceId, f64)> {
        self.entries.get(&destination).copied()
    }

    /// All known destinations.
    pub fn destinations(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.entries.keys().copied()
    }
}

/// OSPF-style per-device routing table: `destination -> [Route, ...]`,
/// ordered by metric ascending.
#[derive(Debug, Clone, Default)]
pub struct OspfRoutingTable {
    routes: HashMap<DeviceId, Vec<Route>>,
}

impl OspfRoutingTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a route, deduplicating by identical `(destination, path)` and
    /// updating the metric in place if it changed; otherwise keeps the list
    /// sorted by metric ascending.
    pub fn add_route(&mut self, route: Route) {
        let list = self.routes.entry(route.destination).or_default();
        if let Some(existing) = list.iter_mut().find(|r| **r == route) {
            existing.metric = route.metric;
        } else {
            list.push(route);
        }
        list.sort_by(|a, b| a.metric.partial_cmp(&b.metric).unwrap_or(Ordering::Equal));
    }

    /// The lowest-metric route to `destination`, if any.
    pub fn find_best_route(&self, destination: DeviceId) -> Option<&Route> {
        self.routes.get(&destination).and_then(|l| l.first())
    }

    /// All known routes to `destination`, ordered by metric ascending.
    pub fn routes_to(&self, destination: DeviceId) -> &[Route] {
        self.routes.get(&destination).map(|l| l.as_slice()).unwrap_or(&[])
    }
}

/// Priority-queue entry for Dijkstra: ordered so `BinaryHeap` (a max-heap)
/// pops the smallest cost first.
#[derive(Debug, Clone, Copy, PartialEq)]
struct HeapEntry {
    cost: f64,
    node: DeviceId,
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.cost.partial_cmp(&self.cost).unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Single-source Dijkstra over the physical network, using `edge_weight`
/// (typically the OSPF link metric) as the per-hop cost. Returns, for
/// every reachable destination, its shortest `Route` from `source`.
///
/// `edge_weight` is given the two endpoints of a link already known to be
/// adjacent in `network` and returns that link's cost.
pub fn shortest_paths_from(
    network: &PhysicalNetwork,
    source: DeviceId,
    edge_weight: impl Fn(DeviceId, DeviceId) -> f64,
) -> HashMap<DeviceId, Route> {
    let mut dist: HashMap<DeviceId, f64> = HashMap::new();
    let mut prev: HashMap<DeviceId, DeviceId> = HashMap::new();
    let mut heap = BinaryHeap::new();

    dist.insert(source, 0.0);
    heap.push(HeapEntry { cost: 0.0, node: source });

    let node_indices = network.node_indices();
    let graph = network.graph();

    while let Some(HeapEntry { cost, node }) = heap.pop() {
        if cost > *dist.get(&node).unwrap_or(&f64::INFINITY) {
            continue;
        }
        let Some(&idx) = node_indices.get(&node) else { continue };
        for neighbor_idx in graph.neighbors(idx) {
            let neighbor = graph[neighbor_idx];
            let w = edge_weight(node, neighbor);
            let next_cost = cost + w;
            if next_cost < *dist.get(&neighbor).unwrap_or(&f64::INFINITY) {
                dist.insert(neighbor, next_cost);
                prev.insert(neighbor, node);
                heap.push(HeapEntry { cost: next_cost, node: neighbor });
            }
        }
    }

    let mut routes = HashMap::new();
    for (&dest, &cost) in dist.iter() {
        let mut path = vec![dest];
        let mut cur = dest;
        while let Some(&p) = prev.get(&cur) {
            path.push(p);
            cur = p;
        }
        path.reverse();
        routes.insert(
            dest,
            Route { origin: source, destination: dest, metric: cost, path },
        );
    }
    routes
}

/// Up to `k` loopless simple paths from `source` to `destination`, ordered
/// by OSPF metric ascending (Yen's algorithm layered over repeated
/// single-source Dijkstra calls with temporarily removed edges).
pub fn k_shortest_paths(
    network: &PhysicalNetwork,
    source: DeviceId,
    destination: DeviceId,
    k: usize,
    edge_weight: impl Fn(DeviceId, DeviceId) -> f64,
) -> Vec<Route> {
    let mut found: Vec<Route> = Vec::new();
    let mut candidates: Vec<Route> = Vec::new();

    let first = shortest_paths_from(network, source, &edge_weight).remove(&destination);
    let Some(first) = first else { return found };
    found.push(first);

    while found.len() < k {
        let prev_path = found.last().unwrap().path.clone();
        for i in 0..prev_path.len().saturating_sub(1) {
            let spur_node = prev_path[i];
            let root_path = &prev_path[..=i];

            // Build a restricted view of the network excluding edges that
            // would retrace an already-found path sharing this root.
            let mut removed_edges: Vec<(DeviceId, DeviceId)> = Vec::new();
            for r in found.iter().chain(candidates.iter()) {
                if r.path.len() > i && r.path[..=i] == *root_path {
                    removed_edges.push((r.path[i], r.path[i + 1]));
                }
            }

            let restricted = |a: DeviceId, b: DeviceId| -> f64 {
                if removed_edges.contains(&(a, b)) || removed_edges.contains(&(b, a)) {
                    f64::INFINITY
                } else {
                    edge_weight(a, b)
                }
            };

            if let Some(spur_route) = shortest_paths_from(network, spur_node, restricted).remove(&destination) {
                // skip paths that re-enter the root path (loopless requirement)
                if spur_route.path.iter().skip(1).any(|n| root_path[..i].contains(n)) {
                    continue;
                }
                let mut total_path = root_path[..i].to_vec();
                total_path.extend(spur_route.path);
                if total_path.iter().collect::<std::collections::HashSet<_>>().len() != total_path.len() {
                    continue;
                }
                let root_metric: f64 = 0.0; // spur search already starts from spur_node with 0 cost
                let _ = root_metric;
                let candidate = Route {
                    origin: source,
                    destination,
                    metric: path_cost(&total_path, &edge_weight),
                    path: total_path,
                };
                if !found.contains(&candidate) && !candidates.contains(&candidate) {
                    candidates.push(candidate);
                }
            }
        }
        candidates.sort_by(|a, b| a.metric.partial_cmp(&b.metric).unwrap_or(Ordering::Equal));
        if candidates.is_empty() {
            break;
        }
        found.push(candidates.remove(0));
    }

    found.truncate(k);
    found
}

fn path_cost(path: &[DeviceId], edge_weight: &impl Fn(DeviceId, DeviceId) -> f64) -> f64 {
    path.windows(2).map(|w| edge_weight(w[0], w[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::link::PhysicalLink;

    fn line_network() -> PhysicalNetwork {
        let mut net = PhysicalNetwork::new();
        net.add_link(PhysicalLink::new(0, 1, 2));
        net.add_link(PhysicalLink::new(1, 2, 3));
        net
    }

    #[test]
    fn dijkstra_finds_multi_hop_route() {
        let net = line_network();
        let routes = shortest_paths_from(&net, 1, |_, _| 1.0);
        let r = routes.get(&3).unwrap();
        assert_eq!(r.path, vec![1, 2, 3]);
        assert_eq!(r.metric, 2.0);
    }

    #[test]
    fn simple_routing_table_keeps_smallest() {
        let mut t = RoutingTable::new(1);
        t.add_route(2, 2, 5.0);
        t.add_route(2, 3, 10.0);
        assert_eq!(t.route_to(2), Some((2, 5.0)));
    }

    #[test]
    fn ospf_table_dedups_by_path() {
        let mut t = OspfRoutingTable::new();
        t.add_route(Route { origin: 1, destination: 2, metric: 5.0, path: vec![1, 2] });
        t.add_route(Route { origin: 1, destination: 2, metric: 3.0, path: vec![1, 2] });
        assert_eq!(t.routes_to(2).len(), 1);
        assert_eq!(t.find_best_route(2).unwrap().metric, 3.0);
    }

    #[test]
    fn k_shortest_paths_orders_by_metric() {
        let mut net = PhysicalNetwork::new();
        net.add_link(PhysicalLink::new(0, 1, 2));
        net.add_link(PhysicalLink::new(1, 2, 3));
        net.add_link(PhysicalLink::new(2, 1, 3));
        let routes = k_shortest_paths(&net, 1, 3, 2, |_, _| 1.0);
        assert!(!routes.is_empty());
        assert!(routes.windows(2).all(|w| w[0].metric <= w[1].metric));
    }
}
