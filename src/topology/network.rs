//! The physical network: an N×N sparse adjacency of [`PhysicalLink`]s,
//! backed by a `petgraph` graph for shortest-path queries.

use std::collections::HashMap;

use petgraph::stable_graph::{NodeIndex, StableUnGraph};

use crate::error::{DeviceId, LinkId};
use crate::topology::link::PhysicalLink;

/// Sparse matrix of physical links plus the graph view used for routing
/// queries.
#[derive(Debug, Clone, Default)]
pub struct PhysicalNetwork {
    links: HashMap<LinkId, PhysicalLink>,
    /// `(origin, destination) -> link id`, both directions recorded since
    /// the matrix is indexed by ordered pairs even though links are
    /// undirectional.
    matrix: HashMap<(DeviceId, DeviceId), LinkId>,
    graph: StableUnGraph<DeviceId, LinkId>,
    node_index: HashMap<DeviceId, NodeIndex>,
    next_link_id: LinkId,
}

impl PhysicalNetwork {
    /// An empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device as a graph node, if not already present.
    pub fn ensure_device(&mut self, device: DeviceId) {
        self.node_index
            .entry(device)
            .or_insert_with(|| self.graph.add_node(device));
    }

    fn node_index(&self, device: DeviceId) -> Option<NodeIndex> {
        self.node_index.get(&device).copied()
    }

    /// Add a link to the network, wiring both the matrix and the graph.
    pub fn add_link(&mut self, link: PhysicalLink) -> LinkId {
        self.ensure_device(link.origin);
        self.ensure_device(link.destination);
        let id = link.id;
        self.next_link_id = self.next_link_id.max(id + 1);
        let a = self.node_index(link.origin).unwrap();
        let b = self.node_index(link.destination).unwrap();
        self.graph.add_edge(a, b, id);
        self.matrix.insert((link.origin, link.destination), id);
        self.matrix.insert((link.destination, link.origin), id);
        self.links.insert(id, link);
        id
    }

    /// Allocate the next free link id.
    pub fn next_link_id(&mut self) -> LinkId {
        let id = self.next_link_id;
        self.next_link_id += 1;
        id
    }

    /// Look up a link by id.
    pub fn link(&self, id: LinkId) -> Option<&PhysicalLink> {
        self.links.get(&id)
    }

    /// Mutable lookup of a link by id.
    pub fn link_mut(&mut self, id: LinkId) -> Option<&mut PhysicalLink> {
        self.links.get_mut(&id)
    }

    /// Link directly connecting `origin` and `destination`, if any.
    pub fn link_between(&self, origin: DeviceId, destination: DeviceId) -> Option<&PhysicalLink> {
        self.matrix.get(&(origin, destination)).and_then(|id| self.links.get(id))
    }

    /// All devices known to the network.
    pub fn devices(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.node_index.keys().copied()
    }

    /// All links known to the network.
    pub fn links(&self) -> impl Iterator<Item = &PhysicalLink> {
        self.links.values()
    }

    /// The underlying graph, for routing algorithms.
    pub(crate) fn graph(&self) -> &StableUnGraph<DeviceId, LinkId> {
        &self.graph
    }

    pub(crate) fn node_indices(&self) -> &HashMap<DeviceId, NodeIndex> {
        &self.node_index
    }

    /// Render the topology as Graphviz DOT (A1 `visualize` subcommand).
    pub fn to_dot(&self) -> String {
        format!("{:?}", petgraph::dot::Dot::new(&self.graph))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_link_wires_matrix_and_graph() {
        let mut net = PhysicalNetwork::new();
        let link = PhysicalLink::new(0, 1, 2);
        net.add_link(link);
        assert!(net.link_between(1, 2).is_some());
        assert!(net.link_between(2, 1).is_some());
        assert_eq!(net.graph().edge_count(), 1);
    }
}
