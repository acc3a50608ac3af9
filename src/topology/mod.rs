//! Topology & Routing (C2): physical links, shortest paths, k-shortest
//! paths, routing tables.

pub mod link;
pub mod metric;
pub mod network;
pub mod routing;

pub use link::PhysicalLink;
pub use network::PhysicalNetwork;
pub use routing::{k_shortest_paths, shortest_paths_from, OspfRoutingTable, Route, RoutingTable};
