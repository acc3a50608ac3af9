//! Crate-wide error taxonomy.

use thiserror::Error;

use crate::constants::Resource;

/// Identifier of a device, stable for the lifetime of the environment.
pub type DeviceId = u64;
/// Identifier of an application.
pub type AppId = u64;
/// Identifier of a physical link.
pub type LinkId = u64;

/// Everything that can go wrong while running the simulator.
#[derive(Debug, Error)]
pub enum SimError {
    /// No route exists from the querying device to the given destination.
    #[error("no route to host {0}")]
    NoRouteToHost(DeviceId),

    /// A device id does not resolve to a known device.
    #[error("device not found: {0}")]
    DeviceNotFound(DeviceId),

    /// A link id does not resolve to a known link.
    #[error("link not found: {0}")]
    LinkNotFound(LinkId),

    /// Not enough free capacity of `resource` on `device` to satisfy the
    /// request.
    #[error("insufficient {resource} on device {device}: requested {requested}, available {available}")]
    InsufficientResource {
        /// Device that was short on capacity.
        device: DeviceId,
        /// Resource kind that was short.
        resource: Resource,
        /// Amount requested.
        requested: f64,
        /// Amount actually available.
        available: f64,
    },

    /// Not enough free bandwidth along a path to satisfy a link request.
    #[error("insufficient bandwidth on path: requested {requested}, available {available}")]
    InsufficientBandwidth {
        /// Bandwidth requested.
        requested: f64,
        /// Bandwidth actually available.
        available: f64,
    },

    /// The ledger's current usage diverged from the last history sample.
    /// This is a programmer error, not a retryable condition.
    #[error("ledger inconsistency on device {0}, resource {1}")]
    LedgerInconsistent(DeviceId, Resource),

    /// An allocation was attempted at a time strictly before the resource's
    /// last recorded history sample, without `force`.
    #[error("time regression on device {device}: attempted at {attempted}, last recorded at {last}")]
    TimeRegression {
        /// Device the allocation targeted.
        device: DeviceId,
        /// Time the caller attempted to allocate at.
        attempted: i64,
        /// Time of the last recorded sample.
        last: i64,
    },

    /// A path could not be constructed within `MAX_HOPS`.
    #[error("path from {0} to {1} exceeds the hop limit or never reaches the destination")]
    UnreachablePath(DeviceId, DeviceId),

    /// Catalog or results I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog JSON failed to parse or serialize.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Results CSV failed to serialize.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The batch optimizer's solver failed to reach a solution.
    #[error("optimizer error: {0}")]
    Optimizer(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SimError>;
