//! Event Queue (C4) and the tagged event enumeration that the Deployment
//! Lifecycle (C7) dispatches over.

pub mod queue;

pub use queue::{BinaryHeapQueue, EventQueue, Scheduled};

use std::collections::HashMap;

use crate::error::{AppId, DeviceId};
use crate::path::Path;

/// Dispatch priority of each event kind: lower fires first at equal time.
/// Placement adds a fractional `app.priority / 10` term on top of
/// [`PLACEMENT_BASE_PRIORITY`].
pub const FINAL_REPORT_PRIORITY: f64 = 0.0;
/// See [`FINAL_REPORT_PRIORITY`].
pub const UNDEPLOY_PRIORITY: f64 = 1.0;
/// See [`FINAL_REPORT_PRIORITY`].
pub const PLACEMENT_BASE_PRIORITY: f64 = 2.0;
/// See [`FINAL_REPORT_PRIORITY`].
pub const DEPLOY_PROC_PRIORITY: f64 = 3.0;
/// See [`FINAL_REPORT_PRIORITY`].
pub const SYNC_PRIORITY: f64 = 4.0;
/// See [`FINAL_REPORT_PRIORITY`].
pub const ORGANIZE_PRIORITY: f64 = 5.0;
/// Not named in the priority table; kept at the Placement tier since it is
/// a batched form of the same decision.
pub const BATCH_PROCESSING_PRIORITY: f64 = 2.0;
/// Structural-only variant (device mobility is out of scope); placed
/// after Organize so it never interferes with real dispatch order.
pub const MOVEMENT_PRIORITY: f64 = 6.0;

/// `priority = REFERENCE_PRIORITY + app.priority / 10`.
pub fn placement_priority(app_priority: f64) -> f64 {
    PLACEMENT_BASE_PRIORITY + app_priority / 10.0
}

/// The tagged event enumeration, replacing dynamic dispatch across event
/// subtypes.
#[derive(Debug, Clone)]
pub enum Event {
    /// Attempt to map an application's components onto devices.
    Placement {
        /// Application to place.
        app_id: AppId,
        /// Device that received the arrival (the "request receptor").
        requesting_device: DeviceId,
        /// Number of attempts made so far, including this one.
        tentative: u32,
    },
    /// Apply one component's resource request to its assigned device.
    DeployProc {
        /// Application being deployed.
        app_id: AppId,
        /// Index of the process within the application.
        proc_index: usize,
        /// Device the process was assigned to.
        device_id: DeviceId,
        /// Whether this is the last component to deploy.
        last: bool,
        /// Delay before the follow-up Sync fires.
        sync_delay: i64,
        /// Full `process index -> device id` mapping, carried through so
        /// the last `DeployProc` can hand it to `Sync`.
        devices: HashMap<usize, DeviceId>,
        /// Full `(i, j) -> Path` mapping, carried through so the last
        /// `DeployProc` can hand it to `Sync`.
        link_allocation: HashMap<(usize, usize), Path>,
    },
    /// Finalize an application's deployment.
    Sync {
        /// Application being synced.
        app_id: AppId,
        /// `process index -> device id` mapping from Placement phase A.
        devices: HashMap<usize, DeviceId>,
        /// `(i, j) -> Path` mapping from Placement phase B.
        link_allocation: HashMap<(usize, usize), Path>,
    },
    /// Release an application's resources at the end of its lifetime.
    Undeploy {
        /// Application to tear down.
        app_id: AppId,
    },
    /// Force a report-on-value at every device and persist metrics.
    FinalReport,
    /// Fire the batch optimizer over the accumulated window.
    BatchProcessing,
    /// Structural-only hook; migration/rebalancing logic is out of scope.
    Organize,
    /// Structural-only hook; device mobility is out of scope.
    Movement {
        /// Device that would move.
        device_id: DeviceId,
    },
}

impl Event {
    /// Human-readable event name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Placement { .. } => "Placement",
            Event::DeployProc { .. } => "DeployProc",
            Event::Sync { .. } => "Sync",
            Event::Undeploy { .. } => "Undeploy",
            Event::FinalReport => "FinalReport",
            Event::BatchProcessing => "BatchProcessing",
            Event::Organize => "Organize",
            Event::Movement { .. } => "Movement",
        }
    }
}
