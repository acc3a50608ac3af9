//! Simulation-wide constants, all expressed in ticks (10 ms each) or raw
//! resource units. See the GLOSSARY for the unit definitions.

/// One simulated day, expressed in 10 ms ticks.
pub const TIME_PERIOD: i64 = 8_640_000;

/// Longest device-to-device path a route is allowed to take before it is
/// rejected as unusable.
pub const MAX_HOPS: usize = 100;

/// Number of times a single Placement is retried before it is dropped.
pub const MAX_TENTATIVES: u32 = 5;

/// Backoff applied to a retried Placement: 15 minutes of simulated time.
pub const BACKOFF: i64 = 90_000;

/// OSPF reference bandwidth, in Mb/s, used by the link metric formula.
pub const OSPF_REFERENCE_BANDWIDTH: f64 = 1000.0;

/// Default wifi range, in meters, used both for synthetic topology
/// generation and for the link metric's distance normalization.
pub const DEFAULT_WIFI_RANGE: f64 = 6.0;

/// Default link bandwidth, in KB/s, assigned to synthesized links.
pub const DEFAULT_LINK_BANDWIDTH: f64 = 1000.0 * 1024.0;

/// Default link propagation delay, in milliseconds.
pub const DEFAULT_LINK_DELAY: f64 = 10.0;

/// Base priority offset for Placement events; the application's own
/// priority field contributes a fractional term on top of this.
pub const PLACEMENT_REFERENCE_PRIORITY: f64 = 2.0;

/// Maximum number of times an application is re-enqueued into a batch
/// before the batch optimizer gives up on it.
pub const MAX_BATCH_TENTATIVES: u32 = 15;

/// Delay between the last `DeployProc` of an application and its `Sync`,
/// matching the source's `synchronization_time` default.
pub const SYNC_DELAY: i64 = 10;

/// Width of a batch-accumulation window before `BatchProcessing` fires.
/// Not named by the component's contract, which only specifies the
/// behavior at the window boundary; chosen as a round, inspectable value.
pub const BATCH_WINDOW: i64 = 1_000;

/// Number of alternate OSPF routes kept per destination, used by Phase B
/// to retry link mapping over alternate paths when the primary lacks
/// bandwidth.
pub const DEFAULT_K_ROUTES: usize = 3;

/// The four resource kinds tracked per device and per process request.
pub const RESOURCE_KINDS: [Resource; 4] = [Resource::Cpu, Resource::Gpu, Resource::Mem, Resource::Disk];

/// A resource kind tracked by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    /// CPU cores.
    Cpu,
    /// GPU units.
    Gpu,
    /// Memory, in MB.
    Mem,
    /// Disk, in MB.
    Disk,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::Cpu => write!(f, "cpu"),
            Resource::Gpu => write!(f, "gpu"),
            Resource::Mem => write!(f, "mem"),
            Resource::Disk => write!(f, "disk"),
        }
    }
}
