//! Processus (component).

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants::Resource;
use crate::error::AppId;

/// The deployable unit of an [`crate::application::Application`]: a
/// resource request vector over the same resource set as
/// [`crate::resource::Device`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Processus {
    /// Identity, unique within the parent application.
    pub id: u64,
    /// Parent application id.
    pub app_id: AppId,
    /// Per-resource request.
    pub resource_request: HashMap<Resource, f64>,
}

impl Processus {
    /// A new process with an empty (all-zero) request.
    pub fn new(id: u64, app_id: AppId) -> Self {
        Self { id, app_id, resource_request: HashMap::new() }
    }

    /// Requested amount of `r`, or zero if unset.
    pub fn request(&self, r: Resource) -> f64 {
        self.resource_request.get(&r).copied().unwrap_or(0.0)
    }

    /// `(gpu, cpu, mem, disk)` sort key, used by [`compare_size`].
    fn size_key(&self) -> (f64, f64, f64, f64) {
        (self.request(Resource::Gpu), self.request(Resource::Cpu), self.request(Resource::Mem), self.request(Resource::Disk))
    }
}

/// Total pre-order over processes by `(gpu, cpu, mem, disk)` request,
/// ascending: `Ordering::Greater` means `a` is the "larger" process. Used
/// in place of operator overloading.
pub fn compare_size(a: &Processus, b: &Processus) -> Ordering {
    a.size_key().partial_cmp(&b.size_key()).unwrap_or(Ordering::Equal)
}

/// The aggregated resource request of a set of co-located processes
/// (explicit replacement for `Processus::__add__`). The identity element
/// is the zero-request process.
pub fn aggregate_requests<'a>(procs: impl IntoIterator<Item = &'a Processus>) -> HashMap<Resource, f64> {
    let mut total: HashMap<Resource, f64> = HashMap::new();
    for p in procs {
        for (&r, &amount) in &p.resource_request {
            *total.entry(r).or_insert(0.0) += amount;
        }
    }
    total
}

/// Whether `request` fits within `limit` (used to check aggregated
/// co-location feasibility against a device's full cap, independent of its
/// current usage).
pub fn fits(request: &HashMap<Resource, f64>, limit: &HashMap<Resource, f64>) -> bool {
    request.iter().all(|(&r, &amount)| amount <= limit.get(&r).copied().unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proc_with(gpu: f64, cpu: f64) -> Processus {
        let mut p = Processus::new(0, 0);
        p.resource_request.insert(Resource::Gpu, gpu);
        p.resource_request.insert(Resource::Cpu, cpu);
        p
    }

    #[test]
    fn gpu_dominates_cpu_in_size_order() {
        let small_gpu_big_cpu = proc_with(0.0, 100.0);
        let big_gpu_small_cpu = proc_with(1.0, 0.0);
        assert_eq!(compare_size(&big_gpu_small_cpu, &small_gpu_big_cpu), Ordering::Greater);
    }

    #[test]
    fn aggregate_sums_requests() {
        let a = proc_with(1.0, 2.0);
        let b = proc_with(1.0, 3.0);
        let total = aggregate_requests([&a, &b]);
        assert_eq!(total[&Resource::Gpu], 2.0);
        assert_eq!(total[&Resource::Cpu], 5.0);
    }
}
