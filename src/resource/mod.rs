//! Resource Ledger (C1): per-device multi-resource accounting with
//! time-stamped history.

mod device;

pub use device::{AllocateOpts, Device, Position};
