//! Per-program admission control.
//!
//! Concurrency limits are sized from host resources at startup and retuned
//! periodically from observed load. Each program gets its own gate so a slow
//! or rate-limited program cannot starve the others.

mod controller;
mod gate;
mod probe;

pub use controller::AdmissionController;
pub use gate::{AdmissionGate, AdmissionSlot};
pub use probe::{HostSnapshot, LoadSample, ResourceProbe, SysinfoProbe};
