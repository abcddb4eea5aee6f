//! BareMetalHost CRD Definitions
//!
//! Kubernetes Custom Resource Definition for physical hosts, and the
//! lifecycle decision engine that compares a host's desired spec with its
//! observed status to decide what out-of-band work must happen next.

pub mod bare_metal_host;
pub mod clean_step;
pub mod hardware;
pub mod lifecycle;
pub mod references;

pub use bare_metal_host::*;
pub use clean_step::*;
pub use hardware::*;
pub use lifecycle::*;
pub use references::*;
