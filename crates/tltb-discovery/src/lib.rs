//! TLTB Discovery - Network discovery for TLTB Mini devices
//!
//! This crate provides the pieces of a local-network scan:
//! - Local subnet resolution with a default fallback
//! - Staged HTTP probing (`/discover`, `/ping`, `/`) for device identification
//! - A bounded-concurrency scanner that probes every host in a subnet
//! - An mDNS self-test for the device's `.local` hostname

pub mod error;
pub mod mdns;
pub mod probe;
pub mod resolver;
pub mod scanner;

#[cfg(test)]
mod mock;

pub use error::DiscoveryError;
pub use mdns::{check_mdns, DEVICE_HOSTNAME};
pub use probe::{HttpProbe, Probe, ProbeConfig, Stage, StageOutcome};
pub use resolver::{default_subnet, local_subnet, LocalNetwork};
pub use scanner::{DiscoveryEvent, DiscoveryScanner, ScannerConfig};
