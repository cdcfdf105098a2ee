//! TLTB Core - Core types for the TLTB Mini finder
//!
//! This crate provides the foundational types shared by the scanner and the CLI:
//! - Device records produced when a TLTB Mini is identified
//! - IPv4 subnets and their host enumeration

pub mod device;
pub mod subnet;

pub use device::DeviceRecord;
pub use subnet::{Subnet, SubnetError};
