//! Device record for an identified TLTB Mini

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// A TLTB Mini found on the network
///
/// Optional fields hold an empty string when the device did not report them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// IPv4 address the device answered on
    pub address: Ipv4Addr,
    /// mDNS hostname reported by the device (e.g. "tltb-mini.local")
    #[serde(default)]
    pub hostname: String,
    /// MAC address reported by the device
    #[serde(default)]
    pub hardware_id: String,
    /// SSID of the device's own access point
    #[serde(default)]
    pub access_point_name: String,
}

impl DeviceRecord {
    /// Create a record that knows nothing beyond the address
    pub fn address_only(address: Ipv4Addr) -> Self {
        Self {
            address,
            hostname: String::new(),
            hardware_id: String::new(),
            access_point_name: String::new(),
        }
    }

    /// URL of the device's web interface
    pub fn web_url(&self) -> String {
        format!("http://{}", self.address)
    }

    /// URL using the reported hostname, if there is one
    pub fn local_url(&self) -> Option<String> {
        if self.hostname.is_empty() {
            None
        } else {
            Some(format!("http://{}", self.hostname))
        }
    }
}

impl std::fmt::Display for DeviceRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.hostname.is_empty() {
            write!(f, "{}", self.address)
        } else {
            write!(f, "{} ({})", self.address, self.hostname)
        }
    }
}
