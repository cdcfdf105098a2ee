//! mDNS self-test
//!
//! Checks whether the host resolves `.local` names at all. Windows without
//! Bonjour does not, which is why the subnet scan exists.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tokio::net::lookup_host;
use tokio::time::timeout;
use tracing::debug;

/// Hostname the device advertises over mDNS
pub const DEVICE_HOSTNAME: &str = "tltb-mini.local";

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolve `hostname` through the system resolver, IPv4 only
pub async fn check_mdns(hostname: &str) -> Option<Ipv4Addr> {
    match timeout(LOOKUP_TIMEOUT, lookup_host((hostname, 80))).await {
        Ok(Ok(addrs)) => {
            let ip = addrs.into_iter().find_map(|addr| match addr.ip() {
                IpAddr::V4(v4) => Some(v4),
                IpAddr::V6(_) => None,
            });
            debug!(hostname = %hostname, ip = ?ip, "mDNS lookup finished");
            ip
        }
        Ok(Err(e)) => {
            debug!(hostname = %hostname, error = %e, "mDNS lookup failed");
            None
        }
        Err(_) => {
            debug!(hostname = %hostname, "mDNS lookup timed out");
            None
        }
    }
}
