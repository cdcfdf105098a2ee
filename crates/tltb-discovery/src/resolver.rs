//! Local subnet detection
//!
//! The outbound interface is found by "connecting" a UDP socket to a public
//! address and reading back the address the OS bound it to. No packets are
//! sent. The scan then covers the /24 around that address.

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use tltb_core::Subnet;
use tokio::net::{ToSocketAddrs, UdpSocket};
use tracing::{debug, warn};

/// Public address used only to select the outbound interface
pub const ROUTE_PROBE_ADDR: &str = "8.8.8.8:80";

/// Subnet scanned when the local network cannot be detected
pub fn default_subnet() -> Subnet {
    Subnet::class_c(Ipv4Addr::new(192, 168, 1, 0))
}

/// Find the local IPv4 address used to reach `target`
pub async fn detect_local_ip(target: impl ToSocketAddrs) -> io::Result<Ipv4Addr> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.connect(target).await?;

    match socket.local_addr()? {
        SocketAddr::V4(addr) if !addr.ip().is_unspecified() => Ok(*addr.ip()),
        other => Err(io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("No usable local IPv4 address (bound to {})", other),
        )),
    }
}

/// Result of local network detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalNetwork {
    /// Subnet to scan
    pub subnet: Subnet,
    /// Detected local address, `None` when the default subnet was used
    pub local_ip: Option<Ipv4Addr>,
}

impl LocalNetwork {
    pub fn is_fallback(&self) -> bool {
        self.local_ip.is_none()
    }
}

/// Network of the interface used to reach `target`, or the default subnet
pub async fn resolve_subnet(target: impl ToSocketAddrs) -> LocalNetwork {
    match detect_local_ip(target).await {
        Ok(ip) => {
            let subnet = Subnet::class_c(ip);
            debug!(local_ip = %ip, subnet = %subnet, "Detected local network");
            LocalNetwork {
                subnet,
                local_ip: Some(ip),
            }
        }
        Err(e) => {
            let subnet = default_subnet();
            warn!(error = %e, subnet = %subnet, "Could not detect local network, using default");
            LocalNetwork {
                subnet,
                local_ip: None,
            }
        }
    }
}

/// Network of the default outbound interface
pub async fn local_subnet() -> LocalNetwork {
    resolve_subnet(ROUTE_PROBE_ADDR).await
}
