//! IPv4 subnets and host enumeration

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubnetError {
    #[error("Invalid subnet '{input}': {reason}")]
    InvalidSubnet { input: String, reason: &'static str },
    #[error("Prefix length {0} is out of range (0-32)")]
    PrefixOutOfRange(u8),
}

/// An IPv4 network, e.g. 192.168.1.0/24
///
/// Host bits of `network` are always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Subnet {
    network: Ipv4Addr,
    prefix_len: u8,
}

impl Subnet {
    /// Create a subnet, clearing any host bits in `addr`
    pub fn new(addr: Ipv4Addr, prefix_len: u8) -> Result<Self, SubnetError> {
        if prefix_len > 32 {
            return Err(SubnetError::PrefixOutOfRange(prefix_len));
        }
        let network = Ipv4Addr::from(u32::from(addr) & mask(prefix_len));
        Ok(Self {
            network,
            prefix_len,
        })
    }

    /// The /24 network that contains `addr`
    pub fn class_c(addr: Ipv4Addr) -> Self {
        Self {
            network: Ipv4Addr::from(u32::from(addr) & mask(24)),
            prefix_len: 24,
        }
    }

    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    pub fn broadcast(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.network) | !mask(self.prefix_len))
    }

    /// Check if an address falls inside this subnet
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        (u32::from(ip) & mask(self.prefix_len)) == u32::from(self.network)
    }

    /// Usable host addresses in ascending order
    ///
    /// Network and broadcast addresses are skipped, except for /31
    /// (point-to-point, both usable) and /32 (the single address).
    pub fn hosts(&self) -> impl Iterator<Item = Ipv4Addr> + Send + 'static {
        let (first, last) = self.host_bounds();
        (first..=last).map(Ipv4Addr::from)
    }

    /// Number of addresses `hosts()` yields
    pub fn host_count(&self) -> u64 {
        let (first, last) = self.host_bounds();
        u64::from(last - first) + 1
    }

    fn host_bounds(&self) -> (u32, u32) {
        let network = u32::from(self.network);
        let broadcast = u32::from(self.broadcast());
        match self.prefix_len {
            32 => (network, network),
            31 => (network, broadcast),
            _ => (network + 1, broadcast - 1),
        }
    }
}

fn mask(prefix_len: u8) -> u32 {
    if prefix_len == 0 {
        0
    } else {
        !0u32 << (32 - u32::from(prefix_len))
    }
}

impl std::fmt::Display for Subnet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

impl FromStr for Subnet {
    type Err = SubnetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| SubnetError::InvalidSubnet {
            input: s.to_string(),
            reason,
        };

        let (addr, prefix) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| invalid("expected <address>/<prefix>"))?;
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| invalid("not an IPv4 address"))?;
        let prefix: u8 = prefix
            .parse()
            .map_err(|_| invalid("prefix is not a number"))?;

        Subnet::new(addr, prefix)
    }
}

impl TryFrom<String> for Subnet {
    type Error = SubnetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Subnet> for String {
    fn from(subnet: Subnet) -> Self {
        subnet.to_string()
    }
}
