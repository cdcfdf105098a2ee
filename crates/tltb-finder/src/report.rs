//! Console output for scan results

use anyhow::Result;
use std::io::Write;
use std::net::Ipv4Addr;
use tltb_core::{DeviceRecord, Subnet};
use tltb_discovery::LocalNetwork;

pub fn print_banner(out: &mut impl Write) -> Result<()> {
    writeln!(out, "{}", "=".repeat(50))?;
    writeln!(out, "🚛 TLTB Mini Device Discovery")?;
    writeln!(out, "{}", "=".repeat(50))?;
    Ok(())
}

pub fn print_mdns_result(out: &mut impl Write, hostname: &str, ip: Option<Ipv4Addr>) -> Result<()> {
    writeln!(out, "\n🔍 Testing mDNS resolution...")?;
    match ip {
        Some(ip) => writeln!(out, "✅ mDNS works! {} resolves to {}", hostname, ip)?,
        None => {
            writeln!(out, "❌ mDNS not supported on this system")?;
            writeln!(out, "   This is normal for Windows without Bonjour services")?;
        }
    }
    Ok(())
}

/// Announce the network about to be scanned
///
/// `network` is `None` when the subnet came from the command line or config.
pub fn print_scan_start(
    out: &mut impl Write,
    subnet: &Subnet,
    network: Option<&LocalNetwork>,
) -> Result<()> {
    writeln!(out, "\n🔍 Scanning for TLTB Mini devices...")?;
    writeln!(out, "This may take up to 30 seconds...\n")?;
    if network.is_some_and(LocalNetwork::is_fallback) {
        writeln!(out, "Could not detect local network, scanning common ranges...")?;
    }
    writeln!(out, "Scanning network: {}", subnet)?;
    Ok(())
}

pub fn print_devices(out: &mut impl Write, devices: &[DeviceRecord]) -> Result<()> {
    if devices.is_empty() {
        return print_troubleshooting(out);
    }

    writeln!(out, "\n✅ Found {} TLTB Mini device(s):\n", devices.len())?;
    for (i, device) in devices.iter().enumerate() {
        writeln!(out, "{}. Device at {}", i + 1, device.address)?;
        if !device.hostname.is_empty() {
            writeln!(out, "   Hostname: {}", device.hostname)?;
        }
        if !device.hardware_id.is_empty() {
            writeln!(out, "   MAC: {}", device.hardware_id)?;
        }
        if !device.access_point_name.is_empty() {
            writeln!(out, "   AP SSID: {}", device.access_point_name)?;
        }
        writeln!(out, "   🌐 Web Interface: {}", device.web_url())?;
        if let Some(url) = device.local_url() {
            writeln!(out, "   🌐 Local Address: {}", url)?;
        }
        writeln!(out)?;
    }
    writeln!(out, "💡 Bookmark these addresses for easy future access!")?;
    Ok(())
}

fn print_troubleshooting(out: &mut impl Write) -> Result<()> {
    writeln!(out, "\n❌ No TLTB Mini devices found on the network.")?;
    writeln!(out, "\nTroubleshooting:")?;
    writeln!(out, "1. Make sure the TLTB Mini is powered on")?;
    writeln!(out, "2. Check that it's connected to the same WiFi network")?;
    writeln!(
        out,
        "3. If in AP mode, connect to TLTB-Mini-XXXXXX and go to http://192.168.4.1"
    )?;
    writeln!(out, "4. Windows Note: .local domains don't work by default on Windows")?;
    writeln!(out, "   Install iTunes or Bonjour Print Services for .local domain support")?;
    Ok(())
}

pub fn print_json(out: &mut impl Write, devices: &[DeviceRecord]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, devices)?;
    writeln!(out)?;
    Ok(())
}
