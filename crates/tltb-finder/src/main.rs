//! TLTB Mini Finder - Main entry point
//!
//! Scans the local network for TLTB Mini devices. Useful on systems that
//! cannot resolve the device's `.local` name.

mod config;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tltb_core::Subnet;
use tltb_discovery::{check_mdns, local_subnet, DiscoveryScanner};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "tltb-find")]
#[command(about = "Find TLTB Mini devices on the local network")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "tltb-find.toml")]
    config: PathBuf,

    /// Subnet to scan, e.g. 192.168.1.0/24 (auto-detected by default)
    #[arg(short, long)]
    subnet: Option<Subnet>,

    /// Maximum number of hosts probed at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Device web server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Skip the mDNS self-test
    #[arg(long)]
    skip_mdns: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("tltb-find v{}", env!("CARGO_PKG_VERSION"));

    let mut config = config::load_config(&args.config)?;
    if let Some(subnet) = args.subnet {
        config.scan.subnet = Some(subnet);
    }
    if let Some(concurrency) = args.concurrency {
        config.scan.concurrency = concurrency;
    }
    if let Some(port) = args.port {
        config.scan.port = port;
    }

    let scanner = DiscoveryScanner::new(config.to_scanner_config())
        .context("Failed to create scanner")?;

    let mut out = std::io::stdout();

    if !args.json {
        report::print_banner(&mut out)?;
    }

    if config.mdns.enabled && !args.skip_mdns {
        let ip = check_mdns(&config.mdns.hostname).await;
        if !args.json {
            report::print_mdns_result(&mut out, &config.mdns.hostname, ip)?;
        }
    }

    let (subnet, network) = match config.scan.subnet {
        Some(subnet) => (subnet, None),
        None => {
            let network = local_subnet().await;
            (network.subnet, Some(network))
        }
    };

    if !args.json {
        report::print_scan_start(&mut out, &subnet, network.as_ref())?;
        out.flush()?;
    }

    let devices = scanner.scan(subnet).await;

    if args.json {
        report::print_json(&mut out, &devices)?;
    } else {
        report::print_devices(&mut out, &devices)?;
    }

    Ok(())
}
