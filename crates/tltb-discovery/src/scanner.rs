//! Discovery scanner that probes every host in a subnet

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tltb_core::{DeviceRecord, Subnet};
use tokio::sync::{broadcast, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::{info, warn};

use crate::error::DiscoveryError;
use crate::probe::{HttpProbe, Probe, ProbeConfig};

/// Default number of probes in flight at once
pub const DEFAULT_CONCURRENCY: usize = 50;

/// Scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Maximum number of hosts probed at the same time
    pub concurrency: usize,
    /// HTTP probe settings
    pub probe: ProbeConfig,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            probe: ProbeConfig::default(),
        }
    }
}

/// Discovery event for progress updates
#[derive(Debug, Clone)]
pub enum DiscoveryEvent {
    /// Scan started
    ScanStarted { subnet: Subnet, hosts: u64 },
    /// A TLTB Mini was identified
    DeviceFound(DeviceRecord),
    /// Every host has been probed
    ScanCompleted { found: usize, probed: u64 },
}

type ProbeResult = Result<(usize, Option<DeviceRecord>), JoinError>;

/// Discovery scanner service
pub struct DiscoveryScanner<P = HttpProbe> {
    probe: Arc<P>,
    concurrency: usize,
    event_tx: broadcast::Sender<DiscoveryEvent>,
}

impl DiscoveryScanner<HttpProbe> {
    /// Create a scanner that probes over HTTP
    pub fn new(config: ScannerConfig) -> Result<Self, DiscoveryError> {
        let probe = HttpProbe::new(config.probe)?;
        Self::with_probe(probe, config.concurrency)
    }
}

impl<P: Probe> DiscoveryScanner<P> {
    /// Create a scanner around any probe implementation
    pub fn with_probe(probe: P, concurrency: usize) -> Result<Self, DiscoveryError> {
        if concurrency == 0 {
            return Err(DiscoveryError::InvalidConcurrency);
        }
        let (event_tx, _) = broadcast::channel(100);
        Ok(Self {
            probe: Arc::new(probe),
            concurrency,
            event_tx,
        })
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Subscribe to discovery events
    pub fn subscribe(&self) -> broadcast::Receiver<DiscoveryEvent> {
        self.event_tx.subscribe()
    }

    /// Probe every host in `subnet` and return the devices found
    ///
    /// Waits for all probes to finish. Records come back in ascending
    /// address order regardless of which probe finished first.
    pub async fn scan(&self, subnet: Subnet) -> Vec<DeviceRecord> {
        let total = subnet.host_count();
        let _ = self.event_tx.send(DiscoveryEvent::ScanStarted { subnet, hosts: total });

        info!(
            subnet = %subnet,
            hosts = total,
            concurrency = self.concurrency,
            "Starting discovery scan"
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        let mut found: Vec<(usize, DeviceRecord)> = Vec::new();

        for (index, ip) in subnet.hosts().enumerate() {
            // Permit is taken before spawning and released when the probe ends
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            let probe = Arc::clone(&self.probe);
            tasks.spawn(async move {
                let _permit = permit;
                (index, probe.probe(ip).await)
            });

            while let Some(result) = tasks.try_join_next() {
                self.collect(result, &mut found);
            }
        }

        while let Some(result) = tasks.join_next().await {
            self.collect(result, &mut found);
        }

        found.sort_by_key(|(index, _)| *index);
        let devices: Vec<DeviceRecord> = found.into_iter().map(|(_, record)| record).collect();

        let _ = self.event_tx.send(DiscoveryEvent::ScanCompleted {
            found: devices.len(),
            probed: total,
        });

        info!(
            subnet = %subnet,
            "Scan complete: {} devices found, {} hosts probed",
            devices.len(),
            total
        );

        devices
    }

    fn collect(&self, result: ProbeResult, found: &mut Vec<(usize, DeviceRecord)>) {
        match result {
            Ok((index, Some(record))) => {
                info!(
                    ip = %record.address,
                    hostname = %record.hostname,
                    "Found TLTB Mini"
                );
                let _ = self.event_tx.send(DiscoveryEvent::DeviceFound(record.clone()));
                found.push((index, record));
            }
            Ok((_, None)) => {}
            Err(e) => {
                warn!(error = %e, "Probe task failed");
            }
        }
    }
}
