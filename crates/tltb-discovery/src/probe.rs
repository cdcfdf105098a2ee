//! Staged HTTP probing for TLTB Mini identification
//!
//! A host is checked in order:
//! 1. `GET /discover` - JSON self-description, matches on its own
//! 2. `GET /ping` - must answer exactly `pong`, never matches on its own
//! 3. `GET /` - confirms a `/ping` hit by looking for the product name
//!
//! Network and parse errors never escape a probe; they only decide the
//! outcome of the stage they happened in.

use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::net::Ipv4Addr;
use std::time::Duration;
use tltb_core::DeviceRecord;
use tracing::{debug, trace};

use crate::error::DiscoveryError;

/// HTTP port of the device web server
pub const DEVICE_PORT: u16 = 80;

/// Value of the `device` field in a `/discover` reply
pub const DEVICE_ID: &str = "TLTB-Mini";

/// Text the device's root page always contains
pub const PAGE_MARKER: &str = "TLTB Mini";

/// Exact body of a `/ping` reply
pub const PING_REPLY: &str = "pong";

/// Probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Port the device web server listens on
    pub port: u16,
    /// Timeout for `GET /discover` in milliseconds
    pub discover_timeout_ms: u64,
    /// Timeout for `GET /ping` in milliseconds
    pub ping_timeout_ms: u64,
    /// Timeout for `GET /` in milliseconds
    pub root_timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            port: DEVICE_PORT,
            discover_timeout_ms: 2000,
            ping_timeout_ms: 1000,
            root_timeout_ms: 2000,
        }
    }
}

/// Something that can decide whether a TLTB Mini lives at an address
pub trait Probe: Send + Sync + 'static {
    /// Identify the device at `ip`, or `None` if there is none
    fn probe(&self, ip: Ipv4Addr) -> impl Future<Output = Option<DeviceRecord>> + Send;
}

/// One step of the identification waterfall
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Discover,
    Ping,
    RootPage,
}

impl Stage {
    /// Stages in the order they are attempted
    pub const ORDER: [Stage; 3] = [Stage::Discover, Stage::Ping, Stage::RootPage];

    pub fn path(&self) -> &'static str {
        match self {
            Stage::Discover => "/discover",
            Stage::Ping => "/ping",
            Stage::RootPage => "/",
        }
    }

    fn timeout(&self, config: &ProbeConfig) -> Duration {
        let ms = match self {
            Stage::Discover => config.discover_timeout_ms,
            Stage::Ping => config.ping_timeout_ms,
            Stage::RootPage => config.root_timeout_ms,
        };
        Duration::from_millis(ms)
    }
}

/// Result of a single stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// Device identified, stop here
    Matched(DeviceRecord),
    /// Nothing conclusive, try the next stage
    Inconclusive,
    /// Not a TLTB Mini, stop without a result
    Rejected,
}

/// `/discover` reply body
#[derive(Debug, Deserialize)]
struct DiscoverRsp {
    #[serde(default)]
    device: Option<String>,
    #[serde(default)]
    hostname: Option<String>,
    #[serde(default)]
    mac: Option<String>,
    #[serde(default)]
    ap_ssid: Option<String>,
}

/// Probe that talks to the device web server over HTTP
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
    config: ProbeConfig,
}

impl HttpProbe {
    pub fn new(config: ProbeConfig) -> Result<Self, DiscoveryError> {
        // Devices are on the LAN; never route probes through a proxy
        let client = Client::builder().no_proxy().build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Run the stages in order until one is conclusive
    pub async fn identify(&self, ip: Ipv4Addr) -> Option<DeviceRecord> {
        for stage in Stage::ORDER {
            match self.run_stage(ip, stage).await {
                StageOutcome::Matched(record) => {
                    debug!(ip = %ip, stage = ?stage, "Identified TLTB Mini");
                    return Some(record);
                }
                StageOutcome::Rejected => {
                    trace!(ip = %ip, stage = ?stage, "Host rejected");
                    return None;
                }
                StageOutcome::Inconclusive => {}
            }
        }
        None
    }

    /// Run a single stage against `ip`
    pub async fn run_stage(&self, ip: Ipv4Addr, stage: Stage) -> StageOutcome {
        let response = match self.get(ip, stage).await {
            Ok(response) => response,
            Err(e) => {
                trace!(ip = %ip, stage = ?stage, error = %e, "Request failed");
                return match stage {
                    Stage::Discover => StageOutcome::Inconclusive,
                    Stage::Ping | Stage::RootPage => StageOutcome::Rejected,
                };
            }
        };

        match stage {
            Stage::Discover => check_discover(ip, response).await,
            Stage::Ping => check_ping(ip, response).await,
            Stage::RootPage => check_root_page(ip, response).await,
        }
    }

    async fn get(&self, ip: Ipv4Addr, stage: Stage) -> Result<Response, reqwest::Error> {
        let url = format!("http://{}:{}{}", ip, self.config.port, stage.path());
        self.client
            .get(&url)
            .timeout(stage.timeout(&self.config))
            .send()
            .await
    }
}

impl Probe for HttpProbe {
    async fn probe(&self, ip: Ipv4Addr) -> Option<DeviceRecord> {
        self.identify(ip).await
    }
}

async fn check_discover(ip: Ipv4Addr, response: Response) -> StageOutcome {
    if response.status() != StatusCode::OK {
        trace!(ip = %ip, status = %response.status(), "Discover endpoint not available");
        return StageOutcome::Inconclusive;
    }

    let body: DiscoverRsp = match response.json().await {
        Ok(body) => body,
        Err(e) => {
            trace!(ip = %ip, error = %e, "Discover reply is not valid JSON");
            return StageOutcome::Inconclusive;
        }
    };

    if body.device.as_deref() != Some(DEVICE_ID) {
        trace!(ip = %ip, device = ?body.device, "Discover reply is from another device");
        return StageOutcome::Inconclusive;
    }

    StageOutcome::Matched(DeviceRecord {
        address: ip,
        hostname: body.hostname.unwrap_or_default(),
        hardware_id: body.mac.unwrap_or_default(),
        access_point_name: body.ap_ssid.unwrap_or_default(),
    })
}

async fn check_ping(ip: Ipv4Addr, response: Response) -> StageOutcome {
    if response.status() != StatusCode::OK {
        return StageOutcome::Rejected;
    }
    match response.text().await {
        // Liveness only, the root page still has to confirm
        Ok(body) if body == PING_REPLY => {
            trace!(ip = %ip, "Ping answered, checking root page");
            StageOutcome::Inconclusive
        }
        _ => StageOutcome::Rejected,
    }
}

async fn check_root_page(ip: Ipv4Addr, response: Response) -> StageOutcome {
    match response.text().await {
        Ok(body) if body.contains(PAGE_MARKER) => {
            StageOutcome::Matched(DeviceRecord::address_only(ip))
        }
        _ => StageOutcome::Rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock;
    use axum::response::Html;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const LOCALHOST: Ipv4Addr = Ipv4Addr::LOCALHOST;

    fn probe_for(port: u16) -> HttpProbe {
        HttpProbe::new(ProbeConfig {
            port,
            discover_timeout_ms: 300,
            ping_timeout_ms: 300,
            root_timeout_ms: 300,
        })
        .unwrap()
    }

    fn mismatched_discover() -> Router {
        Router::new().route(
            "/discover",
            get(|| async { Json(json!({"device": "Other-Thing", "hostname": "x"})) }),
        )
    }

    #[test]
    fn test_stage_order() {
        assert_eq!(Stage::ORDER, [Stage::Discover, Stage::Ping, Stage::RootPage]);
        assert_eq!(Stage::Discover.path(), "/discover");
        assert_eq!(Stage::Ping.path(), "/ping");
        assert_eq!(Stage::RootPage.path(), "/");
    }

    #[test]
    fn test_default_timeouts() {
        let config = ProbeConfig::default();
        assert_eq!(config.port, 80);
        assert_eq!(Stage::Discover.timeout(&config), Duration::from_secs(2));
        assert_eq!(Stage::Ping.timeout(&config), Duration::from_secs(1));
        assert_eq!(Stage::RootPage.timeout(&config), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_discover_match() {
        let app = Router::new().route(
            "/discover",
            get(|| async {
                Json(json!({
                    "device": "TLTB-Mini",
                    "hostname": "h1",
                    "mac": "AA:BB",
                    "ap_ssid": "ap1"
                }))
            }),
        );
        let addr = mock::serve(app).await;

        let record = probe_for(addr.port()).probe(LOCALHOST).await.unwrap();
        assert_eq!(
            record,
            DeviceRecord {
                address: LOCALHOST,
                hostname: "h1".to_string(),
                hardware_id: "AA:BB".to_string(),
                access_point_name: "ap1".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_discover_missing_fields_default_to_empty() {
        let app = Router::new().route(
            "/discover",
            get(|| async { Json(json!({"device": "TLTB-Mini", "hostname": "dev1", "mac": null})) }),
        );
        let addr = mock::serve(app).await;

        let record = probe_for(addr.port()).probe(LOCALHOST).await.unwrap();
        assert_eq!(record.hostname, "dev1");
        assert_eq!(record.hardware_id, "");
        assert_eq!(record.access_point_name, "");
    }

    #[tokio::test]
    async fn test_discover_match_skips_other_stages() {
        let pings = Arc::new(AtomicUsize::new(0));
        let counter = pings.clone();
        let app = Router::new()
            .route("/discover", get(|| async { Json(json!({"device": "TLTB-Mini"})) }))
            .route(
                "/ping",
                get(move || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        "pong"
                    }
                }),
            );
        let addr = mock::serve(app).await;

        assert!(probe_for(addr.port()).probe(LOCALHOST).await.is_some());
        assert_eq!(pings.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ping_and_root_page_match() {
        let app = mismatched_discover()
            .route("/ping", get(|| async { "pong" }))
            .route(
                "/",
                get(|| async { Html("<html><h1>TLTB Mini Configuration</h1></html>") }),
            );
        let addr = mock::serve(app).await;

        let record = probe_for(addr.port()).probe(LOCALHOST).await.unwrap();
        assert_eq!(record, DeviceRecord::address_only(LOCALHOST));
    }

    #[tokio::test]
    async fn test_ping_without_root_page_marker() {
        let app = mismatched_discover()
            .route("/ping", get(|| async { "pong" }))
            .route("/", get(|| async { Html("<html><h1>Some Router</h1></html>") }));
        let addr = mock::serve(app).await;

        assert_eq!(probe_for(addr.port()).probe(LOCALHOST).await, None);
    }

    #[tokio::test]
    async fn test_root_page_marker_is_case_sensitive() {
        let app = mismatched_discover()
            .route("/ping", get(|| async { "pong" }))
            .route("/", get(|| async { Html("<h1>tltb mini</h1>") }));
        let addr = mock::serve(app).await;

        assert_eq!(probe_for(addr.port()).probe(LOCALHOST).await, None);
    }

    #[tokio::test]
    async fn test_wrong_ping_never_checks_root_page() {
        let root_hits = Arc::new(AtomicUsize::new(0));
        let counter = root_hits.clone();
        let app = mismatched_discover()
            .route("/ping", get(|| async { "pong\n" }))
            .route(
                "/",
                get(move || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Html("<h1>TLTB Mini</h1>")
                    }
                }),
            );
        let addr = mock::serve(app).await;

        assert_eq!(probe_for(addr.port()).probe(LOCALHOST).await, None);
        assert_eq!(root_hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_discover_json_falls_through() {
        let app = Router::new()
            .route("/discover", get(|| async { "not json" }))
            .route("/ping", get(|| async { "pong" }))
            .route("/", get(|| async { Html("TLTB Mini") }));
        let addr = mock::serve(app).await;

        let probe = probe_for(addr.port());
        assert_eq!(
            probe.run_stage(LOCALHOST, Stage::Discover).await,
            StageOutcome::Inconclusive
        );
        assert_eq!(
            probe.probe(LOCALHOST).await,
            Some(DeviceRecord::address_only(LOCALHOST))
        );
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let port = mock::closed_port().await;
        let probe = probe_for(port);

        assert_eq!(
            probe.run_stage(LOCALHOST, Stage::Discover).await,
            StageOutcome::Inconclusive
        );
        assert_eq!(
            probe.run_stage(LOCALHOST, Stage::Ping).await,
            StageOutcome::Rejected
        );
        assert_eq!(probe.probe(LOCALHOST).await, None);
    }

    #[tokio::test]
    async fn test_stalled_server_times_out() {
        let app = Router::new()
            .route(
                "/discover",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Json(json!({"device": "TLTB-Mini"}))
                }),
            )
            .route(
                "/ping",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "pong"
                }),
            );
        let addr = mock::serve(app).await;

        let started = std::time::Instant::now();
        assert_eq!(probe_for(addr.port()).probe(LOCALHOST).await, None);
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_non_200_discover_is_inconclusive() {
        let app = Router::new().route(
            "/discover",
            get(|| async {
                (
                    axum::http::StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({"device": "TLTB-Mini"})),
                )
            }),
        );
        let addr = mock::serve(app).await;

        assert_eq!(
            probe_for(addr.port()).run_stage(LOCALHOST, Stage::Discover).await,
            StageOutcome::Inconclusive
        );
    }
}
