//! Delivery of signed batches to the collector.
//!
//! Enum dispatch over the two front ends:
//!
//! - [`HttpTransport`] posts the batch as a JSON array to `/updates/`,
//!   optionally sealed with the collector's public key, and announces its
//!   own address in `X-Real-IP` for the trusted-subnet filter.
//! - [`RpcTransport`] sends the batch through `Metrics.UpdateMetrics`.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use metricsd_crypto::Encryptor;
use metricsd_server::middleware::REAL_IP_HEADER;
use metricsd_server::proto::UpdateMetricsRequest;
use metricsd_server::proto::metrics_client::MetricsClient;
use metricsd_server::rpc::to_proto;
use metricsd_types::{Metric, MetricJson};
use tokio::net::UdpSocket;
use tonic::transport::Channel;

use crate::error::ReporterError;

/// A way of delivering a batch.
#[derive(Debug)]
pub enum Transport {
    /// JSON over HTTP.
    Http(HttpTransport),
    /// Protobuf over gRPC.
    Rpc(RpcTransport),
}

impl Transport {
    /// Send `metrics` as one batch.
    ///
    /// # Errors
    ///
    /// Returns [`ReporterError`] if the batch cannot be encoded, delivered,
    /// or is refused by the collector.
    pub async fn send(&mut self, metrics: &[Metric]) -> Result<(), ReporterError> {
        match self {
            Self::Http(transport) => transport.send(metrics).await,
            Self::Rpc(transport) => transport.send(metrics).await,
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Rpc(_) => "grpc",
        }
    }
}

/// Prefix `address` with `http://` unless it already names a scheme.
fn with_scheme(address: &str) -> String {
    if address.starts_with("http://") || address.starts_with("https://") {
        address.trim_end_matches('/').to_owned()
    } else {
        format!("http://{}", address.trim_end_matches('/'))
    }
}

/// The `host:port` part of a URL built by [`with_scheme`].
fn authority(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.split('/').next().unwrap_or(rest)
}

/// The local address the OS would use to reach `target` (`host:port`).
///
/// Connecting a UDP socket sends nothing; it only selects a route.
pub async fn local_ip_toward(target: &str) -> Option<IpAddr> {
    let remote = tokio::net::lookup_host(target).await.ok()?.next()?;
    let local: SocketAddr = if remote.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };
    let socket = UdpSocket::bind(local).await.ok()?;
    socket.connect(remote).await.ok()?;
    socket.local_addr().ok().map(|addr| addr.ip())
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// Posts batches to `{address}/updates/`.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    encryptor: Option<Encryptor>,
    real_ip: Option<IpAddr>,
}

impl HttpTransport {
    /// Target the collector at `address` (`host:port` or a full URL).
    ///
    /// The source address for `X-Real-IP` is resolved once here.
    pub async fn new(address: &str, encryptor: Option<Encryptor>) -> Self {
        let base = with_scheme(address);
        let real_ip = local_ip_toward(authority(&base)).await;
        if real_ip.is_none() {
            tracing::warn!(address, "Could not determine local address; X-Real-IP omitted");
        }
        Self {
            client: reqwest::Client::new(),
            url: format!("{base}/updates/"),
            encryptor,
            real_ip,
        }
    }

    /// The `X-Real-IP` value sent with every batch.
    pub const fn real_ip(&self) -> Option<IpAddr> {
        self.real_ip
    }

    async fn send(&self, metrics: &[Metric]) -> Result<(), ReporterError> {
        let wire: Vec<MetricJson> = metrics.iter().map(MetricJson::from).collect();
        let mut body = serde_json::to_vec(&wire)?;
        if let Some(encryptor) = &self.encryptor {
            body = encryptor.encrypt(&body)?;
        }

        let mut request = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(ip) = self.real_ip {
            request = request.header(REAL_IP_HEADER, ip.to_string());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(ReporterError::Rejected(format!(
                "collector returned {status}: {error_body}"
            )));
        }
        tracing::debug!(url = %self.url, count = metrics.len(), "Batch delivered");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// gRPC
// ---------------------------------------------------------------------------

/// Sends batches through the collector's RPC listener.
#[derive(Debug)]
pub struct RpcTransport {
    client: MetricsClient<Channel>,
}

impl RpcTransport {
    /// Connect to the collector's RPC listener at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`ReporterError::Transport`] if the channel cannot be opened.
    pub async fn connect(address: &str) -> Result<Self, ReporterError> {
        let client = MetricsClient::connect(with_scheme(address)).await?;
        Ok(Self { client })
    }

    async fn send(&mut self, metrics: &[Metric]) -> Result<(), ReporterError> {
        let count = i32::try_from(metrics.len())
            .map_err(|_| ReporterError::Rpc(format!("batch of {} is too large", metrics.len())))?;
        let request = UpdateMetricsRequest {
            count,
            metrics: metrics.iter().map(to_proto).collect(),
        };
        let response = self
            .client
            .update_metrics(request)
            .await
            .map_err(|status| ReporterError::Rpc(status.to_string()))?
            .into_inner();
        if !response.error.is_empty() {
            return Err(ReporterError::Rejected(response.error));
        }
        tracing::debug!(count, "Batch delivered over RPC");
        Ok(())
    }
}
