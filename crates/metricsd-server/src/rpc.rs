//! gRPC front end.
//!
//! One batch call, `Metrics.UpdateMetrics`, applying the first `count`
//! entries through the same [`UpdatePipeline`] as the HTTP routes.
//! Failures are reported in the response's `error` string, never as a
//! gRPC status.

use metricsd_core::UpdatePipeline;
use metricsd_types::{Metric, MetricParseError, MetricValue};
use tokio::sync::watch;
use tonic::transport::Server;
use tonic::{Request, Response, Status};
use tracing::info;

use crate::proto::metric::MType;
use crate::proto::metrics_server::{Metrics, MetricsServer};
use crate::proto::{self, UpdateMetricsRequest, UpdateMetricsResponse};
use crate::server::{ServerError, shutdown_requested};

/// Convert a protobuf metric into the domain model.
pub fn from_proto(metric: proto::Metric) -> Result<Metric, MetricParseError> {
    let kind =
        MType::try_from(metric.mtype).map_err(|_| MetricParseError::UnknownKind(metric.mtype.to_string()))?;
    if metric.id.is_empty() {
        return Err(MetricParseError::EmptyName);
    }
    let value = match kind {
        MType::Gauge if !metric.value.is_finite() => {
            return Err(MetricParseError::BadValue(metric.value.to_string()));
        }
        MType::Gauge => MetricValue::Gauge(metric.value),
        MType::Counter => MetricValue::Counter(metric.delta),
    };
    Ok(Metric {
        name: metric.id,
        value,
        tag: Some(metric.hash).filter(|h| !h.is_empty()),
    })
}

/// Convert a domain metric into its protobuf form.
pub fn to_proto(metric: &Metric) -> proto::Metric {
    let (mtype, delta, value) = match metric.value {
        MetricValue::Gauge(v) => (MType::Gauge, 0, v),
        MetricValue::Counter(d) => (MType::Counter, d, 0.0),
    };
    proto::Metric {
        id: metric.name.clone(),
        mtype: mtype.into(),
        delta,
        value,
        hash: metric.tag.clone().unwrap_or_default(),
    }
}

/// Implementation of the `Metrics` gRPC service.
#[derive(Debug, Clone)]
pub struct MetricsService {
    pipeline: UpdatePipeline,
}

impl MetricsService {
    /// Serve updates through `pipeline`.
    pub const fn new(pipeline: UpdatePipeline) -> Self {
        Self { pipeline }
    }

    async fn apply(&self, request: UpdateMetricsRequest) -> Result<(), String> {
        let count = usize::try_from(request.count)
            .map_err(|_| format!("negative count {}", request.count))?;
        if count > request.metrics.len() {
            return Err(format!(
                "count {count} exceeds the {} metrics supplied",
                request.metrics.len()
            ));
        }
        let metrics = request
            .metrics
            .into_iter()
            .take(count)
            .map(from_proto)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.to_string())?;
        self.pipeline
            .apply_batch(metrics)
            .await
            .map_err(|e| e.to_string())
    }
}

#[tonic::async_trait]
impl Metrics for MetricsService {
    async fn update_metrics(
        &self,
        request: Request<UpdateMetricsRequest>,
    ) -> Result<Response<UpdateMetricsResponse>, Status> {
        let request = request.into_inner();
        tracing::debug!(count = request.count, "RPC update");
        let error = match self.apply(request).await {
            Ok(()) => String::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Rejected RPC update");
                e
            }
        };
        Ok(Response::new(UpdateMetricsResponse { error }))
    }
}

/// Serve the gRPC front end on `addr` until shutdown is requested.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if `addr` does not resolve, or
/// [`ServerError::Serve`] if the transport fails.
pub async fn serve_rpc(
    addr: &str,
    pipeline: UpdatePipeline,
    shutdown: watch::Receiver<bool>,
) -> Result<(), ServerError> {
    let socket = tokio::net::lookup_host(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("cannot resolve {addr}: {e}")))?
        .next()
        .ok_or_else(|| ServerError::Bind(format!("{addr} resolved to no address")))?;

    info!(addr = %socket, "gRPC server listening");

    Server::builder()
        .add_service(MetricsServer::new(MetricsService::new(pipeline)))
        .serve_with_shutdown(socket, shutdown_requested(shutdown))
        .await
        .map_err(|e| ServerError::Serve(format!("gRPC server error: {e}")))?;

    info!("gRPC server stopped");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn proto_conversion_keeps_payload_and_tag() {
        let mut metric = Metric::counter("PollCount", 5);
        metric.tag = Some("ab".to_owned());
        assert_eq!(from_proto(to_proto(&metric)).unwrap(), metric);

        let gauge = Metric::gauge("Alloc", 2.5);
        assert_eq!(from_proto(to_proto(&gauge)).unwrap(), gauge);
    }

    #[test]
    fn unknown_type_and_empty_id_are_rejected() {
        let mut raw = to_proto(&Metric::gauge("Alloc", 1.0));
        raw.mtype = 7;
        assert_eq!(
            from_proto(raw),
            Err(MetricParseError::UnknownKind("7".to_owned()))
        );

        let raw = to_proto(&Metric::gauge("", 1.0));
        assert_eq!(from_proto(raw), Err(MetricParseError::EmptyName));
    }
}
