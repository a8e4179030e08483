//! Tests for the gRPC front end.
//!
//! The service trait method is called directly; no transport is started.

#![allow(clippy::unwrap_used)]

use metricsd_core::UpdatePipeline;
use metricsd_crypto::Signer;
use metricsd_server::proto::metrics_server::Metrics;
use metricsd_server::proto::{UpdateMetricsRequest, UpdateMetricsResponse};
use metricsd_server::rpc::{MetricsService, to_proto};
use metricsd_types::{Metric, MetricKind, MetricValue};
use tonic::Request;

async fn call(service: &MetricsService, count: i32, metrics: &[Metric]) -> UpdateMetricsResponse {
    let request = UpdateMetricsRequest {
        count,
        metrics: metrics.iter().map(to_proto).collect(),
    };
    service
        .update_metrics(Request::new(request))
        .await
        .unwrap()
        .into_inner()
}

#[tokio::test]
async fn batch_is_applied_to_the_shared_store() {
    let pipeline = UpdatePipeline::in_memory(Signer::disabled());
    let service = MetricsService::new(pipeline.clone());

    let metrics = [
        Metric::counter("PollCount", 2),
        Metric::counter("PollCount", 3),
        Metric::gauge("Alloc", 2_128_506.0),
    ];
    let response = call(&service, 3, &metrics).await;
    assert_eq!(response.error, "");

    assert_eq!(
        pipeline.value(MetricKind::Counter, "PollCount").await,
        Ok(MetricValue::Counter(5))
    );
    assert_eq!(
        pipeline.value(MetricKind::Gauge, "Alloc").await,
        Ok(MetricValue::Gauge(2_128_506.0))
    );
}

#[tokio::test]
async fn only_the_first_count_entries_are_applied() {
    let pipeline = UpdatePipeline::in_memory(Signer::disabled());
    let service = MetricsService::new(pipeline.clone());

    let metrics = [Metric::counter("a", 1), Metric::counter("b", 1)];
    let response = call(&service, 1, &metrics).await;
    assert_eq!(response.error, "");
    assert!(pipeline.value(MetricKind::Counter, "b").await.is_err());
}

#[tokio::test]
async fn count_beyond_supplied_metrics_is_an_error() {
    let pipeline = UpdatePipeline::in_memory(Signer::disabled());
    let service = MetricsService::new(pipeline.clone());

    let response = call(&service, 2, &[Metric::counter("a", 1)]).await;
    assert!(!response.error.is_empty());
    assert!(pipeline.store().snapshot().await.is_empty());
}

#[tokio::test]
async fn unsigned_metric_is_rejected_when_keyed() {
    let signer = Signer::new(Some("secret"));
    let pipeline = UpdatePipeline::in_memory(signer.clone());
    let service = MetricsService::new(pipeline.clone());

    let mut good = Metric::counter("PollCount", 1);
    signer.sign(&mut good).unwrap();
    let bad = Metric::counter("Forged", 1);

    let response = call(&service, 2, &[good.clone(), bad]).await;
    assert!(response.error.contains("authentication"));
    assert!(pipeline.store().snapshot().await.is_empty());

    let response = call(&service, 1, &[good]).await;
    assert_eq!(response.error, "");
}
