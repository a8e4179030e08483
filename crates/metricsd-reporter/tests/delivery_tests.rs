//! End-to-end delivery tests.
//!
//! Each test starts the collector front ends on loopback and drives a
//! [`Reporter`] against them over real sockets.

#![allow(clippy::unwrap_used)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use metricsd_core::UpdatePipeline;
use metricsd_crypto::{Decryptor, Encryptor, Signer};
use metricsd_reporter::{HttpTransport, Reporter, ReporterError, RpcTransport, Transport};
use metricsd_server::AppState;
use metricsd_types::{MetricKind, MetricValue};
use rsa::rand_core::OsRng;
use rsa::{RsaPrivateKey, RsaPublicKey};
use tokio::sync::watch;

/// A collector HTTP listener on an ephemeral loopback port.
struct Collector {
    address: String,
    pipeline: UpdatePipeline,
    _shutdown: watch::Sender<bool>,
}

async fn start_http(state: AppState) -> Collector {
    let pipeline = state.pipeline.clone();
    let listener = metricsd_server::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(metricsd_server::serve_http(
        listener,
        Arc::new(state),
        shutdown_rx,
    ));
    Collector {
        address,
        pipeline,
        _shutdown: shutdown_tx,
    }
}

async fn reporter_for(collector: &Collector, signer: Signer, encryptor: Option<Encryptor>) -> Reporter {
    let transport = HttpTransport::new(&collector.address, encryptor).await;
    Reporter::new(signer, Transport::Http(transport))
}

async fn poll_count(pipeline: &UpdatePipeline) -> Option<MetricValue> {
    pipeline.value(MetricKind::Counter, "PollCount").await.ok()
}

#[tokio::test]
async fn http_report_delivers_and_resets_poll_count() {
    let collector = start_http(AppState::new(UpdatePipeline::in_memory(Signer::disabled()))).await;
    let mut reporter = reporter_for(&collector, Signer::disabled(), None).await;

    for _ in 0..3 {
        reporter.poll();
    }
    reporter.report().await.unwrap();
    assert_eq!(reporter.sampler().poll_count(), 0);
    assert_eq!(poll_count(&collector.pipeline).await, Some(MetricValue::Counter(3)));
    assert!(
        collector
            .pipeline
            .value(MetricKind::Gauge, "RandomValue")
            .await
            .is_ok()
    );

    reporter.poll();
    reporter.report().await.unwrap();
    assert_eq!(poll_count(&collector.pipeline).await, Some(MetricValue::Counter(4)));
}

#[tokio::test]
async fn signed_and_encrypted_batch_passes_every_check() {
    let private = RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
    let encryptor = Encryptor::new(RsaPublicKey::from(&private)).unwrap();
    let state = AppState::new(UpdatePipeline::in_memory(Signer::new(Some("secret"))))
        .with_decryptor(Some(Decryptor::new(private).unwrap()))
        .with_trusted_subnet(Some("127.0.0.0/8".parse().unwrap()));
    let collector = start_http(state).await;

    let mut reporter = reporter_for(&collector, Signer::new(Some("secret")), Some(encryptor)).await;
    reporter.poll();
    reporter.report().await.unwrap();
    assert_eq!(poll_count(&collector.pipeline).await, Some(MetricValue::Counter(1)));
}

#[tokio::test]
async fn loopback_reporter_announces_loopback_source() {
    let collector = start_http(AppState::new(UpdatePipeline::in_memory(Signer::disabled()))).await;
    let transport = HttpTransport::new(&collector.address, None).await;
    assert_eq!(transport.real_ip(), Some(IpAddr::V4(Ipv4Addr::LOCALHOST)));
}

#[tokio::test]
async fn rejected_batch_keeps_the_pending_delta() {
    let collector =
        start_http(AppState::new(UpdatePipeline::in_memory(Signer::new(Some("secret"))))).await;
    let mut reporter = reporter_for(&collector, Signer::new(Some("other")), None).await;

    reporter.poll();
    reporter.poll();
    let err = reporter.report().await.unwrap_err();
    assert!(matches!(err, ReporterError::Rejected(_)));
    assert_eq!(reporter.sampler().poll_count(), 2);
    assert_eq!(poll_count(&collector.pipeline).await, None);
}

#[tokio::test]
async fn outside_trusted_subnet_is_rejected() {
    let state = AppState::new(UpdatePipeline::in_memory(Signer::disabled()))
        .with_trusted_subnet(Some("10.0.0.0/8".parse().unwrap()));
    let collector = start_http(state).await;
    let mut reporter = reporter_for(&collector, Signer::disabled(), None).await;

    reporter.poll();
    let err = reporter.report().await.unwrap_err();
    assert!(matches!(err, ReporterError::Rejected(ref msg) if msg.contains("403")));
}

#[tokio::test]
async fn rpc_report_reaches_the_shared_store() {
    // Reserve a free port, then hand it to the RPC listener.
    let reserved = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = reserved.local_addr().unwrap().to_string();
    drop(reserved);

    let pipeline = UpdatePipeline::in_memory(Signer::new(Some("secret")));
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    {
        let address = address.clone();
        let pipeline = pipeline.clone();
        tokio::spawn(async move { metricsd_server::serve_rpc(&address, pipeline, shutdown_rx).await });
    }

    let mut transport = None;
    for _ in 0..50 {
        if let Ok(t) = RpcTransport::connect(&address).await {
            transport = Some(t);
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let mut reporter = Reporter::new(
        Signer::new(Some("secret")),
        Transport::Rpc(transport.unwrap()),
    );

    reporter.poll();
    reporter.poll();
    reporter.report().await.unwrap();
    assert_eq!(poll_count(&pipeline).await, Some(MetricValue::Counter(2)));
    assert_eq!(reporter.sampler().poll_count(), 0);
}

#[tokio::test]
async fn run_loop_stops_on_shutdown() {
    let collector = start_http(AppState::new(UpdatePipeline::in_memory(Signer::disabled()))).await;
    let reporter = reporter_for(&collector, Signer::disabled(), None).await;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(reporter.run(
        Duration::from_millis(10),
        Duration::from_millis(50),
        shutdown_rx,
    ));

    let mut delivered = false;
    for _ in 0..100 {
        if poll_count(&collector.pipeline).await.is_some() {
            delivered = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(delivered);

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .unwrap()
        .unwrap();
}
