//! Announce endpoint and shared lifecycle behavior.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use boundary_broker::{delivery_queue, lifecycle, AnnounceClient, Boundary, BrokerConfig};
use boundary_core::ChannelId;

fn fast_config() -> BrokerConfig {
    BrokerConfig {
        heartbeat_ms: 50,
        ..BrokerConfig::default()
    }
}

/// Read snapshots until `pred` matches one, bounded by a 10 s deadline.
async fn wait_for(
    client: &mut AnnounceClient,
    pred: impl Fn(&[(String, String)]) -> bool,
) -> Vec<(String, String)> {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let snapshot = client.next().await.unwrap();
            if pred(&snapshot) {
                return snapshot;
            }
        }
    })
    .await
    .expect("no matching announce snapshot within deadline")
}

#[tokio::test]
async fn fresh_boundary_announces_nothing() {
    let boundary = Boundary::start(fast_config()).await.unwrap();
    let mut sub = AnnounceClient::connect(boundary.announce_address())
        .await
        .unwrap();
    assert_eq!(sub.next().await.unwrap(), Vec::new());
    boundary.shutdown().await;
}

#[tokio::test]
async fn announce_tracks_registration_and_cancel() {
    let boundary = Boundary::start(fast_config()).await.unwrap();
    let mut sub = AnnounceClient::connect(boundary.announce_address())
        .await
        .unwrap();
    wait_for(&mut sub, |s| s.is_empty()).await;

    let channel = ChannelId::from("analysis-a");
    let (queue, _mailbox) = delivery_queue();
    let handle = boundary.register(channel, queue).unwrap();

    let snapshot = wait_for(&mut sub, |s| !s.is_empty()).await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].0, "analysis-a");
    assert_eq!(snapshot[0].1, boundary.request_address());

    handle.cancel();
    wait_for(&mut sub, |s| s.is_empty()).await;
    boundary.shutdown().await;
}

#[tokio::test]
async fn late_subscriber_converges_via_heartbeat() {
    let boundary = Boundary::start(fast_config()).await.unwrap();
    let (queue, _mailbox) = delivery_queue();
    let _handle = boundary
        .register(ChannelId::from("analysis-b"), queue)
        .unwrap();

    // Connect well after the registration changed the registry.
    let mut sub = AnnounceClient::connect(boundary.announce_address())
        .await
        .unwrap();
    let snapshot = wait_for(&mut sub, |s| !s.is_empty()).await;
    assert_eq!(snapshot[0].0, "analysis-b");
    boundary.shutdown().await;
}

#[tokio::test]
async fn shared_lifecycle_is_idempotent() {
    let first = lifecycle::start_shared(fast_config()).await.unwrap();
    let second = lifecycle::start_shared(fast_config()).await.unwrap();
    assert_eq!(first.request_address(), second.request_address());
    assert_eq!(first.announce_address(), second.announce_address());

    lifecycle::shutdown_shared().await;
    // A second shutdown is a no-op.
    lifecycle::shutdown_shared().await;

    // After an explicit stop, a fresh instance may be started.
    let third = lifecycle::start_shared(fast_config()).await.unwrap();
    let mut sub = AnnounceClient::connect(third.announce_address())
        .await
        .unwrap();
    assert_eq!(sub.next().await.unwrap(), Vec::new());
    lifecycle::shutdown_shared().await;
}
