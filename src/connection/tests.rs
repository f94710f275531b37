//! Integration tests for the connection layer.
//!
//! These run against the simulator, which exercises the real decode path
//! (writer → bundle unpacker → record reader → assembler) without hardware.

use super::sim::SimConnection;
use crate::types::{ChannelView, LinkStatus, UpdateRate};
use futures::StreamExt;

#[tokio::test(flavor = "multi_thread")]
async fn native_subscription_yields_well_shaped_samples() {
    let connection = SimConnection::seeded(ChannelView::DataQuaternion, 200.0, 11)
        .await
        .expect("simulator should start");

    let samples: Vec<_> = connection.subscribe(UpdateRate::Native).take(10).collect().await;

    assert_eq!(samples.len(), 10);
    for sample in &samples {
        assert_eq!(sample.values.len(), ChannelView::DataQuaternion.element_count());
        assert_eq!(sample.row().len(), 16);
        assert!(!sample.synthetic);
    }

    // Timestamps advance monotonically at the source cadence.
    assert!(samples.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[tokio::test(flavor = "multi_thread")]
async fn capped_subscription_thins_the_stream() {
    let connection = SimConnection::seeded(ChannelView::Accelerometer, 400.0, 11)
        .await
        .expect("simulator should start");

    let capped: Vec<_> = connection.subscribe(UpdateRate::Max(50)).take(5).collect().await;

    assert_eq!(capped.len(), 5);
    // Latest-wins thinning keeps order and shape.
    assert!(capped.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    for sample in &capped {
        assert_eq!(sample.values.len(), 3);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn status_reports_live_while_samples_flow() {
    let connection = SimConnection::seeded(ChannelView::Quaternion, 200.0, 11)
        .await
        .expect("simulator should start");

    let status = connection.status_updates().boxed().next().await;
    assert_eq!(status, Some(LinkStatus::Live));
    assert_eq!(connection.current_status(), Some(LinkStatus::Live));
}

#[tokio::test(flavor = "multi_thread")]
async fn two_subscribers_see_the_same_data() {
    let connection = SimConnection::seeded(ChannelView::Barometer, 200.0, 11)
        .await
        .expect("simulator should start");

    let mut a = connection.subscribe(UpdateRate::Native).boxed();
    let mut b = connection.subscribe(UpdateRate::Native).boxed();

    let sample_a = a.next().await.expect("subscriber a should see samples");
    let sample_b = b.next().await.expect("subscriber b should see samples");

    // Watch semantics: both see the current sample, width always 2 for bar.
    assert_eq!(sample_a.width(), 2);
    assert_eq!(sample_b.width(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn dropping_the_connection_ends_subscriptions() {
    let connection = SimConnection::seeded(ChannelView::Data, 200.0, 11)
        .await
        .expect("simulator should start");

    let mut stream = connection.subscribe(UpdateRate::Native).boxed();
    let _ = stream.next().await.expect("stream should be live");

    drop(connection);

    // After cancellation the reader task stops publishing; the stream ends
    // once the watch sender is gone.
    loop {
        match tokio::time::timeout(std::time::Duration::from_secs(5), stream.next()).await {
            Ok(None) => break,
            Ok(Some(_)) => continue,
            Err(_) => panic!("stream did not end after drop"),
        }
    }
}
