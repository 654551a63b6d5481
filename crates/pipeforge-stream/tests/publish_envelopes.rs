use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use pipeforge_core::{Envelope, PaymentPayload, PaymentStatus};
use pipeforge_stream::{EventPublisher, FlushPolicy, MemorySink, PublishError};

fn envelope(n: u32) -> Envelope {
    Envelope::new(
        format!("payment-order-{n:03}"),
        PaymentPayload {
            order_id: format!("order-{n:03}"),
            user_id: format!("user-{n}"),
            amount: 99.99,
            currency: "USD".to_string(),
            status: PaymentStatus::Active,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            product_id: None,
        },
    )
}

#[tokio::test]
async fn published_value_is_stamped() {
    let mut publisher = EventPublisher::new(MemorySink::new(), FlushPolicy::PerMessage);
    let before = Utc::now();
    publisher.publish(envelope(1)).await.expect("publish");
    let sink = publisher.close().await.expect("close");

    let record = &sink.delivered[0];
    assert_eq!(record.key, "payment-order-001");

    let value: Value = serde_json::from_str(&record.payload).expect("json value");
    assert_eq!(value["metadata"], serde_json::json!({}));
    let timestamp: DateTime<Utc> = value["timestamp"]
        .as_str()
        .expect("timestamp string")
        .parse()
        .expect("rfc3339 timestamp");
    assert!(timestamp >= before);
    assert!(value["timestamp"].as_str().is_some_and(|t| t.ends_with('Z')));
}

#[tokio::test]
async fn per_message_policy_flushes_each_send() {
    let mut publisher = EventPublisher::new(MemorySink::new(), FlushPolicy::PerMessage);
    for n in 1..=3 {
        publisher.publish(envelope(n)).await.expect("publish");
        assert!(publisher.sink().buffered.is_empty());
    }
    assert_eq!(publisher.sink().flushes, 3);
}

#[tokio::test]
async fn batch_policy_flushes_every_n_and_on_close() {
    let mut publisher = EventPublisher::new(MemorySink::new(), FlushPolicy::Batch(2));
    for n in 1..=5 {
        publisher.publish(envelope(n)).await.expect("publish");
    }
    assert_eq!(publisher.sink().flushes, 2);
    assert_eq!(publisher.sink().delivered.len(), 4);
    assert_eq!(publisher.sink().buffered.len(), 1);

    let sink = publisher.close().await.expect("close");
    assert_eq!(sink.flushes, 3);
    let keys: Vec<&str> = sink.delivered.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(
        keys,
        [
            "payment-order-001",
            "payment-order-002",
            "payment-order-003",
            "payment-order-004",
            "payment-order-005"
        ]
    );
}

#[tokio::test]
async fn empty_ids_are_rejected_before_sending() {
    let mut publisher = EventPublisher::new(MemorySink::new(), FlushPolicy::PerMessage);
    let mut bad = envelope(1);
    bad.id.clear();

    let err = publisher.publish(bad).await.expect_err("empty id");
    assert!(matches!(err, PublishError::InvalidEnvelope(_)));
    assert_eq!(publisher.published(), 0);
}

#[tokio::test]
async fn transport_errors_propagate_without_retry() {
    let mut publisher = EventPublisher::new(MemorySink::failing_after(1), FlushPolicy::PerMessage);
    publisher.publish(envelope(1)).await.expect("first send");

    let err = publisher.publish(envelope(2)).await.expect_err("broker down");
    assert!(matches!(err, PublishError::Transport(_)));
    assert_eq!(publisher.published(), 1);
    assert_eq!(publisher.sink().delivered.len(), 1);
}
