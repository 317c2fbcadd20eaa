// tests for submit and poll

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chatguard::{Error, NewMessage, Relay, RelayConfig, TextClassify, Verdict};
use tokio::sync::Notify;

struct Canned(Result<&'static str, &'static str>);

#[async_trait]
impl TextClassify for Canned {
    async fn classify(&self, _policy: &str, _text: &str) -> Result<String, Error> {
        match self.0 {
            Ok(reply) => Ok(reply.to_string()),
            Err(e) => Err(Error::Classifier(e.to_string())),
        }
    }
}

// holds every classification until released
#[derive(Default)]
struct Gate {
    open: Notify,
}

#[async_trait]
impl TextClassify for Gate {
    async fn classify(&self, _policy: &str, _text: &str) -> Result<String, Error> {
        self.open.notified().await;
        Ok("SAFE".to_string())
    }
}

fn relay(reply: Result<&'static str, &'static str>) -> Relay {
    Relay::new(Arc::new(Canned(reply)), &RelayConfig::default())
}

#[tokio::test]
async fn test_warning_scenario() {
    let relay = relay(Ok("Do not share phone numbers."));

    let receipt = relay
        .submit(NewMessage::new("alice", "my phone is 555-1234"))
        .await
        .unwrap();

    assert_eq!(receipt.message.id, 1);
    assert_eq!(receipt.message.user, "alice");
    assert_eq!(receipt.message.text, "my phone is 555-1234");
    assert_eq!(receipt.verdict, Verdict::warning("Do not share phone numbers."));
}

#[tokio::test]
async fn test_safe_scenario() {
    let relay = relay(Ok("SAFE"));
    let receipt = relay.submit(NewMessage::new("bob", "hello")).await.unwrap();
    assert_eq!(receipt.verdict, Verdict::Safe);
}

#[tokio::test]
async fn test_poll_after_two_submissions() {
    let relay = relay(Ok("SAFE"));
    relay.submit(NewMessage::new("alice", "one")).await.unwrap();
    relay.submit(NewMessage::new("bob", "two")).await.unwrap();

    let page = relay.poll(0);
    let ids: Vec<u64> = page.messages.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(page.cursor, 2);

    let page = relay.poll(2);
    assert!(page.messages.is_empty());
    assert_eq!(page.cursor, 2);
}

#[tokio::test]
async fn test_read_your_writes() {
    let relay = relay(Ok("SAFE"));
    let receipt = relay.submit(NewMessage::new("carol", "hi")).await.unwrap();

    let page = relay.poll(0);
    assert!(page.messages.contains(&receipt.message));
}

#[tokio::test]
async fn test_classifier_failure_keeps_message() {
    let relay = relay(Err("rate limited"));

    let receipt = relay.submit(NewMessage::new("dave", "hello")).await.unwrap();

    assert!(matches!(
        receipt.verdict,
        Verdict::ClassificationFailed { .. }
    ));
    assert_eq!(relay.poll(0).messages, vec![receipt.message]);
}

#[tokio::test]
async fn test_message_visible_before_verdict() {
    let gate = Arc::new(Gate::default());
    let relay = Relay::new(gate.clone(), &RelayConfig::default());

    let pending = relay.accept(NewMessage::new("erin", "hello")).unwrap();

    // stored and pollable while the classifier is still blocked
    let page = relay.poll(0);
    assert_eq!(page.messages, vec![pending.message.clone()]);

    gate.open.notify_one();
    let receipt = pending.finish().await;
    assert_eq!(receipt.verdict, Verdict::Safe);
}

#[tokio::test]
async fn test_verdict_not_written_to_log() {
    let relay = relay(Ok("Careful with addresses."));
    let receipt = relay
        .submit(NewMessage::new("frank", "I live at 1 Main St"))
        .await
        .unwrap();

    // pollers get the plain message back, nothing about the verdict
    let polled = serde_json::to_value(&relay.poll(0).messages[0]).unwrap();
    assert!(polled.get("verdict").is_none());
    assert_eq!(relay.poll(0).messages[0], receipt.message);
}

#[tokio::test]
async fn test_missing_fields_rejected() {
    let relay = relay(Ok("SAFE"));

    let no_user = NewMessage {
        user: None,
        text: Some("hi".to_string()),
    };
    let no_text = NewMessage {
        user: Some("gina".to_string()),
        text: None,
    };

    assert!(matches!(relay.submit(no_user).await, Err(Error::Validation(_))));
    assert!(matches!(relay.submit(no_text).await, Err(Error::Validation(_))));
    assert!(relay.poll(0).messages.is_empty());
}

#[tokio::test]
async fn test_empty_strings_accepted() {
    let relay = relay(Ok("SAFE"));
    let receipt = relay.submit(NewMessage::new("", "")).await.unwrap();
    assert_eq!(receipt.message.id, 1);
}

#[tokio::test]
async fn test_too_large_rejected() {
    let config = RelayConfig {
        max_text_bytes: Some(4),
        ..RelayConfig::default()
    };
    let relay = Relay::new(Arc::new(Canned(Ok("SAFE"))), &config);

    let result = relay.submit(NewMessage::new("hank", "too long")).await;

    assert!(matches!(result, Err(Error::PayloadTooLarge { .. })));
    assert!(relay.poll(0).messages.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions() {
    let relay = relay(Ok("SAFE"));

    let handles: Vec<_> = (0..50)
        .map(|i| {
            let relay = relay.clone();
            tokio::spawn(async move {
                relay
                    .submit(NewMessage::new(format!("u{i}"), "hi"))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        let receipt = handle.await.unwrap();
        assert_eq!(receipt.verdict, Verdict::Safe);
        ids.insert(receipt.message.id);
    }

    assert_eq!(ids, (1..=50).collect::<HashSet<u64>>());
    assert_eq!(relay.poll(0).cursor, 50);
}
