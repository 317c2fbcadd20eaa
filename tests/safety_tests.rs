// tests for message screening

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chatguard::{
    Error, POLICY, RelayConfig, SafetyClassifier, TextClassify, Verdict, parse_reply,
};
use parking_lot::Mutex;

// replies with a fixed string, or fails with a fixed error
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

// remembers what it was asked
#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl TextClassify for Recorder {
    async fn classify(&self, policy: &str, text: &str) -> Result<String, Error> {
        self.calls.lock().push((policy.to_string(), text.to_string()));
        Ok("SAFE".to_string())
    }
}

// fails the first `failures` calls
struct Flaky {
    failures: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl TextClassify for Flaky {
    async fn classify(&self, _policy: &str, _text: &str) -> Result<String, Error> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            Err(Error::Classifier("quota exceeded".to_string()))
        } else {
            Ok("SAFE".to_string())
        }
    }
}

struct Slow(Duration);

#[async_trait]
impl TextClassify for Slow {
    async fn classify(&self, _policy: &str, _text: &str) -> Result<String, Error> {
        tokio::time::sleep(self.0).await;
        Ok("SAFE".to_string())
    }
}

fn classifier(model: impl TextClassify + 'static) -> SafetyClassifier {
    SafetyClassifier::new(Arc::new(model), &RelayConfig::default())
}

#[test]
fn test_parse_safe() {
    assert_eq!(parse_reply("SAFE".to_string()), Verdict::Safe);
    assert_eq!(parse_reply("  SAFE\n".to_string()), Verdict::Safe);
}

#[test]
fn test_parse_anything_else_is_verbatim_warning() {
    assert_eq!(parse_reply("safe".to_string()), Verdict::warning("safe"));
    assert_eq!(
        parse_reply("SAFE, but avoid sharing".to_string()),
        Verdict::warning("SAFE, but avoid sharing")
    );
    assert_eq!(parse_reply(String::new()), Verdict::warning(""));
}

#[test]
fn test_policy_covers_the_duties() {
    assert!(POLICY.contains("personal information"));
    assert!(POLICY.contains("passwords"));
    assert!(POLICY.contains("unsafe sharing"));
    assert!(POLICY.contains("harmful content"));
    assert!(POLICY.contains("\"SAFE\""));
}

#[tokio::test]
async fn test_safe_reply() {
    let verdict = classifier(Canned(Ok("SAFE"))).classify("hello").await;
    assert_eq!(verdict, Verdict::Safe);
    assert!(verdict.is_safe());
}

#[tokio::test]
async fn test_warning_reply() {
    let verdict = classifier(Canned(Ok("Do not share phone numbers.")))
        .classify("my phone is 555-1234")
        .await;
    assert_eq!(verdict, Verdict::warning("Do not share phone numbers."));
}

#[tokio::test]
async fn test_model_error_becomes_failed_verdict() {
    let verdict = classifier(Canned(Err("connection reset")))
        .classify("hello")
        .await;

    match verdict {
        Verdict::ClassificationFailed { reason } => assert!(reason.contains("connection reset")),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_sends_policy_and_text_verbatim() {
    let recorder = Arc::new(Recorder::default());
    let classifier = SafetyClassifier::new(recorder.clone(), &RelayConfig::default());

    classifier.classify("  my card is 4111 ").await;

    let calls = recorder.calls.lock();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, POLICY);
    assert_eq!(calls[0].1, "  my card is 4111 ");
}

#[tokio::test]
async fn test_timeout() {
    let config = RelayConfig {
        classify_timeout: Duration::from_millis(50),
        ..RelayConfig::default()
    };
    let classifier = SafetyClassifier::new(Arc::new(Slow(Duration::from_secs(5))), &config);

    let started = Instant::now();
    let verdict = classifier.classify("hello").await;

    assert_eq!(verdict, Verdict::failed("timeout"));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_no_retry_by_default() {
    let flaky = Arc::new(Flaky {
        failures: 1,
        calls: AtomicUsize::new(0),
    });
    let classifier = SafetyClassifier::new(flaky.clone(), &RelayConfig::default());

    let verdict = classifier.classify("hello").await;

    assert!(matches!(verdict, Verdict::ClassificationFailed { .. }));
    assert_eq!(flaky.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_bounded_retry() {
    let flaky = Arc::new(Flaky {
        failures: 2,
        calls: AtomicUsize::new(0),
    });
    let config = RelayConfig {
        classify_retries: 2,
        ..RelayConfig::default()
    };
    let classifier = SafetyClassifier::new(flaky.clone(), &config);

    assert_eq!(classifier.classify("hello").await, Verdict::Safe);
    assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_retries_run_out() {
    let flaky = Arc::new(Flaky {
        failures: 10,
        calls: AtomicUsize::new(0),
    });
    let config = RelayConfig {
        classify_retries: 1,
        ..RelayConfig::default()
    };
    let classifier = SafetyClassifier::new(flaky.clone(), &config);

    let verdict = classifier.classify("hello").await;

    assert!(matches!(verdict, Verdict::ClassificationFailed { .. }));
    assert_eq!(flaky.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_classifications_run_in_parallel() {
    let classifier = classifier(Slow(Duration::from_millis(300)));

    let started = Instant::now();
    let handles: Vec<_> = (0..10)
        .map(|i| {
            let classifier = classifier.clone();
            tokio::spawn(async move { classifier.classify(&format!("msg {i}")).await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), Verdict::Safe);
    }

    // ten serial calls would take three seconds
    assert!(started.elapsed() < Duration::from_millis(1500));
}
