// message screening - asks the model whether a chat message leaks anything
// it shouldn't, and never lets a model failure break the submission

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::RelayConfig;
use crate::core::{TextClassify, Verdict};

pub const SAFE_TOKEN: &str = "SAFE";

pub const POLICY: &str = r#"You are a chat safety monitor. Your tasks:
1. Analyze messages for personal information (names, addresses, phone numbers, etc.)
2. Detect sensitive data (financial details, passwords)
3. Identify unsafe sharing practices
4. Flag potentially harmful content
5. If message is safe, respond with "SAFE"
6. If unsafe, provide a brief specific warning about what information should not be shared"#;

#[derive(Clone)]
pub struct SafetyClassifier {
    model: Arc<dyn TextClassify>,
    timeout: Duration,
    retries: u32,
}

impl SafetyClassifier {
    pub fn new(model: Arc<dyn TextClassify>, config: &RelayConfig) -> Self {
        Self {
            model,
            timeout: config.classify_timeout,
            retries: config.classify_retries,
        }
    }

    /// Screen one message. Always produces a verdict; model errors and
    /// timeouts come back as `ClassificationFailed`.
    pub async fn classify(&self, text: &str) -> Verdict {
        let mut reason = String::new();

        for attempt in 0..=self.retries {
            match tokio::time::timeout(self.timeout, self.model.classify(POLICY, text)).await {
                Ok(Ok(reply)) => {
                    debug!(attempt, reply = %reply, "classification reply");
                    return parse_reply(reply);
                }
                Ok(Err(e)) => {
                    warn!(attempt, error = %e, "classification failed");
                    reason = e.to_string();
                }
                Err(_) => {
                    warn!(attempt, timeout = ?self.timeout, "classification timed out");
                    reason = "timeout".to_string();
                }
            }
        }

        Verdict::failed(reason)
    }
}

/// `SAFE` (surrounding whitespace ignored) is safe, anything else is a
/// warning carrying the reply verbatim.
pub fn parse_reply(reply: String) -> Verdict {
    if reply.trim() == SAFE_TOKEN {
        Verdict::Safe
    } else {
        Verdict::Warning { text: reply }
    }
}
