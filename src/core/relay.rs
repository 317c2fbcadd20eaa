// submit and poll - the two things a chat client can do

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::RelayConfig;
use crate::Error;
use crate::core::{
    Message, MessageLog, NewMessage, Page, Receipt, SafetyClassifier, TextClassify, Verdict,
};

/// Shared relay state. Cheap to clone, every clone sees the same log.
#[derive(Clone)]
pub struct Relay {
    log: Arc<MessageLog>,
    classifier: SafetyClassifier,
}

/// A message that is already in the log while its verdict is still being
/// worked out.
pub struct Pending {
    pub message: Message,
    verdict: JoinHandle<Verdict>,
}

impl Pending {
    /// Wait for the verdict and build the sender's receipt.
    pub async fn finish(self) -> Receipt {
        let verdict = match self.verdict.await {
            Ok(verdict) => verdict,
            Err(e) => {
                error!(id = self.message.id, error = %e, "classification task died");
                Verdict::failed("classification task aborted")
            }
        };

        Receipt {
            message: self.message,
            verdict,
        }
    }
}

impl Relay {
    pub fn new(model: Arc<dyn TextClassify>, config: &RelayConfig) -> Self {
        Self {
            log: Arc::new(MessageLog::with_limit(config.max_text_bytes)),
            classifier: SafetyClassifier::new(model, config),
        }
    }

    /// Store the message and start screening it in the background.
    ///
    /// The message is visible to pollers as soon as this returns. Must be
    /// called from inside a tokio runtime.
    pub fn accept(&self, new: NewMessage) -> Result<Pending, Error> {
        let (user, text) = new.validate()?;
        let message = self.log.append(user, text)?;
        info!(id = message.id, user = %message.user, "message stored");

        let classifier = self.classifier.clone();
        let text = message.text.clone();
        let verdict = tokio::spawn(async move { classifier.classify(&text).await });

        Ok(Pending { message, verdict })
    }

    /// Store, screen, and return both results together.
    pub async fn submit(&self, new: NewMessage) -> Result<Receipt, Error> {
        let receipt = self.accept(new)?.finish().await;
        info!(
            id = receipt.message.id,
            verdict = receipt.verdict.label(),
            "message screened"
        );
        Ok(receipt)
    }

    pub fn poll(&self, cursor: u64) -> Page {
        self.log.after(cursor)
    }

    pub fn max_text_bytes(&self) -> Option<usize> {
        self.log.max_text_bytes()
    }
}
