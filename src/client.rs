// talks to a running relay over http

use serde::Deserialize;

use crate::Error;
use crate::core::{Message, NewMessage, Page, Receipt, Verdict};

pub struct RelayClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct SubmitReply {
    message: Message,
    verdict: Verdict,
}

#[derive(Deserialize)]
struct ErrorReply {
    error: String,
}

impl RelayClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn poll(&self, cursor: u64) -> Result<Page, Error> {
        let response = self
            .client
            .get(format!("{}/api/messages", self.base_url))
            .query(&[("lastMessageId", cursor)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from(response).await);
        }

        Ok(response.json().await?)
    }

    pub async fn submit(&self, user: &str, text: &str) -> Result<Receipt, Error> {
        let response = self
            .client
            .post(format!("{}/api/messages", self.base_url))
            .json(&NewMessage::new(user, text))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from(response).await);
        }

        let reply: SubmitReply = response.json().await?;
        Ok(Receipt {
            message: reply.message,
            verdict: reply.verdict,
        })
    }
}

// relay errors come back as {"error": "..."}
async fn error_from(response: reqwest::Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorReply>(&body)
        .map(|e| e.error)
        .unwrap_or(body);

    Error::Server(format!("relay returned {status}: {message}"))
}
