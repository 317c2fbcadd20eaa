// language model clients - the classifier hands them a policy and a message

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Error;

/// One single-turn text generation call: a system policy plus the user's
/// text in, one string out.
#[async_trait]
pub trait TextClassify: Send + Sync {
    async fn classify(&self, policy: &str, text: &str) -> Result<String, Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Provider {
    #[default]
    Claude,
    #[value(name = "openai")]
    OpenAI,
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Claude => "claude",
            Provider::OpenAI => "openai",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Claude => "claude-sonnet-4-20250514",
            Provider::OpenAI => "gpt-4",
        }
    }
}

// short, deterministic replies are all we want from either provider
const MAX_TOKENS: u32 = 150;
const TEMPERATURE: f32 = 0.3;

#[derive(Serialize)]
struct Turn<'a> {
    role: &'static str,
    content: &'a str,
}

// ---- claude ----

pub struct Claude {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Turn<'a>>,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    #[serde(default)]
    text: Option<String>,
}

impl Claude {
    pub fn new(api_key: Option<String>, model: Option<String>) -> Result<Self, Error> {
        // check common env var names for the api key
        let api_key = match api_key {
            Some(key) => key,
            None => std::env::var("ANTHROPIC_API_KEY")
                .or_else(|_| std::env::var("CLAUDE_API_KEY"))
                .or_else(|_| std::env::var("CLAUDE_KEY"))
                .map_err(|_| Error::MissingApiKey)?,
        };

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.unwrap_or_else(|| Provider::Claude.default_model().to_string()),
        })
    }
}

#[async_trait]
impl TextClassify for Claude {
    async fn classify(&self, policy: &str, text: &str) -> Result<String, Error> {
        let request = ClaudeRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            system: policy,
            messages: vec![Turn {
                role: "user",
                content: text,
            }],
        };

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await?;
            return Err(Error::Classifier(format!("claude returned {status}: {error}")));
        }

        let response: ClaudeResponse = response.json().await?;
        response
            .content
            .into_iter()
            .find_map(|c| c.text)
            .ok_or_else(|| Error::Classifier("claude reply had no text".to_string()))
    }
}

// ---- openai ----

pub struct OpenAi {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    messages: Vec<Turn<'a>>,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAi {
    pub fn new(api_key: Option<String>, model: Option<String>) -> Result<Self, Error> {
        let api_key = match api_key {
            Some(key) => key,
            None => std::env::var("OPENAI_API_KEY").map_err(|_| Error::MissingApiKey)?,
        };

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.unwrap_or_else(|| Provider::OpenAI.default_model().to_string()),
        })
    }
}

#[async_trait]
impl TextClassify for OpenAi {
    async fn classify(&self, policy: &str, text: &str) -> Result<String, Error> {
        let request = OpenAiRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            top_p: 1.0,
            messages: vec![
                Turn {
                    role: "system",
                    content: policy,
                },
                Turn {
                    role: "user",
                    content: text,
                },
            ],
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await?;
            return Err(Error::Classifier(format!("openai returned {status}: {error}")));
        }

        let response: OpenAiResponse = response.json().await?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Classifier("openai reply had no content".to_string()))
    }
}

/// Whichever provider was picked on the command line.
pub enum Ai {
    Claude(Claude),
    OpenAi(OpenAi),
}

impl Ai {
    pub fn new(
        provider: Provider,
        api_key: Option<String>,
        model: Option<String>,
    ) -> Result<Self, Error> {
        match provider {
            Provider::Claude => Ok(Ai::Claude(Claude::new(api_key, model)?)),
            Provider::OpenAI => Ok(Ai::OpenAi(OpenAi::new(api_key, model)?)),
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Ai::Claude(c) => &c.model,
            Ai::OpenAi(o) => &o.model,
        }
    }
}

#[async_trait]
impl TextClassify for Ai {
    async fn classify(&self, policy: &str, text: &str) -> Result<String, Error> {
        match self {
            Ai::Claude(c) => c.classify(policy, text).await,
            Ai::OpenAi(o) => o.classify(policy, text).await,
        }
    }
}
