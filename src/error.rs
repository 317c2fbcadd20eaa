use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Invalid submission: {0}")]
    Validation(String),

    #[error("Message too large: {size} bytes (limit {limit})")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Request body too large: {0}")]
    BodyTooLarge(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Missing API key")]
    #[diagnostic(help(
        "set ANTHROPIC_API_KEY (claude) or OPENAI_API_KEY (openai), or pass --api-key"
    ))]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server error: {0}")]
    Server(String),
}
