// chatguard library - chat relay with per-message safety screening

pub mod cli;
mod client;
pub mod config;
mod core;
mod error;
mod server;
pub mod tui;

pub use client::RelayClient;
pub use config::RelayConfig;
pub use crate::core::{
    Ai, Claude, Message, MessageLog, NewMessage, OpenAi, POLICY, Page, Pending, Provider,
    Receipt, Relay, SAFE_TOKEN, SafetyClassifier, TextClassify, Verdict, parse_reply,
};
pub use error::Error;
pub use server::Server;
