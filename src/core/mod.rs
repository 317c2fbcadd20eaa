// core logic - message log, safety screening, and the relay tying them together

mod ai;
mod log;
mod message;
mod relay;
mod safety;

pub use ai::{Ai, Claude, OpenAi, Provider, TextClassify};
pub use log::MessageLog;
pub use message::{Message, NewMessage, Page, Receipt, Verdict};
pub use relay::{Pending, Relay};
pub use safety::{POLICY, SAFE_TOKEN, SafetyClassifier, parse_reply};
