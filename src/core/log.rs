// append-only message log with cursor reads
// lives for the whole process, nothing is ever evicted

use chrono::Utc;
use parking_lot::RwLock;

use crate::Error;
use crate::core::{Message, Page};

#[derive(Debug, Default)]
pub struct MessageLog {
    // ids are 1..=len with no gaps, so the vec stays sorted by id
    messages: RwLock<Vec<Message>>,
    max_text_bytes: Option<usize>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(max_text_bytes: Option<usize>) -> Self {
        Self {
            messages: RwLock::new(Vec::new()),
            max_text_bytes,
        }
    }

    /// Store a message under the next id and hand back the stored copy.
    ///
    /// Id assignment and the push happen under one write lock, so concurrent
    /// appends never share or reorder ids.
    pub fn append(&self, user: String, text: String) -> Result<Message, Error> {
        if let Some(limit) = self.max_text_bytes
            && text.len() > limit
        {
            return Err(Error::PayloadTooLarge {
                size: text.len(),
                limit,
            });
        }

        let mut messages = self.messages.write();
        let id = messages.last().map_or(0, |m| m.id) + 1;
        let message = Message {
            id,
            user,
            text,
            timestamp: Utc::now(),
        };
        messages.push(message.clone());

        Ok(message)
    }

    /// Everything with `id > cursor`, oldest first.
    ///
    /// The returned cursor is the highest id in the log, or the given cursor
    /// if that is larger, so a poller's watermark never moves backwards.
    pub fn after(&self, cursor: u64) -> Page {
        let messages = self.messages.read();
        let start = messages.partition_point(|m| m.id <= cursor);
        let last = messages.last().map_or(0, |m| m.id);

        Page {
            messages: messages[start..].to_vec(),
            cursor: last.max(cursor),
        }
    }

    pub fn max_text_bytes(&self) -> Option<usize> {
        self.max_text_bytes
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }
}
