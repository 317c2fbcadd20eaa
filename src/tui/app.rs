// app state for the chat tui

use crate::core::{Message, Page, Receipt, Verdict};
use crate::tui::theme::{Theme, ThemeKind, detect_theme};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Feed,
    Compose,
    Safety,
    Logs,
}

impl Panel {
    fn next(self) -> Self {
        match self {
            Panel::Feed => Panel::Compose,
            Panel::Compose => Panel::Safety,
            Panel::Safety => Panel::Logs,
            Panel::Logs => Panel::Feed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Insert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Themes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Ok,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

// verdict for one of our own messages
#[derive(Debug, Clone)]
pub struct Screening {
    pub id: u64,
    pub text: String,
    pub verdict: Verdict,
}

pub struct App {
    pub running: bool,
    pub mode: Mode,
    pub panel: Panel,
    pub popup: Popup,
    pub theme_kind: ThemeKind,
    pub theme: Theme,

    // who we are and where we talk to
    pub user: String,
    pub server: String,
    pub connected: bool,
    pub poll_error: Option<String>,

    // message feed
    pub feed: Vec<Message>,
    pub cursor: u64,
    pub feed_scroll: usize,
    pub follow: bool,

    // compose input, cursor counts chars
    pub compose: String,
    pub compose_cursor: usize,

    // our verdicts, newest last
    pub screenings: Vec<Screening>,
    pub sending: usize,

    // logs
    pub logs: Vec<LogEntry>,

    // scroll
    pub safety_scroll: usize,
    pub log_scroll: usize,
    pub theme_scroll: usize,
}

impl App {
    pub fn new(user: String, server: String) -> Self {
        Self::with_theme(user, server, detect_theme())
    }

    pub fn with_theme(user: String, server: String, theme_kind: ThemeKind) -> Self {
        let mut app = Self {
            running: true,
            mode: Mode::Normal,
            panel: Panel::Compose,
            popup: Popup::None,
            theme_kind,
            theme: Theme::from_kind(theme_kind),
            user,
            server,
            connected: false,
            poll_error: None,
            feed: Vec::new(),
            cursor: 0,
            feed_scroll: 0,
            follow: true,
            compose: String::new(),
            compose_cursor: 0,
            screenings: Vec::new(),
            sending: 0,
            logs: Vec::new(),
            safety_scroll: 0,
            log_scroll: 0,
            theme_scroll: theme_kind.index(),
        };

        app.log(
            LogLevel::Info,
            format!("joining {} as {}", app.server, app.user),
        );
        app
    }

    pub fn log(&mut self, level: LogLevel, message: String) {
        self.logs.push(LogEntry { level, message });
        // auto-scroll to bottom
        self.log_scroll = self.logs.len().saturating_sub(10);
    }

    // merge a poll result; anything at or below our cursor is already shown
    pub fn apply_page(&mut self, page: Page) {
        if !self.connected {
            self.connected = true;
            self.poll_error = None;
            self.log(LogLevel::Ok, "connected".to_string());
        }

        let fresh: Vec<Message> = page
            .messages
            .into_iter()
            .filter(|m| m.id > self.cursor)
            .collect();

        if let Some(last) = fresh.last() {
            self.cursor = self.cursor.max(last.id);
        }
        self.cursor = self.cursor.max(page.cursor);
        self.feed.extend(fresh);

        if self.follow {
            self.feed_scroll = self.feed.len().saturating_sub(1);
        }
    }

    pub fn poll_failed(&mut self, error: String) {
        // log when the failure changes, not on every tick
        if self.connected || self.poll_error.as_deref() != Some(error.as_str()) {
            self.log(LogLevel::Error, format!("relay unreachable: {error}"));
        }
        self.connected = false;
        self.poll_error = Some(error);
    }

    pub fn apply_receipt(&mut self, receipt: Receipt) {
        self.sending = self.sending.saturating_sub(1);

        let (level, summary) = match &receipt.verdict {
            Verdict::Safe => (LogLevel::Ok, "safe".to_string()),
            Verdict::Warning { .. } => (LogLevel::Warn, "flagged".to_string()),
            Verdict::ClassificationFailed { reason } => {
                (LogLevel::Error, format!("not screened: {reason}"))
            }
        };
        self.log(level, format!("#{} {}", receipt.message.id, summary));

        self.screenings.push(Screening {
            id: receipt.message.id,
            text: receipt.message.text,
            verdict: receipt.verdict,
        });
        self.safety_scroll = self.screenings.len().saturating_sub(3);
    }

    pub fn send_failed(&mut self, error: String) {
        self.sending = self.sending.saturating_sub(1);
        self.log(LogLevel::Error, format!("send failed: {error}"));
    }

    // compose editing

    fn byte_index(&self, char_idx: usize) -> usize {
        self.compose
            .char_indices()
            .nth(char_idx)
            .map_or(self.compose.len(), |(i, _)| i)
    }

    fn char_len(&self) -> usize {
        self.compose.chars().count()
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.compose_cursor);
        self.compose.insert(at, c);
        self.compose_cursor += 1;
    }

    pub fn delete_char(&mut self) {
        if self.compose_cursor > 0 {
            self.compose_cursor -= 1;
            let at = self.byte_index(self.compose_cursor);
            self.compose.remove(at);
        }
    }

    pub fn delete_char_forward(&mut self) {
        if self.compose_cursor < self.char_len() {
            let at = self.byte_index(self.compose_cursor);
            self.compose.remove(at);
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.compose_cursor = self.compose_cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.compose_cursor < self.char_len() {
            self.compose_cursor += 1;
        }
    }

    pub fn move_cursor_start(&mut self) {
        self.compose_cursor = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.compose_cursor = self.char_len();
    }

    pub fn clear_compose(&mut self) {
        self.compose.clear();
        self.compose_cursor = 0;
    }

    /// Take the compose buffer for sending. Blank input is not sent.
    pub fn submit(&mut self) -> Option<String> {
        if self.compose.trim().is_empty() {
            return None;
        }

        let text = std::mem::take(&mut self.compose);
        self.compose_cursor = 0;
        self.sending += 1;
        Some(text)
    }

    // modes and panels

    pub fn enter_insert(&mut self) {
        self.mode = Mode::Insert;
        self.panel = Panel::Compose;
    }

    pub fn exit_insert(&mut self) {
        self.mode = Mode::Normal;
    }

    pub fn cycle_panel(&mut self) {
        self.panel = self.panel.next();
    }

    pub fn scroll_down(&mut self) {
        match self.panel {
            Panel::Feed => {
                if self.feed_scroll + 1 < self.feed.len() {
                    self.feed_scroll += 1;
                }
                self.follow = self.feed_scroll + 1 >= self.feed.len();
            }
            Panel::Safety => {
                if self.safety_scroll + 1 < self.screenings.len() {
                    self.safety_scroll += 1;
                }
            }
            Panel::Logs => {
                if self.log_scroll + 1 < self.logs.len() {
                    self.log_scroll += 1;
                }
            }
            Panel::Compose => {}
        }
    }

    pub fn scroll_up(&mut self) {
        match self.panel {
            Panel::Feed => {
                self.feed_scroll = self.feed_scroll.saturating_sub(1);
                self.follow = false;
            }
            Panel::Safety => self.safety_scroll = self.safety_scroll.saturating_sub(1),
            Panel::Logs => self.log_scroll = self.log_scroll.saturating_sub(1),
            Panel::Compose => {}
        }
    }

    // themes

    pub fn set_theme(&mut self, kind: ThemeKind) {
        self.theme_kind = kind;
        self.theme = Theme::from_kind(kind);
        self.theme_scroll = kind.index();
    }

    pub fn open_theme_popup(&mut self) {
        self.popup = Popup::Themes;
        self.theme_scroll = self.theme_kind.index();
    }

    pub fn close_popup(&mut self) {
        self.popup = Popup::None;
    }

    pub fn theme_scroll_down(&mut self) {
        if self.theme_scroll + 1 < ThemeKind::ALL.len() {
            self.theme_scroll += 1;
        }
    }

    pub fn theme_scroll_up(&mut self) {
        self.theme_scroll = self.theme_scroll.saturating_sub(1);
    }

    pub fn select_theme(&mut self) {
        let kind = ThemeKind::ALL[self.theme_scroll];
        self.set_theme(kind);
        self.close_popup();
        self.log(LogLevel::Info, format!("theme: {}", kind.name()));
    }
}
