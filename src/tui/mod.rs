// terminal chat client

mod app;
mod event;
mod theme;
mod ui;

pub use app::App;

use crossterm::{
    cursor::SetCursorStyle,
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::client::RelayClient;
use crate::core::{Page, Receipt};
use crate::Error;
use app::Mode;
use event::{Action, handle_event, poll_event};

const POLL_EVERY: Duration = Duration::from_secs(1);

// results coming back from background requests
enum Update {
    Polled(Result<Page, Error>),
    Sent(Result<Receipt, Error>),
}

pub async fn run(client: RelayClient, user: String) -> Result<(), Error> {
    // setup terminal
    enable_raw_mode().map_err(|e| Error::Server(e.to_string()))?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen).map_err(|e| Error::Server(e.to_string()))?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(|e| Error::Server(e.to_string()))?;

    // run app
    let result = run_app(&mut terminal, client, user).await;

    // restore terminal
    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        SetCursorStyle::DefaultUserShape,
        LeaveAlternateScreen
    )
    .ok();
    terminal.show_cursor().ok();

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    client: RelayClient,
    user: String,
) -> Result<(), Error> {
    let client = Arc::new(client);
    let mut app = App::new(user, client.base_url().to_string());

    let (tx, mut rx) = mpsc::unbounded_channel::<Update>();

    // one poll in flight at a time, first one right away
    let mut polling = false;
    let mut last_poll: Option<Instant> = None;
    let mut last_mode = app.mode;

    loop {
        // update cursor style before render
        if app.mode != last_mode {
            let cursor_style = match app.mode {
                Mode::Insert => SetCursorStyle::BlinkingBar,
                Mode::Normal => SetCursorStyle::BlinkingBlock,
            };
            execute!(terminal.backend_mut(), cursor_style).ok();
            last_mode = app.mode;
        }

        terminal
            .draw(|frame| ui::render(frame, &mut app))
            .map_err(|e| Error::Server(e.to_string()))?;

        // drain finished requests
        while let Ok(update) = rx.try_recv() {
            match update {
                Update::Polled(Ok(page)) => {
                    polling = false;
                    app.apply_page(page);
                }
                Update::Polled(Err(e)) => {
                    polling = false;
                    app.poll_failed(e.to_string());
                }
                Update::Sent(Ok(receipt)) => app.apply_receipt(receipt),
                Update::Sent(Err(e)) => app.send_failed(e.to_string()),
            }
        }

        if !polling && last_poll.is_none_or(|t| t.elapsed() >= POLL_EVERY) {
            polling = true;
            last_poll = Some(Instant::now());

            let client = Arc::clone(&client);
            let tx = tx.clone();
            let cursor = app.cursor;
            tokio::spawn(async move {
                let page = client.poll(cursor).await;
                tx.send(Update::Polled(page)).ok();
            });
        }

        // poll events
        if let Some(event) =
            poll_event(Duration::from_millis(100)).map_err(|e| Error::Server(e.to_string()))?
        {
            match handle_event(&mut app, event) {
                Action::Quit => break,
                Action::Send(text) => {
                    let client = Arc::clone(&client);
                    let tx = tx.clone();
                    let user = app.user.clone();
                    tokio::spawn(async move {
                        let receipt = client.submit(&user, &text).await;
                        tx.send(Update::Sent(receipt)).ok();
                    });
                }
                Action::None => {}
            }
        }

        if !app.running {
            break;
        }
    }

    Ok(())
}
