// ui rendering

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::core::Verdict;
use crate::tui::app::{App, LogLevel, Mode, Panel, Popup};
use crate::tui::theme::ThemeKind;

pub fn render(frame: &mut Frame, app: &mut App) {
    let theme = &app.theme;

    // clear with bg color
    frame.render_widget(Clear, frame.area());
    frame.render_widget(Block::default().style(theme.base()), frame.area());

    // header + content + compose + footer
    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, main[0]);
    render_content(frame, app, main[1]);
    render_compose(frame, app, main[2]);
    render_footer(frame, app, main[3]);

    if app.popup == Popup::Themes {
        render_theme_popup(frame, app);
    }
}

fn panel_block<'a>(app: &App, panel: Panel, title: &'a str) -> Block<'a> {
    let theme = &app.theme;
    let border_style = if app.panel == panel {
        theme.accent()
    } else {
        theme.border()
    };

    Block::default()
        .title(Span::styled(title, theme.title()))
        .borders(Borders::ALL)
        .border_style(border_style)
        .style(theme.base())
}

fn render_header(frame: &mut Frame, app: &mut App, area: Rect) {
    let theme = &app.theme;

    let (status, status_style) = if app.connected {
        ("online", theme.success())
    } else {
        ("offline", theme.error())
    };

    let mode_str = match app.mode {
        Mode::Normal => "normal",
        Mode::Insert => "insert",
    };

    let mut spans = vec![
        Span::styled(" chatguard ", theme.title()),
        Span::styled("| ", theme.muted()),
        Span::styled(&app.user, theme.accent()),
        Span::styled(" @ ", theme.muted()),
        Span::styled(&app.server, theme.base()),
        Span::styled(" | ", theme.muted()),
        Span::styled(status, status_style),
        Span::styled(" | cursor ", theme.muted()),
        Span::styled(app.cursor.to_string(), theme.base()),
        Span::styled(" | mode ", theme.muted()),
        Span::styled(mode_str, theme.accent()),
    ];

    if app.sending > 0 {
        spans.push(Span::styled(" | ", theme.muted()));
        spans.push(Span::styled(
            format!("screening {}...", app.sending),
            theme.warning(),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border())
        .style(theme.base());

    let header = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(header, area);
}

fn render_content(frame: &mut Frame, app: &mut App, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(cols[1]);

    render_feed(frame, app, cols[0]);
    render_safety(frame, app, right[0]);
    render_logs(frame, app, right[1]);
}

fn render_feed(frame: &mut Frame, app: &mut App, area: Rect) {
    let theme = &app.theme;
    let block = panel_block(app, Panel::Feed, " Messages ");

    let lines: Vec<Line> = if app.feed.is_empty() {
        vec![Line::styled("no messages yet", theme.muted())]
    } else {
        app.feed
            .iter()
            .map(|m| {
                let name_style = if m.user == app.user {
                    theme.accent()
                } else {
                    theme.title()
                };
                Line::from(vec![
                    Span::styled(
                        format!("{} ", m.timestamp.with_timezone(&chrono::Local).format("%H:%M")),
                        theme.muted(),
                    ),
                    Span::styled(format!("{}: ", m.user), name_style),
                    Span::styled(m.text.as_str(), theme.base()),
                ])
            })
            .collect()
    };

    // keep the selected line near the bottom of the panel
    let height = area.height.saturating_sub(2) as usize;
    let offset = (app.feed_scroll + 1).saturating_sub(height);

    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(theme.base())
        .wrap(Wrap { trim: false })
        .scroll((offset as u16, 0));

    frame.render_widget(paragraph, area);
}

fn render_safety(frame: &mut Frame, app: &mut App, area: Rect) {
    let theme = &app.theme;
    let block = panel_block(app, Panel::Safety, " Safety ");

    let lines: Vec<Line> = if app.screenings.is_empty() {
        vec![Line::styled(
            "verdicts for your messages show up here",
            theme.muted(),
        )]
    } else {
        app.screenings
            .iter()
            .flat_map(|s| {
                let style = theme.verdict(&s.verdict);
                let detail = match &s.verdict {
                    Verdict::Safe => "no sensitive data found".to_string(),
                    Verdict::Warning { text } => text.trim().to_string(),
                    Verdict::ClassificationFailed { reason } => reason.clone(),
                };
                [
                    Line::from(vec![
                        Span::styled(format!("[{}] ", s.verdict.label()), style),
                        Span::styled(format!("#{} ", s.id), theme.muted()),
                        Span::styled(truncate_str(&s.text, 40), theme.base()),
                    ]),
                    Line::styled(format!("  {detail}"), style),
                ]
            })
            .collect()
    };

    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(theme.base())
        .wrap(Wrap { trim: false })
        .scroll(((app.safety_scroll * 2) as u16, 0));

    frame.render_widget(paragraph, area);
}

fn render_logs(frame: &mut Frame, app: &mut App, area: Rect) {
    let theme = &app.theme;
    let block = panel_block(app, Panel::Logs, " Logs ");

    let lines: Vec<Line> = app
        .logs
        .iter()
        .map(|entry| {
            let (prefix, style) = match entry.level {
                LogLevel::Ok => ("[OK]", theme.success()),
                LogLevel::Info => ("[--]", theme.muted()),
                LogLevel::Warn => ("[!!]", theme.warning()),
                LogLevel::Error => ("[ERR]", theme.error()),
            };
            Line::from(vec![
                Span::styled(format!("{} ", prefix), style),
                Span::styled(entry.message.as_str(), theme.base()),
            ])
        })
        .collect();

    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(theme.base())
        .scroll((app.log_scroll as u16, 0));

    frame.render_widget(paragraph, area);
}

fn render_compose(frame: &mut Frame, app: &mut App, area: Rect) {
    let theme = &app.theme;
    let block = panel_block(app, Panel::Compose, " Message ");

    let content = if app.compose.is_empty() && app.mode != Mode::Insert {
        Line::styled("press 'i' to write a message...", theme.muted())
    } else {
        Line::styled(app.compose.as_str(), theme.base())
    };

    // scroll horizontally so the cursor stays visible
    let inner = area.inner(Margin {
        horizontal: 1,
        vertical: 1,
    });
    let width = inner.width.max(1) as usize;
    let offset = (app.compose_cursor + 1).saturating_sub(width);

    let paragraph = Paragraph::new(content)
        .block(block)
        .style(theme.base())
        .scroll((0, offset as u16));

    frame.render_widget(paragraph, area);

    if app.mode == Mode::Insert {
        let cursor_x = inner.x + (app.compose_cursor - offset) as u16;
        if cursor_x < inner.right() {
            frame.set_cursor_position((cursor_x, inner.y));
        }
    }
}

fn render_footer(frame: &mut Frame, app: &mut App, area: Rect) {
    let theme = &app.theme;

    let line = Line::from(vec![
        Span::styled(" Enter ", theme.base().bg(theme.accent).fg(theme.bg)),
        Span::styled(" Send ", theme.muted()),
        Span::styled("| ", theme.border()),
        Span::styled("i ", theme.accent()),
        Span::styled("Write ", theme.muted()),
        Span::styled("| ", theme.border()),
        Span::styled("Tab ", theme.accent()),
        Span::styled("Panels ", theme.muted()),
        Span::styled("| ", theme.border()),
        Span::styled("j/k ", theme.accent()),
        Span::styled("Scroll ", theme.muted()),
        Span::styled("| ", theme.border()),
        Span::styled("t ", theme.accent()),
        Span::styled("Theme ", theme.muted()),
        Span::styled("| ", theme.border()),
        Span::styled("q ", theme.accent()),
        Span::styled("Quit ", theme.muted()),
    ]);

    let paragraph = Paragraph::new(line)
        .style(theme.base())
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

fn render_theme_popup(frame: &mut Frame, app: &mut App) {
    let theme = &app.theme;
    let area = centered_rect(40, 50, frame.area());

    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(Span::styled(" select theme ", theme.title()))
        .borders(Borders::ALL)
        .border_style(theme.accent())
        .style(theme.base());

    let mut lines: Vec<Line> = ThemeKind::ALL
        .iter()
        .enumerate()
        .map(|(i, &kind)| {
            let name = kind.name();
            if i == app.theme_scroll {
                Line::from(vec![
                    Span::styled(" > ", theme.accent()),
                    Span::styled(name, theme.selected().fg(theme.accent)),
                ])
            } else {
                Line::from(vec![Span::styled(format!("   {name}"), theme.base())])
            }
        })
        .collect();

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(" j/k ", theme.accent()),
        Span::styled("navigate  ", theme.muted()),
        Span::styled("enter ", theme.accent()),
        Span::styled("select  ", theme.muted()),
        Span::styled("esc ", theme.accent()),
        Span::styled("close", theme.muted()),
    ]));

    let paragraph = Paragraph::new(lines).block(block).style(theme.base());
    frame.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        s.to_string()
    }
}
