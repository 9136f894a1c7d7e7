//! Pure view/render functions for the gate.
//!
//! Exactly one view is drawn per frame, chosen by `AppState::view`.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tunestat_core::gate::{GateView, TRACKING_FIX_STEPS};
use tunestat_core::session::{CredentialSource, mask_token};

use crate::state::{AppState, Notice};

/// Spinner frames for the loading view.
const SPINNER_FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];

const DIALOG_WIDTH: u16 = 64;

const NAV_ITEMS: &[&str] = &["Home", "Top 25 Songs", "Visualizer", "Saved Tracks"];

pub fn render(app: &AppState, frame: &mut Frame) {
    let area = frame.area();
    let view = app.view();

    // Unresolved blocks all other rendering.
    if view == GateView::Loading {
        render_loading(frame, area, app.spinner_frame);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    render_navbar(frame, chunks[0], matches!(view, GateView::Protected { .. }));

    match &view {
        GateView::Loading => {}
        GateView::LoginPrompt { login_url } => {
            render_login_prompt(frame, chunks[1], login_url.as_str(), app.notice.as_ref());
        }
        GateView::TrackingWarning => render_tracking_warning(frame, chunks[1]),
        GateView::TrackingWarningDismissed => {
            render_dismissed(frame, chunks[1], app.notice.as_ref());
        }
        GateView::Protected { token, source } => {
            render_protected(frame, chunks[1], token, *source);
        }
    }

    render_footer(frame, chunks[2], &view);
}

fn render_navbar(frame: &mut Frame, area: Rect, enabled: bool) {
    let item_style = if enabled {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let mut spans = vec![
        Span::styled(
            "Spotify Analytics",
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("    "),
    ];
    for item in NAV_ITEMS {
        spans.push(Span::styled(*item, item_style));
        spans.push(Span::raw("   "));
    }
    let block = Block::default().borders(Borders::BOTTOM);
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_loading(frame: &mut Frame, area: Rect, spinner_frame: usize) {
    let spinner = SPINNER_FRAMES[spinner_frame % SPINNER_FRAMES.len()];
    let line = Line::from(vec![
        Span::styled(spinner, Style::default().fg(Color::Cyan)),
        Span::raw(" Loading..."),
    ]);
    let y = area.y + area.height / 2;
    let centered = Rect::new(area.x, y.min(area.bottom().saturating_sub(1)), area.width, 1);
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), centered);
}

/// Centers a dialog of the given size inside `area`.
fn dialog_area(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(2));
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn render_dialog(frame: &mut Frame, area: Rect, title: &str, color: Color, lines: Vec<Line<'_>>) {
    let inner_width = DIALOG_WIDTH.min(area.width.saturating_sub(2)).saturating_sub(2).max(1);
    let height = lines
        .iter()
        .map(|line| line.width().div_ceil(usize::from(inner_width)).max(1))
        .sum::<usize>() as u16
        + 2;
    let popup = dialog_area(area, DIALOG_WIDTH, height);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(format!(" {title} "))
        .title_style(Style::default().fg(color).add_modifier(Modifier::BOLD));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        popup,
    );
}

fn notice_line(notice: Option<&Notice>) -> Option<Line<'static>> {
    notice.map(|notice| match notice {
        Notice::Info(text) => Line::from(Span::styled(
            text.clone(),
            Style::default().fg(Color::Green),
        )),
        Notice::Error(text) => {
            Line::from(Span::styled(text.clone(), Style::default().fg(Color::Red)))
        }
    })
}

fn render_login_prompt(frame: &mut Frame, area: Rect, login_url: &str, notice: Option<&Notice>) {
    let mut lines = vec![
        Line::from("Log in with Spotify to explore your listening habits."),
        Line::from(""),
        Line::from(vec![
            Span::styled("[Enter]", Style::default().fg(Color::Cyan)),
            Span::raw(" Connect with Spotify"),
        ]),
        Line::from(Span::styled(
            login_url.to_string(),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    if let Some(line) = notice_line(notice) {
        lines.push(Line::from(""));
        lines.push(line);
    }
    render_dialog(frame, area, "Connect to Spotify", Color::Cyan, lines);
}

fn render_tracking_warning(frame: &mut Frame, area: Rect) {
    let mut lines: Vec<Line<'_>> = TRACKING_FIX_STEPS.iter().map(|s| Line::from(*s)).collect();
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("[Esc]", Style::default().fg(Color::Yellow)),
        Span::raw(" Dismiss   "),
        Span::styled("[l]", Style::default().fg(Color::Yellow)),
        Span::raw(" Log in again"),
    ]));
    render_dialog(frame, area, "Login blocked by browser", Color::Yellow, lines);
}

fn render_dismissed(frame: &mut Frame, area: Rect, notice: Option<&Notice>) {
    let mut lines = vec![
        Line::from("Login did not complete."),
        Line::from(Span::styled(
            "Press l to open the login page again.",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    if let Some(line) = notice_line(notice) {
        lines.push(Line::from(""));
        lines.push(line);
    }
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        area.inner(ratatui::layout::Margin::new(2, 1)),
    );
}

fn render_protected(frame: &mut Frame, area: Rect, token: &str, source: CredentialSource) {
    let heading = Style::default().add_modifier(Modifier::BOLD);
    let body = Style::default().fg(Color::Gray);
    let source_label = match source {
        CredentialSource::Cookie => "session cookie",
        CredentialSource::Fallback => "saved credential",
    };

    let lines = vec![
        Line::from(Span::styled(
            "Spotify Analytics",
            heading.fg(Color::Green),
        )),
        Line::from(Span::styled(
            "Discover your most played songs and gain insights into your listening habits.",
            body,
        )),
        Line::from(""),
        Line::from(Span::styled("How It Works", heading)),
        Line::from(Span::styled("  - View your top 25 most played songs: tunestat tracks top", body)),
        Line::from(Span::styled("  - Browse your saved tracks: tunestat tracks saved", body)),
        Line::from(Span::styled(
            "  - Plot popularity against duration: tunestat tracks visualizer",
            body,
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Signed in via ", body),
            Span::styled(source_label, Style::default().fg(Color::Cyan)),
            Span::styled(format!(" ({})", mask_token(token)), Style::default().fg(Color::DarkGray)),
        ]),
    ];
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }),
        area.inner(ratatui::layout::Margin::new(2, 1)),
    );
}

fn render_footer(frame: &mut Frame, area: Rect, view: &GateView) {
    let hint = match view {
        GateView::Loading | GateView::Protected { .. } => "q quit",
        GateView::LoginPrompt { .. } => "Enter log in · q quit",
        GateView::TrackingWarning => "Esc dismiss · l log in · q quit",
        GateView::TrackingWarningDismissed => "l log in · q quit",
    };
    frame.render_widget(
        Paragraph::new(Span::styled(hint, Style::default().fg(Color::DarkGray))),
        area,
    );
}
