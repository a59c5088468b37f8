use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, AppState, DashboardGuard, Screen};

use super::{dashboard, login, modal, styles};

pub const LOGO: [&str; 3] = [
    "   ╔═╗╦ ╦╦═╗╔═╗╦ ╦╔═╗╔═╗╔═╗╔╦╗╔═╗╔═╗╦╔═",
    "   ╠═╝║ ║╠╦╝║  ╠═╣╠═╣╚═╗║╣  ║║║╣ ╚═╗╠╩╗",
    "   ╩  ╚═╝╩╚═╚═╝╩ ╩╩ ╩╚═╝╚═╝═╩╝╚═╝╚═╝╩ ╩",
];

/// Draw one frame. The dashboard only appears when `guard` admits it;
/// the caller commits the guard once the frame is on screen.
pub fn render(frame: &mut Frame, app: &App, guard: &mut DashboardGuard) {
    let area = frame.area();

    let admitted = match app.screen {
        Screen::Login => {
            login::render(frame, app, area);
            false
        }
        Screen::Dashboard => guard
            .render(|session| dashboard::render(frame, app, session, area))
            .is_some(),
    };

    if admitted && matches!(app.state, AppState::AddingPurchase) {
        modal::render(frame, app);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

/// Create a centered rectangle with fixed dimensions
pub fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

pub fn logo_lines() -> Vec<Line<'static>> {
    LOGO.iter()
        .map(|l| Line::from(Span::styled(*l, styles::title_style())))
        .collect()
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 10, frame.area());

    frame.render_widget(Clear, area);

    let mut lines = logo_lines();
    lines.extend([
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block);

    frame.render_widget(paragraph, area);
}
