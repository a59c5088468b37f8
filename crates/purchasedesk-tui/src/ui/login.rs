use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use purchasedesk_core::auth::flow::LOGIN_SUCCESS_MESSAGE;

use crate::app::{App, LoginFocus};

use super::render::{centered_rect_fixed, logo_lines};
use super::styles;

/// Visible width of the input fields
const FIELD_WIDTH: usize = 24;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let error_lines = [&app.login_errors.email, &app.login_errors.password]
        .iter()
        .filter(|e| e.is_some())
        .count() as u16;
    let status_lines = if app.login_status.is_some() { 2 } else { 0 };
    let height = 13 + error_lines + status_lines;
    let area = centered_rect_fixed(50, height, area);

    frame.render_widget(Clear, area);

    let mut lines = logo_lines();
    lines.push(Line::from(Span::styled(
        "   Welcome back!",
        styles::highlight_style(),
    )));
    lines.push(Line::from(""));

    // Email field
    let email_focused = app.login_focus == LoginFocus::Email;
    lines.push(field_line("Email:    ", &tail(&app.login_email), email_focused));
    if let Some(ref error) = app.login_errors.email {
        lines.push(Line::from(Span::styled(
            format!("             {}", error),
            styles::error_style(),
        )));
    }

    // Password field
    let password_focused = app.login_focus == LoginFocus::Password;
    let masked = "*".repeat(app.login_password.chars().count().min(FIELD_WIDTH));
    lines.push(field_line("Password: ", &masked, password_focused));
    if let Some(ref error) = app.login_errors.password {
        lines.push(Line::from(Span::styled(
            format!("             {}", error),
            styles::error_style(),
        )));
    }

    // Sign in button
    let button_focused = app.login_focus == LoginFocus::Button;
    lines.push(Line::from(""));
    if button_focused {
        lines.push(Line::from(vec![
            Span::raw("               ["),
            Span::styled(" ▶ Sign in ◀ ", styles::selected_style()),
            Span::raw("]"),
        ]));
    } else {
        lines.push(Line::from(vec![
            Span::raw("               ["),
            Span::styled("   Sign in   ", styles::list_item_style()),
            Span::raw("]"),
        ]));
    }

    if let Some(ref status) = app.login_status {
        let style = if status == LOGIN_SUCCESS_MESSAGE {
            styles::success_style()
        } else {
            styles::error_style()
        };
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", status), style)));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(" [Tab]", styles::help_key_style()),
        Span::styled(" next field  ", styles::muted_style()),
        Span::styled("[Enter]", styles::help_key_style()),
        Span::styled(" sign in  ", styles::muted_style()),
        Span::styled("[Esc]", styles::help_key_style()),
        Span::styled(" quit", styles::muted_style()),
    ]));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn field_line(label: &'static str, value: &str, focused: bool) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if focused { "▌" } else { " " };
    Line::from(vec![
        Span::raw("   "),
        Span::styled(label, styles::muted_style()),
        Span::styled("[", styles::muted_style()),
        Span::styled(format!("{:<width$}{}", value, cursor, width = FIELD_WIDTH), style),
        Span::styled("]", styles::muted_style()),
    ])
}

/// Last `FIELD_WIDTH` characters, so the cursor end stays visible
fn tail(value: &str) -> String {
    let count = value.chars().count();
    value.chars().skip(count.saturating_sub(FIELD_WIDTH)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_keeps_end_of_long_values() {
        assert_eq!(tail("a@b.com"), "a@b.com");
        let long = format!("{}@example.com", "x".repeat(30));
        let shown = tail(&long);
        assert_eq!(shown.chars().count(), FIELD_WIDTH);
        assert!(shown.ends_with("@example.com"));
    }
}
