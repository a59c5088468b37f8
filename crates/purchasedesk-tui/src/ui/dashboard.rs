use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use purchasedesk_core::auth::Session;

use crate::app::App;

use super::styles;

const COLUMNS: [&str; 6] = [
    "Items",
    "Store",
    "Runner's Name",
    "Amount",
    "Card No.",
    "Transaction Date",
];

/// Draw the purchase dashboard for a signed-in session
pub fn render(frame: &mut Frame, app: &App, session: &Session, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(6),    // Purchases table
            Constraint::Length(1), // Pagination
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_header(frame, session, chunks[0]);
    render_table(frame, app, chunks[1]);
    render_pagination(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);
}

fn render_header(frame: &mut Frame, session: &Session, area: Rect) {
    let email = session.email().unwrap_or_default();
    let left = format!("  {}", email);
    let right = "[l] Logout ";

    let line = Line::from(vec![
        Span::styled(left.clone(), styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(left.chars().count() + right.len()),
        )),
        Span::styled(right, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Material Purchase ")
        .title_style(styles::title_style())
        .title_bottom(Line::from(vec![
            Span::styled(" [a]", styles::help_key_style()),
            Span::styled(" Add Material Purchase ", styles::muted_style()),
        ]))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    if app.loading {
        let loading = Paragraph::new(Line::from(Span::styled(
            "  Loading...",
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(loading, area);
        return;
    }

    if app.purchases.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "  No material purchases yet",
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(COLUMNS.iter().map(|c| Cell::from(*c))).style(styles::table_header_style());

    let rows = app.purchases.iter().enumerate().map(|(i, p)| {
        Row::new(vec![
            Cell::from(p.line_item_name.clone()),
            Cell::from(p.store.clone()),
            Cell::from(p.runners_name.clone()),
            Cell::from(format_amount(&p.amount)),
            Cell::from(p.card_number.clone()),
            Cell::from(p.transaction_date.clone()),
        ])
        .style(styles::table_row_style(i))
    });

    let widths = [
        Constraint::Percentage(24),
        Constraint::Percentage(18),
        Constraint::Percentage(18),
        Constraint::Percentage(12),
        Constraint::Percentage(10),
        Constraint::Percentage(18),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.selection));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_pagination(frame: &mut Frame, app: &App, area: Rect) {
    let prev_style = if app.pagination.has_prev() {
        styles::help_key_style()
    } else {
        styles::muted_style()
    };
    let next_style = if app.pagination.has_next() {
        styles::help_key_style()
    } else {
        styles::muted_style()
    };

    let label = app.pagination.label();
    let content_width = label.chars().count() + 24;
    let pad = (area.width as usize).saturating_sub(content_width) / 2;

    let line = Line::from(vec![
        Span::raw(" ".repeat(pad)),
        Span::styled("[←] Previous  ", prev_style),
        Span::styled(label, styles::list_item_style()),
        Span::styled("  Next [→]", next_style),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[r]efresh | [q]uit ";
    let left_text = match app.status_message {
        Some(ref msg) => format!(" {} ", msg),
        None => String::from(" "),
    };

    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(shortcuts.len());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(shortcuts, styles::muted_style()),
    ]);
    frame.render_widget(
        Paragraph::new(status_line).style(styles::status_bar_style()),
        area,
    );
}

/// Prefix a dollar sign on non-empty amounts
fn format_amount(amount: &str) -> String {
    if amount.is_empty() {
        String::new()
    } else {
        format!("${}", amount)
    }
}
