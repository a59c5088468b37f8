use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

use purchasedesk_core::models::PurchaseField;

use crate::app::App;

use super::render::centered_rect_fixed;
use super::styles;

const MODAL_WIDTH: u16 = 110;

/// Rows of the form visible at once
const VISIBLE_ROWS: usize = 8;

pub fn render(frame: &mut Frame, app: &App) {
    let visible = app.form.len().clamp(1, VISIBLE_ROWS) as u16;
    let height = visible + 10;
    let area = centered_rect_fixed(MODAL_WIDTH, height, frame.area());

    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Material Purchase ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Form rows
            Constraint::Length(2), // Error / progress
            Constraint::Length(2), // Key hints
        ])
        .split(inner);

    render_rows(frame, app, chunks[0]);

    let message = if app.submitting {
        Line::from(Span::styled(" Saving...", styles::muted_style()))
    } else if let Some(ref error) = app.form_error {
        Line::from(Span::styled(format!(" {}", error), styles::error_style()))
    } else {
        Line::from("")
    };
    frame.render_widget(Paragraph::new(message), chunks[1]);

    let hints = Line::from(vec![
        Span::styled(" [Tab]", styles::help_key_style()),
        Span::styled(" next field  ", styles::muted_style()),
        Span::styled("[↑/↓]", styles::help_key_style()),
        Span::styled(" row  ", styles::muted_style()),
        Span::styled("[Ctrl+N]", styles::help_key_style()),
        Span::styled(" add row  ", styles::muted_style()),
        Span::styled("[Ctrl+D]", styles::help_key_style()),
        Span::styled(" remove row  ", styles::muted_style()),
        Span::styled("[Ctrl+S]", styles::help_key_style()),
        Span::styled(" save  ", styles::muted_style()),
        Span::styled("[Esc]", styles::help_key_style()),
        Span::styled(" close", styles::muted_style()),
    ]);
    frame.render_widget(Paragraph::new(hints), chunks[2]);
}

fn render_rows(frame: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    if app.form.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            " No rows. Press Ctrl+N to add one.",
            styles::muted_style(),
        )));
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(PurchaseField::ALL.iter().map(|f| Cell::from(f.title())))
        .style(styles::table_header_style());

    // Scroll so the focused row stays visible
    let offset = (app.form_row + 1).saturating_sub(VISIBLE_ROWS);

    let rows = app
        .form
        .rows()
        .iter()
        .enumerate()
        .skip(offset)
        .take(VISIBLE_ROWS)
        .map(|(i, draft)| {
            let cells = PurchaseField::ALL.iter().map(|field| {
                let focused = i == app.form_row && *field == app.form_field;
                let value = draft.field(*field);
                let text = match (field, focused) {
                    (PurchaseField::Amount, true) => format!("${}▌", value),
                    (PurchaseField::Amount, false) => format!("${}", value),
                    (_, true) => format!("{}▌", value),
                    (_, false) => value.to_string(),
                };
                let style = if focused {
                    styles::selected_style()
                } else {
                    styles::list_item_style()
                };
                Cell::from(text).style(style)
            });
            Row::new(cells)
        });

    let widths = [
        Constraint::Percentage(22),
        Constraint::Percentage(18),
        Constraint::Percentage(18),
        Constraint::Percentage(12),
        Constraint::Percentage(12),
        Constraint::Percentage(18),
    ];

    let title = if app.form.len() > VISIBLE_ROWS {
        format!(" Row {} of {} ", app.form_row + 1, app.form.len())
    } else {
        String::new()
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().title(title).title_style(styles::muted_style()));

    frame.render_widget(table, area);
}
