//! Dashboard view: statistics panels and the record table.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::application::RecordStats;
use crate::domain::DiagnosisRecord;
use crate::tui::styles::HerbalTheme;

/// Dashboard state for rendering.
#[derive(Debug, Default)]
pub struct DashboardState {
    pub selected: usize,
    pub ledger_ready: bool,
}

/// Render the main dashboard view.
pub fn render_dashboard(
    f: &mut Frame,
    area: Rect,
    state: &DashboardState,
    records: &[DiagnosisRecord],
    account: Option<&str>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(4), // Stats
            Constraint::Min(0),    // Record table
        ])
        .split(area);

    render_header(f, chunks[0], state, account);
    render_stats(f, chunks[1], records);
    render_records(f, chunks[2], state, records);
}

fn render_header(f: &mut Frame, area: Rect, state: &DashboardState, account: Option<&str>) {
    let ledger_span = if state.ledger_ready {
        Span::styled("ledger ready", HerbalTheme::success())
    } else {
        Span::styled("ledger unavailable", HerbalTheme::danger())
    };

    let account_span = match account {
        Some(account) => Span::styled(shorten_account(account), HerbalTheme::text()),
        None => Span::styled("no wallet connected", HerbalTheme::text_muted()),
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", HerbalTheme::text()),
        Span::styled("tcmledger", HerbalTheme::title()),
        Span::styled(" │ ", HerbalTheme::text_muted()),
        Span::styled(
            "Confidential TCM Diagnosis Records",
            HerbalTheme::text_secondary(),
        ),
        Span::styled(" │ ", HerbalTheme::text_muted()),
        ledger_span,
        Span::styled(" │ ", HerbalTheme::text_muted()),
        account_span,
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(HerbalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_stats(f: &mut Frame, area: Rect, records: &[DiagnosisRecord]) {
    let stats = RecordStats::collect(records);

    let cells = [
        ("Total", stats.total, HerbalTheme::text()),
        ("Pending", stats.pending, HerbalTheme::warning()),
        ("Analyzed", stats.analyzed, HerbalTheme::success()),
        ("Archived", stats.archived, HerbalTheme::text_muted()),
    ];

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    for (i, (label, value, style)) in cells.iter().enumerate() {
        let panel = Paragraph::new(vec![
            Line::from(Span::styled(value.to_string(), *style)),
            Line::from(Span::styled(*label, HerbalTheme::text_secondary())),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(HerbalTheme::border()),
        );
        f.render_widget(panel, columns[i]);
    }
}

fn render_records(f: &mut Frame, area: Rect, state: &DashboardState, records: &[DiagnosisRecord]) {
    let block = Block::default()
        .title(Span::styled(" Diagnosis Records ", HerbalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(HerbalTheme::border());

    if records.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "No records found. Press [N] to add the first diagnosis.",
                HerbalTheme::text_muted(),
            )),
        ])
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let header = Row::new(
        ["ID", "Symptom Pattern", "Herb Formula", "Date", "Status"]
            .iter()
            .map(|h| Cell::from(Span::styled(*h, HerbalTheme::subtitle()))),
    );

    let rows = records.iter().enumerate().map(|(i, record)| {
        let style = if i == state.selected {
            HerbalTheme::selected()
        } else {
            HerbalTheme::text()
        };

        Row::new(vec![
            Cell::from(format!("#{}", short_id(&record.id))),
            Cell::from(record.symptom_pattern.clone()),
            Cell::from(record.herb_formula.clone()),
            Cell::from(format_date(record.created_at)),
            Cell::from(Span::styled(
                record.status.to_string(),
                if i == state.selected {
                    style
                } else {
                    HerbalTheme::status(record.status)
                },
            )),
        ])
        .style(style)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
            Constraint::Length(12),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(block);

    f.render_widget(table, area);
}

/// First six characters of the id, like a short hash.
fn short_id(id: &str) -> &str {
    &id[..id.len().min(6)]
}

/// Shortened account for the header (head...tail).
fn shorten_account(account: &str) -> String {
    if account.len() <= 12 {
        return account.to_string();
    }
    format!("{}...{}", &account[..8], &account[account.len() - 4..])
}

fn format_date(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_handles_tiny_ids() {
        assert_eq!(short_id("tcm-1700000000000-abc"), "tcm-17");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_shorten_account() {
        assert_eq!(
            shorten_account("0x52908400098527886E0F7030069857D2E4169EE7"),
            "0x529084...9EE7"
        );
        assert_eq!(shorten_account("0xABC"), "0xABC");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(0), "1970-01-01");
    }
}
