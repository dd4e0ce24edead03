//! Record detail view.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::domain::{DiagnosisRecord, RecordStatus};
use crate::tui::styles::HerbalTheme;

/// Render the detail view for one record.
pub fn render_detail(f: &mut Frame, area: Rect, record: &DiagnosisRecord, is_owner: bool) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Header
            Constraint::Length(9),  // Fields
            Constraint::Min(0),     // Encrypted payload
            Constraint::Length(3),  // Actions
        ])
        .split(area);

    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", HerbalTheme::text()),
        Span::styled("Record Details", HerbalTheme::title()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(HerbalTheme::border()),
    );
    f.render_widget(header, chunks[0]);

    let created = chrono::DateTime::from_timestamp(record.created_at, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".to_string());

    let fields = vec![
        detail_line("Record ID", &record.id, HerbalTheme::text()),
        detail_line("Symptom Pattern", &record.symptom_pattern, HerbalTheme::text()),
        detail_line("Herbal Formula", &record.herb_formula, HerbalTheme::text()),
        detail_line("Owner", &record.owner, HerbalTheme::text()),
        detail_line("Created", &created, HerbalTheme::text()),
        detail_line(
            "Status",
            record.status.as_str(),
            HerbalTheme::status(record.status),
        ),
    ];

    let info = Paragraph::new(fields).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(HerbalTheme::border()),
    );
    f.render_widget(info, chunks[1]);

    let payload = Paragraph::new(vec![
        Line::from(Span::styled(
            record.encrypted_payload.clone(),
            HerbalTheme::text_muted(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "This payload is opaque to the client and is only ever processed in encrypted form.",
            HerbalTheme::text_secondary(),
        )),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .title(Span::styled(" Encrypted Payload ", HerbalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(HerbalTheme::border()),
    );
    f.render_widget(payload, chunks[2]);

    render_actions(f, chunks[3], record, is_owner);
}

fn detail_line(label: &str, value: &str, style: ratatui::style::Style) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {label}: "), HerbalTheme::text_secondary()),
        Span::styled(value.to_string(), style),
    ])
}

fn render_actions(f: &mut Frame, area: Rect, record: &DiagnosisRecord, is_owner: bool) {
    let mut spans = vec![
        Span::styled("[Esc] ", HerbalTheme::key_hint()),
        Span::styled("Back  ", HerbalTheme::key_desc()),
    ];

    // Actions follow the lifecycle: owner-only, pending-only.
    if is_owner && record.status == RecordStatus::Pending {
        spans.extend([
            Span::styled("[A] ", HerbalTheme::key_hint()),
            Span::styled("Analyze  ", HerbalTheme::key_desc()),
            Span::styled("[X] ", HerbalTheme::key_hint()),
            Span::styled("Archive", HerbalTheme::key_desc()),
        ]);
    }

    let p = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(HerbalTheme::border()),
    );
    f.render_widget(p, area);
}
