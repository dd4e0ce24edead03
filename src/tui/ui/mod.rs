//! UI module: View components for the TUI.

pub mod dashboard;
pub mod detail;
pub mod form;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::styles::HerbalTheme;

pub fn render_privacy_note(f: &mut Frame, area: Rect) {
    let text = vec![Line::from(vec![Span::styled(
        "Diagnosis payloads stay encrypted end to end; the ledger only ever sees ciphertext.",
        HerbalTheme::text_muted(),
    )])];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(HerbalTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}
