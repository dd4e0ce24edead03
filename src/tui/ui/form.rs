//! Create-record input form.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::RecordDraft;
use crate::tui::styles::HerbalTheme;

/// Form field definition
#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub hint: &'static str,
    pub value: String,
    pub required: bool,
}

/// Create-record form state
pub struct RecordFormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl Default for RecordFormState {
    fn default() -> Self {
        Self {
            fields: vec![
                FormField {
                    label: "Symptom Pattern",
                    hint: "e.g. Wind-Cold, Qi Deficiency, Damp-Heat",
                    value: String::new(),
                    required: true,
                },
                FormField {
                    label: "Herbal Formula",
                    hint: "e.g. Gui Zhi Tang",
                    value: String::new(),
                    required: true,
                },
                FormField {
                    label: "Patient Info",
                    hint: "stored encrypted only",
                    value: String::new(),
                    required: false,
                },
            ],
            selected_field: 0,
            error_message: None,
        }
    }
}

impl RecordFormState {
    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Add a character to the current field
    pub fn input_char(&mut self, c: char) {
        if !c.is_control() {
            self.fields[self.selected_field].value.push(c);
            self.error_message = None;
        }
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        self.fields[self.selected_field].value.pop();
    }

    /// Clear the current field
    pub fn clear_field(&mut self) {
        self.fields[self.selected_field].value.clear();
    }

    /// Wipe all field buffers from memory and clear values.
    ///
    /// Called right after the draft is handed to the worker so plaintext
    /// inputs do not persist in the UI state.
    pub fn clear_sensitive(&mut self) {
        for field in self.fields.iter_mut() {
            field.value.zeroize();
        }
        self.error_message = None;
        self.selected_field = 0;
    }

    /// Validate and convert to a draft.
    pub fn to_draft(&self) -> Result<RecordDraft, String> {
        for field in self.fields.iter().filter(|f| f.required) {
            if field.value.trim().is_empty() {
                return Err(format!("{} is required", field.label));
            }
        }

        Ok(RecordDraft {
            symptom_pattern: self.fields[0].value.trim().to_string(),
            herb_formula: self.fields[1].value.trim().to_string(),
            patient_info: self.fields[2].value.trim().to_string(),
        })
    }
}

/// Render the create-record form.
pub fn render_form(f: &mut Frame, area: Rect, state: &RecordFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Fields
            Constraint::Length(4), // Hints + error
        ])
        .split(area);

    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", HerbalTheme::text()),
        Span::styled("Add Diagnosis Record", HerbalTheme::title()),
        Span::styled(
            " │ encrypted before it leaves this machine",
            HerbalTheme::text_secondary(),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(HerbalTheme::border()),
    );
    f.render_widget(header, chunks[0]);

    render_fields(f, chunks[1], state);
    render_footer(f, chunks[2], state);
}

fn render_fields(f: &mut Frame, area: Rect, state: &RecordFormState) {
    let constraints: Vec<Constraint> =
        state.fields.iter().map(|_| Constraint::Length(3)).collect();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .margin(1)
        .split(area);

    for (i, field) in state.fields.iter().enumerate() {
        let focused = i == state.selected_field;
        let border_style = if focused {
            HerbalTheme::focused()
        } else {
            HerbalTheme::border()
        };

        let marker = if field.required { " *" } else { "" };
        let title = format!(" {}{marker} ", field.label);

        let content = if field.value.is_empty() {
            Span::styled(field.hint, HerbalTheme::text_muted())
        } else {
            Span::styled(field.value.clone(), HerbalTheme::text())
        };

        let input = Paragraph::new(Line::from(content)).block(
            Block::default()
                .title(Span::styled(title, HerbalTheme::subtitle()))
                .borders(Borders::ALL)
                .border_style(border_style),
        );
        f.render_widget(input, rows[i]);
    }
}

fn render_footer(f: &mut Frame, area: Rect, state: &RecordFormState) {
    let mut lines = vec![Line::from(vec![
        Span::styled("[Tab] ", HerbalTheme::key_hint()),
        Span::styled("Next field  ", HerbalTheme::key_desc()),
        Span::styled("[Enter] ", HerbalTheme::key_hint()),
        Span::styled("Submit  ", HerbalTheme::key_desc()),
        Span::styled("[Esc] ", HerbalTheme::key_hint()),
        Span::styled("Cancel", HerbalTheme::key_desc()),
    ])];

    if let Some(error) = &state.error_message {
        lines.push(Line::from(Span::styled(
            error.clone(),
            HerbalTheme::danger(),
        )));
    }

    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(HerbalTheme::border()),
    );
    f.render_widget(p, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_navigation_wraps() {
        let mut state = RecordFormState::default();
        assert_eq!(state.selected_field, 0);

        state.next_field();
        state.next_field();
        state.next_field();
        assert_eq!(state.selected_field, 0);

        state.prev_field();
        assert_eq!(state.selected_field, 2);
    }

    #[test]
    fn test_to_draft_requires_pattern_and_formula() {
        let mut state = RecordFormState::default();
        assert!(state.to_draft().is_err());

        state.fields[0].value = "Wind-Cold".to_string();
        assert!(state.to_draft().is_err());

        state.fields[1].value = "Gui Zhi Tang".to_string();
        let draft = state.to_draft().expect("Should build draft");
        assert_eq!(draft.symptom_pattern, "Wind-Cold");
        assert_eq!(draft.herb_formula, "Gui Zhi Tang");
        assert!(draft.patient_info.is_empty());
    }

    #[test]
    fn test_clear_sensitive_wipes_buffers() {
        let mut state = RecordFormState::default();
        state.fields[2].value = "private notes".to_string();
        state.clear_sensitive();
        assert!(state.fields.iter().all(|f| f.value.is_empty()));
    }
}
