//! Measurement entry form.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::{FeatureKind, FeatureRow, FeatureSchema, FeatureSpec, PatientRecord, YesNo};
use crate::tui::styles::MedicalTheme;

/// Current contents of one input.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Numeric text as typed
    Text(String),
    Choice(YesNo),
}

/// One form input bound to a schema feature.
#[derive(Debug, Clone)]
pub struct FormField {
    pub spec: &'static FeatureSpec,
    pub value: FieldValue,
}

impl FormField {
    fn with_default(spec: &'static FeatureSpec) -> Self {
        let value = match spec.kind {
            FeatureKind::Binary => {
                FieldValue::Choice(YesNo::from_encoded(spec.default).unwrap_or_default())
            }
            _ => FieldValue::Text(format_value(spec, spec.default)),
        };
        Self { spec, value }
    }

    fn hint(&self) -> String {
        match self.spec.kind {
            FeatureKind::Binary => "Yes / No".to_string(),
            _ => format!("{}-{}", self.spec.min, self.spec.max),
        }
    }

    /// Parsed and clamped value, as a number input would report it.
    fn resolve(&self) -> Result<f64, String> {
        match &self.value {
            FieldValue::Choice(choice) => Ok(choice.encode()),
            FieldValue::Text(text) => {
                let raw: f64 = text
                    .trim()
                    .parse()
                    .map_err(|_| format!("{}: Invalid number", self.spec.label))?;
                if !raw.is_finite() {
                    return Err(format!("{}: Invalid number", self.spec.label));
                }
                Ok(self.spec.clamp(raw))
            }
        }
    }
}

fn format_value(spec: &FeatureSpec, value: f64) -> String {
    match spec.kind {
        FeatureKind::Integer | FeatureKind::Binary => format!("{}", value as i64),
        FeatureKind::Float if value.fract() == 0.0 => format!("{value:.1}"),
        FeatureKind::Float => format!("{value}"),
    }
}

/// Form state
pub struct FormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl Default for FormState {
    fn default() -> Self {
        Self::new(FeatureSchema::diabetes())
    }
}

impl FormState {
    /// One field per schema feature, pre-filled with defaults.
    #[must_use]
    pub fn new(schema: FeatureSchema) -> Self {
        Self {
            fields: schema.features().iter().map(FormField::with_default).collect(),
            selected_field: 0,
            error_message: None,
        }
    }

    /// Fields shown in the left column.
    #[must_use]
    pub fn column_split(&self) -> usize {
        (self.fields.len() + 1) / 2
    }

    /// Move to the next field
    pub fn next_field(&mut self) {
        self.commit_field();
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        self.commit_field();
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Jump to the same row of the other column.
    pub fn switch_column(&mut self) {
        self.commit_field();
        let split = self.column_split();
        self.selected_field = if self.selected_field < split {
            (self.selected_field + split).min(self.fields.len() - 1)
        } else {
            self.selected_field - split
        };
    }

    #[must_use]
    pub fn selected_is_choice(&self) -> bool {
        matches!(self.fields[self.selected_field].value, FieldValue::Choice(_))
    }

    /// Flip the selected Yes/No field. No-op on numeric fields.
    pub fn toggle_choice(&mut self) {
        if let FieldValue::Choice(choice) = &mut self.fields[self.selected_field].value {
            *choice = choice.toggled();
            self.error_message = None;
        }
    }

    /// Add a character to the current numeric field
    pub fn input_char(&mut self, c: char) {
        if !(c.is_ascii_digit() || c == '.' || c == '-') {
            return;
        }
        if let FieldValue::Text(text) = &mut self.fields[self.selected_field].value {
            text.push(c);
            self.error_message = None;
        }
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        if let FieldValue::Text(text) = &mut self.fields[self.selected_field].value {
            text.pop();
        }
    }

    /// Clear the current field
    pub fn clear_field(&mut self) {
        if let FieldValue::Text(text) = &mut self.fields[self.selected_field].value {
            text.zeroize();
        }
    }

    /// Replace the selected entry with its clamped value. Unparsable text is
    /// left alone so the error surfaces on submit.
    fn commit_field(&mut self) {
        let field = &mut self.fields[self.selected_field];
        if !matches!(field.value, FieldValue::Text(_)) {
            return;
        }
        if let Ok(value) = field.resolve() {
            let formatted = format_value(field.spec, value);
            if let FieldValue::Text(text) = &mut field.value {
                text.zeroize();
                text.push_str(&formatted);
            }
        }
    }

    /// Restore every field to its default.
    pub fn reset(&mut self) {
        self.clear_sensitive();
    }

    /// Wipe all field buffers from memory and restore defaults.
    pub fn clear_sensitive(&mut self) {
        for field in &mut self.fields {
            if let FieldValue::Text(text) = &mut field.value {
                text.zeroize();
            }
            *field = FormField::with_default(field.spec);
        }
        self.error_message = None;
        self.selected_field = 0;
    }

    /// Clamp every entry and assemble the record.
    ///
    /// # Errors
    /// Returns a message naming the first field that is not a number.
    pub fn to_record(&self) -> Result<PatientRecord, String> {
        let mut row = FeatureRow::new();
        for field in &self.fields {
            row.push(field.spec.name, field.resolve()?);
        }
        PatientRecord::from_row(&row).map_err(|e| e.to_string())
    }
}

/// Render the measurement form
pub fn render_form(f: &mut Frame, area: Rect, state: &FormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_form_header(f, chunks[0]);
    render_form_fields(f, chunks[1], state);
    render_form_footer(f, chunks[2], state);
}

fn render_form_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Diabetes Risk Prediction", MedicalTheme::title()),
        Span::styled(
            " │ Enter patient measurements",
            MedicalTheme::text_secondary(),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &FormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    let mid = state.column_split();
    render_field_column(f, columns[0], &state.fields[..mid], 0, state.selected_field);
    render_field_column(f, columns[1], &state.fields[mid..], mid, state.selected_field);
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[FormField],
    offset: usize,
    selected: usize,
) {
    let field_height = 3;
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(field_height))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;
        let (border_style, title_style) = if is_selected {
            (MedicalTheme::border_focused(), MedicalTheme::focused())
        } else {
            (MedicalTheme::border(), MedicalTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.spec.label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let mut spans = vec![Span::raw(" ")];
        match &field.value {
            FieldValue::Choice(choice) => {
                for option in [YesNo::Yes, YesNo::No] {
                    let style = if option == *choice {
                        MedicalTheme::selected()
                    } else {
                        MedicalTheme::text_muted()
                    };
                    spans.push(Span::styled(format!(" {option} "), style));
                    spans.push(Span::raw(" "));
                }
            }
            FieldValue::Text(text) if text.is_empty() => {
                spans.push(Span::styled(field.hint(), MedicalTheme::text_muted()));
            }
            FieldValue::Text(text) => {
                spans.push(Span::styled(text.as_str(), MedicalTheme::text()));
                spans.push(Span::styled(
                    format!("  ({})", field.hint()),
                    MedicalTheme::text_muted(),
                ));
            }
        }
        if is_selected && !matches!(field.value, FieldValue::Choice(_)) {
            spans.push(Span::styled("▌", MedicalTheme::cursor()));
        }

        f.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[i]);
    }
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &FormState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.clone(), MedicalTheme::danger()),
        ])
    } else {
        Line::from(vec![
            Span::styled("[↑↓/Tab] ", MedicalTheme::key_hint()),
            Span::styled("Navigate ", MedicalTheme::key_desc()),
            Span::styled("[Space] ", MedicalTheme::key_hint()),
            Span::styled("Yes/No ", MedicalTheme::key_desc()),
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Predict Risk ", MedicalTheme::key_desc()),
            Span::styled("[R] ", MedicalTheme::key_hint()),
            Span::styled("Reset ", MedicalTheme::key_desc()),
            Span::styled("[Q] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(state: &mut FormState, name: &str) {
        state.selected_field = state
            .fields
            .iter()
            .position(|f| f.spec.name == name)
            .expect("Field should exist");
    }

    fn set_text(state: &mut FormState, name: &str, text: &str) {
        select(state, name);
        state.clear_field();
        for c in text.chars() {
            state.input_char(c);
        }
    }

    #[test]
    fn test_defaults_build_default_record() {
        let state = FormState::default();
        assert_eq!(state.fields.len(), 9);
        let record = state.to_record().expect("Defaults should be valid");
        assert_eq!(record, PatientRecord::default());
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let mut state = FormState::default();
        set_text(&mut state, "Age", "150");
        set_text(&mut state, "BMI", "5");
        set_text(&mut state, "Fasting_Glucose", "120.6");

        let record = state.to_record().expect("Should clamp");
        assert_eq!(record.age, 100);
        assert!((record.bmi - 10.0).abs() < f64::EPSILON);
        assert_eq!(record.fasting_glucose, 121);
    }

    #[test]
    fn test_leaving_a_field_shows_the_clamped_value() {
        let mut state = FormState::default();
        set_text(&mut state, "Age", "7");
        state.next_field();
        assert_eq!(state.fields[0].value, FieldValue::Text("10".into()));
    }

    #[test]
    fn test_toggle_encodes_yes_as_one() {
        let mut state = FormState::default();
        select(&mut state, "Smoking_Status");
        assert!(state.selected_is_choice());
        state.toggle_choice();

        let record = state.to_record().expect("Should be valid");
        assert_eq!(record.smoking_status, YesNo::Yes);
        assert_eq!(record.to_vec()[7], 1.0);
        assert_eq!(record.family_history, YesNo::No);
    }

    #[test]
    fn test_letters_are_ignored_and_garbage_is_reported() {
        let mut state = FormState::default();
        set_text(&mut state, "HbA1c", "abc");
        assert!(matches!(&state.fields[4].value, FieldValue::Text(t) if t.is_empty()));

        set_text(&mut state, "HbA1c", "6..2");
        let err = state.to_record().expect_err("Should reject");
        assert!(err.contains("HbA1c"));
    }

    #[test]
    fn test_clear_sensitive_restores_defaults() {
        let mut state = FormState::default();
        set_text(&mut state, "Age", "63");
        select(&mut state, "Family_History");
        state.toggle_choice();
        state.error_message = Some("x".into());

        state.clear_sensitive();
        assert_eq!(state.selected_field, 0);
        assert!(state.error_message.is_none());
        assert_eq!(state.to_record().expect("Valid"), PatientRecord::default());
    }

    #[test]
    fn test_switch_column() {
        let mut state = FormState::default();
        assert_eq!(state.column_split(), 5);
        state.switch_column();
        assert_eq!(state.selected_field, 5);
        state.selected_field = 4;
        state.switch_column();
        assert_eq!(state.selected_field, 8);
        state.switch_column();
        assert_eq!(state.selected_field, 3);
    }
}
