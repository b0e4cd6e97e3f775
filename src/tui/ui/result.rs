//! Risk assessment result view.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::domain::TimedAssessment;
use crate::tui::styles::MedicalTheme;

/// Outcome of the last evaluation.
#[derive(Debug, Clone, Default)]
pub enum ResultState {
    /// Nothing evaluated yet
    #[default]
    Idle,
    Complete { assessment: TimedAssessment },
    /// Evaluation failed; no partial result is kept
    Error { message: String },
}

/// Render the result (or error) screen
pub fn render_result(f: &mut Frame, area: Rect, state: &ResultState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_result_header(f, chunks[0]);
    match state {
        ResultState::Idle => {}
        ResultState::Complete { assessment } => render_assessment(f, chunks[1], assessment),
        ResultState::Error { message } => render_error(f, chunks[1], message),
    }
    render_result_footer(f, chunks[2], state);
}

fn render_result_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Risk Assessment", MedicalTheme::title()),
        Span::styled(" │ Random Forest", MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_assessment(f: &mut Frame, area: Rect, timed: &TimedAssessment) {
    let assessment = &timed.assessment;

    let block = Block::default()
        .title(Span::styled(" Prediction Result ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border_focused());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let factor_rows = assessment.top_factors.len() as u16 + 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),           // Probability
            Constraint::Length(3),           // Gauge
            Constraint::Length(2),           // Category
            Constraint::Length(factor_rows), // Factors
            Constraint::Length(2),           // Note
            Constraint::Min(0),
        ])
        .margin(1)
        .split(inner);

    let risk_style = MedicalTheme::risk_category(assessment.category);

    let probability = Paragraph::new(Line::from(vec![
        Span::styled("Predicted Diabetes Risk: ", MedicalTheme::text_secondary()),
        Span::styled(
            format!("{:.3}", assessment.risk),
            MedicalTheme::text().add_modifier(Modifier::BOLD),
        ),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(probability, chunks[0]);

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .gauge_style(risk_style)
        .ratio(assessment.risk.clamp(0.0, 1.0))
        .label(format!("{:.1}%", assessment.risk * 100.0));
    f.render_widget(gauge, chunks[1]);

    let category = Paragraph::new(Line::from(Span::styled(
        assessment.category.label(),
        risk_style.add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    f.render_widget(category, chunks[2]);

    let mut factor_lines = vec![Line::from(Span::styled(
        "Key contributing factors",
        MedicalTheme::subtitle(),
    ))];
    factor_lines.extend(assessment.top_factors.iter().map(|factor| {
        Line::from(vec![
            Span::styled("  • ", MedicalTheme::text_muted()),
            Span::styled(factor.name.as_str(), MedicalTheme::text()),
            Span::styled(
                format!(" - importance: {:.3}", factor.importance),
                MedicalTheme::text_secondary(),
            ),
        ])
    }));
    f.render_widget(Paragraph::new(factor_lines), chunks[3]);

    let note = Paragraph::new(vec![
        Line::from(Span::styled(
            "This is a simplified explanation based on Random Forest feature importances.",
            MedicalTheme::info(),
        )),
        Line::from(Span::styled(
            format!(
                "Assessed at {}",
                timed.assessed_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            MedicalTheme::text_muted(),
        )),
    ]);
    f.render_widget(note, chunks[4]);
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Prediction failed", MedicalTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(content, area);
}

fn render_result_footer(f: &mut Frame, area: Rect, state: &ResultState) {
    let content = match state {
        ResultState::Error { .. } => Line::from(vec![
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Back to Form ", MedicalTheme::key_desc()),
            Span::styled("[Q] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ]),
        _ => Line::from(vec![
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("New Assessment ", MedicalTheme::key_desc()),
            Span::styled("[Q] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ]),
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}
