//! Shown instead of the form when the model could not be loaded.

use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::styles::ClinicalTheme;

pub fn render_model_unavailable(f: &mut Frame, area: Rect, reason: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Model unavailable", ClinicalTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(reason, ClinicalTheme::text())),
        Line::from(""),
        Line::from(Span::styled(
            "Set FRAILSIGHT_MODEL_PATH to the trained model and restart. Predictions are disabled.",
            ClinicalTheme::text_muted(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("[Esc] ", ClinicalTheme::key_hint()),
            Span::styled("Quit", ClinicalTheme::key_desc()),
        ]),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(ClinicalTheme::danger()),
    );

    f.render_widget(content, area);
}
