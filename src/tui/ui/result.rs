//! Prediction result view: headline and force plot.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::domain::PredictionResult;
use crate::render::{ForcePlot, Push};
use crate::tui::styles::ClinicalTheme;

/// Result of the last submission.
pub struct ResultState {
    pub result: PredictionResult,
    pub plot: ForcePlot,
}

impl ResultState {
    #[must_use]
    pub fn new(result: PredictionResult) -> Self {
        let plot = ForcePlot::from_attribution(&result.attribution);
        Self { result, plot }
    }
}

/// Render the prediction result
pub fn render_result(f: &mut Frame, area: Rect, state: &ResultState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Headline
            Constraint::Length(7), // Force plot
            Constraint::Min(0),    // Labels
            Constraint::Length(3), // Footer
        ])
        .split(area);

    let headline = Paragraph::new(Line::from(Span::styled(
        state.result.headline(),
        ClinicalTheme::text().add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(ClinicalTheme::border()),
    );
    f.render_widget(headline, chunks[0]);

    render_plot(f, chunks[1], &state.plot);
    render_labels(f, chunks[2], &state.plot);
    render_footer(f, chunks[3]);
}

fn render_plot(f: &mut Frame, area: Rect, plot: &ForcePlot) {
    let block = Block::default()
        .title(Span::styled(
            " Feature contributions (log-odds) ",
            ClinicalTheme::text_secondary(),
        ))
        .borders(Borders::ALL)
        .border_style(ClinicalTheme::border());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let width = inner.width;
    if width < 10 {
        return;
    }

    let base_col = plot.column(plot.base_value, width);
    let out_col = plot.column(plot.output_value, width);

    let markers = marker_line(
        width,
        &[
            (out_col, format!("f(x) = {:.2}", plot.output_value)),
            (base_col, format!("base value = {:.2}", plot.base_value)),
        ],
    );

    let bars: Vec<Span> = (0..width)
        .map(|col| match plot.segment_at(col, width) {
            Some(seg) => {
                let glyph = match seg.push() {
                    Push::Higher => "▶",
                    Push::Lower => "◀",
                };
                Span::styled(glyph, ClinicalTheme::push(seg.push()))
            }
            None if col == base_col => Span::styled("┊", ClinicalTheme::text_muted()),
            None => Span::raw(" "),
        })
        .collect();

    let (lo, hi) = plot.axis();
    let axis = marker_line(width, &[(0, format!("{lo:.2}")), (width, format!("{hi:.2}"))]);

    let lines = vec![
        Line::from(Span::styled(markers, ClinicalTheme::text())),
        Line::from(bars.clone()),
        Line::from(bars),
        Line::from(Span::styled("─".repeat(usize::from(width)), ClinicalTheme::border())),
        Line::from(Span::styled(axis, ClinicalTheme::text_muted())),
    ];
    f.render_widget(Paragraph::new(lines), inner);
}

/// Place labels on a line of `width` cells, centered on their columns.
/// Later labels are dropped if they would overlap earlier ones.
fn marker_line(width: u16, labels: &[(u16, String)]) -> String {
    let width = usize::from(width);
    let mut cells = vec![' '; width];
    let mut taken = vec![false; width];

    for (col, text) in labels {
        let len = text.chars().count();
        if len > width {
            continue;
        }
        let start = usize::from(*col)
            .saturating_sub(len / 2)
            .min(width - len);
        if taken[start..start + len].iter().any(|t| *t) {
            continue;
        }
        for (i, ch) in text.chars().enumerate() {
            cells[start + i] = ch;
            taken[start + i] = true;
        }
    }
    cells.into_iter().collect()
}

fn render_labels(f: &mut Frame, area: Rect, plot: &ForcePlot) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let side = |title: &'static str, push: Push, segments: &[crate::render::Segment]| {
        let mut lines: Vec<Line> = segments
            .iter()
            .map(|s| Line::from(Span::styled(s.label(), ClinicalTheme::push(push))))
            .collect();
        if lines.is_empty() {
            lines.push(Line::from(Span::styled("none", ClinicalTheme::text_muted())));
        }
        Paragraph::new(lines).wrap(Wrap { trim: true }).block(
            Block::default()
                .title(Span::styled(title, ClinicalTheme::push(push)))
                .borders(Borders::ALL)
                .border_style(ClinicalTheme::border()),
        )
    };

    f.render_widget(side(" Higher risk ", Push::Higher, &plot.higher), columns[0]);
    f.render_widget(side(" Lower risk ", Push::Lower, &plot.lower), columns[1]);
}

fn render_footer(f: &mut Frame, area: Rect) {
    let content = Line::from(vec![
        Span::styled("[Enter] ", ClinicalTheme::key_hint()),
        Span::styled("Edit inputs ", ClinicalTheme::key_desc()),
        Span::styled("[R] ", ClinicalTheme::key_hint()),
        Span::styled("New assessment ", ClinicalTheme::key_desc()),
        Span::styled("[Esc] ", ClinicalTheme::key_hint()),
        Span::styled("Quit", ClinicalTheme::key_desc()),
    ]);

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(ClinicalTheme::border()),
    );

    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_line_places_and_clips() {
        let line = marker_line(20, &[(0, "lo".into()), (20, "hi".into())]);
        assert_eq!(line.chars().count(), 20);
        assert!(line.starts_with("lo"));
        assert!(line.ends_with("hi"));
    }

    #[test]
    fn test_marker_line_skips_overlap() {
        let line = marker_line(20, &[(10, "first".into()), (11, "second".into())]);
        assert!(line.contains("first"));
        assert!(!line.contains("second"));
    }
}
