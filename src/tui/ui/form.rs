//! Frailty assessment form.
//!
//! Six choice selectors and one bounded stepper. Widgets only ever hold
//! in-domain values, so the record handed to the pipeline is always valid.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::domain::features::{
    CHARLSON_INDEX, CHARLSON_MAX, CHRONIC_PAIN, COGNITION_IMPAIRED, DIABETIC_NEPHROPATHY,
    NUTRITIONAL_STATUS, PHYSICAL_ACTIVITY, SARCOPENIA,
};
use crate::domain::{ActivityLevel, CharlsonIndex, FeatureRecord, NutritionalStatus, Presence};
use crate::tui::styles::{ClinicalTheme, LOGO_SMALL};

/// Form widgets, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Cognition,
    Activity,
    Pain,
    Nutrition,
    Sarcopenia,
    Charlson,
    Nephropathy,
}

impl Field {
    pub const ALL: [Self; 7] = [
        Self::Cognition,
        Self::Activity,
        Self::Pain,
        Self::Nutrition,
        Self::Sarcopenia,
        Self::Charlson,
        Self::Nephropathy,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Cognition => COGNITION_IMPAIRED,
            Self::Activity => PHYSICAL_ACTIVITY,
            Self::Pain => CHRONIC_PAIN,
            Self::Nutrition => NUTRITIONAL_STATUS,
            Self::Sarcopenia => SARCOPENIA,
            Self::Charlson => CHARLSON_INDEX,
            Self::Nephropathy => DIABETIC_NEPHROPATHY,
        }
    }

    fn hint(self) -> &'static str {
        match self {
            Self::Charlson => "score 0-30",
            Self::Activity => "self-reported",
            Self::Nutrition => "screening outcome",
            _ => "diagnosed",
        }
    }
}

/// Step through a closed option list, wrapping at both ends.
fn cycle<T: Copy + PartialEq>(all: &[T], current: T, forward: bool) -> T {
    let i = all.iter().position(|v| *v == current).unwrap_or(0);
    let n = all.len();
    let j = if forward { (i + 1) % n } else { (i + n - 1) % n };
    all[j]
}

/// Form state.
pub struct FormState {
    pub record: FeatureRecord,
    pub selected: usize,
    pub error_message: Option<String>,
    /// Digits typed into the stepper since it was last focused or stepped.
    typing: bool,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            record: FeatureRecord::default(),
            selected: 0,
            error_message: None,
            typing: false,
        }
    }
}

impl FormState {
    #[must_use]
    pub fn field(&self) -> Field {
        Field::ALL[self.selected]
    }

    pub fn next_field(&mut self) {
        self.selected = (self.selected + 1) % Field::ALL.len();
        self.typing = false;
    }

    pub fn prev_field(&mut self) {
        if self.selected == 0 {
            self.selected = Field::ALL.len() - 1;
        } else {
            self.selected -= 1;
        }
        self.typing = false;
    }

    /// ←/→ on the focused widget: next option, or ±1 on the stepper.
    pub fn change(&mut self, forward: bool) {
        let field = self.field();
        let r = &mut self.record;
        match field {
            Field::Cognition => {
                r.cognition_impaired = cycle(&Presence::ALL, r.cognition_impaired, forward);
            }
            Field::Activity => {
                r.physical_activity = cycle(&ActivityLevel::ALL, r.physical_activity, forward);
            }
            Field::Pain => r.chronic_pain = cycle(&Presence::ALL, r.chronic_pain, forward),
            Field::Nutrition => {
                r.nutritional_status =
                    cycle(&NutritionalStatus::ALL, r.nutritional_status, forward);
            }
            Field::Sarcopenia => r.sarcopenia = cycle(&Presence::ALL, r.sarcopenia, forward),
            Field::Nephropathy => {
                r.diabetic_nephropathy = cycle(&Presence::ALL, r.diabetic_nephropathy, forward);
            }
            Field::Charlson => {
                let delta = if forward { 1 } else { -1 };
                let next = i64::from(r.charlson_index.value()) + delta;
                r.charlson_index = CharlsonIndex::saturating(next);
            }
        }
        self.typing = false;
        self.error_message = None;
    }

    /// Type a digit into the stepper. Ignored on other widgets.
    pub fn input_digit(&mut self, c: char) {
        let (Field::Charlson, Some(d)) = (self.field(), c.to_digit(10)) else {
            return;
        };
        let current = i64::from(self.record.charlson_index.value());
        let next = if self.typing { current * 10 + i64::from(d) } else { i64::from(d) };
        self.record.charlson_index = CharlsonIndex::saturating(next);
        self.typing = true;
        self.error_message = None;
    }

    /// Drop the last typed digit of the stepper.
    pub fn delete_digit(&mut self) {
        if self.field() == Field::Charlson {
            let current = i64::from(self.record.charlson_index.value());
            self.record.charlson_index = CharlsonIndex::saturating(current / 10);
            self.typing = true;
        }
    }

    /// Back to the preselected values.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Display text of a widget's current value, with the code the model sees.
    #[must_use]
    pub fn value_label(&self, field: Field) -> String {
        let r = &self.record;
        let (label, code) = match field {
            Field::Cognition => (r.cognition_impaired.label(), r.cognition_impaired.code()),
            Field::Activity => (r.physical_activity.label(), r.physical_activity.code()),
            Field::Pain => (r.chronic_pain.label(), r.chronic_pain.code()),
            Field::Nutrition => (r.nutritional_status.label(), r.nutritional_status.code()),
            Field::Sarcopenia => (r.sarcopenia.label(), r.sarcopenia.code()),
            Field::Nephropathy => (r.diabetic_nephropathy.label(), r.diabetic_nephropathy.code()),
            Field::Charlson => return r.charlson_index.value().to_string(),
        };
        format!("{label} = {code}")
    }
}

/// Render the assessment form
pub fn render_form(f: &mut Frame, area: Rect, state: &FormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_header(f, chunks[0]);
    render_fields(f, chunks[1], state);
    render_footer(f, chunks[2], state);
}

fn render_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", ClinicalTheme::text()),
        Span::styled(LOGO_SMALL, ClinicalTheme::title()),
        Span::styled(
            " │ Frailty risk in elderly patients with diabetes",
            ClinicalTheme::text_secondary(),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(ClinicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_fields(f: &mut Frame, area: Rect, state: &FormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    let mid = Field::ALL.len().div_ceil(2);
    render_column(f, columns[0], &Field::ALL[..mid], 0, state);
    render_column(f, columns[1], &Field::ALL[mid..], mid, state);
}

fn render_column(f: &mut Frame, area: Rect, fields: &[Field], offset: usize, state: &FormState) {
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == state.selected;
        let (border_style, title_style) = if is_selected {
            (ClinicalTheme::border_focused(), ClinicalTheme::focused())
        } else {
            (ClinicalTheme::border(), ClinicalTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.label()), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let value_style = if is_selected {
            ClinicalTheme::selected()
        } else {
            ClinicalTheme::text()
        };
        let arrow = |s: &'static str| {
            if is_selected {
                Span::styled(s, ClinicalTheme::key_hint())
            } else {
                Span::raw(" ")
            }
        };

        let mut spans = vec![
            Span::raw(" "),
            arrow("◀"),
            Span::styled(format!(" {} ", state.value_label(*field)), value_style),
            arrow("▶"),
            Span::raw("  "),
            Span::styled(field.hint(), ClinicalTheme::text_muted()),
        ];
        if *field == Field::Charlson {
            spans.push(Span::styled(
                format!(" (max {CHARLSON_MAX})"),
                ClinicalTheme::text_muted(),
            ));
        }

        f.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[i]);
    }
}

fn render_footer(f: &mut Frame, area: Rect, state: &FormState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", ClinicalTheme::danger()),
            Span::styled(err.clone(), ClinicalTheme::danger()),
        ])
    } else {
        Line::from(vec![
            Span::styled("[↑↓] ", ClinicalTheme::key_hint()),
            Span::styled("Navigate ", ClinicalTheme::key_desc()),
            Span::styled("[←→] ", ClinicalTheme::key_hint()),
            Span::styled("Change ", ClinicalTheme::key_desc()),
            Span::styled("[Enter] ", ClinicalTheme::key_hint()),
            Span::styled("Predict ", ClinicalTheme::key_desc()),
            Span::styled("[R] ", ClinicalTheme::key_hint()),
            Span::styled("Reset ", ClinicalTheme::key_desc()),
            Span::styled("[Esc] ", ClinicalTheme::key_hint()),
            Span::styled("Quit", ClinicalTheme::key_desc()),
        ])
    };

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

    fn focus(state: &mut FormState, field: Field) {
        while state.field() != field {
            state.next_field();
        }
    }

    #[test]
    fn test_defaults_match_fresh_form() {
        let state = FormState::default();
        assert_eq!(state.record, FeatureRecord::default());
        assert_eq!(state.field(), Field::Cognition);
        assert_eq!(state.value_label(Field::Charlson), "2");
    }

    #[test]
    fn test_navigation_wraps() {
        let mut state = FormState::default();
        state.prev_field();
        assert_eq!(state.field(), Field::Nephropathy);
        state.next_field();
        assert_eq!(state.field(), Field::Cognition);
    }

    #[test]
    fn test_choice_cycles_through_options() {
        let mut state = FormState::default();
        focus(&mut state, Field::Activity);

        state.change(true);
        assert_eq!(state.record.physical_activity, ActivityLevel::Medium);
        state.change(true);
        state.change(true);
        assert_eq!(state.record.physical_activity, ActivityLevel::Low);
        state.change(false);
        assert_eq!(state.record.physical_activity, ActivityLevel::High);
    }

    #[test]
    fn test_every_selector_steps_its_own_field() {
        let mut state = FormState::default();

        for field in [Field::Cognition, Field::Pain, Field::Sarcopenia, Field::Nephropathy] {
            focus(&mut state, field);
            state.change(true);
        }
        focus(&mut state, Field::Nutrition);
        state.change(false);

        let r = &state.record;
        assert_eq!(r.cognition_impaired, Presence::Present);
        assert_eq!(r.chronic_pain, Presence::Present);
        assert_eq!(r.sarcopenia, Presence::Present);
        assert_eq!(r.diabetic_nephropathy, Presence::Present);
        assert_eq!(r.nutritional_status, NutritionalStatus::WellNourished);
        assert_eq!(r.physical_activity, ActivityLevel::Low);
        assert_eq!(r.charlson_index.value(), 2);

        // Stepping back wraps to the other end.
        focus(&mut state, Field::Cognition);
        state.change(false);
        state.change(false);
        assert_eq!(state.record.cognition_impaired, Presence::Present);
    }

    #[test]
    fn test_value_labels_show_model_codes() {
        let mut state = FormState::default();
        assert_eq!(state.value_label(Field::Cognition), "No = 0");
        assert_eq!(state.value_label(Field::Activity), "Low = 1");
        assert_eq!(state.value_label(Field::Nutrition), "At risk of malnutrition = 1");

        focus(&mut state, Field::Activity);
        state.change(false);
        assert_eq!(state.value_label(Field::Activity), "High = 3");
        focus(&mut state, Field::Nephropathy);
        state.change(true);
        assert_eq!(state.value_label(Field::Nephropathy), "Yes = 1");
    }

    #[test]
    fn test_stepper_is_clamped() {
        let mut state = FormState::default();
        focus(&mut state, Field::Charlson);

        state.change(false);
        state.change(false);
        state.change(false);
        assert_eq!(state.record.charlson_index.value(), 0);

        for _ in 0..40 {
            state.change(true);
        }
        assert_eq!(state.record.charlson_index.value(), CHARLSON_MAX);
    }

    #[test]
    fn test_typed_digits() {
        let mut state = FormState::default();
        focus(&mut state, Field::Charlson);

        state.input_digit('1');
        state.input_digit('4');
        assert_eq!(state.record.charlson_index.value(), 14);

        state.input_digit('9');
        assert_eq!(state.record.charlson_index.value(), CHARLSON_MAX);

        state.delete_digit();
        assert_eq!(state.record.charlson_index.value(), 3);

        // Typing after a step starts a new number.
        state.change(true);
        state.input_digit('7');
        assert_eq!(state.record.charlson_index.value(), 7);
    }

    #[test]
    fn test_digits_ignored_on_selectors() {
        let mut state = FormState::default();
        state.input_digit('1');
        assert_eq!(state.record, FeatureRecord::default());
    }

    #[test]
    fn test_reset() {
        let mut state = FormState::default();
        state.change(true);
        focus(&mut state, Field::Charlson);
        state.input_digit('9');
        state.error_message = Some("boom".into());

        state.reset();
        assert_eq!(state.record, FeatureRecord::default());
        assert_eq!(state.selected, 0);
        assert!(state.error_message.is_none());
    }
}
