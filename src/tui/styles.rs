//! Clinical color palette and styles.
//!
//! Calm dark surface, one accent color, and the two force-plot colors used
//! by SHAP (red raises risk, blue lowers it).

use ratatui::style::{Color, Modifier, Style};

/// Color palette for all views.
pub struct ClinicalTheme;

impl ClinicalTheme {
    // === Accent ===

    /// Deep teal accent
    pub const ACCENT: Color = Color::Rgb(13, 148, 136); // #0D9488

    /// Lighter teal for focus and key hints
    pub const ACCENT_LIGHT: Color = Color::Rgb(45, 212, 191); // #2DD4BF

    // === Force plot ===

    /// Pushes the risk higher
    pub const RISK_UP: Color = Color::Rgb(255, 0, 81); // #FF0051

    /// Pushes the risk lower
    pub const RISK_DOWN: Color = Color::Rgb(0, 139, 251); // #008BFB

    // === Errors ===

    pub const DANGER: Color = Color::Rgb(244, 63, 94); // #F43F5E

    // === Surfaces and text ===

    pub const BORDER: Color = Color::Rgb(71, 85, 105); // #475569
    pub const TEXT_PRIMARY: Color = Color::Rgb(248, 250, 252); // #F8FAFC
    pub const TEXT_SECONDARY: Color = Color::Rgb(148, 163, 184); // #94A3B8
    pub const TEXT_MUTED: Color = Color::Rgb(100, 116, 139); // #64748B

    #[must_use]
    pub fn title() -> Style {
        Style::default()
            .fg(Self::ACCENT_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn text() -> Style {
        Style::default().fg(Self::TEXT_PRIMARY)
    }

    #[must_use]
    pub fn text_secondary() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    #[must_use]
    pub fn text_muted() -> Style {
        Style::default().fg(Self::TEXT_MUTED)
    }

    #[must_use]
    pub fn danger() -> Style {
        Style::default().fg(Self::DANGER)
    }

    /// Focused field title
    #[must_use]
    pub fn focused() -> Style {
        Style::default()
            .fg(Self::ACCENT_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    /// Currently selected option inside a field
    #[must_use]
    pub fn selected() -> Style {
        Style::default()
            .fg(Self::TEXT_PRIMARY)
            .bg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn border() -> Style {
        Style::default().fg(Self::BORDER)
    }

    #[must_use]
    pub fn border_focused() -> Style {
        Style::default().fg(Self::ACCENT)
    }

    #[must_use]
    pub fn key_hint() -> Style {
        Style::default()
            .fg(Self::ACCENT_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn key_desc() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    /// Bar color for a force-plot segment.
    #[must_use]
    pub fn push(push: crate::render::Push) -> Style {
        match push {
            crate::render::Push::Higher => Style::default().fg(Self::RISK_UP),
            crate::render::Push::Lower => Style::default().fg(Self::RISK_DOWN),
        }
    }
}

pub const LOGO_SMALL: &str = "Frailsight";
