//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Synchronous prediction on submit

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::xgboost::XgbModel;
use crate::application::PredictionPipeline;
use crate::config::Settings;
use crate::FrailsightError;

use super::ui::{
    form::{render_form, Field, FormState},
    render_disclaimer,
    result::{render_result, ResultState},
    startup::render_model_unavailable,
};

type Pipeline = PredictionPipeline<XgbModel, XgbModel>;

/// Current screen/view in the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Form,
    Result,
    /// The model failed to load; the reason is shown and input is ignored.
    ModelUnavailable(String),
}

/// Main application state
pub struct App {
    screen: Screen,
    should_quit: bool,
    /// `None` when the model could not be loaded.
    pipeline: Option<Pipeline>,
    form_state: FormState,
    result_state: Option<ResultState>,
}

impl App {
    /// Load the configured model and build the application.
    ///
    /// A load failure does not abort startup: the app opens on an error view
    /// and never constructs the pipeline.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        let loaded = settings
            .integrity_policy()
            .map_err(FrailsightError::from)
            .and_then(|policy| Pipeline::load(&settings.model_path, &policy));

        Self::from_load(loaded)
    }

    /// Build the application from the outcome of a model load.
    #[must_use]
    pub fn from_load(loaded: Result<Pipeline, FrailsightError>) -> Self {
        match loaded {
            Ok(pipeline) => Self::with_pipeline(pipeline),
            Err(e) => {
                tracing::error!("Model unavailable: {}", e);
                Self::model_unavailable(e.to_string())
            }
        }
    }

    /// Create application around an already-built pipeline.
    #[must_use]
    pub fn with_pipeline(pipeline: Pipeline) -> Self {
        Self {
            screen: Screen::Form,
            should_quit: false,
            pipeline: Some(pipeline),
            form_state: FormState::default(),
            result_state: None,
        }
    }

    /// Application that can only show why the model is missing.
    #[must_use]
    pub fn model_unavailable(reason: impl Into<String>) -> Self {
        Self {
            screen: Screen::ModelUnavailable(reason.into()),
            should_quit: false,
            pipeline: None,
            form_state: FormState::default(),
            result_state: None,
        }
    }

    #[must_use]
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(2)])
                    .split(f.area());

                match (&self.screen, &self.result_state) {
                    (Screen::Form, _) | (Screen::Result, None) => {
                        render_form(f, chunks[0], &self.form_state);
                    }
                    (Screen::Result, Some(state)) => render_result(f, chunks[0], state),
                    (Screen::ModelUnavailable(reason), _) => {
                        render_model_unavailable(f, chunks[0], reason);
                    }
                }

                render_disclaimer(f, chunks[1]);
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    pub(crate) fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        let ctrl_q = key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL);
        if ctrl_q || key == KeyCode::Esc {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Form => self.handle_form_key(key),
            Screen::Result => self.handle_result_key(key),
            Screen::ModelUnavailable(_) => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyCode) {
        let form = &mut self.form_state;
        match key {
            KeyCode::Up | KeyCode::BackTab => form.prev_field(),
            KeyCode::Down | KeyCode::Tab => form.next_field(),
            KeyCode::Left => form.change(false),
            KeyCode::Right => form.change(true),
            KeyCode::Char('+') if form.field() == Field::Charlson => form.change(true),
            KeyCode::Char('-') if form.field() == Field::Charlson => form.change(false),
            KeyCode::Char(c) if c.is_ascii_digit() => form.input_digit(c),
            KeyCode::Backspace => form.delete_digit(),
            KeyCode::Char('r') | KeyCode::Char('R') => form.reset(),
            KeyCode::Enter => self.submit(),
            _ => {}
        }
    }

    fn handle_result_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Enter => {
                self.screen = Screen::Form;
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.form_state.reset();
                self.result_state = None;
                self.screen = Screen::Form;
            }
            _ => {}
        }
    }

    fn submit(&mut self) {
        let Some(pipeline) = &self.pipeline else {
            tracing::warn!("Submission ignored: no model loaded");
            return;
        };

        match pipeline.predict(&self.form_state.record) {
            Ok(result) => {
                self.result_state = Some(ResultState::new(result));
                self.form_state.error_message = None;
                self.screen = Screen::Result;
            }
            Err(e) => {
                tracing::error!("Prediction failed: {}", e);
                self.form_state.error_message = Some(e.to_string());
            }
        }
    }
}
