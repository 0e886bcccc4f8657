// src/tui.rs
use crate::clipboard;
use crate::config::Config;
use crate::error::{AppResult, GeneratorError, TuiError};
use crate::generator::{self, GenerationOptions};
use crate::history::{self, HistoryStore};
use crate::models::{self, LastGenerated, PasswordRecord};

use chrono::{Local, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};
use std::io::{stdout, Stdout};
use std::time::Duration;
use log;

const DATE_FORMAT: &str = "%Y-%m-%d";
const GENERATOR_KEYS: &str = "(l) Length | (1/2/3) Toggle | (g) Generate | (c) Copy | (s) Save | (h) History | (q) Quit";
const HISTORY_KEYS: &str = "(j/k) Nav | (f) Filter | (r) Reset | (c) Copy | (D) Clear all | (Esc) Back | (q) Quit";

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum Screen {
    Generator,
    History,
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum InputMode {
    Normal,
    EditingLength,
    EditingFilter,
    ConfirmClear,
}

pub struct App {
    should_quit: bool,
    screen: Screen,
    input_mode: InputMode,
    store: HistoryStore,
    app_status: String,
    // generator screen
    length_input: String,
    use_letters: bool,
    use_digits: bool,
    use_special: bool,
    last_generated: Option<LastGenerated>,
    can_save: bool,
    // history screen
    rows: Vec<PasswordRecord>,
    table_state: TableState,
    filter_input: String,
    active_filter: Option<NaiveDate>,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let options = config.generation_options();
        App {
            should_quit: false,
            screen: Screen::Generator,
            input_mode: InputMode::Normal,
            store: HistoryStore::new(config.history_file.clone()),
            app_status: "Press 'g' to generate a password.".to_string(),
            length_input: options.length.to_string(),
            use_letters: options.use_letters,
            use_digits: options.use_digits,
            use_special: options.use_special,
            last_generated: None,
            can_save: false,
            rows: Vec::new(),
            table_state: TableState::default(),
            filter_input: String::new(),
            active_filter: None,
        }
    }

    pub fn on_key(&mut self, key_event: KeyEvent) {
        log::debug!("Key event received: {:?}", key_event.code);
        let key_code = key_event.code;

        match self.input_mode {
            InputMode::Normal => match self.screen {
                Screen::Generator => self.on_generator_key(key_code),
                Screen::History => self.on_history_key(key_code),
            },
            InputMode::EditingLength => match key_code {
                KeyCode::Char(c) => self.length_input.push(c),
                KeyCode::Backspace => {
                    self.length_input.pop();
                }
                KeyCode::Enter | KeyCode::Esc => {
                    self.input_mode = InputMode::Normal;
                    self.app_status = format!("Length set to '{}'.", self.length_input);
                }
                _ => {}
            },
            InputMode::EditingFilter => match key_code {
                KeyCode::Char(c) => self.filter_input.push(c),
                KeyCode::Backspace => {
                    self.filter_input.pop();
                }
                KeyCode::Enter => self.apply_filter(),
                KeyCode::Esc => {
                    self.input_mode = InputMode::Normal;
                    self.app_status = "Filter cancelled.".to_string();
                }
                _ => {}
            },
            InputMode::ConfirmClear => match key_code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.input_mode = InputMode::Normal;
                    self.clear_history();
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.input_mode = InputMode::Normal;
                    self.app_status = "Clear cancelled.".to_string();
                }
                _ => {}
            },
        }
    }

    fn on_generator_key(&mut self, key_code: KeyCode) {
        match key_code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('l') => {
                self.input_mode = InputMode::EditingLength;
                self.app_status = "Editing length... (Enter to confirm)".to_string();
            }
            KeyCode::Char('1') => self.use_letters = !self.use_letters,
            KeyCode::Char('2') => self.use_digits = !self.use_digits,
            KeyCode::Char('3') => self.use_special = !self.use_special,
            KeyCode::Char('g') | KeyCode::Enter => self.generate(),
            KeyCode::Char('c') => self.copy_current(),
            KeyCode::Char('s') => self.save_current(),
            KeyCode::Char('h') => self.open_history(),
            _ => {}
        }
    }

    fn on_history_key(&mut self, key_code: KeyCode) {
        match key_code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc | KeyCode::Char('b') => {
                self.screen = Screen::Generator;
                self.app_status = "Back to generator.".to_string();
            }
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char('f') => {
                self.input_mode = InputMode::EditingFilter;
                if self.filter_input.is_empty() {
                    self.filter_input = Local::now().date_naive().format(DATE_FORMAT).to_string();
                }
                self.app_status = "Filter from date (YYYY-MM-DD)... (Enter to apply, Esc to cancel)".to_string();
            }
            KeyCode::Char('r') => {
                self.active_filter = None;
                self.reload_history();
                self.app_status = format!("Showing all {} passwords.", self.rows.len());
            }
            KeyCode::Char('c') | KeyCode::Char('x') => self.copy_selected(),
            KeyCode::Char('D') => {
                self.input_mode = InputMode::ConfirmClear;
                self.app_status = "Delete all history? (y/n)".to_string();
            }
            _ => {}
        }
    }

    fn current_options(&self) -> Result<GenerationOptions, GeneratorError> {
        GenerationOptions::from_input(&self.length_input, self.use_letters, self.use_digits, self.use_special)
    }

    fn generate(&mut self) {
        match self.current_options().and_then(|options| generator::generate_for_shell(&options)) {
            Ok(last) => {
                self.last_generated = Some(last);
                self.can_save = true;
                self.app_status = "Password generated.".to_string();
            }
            Err(GeneratorError::InvalidLength(input)) => {
                log::warn!("Rejected length input {:?}", input);
                self.app_status = "Error: Length must be a positive number!".to_string();
            }
            Err(GeneratorError::NoCharacterClassSelected) => {
                self.app_status = "Error: Choose at least one character class!".to_string();
            }
        }
    }

    fn save_current(&mut self) {
        let password = match (&self.last_generated, self.can_save) {
            (Some(last), true) => last.password.clone(),
            (Some(_), false) => {
                self.app_status = "This password is already saved.".to_string();
                return;
            }
            (None, _) => {
                self.app_status = "Nothing to save yet. Press 'g' first.".to_string();
                return;
            }
        };
        match self.store.append(&password, &models::now_timestamp()) {
            Ok(_) => {
                self.can_save = false;
                self.app_status = "Password saved to history.".to_string();
            }
            Err(e) => {
                log::error!("Failed to save password: {}", e);
                self.app_status = format!("Failed to save password: {}", e);
            }
        }
    }

    fn copy_current(&mut self) {
        match self.last_generated.clone() {
            Some(last) => self.copy_to_clipboard(&last.password, "Password"),
            None => self.app_status = "No password to copy yet.".to_string(),
        }
    }

    fn copy_selected(&mut self) {
        let password = self
            .table_state
            .selected()
            .and_then(|i| self.rows.get(i))
            .map(|r| r.password.clone());
        match password {
            Some(password) => self.copy_to_clipboard(&password, "Password"),
            None => self.app_status = "Select a row in the history first!".to_string(),
        }
    }

    fn copy_to_clipboard(&mut self, content: &str, field_name: &str) {
        match clipboard::copy_text(content, field_name) {
            Ok(()) => self.app_status = format!("{} copied to clipboard!", field_name),
            Err(err) => self.app_status = format!("Error copying {}: {}", field_name, err),
        }
    }

    fn open_history(&mut self) {
        self.screen = Screen::History;
        self.reload_history();
        self.app_status = format!("{} passwords in history.", self.rows.len());
    }

    /// Reads the file again; the table never outlives a reload.
    fn reload_history(&mut self) {
        let sorted = history::sorted_by_time_descending(&self.store.load());
        self.rows = match self.active_filter {
            Some(threshold) => history::filter_from(&sorted, threshold),
            None => sorted,
        };
        self.table_state.select(if self.rows.is_empty() { None } else { Some(0) });
    }

    fn apply_filter(&mut self) {
        match NaiveDate::parse_from_str(self.filter_input.trim(), DATE_FORMAT) {
            Ok(threshold) => {
                self.input_mode = InputMode::Normal;
                self.active_filter = Some(threshold);
                self.reload_history();
                self.app_status = format!("{} passwords since {}.", self.rows.len(), threshold);
            }
            Err(_) => {
                self.app_status = "Date must be YYYY-MM-DD.".to_string();
            }
        }
    }

    fn clear_history(&mut self) {
        match self.store.clear() {
            Ok(()) => {
                self.reload_history();
                self.app_status = "History cleared.".to_string();
            }
            Err(e) => {
                log::error!("Failed to clear history: {}", e);
                self.app_status = format!("Failed to clear history: {}", e);
            }
        }
    }

    fn move_selection(&mut self, delta: i32) {
        if self.rows.is_empty() {
            self.table_state.select(None);
            return;
        }
        let current = self.table_state.selected().unwrap_or(0) as i32;
        let new_index = (current + delta).clamp(0, self.rows.len() as i32 - 1);
        self.table_state.select(Some(new_index as usize));
    }
}

pub fn run_tui(config: &Config) -> AppResult<()> {
    log::info!("Initializing TUI...");
    enable_raw_mode().map_err(|e| { log::error!("Failed to enable raw mode: {}", e); TuiError::Io(e) })?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)
        .map_err(|e| { log::error!("Failed to setup terminal screen: {}", e); TuiError::Io(e) })?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(|e| { log::error!("Failed to create terminal: {}", e); TuiError::Io(e) })?;

    let mut app = App::new(config);

    log::info!("Starting TUI application loop.");
    let res = run_app_loop(&mut terminal, &mut app);
    log::info!("TUI application loop finished.");

    disable_raw_mode().map_err(|e| { log::error!("Failed to disable raw mode: {}", e); TuiError::Io(e) })?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .map_err(|e| { log::error!("Failed to restore terminal screen: {}", e); TuiError::Io(e) })?;

    res?;
    log::info!("TUI shutdown complete.");
    Ok(())
}

fn run_app_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<(), TuiError> {
    while !app.should_quit {
        terminal.draw(|f| ui(f, app)).map_err(|e| { log::error!("Terminal draw error: {}", e); TuiError::Io(e) })?;

        if event::poll(Duration::from_millis(100)).map_err(|e| { log::error!("Event poll error: {}", e); TuiError::Io(e) })? {
            if let Event::Key(key_event) = event::read().map_err(|e| { log::error!("Event read error: {}", e); TuiError::Io(e) })? {
                if key_event.kind == KeyEventKind::Press {
                    app.on_key(key_event);
                }
            }
        }
    }
    Ok(())
}

fn checkbox(label: &str, checked: bool) -> Span<'static> {
    let mark = if checked { "[x]" } else { "[ ]" };
    Span::raw(format!("{} {}  ", mark, label))
}

fn draw_generator(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Min(3)].as_ref())
        .split(area);

    let length_text = if app.input_mode == InputMode::EditingLength {
        format!("{}▋", app.length_input)
    } else {
        app.length_input.clone()
    };
    let length_style = if app.input_mode == InputMode::EditingLength { Style::default().fg(Color::Yellow) } else { Style::default() };
    let length = Paragraph::new(length_text)
        .style(length_style)
        .block(Block::default().borders(Borders::ALL).title("Length"));
    f.render_widget(length, chunks[0]);

    let classes = Paragraph::new(Line::from(vec![
        checkbox("(1) Letters", app.use_letters),
        checkbox("(2) Digits", app.use_digits),
        checkbox("(3) Special", app.use_special),
    ]))
    .block(Block::default().borders(Borders::ALL).title("Character classes"));
    f.render_widget(classes, chunks[1]);

    let (text, style) = match &app.last_generated {
        Some(last) => (last.password.clone(), Style::default().fg(Color::Green).bold()),
        None => ("Not generated yet".to_string(), Style::default().fg(Color::Red)),
    };
    let title = if app.can_save { "Password (unsaved)" } else { "Password" };
    let password = Paragraph::new(text)
        .style(style)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(password, chunks[2]);
}

fn draw_history(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let filter_text = match (app.input_mode, app.active_filter) {
        (InputMode::EditingFilter, _) => format!("{}▋", app.filter_input),
        (_, Some(threshold)) => threshold.format(DATE_FORMAT).to_string(),
        (_, None) => "(all dates)".to_string(),
    };
    let filter = Paragraph::new(filter_text)
        .block(Block::default().borders(Borders::ALL).title("Filter from date"));
    f.render_widget(filter, chunks[0]);

    let block = Block::default().borders(Borders::ALL).title(format!("History ({})", app.rows.len()));
    if app.rows.is_empty() {
        let empty = Paragraph::new("No passwords found.").block(block).alignment(Alignment::Center);
        f.render_widget(empty, chunks[1]);
        return;
    }

    let rows: Vec<Row> = app
        .rows
        .iter()
        .map(|r| Row::new(vec![Cell::from(r.time.clone()), Cell::from(r.password.clone())]))
        .collect();
    let table = Table::new(rows, [Constraint::Length(21), Constraint::Min(10)])
        .header(Row::new(vec!["Time", "Password"]).style(Style::default().bold()))
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::Gray))
        .highlight_symbol("> ");
    f.render_stateful_widget(table, chunks[1], &mut app.table_state);
}

fn draw_confirm_clear(f: &mut Frame) {
    let area = centered_rect(40, 20, f.size());
    f.render_widget(Clear, area);
    let popup = Paragraph::new("Delete all password history?\n\n(y) Yes   (n) No")
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Confirm"));
    f.render_widget(popup, area);
}

/// Renders the UI widgets based on the current screen and mode.
fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(f.size());

    let keys = match app.screen {
        Screen::Generator => {
            draw_generator(f, app, chunks[0]);
            GENERATOR_KEYS
        }
        Screen::History => {
            draw_history(f, app, chunks[0]);
            HISTORY_KEYS
        }
    };

    let status_text = if app.input_mode == InputMode::Normal {
        format!("{} | {}", app.app_status, keys)
    } else {
        app.app_status.clone()
    };
    let status = Paragraph::new(status_text).block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(status, chunks[1]);

    if app.input_mode == InputMode::ConfirmClear {
        draw_confirm_clear(f);
    }
}

/// Helper to create a centered rect for popups.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
