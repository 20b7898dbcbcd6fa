//! App: terminal init, main loop, tick and input handling.

use crate::board::{BOARD_HEIGHT, BOARD_WIDTH};
use crate::game::{GameEvent, GameState};
use crate::input::{Action, BUTTON_CCW, BUTTON_CW, key_to_action, mouse_to_buttons};
use crate::theme::Theme;
use crate::{Args, GameConfig};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// Quiescence interval between applied rotate inputs, so a held button does
/// not rotate a cell every tick.
const ROTATE_DEBOUNCE_MS: u64 = 250;

/// Popup lifetime and float-up cadence.
const POPUP_LIFETIME_MS: u32 = 1200;
const POPUP_STEP_MS: u32 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Playing,
    GameOver,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    MainMenu,
    Exit,
}

/// Floating score label. Cosmetic only; fed from drained game events and
/// never part of the authoritative simulation state.
#[derive(Debug, Clone)]
pub struct ScorePopup {
    pub x: usize,
    pub y: usize,
    pub points: u32,
    pub age_ms: u32,
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    state: GameState,
    screen: Screen,
    paused: bool,
    last_tick: Instant,
    /// Cell cursor for keyboard play; mouse clicks move it too.
    cursor: (usize, usize),
    last_rotate: Option<Instant>,
    popups: Vec<ScorePopup>,
    last_popup_tick: Instant,
    best_score: u32,
    quit_selected: QuitOption,
    game_over_effect: Option<Effect>,
    effect_process_time: Option<Instant>,
}

impl App {
    pub fn new(args: &Args, config: GameConfig, theme: Theme) -> Self {
        let state = Self::fresh_state(&config);
        let screen = if args.no_menu {
            Screen::Playing
        } else {
            Screen::Menu
        };
        let now = Instant::now();
        Self {
            config,
            theme,
            state,
            screen,
            paused: false,
            last_tick: now,
            cursor: (BOARD_WIDTH / 2, BOARD_HEIGHT / 2),
            last_rotate: None,
            popups: Vec::new(),
            last_popup_tick: now,
            best_score: 0,
            quit_selected: QuitOption::Resume,
            game_over_effect: None,
            effect_process_time: None,
        }
    }

    fn fresh_state(config: &GameConfig) -> GameState {
        let seed = config.seed.unwrap_or_else(rand::random);
        GameState::new(seed, config.flood_rate, config.flood_accel)
    }

    fn reset_game(&mut self) {
        self.state = Self::fresh_state(&self.config);
        self.screen = Screen::Playing;
        self.paused = false;
        self.last_tick = Instant::now();
        self.last_rotate = None;
        self.popups.clear();
        self.game_over_effect = None;
        self.effect_process_time = None;
    }

    /// Queue a rotate at the cursor if the debounce window has elapsed.
    fn try_rotate(&mut self, clockwise: bool) {
        let now = Instant::now();
        let quiescent = self
            .last_rotate
            .is_none_or(|t| now.duration_since(t) >= Duration::from_millis(ROTATE_DEBOUNCE_MS));
        if quiescent {
            let (x, y) = self.cursor;
            self.state.queue_rotate(x, y, clockwise);
            self.last_rotate = Some(now);
        }
    }

    fn move_cursor(&mut self, dx: i32, dy: i32) {
        let x = (self.cursor.0 as i32 + dx).clamp(0, BOARD_WIDTH as i32 - 1);
        let y = (self.cursor.1 as i32 + dy).clamp(0, BOARD_HEIGHT as i32 - 1);
        self.cursor = (x as usize, y as usize);
    }

    fn tick_popups(&mut self) {
        let delta_ms = self.last_popup_tick.elapsed().as_millis().min(1000) as u32;
        self.last_popup_tick = Instant::now();
        self.popups.retain_mut(|p| {
            let old_steps = p.age_ms / POPUP_STEP_MS;
            p.age_ms += delta_ms;
            if p.age_ms / POPUP_STEP_MS > old_steps && p.y > 0 {
                p.y -= 1;
            }
            p.age_ms < POPUP_LIFETIME_MS
        });
    }

    fn drain_game_events(&mut self) {
        for event in self.state.take_events() {
            match event {
                GameEvent::ChainScored { points, at, .. } => {
                    self.popups.push(ScorePopup {
                        x: at.0,
                        y: at.1,
                        points,
                        age_ms: 0,
                    });
                }
                GameEvent::LevelUp(_) => {
                    // Board reseeds under the cursor; popups refer to cleared
                    // cells that no longer exist.
                    self.popups.clear();
                }
                GameEvent::GameOver => {
                    self.screen = Screen::GameOver;
                    self.game_over_effect = None;
                    self.effect_process_time = None;
                }
            }
        }
        if self.state.score > self.best_score {
            self.best_score = self.state.score;
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{
                DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
                PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
            },
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let _ = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        );

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let tick_interval = Duration::from_secs_f64(1.0 / self.config.tick_rate);
        loop {
            let now = Instant::now();
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.state,
                    &self.theme,
                    self.cursor,
                    &self.popups,
                    self.paused,
                    self.best_score,
                    (self.screen == Screen::QuitMenu).then_some(self.quit_selected),
                    &mut self.game_over_effect,
                    &mut self.effect_process_time,
                    now,
                )
            })?;

            self.tick_popups();

            // Event polling budget targets ~60 FPS rendering.
            let timeout = Duration::from_millis(16).saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) => {
                            if key.kind != KeyEventKind::Press {
                                continue;
                            }
                            if self.handle_key(key_to_action(key), key.code)? {
                                return Ok(());
                            }
                        }
                        Event::Mouse(mouse) => self.handle_mouse(terminal, &mouse)?,
                        _ => {}
                    }
                }
            }

            if self.screen == Screen::Playing && !self.paused {
                if self.last_tick.elapsed() >= tick_interval {
                    let dt = self.last_tick.elapsed().as_secs_f32();
                    self.last_tick = Instant::now();
                    self.state.tick(dt);
                    self.drain_game_events();
                }
            } else {
                // Keep dt from accumulating across pauses and menus.
                self.last_tick = Instant::now();
            }
        }
    }

    /// Returns Ok(true) when the app should exit.
    fn handle_key(&mut self, action: Action, code: KeyCode) -> Result<bool> {
        match self.screen {
            Screen::Menu => match action {
                Action::Quit => return Ok(true),
                Action::Confirm => self.reset_game(),
                _ => {}
            },
            Screen::Playing => {
                if self.paused {
                    match action {
                        Action::Pause => self.paused = false,
                        Action::Quit => {
                            self.screen = Screen::QuitMenu;
                            self.quit_selected = QuitOption::Resume;
                        }
                        _ => {}
                    }
                } else {
                    match action {
                        Action::Pause => self.paused = true,
                        Action::Quit => {
                            self.screen = Screen::QuitMenu;
                            self.quit_selected = QuitOption::Resume;
                        }
                        Action::MoveLeft => self.move_cursor(-1, 0),
                        Action::MoveRight => self.move_cursor(1, 0),
                        Action::MoveUp => self.move_cursor(0, -1),
                        Action::MoveDown => self.move_cursor(0, 1),
                        Action::RotateCw => self.try_rotate(true),
                        Action::RotateCcw | Action::Confirm => self.try_rotate(false),
                        Action::None => {}
                    }
                }
            }
            Screen::QuitMenu => match action {
                Action::MoveDown | Action::MoveRight => {
                    self.quit_selected = match self.quit_selected {
                        QuitOption::Resume => QuitOption::MainMenu,
                        QuitOption::MainMenu => QuitOption::Exit,
                        QuitOption::Exit => QuitOption::Resume,
                    };
                }
                Action::MoveUp | Action::MoveLeft => {
                    self.quit_selected = match self.quit_selected {
                        QuitOption::Resume => QuitOption::Exit,
                        QuitOption::MainMenu => QuitOption::Resume,
                        QuitOption::Exit => QuitOption::MainMenu,
                    };
                }
                Action::Confirm => match self.quit_selected {
                    QuitOption::Resume => self.screen = Screen::Playing,
                    QuitOption::MainMenu => self.screen = Screen::Menu,
                    QuitOption::Exit => return Ok(true),
                },
                Action::Pause | Action::Quit => self.screen = Screen::Playing,
                _ => {}
            },
            Screen::GameOver => {
                if action == Action::Quit {
                    return Ok(true);
                }
                if matches!(code, KeyCode::Char('r') | KeyCode::Char('R')) {
                    self.reset_game();
                }
            }
        }
        Ok(false)
    }

    /// Mouse press on the board: move the cursor there and queue a rotate.
    /// Left button is counter-clockwise intent, right button clockwise.
    fn handle_mouse(
        &mut self,
        terminal: &DefaultTerminal,
        mouse: &crossterm::event::MouseEvent,
    ) -> Result<()> {
        if self.screen != Screen::Playing || self.paused {
            return Ok(());
        }
        let buttons = mouse_to_buttons(mouse);
        if buttons == 0 {
            return Ok(());
        }
        let size = terminal.size()?;
        let area = Rect::new(0, 0, size.width, size.height);
        if let Some(cell) = crate::ui::cell_at(area, mouse.column, mouse.row) {
            self.cursor = cell;
            if buttons & BUTTON_CCW != 0 {
                self.try_rotate(false);
            }
            if buttons & BUTTON_CW != 0 {
                self.try_rotate(true);
            }
        }
        Ok(())
    }
}
