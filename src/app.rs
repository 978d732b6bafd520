//! App: terminal init, main loop, tick, key and mouse handling.

use crate::audio::{AudioSink, Silent, TerminalBell};
use crate::game::{Game, Status};
use crate::input::{Action, cell_at, displacement, key_to_action};
use crate::theme::Theme;
use crate::{Args, GameConfig, highscores, ui};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use log::{info, warn};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// Render at ~60 FPS.
const FRAME_DURATION: Duration = Duration::from_millis(16);
/// Ticks run per frame at most, so a stall does not turn into a burst.
const MAX_CATCH_UP_TICKS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    Restart,
    Exit,
}

impl QuitOption {
    fn next(self) -> Self {
        match self {
            Self::Resume => Self::Restart,
            Self::Restart => Self::Exit,
            Self::Exit => Self::Resume,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Resume => Self::Exit,
            Self::Restart => Self::Resume,
            Self::Exit => Self::Restart,
        }
    }
}

pub struct App {
    args: Args,
    theme: Theme,
    game: Game,
    screen: Screen,
    paused: bool,
    quit_selected: QuitOption,
    last_tick: Instant,
    tick_interval: Duration,
    /// Keyboard cursor, in cells.
    cursor: (usize, usize),
    /// A chip is held with the keyboard.
    key_grab: bool,
    /// Terminal position where the mouse grabbed a chip.
    mouse_origin: Option<(u16, u16)>,
    /// Board area from the last frame, for mouse mapping.
    board_rect: Rect,
    /// TachyonFX fade-in for the current board.
    intro_effect: Option<Effect>,
    intro_process_time: Option<Instant>,
    /// Board generation the intro was started for.
    intro_generation: Option<u32>,
    saved_best: u32,
}

impl App {
    pub fn new(args: Args, config: GameConfig, theme: Theme) -> Self {
        let saved_best = highscores::load_best();
        let audio: Box<dyn AudioSink> = if args.mute {
            Box::new(Silent)
        } else {
            Box::new(TerminalBell)
        };
        let game = Game::new(&config, saved_best, audio);
        let rate = if config.tick_rate.is_finite() {
            config.tick_rate.clamp(1.0, 1000.0)
        } else {
            60.0
        };
        let now = Instant::now();
        Self {
            cursor: (config.width / 2, config.height / 2),
            args,
            theme,
            game,
            screen: Screen::Playing,
            paused: false,
            quit_selected: QuitOption::Resume,
            last_tick: now,
            tick_interval: Duration::from_secs_f64(1.0 / rate),
            key_grab: false,
            mouse_origin: None,
            board_rect: Rect::default(),
            intro_effect: None,
            intro_process_time: None,
            intro_generation: None,
            saved_best,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let mut terminal = ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;
        self.save_best();

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            self.update_intro();

            let cursor = (!self.key_grab && self.mouse_origin.is_none()).then_some(self.cursor);
            let view = ui::View {
                game: &self.game,
                theme: &self.theme,
                screen: self.screen,
                paused: self.paused,
                cursor,
                quit_selected: self.quit_selected,
            };
            let mut board_rect = self.board_rect;
            terminal.draw(|f| {
                board_rect = ui::draw(
                    f,
                    &view,
                    &mut self.intro_effect,
                    &mut self.intro_process_time,
                    now,
                );
            })?;
            self.board_rect = board_rect;

            let timeout = FRAME_DURATION.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let keep_going = match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            self.handle_action(key_to_action(key))
                        }
                        Event::Mouse(mouse) => {
                            self.handle_mouse(mouse);
                            true
                        }
                        _ => true,
                    };
                    if !keep_going {
                        return Ok(());
                    }
                }
            }

            if self.screen == Screen::Playing && !self.paused {
                let mut ran = 0;
                while self.last_tick.elapsed() >= self.tick_interval && ran < MAX_CATCH_UP_TICKS {
                    self.last_tick += self.tick_interval;
                    self.game.tick();
                    ran += 1;
                }
                if ran == MAX_CATCH_UP_TICKS {
                    self.last_tick = Instant::now();
                }
                if matches!(self.game.status(), Status::GameOver | Status::Victory) {
                    self.save_best();
                }
            } else {
                self.last_tick = Instant::now();
            }
        }
    }

    /// Start the fade-in whenever a new board is dealt; drop it once done.
    fn update_intro(&mut self) {
        if self.args.no_animation {
            return;
        }
        if self.intro_generation != Some(self.game.board_generation) {
            self.intro_generation = Some(self.game.board_generation);
            self.intro_effect = Some(ui::board_intro_effect(&self.theme));
            self.intro_process_time = None;
        } else if self.intro_effect.as_ref().is_some_and(Effect::done) {
            self.intro_effect = None;
            self.intro_process_time = None;
        }
    }

    fn save_best(&mut self) {
        let best = self.game.scoreboard.best;
        if best <= self.saved_best {
            return;
        }
        match highscores::save_best(best) {
            Ok(()) => {
                info!("new best score {best} saved");
                self.saved_best = best;
            }
            Err(e) => {
                warn!("could not save best score: {e}");
                // Don't retry every frame.
                self.saved_best = best;
            }
        }
    }

    fn drop_gesture(&mut self) {
        self.game.cancel_gesture();
        self.key_grab = false;
        self.mouse_origin = None;
    }

    /// Returns false when the app should exit.
    fn handle_action(&mut self, action: Action) -> bool {
        match self.screen {
            Screen::QuitMenu => match action {
                Action::Down | Action::Right => self.quit_selected = self.quit_selected.next(),
                Action::Up | Action::Left => self.quit_selected = self.quit_selected.prev(),
                Action::Grab => match self.quit_selected {
                    QuitOption::Resume => self.screen = Screen::Playing,
                    QuitOption::Restart => {
                        self.save_best();
                        self.game.restart();
                        self.screen = Screen::Playing;
                    }
                    QuitOption::Exit => return false,
                },
                Action::Pause | Action::Quit => self.screen = Screen::Playing,
                _ => {}
            },
            Screen::Playing if self.paused => match action {
                Action::Pause => self.paused = false,
                Action::Quit => self.open_quit_menu(),
                _ => {}
            },
            Screen::Playing => match self.game.status() {
                Status::Playing => self.handle_play_action(action),
                Status::LevelComplete => match action {
                    Action::Grab => self.game.next_level(),
                    Action::Quit => self.open_quit_menu(),
                    _ => {}
                },
                Status::GameOver | Status::Victory => match action {
                    Action::Restart | Action::Grab => {
                        self.save_best();
                        self.game.restart();
                    }
                    Action::Quit => return false,
                    _ => {}
                },
            },
        }
        true
    }

    fn handle_play_action(&mut self, action: Action) {
        match action {
            Action::Pause => {
                self.drop_gesture();
                self.paused = true;
            }
            Action::Quit if self.key_grab => self.drop_gesture(),
            Action::Quit => self.open_quit_menu(),
            Action::Restart => {
                self.drop_gesture();
                self.save_best();
                self.game.restart();
            }
            Action::Grab if self.key_grab => {
                self.key_grab = false;
                self.game.pointer_up();
            }
            Action::Grab => {
                let (x, y) = self.cursor;
                self.key_grab = self.game.pointer_down(x, y);
            }
            _ => {
                let Some((dx, dy)) = action.direction() else {
                    return;
                };
                if self.key_grab {
                    // A held chip is pushed a full cell toward the key.
                    self.game.pointer_move(dx as f32, dy as f32);
                } else {
                    let grid = self.game.grid();
                    let x = self.cursor.0.saturating_add_signed(dx as isize).min(grid.width() - 1);
                    let y = self.cursor.1.saturating_add_signed(dy as isize).min(grid.height() - 1);
                    self.cursor = (x, y);
                }
            }
        }
    }

    fn open_quit_menu(&mut self) {
        self.drop_gesture();
        self.screen = Screen::QuitMenu;
        self.quit_selected = QuitOption::Resume;
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.screen != Screen::Playing || self.paused {
            return;
        }
        let pos = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => match self.game.status() {
                Status::Playing => {
                    let Some((x, y)) = cell_at(self.board_rect, pos.0, pos.1) else {
                        return;
                    };
                    if self.key_grab {
                        self.drop_gesture();
                    }
                    self.cursor = (x, y);
                    if self.game.pointer_down(x, y) {
                        self.mouse_origin = Some(pos);
                    }
                }
                Status::LevelComplete => self.game.next_level(),
                Status::GameOver | Status::Victory => {}
            },
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some(origin) = self.mouse_origin {
                    let (dx, dy) = displacement(origin, pos);
                    self.game.pointer_move(dx, dy);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if self.mouse_origin.take().is_some() {
                    self.game.pointer_up();
                }
            }
            _ => {}
        }
    }
}
