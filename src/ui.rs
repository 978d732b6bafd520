//! Layout and drawing: board, sidebar, score popups, pause, quit menu and
//! level overlays.
//!
//! Each chip is 4×2 terminal cells. Cells are drawn with half-blocks (▀), so
//! the board is painted on a pixel canvas of 4×4 pixels per chip first.

use crate::app::{QuitOption, Screen};
use crate::counters::MOVES_PER_LEVEL;
use crate::game::{Game, Status};
use crate::grid::Chip;
use crate::input::{CHIP_COLS, CHIP_ROWS};
use crate::scene::{Look, Sprite};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Canvas pixels per chip side (4 columns, 2 half-block rows).
const CHIP_PX: usize = 4;
const SIDEBAR_WIDTH: u16 = 24;
/// Duration of the board fade-in (TachyonFX) when a level starts.
const INTRO_FADE_MS: u32 = 600;
/// Popups float up one row every this many ticks.
const POPUP_RISE_TICKS: u32 = 20;

/// Everything the frame needs, borrowed from the app.
pub struct View<'a> {
    pub game: &'a Game,
    pub theme: &'a Theme,
    pub screen: Screen,
    pub paused: bool,
    pub cursor: Option<(usize, usize)>,
    pub quit_selected: QuitOption,
}

/// Board outer size in terminal cells (border included).
fn board_outer_size(width: usize, height: usize) -> (u16, u16) {
    (width as u16 * CHIP_COLS + 2, height as u16 * CHIP_ROWS + 2)
}

/// Board with its border, centered together with the sidebar.
fn board_outer_rect(area: Rect, width: usize, height: usize) -> Rect {
    let (pw, ph) = board_outer_size(width, height);
    let total_w = pw + SIDEBAR_WIDTH;
    Rect {
        x: area.x + area.width.saturating_sub(total_w) / 2,
        y: area.y + area.height.saturating_sub(ph) / 2,
        width: pw.min(area.width),
        height: ph.min(area.height),
    }
}

/// Board area (no border) for a frame of size `area`; matches `draw_game`.
pub fn board_rect(area: Rect, width: usize, height: usize) -> Rect {
    let outer = board_outer_rect(area, width, height);
    Rect {
        x: outer.x + 1,
        y: outer.y + 1,
        width: (width as u16 * CHIP_COLS).min(outer.width.saturating_sub(2)),
        height: (height as u16 * CHIP_ROWS).min(outer.height.saturating_sub(2)),
    }
}

/// Fade-in for a freshly dealt board.
pub fn board_intro_effect(theme: &Theme) -> Effect {
    fx::fade_from(theme.bg, theme.bg, (INTRO_FADE_MS, Interpolation::Linear))
}

/// Draw the current screen. Returns the board area so the app can map mouse
/// positions to cells.
pub fn draw(
    frame: &mut Frame,
    view: &View,
    intro: &mut Option<Effect>,
    intro_process_time: &mut Option<Instant>,
    now: Instant,
) -> Rect {
    let area = frame.area();
    let grid = view.game.grid();
    let board = board_rect(area, grid.width(), grid.height());
    draw_game(frame, view, area);

    if let Some(effect) = intro {
        let delta = intro_process_time
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or(std::time::Duration::ZERO);
        let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
        *intro_process_time = Some(now);
        frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));
    }

    match view.screen {
        Screen::QuitMenu => draw_quit_menu(frame, view.theme, view.quit_selected),
        Screen::Playing if view.paused => draw_pause_overlay(frame, view.theme, area),
        Screen::Playing => match view.game.status() {
            Status::Playing => {}
            status => draw_status_overlay(frame, view, status, board),
        },
    }
    board
}

/// Draw game: board + sidebar, centered in the full area.
fn draw_game(frame: &mut Frame, view: &View, area: Rect) {
    let grid = view.game.grid();
    let board_area = board_outer_rect(area, grid.width(), grid.height());
    let sidebar_x = board_area.x + board_area.width;
    let sidebar_area = Rect {
        x: sidebar_x,
        y: board_area.y,
        width: SIDEBAR_WIDTH.min((area.x + area.width).saturating_sub(sidebar_x)),
        height: (area.y + area.height).saturating_sub(board_area.y),
    };
    draw_board(frame, view, board_area);
    draw_sidebar(frame, view, sidebar_area);
}

fn draw_board(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let game = view.game;
    let title = format!(" chiptui  | Level {} ", game.scoreboard.level);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(title, theme.title));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let grid = game.grid();
    let mut canvas = Canvas::new(grid.width() * CHIP_PX, grid.height() * CHIP_PX, theme.bg);
    if let Some((cx, cy)) = view.cursor.filter(|_| game.accepts_input()) {
        canvas.paint_cursor(cx, cy, theme.title);
    }
    for sprite in game.sprites() {
        canvas.paint_sprite(&sprite, theme);
    }

    let buf = frame.buffer_mut();
    for ty in 0..canvas.h / 2 {
        for tx in 0..canvas.w {
            let rx = inner.x + tx as u16;
            let ry = inner.y + ty as u16;
            if rx >= inner.x + inner.width || ry >= inner.y + inner.height {
                continue;
            }
            let top = canvas.get(tx, ty * 2);
            let bottom = canvas.get(tx, ty * 2 + 1);
            buf[(rx, ry)]
                .set_symbol("▀")
                .set_style(Style::default().fg(top).bg(bottom));
        }
    }

    for popup in &game.popups {
        let rise = (popup.age_ticks / POPUP_RISE_TICKS) as u16;
        let rx = inner.x + popup.x as u16 * CHIP_COLS;
        let ry = (inner.y + popup.y as u16 * CHIP_ROWS).saturating_sub(rise);
        if rx < inner.x + inner.width && ry >= inner.y && ry < inner.y + inner.height {
            let label = if popup.chain > 1 {
                format!("+{} x{}", popup.amount, popup.chain)
            } else {
                format!("+{}", popup.amount)
            };
            let style = Style::default().fg(theme.spark).bg(theme.bg).bold();
            buf.set_string(rx, ry, label, style);
        }
    }
}

/// Board pixels, row-major, 4×4 per chip.
struct Canvas {
    w: usize,
    h: usize,
    px: Vec<Color>,
}

impl Canvas {
    fn new(w: usize, h: usize, bg: Color) -> Self {
        Self {
            w,
            h,
            px: vec![bg; w * h],
        }
    }

    fn get(&self, x: usize, y: usize) -> Color {
        self.px[y * self.w + x]
    }

    fn put(&mut self, x: i32, y: i32, c: Color) {
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            self.px[y as usize * self.w + x as usize] = c;
        }
    }

    /// Corner marks in the pixels a round chip leaves free.
    fn paint_cursor(&mut self, cx: usize, cy: usize, color: Color) {
        let (x0, y0) = ((cx * CHIP_PX) as i32, (cy * CHIP_PX) as i32);
        let last = CHIP_PX as i32 - 1;
        for (dx, dy) in [(0, 0), (last, 0), (0, last), (last, last)] {
            self.put(x0 + dx, y0 + dy, color);
        }
    }

    fn paint_sprite(&mut self, sprite: &Sprite, theme: &Theme) {
        let x0 = (sprite.x * CHIP_PX as f32).round() as i32;
        let y0 = (sprite.y * CHIP_PX as f32).round() as i32;
        let base = match sprite.chip {
            Chip::Empty => return,
            Chip::Bomb => theme.bomb,
            Chip::Color(i) => theme.chip_color(i),
        };
        let n = CHIP_PX as i32;
        for ly in 0..n {
            for lx in 0..n {
                let corner = (lx == 0 || lx == n - 1) && (ly == 0 || ly == n - 1);
                let inner = (1..n - 1).contains(&lx) && (1..n - 1).contains(&ly);
                let shaded = dome(base, lx as usize, ly as usize);
                let color = match sprite.look {
                    Look::Resting | Look::Falling => (!corner).then_some(shaded),
                    Look::Dragged => (!corner).then(|| scale(shaded, 1.15)),
                    Look::Flash { progress, big } => {
                        let pulse = (progress * std::f32::consts::PI * 3.0).sin().abs();
                        (big || !corner).then(|| mix(shaded, theme.spark, pulse * 0.7))
                    }
                    Look::Fade { progress } => {
                        (!corner && (progress < 0.5 || inner)).then(|| mix(shaded, theme.bg, progress))
                    }
                    Look::Blast { progress } => {
                        let glow = mix(theme.spark, theme.bomb, progress);
                        (progress < 0.5 || !inner).then(|| mix(glow, theme.bg, progress))
                    }
                };
                if let Some(c) = color {
                    self.put(x0 + lx, y0 + ly, c);
                }
            }
        }
        if sprite.chip.is_bomb() && matches!(sprite.look, Look::Resting | Look::Falling | Look::Dragged) {
            // Fuse.
            self.put(x0 + n - 2, y0, theme.spark);
        }
    }
}

/// Radial light from the top-left, as on a rounded pebble.
fn dome(color: Color, lx: usize, ly: usize) -> Color {
    let s = CHIP_PX as f32;
    let nx = (lx as f32 + 0.5) / s;
    let ny = (ly as f32 + 0.5) / s;
    let dist = (nx * nx + ny * ny).sqrt() / std::f32::consts::SQRT_2;
    scale(color, (1.12 - dist * 0.25).clamp(0.85, 1.15))
}

fn rgb(color: Color) -> (u8, u8, u8) {
    match color {
        Color::Rgb(r, g, b) => (r, g, b),
        Color::Red => (255, 0, 0),
        Color::Green => (0, 255, 0),
        Color::Yellow => (255, 255, 0),
        Color::Blue => (0, 0, 255),
        Color::Magenta => (255, 0, 255),
        Color::Cyan => (0, 255, 255),
        Color::Gray => (128, 128, 128),
        Color::DarkGray => (64, 64, 64),
        Color::White => (255, 255, 255),
        Color::Black => (0, 0, 0),
        _ => (128, 128, 128),
    }
}

fn scale(color: Color, factor: f32) -> Color {
    let (r, g, b) = rgb(color);
    let f = |c: u8| (c as f32 * factor).clamp(0.0, 255.0) as u8;
    Color::Rgb(f(r), f(g), f(b))
}

/// Linear blend from `a` (t = 0) to `b` (t = 1).
fn mix(a: Color, b: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let (ar, ag, ab) = rgb(a);
    let (br, bg, bb) = rgb(b);
    let m = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    Color::Rgb(m(ar, br), m(ag, bg), m(ab, bb))
}

fn draw_sidebar(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let board = &view.game.scoreboard;
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Stats (border + score, best, level)
            Constraint::Length(1), // gap
            Constraint::Length(4), // Moves (border + label + gauge)
            Constraint::Length(1), // gap
            Constraint::Length(4), // Objective (border + label + gauge)
            Constraint::Length(1), // gap
            Constraint::Length(4), // Colours (border + title + strip)
        ])
        .split(area);
    let boxed = |frame: &mut Frame, outer: Rect| {
        let block = Block::default().borders(Borders::ALL).border_style(border_style);
        let inner = block.inner(outer);
        block.render(outer, frame.buffer_mut());
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Length(1)])
            .split(inner)
    };

    let stats = boxed(frame, chunks[0]);
    let stat = |label: &str, value: String| {
        Line::from(vec![Span::styled(label.to_string(), title_style), Span::styled(value, fg_style)])
    };
    Paragraph::new(stat("Score: ", board.score.to_string())).render(stats[0], frame.buffer_mut());
    Paragraph::new(stat("Best:  ", board.best.to_string())).render(stats[1], frame.buffer_mut());
    Paragraph::new(stat("Level: ", format!("{}/{}", board.level, crate::counters::LEVEL_COUNT)))
        .render(stats[2], frame.buffer_mut());

    let moves = boxed(frame, chunks[2]);
    Paragraph::new(stat("Moves: ", board.moves_left.to_string())).render(moves[0], frame.buffer_mut());
    let moves_ratio = (board.moves_left as f64 / MOVES_PER_LEVEL as f64).min(1.0);
    let bar_color = if moves_ratio > 0.6 {
        Color::Green
    } else if moves_ratio > 0.3 {
        Color::Yellow
    } else {
        Color::Red
    };
    Gauge::default()
        .ratio(moves_ratio)
        .gauge_style(Style::default().fg(bar_color))
        .render(moves[1], frame.buffer_mut());

    let objective = boxed(frame, chunks[4]);
    let goal = theme.chip_color(board.objective);
    Paragraph::new(Line::from(vec![
        Span::styled("██ ", Style::default().fg(goal)),
        Span::styled(format!("{} / {}", board.objective_destroyed, board.target()), fg_style),
    ]))
    .render(objective[0], frame.buffer_mut());
    let objective_ratio = (board.objective_destroyed as f64 / board.target().max(1) as f64).min(1.0);
    Gauge::default()
        .ratio(objective_ratio)
        .gauge_style(Style::default().fg(goal))
        .render(objective[1], frame.buffer_mut());

    let colours = boxed(frame, chunks[6]);
    Paragraph::new(Line::from(Span::styled("Colours", title_style))).render(colours[0], frame.buffer_mut());
    draw_colour_strip(frame, view, colours[1]);
}

/// One swatch per colour in play.
fn draw_colour_strip(frame: &mut Frame, view: &View, area: Rect) {
    let count = view.game.grid().colors();
    let block_w = (area.width / count.max(1) as u16).max(1);
    for i in 0..count {
        let r = Rect {
            x: area.x + i as u16 * block_w,
            y: area.y,
            width: block_w.saturating_sub(1).max(1),
            height: area.height.min(1),
        }
        .intersection(area);
        let c = view.theme.chip_color(i);
        Paragraph::new("██").style(Style::default().fg(c).bg(c)).render(r, frame.buffer_mut());
    }
}

fn centered(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered(area, 28, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P Resume    Q Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

/// Level complete, out of moves, or all levels done.
fn draw_status_overlay(frame: &mut Frame, view: &View, status: Status, board: Rect) {
    let theme = view.theme;
    let sb = &view.game.scoreboard;
    let (title, title_style, hint) = match status {
        Status::LevelComplete => (
            format!(" Level {} complete ", sb.level),
            Style::default().fg(Color::Black).bg(Color::Green),
            " Enter Next level    Q Quit ",
        ),
        Status::GameOver => (
            " Out of moves ".to_string(),
            Style::default().fg(Color::White).bg(Color::Red),
            " R Restart    Q Quit ",
        ),
        Status::Victory => (
            " All levels cleared! ".to_string(),
            Style::default().fg(Color::Black).bg(theme.title),
            " R Play again    Q Quit ",
        ),
        Status::Playing => return,
    };
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(title, title_style)),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {} ", sb.score), Style::default().fg(theme.main_fg))),
        Line::from(Span::styled(format!(" Best: {} ", sb.best), Style::default().fg(theme.inactive_fg))),
    ];
    if status == Status::GameOver {
        lines.push(Line::from(Span::styled(
            format!(" Objective: {} / {} ", sb.objective_destroyed, sb.target()),
            Style::default().fg(theme.main_fg),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(hint, Style::default().fg(theme.main_fg))));

    let popup = centered(board, 30, lines.len() as u16 + 2);
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .title(Span::styled(" chiptui ", theme.title)),
        )
        .render(popup, frame.buffer_mut());
}

pub fn draw_quit_menu(frame: &mut Frame, theme: &Theme, selected: QuitOption) {
    let quit_rect = centered(frame.area(), 24, 8);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title))
        .title(" Quit? ");

    Clear.render(quit_rect, frame.buffer_mut());
    for y in quit_rect.y..quit_rect.y + quit_rect.height {
        for x in quit_rect.x..quit_rect.x + quit_rect.width {
            frame.buffer_mut()[(x, y)].set_style(Style::default().bg(theme.bg));
        }
    }
    let inner = block.inner(quit_rect);
    block.render(quit_rect, frame.buffer_mut());

    let options = [
        (QuitOption::Resume, " Resume "),
        (QuitOption::Restart, " Restart "),
        (QuitOption::Exit, " Exit "),
    ];
    for (i, (opt, label)) in options.iter().enumerate() {
        let style = if *opt == selected {
            Style::default().fg(theme.bg).bg(theme.title).bold()
        } else {
            Style::default().fg(theme.title)
        };
        let rx = inner.x + (inner.width.saturating_sub(label.len() as u16)) / 2;
        let ry = inner.y + 1 + i as u16 * 2;
        if ry < inner.y + inner.height {
            frame.buffer_mut().set_string(rx, ry, label, style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_rect_is_centered_with_sidebar() {
        let area = Rect::new(0, 0, 100, 40);
        let r = board_rect(area, 8, 8);
        assert_eq!((r.width, r.height), (32, 16));
        // outer 34 + sidebar 24 = 58 wide, centered in 100
        assert_eq!(r.x, 21 + 1);
        assert_eq!(r.y, 11 + 1);
    }

    #[test]
    fn mix_hits_both_ends() {
        let a = Color::Rgb(0, 100, 200);
        let b = Color::Rgb(200, 100, 0);
        assert_eq!(mix(a, b, 0.0), a);
        assert_eq!(mix(a, b, 1.0), b);
        assert_eq!(mix(a, b, 0.5), Color::Rgb(100, 100, 100));
    }

    #[test]
    fn resting_chip_leaves_corners_free() {
        let theme = Theme::default();
        let mut canvas = Canvas::new(8, 8, theme.bg);
        canvas.paint_sprite(
            &Sprite {
                x: 1.0,
                y: 0.0,
                chip: Chip::Color(0),
                look: Look::Resting,
            },
            &theme,
        );
        assert_eq!(canvas.get(4, 0), theme.bg);
        assert_ne!(canvas.get(5, 1), theme.bg);
        assert_eq!(canvas.get(3, 1), theme.bg);
    }

    #[test]
    fn sprites_above_the_board_are_clipped() {
        let theme = Theme::default();
        let mut canvas = Canvas::new(4, 4, theme.bg);
        canvas.paint_sprite(
            &Sprite {
                x: 0.0,
                y: -0.5,
                chip: Chip::Color(1),
                look: Look::Falling,
            },
            &theme,
        );
        assert_ne!(canvas.get(1, 0), theme.bg);
        assert_eq!(canvas.get(1, 2), theme.bg);
    }
}
