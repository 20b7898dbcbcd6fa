//! Layout and drawing: menu, board, sidebar, flood gauge, overlays.

use crate::app::{QuitOption, Screen, ScorePopup};
use crate::board::{BOARD_HEIGHT, BOARD_WIDTH};
use crate::game::{FLOOD_LIMIT, GameState, LINES_PER_LEVEL};
use crate::pipe::{PIPE_PX, Shape};
use crate::theme::{Theme, blend};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Each board cell is 2 columns × 1 row of terminal cells.
pub const CELL_W: u16 = 2;
pub const CELL_H: u16 = 1;

const SIDEBAR_WIDTH: u16 = 22;

/// Duration of the game-over overlay fade (TachyonFX).
const GAME_OVER_FADE_MS: u32 = 500;

/// Board block size including its border.
fn board_outer_size() -> (u16, u16) {
    (
        BOARD_WIDTH as u16 * CELL_W + 2,
        BOARD_HEIGHT as u16 * CELL_H + 2,
    )
}

/// Outer rect of the bordered board block, centered with the sidebar.
fn board_outer_rect(area: Rect) -> Rect {
    let (pw, ph) = board_outer_size();
    let total_w = pw + SIDEBAR_WIDTH;
    Rect {
        x: area.x + area.width.saturating_sub(total_w) / 2,
        y: area.y + area.height.saturating_sub(ph) / 2,
        width: pw.min(area.width),
        height: ph.min(area.height),
    }
}

/// Inner board rect (grid only, no border). Shared by drawing and mouse
/// hit-testing so clicks always agree with what is on screen.
pub fn board_rect(area: Rect) -> Rect {
    let outer = board_outer_rect(area);
    Rect {
        x: outer.x + 1,
        y: outer.y + 1,
        width: (BOARD_WIDTH as u16 * CELL_W).min(outer.width.saturating_sub(2)),
        height: (BOARD_HEIGHT as u16 * CELL_H).min(outer.height.saturating_sub(2)),
    }
}

/// Map a terminal position to a board cell: offset from the board origin,
/// divided by the cell size, truncated. None outside the grid.
pub fn cell_at(area: Rect, column: u16, row: u16) -> Option<(usize, usize)> {
    let rect = board_rect(area);
    if column < rect.x
        || row < rect.y
        || column >= rect.x + rect.width
        || row >= rect.y + rect.height
    {
        return None;
    }
    let x = ((column - rect.x) / CELL_W) as usize;
    let y = ((row - rect.y) / CELL_H) as usize;
    (x < BOARD_WIDTH && y < BOARD_HEIGHT).then_some((x, y))
}

/// Two-column glyph for a pipe shape.
fn shape_glyph(shape: Shape) -> &'static str {
    match shape {
        Shape::LeftRight => "──",
        Shape::TopBottom => "│ ",
        Shape::LeftTop => "┘ ",
        Shape::TopRight => "└─",
        Shape::RightBottom => "┌─",
        Shape::BottomLeft => "┐ ",
        Shape::Empty => "· ",
    }
}

/// Draw current screen (menu, game, quit menu, game over).
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    state: &GameState,
    theme: &Theme,
    cursor: (usize, usize),
    popups: &[ScorePopup],
    paused: bool,
    best_score: u32,
    quit_selected: Option<QuitOption>,
    game_over_effect: &mut Option<Effect>,
    effect_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let area = frame.area();
    match screen {
        Screen::Menu => draw_menu(frame, theme, best_score, area),
        Screen::Playing => {
            draw_game(frame, state, theme, cursor, popups, best_score, area);
            if paused {
                draw_pause_overlay(frame, theme, area);
            }
        }
        Screen::QuitMenu => {
            draw_game(frame, state, theme, cursor, popups, best_score, area);
            if let Some(opt) = quit_selected {
                draw_quit_menu(frame, theme, opt, area);
            }
        }
        Screen::GameOver => {
            draw_game(frame, state, theme, cursor, popups, best_score, area);
            draw_game_over(
                frame,
                state,
                theme,
                best_score,
                area,
                game_over_effect,
                effect_process_time,
                now,
            );
        }
    }
}

fn draw_menu(frame: &mut Frame, theme: &Theme, best_score: u32, area: Rect) {
    let popup_w = 44u16;
    let popup_h = 14u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };

    let title = Line::from(vec![
        Span::styled(" flood ", Style::default().fg(theme.water).bold()),
        Span::styled(" tui ", Style::default().fg(theme.main_fg).bold()),
    ]);

    let fg = Style::default().fg(theme.main_fg);
    let mut lines = vec![
        Line::from(""),
        title,
        Line::from(""),
        Line::from(Span::styled(
            "Rotate pipes, route water off the right edge",
            fg,
        )),
        Line::from(Span::styled("before the flood meter fills.", fg)),
        Line::from(""),
        Line::from(Span::styled("Arrows/hjkl move  Z/X rotate", fg)),
        Line::from(Span::styled("Mouse: left CCW, right CW", fg)),
        Line::from(""),
        Line::from(Span::styled(
            " Enter — Start    Q — Quit ",
            Style::default().fg(theme.title).bold(),
        )),
    ];
    if best_score > 0 {
        lines.push(Line::from(Span::styled(format!("Best: {best_score}"), fg)));
    }
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .title(Span::styled(" floodtui ", Style::default().fg(theme.title))),
    );
    p.render(popup, frame.buffer_mut());
}

/// Draw game: bordered board + sidebar, centered.
fn draw_game(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    cursor: (usize, usize),
    popups: &[ScorePopup],
    best_score: u32,
    area: Rect,
) {
    let outer = board_outer_rect(area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(
            format!(" floodtui  Level {} ", state.level),
            Style::default().fg(theme.title),
        ));
    block.render(outer, frame.buffer_mut());

    draw_board(frame, state, theme, cursor, area);
    draw_popups(frame, theme, popups, area);

    let sidebar = Rect {
        x: outer.x + outer.width,
        y: outer.y,
        width: SIDEBAR_WIDTH.min(area.width.saturating_sub(outer.x + outer.width - area.x)),
        height: outer.height,
    };
    draw_sidebar(frame, state, theme, sidebar, best_score);
}

fn draw_board(frame: &mut Frame, state: &GameState, theme: &Theme, cursor: (usize, usize), area: Rect) {
    let rect = board_rect(area);
    let buf = frame.buffer_mut();
    let board = &state.board;

    // Base pass: authoritative cells, with fading/rotating overlays drawn in
    // place and cells owned by a falling overlay left empty.
    for y in 0..BOARD_HEIGHT {
        for x in 0..BOARD_WIDTH {
            let rx = rect.x + x as u16 * CELL_W;
            let ry = rect.y + y as u16 * CELL_H;
            if rx >= rect.x + rect.width || ry >= rect.y + rect.height {
                continue;
            }

            let (glyph, fg) = if let Some(fade) = board.fading().get(&(x, y)) {
                // Cleared chain fading out: water colour sinking into the bg.
                let t = 1.0 - fade.alpha();
                (shape_glyph(fade.shape()), blend(theme.water, theme.bg, t))
            } else if let Some(rot) = board.rotating().get(&(x, y)) {
                // Old shape dims out while the quarter turn plays.
                let t = rot.progress() * 0.7;
                (shape_glyph(rot.shape()), blend(theme.pipe, theme.bg, t))
            } else if board.falling().contains_key(&(x, y)) {
                (shape_glyph(Shape::Empty), theme.div_line)
            } else {
                let shape = board.shape(x, y);
                let fg = if shape == Shape::Empty {
                    theme.div_line
                } else if board.is_filled(x, y) {
                    theme.water
                } else {
                    theme.pipe
                };
                (shape_glyph(shape), fg)
            };

            let mut style = Style::default().fg(fg).bg(theme.bg);
            if (x, y) == cursor {
                style = style.bg(theme.div_line).bold();
            }
            buf.set_string(rx, ry, glyph, style);
        }
    }

    // Falling pass: draw each falling pipe displaced upward by its offset.
    for (&(x, y), falling) in board.falling() {
        let rows_up = ((falling.vertical_offset() + PIPE_PX / 2) / PIPE_PX) as usize;
        if rows_up > y {
            continue; // still above the board
        }
        let draw_y = y - rows_up;
        let rx = rect.x + x as u16 * CELL_W;
        let ry = rect.y + draw_y as u16 * CELL_H;
        if rx < rect.x + rect.width && ry < rect.y + rect.height {
            let style = Style::default().fg(theme.pipe).bg(theme.bg);
            buf.set_string(rx, ry, shape_glyph(falling.shape()), style);
        }
    }
}

fn draw_popups(frame: &mut Frame, theme: &Theme, popups: &[ScorePopup], area: Rect) {
    let rect = board_rect(area);
    let buf = frame.buffer_mut();
    for popup in popups {
        let rx = rect.x + popup.x as u16 * CELL_W;
        let ry = rect.y + popup.y as u16 * CELL_H;
        if rx < rect.x + rect.width && ry < rect.y + rect.height {
            let label = format!("+{}", popup.points);
            let style = Style::default().fg(theme.title).bg(theme.bg).bold();
            buf.set_string(rx, ry, label, style);
        }
    }
}

fn draw_sidebar(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect, best_score: u32) {
    let title_style = Style::default().fg(theme.title);
    let fg = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // stats
            Constraint::Length(1), // gap
            Constraint::Length(3), // flood gauge
            Constraint::Fill(1),   // help
        ])
        .split(area);

    let stats_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let stats_inner = stats_block.inner(chunks[0]);
    stats_block.render(chunks[0], frame.buffer_mut());
    Paragraph::new(vec![
        Line::from(Span::styled("Stats", title_style)),
        Line::from(Span::styled(format!("Score  {}", state.score), fg)),
        Line::from(Span::styled(format!("Best   {best_score}"), fg)),
        Line::from(Span::styled(
            format!("Lines  {}/{}", state.lines_this_level, LINES_PER_LEVEL),
            fg,
        )),
    ])
    .render(stats_inner, frame.buffer_mut());

    let ratio = f64::from((state.flood_level / FLOOD_LIMIT).clamp(0.0, 1.0));
    Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled("Flood", title_style)),
        )
        .gauge_style(Style::default().fg(theme.flood).bg(theme.bg))
        .ratio(ratio)
        .label(format!("{:.0}%", state.flood_level))
        .render(chunks[2], frame.buffer_mut());

    Paragraph::new(vec![
        Line::from(Span::styled("Z/X rotate", fg)),
        Line::from(Span::styled("P pause  Q quit", fg)),
    ])
    .render(chunks[3], frame.buffer_mut());
}

fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered_popup(area, 26, 5);
    Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused — P to resume ",
            Style::default().fg(theme.title).bold(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    )
    .render(popup, frame.buffer_mut());
}

fn draw_quit_menu(frame: &mut Frame, theme: &Theme, selected: QuitOption, area: Rect) {
    let popup = centered_popup(area, 26, 7);
    let entry = |label: &str, opt: QuitOption| {
        let style = if opt == selected {
            Style::default().fg(Color::Black).bg(theme.title).bold()
        } else {
            Style::default().fg(theme.main_fg)
        };
        Line::from(Span::styled(format!(" {label} "), style))
    };
    Paragraph::new(vec![
        Line::from(""),
        entry("Resume", QuitOption::Resume),
        entry("Main menu", QuitOption::MainMenu),
        entry("Exit", QuitOption::Exit),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .title(Span::styled(" Quit? ", Style::default().fg(theme.title))),
    )
    .render(popup, frame.buffer_mut());
}

/// Game-over popup with a TachyonFX fade-in; the effect handle lives in the
/// app and is created on first draw after the transition.
fn draw_game_over(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    best_score: u32,
    area: Rect,
    game_over_effect: &mut Option<Effect>,
    effect_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let popup = centered_popup(area, 30, 10);
    let fg = Style::default().fg(theme.main_fg);
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " The board flooded! ",
            Style::default().fg(Color::White).bg(theme.flood),
        )),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {} ", state.score), fg)),
        Line::from(Span::styled(format!(" Level: {} ", state.level), fg)),
    ];
    if state.score >= best_score && state.score > 0 {
        lines.push(Line::from(Span::styled(
            " New record! ",
            Style::default().fg(theme.title).bold(),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" R — Restart    Q — Quit ", fg)));
    Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .title(Span::styled(" floodtui ", Style::default().fg(theme.title))),
    )
    .render(popup, frame.buffer_mut());

    let delta = effect_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let tfx_delta = TfxDuration::from_millis(delta.as_millis().min(u128::from(u32::MAX)) as u32);
    *effect_process_time = Some(now);

    if game_over_effect.is_none() {
        let effect = fx::fade_from(theme.bg, theme.bg, (GAME_OVER_FADE_MS, Interpolation::Linear))
            .with_area(popup);
        *game_over_effect = Some(effect);
    }
    if let Some(effect) = game_over_effect {
        if !effect.done() {
            frame.render_effect(effect, popup, tfx_delta);
        }
    }
}
