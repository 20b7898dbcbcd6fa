//! Game state: board, flood meter, scoring, level progression, tick driver.

use crate::board::{BOARD_HEIGHT, BOARD_WIDTH, Board, Coord};
use crate::pipe::{Direction, Shape};

/// Flood meter value that ends the game once exceeded.
pub const FLOOD_LIMIT: f32 = 100.0;

/// Seconds between flood meter increases.
pub const FLOOD_INTERVAL: f32 = 1.0;

/// Scoring chains needed to advance a level.
pub const LINES_PER_LEVEL: u32 = 10;

/// A rotate request for one cell, applied on the next settled tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotateCommand {
    pub x: usize,
    pub y: usize,
    pub clockwise: bool,
}

/// One-shot signals for the shell; drained with [`GameState::take_events`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    /// A chain scored: cell count, points awarded, last-discovered cell.
    ChainScored { cells: u32, points: u32, at: Coord },
    LevelUp(u32),
    GameOver,
}

/// Score for a completed chain of `cells` pipes.
pub fn chain_score(cells: u32) -> u32 {
    let n = cells as f32;
    ((n / 5.0).powi(2) * 10.0 + n * 10.0).round() as u32
}

/// Everything the simulation owns. Construct fresh to play again after a
/// game over; level-ups reset only the flood meter and per-level counter.
pub struct GameState {
    pub board: Board,
    pub score: u32,
    pub flood_level: f32,
    pub flood_rate: f32,
    pub lines_this_level: u32,
    pub level: u32,
    pub game_over: bool,
    flood_accel: f32,
    flood_timer: f32,
    pending_rotate: Option<RotateCommand>,
    events: Vec<GameEvent>,
}

impl GameState {
    pub fn new(seed: u64, flood_rate: f32, flood_accel: f32) -> Self {
        let mut board = Board::new(seed);
        board.refill(false);
        Self {
            board,
            score: 0,
            flood_level: 0.0,
            flood_rate,
            flood_accel,
            lines_this_level: 0,
            level: 1,
            game_over: false,
            flood_timer: 0.0,
            pending_rotate: None,
            events: Vec::new(),
        }
    }

    /// Queue a rotate for the next settled tick. A newer request replaces an
    /// unapplied older one; the shell owns the debounce cadence.
    pub fn queue_rotate(&mut self, x: usize, y: usize, clockwise: bool) {
        if x < BOARD_WIDTH && y < BOARD_HEIGHT {
            self.pending_rotate = Some(RotateCommand { x, y, clockwise });
        }
    }

    /// Drain pending one-shot events.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advance one tick. While the board is animating only animations move;
    /// once settled, input is applied, every row's connectivity is evaluated
    /// and scored, and the board refills.
    pub fn tick(&mut self, dt: f32) {
        if self.game_over {
            return;
        }

        self.flood_timer += dt;
        while self.flood_timer >= FLOOD_INTERVAL {
            self.flood_timer -= FLOOD_INTERVAL;
            self.flood_level += self.flood_rate;
        }
        if self.flood_level > FLOOD_LIMIT {
            self.game_over = true;
            self.events.push(GameEvent::GameOver);
            return;
        }

        if self.board.is_animating() {
            self.board.advance_animations();
            return;
        }

        if let Some(cmd) = self.pending_rotate.take() {
            let snapshot = self.board.shape(cmd.x, cmd.y);
            if snapshot != Shape::Empty {
                self.board.rotate_pipe(cmd.x, cmd.y, cmd.clockwise);
                self.board.add_rotating(cmd.x, cmd.y, snapshot, cmd.clockwise);
            }
        }

        self.board.reset_water();
        for y in 0..BOARD_HEIGHT {
            let chain = self.board.evaluate_row(y).to_vec();
            self.check_scoring_chain(&chain);
        }
        self.board.refill(true);
    }

    /// A chain scores when its last-discovered cell sits in the rightmost
    /// column with a Right connector. Discovery order matters: a chain that
    /// touches the right edge mid-walk does not score.
    fn check_scoring_chain(&mut self, chain: &[Coord]) {
        let Some(&(lx, ly)) = chain.last() else {
            return;
        };
        if lx != BOARD_WIDTH - 1 || !self.board.has_connector(lx, ly, Direction::Right) {
            return;
        }

        let points = chain_score(chain.len() as u32);
        self.score += points;
        self.flood_level = (self.flood_level - points as f32 / 10.0).max(0.0);

        for &(x, y) in chain {
            let shape = self.board.shape(x, y);
            self.board.add_fading(x, y, shape);
            self.board.set_shape(x, y, Shape::Empty);
        }

        self.events.push(GameEvent::ChainScored {
            cells: chain.len() as u32,
            points,
            at: (lx, ly),
        });

        self.lines_this_level += 1;
        if self.lines_this_level >= LINES_PER_LEVEL {
            self.level_up();
        }
    }

    /// Next level: faster flood, fresh board without the gravity animation.
    /// Score and level number carry over.
    fn level_up(&mut self) {
        self.level += 1;
        self.lines_this_level = 0;
        self.flood_level = 0.0;
        self.flood_rate += self.flood_accel;
        self.board.clear();
        self.board.refill(false);
        self.events.push(GameEvent::LevelUp(self.level));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::ROTATION_TICKS;

    fn quiet_state(seed: u64) -> GameState {
        // Zero flood rate keeps the meter out of the way of board tests.
        GameState::new(seed, 0.0, 0.0)
    }

    fn set_row(state: &mut GameState, y: usize, shape: Shape) {
        for x in 0..BOARD_WIDTH {
            state.board.set_shape(x, y, shape);
        }
    }

    /// Rig a board so no row can score: verticals everywhere.
    fn unscorable(state: &mut GameState) {
        for y in 0..BOARD_HEIGHT {
            set_row(state, y, Shape::TopBottom);
        }
    }

    #[test]
    fn test_chain_score_formula() {
        assert_eq!(chain_score(8), 106);
        assert_eq!(chain_score(5), 60);
        assert_eq!(chain_score(10), 140);
    }

    #[test]
    fn test_full_row_scores_and_fades() {
        let mut state = quiet_state(3);
        unscorable(&mut state);
        set_row(&mut state, 0, Shape::LeftRight);
        state.tick(0.0);

        assert_eq!(state.score, 106);
        assert_eq!(state.lines_this_level, 1);
        assert_eq!(state.board.fading().len(), BOARD_WIDTH);
        for x in 0..BOARD_WIDTH {
            assert!(state.board.fading().contains_key(&(x, 0)));
        }
        // Row 0 went Empty, then refill randomized it with full-height drops.
        for x in 0..BOARD_WIDTH {
            assert_ne!(state.board.shape(x, 0), Shape::Empty);
            assert_eq!(
                state.board.falling()[&(x, 0)].vertical_offset(),
                crate::pipe::PIPE_PX * BOARD_HEIGHT as i32
            );
        }
        let events = state.take_events();
        assert!(matches!(
            events[..],
            [GameEvent::ChainScored {
                cells: 8,
                points: 106,
                at: (7, 0),
            }]
        ));
    }

    #[test]
    fn test_chain_touching_edge_mid_walk_does_not_score() {
        // Row 1 runs to the right edge, pokes up into row 0 at the last
        // column, and the walk ends there without a Right connector on the
        // last-discovered cell. The chain must not score.
        let mut state = quiet_state(3);
        unscorable(&mut state);
        for x in 0..BOARD_WIDTH - 1 {
            state.board.set_shape(x, 1, Shape::LeftRight);
        }
        state.board.set_shape(BOARD_WIDTH - 1, 1, Shape::LeftTop);
        state.board.set_shape(BOARD_WIDTH - 1, 0, Shape::TopBottom);
        state.tick(0.0);
        assert_eq!(state.score, 0);
        assert!(state.board.fading().is_empty());
    }

    #[test]
    fn test_flood_meter_accumulates_and_overflows() {
        let mut state = GameState::new(3, 10.0, 0.0);
        unscorable(&mut state);
        for _ in 0..10 {
            state.tick(1.0);
        }
        assert!((state.flood_level - 100.0).abs() < f32::EPSILON);
        assert!(!state.game_over);
        state.tick(1.0);
        assert!(state.game_over);
        assert!(state.take_events().contains(&GameEvent::GameOver));
        // Terminal: further ticks change nothing.
        let score = state.score;
        state.tick(5.0);
        assert_eq!(state.score, score);
    }

    #[test]
    fn test_scoring_lowers_flood_with_floor() {
        let mut state = GameState::new(3, 5.0, 0.0);
        unscorable(&mut state);
        state.tick(1.0);
        assert!((state.flood_level - 5.0).abs() < f32::EPSILON);
        // Chain worth 106 points drains 10.6, floored at 0.
        set_row(&mut state, 0, Shape::LeftRight);
        state.tick(0.0);
        assert_eq!(state.flood_level, 0.0);
    }

    #[test]
    fn test_no_simulation_while_animating() {
        let mut state = quiet_state(3);
        unscorable(&mut state);
        state.board.add_fading(0, 0, Shape::LeftRight);
        set_row(&mut state, 2, Shape::LeftRight);
        state.tick(0.0);
        // Fading blocked the connectivity pass entirely.
        assert_eq!(state.score, 0);
        assert_eq!(state.board.shape(0, 2), Shape::LeftRight);
        // Once the fade runs out the next tick settles and scores.
        for _ in 0..60 {
            state.tick(0.0);
        }
        assert_eq!(state.score, 106);
    }

    #[test]
    fn test_rotate_applies_once_and_spawns_overlay() {
        let mut state = quiet_state(3);
        unscorable(&mut state);
        state.board.set_shape(4, 4, Shape::LeftTop);
        state.queue_rotate(4, 4, true);
        state.tick(0.0);
        assert_eq!(state.board.shape(4, 4), Shape::TopRight);
        let overlay = state.board.rotating()[&(4, 4)];
        assert_eq!(overlay.shape(), Shape::LeftTop, "pre-rotation snapshot");
        // Command consumed: the overlay plays out, no second rotation.
        for _ in 0..=ROTATION_TICKS {
            state.tick(0.0);
        }
        assert_eq!(state.board.shape(4, 4), Shape::TopRight);
    }

    #[test]
    fn test_rotate_on_empty_cell_is_ignored() {
        let mut state = quiet_state(3);
        unscorable(&mut state);
        state.board.set_shape(4, 4, Shape::Empty);
        state.queue_rotate(4, 4, true);
        state.tick(0.0);
        assert!(state.board.rotating().is_empty());
    }

    #[test]
    fn test_level_up_resets_flood_and_counter() {
        let mut state = GameState::new(3, 1.0, 0.5);
        state.lines_this_level = LINES_PER_LEVEL - 1;
        state.flood_level = 40.0;
        state.score = 500;
        unscorable(&mut state);
        // Scoring row is the last one scanned, so the reseeded board is not
        // itself evaluated during this tick.
        set_row(&mut state, BOARD_HEIGHT - 1, Shape::LeftRight);
        state.tick(0.0);

        assert_eq!(state.level, 2);
        assert_eq!(state.lines_this_level, 0);
        assert_eq!(state.flood_level, 0.0);
        assert!((state.flood_rate - 1.5).abs() < f32::EPSILON);
        assert_eq!(state.score, 500 + 106);
        // Reseed is instantaneous: a full board and no falling overlays.
        assert!(state.board.falling().is_empty());
        for y in 0..BOARD_HEIGHT {
            for x in 0..BOARD_WIDTH {
                assert_ne!(state.board.shape(x, y), Shape::Empty);
            }
        }
        let events = state.take_events();
        assert!(events.contains(&GameEvent::LevelUp(2)));
    }

    #[test]
    fn test_queue_rotate_out_of_bounds_ignored() {
        let mut state = quiet_state(3);
        state.queue_rotate(BOARD_WIDTH, 0, true);
        state.queue_rotate(0, BOARD_HEIGHT, false);
        assert_eq!(state.pending_rotate, None);
    }
}
