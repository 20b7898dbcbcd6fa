//! Board: the 8×10 pipe grid, water propagation, refill, animation overlays.

use crate::anim::{FadingPipe, FallingPipe, RotatingPipe};
use crate::pipe::{Direction, PIPE_PX, Pipe, Shape, SourceRect};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use std::collections::HashMap;

pub const BOARD_WIDTH: usize = 8;
pub const BOARD_HEIGHT: usize = 10;

/// Grid coordinate, (x, y) with y growing downward.
pub type Coord = (usize, usize);

/// The authoritative pipe grid plus sparse animation overlays.
///
/// Animation variants live beside the grid, keyed by coordinate; a cell's
/// shape and its animation progress have different lifetimes, so presence in
/// an overlay never changes what connectivity or scoring sees. Coordinates
/// passed to any query or mutation must be inside the board; out-of-bounds
/// access is a contract violation and panics in every build.
pub struct Board {
    cells: [Pipe; BOARD_WIDTH * BOARD_HEIGHT],
    falling: HashMap<Coord, FallingPipe>,
    rotating: HashMap<Coord, RotatingPipe>,
    fading: HashMap<Coord, FadingPipe>,
    /// Discovery-order chain of the most recent `evaluate_row` call.
    water_trace: Vec<Coord>,
    rng: Pcg32,
}

impl Board {
    pub fn new(seed: u64) -> Self {
        Self {
            cells: [Pipe::default(); BOARD_WIDTH * BOARD_HEIGHT],
            falling: HashMap::new(),
            rotating: HashMap::new(),
            fading: HashMap::new(),
            water_trace: Vec::with_capacity(BOARD_WIDTH * BOARD_HEIGHT),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    fn index(x: usize, y: usize) -> usize {
        assert!(
            x < BOARD_WIDTH && y < BOARD_HEIGHT,
            "coordinates ({x}, {y}) out of the board"
        );
        y * BOARD_WIDTH + x
    }

    fn pipe(&self, x: usize, y: usize) -> &Pipe {
        &self.cells[Self::index(x, y)]
    }

    fn pipe_mut(&mut self, x: usize, y: usize) -> &mut Pipe {
        &mut self.cells[Self::index(x, y)]
    }

    /// Reset every cell to Empty and drop the water flags. Does not touch
    /// animation overlays.
    pub fn clear(&mut self) {
        for pipe in &mut self.cells {
            pipe.set_shape(Shape::Empty);
            pipe.set_filled(false);
        }
    }

    pub fn shape(&self, x: usize, y: usize) -> Shape {
        self.pipe(x, y).shape()
    }

    pub fn set_shape(&mut self, x: usize, y: usize, shape: Shape) {
        self.pipe_mut(x, y).set_shape(shape);
    }

    pub fn has_connector(&self, x: usize, y: usize, dir: Direction) -> bool {
        self.pipe(x, y).has_connector(dir)
    }

    pub fn is_filled(&self, x: usize, y: usize) -> bool {
        self.pipe(x, y).is_filled()
    }

    pub fn source_rect(&self, x: usize, y: usize) -> SourceRect {
        self.pipe(x, y).source_rect()
    }

    pub fn rotate_pipe(&mut self, x: usize, y: usize, clockwise: bool) {
        self.pipe_mut(x, y).rotate(clockwise);
    }

    /// Assign a uniformly random solid shape to the cell.
    pub fn randomize_pipe(&mut self, x: usize, y: usize) {
        let shape = Shape::SOLID[self.rng.random_range(0..Shape::SOLID.len())];
        self.pipe_mut(x, y).set_shape(shape);
    }

    /// Drop the water flag on every cell. Called once before the row-by-row
    /// connectivity scan; flags then track visitation for the whole pass.
    pub fn reset_water(&mut self) {
        for pipe in &mut self.cells {
            pipe.set_filled(false);
        }
    }

    /// Pull the nearest non-empty pipe above (x, y) down into it, spawning a
    /// falling animation whose offset matches the rows travelled.
    pub fn fill_from_above(&mut self, x: usize, y: usize) {
        let _ = Self::index(x, y);
        for above in (0..y).rev() {
            let shape = self.shape(x, above);
            if shape != Shape::Empty {
                self.set_shape(x, y, shape);
                self.set_shape(x, above, Shape::Empty);
                self.add_falling(x, y, shape, PIPE_PX * (y - above) as i32);
                return;
            }
        }
    }

    /// Fill every empty cell. With `drop_pipes`, pipes above holes slide down
    /// first and the remaining holes get random pipes falling in from above
    /// the board; without it (level reseed) the fill is instantaneous.
    pub fn refill(&mut self, drop_pipes: bool) {
        if drop_pipes {
            for x in 0..BOARD_WIDTH {
                for y in (0..BOARD_HEIGHT).rev() {
                    if self.shape(x, y) == Shape::Empty {
                        self.fill_from_above(x, y);
                    }
                }
            }
        }
        for y in 0..BOARD_HEIGHT {
            for x in 0..BOARD_WIDTH {
                if self.shape(x, y) == Shape::Empty {
                    self.randomize_pipe(x, y);
                    if drop_pipes {
                        let shape = self.shape(x, y);
                        self.add_falling(x, y, shape, PIPE_PX * BOARD_HEIGHT as i32);
                    }
                }
            }
        }
    }

    /// Flood row `y` from an implicit source left of column 0 and return the
    /// chain of visited coordinates in discovery order.
    ///
    /// Water flags are deliberately not reset here: the driver resets them
    /// once before scanning all rows, so a chain that snakes vertically into
    /// another row is not revisited by that row's own scan.
    pub fn evaluate_row(&mut self, y: usize) -> &[Coord] {
        assert!(y < BOARD_HEIGHT, "row {y} out of the board");
        self.water_trace.clear();
        self.propagate_water(0, y as i32, Direction::Left);
        &self.water_trace
    }

    /// Depth-first water propagation. Each cell is visited at most once per
    /// pass (guarded by the water flag), bounding recursion by the board area.
    fn propagate_water(&mut self, x: i32, y: i32, from: Direction) {
        if x < 0 || x >= BOARD_WIDTH as i32 || y < 0 || y >= BOARD_HEIGHT as i32 {
            return;
        }
        let (ux, uy) = (x as usize, y as usize);
        {
            let pipe = self.pipe(ux, uy);
            if !pipe.has_connector(from) || pipe.is_filled() {
                return;
            }
        }
        self.pipe_mut(ux, uy).set_filled(true);
        self.water_trace.push((ux, uy));
        for dir in Direction::ALL {
            if dir == from || !self.pipe(ux, uy).has_connector(dir) {
                continue;
            }
            let (dx, dy) = dir.step();
            self.propagate_water(x + dx, y + dy, dir.opposite());
        }
    }

    pub fn is_animating(&self) -> bool {
        !self.falling.is_empty() || !self.rotating.is_empty() || !self.fading.is_empty()
    }

    /// Advance animation overlays one step and drop finished ones.
    ///
    /// Fading takes priority: while any cleared pipe is still fading out,
    /// falling and rotating pipes hold so the fade finishes before the next
    /// refill pass becomes visible.
    pub fn advance_animations(&mut self) {
        if self.fading.is_empty() {
            self.falling.retain(|_, pipe| {
                pipe.advance();
                !pipe.is_done()
            });
            self.rotating.retain(|_, pipe| {
                pipe.advance();
                !pipe.is_done()
            });
        } else {
            self.fading.retain(|_, pipe| {
                pipe.advance();
                !pipe.is_done()
            });
        }
    }

    pub fn add_falling(&mut self, x: usize, y: usize, shape: Shape, vertical_offset: i32) {
        let _ = Self::index(x, y);
        self.falling
            .insert((x, y), FallingPipe::new(shape, vertical_offset));
    }

    pub fn add_rotating(&mut self, x: usize, y: usize, shape: Shape, clockwise: bool) {
        let _ = Self::index(x, y);
        self.rotating
            .insert((x, y), RotatingPipe::new(shape, clockwise));
    }

    pub fn add_fading(&mut self, x: usize, y: usize, shape: Shape) {
        let _ = Self::index(x, y);
        self.fading.insert((x, y), FadingPipe::new(shape));
    }

    pub fn falling(&self) -> &HashMap<Coord, FallingPipe> {
        &self.falling
    }

    pub fn rotating(&self) -> &HashMap<Coord, RotatingPipe> {
        &self.rotating
    }

    pub fn fading(&self) -> &HashMap<Coord, FadingPipe> {
        &self.fading
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::ROTATION_TICKS;

    fn straight_row(board: &mut Board, y: usize) {
        for x in 0..BOARD_WIDTH {
            board.set_shape(x, y, Shape::LeftRight);
        }
    }

    #[test]
    fn test_new_board_is_empty_and_still() {
        let board = Board::new(1);
        for y in 0..BOARD_HEIGHT {
            for x in 0..BOARD_WIDTH {
                assert_eq!(board.shape(x, y), Shape::Empty);
            }
        }
        assert!(!board.is_animating());
    }

    #[test]
    fn test_evaluate_empty_row_is_empty_chain() {
        let mut board = Board::new(1);
        assert!(board.evaluate_row(3).is_empty());
    }

    #[test]
    fn test_straight_row_chain_in_order() {
        let mut board = Board::new(1);
        straight_row(&mut board, 0);
        let chain: Vec<Coord> = board.evaluate_row(0).to_vec();
        let expected: Vec<Coord> = (0..BOARD_WIDTH).map(|x| (x, 0)).collect();
        assert_eq!(chain, expected);
        let &(lx, ly) = chain.last().unwrap();
        assert_eq!(lx, BOARD_WIDTH - 1);
        assert!(board.has_connector(lx, ly, Direction::Right));
    }

    #[test]
    fn test_chain_snakes_between_rows() {
        // Row 0: water runs right then turns down at column 2; row 1 brings
        // it back up at column 3 and on to the right edge of row 0.
        let mut board = Board::new(1);
        board.set_shape(0, 0, Shape::LeftRight);
        board.set_shape(1, 0, Shape::LeftRight);
        board.set_shape(2, 0, Shape::BottomLeft);
        board.set_shape(2, 1, Shape::TopRight);
        board.set_shape(3, 1, Shape::LeftTop);
        board.set_shape(3, 0, Shape::RightBottom);
        for x in 4..BOARD_WIDTH {
            board.set_shape(x, 0, Shape::LeftRight);
        }
        let chain = board.evaluate_row(0).to_vec();
        assert!(chain.contains(&(2, 1)));
        assert!(chain.contains(&(3, 1)));
        assert_eq!(chain.last(), Some(&(BOARD_WIDTH - 1, 0)));
        assert_eq!(chain.len(), BOARD_WIDTH + 2);
    }

    #[test]
    fn test_closed_loop_terminates_without_revisit() {
        // 2×2 loop at (1,1)-(2,2), reachable from the left via (0,1).
        let mut board = Board::new(1);
        board.set_shape(0, 1, Shape::LeftRight);
        board.set_shape(1, 1, Shape::LeftRight);
        board.set_shape(2, 1, Shape::BottomLeft);
        board.set_shape(2, 2, Shape::LeftTop);
        board.set_shape(1, 2, Shape::TopRight);
        let chain = board.evaluate_row(1).to_vec();
        let mut unique = chain.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), chain.len(), "cell visited twice: {chain:?}");
    }

    #[test]
    fn test_detached_loop_is_unreachable() {
        let mut board = Board::new(1);
        // Closed loop not touching the left edge.
        board.set_shape(3, 3, Shape::RightBottom);
        board.set_shape(4, 3, Shape::BottomLeft);
        board.set_shape(4, 4, Shape::LeftTop);
        board.set_shape(3, 4, Shape::TopRight);
        assert!(board.evaluate_row(3).is_empty());
    }

    #[test]
    fn test_earlier_row_water_blocks_revisit() {
        // A cell claimed by row 0's chain stays claimed during row 1's scan.
        let mut board = Board::new(1);
        straight_row(&mut board, 0);
        board.reset_water();
        let first = board.evaluate_row(0).len();
        assert_eq!(first, BOARD_WIDTH);
        // Row 0 cells are still filled; a row-1 path poking up into row 0
        // stops at the already-visited cell.
        board.set_shape(0, 1, Shape::LeftRight);
        board.set_shape(1, 1, Shape::LeftTop);
        let chain = board.evaluate_row(1).to_vec();
        assert_eq!(chain, vec![(0, 1), (1, 1)]);
    }

    #[test]
    fn test_refill_full_board_is_noop() {
        let mut board = Board::new(1);
        board.refill(false);
        let before: Vec<Shape> = (0..BOARD_HEIGHT)
            .flat_map(|y| (0..BOARD_WIDTH).map(move |x| (x, y)))
            .map(|(x, y)| board.shape(x, y))
            .collect();
        board.refill(true);
        let after: Vec<Shape> = (0..BOARD_HEIGHT)
            .flat_map(|y| (0..BOARD_WIDTH).map(move |x| (x, y)))
            .map(|(x, y)| board.shape(x, y))
            .collect();
        assert_eq!(before, after);
        assert!(board.falling().is_empty());
    }

    #[test]
    fn test_refill_drops_and_animates() {
        let mut board = Board::new(7);
        board.refill(false);
        assert!(!board.is_animating());
        // Hole at the bottom of column 2: the pipe above slides down one row.
        let above = board.shape(2, BOARD_HEIGHT - 2);
        board.set_shape(2, BOARD_HEIGHT - 1, Shape::Empty);
        board.refill(true);
        assert_eq!(board.shape(2, BOARD_HEIGHT - 1), above);
        let falling = board.falling();
        assert_eq!(
            falling[&(2, BOARD_HEIGHT - 1)].vertical_offset(),
            PIPE_PX,
            "one row of fall"
        );
        // The vacated top of the column was refilled from above the board.
        assert_eq!(falling[&(2, 0)].vertical_offset(), PIPE_PX * BOARD_HEIGHT as i32);
    }

    #[test]
    fn test_level_reseed_is_instant() {
        let mut board = Board::new(9);
        board.clear();
        board.refill(false);
        assert!(board.falling().is_empty());
        assert!(!board.is_animating());
        for y in 0..BOARD_HEIGHT {
            for x in 0..BOARD_WIDTH {
                assert_ne!(board.shape(x, y), Shape::Empty);
            }
        }
    }

    #[test]
    fn test_seeded_boards_match() {
        let mut a = Board::new(42);
        let mut b = Board::new(42);
        a.refill(false);
        b.refill(false);
        for y in 0..BOARD_HEIGHT {
            for x in 0..BOARD_WIDTH {
                assert_eq!(a.shape(x, y), b.shape(x, y));
            }
        }
    }

    #[test]
    fn test_fading_blocks_other_animations() {
        let mut board = Board::new(1);
        board.add_falling(0, 0, Shape::TopBottom, PIPE_PX * BOARD_HEIGHT as i32);
        board.add_rotating(1, 0, Shape::LeftTop, true);
        board.add_fading(2, 0, Shape::LeftRight);
        let offset_before = board.falling()[&(0, 0)].vertical_offset();
        board.advance_animations();
        assert_eq!(board.falling()[&(0, 0)].vertical_offset(), offset_before);
        assert_eq!(board.rotating()[&(1, 0)].ticks_remaining(), ROTATION_TICKS);
        assert!(board.fading()[&(2, 0)].alpha() < 1.0);
        // Fade out completely; falling and rotating then advance.
        for _ in 0..60 {
            board.advance_animations();
        }
        assert!(board.fading().is_empty());
        assert!(board.falling()[&(0, 0)].vertical_offset() < offset_before);
    }

    #[test]
    fn test_finished_variants_are_removed() {
        let mut board = Board::new(1);
        board.add_falling(4, 4, Shape::TopBottom, crate::anim::FALL_RATE);
        board.add_rotating(5, 4, Shape::LeftTop, false);
        board.advance_animations();
        assert!(board.falling().is_empty(), "offset hit 0 on first advance");
        for _ in 0..ROTATION_TICKS {
            board.advance_animations();
        }
        assert!(board.rotating().is_empty());
        assert!(!board.is_animating());
    }

    #[test]
    #[should_panic(expected = "out of the board")]
    fn test_out_of_bounds_panics() {
        let board = Board::new(1);
        let _ = board.shape(BOARD_WIDTH, 0);
    }
}
