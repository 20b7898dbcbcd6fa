//! Pipe cell: shape, connectors, rotation, sprite geometry.

/// Tile size in the sprite sheet; also the offset unit for falling animations
/// (one cell of fall = `PIPE_PX` offset units).
pub const PIPE_PX: i32 = 40;

/// Edge a pipe can carry water through. Bitmask values combine into a
/// connector set (see [`Shape::connectors`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Top,
    Left,
    Bottom,
    Right,
}

impl Direction {
    pub const ALL: [Self; 4] = [Self::Top, Self::Left, Self::Bottom, Self::Right];

    #[inline]
    pub fn bit(self) -> u8 {
        match self {
            Self::Top => 1 << 0,
            Self::Left => 1 << 1,
            Self::Bottom => 1 << 2,
            Self::Right => 1 << 3,
        }
    }

    /// Direction water enters the neighbouring cell when it leaves through `self`.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Left => Self::Right,
            Self::Bottom => Self::Top,
            Self::Right => Self::Left,
        }
    }

    /// Grid step for this direction; y grows downward.
    #[inline]
    pub fn step(self) -> (i32, i32) {
        match self {
            Self::Top => (0, -1),
            Self::Left => (-1, 0),
            Self::Bottom => (0, 1),
            Self::Right => (1, 0),
        }
    }
}

/// One of six two-connector pipe orientations, or Empty. Empty is transient:
/// the board refills every empty cell by the end of each settled tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    LeftRight,
    TopBottom,
    LeftTop,
    TopRight,
    RightBottom,
    BottomLeft,
    Empty,
}

impl Shape {
    /// The six solid shapes, in sprite-sheet row order.
    pub const SOLID: [Self; 6] = [
        Self::LeftRight,
        Self::TopBottom,
        Self::LeftTop,
        Self::TopRight,
        Self::RightBottom,
        Self::BottomLeft,
    ];

    /// Row index in the sprite sheet.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Self::LeftRight => 0,
            Self::TopBottom => 1,
            Self::LeftTop => 2,
            Self::TopRight => 3,
            Self::RightBottom => 4,
            Self::BottomLeft => 5,
            Self::Empty => 6,
        }
    }

    /// Connector bitmask: exactly two bits for solid shapes, zero for Empty.
    pub fn connectors(self) -> u8 {
        match self {
            Self::LeftRight => Direction::Left.bit() | Direction::Right.bit(),
            Self::TopBottom => Direction::Top.bit() | Direction::Bottom.bit(),
            Self::LeftTop => Direction::Left.bit() | Direction::Top.bit(),
            Self::TopRight => Direction::Top.bit() | Direction::Right.bit(),
            Self::RightBottom => Direction::Right.bit() | Direction::Bottom.bit(),
            Self::BottomLeft => Direction::Bottom.bit() | Direction::Left.bit(),
            Self::Empty => 0,
        }
    }

    /// 90° rotation. Total mapping: the two straights toggle into each other
    /// regardless of direction, the four elbows cycle, Empty stays Empty.
    pub fn rotated(self, clockwise: bool) -> Self {
        match self {
            Self::LeftRight => Self::TopBottom,
            Self::TopBottom => Self::LeftRight,
            Self::LeftTop => {
                if clockwise {
                    Self::TopRight
                } else {
                    Self::BottomLeft
                }
            }
            Self::TopRight => {
                if clockwise {
                    Self::RightBottom
                } else {
                    Self::LeftTop
                }
            }
            Self::RightBottom => {
                if clockwise {
                    Self::BottomLeft
                } else {
                    Self::TopRight
                }
            }
            Self::BottomLeft => {
                if clockwise {
                    Self::LeftTop
                } else {
                    Self::RightBottom
                }
            }
            Self::Empty => Self::Empty,
        }
    }
}

/// Source rectangle in the sprite sheet (pixel coordinates).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

// Sprite sheet layout: 1px outer offset, 1px padding between tiles,
// column 0 = dry pipe, column 1 = water-filled.
const TEXTURE_OFFSET: i32 = 1;
const TEXTURE_PADDING: i32 = 1;

/// A single grid cell: a shape plus a "carrying water this tick" flag.
/// The flag is reset for the whole board before every connectivity pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pipe {
    shape: Shape,
    filled: bool,
}

impl Pipe {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            filled: false,
        }
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn set_shape(&mut self, shape: Shape) {
        self.shape = shape;
    }

    #[inline]
    pub fn is_filled(&self) -> bool {
        self.filled
    }

    pub fn set_filled(&mut self, filled: bool) {
        self.filled = filled;
    }

    pub fn rotate(&mut self, clockwise: bool) {
        self.shape = self.shape.rotated(clockwise);
    }

    #[inline]
    pub fn has_connector(&self, dir: Direction) -> bool {
        self.shape.connectors() & dir.bit() != 0
    }

    /// Sprite-sheet source rectangle for this cell, picked by shape and
    /// water flag. Read-only geometry for sprite-based front ends.
    pub fn source_rect(&self) -> SourceRect {
        let mut x = TEXTURE_OFFSET;
        let y = TEXTURE_OFFSET + self.shape.index() as i32 * (PIPE_PX + TEXTURE_PADDING);
        if self.filled {
            x += PIPE_PX + TEXTURE_PADDING;
        }
        SourceRect {
            x: x as f32,
            y: y as f32,
            w: PIPE_PX as f32,
            h: PIPE_PX as f32,
        }
    }
}

impl Default for Pipe {
    fn default() -> Self {
        Self::new(Shape::Empty)
    }
}
