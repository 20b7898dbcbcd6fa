//! Transient per-cell animation overlays: falling, rotating, fading.
//!
//! Each variant owns a shape snapshot for rendering. The authoritative cell
//! in the board grid is untouched; the board removes a variant the moment
//! its terminal condition is reached.

use crate::pipe::Shape;
use std::f32::consts::{FRAC_PI_2, TAU};

/// Offset units removed per advance of a falling pipe.
pub const FALL_RATE: i32 = 5;

/// Advances a rotating pipe takes to settle.
pub const ROTATION_TICKS: u32 = 10;

/// Angle swept per advance: a quarter turn over the full tick budget.
const ROTATION_RATE: f32 = FRAC_PI_2 / ROTATION_TICKS as f32;

/// Alpha removed per advance of a fading pipe.
pub const FADE_RATE: f32 = 0.02;

/// A pipe that visually drops into its cell from above.
#[derive(Debug, Clone, Copy)]
pub struct FallingPipe {
    shape: Shape,
    vertical_offset: i32,
}

impl FallingPipe {
    pub fn new(shape: Shape, vertical_offset: i32) -> Self {
        Self {
            shape,
            vertical_offset,
        }
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Remaining offset above the cell, in offset units (`PIPE_PX` per row).
    #[inline]
    pub fn vertical_offset(&self) -> i32 {
        self.vertical_offset
    }

    pub fn advance(&mut self) {
        self.vertical_offset = (self.vertical_offset - FALL_RATE).max(0);
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.vertical_offset == 0
    }
}

/// A pipe mid-rotation. Direction only affects the display angle convention;
/// removal is always after [`ROTATION_TICKS`] advances.
#[derive(Debug, Clone, Copy)]
pub struct RotatingPipe {
    shape: Shape,
    rotation: f32,
    clockwise: bool,
    ticks_remaining: u32,
}

impl RotatingPipe {
    pub fn new(shape: Shape, clockwise: bool) -> Self {
        Self {
            shape,
            rotation: 0.0,
            clockwise,
            ticks_remaining: ROTATION_TICKS,
        }
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Display angle in radians, adjusted for rotation direction.
    pub fn rotation(&self) -> f32 {
        if self.clockwise {
            self.rotation
        } else {
            TAU - self.rotation
        }
    }

    #[inline]
    pub fn ticks_remaining(&self) -> u32 {
        self.ticks_remaining
    }

    /// Fraction of the rotation already played, in [0, 1].
    pub fn progress(&self) -> f32 {
        1.0 - self.ticks_remaining as f32 / ROTATION_TICKS as f32
    }

    pub fn advance(&mut self) {
        self.rotation -= ROTATION_RATE;
        self.ticks_remaining = self.ticks_remaining.saturating_sub(1);
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.ticks_remaining == 0
    }
}

/// A cleared pipe fading out. Spawned with the cell's pre-clear shape.
#[derive(Debug, Clone, Copy)]
pub struct FadingPipe {
    shape: Shape,
    alpha: f32,
}

impl FadingPipe {
    pub fn new(shape: Shape) -> Self {
        Self { shape, alpha: 1.0 }
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Remaining opacity in [0, 1].
    #[inline]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn advance(&mut self) {
        self.alpha = (self.alpha - FADE_RATE).max(0.0);
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.alpha == 0.0
    }
}
