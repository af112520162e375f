//! Selection rectangle bookkeeping.
//!
//! Pure geometry: the overlay reports the press and release points of a drag,
//! this module turns them into a rectangle in image pixels.

use serde::{Deserialize, Serialize};

/// A point reported by the overlay, in logical (CSS) pixels.
///
/// Signed because a drag can leave the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragPoint {
    pub x: f64,
    pub y: f64,
}

impl DragPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Screen rectangle as `(x, y, width, height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Normalizes a drag in any direction: top-left corner is the minimum of
    /// both points, size is the absolute difference.
    pub fn from_drag(start: DragPoint, end: DragPoint) -> Self {
        let (x0, x1) = ordered(start.x.max(0.0), end.x.max(0.0));
        let (y0, y1) = ordered(start.y.max(0.0), end.y.max(0.0));
        Self {
            x: x0.round() as u32,
            y: y0.round() as u32,
            width: (x1 - x0).round() as u32,
            height: (y1 - y0).round() as u32,
        }
    }

    /// Converts logical pixels to physical pixels for a display scale factor.
    pub fn scaled(&self, factor: f64) -> Self {
        let scale = |v: u32| (v as f64 * factor).round() as u32;
        Self {
            x: scale(self.x),
            y: scale(self.y),
            width: scale(self.width),
            height: scale(self.height),
        }
    }

    /// Intersection with an image of the given size.
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Self {
            x,
            y,
            width: self.width.min(width - x),
            height: self.height.min(height - y),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{} at {},{}", self.width, self.height, self.x, self.y)
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
