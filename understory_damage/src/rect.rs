// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integer device-pixel rectangles.

/// Axis-aligned rectangle in integer device pixels.
///
/// A rectangle with `width <= 0` or `height <= 0` is empty. Empty rectangles
/// are absorbed by [`union`](Self::union) and produced by
/// [`intersect`](Self::intersect) when the operands are disjoint.
///
/// Edges are half-open: the rectangle covers columns `x..x + width` and rows
/// `y..y + height`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DeviceRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl DeviceRect {
    /// The canonical empty rectangle.
    pub const EMPTY: Self = Self::new(0, 0, 0, 0);

    /// Create a rectangle from origin and size.
    #[inline(always)]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The rectangle `[0, 0, width, height]` covering a whole surface.
    #[inline]
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, saturate(i64::from(width)), saturate(i64::from(height)))
    }

    /// Convert a fractional (world-space) rectangle to device pixels, rounding outward.
    ///
    /// Any pixel the input touches, even partially, is covered by the result.
    pub fn from_kurbo(rect: kurbo::Rect) -> Self {
        let r = rect.abs().expand();
        #[allow(
            clippy::cast_possible_truncation,
            reason = "float to int `as` casts saturate; device coordinates fit in i32."
        )]
        let (x0, y0, x1, y1) = (r.x0 as i64, r.y0 as i64, r.x1 as i64, r.y1 as i64);
        Self::from_edges(x0, y0, x1, y1)
    }

    /// Convert to a `kurbo::Rect` in the same coordinate space.
    #[inline]
    pub fn to_kurbo(self) -> kurbo::Rect {
        kurbo::Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.x) + f64::from(self.width),
            f64::from(self.y) + f64::from(self.height),
        )
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn x1(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn y1(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    /// Area in pixels, zero when empty.
    #[inline]
    pub fn area(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.width.unsigned_abs() as u64 * self.height.unsigned_abs() as u64
        }
    }

    /// Return true if the rectangle covers no pixels.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Whether the pixel at `(x, y)` lies inside this rectangle.
    #[inline]
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        !self.is_empty()
            && self.x <= x
            && self.y <= y
            && i64::from(x) < self.x1()
            && i64::from(y) < self.y1()
    }

    /// Whether `other` lies entirely inside this rectangle.
    ///
    /// Empty rectangles are contained by everything.
    #[inline]
    pub fn contains_rect(&self, other: &Self) -> bool {
        other.is_empty()
            || (!self.is_empty()
                && self.x <= other.x
                && self.y <= other.y
                && other.x1() <= self.x1()
                && other.y1() <= self.y1())
    }

    /// The intersection of two rectangles, or [`DeviceRect::EMPTY`] if they are disjoint.
    pub fn intersect(&self, other: &Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::EMPTY;
        }
        let x0 = i64::from(self.x.max(other.x));
        let y0 = i64::from(self.y.max(other.y));
        let x1 = self.x1().min(other.x1());
        let y1 = self.y1().min(other.y1());
        Self::from_edges(x0, y0, x1, y1)
    }

    /// The smallest rectangle enclosing both rectangles.
    ///
    /// Empty operands contribute nothing, so the union of an empty rectangle
    /// and `r` is `r`.
    pub fn union(&self, other: &Self) -> Self {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => Self::EMPTY,
            (true, false) => *other,
            (false, true) => *self,
            (false, false) => Self::from_edges(
                i64::from(self.x.min(other.x)),
                i64::from(self.y.min(other.y)),
                self.x1().max(other.x1()),
                self.y1().max(other.y1()),
            ),
        }
    }

    fn from_edges(x0: i64, y0: i64, x1: i64, y1: i64) -> Self {
        if x1 <= x0 || y1 <= y0 {
            return Self::EMPTY;
        }
        Self::new(saturate(x0), saturate(y0), saturate(x1 - x0), saturate(y1 - y0))
    }
}

fn saturate(v: i64) -> i32 {
    i32::try_from(v).unwrap_or(if v < 0 { i32::MIN } else { i32::MAX })
}
