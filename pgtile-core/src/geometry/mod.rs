pub mod hints;
pub mod packing;

/// Axis-aligned rectangle in root window coordinates.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    #[must_use]
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.w
    }

    #[inline]
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.h
    }

    #[must_use]
    pub const fn area(&self) -> i64 {
        self.w as i64 * self.h as i64
    }

    #[must_use]
    pub const fn intersects(&self, other: &Rect) -> bool {
        overlaps_x(self, other) && overlaps_y(self, other)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    #[must_use]
    pub const fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
        }
    }

    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }

    const fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
            Side::Top => 2,
            Side::Bottom => 3,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Direction {
    Horizontal,
    Vertical,
}

/// How eagerly `fill_gap` expands frames into a vacated rectangle.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FillMode {
    /// Only expand along the axis that moves the fewest frames.
    Fewest,
    All,
}

#[inline]
#[must_use]
pub const fn overlaps_x(a: &Rect, b: &Rect) -> bool {
    (a.x <= b.x && a.x + a.w > b.x) || (b.x <= a.x && b.x + b.w > a.x)
}

#[inline]
#[must_use]
pub const fn overlaps_y(a: &Rect, b: &Rect) -> bool {
    (a.y <= b.y && a.y + a.h > b.y) || (b.y <= a.y && b.y + b.h > a.y)
}

/// Which side of `frame` lies exactly on an edge of `region`.
/// The frame only qualifies when its extent along that edge fits inside the region's.
#[must_use]
pub fn borders(frame: &Rect, region: &Rect) -> Option<Side> {
    let in_y = frame.y >= region.y && frame.bottom() <= region.bottom();
    let in_x = frame.x >= region.x && frame.right() <= region.right();
    if in_y && (frame.x == region.x || frame.x == region.right()) {
        return Some(Side::Left);
    }
    if in_y && (frame.right() == region.x || frame.right() == region.right()) {
        return Some(Side::Right);
    }
    if in_x && (frame.y == region.y || frame.y == region.bottom()) {
        return Some(Side::Top);
    }
    if in_x && (frame.bottom() == region.y || frame.bottom() == region.bottom()) {
        return Some(Side::Bottom);
    }
    None
}

/// Side of the box `(left, top)..(right, bottom)` closest to the point.
/// Ties resolve right, then top, then bottom, then left.
#[must_use]
pub fn nearest_side(x: i32, y: i32, left: i32, top: i32, right: i32, bottom: i32) -> Side {
    let l = x - left;
    let r = right - x;
    let t = y - top;
    let b = bottom - y;
    if r < l && r < t && r < b {
        Side::Right
    } else if t < l && t < b {
        Side::Top
    } else if b < l {
        Side::Bottom
    } else {
        Side::Left
    }
}

#[inline]
const fn strictly_inside(x: i32, y: i32, left: i32, top: i32, right: i32, bottom: i32) -> bool {
    x > left && x < right && y > top && y < bottom
}

/// Detects a corner of one rectangle strictly inside the other and reports the side of
/// `frame` that has to give way for `region`.
#[must_use]
pub fn covers(frame: &Rect, region: &Rect) -> Option<Side> {
    let (a, b, c, d) = (region.x, region.y, region.right(), region.bottom());
    let (e, f, g, h) = (frame.x, frame.y, frame.right(), frame.bottom());
    for (px, py) in [(e, f), (g, f), (e, h), (g, h)] {
        if strictly_inside(px, py, a, b, c, d) {
            return Some(nearest_side(px, py, a, b, c, d));
        }
    }
    for (px, py) in [(a, b), (c, b), (a, d), (c, d)] {
        if strictly_inside(px, py, e, f, g, h) {
            return Some(nearest_side(px, py, e, f, g, h));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{borders, covers, nearest_side, overlaps_x, overlaps_y, Rect, Side};

    #[test]
    fn overlap_is_half_open() {
        let a = Rect::new(0, 0, 100, 100);
        let b = Rect::new(100, 0, 100, 100);
        assert!(!overlaps_x(&a, &b));
        assert!(overlaps_y(&a, &b));
        let c = Rect::new(99, 50, 10, 10);
        assert!(overlaps_x(&a, &c));
        assert!(overlaps_x(&c, &a));
    }

    #[test]
    fn borders_requires_perpendicular_containment() {
        let region = Rect::new(500, 0, 500, 800);
        assert_eq!(Some(Side::Right), borders(&Rect::new(0, 0, 500, 800), &region));
        assert_eq!(Some(Side::Left), borders(&Rect::new(1000, 0, 200, 400), &region));
        // Sticks out below the region
        assert_eq!(None, borders(&Rect::new(0, 400, 500, 800), &region));
        assert_eq!(None, borders(&Rect::new(0, 0, 400, 800), &region));
    }

    #[test]
    fn borders_checks_sides_in_fixed_order() {
        // Identical rectangles match every side, left wins
        let r = Rect::new(10, 10, 10, 10);
        assert_eq!(Some(Side::Left), borders(&r, &r));
    }

    #[test]
    fn nearest_side_tie_break_is_right_top_bottom_left() {
        // Dead centre, everything ties
        assert_eq!(Side::Left, nearest_side(50, 50, 0, 0, 100, 100));
        // Right strictly closest
        assert_eq!(Side::Right, nearest_side(90, 50, 0, 0, 100, 100));
        // Right ties with top, top wins
        assert_eq!(Side::Top, nearest_side(90, 10, 0, 0, 100, 100));
        // Top ties with bottom is impossible off centre, bottom vs left tie goes left
        assert_eq!(Side::Left, nearest_side(10, 90, 0, 0, 100, 100));
        assert_eq!(Side::Bottom, nearest_side(50, 90, 0, 0, 100, 100));
    }

    #[test]
    fn covers_reports_side_to_reduce() {
        let region = Rect::new(480, 0, 40, 800);
        // Shared full height edges never count as corners inside
        let frame = Rect::new(0, 0, 500, 800);
        assert_eq!(None, covers(&frame, &region));
        // Frame's bottom right corner pokes into the region, left and right tie
        let frame = Rect::new(0, 100, 500, 400);
        assert_eq!(Some(Side::Left), covers(&frame, &region));
        // Region corner inside the frame, nearest frame side is right
        let frame = Rect::new(0, 0, 500, 900);
        assert_eq!(Some(Side::Right), covers(&frame, &Rect::new(480, 100, 40, 100)));
        // Touching is not covering
        assert_eq!(None, covers(&Rect::new(0, 0, 480, 800), &region));
    }
}
