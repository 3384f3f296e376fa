//! Gap packing over a group's frame rectangles.
//!
//! Both operations take the frames as `(key, rect)` pairs in ring order, rewrite the rectangles
//! in place and return the keys they touched, in the order they were touched. Nothing here knows
//! about windows, the caller pushes the changed rectangles out.
use crate::geometry::{borders, covers, FillMode, Rect, Side};

const LEFT: usize = Side::Left.index();
const RIGHT: usize = Side::Right.index();
const TOP: usize = Side::Top.index();
const BOTTOM: usize = Side::Bottom.index();

/// Expand the frames bordering `gap` into it.
///
/// When frames border the gap from opposite sides only the side with fewer frames expands,
/// a tie keeps the frames on the gap's left (their right edge touches) or above it.
/// [`FillMode::Fewest`] then keeps the single axis with more bordering frames, ties keep
/// the vertical axis.
pub fn fill_gap<K: Copy + PartialEq>(
    frames: &mut [(K, Rect)],
    gap: &Rect,
    except: &[K],
    mode: FillMode,
) -> Vec<K> {
    let matches = frames
        .iter()
        .enumerate()
        .filter(|(_, (key, _))| !except.contains(key))
        .filter_map(|(ind, (_, rect))| borders(rect, gap).map(|side| (ind, side)))
        .collect::<Vec<_>>();
    let mut sides = [0usize; 4];
    for (_, side) in &matches {
        sides[side.index()] += 1;
    }
    if sides[LEFT] > 0 && sides[RIGHT] > 0 {
        sides[if sides[LEFT] < sides[RIGHT] { RIGHT } else { LEFT }] = 0;
    }
    if sides[TOP] > 0 && sides[BOTTOM] > 0 {
        sides[if sides[TOP] < sides[BOTTOM] { BOTTOM } else { TOP }] = 0;
    }
    if mode == FillMode::Fewest {
        if sides[TOP] + sides[BOTTOM] < sides[LEFT] + sides[RIGHT] {
            sides[TOP] = 0;
            sides[BOTTOM] = 0;
        } else {
            sides[LEFT] = 0;
            sides[RIGHT] = 0;
        }
    }
    let mut changed = Vec::with_capacity(matches.len());
    for (ind, side) in matches {
        if sides[side.index()] == 0 {
            continue;
        }
        let (key, rect) = &mut frames[ind];
        match side {
            Side::Left => {
                rect.x -= gap.w;
                rect.w += gap.w;
            }
            Side::Right => rect.w += gap.w,
            Side::Top => {
                rect.y -= gap.h;
                rect.h += gap.h;
            }
            Side::Bottom => rect.h += gap.h,
        }
        changed.push(*key);
    }
    changed
}

/// Shrink or push away every frame that overlaps or borders `gap` so that it becomes free.
pub fn make_gap<K: Copy + PartialEq>(frames: &mut [(K, Rect)], gap: &Rect, except: &[K]) -> Vec<K> {
    let mut changed = Vec::new();
    for (key, rect) in frames.iter_mut() {
        if except.contains(key) {
            continue;
        }
        if let Some(side) = covers(rect, gap) {
            match side {
                Side::Left => {
                    let inc = gap.right() - rect.x;
                    rect.x += inc;
                    rect.w -= inc;
                }
                Side::Right => rect.w -= rect.right() - gap.x,
                Side::Top => {
                    let inc = gap.bottom() - rect.y;
                    rect.y += inc;
                    rect.h -= inc;
                }
                Side::Bottom => rect.h -= rect.bottom() - gap.y,
            }
            changed.push(*key);
        } else if let Some(side) = borders(rect, gap) {
            match side {
                Side::Left => {
                    rect.x += gap.w;
                    rect.w -= gap.w;
                }
                Side::Right => rect.w -= gap.w,
                Side::Top => {
                    rect.y += gap.h;
                    rect.h -= gap.h;
                }
                Side::Bottom => rect.h -= gap.h,
            }
            changed.push(*key);
        }
    }
    changed
}
