use crate::config::{HiddenReveal, OpenFrame, SplitFocus, STATE_COUNTER_WRAP};
use crate::debug;
use crate::error::Result;
use crate::geometry::packing::{fill_gap, make_gap};
use crate::geometry::{covers, overlaps_x, overlaps_y, Direction, FillMode, Rect, Side};
use crate::state::model::{ClientId, FocusCursor, Frame, FrameFlags, FrameId, GroupId};
use crate::state::ring::Dir;
use crate::state::State;
use crate::surface::{BorderColor, DisplaySurface};

/// Which hidden clients a frame may reveal.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum HiddenScope {
    /// Any client not shown anywhere.
    Any,
    /// Only clients last shown in this frame.
    Local,
}

/// Frame rectangles of a group laid out for a trial resize, committed only when every frame
/// still respects the minimum size.
pub(super) struct Trial {
    pub(super) rects: Vec<(FrameId, Rect)>,
    pub(super) changed: Vec<FrameId>,
}

impl Trial {
    pub(super) fn rect_mut(&mut self, frame: FrameId) -> Option<&mut Rect> {
        self.rects
            .iter_mut()
            .find_map(|(f, r)| (*f == frame).then_some(r))
    }

    pub(super) fn touch(&mut self, frames: &[FrameId]) {
        for f in frames {
            if !self.changed.contains(f) {
                self.changed.push(*f);
            }
        }
    }
}

fn window_rect(rect: Rect, border_width: u32) -> Rect {
    let bw = border_width as i32;
    Rect::new(rect.x, rect.y, rect.w - bw - bw, rect.h - bw - bw)
}

impl State {
    /// Creates a frame with its background window, unmapped and not yet pushed to the surface.
    pub fn frame_create(
        &mut self,
        surface: &mut dyn DisplaySurface,
        group: GroupId,
        rect: Rect,
    ) -> Result<FrameId> {
        let root = self.heads[self.groups[group].head].root;
        let bw = self.settings.border_width;
        let win = surface.create_frame_window(root, window_rect(rect, bw), bw)?;
        surface.set_border_color(win, BorderColor::Unfocus)?;
        let frame = self.frames.insert(Frame {
            group,
            win,
            rect,
            applied: Rect::default(),
            applied_bare: false,
            shown: None,
            flags: FrameFlags::default(),
            state: 1,
        });
        self.groups[group].frames.push(frame);
        Ok(frame)
    }

    /// Drops the frame, clients that lived in it fall back to the group's current frame.
    pub fn frame_destroy(&mut self, surface: &mut dyn DisplaySurface, frame: FrameId) -> Result<()> {
        let Some(f) = self.frames.remove(frame) else {
            return Ok(());
        };
        let ring = &mut self.groups[f.group].frames;
        ring.remove(frame);
        let fallback = ring.current();
        for c in self.groups[f.group].clients.iter() {
            let client = &mut self.clients[c];
            if client.frame == Some(frame) {
                client.frame = fallback;
            }
        }
        surface.destroy_window(f.win)
    }

    /// Hides the displayed client before destroying, it would otherwise linger under its
    /// neighbours.
    fn frame_destroy_hiding(&mut self, surface: &mut dyn DisplaySurface, frame: FrameId) -> Result<()> {
        if let Some(c) = self.frames[frame].shown {
            if self.clients[c].frame == Some(frame) {
                self.client_hide(surface, c)?;
            }
        }
        self.frame_destroy(surface, frame)
    }

    /// Pushes the frame's rectangle and border to the surface, in tiling mode also redraws or
    /// refills its content.
    pub fn frame_update(&mut self, surface: &mut dyn DisplaySurface, frame: FrameId) -> Result<()> {
        let bw = self.settings.border_width;
        let f = &mut self.frames[frame];
        if f.applied != f.rect || f.applied_bare != f.flags.border_hidden {
            f.applied = f.rect;
            f.applied_bare = f.flags.border_hidden;
            f.state = (f.state + 1) % STATE_COUNTER_WRAP;
        }
        let (win, rect, group) = (f.win, f.rect, f.group);
        if f.flags.border_hidden {
            surface.configure_window(win, rect, 0)?;
        } else {
            surface.configure_window(win, window_rect(rect, bw), bw)?;
        }
        if self.groups[group].is_tiling() {
            surface.map_window(win)?;
            match self.frame_content(frame) {
                Some(c) => self.client_display(surface, c, Some(frame))?,
                None => self.frame_auto_display_hidden(surface, frame, Dir::Next)?,
            }
        }
        Ok(())
    }

    /// The shown client, if it still considers itself to be in this frame.
    #[must_use]
    pub fn frame_content(&self, frame: FrameId) -> Option<ClientId> {
        self.frames[frame]
            .shown
            .filter(|c| self.clients.get(*c).is_some_and(|c| c.frame == Some(frame)))
    }

    fn frame_border(&self, frame: FrameId, focused: bool) -> Option<BorderColor> {
        let f = &self.frames[frame];
        if f.flags.border_hidden || !self.groups[f.group].is_tiling() {
            return None;
        }
        Some(match (f.flags.catchall, f.flags.dedicated, focused) {
            (true, _, true) => BorderColor::CatchallFocus,
            (true, _, false) => BorderColor::CatchallUnfocus,
            (false, true, true) => BorderColor::DedicateFocus,
            (false, true, false) => BorderColor::DedicateUnfocus,
            (false, false, true) => BorderColor::Focus,
            (false, false, false) => BorderColor::Unfocus,
        })
    }

    pub fn frame_unfocus(&mut self, surface: &mut dyn DisplaySurface, frame: FrameId) -> Result<()> {
        if let Some(c) = self.frames[frame].shown.filter(|c| self.clients.contains_key(*c)) {
            self.client_unfocus(surface, c)?;
        }
        if let Some(color) = self.frame_border(frame, false) {
            surface.set_border_color(self.frames[frame].win, color)?;
        }
        Ok(())
    }

    /// Makes `frame` the focused frame, switching head and group when needed.
    pub fn frame_focus(&mut self, surface: &mut dyn DisplaySurface, frame: FrameId) -> Result<()> {
        let group = self.frames[frame].group;
        let head = self.groups[group].head;
        if self.focused_head != Some(head) {
            self.head_focus(surface, head)?;
        }
        if self.heads[head].groups.current() != Some(group) {
            self.group_focus(surface, group)?;
        }
        if let Some(old) = self.groups[group].frames.current().filter(|o| *o != frame) {
            self.frame_unfocus(surface, old)?;
        }
        self.groups[group].frames.focus(frame);
        if let Some(color) = self.frame_border(frame, true) {
            surface.set_border_color(self.frames[frame].win, color)?;
        }
        if self.groups[group].is_tiling() {
            match self.frame_content(frame) {
                Some(c) => self.client_focus(surface, c, None)?,
                None => self.frame_auto_focus_hidden(surface, frame, Dir::Next)?,
            }
        } else {
            let clients = self.groups[group]
                .clients
                .from_current(Dir::Next)
                .collect::<Vec<_>>();
            for c in clients.iter().skip(1) {
                if self.clients[*c].flags.hidden {
                    self.client_display(surface, *c, Some(frame))?;
                }
            }
            if let Some(c) = clients.first() {
                self.client_focus(surface, *c, Some(frame))?;
            }
        }
        Ok(())
    }

    /// Unmaps the frame window and forces a redraw of whatever is shown once it's visible again.
    pub fn frame_hide(&mut self, surface: &mut dyn DisplaySurface, frame: FrameId) -> Result<()> {
        let f = &mut self.frames[frame];
        f.state = 1;
        surface.unmap_window(f.win)
    }

    /// Where a new window should open when `frame` is the preferred target.
    #[must_use]
    pub fn frame_available(&self, frame: FrameId) -> FrameId {
        let ring = &self.groups[self.frames[frame].group].frames;
        let walk = || ring.walk_from(Some(frame), Dir::Next);
        if let Some(f) = walk().find(|f| self.frames[*f].flags.catchall) {
            return f;
        }
        if self.settings.window_open_frame == OpenFrame::Empty {
            if let Some(f) =
                walk().find(|f| !self.frames[*f].flags.dedicated && self.frames[*f].shown.is_none())
            {
                return f;
            }
        }
        if self.frames[frame].flags.dedicated {
            if let Some(f) = walk().find(|f| !self.frames[*f].flags.dedicated) {
                return f;
            }
        }
        frame
    }

    /// Picks a client that `frame` could reveal.
    ///
    /// With `prefer_recent` the group's most recently focused match wins, otherwise the ring is
    /// walked from the focused client in `dir`. Shrunk clients are never picked, neither are
    /// clients with transients when any hidden client will do.
    #[must_use]
    pub fn client_hidden(
        &self,
        frame: FrameId,
        dir: Dir,
        scope: HiddenScope,
        prefer_recent: bool,
    ) -> Option<ClientId> {
        let group = &self.groups[self.frames[frame].group];
        let shown = self.frames[frame].shown;
        let candidate = |c: &ClientId| {
            let client = &self.clients[*c];
            if client.flags.shrunk {
                return false;
            }
            match scope {
                HiddenScope::Local => client.frame == Some(frame) && shown != Some(*c),
                HiddenScope::Any => match client.frame.and_then(|f| self.frames.get(f)) {
                    None => true,
                    Some(f) => f.shown != Some(*c) && client.kids == 0,
                },
            }
        };
        if prefer_recent {
            if let Some(c) = group.stacked.iter().rev().find(|c| candidate(c)) {
                return Some(*c);
            }
        }
        group.clients.from_current(dir).find(|c| candidate(c))
    }

    pub fn frame_display_hidden(
        &mut self,
        surface: &mut dyn DisplaySurface,
        frame: FrameId,
        dir: Dir,
        scope: HiddenScope,
        prefer_recent: bool,
    ) -> Result<()> {
        if let Some(c) = self.client_hidden(frame, dir, scope, prefer_recent) {
            self.client_display(surface, c, Some(frame))?;
        }
        Ok(())
    }

    /// Focuses a hidden client in `frame`, an empty frame takes input focus itself.
    pub fn frame_focus_hidden(
        &mut self,
        surface: &mut dyn DisplaySurface,
        frame: FrameId,
        dir: Dir,
        scope: HiddenScope,
        prefer_recent: bool,
    ) -> Result<()> {
        if let Some(c) = self.client_hidden(frame, dir, scope, prefer_recent) {
            self.client_focus(surface, c, Some(frame))?;
        }
        if self.frames[frame].shown.is_none() {
            let (win, group) = (self.frames[frame].win, self.frames[frame].group);
            surface.focus_window(win)?;
            self.window_stack(surface, self.groups[group].head, &[win])?;
        }
        Ok(())
    }

    fn reveal_scope(&self, frame: FrameId) -> Option<HiddenScope> {
        if !self.groups[self.frames[frame].group].is_tiling() {
            return Some(HiddenScope::Any);
        }
        match self.settings.frame_display_hidden {
            HiddenReveal::Off => None,
            HiddenReveal::Any => Some(HiddenScope::Any),
            HiddenReveal::Local => Some(HiddenScope::Local),
        }
    }

    pub fn frame_auto_display_hidden(
        &mut self,
        surface: &mut dyn DisplaySurface,
        frame: FrameId,
        dir: Dir,
    ) -> Result<()> {
        match self.reveal_scope(frame) {
            Some(scope) => self.frame_display_hidden(surface, frame, dir, scope, true),
            None => Ok(()),
        }
    }

    pub fn frame_auto_focus_hidden(
        &mut self,
        surface: &mut dyn DisplaySurface,
        frame: FrameId,
        dir: Dir,
    ) -> Result<()> {
        match self.reveal_scope(frame) {
            Some(scope) => self.frame_focus_hidden(surface, frame, dir, scope, true),
            None => Ok(()),
        }
    }

    /// Fills every frame that shows nothing.
    pub fn frames_display_hidden(&mut self, surface: &mut dyn DisplaySurface, group: GroupId) -> Result<()> {
        let frames = self.groups[group]
            .frames
            .from_current(Dir::Next)
            .collect::<Vec<_>>();
        for f in frames {
            if self.frames.contains_key(f) && self.frame_content(f).is_none() {
                self.frame_auto_display_hidden(surface, f, Dir::Next)?;
            }
        }
        Ok(())
    }

    /// Binds `client` to `frame` and marks it for a redraw on its next display.
    pub fn frame_target_client(&mut self, frame: FrameId, client: ClientId) {
        if let Some(old) = self.clients[client].frame.and_then(|f| self.frames.get_mut(f)) {
            if old.shown == Some(client) {
                old.shown = None;
            }
        }
        let f = &mut self.frames[frame];
        f.shown = Some(client);
        let c = &mut self.clients[client];
        c.frame = Some(frame);
        c.state = f.state.wrapping_sub(1);
    }

    /// Moves `client` into `frame` and focuses both.
    pub fn frame_focus_client(
        &mut self,
        surface: &mut dyn DisplaySurface,
        frame: FrameId,
        client: Option<ClientId>,
    ) -> Result<()> {
        if let Some(c) = client {
            let group = self.frames[frame].group;
            if let Some(cur) = self.groups[group].clients.current() {
                self.client_unfocus(surface, cur)?;
            }
            self.frame_target_client(frame, c);
            self.groups[group].clients.focus(c);
        }
        self.frame_focus(surface, frame)
    }

    /// Focus for a client already shown in `frame`, no redraw forced.
    pub fn frame_refocus_client(
        &mut self,
        surface: &mut dyn DisplaySurface,
        frame: FrameId,
        client: ClientId,
    ) -> Result<()> {
        let group = self.frames[frame].group;
        if let Some(cur) = self.groups[group].clients.current() {
            self.client_unfocus(surface, cur)?;
        }
        self.frames[frame].shown = Some(client);
        self.clients[client].frame = Some(frame);
        self.groups[group].clients.focus(client);
        self.frame_focus(surface, frame)
    }

    /// Splits the focused frame, the new frame takes the right (or bottom) part.
    ///
    /// `ratio` is the share the current frame keeps. Rejected with `None` when either part would
    /// end up below the minimum size.
    pub fn frame_split(
        &mut self,
        surface: &mut dyn DisplaySurface,
        cursor: FocusCursor,
        dir: Direction,
        ratio: f64,
    ) -> Result<Option<FrameId>> {
        let frame = cursor.frame;
        let r = self.frames[frame].rect;
        let min = self.settings.frame_min_wh;
        let full = match dir {
            Direction::Horizontal => r.w,
            Direction::Vertical => r.h,
        };
        let keep = (f64::from(full) * ratio).ceil() as i32;
        if ratio <= 0.0 || ratio >= 1.0 || keep < min || full - keep < min {
            debug!("Unable to split {ratio} {keep} {}", full - keep);
            return Ok(None);
        }
        self.group_track(cursor.group)?;
        let new_rect = match dir {
            Direction::Horizontal => {
                self.frames[frame].rect.w = keep;
                Rect::new(r.x + keep, r.y, r.w - keep, r.h)
            }
            Direction::Vertical => {
                self.frames[frame].rect.h = keep;
                Rect::new(r.x, r.y + keep, r.w, r.h - keep)
            }
        };
        self.frame_update(surface, frame)?;
        let new = self.frame_create(surface, cursor.group, new_rect)?;
        self.frame_update(surface, new)?;
        if self.settings.frame_split_focus == SplitFocus::New {
            self.frame_focus(surface, new)?;
        }
        Ok(Some(new))
    }

    /// Next frame of the sibling chain along `axis`, walking towards `side`.
    fn frame_sibling(&self, frame: FrameId, axis: Side, side: Side) -> Option<FrameId> {
        let f = self.frames[frame].rect;
        let ring = &self.groups[self.frames[frame].group].frames;
        let others = || ring.from_current(Dir::Next).filter(move |s| *s != frame);
        // A frame diagonally across the corner between `axis` and `side` ends the chain
        let conflict = others().any(|s| {
            let s = self.frames[s].rect;
            let beside = match side {
                Side::Left => s.right() == f.x,
                Side::Right => s.x == f.right(),
                Side::Top => s.bottom() == f.y,
                Side::Bottom => s.y == f.bottom(),
            };
            let across = match (side.is_horizontal(), axis) {
                (true, Side::Top) => s.bottom() == f.y,
                (true, Side::Bottom) => s.y == f.bottom(),
                (false, Side::Left) => s.right() == f.x,
                (false, Side::Right) => s.x == f.right(),
                _ => false,
            };
            beside && across
        });
        if conflict {
            return None;
        }
        others().find(|s| {
            let s = self.frames[*s].rect;
            let aligned = match axis {
                Side::Left => f.x == s.x,
                Side::Right => f.right() == s.right(),
                Side::Top => f.y == s.y,
                Side::Bottom => f.bottom() == s.bottom(),
            };
            let abutting = match side {
                Side::Left => f.x == s.right(),
                Side::Right => f.right() == s.x,
                Side::Top => f.y == s.bottom(),
                Side::Bottom => f.bottom() == s.y,
            };
            aligned && abutting
        })
    }

    /// `frame` followed by the frames forming one block with it along the edge `axis`.
    #[must_use]
    pub fn frame_siblings(&self, frame: FrameId, axis: Side) -> Vec<FrameId> {
        let (first, second) = if axis.is_horizontal() {
            (Side::Top, Side::Bottom)
        } else {
            (Side::Left, Side::Right)
        };
        let mut out = vec![frame];
        let start = self.groups[self.frames[frame].group]
            .frames
            .current()
            .unwrap_or(frame);
        for (from, side) in [(start, first), (frame, second)] {
            let mut cur = from;
            while let Some(s) = self.frame_sibling(cur, axis, side) {
                if out.contains(&s) {
                    break;
                }
                out.push(s);
                cur = s;
            }
        }
        out
    }

    /// Strip of width `size` along the sibling block's edge `axis`, just outside the block when
    /// `outward`, otherwise just inside.
    fn sibling_strip(&self, siblings: &[FrameId], axis: Side, outward: bool, size: i32) -> Rect {
        let f = self.frames[siblings[0]].rect;
        let rects = siblings.iter().map(|s| self.frames[*s].rect);
        if axis.is_horizontal() {
            let y = rects.clone().map(|r| r.y).min().unwrap_or(f.y);
            let h = rects.map(|r| r.h).sum();
            let x = match (axis, outward) {
                (Side::Left, true) => f.x - size,
                (Side::Left, false) => f.x,
                (_, true) => f.right(),
                (_, false) => f.right() - size,
            };
            Rect::new(x, y, size, h)
        } else {
            let x = rects.clone().map(|r| r.x).min().unwrap_or(f.x);
            let w = rects.map(|r| r.w).sum();
            let y = match (axis, outward) {
                (Side::Top, true) => f.y - size,
                (Side::Top, false) => f.y,
                (_, true) => f.bottom(),
                (_, false) => f.bottom() - size,
            };
            Rect::new(x, y, w, size)
        }
    }

    fn siblings_growable(&self, siblings: &[FrameId], axis: Side, size: i32) -> bool {
        let strip = self.sibling_strip(siblings, axis, true, size);
        let probe = Rect::new(strip.x - 1, strip.y - 1, strip.w + 2, strip.h + 2);
        let min = self.settings.frame_min_wh;
        let ring = &self.groups[self.frames[siblings[0]].group].frames;
        !ring
            .from_current(Dir::Next)
            .filter(|f| !siblings.contains(f))
            .map(|f| self.frames[f].rect)
            .any(|r| {
                covers(&r, &probe).is_some()
                    && if axis.is_horizontal() { r.w <= min } else { r.h <= min }
            })
    }

    fn siblings_shrinkable(&self, siblings: &[FrameId], axis: Side) -> bool {
        let min = self.settings.frame_min_wh;
        siblings.iter().map(|s| self.frames[*s].rect).all(|r| {
            if axis.is_horizontal() {
                r.w > min
            } else {
                r.h > min
            }
        })
    }

    pub(super) fn trial(&self, group: GroupId) -> Trial {
        Trial {
            rects: self.groups[group]
                .frames
                .from_current(Dir::Next)
                .map(|f| (f, self.frames[f].rect))
                .collect(),
            changed: Vec::new(),
        }
    }

    /// Shrinks the sibling block on edge `axis` by `size`, the neighbours across fill the gap.
    fn trial_shrink(&self, group: GroupId, frame: FrameId, axis: Side, size: i32) -> Option<Trial> {
        let siblings = self.frame_siblings(frame, axis);
        if !self.siblings_shrinkable(&siblings, axis) {
            return None;
        }
        let strip = self.sibling_strip(&siblings, axis, false, size);
        let mut trial = self.trial(group);
        trial.changed = fill_gap(&mut trial.rects, &strip, &siblings, FillMode::Fewest);
        for s in &siblings {
            if let Some(r) = trial.rect_mut(*s) {
                match axis {
                    Side::Left => {
                        r.w -= size;
                        r.x += size;
                    }
                    Side::Right => r.w -= size,
                    Side::Top => {
                        r.h -= size;
                        r.y += size;
                    }
                    Side::Bottom => r.h -= size,
                }
            }
        }
        trial.touch(&siblings);
        Some(trial)
    }

    /// Grows the sibling block outward on edge `axis` by `size`, pushing the neighbours away.
    fn trial_grow(&self, group: GroupId, frame: FrameId, axis: Side, size: i32) -> Option<Trial> {
        let siblings = self.frame_siblings(frame, axis);
        if !self.siblings_growable(&siblings, axis, size) {
            return None;
        }
        let strip = self.sibling_strip(&siblings, axis, true, size);
        let mut trial = self.trial(group);
        trial.changed = make_gap(&mut trial.rects, &strip, &siblings);
        for s in &siblings {
            if let Some(r) = trial.rect_mut(*s) {
                match axis {
                    Side::Left => {
                        r.w += size;
                        r.x -= size;
                    }
                    Side::Right => r.w += size,
                    Side::Top => {
                        r.h += size;
                        r.y -= size;
                    }
                    Side::Bottom => r.h += size,
                }
            }
        }
        trial.touch(&siblings);
        Some(trial)
    }

    /// Applies a trial layout unless it squeezes some frame below the minimum size.
    pub(super) fn commit_trial(&mut self, surface: &mut dyn DisplaySurface, trial: Trial) -> Result<bool> {
        let min = self.settings.frame_min_wh;
        let valid = trial
            .rects
            .iter()
            .filter(|(f, _)| trial.changed.contains(f))
            .all(|(f, new)| {
                let old = self.frames[*f].rect;
                new.w > 0
                    && new.h > 0
                    && (new.w >= min || new.w >= old.w)
                    && (new.h >= min || new.h >= old.h)
            });
        if !valid {
            debug!("Resize rejected, a frame would drop below {min}");
            return Ok(false);
        }
        for f in &trial.changed {
            if let Some((_, rect)) = trial.rects.iter().find(|(k, _)| k == f) {
                self.frames[*f].rect = *rect;
            }
        }
        for f in trial.changed {
            self.frame_update(surface, f)?;
        }
        Ok(true)
    }

    /// Whether the frame touches the group's far edge for `dir` (right or bottom).
    fn flush_far(&self, frame: FrameId, dir: Direction) -> bool {
        let r = self.frames[frame].rect;
        let usable = self.usable_rect(self.frames[frame].group);
        match dir {
            Direction::Horizontal => r.right() >= usable.right(),
            Direction::Vertical => r.bottom() >= usable.bottom(),
        }
    }

    /// Shrinks the focused frame by `size`. A frame on the far edge shrinks from its near side,
    /// with `adapt` it grows instead.
    pub fn frame_shrink(
        &mut self,
        surface: &mut dyn DisplaySurface,
        cursor: FocusCursor,
        dir: Direction,
        adapt: bool,
        size: i32,
    ) -> Result<bool> {
        let frame = cursor.frame;
        let r = self.frames[frame].rect;
        let usable = self.usable_rect(cursor.group);
        let min = self.settings.frame_min_wh;
        let only = self.groups[cursor.group].frames.len() == 1;
        let (extent, near, at_near_edge) = match dir {
            Direction::Horizontal => (r.w, Side::Left, r.x <= usable.x),
            Direction::Vertical => (r.h, Side::Top, r.y <= usable.y),
        };
        let axis = if self.flush_far(frame, dir) {
            if adapt {
                return self.frame_grow(surface, cursor, dir, false, size);
            }
            if extent <= min || only || at_near_edge {
                return Ok(false);
            }
            near
        } else {
            if extent <= min || only {
                return Ok(false);
            }
            near.opposite()
        };
        let applied = match self.trial_shrink(cursor.group, frame, axis, size) {
            Some(trial) => self.commit_trial(surface, trial)?,
            None => false,
        };
        self.frame_focus(surface, frame)?;
        Ok(applied)
    }

    /// Grows the focused frame by `size`. A frame on the far edge grows from its near side,
    /// with `adapt` it shrinks instead.
    pub fn frame_grow(
        &mut self,
        surface: &mut dyn DisplaySurface,
        cursor: FocusCursor,
        dir: Direction,
        adapt: bool,
        size: i32,
    ) -> Result<bool> {
        let frame = cursor.frame;
        let r = self.frames[frame].rect;
        let usable = self.usable_rect(cursor.group);
        let only = self.groups[cursor.group].frames.len() == 1;
        let (near, at_near_edge) = match dir {
            Direction::Horizontal => (Side::Left, r.x <= usable.x),
            Direction::Vertical => (Side::Top, r.y <= usable.y),
        };
        let axis = if self.flush_far(frame, dir) {
            if adapt {
                return self.frame_shrink(surface, cursor, dir, false, size);
            }
            if only || at_near_edge {
                return Ok(false);
            }
            near
        } else {
            if only {
                return Ok(false);
            }
            near.opposite()
        };
        let applied = match self.trial_grow(cursor.group, frame, axis, size) {
            Some(trial) => self.commit_trial(surface, trial)?,
            None => false,
        };
        self.frame_focus(surface, frame)?;
        Ok(applied)
    }

    /// Removes the focused frame, its neighbours take over the space.
    pub fn frame_remove(&mut self, surface: &mut dyn DisplaySurface, cursor: FocusCursor) -> Result<bool> {
        let frame = cursor.frame;
        let group = cursor.group;
        if self.groups[group].frames.len() <= 1 {
            return Ok(false);
        }
        self.group_track(group)?;
        let mut trial = self.trial(group);
        let gap = self.frames[frame].rect;
        trial.changed = fill_gap(&mut trial.rects, &gap, &[frame], FillMode::Fewest);
        for f in &trial.changed {
            if let Some((_, rect)) = trial.rects.iter().find(|(k, _)| k == f) {
                self.frames[*f].rect = *rect;
            }
        }
        for f in &trial.changed {
            self.frame_update(surface, *f)?;
        }
        self.frame_destroy_hiding(surface, frame)?;
        if let Some(f) = self.groups[group].frames.current() {
            self.frame_focus(surface, f)?;
        }
        self.frames_display_hidden(surface, group)?;
        Ok(true)
    }

    /// Destroys every other frame of the group and stretches `frame` over the usable area.
    ///
    /// The frame isn't pushed to the surface, its group may be hidden.
    pub fn frame_single(&mut self, surface: &mut dyn DisplaySurface, frame: FrameId) -> Result<()> {
        let group = self.frames[frame].group;
        let others = self.groups[group]
            .frames
            .iter()
            .filter(|f| *f != frame)
            .collect::<Vec<_>>();
        for f in others {
            self.frame_destroy_hiding(surface, f)?;
        }
        self.frames[frame].rect = self.usable_rect(group);
        Ok(())
    }

    /// First other frame whose opposite edge touches `frame` on `side` and which overlaps it on
    /// the perpendicular axis.
    #[must_use]
    pub fn frame_relative(&self, frame: FrameId, side: Side) -> Option<FrameId> {
        let f = self.frames[frame].rect;
        let ring = &self.groups[self.frames[frame].group].frames;
        ring.walk_from(Some(frame), Dir::Next).skip(1).find(|s| {
            let s = self.frames[*s].rect;
            match side {
                Side::Left => f.x == s.right() && overlaps_y(&f, &s),
                Side::Right => s.x == f.right() && overlaps_y(&f, &s),
                Side::Top => f.y == s.bottom() && overlaps_x(&f, &s),
                Side::Bottom => s.y == f.bottom() && overlaps_x(&f, &s),
            }
        })
    }

    pub fn frame_focus_relative(
        &mut self,
        surface: &mut dyn DisplaySurface,
        cursor: FocusCursor,
        side: Side,
    ) -> Result<bool> {
        match self.frame_relative(cursor.frame, side) {
            Some(f) => {
                self.frame_focus(surface, f)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Exchanges the content of the focused frame and its neighbour on `side`.
    pub fn frame_swap(
        &mut self,
        surface: &mut dyn DisplaySurface,
        cursor: FocusCursor,
        side: Side,
    ) -> Result<bool> {
        self.group_track(cursor.group)?;
        let frame = cursor.frame;
        let Some(other) = self.frame_relative(frame, side) else {
            return Ok(false);
        };
        let a = self.frames[frame].shown.take();
        let b = self.frames[other].shown.take();
        if let Some(a) = a {
            self.client_display(surface, a, Some(other))?;
        }
        if let Some(b) = b {
            self.client_display(surface, b, Some(frame))?;
        }
        self.frame_focus(surface, other)?;
        Ok(true)
    }

    /// Moves the focused frame's client to its neighbour on `side`.
    pub fn frame_slide(
        &mut self,
        surface: &mut dyn DisplaySurface,
        cursor: FocusCursor,
        side: Side,
    ) -> Result<bool> {
        self.group_track(cursor.group)?;
        let frame = cursor.frame;
        let Some(other) = self.frame_relative(frame, side) else {
            return Ok(false);
        };
        let shown = self.frames[frame].shown;
        self.frame_focus_client(surface, other, shown)?;
        self.frame_auto_display_hidden(surface, frame, Dir::Next)?;
        Ok(true)
    }

    /// Catch-all frames can't be dedicated.
    pub fn frame_set_dedicated(
        &mut self,
        surface: &mut dyn DisplaySurface,
        frame: FrameId,
        on: bool,
    ) -> Result<()> {
        let flags = &mut self.frames[frame].flags;
        if flags.catchall || flags.dedicated == on {
            return Ok(());
        }
        flags.dedicated = on;
        self.frame_focus(surface, frame)
    }

    /// At most one catch-all frame per group, turning one on clears the others.
    pub fn frame_set_catchall(
        &mut self,
        surface: &mut dyn DisplaySurface,
        frame: FrameId,
        on: bool,
    ) -> Result<()> {
        let flags = &mut self.frames[frame].flags;
        if flags.catchall == on {
            return Ok(());
        }
        flags.catchall = on;
        flags.dedicated = false;
        if on {
            let others = self.groups[self.frames[frame].group]
                .frames
                .iter()
                .filter(|f| *f != frame && self.frames[*f].flags.catchall)
                .collect::<Vec<_>>();
            for f in others {
                self.frames[f].flags.catchall = false;
                self.frame_unfocus(surface, f)?;
            }
        }
        self.frame_focus(surface, frame)
    }

    pub fn frame_set_border(
        &mut self,
        surface: &mut dyn DisplaySurface,
        frame: FrameId,
        visible: bool,
    ) -> Result<()> {
        self.frames[frame].flags.border_hidden = !visible;
        self.frame_update(surface, frame)?;
        self.frame_focus(surface, frame)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Settings;
    use crate::geometry::{Direction, Rect, Side};
    use crate::state::tests::{assert_tiled, cursor, frame_rects, open, setup, setup_with};

    #[test]
    fn basic_split_halves_the_frame() {
        let (mut state, mut surface) = setup();
        let c = cursor(&state);
        let new = state
            .frame_split(&mut surface, c, Direction::Horizontal, 0.5)
            .unwrap()
            .unwrap();
        assert_eq!(Rect::new(0, 0, 500, 800), state.frames[c.frame].rect);
        assert_eq!(Rect::new(500, 0, 500, 800), state.frames[new].rect);
        // Focus stays by default
        assert_eq!(c.frame, cursor(&state).frame);
        assert_tiled(&state);
    }

    #[test]
    fn split_rejects_parts_below_minimum() {
        let (mut state, mut surface) = setup();
        let c = cursor(&state);
        assert!(state
            .frame_split(&mut surface, c, Direction::Horizontal, 0.05)
            .unwrap()
            .is_none());
        assert!(state
            .frame_split(&mut surface, c, Direction::Vertical, 1.0)
            .unwrap()
            .is_none());
        assert_eq!(1, frame_rects(&state).len());
        // Nothing tracked for rejected splits
        assert!(state.groups[c.group].history.is_empty());
    }

    #[test]
    fn split_then_remove_restores_full_frame() {
        let (mut state, mut surface) = setup();
        let c = cursor(&state);
        let new = state
            .frame_split(&mut surface, c, Direction::Horizontal, 0.3)
            .unwrap()
            .unwrap();
        state.frame_focus(&mut surface, new).unwrap();
        assert!(state.frame_remove(&mut surface, cursor(&state)).unwrap());
        assert_eq!(vec![Rect::new(0, 0, 1000, 800)], frame_rects(&state));
        assert_eq!(c.frame, cursor(&state).frame);
    }

    #[test]
    fn nested_split_round_trip() {
        let (mut state, mut surface) = setup();
        let c = cursor(&state);
        let right = state
            .frame_split(&mut surface, c, Direction::Horizontal, 0.5)
            .unwrap()
            .unwrap();
        state.frame_focus(&mut surface, right).unwrap();
        let bottom = state
            .frame_split(&mut surface, cursor(&state), Direction::Vertical, 0.5)
            .unwrap()
            .unwrap();
        assert_tiled(&state);
        state.frame_focus(&mut surface, bottom).unwrap();
        state.frame_remove(&mut surface, cursor(&state)).unwrap();
        assert_eq!(Rect::new(500, 0, 500, 800), state.frames[right].rect);
        assert_tiled(&state);
    }

    #[test]
    fn last_frame_cannot_be_removed() {
        let (mut state, mut surface) = setup();
        let c = cursor(&state);
        assert!(!state.frame_remove(&mut surface, c).unwrap());
        assert_eq!(vec![Rect::new(0, 0, 1000, 800)], frame_rects(&state));
        assert!(state.groups[c.group].history.is_empty());
    }

    #[test]
    fn grow_pushes_neighbour_and_keeps_tiling() {
        let (mut state, mut surface) = setup();
        let c = cursor(&state);
        let right = state
            .frame_split(&mut surface, c, Direction::Horizontal, 0.5)
            .unwrap()
            .unwrap();
        assert!(state
            .frame_grow(&mut surface, c, Direction::Horizontal, false, 20)
            .unwrap());
        assert_eq!(Rect::new(0, 0, 520, 800), state.frames[c.frame].rect);
        assert_eq!(Rect::new(520, 0, 480, 800), state.frames[right].rect);
        assert_tiled(&state);
    }

    #[test]
    fn grow_at_far_edge_with_adapt_shrinks_from_the_left() {
        let (mut state, mut surface) = setup();
        let c = cursor(&state);
        let right = state
            .frame_split(&mut surface, c, Direction::Horizontal, 0.5)
            .unwrap()
            .unwrap();
        state.frame_focus(&mut surface, right).unwrap();
        let rc = cursor(&state);
        assert!(state
            .frame_grow(&mut surface, rc, Direction::Horizontal, true, 20)
            .unwrap());
        assert_eq!(Rect::new(0, 0, 520, 800), state.frames[c.frame].rect);
        assert_eq!(Rect::new(520, 0, 480, 800), state.frames[right].rect);
        assert_tiled(&state);
        // Without adapt the far edge frame grows leftwards
        assert!(state
            .frame_grow(&mut surface, rc, Direction::Horizontal, false, 40)
            .unwrap());
        assert_eq!(Rect::new(480, 0, 520, 800), state.frames[right].rect);
        assert_tiled(&state);
    }

    #[test]
    fn grow_moves_whole_sibling_column() {
        let (mut state, mut surface) = setup();
        let c = cursor(&state);
        let right = state
            .frame_split(&mut surface, c, Direction::Horizontal, 0.5)
            .unwrap()
            .unwrap();
        let bottom_left = state
            .frame_split(&mut surface, c, Direction::Vertical, 0.5)
            .unwrap()
            .unwrap();
        assert!(state
            .frame_grow(&mut surface, c, Direction::Horizontal, false, 50)
            .unwrap());
        assert_eq!(Rect::new(0, 0, 550, 400), state.frames[c.frame].rect);
        assert_eq!(Rect::new(0, 400, 550, 400), state.frames[bottom_left].rect);
        assert_eq!(Rect::new(550, 0, 450, 800), state.frames[right].rect);
        assert_tiled(&state);
    }

    #[test]
    fn resize_never_goes_below_minimum() {
        let settings = Settings {
            border_width: 0,
            frame_min_wh: 300,
            ..Settings::default()
        };
        let (mut state, mut surface) = setup_with(settings);
        let c = cursor(&state);
        let right = state
            .frame_split(&mut surface, c, Direction::Horizontal, 0.5)
            .unwrap()
            .unwrap();
        assert_eq!(500, state.frames[right].rect.w);
        for _ in 0..10 {
            state
                .frame_grow(&mut surface, c, Direction::Horizontal, false, 40)
                .unwrap();
            assert_tiled(&state);
            assert!(state.frames[right].rect.w >= 300);
        }
        assert_eq!(300, state.frames[right].rect.w);
        for _ in 0..10 {
            state
                .frame_shrink(&mut surface, c, Direction::Horizontal, false, 40)
                .unwrap();
            assert!(state.frames[c.frame].rect.w >= 300);
        }
        assert_tiled(&state);
    }

    #[test]
    fn single_frame_refuses_to_grow_or_shrink() {
        let (mut state, mut surface) = setup();
        let c = cursor(&state);
        assert!(!state
            .frame_grow(&mut surface, c, Direction::Horizontal, true, 20)
            .unwrap());
        assert!(!state
            .frame_shrink(&mut surface, c, Direction::Vertical, false, 20)
            .unwrap());
        assert_eq!(vec![Rect::new(0, 0, 1000, 800)], frame_rects(&state));
    }

    #[test]
    fn relative_focus_and_swap() {
        let (mut state, mut surface) = setup();
        let c = cursor(&state);
        let right = state
            .frame_split(&mut surface, c, Direction::Horizontal, 0.5)
            .unwrap()
            .unwrap();
        let a = open(&mut state, &mut surface, "A");
        assert_eq!(Some(a), state.frames[c.frame].shown);
        assert_eq!(Some(right), state.frame_relative(c.frame, Side::Right));
        assert_eq!(None, state.frame_relative(c.frame, Side::Left));
        assert!(state.frame_swap(&mut surface, c, Side::Right).unwrap());
        assert_eq!(Some(right), state.clients[a].frame);
        assert_eq!(right, cursor(&state).frame);
        let win = state.clients[a].win;
        assert_eq!(500, surface.geometry(win).x);
    }

    #[test]
    fn catchall_is_unique_and_receives_new_windows() {
        let (mut state, mut surface) = setup();
        let c = cursor(&state);
        let right = state
            .frame_split(&mut surface, c, Direction::Horizontal, 0.5)
            .unwrap()
            .unwrap();
        state.frame_set_catchall(&mut surface, right, true).unwrap();
        state.frame_set_catchall(&mut surface, c.frame, true).unwrap();
        assert!(!state.frames[right].flags.catchall);
        state.frame_set_catchall(&mut surface, c.frame, false).unwrap();
        state.frame_set_catchall(&mut surface, right, true).unwrap();
        let a = open(&mut state, &mut surface, "A");
        assert_eq!(Some(right), state.clients[a].frame);
    }

    #[test]
    fn dedicated_frame_sends_new_windows_elsewhere() {
        let (mut state, mut surface) = setup();
        let c = cursor(&state);
        let right = state
            .frame_split(&mut surface, c, Direction::Horizontal, 0.5)
            .unwrap()
            .unwrap();
        state.frame_set_dedicated(&mut surface, c.frame, true).unwrap();
        assert_eq!(right, state.frame_available(c.frame));
        // Catch-all wins over dedication and clears it
        state.frame_set_catchall(&mut surface, c.frame, true).unwrap();
        assert!(!state.frames[c.frame].flags.dedicated);
        assert_eq!(c.frame, state.frame_available(right));
    }
}
