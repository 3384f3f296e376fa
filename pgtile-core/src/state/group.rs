use crate::config::{GROUP_HISTORY_LIMIT, UNDO_DEPTH};
use crate::debug;
use crate::error::{Error, Result};
use crate::geometry::packing::{fill_gap, make_gap};
use crate::geometry::{FillMode, Rect};
use crate::state::frame::Trial;
use crate::state::model::{Group, GroupId, GroupMode, HeadId, Padding};
use crate::state::ring::Dir;
use crate::state::State;
use crate::surface::DisplaySurface;
use crate::util::vec_ops::{discard, nth_recent, push_recent};

impl State {
    /// Appends a tiling group with a single frame covering the head.
    pub fn group_create(
        &mut self,
        surface: &mut dyn DisplaySurface,
        head: HeadId,
        name: &str,
    ) -> Result<GroupId> {
        let group = self.groups.insert(Group::new(head, name));
        self.heads[head].groups.push(group);
        let (w, h) = (self.heads[head].width, self.heads[head].height);
        self.frame_create(surface, group, Rect::new(0, 0, w, h))?;
        Ok(group)
    }

    /// Moves the group's clients to its ring successor and drops it. The caller makes sure
    /// it isn't the head's last group.
    pub fn group_destroy(&mut self, surface: &mut dyn DisplaySurface, group: GroupId) -> Result<()> {
        let head = self.groups[group].head;
        let Some(next) = self.heads[head].groups.next_of(group).filter(|n| *n != group) else {
            debug!("Refusing to destroy the last group of a head");
            return Ok(());
        };
        while let Some(c) = self.groups[group].clients.current() {
            self.client_regroup(surface, next, c)?;
        }
        while let Some(f) = self.groups[group].frames.current() {
            self.frame_destroy(surface, f)?;
        }
        let h = &mut self.heads[head];
        h.groups.remove(group);
        discard(&mut h.stacked, &group);
        self.groups.remove(group);
        Ok(())
    }

    pub fn group_unfocus(&mut self, surface: &mut dyn DisplaySurface, group: GroupId) -> Result<()> {
        let focused = self
            .focused_head
            .is_some_and(|h| self.heads[h].groups.current() == Some(group));
        if let Some(f) = self.groups[group].frames.current().filter(|_| focused) {
            self.frame_unfocus(surface, f)?;
        }
        Ok(())
    }

    /// Unmaps everything in the group, an empty group may close itself.
    ///
    /// Returns whether the group was destroyed.
    pub fn group_hide(&mut self, surface: &mut dyn DisplaySurface, group: GroupId) -> Result<bool> {
        for f in self.groups[group].frames.iter().collect::<Vec<_>>() {
            self.frame_hide(surface, f)?;
        }
        for c in self.groups[group].clients.iter().collect::<Vec<_>>() {
            self.client_hide(surface, c)?;
        }
        let g = &self.groups[group];
        if self.settings.group_close_empty
            && g.clients.is_empty()
            && self.heads[g.head].groups.len() > 1
        {
            self.group_destroy(surface, group)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Makes `group` its head's current group and redraws it.
    pub fn group_focus(&mut self, surface: &mut dyn DisplaySurface, group: GroupId) -> Result<()> {
        let head = self.groups[group].head;
        self.heads[head].groups.focus(group);
        for f in self.groups[group].frames.iter().collect::<Vec<_>>() {
            self.frame_update(surface, f)?;
        }
        if let Some(f) = self.groups[group].frames.current() {
            self.frame_focus(surface, f)?;
        }
        self.ewmh_clients(surface)?;
        self.ewmh_groups(surface)?;
        let stacked = &mut self.heads[head].stacked;
        push_recent(stacked, group);
        if stacked.len() > GROUP_HISTORY_LIMIT {
            stacked.remove(0);
        }
        Ok(())
    }

    /// Shows `group` in place of whatever its head currently shows.
    pub fn group_raise(&mut self, surface: &mut dyn DisplaySurface, group: GroupId) -> Result<()> {
        let head = self.groups[group].head;
        let Some(old) = self.heads[head].groups.current().filter(|o| *o != group) else {
            return Ok(());
        };
        self.group_unfocus(surface, old)?;
        self.group_focus(surface, group)?;
        self.group_hide(surface, old)?;
        Ok(())
    }

    /// Raises the group next to the current one in `dir`.
    pub fn group_step(&mut self, surface: &mut dyn DisplaySurface, head: HeadId, dir: Dir) -> Result<()> {
        let ring = &self.heads[head].groups;
        if let Some(g) = ring.current().and_then(|cur| ring.step(cur, dir)) {
            self.group_raise(surface, g)?;
        }
        Ok(())
    }

    /// Raises the previously shown group.
    pub fn group_other(&mut self, surface: &mut dyn DisplaySurface, head: HeadId) -> Result<()> {
        if let Some(g) = nth_recent(&self.heads[head].stacked, 1) {
            self.group_raise(surface, g)?;
        }
        Ok(())
    }

    /// Creates a group and switches to it.
    pub fn group_add(&mut self, surface: &mut dyn DisplaySurface, head: HeadId, name: &str) -> Result<GroupId> {
        let old = self.heads[head].groups.current();
        if let Some(old) = old {
            self.group_unfocus(surface, old)?;
        }
        let group = self.group_create(surface, head, name)?;
        self.group_focus(surface, group)?;
        if let Some(old) = old {
            self.group_hide(surface, old)?;
        }
        Ok(group)
    }

    /// Destroys the group unless it is the last one, shows the successor when it was current.
    pub fn group_drop(&mut self, surface: &mut dyn DisplaySurface, group: GroupId) -> Result<bool> {
        let head = self.groups[group].head;
        if self.heads[head].groups.len() <= 1 {
            return Ok(false);
        }
        let was_current = self.heads[head].groups.current() == Some(group);
        self.group_destroy(surface, group)?;
        if was_current {
            if let Some(g) = self.heads[head].groups.current() {
                self.group_focus(surface, g)?;
            }
        }
        self.ewmh_groups(surface)?;
        Ok(true)
    }

    /// Changes the padding, frames along each changed edge grow into freed space or shrink out
    /// of reserved space. Rejected when a frame would end up below the minimum size.
    pub fn group_resize(
        &mut self,
        surface: &mut dyn DisplaySurface,
        group: GroupId,
        pad: Padding,
    ) -> Result<bool> {
        let head = self.groups[group].head;
        let (sw, sh) = (self.heads[head].width, self.heads[head].height);
        let old = self.groups[group].pad;
        let mut cur = old;
        let mut trial = self.trial(group);
        let apply = |strip: Rect, grow_into: bool, trial: &mut Trial| {
            let changed = if grow_into {
                fill_gap(&mut trial.rects, &strip, &[], FillMode::All)
            } else {
                make_gap(&mut trial.rects, &strip, &[])
            };
            trial.touch(&changed);
        };
        let height = |p: &Padding| sh - p.t - p.b;
        let width = |p: &Padding| sw - p.l - p.r;
        if pad.l != cur.l {
            let (x, w) = (pad.l.min(cur.l), (pad.l - cur.l).abs());
            apply(Rect::new(x, cur.t, w, height(&cur)), pad.l < cur.l, &mut trial);
            cur.l = pad.l;
        }
        if pad.r != cur.r {
            let (x, w) = (sw - pad.r.max(cur.r), (pad.r - cur.r).abs());
            apply(Rect::new(x, cur.t, w, height(&cur)), pad.r < cur.r, &mut trial);
            cur.r = pad.r;
        }
        if pad.t != cur.t {
            let (y, h) = (pad.t.min(cur.t), (pad.t - cur.t).abs());
            apply(Rect::new(cur.l, y, width(&cur), h), pad.t < cur.t, &mut trial);
            cur.t = pad.t;
        }
        if pad.b != cur.b {
            let (y, h) = (sh - pad.b.max(cur.b), (pad.b - cur.b).abs());
            apply(Rect::new(cur.l, y, width(&cur), h), pad.b < cur.b, &mut trial);
        }
        self.groups[group].pad = pad;
        if !self.commit_trial(surface, trial)? {
            self.groups[group].pad = old;
            return Ok(false);
        }
        for f in self.groups[group].frames.iter().collect::<Vec<_>>() {
            self.frame_update(surface, f)?;
        }
        Ok(true)
    }

    /// Remembers the current layout for undo, the oldest snapshot goes when full.
    pub fn group_track(&mut self, group: GroupId) -> Result<()> {
        let dump = self.group_dump(group);
        self.group_remember(group, dump)
    }

    /// Pushes a layout dumped earlier, for changes that are only tracked once they succeed.
    pub fn group_remember(&mut self, group: GroupId, dump: String) -> Result<()> {
        let history = &mut self.groups[group].history;
        if history.is_full() {
            history.pop_front();
        }
        history
            .push_back(dump)
            .map_err(|_| Error::HeaplessPush(UNDO_DEPTH))
    }

    /// Restores the last tracked layout, the message is for the user when there is none.
    pub fn group_undo(
        &mut self,
        surface: &mut dyn DisplaySurface,
        group: GroupId,
    ) -> Result<Option<String>> {
        match self.groups[group].history.pop_back() {
            Some(layout) => {
                self.group_load(surface, group, &layout)?;
                Ok(None)
            }
            None => Ok(Some(format!(
                "nothing to undo for {}",
                self.groups[group].name
            ))),
        }
    }

    /// Switches between tiling and stacking.
    ///
    /// Going to stacking tracks the tiled layout and replaces it with one frame over the whole
    /// head, clients get their remembered floating geometry back. Going back restores the
    /// tracked layout.
    pub fn group_stack_toggle(
        &mut self,
        surface: &mut dyn DisplaySurface,
        group: GroupId,
    ) -> Result<Option<String>> {
        if !self.groups[group].is_tiling() {
            self.groups[group].mode = GroupMode::Tiling;
            return self.group_undo(surface, group);
        }
        self.group_track(group)?;
        while let Some(f) = self.groups[group].frames.current() {
            self.frame_destroy(surface, f)?;
        }
        let head = self.groups[group].head;
        let (w, h) = (self.heads[head].width, self.heads[head].height);
        let g = &mut self.groups[group];
        g.pad = Padding::default();
        g.mode = GroupMode::Stacking;
        let frame = self.frame_create(surface, group, Rect::new(0, 0, w, h))?;
        self.frame_update(surface, frame)?;
        let bw = self.settings.border_width as i32;
        for c in self.groups[group].clients.iter().collect::<Vec<_>>() {
            let client = &mut self.clients[c];
            let rect = if client.float.w > 0 && client.float.h > 0 {
                client.float
            } else {
                Rect::new(client.rect.x - bw, client.rect.y - bw, client.rect.w, client.rect.h)
            };
            client.rect = rect;
            client.float = rect;
            surface.move_resize_window(client.win, rect)?;
            self.client_display(surface, c, Some(frame))?;
        }
        self.frame_focus(surface, frame)?;
        Ok(None)
    }

    /// Moves focus to another head, its current group takes over.
    pub fn head_focus(&mut self, surface: &mut dyn DisplaySurface, head: HeadId) -> Result<()> {
        if let Some(cur) = self.cursor() {
            self.group_unfocus(surface, cur.group)?;
        }
        self.focused_head = Some(head);
        if let Some(g) = self.heads[head].groups.current() {
            self.group_focus(surface, g)?;
        }
        Ok(())
    }

    /// The head after the focused one in screen order, wrapping.
    #[must_use]
    pub fn head_next(&self) -> Option<HeadId> {
        let pos = self
            .focused_head
            .and_then(|h| self.head_order.iter().position(|o| *o == h))?;
        self.head_order
            .get((pos + 1) % self.head_order.len())
            .copied()
    }

    /// New output size. Every group collapses to a single frame since their layouts no
    /// longer add up.
    pub fn head_resize(
        &mut self,
        surface: &mut dyn DisplaySurface,
        head: HeadId,
        width: i32,
        height: i32,
    ) -> Result<()> {
        let h = &mut self.heads[head];
        if h.width == width && h.height == height {
            return Ok(());
        }
        h.width = width;
        h.height = height;
        for g in self.heads[head].groups.iter().collect::<Vec<_>>() {
            if let Some(f) = self.groups[g].frames.current() {
                self.frame_single(surface, f)?;
            }
        }
        if self.focused_head == Some(head) {
            if let Some(cur) = self.cursor() {
                self.frame_update(surface, cur.frame)?;
                self.frame_focus(surface, cur.frame)?;
            }
        }
        Ok(())
    }
}
