use crate::debug;
use crate::error::Result;
use crate::geometry::Rect;
use crate::state::model::{Client, ClientFlags, ClientId, FrameId, GroupId, HeadId};
use crate::state::ring::Dir;
use crate::state::State;
use crate::surface::{BorderColor, ConfigureRequest, DisplaySurface, WindowInfo};
use crate::util::vec_ops::{discard, push_recent};
use crate::Window;

impl State {
    /// Registers a managed window in `group`, hidden until displayed.
    pub fn client_create(
        &mut self,
        group: GroupId,
        frame: Option<FrameId>,
        win: Window,
        info: &WindowInfo,
    ) -> ClientId {
        let client = self.clients.insert(Client {
            win,
            group,
            frame,
            parent: None,
            kids: 0,
            name: info.name.clone(),
            class: info.class.clone(),
            role: info.role.clone(),
            rect: Rect::default(),
            float: Rect::default(),
            flags: ClientFlags {
                hidden: true,
                hints: self.settings.window_size_hints,
                ..ClientFlags::default()
            },
            unmaps: 0,
            mapped: false,
            net_state: info.net_state,
            input: info.input,
            state: 0,
        });
        self.client_push(group, client);
        client
    }

    /// Links the client into `group`, a client without a frame takes the group's current one.
    fn client_push(&mut self, group: GroupId, client: ClientId) {
        let fallback = self.groups[group].frames.current();
        self.groups[group].clients.push(client);
        let c = &mut self.clients[client];
        c.group = group;
        if c.frame.is_none() {
            c.frame = fallback;
        }
        c.state = 0;
    }

    /// Unlinks the client from its group and frame.
    fn client_pop(&mut self, client: ClientId) {
        let c = &mut self.clients[client];
        let group = c.group;
        if let Some(f) = c.frame.take().and_then(|f| self.frames.get_mut(f)) {
            if f.shown == Some(client) {
                f.shown = None;
            }
        }
        let g = &mut self.groups[group];
        g.clients.remove(client);
        discard(&mut g.stacked, &client);
    }

    fn client_destroy(&mut self, client: ClientId) {
        self.client_pop(client);
        if let Some(c) = self.clients.remove(client) {
            if let Some(p) = c.parent.and_then(|p| self.clients.get_mut(p)) {
                p.kids = p.kids.saturating_sub(1);
            }
        }
    }

    /// Moves the client and its transients into `group`, all of them hidden.
    pub fn client_regroup(
        &mut self,
        surface: &mut dyn DisplaySurface,
        group: GroupId,
        client: ClientId,
    ) -> Result<()> {
        let mut family = Vec::new();
        self.client_and_kids(client, None, &mut family);
        for c in family {
            self.client_pop(c);
            self.client_hide(surface, c)?;
            self.client_push(group, c);
        }
        Ok(())
    }

    /// Appends `root`'s transients depth first, then `root` itself, skipping `except`'s subtree.
    fn client_and_kids(&self, root: ClientId, except: Option<ClientId>, out: &mut Vec<ClientId>) {
        if except == Some(root) {
            return;
        }
        let ring = &self.groups[self.clients[root].group].clients;
        let mut visiting = Vec::new();
        let mut work = vec![(root, false)];
        while let Some((c, expanded)) = work.pop() {
            if expanded {
                out.push(c);
                continue;
            }
            if out.contains(&c) || visiting.contains(&c) {
                continue;
            }
            visiting.push(c);
            work.push((c, true));
            let kids = ring
                .walk_from(Some(c), Dir::Next)
                .filter(|k| Some(*k) != except && self.clients[*k].parent == Some(c))
                .collect::<Vec<_>>();
            work.extend(kids.into_iter().rev().map(|k| (k, false)));
        }
    }

    /// Computes and pushes the client's geometry.
    ///
    /// Tiled clients fill their frame without a border, transients and stacked clients float
    /// with the requested or current geometry, constrained by their size hints.
    pub fn client_configure(
        &mut self,
        surface: &mut dyn DisplaySurface,
        client: ClientId,
        request: Option<&ConfigureRequest>,
    ) -> Result<()> {
        let bw = self.settings.border_width;
        let min = self.settings.frame_min_wh;
        let (win, group, frame, hints) = {
            let c = &self.clients[client];
            (c.win, c.group, c.frame, c.flags.hints)
        };
        let tiling = self.groups[group].is_tiling();
        let framed = frame.and_then(|f| self.frames.get(f));
        let base = match framed {
            Some(f) if tiling => {
                let fbw = if f.flags.border_hidden { 0 } else { bw as i32 };
                Rect::new(
                    f.rect.x + fbw,
                    f.rect.y + fbw,
                    f.rect.w - fbw * 2,
                    f.rect.h - fbw * 2,
                )
            }
            _ => self.usable_rect(group),
        };
        let transient = surface.transient_for(win)?;
        let (mut rect, border) = if tiling && transient.is_none() {
            self.clients[client].flags.normal = true;
            (base, 0)
        } else {
            self.clients[client].flags.normal = false;
            let mut r = surface.window_geometry(win)?.unwrap_or(base);
            if let Some(req) = request {
                r.x = req.x.unwrap_or(r.x);
                r.y = req.y.unwrap_or(r.y);
                r.w = req.w.unwrap_or(r.w);
                r.h = req.h.unwrap_or(r.h);
            }
            (r, bw)
        };
        if hints {
            if let Some(size_hints) = surface.size_hints(win)? {
                let (w, h) = size_hints.constrain(rect.w, rect.h);
                rect.w = w.min(base.w);
                rect.h = h.min(base.h);
                if transient.is_none() {
                    let floor = min - 2 * bw as i32;
                    rect.w = rect.w.max(floor);
                    rect.h = rect.h.max(floor);
                }
            }
        }
        if tiling && (rect.w < base.w || rect.h < base.h) {
            rect.x = base.x + (base.w - rect.w) / 2;
            rect.y = base.y + (base.h - rect.h) / 2;
        }
        surface.configure_window(win, rect, border)?;
        let c = &mut self.clients[client];
        c.rect = rect;
        if !tiling {
            c.float = rect;
        }
        Ok(())
    }

    /// Shows the client in `target` (or its current frame) together with its transient family.
    ///
    /// Nothing is pushed to the surface when the client is already shown there and the frame
    /// hasn't changed since.
    pub fn client_display(
        &mut self,
        surface: &mut dyn DisplaySurface,
        client: ClientId,
        target: Option<FrameId>,
    ) -> Result<()> {
        let c = &self.clients[client];
        let current = c.frame.filter(|f| self.frames.contains_key(*f));
        let redraw = (target.is_some() && target != current)
            || current.is_some_and(|f| {
                let f = &self.frames[f];
                f.shown != Some(client) || f.state != c.state
            });
        if let Some(t) = target {
            if let Some(old) = current.filter(|f| *f != t) {
                if self.frames[old].shown == Some(client) {
                    self.frames[old].shown = None;
                }
            }
            self.clients[client].frame = Some(t);
        }
        let Some(frame) = self.clients[client]
            .frame
            .filter(|f| self.frames.contains_key(*f))
        else {
            debug!("No frame to display client in");
            return Ok(());
        };
        self.frames[frame].shown = Some(client);
        let state = self.frames[frame].state;
        self.clients[client].state = state;
        if !redraw {
            return Ok(());
        }
        self.client_configure(surface, client, None)?;
        let ancestor = self.client_ancestor(client);
        let mut family = Vec::new();
        self.client_and_kids(client, None, &mut family);
        self.client_and_kids(ancestor, Some(client), &mut family);
        let mut wins = Vec::with_capacity(family.len() + 1);
        for relative in family {
            self.client_show(surface, relative)?;
            let r = &mut self.clients[relative];
            if r.frame != Some(frame) {
                r.frame = Some(frame);
                r.state = state.wrapping_sub(1);
            }
            if r.state != state {
                self.client_configure(surface, relative, None)?;
                self.clients[relative].state = state;
            }
            wins.push(self.clients[relative].win);
        }
        let group = self.clients[client].group;
        if self.groups[group].is_tiling() {
            wins.push(self.frames[frame].win);
        }
        self.window_stack(surface, self.groups[group].head, &wins)
    }

    /// Forces a full redraw on the next display.
    pub fn client_refresh(&mut self, surface: &mut dyn DisplaySurface, client: ClientId) -> Result<()> {
        self.clients[client].state = 0;
        self.client_display(surface, client, None)
    }

    /// Colours the client's border and those of its direct transients.
    fn client_border(
        &self,
        surface: &mut dyn DisplaySurface,
        client: ClientId,
        color: BorderColor,
    ) -> Result<()> {
        let ring = &self.groups[self.clients[client].group].clients;
        for kid in ring.iter().filter(|k| self.clients[*k].parent == Some(client)) {
            surface.set_border_color(self.clients[kid].win, color)?;
        }
        surface.set_border_color(self.clients[client].win, color)
    }

    pub fn client_unfocus(&mut self, surface: &mut dyn DisplaySurface, client: ClientId) -> Result<()> {
        self.client_border(surface, client, BorderColor::Unfocus)
    }

    /// Displays the client and gives it input focus.
    pub fn client_focus(
        &mut self,
        surface: &mut dyn DisplaySurface,
        client: ClientId,
        target: Option<FrameId>,
    ) -> Result<()> {
        let group = self.clients[client].group;
        if let Some(prev) = self.groups[group].clients.current().filter(|p| *p != client) {
            self.client_unfocus(surface, prev)?;
        }
        self.groups[group].clients.focus(client);
        self.client_display(surface, client, target)?;
        self.client_border(surface, client, BorderColor::Focus)?;
        let c = &self.clients[client];
        let input_window = if c.input {
            c.win
        } else {
            c.frame
                .and_then(|f| self.frames.get(f))
                .map_or(c.win, |f| f.win)
        };
        surface.focus_window(input_window)?;
        self.ewmh_clients(surface)?;
        push_recent(&mut self.groups[group].stacked, client);
        Ok(())
    }

    /// Brings the client forward, into its own frame if it's shown there, otherwise into the
    /// best available frame of its group.
    pub fn client_raise(&mut self, surface: &mut dyn DisplaySurface, client: ClientId) -> Result<()> {
        self.clients[client].flags.shrunk = false;
        let c = &self.clients[client];
        let own = c
            .frame
            .filter(|f| self.frames.get(*f).is_some_and(|f| f.shown == Some(client)));
        let target = match own {
            Some(f) => f,
            None => match self.groups[c.group].frames.current() {
                Some(f) => self.frame_available(f),
                None => return Ok(()),
            },
        };
        self.frame_focus_client(surface, target, Some(client))
    }

    pub fn client_show(&mut self, surface: &mut dyn DisplaySurface, client: ClientId) -> Result<()> {
        let c = &mut self.clients[client];
        c.flags.hidden = false;
        if !c.mapped {
            c.mapped = true;
            surface.map_window(c.win)?;
        }
        Ok(())
    }

    /// Unmaps the window and remembers that the resulting notify is ours.
    fn client_withdraw(&mut self, surface: &mut dyn DisplaySurface, client: ClientId) -> Result<()> {
        let c = &mut self.clients[client];
        c.state = 0;
        if c.mapped {
            c.mapped = false;
            c.unmaps += 1;
            surface.unmap_window(c.win)?;
        }
        Ok(())
    }

    pub fn client_hide(&mut self, surface: &mut dyn DisplaySurface, client: ClientId) -> Result<()> {
        self.clients[client].flags.hidden = true;
        self.client_withdraw(surface, client)
    }

    /// Hides the client and keeps it out of automatic reveals until raised.
    pub fn client_shrink(&mut self, surface: &mut dyn DisplaySurface, client: ClientId) -> Result<()> {
        self.clients[client].flags.shrunk = true;
        self.client_withdraw(surface, client)
    }

    #[must_use]
    pub fn client_is_displayed(&self, client: ClientId) -> bool {
        self.clients[client]
            .frame
            .and_then(|f| self.frames.get(f))
            .is_some_and(|f| f.shown == Some(client))
    }

    /// Forgets the client and refills the frame it leaves empty, preferring its parent.
    pub fn client_remove(&mut self, surface: &mut dyn DisplaySurface, client: ClientId) -> Result<()> {
        let Some(c) = self.clients.get(client) else {
            return Ok(());
        };
        let (frame, parent) = (c.frame, c.parent);
        self.client_destroy(client);
        if let Some(f) = frame.filter(|f| self.frames.contains_key(*f)) {
            let group = self.frames[f].group;
            if self.frames[f].shown.is_none() && self.is_visible_group(group) {
                let focus = self.cursor().is_some_and(|cur| cur.frame == f);
                let parent = parent
                    .filter(|p| self.clients.contains_key(*p) && !self.client_is_displayed(*p));
                match (parent, focus) {
                    (Some(p), true) => self.client_focus(surface, p, Some(f))?,
                    (Some(p), false) => self.client_display(surface, p, Some(f))?,
                    (None, true) => self.frame_auto_focus_hidden(surface, f, Dir::Next)?,
                    (None, false) => self.frame_auto_display_hidden(surface, f, Dir::Next)?,
                }
            }
        }
        self.ewmh_clients(surface)
    }

    /// Asks the client to close, a second attempt on a client that didn't comply kills it.
    pub fn client_kill(&mut self, surface: &mut dyn DisplaySurface, client: ClientId) -> Result<()> {
        let c = &mut self.clients[client];
        if c.flags.killed {
            surface.kill_client(c.win)?;
            self.client_remove(surface, client)
        } else {
            c.flags.killed = true;
            surface.send_close_request(c.win)
        }
    }

    pub fn client_set_hints(
        &mut self,
        surface: &mut dyn DisplaySurface,
        client: ClientId,
        on: bool,
    ) -> Result<()> {
        self.clients[client].flags.hints = on;
        self.client_refresh(surface, client)
    }

    /// Restacks `windows` (topmost first) under the head's fullscreen and above windows.
    pub fn window_stack(
        &self,
        surface: &mut dyn DisplaySurface,
        head: HeadId,
        windows: &[Window],
    ) -> Result<()> {
        let h = &self.heads[head];
        let mut order = Vec::with_capacity(h.fullscreen.len() + h.above.len() + 1);
        order.extend(h.fullscreen.iter().copied());
        order.extend(h.above.iter().copied());
        if let Some(first) = windows.first() {
            order.push(*first);
        }
        let Some(top) = order.first() else {
            return Ok(());
        };
        surface.raise_window(*top)?;
        if order.len() > 1 {
            surface.restack_windows(&order)?;
        }
        if windows.len() > 1 {
            surface.restack_windows(windows)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::geometry::hints::SizeHints;
    use crate::geometry::{Direction, Rect};
    use crate::state::tests::{cursor, open, setup};
    use crate::surface::recording::Call;
    use crate::surface::BorderColor;

    #[test]
    fn display_without_changes_pushes_nothing() {
        let (mut state, mut surface) = setup();
        let a = open(&mut state, &mut surface, "A");
        surface.take_calls();
        state.client_display(&mut surface, a, None).unwrap();
        assert!(surface.take_calls().is_empty());
        // A frame geometry change forces the redraw
        let c = cursor(&state);
        state
            .frame_split(&mut surface, c, Direction::Horizontal, 0.5)
            .unwrap()
            .unwrap();
        let win = state.clients[a].win;
        assert_eq!(Rect::new(0, 0, 500, 800), surface.geometry(win));
    }

    #[test]
    fn kill_asks_first_then_forces() {
        let (mut state, mut surface) = setup();
        let a = open(&mut state, &mut surface, "A");
        let win = state.clients[a].win;
        surface.take_calls();
        state.client_kill(&mut surface, a).unwrap();
        assert_eq!(vec![Call::CloseRequest(win)], surface.take_calls());
        assert!(state.clients.contains_key(a));
        state.client_kill(&mut surface, a).unwrap();
        assert!(surface.take_calls().contains(&Call::Kill(win)));
        assert!(!state.clients.contains_key(a));
        assert_eq!(None, state.frames[cursor(&state).frame].shown);
    }

    #[test]
    fn focus_moves_border_and_input() {
        let (mut state, mut surface) = setup();
        let a = open(&mut state, &mut surface, "A");
        let b = open(&mut state, &mut surface, "B");
        let (wa, wb) = (state.clients[a].win, state.clients[b].win);
        assert_eq!(Some(b), state.groups[cursor(&state).group].clients.current());
        surface.take_calls();
        state.client_raise(&mut surface, a).unwrap();
        let calls = surface.take_calls();
        assert!(calls.contains(&Call::Border(wb, BorderColor::Unfocus)));
        assert!(calls.contains(&Call::Border(wa, BorderColor::Focus)));
        assert!(calls.contains(&Call::Focus(wa)));
        assert!(surface.is_mapped(wa));
        assert_eq!(vec![b, a], state.groups[cursor(&state).group].stacked);
    }

    #[test]
    fn hide_counts_only_unmaps_it_issued() {
        let (mut state, mut surface) = setup();
        let a = open(&mut state, &mut surface, "A");
        state.client_hide(&mut surface, a).unwrap();
        state.client_hide(&mut surface, a).unwrap();
        assert_eq!(1, state.clients[a].unmaps);
        state.client_show(&mut surface, a).unwrap();
        state.client_shrink(&mut surface, a).unwrap();
        assert_eq!(2, state.clients[a].unmaps);
        assert!(state.clients[a].flags.shrunk);
    }

    #[test]
    fn size_hints_center_tiled_window() {
        let (mut state, mut surface) = setup();
        let win = surface.add_client_window("Term", Rect::new(0, 0, 10, 10));
        surface.set_hints(
            win,
            SizeHints {
                max: Some((400, 300)),
                ..SizeHints::default()
            },
        );
        state.map_request(&mut surface, win).unwrap();
        assert_eq!(Rect::new(300, 250, 400, 300), surface.geometry(win));
    }

    #[test]
    fn transient_floats_and_follows_parent() {
        let (mut state, mut surface) = setup();
        let a = open(&mut state, &mut surface, "A");
        let parent_win = state.clients[a].win;
        let dialog = surface.add_transient_window("A", Rect::new(50, 60, 200, 100), parent_win);
        state.map_request(&mut surface, dialog).unwrap();
        let d = state.client_by_window(dialog).unwrap();
        assert_eq!(Some(a), state.clients[d].parent);
        assert_eq!(1, state.clients[a].kids);
        assert!(!state.clients[d].flags.normal);
        // Keeps its size, centred over the frame
        assert_eq!(Rect::new(400, 350, 200, 100), surface.geometry(dialog));
        // Closing the dialog gives the frame back to the parent
        surface.vanish(dialog);
        state.client_remove(&mut surface, d).unwrap();
        assert_eq!(0, state.clients[a].kids);
        assert_eq!(Some(a), state.frames[cursor(&state).frame].shown);
    }
}
