use std::fmt::Write;

use crate::command::{Command, Listing, ScreenRef, Size};
use crate::config::Placement;
use crate::debug;
use crate::error::{Error, Result};
use crate::geometry::{Direction, Side};
use crate::state::model::{ClientId, FocusCursor, GroupId};
use crate::state::ring::Dir;
use crate::state::snapshot::parse_layout;
use crate::state::{HiddenScope, State};
use crate::surface::{DisplaySurface, Launch};

impl State {
    /// Parses and runs one command line.
    pub fn run_command(
        &mut self,
        surface: &mut dyn DisplaySurface,
        launcher: &mut dyn Launch,
        line: &str,
    ) -> Result<Option<String>> {
        match Command::parse(line) {
            Some(cmd) => self.execute(surface, launcher, cmd),
            None => Ok(Some(format!("could not execute: {}", line.trim()))),
        }
    }

    /// Runs every non-empty line that isn't a `#` comment, the non-empty results joined by
    /// newlines.
    pub fn run_commands(
        &mut self,
        surface: &mut dyn DisplaySurface,
        launcher: &mut dyn Launch,
        text: &str,
    ) -> Result<String> {
        let mut out = String::new();
        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(res) = self.run_command(surface, launcher, line)? {
                if !res.is_empty() {
                    if !out.is_empty() {
                        out.push('\n');
                    }
                    out.push_str(&res);
                }
            }
        }
        Ok(out)
    }

    /// Runs a decoded command against the focused head, group and frame.
    ///
    /// Rejections come back as a message for the user, `Err` is reserved for a broken display
    /// connection and [`Error::Quit`].
    pub fn execute(
        &mut self,
        surface: &mut dyn DisplaySurface,
        launcher: &mut dyn Launch,
        cmd: Command,
    ) -> Result<Option<String>> {
        let Some(cur) = self.cursor() else {
            return Ok(None);
        };
        let tiling = self.groups[cur.group].is_tiling();
        let res = if cmd.tiling_only() && !tiling {
            Some(format!("command invalid for stacking mode: {cmd:?}"))
        } else {
            self.dispatch(surface, launcher, cur, cmd)?
        };
        self.ewmh_clients(surface)?;
        self.ewmh_groups(surface)?;
        Ok(res)
    }

    fn dispatch(
        &mut self,
        surface: &mut dyn DisplaySurface,
        launcher: &mut dyn Launch,
        cur: FocusCursor,
        cmd: Command,
    ) -> Result<Option<String>> {
        let min = self.settings.frame_min_wh;
        let frame_rect = self.frames[cur.frame].rect;
        let shown = self.frame_content(cur.frame);
        match cmd {
            Command::Split(dir, size) => {
                let fs = extent(frame_rect.w, frame_rect.h, dir);
                let size = size.resolve(fs, min);
                if self
                    .frame_split(surface, cur, dir, size / f64::from(fs))?
                    .is_none()
                {
                    return Ok(Some(format!("unable to split: {size} of {fs}")));
                }
            }
            Command::Extent(dir, size) => return self.set_extent(surface, cur, dir, size),
            Command::Remove => {
                if !self.frame_remove(surface, cur)? {
                    return Ok(Some("cannot remove the only frame".to_owned()));
                }
            }
            Command::Kill(reference) => {
                if let Some(c) = self.client_ref(cur.group, reference.as_deref(), shown) {
                    self.client_kill(surface, c)?;
                }
            }
            Command::Cycle { local, dir } => {
                let scope = if local {
                    HiddenScope::Local
                } else {
                    HiddenScope::Any
                };
                self.frame_focus_hidden(surface, cur.frame, dir, scope, false)?;
            }
            Command::Only => {
                self.group_track(cur.group)?;
                self.frame_single(surface, cur.frame)?;
                self.frame_update(surface, cur.frame)?;
                self.frame_focus(surface, cur.frame)?;
            }
            Command::Focus(side) => {
                self.frame_focus_relative(surface, cur, side)?;
            }
            Command::Dedicate(flag) => {
                let on = flag.apply(self.frames[cur.frame].flags.dedicated);
                self.frame_set_dedicated(surface, cur.frame, on)?;
            }
            Command::Catchall(flag) => {
                let on = flag.apply(self.frames[cur.frame].flags.catchall);
                self.frame_set_catchall(surface, cur.frame, on)?;
            }
            Command::Undo => return self.group_undo(surface, cur.group),
            Command::Resize(side) => {
                let step = self.settings.frame_resize;
                let before = self.group_dump(cur.group);
                let resized = match side {
                    Side::Top => self.frame_shrink(surface, cur, Direction::Vertical, true, step)?,
                    Side::Bottom => self.frame_grow(surface, cur, Direction::Vertical, true, step)?,
                    Side::Left => self.frame_shrink(surface, cur, Direction::Horizontal, true, step)?,
                    Side::Right => self.frame_grow(surface, cur, Direction::Horizontal, true, step)?,
                };
                if resized {
                    self.group_remember(cur.group, before)?;
                }
            }
            Command::Pad(pad) => {
                let before = self.group_dump(cur.group);
                if self.group_resize(surface, cur.group, pad)? {
                    self.group_remember(cur.group, before)?;
                } else {
                    return Ok(Some(format!(
                        "unable to pad {} {} {} {}: frames would be too small",
                        pad.l, pad.r, pad.t, pad.b
                    )));
                }
            }
            Command::Add(name) => {
                self.group_add(surface, cur.head, &name)?;
            }
            Command::Drop(reference) => match self.group_from_str(cur.head, &reference) {
                Some(g) => {
                    if !self.group_drop(surface, g)? {
                        return Ok(Some("cannot drop the only group".to_owned()));
                    }
                }
                None => return Ok(Some(format!("unknown group {reference}"))),
            },
            Command::Name(name) => self.groups[cur.group].name = name,
            Command::Dump(file) => {
                let dump = self.group_dump(cur.group);
                if let Err(_e) = std::fs::write(&file, dump) {
                    debug!("Failed to write dump {_e}");
                    return Ok(Some(format!("could not write {file}")));
                }
            }
            Command::Load(file) => {
                let dump = match std::fs::read_to_string(&file) {
                    Ok(dump) if parse_layout(&dump).is_ok() => dump,
                    _ => return Ok(Some(format!("could not read {file}"))),
                };
                self.group_track(cur.group)?;
                self.group_load(surface, cur.group, &dump)?;
            }
            Command::Use(reference) => {
                return self.use_group(surface, cur, &reference);
            }
            Command::Stack(flag) => {
                let stacking = !self.groups[cur.group].is_tiling();
                if flag.apply(stacking) != stacking {
                    return self.group_stack_toggle(surface, cur.group);
                }
            }
            Command::Swap(side) => {
                self.frame_swap(surface, cur, side)?;
            }
            Command::Slide(side) => {
                self.frame_slide(surface, cur, side)?;
            }
            Command::Move(reference) => {
                let Some(c) = shown.map(|c| self.client_ancestor(c)) else {
                    return Ok(None);
                };
                if let Some(g) = self.group_auto_create(surface, cur.head, &reference)? {
                    if g != self.clients[c].group {
                        self.client_regroup(surface, g, c)?;
                        self.frame_auto_focus_hidden(surface, cur.frame, Dir::Next)?;
                    }
                }
            }
            Command::Manage { on, class } => {
                self.settings.unmanaged.retain(|c| *c != class);
                if on {
                    return Ok(Some(format!("{class} is managed")));
                }
                let msg = format!("{class} is unmanaged");
                self.settings.unmanaged.push(class);
                return Ok(Some(msg));
            }
            Command::Raise(reference) => {
                if let Some(c) = self.client_from_str(cur.group, &reference) {
                    self.client_raise(surface, c)?;
                }
            }
            Command::Shrink(reference) => {
                if let Some(c) = self.client_ref(cur.group, reference.as_deref(), shown) {
                    self.client_shrink(surface, c)?;
                    if let Some(f) = self.clients[c].frame.filter(|f| self.frames.contains_key(*f)) {
                        self.frame_auto_focus_hidden(surface, f, Dir::Next)?;
                    }
                }
            }
            Command::Border(flag) => {
                let visible = flag.apply(!self.frames[cur.frame].flags.border_hidden);
                self.frame_set_border(surface, cur.frame, visible)?;
            }
            Command::Refresh => {
                if let Some(c) = self.groups[cur.group].clients.current() {
                    self.client_refresh(surface, c)?;
                }
            }
            Command::Place { class, on, group } => {
                self.settings.placements.retain(|p| p.class != class);
                return Ok(Some(match group.filter(|_| on) {
                    Some(group) => {
                        let msg = format!("created placement rule for {class} on {group}");
                        self.settings.placements.push(Placement { class, group });
                        msg
                    }
                    None => format!("removed placement rule for {class}"),
                }));
            }
            Command::Screen(screen) => {
                let head = match screen {
                    ScreenRef::Next => self.head_next(),
                    ScreenRef::Index(n) => self.head_order.get(n).copied(),
                };
                match (head, screen) {
                    (Some(h), _) if h != cur.head => self.head_focus(surface, h)?,
                    (Some(_), _) | (None, ScreenRef::Next) => {}
                    (None, ScreenRef::Index(n)) => return Ok(Some(format!("invalid screen id {n}"))),
                }
            }
            Command::Exec(line) => match launcher.launch(&line) {
                Ok(pid) => self.record_launch(pid)?,
                Err(e) => {
                    tracing::warn!("Failed to launch {line}: {e}");
                    return Ok(Some(format!("could not execute: {line}")));
                }
            },
            Command::Set { name, value } => {
                if let Err(_e) = self.settings.set(&name, &value) {
                    debug!("{_e}");
                    return Ok(Some(format!("invalid setting '{name}' to: {value}")));
                }
                for f in self.groups[cur.group].frames.iter().collect::<Vec<_>>() {
                    self.frame_update(surface, f)?;
                }
                self.frame_focus(surface, cur.frame)?;
            }
            Command::Show(listing) => return Ok(Some(self.listing(cur, listing))),
            Command::ClientHints(flag) => {
                if let Some(c) = self.groups[cur.group].clients.current() {
                    let on = flag.apply(self.clients[c].flags.hints);
                    self.client_set_hints(surface, c, on)?;
                    let state = if on { "on" } else { "off" };
                    return Ok(Some(format!("hints {state} for {}", self.clients[c].name)));
                }
            }
            Command::Sanity => {
                let _removed = self.sanity_sweep(surface)?;
                debug!("Sanity sweep removed {_removed} clients");
            }
            Command::Say(text) => return Ok(Some(text)),
            Command::Run(file) => {
                let Ok(text) = std::fs::read_to_string(&file) else {
                    return Ok(Some(format!("could not run {file}")));
                };
                let out = self.run_commands(surface, launcher, &text)?;
                return Ok((!out.is_empty()).then_some(out));
            }
            Command::Quit => return Err(Error::Quit),
        }
        Ok(None)
    }

    /// A full width (or height) frame is split instead, anything else grows or shrinks by the
    /// difference.
    fn set_extent(
        &mut self,
        surface: &mut dyn DisplaySurface,
        cur: FocusCursor,
        dir: Direction,
        size: Size,
    ) -> Result<Option<String>> {
        let usable = self.usable_rect(cur.group);
        let r = self.frames[cur.frame].rect;
        let ss = extent(usable.w, usable.h, dir);
        let fs = extent(r.w, r.h, dir);
        let size = size.resolve(ss, self.settings.frame_min_wh);
        if fs == ss {
            if self
                .frame_split(surface, cur, dir, size / f64::from(ss))?
                .is_none()
            {
                return Ok(Some(format!("unable to split: {size} of {ss}")));
            }
            return Ok(None);
        }
        self.group_track(cur.group)?;
        let size = size as i32;
        if fs > size {
            self.frame_shrink(surface, cur, dir, false, fs - size)?;
        } else if size > fs {
            self.frame_grow(surface, cur, dir, false, size - fs)?;
        }
        Ok(None)
    }

    fn use_group(
        &mut self,
        surface: &mut dyn DisplaySurface,
        cur: FocusCursor,
        reference: &str,
    ) -> Result<Option<String>> {
        match reference.to_ascii_lowercase().as_str() {
            "(next)" => self.group_step(surface, cur.head, Dir::Next)?,
            "(prev)" => self.group_step(surface, cur.head, Dir::Prev)?,
            "(other)" => self.group_other(surface, cur.head)?,
            _ => match self.group_from_str(cur.head, reference) {
                Some(g) => self.group_raise(surface, g)?,
                None if reference.starts_with(|c: char| c.is_ascii_digit()) => {
                    return Ok(Some(format!("unknown group {reference}")));
                }
                None => {
                    self.group_add(surface, cur.head, reference)?;
                }
            },
        }
        Ok(None)
    }

    fn client_ref(
        &self,
        group: GroupId,
        reference: Option<&str>,
        fallback: Option<ClientId>,
    ) -> Option<ClientId> {
        match reference {
            Some(r) => self.client_from_str(group, r),
            None => fallback,
        }
    }

    fn listing(&self, cur: FocusCursor, listing: Listing) -> String {
        let mut out = String::new();
        let group = &self.groups[cur.group];
        let mark = |on: bool| if on { "*" } else { "-" };
        match listing {
            Listing::Unmanaged => {
                for class in &self.settings.unmanaged {
                    let _ = writeln!(out, "{class}");
                }
            }
            Listing::Settings => out = self.settings.describe(),
            Listing::Groups => {
                for (id, g) in self.heads[cur.head].groups.iter().enumerate() {
                    let _ = writeln!(out, "{id} {} {}", mark(g == cur.group), self.groups[g].name);
                }
            }
            Listing::Frames => {
                for (id, f) in group.frames.iter().enumerate() {
                    let frame = &self.frames[f];
                    let r = frame.rect;
                    let _ = writeln!(
                        out,
                        "{id} {} {} {} {} {} {}",
                        mark(f == cur.frame),
                        r.x,
                        r.y,
                        r.w,
                        r.h,
                        frame.flags.bits()
                    );
                }
            }
            Listing::Windows => {
                let focused = group.clients.current();
                for (id, c) in group.clients.iter().enumerate() {
                    let _ = writeln!(
                        out,
                        "{id} {} {}",
                        mark(Some(c) == focused),
                        self.clients[c].name
                    );
                }
            }
            Listing::Placements => {
                for p in &self.settings.placements {
                    let _ = writeln!(out, "place {} on {}", p.class, p.group);
                }
            }
        }
        let trimmed = out.trim_end().len();
        out.truncate(trimmed);
        if out.is_empty() {
            return format!("{} empty", format!("{listing:?}").to_ascii_lowercase());
        }
        out
    }
}

fn extent(w: i32, h: i32, dir: Direction) -> i32 {
    match dir {
        Direction::Horizontal => w,
        Direction::Vertical => h,
    }
}
