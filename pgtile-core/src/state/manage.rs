//! Deciding whether and where a new window is managed.
use std::time::{Duration, Instant};

use crate::config::{LAUNCH_MARKER_EXPIRY_SECS, LAUNCH_MARKER_LIMIT};
use crate::debug;
use crate::error::{Error, Result};
use crate::state::model::{ClientId, FrameId, GroupId, HeadId, LaunchMarker};
use crate::state::State;
use crate::surface::{DisplaySurface, NetStateAtom, Property, PropertyValue, WindowInfo, WindowKind};
use crate::Window;

const CLIENT_MARKER: &[u8] = b"client";

impl State {
    /// Whether a window with `info` should become a client.
    #[must_use]
    pub fn is_manageable(&self, info: &WindowInfo) -> bool {
        !info.override_redirect
            && info.kind != WindowKind::Other
            && !info.net_state.has(NetStateAtom::Fullscreen)
            && !info.net_state.has(NetStateAtom::Hidden)
            && !self.settings.is_unmanaged(&info.class)
    }

    /// Remembers where the focus was when a process was launched, its first window opens there.
    pub fn record_launch(&mut self, pid: u32) -> Result<()> {
        let Some(cursor) = self.cursor() else {
            return Ok(());
        };
        if self.launches.is_full() {
            self.launches.pop_front();
        }
        self.launches
            .push_back(LaunchMarker {
                pid,
                group: cursor.group,
                frame: cursor.frame,
                at: Instant::now(),
            })
            .map_err(|_| Error::HeaplessPush(LAUNCH_MARKER_LIMIT))
    }

    /// Expires old launch markers, then consumes the one for `pid` if any.
    fn claim_launch(&mut self, pid: u32) -> Option<(GroupId, Option<FrameId>)> {
        let expiry = Duration::from_secs(LAUNCH_MARKER_EXPIRY_SECS);
        let now = Instant::now();
        let mut claimed = None;
        let mut kept = heapless::Deque::<LaunchMarker, LAUNCH_MARKER_LIMIT>::new();
        while let Some(marker) = self.launches.pop_front() {
            if now.duration_since(marker.at) >= expiry {
                continue;
            }
            if claimed.is_none() && marker.pid == pid {
                claimed = Some(marker);
                continue;
            }
            // Never more than what was just popped
            let _ = kept.push_back(marker);
        }
        self.launches = kept;
        let marker = claimed?;
        if !self.groups.contains_key(marker.group) {
            return None;
        }
        let frame = self
            .frames
            .get(marker.frame)
            .filter(|f| f.group == marker.group)
            .map(|_| marker.frame);
        Some((marker.group, frame))
    }

    /// Manages `win` when it qualifies and isn't known yet.
    ///
    /// Windows that don't qualify are pulled back onto their head when they sit outside it.
    pub fn handle_map(
        &mut self,
        surface: &mut dyn DisplaySurface,
        win: Window,
        info: &WindowInfo,
        mapped: bool,
    ) -> Result<Option<ClientId>> {
        if self.client_by_window(win).is_some() || self.frame_by_window(win).is_some() {
            return Ok(None);
        }
        if self.is_manageable(info) {
            return self.manage(surface, win, info, mapped);
        }
        if let Some(head) = self.head_by_root(info.root) {
            self.window_on_screen(surface, head, win)?;
        }
        Ok(None)
    }

    fn window_on_screen(
        &mut self,
        surface: &mut dyn DisplaySurface,
        head: HeadId,
        win: Window,
    ) -> Result<()> {
        let Some(geometry) = surface.window_geometry(win)? else {
            return Ok(());
        };
        let (sw, sh) = (self.heads[head].width, self.heads[head].height);
        let mut r = geometry;
        r.x = r.x.min(sw - r.w).max(0);
        r.y = r.y.min(sh - r.h).max(0);
        if r != geometry {
            surface.move_resize_window(win, r)?;
        }
        Ok(())
    }

    /// Turns `win` into a client.
    ///
    /// Transients join their parent, everything else goes to a placement rule's group, the
    /// frame focused when the owning process was launched, or the current frame, in that order.
    pub fn manage(
        &mut self,
        surface: &mut dyn DisplaySurface,
        win: Window,
        info: &WindowInfo,
        mapped: bool,
    ) -> Result<Option<ClientId>> {
        let parent = info.transient_for.and_then(|t| self.client_by_window(t));
        let client = if let Some(parent) = parent {
            let group = self.clients[parent].group;
            let frame = self.clients[parent]
                .frame
                .filter(|f| self.frames.contains_key(*f))
                .or_else(|| self.groups[group].frames.current());
            let c = self.client_create(group, frame, win, info);
            self.clients[c].parent = Some(parent);
            self.clients[parent].kids += 1;
            c
        } else {
            let Some(head) = self.head_by_root(info.root).or(self.focused_head) else {
                return Ok(None);
            };
            let Some(mut group) = self.heads[head].groups.current() else {
                return Ok(None);
            };
            let mut frame = None;
            let placement = self.settings.placement_for(&info.class).map(str::to_owned);
            let placed = match placement {
                Some(target) => self.group_auto_create(surface, head, &target)?,
                None => None,
            };
            if let Some(g) = placed {
                group = g;
            } else if let Some((g, f)) = info.pid.and_then(|pid| self.claim_launch(pid)) {
                group = g;
                frame = f;
            }
            let Some(frame) = frame.or_else(|| self.groups[group].frames.current()) else {
                debug!("Group without frames, not managing {win}");
                return Ok(None);
            };
            let target = self.frame_available(frame);
            self.client_create(group, Some(target), win, info)
        };
        self.clients[client].mapped = mapped;
        surface.select_client_events(win)?;
        surface.set_property(win, Property::MarkerType, PropertyValue::Text(CLIENT_MARKER))?;
        let (group, frame) = (self.clients[client].group, self.clients[client].frame);
        if let Some(f) = frame {
            if self.is_visible_group(group) {
                let focused = self.cursor().is_some_and(|cur| cur.frame == f);
                if focused || self.settings.window_open_focus {
                    self.frame_focus_client(surface, f, Some(client))?;
                } else {
                    self.client_display(surface, client, Some(f))?;
                }
                self.frames_display_hidden(surface, group)?;
            } else {
                self.frame_target_client(f, client);
            }
        }
        self.ewmh_clients(surface)?;
        Ok(Some(client))
    }

    /// Picks up the windows that exist on a head at startup, parents before transients.
    ///
    /// Unmapped windows are only taken when a previous instance marked them as clients.
    pub fn scan_windows(&mut self, surface: &mut dyn DisplaySurface, head: HeadId) -> Result<()> {
        let children = surface.query_children(self.heads[head].root)?;
        for transients in [false, true] {
            for win in &children {
                let Some(info) = surface.window_info(*win)? else {
                    continue;
                };
                if info.transient_for.is_some() != transients {
                    continue;
                }
                if info.viewable {
                    self.handle_map(surface, *win, &info, true)?;
                } else if info.marked_client && self.is_manageable(&info) {
                    surface.map_window(*win)?;
                    self.handle_map(surface, *win, &info, true)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{Placement, Settings};
    use crate::geometry::{Direction, Rect};
    use crate::state::tests::{cursor, open, setup, setup_with};
    use crate::surface::{Property, WindowKind};

    fn with_placement(class: &str, group: &str) -> Settings {
        Settings {
            border_width: 0,
            placements: vec![Placement {
                class: class.to_owned(),
                group: group.to_owned(),
            }],
            ..Settings::default()
        }
    }

    #[test]
    fn special_windows_are_not_managed() {
        let (state, mut surface) = setup();
        let win = surface.add_client_window("XTerm", Rect::new(0, 0, 10, 10));
        let mut info = surface.windows[&win].info.clone();
        assert!(state.is_manageable(&info));
        info.kind = WindowKind::Other;
        assert!(!state.is_manageable(&info));
        info.kind = WindowKind::Manageable;
        info.override_redirect = true;
        assert!(!state.is_manageable(&info));
        info.override_redirect = false;
        info.class = "trayer".to_owned();
        assert!(!state.is_manageable(&info));
    }

    #[test]
    fn new_window_is_marked_and_focused() {
        let (mut state, mut surface) = setup();
        let a = open(&mut state, &mut surface, "A");
        let win = state.clients[a].win;
        assert_eq!(Some("client"), surface.text(win, Property::MarkerType));
        assert!(surface.is_mapped(win));
        assert_eq!(Some(a), state.groups[cursor(&state).group].clients.current());
        assert!(!state.clients[a].flags.hidden);
    }

    #[test]
    fn placement_rule_sends_window_to_hidden_group() {
        let (mut state, mut surface) = setup_with(with_placement("Mail", "mail"));
        let head = cursor(&state).head;
        let a = open(&mut state, &mut surface, "Mail");
        let mail = state.group_by_name(head, "mail").unwrap();
        assert_eq!(mail, state.clients[a].group);
        // The current group keeps focus and the window stays hidden
        assert_eq!("default", state.groups[cursor(&state).group].name);
        assert!(!surface.is_mapped(state.clients[a].win));
        let f = state.clients[a].frame.unwrap();
        assert_eq!(Some(a), state.frames[f].shown);
    }

    #[test]
    fn transient_overrides_placement_rule() {
        let (mut state, mut surface) = setup_with(with_placement("Dialog", "elsewhere"));
        let a = open(&mut state, &mut surface, "A");
        let parent = state.clients[a].win;
        let dialog = surface.add_transient_window("Dialog", Rect::new(0, 0, 50, 50), parent);
        state.map_request(&mut surface, dialog).unwrap();
        let d = state.client_by_window(dialog).unwrap();
        assert_eq!(state.clients[a].group, state.clients[d].group);
        assert_eq!(state.clients[a].frame, state.clients[d].frame);
        assert!(state.group_by_name(cursor(&state).head, "elsewhere").is_none());
    }

    #[test]
    fn launch_marker_routes_first_window_back() {
        let (mut state, mut surface) = setup();
        let c = cursor(&state);
        let right = state
            .frame_split(&mut surface, c, Direction::Horizontal, 0.5)
            .unwrap()
            .unwrap();
        state.record_launch(4242).unwrap();
        state.frame_focus(&mut surface, right).unwrap();
        let win = surface.add_client_window("Slow", Rect::new(0, 0, 10, 10));
        surface.info_mut(win).pid = Some(4242);
        state.map_request(&mut surface, win).unwrap();
        let client = state.client_by_window(win).unwrap();
        assert_eq!(Some(c.frame), state.clients[client].frame);
        // Claimed once only
        assert!(state.launches.is_empty());
    }

    #[test]
    fn scan_adopts_mapped_and_marked_windows() {
        let (mut state, mut surface) = setup();
        let head = cursor(&state).head;
        let mapped = surface.add_client_window("A", Rect::new(0, 0, 10, 10));
        surface.mapped.insert(mapped);
        let marked = surface.add_client_window("B", Rect::new(0, 0, 10, 10));
        surface.info_mut(marked).marked_client = true;
        let stray = surface.add_client_window("C", Rect::new(0, 0, 10, 10));
        state.scan_windows(&mut surface, head).unwrap();
        let a = state.client_by_window(mapped).unwrap();
        assert!(state.clients[a].mapped);
        assert!(state.client_by_window(marked).is_some());
        assert!(state.client_by_window(stray).is_none());
        // Frames are never adopted
        assert_eq!(2, state.clients.len());
    }
}
