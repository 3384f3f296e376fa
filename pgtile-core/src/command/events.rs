//! Display events after the binary decoded them, and what the engine does about each.
use crate::config::WINDOW_MANAGER_NAME;
use crate::debug;
use crate::error::Result;
use crate::state::ring::Dir;
use crate::state::State;
use crate::surface::{
    ConfigureRequest, DisplaySurface, Launch, NetStateAtom, Property, PropertyValue,
};
use crate::Window;

/// Client messages the engine acts on.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ClientMessage {
    ActivateWindow,
    CurrentDesktop(u32),
    CloseWindow,
    NumberOfDesktops(u32),
    /// `WM_CHANGE_STATE`, toggles between shrunk and raised.
    ChangeState,
}

/// Property changes the engine watches.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WatchedProperty {
    Name,
    IpcCommand,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Event {
    MapRequest(Window),
    MapNotify(Window),
    UnmapNotify(Window),
    DestroyNotify(Window),
    ConfigureRequest(ConfigureRequest),
    ConfigureNotify {
        window: Window,
        width: i32,
        height: i32,
    },
    PropertyNotify {
        window: Window,
        property: WatchedProperty,
    },
    CreateNotify(Window),
    ClientMessage {
        window: Window,
        message: ClientMessage,
    },
    EnterNotify(Window),
    /// `child` is the top level window under the pointer, if any.
    ButtonPress {
        root: Window,
        child: Option<Window>,
    },
}

impl State {
    /// Runs the handler for `event`, then republishes the client and desktop properties.
    pub fn handle_event(
        &mut self,
        surface: &mut dyn DisplaySurface,
        launcher: &mut dyn Launch,
        event: Event,
    ) -> Result<()> {
        match event {
            Event::MapRequest(win) => self.map_request(surface, win)?,
            Event::MapNotify(win) => self.map_notify(surface, win)?,
            Event::UnmapNotify(win) => self.unmap_notify(surface, win)?,
            Event::DestroyNotify(win) => self.destroy_notify(surface, win)?,
            Event::ConfigureRequest(req) => self.configure_request(surface, &req)?,
            Event::ConfigureNotify {
                window,
                width,
                height,
            } => {
                if let Some(head) = self.head_by_root(window) {
                    self.head_resize(surface, head, width, height)?;
                }
            }
            Event::PropertyNotify { window, property } => {
                self.property_notify(surface, launcher, window, property)?;
            }
            Event::CreateNotify(win) => self.create_notify(surface, win)?,
            Event::ClientMessage { window, message } => {
                self.client_message(surface, window, message)?;
            }
            Event::EnterNotify(win) => self.enter_notify(surface, win)?,
            Event::ButtonPress { root, child } => self.button_press(surface, root, child)?,
        }
        self.ewmh_clients(surface)?;
        self.ewmh_groups(surface)
    }

    /// Manages the window if it qualifies, windows of hidden groups stay unmapped.
    pub fn map_request(&mut self, surface: &mut dyn DisplaySurface, win: Window) -> Result<()> {
        let Some(info) = surface.window_info(win)? else {
            return Ok(());
        };
        self.handle_map(surface, win, &info, false)?;
        match self.client_by_window(win) {
            Some(c) => {
                let group = self.clients[c].group;
                if !self.is_visible_group(group) {
                    debug!("Map attempt on hidden group {}", self.groups[group].name);
                } else if !self.clients[c].mapped {
                    self.clients[c].mapped = true;
                    surface.map_window(win)?;
                }
            }
            None => surface.map_window(win)?,
        }
        Ok(())
    }

    /// Catches windows that mapped themselves and keeps the fullscreen and above lists.
    pub fn map_notify(&mut self, surface: &mut dyn DisplaySurface, win: Window) -> Result<()> {
        if self.frame_by_window(win).is_some() {
            return Ok(());
        }
        let Some(info) = surface.window_info(win)? else {
            return Ok(());
        };
        self.handle_map(surface, win, &info, true)?;
        let Some(head) = self.head_by_root(info.root) else {
            return Ok(());
        };
        let h = &mut self.heads[head];
        if info.net_state.has(NetStateAtom::Fullscreen) {
            if !h.fullscreen.contains(&win) {
                h.fullscreen.push(win);
            }
        } else if (info.override_redirect || info.net_state.has(NetStateAtom::Above))
            && !h.above.contains(&win)
        {
            h.above.push(win);
        }
        Ok(())
    }

    /// Unmaps we issued are paid off, any other unmap means the client withdrew.
    pub fn unmap_notify(&mut self, surface: &mut dyn DisplaySurface, win: Window) -> Result<()> {
        if let Some(c) = self.client_by_window(win) {
            let client = &mut self.clients[c];
            if client.unmaps > 0 {
                client.unmaps -= 1;
            } else {
                debug!("Client {win} withdrew");
                self.client_remove(surface, c)?;
            }
        }
        self.window_discard_references(win);
        Ok(())
    }

    pub fn destroy_notify(&mut self, surface: &mut dyn DisplaySurface, win: Window) -> Result<()> {
        if let Some(c) = self.client_by_window(win) {
            self.client_remove(surface, c)?;
        }
        self.window_discard_references(win);
        Ok(())
    }

    /// Tiled clients get their frame geometry back, transients and clients of hidden groups
    /// get what they asked for, unmanaged windows are passed through.
    pub fn configure_request(
        &mut self,
        surface: &mut dyn DisplaySurface,
        req: &ConfigureRequest,
    ) -> Result<()> {
        let Some(info) = surface.window_info(req.window)? else {
            return Ok(());
        };
        if info.override_redirect {
            return Ok(());
        }
        if let Some(c) = self.client_by_window(req.window) {
            let transient = info
                .transient_for
                .and_then(|t| self.client_by_window(t))
                .is_some();
            if transient || !self.is_visible_group(self.clients[c].group) {
                self.client_configure(surface, c, Some(req))?;
            } else if self.client_is_displayed(c) {
                self.client_refresh(surface, c)?;
            }
            return Ok(());
        }
        if info.net_state.has(NetStateAtom::Fullscreen) {
            let head = self.head_by_root(info.root).or(self.focused_head);
            if let Some(h) = head.map(|h| &self.heads[h]) {
                return surface.pass_configure_request(&ConfigureRequest {
                    x: Some(0),
                    y: Some(0),
                    w: Some(h.width),
                    h: Some(h.height),
                    border_width: Some(0),
                    sibling: None,
                    ..*req
                });
            }
        }
        surface.pass_configure_request(&ConfigureRequest {
            w: req.w.map(|w| w.max(1)),
            h: req.h.map(|h| h.max(1)),
            ..*req
        })
    }

    pub fn property_notify(
        &mut self,
        surface: &mut dyn DisplaySurface,
        launcher: &mut dyn Launch,
        window: Window,
        property: WatchedProperty,
    ) -> Result<()> {
        match property {
            WatchedProperty::Name => {
                if let Some(c) = self.client_by_window(window) {
                    if let Some(info) = surface.window_info(window)? {
                        self.clients[c].name = info.name;
                    }
                }
            }
            WatchedProperty::IpcCommand => {
                let Some(text) = surface.get_text_property(window, Property::IpcCommand)? else {
                    return Ok(());
                };
                debug!("Received commands {text:?}");
                let result = self.run_commands(surface, launcher, &text);
                // A quitting instance still answers
                let answer = result.as_deref().unwrap_or_default();
                surface.set_property(
                    window,
                    Property::IpcResult,
                    PropertyValue::Text(answer.as_bytes()),
                )?;
                result?;
            }
        }
        Ok(())
    }

    /// Listens to every new top level, marker windows of command clients are told we're ready.
    pub fn create_notify(&mut self, surface: &mut dyn DisplaySurface, win: Window) -> Result<()> {
        if self.frame_by_window(win).is_some() {
            return Ok(());
        }
        let Some(info) = surface.window_info(win)? else {
            return Ok(());
        };
        if !info.override_redirect {
            surface.select_client_events(win)?;
        }
        if info.class == WINDOW_MANAGER_NAME {
            surface.set_property(win, Property::IpcReady, PropertyValue::Text(b"ok"))?;
        }
        Ok(())
    }

    pub fn client_message(
        &mut self,
        surface: &mut dyn DisplaySurface,
        window: Window,
        message: ClientMessage,
    ) -> Result<()> {
        let client = self.client_by_window(window);
        match message {
            ClientMessage::ActivateWindow => {
                if let Some(c) = client.filter(|c| self.is_visible_group(self.clients[*c].group)) {
                    self.client_raise(surface, c)?;
                }
            }
            ClientMessage::CurrentDesktop(index) => {
                let Some(head) = self.focused_head else {
                    return Ok(());
                };
                match self.group_by_id(head, index as usize) {
                    Some(g) => self.group_raise(surface, g)?,
                    None => debug!("No desktop {index}"),
                }
            }
            ClientMessage::CloseWindow => {
                if let Some(c) = client {
                    self.client_kill(surface, c)?;
                }
            }
            ClientMessage::NumberOfDesktops(count) => {
                let Some(head) = self.focused_head else {
                    return Ok(());
                };
                let count = (count as usize).max(1);
                while self.heads[head].groups.len() > count {
                    let Some(g) = self.heads[head].groups.current() else {
                        break;
                    };
                    if !self.group_drop(surface, g)? {
                        break;
                    }
                }
                while self.heads[head].groups.len() < count {
                    self.group_add(surface, head, "untitled")?;
                }
            }
            ClientMessage::ChangeState => {
                let Some(c) = client else {
                    return Ok(());
                };
                if self.clients[c].flags.shrunk {
                    self.client_raise(surface, c)?;
                } else {
                    self.client_shrink(surface, c)?;
                    if let Some(f) = self.clients[c].frame.filter(|f| self.frames.contains_key(*f)) {
                        self.frame_auto_focus_hidden(surface, f, Dir::Next)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Focus follows the pointer when enabled.
    pub fn enter_notify(&mut self, surface: &mut dyn DisplaySurface, win: Window) -> Result<()> {
        if !self.settings.focus_follow_mouse || self.head_by_root(win).is_some() {
            return Ok(());
        }
        if let Some(c) = self.client_by_window(win) {
            if let Some(f) = self.clients[c].frame.filter(|f| self.frames.contains_key(*f)) {
                self.frame_refocus_client(surface, f, c)?;
            }
        } else if let Some(f) = self.frame_by_window(win) {
            self.frame_focus(surface, f)?;
        }
        Ok(())
    }

    /// Click to focus, a click on a bare root focuses that head.
    pub fn button_press(
        &mut self,
        surface: &mut dyn DisplaySurface,
        root: Window,
        child: Option<Window>,
    ) -> Result<()> {
        let client = child.and_then(|w| self.client_by_window(w));
        let frame = child.and_then(|w| self.frame_by_window(w)).or_else(|| {
            client
                .and_then(|c| self.clients[c].frame)
                .filter(|f| self.frames.contains_key(*f))
        });
        match frame {
            Some(f) => {
                self.frame_focus(surface, f)?;
                if let Some(c) = client.filter(|c| !self.groups[self.clients[*c].group].is_tiling()) {
                    self.client_refresh(surface, c)?;
                    self.client_focus(surface, c, Some(f))?;
                }
            }
            None => {
                if let Some(head) = self.head_by_root(root).filter(|h| Some(*h) != self.focused_head) {
                    self.head_focus(surface, head)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ClientMessage, Event, WatchedProperty};
    use crate::geometry::{Direction, Rect};
    use crate::state::tests::{cursor, frame_rects, open, setup};
    use crate::surface::recording::{Call, RecordingLauncher};
    use crate::surface::{ConfigureRequest, DisplaySurface, Property, PropertyValue};

    #[test]
    fn ipc_runs_each_line_and_answers_on_the_marker() {
        let (mut state, mut surface) = setup();
        let mut launcher = RecordingLauncher::default();
        let marker = surface.add_client_window("pgtile", Rect::new(0, 0, 1, 1));
        state
            .handle_event(&mut surface, &mut launcher, Event::CreateNotify(marker))
            .unwrap();
        assert_eq!(Some("ok"), surface.text(marker, Property::IpcReady));
        surface
            .set_property(
                marker,
                Property::IpcCommand,
                PropertyValue::Text(b"# layout\nhsplit 1/2\nbogus\n\nshow groups\n"),
            )
            .unwrap();
        state
            .handle_event(
                &mut surface,
                &mut launcher,
                Event::PropertyNotify {
                    window: marker,
                    property: WatchedProperty::IpcCommand,
                },
            )
            .unwrap();
        assert_eq!(
            Some("could not execute: bogus\n0 * default"),
            surface.text(marker, Property::IpcResult)
        );
        assert_eq!(2, frame_rects(&state).len());
    }

    #[test]
    fn ipc_answers_even_without_output() {
        let (mut state, mut surface) = setup();
        let mut launcher = RecordingLauncher::default();
        let marker = surface.add_client_window("pgtile", Rect::new(0, 0, 1, 1));
        surface
            .set_property(
                marker,
                Property::IpcCommand,
                PropertyValue::Text(b"exec xterm"),
            )
            .unwrap();
        state
            .property_notify(&mut surface, &mut launcher, marker, WatchedProperty::IpcCommand)
            .unwrap();
        assert_eq!(Some(""), surface.text(marker, Property::IpcResult));
        assert_eq!(vec!["xterm".to_owned()], launcher.launched);
        assert_eq!(101, state.launches.front().unwrap().pid);
    }

    #[test]
    fn tiled_client_configure_request_is_overridden() {
        let (mut state, mut surface) = setup();
        let a = open(&mut state, &mut surface, "A");
        let win = state.clients[a].win;
        surface.take_calls();
        let req = ConfigureRequest {
            window: win,
            x: Some(5),
            y: Some(5),
            w: Some(50),
            h: Some(50),
            ..ConfigureRequest::default()
        };
        state.configure_request(&mut surface, &req).unwrap();
        let calls = surface.take_calls();
        assert!(calls.contains(&Call::Configure(win, Rect::new(0, 0, 1000, 800), 0)));
        assert!(!calls.contains(&Call::PassConfigure(win)));
    }

    #[test]
    fn unmanaged_configure_request_passes_through() {
        let (mut state, mut surface) = setup();
        let tray = surface.add_client_window("trayer", Rect::new(0, 0, 10, 10));
        state.map_request(&mut surface, tray).unwrap();
        assert!(state.client_by_window(tray).is_none());
        assert!(surface.is_mapped(tray));
        let req = ConfigureRequest {
            window: tray,
            w: Some(0),
            ..ConfigureRequest::default()
        };
        surface.take_calls();
        state.configure_request(&mut surface, &req).unwrap();
        assert_eq!(vec![Call::PassConfigure(tray)], surface.take_calls());
    }

    #[test]
    fn only_foreign_unmaps_remove_clients() {
        let (mut state, mut surface) = setup();
        let a = open(&mut state, &mut surface, "A");
        let b = open(&mut state, &mut surface, "B");
        let (wa, wb) = (state.clients[a].win, state.clients[b].win);
        // B covers A in the same frame, A stays mapped underneath
        assert_eq!(0, state.clients[a].unmaps);
        state.client_hide(&mut surface, a).unwrap();
        assert_eq!(1, state.clients[a].unmaps);
        state.unmap_notify(&mut surface, wa).unwrap();
        assert!(state.clients.contains_key(a));
        assert_eq!(0, state.clients[a].unmaps);
        state.unmap_notify(&mut surface, wb).unwrap();
        assert!(!state.clients.contains_key(b));
        // A is revealed in the emptied frame
        assert_eq!(Some(a), state.frames[cursor(&state).frame].shown);
        assert!(surface.is_mapped(wa));
        // Nothing owed anymore, the next unmap is the client withdrawing
        state.unmap_notify(&mut surface, wa).unwrap();
        assert!(!state.clients.contains_key(a));
    }

    #[test]
    fn map_notify_tracks_fullscreen_and_above_windows() {
        use crate::surface::NetStateAtom;
        let (mut state, mut surface) = setup();
        let head = cursor(&state).head;
        let video = surface.add_client_window("Video", Rect::new(0, 0, 10, 10));
        surface.info_mut(video).net_state.set(NetStateAtom::Fullscreen, true);
        let menu = surface.add_client_window("Menu", Rect::new(0, 0, 10, 10));
        surface.info_mut(menu).override_redirect = true;
        state.map_notify(&mut surface, video).unwrap();
        state.map_notify(&mut surface, menu).unwrap();
        state.map_notify(&mut surface, menu).unwrap();
        assert_eq!(vec![video], state.heads[head].fullscreen);
        assert_eq!(vec![menu], state.heads[head].above);
        state.destroy_notify(&mut surface, menu).unwrap();
        assert!(state.heads[head].above.is_empty());
    }

    #[test]
    fn root_resize_collapses_groups() {
        let (mut state, mut surface) = setup();
        let mut launcher = RecordingLauncher::default();
        let c = cursor(&state);
        state
            .frame_split(&mut surface, c, Direction::Horizontal, 0.5)
            .unwrap();
        let root = surface.root();
        state
            .handle_event(
                &mut surface,
                &mut launcher,
                Event::ConfigureNotify {
                    window: root,
                    width: 1280,
                    height: 1024,
                },
            )
            .unwrap();
        assert_eq!(vec![Rect::new(0, 0, 1280, 1024)], frame_rects(&state));
    }

    #[test]
    fn desktop_count_messages_drop_and_add_groups() {
        let (mut state, mut surface) = setup();
        let root = surface.root();
        let head = cursor(&state).head;
        state
            .client_message(&mut surface, root, ClientMessage::NumberOfDesktops(3))
            .unwrap();
        assert_eq!(3, state.heads[head].groups.len());
        assert_eq!("untitled", state.groups[cursor(&state).group].name);
        state
            .client_message(&mut surface, root, ClientMessage::CurrentDesktop(0))
            .unwrap();
        assert_eq!("default", state.groups[cursor(&state).group].name);
        state
            .client_message(&mut surface, root, ClientMessage::CurrentDesktop(9))
            .unwrap();
        assert_eq!("default", state.groups[cursor(&state).group].name);
        state
            .client_message(&mut surface, root, ClientMessage::NumberOfDesktops(1))
            .unwrap();
        assert_eq!(1, state.heads[head].groups.len());
    }

    #[test]
    fn change_state_shrinks_then_raises() {
        let (mut state, mut surface) = setup();
        let a = open(&mut state, &mut surface, "A");
        let win = state.clients[a].win;
        state
            .client_message(&mut surface, win, ClientMessage::ChangeState)
            .unwrap();
        assert!(state.clients[a].flags.shrunk);
        assert!(!surface.is_mapped(win));
        state
            .client_message(&mut surface, win, ClientMessage::ChangeState)
            .unwrap();
        assert!(!state.clients[a].flags.shrunk);
        assert!(surface.is_mapped(win));
    }

    #[test]
    fn click_focuses_the_frame_under_the_pointer() {
        let (mut state, mut surface) = setup();
        let c = cursor(&state);
        let right = state
            .frame_split(&mut surface, c, Direction::Horizontal, 0.5)
            .unwrap()
            .unwrap();
        let root = surface.root();
        let win = state.frames[right].win;
        state.button_press(&mut surface, root, Some(win)).unwrap();
        assert_eq!(right, cursor(&state).frame);
    }
}
