//! The head → group → frame → client graph and every operation that mutates it.
//!
//! All four collections live in arenas owned by [`State`], rings and back references are keys
//! into those arenas. Operations take the [`DisplaySurface`] they push their results to, the graph
//! itself never talks to the display server.
use slotmap::SlotMap;

use crate::config::{Settings, LAUNCH_MARKER_LIMIT};
use crate::error::Result;
use crate::geometry::Rect;
use crate::state::model::{
    Client, ClientId, FocusCursor, Frame, FrameId, Group, GroupId, Head, HeadId, LaunchMarker,
};
use crate::surface::DisplaySurface;
use crate::Window;

mod client;
mod ewmh;
mod frame;
mod group;
mod manage;
pub mod model;
pub mod ring;
mod sanity;
pub mod snapshot;

pub use frame::HiddenScope;

pub struct State {
    pub settings: Settings,
    pub heads: SlotMap<HeadId, Head>,
    /// Screen order, the position is the id users address a head by.
    pub head_order: Vec<HeadId>,
    pub focused_head: Option<HeadId>,
    pub groups: SlotMap<GroupId, Group>,
    pub frames: SlotMap<FrameId, Frame>,
    pub clients: SlotMap<ClientId, Client>,
    pub launches: heapless::Deque<LaunchMarker, LAUNCH_MARKER_LIMIT>,
}

impl State {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            heads: SlotMap::with_key(),
            head_order: Vec::new(),
            focused_head: None,
            groups: SlotMap::with_key(),
            frames: SlotMap::with_key(),
            clients: SlotMap::with_key(),
            launches: heapless::Deque::new(),
        }
    }

    /// Registers a display output with its first group, the first head added gets focus.
    pub fn add_head(
        &mut self,
        surface: &mut dyn DisplaySurface,
        screen: usize,
        root: Window,
        width: i32,
        height: i32,
    ) -> Result<HeadId> {
        let head = self.heads.insert(Head {
            screen,
            root,
            width,
            height,
            groups: ring::Ring::default(),
            stacked: Vec::new(),
            above: Vec::new(),
            below: Vec::new(),
            fullscreen: Vec::new(),
        });
        self.head_order.push(head);
        self.group_create(surface, head, "default")?;
        if self.focused_head.is_none() {
            self.focused_head = Some(head);
        }
        Ok(head)
    }

    /// The focused head, its current group and that group's current frame.
    #[must_use]
    pub fn cursor(&self) -> Option<FocusCursor> {
        let head = self.focused_head?;
        let group = self.heads.get(head)?.groups.current()?;
        let frame = self.groups.get(group)?.frames.current()?;
        Some(FocusCursor { head, group, frame })
    }

    /// Outer rectangle minus the group's padding.
    #[must_use]
    pub fn usable_rect(&self, group: GroupId) -> Rect {
        let g = &self.groups[group];
        let h = &self.heads[g.head];
        Rect::new(
            g.pad.l,
            g.pad.t,
            h.width - g.pad.l - g.pad.r,
            h.height - g.pad.t - g.pad.b,
        )
    }

    /// Whether `group` is what its head currently shows.
    #[must_use]
    pub fn is_visible_group(&self, group: GroupId) -> bool {
        let head = self.groups[group].head;
        self.heads[head].groups.current() == Some(group)
    }

    #[must_use]
    pub fn head_by_root(&self, root: Window) -> Option<HeadId> {
        self.head_order
            .iter()
            .copied()
            .find(|h| self.heads[*h].root == root)
    }

    #[must_use]
    pub fn client_by_window(&self, window: Window) -> Option<ClientId> {
        self.clients
            .iter()
            .find_map(|(id, c)| (c.win == window).then_some(id))
    }

    #[must_use]
    pub fn frame_by_window(&self, window: Window) -> Option<FrameId> {
        self.frames
            .iter()
            .find_map(|(id, f)| (f.win == window).then_some(id))
    }

    #[must_use]
    pub fn group_by_name(&self, head: HeadId, name: &str) -> Option<GroupId> {
        self.heads[head]
            .groups
            .iter()
            .find(|g| self.groups[*g].name == name)
    }

    #[must_use]
    pub fn group_by_id(&self, head: HeadId, id: usize) -> Option<GroupId> {
        self.heads[head].groups.get(id)
    }

    /// A reference starting with a digit is a display id, anything else a name.
    #[must_use]
    pub fn group_from_str(&self, head: HeadId, reference: &str) -> Option<GroupId> {
        if reference.starts_with(|c: char| c.is_ascii_digit()) {
            atoi::atoi::<usize>(reference.as_bytes()).and_then(|id| self.group_by_id(head, id))
        } else {
            self.group_by_name(head, reference)
        }
    }

    /// Like [`State::group_from_str`], but creates a group for unknown names.
    pub fn group_auto_create(
        &mut self,
        surface: &mut dyn DisplaySurface,
        head: HeadId,
        reference: &str,
    ) -> Result<Option<GroupId>> {
        if let Some(g) = self.group_from_str(head, reference) {
            return Ok(Some(g));
        }
        if reference.is_empty() || reference.starts_with(|c: char| c.is_ascii_digit()) {
            return Ok(None);
        }
        self.group_create(surface, head, reference).map(Some)
    }

    #[must_use]
    pub fn client_from_str(&self, group: GroupId, reference: &str) -> Option<ClientId> {
        let ring = &self.groups[group].clients;
        if reference.starts_with(|c: char| c.is_ascii_digit()) {
            atoi::atoi::<usize>(reference.as_bytes()).and_then(|id| ring.get(id))
        } else {
            ring.iter().find(|c| self.clients[*c].name == reference)
        }
    }

    /// Follows the parent chain up to the first client without a live parent.
    #[must_use]
    pub fn client_ancestor(&self, client: ClientId) -> ClientId {
        let mut cur = client;
        let mut steps = 0;
        while let Some(parent) = self.clients[cur].parent.filter(|p| self.clients.contains_key(*p)) {
            // Bounded in case two windows claim to be transient for each other
            steps += 1;
            if steps > self.clients.len() {
                break;
            }
            cur = parent;
        }
        cur
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::config::Settings;
    use crate::geometry::Rect;
    use crate::state::model::{ClientId, FocusCursor};
    use crate::state::State;
    use crate::surface::recording::RecordingSurface;

    pub(crate) const SCREEN_W: i32 = 1000;
    pub(crate) const SCREEN_H: i32 = 800;

    /// One head of 1000x800 with its default group, border width zero so frame and window
    /// geometry line up.
    pub(crate) fn setup() -> (State, RecordingSurface) {
        let settings = Settings {
            border_width: 0,
            ..Settings::default()
        };
        setup_with(settings)
    }

    pub(crate) fn setup_with(settings: Settings) -> (State, RecordingSurface) {
        let mut surface = RecordingSurface::new();
        let mut state = State::new(settings);
        let root = surface.root();
        state
            .add_head(&mut surface, 0, root, SCREEN_W, SCREEN_H)
            .unwrap();
        let cursor = state.cursor().unwrap();
        state.group_focus(&mut surface, cursor.group).unwrap();
        (state, surface)
    }

    pub(crate) fn cursor(state: &State) -> FocusCursor {
        state.cursor().unwrap()
    }

    pub(crate) fn frame_rects(state: &State) -> Vec<Rect> {
        let c = cursor(state);
        state.groups[c.group]
            .frames
            .iter()
            .map(|f| state.frames[f].rect)
            .collect()
    }

    /// A fresh window of `class` asking to be mapped.
    pub(crate) fn open(state: &mut State, surface: &mut RecordingSurface, class: &str) -> ClientId {
        let win = surface.add_client_window(class, Rect::new(10, 10, 300, 200));
        state.map_request(surface, win).unwrap();
        state.client_by_window(win).unwrap()
    }

    /// Non-overlapping and the union covers the usable area exactly, checked by area sums
    /// together with pairwise disjointness and containment.
    pub(crate) fn assert_tiled(state: &State) {
        let c = cursor(state);
        let usable = state.usable_rect(c.group);
        let rects = frame_rects(state);
        for (i, a) in rects.iter().enumerate() {
            assert!(a.w > 0 && a.h > 0, "degenerate frame {a:?}");
            assert!(
                a.x >= usable.x
                    && a.y >= usable.y
                    && a.right() <= usable.right()
                    && a.bottom() <= usable.bottom(),
                "{a:?} outside {usable:?}"
            );
            for b in &rects[i + 1..] {
                assert!(!a.intersects(b), "{a:?} overlaps {b:?}");
            }
        }
        let total: i64 = rects.iter().map(Rect::area).sum();
        assert_eq!(usable.area(), total, "frames {rects:?} don't cover {usable:?}");
    }

    #[test]
    fn add_head_creates_default_group_with_full_frame() {
        let (state, _surface) = setup();
        let c = cursor(&state);
        assert_eq!("default", state.groups[c.group].name);
        assert_eq!(
            vec![Rect::new(0, 0, SCREEN_W, SCREEN_H)],
            frame_rects(&state)
        );
        assert_tiled(&state);
    }

    #[test]
    fn group_references_by_id_and_name() {
        let (mut state, mut surface) = setup();
        let head = cursor(&state).head;
        let web = state
            .group_auto_create(&mut surface, head, "web")
            .unwrap()
            .unwrap();
        assert_eq!(Some(web), state.group_from_str(head, "1"));
        assert_eq!(Some(web), state.group_from_str(head, "web"));
        assert_eq!(None, state.group_from_str(head, "7"));
        // Unknown ids are never auto created
        assert_eq!(None, state.group_auto_create(&mut surface, head, "7").unwrap());
        assert_eq!(2, state.heads[head].groups.len());
    }
}
