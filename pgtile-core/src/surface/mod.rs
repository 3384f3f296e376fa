//! What the engine needs from the display server.
use crate::error::Result;
use crate::geometry::hints::SizeHints;
use crate::geometry::Rect;
use crate::Window;

#[cfg(test)]
pub(crate) mod recording;

/// Border colour roles, the surface resolves them to pixels.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BorderColor {
    Focus,
    Unfocus,
    DedicateFocus,
    DedicateUnfocus,
    CatchallFocus,
    CatchallUnfocus,
}

/// Properties the engine reads or publishes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Property {
    ClientList,
    ClientListStacking,
    ActiveWindow,
    NumberOfDesktops,
    DesktopNames,
    CurrentDesktop,
    DesktopGeometry,
    WmDesktop,
    /// Marks a window as managed so that a restarted instance picks it up while unmapped.
    MarkerType,
    IpcReady,
    IpcCommand,
    IpcResult,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PropertyValue<'a> {
    Windows(&'a [Window]),
    Cardinals(&'a [u32]),
    Utf8(&'a [u8]),
    Text(&'a [u8]),
}

/// `_NET_WM_STATE` atoms the engine cares about.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum NetStateAtom {
    Fullscreen,
    Hidden,
    Above,
    Below,
    SkipTaskbar,
    SkipPager,
    Modal,
    DemandsAttention,
}

/// Cached `_NET_WM_STATE` bitmask.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct NetState(u16);

impl NetState {
    const fn bit(atom: NetStateAtom) -> u16 {
        match atom {
            NetStateAtom::Fullscreen => 1,
            NetStateAtom::Hidden => 1 << 1,
            NetStateAtom::Above => 1 << 2,
            NetStateAtom::Below => 1 << 3,
            NetStateAtom::SkipTaskbar => 1 << 4,
            NetStateAtom::SkipPager => 1 << 5,
            NetStateAtom::Modal => 1 << 6,
            NetStateAtom::DemandsAttention => 1 << 7,
        }
    }

    #[must_use]
    pub fn from_atoms(atoms: &[NetStateAtom]) -> Self {
        Self(atoms.iter().fold(0, |acc, a| acc | Self::bit(*a)))
    }

    #[must_use]
    pub const fn has(self, atom: NetStateAtom) -> bool {
        self.0 & Self::bit(atom) != 0
    }

    pub fn set(&mut self, atom: NetStateAtom, on: bool) {
        if on {
            self.0 |= Self::bit(atom);
        } else {
            self.0 &= !Self::bit(atom);
        }
    }

    /// Visible in pagers and task bars.
    #[must_use]
    pub const fn listed(self) -> bool {
        !self.has(NetStateAtom::SkipTaskbar) && !self.has(NetStateAtom::SkipPager)
    }
}

/// `_NET_WM_WINDOW_TYPE`, reduced to what decides management.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WindowKind {
    Unset,
    /// Normal, utility, toolbar, menu or dialog.
    Manageable,
    Other,
}

/// Everything learned about a window when deciding whether and where to manage it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct WindowInfo {
    /// Root of the screen the window lives on.
    pub root: Window,
    pub override_redirect: bool,
    pub viewable: bool,
    pub transient_for: Option<Window>,
    pub name: String,
    pub class: String,
    pub role: String,
    pub pid: Option<u32>,
    pub kind: WindowKind,
    pub net_state: NetState,
    /// `WM_HINTS` input field, defaults to true.
    pub input: bool,
    /// Carries the managed marker from a previous instance.
    pub marked_client: bool,
}

impl WindowInfo {
    #[must_use]
    pub fn new(class: &str) -> Self {
        Self {
            root: 0,
            override_redirect: false,
            viewable: false,
            transient_for: None,
            name: String::new(),
            class: class.to_owned(),
            role: String::new(),
            pid: None,
            kind: WindowKind::Unset,
            net_state: NetState::default(),
            input: true,
            marked_client: false,
        }
    }
}

/// Raw configure request, `None` fields were not in the request's value mask.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ConfigureRequest {
    pub window: Window,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub w: Option<i32>,
    pub h: Option<i32>,
    pub border_width: Option<u32>,
    pub sibling: Option<Window>,
    pub stack_mode: Option<u32>,
}

/// Requests issued against the display server.
///
/// Requests on windows that vanished are expected, implementations absorb those and only
/// return `Err` when the connection itself is unusable.
pub trait DisplaySurface {
    fn create_frame_window(&mut self, root: Window, rect: Rect, border_width: u32) -> Result<Window>;
    fn destroy_window(&mut self, window: Window) -> Result<()>;
    fn map_window(&mut self, window: Window) -> Result<()>;
    fn unmap_window(&mut self, window: Window) -> Result<()>;
    fn configure_window(&mut self, window: Window, rect: Rect, border_width: u32) -> Result<()>;
    fn move_resize_window(&mut self, window: Window, rect: Rect) -> Result<()>;
    /// Forward a configure request of a window we do not manage untouched.
    fn pass_configure_request(&mut self, request: &ConfigureRequest) -> Result<()>;
    fn set_border_color(&mut self, window: Window, color: BorderColor) -> Result<()>;
    fn raise_window(&mut self, window: Window) -> Result<()>;
    /// First window ends up on top, every following one directly below the previous.
    fn restack_windows(&mut self, windows: &[Window]) -> Result<()>;
    fn focus_window(&mut self, window: Window) -> Result<()>;
    fn select_client_events(&mut self, window: Window) -> Result<()>;
    fn send_close_request(&mut self, window: Window) -> Result<()>;
    fn kill_client(&mut self, window: Window) -> Result<()>;
    fn query_children(&mut self, root: Window) -> Result<Vec<Window>>;
    fn window_info(&mut self, window: Window) -> Result<Option<WindowInfo>>;
    fn window_geometry(&mut self, window: Window) -> Result<Option<Rect>>;
    fn transient_for(&mut self, window: Window) -> Result<Option<Window>>;
    fn size_hints(&mut self, window: Window) -> Result<Option<SizeHints>>;
    fn set_property(&mut self, window: Window, property: Property, value: PropertyValue<'_>)
        -> Result<()>;
    fn get_text_property(&mut self, window: Window, property: Property) -> Result<Option<String>>;
}

/// Fire and forget process launching.
pub trait Launch {
    /// Returns the pid of the spawned process.
    fn launch(&mut self, command: &str) -> Result<u32>;
}
