use crate::config::UNDO_DEPTH;
use crate::geometry::Rect;
use crate::state::ring::Ring;
use crate::surface::NetState;
use crate::Window;

slotmap::new_key_type! {
    pub struct HeadId;
    pub struct GroupId;
    pub struct FrameId;
    pub struct ClientId;
}

/// One display output.
#[derive(Debug)]
pub struct Head {
    pub screen: usize,
    pub root: Window,
    pub width: i32,
    pub height: i32,
    pub groups: Ring<GroupId>,
    /// Previously focused groups, most recent last, bounded.
    pub stacked: Vec<GroupId>,
    pub above: Vec<Window>,
    pub below: Vec<Window>,
    pub fullscreen: Vec<Window>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum GroupMode {
    Tiling,
    Stacking,
}

/// Reserved screen margins.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Padding {
    pub l: i32,
    pub r: i32,
    pub t: i32,
    pub b: i32,
}

#[derive(Debug)]
pub struct Group {
    pub head: HeadId,
    pub name: String,
    pub pad: Padding,
    pub mode: GroupMode,
    pub frames: Ring<FrameId>,
    /// Cursor is the focused client.
    pub clients: Ring<ClientId>,
    /// Most recently focused last.
    pub stacked: Vec<ClientId>,
    pub history: heapless::Deque<String, UNDO_DEPTH>,
}

impl Group {
    pub(crate) fn new(head: HeadId, name: &str) -> Self {
        Self {
            head,
            name: name.to_owned(),
            pad: Padding::default(),
            mode: GroupMode::Tiling,
            frames: Ring::default(),
            clients: Ring::default(),
            stacked: Vec::new(),
            history: heapless::Deque::new(),
        }
    }

    #[must_use]
    pub fn is_tiling(&self) -> bool {
        self.mode == GroupMode::Tiling
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameFlags {
    pub dedicated: bool,
    pub catchall: bool,
    pub border_hidden: bool,
}

impl FrameFlags {
    const DEDICATE: u8 = 1;
    const CATCHALL: u8 = 1 << 1;
    const HIDEBORDER: u8 = 1 << 2;

    /// Serialized form used in layout dumps.
    #[must_use]
    pub fn bits(self) -> u8 {
        let mut out = 0;
        if self.dedicated {
            out |= Self::DEDICATE;
        }
        if self.catchall {
            out |= Self::CATCHALL;
        }
        if self.border_hidden {
            out |= Self::HIDEBORDER;
        }
        out
    }

    #[must_use]
    pub fn from_bits(bits: u8) -> Self {
        Self {
            dedicated: bits & Self::DEDICATE != 0,
            catchall: bits & Self::CATCHALL != 0,
            border_hidden: bits & Self::HIDEBORDER != 0,
        }
    }
}

/// A tiling slot.
#[derive(Debug)]
pub struct Frame {
    pub group: GroupId,
    /// Background window carrying the border, clients are stacked above it.
    pub win: Window,
    pub rect: Rect,
    /// Last rectangle and border visibility pushed to the surface.
    pub applied: Rect,
    pub applied_bare: bool,
    pub shown: Option<ClientId>,
    pub flags: FrameFlags,
    /// Generation counter, compared for equality against the shown client's.
    pub state: u32,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ClientFlags {
    pub hidden: bool,
    pub killed: bool,
    pub hints: bool,
    pub normal: bool,
    pub shrunk: bool,
}

/// A managed window.
#[derive(Debug)]
pub struct Client {
    pub win: Window,
    pub group: GroupId,
    pub frame: Option<FrameId>,
    pub parent: Option<ClientId>,
    pub kids: u32,
    pub name: String,
    pub class: String,
    pub role: String,
    pub rect: Rect,
    /// Last free floating placement, zero sized until known.
    pub float: Rect,
    pub flags: ClientFlags,
    /// Unmaps we issued whose notify hasn't arrived yet.
    pub unmaps: u32,
    /// Whether we believe the window is mapped, unmaps are only counted for mapped windows.
    pub mapped: bool,
    pub net_state: NetState,
    pub input: bool,
    pub state: u32,
}

/// Explicit focus context: the active head, its current group and that group's current frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FocusCursor {
    pub head: HeadId,
    pub group: GroupId,
    pub frame: FrameId,
}

/// A recently launched process that may still map its first window.
#[derive(Debug, Copy, Clone)]
pub struct LaunchMarker {
    pub pid: u32,
    pub group: GroupId,
    pub frame: FrameId,
    pub at: std::time::Instant,
}
