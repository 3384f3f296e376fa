use std::fmt::Write;

/**
The name that the window manager will broadcast itself as. Will also affect where
configuration is placed/read from, and the class of IPC marker windows.
 **/
pub const WINDOW_MANAGER_NAME: &str = "pgtile";

/**
How many layout snapshots a group keeps for undo, the oldest is discarded when full.
 **/
pub const UNDO_DEPTH: usize = 32;

/**
How many recently launched processes are remembered while waiting for their first window.
 **/
pub const LAUNCH_MARKER_LIMIT: usize = 32;

/**
Seconds after which a launch marker no longer claims new windows.
 **/
pub const LAUNCH_MARKER_EXPIRY_SECS: u64 = 10;

/**
Bound on the head's recency stack of previously focused groups.
 **/
pub const GROUP_HISTORY_LIMIT: usize = 32;

/**
Generation counters wrap at this value.
 **/
pub const STATE_COUNTER_WRAP: u32 = 1_000_000;

pub const BORDER_FOCUS: &str = "Blue";
pub const BORDER_UNFOCUS: &str = "Dim Gray";
pub const BORDER_DEDICATE_FOCUS: &str = "Red";
pub const BORDER_DEDICATE_UNFOCUS: &str = "Dark Red";
pub const BORDER_CATCHALL_FOCUS: &str = "Green";
pub const BORDER_CATCHALL_UNFOCUS: &str = "Dark Green";
pub const BORDER_WIDTH: u32 = 1;
pub const FRAME_MIN_WH: i32 = 100;
pub const FRAME_RESIZE: i32 = 20;
pub const UNMANAGED_CLASSES: [&str; 3] = ["trayer", "Xmessage", "Conky"];

/// Where a freshly managed window lands when nothing else claims it.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "config-file", derive(serde::Deserialize))]
#[cfg_attr(feature = "config-file", serde(rename_all = "lowercase"))]
pub enum OpenFrame {
    Current,
    Empty,
}

/// What an emptied frame does with hidden clients.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "config-file", derive(serde::Deserialize))]
#[cfg_attr(feature = "config-file", serde(rename_all = "lowercase"))]
pub enum HiddenReveal {
    Off,
    Any,
    Local,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "config-file", derive(serde::Deserialize))]
#[cfg_attr(feature = "config-file", serde(rename_all = "lowercase"))]
pub enum SplitFocus {
    Current,
    New,
}

#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "config-file", derive(serde::Deserialize))]
pub struct Placement {
    pub class: String,
    pub group: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config-file", derive(serde::Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct Settings {
    pub border_focus: String,
    pub border_unfocus: String,
    pub border_dedicate_focus: String,
    pub border_dedicate_unfocus: String,
    pub border_catchall_focus: String,
    pub border_catchall_unfocus: String,
    pub border_width: u32,
    pub frame_min_wh: i32,
    pub frame_resize: i32,
    pub window_open_frame: OpenFrame,
    pub window_open_focus: bool,
    pub frame_display_hidden: HiddenReveal,
    pub frame_split_focus: SplitFocus,
    pub focus_follow_mouse: bool,
    pub group_close_empty: bool,
    pub window_size_hints: bool,
    pub unmanaged: Vec<String>,
    pub placements: Vec<Placement>,
    pub startup: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            border_focus: BORDER_FOCUS.to_owned(),
            border_unfocus: BORDER_UNFOCUS.to_owned(),
            border_dedicate_focus: BORDER_DEDICATE_FOCUS.to_owned(),
            border_dedicate_unfocus: BORDER_DEDICATE_UNFOCUS.to_owned(),
            border_catchall_focus: BORDER_CATCHALL_FOCUS.to_owned(),
            border_catchall_unfocus: BORDER_CATCHALL_UNFOCUS.to_owned(),
            border_width: BORDER_WIDTH,
            frame_min_wh: FRAME_MIN_WH,
            frame_resize: FRAME_RESIZE,
            window_open_frame: OpenFrame::Current,
            window_open_focus: true,
            frame_display_hidden: HiddenReveal::Any,
            frame_split_focus: SplitFocus::Current,
            focus_follow_mouse: false,
            group_close_empty: false,
            window_size_hints: true,
            unmanaged: UNMANAGED_CLASSES.iter().map(|s| (*s).to_owned()).collect(),
            placements: Vec::new(),
            startup: Vec::new(),
        }
    }
}

impl Settings {
    /// Reads the user's config file, any failure to find one falls back to defaults.
    #[cfg(feature = "config-file")]
    pub fn new() -> crate::error::Result<Self> {
        match crate::util::load_cfg::load_cfg() {
            Ok(cfg) => Ok(cfg),
            Err(crate::error::Error::ConfigDirFind | crate::error::Error::ConfigFileFind) => {
                tracing::info!("No config file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    #[cfg(not(feature = "config-file"))]
    pub fn new() -> crate::error::Result<Self> {
        Ok(Self::default())
    }

    /// Runtime change of a single named setting, the error is meant for the user.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), String> {
        let value = value.trim();
        match name {
            "border_focus" => self.border_focus = value.to_owned(),
            "border_unfocus" => self.border_unfocus = value.to_owned(),
            "border_dedicate_focus" => self.border_dedicate_focus = value.to_owned(),
            "border_dedicate_unfocus" => self.border_dedicate_unfocus = value.to_owned(),
            "border_catchall_focus" => self.border_catchall_focus = value.to_owned(),
            "border_catchall_unfocus" => self.border_catchall_unfocus = value.to_owned(),
            "border_width" => self.border_width = parse_number(name, value)?,
            "frame_min_wh" => self.frame_min_wh = parse_number(name, value)?,
            "frame_resize" => self.frame_resize = parse_number(name, value)?,
            "window_open_frame" => {
                self.window_open_frame = match value {
                    "current" => OpenFrame::Current,
                    "empty" => OpenFrame::Empty,
                    _ => return Err(format!("invalid value for {name}: {value}")),
                };
            }
            "window_open_focus" => self.window_open_focus = parse_flag(name, value)?,
            "frame_display_hidden" => {
                self.frame_display_hidden = match value {
                    "0" | "off" => HiddenReveal::Off,
                    "1" | "any" => HiddenReveal::Any,
                    "2" | "local" => HiddenReveal::Local,
                    _ => return Err(format!("invalid value for {name}: {value}")),
                };
            }
            "frame_split_focus" => {
                self.frame_split_focus = match value {
                    "current" => SplitFocus::Current,
                    "new" => SplitFocus::New,
                    _ => return Err(format!("invalid value for {name}: {value}")),
                };
            }
            "focus_follow_mouse" => self.focus_follow_mouse = parse_flag(name, value)?,
            "group_close_empty" => self.group_close_empty = parse_flag(name, value)?,
            "window_size_hints" => self.window_size_hints = parse_flag(name, value)?,
            _ => return Err(format!("unknown setting: {name}")),
        }
        Ok(())
    }

    #[must_use]
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "border_focus\t{}", self.border_focus);
        let _ = writeln!(out, "border_unfocus\t{}", self.border_unfocus);
        let _ = writeln!(out, "border_dedicate_focus\t{}", self.border_dedicate_focus);
        let _ = writeln!(out, "border_dedicate_unfocus\t{}", self.border_dedicate_unfocus);
        let _ = writeln!(out, "border_catchall_focus\t{}", self.border_catchall_focus);
        let _ = writeln!(out, "border_catchall_unfocus\t{}", self.border_catchall_unfocus);
        let _ = writeln!(out, "border_width\t{}", self.border_width);
        let _ = writeln!(out, "frame_min_wh\t{}", self.frame_min_wh);
        let _ = writeln!(out, "frame_resize\t{}", self.frame_resize);
        let _ = writeln!(out, "window_open_frame\t{:?}", self.window_open_frame);
        let _ = writeln!(out, "window_open_focus\t{}", u8::from(self.window_open_focus));
        let _ = writeln!(out, "frame_display_hidden\t{:?}", self.frame_display_hidden);
        let _ = writeln!(out, "frame_split_focus\t{:?}", self.frame_split_focus);
        let _ = writeln!(out, "focus_follow_mouse\t{}", u8::from(self.focus_follow_mouse));
        let _ = writeln!(out, "group_close_empty\t{}", u8::from(self.group_close_empty));
        let _ = writeln!(out, "window_size_hints\t{}", u8::from(self.window_size_hints));
        out
    }

    #[must_use]
    pub fn is_unmanaged(&self, class: &str) -> bool {
        self.unmanaged.iter().any(|c| c == class)
    }

    #[must_use]
    pub fn placement_for(&self, class: &str) -> Option<&str> {
        self.placements
            .iter()
            .find(|p| p.class == class)
            .map(|p| p.group.as_str())
    }
}

fn parse_number<T: atoi::FromRadix10SignedChecked>(name: &str, value: &str) -> Result<T, String> {
    atoi::atoi::<T>(value.as_bytes()).ok_or_else(|| format!("invalid number for {name}: {value}"))
}

fn parse_flag(name: &str, value: &str) -> Result<bool, String> {
    match value {
        "1" | "on" | "true" => Ok(true),
        "0" | "off" | "false" => Ok(false),
        _ => Err(format!("invalid flag for {name}: {value}")),
    }
}

#[cfg(test)]
mod tests {
    use super::{HiddenReveal, Settings};

    #[test]
    fn defaults_match_documented_values() {
        let s = Settings::default();
        assert_eq!(100, s.frame_min_wh);
        assert_eq!(20, s.frame_resize);
        assert_eq!(1, s.border_width);
        assert!(s.is_unmanaged("trayer"));
        assert!(!s.is_unmanaged("XTerm"));
    }

    #[test]
    fn set_changes_single_values_and_rejects_garbage() {
        let mut s = Settings::default();
        s.set("frame_min_wh", "150").unwrap();
        assert_eq!(150, s.frame_min_wh);
        s.set("frame_display_hidden", "local").unwrap();
        assert_eq!(HiddenReveal::Local, s.frame_display_hidden);
        assert!(s.set("frame_min_wh", "abc").is_err());
        assert!(s.set("no_such_thing", "1").is_err());
        assert_eq!(150, s.frame_min_wh);
    }
}
