//! Text commands and decoded display events, the only ways the outside world drives the engine.
use crate::geometry::{Direction, Side};
use crate::state::model::Padding;
use crate::state::ring::Dir;

pub mod events;
mod execute;

/// A size argument: pixels, `N%` or `a/b` of some limit.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Size {
    Pixels(u32),
    Percent(u32),
    Fraction(u32, u32),
}

impl Size {
    fn parse(arg: &str) -> Option<Self> {
        if let Some(pct) = arg.strip_suffix('%') {
            return number(pct).map(Size::Percent);
        }
        if let Some((a, b)) = arg.split_once('/') {
            return Some(Size::Fraction(number(a)?, number(b)?));
        }
        number(arg).map(Size::Pixels)
    }

    /// Pixels out of `limit`, never below `min` and never above `limit`.
    #[must_use]
    pub fn resolve(self, limit: i32, min: i32) -> f64 {
        let limit = f64::from(limit);
        let size = match self {
            Size::Pixels(p) => f64::from(p),
            Size::Percent(p) => f64::from(p) / 100.0 * limit,
            Size::Fraction(a, b) => f64::from(a) / f64::from(b) * limit,
        };
        size.max(f64::from(min)).min(limit)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Flag {
    On,
    Off,
    Flip,
}

impl Flag {
    fn parse(arg: &str) -> Option<Self> {
        match arg.to_ascii_lowercase().as_str() {
            "on" => Some(Flag::On),
            "off" => Some(Flag::Off),
            "flip" => Some(Flag::Flip),
            _ => None,
        }
    }

    #[must_use]
    pub fn apply(self, current: bool) -> bool {
        match self {
            Flag::On => true,
            Flag::Off => false,
            Flag::Flip => !current,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Listing {
    Unmanaged,
    Settings,
    Groups,
    Frames,
    Windows,
    Placements,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ScreenRef {
    Next,
    Index(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Split(Direction, Size),
    /// Sets the focused frame's width or height.
    Extent(Direction, Size),
    Remove,
    Kill(Option<String>),
    Cycle { local: bool, dir: Dir },
    Only,
    Focus(Side),
    Dedicate(Flag),
    Catchall(Flag),
    Undo,
    Resize(Side),
    Pad(Padding),
    Add(String),
    Drop(String),
    Name(String),
    Dump(String),
    Load(String),
    Use(String),
    Stack(Flag),
    Swap(Side),
    Slide(Side),
    Move(String),
    Manage { on: bool, class: String },
    Raise(String),
    Shrink(Option<String>),
    Border(Flag),
    Refresh,
    Place {
        class: String,
        on: bool,
        group: Option<String>,
    },
    Screen(ScreenRef),
    Exec(String),
    Set { name: String, value: String },
    Show(Listing),
    ClientHints(Flag),
    Sanity,
    Say(String),
    Run(String),
    Quit,
}

fn number(arg: &str) -> Option<u32> {
    if arg.is_empty() || !arg.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    atoi::atoi::<u32>(arg.as_bytes())
}

fn side(arg: &str) -> Option<Side> {
    match arg.to_ascii_lowercase().as_str() {
        "left" => Some(Side::Left),
        "right" => Some(Side::Right),
        "up" => Some(Side::Top),
        "down" => Some(Side::Bottom),
        _ => None,
    }
}

/// `u`, `d`, `l` or `r` in front of a short form like `lswap`.
fn side_prefix(name: &str, suffix: &str) -> Option<Side> {
    match name.strip_suffix(suffix)? {
        "u" => Some(Side::Top),
        "d" => Some(Side::Bottom),
        "l" => Some(Side::Left),
        "r" => Some(Side::Right),
        _ => None,
    }
}

/// Exactly one word.
fn word(rest: &str) -> Option<&str> {
    let mut words = rest.split_whitespace();
    let first = words.next()?;
    words.next().is_none().then_some(first)
}

fn optional(rest: &str) -> Option<String> {
    (!rest.is_empty()).then(|| rest.to_owned())
}

fn nothing(rest: &str, cmd: Command) -> Option<Command> {
    rest.is_empty().then_some(cmd)
}

impl Command {
    /// Parses one command line, command names are case insensitive, arguments are not.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let name = name.to_ascii_lowercase();
        let cmd = match name.as_str() {
            "hsplit" | "vsplit" | "width" | "height" => {
                let dir = if name == "hsplit" || name == "width" {
                    Direction::Horizontal
                } else {
                    Direction::Vertical
                };
                let size = Size::parse(word(rest)?)?;
                if name.ends_with("split") {
                    Command::Split(dir, size)
                } else {
                    Command::Extent(dir, size)
                }
            }
            "remove" => return nothing(rest, Command::Remove),
            "kill" => Command::Kill(optional(rest)),
            "cycle" => {
                let mut words = rest.split_whitespace().map(str::to_ascii_lowercase);
                let mut next = words.next();
                let local = next.as_deref() == Some("local");
                if local {
                    next = words.next();
                }
                let dir = match next.as_deref() {
                    None | Some("next") => Dir::Next,
                    Some("prev") => Dir::Prev,
                    Some(_) => return None,
                };
                if words.next().is_some() {
                    return None;
                }
                Command::Cycle { local, dir }
            }
            "only" => return nothing(rest, Command::Only),
            "focus" => Command::Focus(side(word(rest)?)?),
            "lfocus" | "rfocus" | "ufocus" | "dfocus" => {
                return nothing(rest, Command::Focus(side_prefix(&name, "focus")?));
            }
            "dedicate" => Command::Dedicate(Flag::parse(word(rest)?)?),
            "catchall" => Command::Catchall(Flag::parse(word(rest)?)?),
            "undo" => return nothing(rest, Command::Undo),
            "resize" => Command::Resize(side(word(rest)?)?),
            "pad" => {
                let mut words = rest.split_whitespace();
                let mut next = || words.next().and_then(number).map(|n| n as i32);
                let pad = Padding {
                    l: next()?,
                    r: next()?,
                    t: next()?,
                    b: next()?,
                };
                if words.next().is_some() {
                    return None;
                }
                Command::Pad(pad)
            }
            "add" => Command::Add(word(rest)?.to_owned()),
            "drop" => Command::Drop(word(rest)?.to_owned()),
            "name" => Command::Name(word(rest)?.to_owned()),
            "dump" => Command::Dump(word(rest)?.to_owned()),
            "load" => Command::Load(word(rest)?.to_owned()),
            "use" => Command::Use(optional(rest)?),
            "stack" => Command::Stack(Flag::parse(word(rest)?)?),
            "swap" => Command::Swap(side(word(rest)?)?),
            "uswap" | "dswap" | "lswap" | "rswap" => {
                return nothing(rest, Command::Swap(side_prefix(&name, "swap")?));
            }
            "slide" => Command::Slide(side(word(rest)?)?),
            "uslide" | "dslide" | "lslide" | "rslide" => {
                return nothing(rest, Command::Slide(side_prefix(&name, "slide")?));
            }
            "move" => Command::Move(word(rest)?.to_owned()),
            "manage" => {
                let (flag, class) = rest.split_once(char::is_whitespace)?;
                let on = match Flag::parse(flag)? {
                    Flag::On => true,
                    Flag::Off => false,
                    Flag::Flip => return None,
                };
                Command::Manage {
                    on,
                    class: word(class)?.to_owned(),
                }
            }
            "raise" => Command::Raise(optional(rest)?),
            "shrink" => Command::Shrink(optional(rest)),
            "border" => Command::Border(Flag::parse(word(rest)?)?),
            "refresh" => return nothing(rest, Command::Refresh),
            "place" => {
                let mut words = rest.split_whitespace();
                let class = words.next()?.to_owned();
                let on = match Flag::parse(words.next()?)? {
                    Flag::On => true,
                    Flag::Off => false,
                    Flag::Flip => return None,
                };
                let group = words.next().map(str::to_owned);
                if words.next().is_some() {
                    return None;
                }
                Command::Place { class, on, group }
            }
            "screen" => {
                let arg = word(rest)?;
                if arg.eq_ignore_ascii_case("(next)") {
                    Command::Screen(ScreenRef::Next)
                } else {
                    Command::Screen(ScreenRef::Index(number(arg)? as usize))
                }
            }
            "exec" => Command::Exec(optional(rest)?),
            "set" => {
                let (name, value) = rest.split_once(char::is_whitespace)?;
                let value = value.trim();
                if value.is_empty() {
                    return None;
                }
                Command::Set {
                    name: name.to_ascii_lowercase(),
                    value: value.to_owned(),
                }
            }
            "show" => Command::Show(match word(rest)?.to_ascii_lowercase().as_str() {
                "unmanaged" => Listing::Unmanaged,
                "settings" => Listing::Settings,
                "groups" => Listing::Groups,
                "frames" => Listing::Frames,
                "windows" => Listing::Windows,
                "placements" => Listing::Placements,
                _ => return None,
            }),
            "client" => {
                let (what, flag) = rest.split_once(char::is_whitespace)?;
                if !what.eq_ignore_ascii_case("hints") {
                    return None;
                }
                Command::ClientHints(Flag::parse(word(flag)?)?)
            }
            "debug" => {
                if !word(rest)?.eq_ignore_ascii_case("sanity") {
                    return None;
                }
                Command::Sanity
            }
            "say" => Command::Say(optional(rest)?),
            "run" => Command::Run(optional(rest)?),
            "quit" => return nothing(rest, Command::Quit),
            _ => return None,
        };
        Some(cmd)
    }

    /// Commands that only make sense with a tiled layout.
    #[must_use]
    pub fn tiling_only(&self) -> bool {
        matches!(
            self,
            Command::Split(..)
                | Command::Extent(..)
                | Command::Remove
                | Command::Only
                | Command::Focus(_)
                | Command::Dedicate(_)
                | Command::Catchall(_)
                | Command::Undo
                | Command::Resize(_)
                | Command::Dump(_)
                | Command::Load(_)
                | Command::Swap(_)
                | Command::Slide(_)
                | Command::Border(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Command, Flag, Listing, ScreenRef, Size};
    use crate::geometry::{Direction, Side};
    use crate::state::model::Padding;
    use crate::state::ring::Dir;

    #[test]
    fn sizes_resolve_against_limit_and_clamp() {
        assert_eq!(Some(Size::Percent(30)), Size::parse("30%"));
        assert_eq!(Some(Size::Fraction(1, 3)), Size::parse("1/3"));
        assert_eq!(None, Size::parse("-4"));
        assert!((Size::Percent(50).resolve(800, 100) - 400.0).abs() < f64::EPSILON);
        assert!((Size::Fraction(1, 4).resolve(800, 100) - 200.0).abs() < f64::EPSILON);
        assert!((Size::Pixels(20).resolve(800, 100) - 100.0).abs() < f64::EPSILON);
        assert!((Size::Pixels(5000).resolve(800, 100) - 800.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parses_frame_commands() {
        assert_eq!(
            Some(Command::Split(Direction::Horizontal, Size::Fraction(1, 2))),
            Command::parse("hsplit 1/2")
        );
        assert_eq!(
            Some(Command::Extent(Direction::Vertical, Size::Pixels(300))),
            Command::parse("  HEIGHT   300 ")
        );
        assert_eq!(Some(Command::Focus(Side::Left)), Command::parse("lfocus"));
        assert_eq!(Some(Command::Focus(Side::Bottom)), Command::parse("focus down"));
        assert_eq!(Some(Command::Swap(Side::Top)), Command::parse("uswap"));
        assert_eq!(
            Some(Command::Cycle {
                local: true,
                dir: Dir::Prev
            }),
            Command::parse("cycle local prev")
        );
        assert_eq!(
            Some(Command::Cycle {
                local: false,
                dir: Dir::Next
            }),
            Command::parse("cycle")
        );
        assert_eq!(Some(Command::Dedicate(Flag::Flip)), Command::parse("dedicate flip"));
        assert_eq!(None, Command::parse("remove now"));
        assert_eq!(None, Command::parse("focus sideways"));
    }

    #[test]
    fn parses_group_window_and_misc_commands() {
        assert_eq!(
            Some(Command::Pad(Padding {
                l: 0,
                r: 0,
                t: 20,
                b: 0
            })),
            Command::parse("pad 0 0 20 0")
        );
        assert_eq!(None, Command::parse("pad 0 0 20"));
        assert_eq!(Some(Command::Use("(other)".to_owned())), Command::parse("use (other)"));
        assert_eq!(Some(Command::Kill(None)), Command::parse("kill"));
        assert_eq!(Some(Command::Kill(Some("2".to_owned()))), Command::parse("kill 2"));
        assert_eq!(
            Some(Command::Place {
                class: "Firefox".to_owned(),
                on: true,
                group: Some("web".to_owned())
            }),
            Command::parse("place Firefox on web")
        );
        assert_eq!(
            Some(Command::Manage {
                on: false,
                class: "Gimp".to_owned()
            }),
            Command::parse("manage off Gimp")
        );
        assert_eq!(
            Some(Command::Exec("xterm -e 'top -d 1'".to_owned())),
            Command::parse("exec xterm -e 'top -d 1'")
        );
        assert_eq!(Some(Command::Screen(ScreenRef::Next)), Command::parse("screen (next)"));
        assert_eq!(Some(Command::Show(Listing::Frames)), Command::parse("show frames"));
        assert_eq!(Some(Command::ClientHints(Flag::Off)), Command::parse("client hints off"));
        assert_eq!(None, Command::parse("bogus"));
        assert_eq!(None, Command::parse(""));
    }

    #[test]
    fn only_layout_commands_are_tiling_only() {
        assert!(Command::parse("undo").unwrap().tiling_only());
        assert!(Command::parse("swap left").unwrap().tiling_only());
        assert!(!Command::parse("stack off").unwrap().tiling_only());
        assert!(!Command::parse("use 0").unwrap().tiling_only());
        assert!(!Command::parse("kill").unwrap().tiling_only());
    }
}
