//! Text form of a group's layout, used for undo and by the dump and load commands.
//!
//! ```text
//! group	<l>	<r>	<t>	<b>	<name>
//! frame	<x>	<y>	<w>	<h>	<flags>	<class>	<role>
//! window	<id>	<class>	<name>	<role>
//! ```
//!
//! Frames are listed from the focused one, `window` lines are informational and ignored when
//! loading.
use std::fmt::Write;

use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::state::model::{FrameFlags, GroupId, Padding};
use crate::state::ring::Dir;
use crate::state::State;
use crate::surface::DisplaySurface;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Layout {
    pub pad: Padding,
    pub name: Option<String>,
    pub frames: Vec<FrameLayout>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FrameLayout {
    pub rect: Rect,
    pub flags: FrameFlags,
    /// Class and role of the client shown when dumped, empty for an empty frame.
    pub class: String,
    pub role: String,
}

fn number(line: usize, field: Option<&str>) -> Result<i32> {
    field
        .map(str::trim)
        .and_then(|f| atoi::atoi::<i32>(f.as_bytes()))
        .ok_or(Error::LayoutParse {
            line,
            reason: "expected a number",
        })
}

/// Parses a dump completely before anything is touched.
pub fn parse_layout(dump: &str) -> Result<Layout> {
    let mut layout = Layout {
        pad: Padding::default(),
        name: None,
        frames: Vec::new(),
    };
    for (ind, raw) in dump.lines().enumerate() {
        let line = ind + 1;
        let raw = raw.trim_start();
        if let Some(rest) = raw.strip_prefix("group") {
            let mut fields = rest.trim_start().splitn(5, '\t');
            layout.pad = Padding {
                l: number(line, fields.next())?,
                r: number(line, fields.next())?,
                t: number(line, fields.next())?,
                b: number(line, fields.next())?,
            };
            layout.name = fields
                .next()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_owned);
        } else if let Some(rest) = raw.strip_prefix("frame") {
            let mut fields = rest.trim_start().splitn(7, '\t');
            let rect = Rect::new(
                number(line, fields.next())?,
                number(line, fields.next())?,
                number(line, fields.next())?,
                number(line, fields.next())?,
            );
            if rect.w <= 0 || rect.h <= 0 {
                return Err(Error::LayoutParse {
                    line,
                    reason: "frame without area",
                });
            }
            let bits = number(line, fields.next())?;
            layout.frames.push(FrameLayout {
                rect,
                flags: FrameFlags::from_bits(bits as u8),
                class: fields.next().unwrap_or_default().to_owned(),
                role: fields.next().unwrap_or_default().trim_end().to_owned(),
            });
        }
    }
    if layout.frames.is_empty() {
        return Err(Error::LayoutParse {
            line: 0,
            reason: "no frames",
        });
    }
    Ok(layout)
}

impl State {
    #[must_use]
    pub fn group_dump(&self, group: GroupId) -> String {
        let g = &self.groups[group];
        let mut out = String::new();
        let _ = writeln!(
            out,
            "group\t{}\t{}\t{}\t{}\t{}",
            g.pad.l, g.pad.r, g.pad.t, g.pad.b, g.name
        );
        for f in g.frames.from_current(Dir::Next) {
            let frame = &self.frames[f];
            let (class, role) = self
                .frame_content(f)
                .map_or(("", ""), |c| {
                    (self.clients[c].class.as_str(), self.clients[c].role.as_str())
                });
            let r = frame.rect;
            let _ = writeln!(
                out,
                "frame\t{}\t{}\t{}\t{}\t{}\t{class}\t{role}",
                r.x,
                r.y,
                r.w,
                r.h,
                frame.flags.bits()
            );
        }
        for (id, c) in g.clients.iter().enumerate() {
            let c = &self.clients[c];
            let _ = writeln!(out, "window\t{id}\t{}\t{}\t{}", c.class, c.name, c.role);
        }
        out
    }

    /// Replaces the group's frames with the dumped layout.
    ///
    /// Each frame takes the first unplaced client with the class and role it showed when
    /// dumped, clients left over are hidden.
    pub fn group_load(
        &mut self,
        surface: &mut dyn DisplaySurface,
        group: GroupId,
        dump: &str,
    ) -> Result<()> {
        let layout = parse_layout(dump)?;
        while let Some(f) = self.groups[group].frames.current() {
            self.frame_destroy(surface, f)?;
        }
        let g = &mut self.groups[group];
        g.pad = layout.pad;
        if let Some(name) = layout.name {
            g.name = name;
        }
        for fl in layout.frames {
            let frame = self.frame_create(surface, group, fl.rect)?;
            self.frames[frame].flags = fl.flags;
            if fl.class.is_empty() {
                continue;
            }
            let bound = self.groups[group].clients.iter().find(|c| {
                let c = &self.clients[*c];
                c.frame.is_none() && c.class == fl.class && c.role == fl.role
            });
            if let Some(c) = bound {
                self.frames[frame].shown = Some(c);
                self.clients[c].frame = Some(frame);
            }
        }
        for c in self.groups[group].clients.iter().collect::<Vec<_>>() {
            if self.clients[c].frame.is_none() {
                self.client_hide(surface, c)?;
            }
            self.clients[c].state = 0;
        }
        for f in self.groups[group].frames.iter().collect::<Vec<_>>() {
            self.frame_update(surface, f)?;
        }
        if let Some(f) = self.groups[group].frames.first() {
            self.frame_focus(surface, f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::parse_layout;
    use crate::error::Error;
    use crate::geometry::{Direction, Rect};
    use crate::state::model::{FrameFlags, Padding};
    use crate::state::tests::{cursor, frame_rects, open, setup};

    #[test]
    fn parses_group_and_frames() {
        let layout = parse_layout(
            "group\t1\t2\t3\t4\tweb\nframe\t0\t0\t500\t800\t1\tFirefox\tbrowser\n\
             frame\t500\t0\t500\t800\t0\t\t\nwindow\t0\tFirefox\tMozilla\tbrowser\n",
        )
        .unwrap();
        assert_eq!(Padding { l: 1, r: 2, t: 3, b: 4 }, layout.pad);
        assert_eq!(Some("web".to_owned()), layout.name);
        assert_eq!(2, layout.frames.len());
        assert_eq!("Firefox", layout.frames[0].class);
        assert_eq!("browser", layout.frames[0].role);
        assert!(layout.frames[0].flags.dedicated);
        assert_eq!(FrameFlags::default(), layout.frames[1].flags);
        assert_eq!("", layout.frames[1].class);
    }

    #[test]
    fn rejects_garbage_before_touching_anything() {
        let (mut state, mut surface) = setup();
        let g = cursor(&state).group;
        let err = state
            .group_load(&mut surface, g, "group\t0\t0\t0\t0\tx\nframe\tten\t0\t5\t5\t0\t\t\n")
            .unwrap_err();
        assert!(matches!(err, Error::LayoutParse { line: 2, .. }));
        assert!(matches!(
            parse_layout("group\t0\t0\t0\t0\tx\n"),
            Err(Error::LayoutParse { .. })
        ));
        assert_eq!(vec![Rect::new(0, 0, 1000, 800)], frame_rects(&state));
        assert_eq!("default", state.groups[g].name);
    }

    #[test]
    fn dump_then_load_rebinds_clients_by_class() {
        let (mut state, mut surface) = setup();
        let c = cursor(&state);
        let right = state
            .frame_split(&mut surface, c, Direction::Horizontal, 0.5)
            .unwrap()
            .unwrap();
        let a = open(&mut state, &mut surface, "A");
        state.frame_focus(&mut surface, right).unwrap();
        let b = open(&mut state, &mut surface, "B");
        assert_eq!(Some(right), state.clients[b].frame);
        let dump = state.group_dump(c.group);
        assert!(dump.contains("frame\t500\t0\t500\t800\t0\tB\t\n"));
        assert!(dump.contains("window\t1\tB\tB-window\t\n"));

        state.frame_single(&mut surface, right).unwrap();
        state.frame_update(&mut surface, right).unwrap();
        state.group_load(&mut surface, c.group, &dump).unwrap();
        let rects = frame_rects(&state);
        // Listed from the focused frame, which is focused again after loading
        assert_eq!(
            vec![Rect::new(500, 0, 500, 800), Rect::new(0, 0, 500, 800)],
            rects
        );
        let fb = state.clients[b].frame.unwrap();
        let fa = state.clients[a].frame.unwrap();
        assert_eq!(Rect::new(500, 0, 500, 800), state.frames[fb].rect);
        assert_eq!(Rect::new(0, 0, 500, 800), state.frames[fa].rect);
        assert_eq!(fb, cursor(&state).frame);
        assert!(surface.is_mapped(state.clients[a].win));
    }
}
