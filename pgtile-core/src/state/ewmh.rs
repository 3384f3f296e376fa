//! Publishes the focused head's clients and groups for pagers and task bars.
use crate::error::Result;
use crate::state::State;
use crate::surface::{DisplaySurface, Property, PropertyValue};
use crate::Window;

impl State {
    /// Client list, stacking order, active window and each client's desktop.
    pub fn ewmh_clients(&self, surface: &mut dyn DisplaySurface) -> Result<()> {
        let Some(head) = self.focused_head else {
            return Ok(());
        };
        let h = &self.heads[head];
        let active = h
            .groups
            .current()
            .and_then(|g| self.groups[g].clients.current())
            .map(|c| &self.clients[c])
            .filter(|c| c.net_state.listed())
            .map_or(0, |c| c.win);
        let mut listed = Vec::new();
        let mut desktops = Vec::new();
        for (desktop, g) in h.groups.iter().enumerate() {
            for c in self.groups[g].clients.iter() {
                let c = &self.clients[c];
                if c.net_state.listed() {
                    listed.push(c.win);
                    desktops.push((c.win, desktop as u32));
                }
            }
        }
        let stacking = h
            .stacked
            .iter()
            .flat_map(|g| self.groups[*g].stacked.iter())
            .map(|c| &self.clients[*c])
            .filter(|c| c.net_state.listed())
            .map(|c| c.win)
            .collect::<Vec<Window>>();
        let root = h.root;
        for (win, desktop) in desktops {
            surface.set_property(win, Property::WmDesktop, PropertyValue::Cardinals(&[desktop]))?;
        }
        surface.set_property(root, Property::ClientList, PropertyValue::Windows(&listed))?;
        surface.set_property(
            root,
            Property::ClientListStacking,
            PropertyValue::Windows(&stacking),
        )?;
        surface.set_property(root, Property::ActiveWindow, PropertyValue::Windows(&[active]))
    }

    /// Desktop count, names, current desktop and the usable geometry of the current one.
    pub fn ewmh_groups(&self, surface: &mut dyn DisplaySurface) -> Result<()> {
        let Some(cursor) = self.cursor() else {
            return Ok(());
        };
        let h = &self.heads[cursor.head];
        let mut names = Vec::new();
        for g in h.groups.iter() {
            names.extend_from_slice(self.groups[g].name.as_bytes());
            names.push(0);
        }
        let count = h.groups.len() as u32;
        let current = h.groups.position(cursor.group).unwrap_or_default() as u32;
        let usable = self.usable_rect(cursor.group);
        let root = h.root;
        surface.set_property(root, Property::NumberOfDesktops, PropertyValue::Cardinals(&[count]))?;
        surface.set_property(root, Property::DesktopNames, PropertyValue::Utf8(&names))?;
        surface.set_property(root, Property::CurrentDesktop, PropertyValue::Cardinals(&[current]))?;
        surface.set_property(
            root,
            Property::DesktopGeometry,
            PropertyValue::Cardinals(&[usable.w as u32, usable.h as u32]),
        )
    }
}
