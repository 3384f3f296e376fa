//! In-memory display surface for tests, keeps a window table and logs every request.
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::Result;
use crate::geometry::hints::SizeHints;
use crate::geometry::Rect;
use crate::surface::{
    BorderColor, ConfigureRequest, DisplaySurface, Launch, Property, PropertyValue, WindowInfo,
};
use crate::Window;

#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) enum Call {
    CreateFrame(Window, Rect),
    Destroy(Window),
    Map(Window),
    Unmap(Window),
    Configure(Window, Rect, u32),
    MoveResize(Window, Rect),
    PassConfigure(Window),
    Border(Window, BorderColor),
    Raise(Window),
    Restack(Vec<Window>),
    Focus(Window),
    SelectEvents(Window),
    CloseRequest(Window),
    Kill(Window),
    SetProperty(Window, Property),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) enum Stored {
    Windows(Vec<Window>),
    Cardinals(Vec<u32>),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct FakeWindow {
    pub info: WindowInfo,
    pub geometry: Rect,
    pub hints: Option<SizeHints>,
}

#[derive(Debug)]
pub(crate) struct RecordingSurface {
    next_window: Window,
    pub windows: BTreeMap<Window, FakeWindow>,
    pub mapped: BTreeSet<Window>,
    pub properties: HashMap<(Window, Property), Stored>,
    pub calls: Vec<Call>,
}

const ROOT: Window = 1;

impl RecordingSurface {
    pub(crate) fn new() -> Self {
        let mut windows = BTreeMap::new();
        windows.insert(
            ROOT,
            FakeWindow {
                info: WindowInfo::new(""),
                geometry: Rect::new(0, 0, 1000, 800),
                hints: None,
            },
        );
        Self {
            next_window: ROOT + 1,
            windows,
            mapped: BTreeSet::new(),
            properties: HashMap::new(),
            calls: Vec::new(),
        }
    }

    pub(crate) fn root(&self) -> Window {
        ROOT
    }

    fn alloc(&mut self, info: WindowInfo, geometry: Rect) -> Window {
        let win = self.next_window;
        self.next_window += 1;
        self.windows.insert(
            win,
            FakeWindow {
                info,
                geometry,
                hints: None,
            },
        );
        win
    }

    /// An application window that hasn't been mapped yet.
    pub(crate) fn add_client_window(&mut self, class: &str, geometry: Rect) -> Window {
        let mut info = WindowInfo::new(class);
        info.root = ROOT;
        info.name = format!("{class}-window");
        self.alloc(info, geometry)
    }

    pub(crate) fn add_transient_window(&mut self, class: &str, geometry: Rect, parent: Window) -> Window {
        let win = self.add_client_window(class, geometry);
        self.info_mut(win).transient_for = Some(parent);
        win
    }

    pub(crate) fn info_mut(&mut self, window: Window) -> &mut WindowInfo {
        &mut self.windows.get_mut(&window).unwrap().info
    }

    pub(crate) fn set_hints(&mut self, window: Window, hints: SizeHints) {
        self.windows.get_mut(&window).unwrap().hints = Some(hints);
    }

    pub(crate) fn geometry(&self, window: Window) -> Rect {
        self.windows[&window].geometry
    }

    pub(crate) fn is_mapped(&self, window: Window) -> bool {
        self.mapped.contains(&window)
    }

    pub(crate) fn text(&self, window: Window, property: Property) -> Option<&str> {
        match self.properties.get(&(window, property)) {
            Some(Stored::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub(crate) fn windows_property(&self, window: Window, property: Property) -> Vec<Window> {
        match self.properties.get(&(window, property)) {
            Some(Stored::Windows(w)) => w.clone(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn cardinals(&self, window: Window, property: Property) -> Vec<u32> {
        match self.properties.get(&(window, property)) {
            Some(Stored::Cardinals(c)) => c.clone(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    /// Drops the window as if its owner went away without us asking.
    pub(crate) fn vanish(&mut self, window: Window) {
        self.windows.remove(&window);
        self.mapped.remove(&window);
    }
}

impl DisplaySurface for RecordingSurface {
    fn create_frame_window(&mut self, _root: Window, rect: Rect, _border_width: u32) -> Result<Window> {
        let win = self.alloc(WindowInfo::new(crate::config::WINDOW_MANAGER_NAME), rect);
        self.calls.push(Call::CreateFrame(win, rect));
        Ok(win)
    }

    fn destroy_window(&mut self, window: Window) -> Result<()> {
        self.vanish(window);
        self.calls.push(Call::Destroy(window));
        Ok(())
    }

    fn map_window(&mut self, window: Window) -> Result<()> {
        if self.windows.contains_key(&window) {
            self.mapped.insert(window);
        }
        self.calls.push(Call::Map(window));
        Ok(())
    }

    fn unmap_window(&mut self, window: Window) -> Result<()> {
        self.mapped.remove(&window);
        self.calls.push(Call::Unmap(window));
        Ok(())
    }

    fn configure_window(&mut self, window: Window, rect: Rect, border_width: u32) -> Result<()> {
        if let Some(w) = self.windows.get_mut(&window) {
            w.geometry = rect;
        }
        self.calls.push(Call::Configure(window, rect, border_width));
        Ok(())
    }

    fn move_resize_window(&mut self, window: Window, rect: Rect) -> Result<()> {
        if let Some(w) = self.windows.get_mut(&window) {
            w.geometry = rect;
        }
        self.calls.push(Call::MoveResize(window, rect));
        Ok(())
    }

    fn pass_configure_request(&mut self, request: &ConfigureRequest) -> Result<()> {
        if let Some(w) = self.windows.get_mut(&request.window) {
            let g = &mut w.geometry;
            g.x = request.x.unwrap_or(g.x);
            g.y = request.y.unwrap_or(g.y);
            g.w = request.w.unwrap_or(g.w);
            g.h = request.h.unwrap_or(g.h);
        }
        self.calls.push(Call::PassConfigure(request.window));
        Ok(())
    }

    fn set_border_color(&mut self, window: Window, color: BorderColor) -> Result<()> {
        self.calls.push(Call::Border(window, color));
        Ok(())
    }

    fn raise_window(&mut self, window: Window) -> Result<()> {
        self.calls.push(Call::Raise(window));
        Ok(())
    }

    fn restack_windows(&mut self, windows: &[Window]) -> Result<()> {
        self.calls.push(Call::Restack(windows.to_vec()));
        Ok(())
    }

    fn focus_window(&mut self, window: Window) -> Result<()> {
        self.calls.push(Call::Focus(window));
        Ok(())
    }

    fn select_client_events(&mut self, window: Window) -> Result<()> {
        self.calls.push(Call::SelectEvents(window));
        Ok(())
    }

    fn send_close_request(&mut self, window: Window) -> Result<()> {
        self.calls.push(Call::CloseRequest(window));
        Ok(())
    }

    fn kill_client(&mut self, window: Window) -> Result<()> {
        self.vanish(window);
        self.calls.push(Call::Kill(window));
        Ok(())
    }

    fn query_children(&mut self, root: Window) -> Result<Vec<Window>> {
        Ok(self.windows.keys().copied().filter(|w| *w != root).collect())
    }

    fn window_info(&mut self, window: Window) -> Result<Option<WindowInfo>> {
        let viewable = self.mapped.contains(&window);
        Ok(self.windows.get(&window).map(|w| WindowInfo {
            viewable,
            ..w.info.clone()
        }))
    }

    fn window_geometry(&mut self, window: Window) -> Result<Option<Rect>> {
        Ok(self.windows.get(&window).map(|w| w.geometry))
    }

    fn transient_for(&mut self, window: Window) -> Result<Option<Window>> {
        Ok(self.windows.get(&window).and_then(|w| w.info.transient_for))
    }

    fn size_hints(&mut self, window: Window) -> Result<Option<SizeHints>> {
        Ok(self.windows.get(&window).and_then(|w| w.hints))
    }

    fn set_property(
        &mut self,
        window: Window,
        property: Property,
        value: PropertyValue<'_>,
    ) -> Result<()> {
        let stored = match value {
            PropertyValue::Windows(w) => Stored::Windows(w.to_vec()),
            PropertyValue::Cardinals(c) => Stored::Cardinals(c.to_vec()),
            PropertyValue::Utf8(b) | PropertyValue::Text(b) => {
                Stored::Text(String::from_utf8_lossy(b).into_owned())
            }
        };
        self.properties.insert((window, property), stored);
        self.calls.push(Call::SetProperty(window, property));
        Ok(())
    }

    fn get_text_property(&mut self, window: Window, property: Property) -> Result<Option<String>> {
        Ok(self.text(window, property).map(str::to_owned))
    }
}

/// Remembers launched commands and hands out increasing pids starting at 101.
#[derive(Debug, Default)]
pub(crate) struct RecordingLauncher {
    pub launched: Vec<String>,
    last_pid: u32,
}

impl Launch for RecordingLauncher {
    fn launch(&mut self, command: &str) -> Result<u32> {
        self.launched.push(command.to_owned());
        self.last_pid = self.last_pid.max(100) + 1;
        Ok(self.last_pid)
    }
}
