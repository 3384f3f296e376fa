use x11rb::connection::Connection;
use x11rb::connection::SequenceNumber;
use x11rb::errors::ReplyError;
use x11rb::properties::{WmClass, WmHints, WmSizeHints};
use x11rb::protocol::xproto::{
    Allow, Atom, AtomEnum, ButtonIndex, ChangeWindowAttributesAux, ClientMessageEvent,
    ConfigureWindowAux, ConnectionExt, CreateWindowAux, EventMask, GetPropertyReply, GrabMode,
    InputFocus, MapState, ModMask, PropMode, Screen, StackMode, Window, WindowClass,
};
use x11rb::protocol::ErrorKind;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::{COPY_DEPTH_FROM_PARENT, COPY_FROM_PARENT, CURRENT_TIME, NONE};

use pgtile_core::config::{Settings, WINDOW_MANAGER_NAME};
use pgtile_core::geometry::hints::SizeHints;
use pgtile_core::geometry::Rect;
use pgtile_core::surface::{
    BorderColor, ConfigureRequest, DisplaySurface, NetState, NetStateAtom, Property,
    PropertyValue, WindowInfo, WindowKind,
};

use pgtile_utils::debug;

use crate::error::{surface_error, Error, Result};

type CoreResult<T> = pgtile_core::error::Result<T>;

macro_rules! impl_atoms {
    ($( $const_name:ident, $field:ident, $is_ewmh: expr),* ) => {
        /// Every atom the manager talks about, interned once at startup.
        #[derive(Debug, Copy, Clone)]
        pub(crate) struct Atoms {
        $(
            pub(crate) $field: Atom,
        )*
        }

        impl Atoms {
            pub(crate) fn intern(connection: &RustConnection) -> Result<Self> {
                // Send everything before waiting on the first reply
                $(
                    let $field = connection.intern_atom(false, stringify!($const_name).as_bytes())?;
                )*
                Ok(Self {
                $(
                    $field: $field.reply()?.atom,
                )*
                })
            }

            /// Atoms announced in `_NET_SUPPORTED`.
            pub(crate) fn supported(&self) -> Vec<Atom> {
                [$( (self.$field, $is_ewmh), )*]
                    .into_iter()
                    .filter_map(|(atom, ewmh)| ewmh.then_some(atom))
                    .collect()
            }
        }
    };
}

impl_atoms!(
    WM_PROTOCOLS,
    wm_protocols,
    false,
    WM_DELETE_WINDOW,
    wm_delete_window,
    false,
    WM_TAKE_FOCUS,
    wm_take_focus,
    false,
    WM_CHANGE_STATE,
    wm_change_state,
    false,
    WM_WINDOW_ROLE,
    wm_window_role,
    false,
    UTF8_STRING,
    utf8_string,
    false,
    _NET_SUPPORTED,
    net_supported,
    true,
    _NET_SUPPORTING_WM_CHECK,
    net_supporting_wm_check,
    true,
    _NET_CLIENT_LIST,
    net_client_list,
    true,
    _NET_CLIENT_LIST_STACKING,
    net_client_list_stacking,
    true,
    _NET_ACTIVE_WINDOW,
    net_active_window,
    true,
    _NET_NUMBER_OF_DESKTOPS,
    net_number_of_desktops,
    true,
    _NET_DESKTOP_NAMES,
    net_desktop_names,
    true,
    _NET_CURRENT_DESKTOP,
    net_current_desktop,
    true,
    _NET_DESKTOP_GEOMETRY,
    net_desktop_geometry,
    true,
    _NET_WM_DESKTOP,
    net_wm_desktop,
    true,
    _NET_CLOSE_WINDOW,
    net_close_window,
    true,
    _NET_WM_NAME,
    net_wm_name,
    true,
    _NET_WM_PID,
    net_wm_pid,
    true,
    _NET_WM_WINDOW_TYPE,
    net_wm_window_type,
    true,
    _NET_WM_WINDOW_TYPE_NORMAL,
    net_wm_window_type_normal,
    true,
    _NET_WM_WINDOW_TYPE_UTILITY,
    net_wm_window_type_utility,
    true,
    _NET_WM_WINDOW_TYPE_TOOLBAR,
    net_wm_window_type_toolbar,
    true,
    _NET_WM_WINDOW_TYPE_MENU,
    net_wm_window_type_menu,
    true,
    _NET_WM_WINDOW_TYPE_DIALOG,
    net_wm_window_type_dialog,
    true,
    _NET_WM_STATE,
    net_wm_state,
    true,
    _NET_WM_STATE_FULLSCREEN,
    net_wm_state_fullscreen,
    true,
    _NET_WM_STATE_HIDDEN,
    net_wm_state_hidden,
    true,
    _NET_WM_STATE_ABOVE,
    net_wm_state_above,
    true,
    _NET_WM_STATE_BELOW,
    net_wm_state_below,
    true,
    _NET_WM_STATE_SKIP_TASKBAR,
    net_wm_state_skip_taskbar,
    true,
    _NET_WM_STATE_SKIP_PAGER,
    net_wm_state_skip_pager,
    true,
    _NET_WM_STATE_MODAL,
    net_wm_state_modal,
    true,
    _NET_WM_STATE_DEMANDS_ATTENTION,
    net_wm_state_demands_attention,
    true,
    PGTILE_TYPE,
    pgtile_type,
    false,
    PGTILE_COMMAND,
    pgtile_command,
    false,
    PGTILE_RESULT,
    pgtile_result,
    false,
    PGTILE_READY,
    pgtile_ready,
    false
);

/// Names and allocated pixels of the six border colours, in [`BorderColor`] order.
struct BorderPixels {
    names: [String; 6],
    pixels: [u32; 6],
}

const fn color_slot(color: BorderColor) -> usize {
    match color {
        BorderColor::Focus => 0,
        BorderColor::Unfocus => 1,
        BorderColor::DedicateFocus => 2,
        BorderColor::DedicateUnfocus => 3,
        BorderColor::CatchallFocus => 4,
        BorderColor::CatchallUnfocus => 5,
    }
}

fn color_names(settings: &Settings) -> [&str; 6] {
    [
        settings.border_focus.as_str(),
        settings.border_unfocus.as_str(),
        settings.border_dedicate_focus.as_str(),
        settings.border_dedicate_unfocus.as_str(),
        settings.border_catchall_focus.as_str(),
        settings.border_catchall_unfocus.as_str(),
    ]
}

/// How many request sequence numbers are remembered for ignoring their side effects.
const IGNORED_SEQUENCES: usize = 64;

/// Sequence numbers of our own requests, events they cause are skipped.
struct IgnoredSequences(heapless::Deque<u16, IGNORED_SEQUENCES>);

impl IgnoredSequences {
    const fn new() -> Self {
        Self(heapless::Deque::new())
    }

    fn push(&mut self, sequence: SequenceNumber) {
        if self.0.is_full() {
            self.0.pop_front();
        }
        // Events only carry the low 16 bits
        let _ = self.0.push_back(sequence as u16);
    }

    fn should_ignore(&mut self, sequence: u16) -> bool {
        let mut should_ignore = false;
        while let Some(to_ignore) = self.0.front() {
            // Sequence numbers wrap, values within half the range below count as passed
            if to_ignore.wrapping_sub(sequence) <= u16::MAX / 2 {
                should_ignore = *to_ignore == sequence;
                break;
            }
            self.0.pop_front();
        }
        should_ignore
    }
}

pub(crate) struct CallWrapper {
    connection: RustConnection,
    pub(crate) atoms: Atoms,
    colormap: u32,
    colors: BorderPixels,
    sequences_to_ignore: IgnoredSequences,
}

/// Turns a reply error about a window that went away into `None`.
fn absorb<T>(res: std::result::Result<T, ReplyError>) -> CoreResult<Option<T>> {
    match res {
        Ok(t) => Ok(Some(t)),
        Err(ReplyError::X11Error(_e)) => {
            debug!("Absorbed x11 error {_e:?}");
            Ok(None)
        }
        Err(ReplyError::ConnectionError(e)) => Err(surface_error(e)),
    }
}

fn first_u32(reply: &GetPropertyReply) -> Option<u32> {
    reply.value32().and_then(|mut v| v.next())
}

impl CallWrapper {
    pub(crate) fn new(connection: RustConnection, screen: &Screen, settings: &Settings) -> Result<Self> {
        let atoms = Atoms::intern(&connection)?;
        let mut call_wrapper = Self {
            connection,
            atoms,
            colormap: screen.default_colormap,
            colors: BorderPixels {
                names: Default::default(),
                pixels: [screen.black_pixel; 6],
            },
            sequences_to_ignore: IgnoredSequences::new(),
        };
        call_wrapper.refresh_colors(settings)?;
        Ok(call_wrapper)
    }

    pub(crate) fn inner(&self) -> &RustConnection {
        &self.connection
    }

    /// Allocates pixels for border colours whose names changed since the last call.
    ///
    /// Names the server doesn't know keep the previous pixel.
    pub(crate) fn refresh_colors(&mut self, settings: &Settings) -> Result<()> {
        for (slot, name) in color_names(settings).into_iter().enumerate() {
            if self.colors.names[slot] == name {
                continue;
            }
            let pixel = match self
                .connection
                .alloc_named_color(self.colormap, name.as_bytes())?
                .reply()
            {
                Ok(reply) => reply.pixel,
                Err(ReplyError::X11Error(_)) => {
                    tracing::warn!("Unknown colour {name:?}, keeping the previous one");
                    self.colors.names[slot] = name.to_owned();
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            debug!("Allocated colour {name} as {pixel}");
            self.colors.names[slot] = name.to_owned();
            self.colors.pixels[slot] = pixel;
        }
        Ok(())
    }

    pub(crate) fn try_become_wm(&self, screen: &Screen) -> Result<()> {
        let change = ChangeWindowAttributesAux::default().event_mask(
            EventMask::SUBSTRUCTURE_REDIRECT
                | EventMask::SUBSTRUCTURE_NOTIFY
                | EventMask::STRUCTURE_NOTIFY
                | EventMask::PROPERTY_CHANGE
                | EventMask::BUTTON_PRESS,
        );
        let res = self
            .connection
            .change_window_attributes(screen.root, &change)?
            .check();
        match res {
            Ok(()) => Ok(()),
            Err(ReplyError::X11Error(ref error)) if error.error_kind == ErrorKind::Access => {
                tracing::error!("Failed to start WM because another WM is running");
                Err(Error::BecomeWm)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// `_NET_SUPPORTED` and the `_NET_SUPPORTING_WM_CHECK` window on the root.
    pub(crate) fn set_default_manager_props(&self, root: Window) -> Result<Window> {
        self.connection.change_property32(
            PropMode::REPLACE,
            root,
            self.atoms.net_supported,
            AtomEnum::ATOM,
            &self.atoms.supported(),
        )?;
        let check_win = self.connection.generate_id()?;
        self.connection.create_window(
            COPY_DEPTH_FROM_PARENT,
            check_win,
            root,
            -1,
            -1,
            1,
            1,
            0,
            WindowClass::INPUT_ONLY,
            COPY_FROM_PARENT,
            &CreateWindowAux::new().override_redirect(1),
        )?;
        for win in [root, check_win] {
            self.connection.change_property32(
                PropMode::REPLACE,
                win,
                self.atoms.net_supporting_wm_check,
                AtomEnum::WINDOW,
                &[check_win],
            )?;
        }
        self.connection.change_property8(
            PropMode::REPLACE,
            check_win,
            self.atoms.net_wm_name,
            self.atoms.utf8_string,
            WINDOW_MANAGER_NAME.as_bytes(),
        )?;
        Ok(check_win)
    }

    /// Hands focus back to the root on exit.
    pub(crate) fn reset_root_focus(&self, root: Window) -> Result<()> {
        self.connection
            .delete_property(root, self.atoms.net_active_window)?;
        self.connection.set_input_focus(
            InputFocus::POINTER_ROOT,
            u32::from(InputFocus::POINTER_ROOT),
            CURRENT_TIME,
        )?;
        self.connection.flush()?;
        Ok(())
    }

    /// Lets a click that focused a client through to it.
    pub(crate) fn replay_pointer(&self) -> Result<()> {
        self.connection
            .allow_events(Allow::REPLAY_POINTER, CURRENT_TIME)?;
        Ok(())
    }

    fn push_sequence(&mut self, sequence: SequenceNumber) {
        self.sequences_to_ignore.push(sequence);
    }

    /// Whether an `EnterNotify` was caused by a map, unmap or configure we sent.
    pub(crate) fn should_ignore_sequence(&mut self, sequence: u16) -> bool {
        self.sequences_to_ignore.should_ignore(sequence)
    }

    fn property(
        &self,
        window: Window,
        property: Atom,
        type_: impl Into<Atom>,
    ) -> CoreResult<Option<GetPropertyReply>> {
        let cookie = self
            .connection
            .get_property(false, window, property, type_, 0, u32::MAX / 4)
            .map_err(surface_error)?;
        Ok(absorb(cookie.reply())?.filter(|reply| reply.type_ != NONE))
    }

    fn property_u32s(
        &self,
        window: Window,
        property: Atom,
        type_: impl Into<Atom>,
    ) -> CoreResult<Vec<u32>> {
        Ok(self
            .property(window, property, type_)?
            .and_then(|reply| reply.value32().map(Iterator::collect))
            .unwrap_or_default())
    }

    fn property_text(&self, window: Window, property: Atom) -> CoreResult<Option<String>> {
        Ok(self
            .property(window, property, AtomEnum::ANY)?
            .map(|reply| String::from_utf8_lossy(&reply.value).into_owned()))
    }

    fn supports_protocol(&self, window: Window, protocol: Atom) -> CoreResult<bool> {
        Ok(self
            .property_u32s(window, self.atoms.wm_protocols, AtomEnum::ATOM)?
            .contains(&protocol))
    }

    fn send_protocol_message(&self, window: Window, protocol: Atom) -> CoreResult<()> {
        let event = ClientMessageEvent::new(
            32,
            window,
            self.atoms.wm_protocols,
            [protocol, CURRENT_TIME, 0, 0, 0],
        );
        self.connection
            .send_event(false, window, EventMask::NO_EVENT, event)
            .map_err(surface_error)?;
        Ok(())
    }

    fn window_kind(&self, window: Window) -> CoreResult<WindowKind> {
        let types = self.property_u32s(window, self.atoms.net_wm_window_type, AtomEnum::ATOM)?;
        if types.is_empty() {
            return Ok(WindowKind::Unset);
        }
        let manageable = [
            self.atoms.net_wm_window_type_normal,
            self.atoms.net_wm_window_type_utility,
            self.atoms.net_wm_window_type_toolbar,
            self.atoms.net_wm_window_type_menu,
            self.atoms.net_wm_window_type_dialog,
        ];
        Ok(if types.iter().any(|t| manageable.contains(t)) {
            WindowKind::Manageable
        } else {
            WindowKind::Other
        })
    }

    fn net_state(&self, window: Window) -> CoreResult<NetState> {
        let known = [
            (self.atoms.net_wm_state_fullscreen, NetStateAtom::Fullscreen),
            (self.atoms.net_wm_state_hidden, NetStateAtom::Hidden),
            (self.atoms.net_wm_state_above, NetStateAtom::Above),
            (self.atoms.net_wm_state_below, NetStateAtom::Below),
            (self.atoms.net_wm_state_skip_taskbar, NetStateAtom::SkipTaskbar),
            (self.atoms.net_wm_state_skip_pager, NetStateAtom::SkipPager),
            (self.atoms.net_wm_state_modal, NetStateAtom::Modal),
            (
                self.atoms.net_wm_state_demands_attention,
                NetStateAtom::DemandsAttention,
            ),
        ];
        let set = self.property_u32s(window, self.atoms.net_wm_state, AtomEnum::ATOM)?;
        let atoms = known
            .into_iter()
            .filter(|(atom, _)| set.contains(atom))
            .map(|(_, state)| state)
            .collect::<Vec<_>>();
        Ok(NetState::from_atoms(&atoms))
    }

    fn property_target(&self, property: Property) -> Atom {
        match property {
            Property::ClientList => self.atoms.net_client_list,
            Property::ClientListStacking => self.atoms.net_client_list_stacking,
            Property::ActiveWindow => self.atoms.net_active_window,
            Property::NumberOfDesktops => self.atoms.net_number_of_desktops,
            Property::DesktopNames => self.atoms.net_desktop_names,
            Property::CurrentDesktop => self.atoms.net_current_desktop,
            Property::DesktopGeometry => self.atoms.net_desktop_geometry,
            Property::WmDesktop => self.atoms.net_wm_desktop,
            Property::MarkerType => self.atoms.pgtile_type,
            Property::IpcReady => self.atoms.pgtile_ready,
            Property::IpcCommand => self.atoms.pgtile_command,
            Property::IpcResult => self.atoms.pgtile_result,
        }
    }
}

impl DisplaySurface for CallWrapper {
    fn create_frame_window(&mut self, root: Window, rect: Rect, border_width: u32) -> CoreResult<Window> {
        let win = self
            .connection
            .generate_id()
            .map_err(surface_error)?;
        let aux = CreateWindowAux::new()
            .override_redirect(1)
            .border_pixel(self.colors.pixels[color_slot(BorderColor::Unfocus)])
            .event_mask(EventMask::BUTTON_PRESS | EventMask::ENTER_WINDOW);
        self.connection
            .create_window(
                COPY_DEPTH_FROM_PARENT,
                win,
                root,
                rect.x as i16,
                rect.y as i16,
                rect.w.max(1) as u16,
                rect.h.max(1) as u16,
                border_width as u16,
                WindowClass::INPUT_OUTPUT,
                COPY_FROM_PARENT,
                &aux,
            )
            .map_err(surface_error)?;
        let class = format!("{WINDOW_MANAGER_NAME}\0{WINDOW_MANAGER_NAME}\0");
        self.connection
            .change_property8(
                PropMode::REPLACE,
                win,
                AtomEnum::WM_CLASS,
                AtomEnum::STRING,
                class.as_bytes(),
            )
            .map_err(surface_error)?;
        Ok(win)
    }

    fn destroy_window(&mut self, window: Window) -> CoreResult<()> {
        self.connection
            .destroy_window(window)
            .map_err(surface_error)?;
        Ok(())
    }

    fn map_window(&mut self, window: Window) -> CoreResult<()> {
        let seq = self
            .connection
            .map_window(window)
            .map_err(surface_error)?
            .sequence_number();
        self.push_sequence(seq);
        Ok(())
    }

    fn unmap_window(&mut self, window: Window) -> CoreResult<()> {
        let seq = self
            .connection
            .unmap_window(window)
            .map_err(surface_error)?
            .sequence_number();
        self.push_sequence(seq);
        Ok(())
    }

    fn configure_window(&mut self, window: Window, rect: Rect, border_width: u32) -> CoreResult<()> {
        let cfg = ConfigureWindowAux::new()
            .x(rect.x)
            .y(rect.y)
            .width(rect.w.max(1) as u32)
            .height(rect.h.max(1) as u32)
            .border_width(border_width);
        let seq = self
            .connection
            .configure_window(window, &cfg)
            .map_err(surface_error)?
            .sequence_number();
        self.push_sequence(seq);
        Ok(())
    }

    fn move_resize_window(&mut self, window: Window, rect: Rect) -> CoreResult<()> {
        let cfg = ConfigureWindowAux::new()
            .x(rect.x)
            .y(rect.y)
            .width(rect.w.max(1) as u32)
            .height(rect.h.max(1) as u32);
        let seq = self
            .connection
            .configure_window(window, &cfg)
            .map_err(surface_error)?
            .sequence_number();
        self.push_sequence(seq);
        Ok(())
    }

    fn pass_configure_request(&mut self, request: &ConfigureRequest) -> CoreResult<()> {
        let cfg = ConfigureWindowAux::new()
            .x(request.x)
            .y(request.y)
            .width(request.w.map(|w| w as u32))
            .height(request.h.map(|h| h as u32))
            .border_width(request.border_width)
            .sibling(request.sibling)
            .stack_mode(request.stack_mode.map(|m| StackMode::from(m as u8)));
        self.connection
            .configure_window(request.window, &cfg)
            .map_err(surface_error)?;
        Ok(())
    }

    fn set_border_color(&mut self, window: Window, color: BorderColor) -> CoreResult<()> {
        let cw = ChangeWindowAttributesAux::new().border_pixel(self.colors.pixels[color_slot(color)]);
        self.connection
            .change_window_attributes(window, &cw)
            .map_err(surface_error)?;
        Ok(())
    }

    fn raise_window(&mut self, window: Window) -> CoreResult<()> {
        let cfg = ConfigureWindowAux::new().stack_mode(StackMode::ABOVE);
        let seq = self
            .connection
            .configure_window(window, &cfg)
            .map_err(surface_error)?
            .sequence_number();
        self.push_sequence(seq);
        Ok(())
    }

    fn restack_windows(&mut self, windows: &[Window]) -> CoreResult<()> {
        let mut above = None;
        for win in windows {
            let cfg = match above {
                None => ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
                Some(sibling) => ConfigureWindowAux::new()
                    .sibling(sibling)
                    .stack_mode(StackMode::BELOW),
            };
            let seq = self
                .connection
                .configure_window(*win, &cfg)
                .map_err(surface_error)?
                .sequence_number();
            self.push_sequence(seq);
            above = Some(*win);
        }
        Ok(())
    }

    fn focus_window(&mut self, window: Window) -> CoreResult<()> {
        self.connection
            .set_input_focus(InputFocus::POINTER_ROOT, window, CURRENT_TIME)
            .map_err(surface_error)?;
        if self.supports_protocol(window, self.atoms.wm_take_focus)? {
            self.send_protocol_message(window, self.atoms.wm_take_focus)?;
        }
        Ok(())
    }

    fn select_client_events(&mut self, window: Window) -> CoreResult<()> {
        let cw = ChangeWindowAttributesAux::new().event_mask(
            EventMask::ENTER_WINDOW | EventMask::PROPERTY_CHANGE,
        );
        self.connection
            .change_window_attributes(window, &cw)
            .map_err(surface_error)?;
        // Synchronous so the click can be replayed once focus moved
        self.connection
            .grab_button(
                false,
                window,
                EventMask::BUTTON_PRESS,
                GrabMode::SYNC,
                GrabMode::ASYNC,
                NONE,
                NONE,
                ButtonIndex::ANY,
                ModMask::ANY,
            )
            .map_err(surface_error)?;
        Ok(())
    }

    fn send_close_request(&mut self, window: Window) -> CoreResult<()> {
        if self.supports_protocol(window, self.atoms.wm_delete_window)? {
            debug!("Sending delete for {window}");
            self.send_protocol_message(window, self.atoms.wm_delete_window)
        } else {
            self.kill_client(window)
        }
    }

    fn kill_client(&mut self, window: Window) -> CoreResult<()> {
        self.connection
            .kill_client(window)
            .map_err(surface_error)?;
        Ok(())
    }

    fn query_children(&mut self, root: Window) -> CoreResult<Vec<Window>> {
        let cookie = self.connection.query_tree(root).map_err(surface_error)?;
        Ok(absorb(cookie.reply())?.map(|tree| tree.children).unwrap_or_default())
    }

    fn window_info(&mut self, window: Window) -> CoreResult<Option<WindowInfo>> {
        let attributes = self
            .connection
            .get_window_attributes(window)
            .map_err(surface_error)?;
        let geometry = self
            .connection
            .get_geometry(window)
            .map_err(surface_error)?;
        let (Some(attributes), Some(geometry)) =
            (absorb(attributes.reply())?, absorb(geometry.reply())?)
        else {
            return Ok(None);
        };
        let class = WmClass::get(&self.connection, window).map_err(surface_error)?;
        let hints = WmHints::get(&self.connection, window).map_err(surface_error)?;
        let class = absorb(class.reply())?
            .flatten()
            .map(|c| String::from_utf8_lossy(c.class()).into_owned())
            .unwrap_or_default();
        let input = absorb(hints.reply())?
            .flatten()
            .and_then(|h| h.input)
            .unwrap_or(true);
        let name = match self.property_text(window, self.atoms.net_wm_name)? {
            Some(name) => name,
            None => self
                .property_text(window, AtomEnum::WM_NAME.into())?
                .unwrap_or_default(),
        };
        let marked_client = self
            .property_text(window, self.atoms.pgtile_type)?
            .is_some_and(|t| t == "client");
        Ok(Some(WindowInfo {
            root: geometry.root,
            override_redirect: attributes.override_redirect,
            viewable: attributes.map_state == MapState::VIEWABLE,
            transient_for: self.transient_for(window)?,
            name,
            class,
            role: self
                .property_text(window, self.atoms.wm_window_role)?
                .unwrap_or_default(),
            pid: self
                .property(window, self.atoms.net_wm_pid, AtomEnum::CARDINAL)?
                .as_ref()
                .and_then(first_u32),
            kind: self.window_kind(window)?,
            net_state: self.net_state(window)?,
            input,
            marked_client,
        }))
    }

    fn window_geometry(&mut self, window: Window) -> CoreResult<Option<Rect>> {
        let cookie = self
            .connection
            .get_geometry(window)
            .map_err(surface_error)?;
        Ok(absorb(cookie.reply())?.map(|g| {
            Rect::new(
                i32::from(g.x),
                i32::from(g.y),
                i32::from(g.width),
                i32::from(g.height),
            )
        }))
    }

    fn transient_for(&mut self, window: Window) -> CoreResult<Option<Window>> {
        Ok(self
            .property(window, AtomEnum::WM_TRANSIENT_FOR.into(), AtomEnum::WINDOW)?
            .as_ref()
            .and_then(first_u32)
            .filter(|w| *w != NONE))
    }

    fn size_hints(&mut self, window: Window) -> CoreResult<Option<SizeHints>> {
        let cookie = WmSizeHints::get_normal_hints(&self.connection, window).map_err(surface_error)?;
        Ok(absorb(cookie.reply())?.flatten().map(|h| SizeHints {
            min: h.min_size,
            max: h.max_size,
            base: h.base_size,
            increment: h.size_increment,
            aspect: h.aspect.map(|(min, max)| {
                (
                    (min.numerator, min.denominator),
                    (max.numerator, max.denominator),
                )
            }),
        }))
    }

    fn set_property(
        &mut self,
        window: Window,
        property: Property,
        value: PropertyValue<'_>,
    ) -> CoreResult<()> {
        let atom = self.property_target(property);
        match value {
            PropertyValue::Windows(windows) => {
                self.connection
                    .change_property32(PropMode::REPLACE, window, atom, AtomEnum::WINDOW, windows)
                    .map_err(surface_error)?;
            }
            PropertyValue::Cardinals(values) => {
                self.connection
                    .change_property32(PropMode::REPLACE, window, atom, AtomEnum::CARDINAL, values)
                    .map_err(surface_error)?;
            }
            PropertyValue::Utf8(bytes) => {
                self.connection
                    .change_property8(PropMode::REPLACE, window, atom, self.atoms.utf8_string, bytes)
                    .map_err(surface_error)?;
            }
            PropertyValue::Text(bytes) => {
                self.connection
                    .change_property8(PropMode::REPLACE, window, atom, AtomEnum::STRING, bytes)
                    .map_err(surface_error)?;
            }
        }
        Ok(())
    }

    fn get_text_property(&mut self, window: Window, property: Property) -> CoreResult<Option<String>> {
        self.property_text(window, self.property_target(property))
    }
}
