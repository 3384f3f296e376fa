//! Translates x11 events into the engine's vocabulary.
use x11rb::protocol::xproto::{
    AtomEnum, ClientMessageEvent, ConfigWindow, ConfigureRequestEvent, NotifyDetail, NotifyMode,
    Property, PropertyNotifyEvent,
};
use x11rb::protocol::Event as X11Event;
use x11rb::NONE;

use pgtile_core::command::events::{ClientMessage, Event, WatchedProperty};
use pgtile_core::surface::ConfigureRequest;

use crate::x11::call_wrapper::Atoms;

mod spawn;

pub(crate) use spawn::Spawner;

/// `None` for events the engine has no use for.
pub(crate) fn decode_event(atoms: &Atoms, event: &X11Event) -> Option<Event> {
    match event {
        X11Event::MapRequest(e) => Some(Event::MapRequest(e.window)),
        X11Event::MapNotify(e) => Some(Event::MapNotify(e.window)),
        X11Event::UnmapNotify(e) => Some(Event::UnmapNotify(e.window)),
        X11Event::DestroyNotify(e) => Some(Event::DestroyNotify(e.window)),
        X11Event::ConfigureRequest(e) => Some(Event::ConfigureRequest(configure_request(e))),
        X11Event::ConfigureNotify(e) => Some(Event::ConfigureNotify {
            window: e.window,
            width: i32::from(e.width),
            height: i32::from(e.height),
        }),
        X11Event::PropertyNotify(e) => property_notify(atoms, e),
        X11Event::CreateNotify(e) => Some(Event::CreateNotify(e.window)),
        X11Event::ClientMessage(e) => client_message(atoms, e),
        X11Event::EnterNotify(e) => (e.mode == NotifyMode::NORMAL
            && e.detail != NotifyDetail::INFERIOR)
            .then_some(Event::EnterNotify(e.event)),
        X11Event::ButtonPress(e) => {
            // Grabbed on a client or selected on a frame, the event window is the target
            let child = if e.event == e.root {
                (e.child != NONE).then_some(e.child)
            } else {
                Some(e.event)
            };
            Some(Event::ButtonPress {
                root: e.root,
                child,
            })
        }
        _ => None,
    }
}

fn configure_request(e: &ConfigureRequestEvent) -> ConfigureRequest {
    let mask = u32::from(e.value_mask);
    let has = |flag: ConfigWindow| mask & u32::from(flag) != 0;
    ConfigureRequest {
        window: e.window,
        x: has(ConfigWindow::X).then_some(i32::from(e.x)),
        y: has(ConfigWindow::Y).then_some(i32::from(e.y)),
        w: has(ConfigWindow::WIDTH).then_some(i32::from(e.width)),
        h: has(ConfigWindow::HEIGHT).then_some(i32::from(e.height)),
        border_width: has(ConfigWindow::BORDER_WIDTH).then_some(u32::from(e.border_width)),
        sibling: has(ConfigWindow::SIBLING).then_some(e.sibling),
        stack_mode: has(ConfigWindow::STACK_MODE).then_some(u32::from(e.stack_mode)),
    }
}

fn property_notify(atoms: &Atoms, e: &PropertyNotifyEvent) -> Option<Event> {
    if e.state != Property::NEW_VALUE {
        return None;
    }
    let property = if e.atom == u32::from(AtomEnum::WM_NAME) || e.atom == atoms.net_wm_name {
        WatchedProperty::Name
    } else if e.atom == atoms.pgtile_command {
        WatchedProperty::IpcCommand
    } else {
        return None;
    };
    Some(Event::PropertyNotify {
        window: e.window,
        property,
    })
}

fn client_message(atoms: &Atoms, e: &ClientMessageEvent) -> Option<Event> {
    let data = e.data.as_data32();
    let message = if e.type_ == atoms.net_active_window {
        ClientMessage::ActivateWindow
    } else if e.type_ == atoms.net_current_desktop {
        ClientMessage::CurrentDesktop(data[0])
    } else if e.type_ == atoms.net_close_window {
        ClientMessage::CloseWindow
    } else if e.type_ == atoms.net_number_of_desktops {
        ClientMessage::NumberOfDesktops(data[0])
    } else if e.type_ == atoms.wm_change_state {
        ClientMessage::ChangeState
    } else {
        pgtile_utils::debug!("Unhandled client message {e:?}");
        return None;
    };
    Some(Event::ClientMessage {
        window: e.window,
        message,
    })
}
