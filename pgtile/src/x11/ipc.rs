//! The short lived client side of the command exchange.
use std::time::{Duration, Instant};

use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ChangeWindowAttributesAux, ConnectionExt, CreateWindowAux, EventMask,
    PropMode, Property, Window, WindowClass,
};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::{COPY_DEPTH_FROM_PARENT, COPY_FROM_PARENT};

use pgtile_core::config::WINDOW_MANAGER_NAME;

use crate::error::{Error, Result};
use crate::x11::call_wrapper::Atoms;
use crate::x11::next_event;

const IPC_TIMEOUT: Duration = Duration::from_secs(5);

/// Hands `command` to the running instance through a marker window and returns its answer.
pub(crate) fn send_command(command: &str) -> Result<String> {
    let (connection, screen_num) = x11rb::connect(None)?;
    let root = connection.setup().roots[screen_num].root;
    let atoms = Atoms::intern(&connection)?;
    let marker = connection.generate_id()?;
    connection.create_window(
        COPY_DEPTH_FROM_PARENT,
        marker,
        root,
        0,
        0,
        1,
        1,
        0,
        WindowClass::INPUT_ONLY,
        COPY_FROM_PARENT,
        &CreateWindowAux::new(),
    )?;
    // Set before the manager looks at the window, requests are handled in order
    let class = format!("{WINDOW_MANAGER_NAME}\0{WINDOW_MANAGER_NAME}\0");
    connection.change_property8(
        PropMode::REPLACE,
        marker,
        AtomEnum::WM_CLASS,
        AtomEnum::STRING,
        class.as_bytes(),
    )?;
    connection.change_window_attributes(
        marker,
        &ChangeWindowAttributesAux::new().event_mask(EventMask::PROPERTY_CHANGE),
    )?;
    connection.flush()?;
    let answer = exchange(&connection, &atoms, marker, command);
    connection.destroy_window(marker)?;
    connection.flush()?;
    answer
}

fn exchange(
    connection: &RustConnection,
    atoms: &Atoms,
    marker: Window,
    command: &str,
) -> Result<String> {
    await_property(connection, marker, atoms.pgtile_ready)?;
    pgtile_utils::debug!("Instance ready, sending {command:?}");
    connection.change_property8(
        PropMode::REPLACE,
        marker,
        atoms.pgtile_command,
        AtomEnum::STRING,
        command.as_bytes(),
    )?;
    connection.flush()?;
    await_property(connection, marker, atoms.pgtile_result)?;
    let reply = connection
        .get_property(false, marker, atoms.pgtile_result, AtomEnum::ANY, 0, u32::MAX / 4)?
        .reply()?;
    Ok(String::from_utf8_lossy(&reply.value).into_owned())
}

fn await_property(connection: &RustConnection, window: Window, atom: Atom) -> Result<()> {
    let deadline = Instant::now() + IPC_TIMEOUT;
    loop {
        let left = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            return Err(Error::IpcTimeout(WINDOW_MANAGER_NAME));
        }
        if let Some(Event::PropertyNotify(evt)) = next_event(connection, left)? {
            if evt.window == window && evt.atom == atom && evt.state == Property::NEW_VALUE {
                return Ok(());
            }
        }
    }
}
