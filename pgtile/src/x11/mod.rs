use std::os::unix::io::AsRawFd;
use std::time::Duration;

use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags};
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;

use crate::error::Result;

pub(crate) mod call_wrapper;
pub(crate) mod ipc;

/// Next queued event, or whatever arrives within `timeout`.
///
/// `None` on timeout or when the socket only carried part of an event.
pub(crate) fn next_event(connection: &RustConnection, timeout: Duration) -> Result<Option<Event>> {
    if let Some(event) = connection.poll_for_event()? {
        return Ok(Some(event));
    }
    connection.flush()?;
    let mut fds = [PollFd::new(
        connection.stream().as_raw_fd(),
        PollFlags::POLLIN,
    )];
    let timeout = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
    match nix::poll::poll(&mut fds, timeout) {
        Ok(0) | Err(Errno::EINTR) => Ok(None),
        Ok(_) => Ok(connection.poll_for_event()?),
        Err(e) => Err(e.into()),
    }
}
