use std::io;

use x11rb::errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError};

pub(crate) type Result<T> = std::result::Result<T, Error>;
#[derive(thiserror::Error, Debug)]
pub(crate) enum Error {
    #[error(transparent)]
    Core(#[from] pgtile_core::error::Error),
    #[error(transparent)]
    X11Connect(#[from] ConnectError),
    #[error(transparent)]
    X11Connection(#[from] ConnectionError),
    #[error(transparent)]
    X11Reply(#[from] ReplyError),
    #[error(transparent)]
    X11IdCreation(#[from] ReplyOrIdError),
    #[error("Could not become wm, access denied, there is likely another WM running")]
    BecomeWm,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    NixPoll(#[from] nix::Error),
    #[error("No answer from a running {0} within the timeout")]
    IpcTimeout(&'static str),
    #[error("Exit triggered")]
    GracefulShutdown,
}

/// Wraps a connection level failure so that it can travel through the engine.
pub(crate) fn surface_error<E>(e: E) -> pgtile_core::error::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    pgtile_core::error::Error::Surface(Box::new(e))
}
