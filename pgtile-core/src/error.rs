use core::fmt::Formatter;

use pgtile_utils::from_error;

pub type Result<T> = core::result::Result<T, Error>;

/// Boxed failure coming from whatever implements the display surface.
pub type SurfaceError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug)]
pub enum Error {
    Surface(SurfaceError),
    HeaplessPush(usize),
    LayoutParse { line: usize, reason: &'static str },
    Io(std::io::Error),
    /// Not a failure, unwinds the event loop on `quit`.
    Quit,
    #[cfg(feature = "config-file")]
    ConfigDirFind,
    #[cfg(feature = "config-file")]
    ConfigFileFind,
    #[cfg(feature = "config-file")]
    ConfigParse(toml::de::Error),
}
from_error!(SurfaceError, Error, Surface);
from_error!(std::io::Error, Error, Io);
#[cfg(feature = "config-file")]
from_error!(toml::de::Error, Error, ConfigParse);

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Surface(e) => f.write_fmt(format_args!("Display surface error {e}")),
            Error::HeaplessPush(u) => f.write_fmt(format_args!(
                "Failed to push to heapless datastructure, limit was {u}"
            )),
            Error::LayoutParse { line, reason } => f.write_fmt(format_args!(
                "Failed to parse layout at line {line}: {reason}"
            )),
            Error::Io(e) => f.write_fmt(format_args!("Io error {e}")),
            Error::Quit => f.write_str("Quit requested"),
            #[cfg(feature = "config-file")]
            Error::ConfigDirFind => f.write_str("Could not find config directory"),
            #[cfg(feature = "config-file")]
            Error::ConfigFileFind => f.write_str("Could not find config file"),
            #[cfg(feature = "config-file")]
            Error::ConfigParse(e) => f.write_fmt(format_args!("Failed to parse config {e}")),
        }
    }
}

impl std::error::Error for Error {}
