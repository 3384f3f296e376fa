#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod macros;

#[doc(hidden)]
pub use tracing;
