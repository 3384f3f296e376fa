#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]
// X11 uses inconsistent integer types fairly interchangeably
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_lossless)]

use std::io::Read;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::error::Error;

mod error;
mod manager;
mod wm;
mod x11;

/// A tiling window manager with manually managed frames.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Send a command to the running instance and print its answer.
    #[arg(short = 'c', long = "command", conflicts_with = "stdin")]
    command: Option<String>,
    /// Read newline separated commands from stdin and send them to the running instance.
    #[arg(short = 'i', long = "stdin")]
    stdin: bool,
}

fn main() -> ExitCode {
    let default_level = if cfg!(feature = "debug") { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    let command = if args.stdin {
        let mut buf = String::new();
        if let Err(e) = std::io::stdin().read_to_string(&mut buf) {
            tracing::error!("Failed to read commands from stdin: {e}");
            return ExitCode::FAILURE;
        }
        Some(buf)
    } else {
        args.command
    };
    if let Some(command) = command {
        return match x11::ipc::send_command(&command) {
            Ok(answer) => {
                if !answer.is_empty() {
                    println!("{answer}");
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{e}");
                ExitCode::FAILURE
            }
        };
    }
    match wm::run_wm() {
        Ok(()) | Err(Error::GracefulShutdown) => {
            tracing::info!("Exiting WM");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Fatal error {e}");
            ExitCode::FAILURE
        }
    }
}
