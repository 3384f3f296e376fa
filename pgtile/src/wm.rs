use std::time::Duration;

use x11rb::connection::Connection;
use x11rb::protocol::Event as X11Event;

use pgtile_core::config::Settings;
use pgtile_core::error::Error as CoreError;
use pgtile_core::state::State;

use crate::error::{Error, Result};
use crate::manager::{decode_event, Spawner};
use crate::x11::call_wrapper::CallWrapper;
use crate::x11::next_event;

// Arbitrarily chosen
const DEADLINE: Duration = Duration::from_millis(1000);

pub(crate) fn run_wm() -> Result<()> {
    #[cfg(feature = "config-file")]
    let settings = Settings::new()?;
    #[cfg(not(feature = "config-file"))]
    let settings = Settings::default();
    let (connection, screen_num) = x11rb::connect(None)?;
    let setup = connection.setup().clone();
    pgtile_utils::debug!("Connected");
    let screen = &setup.roots[screen_num];
    let mut call_wrapper = CallWrapper::new(connection, screen, &settings)?;
    pgtile_utils::debug!("Set up call wrapper");
    for screen in &setup.roots {
        call_wrapper.try_become_wm(screen)?;
    }
    pgtile_utils::debug!("Became wm");
    call_wrapper.set_default_manager_props(screen.root)?;
    let startup = settings.startup.clone();
    let mut state = State::new(settings);
    let mut spawner = Spawner::default();
    for (num, screen) in setup.roots.iter().enumerate() {
        let head = state.add_head(
            &mut call_wrapper,
            num,
            screen.root,
            i32::from(screen.width_in_pixels),
            i32::from(screen.height_in_pixels),
        )?;
        state.scan_windows(&mut call_wrapper, head)?;
    }
    pgtile_utils::debug!("Scanned existing windows");
    for line in startup {
        if let Some(msg) = state.run_command(&mut call_wrapper, &mut spawner, &line)? {
            tracing::info!("{line}: {msg}");
        }
    }
    state.ewmh_clients(&mut call_wrapper)?;
    state.ewmh_groups(&mut call_wrapper)?;
    call_wrapper.inner().flush()?;
    tracing::info!("Initialized, starting loop");
    let result = event_loop(&mut call_wrapper, &mut spawner, &mut state);
    for screen in &setup.roots {
        call_wrapper.reset_root_focus(screen.root)?;
    }
    match result {
        Err(Error::Core(CoreError::Quit)) => Err(Error::GracefulShutdown),
        other => other,
    }
}

fn event_loop(
    call_wrapper: &mut CallWrapper,
    spawner: &mut Spawner,
    state: &mut State,
) -> Result<()> {
    loop {
        while let Some(event) = next_event(call_wrapper.inner(), DEADLINE)? {
            handle_event(event, call_wrapper, spawner, state)?;
            call_wrapper.inner().flush()?;
        }
        // Catches destroy notifications that never arrived
        let _removed = state.sanity_sweep(call_wrapper)?;
        pgtile_utils::debug!("Sanity sweep dropped {_removed} clients");
        spawner.reap();
        call_wrapper.inner().flush()?;
    }
}

fn handle_event(
    event: X11Event,
    call_wrapper: &mut CallWrapper,
    spawner: &mut Spawner,
    state: &mut State,
) -> Result<()> {
    pgtile_utils::debug!("Got event {event:?}");
    match &event {
        X11Event::Error(_e) => {
            // Requests racing a window's destruction end up here
            pgtile_utils::debug!("Absorbed x11 error {_e:?}");
            return Ok(());
        }
        X11Event::EnterNotify(e) if call_wrapper.should_ignore_sequence(e.sequence) => {
            pgtile_utils::debug!("[Ignored]");
            return Ok(());
        }
        X11Event::ButtonPress(_) => call_wrapper.replay_pointer()?,
        _ => {}
    }
    let Some(event) = decode_event(&call_wrapper.atoms, &event) else {
        return Ok(());
    };
    state.handle_event(call_wrapper, spawner, event)?;
    call_wrapper.refresh_colors(&state.settings)
}
