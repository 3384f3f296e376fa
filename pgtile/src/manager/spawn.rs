use std::process::{Child, Command, Stdio};

use pgtile_core::surface::Launch;

/// Starts user commands through `sh` and reaps them once they exit.
#[derive(Debug, Default)]
pub(crate) struct Spawner {
    children: Vec<Child>,
}

impl Spawner {
    /// Drops children that have exited, returns how many are still running.
    pub(crate) fn reap(&mut self) -> usize {
        self.children
            .retain_mut(|child| matches!(child.try_wait(), Ok(None)));
        self.children.len()
    }
}

impl Launch for Spawner {
    fn launch(&mut self, command: &str) -> pgtile_core::error::Result<u32> {
        // `exec` keeps the pid equal to the program's, new windows are matched on it
        let child = Command::new("sh")
            .arg("-c")
            .arg(format!("exec {command}"))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        let pid = child.id();
        pgtile_utils::debug!("Spawned {command:?} as {pid}");
        self.children.push(child);
        Ok(pid)
    }
}
