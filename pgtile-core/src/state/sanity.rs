use crate::debug;
use crate::error::Result;
use crate::state::State;
use crate::surface::DisplaySurface;
use crate::util::vec_ops::discard;
use crate::Window;

impl State {
    /// Reconciles the graph with the windows that actually exist, returns how many clients
    /// were dropped.
    ///
    /// Catches destroy notifications that never arrived.
    pub fn sanity_sweep(&mut self, surface: &mut dyn DisplaySurface) -> Result<usize> {
        let mut removed = 0;
        for head in self.head_order.clone() {
            let live = surface.query_children(self.heads[head].root)?;
            let lost = self
                .clients
                .iter()
                .filter(|(_, c)| self.groups[c.group].head == head && !live.contains(&c.win))
                .map(|(id, _)| id)
                .collect::<Vec<_>>();
            for client in lost {
                debug!("Dropping client with vanished window {}", self.clients[client].win);
                self.client_remove(surface, client)?;
                removed += 1;
            }
            let h = &mut self.heads[head];
            h.above.retain(|w| live.contains(w));
            h.below.retain(|w| live.contains(w));
            h.fullscreen.retain(|w| live.contains(w));
        }
        Ok(removed)
    }

    /// Forgets a window in every head's layer lists.
    pub fn window_discard_references(&mut self, window: Window) {
        for h in self.heads.values_mut() {
            discard(&mut h.above, &window);
            discard(&mut h.below, &window);
            discard(&mut h.fullscreen, &window);
        }
    }
}
