use slotmap::{Key, SecondaryMap};

/// Walking direction around a ring.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Dir {
    Next,
    Prev,
}

#[derive(Debug, Copy, Clone)]
struct Link<K> {
    next: K,
    prev: K,
}

/// Circular doubly linked order over arena keys.
///
/// `first` is the entry with display id 0, new entries are appended before it so ring order
/// and id order always agree. `current` is the ring's cursor (the focused entry).
/// Display ids are never stored, [`Ring::position`] walks from `first`.
#[derive(Debug, Clone)]
pub struct Ring<K: Key> {
    links: SecondaryMap<K, Link<K>>,
    first: Option<K>,
    current: Option<K>,
}

impl<K: Key> Default for Ring<K> {
    fn default() -> Self {
        Self {
            links: SecondaryMap::new(),
            first: None,
            current: None,
        }
    }
}

impl<K: Key> Ring<K> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    #[must_use]
    pub fn contains(&self, key: K) -> bool {
        self.links.contains_key(key)
    }

    #[must_use]
    pub fn current(&self) -> Option<K> {
        self.current
    }

    #[must_use]
    pub fn first(&self) -> Option<K> {
        self.first
    }

    #[must_use]
    pub fn last(&self) -> Option<K> {
        self.first.map(|f| self.links[f].prev)
    }

    /// Moves the cursor, refuses keys that aren't members.
    pub fn focus(&mut self, key: K) -> bool {
        if self.links.contains_key(key) {
            self.current = Some(key);
            true
        } else {
            false
        }
    }

    /// Appends after the entry with the highest display id, the first entry also becomes current.
    pub fn push(&mut self, key: K) {
        if self.links.contains_key(key) {
            return;
        }
        match self.first {
            None => {
                self.links.insert(key, Link { next: key, prev: key });
                self.first = Some(key);
                self.current = Some(key);
            }
            Some(first) => {
                let last = self.links[first].prev;
                self.links.insert(key, Link { next: first, prev: last });
                self.links[last].next = key;
                self.links[first].prev = key;
            }
        }
    }

    /// Unlinks `key`, a removed cursor or first entry moves on to the next one.
    pub fn remove(&mut self, key: K) -> bool {
        let Some(link) = self.links.remove(key) else {
            return false;
        };
        if link.next == key {
            self.first = None;
            self.current = None;
            return true;
        }
        self.links[link.prev].next = link.next;
        self.links[link.next].prev = link.prev;
        if self.first == Some(key) {
            self.first = Some(link.next);
        }
        if self.current == Some(key) {
            self.current = Some(link.next);
        }
        true
    }

    #[must_use]
    pub fn next_of(&self, key: K) -> Option<K> {
        self.links.get(key).map(|l| l.next)
    }

    #[must_use]
    pub fn prev_of(&self, key: K) -> Option<K> {
        self.links.get(key).map(|l| l.prev)
    }

    #[must_use]
    pub fn step(&self, key: K, dir: Dir) -> Option<K> {
        match dir {
            Dir::Next => self.next_of(key),
            Dir::Prev => self.prev_of(key),
        }
    }

    /// Dense display id.
    #[must_use]
    pub fn position(&self, key: K) -> Option<usize> {
        self.iter().position(|k| k == key)
    }

    #[must_use]
    pub fn get(&self, position: usize) -> Option<K> {
        self.iter().nth(position)
    }

    /// Id order.
    pub fn iter(&self) -> RingWalk<'_, K> {
        self.walk_from(self.first, Dir::Next)
    }

    /// Starting at the cursor, once around.
    pub fn from_current(&self, dir: Dir) -> RingWalk<'_, K> {
        self.walk_from(self.current, dir)
    }

    /// Starting at `start` (inclusive), once around. Yields nothing for non-members.
    pub fn walk_from(&self, start: Option<K>, dir: Dir) -> RingWalk<'_, K> {
        let start = start.filter(|k| self.links.contains_key(*k));
        RingWalk {
            ring: self,
            start,
            next: start,
            dir,
        }
    }
}

pub struct RingWalk<'a, K: Key> {
    ring: &'a Ring<K>,
    start: Option<K>,
    next: Option<K>,
    dir: Dir,
}

impl<'a, K: Key> Iterator for RingWalk<'a, K> {
    type Item = K;

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.next?;
        let following = self.ring.step(cur, self.dir);
        self.next = following.filter(|k| Some(*k) != self.start);
        Some(cur)
    }
}

#[cfg(test)]
mod tests {
    use super::{Dir, Ring};
    use slotmap::{DefaultKey, SlotMap};

    fn keys(n: usize) -> Vec<DefaultKey> {
        let mut sm: SlotMap<DefaultKey, ()> = SlotMap::new();
        (0..n).map(|_| sm.insert(())).collect()
    }

    #[test]
    fn push_keeps_id_order_and_first_is_current() {
        let all = keys(4);
        let (k, key) = (&all[..3], all[3]);
        let mut ring = Ring::default();
        for key in k {
            ring.push(*key);
        }
        assert_eq!(k, ring.iter().collect::<Vec<_>>().as_slice());
        assert_eq!(Some(k[0]), ring.current());
        ring.focus(k[1]);
        ring.push(key);
        // Still appended after the highest id, not next to the cursor
        assert_eq!(Some(3), ring.position(key));
        assert_eq!(
            vec![k[1], k[2], key, k[0]],
            ring.from_current(Dir::Next).collect::<Vec<_>>()
        );
        assert_eq!(
            vec![k[1], k[0], key, k[2]],
            ring.from_current(Dir::Prev).collect::<Vec<_>>()
        );
    }

    #[test]
    fn remove_patches_neighbours_and_moves_cursor_forward() {
        let k = keys(3);
        let mut ring = Ring::default();
        for key in &k {
            ring.push(*key);
        }
        ring.focus(k[1]);
        assert!(ring.remove(k[1]));
        assert_eq!(Some(k[2]), ring.current());
        assert_eq!(Some(1), ring.position(k[2]));
        assert!(ring.remove(k[0]));
        assert_eq!(Some(k[2]), ring.first());
        assert!(ring.remove(k[2]));
        assert!(ring.is_empty());
        assert_eq!(None, ring.current());
        assert_eq!(0, ring.iter().count());
        assert!(!ring.remove(k[2]));
    }

    #[test]
    fn removing_last_entry_while_focused_wraps_to_first() {
        let k = keys(3);
        let mut ring = Ring::default();
        for key in &k {
            ring.push(*key);
        }
        ring.focus(k[2]);
        ring.remove(k[2]);
        assert_eq!(Some(k[0]), ring.current());
    }
}
