use std::collections::BTreeSet;

/// Hands out small integer ids, always reusing the smallest free one.
#[derive(Clone, Debug, Default)]
pub struct IdMgr {
    /// Released ids below `next`.
    free: BTreeSet<usize>,
    /// Every id at or above this has never been handed out.
    next: usize,
}

impl IdMgr {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id the next call to `alloc` will hand out.
    #[must_use]
    pub fn avail(&self) -> usize {
        self.free.iter().next().copied().unwrap_or(self.next)
    }

    pub fn alloc(&mut self) -> usize {
        if let Some(id) = self.free.iter().next().copied() {
            self.free.remove(&id);
            id
        } else {
            self.next += 1;
            self.next - 1
        }
    }

    pub fn release(&mut self, id: usize) {
        assert!(
            id < self.next && !self.free.contains(&id),
            "id {} released while not in use",
            id
        );

        self.free.insert(id);

        // Keep `free` limited to the holes below the high-water mark.
        while self.next > 0 && self.free.remove(&(self.next - 1)) {
            self.next -= 1;
        }
    }

    #[must_use]
    pub fn in_use(&self, id: usize) -> bool {
        id < self.next && !self.free.contains(&id)
    }

    pub fn clear(&mut self) {
        self.free.clear();
        self.next = 0;
    }
}
