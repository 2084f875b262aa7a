//! Request lifecycle tickets
//!
//! Every load a view starts carries the generation it was issued under.
//! Invalidating bumps the generation so that results of requests started
//! before an unmount or a session change are dropped on arrival.

/// Proof that a request was started by the current generation of a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

#[derive(Debug, Default)]
pub struct Lifecycle {
    generation: u64,
}

impl Lifecycle {
    pub fn issue(&self) -> LoadTicket {
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Whether results carried by `ticket` may still be applied
    pub fn accepts(&self, ticket: LoadTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Drop every outstanding ticket
    pub fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalidation_rejects_earlier_tickets() {
        let mut lifecycle = Lifecycle::default();
        let before = lifecycle.issue();
        assert!(lifecycle.accepts(before));

        lifecycle.invalidate();
        assert!(!lifecycle.accepts(before));
        assert!(lifecycle.accepts(lifecycle.issue()));
    }
}
