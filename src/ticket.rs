//! Generation counter for one-shot background work.
//!
//! Each issued [`Ticket`] supersedes every earlier one from the same counter.
//! Work that finishes holding an outdated ticket is dropped by the caller.

/// Proof that a request was issued at a given generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct TicketCounter {
    latest: u64,
}

impl TicketCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding all outstanding ones
    pub fn issue(&mut self) -> Ticket {
        self.latest += 1;
        Ticket(self.latest)
    }

    /// True if nothing newer has been issued since `ticket`
    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest
    }

    /// Supersede everything without starting new work
    pub fn cancel_all(&mut self) {
        self.latest += 1;
    }
}
