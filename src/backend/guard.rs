use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Initial,
    Retry,
    Refresh,
    LoadMore,
}

/// Identifies one admitted fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub generation: u64,
    pub trigger: Trigger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Start(Ticket),
    Supersede { ticket: Ticket, superseded: Ticket },
    Busy,
    Throttled,
}

impl Admission {
    pub fn ticket(&self) -> Option<Ticket> {
        match self {
            Self::Start(ticket) | Self::Supersede { ticket, .. } => Some(*ticket),
            Self::Busy | Self::Throttled => None,
        }
    }
}

/// Single-flight and throttling bookkeeping for one session.
///
/// Only the most recently admitted ticket may complete; anything admitted
/// earlier has been superseded and its result must be dropped.
#[derive(Debug)]
pub struct ConcurrencyGuard {
    generation: u64,
    in_flight: Option<Ticket>,
    last_load_more: Option<Instant>,
    min_interval: Duration,
}

impl ConcurrencyGuard {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            generation: 0,
            in_flight: None,
            last_load_more: None,
            min_interval,
        }
    }
    pub fn in_flight(&self) -> Option<Ticket> {
        self.in_flight
    }
    pub fn admit(&mut self, trigger: Trigger, now: Instant) -> Admission {
        if trigger == Trigger::LoadMore {
            if self.in_flight.is_some() {
                return Admission::Busy;
            }
            if self
                .last_load_more
                .is_some_and(|last| now.duration_since(last) < self.min_interval)
            {
                return Admission::Throttled;
            }
            self.last_load_more = Some(now);
        }
        self.generation += 1;
        let ticket = Ticket {
            generation: self.generation,
            trigger,
        };
        match self.in_flight.replace(ticket) {
            Some(superseded) => Admission::Supersede { ticket, superseded },
            None => Admission::Start(ticket),
        }
    }
    /// Marks the ticket finished. Returns `false` for superseded tickets.
    pub fn complete(&mut self, ticket: Ticket) -> bool {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }
    /// Invalidates whatever is in flight.
    pub fn cancel(&mut self) -> Option<Ticket> {
        self.generation += 1;
        self.in_flight.take()
    }
}
