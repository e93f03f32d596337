use std::{
    fmt,
    sync::atomic::{AtomicBool, Ordering},
};

use shared::error::DaoError;
use tracing::{debug, warn};

use crate::ledger::ConfirmationPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    CreateProposal,
    Vote,
    Execute,
    Withdraw,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActionKind::CreateProposal => "create_proposal",
            ActionKind::Vote => "vote",
            ActionKind::Execute => "execute",
            ActionKind::Withdraw => "withdraw",
        })
    }
}

/// Owns the single in-flight token. The token doubles as the busy flag.
#[derive(Debug, Default)]
pub struct ActionDispatcher {
    in_flight: AtomicBool,
    confirmation: ConfirmationPolicy,
}

impl ActionDispatcher {
    pub fn new(confirmation: ConfirmationPolicy) -> Self {
        Self {
            in_flight: AtomicBool::new(false),
            confirmation,
        }
    }

    pub fn confirmation(&self) -> ConfirmationPolicy {
        self.confirmation
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn begin(&self, action: ActionKind) -> Result<InFlight<'_>, DaoError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(action = %action, "dispatcher: rejected while another action is pending");
            return Err(DaoError::ActionInFlight);
        }
        debug!(action = %action, "dispatcher: acquired");
        Ok(InFlight {
            flag: &self.in_flight,
            action,
        })
    }
}

/// Clears the busy flag when dropped, on success and failure alike.
pub struct InFlight<'a> {
    flag: &'a AtomicBool,
    action: ActionKind,
}

impl InFlight<'_> {
    pub fn action(&self) -> ActionKind {
        self.action
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        debug!(action = %self.action, "dispatcher: released");
    }
}
