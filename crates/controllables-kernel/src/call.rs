//! Call records: one entry per resolved call of a controlled method.
//!
//! [CallRecord] is what the call ledger stores. [CallSummary] is its serializable
//! projection for reports, without the arguments or the scripted values.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::exit::{Exit, ExitId, ExitKind};
use crate::fault::CheckedFaults;

/// One resolved call: when it started, what it was passed, and which exit answered it.
///
/// The timestamp is taken when the call is recorded, before the exit delay and before
/// any fault is raised.
#[derive(Debug)]
pub struct CallRecord<A, R, F> {
    /// Position in the ledger, starting at 0.
    pub sequence: u64,
    /// Start of the call.
    pub called_at: DateTime<Utc>,
    /// Snapshot of the call's arguments, in declaration order.
    pub arguments: A,
    /// The exit that resolved this call, shared with the exit queue.
    pub exit: Arc<Exit<R, F>>,
}

impl<A, R, F: CheckedFaults> CallRecord<A, R, F> {
    pub fn summary(&self) -> CallSummary {
        CallSummary {
            sequence: self.sequence,
            called_at: self.called_at,
            exit_id: self.exit.id(),
            kind: self.exit.kind(),
            delay_ms: u64::try_from(self.exit.delay().as_millis()).unwrap_or(u64::MAX),
            checked_slot: self.exit.checked_fault().map(CheckedFaults::slot),
        }
    }
}

/// Serializable digest of a [CallRecord].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSummary {
    pub sequence: u64,
    pub called_at: DateTime<Utc>,
    pub exit_id: ExitId,
    pub kind: ExitKind,
    pub delay_ms: u64,
    /// Declared slot (1-based) for checked exits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_slot: Option<usize>,
}
