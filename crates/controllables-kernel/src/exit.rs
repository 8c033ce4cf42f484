//! Scripted exits: the ways one call of a controlled method can end.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ExitError;
use crate::fault::UncheckedFault;

/// Identifier of an exit, unique within one runtime and increasing in scripting order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExitId(pub u64);

impl fmt::Display for ExitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exit-{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitKind {
    Normal,
    Unchecked,
    Checked,
}

/// What an exit produces. Exactly one of return value or fault, by construction.
#[derive(Clone, Debug)]
pub enum ExitOutcome<R, F> {
    Return(R),
    Unchecked(UncheckedFault),
    Checked(F),
}

impl<R, F> ExitOutcome<R, F> {
    pub fn kind(&self) -> ExitKind {
        match self {
            ExitOutcome::Return(_) => ExitKind::Normal,
            ExitOutcome::Unchecked(_) => ExitKind::Unchecked,
            ExitOutcome::Checked(_) => ExitKind::Checked,
        }
    }
}

/// One scripted exit. Immutable once added to an exit queue; shared with every
/// call record it resolved.
#[derive(Debug)]
pub struct Exit<R, F> {
    id: ExitId,
    outcome: ExitOutcome<R, F>,
    delay: Duration,
}

impl<R, F> Exit<R, F> {
    pub(crate) fn new(id: ExitId, outcome: ExitOutcome<R, F>, delay: Duration) -> Self {
        Self { id, outcome, delay }
    }

    pub fn id(&self) -> ExitId {
        self.id
    }

    pub fn kind(&self) -> ExitKind {
        self.outcome.kind()
    }

    pub fn outcome(&self) -> &ExitOutcome<R, F> {
        &self.outcome
    }

    /// Time the executing caller waits before the outcome is delivered.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn return_value(&self) -> Option<&R> {
        match &self.outcome {
            ExitOutcome::Return(value) => Some(value),
            _ => None,
        }
    }

    pub fn unchecked_fault(&self) -> Option<&UncheckedFault> {
        match &self.outcome {
            ExitOutcome::Unchecked(fault) => Some(fault),
            _ => None,
        }
    }

    pub fn checked_fault(&self) -> Option<&F> {
        match &self.outcome {
            ExitOutcome::Checked(fault) => Some(fault),
            _ => None,
        }
    }
}

impl<R: Clone, F: Clone> Exit<R, F> {
    /// Produces this exit's outcome for one call. The exit itself is left untouched
    /// so a sticky exit can resolve again.
    pub(crate) fn resolve(&self) -> Result<R, ExitError<F>> {
        match &self.outcome {
            ExitOutcome::Return(value) => Ok(value.clone()),
            ExitOutcome::Unchecked(fault) => Err(ExitError::Unchecked(fault.clone())),
            ExitOutcome::Checked(fault) => Err(ExitError::Checked(fault.clone())),
        }
    }
}
