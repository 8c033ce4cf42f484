//! Controllables kernel.
//!
//! State-machine core of a controlled method: an exit queue of scripted outcomes
//! (consumed oldest first, the last one kept as the sticky default), an append-only
//! call ledger, and the [MethodRuntime] tying both together with the
//! consume/record/wait/resolve protocol. The typed scripting and forwarding
//! surfaces live in `controllables-runtime`.

pub mod call;
pub mod config;
pub mod error;
pub mod exit;
pub mod exit_queue;
pub mod fault;
pub mod ledger;
pub mod runtime;

pub use call::{CallRecord, CallSummary};
pub use config::ControlConfig;
pub use error::{ControlError, ExitError};
pub use exit::{Exit, ExitId, ExitKind, ExitOutcome};
pub use exit_queue::{ExitQueue, QueueError};
pub use fault::{
    CheckedFaults, Declares, FifthSlot, FirstSlot, FourthSlot, SecondSlot, ThirdSlot, Throws0,
    Throws1, Throws2, Throws3, Throws4, Throws5, UncheckedFault,
};
pub use ledger::{CallLedger, HistorySnapshot, LedgerPoisoned};
pub use runtime::MethodRuntime;
