//! Controlled method runtime: one exit queue and one call ledger per method.
//!
//! Scripting side: `add_*`, `clear_exits`, `history`. Execution side: [MethodRuntime::execute],
//! which takes the next exit, records the call, waits out the exit delay with no lock
//! held, then returns the scripted value or raises the scripted fault.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, trace, warn};

use crate::call::CallRecord;
use crate::config::ControlConfig;
use crate::error::{ControlError, ExitError};
use crate::exit::{Exit, ExitId, ExitOutcome};
use crate::exit_queue::{ExitQueue, QueueError};
use crate::fault::{CheckedFaults, Throws0, UncheckedFault};
use crate::ledger::{CallLedger, HistorySnapshot, LedgerPoisoned};

enum CallDefect {
    Queue(QueueError),
    Ledger(LedgerPoisoned),
}

impl From<QueueError> for CallDefect {
    fn from(err: QueueError) -> Self {
        CallDefect::Queue(err)
    }
}

/// Runtime state of one controlled method taking arguments `A`, returning `R` and
/// declaring the checked faults `F`.
pub struct MethodRuntime<A, R, F = Throws0> {
    config: ControlConfig,
    exits: ExitQueue<R, F>,
    ledger: CallLedger<A, R, F>,
}

impl<A, R, F: CheckedFaults> Default for MethodRuntime<A, R, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R, F: CheckedFaults> MethodRuntime<A, R, F> {
    pub fn new() -> Self {
        Self::with_config(ControlConfig::default())
    }

    pub fn with_config(config: ControlConfig) -> Self {
        Self {
            config,
            exits: ExitQueue::new(),
            ledger: CallLedger::new(),
        }
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    fn method(&self) -> String {
        self.config.method.to_string()
    }

    fn queue_defect(&self, err: QueueError) -> ControlError {
        match err {
            QueueError::Empty => ControlError::NoExitsConfigured {
                method: self.method(),
            },
            QueueError::Poisoned => {
                error!(method = %self.config.method, "exit queue unusable");
                ControlError::Internal {
                    method: self.method(),
                    reason: err.to_string(),
                }
            }
        }
    }

    fn ledger_defect(&self, err: LedgerPoisoned) -> ControlError {
        error!(method = %self.config.method, "call ledger unusable");
        ControlError::Internal {
            method: self.method(),
            reason: err.to_string(),
        }
    }

    fn push(&self, outcome: ExitOutcome<R, F>, delay: Duration) -> Result<ExitId, ControlError> {
        let kind = outcome.kind();
        let id = self
            .exits
            .push(outcome, delay)
            .map_err(|e| self.queue_defect(e))?;
        debug!(
            method = %self.config.method,
            exit_id = id.0,
            ?kind,
            delay_ms = delay.as_millis() as u64,
            "exit added"
        );
        Ok(id)
    }

    /// Queues a normal exit returning `value` immediately.
    pub fn add_normal_exit(&self, value: R) -> Result<ExitId, ControlError> {
        self.push(ExitOutcome::Return(value), Duration::ZERO)
    }

    /// Queues a normal exit returning `value` after `delay`.
    pub fn add_delayed_normal_exit(&self, value: R, delay: Duration) -> Result<ExitId, ControlError> {
        self.push(ExitOutcome::Return(value), delay)
    }

    /// Queues an unchecked fault. Available whatever faults the method declares.
    pub fn add_unchecked_fault(
        &self,
        fault: impl Into<UncheckedFault>,
    ) -> Result<ExitId, ControlError> {
        self.push(ExitOutcome::Unchecked(fault.into()), Duration::ZERO)
    }

    /// Queues a checked fault already tagged with its declared slot.
    pub fn add_checked_fault(&self, fault: F) -> Result<ExitId, ControlError> {
        self.push(ExitOutcome::Checked(fault), Duration::ZERO)
    }

    /// Drops every queued exit. The next `execute` fails until exits are added again.
    pub fn clear_exits(&self) -> Result<(), ControlError> {
        let removed = self.exits.clear().map_err(|e| self.queue_defect(e))?;
        debug!(method = %self.config.method, removed, "exits cleared");
        Ok(())
    }

    pub fn history(&self) -> Result<HistorySnapshot<A, R, F>, ControlError> {
        self.ledger.snapshot().map_err(|e| self.ledger_defect(e))
    }

    /// Number of exits currently queued.
    pub fn pending_exits(&self) -> Result<usize, ControlError> {
        self.exits.len().map_err(|e| self.queue_defect(e))
    }

    /// Number of calls recorded so far.
    pub fn calls(&self) -> Result<usize, ControlError> {
        self.ledger.len().map_err(|e| self.ledger_defect(e))
    }

    /// Steps 1 and 2 of a call: record the call against the next exit, then consume
    /// that exit. An exit is never consumed by a call that failed to be recorded.
    fn begin(&self, arguments: A) -> Result<(Arc<Exit<R, F>>, Duration), ControlError> {
        let record: Arc<CallRecord<A, R, F>> = self
            .exits
            .consume_with(|exit| {
                self.ledger
                    .append(arguments, Arc::clone(exit))
                    .map_err(CallDefect::Ledger)
            })
            .map_err(|e| match e {
                CallDefect::Queue(e) => {
                    if e == QueueError::Empty {
                        warn!(method = %self.config.method, "called with no exits configured");
                    }
                    self.queue_defect(e)
                }
                CallDefect::Ledger(e) => self.ledger_defect(e),
            })?;
        let exit = Arc::clone(&record.exit);
        let wait = self.config.effective_delay(exit.delay());
        trace!(
            method = %self.config.method,
            sequence = record.sequence,
            exit_id = exit.id().0,
            kind = ?exit.kind(),
            wait_ms = wait.as_millis() as u64,
            "call recorded"
        );
        Ok((exit, wait))
    }
}

impl<A, R: Clone, F: CheckedFaults> MethodRuntime<A, R, F> {
    /// Runs one call of the controlled method, blocking the calling thread for the
    /// exit delay.
    ///
    /// A defect (no exits, poisoned state) aborts the call before anything is
    /// recorded.
    pub fn execute(&self, arguments: A) -> Result<R, ExitError<F>> {
        let (exit, wait) = self.begin(arguments)?;
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
        exit.resolve()
    }

    /// Same protocol as [MethodRuntime::execute], waiting on the tokio timer instead of
    /// blocking the thread. Dropping the future after the call was recorded leaves the
    /// record in place.
    #[cfg(feature = "async")]
    pub async fn execute_async(&self, arguments: A) -> Result<R, ExitError<F>> {
        let (exit, wait) = self.begin(arguments)?;
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
        exit.resolve()
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};
    use std::thread;
    use std::time::Instant;

    use super::*;
    use crate::exit::ExitKind;
    use crate::fault::{FirstSlot, SecondSlot, Throws2};

    #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
    #[error("not found: {0}")]
    struct NotFound(String);

    #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
    #[error("timed out")]
    struct TimedOut;

    type LoadFaults = Throws2<NotFound, TimedOut>;

    fn runtime() -> MethodRuntime<(String,), String, LoadFaults> {
        MethodRuntime::with_config(ControlConfig::named("Store::load"))
    }

    #[test]
    fn fresh_runtime_fails_with_configuration_defect_and_records_nothing() {
        let rt = runtime();
        let err = rt.execute(("k".into(),)).unwrap_err();
        assert!(err.is_configuration_defect());
        assert_eq!(err.control().unwrap().method(), "Store::load");
        assert_eq!(rt.calls().unwrap(), 0);
        assert!(rt.history().unwrap().is_empty());
    }

    #[test]
    fn single_exit_answers_every_call() {
        let rt = runtime();
        let id = rt.add_normal_exit("v".into()).unwrap();
        for i in 0..4 {
            assert_eq!(rt.execute((format!("k{i}"),)).unwrap(), "v");
        }
        assert_eq!(rt.pending_exits().unwrap(), 1);
        let history = rt.history().unwrap();
        assert_eq!(history.len(), 4);
        assert!(history.iter().all(|r| r.exit.id() == id));
    }

    #[test]
    fn exits_resolve_in_order_then_stick() {
        let rt = runtime();
        rt.add_normal_exit("a".into()).unwrap();
        rt.add_checked_fault(LoadFaults::first(NotFound("b".into())))
            .unwrap();
        let boom = UncheckedFault::msg("c");
        rt.add_unchecked_fault(boom.clone()).unwrap();

        assert_eq!(rt.execute(("1".into(),)).unwrap(), "a");
        assert_eq!(
            rt.execute(("2".into(),)).unwrap_err().checked(),
            Some(Throws2::First(NotFound("b".into())))
        );
        assert!(rt.execute(("3".into(),)).unwrap_err().unchecked().unwrap().ptr_eq(&boom));
        assert!(rt.execute(("4".into(),)).unwrap_err().unchecked().unwrap().ptr_eq(&boom));

        let kinds: Vec<ExitKind> = rt.history().unwrap().iter().map(|r| r.exit.kind()).collect();
        assert_eq!(
            kinds,
            [ExitKind::Normal, ExitKind::Checked, ExitKind::Unchecked, ExitKind::Unchecked]
        );
    }

    #[test]
    fn clear_exits_returns_to_unconfigured() {
        let rt = runtime();
        rt.add_normal_exit("x".into()).unwrap();
        assert_eq!(rt.execute(("k".into(),)).unwrap(), "x");
        rt.clear_exits().unwrap();
        assert!(rt.execute(("k".into(),)).unwrap_err().is_configuration_defect());
        assert_eq!(rt.calls().unwrap(), 1);
    }

    #[test]
    fn history_records_arguments_and_resolving_exit() {
        let rt = runtime();
        rt.add_normal_exit("a".into()).unwrap();
        rt.add_checked_fault(LoadFaults::second(TimedOut)).unwrap();
        let _ = rt.execute(("first".into(),));
        let _ = rt.execute(("second".into(),));
        let history = rt.history().unwrap();
        assert_eq!(history[0].arguments, ("first".to_string(),));
        assert_eq!(history[0].exit.return_value().map(String::as_str), Some("a"));
        assert_eq!(history[1].arguments, ("second".to_string(),));
        assert_eq!(
            history[1].exit.checked_fault(),
            Some(&Throws2::Second(TimedOut))
        );
        assert_eq!(history.summaries()[1].checked_slot, Some(2));
    }

    #[test]
    fn delay_is_waited_after_the_call_is_recorded() {
        let rt: MethodRuntime<(), u8> = MethodRuntime::new();
        rt.add_delayed_normal_exit(1, Duration::from_millis(60)).unwrap();
        let started = Instant::now();
        assert_eq!(rt.execute(()).unwrap(), 1);
        assert!(started.elapsed() >= Duration::from_millis(60));
        let record = rt.history().unwrap().first().map(|r| r.called_at).unwrap();
        let finished = chrono::Utc::now();
        assert!(finished - record >= chrono::Duration::milliseconds(50));
    }

    #[test]
    fn max_exit_delay_clamps_the_wait_but_not_the_record() {
        let rt: MethodRuntime<(), u8> = MethodRuntime::with_config(
            ControlConfig::named("slow").with_max_exit_delay(Duration::from_millis(5)),
        );
        rt.add_delayed_normal_exit(1, Duration::from_secs(30)).unwrap();
        let started = Instant::now();
        rt.execute(()).unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(
            rt.history().unwrap()[0].exit.delay(),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn delayed_call_does_not_block_scripting_or_history() {
        let rt: Arc<MethodRuntime<u8, u8>> = Arc::new(MethodRuntime::new());
        rt.add_delayed_normal_exit(1, Duration::from_millis(300)).unwrap();
        rt.add_normal_exit(2).unwrap();
        let slow = {
            let rt = Arc::clone(&rt);
            thread::spawn(move || rt.execute(0))
        };
        // wait until the slow call is recorded
        while rt.calls().unwrap() == 0 {
            thread::yield_now();
        }
        let started = Instant::now();
        rt.add_normal_exit(3).unwrap();
        assert_eq!(rt.execute(1).unwrap(), 2);
        assert_eq!(rt.history().unwrap().len(), 2);
        assert!(started.elapsed() < Duration::from_millis(200));
        assert_eq!(slow.join().unwrap().unwrap(), 1);
    }

    #[test]
    fn concurrent_calls_consume_each_exit_exactly_once() {
        const CALLERS: u32 = 32;
        let rt: Arc<MethodRuntime<u32, u32>> = Arc::new(MethodRuntime::new());
        for v in 0..CALLERS {
            rt.add_normal_exit(v).unwrap();
        }
        let handles: Vec<_> = (0..CALLERS)
            .map(|caller| {
                let rt = Arc::clone(&rt);
                thread::spawn(move || rt.execute(caller).unwrap())
            })
            .collect();
        let mut returned: Vec<u32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        returned.sort_unstable();
        assert_eq!(returned, (0..CALLERS).collect::<Vec<_>>());

        let history = rt.history().unwrap();
        assert_eq!(history.len(), CALLERS as usize);
        let mut recorded: Vec<u32> = history
            .iter()
            .map(|r| *r.exit.return_value().unwrap())
            .collect();
        recorded.sort_unstable();
        assert_eq!(recorded, (0..CALLERS).collect::<Vec<_>>());
        for (i, record) in history.iter().enumerate() {
            assert_eq!(record.sequence, i as u64);
        }
    }

    struct PanicOnDrop;

    impl Clone for PanicOnDrop {
        fn clone(&self) -> Self {
            PanicOnDrop
        }
    }

    impl Drop for PanicOnDrop {
        fn drop(&mut self) {
            if !thread::panicking() {
                panic!("dropped while clearing");
            }
        }
    }

    #[test]
    fn poisoned_queue_is_reported_as_internal_defect() {
        let rt: MethodRuntime<(), PanicOnDrop> = MethodRuntime::with_config(ControlConfig::named("poisoned"));
        rt.add_normal_exit(PanicOnDrop).unwrap();
        let cleared = panic::catch_unwind(AssertUnwindSafe(|| rt.clear_exits()));
        assert!(cleared.is_err());

        let err = match rt.execute(()) {
            Ok(value) => {
                std::mem::forget(value);
                panic!("poisoned runtime must not resolve a call");
            }
            Err(err) => err,
        };
        let defect = err.control().cloned().unwrap();
        assert!(!defect.is_configuration_defect());
        assert!(matches!(defect, ControlError::Internal { .. }));
        assert!(matches!(
            rt.add_unchecked_fault(UncheckedFault::msg("x")),
            Err(ControlError::Internal { .. })
        ));
        // the ledger has its own lock and is still readable
        assert_eq!(rt.calls().unwrap(), 0);
    }
}
