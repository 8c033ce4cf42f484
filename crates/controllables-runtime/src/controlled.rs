//! Execution side of a controlled method.
//!
//! A forwarding method owns one [ControlledMethod] (or [ControlledVoidMethod]), hands
//! its arguments to `exit`, and returns whatever comes back:
//!
//! ```
//! use controllables_runtime::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct NotFound(String);
//!
//! struct Directory {
//!     lookup: ControlledMethod<(String,), u32, Throws1<NotFound>>,
//! }
//!
//! impl Directory {
//!     fn lookup(&self, name: &str) -> Result<u32, NotFound> {
//!         self.lookup.exit((name.to_string(),))
//!     }
//! }
//!
//! let directory = Directory { lookup: ControlledMethod::named("Directory::lookup") };
//! directory.lookup.controllable().add_checked_fault1(NotFound("bob".into()))?;
//! assert_eq!(directory.lookup("bob"), Err(NotFound("bob".into())));
//! # Ok::<(), ControlError>(())
//! ```
//!
//! Checked faults come back as the method's own error type. Unchecked faults and
//! defects cannot be expressed in that type, so they unwind:
//!
//! - an unchecked fault unwinds with the scripted [UncheckedFault] as payload
//!   (recoverable with `std::panic::catch_unwind` and `downcast`) after writing
//!   "scripted unchecked fault from <method>: <fault>" to stderr;
//! - a defect panics with the [ControlError](controllables_kernel::ControlError)
//!   message ("no exits configured for <method>: ..." or "internal failure in
//!   <method>: ..."), a `String` payload.
//!
//! `try_exit` returns either one as an [ExitError] value instead.

use std::convert::Infallible;
use std::panic;
use std::sync::Arc;

use controllables_kernel::{
    CheckedFaults, ControlConfig, Declares, ExitError, MethodRuntime, Throws0, UncheckedFault,
};
use tracing::{debug, error};

use crate::controllable::{ControllableMethod, ControllableVoidMethod};

fn raise<F, Err>(method: &str, error: ExitError<F>) -> Err
where
    F: Declares<Err>,
{
    match error {
        ExitError::Checked(fault) => fault.into_declared(),
        ExitError::Unchecked(fault) => {
            debug!(method, %fault, "raising unchecked fault");
            // resume_unwind skips the panic hook, so the report is written here
            eprintln!("{}", unchecked_report(method, &fault));
            panic::resume_unwind(Box::new(fault))
        }
        ExitError::Control(defect) => {
            error!(method, %defect, "controlled method defect");
            panic!("{defect}")
        }
    }
}

fn unchecked_report(method: &str, fault: &UncheckedFault) -> String {
    let thread = std::thread::current();
    format!(
        "thread '{}' raised scripted unchecked fault from {method}: {fault}",
        thread.name().unwrap_or("<unnamed>")
    )
}

fn never<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

/// Execution handle of a method taking `A`, returning `R`, declaring checked faults `F`.
pub struct ControlledMethod<A, R, F = Throws0> {
    runtime: Arc<MethodRuntime<A, R, F>>,
}

impl<A, R, F: CheckedFaults> Default for ControlledMethod<A, R, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R, F: CheckedFaults> ControlledMethod<A, R, F> {
    pub fn new() -> Self {
        Self::with_config(ControlConfig::default())
    }

    /// Labels the method in logs and defect messages.
    pub fn named(method: &'static str) -> Self {
        Self::with_config(ControlConfig::named(method))
    }

    pub fn with_config(config: ControlConfig) -> Self {
        Self {
            runtime: Arc::new(MethodRuntime::with_config(config)),
        }
    }

    /// A new scripting handle. Every handle shares this method's exits and history.
    pub fn controllable(&self) -> ControllableMethod<A, R, F> {
        ControllableMethod::new(Arc::clone(&self.runtime))
    }

    pub fn runtime(&self) -> &Arc<MethodRuntime<A, R, F>> {
        &self.runtime
    }
}

impl<A, R: Clone, F: CheckedFaults> ControlledMethod<A, R, F> {
    /// Resolves one call.
    ///
    /// # Panics
    ///
    /// With the scripted [UncheckedFault] as payload when the exit is an unchecked
    /// fault, and with the [ControlError](controllables_kernel::ControlError) message
    /// when no exit is configured or the runtime is unusable.
    pub fn exit<Err>(&self, arguments: A) -> Result<R, Err>
    where
        F: Declares<Err>,
    {
        self.runtime
            .execute(arguments)
            .map_err(|e| raise(&self.runtime.config().method, e))
    }

    /// Resolves one call without unwinding.
    pub fn try_exit(&self, arguments: A) -> Result<R, ExitError<F>> {
        self.runtime.execute(arguments)
    }

    /// Async form of [ControlledMethod::exit]; the exit delay does not block the thread.
    #[cfg(feature = "async")]
    pub async fn exit_async<Err>(&self, arguments: A) -> Result<R, Err>
    where
        F: Declares<Err>,
    {
        self.runtime
            .execute_async(arguments)
            .await
            .map_err(|e| raise(&self.runtime.config().method, e))
    }
}

impl<A, R: Clone> ControlledMethod<A, R, Throws0> {
    /// Resolves one call of a method that declares no checked faults.
    pub fn invoke(&self, arguments: A) -> R {
        never(self.exit(arguments))
    }
}

/// Execution handle of a method taking `A`, returning nothing, declaring checked faults `F`.
pub struct ControlledVoidMethod<A, F = Throws0> {
    runtime: Arc<MethodRuntime<A, (), F>>,
}

impl<A, F: CheckedFaults> Default for ControlledVoidMethod<A, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, F: CheckedFaults> ControlledVoidMethod<A, F> {
    pub fn new() -> Self {
        Self::with_config(ControlConfig::default())
    }

    pub fn named(method: &'static str) -> Self {
        Self::with_config(ControlConfig::named(method))
    }

    pub fn with_config(config: ControlConfig) -> Self {
        Self {
            runtime: Arc::new(MethodRuntime::with_config(config)),
        }
    }

    pub fn controllable(&self) -> ControllableVoidMethod<A, F> {
        ControllableVoidMethod::new(Arc::clone(&self.runtime))
    }

    pub fn runtime(&self) -> &Arc<MethodRuntime<A, (), F>> {
        &self.runtime
    }

    /// Resolves one call. Panics like [ControlledMethod::exit].
    pub fn exit<Err>(&self, arguments: A) -> Result<(), Err>
    where
        F: Declares<Err>,
    {
        self.runtime
            .execute(arguments)
            .map_err(|e| raise(&self.runtime.config().method, e))
    }

    pub fn try_exit(&self, arguments: A) -> Result<(), ExitError<F>> {
        self.runtime.execute(arguments)
    }

    #[cfg(feature = "async")]
    pub async fn exit_async<Err>(&self, arguments: A) -> Result<(), Err>
    where
        F: Declares<Err>,
    {
        self.runtime
            .execute_async(arguments)
            .await
            .map_err(|e| raise(&self.runtime.config().method, e))
    }
}

impl<A> ControlledVoidMethod<A, Throws0> {
    pub fn invoke(&self, arguments: A) {
        never(self.exit(arguments))
    }
}
