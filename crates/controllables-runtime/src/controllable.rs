//! Scripting side of a controlled method.
//!
//! A front end is a cheap handle onto one shared [MethodRuntime]. It exposes exactly
//! the checked-fault operations the method's declared fault list allows:
//! `add_checked_fault2` only exists when the list has a second slot, and so on.
//!
//! ```
//! use controllables_runtime::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Timeout;
//!
//! let load: ControlledMethod<(String,), String, Throws1<Timeout>> = ControlledMethod::named("load");
//! load.controllable()
//!     .add_normal_exit("v1".to_string())?
//!     .add_checked_fault1(Timeout)?;
//! assert_eq!(load.exit::<Timeout>(("k".to_string(),)), Ok("v1".to_string()));
//! assert_eq!(load.exit::<Timeout>(("k".to_string(),)), Err(Timeout));
//! # Ok::<(), ControlError>(())
//! ```
//!
//! A fault list without a second slot has no `add_checked_fault2`:
//!
//! ```compile_fail
//! use controllables_runtime::prelude::*;
//!
//! let load: ControlledMethod<(), u8, Throws1<String>> = ControlledMethod::new();
//! load.controllable().add_checked_fault2("nope".to_string());
//! ```
//!
//! and a method declaring no checked faults has none at all:
//!
//! ```compile_fail
//! use controllables_runtime::prelude::*;
//!
//! let ping: ControlledVoidMethod<()> = ControlledVoidMethod::new();
//! ping.controllable().add_checked_fault1("nope".to_string());
//! ```

use std::sync::Arc;
use std::time::Duration;

use controllables_kernel::{
    CheckedFaults, ControlError, FifthSlot, FirstSlot, FourthSlot, HistorySnapshot, MethodRuntime,
    SecondSlot, ThirdSlot, Throws0, UncheckedFault,
};

/// Operations shared by every front end, whatever the method returns.
pub trait Controllable {
    type Arguments;
    type Output;
    type Faults: CheckedFaults;

    fn runtime(&self) -> &MethodRuntime<Self::Arguments, Self::Output, Self::Faults>;

    /// Adds an exit raising `fault` as an unchecked fault.
    fn add_unchecked_fault(&self, fault: impl Into<UncheckedFault>) -> Result<&Self, ControlError> {
        self.runtime().add_unchecked_fault(fault)?;
        Ok(self)
    }

    fn add_checked_fault1(
        &self,
        fault: <Self::Faults as FirstSlot>::Fault,
    ) -> Result<&Self, ControlError>
    where
        Self::Faults: FirstSlot,
    {
        self.runtime()
            .add_checked_fault(<Self::Faults as FirstSlot>::first(fault))?;
        Ok(self)
    }

    fn add_checked_fault2(
        &self,
        fault: <Self::Faults as SecondSlot>::Fault,
    ) -> Result<&Self, ControlError>
    where
        Self::Faults: SecondSlot,
    {
        self.runtime()
            .add_checked_fault(<Self::Faults as SecondSlot>::second(fault))?;
        Ok(self)
    }

    fn add_checked_fault3(
        &self,
        fault: <Self::Faults as ThirdSlot>::Fault,
    ) -> Result<&Self, ControlError>
    where
        Self::Faults: ThirdSlot,
    {
        self.runtime()
            .add_checked_fault(<Self::Faults as ThirdSlot>::third(fault))?;
        Ok(self)
    }

    fn add_checked_fault4(
        &self,
        fault: <Self::Faults as FourthSlot>::Fault,
    ) -> Result<&Self, ControlError>
    where
        Self::Faults: FourthSlot,
    {
        self.runtime()
            .add_checked_fault(<Self::Faults as FourthSlot>::fourth(fault))?;
        Ok(self)
    }

    fn add_checked_fault5(
        &self,
        fault: <Self::Faults as FifthSlot>::Fault,
    ) -> Result<&Self, ControlError>
    where
        Self::Faults: FifthSlot,
    {
        self.runtime()
            .add_checked_fault(<Self::Faults as FifthSlot>::fifth(fault))?;
        Ok(self)
    }

    /// Removes every scripted exit. The next call fails until exits are added again.
    fn clear_exits(&self) -> Result<&Self, ControlError> {
        self.runtime().clear_exits()?;
        Ok(self)
    }

    /// Copy of the call history as it is now.
    fn history(
        &self,
    ) -> Result<HistorySnapshot<Self::Arguments, Self::Output, Self::Faults>, ControlError> {
        self.runtime().history()
    }

    fn pending_exits(&self) -> Result<usize, ControlError> {
        self.runtime().pending_exits()
    }
}

/// Front end of a method returning `R`.
pub struct ControllableMethod<A, R, F = Throws0> {
    runtime: Arc<MethodRuntime<A, R, F>>,
}

impl<A, R, F> ControllableMethod<A, R, F> {
    pub fn new(runtime: Arc<MethodRuntime<A, R, F>>) -> Self {
        Self { runtime }
    }
}

impl<A, R, F> Clone for ControllableMethod<A, R, F> {
    fn clone(&self) -> Self {
        Self {
            runtime: Arc::clone(&self.runtime),
        }
    }
}

impl<A, R, F: CheckedFaults> ControllableMethod<A, R, F> {
    /// Adds an exit returning `value`.
    pub fn add_normal_exit(&self, value: R) -> Result<&Self, ControlError> {
        self.runtime.add_normal_exit(value)?;
        Ok(self)
    }

    /// Adds an exit returning `value` once `delay` has passed.
    pub fn add_delayed_normal_exit(&self, value: R, delay: Duration) -> Result<&Self, ControlError> {
        self.runtime.add_delayed_normal_exit(value, delay)?;
        Ok(self)
    }
}

impl<A, R, F: CheckedFaults> Controllable for ControllableMethod<A, R, F> {
    type Arguments = A;
    type Output = R;
    type Faults = F;

    fn runtime(&self) -> &MethodRuntime<A, R, F> {
        &self.runtime
    }
}

/// Front end of a method returning nothing.
pub struct ControllableVoidMethod<A, F = Throws0> {
    runtime: Arc<MethodRuntime<A, (), F>>,
}

impl<A, F> ControllableVoidMethod<A, F> {
    pub fn new(runtime: Arc<MethodRuntime<A, (), F>>) -> Self {
        Self { runtime }
    }
}

impl<A, F> Clone for ControllableVoidMethod<A, F> {
    fn clone(&self) -> Self {
        Self {
            runtime: Arc::clone(&self.runtime),
        }
    }
}

impl<A, F: CheckedFaults> ControllableVoidMethod<A, F> {
    /// Adds an exit that returns normally.
    pub fn add_normal_exit(&self) -> Result<&Self, ControlError> {
        self.runtime.add_normal_exit(())?;
        Ok(self)
    }

    /// Adds an exit that returns normally once `delay` has passed.
    pub fn add_delayed_normal_exit(&self, delay: Duration) -> Result<&Self, ControlError> {
        self.runtime.add_delayed_normal_exit((), delay)?;
        Ok(self)
    }
}

impl<A, F: CheckedFaults> Controllable for ControllableVoidMethod<A, F> {
    type Arguments = A;
    type Output = ();
    type Faults = F;

    fn runtime(&self) -> &MethodRuntime<A, (), F> {
        &self.runtime
    }
}
