//! Controllable test doubles.
//!
//! Replace any method with a scripted stand-in: queue the outcomes it should produce
//! (return a value, raise one of its declared errors, or raise an unchecked fault,
//! each optionally after a delay), call it, then inspect every recorded call.
//!
//! Two handles exist per method, both backed by one shared
//! [MethodRuntime](controllables_kernel::MethodRuntime):
//!
//! - the execution side, [ControlledMethod] / [ControlledVoidMethod], owned by the
//!   forwarding method and asked to `exit` on every call;
//! - the scripting side, [ControllableMethod] / [ControllableVoidMethod], handed to test
//!   code to add exits and read history through the [Controllable] trait.
//!
//! The checked faults a method declares are one of the closed fault lists
//! [Throws0](controllables_kernel::Throws0) to [Throws5](controllables_kernel::Throws5);
//! the list decides which `add_checked_faultN` operations exist at compile time.

pub mod controllable;
pub mod controlled;

pub use controllable::{Controllable, ControllableMethod, ControllableVoidMethod};
pub use controlled::{ControlledMethod, ControlledVoidMethod};
pub use controllables_kernel as kernel;

/// Everything needed to wire and script controlled methods.
pub mod prelude {
    pub use crate::controllable::{Controllable, ControllableMethod, ControllableVoidMethod};
    pub use crate::controlled::{ControlledMethod, ControlledVoidMethod};
    pub use controllables_kernel::{
        CallRecord, CallSummary, ControlConfig, ControlError, ExitError, ExitKind,
        HistorySnapshot, Throws0, Throws1, Throws2, Throws3, Throws4, Throws5, UncheckedFault,
    };
}
