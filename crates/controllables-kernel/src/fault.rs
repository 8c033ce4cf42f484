//! Faults a controlled method can be scripted to raise.
//!
//! Unchecked faults ([UncheckedFault]) can be scripted on any method. Checked faults
//! belong to the method's declared error list, expressed as one of the closed
//! [Throws0]..[Throws5] enums: the variant a fault is stored in is its declared slot,
//! fixed at the moment it is scripted.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// A shared, cheaply clonable fault raised outside the method's declared error list.
///
/// A sticky exit can raise the same fault any number of times, so the fault is held
/// behind an `Arc` and every raise hands out a clone of the same handle.
#[derive(Clone)]
pub struct UncheckedFault(Arc<dyn StdError + Send + Sync + 'static>);

impl UncheckedFault {
    /// Wraps an error value.
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self(Arc::new(error))
    }

    /// Builds a fault from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self(Arc::new(FaultMessage(message.into())))
    }

    /// Returns the wrapped error when it is of type `E`.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        self.0.downcast_ref::<E>()
    }

    /// True when both handles point at the same scripted fault.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.0
    }
}

impl<E> From<E> for UncheckedFault
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::new(error)
    }
}

impl fmt::Debug for UncheckedFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UncheckedFault").field(&self.0).finish()
    }
}

impl fmt::Display for UncheckedFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug)]
struct FaultMessage(String);

impl fmt::Display for FaultMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for FaultMessage {}

/// An ordered list of 0 to 5 declared checked fault types.
pub trait CheckedFaults: Clone + fmt::Debug + Send + Sync + 'static {
    /// Number of declared fault types.
    const ARITY: usize;

    /// 1-based position of this fault in the declared list.
    fn slot(&self) -> usize;
}

/// Converts a scripted checked fault into the forwarding method's own error type.
///
/// Implemented for every fault list whose declared types all convert into `Err`.
pub trait Declares<Err>: CheckedFaults {
    fn into_declared(self) -> Err;
}

/// No declared checked faults. Uninhabited: such a method can never raise one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Throws0 {}

impl CheckedFaults for Throws0 {
    const ARITY: usize = 0;

    fn slot(&self) -> usize {
        match *self {}
    }
}

impl<Err> Declares<Err> for Throws0 {
    fn into_declared(self) -> Err {
        match self {}
    }
}

macro_rules! checked_faults {
    ($(#[$meta:meta])* $name:ident, $arity:literal, $($slot:literal => $variant:ident($ty:ident)),+) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq)]
        pub enum $name<$($ty),+> {
            $($variant($ty)),+
        }

        impl<$($ty),+> CheckedFaults for $name<$($ty),+>
        where
            $($ty: Clone + fmt::Debug + Send + Sync + 'static),+
        {
            const ARITY: usize = $arity;

            fn slot(&self) -> usize {
                match self {
                    $(Self::$variant(_) => $slot),+
                }
            }
        }

        impl<Err, $($ty),+> Declares<Err> for $name<$($ty),+>
        where
            $($ty: Clone + fmt::Debug + Send + Sync + 'static + Into<Err>),+
        {
            fn into_declared(self) -> Err {
                match self {
                    $(Self::$variant(fault) => fault.into()),+
                }
            }
        }
    };
}

checked_faults!(
    /// One declared checked fault type.
    Throws1, 1, 1 => First(E1)
);
checked_faults!(
    /// Two declared checked fault types.
    Throws2, 2, 1 => First(E1), 2 => Second(E2)
);
checked_faults!(
    /// Three declared checked fault types.
    Throws3, 3, 1 => First(E1), 2 => Second(E2), 3 => Third(E3)
);
checked_faults!(
    /// Four declared checked fault types.
    Throws4, 4, 1 => First(E1), 2 => Second(E2), 3 => Third(E3), 4 => Fourth(E4)
);
checked_faults!(
    /// Five declared checked fault types. Methods declaring more than five can only
    /// have their first five controlled.
    Throws5, 5, 1 => First(E1), 2 => Second(E2), 3 => Third(E3), 4 => Fourth(E4), 5 => Fifth(E5)
);

/// A fault list with a first declared slot.
pub trait FirstSlot: CheckedFaults {
    type Fault;
    fn first(fault: Self::Fault) -> Self;
}

/// A fault list with a second declared slot.
pub trait SecondSlot: CheckedFaults {
    type Fault;
    fn second(fault: Self::Fault) -> Self;
}

/// A fault list with a third declared slot.
pub trait ThirdSlot: CheckedFaults {
    type Fault;
    fn third(fault: Self::Fault) -> Self;
}

/// A fault list with a fourth declared slot.
pub trait FourthSlot: CheckedFaults {
    type Fault;
    fn fourth(fault: Self::Fault) -> Self;
}

/// A fault list with a fifth declared slot.
pub trait FifthSlot: CheckedFaults {
    type Fault;
    fn fifth(fault: Self::Fault) -> Self;
}

macro_rules! slot {
    ($slot_trait:ident :: $ctor:ident for $name:ident<$($ty:ident),+> => $variant:ident($fault:ident)) => {
        impl<$($ty),+> $slot_trait for $name<$($ty),+>
        where
            $($ty: Clone + fmt::Debug + Send + Sync + 'static),+
        {
            type Fault = $fault;

            fn $ctor(fault: $fault) -> Self {
                Self::$variant(fault)
            }
        }
    };
}

slot!(FirstSlot::first for Throws1<E1> => First(E1));

slot!(FirstSlot::first for Throws2<E1, E2> => First(E1));
slot!(SecondSlot::second for Throws2<E1, E2> => Second(E2));

slot!(FirstSlot::first for Throws3<E1, E2, E3> => First(E1));
slot!(SecondSlot::second for Throws3<E1, E2, E3> => Second(E2));
slot!(ThirdSlot::third for Throws3<E1, E2, E3> => Third(E3));

slot!(FirstSlot::first for Throws4<E1, E2, E3, E4> => First(E1));
slot!(SecondSlot::second for Throws4<E1, E2, E3, E4> => Second(E2));
slot!(ThirdSlot::third for Throws4<E1, E2, E3, E4> => Third(E3));
slot!(FourthSlot::fourth for Throws4<E1, E2, E3, E4> => Fourth(E4));

slot!(FirstSlot::first for Throws5<E1, E2, E3, E4, E5> => First(E1));
slot!(SecondSlot::second for Throws5<E1, E2, E3, E4, E5> => Second(E2));
slot!(ThirdSlot::third for Throws5<E1, E2, E3, E4, E5> => Third(E3));
slot!(FourthSlot::fourth for Throws5<E1, E2, E3, E4, E5> => Fourth(E4));
slot!(FifthSlot::fifth for Throws5<E1, E2, E3, E4, E5> => Fifth(E5));
