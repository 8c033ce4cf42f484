//! Failure kinds of a controlled method call.

use thiserror::Error;

use crate::exit::ExitKind;
use crate::fault::UncheckedFault;

/// A defect in how the controlled method was set up or in the runtime itself.
///
/// Never a scripted outcome: callers can always tell "nothing was scripted" or
/// "the machinery broke" apart from a fault the script asked for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    /// `execute` was reached with an empty exit queue.
    #[error(
        "no exits configured for {method}: at least one exit must be added before the method can be controlled"
    )]
    NoExitsConfigured { method: String },
    /// Queue or ledger state could not be used, e.g. a lock poisoned by a panic.
    #[error("internal failure in {method}: {reason}")]
    Internal { method: String, reason: String },
}

impl ControlError {
    pub fn is_configuration_defect(&self) -> bool {
        matches!(self, ControlError::NoExitsConfigured { .. })
    }

    pub fn method(&self) -> &str {
        match self {
            ControlError::NoExitsConfigured { method } | ControlError::Internal { method, .. } => {
                method
            }
        }
    }
}

/// How a call that did not return normally ended.
#[derive(Debug, Clone, Error)]
pub enum ExitError<F> {
    /// A scripted checked fault, tagged with its declared slot.
    #[error("scripted checked fault: {0:?}")]
    Checked(F),
    /// A scripted unchecked fault.
    #[error("scripted unchecked fault: {0}")]
    Unchecked(UncheckedFault),
    /// Configuration or internal defect; no call was resolved.
    #[error(transparent)]
    Control(#[from] ControlError),
}

impl<F> ExitError<F> {
    /// The exit kind that produced this error, or `None` for a defect.
    pub fn kind(&self) -> Option<ExitKind> {
        match self {
            ExitError::Checked(_) => Some(ExitKind::Checked),
            ExitError::Unchecked(_) => Some(ExitKind::Unchecked),
            ExitError::Control(_) => None,
        }
    }

    pub fn is_configuration_defect(&self) -> bool {
        matches!(self, ExitError::Control(e) if e.is_configuration_defect())
    }

    pub fn checked(self) -> Option<F> {
        match self {
            ExitError::Checked(fault) => Some(fault),
            _ => None,
        }
    }

    pub fn unchecked(&self) -> Option<&UncheckedFault> {
        match self {
            ExitError::Unchecked(fault) => Some(fault),
            _ => None,
        }
    }

    pub fn control(&self) -> Option<&ControlError> {
        match self {
            ExitError::Control(defect) => Some(defect),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::Throws1;

    #[test]
    fn configuration_defect_is_distinguishable() {
        let err: ExitError<Throws1<String>> = ControlError::NoExitsConfigured {
            method: "Store::load".into(),
        }
        .into();
        assert!(err.is_configuration_defect());
        assert_eq!(err.kind(), None);
        assert_eq!(err.control().map(ControlError::method), Some("Store::load"));
        assert!(err.to_string().contains("no exits configured for Store::load"));
    }

    #[test]
    fn internal_defect_is_not_a_configuration_defect() {
        let err: ExitError<Throws1<String>> = ControlError::Internal {
            method: "m".into(),
            reason: "exit queue lock poisoned".into(),
        }
        .into();
        assert!(!err.is_configuration_defect());
        assert_eq!(
            err.to_string(),
            "internal failure in m: exit queue lock poisoned"
        );
    }

    #[test]
    fn scripted_faults_report_their_kind() {
        let checked: ExitError<Throws1<String>> = ExitError::Checked(Throws1::First("io".into()));
        assert_eq!(checked.kind(), Some(ExitKind::Checked));
        assert_eq!(checked.checked(), Some(Throws1::First("io".to_string())));

        let unchecked: ExitError<Throws1<String>> =
            ExitError::Unchecked(UncheckedFault::msg("boom"));
        assert_eq!(unchecked.kind(), Some(ExitKind::Unchecked));
        assert_eq!(unchecked.to_string(), "scripted unchecked fault: boom");
    }
}
