//! Per-method runtime settings.

use std::borrow::Cow;
use std::time::Duration;

/// Tuning knobs for one controlled method runtime.
#[derive(Clone, Debug)]
pub struct ControlConfig {
    /// Label used in log fields and defect messages.
    pub method: Cow<'static, str>,
    /// Ceiling for the wait applied to any scripted exit delay. Recorded exits keep
    /// their configured delay.
    pub max_exit_delay: Option<Duration>,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            method: Cow::Borrowed("<controlled method>"),
            max_exit_delay: None,
        }
    }
}

impl ControlConfig {
    pub fn named(method: impl Into<Cow<'static, str>>) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }

    pub fn with_max_exit_delay(mut self, max: Duration) -> Self {
        self.max_exit_delay = Some(max);
        self
    }

    /// The wait actually applied for an exit configured with `delay`.
    pub fn effective_delay(&self, delay: Duration) -> Duration {
        match self.max_exit_delay {
            Some(max) => delay.min(max),
            None => delay,
        }
    }
}
