use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use tracing::warn;

/// Result of an analysis step.
///
/// Analysis never fails outward: when a step cannot produce a value it
/// falls back to that step's neutral default. `Degraded` keeps the reason so
/// callers can tell a genuinely neutral article from a papered-over failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum Outcome<T> {
    Computed(T),
    Degraded { value: T, reason: String },
}

impl<T> Outcome<T> {
    pub fn value(&self) -> &T {
        match self {
            Outcome::Computed(value) => value,
            Outcome::Degraded { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Outcome::Computed(value) => value,
            Outcome::Degraded { value, .. } => value,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Computed(_) => None,
            Outcome::Degraded { reason, .. } => Some(reason),
        }
    }

    /// Transform the value, keeping any degradation reason.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Computed(value) => Outcome::Computed(f(value)),
            Outcome::Degraded { value, reason } => Outcome::Degraded {
                value: f(value),
                reason,
            },
        }
    }
}

/// Run `compute`, converting both errors and panics into a degraded
/// `fallback` value.
pub fn guarded<T>(
    context: &str,
    fallback: impl FnOnce() -> T,
    compute: impl FnOnce() -> Result<T>,
) -> Outcome<T> {
    match panic::catch_unwind(AssertUnwindSafe(compute)) {
        Ok(Ok(value)) => Outcome::Computed(value),
        Ok(Err(e)) => {
            warn!("{} failed, using neutral default: {:#}", context, e);
            Outcome::Degraded {
                value: fallback(),
                reason: format!("{:#}", e),
            }
        }
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            warn!("{} panicked, using neutral default: {}", context, reason);
            Outcome::Degraded {
                value: fallback(),
                reason,
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
