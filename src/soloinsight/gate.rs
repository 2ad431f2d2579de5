//! Passphrase gate in front of the optional insights assistant.
//!
//! This is a UX gate with a shared, hard-coded key, not a security boundary.
//! Wrong guesses are counted and the gate closes for good at the threshold.

use crate::model::AiAccessState;
use serde::Serialize;

pub const ACCESS_PASSPHRASE: &str = "114514";
pub const MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum GateOutcome {
    Unlocked,
    Rejected { remaining: u32 },
    LockedOut,
}

impl AiAccessState {
    pub fn is_locked_out(&self) -> bool {
        self.attempts >= MAX_ATTEMPTS
    }

    /// Check `key` against the passphrase, updating the counters.
    ///
    /// A locked-out gate refuses without touching state. A correct key after
    /// an earlier unlock simply reports `Unlocked` again.
    pub fn attempt(&mut self, key: &str) -> GateOutcome {
        if self.is_locked_out() {
            return GateOutcome::LockedOut;
        }
        if key == ACCESS_PASSPHRASE {
            self.unlocked = true;
            return GateOutcome::Unlocked;
        }
        self.attempts += 1;
        tracing::warn!("Wrong access key ({}/{})", self.attempts, MAX_ATTEMPTS);
        if self.is_locked_out() {
            GateOutcome::LockedOut
        } else {
            GateOutcome::Rejected {
                remaining: MAX_ATTEMPTS - self.attempts,
            }
        }
    }
}
