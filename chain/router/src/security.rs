//! Security primitives shared by the router entry points
//!
//! - `ReentrancyGuard`: per-instance lock held for the duration of every
//!   mutating entry point.
//! - `check_expiry`: the deadline check wrapping `deposit_with_expiry`.

use serde::{Deserialize, Serialize};

use crate::errors::RouterError;

/// Reentrancy guard preventing nested calls into the same router instance.
///
/// The guard is part of the instance's state, so a reverted frame restores it
/// together with everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReentrancyGuard {
    locked: bool,
}

impl ReentrancyGuard {
    /// Create a new unlocked guard.
    pub fn new() -> Self {
        Self { locked: false }
    }

    /// Acquire the guard. Returns `true` if successfully acquired.
    /// Returns `false` if already locked (reentrancy attempt).
    pub fn acquire(&mut self) -> bool {
        if self.locked {
            return false;
        }
        self.locked = true;
        true
    }

    /// Acquire or fail with `RouterError::Reentrancy`.
    pub fn enter(&mut self) -> Result<(), RouterError> {
        if !self.acquire() {
            return Err(RouterError::Reentrancy);
        }
        Ok(())
    }

    /// Release the guard.
    pub fn release(&mut self) {
        self.locked = false;
    }

    /// Check if currently locked.
    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

/// Fail with `Expired` once `now` is past `deadline`.
///
/// The deadline itself is still valid: `now == deadline` passes.
pub fn check_expiry(deadline: i64, now: i64) -> Result<(), RouterError> {
    if now > deadline {
        return Err(RouterError::Expired { deadline, now });
    }
    Ok(())
}
