//! Soft-delete lifecycle shared by users, horses and clients
//!
//! Records are never removed from the store by the administrative paths;
//! they move through this state machine instead, and every query filters on
//! the resulting status.

use crate::error::{DomainError, DomainResult};

string_enum! {
    /// Lifecycle status of a soft-deletable entity
    #[derive(Default)]
    pub enum LifecycleStatus {
        #[default]
        Active => "active",
        Inactive => "inactive",
        Retired => "retired",
    }
}

impl LifecycleStatus {
    pub fn is_active(self) -> bool {
        self == LifecycleStatus::Active
    }

    /// Whether `next` is reachable from the current status.
    ///
    /// Active and Inactive toggle freely; Retired is terminal.
    pub fn can_transition_to(self, next: LifecycleStatus) -> bool {
        use LifecycleStatus::*;
        match (self, next) {
            (current, next) if current == next => true,
            (Active, Inactive) | (Active, Retired) => true,
            (Inactive, Active) | (Inactive, Retired) => true,
            (Retired, _) => false,
            _ => false,
        }
    }

    pub fn transition_to(self, next: LifecycleStatus) -> DomainResult<LifecycleStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::Conflict(format!(
                "cannot move from {} to {}",
                self, next
            )))
        }
    }
}
