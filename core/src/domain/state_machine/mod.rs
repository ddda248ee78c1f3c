//! Type-safe state machine framework, generalized to drive opportunity
//! status transitions.
//!
//! Provides type-safe state machines with compile-time transition
//! validation via the `state_machine!` proc macro, runtime guards, actions,
//! and automatic audit entries — see `domain::state_machine::opportunity`
//! for the concrete machine backing §3's `Opportunity.status`.

pub mod opportunity;

pub use state_machine_macro::state_machine;

/// State machine transition error.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionError {
    InvalidTransition { from: String, event: String },
    GuardFailed { from: String, event: String, guard: String },
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionError::InvalidTransition { from, event } => {
                write!(f, "invalid transition: {from} -> {event} is not allowed")
            }
            TransitionError::GuardFailed { from, event, guard } => {
                write!(f, "guard '{guard}' rejected transition {from} -> {event}")
            }
        }
    }
}

impl std::error::Error for TransitionError {}

pub trait State: std::fmt::Debug + Clone + Copy + PartialEq + Eq + std::hash::Hash + Send + Sync {}

pub trait Event: std::fmt::Debug + Clone + Copy + PartialEq + Eq + std::hash::Hash + Send + Sync {}

#[macro_export]
macro_rules! impl_state {
    ($($t:ty),*) => {
        $(impl $crate::domain::state_machine::State for $t {})*
    };
}

#[macro_export]
macro_rules! impl_event {
    ($($t:ty),*) => {
        $(impl $crate::domain::state_machine::Event for $t {})*
    };
}
