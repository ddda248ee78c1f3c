//! Opportunity status state machine (§3, §9 "cyclic backfill" design note).
//!
//! §3 lists the status vocabulary and two freeze rules ("mutable while
//! Not Submitted", "never deleted once actioned") but not a transition
//! graph — the graph below is an Open Question resolution (see
//! DESIGN.md): a patient-facing opportunity starts `NotSubmitted`, can be
//! `Flagged` for manual review and returned, moves to `Submitted` once
//! sent to the payer/PBM, and from there resolves to exactly one of
//! `Approved`/`Denied`/`Declined`; an `Approved` opportunity finally
//! resolves to `Completed` or `DidntWork`. `Denied`, `Declined`,
//! `Completed`, and `DidntWork` are terminal.

use chrono::Utc;

use super::{state_machine, TransitionError};
use crate::domain::entities::OpportunityStatus;

state_machine! {
    OpportunityStateMachine for OpportunityStatus {
        initial: NotSubmitted,

        NotSubmitted => {
            Submit [action: record_submission] => Submitted,
            Flag [action: record_flag] => Flagged,
        },
        Flagged => {
            Submit [action: record_submission] => Submitted,
            Unflag => NotSubmitted,
        },
        Submitted => {
            Approve [action: record_review] => Approved,
            Deny [action: record_review] => Denied,
            Decline [action: record_review] => Declined,
        },
        Approved => {
            Complete [action: record_action] => Completed,
            MarkFailed [action: record_action] => DidntWork,
        },
    }
}

/// Mutable context threaded through a single transition call. The caller
/// reads `pending_audit` back out after a successful `transition()` and
/// persists it via `OpportunityAuditLogRepository::append` — the machine
/// itself never touches the store (§5 "no in-memory lock held across
/// store calls").
#[derive(Debug, Clone, Default)]
pub struct OpportunityContext {
    pub reviewed_at: Option<chrono::DateTime<Utc>>,
    pub actioned_at: Option<chrono::DateTime<Utc>>,
    pub actor: Option<String>,
    pub reason: Option<String>,
}

pub struct OpportunityMachine;

impl OpportunityStateMachine<OpportunityContext> for OpportunityMachine {
    fn record_submission(_ctx: &mut OpportunityContext) {}

    fn record_flag(ctx: &mut OpportunityContext) {
        ctx.reviewed_at = Some(Utc::now());
    }

    fn record_review(ctx: &mut OpportunityContext) {
        ctx.reviewed_at = Some(Utc::now());
    }

    fn record_action(ctx: &mut OpportunityContext) {
        ctx.actioned_at = Some(Utc::now());
    }
}

/// Convenience wrapper returning `(new_status, context)` so callers don't
/// need to import the generated event enum directly for the common path.
pub fn apply_event(
    status: OpportunityStatus,
    event: OpportunityStateMachineEvent,
    ctx: &mut OpportunityContext,
) -> Result<OpportunityStatus, TransitionError> {
    OpportunityMachine::transition(&status, event, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_submitted_to_submitted() {
        let mut ctx = OpportunityContext::default();
        let next = apply_event(
            OpportunityStatus::NotSubmitted,
            OpportunityStateMachineEvent::Submit,
            &mut ctx,
        )
        .unwrap();
        assert_eq!(next, OpportunityStatus::Submitted);
    }

    #[test]
    fn cannot_complete_directly_from_not_submitted() {
        let mut ctx = OpportunityContext::default();
        let result = apply_event(
            OpportunityStatus::NotSubmitted,
            OpportunityStateMachineEvent::Complete,
            &mut ctx,
        );
        assert!(result.is_err());
    }

    #[test]
    fn terminal_states_have_no_outgoing_transitions() {
        let transitions = OpportunityMachine::valid_transitions(&OpportunityStatus::Denied);
        assert!(transitions.is_empty());
        let transitions = OpportunityMachine::valid_transitions(&OpportunityStatus::Completed);
        assert!(transitions.is_empty());
    }

    #[test]
    fn approve_then_complete_records_timestamps() {
        let mut ctx = OpportunityContext::default();
        let submitted = apply_event(
            OpportunityStatus::NotSubmitted,
            OpportunityStateMachineEvent::Submit,
            &mut ctx,
        )
        .unwrap();
        let approved = apply_event(submitted, OpportunityStateMachineEvent::Approve, &mut ctx).unwrap();
        assert_eq!(approved, OpportunityStatus::Approved);
        assert!(ctx.reviewed_at.is_some());

        let completed = apply_event(approved, OpportunityStateMachineEvent::Complete, &mut ctx).unwrap();
        assert_eq!(completed, OpportunityStatus::Completed);
        assert!(ctx.actioned_at.is_some());
    }
}
