//! # Effect Records
//!
//! Every state change a contract commits is recorded as an [`Event`]. Amount
//! fields carry ciphertext handles, so the public record says *that* value
//! moved and between whom, never how much. A clamped-to-zero transfer emits
//! exactly the same shape of record as a full one.

use serde::{Deserialize, Serialize};
use shroud_protocol::fhe::Euint64;
use shroud_protocol::identity::Address;
use tracing::debug;

use crate::dva::{CriteriaHash, TransferId};

/// An effect record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    // -- token --------------------------------------------------------------
    Transfer {
        from: Address,
        to: Address,
        amount: Euint64,
    },
    Approval {
        owner: Address,
        spender: Address,
        amount: Euint64,
    },
    TokensFrozen {
        account: Address,
        amount: Euint64,
    },
    TokensUnfrozen {
        account: Address,
        amount: Euint64,
    },
    AddressFrozen {
        account: Address,
        frozen: bool,
        agent: Address,
    },
    Paused {
        agent: Address,
    },
    Unpaused {
        agent: Address,
    },
    ComplianceAdded {
        token: Address,
        compliance: Address,
    },

    // -- compliance ---------------------------------------------------------
    TokenBound {
        compliance: Address,
        token: Address,
    },
    TokenUnbound {
        compliance: Address,
        token: Address,
    },
    ModuleAdded {
        compliance: Address,
        module: Address,
        name: String,
    },
    ModuleRemoved {
        compliance: Address,
        module: Address,
    },
    ModuleInteraction {
        compliance: Address,
        module: Address,
        selector: String,
    },

    // -- approvals ----------------------------------------------------------
    ApprovalCriteriaSet {
        asset: Address,
        include_recipient_approver: bool,
        include_agent_approver: bool,
        sequential_approval: bool,
        additional_approvers: Vec<Address>,
        hash: CriteriaHash,
    },
    TransferInitiated {
        id: TransferId,
        asset: Address,
        sender: Address,
        recipient: Address,
        requested_amount: Euint64,
        actual_amount: Euint64,
        criteria_hash: CriteriaHash,
    },
    TransferApproved {
        id: TransferId,
        approver: Address,
    },
    TransferApprovalStateReset {
        id: TransferId,
        criteria_hash: CriteriaHash,
    },
    TransferRejected {
        id: TransferId,
        rejected_by: Address,
    },
    TransferCancelled {
        id: TransferId,
    },
    TransferCompleted {
        id: TransferId,
        asset: Address,
        sender: Address,
        recipient: Address,
        amount: Euint64,
    },
}

impl Event {
    /// Short, stable name of the record type.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Transfer { .. } => "transfer",
            Event::Approval { .. } => "approval",
            Event::TokensFrozen { .. } => "tokens_frozen",
            Event::TokensUnfrozen { .. } => "tokens_unfrozen",
            Event::AddressFrozen { .. } => "address_frozen",
            Event::Paused { .. } => "paused",
            Event::Unpaused { .. } => "unpaused",
            Event::ComplianceAdded { .. } => "compliance_added",
            Event::TokenBound { .. } => "token_bound",
            Event::TokenUnbound { .. } => "token_unbound",
            Event::ModuleAdded { .. } => "module_added",
            Event::ModuleRemoved { .. } => "module_removed",
            Event::ModuleInteraction { .. } => "module_interaction",
            Event::ApprovalCriteriaSet { .. } => "approval_criteria_set",
            Event::TransferInitiated { .. } => "transfer_initiated",
            Event::TransferApproved { .. } => "transfer_approved",
            Event::TransferApprovalStateReset { .. } => "transfer_approval_state_reset",
            Event::TransferRejected { .. } => "transfer_rejected",
            Event::TransferCancelled { .. } => "transfer_cancelled",
            Event::TransferCompleted { .. } => "transfer_completed",
        }
    }
}

/// Append-only record buffer owned by each contract.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: Event) {
        debug!(kind = event.kind(), ?event, "effect recorded");
        self.events.push(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            self.emit(event);
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Take every record emitted so far, leaving the log empty.
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_tag() {
        let event = Event::Paused {
            agent: Address::derive("agent"),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "paused");
        assert!(json["agent"].as_str().unwrap().starts_with("0x"));
    }

    #[test]
    fn drain_empties_log() {
        let mut log = EventLog::new();
        log.emit(Event::Paused {
            agent: Address::derive("a"),
        });
        log.emit(Event::Unpaused {
            agent: Address::derive("a"),
        });
        assert_eq!(log.len(), 2);
        assert_eq!(log.last().map(Event::kind), Some("unpaused"));
        let drained = log.drain();
        assert_eq!(drained.len(), 2);
        assert!(log.is_empty());
    }
}
