//! # Revert Planning
//!
//! Turns an activity-log record into the ordered list of side effects that
//! undo it. Planning is pure; `sunar-db` executes the plan in one SQLite
//! transaction.
//!
//! ## Dispatch Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  event            planner              undo steps                       │
//! │  ───────────────  ───────────────────  ───────────────────────────────  │
//! │  invoice.create   plan_invoice_create  restock items                    │
//! │                                        delete ledger (source=invoice)   │
//! │                                        delete invoice                   │
//! │                                        mark log reverted                │
//! │  order.create     plan_order_create    delete ledger (source=order)     │
//! │                                        delete order                     │
//! │                                        mark log reverted                │
//! │  expense.create   plan_expense_create  delete expense                   │
//! │                                        mark log reverted                │
//! │  anything else    -                    NotRevertable                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Step Ordering
//! Steps always run restock → delete ledger entries → delete document →
//! mark consumed. If a store could not apply them atomically, a crash part
//! way through leaves stock restored (inventory-favoring) and the log entry
//! still active, so the revert can be retried.
//!
//! Adding a revertable event means adding one planner and one table row.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::activity::{ActivityEvent, ActivityLogEntry, RevertState};
use crate::error::RevertError;
use crate::ledger::LedgerSource;

// =============================================================================
// Undo Steps
// =============================================================================

/// One side effect of a revert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum UndoStep {
    /// Return every product sold on the invoice to available stock.
    RestockInvoiceItems { invoice_id: String },
    /// Delete every ledger entry carrying this back-reference.
    DeleteLedgerEntries { source: LedgerSource },
    DeleteInvoice { invoice_id: String },
    DeleteOrder { order_id: String },
    DeleteExpense { expense_id: String },
    /// Consume the log entry so it cannot be reverted again.
    MarkReverted { log_id: String },
}

impl UndoStep {
    /// Position in the fixed execution order.
    fn phase(&self) -> u8 {
        match self {
            UndoStep::RestockInvoiceItems { .. } => 0,
            UndoStep::DeleteLedgerEntries { .. } => 1,
            UndoStep::DeleteInvoice { .. }
            | UndoStep::DeleteOrder { .. }
            | UndoStep::DeleteExpense { .. } => 2,
            UndoStep::MarkReverted { .. } => 3,
        }
    }
}

/// The ordered side effects that undo one log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UndoPlan {
    pub log_id: String,
    pub event: ActivityEvent,
    pub steps: Vec<UndoStep>,
}

impl UndoPlan {
    fn new(log: &ActivityLogEntry, mut steps: Vec<UndoStep>) -> Self {
        steps.push(UndoStep::MarkReverted {
            log_id: log.id.clone(),
        });
        // Stable: steps within a phase keep planner order
        steps.sort_by_key(UndoStep::phase);
        UndoPlan {
            log_id: log.id.clone(),
            event: log.event,
            steps,
        }
    }
}

// =============================================================================
// Planners
// =============================================================================

/// A pure producer of undo steps for one event type.
pub type UndoPlanner = fn(&ActivityLogEntry) -> Vec<UndoStep>;

fn plan_invoice_create(log: &ActivityLogEntry) -> Vec<UndoStep> {
    vec![
        UndoStep::RestockInvoiceItems {
            invoice_id: log.entity_id.clone(),
        },
        UndoStep::DeleteLedgerEntries {
            source: LedgerSource::invoice(log.entity_id.clone()),
        },
        UndoStep::DeleteInvoice {
            invoice_id: log.entity_id.clone(),
        },
    ]
}

/// Creating an order appends at most one advance entry sourced to the
/// order; deleting by source removes exactly that.
fn plan_order_create(log: &ActivityLogEntry) -> Vec<UndoStep> {
    vec![
        UndoStep::DeleteLedgerEntries {
            source: LedgerSource::order(log.entity_id.clone()),
        },
        UndoStep::DeleteOrder {
            order_id: log.entity_id.clone(),
        },
    ]
}

fn plan_expense_create(log: &ActivityLogEntry) -> Vec<UndoStep> {
    vec![UndoStep::DeleteExpense {
        expense_id: log.entity_id.clone(),
    }]
}

/// Revertable events and their planners.
const REVERT_TABLE: &[(ActivityEvent, UndoPlanner)] = &[
    (ActivityEvent::InvoiceCreate, plan_invoice_create),
    (ActivityEvent::OrderCreate, plan_order_create),
    (ActivityEvent::ExpenseCreate, plan_expense_create),
];

/// Looks up the planner for an event, if it is revertable.
pub fn planner_for(event: ActivityEvent) -> Option<UndoPlanner> {
    REVERT_TABLE
        .iter()
        .find(|(revertable, _)| *revertable == event)
        .map(|(_, planner)| *planner)
}

/// Plans the revert of one log entry.
///
/// ## Errors
/// - `NotRevertable` for update/delete/product/ledger events
/// - `AlreadyReverted` when the entry was consumed by an earlier revert
pub fn plan_revert(log: &ActivityLogEntry) -> Result<UndoPlan, RevertError> {
    let planner = planner_for(log.event).ok_or(RevertError::NotRevertable(log.event))?;

    if log.state() == RevertState::Reverted {
        return Err(RevertError::AlreadyReverted {
            log_id: log.id.clone(),
        });
    }

    Ok(UndoPlan::new(log, planner(log)))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn log(event: ActivityEvent, entity_id: &str) -> ActivityLogEntry {
        ActivityLogEntry {
            id: "log-7".to_string(),
            event,
            entity_id: entity_id.to_string(),
            description: String::new(),
            timestamp: Utc::now(),
            reverted_at: None,
        }
    }

    #[test]
    fn test_invoice_plan_order() {
        let plan = plan_revert(&log(ActivityEvent::InvoiceCreate, "inv-1")).unwrap();
        assert_eq!(
            plan.steps,
            vec![
                UndoStep::RestockInvoiceItems {
                    invoice_id: "inv-1".to_string()
                },
                UndoStep::DeleteLedgerEntries {
                    source: LedgerSource::invoice("inv-1")
                },
                UndoStep::DeleteInvoice {
                    invoice_id: "inv-1".to_string()
                },
                UndoStep::MarkReverted {
                    log_id: "log-7".to_string()
                },
            ]
        );
        assert_eq!(plan.event, ActivityEvent::InvoiceCreate);
    }

    #[test]
    fn test_order_plan_deletes_advance_entries() {
        let plan = plan_revert(&log(ActivityEvent::OrderCreate, "ord-1")).unwrap();
        assert_eq!(plan.steps.len(), 3);
        assert_eq!(
            plan.steps[0],
            UndoStep::DeleteLedgerEntries {
                source: LedgerSource::order("ord-1")
            }
        );
        assert!(!plan
            .steps
            .iter()
            .any(|s| matches!(s, UndoStep::RestockInvoiceItems { .. })));
    }

    #[test]
    fn test_expense_plan() {
        let plan = plan_revert(&log(ActivityEvent::ExpenseCreate, "exp-1")).unwrap();
        assert_eq!(
            plan.steps,
            vec![
                UndoStep::DeleteExpense {
                    expense_id: "exp-1".to_string()
                },
                UndoStep::MarkReverted {
                    log_id: "log-7".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_non_create_events_not_revertable() {
        for event in [
            ActivityEvent::InvoiceUpdate,
            ActivityEvent::InvoiceDelete,
            ActivityEvent::OrderDelete,
            ActivityEvent::ProductCreate,
            ActivityEvent::LedgerCreate,
        ] {
            assert_eq!(
                plan_revert(&log(event, "x")),
                Err(RevertError::NotRevertable(event))
            );
        }
    }

    #[test]
    fn test_reverted_entry_cannot_be_planned_again() {
        let mut entry = log(ActivityEvent::InvoiceCreate, "inv-1");
        entry.reverted_at = Some(Utc::now());
        assert_eq!(
            plan_revert(&entry),
            Err(RevertError::AlreadyReverted {
                log_id: "log-7".to_string()
            })
        );
    }

    #[test]
    fn test_mark_is_always_last() {
        for (event, _) in REVERT_TABLE {
            let plan = plan_revert(&log(*event, "doc")).unwrap();
            assert!(matches!(
                plan.steps.last(),
                Some(UndoStep::MarkReverted { .. })
            ));
        }
    }
}
