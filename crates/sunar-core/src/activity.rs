//! # Activity Log
//!
//! Audit trail written alongside every mutating financial action.
//!
//! ## Revert State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌────────┐   revert (invoice/order/expense .create only)  ┌─────────┐ │
//! │   │ Active │ ─────────────────────────────────────────────► │Reverted │ │
//! │   └────────┘                                                └─────────┘ │
//! │                                                              terminal   │
//! │                                                                         │
//! │   Log entries are never edited otherwise and are kept indefinitely.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

// =============================================================================
// Activity Event
// =============================================================================

/// What happened. Serialized as `<record>.<action>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum ActivityEvent {
    #[serde(rename = "invoice.create")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "invoice.create"))]
    InvoiceCreate,
    #[serde(rename = "invoice.update")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "invoice.update"))]
    InvoiceUpdate,
    #[serde(rename = "invoice.delete")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "invoice.delete"))]
    InvoiceDelete,
    #[serde(rename = "order.create")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "order.create"))]
    OrderCreate,
    #[serde(rename = "order.update")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "order.update"))]
    OrderUpdate,
    #[serde(rename = "order.delete")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "order.delete"))]
    OrderDelete,
    #[serde(rename = "expense.create")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "expense.create"))]
    ExpenseCreate,
    #[serde(rename = "expense.delete")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "expense.delete"))]
    ExpenseDelete,
    #[serde(rename = "product.create")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "product.create"))]
    ProductCreate,
    #[serde(rename = "product.update")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "product.update"))]
    ProductUpdate,
    #[serde(rename = "product.delete")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "product.delete"))]
    ProductDelete,
    #[serde(rename = "ledger.create")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "ledger.create"))]
    LedgerCreate,
    #[serde(rename = "ledger.delete")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "ledger.delete"))]
    LedgerDelete,
}

impl ActivityEvent {
    /// Wire/storage name, e.g. `invoice.create`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ActivityEvent::InvoiceCreate => "invoice.create",
            ActivityEvent::InvoiceUpdate => "invoice.update",
            ActivityEvent::InvoiceDelete => "invoice.delete",
            ActivityEvent::OrderCreate => "order.create",
            ActivityEvent::OrderUpdate => "order.update",
            ActivityEvent::OrderDelete => "order.delete",
            ActivityEvent::ExpenseCreate => "expense.create",
            ActivityEvent::ExpenseDelete => "expense.delete",
            ActivityEvent::ProductCreate => "product.create",
            ActivityEvent::ProductUpdate => "product.update",
            ActivityEvent::ProductDelete => "product.delete",
            ActivityEvent::LedgerCreate => "ledger.create",
            ActivityEvent::LedgerDelete => "ledger.delete",
        }
    }
}

impl fmt::Display for ActivityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Revert State
// =============================================================================

/// Where a log entry is in its (one-step) lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RevertState {
    Active,
    Reverted,
}

// =============================================================================
// Activity Log Entry
// =============================================================================

/// One audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ActivityLogEntry {
    pub id: String,
    pub event: ActivityEvent,
    /// Id of the record the event happened to.
    pub entity_id: String,
    /// Human-readable summary, e.g. "Invoice INV-0042 for Ayesha Khan".
    pub description: String,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    /// Set once a revert consumed this entry.
    #[ts(as = "Option<String>")]
    pub reverted_at: Option<DateTime<Utc>>,
}

impl ActivityLogEntry {
    /// Derived lifecycle state.
    pub fn state(&self) -> RevertState {
        if self.reverted_at.is_some() {
            RevertState::Reverted
        } else {
            RevertState::Active
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_names() {
        let json = serde_json::to_string(&ActivityEvent::InvoiceCreate).unwrap();
        assert_eq!(json, "\"invoice.create\"");

        let parsed: ActivityEvent = serde_json::from_str("\"expense.delete\"").unwrap();
        assert_eq!(parsed, ActivityEvent::ExpenseDelete);
        assert_eq!(ActivityEvent::LedgerCreate.to_string(), "ledger.create");
    }

    #[test]
    fn test_state_follows_reverted_at() {
        let mut log = ActivityLogEntry {
            id: "log-1".to_string(),
            event: ActivityEvent::OrderCreate,
            entity_id: "ord-1".to_string(),
            description: "Order ORD-0001".to_string(),
            timestamp: Utc::now(),
            reverted_at: None,
        };
        assert_eq!(log.state(), RevertState::Active);

        log.reverted_at = Some(Utc::now());
        assert_eq!(log.state(), RevertState::Reverted);
    }
}
