//! # Revert Engine
//!
//! Executes an [`UndoPlan`] from `sunar_core::revert` against SQLite.
//!
//! ## Execution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  revert(log_id)                                                         │
//! │      │                                                                  │
//! │  BEGIN                                                                  │
//! │      ├─ load log entry ───────────── missing → NotFound                 │
//! │      ├─ plan_revert() ────────────── NotRevertable / AlreadyReverted    │
//! │      ├─ RestockInvoiceItems                                             │
//! │      ├─ DeleteLedgerEntries (by source)                                 │
//! │      ├─ DeleteInvoice / DeleteOrder / DeleteExpense                     │
//! │      └─ MarkReverted ─────────────── 0 rows → AlreadyReverted, ROLLBACK │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The mark is a conditional update, so two concurrent reverts of the same
//! entry cannot both commit.

use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use sunar_core::{plan_revert, ActivityEvent, RevertError, UndoPlan, UndoStep};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::{activity, expense, invoice, ledger, order, product};

/// What a revert actually changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevertReport {
    pub log_id: String,
    pub event: ActivityEvent,
    /// Catalog pieces returned to stock.
    pub restocked: u64,
    pub ledger_entries_deleted: u64,
    /// `false` when the document was already gone.
    pub document_deleted: bool,
}

impl RevertReport {
    fn empty(plan: &UndoPlan) -> Self {
        RevertReport {
            log_id: plan.log_id.clone(),
            event: plan.event,
            restocked: 0,
            ledger_entries_deleted: 0,
            document_deleted: false,
        }
    }
}

/// Undoes document creation events from the activity log.
#[derive(Debug, Clone)]
pub struct RevertEngine {
    pool: SqlitePool,
}

impl RevertEngine {
    pub fn new(pool: SqlitePool) -> Self {
        RevertEngine { pool }
    }

    /// Reverts one activity log entry.
    ///
    /// ## Errors
    /// - `NotFound` when no entry has this id
    /// - `Revert(NotRevertable)` for events other than invoice/order/expense creation
    /// - `Revert(AlreadyReverted)` when the entry was reverted before, including
    ///   by a concurrent call that committed first
    pub async fn revert(&self, log_id: &str) -> DbResult<RevertReport> {
        let mut tx = self.pool.begin().await?;

        let log = activity::fetch(&mut tx, log_id)
            .await?
            .ok_or_else(|| DbError::not_found("ActivityLog", log_id))?;

        let plan = plan_revert(&log)?;
        debug!(log_id = %plan.log_id, event = %plan.event, steps = plan.steps.len(), "Executing revert plan");

        let mut report = RevertReport::empty(&plan);
        for step in &plan.steps {
            apply_step(&mut tx, step, &mut report).await?;
        }

        if !report.document_deleted {
            warn!(
                log_id = %report.log_id,
                entity_id = %log.entity_id,
                "Reverted entry whose document no longer exists"
            );
        }

        tx.commit().await?;

        info!(
            log_id = %report.log_id,
            event = %report.event,
            restocked = report.restocked,
            ledger_entries_deleted = report.ledger_entries_deleted,
            "Revert complete"
        );
        Ok(report)
    }
}

async fn apply_step(
    conn: &mut SqliteConnection,
    step: &UndoStep,
    report: &mut RevertReport,
) -> DbResult<()> {
    match step {
        UndoStep::RestockInvoiceItems { invoice_id } => {
            report.restocked += product::restock_invoice_items(conn, invoice_id).await?;
        }
        UndoStep::DeleteLedgerEntries { source } => {
            report.ledger_entries_deleted += ledger::delete_by_source(conn, source).await?;
        }
        UndoStep::DeleteInvoice { invoice_id } => {
            report.document_deleted = invoice::delete_invoice(conn, invoice_id).await?;
        }
        UndoStep::DeleteOrder { order_id } => {
            report.document_deleted = order::delete_order(conn, order_id).await?;
        }
        UndoStep::DeleteExpense { expense_id } => {
            report.document_deleted = expense::delete_expense(conn, expense_id).await?;
        }
        UndoStep::MarkReverted { log_id } => {
            if !activity::mark_reverted(conn, log_id).await? {
                return Err(RevertError::AlreadyReverted {
                    log_id: log_id.clone(),
                }
                .into());
            }
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
