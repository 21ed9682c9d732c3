//! # Repository Module
//!
//! Database repository implementations for Sunar Ledger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository + Pure Service                            │
//! │                                                                         │
//! │  Caller                                                                 │
//! │       │  db.invoices().create(draft)                                    │
//! │       ▼                                                                 │
//! │  InvoiceRepository ─── BEGIN ───────────────────────────────────────┐  │
//! │  │  insert invoice + lines                                          │  │
//! │  │  mark products sold                                              │  │
//! │  │  sunar_core::posting::invoice_postings() → insert entries        │  │
//! │  │  activity::record(invoice.create)                                │  │
//! │  └──────────────────────────────────────────────────────── COMMIT ──┘  │
//! │                                                                         │
//! │  Reads fetch rows, then hand them to sunar-core for aggregation        │
//! │  (running balances, summaries, totals). SQL stays in this crate,       │
//! │  arithmetic stays in the core.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`AccountRepository`] - Customers and karigars
//! - [`ProductRepository`] - Catalog pieces
//! - [`LedgerRepository`] - Hisaab entries, statements, summaries
//! - [`InvoiceRepository`] - Sales with lines, postings and audit
//! - [`OrderRepository`] - Custom orders and advances
//! - [`ExpenseRepository`] - Shop expenses
//! - [`ActivityRepository`] - Audit log
//! - [`RateRepository`] - Current metal rates
//!
//! Queries are built at runtime (`sqlx::query` / `query_as` with `bind`) and
//! decoded through `FromRow` record structs.

pub mod account;
pub mod activity;
pub mod expense;
pub mod invoice;
pub mod ledger;
pub mod order;
pub mod product;
pub mod rates;

pub use account::AccountRepository;
pub use activity::ActivityRepository;
pub use expense::{ExpenseDraft, ExpenseRepository};
pub use invoice::{InvoiceDraft, InvoiceLineDraft, InvoiceRepository};
pub use ledger::LedgerRepository;
pub use order::{OrderDraft, OrderRepository};
pub use product::ProductRepository;
pub use rates::RateRepository;

use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::DbResult;

/// Generates a new UUID v4 id.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Reserves the next sequence number for a document kind.
///
/// Must run inside the transaction that inserts the document, so a rolled
/// back save does not consume a number.
pub(crate) async fn next_sequence(conn: &mut SqliteConnection, kind: &str) -> DbResult<i64> {
    let next: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO document_counters (kind, last_value) VALUES (?1, 1)
        ON CONFLICT(kind) DO UPDATE SET last_value = last_value + 1
        RETURNING last_value
        "#,
    )
    .bind(kind)
    .fetch_one(&mut *conn)
    .await?;

    Ok(next)
}
