//! # sunar-core: Valuation & Ledger Engine for a Jewelry Shop
//!
//! This crate is the **heart** of Sunar Ledger. It prices pieces from metal
//! rates and charges, keeps the cash + gold hisaab of every customer and
//! karigar, and plans the undo of audited document saves. Every function is
//! pure; storage lives in `sunar-db`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Sunar Ledger Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │           UI (external): item form, invoice, hisaab, audit      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ sunar-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   rates   │  │calculator │  │  ledger   │  │  revert   │  │   │
//! │  │   │ RateTable │─►│ Pricing → │  │ running   │  │ dispatch  │  │   │
//! │  │   │   Karat   │  │ Breakdown │  │ summaries │  │  table    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   types · posting · activity · validation · units              │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  sunar-db (Database Layer)                      │   │
//! │  │       SQLite repositories, revert executor, config, seed        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`rates`] - Metal types, karats and the per-gram rate table
//! - [`item`] - Item description, pricing mode and cost breakdown
//! - [`calculator`] - `(Pricing, RateTable) → CostBreakdown`
//! - [`ledger`] - Ledger entries, running balances, account summaries
//! - [`posting`] - Ledger drafts for invoices, orders and manual hisaab
//! - [`activity`] - Audit log events
//! - [`revert`] - Undo planning for audited creation events
//! - [`types`] - Accounts, products, invoices, orders, expenses
//! - [`units`] - Presentation rounding and tola conversion
//! - [`validation`] - Write-time validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Unrounded Engine**: amounts are `f64` and never rounded mid-calculation
//! 4. **Explicit Errors**: all errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use sunar_core::{compute, ItemSpec, Karat, Pricing, RateTable};
//!
//! let rates = RateTable::from_gold_24k(20_000.0);
//!
//! let mut spec = ItemSpec::gold(Karat::K21, 10.0);
//! spec.wastage_percentage = 10.0;
//! spec.making_charges = 5_000.0;
//!
//! let breakdown = compute(&Pricing::Formula(spec), &rates).unwrap();
//! assert_eq!(breakdown.metal_cost, 175_000.0);
//! assert_eq!(breakdown.wastage_cost, 17_500.0);
//! assert_eq!(breakdown.total_price, 197_500.0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod activity;
pub mod calculator;
pub mod error;
pub mod item;
pub mod ledger;
pub mod posting;
pub mod rates;
pub mod revert;
pub mod types;
pub mod units;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use activity::{ActivityEvent, ActivityLogEntry, RevertState};
pub use calculator::{compute, compute_item};
pub use error::{CoreError, CoreResult, InvalidSpecError, RevertError, ValidationError};
pub use item::{CostBreakdown, ItemSpec, MetalBlock, Pricing};
pub use ledger::{
    account_summaries, ledger_totals, most_recent_first, running_balances, AccountSummary,
    EntityType, LedgerEntry, LedgerSource, LedgerTotals, NewLedgerEntry, RunningEntry, SourceKind,
};
pub use rates::{Karat, MetalType, RateTable};
pub use revert::{plan_revert, UndoPlan, UndoStep};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Prefix of printed invoice numbers (`INV-0042`).
pub const INVOICE_PREFIX: &str = "INV";

/// Prefix of printed order numbers (`ORD-0007`).
pub const ORDER_PREFIX: &str = "ORD";

/// Formats a sequential document number, zero-padded to four digits.
///
/// ```rust
/// assert_eq!(sunar_core::document_number(sunar_core::INVOICE_PREFIX, 42), "INV-0042");
/// ```
pub fn document_number(prefix: &str, sequence: i64) -> String {
    format!("{}-{:04}", prefix, sequence)
}
