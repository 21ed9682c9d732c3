//! # sunar-db: Storage Layer for Sunar Ledger
//!
//! SQLite persistence for the jewelry shop: catalog, invoices, orders,
//! expenses, the hisaab ledger, the activity log and the current rates.
//! Arithmetic lives in `sunar-core`; this crate fetches rows, hands them to
//! the core, and applies multi-row writes inside single transactions.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sunar Ledger Data Flow                           │
//! │                                                                         │
//! │  UI collaborator / seed binary                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     sunar-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ invoice.rs    │    │  (embedded)  │  │   │
//! │  │   │               │    │ ledger.rs     │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ order.rs ...  │    │ 001_initial  │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │                              │   │
//! │  │   ┌───────────────┐            ▼                              │   │
//! │  │   │ RevertEngine  │──►  sunar-core (pricing, postings,        │   │
//! │  │   │ (revert.rs)   │      balances, undo plans)                │   │
//! │  │   └───────────────┘                                           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - `shop.toml` loading with environment overrides
//! - [`pool`] - Connection pool creation and repository access
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and configuration error types
//! - [`repository`] - One repository per table family
//! - [`revert`] - Executes undo plans from the activity log
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sunar_db::{Database, InvoiceDraft, InvoiceLineDraft, ShopConfig};
//!
//! let config = ShopConfig::load(None)?;
//! let db = Database::new(config.db_config()).await?;
//!
//! let rates = db.rates().current().await?;
//! let ring = db.products().get_by_sku("RNG-001").await?.unwrap();
//! let invoice = db.invoices().create(InvoiceDraft {
//!     account_id: None,
//!     customer_name: "Walk-in".into(),
//!     lines: vec![InvoiceLineDraft::from_product(&ring, &rates)?],
//!     discount: 0.0,
//!     cash_received: 0.0,
//! }).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod revert;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::ShopConfig;
pub use error::{ConfigError, ConfigResult, DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use revert::{RevertEngine, RevertReport};

// Repository re-exports for convenience
pub use repository::{
    AccountRepository, ActivityRepository, ExpenseDraft, ExpenseRepository, InvoiceDraft,
    InvoiceLineDraft, InvoiceRepository, LedgerRepository, OrderDraft, OrderRepository,
    ProductRepository, RateRepository,
};
