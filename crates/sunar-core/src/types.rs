//! # Document Types
//!
//! The records the engine reads and the persistence layer stores: accounts,
//! catalog pieces, invoices, custom orders and shop expenses.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Document Types                                  │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Account      │   │    Product      │   │    Invoice      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name           │   │  sku (business) │   │  invoice_number │       │
//! │  │  entity_type    │   │  pricing        │   │  lines[]        │       │
//! │  │  phone?         │   │  status         │   │  discount       │       │
//! │  └─────────────────┘   └─────────────────┘   └────────┬────────┘       │
//! │                                                       │ 1..n           │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌────────▼────────┐       │
//! │  │     Order       │   │    Expense      │   │  InvoiceLine    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  estimate       │   │  category       │   │  product_id?    │       │
//! │  │  advance cash   │   │  amount (>0)    │   │  breakdown      │       │
//! │  │  advance gold   │   │  date           │   │  (frozen)       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every document has:
//! - `id`: UUID v4, immutable, used for relations and ledger back-references
//! - Business ID: (sku, invoice_number, order_number), printed on paper

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::item::{CostBreakdown, Pricing};
use crate::ledger::EntityType;

// =============================================================================
// Account
// =============================================================================

/// A customer or karigar with a hisaab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub entity_type: EntityType,
    pub phone: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// Whether a catalog piece is still on the shelf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[default]
    Available,
    Sold,
}

/// A single catalog piece. Jewelry is one-of-a-kind, so there is no
/// quantity: a piece is either available or sold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub pricing: Pricing,
    pub status: ProductStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn is_available(&self) -> bool {
        self.status == ProductStatus::Available
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// A line item on an invoice.
/// Uses snapshot pattern: the breakdown is frozen at the rates of the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceLine {
    pub id: String,
    pub invoice_id: String,
    /// Catalog piece sold on this line; `None` for ad-hoc items.
    pub product_id: Option<String>,
    pub description: String,
    pub weight_grams: f64,
    pub breakdown: CostBreakdown,
}

/// A sale to a customer (walk-in or account holder).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    pub invoice_number: String,
    /// Account to post the sale to; `None` for a walk-in customer.
    pub account_id: Option<String>,
    pub customer_name: String,
    pub lines: Vec<InvoiceLine>,
    pub discount: f64,
    pub cash_received: f64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Derived invoice figures.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceTotals {
    pub subtotal: f64,
    pub discount: f64,
    pub grand_total: f64,
    pub cash_received: f64,
    /// Negative when the customer paid more than the grand total.
    pub balance_due: f64,
}

impl Invoice {
    /// Aggregates line breakdowns into invoice totals.
    ///
    /// ## Errors
    /// `DiscountExceedsSubtotal` when the discount would make the grand
    /// total negative.
    pub fn totals(&self) -> CoreResult<InvoiceTotals> {
        let subtotal = self
            .lines
            .iter()
            .fold(0.0, |acc, line| acc + line.breakdown.total_price);

        if self.discount > subtotal {
            return Err(CoreError::DiscountExceedsSubtotal {
                discount: self.discount,
                subtotal,
            });
        }

        let grand_total = subtotal - self.discount;
        Ok(InvoiceTotals {
            subtotal,
            discount: self.discount,
            grand_total,
            cash_received: self.cash_received,
            balance_due: grand_total - self.cash_received,
        })
    }

    /// Catalog pieces sold on this invoice.
    pub fn product_ids(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|line| line.product_id.as_deref())
    }
}

// =============================================================================
// Order
// =============================================================================

/// Progress of a custom piece through the workshop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    InProgress,
    Ready,
    Delivered,
    Cancelled,
}

/// A custom piece booked in advance against an estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub account_id: Option<String>,
    pub customer_name: String,
    pub description: String,
    /// Priced at booking time; the final invoice re-prices at delivery.
    pub estimate: CostBreakdown,
    pub advance_cash: f64,
    /// Old gold handed over towards the piece.
    pub advance_gold_grams: f64,
    pub status: OrderStatus,
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Whether any cash or gold was taken up front.
    pub fn has_advance(&self) -> bool {
        self.advance_cash > 0.0 || self.advance_gold_grams > 0.0
    }

    /// Estimate minus cash advance.
    pub fn balance_due(&self) -> f64 {
        self.estimate.total_price - self.advance_cash
    }
}

// =============================================================================
// Expense
// =============================================================================

/// Money spent running the shop (rent, polish, electricity).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Expense {
    pub id: String,
    pub category: String,
    pub description: String,
    pub amount: f64,
    #[ts(as = "String")]
    pub date: NaiveDate,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, total: f64, product_id: Option<&str>) -> InvoiceLine {
        InvoiceLine {
            id: id.to_string(),
            invoice_id: "inv-1".to_string(),
            product_id: product_id.map(str::to_string),
            description: "Ring".to_string(),
            weight_grams: 5.0,
            breakdown: CostBreakdown {
                total_price: total,
                ..CostBreakdown::default()
            },
        }
    }

    fn invoice(lines: Vec<InvoiceLine>, discount: f64, cash_received: f64) -> Invoice {
        Invoice {
            id: "inv-1".to_string(),
            invoice_number: "INV-0001".to_string(),
            account_id: None,
            customer_name: "Walk-in".to_string(),
            lines,
            discount,
            cash_received,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_invoice_totals() {
        let inv = invoice(
            vec![line("l1", 197_500.0, Some("p1")), line("l2", 2_500.0, None)],
            500.0,
            150_000.0,
        );
        let totals = inv.totals().unwrap();
        assert_eq!(totals.subtotal, 200_000.0);
        assert_eq!(totals.grand_total, 199_500.0);
        assert_eq!(totals.balance_due, 49_500.0);
    }

    #[test]
    fn test_discount_may_equal_but_not_exceed_subtotal() {
        let inv = invoice(vec![line("l1", 1_000.0, None)], 1_000.0, 0.0);
        assert_eq!(inv.totals().unwrap().grand_total, 0.0);

        let inv = invoice(vec![line("l1", 1_000.0, None)], 1_000.5, 0.0);
        assert!(matches!(
            inv.totals(),
            Err(CoreError::DiscountExceedsSubtotal { .. })
        ));
    }

    #[test]
    fn test_product_ids_skip_ad_hoc_lines() {
        let inv = invoice(
            vec![line("l1", 10.0, Some("p1")), line("l2", 10.0, None), line("l3", 10.0, Some("p2"))],
            0.0,
            0.0,
        );
        let ids: Vec<&str> = inv.product_ids().collect();
        assert_eq!(ids, vec!["p1", "p2"]);
    }

    #[test]
    fn test_order_advance() {
        let mut order = Order {
            id: "ord-1".to_string(),
            order_number: "ORD-0001".to_string(),
            account_id: None,
            customer_name: "Sana".to_string(),
            description: "Bridal set".to_string(),
            estimate: CostBreakdown {
                total_price: 500_000.0,
                ..CostBreakdown::default()
            },
            advance_cash: 0.0,
            advance_gold_grams: 0.0,
            status: OrderStatus::default(),
            due_date: None,
            created_at: Utc::now(),
        };
        assert!(!order.has_advance());

        order.advance_gold_grams = 12.0;
        assert!(order.has_advance());

        order.advance_cash = 100_000.0;
        assert_eq!(order.balance_due(), 400_000.0);
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(ProductStatus::default(), ProductStatus::Available);
    }
}
