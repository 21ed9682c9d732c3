//! # Ledger Postings
//!
//! Builds the [`NewLedgerEntry`] drafts a document save appends to an
//! account's hisaab. The repository stores the drafts in the same
//! transaction as the document itself.
//!
//! ```text
//!   invoice (account)   → debit grand_total        source = invoice
//!                       → credit cash_received     source = invoice  (if > 0)
//!   order   (account)   → credit advance cash/gold source = order    (if any)
//!   walk-in / no advance → nothing
//! ```

use chrono::{DateTime, Utc};

use crate::error::CoreResult;
use crate::ledger::{LedgerSource, NewLedgerEntry};
use crate::types::{Account, Invoice, Order};

fn draft(
    account: &Account,
    date: DateTime<Utc>,
    description: String,
    source: Option<LedgerSource>,
) -> NewLedgerEntry {
    NewLedgerEntry {
        entity_id: account.id.clone(),
        entity_type: account.entity_type,
        entity_name: account.name.clone(),
        date,
        description,
        cash_debit: 0.0,
        cash_credit: 0.0,
        gold_debit_grams: 0.0,
        gold_credit_grams: 0.0,
        source,
    }
}

// =============================================================================
// Document Postings
// =============================================================================

/// Entries for a saved invoice.
///
/// Returns nothing when `account` is `None` (walk-in sale). The caller
/// passes the account the invoice's `account_id` refers to.
///
/// ## Errors
/// `DiscountExceedsSubtotal` from [`Invoice::totals`].
pub fn invoice_postings(invoice: &Invoice, account: Option<&Account>) -> CoreResult<Vec<NewLedgerEntry>> {
    let totals = invoice.totals()?;
    let Some(account) = account else {
        return Ok(Vec::new());
    };

    let source = LedgerSource::invoice(invoice.id.clone());
    let mut postings = Vec::with_capacity(2);

    if totals.grand_total > 0.0 {
        postings.push(NewLedgerEntry {
            cash_debit: totals.grand_total,
            ..draft(
                account,
                invoice.created_at,
                format!("Invoice {}", invoice.invoice_number),
                Some(source.clone()),
            )
        });
    }

    if totals.cash_received > 0.0 {
        postings.push(NewLedgerEntry {
            cash_credit: totals.cash_received,
            ..draft(
                account,
                invoice.created_at,
                format!("Payment received on invoice {}", invoice.invoice_number),
                Some(source),
            )
        });
    }

    Ok(postings)
}

/// The single advance entry for a booked order, if any.
pub fn order_postings(order: &Order, account: Option<&Account>) -> Option<NewLedgerEntry> {
    let account = account?;
    if !order.has_advance() {
        return None;
    }

    Some(NewLedgerEntry {
        cash_credit: order.advance_cash,
        gold_credit_grams: order.advance_gold_grams,
        ..draft(
            account,
            order.created_at,
            format!("Advance for order {}", order.order_number),
            Some(LedgerSource::order(order.id.clone())),
        )
    })
}

// =============================================================================
// Manual Hisaab
// =============================================================================

/// Cash the account paid the shop.
pub fn cash_received(account: &Account, amount: f64, date: DateTime<Utc>, note: &str) -> NewLedgerEntry {
    NewLedgerEntry {
        cash_credit: amount,
        ..draft(account, date, note.to_string(), None)
    }
}

/// Cash the shop paid the account.
pub fn cash_paid(account: &Account, amount: f64, date: DateTime<Utc>, note: &str) -> NewLedgerEntry {
    NewLedgerEntry {
        cash_debit: amount,
        ..draft(account, date, note.to_string(), None)
    }
}

/// Shop gold handed to a karigar for work.
pub fn gold_issued(account: &Account, grams: f64, date: DateTime<Utc>, note: &str) -> NewLedgerEntry {
    NewLedgerEntry {
        gold_debit_grams: grams,
        ..draft(account, date, note.to_string(), None)
    }
}

/// Gold (finished work or old gold) returned to the shop.
pub fn gold_received(account: &Account, grams: f64, date: DateTime<Utc>, note: &str) -> NewLedgerEntry {
    NewLedgerEntry {
        gold_credit_grams: grams,
        ..draft(account, date, note.to_string(), None)
    }
}

/// Labour the shop owes a karigar for finished pieces.
pub fn making_charges_due(account: &Account, amount: f64, date: DateTime<Utc>, note: &str) -> NewLedgerEntry {
    NewLedgerEntry {
        cash_credit: amount,
        ..draft(account, date, note.to_string(), None)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::CostBreakdown;
    use crate::ledger::{account_summaries, EntityType, SourceKind};
    use crate::types::{InvoiceLine, OrderStatus};

    fn account(entity_type: EntityType) -> Account {
        Account {
            id: "acc-1".to_string(),
            name: "Ayesha Khan".to_string(),
            entity_type,
            phone: None,
            created_at: Utc::now(),
        }
    }

    fn invoice(total: f64, discount: f64, cash_received: f64) -> Invoice {
        Invoice {
            id: "inv-1".to_string(),
            invoice_number: "INV-0001".to_string(),
            account_id: Some("acc-1".to_string()),
            customer_name: "Ayesha Khan".to_string(),
            lines: vec![InvoiceLine {
                id: "l1".to_string(),
                invoice_id: "inv-1".to_string(),
                product_id: Some("p1".to_string()),
                description: "Bangle".to_string(),
                weight_grams: 10.0,
                breakdown: CostBreakdown {
                    total_price: total,
                    ..CostBreakdown::default()
                },
            }],
            discount,
            cash_received,
            created_at: Utc::now(),
        }
    }

    fn order(advance_cash: f64, advance_gold_grams: f64) -> Order {
        Order {
            id: "ord-1".to_string(),
            order_number: "ORD-0001".to_string(),
            account_id: Some("acc-1".to_string()),
            customer_name: "Ayesha Khan".to_string(),
            description: "Necklace".to_string(),
            estimate: CostBreakdown::default(),
            advance_cash,
            advance_gold_grams,
            status: OrderStatus::Pending,
            due_date: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_invoice_postings_debit_and_payment() {
        let acc = account(EntityType::Customer);
        let postings = invoice_postings(&invoice(197_500.0, 500.0, 100_000.0), Some(&acc)).unwrap();

        assert_eq!(postings.len(), 2);
        assert_eq!(postings[0].cash_debit, 197_000.0);
        assert_eq!(postings[1].cash_credit, 100_000.0);
        for posting in &postings {
            let source = posting.source.as_ref().unwrap();
            assert_eq!(source.kind, SourceKind::Invoice);
            assert_eq!(source.id, "inv-1");
        }

        let entries = postings
            .into_iter()
            .enumerate()
            .map(|(i, p)| p.into_entry(i.to_string()))
            .collect();
        assert_eq!(account_summaries(entries)[0].cash_balance, 97_000.0);
    }

    #[test]
    fn test_fully_paid_invoice_settles_account() {
        let acc = account(EntityType::Customer);
        let postings = invoice_postings(&invoice(50_000.0, 0.0, 50_000.0), Some(&acc)).unwrap();
        let entries = postings
            .into_iter()
            .enumerate()
            .map(|(i, p)| p.into_entry(i.to_string()))
            .collect();
        assert!(account_summaries(entries).is_empty());
    }

    #[test]
    fn test_walk_in_invoice_posts_nothing() {
        let postings = invoice_postings(&invoice(50_000.0, 0.0, 0.0), None).unwrap();
        assert!(postings.is_empty());
    }

    #[test]
    fn test_invoice_postings_reject_bad_discount() {
        let acc = account(EntityType::Customer);
        assert!(invoice_postings(&invoice(100.0, 200.0, 0.0), Some(&acc)).is_err());
    }

    #[test]
    fn test_order_advance_is_one_credit() {
        let acc = account(EntityType::Customer);
        let posting = order_postings(&order(25_000.0, 8.0), Some(&acc)).unwrap();
        assert_eq!(posting.cash_credit, 25_000.0);
        assert_eq!(posting.gold_credit_grams, 8.0);
        assert_eq!(posting.source, Some(LedgerSource::order("ord-1")));

        assert!(order_postings(&order(0.0, 0.0), Some(&acc)).is_none());
        assert!(order_postings(&order(25_000.0, 0.0), None).is_none());
    }

    #[test]
    fn test_karigar_gold_cycle() {
        let karigar = account(EntityType::Karigar);
        let now = Utc::now();
        let drafts = vec![
            gold_issued(&karigar, 50.0, now, "Gold for 4 bangles"),
            gold_received(&karigar, 48.5, now, "Bangles returned"),
            making_charges_due(&karigar, 12_000.0, now, "Labour, 4 bangles"),
            cash_paid(&karigar, 12_000.0, now, "Labour paid"),
        ];
        assert!(drafts.iter().all(|d| d.source.is_none()));

        let entries = drafts
            .into_iter()
            .enumerate()
            .map(|(i, d)| d.into_entry(i.to_string()))
            .collect();
        let summaries = account_summaries(entries);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].cash_balance, 0.0);
        assert_eq!(summaries[0].gold_balance, 1.5);
    }

    #[test]
    fn test_cash_received_is_credit() {
        let acc = account(EntityType::Customer);
        let entry = cash_received(&acc, 5_000.0, Utc::now(), "Installment");
        assert_eq!(entry.cash_credit, 5_000.0);
        assert_eq!(entry.cash_debit, 0.0);
        assert_eq!(entry.entity_name, "Ayesha Khan");
    }
}
