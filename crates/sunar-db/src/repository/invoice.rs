//! # Invoice Repository
//!
//! Saving an invoice is the busiest write in the shop. Everything below
//! happens in one transaction; any failure leaves no trace, not even a
//! consumed invoice number.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  InvoiceDraft                                                           │
//! │      │ validate, totals() (discount ≤ subtotal)                         │
//! │      ▼                                                                  │
//! │  BEGIN                                                                  │
//! │      ├─ next number (INV-0042)                                          │
//! │      ├─ load account (if any)                                           │
//! │      ├─ insert invoice + lines (breakdowns frozen as JSON)              │
//! │      ├─ mark each catalog piece sold (fails if already sold)            │
//! │      ├─ insert ledger postings sourced to the invoice                   │
//! │      └─ record invoice.create                                           │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use sunar_core::calculator::compute;
use sunar_core::posting::invoice_postings;
use sunar_core::validation::{validate_amount, validate_description, validate_name};
use sunar_core::{
    document_number, ActivityEvent, CostBreakdown, Invoice, InvoiceLine, Product, RateTable,
    ValidationError, INVOICE_PREFIX,
};
use tracing::{debug, info};

use super::{account, activity, ledger, new_id, next_sequence, product};
use crate::error::{DbError, DbResult};

// =============================================================================
// Drafts
// =============================================================================

/// One line of an invoice that has not been saved yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLineDraft {
    /// Catalog piece to sell; `None` for an ad-hoc item.
    pub product_id: Option<String>,
    pub description: String,
    pub weight_grams: f64,
    pub breakdown: CostBreakdown,
}

impl InvoiceLineDraft {
    /// Prices a catalog piece at today's rates.
    pub fn from_product(product: &Product, rates: &RateTable) -> DbResult<Self> {
        let breakdown = compute(&product.pricing, rates)?;
        let weight_grams = product
            .pricing
            .spec()
            .map(|spec| spec.total_metal_weight())
            .unwrap_or(0.0);

        Ok(InvoiceLineDraft {
            product_id: Some(product.id.clone()),
            description: product.name.clone(),
            weight_grams,
            breakdown,
        })
    }

    /// An item that is not in the catalog (repairs, made-to-measure).
    pub fn ad_hoc(description: impl Into<String>, weight_grams: f64, breakdown: CostBreakdown) -> Self {
        InvoiceLineDraft {
            product_id: None,
            description: description.into(),
            weight_grams,
            breakdown,
        }
    }
}

/// An invoice that has not been saved yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    /// Account to post to; `None` for a walk-in sale.
    pub account_id: Option<String>,
    pub customer_name: String,
    pub lines: Vec<InvoiceLineDraft>,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub cash_received: f64,
}

impl InvoiceDraft {
    fn validate(&self) -> DbResult<()> {
        validate_name("customer_name", &self.customer_name)?;
        validate_amount("discount", self.discount)?;
        validate_amount("cash_received", self.cash_received)?;

        if self.lines.is_empty() {
            return Err(ValidationError::Required {
                field: "lines".to_string(),
            }
            .into());
        }

        for line in &self.lines {
            validate_description("line.description", &line.description)?;
            validate_amount("line.weight_grams", line.weight_grams)?;
            validate_amount("line.total_price", line.breakdown.total_price)?;
        }

        Ok(())
    }
}

// =============================================================================
// Records
// =============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
struct InvoiceRecord {
    id: String,
    invoice_number: String,
    account_id: Option<String>,
    customer_name: String,
    discount: f64,
    cash_received: f64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct InvoiceLineRecord {
    id: String,
    invoice_id: String,
    product_id: Option<String>,
    description: String,
    weight_grams: f64,
    breakdown: String,
}

impl TryFrom<InvoiceLineRecord> for InvoiceLine {
    type Error = DbError;

    fn try_from(record: InvoiceLineRecord) -> Result<Self, Self::Error> {
        Ok(InvoiceLine {
            id: record.id,
            invoice_id: record.invoice_id,
            product_id: record.product_id,
            description: record.description,
            weight_grams: record.weight_grams,
            breakdown: serde_json::from_str(&record.breakdown)?,
        })
    }
}

impl InvoiceRecord {
    fn into_invoice(self, lines: Vec<InvoiceLine>) -> Invoice {
        Invoice {
            id: self.id,
            invoice_number: self.invoice_number,
            account_id: self.account_id,
            customer_name: self.customer_name,
            lines,
            discount: self.discount,
            cash_received: self.cash_received,
            created_at: self.created_at,
        }
    }
}

const SELECT_INVOICE: &str = r#"
    SELECT id, invoice_number, account_id, customer_name, discount, cash_received, created_at
    FROM invoices
"#;

const SELECT_LINE: &str = r#"
    SELECT id, invoice_id, product_id, description, weight_grams, breakdown
    FROM invoice_lines
"#;

/// Deletes an invoice; its lines go with it (`ON DELETE CASCADE`).
pub(crate) async fn delete_invoice(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let result = sqlx::query("DELETE FROM invoices WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for invoices and their lines.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Saves an invoice with its stock, ledger and audit side effects.
    ///
    /// ## Errors
    /// - `Core(Validation)` for a bad draft
    /// - `Core(DiscountExceedsSubtotal)` when the grand total would be negative
    /// - `NotFound` when `account_id` does not exist
    /// - `ProductNotAvailable` when a catalog piece is already sold
    pub async fn create(&self, draft: InvoiceDraft) -> DbResult<Invoice> {
        draft.validate()?;

        let invoice_id = new_id();
        let lines: Vec<InvoiceLine> = draft
            .lines
            .into_iter()
            .map(|line| InvoiceLine {
                id: new_id(),
                invoice_id: invoice_id.clone(),
                product_id: line.product_id,
                description: line.description.trim().to_string(),
                weight_grams: line.weight_grams,
                breakdown: line.breakdown,
            })
            .collect();

        let mut invoice = Invoice {
            id: invoice_id,
            invoice_number: String::new(),
            account_id: draft.account_id,
            customer_name: draft.customer_name.trim().to_string(),
            lines,
            discount: draft.discount,
            cash_received: draft.cash_received,
            created_at: Utc::now(),
        };
        let totals = invoice.totals()?;

        let mut tx = self.pool.begin().await?;

        let sequence = next_sequence(&mut tx, INVOICE_PREFIX).await?;
        invoice.invoice_number = document_number(INVOICE_PREFIX, sequence);

        let account = match &invoice.account_id {
            Some(id) => Some(account::require(&mut tx, id).await?),
            None => None,
        };

        debug!(
            id = %invoice.id,
            number = %invoice.invoice_number,
            lines = invoice.lines.len(),
            grand_total = totals.grand_total,
            "Creating invoice"
        );

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, invoice_number, account_id, customer_name,
                discount, cash_received, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.invoice_number)
        .bind(&invoice.account_id)
        .bind(&invoice.customer_name)
        .bind(invoice.discount)
        .bind(invoice.cash_received)
        .bind(invoice.created_at)
        .execute(&mut *tx)
        .await?;

        for (position, line) in invoice.lines.iter().enumerate() {
            if let Some(product_id) = &line.product_id {
                product::mark_sold(&mut tx, product_id).await?;
            }

            sqlx::query(
                r#"
                INSERT INTO invoice_lines (
                    id, invoice_id, position, product_id, description, weight_grams, breakdown
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&line.id)
            .bind(&line.invoice_id)
            .bind(position as i64)
            .bind(&line.product_id)
            .bind(&line.description)
            .bind(line.weight_grams)
            .bind(serde_json::to_string(&line.breakdown)?)
            .execute(&mut *tx)
            .await?;
        }

        for posting in invoice_postings(&invoice, account.as_ref())? {
            ledger::insert_entry(&mut tx, posting).await?;
        }

        activity::record(
            &mut tx,
            ActivityEvent::InvoiceCreate,
            &invoice.id,
            format!("Invoice {} for {}", invoice.invoice_number, invoice.customer_name),
        )
        .await?;

        tx.commit().await?;

        info!(
            number = %invoice.invoice_number,
            grand_total = totals.grand_total,
            "Invoice saved"
        );
        Ok(invoice)
    }

    /// Loads an invoice with its lines in entry order.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let record: Option<InvoiceRecord> =
            sqlx::query_as(&format!("{} WHERE id = ?1", SELECT_INVOICE))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(record) = record else {
            return Ok(None);
        };

        let lines: Vec<InvoiceLineRecord> = sqlx::query_as(&format!(
            "{} WHERE invoice_id = ?1 ORDER BY position",
            SELECT_LINE
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let lines = lines
            .into_iter()
            .map(InvoiceLine::try_from)
            .collect::<DbResult<Vec<_>>>()?;

        Ok(Some(record.into_invoice(lines)))
    }

    /// All invoices, newest first, each with its lines.
    pub async fn list(&self) -> DbResult<Vec<Invoice>> {
        let records: Vec<InvoiceRecord> = sqlx::query_as(&format!(
            "{} ORDER BY created_at DESC, rowid DESC",
            SELECT_INVOICE
        ))
        .fetch_all(&self.pool)
        .await?;

        let line_records: Vec<InvoiceLineRecord> =
            sqlx::query_as(&format!("{} ORDER BY invoice_id, position", SELECT_LINE))
                .fetch_all(&self.pool)
                .await?;

        let mut lines_by_invoice: HashMap<String, Vec<InvoiceLine>> = HashMap::new();
        for record in line_records {
            let line = InvoiceLine::try_from(record)?;
            lines_by_invoice
                .entry(line.invoice_id.clone())
                .or_default()
                .push(line);
        }

        Ok(records
            .into_iter()
            .map(|record| {
                let lines = lines_by_invoice.remove(&record.id).unwrap_or_default();
                record.into_invoice(lines)
            })
            .collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use sunar_core::{CoreError, EntityType, ItemSpec, Karat, LedgerSource, Pricing};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn ring() -> Pricing {
        let mut spec = ItemSpec::gold(Karat::K21, 10.0);
        spec.wastage_percentage = 10.0;
        spec.making_charges = 5000.0;
        Pricing::Formula(spec)
    }

    #[tokio::test]
    async fn test_create_invoice_with_account() {
        let db = db().await;
        let rates = RateTable::from_gold_24k(20_000.0);
        let customer = db
            .accounts()
            .create("Ahmed Khan", EntityType::Customer, None)
            .await
            .unwrap();
        let product = db.products().create("RNG-001", "Gold ring", ring()).await.unwrap();

        let invoice = db
            .invoices()
            .create(InvoiceDraft {
                account_id: Some(customer.id.clone()),
                customer_name: customer.name.clone(),
                lines: vec![InvoiceLineDraft::from_product(&product, &rates).unwrap()],
                discount: 500.0,
                cash_received: 100_000.0,
            })
            .await
            .unwrap();

        assert_eq!(invoice.invoice_number, "INV-0001");
        let totals = invoice.totals().unwrap();
        assert_eq!(totals.subtotal, 197_500.0);
        assert_eq!(totals.grand_total, 197_000.0);

        let stored = db.invoices().get_by_id(&invoice.id).await.unwrap().unwrap();
        assert_eq!(stored.invoice_number, "INV-0001");
        assert_eq!(stored.lines, invoice.lines);
        assert_eq!(stored.account_id.as_deref(), Some(customer.id.as_str()));

        let sold = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert!(!sold.is_available());

        let postings = db
            .ledger()
            .entries_for_source(&LedgerSource::invoice(invoice.id.clone()))
            .await
            .unwrap();
        assert_eq!(postings.len(), 2);
        assert_eq!(postings[0].cash_debit, 197_000.0);
        assert_eq!(postings[1].cash_credit, 100_000.0);

        let statement = db.ledger().statement(&customer.id).await.unwrap();
        assert_eq!(statement.last().unwrap().running_cash_balance, 97_000.0);

        let log = db.activity().for_entity(&invoice.id).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].event, ActivityEvent::InvoiceCreate);
    }

    #[tokio::test]
    async fn test_walk_in_sale_posts_nothing() {
        let db = db().await;
        let invoice = db
            .invoices()
            .create(InvoiceDraft {
                account_id: None,
                customer_name: "Walk-in".to_string(),
                lines: vec![InvoiceLineDraft::ad_hoc(
                    "Chain repair",
                    0.0,
                    compute(&Pricing::Override { amount: 1500.0 }, &RateTable::default()).unwrap(),
                )],
                discount: 0.0,
                cash_received: 1500.0,
            })
            .await
            .unwrap();

        assert!(db.ledger().all_entries().await.unwrap().is_empty());
        assert_eq!(db.invoices().list().await.unwrap()[0].id, invoice.id);
    }

    #[tokio::test]
    async fn test_sold_product_cannot_be_sold_again() {
        let db = db().await;
        let rates = RateTable::from_gold_24k(20_000.0);
        let product = db.products().create("RNG-002", "Gold ring", ring()).await.unwrap();
        let draft = InvoiceDraft {
            account_id: None,
            customer_name: "Walk-in".to_string(),
            lines: vec![InvoiceLineDraft::from_product(&product, &rates).unwrap()],
            discount: 0.0,
            cash_received: 0.0,
        };

        db.invoices().create(draft.clone()).await.unwrap();
        let result = db.invoices().create(draft).await;

        assert!(matches!(result, Err(DbError::ProductNotAvailable { .. })));
        assert_eq!(db.invoices().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_save_rolls_back_everything() {
        let db = db().await;
        let rates = RateTable::from_gold_24k(20_000.0);
        let product = db.products().create("RNG-003", "Gold ring", ring()).await.unwrap();

        let result = db
            .invoices()
            .create(InvoiceDraft {
                account_id: Some("missing-account".to_string()),
                customer_name: "Ghost".to_string(),
                lines: vec![InvoiceLineDraft::from_product(&product, &rates).unwrap()],
                discount: 0.0,
                cash_received: 0.0,
            })
            .await;
        assert!(matches!(result, Err(DbError::NotFound { .. })));

        let product = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert!(product.is_available());

        // The rolled back save did not consume INV-0001
        let invoice = db
            .invoices()
            .create(InvoiceDraft {
                account_id: None,
                customer_name: "Walk-in".to_string(),
                lines: vec![InvoiceLineDraft::from_product(&product, &rates).unwrap()],
                discount: 0.0,
                cash_received: 0.0,
            })
            .await
            .unwrap();
        assert_eq!(invoice.invoice_number, "INV-0001");
    }

    #[tokio::test]
    async fn test_discount_exceeding_subtotal_rejected() {
        let db = db().await;
        let breakdown = compute(&Pricing::Override { amount: 1000.0 }, &RateTable::default()).unwrap();

        let result = db
            .invoices()
            .create(InvoiceDraft {
                account_id: None,
                customer_name: "Walk-in".to_string(),
                lines: vec![InvoiceLineDraft::ad_hoc("Polish", 0.0, breakdown)],
                discount: 1200.0,
                cash_received: 0.0,
            })
            .await;

        assert!(matches!(
            result,
            Err(DbError::Core(CoreError::DiscountExceedsSubtotal { .. }))
        ));
    }

    #[tokio::test]
    async fn test_empty_invoice_rejected() {
        let db = db().await;
        let result = db
            .invoices()
            .create(InvoiceDraft {
                account_id: None,
                customer_name: "Walk-in".to_string(),
                lines: Vec::new(),
                discount: 0.0,
                cash_received: 0.0,
            })
            .await;

        assert!(matches!(result, Err(DbError::Core(CoreError::Validation(_)))));
    }
}
