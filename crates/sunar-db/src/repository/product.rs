//! # Product Repository
//!
//! Catalog pieces. Each piece is unique, so stock is a status flag rather
//! than a count.
//!
//! ## Piece Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   create ──► Available ──── invoice save ────► Sold                     │
//! │                  ▲                               │                      │
//! │                  └──── revert invoice.create ────┘                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pricing is stored as JSON (`{"mode": "formula", ...}` or
//! `{"mode": "override", "amount": ...}`) and priced on demand against the
//! current rate table, so a catalog price always follows the day's rates.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use sunar_core::calculator::{compute, validate_spec};
use sunar_core::validation::{validate_amount, validate_name, validate_sku};
use sunar_core::{ActivityEvent, CostBreakdown, Pricing, Product, ProductStatus, RateTable};
use tracing::debug;

use super::{activity, new_id};
use crate::error::{DbError, DbResult};

#[derive(Debug, Clone, sqlx::FromRow)]
struct ProductRecord {
    id: String,
    sku: String,
    name: String,
    pricing: String,
    status: ProductStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRecord> for Product {
    type Error = DbError;

    fn try_from(record: ProductRecord) -> Result<Self, Self::Error> {
        Ok(Product {
            id: record.id,
            sku: record.sku,
            name: record.name,
            pricing: serde_json::from_str(&record.pricing)?,
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

const SELECT_PRODUCT: &str = r#"
    SELECT id, sku, name, pricing, status, created_at, updated_at
    FROM products
"#;

fn validate_pricing(pricing: &Pricing) -> DbResult<()> {
    match pricing {
        Pricing::Formula(spec) => validate_spec(spec)?,
        Pricing::Override { amount } => validate_amount("override_price", *amount)?,
    }
    Ok(())
}

/// Flags a piece as sold; fails if it is already sold or missing.
pub(crate) async fn mark_sold(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products SET status = 'sold', updated_at = ?2
        WHERE id = ?1 AND status = 'available'
        "#,
    )
    .bind(id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::ProductNotAvailable { id: id.to_string() });
    }

    Ok(())
}

/// Returns every catalog piece on an invoice to the shelf.
///
/// Returns the number of pieces restocked.
pub(crate) async fn restock_invoice_items(
    conn: &mut SqliteConnection,
    invoice_id: &str,
) -> DbResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE products SET status = 'available', updated_at = ?2
        WHERE status = 'sold' AND id IN (
            SELECT product_id FROM invoice_lines
            WHERE invoice_id = ?1 AND product_id IS NOT NULL
        )
        "#,
    )
    .bind(invoice_id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Repository for catalog pieces.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Adds a piece to the catalog and records `product.create`.
    pub async fn create(&self, sku: &str, name: &str, pricing: Pricing) -> DbResult<Product> {
        validate_sku(sku)?;
        validate_name("name", name)?;
        validate_pricing(&pricing)?;

        let now = Utc::now();
        let product = Product {
            id: new_id(),
            sku: sku.trim().to_string(),
            name: name.trim().to_string(),
            pricing,
            status: ProductStatus::Available,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, sku = %product.sku, "Creating product");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (id, sku, name, pricing, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(serde_json::to_string(&product.pricing)?)
        .bind(product.status)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &product.sku),
            other => other,
        })?;

        activity::record(
            &mut tx,
            ActivityEvent::ProductCreate,
            &product.id,
            format!("Product {} ({})", product.name, product.sku),
        )
        .await?;

        tx.commit().await?;
        Ok(product)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let record: Option<ProductRecord> =
            sqlx::query_as(&format!("{} WHERE id = ?1", SELECT_PRODUCT))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        record.map(Product::try_from).transpose()
    }

    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let record: Option<ProductRecord> =
            sqlx::query_as(&format!("{} WHERE sku = ?1", SELECT_PRODUCT))
                .bind(sku)
                .fetch_optional(&self.pool)
                .await?;

        record.map(Product::try_from).transpose()
    }

    /// Pieces still on the shelf, by SKU.
    pub async fn list_available(&self) -> DbResult<Vec<Product>> {
        let records: Vec<ProductRecord> = sqlx::query_as(&format!(
            "{} WHERE status = 'available' ORDER BY sku",
            SELECT_PRODUCT
        ))
        .fetch_all(&self.pool)
        .await?;

        records.into_iter().map(Product::try_from).collect()
    }

    /// Total number of pieces, sold or not.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Prices a piece against the given rates.
    pub async fn quote(&self, id: &str, rates: &RateTable) -> DbResult<CostBreakdown> {
        let product = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        Ok(compute(&product.pricing, rates)?)
    }

    /// Replaces a piece's pricing and records `product.update`.
    pub async fn update_pricing(&self, id: &str, pricing: &Pricing) -> DbResult<()> {
        validate_pricing(pricing)?;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE products SET pricing = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(serde_json::to_string(pricing)?)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        activity::record(&mut tx, ActivityEvent::ProductUpdate, id, "Pricing updated").await?;

        tx.commit().await?;
        Ok(())
    }

    /// Removes a piece from the catalog and records `product.delete`.
    ///
    /// Invoice lines that sold it keep their frozen breakdown.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        activity::record(&mut tx, ActivityEvent::ProductDelete, id, "Product deleted").await?;

        tx.commit().await?;
        Ok(())
    }
}
