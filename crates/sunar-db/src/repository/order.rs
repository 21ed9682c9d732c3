//! # Order Repository
//!
//! Custom pieces booked against an estimate. When the customer has an
//! account, any advance (cash and/or old gold) is credited to it in the
//! same transaction as the order, sourced to the order so a revert can
//! remove exactly that entry.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use sunar_core::posting::order_postings;
use sunar_core::validation::validate_order;
use sunar_core::{
    document_number, ActivityEvent, CostBreakdown, Order, OrderStatus, ORDER_PREFIX,
};
use tracing::{debug, info};

use super::{account, activity, ledger, new_id, next_sequence};
use crate::error::{DbError, DbResult};

/// An order that has not been saved yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub account_id: Option<String>,
    pub customer_name: String,
    pub description: String,
    /// Usually `compute(pricing, today's rates)`.
    pub estimate: CostBreakdown,
    #[serde(default)]
    pub advance_cash: f64,
    #[serde(default)]
    pub advance_gold_grams: f64,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct OrderRecord {
    id: String,
    order_number: String,
    account_id: Option<String>,
    customer_name: String,
    description: String,
    estimate: String,
    advance_cash: f64,
    advance_gold_grams: f64,
    status: OrderStatus,
    due_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRecord> for Order {
    type Error = DbError;

    fn try_from(record: OrderRecord) -> Result<Self, Self::Error> {
        Ok(Order {
            id: record.id,
            order_number: record.order_number,
            account_id: record.account_id,
            customer_name: record.customer_name,
            description: record.description,
            estimate: serde_json::from_str(&record.estimate)?,
            advance_cash: record.advance_cash,
            advance_gold_grams: record.advance_gold_grams,
            status: record.status,
            due_date: record.due_date,
            created_at: record.created_at,
        })
    }
}

const SELECT_ORDER: &str = r#"
    SELECT id, order_number, account_id, customer_name, description, estimate,
           advance_cash, advance_gold_grams, status, due_date, created_at
    FROM orders
"#;

pub(crate) async fn delete_order(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Repository for custom orders.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Books an order, credits its advance and records `order.create`.
    pub async fn create(&self, draft: OrderDraft) -> DbResult<Order> {
        let mut tx = self.pool.begin().await?;

        let sequence = next_sequence(&mut tx, ORDER_PREFIX).await?;
        let order = Order {
            id: new_id(),
            order_number: document_number(ORDER_PREFIX, sequence),
            account_id: draft.account_id,
            customer_name: draft.customer_name.trim().to_string(),
            description: draft.description.trim().to_string(),
            estimate: draft.estimate,
            advance_cash: draft.advance_cash,
            advance_gold_grams: draft.advance_gold_grams,
            status: OrderStatus::Pending,
            due_date: draft.due_date,
            created_at: Utc::now(),
        };
        validate_order(&order)?;

        let account = match &order.account_id {
            Some(id) => Some(account::require(&mut tx, id).await?),
            None => None,
        };

        debug!(
            id = %order.id,
            number = %order.order_number,
            advance_cash = order.advance_cash,
            advance_gold_grams = order.advance_gold_grams,
            "Creating order"
        );

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, account_id, customer_name, description, estimate,
                advance_cash, advance_gold_grams, status, due_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&order.id)
        .bind(&order.order_number)
        .bind(&order.account_id)
        .bind(&order.customer_name)
        .bind(&order.description)
        .bind(serde_json::to_string(&order.estimate)?)
        .bind(order.advance_cash)
        .bind(order.advance_gold_grams)
        .bind(order.status)
        .bind(order.due_date)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        if let Some(posting) = order_postings(&order, account.as_ref()) {
            ledger::insert_entry(&mut tx, posting).await?;
        }

        activity::record(
            &mut tx,
            ActivityEvent::OrderCreate,
            &order.id,
            format!("Order {} for {}", order.order_number, order.customer_name),
        )
        .await?;

        tx.commit().await?;

        info!(number = %order.order_number, "Order booked");
        Ok(order)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let record: Option<OrderRecord> =
            sqlx::query_as(&format!("{} WHERE id = ?1", SELECT_ORDER))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        record.map(Order::try_from).transpose()
    }

    /// Orders still in the workshop (not delivered or cancelled), soonest due first.
    pub async fn list_open(&self) -> DbResult<Vec<Order>> {
        let records: Vec<OrderRecord> = sqlx::query_as(&format!(
            r#"{} WHERE status NOT IN ('delivered', 'cancelled')
               ORDER BY due_date IS NULL, due_date, rowid"#,
            SELECT_ORDER
        ))
        .fetch_all(&self.pool)
        .await?;

        records.into_iter().map(Order::try_from).collect()
    }

    /// All orders, newest first.
    pub async fn list(&self) -> DbResult<Vec<Order>> {
        let records: Vec<OrderRecord> = sqlx::query_as(&format!(
            "{} ORDER BY created_at DESC, rowid DESC",
            SELECT_ORDER
        ))
        .fetch_all(&self.pool)
        .await?;

        records.into_iter().map(Order::try_from).collect()
    }

    /// Moves an order through the workshop and records `order.update`.
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE orders SET status = ?2 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        activity::record(
            &mut tx,
            ActivityEvent::OrderUpdate,
            id,
            format!("Status changed to {:?}", status),
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
