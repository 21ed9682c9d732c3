//! # Expense Repository
//!
//! Shop running costs. Expenses never touch the ledger.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use sunar_core::validation::validate_expense;
use sunar_core::{ActivityEvent, Expense};
use tracing::debug;

use super::{activity, new_id};
use crate::error::{DbError, DbResult};

/// An expense that has not been saved yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseDraft {
    pub category: String,
    pub description: String,
    pub amount: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct ExpenseRecord {
    id: String,
    category: String,
    description: String,
    amount: f64,
    date: NaiveDate,
}

impl From<ExpenseRecord> for Expense {
    fn from(record: ExpenseRecord) -> Self {
        Expense {
            id: record.id,
            category: record.category,
            description: record.description,
            amount: record.amount,
            date: record.date,
        }
    }
}

pub(crate) async fn delete_expense(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let result = sqlx::query("DELETE FROM expenses WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Records an expense and logs `expense.create`.
    pub async fn create(&self, draft: ExpenseDraft) -> DbResult<Expense> {
        let expense = Expense {
            id: new_id(),
            category: draft.category.trim().to_string(),
            description: draft.description.trim().to_string(),
            amount: draft.amount,
            date: draft.date,
        };
        validate_expense(&expense)?;

        debug!(id = %expense.id, category = %expense.category, amount = expense.amount, "Creating expense");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO expenses (id, category, description, amount, date)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&expense.id)
        .bind(&expense.category)
        .bind(&expense.description)
        .bind(expense.amount)
        .bind(expense.date)
        .execute(&mut *tx)
        .await?;

        activity::record(
            &mut tx,
            ActivityEvent::ExpenseCreate,
            &expense.id,
            format!("{}: {}", expense.category, expense.description),
        )
        .await?;

        tx.commit().await?;
        Ok(expense)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Expense>> {
        let record: Option<ExpenseRecord> = sqlx::query_as(
            "SELECT id, category, description, amount, date FROM expenses WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Expense::from))
    }

    /// Expenses dated within `from..=to`, newest first.
    pub async fn list_between(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<Expense>> {
        let records: Vec<ExpenseRecord> = sqlx::query_as(
            r#"
            SELECT id, category, description, amount, date
            FROM expenses
            WHERE date >= ?1 AND date <= ?2
            ORDER BY date DESC, rowid DESC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Expense::from).collect())
    }

    /// Sum of expenses dated within `from..=to`.
    pub async fn total_between(&self, from: NaiveDate, to: NaiveDate) -> DbResult<f64> {
        let total: f64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0.0) FROM expenses WHERE date >= ?1 AND date <= ?2",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// Deletes an expense and logs `expense.delete`.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        if !delete_expense(&mut tx, id).await? {
            return Err(DbError::not_found("Expense", id));
        }

        activity::record(&mut tx, ActivityEvent::ExpenseDelete, id, "Expense deleted").await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn draft(category: &str, amount: f64, date: NaiveDate) -> ExpenseDraft {
        ExpenseDraft {
            category: category.to_string(),
            description: format!("{} for the month", category),
            amount,
            date,
        }
    }

    #[tokio::test]
    async fn test_totals_by_date_range() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let expenses = db.expenses();

        expenses.create(draft("Rent", 45_000.0, day(1))).await.unwrap();
        expenses.create(draft("Electricity", 8_200.0, day(12))).await.unwrap();
        expenses.create(draft("Polish", 1_500.0, day(20))).await.unwrap();

        assert_eq!(expenses.total_between(day(1), day(12)).await.unwrap(), 53_200.0);
        assert_eq!(expenses.total_between(day(21), day(31)).await.unwrap(), 0.0);

        let listed = expenses.list_between(day(1), day(31)).await.unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].category, "Polish");
    }

    #[tokio::test]
    async fn test_zero_amount_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.expenses().create(draft("Tea", 0.0, day(3))).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_is_logged() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let expense = db.expenses().create(draft("Rent", 45_000.0, day(1))).await.unwrap();

        db.expenses().delete(&expense.id).await.unwrap();

        assert!(db.expenses().get_by_id(&expense.id).await.unwrap().is_none());
        let events: Vec<_> = db
            .activity()
            .for_entity(&expense.id)
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.event)
            .collect();
        assert_eq!(events, vec![ActivityEvent::ExpenseCreate, ActivityEvent::ExpenseDelete]);
    }
}
