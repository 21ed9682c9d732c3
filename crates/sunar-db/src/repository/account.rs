//! # Account Repository
//!
//! Customers and karigars. Deleting an account never touches its ledger
//! entries: they keep aggregating under the name stored on each entry.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use sunar_core::validation::validate_name;
use sunar_core::{Account, EntityType};
use tracing::{debug, info};

use super::new_id;
use crate::error::{DbError, DbResult};

#[derive(Debug, Clone, sqlx::FromRow)]
struct AccountRecord {
    id: String,
    name: String,
    entity_type: EntityType,
    phone: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<AccountRecord> for Account {
    fn from(record: AccountRecord) -> Self {
        Account {
            id: record.id,
            name: record.name,
            entity_type: record.entity_type,
            phone: record.phone,
            created_at: record.created_at,
        }
    }
}

/// Loads an account on the caller's connection, failing if it is missing.
pub(crate) async fn require(conn: &mut SqliteConnection, id: &str) -> DbResult<Account> {
    let record: Option<AccountRecord> = sqlx::query_as(
        "SELECT id, name, entity_type, phone, created_at FROM accounts WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    record
        .map(Account::from)
        .ok_or_else(|| DbError::not_found("Account", id))
}

/// Repository for customer and karigar accounts.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AccountRepository { pool }
    }

    /// Opens a new account.
    pub async fn create(
        &self,
        name: &str,
        entity_type: EntityType,
        phone: Option<&str>,
    ) -> DbResult<Account> {
        validate_name("name", name)?;

        let account = Account {
            id: new_id(),
            name: name.trim().to_string(),
            entity_type,
            phone: phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
            created_at: Utc::now(),
        };

        debug!(id = %account.id, name = %account.name, entity_type = %account.entity_type, "Creating account");

        sqlx::query(
            r#"
            INSERT INTO accounts (id, name, entity_type, phone, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&account.id)
        .bind(&account.name)
        .bind(account.entity_type)
        .bind(&account.phone)
        .bind(account.created_at)
        .execute(&self.pool)
        .await?;

        Ok(account)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Account>> {
        let record: Option<AccountRecord> = sqlx::query_as(
            "SELECT id, name, entity_type, phone, created_at FROM accounts WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Account::from))
    }

    /// All accounts of one kind, by name.
    pub async fn list(&self, entity_type: EntityType) -> DbResult<Vec<Account>> {
        let records: Vec<AccountRecord> = sqlx::query_as(
            r#"
            SELECT id, name, entity_type, phone, created_at
            FROM accounts
            WHERE entity_type = ?1
            ORDER BY name, id
            "#,
        )
        .bind(entity_type)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Account::from).collect())
    }

    /// Renames an account. Existing entries keep the name they were posted with.
    pub async fn rename(&self, id: &str, name: &str) -> DbResult<()> {
        validate_name("name", name)?;

        let result = sqlx::query("UPDATE accounts SET name = ?2 WHERE id = ?1")
            .bind(id)
            .bind(name.trim())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", id));
        }

        info!(id = %id, "Account deleted; ledger entries retained");
        Ok(())
    }
}
