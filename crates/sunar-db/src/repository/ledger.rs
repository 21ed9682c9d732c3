//! # Ledger Repository
//!
//! Storage for hisaab entries. Balances are never stored: statements and
//! summaries load rows and hand them to the aggregation functions in
//! `sunar_core::ledger`.
//!
//! ## Write Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Manual hisaab       LedgerRepository::append   ─► ledger.create logged │
//! │  Invoice / order     insert_entry (in the document's transaction)      │
//! │  Revert              delete_by_source (in the revert transaction)      │
//! │  Manual correction   LedgerRepository::delete   ─► ledger.delete logged │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are read in insertion order (`rowid`); the core's stable date sort
//! then keeps same-timestamp entries in the order they were written.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use sunar_core::validation::validate_ledger_entry;
use sunar_core::{
    account_summaries, ledger_totals, most_recent_first, running_balances, AccountSummary,
    ActivityEvent, EntityType, LedgerEntry, LedgerSource, LedgerTotals, NewLedgerEntry,
    RunningEntry, SourceKind,
};
use tracing::debug;

use super::{activity, new_id};
use crate::error::{DbError, DbResult};

#[derive(Debug, Clone, sqlx::FromRow)]
struct LedgerRecord {
    id: String,
    entity_id: String,
    entity_type: EntityType,
    entity_name: String,
    date: DateTime<Utc>,
    description: String,
    cash_debit: f64,
    cash_credit: f64,
    gold_debit_grams: f64,
    gold_credit_grams: f64,
    source_kind: Option<SourceKind>,
    source_id: Option<String>,
}

impl From<LedgerRecord> for LedgerEntry {
    fn from(record: LedgerRecord) -> Self {
        let source = match (record.source_kind, record.source_id) {
            (Some(kind), Some(id)) => Some(LedgerSource { kind, id }),
            _ => None,
        };

        LedgerEntry {
            id: record.id,
            entity_id: record.entity_id,
            entity_type: record.entity_type,
            entity_name: record.entity_name,
            date: record.date,
            description: record.description,
            cash_debit: record.cash_debit,
            cash_credit: record.cash_credit,
            gold_debit_grams: record.gold_debit_grams,
            gold_credit_grams: record.gold_credit_grams,
            source,
        }
    }
}

const SELECT_ENTRY: &str = r#"
    SELECT id, entity_id, entity_type, entity_name, date, description,
           cash_debit, cash_credit, gold_debit_grams, gold_credit_grams,
           source_kind, source_id
    FROM ledger_entries
"#;

/// Validates and stores one entry on the caller's connection.
pub(crate) async fn insert_entry(
    conn: &mut SqliteConnection,
    draft: NewLedgerEntry,
) -> DbResult<LedgerEntry> {
    validate_ledger_entry(&draft)?;

    let entry = draft.into_entry(new_id());
    let (source_kind, source_id) = match &entry.source {
        Some(source) => (Some(source.kind), Some(source.id.as_str())),
        None => (None, None),
    };

    debug!(
        id = %entry.id,
        entity_id = %entry.entity_id,
        cash_delta = entry.cash_delta(),
        gold_delta = entry.gold_delta(),
        "Inserting ledger entry"
    );

    sqlx::query(
        r#"
        INSERT INTO ledger_entries (
            id, entity_id, entity_type, entity_name, date, description,
            cash_debit, cash_credit, gold_debit_grams, gold_credit_grams,
            source_kind, source_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.entity_id)
    .bind(entry.entity_type)
    .bind(&entry.entity_name)
    .bind(entry.date)
    .bind(&entry.description)
    .bind(entry.cash_debit)
    .bind(entry.cash_credit)
    .bind(entry.gold_debit_grams)
    .bind(entry.gold_credit_grams)
    .bind(source_kind)
    .bind(source_id)
    .execute(&mut *conn)
    .await?;

    Ok(entry)
}

/// Deletes every entry carrying the given back-reference.
pub(crate) async fn delete_by_source(
    conn: &mut SqliteConnection,
    source: &LedgerSource,
) -> DbResult<u64> {
    let result = sqlx::query("DELETE FROM ledger_entries WHERE source_kind = ?1 AND source_id = ?2")
        .bind(source.kind)
        .bind(&source.id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

/// Repository for hisaab entries and derived balances.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Appends a hand-entered entry and records `ledger.create`.
    ///
    /// Build the draft with the `sunar_core::posting` helpers.
    pub async fn append(&self, draft: NewLedgerEntry) -> DbResult<LedgerEntry> {
        let mut tx = self.pool.begin().await?;

        let entry = insert_entry(&mut tx, draft).await?;
        activity::record(
            &mut tx,
            ActivityEvent::LedgerCreate,
            &entry.id,
            format!("{}: {}", entry.entity_name, entry.description),
        )
        .await?;

        tx.commit().await?;
        Ok(entry)
    }

    /// Deletes a single entry and records `ledger.delete`.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM ledger_entries WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("LedgerEntry", id));
        }

        activity::record(&mut tx, ActivityEvent::LedgerDelete, id, "Ledger entry deleted").await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<LedgerEntry>> {
        let record: Option<LedgerRecord> =
            sqlx::query_as(&format!("{} WHERE id = ?1", SELECT_ENTRY))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(record.map(LedgerEntry::from))
    }

    /// Every entry in the ledger, in insertion order.
    pub async fn all_entries(&self) -> DbResult<Vec<LedgerEntry>> {
        let records: Vec<LedgerRecord> =
            sqlx::query_as(&format!("{} ORDER BY rowid", SELECT_ENTRY))
                .fetch_all(&self.pool)
                .await?;

        Ok(records.into_iter().map(LedgerEntry::from).collect())
    }

    /// Entries for one account, in insertion order.
    pub async fn entries_for(&self, entity_id: &str) -> DbResult<Vec<LedgerEntry>> {
        let records: Vec<LedgerRecord> = sqlx::query_as(&format!(
            "{} WHERE entity_id = ?1 ORDER BY rowid",
            SELECT_ENTRY
        ))
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(LedgerEntry::from).collect())
    }

    /// Entries a document posted.
    pub async fn entries_for_source(&self, source: &LedgerSource) -> DbResult<Vec<LedgerEntry>> {
        let records: Vec<LedgerRecord> = sqlx::query_as(&format!(
            "{} WHERE source_kind = ?1 AND source_id = ?2 ORDER BY rowid",
            SELECT_ENTRY
        ))
        .bind(source.kind)
        .bind(&source.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(LedgerEntry::from).collect())
    }

    /// An account's statement with running balances, oldest first.
    pub async fn statement(&self, entity_id: &str) -> DbResult<Vec<RunningEntry>> {
        Ok(running_balances(self.entries_for(entity_id).await?))
    }

    /// An account's statement, newest first.
    pub async fn statement_recent_first(&self, entity_id: &str) -> DbResult<Vec<RunningEntry>> {
        Ok(most_recent_first(self.statement(entity_id).await?))
    }

    /// Open balances per account; settled accounts are left out.
    pub async fn summaries(&self) -> DbResult<Vec<AccountSummary>> {
        Ok(account_summaries(self.all_entries().await?))
    }

    /// Shop-wide receivable and payable totals.
    pub async fn totals(&self) -> DbResult<LedgerTotals> {
        Ok(ledger_totals(&self.summaries().await?))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use chrono::{Duration, Utc};
    use sunar_core::posting::{cash_paid, cash_received, gold_issued, gold_received};
    use sunar_core::{ActivityEvent, CoreError, EntityType, ValidationError};

    use crate::error::DbError;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_statement_running_balances() {
        let db = db().await;
        let account = db
            .accounts()
            .create("Ahmed Khan", EntityType::Customer, None)
            .await
            .unwrap();
        let ledger = db.ledger();
        let day = Utc::now() - Duration::days(3);

        ledger
            .append(cash_paid(&account, 1000.0, day, "Ring on credit"))
            .await
            .unwrap();
        ledger
            .append(cash_received(&account, 400.0, day + Duration::days(1), "Part payment"))
            .await
            .unwrap();

        let statement = ledger.statement(&account.id).await.unwrap();
        assert_eq!(statement.len(), 2);
        assert_eq!(statement[0].running_cash_balance, 1000.0);
        assert_eq!(statement[1].running_cash_balance, 600.0);

        let recent = ledger.statement_recent_first(&account.id).await.unwrap();
        assert_eq!(recent[0].entry.description, "Part payment");
    }

    #[tokio::test]
    async fn test_backdated_entry_sorts_by_date() {
        let db = db().await;
        let karigar = db
            .accounts()
            .create("Rafiq", EntityType::Karigar, None)
            .await
            .unwrap();
        let ledger = db.ledger();
        let now = Utc::now();

        ledger
            .append(gold_received(&karigar, 9.5, now, "Returned bangles"))
            .await
            .unwrap();
        ledger
            .append(gold_issued(&karigar, 10.0, now - Duration::days(2), "Issued for bangles"))
            .await
            .unwrap();

        let statement = ledger.statement(&karigar.id).await.unwrap();
        assert_eq!(statement[0].entry.description, "Issued for bangles");
        assert_eq!(statement[0].running_gold_balance, 10.0);
        assert!((statement[1].running_gold_balance - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_summaries_outlive_deleted_account() {
        let db = db().await;
        let account = db
            .accounts()
            .create("Bilal", EntityType::Customer, None)
            .await
            .unwrap();
        db.ledger()
            .append(cash_paid(&account, 2500.0, Utc::now(), "Chain"))
            .await
            .unwrap();

        db.accounts().delete(&account.id).await.unwrap();

        let summaries = db.ledger().summaries().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].entity_name, "Bilal");
        assert_eq!(summaries[0].cash_balance, 2500.0);

        let totals = db.ledger().totals().await.unwrap();
        assert_eq!(totals.total_receivable, 2500.0);
        assert_eq!(totals.total_payable, 0.0);
    }

    #[tokio::test]
    async fn test_settled_account_left_out() {
        let db = db().await;
        let account = db
            .accounts()
            .create("Sana", EntityType::Customer, None)
            .await
            .unwrap();
        let now = Utc::now();
        db.ledger()
            .append(cash_paid(&account, 500.0, now, "Earrings"))
            .await
            .unwrap();
        db.ledger()
            .append(cash_received(&account, 500.0, now, "Paid in full"))
            .await
            .unwrap();

        assert!(db.ledger().summaries().await.unwrap().is_empty());
        assert_eq!(db.ledger().statement(&account.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_append_and_delete_are_logged() {
        let db = db().await;
        let account = db
            .accounts()
            .create("Usman", EntityType::Customer, None)
            .await
            .unwrap();
        let entry = db
            .ledger()
            .append(cash_received(&account, 300.0, Utc::now(), "Deposit"))
            .await
            .unwrap();

        db.ledger().delete(&entry.id).await.unwrap();
        assert!(db.ledger().get_by_id(&entry.id).await.unwrap().is_none());

        let log = db.activity().for_entity(&entry.id).await.unwrap();
        let events: Vec<_> = log.iter().map(|l| l.event).collect();
        assert_eq!(events, vec![ActivityEvent::LedgerCreate, ActivityEvent::LedgerDelete]);

        assert!(matches!(
            db.ledger().delete(&entry.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_manual_entry_has_no_source() {
        let db = db().await;
        let account = db
            .accounts()
            .create("Bilal", EntityType::Customer, None)
            .await
            .unwrap();
        let entry = db
            .ledger()
            .append(cash_received(&account, 1_200.0, Utc::now(), "Cash on account"))
            .await
            .unwrap();

        let stored = db.ledger().get_by_id(&entry.id).await.unwrap().unwrap();
        assert!(stored.source.is_none());

        let result = sqlx::query(
            r#"
            INSERT INTO ledger_entries (
                id, entity_id, entity_type, entity_name, date, description,
                cash_debit, source_kind, source_id
            ) VALUES ('x', ?1, 'customer', 'Bilal', ?2, 'Tagged', 10, 'manual', 'x')
            "#,
        )
        .bind(&account.id)
        .bind(Utc::now())
        .execute(db.pool())
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_empty_entry_rejected() {
        let db = db().await;
        let account = db
            .accounts()
            .create("Hina", EntityType::Customer, None)
            .await
            .unwrap();

        let result = db
            .ledger()
            .append(cash_received(&account, 0.0, Utc::now(), "Nothing"))
            .await;

        assert!(matches!(
            result,
            Err(DbError::Core(CoreError::Validation(ValidationError::EmptyEntry)))
        ));
        assert!(db.ledger().all_entries().await.unwrap().is_empty());
        assert!(db.activity().list_recent(10).await.unwrap().is_empty());
    }
}
