//! # Rate Repository
//!
//! The shop's current metal rates, stored as a single `rate_settings` row.
//! Until the first save, reads return the table from `shop.toml`.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sunar_core::RateTable;
use tracing::{debug, info};

use crate::error::DbResult;

#[derive(Debug, Clone, sqlx::FromRow)]
struct RateRecord {
    gold_24k: f64,
    gold_22k: Option<f64>,
    gold_21k: Option<f64>,
    gold_18k: Option<f64>,
    palladium: f64,
    platinum: f64,
    silver: f64,
}

impl From<RateRecord> for RateTable {
    fn from(record: RateRecord) -> Self {
        RateTable {
            gold_24k: record.gold_24k,
            gold_22k: record.gold_22k,
            gold_21k: record.gold_21k,
            gold_18k: record.gold_18k,
            palladium: record.palladium,
            platinum: record.platinum,
            silver: record.silver,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RateRepository {
    pool: SqlitePool,
    fallback: RateTable,
}

impl RateRepository {
    pub fn new(pool: SqlitePool, fallback: RateTable) -> Self {
        RateRepository { pool, fallback }
    }

    /// Today's rates: the saved row, or the configured table.
    pub async fn current(&self) -> DbResult<RateTable> {
        let record: Option<RateRecord> = sqlx::query_as(
            r#"
            SELECT gold_24k, gold_22k, gold_21k, gold_18k, palladium, platinum, silver
            FROM rate_settings
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        match record {
            Some(record) => Ok(record.into()),
            None => {
                debug!("No saved rates, using configured table");
                Ok(self.fallback)
            }
        }
    }

    /// When rates were last saved.
    pub async fn updated_at(&self) -> DbResult<Option<DateTime<Utc>>> {
        let updated: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT updated_at FROM rate_settings WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;

        Ok(updated)
    }

    /// Replaces the current rates.
    pub async fn save(&self, rates: &RateTable) -> DbResult<()> {
        rates.validate()?;

        sqlx::query(
            r#"
            INSERT INTO rate_settings (
                id, gold_24k, gold_22k, gold_21k, gold_18k, palladium, platinum, silver, updated_at
            ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                gold_24k = excluded.gold_24k,
                gold_22k = excluded.gold_22k,
                gold_21k = excluded.gold_21k,
                gold_18k = excluded.gold_18k,
                palladium = excluded.palladium,
                platinum = excluded.platinum,
                silver = excluded.silver,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(rates.gold_24k)
        .bind(rates.gold_22k)
        .bind(rates.gold_21k)
        .bind(rates.gold_18k)
        .bind(rates.palladium)
        .bind(rates.platinum)
        .bind(rates.silver)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!(gold_24k = rates.gold_24k, "Rates updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use sunar_core::Karat;

    #[tokio::test]
    async fn test_falls_back_until_saved() {
        let config = DbConfig::in_memory().fallback_rates(RateTable::from_gold_24k(21_000.0));
        let db = Database::new(config).await.unwrap();

        assert_eq!(db.rates().current().await.unwrap().gold_24k, 21_000.0);
        assert!(db.rates().updated_at().await.unwrap().is_none());

        let saved = RateTable::from_gold_24k(24_000.0).with_gold_override(Karat::K21, 21_300.0);
        db.rates().save(&saved).await.unwrap();
        assert_eq!(db.rates().current().await.unwrap(), saved);

        let changed = RateTable::from_gold_24k(24_500.0);
        db.rates().save(&changed).await.unwrap();
        let current = db.rates().current().await.unwrap();
        assert_eq!(current.gold_21k, None);
        assert_eq!(current.gold_rate(Karat::K24), 24_500.0);
    }

    #[tokio::test]
    async fn test_invalid_rates_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut rates = RateTable::from_gold_24k(24_000.0);
        rates.silver = f64::NAN;

        assert!(matches!(db.rates().save(&rates).await, Err(DbError::Core(_))));
    }
}
