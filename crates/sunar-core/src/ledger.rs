//! # Hisaab: Ledger Entries & Balance Aggregation
//!
//! The per-account cash + gold ledger.
//!
//! ## Sign Convention
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DEBIT  → entity owes the shop MORE   (receivable grows)                │
//! │  CREDIT → entity owes the shop LESS   (receivable shrinks / payable)    │
//! │                                                                         │
//! │  cash_balance = Σ cash_debit  − Σ cash_credit                           │
//! │  gold_balance = Σ gold_debit  − Σ gold_credit       (grams)             │
//! │                                                                         │
//! │   > 0  receivable: they owe the shop                                    │
//! │   < 0  payable:    the shop owes them                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//! Entries are append/delete only. A correction is a delete plus a new
//! entry, never an in-place edit of amounts.
//!
//! ## Read-Time Tolerance
//! Aggregation never fails. Entries whose account has been deleted are still
//! counted, under the name denormalized onto the entry itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use ts_rs::TS;

use crate::units::is_negligible;

// =============================================================================
// Entity Type
// =============================================================================

/// Who an account belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// A buyer of finished pieces.
    Customer,
    /// An artisan who receives shop gold and returns finished work.
    Karigar,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityType::Customer => write!(f, "customer"),
            EntityType::Karigar => write!(f, "karigar"),
        }
    }
}

// =============================================================================
// Provenance
// =============================================================================

/// Kind of record that produced a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Invoice,
    Order,
}

/// Back-reference from a ledger entry to the document that created it.
///
/// Reverting a document deletes exactly the entries carrying its source,
/// never entries matched by description or date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LedgerSource {
    pub kind: SourceKind,
    pub id: String,
}

impl LedgerSource {
    pub fn invoice(id: impl Into<String>) -> Self {
        LedgerSource {
            kind: SourceKind::Invoice,
            id: id.into(),
        }
    }

    pub fn order(id: impl Into<String>) -> Self {
        LedgerSource {
            kind: SourceKind::Order,
            id: id.into(),
        }
    }
}

// =============================================================================
// Ledger Entry
// =============================================================================

/// One line of an account's hisaab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LedgerEntry {
    pub id: String,
    pub entity_id: String,
    pub entity_type: EntityType,
    /// Name at the time of posting (the account may since have been deleted).
    pub entity_name: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub description: String,
    pub cash_debit: f64,
    pub cash_credit: f64,
    pub gold_debit_grams: f64,
    pub gold_credit_grams: f64,
    pub source: Option<LedgerSource>,
}

impl LedgerEntry {
    /// Signed cash movement: debit minus credit.
    #[inline]
    pub fn cash_delta(&self) -> f64 {
        self.cash_debit - self.cash_credit
    }

    /// Signed gold movement in grams: debit minus credit.
    #[inline]
    pub fn gold_delta(&self) -> f64 {
        self.gold_debit_grams - self.gold_credit_grams
    }
}

/// A ledger entry that has not been stored yet.
///
/// Produced by the [`crate::posting`] helpers; the repository assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewLedgerEntry {
    pub entity_id: String,
    pub entity_type: EntityType,
    pub entity_name: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub description: String,
    pub cash_debit: f64,
    pub cash_credit: f64,
    pub gold_debit_grams: f64,
    pub gold_credit_grams: f64,
    pub source: Option<LedgerSource>,
}

impl NewLedgerEntry {
    /// Materializes the draft under a storage id.
    pub fn into_entry(self, id: impl Into<String>) -> LedgerEntry {
        LedgerEntry {
            id: id.into(),
            entity_id: self.entity_id,
            entity_type: self.entity_type,
            entity_name: self.entity_name,
            date: self.date,
            description: self.description,
            cash_debit: self.cash_debit,
            cash_credit: self.cash_credit,
            gold_debit_grams: self.gold_debit_grams,
            gold_credit_grams: self.gold_credit_grams,
            source: self.source,
        }
    }
}

// =============================================================================
// Running Balances
// =============================================================================

/// A ledger entry with the account balance *after* it was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RunningEntry {
    #[serde(flatten)]
    pub entry: LedgerEntry,
    pub running_cash_balance: f64,
    pub running_gold_balance: f64,
}

/// Attaches running cash and gold balances to each entry.
///
/// ## Ordering
/// Entries are accumulated in ascending date order. Entries sharing a
/// timestamp keep their input (insertion) order, since the sort is stable.
/// Balances are tracked per `entity_id`, so a mixed slice yields each
/// account's own running sequence.
///
/// The returned vector is in accumulation order; use [`most_recent_first`]
/// to flip it for display without recomputing anything.
///
/// ## Example
/// ```rust,ignore
/// // entries: [debit 1000, credit 400]
/// let running = running_balances(entries);
/// assert_eq!(running[1].running_cash_balance, 600.0);
/// ```
pub fn running_balances(entries: Vec<LedgerEntry>) -> Vec<RunningEntry> {
    let mut entries = entries;
    entries.sort_by_key(|entry| entry.date);

    let mut balances: HashMap<String, (f64, f64)> = HashMap::new();

    entries
        .into_iter()
        .map(|entry| {
            let (cash, gold) = balances.entry(entry.entity_id.clone()).or_insert((0.0, 0.0));
            *cash += entry.cash_delta();
            *gold += entry.gold_delta();
            RunningEntry {
                running_cash_balance: *cash,
                running_gold_balance: *gold,
                entry,
            }
        })
        .collect()
}

/// Reverses accumulation order for a newest-first statement view.
pub fn most_recent_first(mut running: Vec<RunningEntry>) -> Vec<RunningEntry> {
    running.reverse();
    running
}

// =============================================================================
// Account Summaries
// =============================================================================

/// Final balances of one account (derived, never stored).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AccountSummary {
    pub entity_id: String,
    pub entity_name: String,
    pub entity_type: EntityType,
    /// Positive: receivable. Negative: payable.
    pub cash_balance: f64,
    /// Grams. Positive: they hold shop gold. Negative: the shop holds theirs.
    pub gold_balance: f64,
    pub entry_count: usize,
    #[ts(as = "String")]
    pub last_activity: DateTime<Utc>,
}

impl AccountSummary {
    /// Whether both balances are within tolerance of zero.
    pub fn is_settled(&self) -> bool {
        is_negligible(self.cash_balance) && is_negligible(self.gold_balance)
    }
}

/// Per-account final balances across the whole ledger.
///
/// - Grouped by `entity_id`; unknown or deleted accounts are included.
/// - Name and type come from the account's most recent entry.
/// - Settled accounts (both balances within ±0.001) are left out.
/// - Sorted by name, then id.
pub fn account_summaries(all_entries: Vec<LedgerEntry>) -> Vec<AccountSummary> {
    let mut by_entity: HashMap<String, AccountSummary> = HashMap::new();

    for running in running_balances(all_entries) {
        let entry = running.entry;
        let summary = by_entity
            .entry(entry.entity_id.clone())
            .or_insert_with(|| AccountSummary {
                entity_id: entry.entity_id.clone(),
                entity_name: entry.entity_name.clone(),
                entity_type: entry.entity_type,
                cash_balance: 0.0,
                gold_balance: 0.0,
                entry_count: 0,
                last_activity: entry.date,
            });

        // Ascending order: each entry is the latest seen so far
        summary.entity_name = entry.entity_name;
        summary.entity_type = entry.entity_type;
        summary.cash_balance = running.running_cash_balance;
        summary.gold_balance = running.running_gold_balance;
        summary.entry_count += 1;
        summary.last_activity = entry.date;
    }

    let mut summaries: Vec<AccountSummary> = by_entity
        .into_values()
        .filter(|summary| !summary.is_settled())
        .collect();

    summaries.sort_by(|a, b| {
        a.entity_name
            .cmp(&b.entity_name)
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });

    summaries
}

// =============================================================================
// Ledger Totals
// =============================================================================

/// Shop-wide receivable/payable totals for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LedgerTotals {
    pub total_receivable: f64,
    pub total_payable: f64,
    pub gold_receivable_grams: f64,
    pub gold_payable_grams: f64,
}

/// Sums positive balances as receivable and negative balances as payable.
pub fn ledger_totals(summaries: &[AccountSummary]) -> LedgerTotals {
    summaries
        .iter()
        .fold(LedgerTotals::default(), |mut totals, summary| {
            totals.total_receivable += summary.cash_balance.max(0.0);
            totals.total_payable += (-summary.cash_balance).max(0.0);
            totals.gold_receivable_grams += summary.gold_balance.max(0.0);
            totals.gold_payable_grams += (-summary.gold_balance).max(0.0);
            totals
        })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    fn entry(id: &str, entity: &str, date: DateTime<Utc>, cash: (f64, f64), gold: (f64, f64)) -> LedgerEntry {
        LedgerEntry {
            id: id.to_string(),
            entity_id: entity.to_string(),
            entity_type: EntityType::Customer,
            entity_name: format!("{} name", entity),
            date,
            description: String::new(),
            cash_debit: cash.0,
            cash_credit: cash.1,
            gold_debit_grams: gold.0,
            gold_credit_grams: gold.1,
            source: None,
        }
    }

    #[test]
    fn test_worked_example_running_balances() {
        let entries = vec![
            entry("a", "c1", at(1, 10), (1000.0, 0.0), (0.0, 0.0)),
            entry("b", "c1", at(2, 10), (0.0, 400.0), (0.0, 0.0)),
        ];
        let running = running_balances(entries);
        let balances: Vec<f64> = running.iter().map(|r| r.running_cash_balance).collect();
        assert_eq!(balances, vec![1000.0, 600.0]);
    }

    #[test]
    fn test_accumulates_in_date_order_regardless_of_input_order() {
        let entries = vec![
            entry("late", "c1", at(5, 10), (0.0, 400.0), (0.0, 0.0)),
            entry("early", "c1", at(1, 10), (1000.0, 0.0), (0.0, 0.0)),
        ];
        let running = running_balances(entries);
        assert_eq!(running[0].entry.id, "early");
        assert_eq!(running[0].running_cash_balance, 1000.0);
        assert_eq!(running[1].running_cash_balance, 600.0);
    }

    #[test]
    fn test_identical_timestamps_keep_insertion_order() {
        let same = at(3, 12);
        let entries = vec![
            entry("first", "c1", same, (500.0, 0.0), (0.0, 0.0)),
            entry("second", "c1", same, (0.0, 200.0), (0.0, 0.0)),
            entry("third", "c1", same, (100.0, 0.0), (0.0, 0.0)),
        ];
        let running = running_balances(entries);
        let order: Vec<&str> = running.iter().map(|r| r.entry.id.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
        let balances: Vec<f64> = running.iter().map(|r| r.running_cash_balance).collect();
        assert_eq!(balances, vec![500.0, 300.0, 400.0]);
    }

    #[test]
    fn test_display_reorder_keeps_running_values() {
        let entries = vec![
            entry("a", "c1", at(1, 10), (1000.0, 0.0), (5.0, 0.0)),
            entry("b", "c1", at(2, 10), (0.0, 400.0), (0.0, 2.0)),
        ];
        let newest_first = most_recent_first(running_balances(entries));
        assert_eq!(newest_first[0].entry.id, "b");
        assert_eq!(newest_first[0].running_cash_balance, 600.0);
        assert_eq!(newest_first[0].running_gold_balance, 3.0);
        assert_eq!(newest_first[1].running_cash_balance, 1000.0);
    }

    #[test]
    fn test_mixed_entities_run_independently() {
        let entries = vec![
            entry("a", "c1", at(1, 10), (1000.0, 0.0), (0.0, 0.0)),
            entry("b", "k1", at(2, 10), (0.0, 0.0), (20.0, 0.0)),
            entry("c", "c1", at(3, 10), (0.0, 250.0), (0.0, 0.0)),
        ];
        let running = running_balances(entries);
        assert_eq!(running[1].running_cash_balance, 0.0);
        assert_eq!(running[1].running_gold_balance, 20.0);
        assert_eq!(running[2].running_cash_balance, 750.0);
    }

    #[test]
    fn test_account_summaries_exclude_settled() {
        let entries = vec![
            entry("a", "c1", at(1, 10), (1000.0, 0.0), (0.0, 0.0)),
            entry("b", "c1", at(2, 10), (0.0, 1000.0), (0.0, 0.0)),
            entry("c", "c2", at(1, 11), (0.0, 300.0), (0.0, 0.0)),
            entry("d", "c3", at(1, 12), (0.1, 0.0), (0.0, 0.0)),
            entry("e", "c3", at(1, 13), (0.0, 0.0995), (0.0, 0.0)),
        ];
        let summaries = account_summaries(entries);
        let ids: Vec<&str> = summaries.iter().map(|s| s.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["c2"]);
        assert_eq!(summaries[0].cash_balance, -300.0);
    }

    #[test]
    fn test_gold_only_balance_is_not_settled() {
        let entries = vec![entry("a", "k1", at(1, 10), (0.0, 0.0), (0.0, 12.5))];
        let summaries = account_summaries(entries);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].gold_balance, -12.5);
        assert_eq!(summaries[0].entry_count, 1);
    }

    #[test]
    fn test_summary_uses_latest_denormalized_name() {
        let mut renamed = entry("b", "c1", at(2, 10), (50.0, 0.0), (0.0, 0.0));
        renamed.entity_name = "Ayesha Khan".to_string();
        let entries = vec![
            renamed,
            entry("a", "c1", at(1, 10), (100.0, 0.0), (0.0, 0.0)),
        ];
        let summaries = account_summaries(entries);
        assert_eq!(summaries[0].entity_name, "Ayesha Khan");
        assert_eq!(summaries[0].cash_balance, 150.0);
        assert_eq!(summaries[0].last_activity, at(2, 10));
    }

    #[test]
    fn test_ledger_totals_split_receivable_and_payable() {
        let entries = vec![
            entry("a", "c1", at(1, 10), (600.0, 0.0), (0.0, 0.0)),
            entry("b", "c2", at(1, 10), (0.0, 250.0), (3.0, 0.0)),
            entry("c", "k1", at(1, 10), (0.0, 0.0), (0.0, 7.5)),
        ];
        let totals = ledger_totals(&account_summaries(entries));
        assert_eq!(totals.total_receivable, 600.0);
        assert_eq!(totals.total_payable, 250.0);
        assert_eq!(totals.gold_receivable_grams, 3.0);
        assert_eq!(totals.gold_payable_grams, 7.5);
    }

    #[test]
    fn test_empty_ledger() {
        assert!(running_balances(Vec::new()).is_empty());
        assert!(account_summaries(Vec::new()).is_empty());
        assert_eq!(ledger_totals(&[]), LedgerTotals::default());
    }

    proptest! {
        #[test]
        fn prop_final_balance_is_net_of_all_entries(
            moves in proptest::collection::vec((0.0f64..10_000.0, 0.0f64..10_000.0, 1u32..28), 1..40)
        ) {
            let entries: Vec<LedgerEntry> = moves
                .iter()
                .enumerate()
                .map(|(i, (debit, credit, day))| {
                    entry(&i.to_string(), "c1", at(*day, 9), (*debit, *credit), (0.0, 0.0))
                })
                .collect();

            let running = running_balances(entries.clone());
            let last = running.last().unwrap().running_cash_balance;

            // Same accumulation order as the engine, so the sum is exact
            let mut sorted = entries;
            sorted.sort_by_key(|e| e.date);
            let expected = sorted.iter().fold(0.0, |acc, e| acc + e.cash_delta());
            prop_assert_eq!(last, expected);

            let total_debit: f64 = moves.iter().map(|m| m.0).sum();
            let total_credit: f64 = moves.iter().map(|m| m.1).sum();
            prop_assert!((last - (total_debit - total_credit)).abs() < 1e-6);

            let newest_first = most_recent_first(running);
            prop_assert_eq!(newest_first[0].running_cash_balance, last);
        }
    }
}
