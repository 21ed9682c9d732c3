//! # Validation Module
//!
//! Write-time validation for documents and ledger entries.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: UI form (external)                                           │
//! │  └── Immediate feedback on empty / malformed fields                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (called by sunar-db before every insert)         │
//! │  ├── Names, SKUs, descriptions                                         │
//! │  └── Amounts: finite, non-negative, at least one movement              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  ├── NOT NULL / CHECK (amount >= 0) constraints                        │
//! │  └── UNIQUE (sku, invoice_number, order_number)                        │
//! │                                                                         │
//! │  Reads never validate: aggregation tolerates whatever is stored.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Item specs are validated by the calculator itself
//! ([`crate::calculator::validate_spec`]).

use crate::error::ValidationError;
use crate::ledger::NewLedgerEntry;
use crate::types::{Expense, Order};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_SKU_LEN: usize = 50;
const MAX_DESCRIPTION_LEN: usize = 500;

// =============================================================================
// String Validators
// =============================================================================

fn required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a SKU.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only letters, digits, hyphens and underscores
///
/// ## Example
/// ```rust
/// use sunar_core::validation::validate_sku;
///
/// assert!(validate_sku("RING-22K-014").is_ok());
/// assert!(validate_sku("").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    required("sku", sku, MAX_SKU_LEN)?;

    if !sku
        .trim()
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a person or product name (1..=200 characters).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    required(field, name, MAX_NAME_LEN)
}

pub fn validate_description(field: &str, description: &str) -> ValidationResult<()> {
    required(field, description, MAX_DESCRIPTION_LEN)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an amount that may be zero.
pub fn validate_amount(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite {
            field: field.to_string(),
        });
    }

    if value < 0.0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates an amount that must be strictly positive.
pub fn validate_positive(field: &str, value: f64) -> ValidationResult<()> {
    validate_amount(field, value)?;

    if value == 0.0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates a ledger entry before it is appended.
///
/// ## Rules
/// - Entity id, entity name and description present
/// - All four amounts finite and non-negative
/// - At least one amount non-zero
pub fn validate_ledger_entry(entry: &NewLedgerEntry) -> ValidationResult<()> {
    required("entity_id", &entry.entity_id, MAX_NAME_LEN)?;
    validate_name("entity_name", &entry.entity_name)?;
    validate_description("description", &entry.description)?;

    let amounts = [
        ("cash_debit", entry.cash_debit),
        ("cash_credit", entry.cash_credit),
        ("gold_debit_grams", entry.gold_debit_grams),
        ("gold_credit_grams", entry.gold_credit_grams),
    ];

    for (field, value) in amounts {
        validate_amount(field, value)?;
    }

    if amounts.iter().all(|(_, value)| *value == 0.0) {
        return Err(ValidationError::EmptyEntry);
    }

    Ok(())
}

pub fn validate_expense(expense: &Expense) -> ValidationResult<()> {
    validate_name("category", &expense.category)?;
    validate_description("description", &expense.description)?;
    validate_positive("amount", expense.amount)
}

pub fn validate_order(order: &Order) -> ValidationResult<()> {
    required("order_number", &order.order_number, MAX_SKU_LEN)?;
    validate_name("customer_name", &order.customer_name)?;
    validate_description("description", &order.description)?;
    validate_amount("advance_cash", order.advance_cash)?;
    validate_amount("advance_gold_grams", order.advance_gold_grams)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::CostBreakdown;
    use crate::ledger::EntityType;
    use crate::types::OrderStatus;
    use chrono::{NaiveDate, Utc};

    fn entry() -> NewLedgerEntry {
        NewLedgerEntry {
            entity_id: "acc-1".to_string(),
            entity_type: EntityType::Karigar,
            entity_name: "Rafiq".to_string(),
            date: Utc::now(),
            description: "Gold for chains".to_string(),
            cash_debit: 0.0,
            cash_credit: 0.0,
            gold_debit_grams: 25.0,
            gold_credit_grams: 0.0,
            source: None,
        }
    }

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("RING-22K-014").is_ok());
        assert!(validate_sku("bangle_set_2").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Ayesha Khan").is_ok());
        assert!(matches!(
            validate_name("name", ""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_name("name", &"A".repeat(201)),
            Err(ValidationError::TooLong { max: 200, .. })
        ));
    }

    #[test]
    fn test_valid_ledger_entry() {
        assert!(validate_ledger_entry(&entry()).is_ok());
    }

    #[test]
    fn test_ledger_entry_rejects_negative_and_nan() {
        let mut bad = entry();
        bad.cash_credit = -10.0;
        assert!(matches!(
            validate_ledger_entry(&bad),
            Err(ValidationError::Negative { ref field }) if field == "cash_credit"
        ));

        let mut bad = entry();
        bad.gold_debit_grams = f64::NAN;
        assert!(matches!(
            validate_ledger_entry(&bad),
            Err(ValidationError::NotFinite { .. })
        ));
    }

    #[test]
    fn test_ledger_entry_must_move_something() {
        let mut empty = entry();
        empty.gold_debit_grams = 0.0;
        assert!(matches!(
            validate_ledger_entry(&empty),
            Err(ValidationError::EmptyEntry)
        ));
    }

    #[test]
    fn test_ledger_entry_requires_identity() {
        let mut bad = entry();
        bad.entity_name = "  ".to_string();
        assert!(validate_ledger_entry(&bad).is_err());

        let mut bad = entry();
        bad.description = String::new();
        assert!(validate_ledger_entry(&bad).is_err());
    }

    #[test]
    fn test_validate_expense() {
        let mut expense = Expense {
            id: "exp-1".to_string(),
            category: "Utilities".to_string(),
            description: "Electricity bill".to_string(),
            amount: 8_500.0,
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        };
        assert!(validate_expense(&expense).is_ok());

        expense.amount = 0.0;
        assert!(matches!(
            validate_expense(&expense),
            Err(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_validate_order() {
        let mut order = Order {
            id: "ord-1".to_string(),
            order_number: "ORD-0001".to_string(),
            account_id: None,
            customer_name: "Sana".to_string(),
            description: "Jhumkas".to_string(),
            estimate: CostBreakdown::default(),
            advance_cash: 0.0,
            advance_gold_grams: 0.0,
            status: OrderStatus::Pending,
            due_date: None,
            created_at: Utc::now(),
        };
        assert!(validate_order(&order).is_ok());

        order.advance_gold_grams = -1.0;
        assert!(validate_order(&order).is_err());
    }
}
