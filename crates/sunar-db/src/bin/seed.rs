//! # Seed Data Generator
//!
//! Populates a development database with a small but complete shop:
//! rates, accounts, catalog pieces, an invoice, an order, expenses and a
//! karigar's gold hisaab. Prints the resulting account summaries.
//!
//! ## Usage
//! ```bash
//! # Seed ./sunar_dev.db
//! cargo run -p sunar-db --bin seed
//!
//! # Specify database path
//! cargo run -p sunar-db --bin seed -- --db ./data/sunar.db
//!
//! # Take rates and shop name from a config file
//! cargo run -p sunar-db --bin seed -- --config ./shop.toml
//! ```
//!
//! Logging follows `RUST_LOG` (default `info,sunar=debug,sqlx=warn`).

use chrono::{Datelike, Duration, Utc};
use std::env;
use std::path::PathBuf;
use sunar_core::calculator::compute;
use sunar_core::posting::{cash_paid, gold_issued, gold_received, making_charges_due};
use sunar_core::units::{format_currency, format_grams};
use sunar_core::{EntityType, ItemSpec, Karat, MetalBlock, MetalType, Pricing, RateTable};
use sunar_db::{Database, ExpenseDraft, InvoiceDraft, InvoiceLineDraft, OrderDraft, ShopConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Catalog pieces: (sku, name, pricing).
fn catalog() -> Vec<(&'static str, &'static str, Pricing)> {
    let mut ring = ItemSpec::gold(Karat::K21, 6.2);
    ring.wastage_percentage = 8.0;
    ring.making_charges = 4500.0;

    let mut bangles = ItemSpec::gold(Karat::K22, 24.0);
    bangles.wastage_percentage = 6.0;
    bangles.making_charges = 12_000.0;

    let mut pendant = ItemSpec::gold(Karat::K18, 4.5);
    pendant.making_charges = 3500.0;
    pendant.has_diamonds = true;
    pendant.diamond_charges = 65_000.0;
    pendant.secondary_metal = Some(MetalBlock {
        metal: MetalType::Platinum,
        karat: None,
        weight_grams: 0.8,
    });

    let mut jhumka = ItemSpec::gold(Karat::K21, 11.0);
    jhumka.wastage_percentage = 10.0;
    jhumka.making_charges = 7000.0;
    jhumka.has_stones = true;
    jhumka.stone_weight_grams = 1.2;
    jhumka.stone_charges = 2500.0;

    let mut anklet = ItemSpec::plain(MetalType::Silver, 38.0);
    anklet.making_charges = 1800.0;

    vec![
        ("RNG-001", "Ladies ring", Pricing::Formula(ring)),
        ("BNG-001", "Bangle pair", Pricing::Formula(bangles)),
        ("PND-001", "Diamond pendant", Pricing::Formula(pendant)),
        ("JHM-001", "Jhumka earrings", Pricing::Formula(jhumka)),
        ("ANK-001", "Silver anklet", Pricing::Formula(anklet)),
        ("NTH-001", "Antique nath", Pricing::Override { amount: 95_000.0 }),
    ]
}

fn print_usage() {
    println!("Sunar Ledger Seed Data Generator");
    println!();
    println!("Usage: seed [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -d, --db <PATH>       Database file path (default: ./sunar_dev.db)");
    println!("  -c, --config <PATH>   shop.toml to take rates and shop name from");
    println!("  -h, --help            Show this help message");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sunar=debug,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = PathBuf::from("./sunar_dev.db");
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-d" | "--db" => {
                if i + 1 < args.len() {
                    db_path = PathBuf::from(&args[i + 1]);
                    i += 1;
                }
            }
            "-c" | "--config" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = match config_path {
        Some(path) => ShopConfig::load(Some(path))?,
        None => ShopConfig::default(),
    };
    config.database.path = db_path;
    if config.rates.gold_24k == 0.0 {
        config.rates = RateTable::from_gold_24k(24_000.0)
            .with_gold_override(Karat::K21, 21_300.0);
        config.rates.platinum = 9_500.0;
        config.rates.silver = 280.0;
    }

    println!("Sunar Ledger Seed Data Generator");
    println!("================================");
    println!("Shop:     {}", config.shop.name);
    println!("Database: {}", config.database.path.display());
    println!();

    let db = Database::new(config.db_config()).await?;
    info!("Connected and migrated");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Rates
    db.rates().save(&config.rates).await?;
    let rates = db.rates().current().await?;
    println!("Rates saved (24k: {})", format_currency(rates.gold_24k));

    // Accounts
    let ahmed = db
        .accounts()
        .create("Ahmed Khan", EntityType::Customer, Some("0300-1112233"))
        .await?;
    let ayesha = db
        .accounts()
        .create("Ayesha Siddiqui", EntityType::Customer, Some("0321-4445566"))
        .await?;
    let rafiq = db
        .accounts()
        .create("Rafiq Karigar", EntityType::Karigar, None)
        .await?;
    println!("Created 3 accounts");

    // Catalog
    let mut products = Vec::new();
    for (sku, name, pricing) in catalog() {
        products.push(db.products().create(sku, name, pricing).await?);
    }
    println!("Created {} catalog pieces", products.len());

    // Invoice on account: ring + bangles, part paid
    let lines = products[..2]
        .iter()
        .map(|product| InvoiceLineDraft::from_product(product, &rates))
        .collect::<Result<Vec<_>, _>>()?;
    let invoice = db
        .invoices()
        .create(InvoiceDraft {
            account_id: Some(ahmed.id.clone()),
            customer_name: ahmed.name.clone(),
            lines,
            discount: 2_000.0,
            cash_received: 300_000.0,
        })
        .await?;
    let totals = invoice.totals()?;
    println!(
        "Invoice {}: total {}, balance {}",
        invoice.invoice_number,
        format_currency(totals.grand_total),
        format_currency(totals.balance_due)
    );

    // Custom order with cash and old gold advance
    let mut set = ItemSpec::gold(Karat::K22, 45.0);
    set.wastage_percentage = 7.0;
    set.making_charges = 35_000.0;
    let order = db
        .orders()
        .create(OrderDraft {
            account_id: Some(ayesha.id.clone()),
            customer_name: ayesha.name.clone(),
            description: "Bridal necklace set".to_string(),
            estimate: compute(&Pricing::Formula(set), &rates)?,
            advance_cash: 150_000.0,
            advance_gold_grams: 18.5,
            due_date: Some(Utc::now().date_naive() + Duration::days(45)),
        })
        .await?;
    println!("Order {} booked", order.order_number);

    // Expenses
    let today = Utc::now().date_naive();
    let month_start = today.with_day(1).unwrap_or(today);
    for (category, description, amount) in [
        ("Rent", "Shop rent", 45_000.0),
        ("Utilities", "Electricity bill", 8_200.0),
        ("Supplies", "Polish and buffing compound", 1_500.0),
    ] {
        db.expenses()
            .create(ExpenseDraft {
                category: category.to_string(),
                description: description.to_string(),
                amount,
                date: today,
            })
            .await?;
    }
    println!(
        "Expenses this month: {}",
        format_currency(db.expenses().total_between(month_start, today).await?)
    );

    // Karigar hisaab: gold issued, work returned, labour owed
    let now = Utc::now();
    let ledger = db.ledger();
    ledger
        .append(gold_issued(&rafiq, 50.0, now - Duration::days(10), "Gold for bangles"))
        .await?;
    ledger
        .append(gold_received(&rafiq, 47.8, now - Duration::days(2), "Bangles returned"))
        .await?;
    ledger
        .append(making_charges_due(&rafiq, 18_000.0, now - Duration::days(2), "Labour on bangles"))
        .await?;
    ledger
        .append(cash_paid(&rafiq, 10_000.0, now, "Part payment for labour"))
        .await?;

    // Summaries
    println!();
    println!("Account summaries");
    println!("-----------------");
    for summary in db.ledger().summaries().await? {
        println!(
            "  {:<20} {:<9} cash {:>14}  gold {:>10}",
            summary.entity_name,
            summary.entity_type.to_string(),
            format_currency(summary.cash_balance),
            format_grams(summary.gold_balance)
        );
    }

    let totals = db.ledger().totals().await?;
    println!();
    println!("Receivable: {}", format_currency(totals.total_receivable));
    println!("Payable:    {}", format_currency(totals.total_payable));
    println!(
        "Gold out:   {}  Gold held: {}",
        format_grams(totals.gold_receivable_grams),
        format_grams(totals.gold_payable_grams)
    );

    println!();
    println!("Seed complete!");

    db.close().await;
    Ok(())
}
