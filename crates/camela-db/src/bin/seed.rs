//! # Seed Data Generator
//!
//! Populates the database with demo catalog, stock, sales and expenses for
//! development.
//!
//! ## Usage
//! ```bash
//! # Default database path (./camela_dev.db)
//! cargo run -p camela-db --bin seed
//!
//! # Specify database path
//! cargo run -p camela-db --bin seed -- --db ./data/camela.db
//! ```
//!
//! Everything stock-related goes through the LedgerWriter, never raw SQL,
//! so the seeded database satisfies the same consistency rules as a real
//! one: every unit on the shelf has a matching purchase expense, every
//! sale has its items and its stock decrement.

use std::env;

use camela_core::{CartLine, ExpenseCategory, Money};
use camela_db::{Database, DbConfig};
use chrono::Utc;
use tracing_subscriber::EnvFilter;

/// Demo catalog: (name, buy_price, sell_price, initial stock units).
const CATALOG: &[(&str, i64, i64, i64)] = &[
    ("Kaos Polos Hitam", 50_000, 80_000, 24),
    ("Kaos Polos Putih", 50_000, 80_000, 24),
    ("Kemeja Flanel", 95_000, 150_000, 12),
    ("Celana Jeans Slim", 120_000, 200_000, 10),
    ("Celana Chino", 90_000, 145_000, 10),
    ("Jaket Hoodie", 110_000, 185_000, 8),
    ("Topi Baseball", 25_000, 45_000, 30),
    ("Kaos Kaki 3-Pack", 18_000, 35_000, 40),
    ("Ikat Pinggang Kulit", 60_000, 110_000, 15),
    ("Tas Selempang", 75_000, 130_000, 6),
];

/// Demo walk-in and named customers for the sample sales.
const CUSTOMERS: &[&str] = &["", "Budi", "Siti", "", "Agus", "Rina"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./camela_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Camela Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./camela_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Camela Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("* Connected, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("! Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let ledger = db.ledger();
    let start = std::time::Instant::now();

    // Catalog + stock. Replenishment writes the purchase expenses.
    let mut product_ids = Vec::new();
    for (name, buy, sell, stock) in CATALOG {
        let product = db
            .products()
            .create(name, Money::new(*buy), Money::new(*sell))
            .await?;
        ledger.replenish_stock(&product.id, *stock, None).await?;
        product_ids.push(product.id);
    }
    println!("* Seeded {} products with stock", product_ids.len());

    // A spread of sample sales: each customer buys one or two products.
    let mut sale_count = 0;
    for (n, customer) in CUSTOMERS.iter().enumerate() {
        let first = &product_ids[n % product_ids.len()];
        let second = &product_ids[(n + 3) % product_ids.len()];

        let mut lines = vec![CartLine::new(first, 1 + (n as i64 % 3))];
        if n % 2 == 0 {
            lines.push(CartLine::new(second, 1));
        }

        ledger.checkout(customer, &lines).await?;
        sale_count += 1;
    }
    println!("* Recorded {} sample sales", sale_count);

    // Manual operational expenses.
    let today = Utc::now().date_naive();
    db.expenses()
        .create(
            "Store rent",
            Money::new(2_500_000),
            ExpenseCategory::Operational,
            Some("monthly"),
            today,
        )
        .await?;
    db.expenses()
        .create(
            "Electricity bill",
            Money::new(450_000),
            ExpenseCategory::Operational,
            None,
            today,
        )
        .await?;
    println!("* Recorded 2 operational expenses");

    let summary = db
        .reports()
        .financial_summary(camela_core::aggregator::DateRange::all_time())
        .await?;
    let valuation = db.reports().stock_valuation().await?;

    println!();
    println!("* Seed complete in {:?}", start.elapsed());
    println!("  Revenue:        {}", summary.revenue);
    println!("  Net profit:     {}", summary.net_profit);
    println!("  Stock at cost:  {}", valuation.total_cost_value);

    Ok(())
}
