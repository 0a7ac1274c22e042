//! # Seed Data Generator
//!
//! Populates the database with minimarket catalog data for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default development database
//! cargo run -p kasira-db --bin seed
//!
//! # Specify database path
//! cargo run -p kasira-db --bin seed -- --db ./data/kasira.db
//! ```
//!
//! ## Generated Data
//! - Products across typical categories (instant noodles, drinks, snacks,
//!   toiletries), some with carton pricing
//! - A handful of loyalty customers at different tiers
//! - Two discount campaigns (one fixed, one percent)

use std::env;

use chrono::{Duration, Utc};
use tracing_subscriber::EnvFilter;

use kasira_core::{CustomerTier, DiscountValue, Money};
use kasira_db::repository::campaign::NewCampaign;
use kasira_db::repository::product::NewProduct;
use kasira_db::{Database, DbConfig};

/// (name, barcode, piece price, carton price, pcs/carton, stock in pcs)
const PRODUCTS: &[(&str, &str, i64, Option<i64>, i64, i64)] = &[
    ("Indomie Goreng 85g", "08993175537", 3_500, Some(120_000), 40, 400),
    ("Indomie Soto 70g", "08993175520", 3_200, Some(110_000), 40, 240),
    ("Teh Botol Sosro 450ml", "08996001600", 5_000, Some(95_000), 24, 96),
    ("Teh Kotak 200ml", "08998009010", 4_000, Some(85_000), 24, 120),
    ("Aqua 600ml", "08993675002", 4_000, Some(82_000), 24, 240),
    ("Le Minerale 600ml", "08997009430", 3_500, Some(72_000), 24, 144),
    ("Chitato Sapi Panggang 68g", "08992775310", 11_000, None, 1, 48),
    ("Qtela Singkong 60g", "08992775990", 9_500, None, 1, 36),
    ("SilverQueen Cashew 58g", "08990057110", 14_500, None, 1, 24),
    ("Beng Beng 20g", "08996001312", 2_000, Some(44_000), 24, 192),
    ("Kopi Kapal Api Special 65g", "08990575001", 8_000, None, 1, 30),
    ("Gula Pasir Gulaku 1kg", "08997212700", 17_500, None, 1, 40),
    ("Minyak Goreng Bimoli 1L", "08991002410", 21_000, Some(240_000), 12, 60),
    ("Sabun Lifebuoy 85g", "08999999028", 4_500, Some(300_000), 72, 144),
    ("Shampo Pantene Sachet", "04902430351", 1_000, Some(44_000), 48, 288),
    ("Rokok Sampoerna Mild 16", "08998989100", 32_000, None, 1, 50),
];

/// (name, phone, tier)
const CUSTOMERS: &[(&str, &str, CustomerTier)] = &[
    ("Budi Santoso", "081234567890", CustomerTier::Regular),
    ("Siti Aminah", "085611122233", CustomerTier::Silver),
    ("Agus Wijaya", "081998877665", CustomerTier::Gold),
    ("Dewi Lestari", "087755443322", CustomerTier::Platinum),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./kasira_dev.db");

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
                println!("Kasira POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./kasira_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Kasira POS Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding products...");
    for (name, barcode, price, carton_price, pcs_per_carton, stock) in PRODUCTS {
        let new = NewProduct {
            barcode: Some((*barcode).to_string()),
            name: (*name).to_string(),
            price: Money::new(*price),
            carton_price: carton_price.map(Money::new),
            pcs_per_carton: *pcs_per_carton,
            supports_carton: carton_price.is_some(),
            stock: *stock,
        };
        if let Err(e) = db.products().insert(&new).await {
            eprintln!("Failed to insert {}: {}", name, e);
        }
    }
    println!("✓ {} products", PRODUCTS.len());

    println!("Seeding customers...");
    for (name, phone, tier) in CUSTOMERS {
        let customer = db.customers().insert(name, Some(phone)).await?;
        if *tier != CustomerTier::Regular {
            db.customers().set_tier(&customer.id, *tier).await?;
        }
    }
    println!("✓ {} customers", CUSTOMERS.len());

    println!("Seeding campaigns...");
    let mut payday = NewCampaign::storewide(
        "Promo Gajian 10%",
        DiscountValue::Percent(1_000),
    );
    payday.ends_at = Some(Utc::now() + Duration::days(7));
    db.campaigns().insert(&payday).await?;

    let mut bulk_noodles = NewCampaign::storewide(
        "Indomie borongan",
        DiscountValue::Fixed(Money::new(200)),
    );
    bulk_noodles.min_quantity = 10;
    db.campaigns().insert(&bulk_noodles).await?;
    println!("✓ 2 campaigns");

    println!();
    println!("Done. Open a shift and start selling.");

    Ok(())
}
