//! # kasira-db: Database Layer for Kasira POS
//!
//! This crate provides database access for the Kasira POS system.
//! It uses SQLite for local storage with sqlx for async operations, and is
//! the authoritative side of every stateful operation: checkout, refunds,
//! stock movement, loyalty accrual, and the shift cash ledger. The terminal
//! layer proposes; this crate decides.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kasira POS Data Flow                             │
//! │                                                                         │
//! │  Terminal operation (checkout, open shift, ...)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     kasira-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (product.rs,  │    │  (embedded)  │  │   │
//! │  │   │               │    │  sale.rs,     │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│  shift.rs,    │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │    │  ...)         │    │ ...          │  │   │
//! │  │   │ Management    │    │               │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (kasira.db, WAL mode)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (product, customer,
//!   campaign, sale, shift)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kasira_db::{Database, DbConfig};
//!
//! let config = DbConfig::new("path/to/kasira.db");
//! let db = Database::new(config).await?;
//!
//! let products = db.products().search("indomie", 20).await?;
//! let sale = db.sales().checkout(request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::campaign::CampaignRepository;
pub use repository::customer::CustomerRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::{CheckoutLine, CheckoutRequest, SaleRepository};
pub use repository::shift::ShiftRepository;
