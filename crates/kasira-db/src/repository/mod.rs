//! # Repository Module
//!
//! Database repository implementations for Kasira POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Terminal operation                                                    │
//! │       │                                                                 │
//! │       │  db.products().search("indomie", 20)                           │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── search(&self, query, limit)                                       │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── insert(&self, product)                                            │
//! │  └── update(&self, product)                                            │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • SQL is isolated in one place                                        │
//! │  • Multi-step business transactions live next to their queries         │
//! │  • Easy to test against an in-memory database                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog CRUD, search, stock reads
//! - [`customer::CustomerRepository`] - Loyalty customer lookup
//! - [`campaign::CampaignRepository`] - Active discount campaigns
//! - [`sale::SaleRepository`] - Checkout transaction and refunds
//! - [`shift::ShiftRepository`] - Shift lifecycle and cash ledger

pub mod campaign;
pub mod customer;
pub mod product;
pub mod sale;
pub mod shift;
