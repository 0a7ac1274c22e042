//! # kasira-terminal: Terminal Orchestration for Kasira POS
//!
//! The layer between the POS screen and the database: it owns the live cart,
//! persists it across restarts, resolves campaign discounts as lines change,
//! and turns the cart into a checkout transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Frontend (browser)                                                     │
//! │       │ scan / edit cart / pay / open-close shift                      │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 kasira-terminal (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌─────────────────┐  │   │
//! │  │   │  CartSession  │   │TerminalSession│   │    ApiError     │  │   │
//! │  │   │  (store.rs)   │   │ (session.rs)  │   │   (error.rs)    │  │   │
//! │  │   │               │   │               │   │                 │  │   │
//! │  │   │ persist every │   │ scan, attach, │   │ code + message  │  │   │
//! │  │   │ mutation      │   │ checkout,     │   │ for the screen  │  │   │
//! │  │   │               │   │ logout guard  │   │                 │  │   │
//! │  │   └───────────────┘   └───────────────┘   └─────────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  kasira-db (authoritative: stock, loyalty, shift cash)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Trust Boundary
//! The terminal's cart math (kasira-core) gives the cashier live totals, but
//! checkout sends only product ids, quantities and discounts; kasira-db
//! recomputes everything against current rows before committing.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod session;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::{build_checkout_request, CheckoutContext};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use session::TerminalSession;
pub use store::{CartSession, CartStore, JsonFileStore, MemoryStore, StoreError};
