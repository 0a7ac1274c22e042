//! # kasira-core: Pure Business Logic for Kasira POS
//!
//! This crate is the **heart** of Kasira POS. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kasira POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Frontend (browser)                           │   │
//! │  │    Catalog UI ──► Cart UI ──► Checkout UI ──► Shift UI         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ REST                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kasira-terminal                              │   │
//! │  │    cart session, checkout submission, logout guard             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kasira-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │  money  │ │  cart   │ │ pricing │ │  shift  │  │   │
//! │  │   │ Product │ │  Money  │ │  Cart   │ │ resolve │ │  Shift  │  │   │
//! │  │   │Customer │ │ parsing │ │CartItem │ │ unit    │ │ close   │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kasira-db (Database Layer)                   │   │
//! │  │       SQLite: catalog, customers, checkout, shift ledger        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Customer, Sale, Shift enums, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - The working sale: line items, discounts, total computation
//! - [`pricing`] - Discount campaign resolution and unit pricing
//! - [`shift`] - Cashier shift lifecycle and cash reconciliation
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are whole rupiah (i64), no floats
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use kasira_core::cart::Cart;
//! use kasira_core::money::Money;
//! # use chrono::Utc;
//! # use kasira_core::types::Product;
//! # let product = Product {
//! #     id: "p".into(), barcode: None, name: "Teh Botol".into(),
//! #     price: Money::new(5_000), carton_price: None, pcs_per_carton: 1,
//! #     supports_carton: false, stock: 24, is_active: true,
//! #     created_at: Utc::now(), updated_at: Utc::now(),
//! # };
//!
//! let mut cart = Cart::new();
//! cart.add_item(&product, Some(Money::new(500)));
//! cart.add_item(&product, Some(Money::new(500))); // quantity becomes 2
//!
//! // Line: max(0, 5.000×2 − 500×2) = 9.000
//! assert_eq!(cart.total(), Money::new(9_000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod pricing;
pub mod shift;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use kasira_core::Money` instead of
// `use kasira_core::money::Money`

pub use cart::{Cart, CartItem, CartTotals};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{DiscountCampaign, DiscountValue};
pub use shift::{ApprovalStatus, Shift, ShiftPolicy, ShiftStatus};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single line at checkout.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
/// Cart mutations are unchecked by contract; this applies at the checkout
/// boundary.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Rupiah of sale total per loyalty point, floor division.
///
/// A Rp 127.500 sale earns 12 points. Applied by the checkout transaction,
/// never by the cart.
pub const LOYALTY_POINT_UNIT: i64 = 10_000;

/// Local storage key under which the terminal persists its cart snapshot.
pub const CART_STORAGE_KEY: &str = "kasira.cart";
