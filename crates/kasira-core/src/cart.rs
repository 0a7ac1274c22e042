//! # Cart Module
//!
//! The working sale being assembled before checkout.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Cart Operations                                    │
//! │                                                                         │
//! │  UI Action                 Operation              State Change          │
//! │  ─────────                 ─────────              ────────────          │
//! │  Click Product ──────────► add_item() ──────────► qty += 1 / new line   │
//! │  Change Quantity ────────► update_quantity() ───► qty = n (n ≥ 1)       │
//! │  Toggle PCS/Carton ──────► update_unit_type() ──► coerced if ineligible │
//! │  Edit Discount ──────────► update_item_discount()                       │
//! │  Campaign Change ────────► update_all_discounts(resolver)               │
//! │  Click Remove ───────────► remove_item()                                │
//! │  Click Clear ────────────► clear()                                      │
//! │  Read Total ─────────────► total() (derived, never stored)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Semantics
//! None of these operations can fail observably. Malformed input (quantity
//! below 1, unknown line id, carton on an ineligible product) is silently
//! ignored or coerced; negative discounts are accepted and clamped to zero
//! when totals are computed.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::pricing;
use crate::types::{Customer, Product, UnitType};

// =============================================================================
// Cart Item
// =============================================================================

/// A line in the cart.
///
/// ## Design Notes
/// Carries a full product snapshot frozen at the time of adding, so the cart
/// displays consistent data even if the catalog changes underneath it.
///
/// ## Invariants
/// - `quantity ≥ 1`
/// - `unit_type == Carton` only while the product is carton eligible
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartItem {
    /// Product snapshot (frozen at add time).
    pub product: Product,

    /// Quantity in the selected unit, always ≥ 1.
    pub quantity: i64,

    /// Unit the line is sold in.
    pub unit_type: UnitType,

    /// Per-unit discount. May be set negative by the UI; total computation
    /// clamps negative contributions to zero.
    pub discount: Money,
}

impl CartItem {
    /// Creates a line with quantity 1 in pieces.
    pub fn new(product: &Product, discount: Money) -> Self {
        CartItem {
            product: product.clone(),
            quantity: 1,
            unit_type: UnitType::Pcs,
            discount,
        }
    }

    /// The effective unit price for this line.
    ///
    /// Carton price applies only when the line is in carton unit AND the
    /// product is carton eligible; anything else falls back to the piece
    /// price.
    pub fn unit_price(&self) -> Money {
        pricing::unit_price(&self.product, self.unit_type)
    }

    /// Line total before discount: unit price × quantity.
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }

    /// Line discount: max(0, discount) × quantity.
    pub fn line_discount(&self) -> Money {
        self.discount.clamp_non_negative().multiply_quantity(self.quantity)
    }

    /// The line's contribution to the subtotal, clamped at zero.
    pub fn line_net(&self) -> Money {
        (self.line_total() - self.line_discount()).clamp_non_negative()
    }

    /// Coerces the unit type back to pieces when the product cannot support
    /// carton pricing. Silent, by contract.
    fn coerce_unit_type(&mut self) {
        if self.unit_type == UnitType::Carton && !self.product.carton_eligible() {
            self.unit_type = UnitType::Pcs;
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The in-progress, unconfirmed sale.
///
/// ## Invariants
/// - Lines are unique by product id; insertion order is preserved
/// - `total() ≥ 0` regardless of discount magnitude
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Cart {
    /// Lines in insertion order.
    pub items: Vec<CartItem>,

    /// Loyalty customer attached to the sale, if any.
    pub customer: Option<Customer>,

    /// Single amount subtracted from the cart subtotal, independent of
    /// per-line discounts.
    pub global_discount: Money,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds a product to the cart.
    ///
    /// ## Behavior
    /// - Product already present: quantity increments by 1 and the line
    ///   discount is overwritten with `discount` (defaulting to zero)
    /// - Otherwise: a new line with quantity 1 is appended
    ///
    /// No stock check happens here; stock is validated by checkout.
    pub fn add_item(&mut self, product: &Product, discount: Option<Money>) {
        let discount = discount.unwrap_or_default();
        if let Some(item) = self.items.iter_mut().find(|i| i.product.id == product.id) {
            item.quantity += 1;
            item.discount = discount;
            return;
        }
        self.items.push(CartItem::new(product, discount));
    }

    /// Bulk-replaces the cart contents.
    ///
    /// Each incoming line requesting carton unit on a product that cannot
    /// support carton pricing is coerced to pieces, silently.
    pub fn set_items(&mut self, items: Vec<CartItem>) {
        self.items = items;
        for item in &mut self.items {
            item.coerce_unit_type();
        }
    }

    /// Sets the quantity of a line.
    ///
    /// Quantities below 1 are ignored; removal is a distinct operation.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) {
        if quantity < 1 {
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|i| i.product.id == product_id) {
            item.quantity = quantity;
        }
    }

    /// Sets the unit type of a line, coercing carton to pieces when the
    /// product is not carton eligible (same rule as [`Cart::set_items`]).
    pub fn update_unit_type(&mut self, product_id: &str, unit_type: UnitType) {
        if let Some(item) = self.items.iter_mut().find(|i| i.product.id == product_id) {
            item.unit_type = unit_type;
            item.coerce_unit_type();
        }
    }

    /// Replaces a line's discount unconditionally.
    ///
    /// No negative-value guard at this layer; the total computation clamps
    /// negative contributions to zero.
    pub fn update_item_discount(&mut self, product_id: &str, amount: Money) {
        if let Some(item) = self.items.iter_mut().find(|i| i.product.id == product_id) {
            item.discount = amount;
        }
    }

    /// Re-derives every line's discount via a per-product calculator.
    ///
    /// Used when the promotional ruleset changes: the pricing resolver is
    /// passed in and applied to each snapshot.
    pub fn update_all_discounts<F>(&mut self, calculator: F)
    where
        F: Fn(&Product) -> Money,
    {
        for item in &mut self.items {
            item.discount = calculator(&item.product);
        }
    }

    /// Removes a line by product id. Unknown ids are ignored.
    pub fn remove_item(&mut self, product_id: &str) {
        self.items.retain(|i| i.product.id != product_id);
    }

    /// Attaches or detaches the loyalty customer.
    pub fn set_customer(&mut self, customer: Option<Customer>) {
        self.customer = customer;
    }

    /// Sets the global discount amount.
    pub fn set_global_discount(&mut self, amount: Money) {
        self.global_discount = amount;
    }

    /// Empties the cart, detaching the customer and resetting the global
    /// discount. Idempotent.
    pub fn clear(&mut self) {
        self.items.clear();
        self.customer = None;
        self.global_discount = Money::zero();
    }

    /// Sum of line contributions (each clamped at zero).
    pub fn subtotal(&self) -> Money {
        self.items
            .iter()
            .fold(Money::zero(), |acc, item| acc + item.line_net())
    }

    /// The cart total: max(0, subtotal − global discount). Never negative.
    pub fn total(&self) -> Money {
        (self.subtotal() - self.global_discount).clamp_non_negative()
    }

    /// Number of unique lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Total quantity across all lines (in each line's own unit).
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Looks up a line by product id.
    pub fn get(&self, product_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product.id == product_id)
    }
}

/// Cart totals summary for API responses.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub subtotal: Money,
    pub global_discount: Money,
    pub total: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            subtotal: cart.subtotal(),
            global_discount: cart.global_discount,
            total: cart.total(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
