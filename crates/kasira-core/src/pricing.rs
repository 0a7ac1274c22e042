//! # Pricing Rule Resolver
//!
//! Given a product and context (quantity, customer tier, active discount
//! campaigns), computes the applicable unit price and discount amount.
//!
//! ## Contract
//! Pure function of (product, campaigns, customer) → absolute per-unit
//! discount ≥ 0. Campaigns may be defined as a percentage internally, but the
//! cart boundary always receives an absolute amount.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Discount Resolution                                  │
//! │                                                                         │
//! │  Campaigns ──► filter: active? in window? product matches?             │
//! │                        quantity ≥ min? tier qualifies?                 │
//! │                              │                                          │
//! │                              ▼                                          │
//! │              convert each to absolute per-unit amount                   │
//! │                              │                                          │
//! │                              ▼                                          │
//! │              pick the LARGEST, clamp to [0, unit price]                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Customer, CustomerTier, Product, UnitType};

// =============================================================================
// Unit Price
// =============================================================================

/// The effective unit price for a product in the given unit.
///
/// Carton price applies only when the unit is [`UnitType::Carton`] AND the
/// product is carton eligible (supports it, holds more than one piece, and
/// has a carton price). Everything else falls back to the piece price.
pub fn unit_price(product: &Product, unit_type: UnitType) -> Money {
    match unit_type {
        UnitType::Carton if product.carton_eligible() => {
            // carton_eligible() guarantees the price exists
            product.carton_price.unwrap_or(product.price)
        }
        _ => product.price,
    }
}

// =============================================================================
// Discount Campaigns
// =============================================================================

/// How a campaign expresses its discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum DiscountValue {
    /// Fixed amount off each unit.
    Fixed(Money),
    /// Percentage of the unit price, in basis points (1000 = 10%).
    Percent(u32),
}

/// A promotional discount campaign.
///
/// Campaigns come from the backend as a JSON collection; the resolver treats
/// them as read-only context.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountCampaign {
    pub id: String,
    pub name: String,

    /// Product the campaign targets; `None` applies storewide.
    pub product_id: Option<String>,

    /// Minimum line quantity before the campaign applies.
    pub min_quantity: i64,

    /// Minimum loyalty tier; `None` applies to everyone.
    pub min_tier: Option<CustomerTier>,

    pub value: DiscountValue,

    /// Activation window. `ends_at == None` means open-ended.
    #[ts(as = "String")]
    pub starts_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub ends_at: Option<DateTime<Utc>>,

    /// Soft kill-switch.
    pub is_active: bool,
}

impl DiscountCampaign {
    /// Checks whether this campaign applies in the given context.
    fn applies(
        &self,
        product: &Product,
        quantity: i64,
        customer: Option<&Customer>,
        now: DateTime<Utc>,
    ) -> bool {
        if !self.is_active {
            return false;
        }
        if now < self.starts_at {
            return false;
        }
        if let Some(ends_at) = self.ends_at {
            if now > ends_at {
                return false;
            }
        }
        if let Some(target) = &self.product_id {
            if target != &product.id {
                return false;
            }
        }
        if quantity < self.min_quantity {
            return false;
        }
        // An anonymous sale counts as Regular tier
        let tier = customer.map(|c| c.tier).unwrap_or_default();
        if let Some(min_tier) = self.min_tier {
            if tier < min_tier {
                return false;
            }
        }
        true
    }

    /// Converts this campaign to an absolute per-unit amount against the
    /// given unit price.
    fn per_unit_amount(&self, unit_price: Money) -> Money {
        match self.value {
            DiscountValue::Fixed(amount) => amount,
            DiscountValue::Percent(bps) => unit_price.percentage(bps),
        }
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolves the per-unit discount for a product.
///
/// Pure function: same inputs, same output. Returns the best (largest)
/// applicable discount among the campaigns, expressed as an absolute per-unit
/// amount and clamped to `[0, unit price]`. No applicable campaign yields
/// zero.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use kasira_core::money::Money;
/// use kasira_core::pricing::resolve_discount;
/// use kasira_core::types::UnitType;
/// # use kasira_core::types::Product;
/// # let product = Product {
/// #     id: "p".into(), barcode: None, name: "X".into(),
/// #     price: Money::new(10_000), carton_price: None, pcs_per_carton: 1,
/// #     supports_carton: false, stock: 0, is_active: true,
/// #     created_at: Utc::now(), updated_at: Utc::now(),
/// # };
/// let discount = resolve_discount(&product, 1, UnitType::Pcs, &[], None, Utc::now());
/// assert_eq!(discount, Money::zero());
/// ```
pub fn resolve_discount(
    product: &Product,
    quantity: i64,
    unit_type: UnitType,
    campaigns: &[DiscountCampaign],
    customer: Option<&Customer>,
    now: DateTime<Utc>,
) -> Money {
    let price = unit_price(product, unit_type);

    campaigns
        .iter()
        .filter(|c| c.applies(product, quantity, customer, now))
        .map(|c| c.per_unit_amount(price))
        .max()
        .unwrap_or_default()
        .clamp_non_negative()
        .min(price)
}

// =============================================================================
// Unit Tests
// =============================================================================
