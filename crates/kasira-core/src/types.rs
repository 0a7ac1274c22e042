//! # Domain Types
//!
//! Core domain types used throughout Kasira POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Customer     │   │      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  price          │   │  tier           │   │  receipt_number │       │
//! │  │  carton_price   │   │  points         │   │  total          │       │
//! │  │  pcs_per_carton │   │  total_spending │   │  payment_method │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    UnitType     │   │  CustomerTier   │   │  PaymentMethod  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Pcs            │   │  Regular        │   │  Cash           │       │
//! │  │  Carton         │   │  Silver         │   │  Card           │       │
//! │  └─────────────────┘   │  Gold           │   │  Qris           │       │
//! │                        │  Platinum       │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! `SaleLine` freezes product data (name, unit price) at checkout time so the
//! sale history stays consistent even when the catalog changes afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Unit Type
// =============================================================================

/// The unit a cart line is sold in.
///
/// Carton is a bulk unit composed of `pcs_per_carton` pieces, sold at a
/// distinct price. A line may only carry `Carton` when the product is carton
/// eligible; every mutation path coerces ineligible lines back to `Pcs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnitType {
    /// Individual pieces.
    Pcs,
    /// Whole cartons at the carton price.
    Carton,
}

impl Default for UnitType {
    fn default() -> Self {
        UnitType::Pcs
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Barcode (EAN-13, UPC-A, etc.).
    pub barcode: Option<String>,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Price per piece.
    pub price: Money,

    /// Price per carton, when the product is sold in cartons.
    pub carton_price: Option<Money>,

    /// Pieces contained in one carton.
    pub pcs_per_carton: i64,

    /// Whether the product may be sold by the carton at all.
    pub supports_carton: bool,

    /// Current stock level, counted in pieces.
    pub stock: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks whether the product can be sold by the carton.
    ///
    /// All three conditions are required: the flag must be set, the carton
    /// must hold more than one piece, and a carton price must exist.
    pub fn carton_eligible(&self) -> bool {
        self.supports_carton && self.pcs_per_carton > 1 && self.carton_price.is_some()
    }

    /// Converts a quantity in the given unit to pieces.
    ///
    /// Carton quantities on ineligible products fall back to pieces, matching
    /// the cart's coercion rule.
    pub fn quantity_in_pcs(&self, quantity: i64, unit_type: UnitType) -> i64 {
        match unit_type {
            UnitType::Carton if self.carton_eligible() => quantity * self.pcs_per_carton,
            _ => quantity,
        }
    }

    /// Returns the stock expressed as whole cartons plus remainder pieces.
    ///
    /// This is a derived read for display, never stored state.
    pub fn stock_breakdown(&self) -> StockBreakdown {
        if self.carton_eligible() {
            StockBreakdown {
                cartons: self.stock / self.pcs_per_carton,
                pcs: self.stock % self.pcs_per_carton,
            }
        } else {
            StockBreakdown {
                cartons: 0,
                pcs: self.stock,
            }
        }
    }
}

/// Stock displayed as `N carton + M pcs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockBreakdown {
    pub cartons: i64,
    pub pcs: i64,
}

// =============================================================================
// Customer & Loyalty Tier
// =============================================================================

/// Customer loyalty tier, derived externally from spending thresholds.
///
/// This core only consumes the tier (for discount eligibility); it never
/// recomputes it. Variant order gives `Regular < Silver < Gold < Platinum`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum CustomerTier {
    Regular,
    Silver,
    Gold,
    Platinum,
}

impl Default for CustomerTier {
    fn default() -> Self {
        CustomerTier::Regular
    }
}

/// A loyalty customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub tier: CustomerTier,
    /// Accumulated loyalty points.
    pub points: i64,
    /// Lifetime spending, used externally to derive the tier.
    pub total_spending: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Payment Method & Sale Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment. Feeds the shift's cash ledger.
    Cash,
    /// Card payment on external terminal.
    Card,
    /// QRIS payment (Indonesian unified QR standard).
    Qris,
}

/// The status of a sale transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Sale has been paid and finalized.
    Completed,
    /// Sale was refunded; stock restored and shift cash reversed.
    Refunded,
}

// =============================================================================
// Sale
// =============================================================================

/// A finalized sale transaction.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub receipt_number: String,
    pub status: SaleStatus,
    /// Loyalty customer, when one was attached to the cart.
    pub customer_id: Option<String>,
    pub cashier_id: String,
    /// Shift the sale was recorded against (open shift at checkout time).
    pub shift_id: Option<String>,
    pub payment_method: PaymentMethod,
    /// Sum of line contributions before the global discount.
    pub subtotal: Money,
    /// Single amount subtracted from the subtotal.
    pub global_discount: Money,
    /// Final total, never negative.
    pub total: Money,
    /// Loyalty points accrued by this sale.
    pub points_earned: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A line item in a finalized sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    pub unit_type: UnitType,
    /// Unit price at time of sale (frozen).
    pub unit_price: Money,
    pub quantity: i64,
    /// Per-unit discount applied to this line.
    pub discount: Money,
    /// max(0, unit_price × quantity − discount × quantity).
    pub line_total: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn carton_product() -> Product {
        Product {
            id: "p1".to_string(),
            barcode: None,
            name: "Indomie Goreng".to_string(),
            price: Money::new(3_500),
            carton_price: Some(Money::new(120_000)),
            pcs_per_carton: 40,
            supports_carton: true,
            stock: 95,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_carton_eligible_requires_all_three() {
        let mut p = carton_product();
        assert!(p.carton_eligible());

        p.supports_carton = false;
        assert!(!p.carton_eligible());

        p.supports_carton = true;
        p.pcs_per_carton = 1;
        assert!(!p.carton_eligible());

        p.pcs_per_carton = 40;
        p.carton_price = None;
        assert!(!p.carton_eligible());
    }

    #[test]
    fn test_quantity_in_pcs() {
        let p = carton_product();
        assert_eq!(p.quantity_in_pcs(2, UnitType::Carton), 80);
        assert_eq!(p.quantity_in_pcs(2, UnitType::Pcs), 2);

        let mut loose = carton_product();
        loose.supports_carton = false;
        // Ineligible products never multiply
        assert_eq!(loose.quantity_in_pcs(2, UnitType::Carton), 2);
    }

    #[test]
    fn test_stock_breakdown() {
        let p = carton_product();
        // 95 pcs at 40/carton = 2 cartons + 15 pcs
        assert_eq!(
            p.stock_breakdown(),
            StockBreakdown { cartons: 2, pcs: 15 }
        );

        let mut loose = carton_product();
        loose.carton_price = None;
        assert_eq!(
            loose.stock_breakdown(),
            StockBreakdown { cartons: 0, pcs: 95 }
        );
    }

    #[test]
    fn test_tier_ordering() {
        assert!(CustomerTier::Regular < CustomerTier::Silver);
        assert!(CustomerTier::Silver < CustomerTier::Gold);
        assert!(CustomerTier::Gold < CustomerTier::Platinum);
        assert_eq!(CustomerTier::default(), CustomerTier::Regular);
    }
}
