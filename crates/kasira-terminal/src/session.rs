//! # Terminal Session
//!
//! One cashier at one terminal: the live cart, the cashier's shift, and the
//! operations the POS screen invokes.
//!
//! ## Operation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Terminal Session                                     │
//! │                                                                         │
//! │  login ──► open_shift(opening_cash)                                    │
//! │                │                                                        │
//! │                ▼                                                        │
//! │  scan_barcode ──► cart grows, campaign discounts resolved              │
//! │  attach_customer ──► tier-gated campaigns re-resolved                  │
//! │                │                                                        │
//! │                ▼                                                        │
//! │  checkout(payment) ──► kasira-db transaction                           │
//! │                │            │ success: cart cleared                    │
//! │                │            │ failure: cart KEPT for retry             │
//! │                ▼                                                        │
//! │  close_shift(actual_cash) ──► reconciliation                           │
//! │                │                                                        │
//! │                ▼                                                        │
//! │  logout ──► REFUSED while a shift is open                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::info;

use kasira_core::{pricing, Cart, CoreError, Money, PaymentMethod, Sale, Shift, ShiftPolicy};
use kasira_db::Database;

use crate::checkout::{build_checkout_request, CheckoutContext};
use crate::error::{ApiError, ApiResult};
use crate::store::{CartSession, CartStore};

/// A cashier's session at one terminal.
pub struct TerminalSession<S: CartStore> {
    db: Database,
    cart: CartSession<S>,
    cashier_id: String,
    terminal_name: String,
    policy: ShiftPolicy,
}

impl<S: CartStore> TerminalSession<S> {
    /// Creates a session, restoring any persisted cart.
    pub fn new(
        db: Database,
        store: S,
        cashier_id: impl Into<String>,
        terminal_name: impl Into<String>,
    ) -> Self {
        TerminalSession {
            db,
            cart: CartSession::new(store),
            cashier_id: cashier_id.into(),
            terminal_name: terminal_name.into(),
            policy: ShiftPolicy::default(),
        }
    }

    /// Overrides the reconciliation policy (store-configurable threshold).
    pub fn with_policy(mut self, policy: ShiftPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The live cart.
    pub fn cart(&self) -> &CartSession<S> {
        &self.cart
    }

    // =========================================================================
    // Cart Operations
    // =========================================================================

    /// Scans a barcode into the cart.
    ///
    /// Looks up the product, adds it (or bumps the existing line), and
    /// resolves the line's campaign discount at its new quantity.
    pub async fn scan_barcode(&self, barcode: &str) -> ApiResult<Cart> {
        let product = self
            .db
            .products()
            .get_by_barcode(barcode)
            .await?
            .ok_or_else(|| ApiError::not_found("Product", barcode))?;

        let campaigns = self.db.campaigns().list_active(Utc::now()).await?;

        Ok(self.cart.with_cart_mut(|cart| {
            cart.add_item(&product, None);
            // Quantity just changed, so the min_quantity gates may have too
            let now = Utc::now();
            if let Some(item) = cart.get(&product.id) {
                let discount = pricing::resolve_discount(
                    &item.product,
                    item.quantity,
                    item.unit_type,
                    &campaigns,
                    cart.customer.as_ref(),
                    now,
                );
                cart.update_item_discount(&product.id, discount);
            }
            cart.clone()
        }))
    }

    /// Re-resolves every line's discount against the current campaign set.
    ///
    /// Called after anything that shifts eligibility: a customer attach, a
    /// quantity change, a campaign going live.
    pub async fn refresh_discounts(&self) -> ApiResult<Cart> {
        let campaigns = self.db.campaigns().list_active(Utc::now()).await?;

        Ok(self.cart.with_cart_mut(|cart| {
            let now = Utc::now();
            let customer = cart.customer.clone();
            for item in cart.items.clone() {
                let discount = pricing::resolve_discount(
                    &item.product,
                    item.quantity,
                    item.unit_type,
                    &campaigns,
                    customer.as_ref(),
                    now,
                );
                cart.update_item_discount(&item.product.id, discount);
            }
            cart.clone()
        }))
    }

    /// Attaches a loyalty customer and re-resolves tier-gated discounts.
    pub async fn attach_customer(&self, customer_id: &str) -> ApiResult<Cart> {
        let customer = self
            .db
            .customers()
            .get_by_id(customer_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Customer", customer_id))?;

        self.cart.with_cart_mut(|cart| cart.set_customer(Some(customer)));
        self.refresh_discounts().await
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Submits the cart as a sale.
    ///
    /// The cart is cleared only after the database transaction commits; any
    /// failure leaves it intact so the cashier can retry or adjust.
    ///
    /// Cash payments require an open shift, so every rupiah of drawer cash is
    /// attributable at close.
    pub async fn checkout(&self, payment_method: PaymentMethod) -> ApiResult<Sale> {
        let cart = self.cart.snapshot();
        if cart.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        let shift = self.db.shifts().get_active(&self.cashier_id).await?;
        if payment_method == PaymentMethod::Cash && shift.is_none() {
            return Err(ApiError::conflict(format!(
                "Cashier {} has no open shift; cash payments need one",
                self.cashier_id
            )));
        }

        let ctx = CheckoutContext {
            cashier_id: self.cashier_id.clone(),
            shift_id: shift.map(|s| s.id),
            payment_method,
        };
        let request = build_checkout_request(&cart, &ctx);

        let sale = self.db.sales().checkout(request).await?;

        // Commit confirmed, now the working state can go
        self.cart.clear();

        info!(
            receipt_number = %sale.receipt_number,
            total = %sale.total,
            terminal = %self.terminal_name,
            "Checkout submitted"
        );

        Ok(sale)
    }

    // =========================================================================
    // Shift Operations
    // =========================================================================

    /// Opens this cashier's shift at this terminal.
    pub async fn open_shift(&self, opening_cash: Money, note: Option<String>) -> ApiResult<Shift> {
        let shift = self
            .db
            .shifts()
            .open(&self.cashier_id, &self.terminal_name, opening_cash, note)
            .await?;
        Ok(shift)
    }

    /// The cashier's open shift, if any.
    pub async fn active_shift(&self) -> ApiResult<Option<Shift>> {
        Ok(self.db.shifts().get_active(&self.cashier_id).await?)
    }

    /// Closes the open shift against the counted drawer cash.
    pub async fn close_shift(
        &self,
        actual_cash: Money,
        close_note: Option<String>,
    ) -> ApiResult<Shift> {
        let shift = self
            .db
            .shifts()
            .get_active(&self.cashier_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Open shift for cashier", &self.cashier_id))?;

        let closed = self
            .db
            .shifts()
            .close(&shift.id, actual_cash, close_note, &self.policy)
            .await?;
        Ok(closed)
    }

    // =========================================================================
    // Logout Guard
    // =========================================================================

    /// Ends the session.
    ///
    /// Refused while a shift is open: the drawer must be reconciled first,
    /// otherwise its cash would be unattributable.
    pub async fn logout(&self) -> ApiResult<()> {
        if self.db.shifts().get_active(&self.cashier_id).await?.is_some() {
            return Err(CoreError::ShiftStillOpen(self.cashier_id.clone()).into());
        }

        info!(cashier_id = %self.cashier_id, terminal = %self.terminal_name, "Session ended");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::store::MemoryStore;
    use kasira_core::{DiscountValue, UnitType};
    use kasira_db::repository::campaign::NewCampaign;
    use kasira_db::repository::product::NewProduct;
    use kasira_db::{Database, DbConfig};

    async fn session() -> TerminalSession<MemoryStore> {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        TerminalSession::new(db, MemoryStore::new(), "cashier-1", "Kasir 1")
    }

    async fn seed_product(session: &TerminalSession<MemoryStore>) -> kasira_core::Product {
        session
            .db
            .products()
            .insert(&NewProduct {
                barcode: Some("8991002101234".to_string()),
                name: "Teh Kotak 200ml".to_string(),
                price: Money::new(10_000),
                carton_price: Some(Money::new(95_000)),
                pcs_per_carton: 12,
                supports_carton: true,
                stock: 50,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_scan_adds_and_resolves_discount() {
        let session = session().await;
        seed_product(&session).await;
        session
            .db
            .campaigns()
            .insert(&NewCampaign::storewide(
                "Promo",
                DiscountValue::Fixed(Money::new(500)),
            ))
            .await
            .unwrap();

        let cart = session.scan_barcode("8991002101234").await.unwrap();
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.items[0].discount, Money::new(500));
        // max(0, 10.000 − 500)
        assert_eq!(cart.total(), Money::new(9_500));

        let cart = session.scan_barcode("8991002101234").await.unwrap();
        assert_eq!(cart.items[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_scan_unknown_barcode() {
        let session = session().await;
        let err = session.scan_barcode("0000000000000").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_checkout_clears_cart_only_on_success() {
        let session = session().await;
        let product = seed_product(&session).await;
        session.open_shift(Money::new(100_000), None).await.unwrap();

        session.scan_barcode("8991002101234").await.unwrap();

        // Force a failure: 5 cartons = 60 pcs, only 50 in stock
        session.cart.with_cart_mut(|cart| {
            cart.update_unit_type(&product.id, UnitType::Carton);
            cart.update_quantity(&product.id, 5);
        });
        let err = session.checkout(PaymentMethod::Cash).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        // Cart kept for retry
        assert!(!session.cart.with_cart(|c| c.is_empty()));

        // Adjust and retry
        session
            .cart
            .with_cart_mut(|cart| cart.update_quantity(&product.id, 2));
        let sale = session.checkout(PaymentMethod::Cash).await.unwrap();
        assert_eq!(sale.total, Money::new(190_000));
        assert!(session.cart.with_cart(|c| c.is_empty()));

        // Drawer got the cash
        let shift = session.active_shift().await.unwrap().unwrap();
        assert_eq!(shift.cash_sales, Money::new(190_000));
    }

    #[tokio::test]
    async fn test_cash_checkout_requires_open_shift() {
        let session = session().await;
        seed_product(&session).await;
        session.scan_barcode("8991002101234").await.unwrap();

        let err = session.checkout(PaymentMethod::Cash).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);

        // Card is fine without a drawer
        let sale = session.checkout(PaymentMethod::Card).await.unwrap();
        assert_eq!(sale.total, Money::new(10_000));
    }

    #[tokio::test]
    async fn test_checkout_empty_cart() {
        let session = session().await;
        let err = session.checkout(PaymentMethod::Card).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);
    }

    #[tokio::test]
    async fn test_logout_guard() {
        let session = session().await;
        session.open_shift(Money::new(100_000), None).await.unwrap();

        let err = session.logout().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);

        session.close_shift(Money::new(100_000), None).await.unwrap();
        session.logout().await.unwrap();
    }

    #[tokio::test]
    async fn test_attach_customer_unlocks_tier_campaign() {
        let session = session().await;
        seed_product(&session).await;

        let mut campaign = NewCampaign::storewide(
            "Gold only",
            DiscountValue::Percent(1_000),
        );
        campaign.min_tier = Some(kasira_core::CustomerTier::Gold);
        session.db.campaigns().insert(&campaign).await.unwrap();

        let cart = session.scan_barcode("8991002101234").await.unwrap();
        // Anonymous sale: tier gate holds
        assert_eq!(cart.items[0].discount, Money::zero());

        let gold = session.db.customers().insert("Agus", None).await.unwrap();
        session
            .db
            .customers()
            .set_tier(&gold.id, kasira_core::CustomerTier::Gold)
            .await
            .unwrap();

        let cart = session.attach_customer(&gold.id).await.unwrap();
        assert_eq!(cart.items[0].discount, Money::new(1_000));
    }
}
