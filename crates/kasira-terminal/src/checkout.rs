//! # Checkout Submission
//!
//! Turns the cart snapshot into a [`CheckoutRequest`] for the database layer.
//! The terminal sends the cart's own numbers only as a proposal; kasira-db
//! recomputes every total from current product rows before committing.

use kasira_core::{Cart, PaymentMethod};
use kasira_db::{CheckoutLine, CheckoutRequest};

/// Who and where a checkout comes from.
#[derive(Debug, Clone)]
pub struct CheckoutContext {
    pub cashier_id: String,
    /// The cashier's open shift, when one exists. Required for cash payments
    /// to keep the drawer ledger complete.
    pub shift_id: Option<String>,
    pub payment_method: PaymentMethod,
}

/// Maps the cart snapshot into the wire request, line by line.
pub fn build_checkout_request(cart: &Cart, ctx: &CheckoutContext) -> CheckoutRequest {
    CheckoutRequest {
        cashier_id: ctx.cashier_id.clone(),
        shift_id: ctx.shift_id.clone(),
        customer_id: cart.customer.as_ref().map(|c| c.id.clone()),
        payment_method: ctx.payment_method,
        global_discount: cart.global_discount,
        lines: cart
            .items
            .iter()
            .map(|item| CheckoutLine {
                product_id: item.product.id.clone(),
                quantity: item.quantity,
                unit_type: item.unit_type,
                discount: item.discount,
            })
            .collect(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kasira_core::{Customer, CustomerTier, Money, Product, UnitType};

    fn product(id: &str) -> Product {
        Product {
            id: id.to_string(),
            barcode: None,
            name: "Teh Kotak".to_string(),
            price: Money::new(10_000),
            carton_price: Some(Money::new(95_000)),
            pcs_per_carton: 12,
            supports_carton: true,
            stock: 100,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_request_mirrors_cart() {
        let mut cart = kasira_core::Cart::new();
        cart.add_item(&product("p1"), Some(Money::new(500)));
        cart.update_quantity("p1", 2);
        cart.update_unit_type("p1", UnitType::Carton);
        cart.set_global_discount(Money::new(1_000));
        cart.set_customer(Some(Customer {
            id: "c1".to_string(),
            name: "Budi".to_string(),
            phone: None,
            tier: CustomerTier::Regular,
            points: 0,
            total_spending: Money::zero(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }));

        let ctx = CheckoutContext {
            cashier_id: "cashier-1".to_string(),
            shift_id: Some("shift-1".to_string()),
            payment_method: PaymentMethod::Cash,
        };

        let request = build_checkout_request(&cart, &ctx);
        assert_eq!(request.cashier_id, "cashier-1");
        assert_eq!(request.shift_id.as_deref(), Some("shift-1"));
        assert_eq!(request.customer_id.as_deref(), Some("c1"));
        assert_eq!(request.global_discount, Money::new(1_000));
        assert_eq!(request.lines.len(), 1);
        assert_eq!(request.lines[0].quantity, 2);
        assert_eq!(request.lines[0].unit_type, UnitType::Carton);
        assert_eq!(request.lines[0].discount, Money::new(500));
    }
}
