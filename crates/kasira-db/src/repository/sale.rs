//! # Sale Repository
//!
//! The checkout transaction and its inverse. This is where the terminal's
//! proposed sale becomes authoritative state.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Checkout (single transaction)                     │
//! │                                                                         │
//! │  1. RESOLVE CONTEXT                                                    │
//! │     └── customer (if attached), shift (must be open)                   │
//! │                                                                         │
//! │  2. REBUILD THE CART FROM CURRENT PRODUCT ROWS                         │
//! │     └── totals are recomputed server-side; the terminal's numbers      │
//! │         are never trusted                                              │
//! │                                                                         │
//! │  3. VALIDATE STOCK                                                     │
//! │     └── carton lines convert to pieces before comparison               │
//! │                                                                         │
//! │  4. WRITE                                                              │
//! │     └── sale + snapshot lines                                          │
//! │     └── guarded stock decrement per line                               │
//! │     └── loyalty points + lifetime spending on the customer             │
//! │     └── cash sale posted to the open shift (cash payments only)        │
//! │                                                                         │
//! │  5. COMMIT (any failure rolls back everything)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DbResult;
use kasira_core::{
    validation, Cart, CartItem, CoreError, Customer, Money, PaymentMethod, Product, Sale,
    SaleLine, SaleStatus, Shift, UnitType, LOYALTY_POINT_UNIT,
};

// =============================================================================
// Request Types
// =============================================================================

/// One proposed line of a checkout, identified by product.
#[derive(Debug, Clone)]
pub struct CheckoutLine {
    pub product_id: String,
    /// Quantity in `unit_type` units.
    pub quantity: i64,
    pub unit_type: UnitType,
    /// Per-unit discount the terminal resolved. Clamped server-side exactly
    /// like the cart clamps it.
    pub discount: Money,
}

/// A checkout proposal submitted by the terminal.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub cashier_id: String,
    /// The cashier's open shift, when one exists. Cash payments require it
    /// to be open so the drawer ledger stays complete.
    pub shift_id: Option<String>,
    pub customer_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub global_discount: Money,
    pub lines: Vec<CheckoutLine>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        fetch_sale(&mut conn, id).await
    }

    /// Gets all lines of a sale, in insertion order.
    pub async fn get_lines(&self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        let lines = sqlx::query_as::<_, SaleLine>(
            "SELECT id, sale_id, product_id, name_snapshot, unit_type, unit_price,
                    quantity, discount, line_total, created_at
             FROM sale_lines WHERE sale_id = ?1 ORDER BY created_at, id",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Lists the sales recorded against a shift, newest first.
    pub async fn list_by_shift(&self, shift_id: &str) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            "SELECT id, receipt_number, status, customer_id, cashier_id, shift_id,
                    payment_method, subtotal, global_discount, total, points_earned,
                    created_at
             FROM sales WHERE shift_id = ?1 ORDER BY created_at DESC",
        )
        .bind(shift_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Executes a checkout as a single transaction.
    ///
    /// Totals are recomputed from current product rows using the same cart
    /// math the terminal runs, so a stale terminal cannot sell at yesterday's
    /// prices. Stock, loyalty and the shift cash ledger all move here or not
    /// at all.
    ///
    /// ## Errors
    /// - [`CoreError::EmptyCart`] on a checkout with no lines
    /// - [`CoreError::ProductNotFound`] / [`CoreError::CustomerNotFound`] /
    ///   [`CoreError::ShiftNotFound`] for unresolvable references
    /// - [`CoreError::ShiftClosed`] when the referenced shift is not open
    /// - [`CoreError::InsufficientStock`] when a line (in pieces) exceeds
    ///   available stock
    pub async fn checkout(&self, request: CheckoutRequest) -> DbResult<Sale> {
        if request.lines.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }
        for line in &request.lines {
            validation::validate_quantity(line.quantity).map_err(CoreError::from)?;
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Resolve the attached customer, if any
        let customer: Option<Customer> = match &request.customer_id {
            Some(id) => Some(
                fetch_customer(&mut tx, id)
                    .await?
                    .ok_or_else(|| CoreError::CustomerNotFound(id.clone()))?,
            ),
            None => None,
        };

        // Resolve the shift; cash must land in an open drawer
        if let Some(shift_id) = &request.shift_id {
            let shift = fetch_shift(&mut tx, shift_id)
                .await?
                .ok_or_else(|| CoreError::ShiftNotFound(shift_id.clone()))?;
            if !shift.is_open() {
                return Err(CoreError::ShiftClosed(shift.id).into());
            }
        }

        // Rebuild the cart against current product rows. set_items applies
        // the same carton coercion the terminal cart applies.
        let mut items = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            let product = fetch_product(&mut tx, &line.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;
            items.push(CartItem {
                product,
                quantity: line.quantity,
                unit_type: line.unit_type,
                discount: line.discount,
            });
        }
        let mut cart = Cart::new();
        cart.set_items(items);
        cart.set_customer(customer.clone());
        // Clamped here so the persisted subtotal/discount/total stay coherent
        let global_discount = request.global_discount.clamp_non_negative();
        cart.set_global_discount(global_discount);

        // Stock validation in pieces
        for item in &cart.items {
            let needed = item.product.quantity_in_pcs(item.quantity, item.unit_type);
            if needed > item.product.stock {
                return Err(CoreError::InsufficientStock {
                    name: item.product.name.clone(),
                    available: item.product.stock,
                    requested: needed,
                }
                .into());
            }
        }

        let subtotal = cart.subtotal();
        let total = cart.total();
        let points_earned = if customer.is_some() {
            total.amount() / LOYALTY_POINT_UNIT
        } else {
            0
        };

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            receipt_number: generate_receipt_number(now),
            status: SaleStatus::Completed,
            customer_id: request.customer_id.clone(),
            cashier_id: request.cashier_id.clone(),
            shift_id: request.shift_id.clone(),
            payment_method: request.payment_method,
            subtotal,
            global_discount,
            total,
            points_earned,
            created_at: now,
        };

        debug!(id = %sale.id, receipt_number = %sale.receipt_number, "Inserting sale");

        sqlx::query(
            "INSERT INTO sales (
                id, receipt_number, status, customer_id, cashier_id, shift_id,
                payment_method, subtotal, global_discount, total, points_earned,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(&sale.id)
        .bind(&sale.receipt_number)
        .bind(sale.status)
        .bind(&sale.customer_id)
        .bind(&sale.cashier_id)
        .bind(&sale.shift_id)
        .bind(sale.payment_method)
        .bind(sale.subtotal)
        .bind(sale.global_discount)
        .bind(sale.total)
        .bind(sale.points_earned)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await?;

        // Snapshot lines + guarded stock decrements
        for item in &cart.items {
            let needed = item.product.quantity_in_pcs(item.quantity, item.unit_type);

            let result = sqlx::query(
                "UPDATE products SET stock = stock - ?2, updated_at = ?3
                 WHERE id = ?1 AND stock >= ?2",
            )
            .bind(&item.product.id)
            .bind(needed)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            // A concurrent sale may have taken the stock since validation
            if result.rows_affected() == 0 {
                return Err(CoreError::InsufficientStock {
                    name: item.product.name.clone(),
                    available: item.product.stock,
                    requested: needed,
                }
                .into());
            }

            sqlx::query(
                "INSERT INTO sale_lines (
                    id, sale_id, product_id, name_snapshot, unit_type,
                    unit_price, quantity, discount, line_total, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&sale.id)
            .bind(&item.product.id)
            .bind(&item.product.name)
            .bind(item.unit_type)
            .bind(item.unit_price())
            .bind(item.quantity)
            .bind(item.discount.clamp_non_negative())
            .bind(item.line_net())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        // Loyalty accrual: whole points per LOYALTY_POINT_UNIT of the total
        if let Some(customer) = &customer {
            sqlx::query(
                "UPDATE customers SET
                    points = points + ?2,
                    total_spending = total_spending + ?3,
                    updated_at = ?4
                 WHERE id = ?1",
            )
            .bind(&customer.id)
            .bind(points_earned)
            .bind(total)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        // Cash lands in the drawer ledger
        if sale.payment_method == PaymentMethod::Cash {
            if let Some(shift_id) = &sale.shift_id {
                sqlx::query(
                    "UPDATE shifts SET cash_sales = cash_sales + ?2
                     WHERE id = ?1 AND status = 'open'",
                )
                .bind(shift_id)
                .bind(total)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        info!(
            receipt_number = %sale.receipt_number,
            total = %sale.total,
            lines = cart.items.len(),
            "Checkout complete"
        );

        Ok(sale)
    }

    /// Refunds a completed sale: restores stock, reverses loyalty, posts a
    /// cash refund to the given open shift. Single transaction, irreversible.
    ///
    /// ## Errors
    /// - [`CoreError::SaleNotFound`] for an unknown sale
    /// - [`CoreError::InvalidSaleStatus`] when the sale is already refunded
    /// - [`CoreError::ShiftClosed`] when `refund_shift_id` names a closed
    ///   shift
    pub async fn refund(&self, sale_id: &str, refund_shift_id: Option<&str>) -> DbResult<Sale> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut sale = fetch_sale(&mut tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        if sale.status != SaleStatus::Completed {
            return Err(CoreError::InvalidSaleStatus {
                sale_id: sale.id.clone(),
                current_status: status_label(sale.status).to_string(),
            }
            .into());
        }

        // The refund drawer must be open before any cash moves
        if let Some(shift_id) = refund_shift_id {
            let shift = fetch_shift(&mut tx, shift_id)
                .await?
                .ok_or_else(|| CoreError::ShiftNotFound(shift_id.to_string()))?;
            if !shift.is_open() {
                return Err(CoreError::ShiftClosed(shift.id).into());
            }
        }

        // Restore stock per line, converting cartons back to pieces with the
        // product's current packing
        let lines = sqlx::query_as::<_, SaleLine>(
            "SELECT id, sale_id, product_id, name_snapshot, unit_type, unit_price,
                    quantity, discount, line_total, created_at
             FROM sale_lines WHERE sale_id = ?1",
        )
        .bind(&sale.id)
        .fetch_all(&mut *tx)
        .await?;

        for line in &lines {
            match fetch_product(&mut tx, &line.product_id).await? {
                Some(product) => {
                    let restored = product.quantity_in_pcs(line.quantity, line.unit_type);
                    sqlx::query(
                        "UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1",
                    )
                    .bind(&product.id)
                    .bind(restored)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
                }
                None => {
                    warn!(
                        product_id = %line.product_id,
                        "Refund line references a missing product; stock not restored"
                    );
                }
            }
        }

        sqlx::query("UPDATE sales SET status = 'refunded' WHERE id = ?1")
            .bind(&sale.id)
            .execute(&mut *tx)
            .await?;

        // Reverse loyalty
        if let Some(customer_id) = &sale.customer_id {
            sqlx::query(
                "UPDATE customers SET
                    points = points - ?2,
                    total_spending = total_spending - ?3,
                    updated_at = ?4
                 WHERE id = ?1",
            )
            .bind(customer_id)
            .bind(sale.points_earned)
            .bind(sale.total)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        // Cash leaves the drawer of the shift doing the refund, which may
        // differ from the shift that made the sale
        if sale.payment_method == PaymentMethod::Cash {
            if let Some(shift_id) = refund_shift_id {
                sqlx::query(
                    "UPDATE shifts SET cash_refunds = cash_refunds + ?2
                     WHERE id = ?1 AND status = 'open'",
                )
                .bind(shift_id)
                .bind(sale.total)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        info!(receipt_number = %sale.receipt_number, total = %sale.total, "Sale refunded");

        sale.status = SaleStatus::Refunded;
        Ok(sale)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn status_label(status: SaleStatus) -> &'static str {
    match status {
        SaleStatus::Completed => "completed",
        SaleStatus::Refunded => "refunded",
    }
}

/// Receipt numbers are human-readable and unique: timestamp plus a random
/// suffix to disambiguate same-second checkouts.
fn generate_receipt_number(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "KSR-{}-{}",
        now.format("%Y%m%d%H%M%S"),
        suffix[..6].to_uppercase()
    )
}

async fn fetch_product(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        "SELECT id, barcode, name, price, carton_price, pcs_per_carton,
                supports_carton, stock, is_active, created_at, updated_at
         FROM products WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(product)
}

async fn fetch_customer(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Customer>> {
    let customer = sqlx::query_as::<_, Customer>(
        "SELECT id, name, phone, tier, points, total_spending, created_at, updated_at
         FROM customers WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(customer)
}

async fn fetch_shift(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Shift>> {
    let shift = sqlx::query_as::<_, Shift>(
        "SELECT id, cashier_id, terminal_name, status, opening_cash, cash_sales,
                cash_refunds, expected_cash, actual_cash, cash_difference,
                approval_status, note, close_note, approval_note, opened_at, closed_at
         FROM shifts WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(shift)
}

async fn fetch_sale(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
    let sale = sqlx::query_as::<_, Sale>(
        "SELECT id, receipt_number, status, customer_id, cashier_id, shift_id,
                payment_method, subtotal, global_discount, total, points_earned,
                created_at
         FROM sales WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(sale)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::NewProduct;
    use crate::DbError;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_carton_product(db: &Database) -> Product {
        db.products()
            .insert(&NewProduct {
                barcode: None,
                name: "Teh Kotak 200ml".to_string(),
                price: Money::new(10_000),
                carton_price: Some(Money::new(95_000)),
                pcs_per_carton: 12,
                supports_carton: true,
                stock: 100,
            })
            .await
            .unwrap()
    }

    fn cash_request(product_id: &str, quantity: i64) -> CheckoutRequest {
        CheckoutRequest {
            cashier_id: "cashier-1".to_string(),
            shift_id: None,
            customer_id: None,
            payment_method: PaymentMethod::Cash,
            global_discount: Money::zero(),
            lines: vec![CheckoutLine {
                product_id: product_id.to_string(),
                quantity,
                unit_type: UnitType::Pcs,
                discount: Money::zero(),
            }],
        }
    }

    #[tokio::test]
    async fn test_checkout_recomputes_totals_and_decrements_stock() {
        let db = db().await;
        let product = seed_carton_product(&db).await;

        let mut request = cash_request(&product.id, 2);
        request.lines[0].discount = Money::new(1_500);

        let sale = db.sales().checkout(request).await.unwrap();
        // max(0, 10.000×2 − 1.500×2) = 17.000
        assert_eq!(sale.subtotal, Money::new(17_000));
        assert_eq!(sale.total, Money::new(17_000));
        assert_eq!(sale.status, SaleStatus::Completed);

        let lines = db.sales().get_lines(&sale.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].name_snapshot, "Teh Kotak 200ml");
        assert_eq!(lines[0].line_total, Money::new(17_000));

        let stock = db.products().get_by_id(&product.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 98);
    }

    #[tokio::test]
    async fn test_checkout_carton_line_converts_to_pieces() {
        let db = db().await;
        let product = seed_carton_product(&db).await;

        let mut request = cash_request(&product.id, 2);
        request.lines[0].unit_type = UnitType::Carton;

        let sale = db.sales().checkout(request).await.unwrap();
        // 2 cartons × 95.000
        assert_eq!(sale.total, Money::new(190_000));

        // 2 cartons × 12 pcs
        let stock = db.products().get_by_id(&product.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 76);
    }

    #[tokio::test]
    async fn test_checkout_insufficient_stock_rolls_back() {
        let db = db().await;
        let product = seed_carton_product(&db).await;

        // 100 pcs in stock, 9 cartons = 108 pcs
        let mut request = cash_request(&product.id, 9);
        request.lines[0].unit_type = UnitType::Carton;

        let err = db.sales().checkout(request).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock {
                available: 100,
                requested: 108,
                ..
            })
        ));

        // Nothing moved
        let stock = db.products().get_by_id(&product.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 100);
    }

    #[tokio::test]
    async fn test_checkout_rejects_empty_cart() {
        let db = db().await;
        let request = CheckoutRequest {
            cashier_id: "cashier-1".to_string(),
            shift_id: None,
            customer_id: None,
            payment_method: PaymentMethod::Cash,
            global_discount: Money::zero(),
            lines: vec![],
        };
        let err = db.sales().checkout(request).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_cash_sale_posts_to_open_shift() {
        let db = db().await;
        let product = seed_carton_product(&db).await;
        let shift = db
            .shifts()
            .open("cashier-1", "Kasir 1", Money::new(100_000), None)
            .await
            .unwrap();

        let mut request = cash_request(&product.id, 3);
        request.shift_id = Some(shift.id.clone());
        db.sales().checkout(request).await.unwrap();

        let shift = db.shifts().get_by_id(&shift.id).await.unwrap().unwrap();
        assert_eq!(shift.cash_sales, Money::new(30_000));
        assert_eq!(shift.expected(), Money::new(130_000));
    }

    #[tokio::test]
    async fn test_card_sale_does_not_touch_drawer() {
        let db = db().await;
        let product = seed_carton_product(&db).await;
        let shift = db
            .shifts()
            .open("cashier-1", "Kasir 1", Money::new(100_000), None)
            .await
            .unwrap();

        let mut request = cash_request(&product.id, 3);
        request.shift_id = Some(shift.id.clone());
        request.payment_method = PaymentMethod::Card;
        db.sales().checkout(request).await.unwrap();

        let shift = db.shifts().get_by_id(&shift.id).await.unwrap().unwrap();
        assert_eq!(shift.cash_sales, Money::zero());
    }

    #[tokio::test]
    async fn test_loyalty_points_floor_per_ten_thousand() {
        let db = db().await;
        let product = seed_carton_product(&db).await;
        let budi = db.customers().insert("Budi", None).await.unwrap();

        // 12 pcs + 750 global discount = 119.250 → 11 points
        let mut request = cash_request(&product.id, 12);
        request.customer_id = Some(budi.id.clone());
        request.global_discount = Money::new(750);

        let sale = db.sales().checkout(request).await.unwrap();
        assert_eq!(sale.total, Money::new(119_250));
        assert_eq!(sale.points_earned, 11);

        let budi = db.customers().get_by_id(&budi.id).await.unwrap().unwrap();
        assert_eq!(budi.points, 11);
        assert_eq!(budi.total_spending, Money::new(119_250));
    }

    #[tokio::test]
    async fn test_refund_restores_everything() {
        let db = db().await;
        let product = seed_carton_product(&db).await;
        let budi = db.customers().insert("Budi", None).await.unwrap();
        let shift = db
            .shifts()
            .open("cashier-1", "Kasir 1", Money::new(50_000), None)
            .await
            .unwrap();

        let mut request = cash_request(&product.id, 2);
        request.lines[0].unit_type = UnitType::Carton;
        request.customer_id = Some(budi.id.clone());
        request.shift_id = Some(shift.id.clone());
        let sale = db.sales().checkout(request).await.unwrap();

        let refunded = db
            .sales()
            .refund(&sale.id, Some(&shift.id))
            .await
            .unwrap();
        assert_eq!(refunded.status, SaleStatus::Refunded);

        // Stock back to 100, points back to 0, drawer reflects both legs
        let stock = db.products().get_by_id(&product.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 100);

        let budi = db.customers().get_by_id(&budi.id).await.unwrap().unwrap();
        assert_eq!(budi.points, 0);
        assert_eq!(budi.total_spending, Money::zero());

        let shift = db.shifts().get_by_id(&shift.id).await.unwrap().unwrap();
        assert_eq!(shift.cash_sales, Money::new(190_000));
        assert_eq!(shift.cash_refunds, Money::new(190_000));
        assert_eq!(shift.expected(), Money::new(50_000));
    }

    #[tokio::test]
    async fn test_refund_is_not_repeatable() {
        let db = db().await;
        let product = seed_carton_product(&db).await;

        let sale = db
            .sales()
            .checkout(cash_request(&product.id, 1))
            .await
            .unwrap();
        db.sales().refund(&sale.id, None).await.unwrap();

        let err = db.sales().refund(&sale.id, None).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidSaleStatus { .. })
        ));
    }
}
