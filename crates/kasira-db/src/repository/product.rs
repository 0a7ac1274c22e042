//! # Product Repository
//!
//! Catalog CRUD, lookup and search. Stock is counted in pieces; the only
//! writers of stock are the checkout and refund transactions in the sale
//! repository, plus explicit adjustments here (receiving, stock opname).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use kasira_core::{validation, CoreError, Money, Product};

/// Every product column, in struct order. Shared by all SELECTs so FromRow
/// mapping stays consistent.
const PRODUCT_COLUMNS: &str = "id, barcode, name, price, carton_price, pcs_per_carton, \
     supports_carton, stock, is_active, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by exact barcode. Scanner path: must be fast and exact.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1 AND is_active = 1"
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Searches active products by name substring or barcode prefix.
    ///
    /// An empty query returns the most recently updated products, which the
    /// terminal uses for its default catalog view.
    pub async fn search(&self, query: &str, limit: i64) -> DbResult<Vec<Product>> {
        let query = validation::validate_search_query(query).map_err(CoreError::from)?;

        let products = if query.is_empty() {
            let sql = format!(
                "SELECT {PRODUCT_COLUMNS} FROM products \
                 WHERE is_active = 1 ORDER BY updated_at DESC LIMIT ?1"
            );
            sqlx::query_as::<_, Product>(&sql)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
        } else {
            let pattern = format!("%{}%", query);
            let barcode_prefix = format!("{}%", query);
            let sql = format!(
                "SELECT {PRODUCT_COLUMNS} FROM products \
                 WHERE is_active = 1 AND (name LIKE ?1 OR barcode LIKE ?2) \
                 ORDER BY name LIMIT ?3"
            );
            sqlx::query_as::<_, Product>(&sql)
                .bind(pattern)
                .bind(barcode_prefix)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
        };

        Ok(products)
    }

    /// Inserts a new product, generating its ID and timestamps.
    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        validation::validate_product_name(&product.name).map_err(CoreError::from)?;
        if let Some(barcode) = &product.barcode {
            validation::validate_barcode(barcode).map_err(CoreError::from)?;
        }
        validation::validate_amount("price", product.price).map_err(CoreError::from)?;

        let now = Utc::now();
        let row = Product {
            id: Uuid::new_v4().to_string(),
            barcode: product.barcode.clone(),
            name: product.name.trim().to_string(),
            price: product.price,
            carton_price: product.carton_price,
            pcs_per_carton: product.pcs_per_carton.max(1),
            supports_carton: product.supports_carton,
            stock: product.stock.max(0),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %row.id, name = %row.name, "Inserting product");

        sqlx::query(
            "INSERT INTO products (
                id, barcode, name, price, carton_price, pcs_per_carton,
                supports_carton, stock, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(&row.id)
        .bind(&row.barcode)
        .bind(&row.name)
        .bind(row.price)
        .bind(row.carton_price)
        .bind(row.pcs_per_carton)
        .bind(row.supports_carton)
        .bind(row.stock)
        .bind(row.is_active)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(row)
    }

    /// Updates catalog fields of an existing product. Stock is not written
    /// here; use [`ProductRepository::adjust_stock`].
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        validation::validate_product_name(&product.name).map_err(CoreError::from)?;

        let result = sqlx::query(
            "UPDATE products SET
                barcode = ?2, name = ?3, price = ?4, carton_price = ?5,
                pcs_per_carton = ?6, supports_carton = ?7, is_active = ?8,
                updated_at = ?9
             WHERE id = ?1",
        )
        .bind(&product.id)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(product.price)
        .bind(product.carton_price)
        .bind(product.pcs_per_carton)
        .bind(product.supports_carton)
        .bind(product.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Adjusts stock by a signed delta in pieces (receiving, stock opname).
    ///
    /// Negative adjustments that would take stock below zero are rejected.
    pub async fn adjust_stock(&self, id: &str, delta_pcs: i64) -> DbResult<i64> {
        let result = sqlx::query(
            "UPDATE products SET stock = stock + ?2, updated_at = ?3
             WHERE id = ?1 AND stock + ?2 >= 0",
        )
        .bind(id)
        .bind(delta_pcs)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get_by_id(id).await?;
            return match current {
                None => Err(DbError::not_found("Product", id)),
                Some(p) => Err(CoreError::InsufficientStock {
                    name: p.name,
                    available: p.stock,
                    requested: -delta_pcs,
                }
                .into()),
            };
        }

        let stock: i64 = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(stock)
    }

    /// Counts all products, active or not.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Soft-deletes a product. History keeps referencing it.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }
}

/// Payload for creating a product. The repository owns ID and timestamps.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub barcode: Option<String>,
    pub name: String,
    pub price: Money,
    pub carton_price: Option<Money>,
    pub pcs_per_carton: i64,
    pub supports_carton: bool,
    pub stock: i64,
}

impl NewProduct {
    /// A piece-only product with the given name and price.
    pub fn simple(name: impl Into<String>, price: Money, stock: i64) -> Self {
        NewProduct {
            barcode: None,
            name: name.into(),
            price,
            carton_price: None,
            pcs_per_carton: 1,
            supports_carton: false,
            stock,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = db().await;
        let repo = db.products();

        let created = repo
            .insert(&NewProduct::simple("Teh Botol 450ml", Money::new(5_000), 24))
            .await
            .unwrap();

        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Teh Botol 450ml");
        assert_eq!(fetched.price, Money::new(5_000));
        assert_eq!(fetched.stock, 24);
        assert!(fetched.is_active);
    }

    #[tokio::test]
    async fn test_barcode_lookup_and_uniqueness() {
        let db = db().await;
        let repo = db.products();

        let mut new = NewProduct::simple("Indomie Goreng", Money::new(3_500), 100);
        new.barcode = Some("8991002101234".to_string());
        repo.insert(&new).await.unwrap();

        let found = repo.get_by_barcode("8991002101234").await.unwrap();
        assert!(found.is_some());

        let dup = NewProduct {
            name: "Other".to_string(),
            ..new
        };
        let err = repo.insert(&dup).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_search_matches_name_and_excludes_inactive() {
        let db = db().await;
        let repo = db.products();

        let p = repo
            .insert(&NewProduct::simple("Indomie Goreng", Money::new(3_500), 10))
            .await
            .unwrap();
        repo.insert(&NewProduct::simple("Teh Botol", Money::new(5_000), 10))
            .await
            .unwrap();

        let hits = repo.search("indo", 20).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, p.id);

        repo.deactivate(&p.id).await.unwrap();
        let hits = repo.search("indo", 20).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_adjust_stock_rejects_going_negative() {
        let db = db().await;
        let repo = db.products();

        let p = repo
            .insert(&NewProduct::simple("Aqua 600ml", Money::new(4_000), 5))
            .await
            .unwrap();

        assert_eq!(repo.adjust_stock(&p.id, 10).await.unwrap(), 15);
        assert_eq!(repo.adjust_stock(&p.id, -15).await.unwrap(), 0);

        let err = repo.adjust_stock(&p.id, -1).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { .. })
        ));
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_name() {
        let db = db().await;
        let err = db
            .products()
            .insert(&NewProduct::simple("   ", Money::new(1_000), 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }
}
