//! # Customer Repository
//!
//! Loyalty customer lookup and maintenance. Points and lifetime spending are
//! written by the checkout/refund transactions in the sale repository; the
//! tier itself is derived externally and only stored here.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use kasira_core::{Customer, CustomerTier, Money};

const CUSTOMER_COLUMNS: &str =
    "id, name, phone, tier, points, total_spending, created_at, updated_at";

/// Repository for loyalty customer operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1");
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Searches customers by name substring or phone prefix.
    pub async fn search(&self, query: &str, limit: i64) -> DbResult<Vec<Customer>> {
        let pattern = format!("%{}%", query.trim());
        let phone_prefix = format!("{}%", query.trim());
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers \
             WHERE name LIKE ?1 OR phone LIKE ?2 \
             ORDER BY name LIMIT ?3"
        );
        let customers = sqlx::query_as::<_, Customer>(&sql)
            .bind(pattern)
            .bind(phone_prefix)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(customers)
    }

    /// Inserts a new customer at Regular tier with zero history.
    pub async fn insert(&self, name: &str, phone: Option<&str>) -> DbResult<Customer> {
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            phone: phone.map(|p| p.trim().to_string()),
            tier: CustomerTier::Regular,
            points: 0,
            total_spending: Money::zero(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %customer.id, name = %customer.name, "Inserting customer");

        sqlx::query(
            "INSERT INTO customers (
                id, name, phone, tier, points, total_spending, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(customer.tier)
        .bind(customer.points)
        .bind(customer.total_spending)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Overwrites a customer's tier (set by the external tier derivation job).
    pub async fn set_tier(&self, id: &str, tier: CustomerTier) -> DbResult<()> {
        let result = sqlx::query("UPDATE customers SET tier = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(tier)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_insert_get_and_tier() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let budi = repo.insert("Budi Santoso", Some("0812345678")).await.unwrap();
        assert_eq!(budi.tier, CustomerTier::Regular);
        assert_eq!(budi.points, 0);

        repo.set_tier(&budi.id, CustomerTier::Gold).await.unwrap();
        let fetched = repo.get_by_id(&budi.id).await.unwrap().unwrap();
        assert_eq!(fetched.tier, CustomerTier::Gold);
    }

    #[tokio::test]
    async fn test_search_by_name_and_phone() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        repo.insert("Budi Santoso", Some("0812345678")).await.unwrap();
        repo.insert("Siti Aminah", Some("0856111222")).await.unwrap();

        assert_eq!(repo.search("budi", 10).await.unwrap().len(), 1);
        assert_eq!(repo.search("0856", 10).await.unwrap().len(), 1);
        assert_eq!(repo.search("nobody", 10).await.unwrap().len(), 0);
    }
}
