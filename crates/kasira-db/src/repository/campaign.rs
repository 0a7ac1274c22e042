//! # Campaign Repository
//!
//! Storage for discount campaigns. The terminal fetches the active set and
//! feeds it to the pricing resolver in kasira-core; this repository never
//! computes discounts itself.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use kasira_core::{CustomerTier, DiscountCampaign, DiscountValue, Money};

/// Flat row shape for `discount_campaigns`. The enum-valued
/// [`DiscountValue`] is stored as a (kind, amount) pair.
#[derive(Debug, sqlx::FromRow)]
struct CampaignRow {
    id: String,
    name: String,
    product_id: Option<String>,
    min_quantity: i64,
    min_tier: Option<CustomerTier>,
    value_kind: String,
    value_amount: i64,
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
    is_active: bool,
}

impl CampaignRow {
    fn into_campaign(self) -> DbResult<DiscountCampaign> {
        let value = match self.value_kind.as_str() {
            "fixed" => DiscountValue::Fixed(Money::new(self.value_amount)),
            "percent" => DiscountValue::Percent(self.value_amount.max(0) as u32),
            other => {
                return Err(DbError::Internal(format!(
                    "campaign {} has unknown value_kind '{}'",
                    self.id, other
                )))
            }
        };

        Ok(DiscountCampaign {
            id: self.id,
            name: self.name,
            product_id: self.product_id,
            min_quantity: self.min_quantity,
            min_tier: self.min_tier,
            value,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            is_active: self.is_active,
        })
    }
}

const CAMPAIGN_COLUMNS: &str = "id, name, product_id, min_quantity, min_tier, \
     value_kind, value_amount, starts_at, ends_at, is_active";

/// Repository for discount campaign operations.
#[derive(Debug, Clone)]
pub struct CampaignRepository {
    pool: SqlitePool,
}

impl CampaignRepository {
    /// Creates a new CampaignRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CampaignRepository { pool }
    }

    /// Inserts a campaign, generating its ID.
    pub async fn insert(&self, campaign: &NewCampaign) -> DbResult<DiscountCampaign> {
        let id = Uuid::new_v4().to_string();
        let (value_kind, value_amount) = match campaign.value {
            DiscountValue::Fixed(amount) => ("fixed", amount.amount()),
            DiscountValue::Percent(bps) => ("percent", bps as i64),
        };

        debug!(id = %id, name = %campaign.name, "Inserting campaign");

        sqlx::query(
            "INSERT INTO discount_campaigns (
                id, name, product_id, min_quantity, min_tier,
                value_kind, value_amount, starts_at, ends_at, is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1)",
        )
        .bind(&id)
        .bind(&campaign.name)
        .bind(&campaign.product_id)
        .bind(campaign.min_quantity)
        .bind(campaign.min_tier)
        .bind(value_kind)
        .bind(value_amount)
        .bind(campaign.starts_at)
        .bind(campaign.ends_at)
        .execute(&self.pool)
        .await?;

        Ok(DiscountCampaign {
            id,
            name: campaign.name.clone(),
            product_id: campaign.product_id.clone(),
            min_quantity: campaign.min_quantity,
            min_tier: campaign.min_tier,
            value: campaign.value,
            starts_at: campaign.starts_at,
            ends_at: campaign.ends_at,
            is_active: true,
        })
    }

    /// Lists campaigns whose kill-switch is on, window-filtered at `now`.
    ///
    /// The window filter runs in Rust rather than SQL so the comparison
    /// semantics match the pricing resolver exactly.
    pub async fn list_active(&self, now: DateTime<Utc>) -> DbResult<Vec<DiscountCampaign>> {
        let sql = format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM discount_campaigns WHERE is_active = 1"
        );
        let rows = sqlx::query_as::<_, CampaignRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let mut campaigns = Vec::with_capacity(rows.len());
        for row in rows {
            let campaign = row.into_campaign()?;
            let started = now >= campaign.starts_at;
            let not_ended = campaign.ends_at.map_or(true, |end| now <= end);
            if started && not_ended {
                campaigns.push(campaign);
            }
        }

        Ok(campaigns)
    }

    /// Flips a campaign's kill-switch off.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE discount_campaigns SET is_active = 0 WHERE id = ?1")
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Campaign", id));
        }

        Ok(())
    }
}

/// Payload for creating a campaign.
#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub name: String,
    pub product_id: Option<String>,
    pub min_quantity: i64,
    pub min_tier: Option<CustomerTier>,
    pub value: DiscountValue,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl NewCampaign {
    /// An open-ended storewide campaign starting now.
    pub fn storewide(name: impl Into<String>, value: DiscountValue) -> Self {
        NewCampaign {
            name: name.into(),
            product_id: None,
            min_quantity: 1,
            min_tier: None,
            value,
            starts_at: Utc::now(),
            ends_at: None,
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
    use chrono::Duration;

    #[tokio::test]
    async fn test_round_trip_both_value_kinds() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.campaigns();

        repo.insert(&NewCampaign::storewide(
            "Gajian fixed",
            DiscountValue::Fixed(Money::new(500)),
        ))
        .await
        .unwrap();
        repo.insert(&NewCampaign::storewide(
            "Gajian percent",
            DiscountValue::Percent(1_000),
        ))
        .await
        .unwrap();

        let active = repo.list_active(Utc::now()).await.unwrap();
        assert_eq!(active.len(), 2);
        assert!(active
            .iter()
            .any(|c| c.value == DiscountValue::Fixed(Money::new(500))));
        assert!(active
            .iter()
            .any(|c| c.value == DiscountValue::Percent(1_000)));
    }

    #[tokio::test]
    async fn test_window_and_deactivation_filtering() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.campaigns();

        let mut future = NewCampaign::storewide("Future", DiscountValue::Percent(500));
        future.starts_at = Utc::now() + Duration::days(1);
        repo.insert(&future).await.unwrap();

        let mut expired = NewCampaign::storewide("Expired", DiscountValue::Percent(500));
        expired.starts_at = Utc::now() - Duration::days(7);
        expired.ends_at = Some(Utc::now() - Duration::days(1));
        repo.insert(&expired).await.unwrap();

        let killed = repo
            .insert(&NewCampaign::storewide("Killed", DiscountValue::Percent(500)))
            .await
            .unwrap();
        repo.deactivate(&killed.id).await.unwrap();

        assert!(repo.list_active(Utc::now()).await.unwrap().is_empty());
    }
}
