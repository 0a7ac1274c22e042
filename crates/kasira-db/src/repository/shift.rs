//! # Shift Repository
//!
//! Persistence for the shift cash ledger. The lifecycle rules (no second
//! close, approval only from pending) live in kasira-core; this repository
//! loads the row, applies the transition, and persists the result. The cash
//! counters themselves are written by the checkout/refund transactions in the
//! sale repository.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use kasira_core::{validation, CoreError, Money, Shift, ShiftPolicy};

const SHIFT_COLUMNS: &str = "id, cashier_id, terminal_name, status, opening_cash, cash_sales, \
     cash_refunds, expected_cash, actual_cash, cash_difference, approval_status, \
     note, close_note, approval_note, opened_at, closed_at";

/// Repository for shift database operations.
#[derive(Debug, Clone)]
pub struct ShiftRepository {
    pool: SqlitePool,
}

impl ShiftRepository {
    /// Creates a new ShiftRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ShiftRepository { pool }
    }

    /// Gets a shift by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Shift>> {
        let sql = format!("SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = ?1");
        let shift = sqlx::query_as::<_, Shift>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(shift)
    }

    /// Gets the cashier's open shift, if one exists.
    pub async fn get_active(&self, cashier_id: &str) -> DbResult<Option<Shift>> {
        let sql = format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts WHERE cashier_id = ?1 AND status = 'open'"
        );
        let shift = sqlx::query_as::<_, Shift>(&sql)
            .bind(cashier_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(shift)
    }

    /// Lists the most recently opened shifts, for the reconciliation screen.
    pub async fn list_recent(&self, limit: i64) -> DbResult<Vec<Shift>> {
        let sql = format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts ORDER BY opened_at DESC LIMIT ?1"
        );
        let shifts = sqlx::query_as::<_, Shift>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(shifts)
    }

    /// Lists shifts waiting on a supervisor decision, oldest first.
    pub async fn list_pending_approval(&self) -> DbResult<Vec<Shift>> {
        let sql = format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts \
             WHERE approval_status = 'pending' ORDER BY closed_at"
        );
        let shifts = sqlx::query_as::<_, Shift>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(shifts)
    }

    /// Opens a shift for a cashier.
    ///
    /// ## Errors
    /// - [`CoreError::ShiftAlreadyOpen`] when the cashier already has an open
    ///   shift (also enforced by a partial unique index as a backstop)
    /// - Validation errors for the terminal name and negative opening cash
    pub async fn open(
        &self,
        cashier_id: &str,
        terminal_name: &str,
        opening_cash: Money,
        note: Option<String>,
    ) -> DbResult<Shift> {
        validation::validate_terminal_name(terminal_name).map_err(CoreError::from)?;
        validation::validate_opening_cash(opening_cash).map_err(CoreError::from)?;

        if self.get_active(cashier_id).await?.is_some() {
            return Err(CoreError::ShiftAlreadyOpen(cashier_id.to_string()).into());
        }

        let shift = Shift::open(cashier_id, terminal_name.trim(), opening_cash, note, Utc::now());

        debug!(id = %shift.id, cashier_id = %shift.cashier_id, "Opening shift");

        let result = sqlx::query(
            "INSERT INTO shifts (
                id, cashier_id, terminal_name, status, opening_cash, cash_sales,
                cash_refunds, expected_cash, actual_cash, cash_difference,
                approval_status, note, close_note, approval_note, opened_at, closed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        )
        .bind(&shift.id)
        .bind(&shift.cashier_id)
        .bind(&shift.terminal_name)
        .bind(shift.status)
        .bind(shift.opening_cash)
        .bind(shift.cash_sales)
        .bind(shift.cash_refunds)
        .bind(shift.expected_cash)
        .bind(shift.actual_cash)
        .bind(shift.cash_difference)
        .bind(shift.approval_status)
        .bind(&shift.note)
        .bind(&shift.close_note)
        .bind(&shift.approval_note)
        .bind(shift.opened_at)
        .bind(shift.closed_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                info!(id = %shift.id, terminal = %shift.terminal_name, "Shift opened");
                Ok(shift)
            }
            // Race with a concurrent open: the partial unique index fires
            Err(e) => {
                let db_err: DbError = e.into();
                if matches!(db_err, DbError::UniqueViolation { .. }) {
                    Err(CoreError::ShiftAlreadyOpen(cashier_id.to_string()).into())
                } else {
                    Err(db_err)
                }
            }
        }
    }

    /// Closes a shift against the counted drawer cash.
    ///
    /// Runs the reconciliation from kasira-core and persists the outcome:
    /// expected cash, actual cash, the signed difference, and the approval
    /// flag when the discrepancy exceeds the policy threshold.
    pub async fn close(
        &self,
        id: &str,
        actual_cash: Money,
        close_note: Option<String>,
        policy: &ShiftPolicy,
    ) -> DbResult<Shift> {
        validation::validate_amount("actual_cash", actual_cash).map_err(CoreError::from)?;

        let mut shift = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ShiftNotFound(id.to_string()))?;

        let difference = shift.close(actual_cash, close_note, policy, Utc::now())?;

        // Guarded on status so a concurrent close loses cleanly
        let result = sqlx::query(
            "UPDATE shifts SET
                status = ?2, expected_cash = ?3, actual_cash = ?4,
                cash_difference = ?5, approval_status = ?6, close_note = ?7,
                closed_at = ?8
             WHERE id = ?1 AND status = 'open'",
        )
        .bind(&shift.id)
        .bind(shift.status)
        .bind(shift.expected_cash)
        .bind(shift.actual_cash)
        .bind(shift.cash_difference)
        .bind(shift.approval_status)
        .bind(&shift.close_note)
        .bind(shift.closed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ShiftClosed(shift.id).into());
        }

        info!(
            id = %shift.id,
            difference = %difference,
            approval = ?shift.approval_status,
            "Shift closed"
        );

        Ok(shift)
    }

    /// Supervisor approval of a flagged cash discrepancy.
    pub async fn approve(&self, id: &str, approval_note: Option<String>) -> DbResult<Shift> {
        self.decide(id, approval_note, true).await
    }

    /// Supervisor rejection of a flagged cash discrepancy.
    pub async fn reject(&self, id: &str, approval_note: Option<String>) -> DbResult<Shift> {
        self.decide(id, approval_note, false).await
    }

    async fn decide(
        &self,
        id: &str,
        approval_note: Option<String>,
        approve: bool,
    ) -> DbResult<Shift> {
        let mut shift = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ShiftNotFound(id.to_string()))?;

        if approve {
            shift.approve(approval_note)?;
        } else {
            shift.reject(approval_note)?;
        }

        let result = sqlx::query(
            "UPDATE shifts SET approval_status = ?2, approval_note = ?3
             WHERE id = ?1 AND approval_status = 'pending'",
        )
        .bind(&shift.id)
        .bind(shift.approval_status)
        .bind(&shift.approval_note)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ApprovalNotPending(shift.id).into());
        }

        info!(id = %shift.id, approval = ?shift.approval_status, "Shift approval decided");

        Ok(shift)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use kasira_core::ApprovalStatus;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_open_and_get_active() {
        let db = db().await;
        let repo = db.shifts();

        assert!(repo.get_active("cashier-1").await.unwrap().is_none());

        let shift = repo
            .open("cashier-1", "Kasir 1", Money::new(100_000), None)
            .await
            .unwrap();
        assert!(shift.is_open());

        let active = repo.get_active("cashier-1").await.unwrap().unwrap();
        assert_eq!(active.id, shift.id);
        assert_eq!(active.opening_cash, Money::new(100_000));
    }

    #[tokio::test]
    async fn test_second_open_rejected() {
        let db = db().await;
        let repo = db.shifts();

        repo.open("cashier-1", "Kasir 1", Money::new(100_000), None)
            .await
            .unwrap();
        let err = repo
            .open("cashier-1", "Kasir 2", Money::new(50_000), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ShiftAlreadyOpen(_))));

        // A different cashier is unaffected
        repo.open("cashier-2", "Kasir 2", Money::new(50_000), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_open_validates_input() {
        let db = db().await;
        let repo = db.shifts();

        let err = repo
            .open("cashier-1", "  ", Money::new(100_000), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        let err = repo
            .open("cashier-1", "Kasir 1", Money::new(-1), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_close_persists_reconciliation() {
        let db = db().await;
        let repo = db.shifts();

        let shift = repo
            .open("cashier-1", "Kasir 1", Money::new(100_000), None)
            .await
            .unwrap();

        let closed = repo
            .close(&shift.id, Money::new(98_000), Some("short".to_string()), &ShiftPolicy::default())
            .await
            .unwrap();
        assert_eq!(closed.cash_difference, Some(Money::new(-2_000)));
        assert_eq!(closed.approval_status, ApprovalStatus::None);

        let persisted = repo.get_by_id(&shift.id).await.unwrap().unwrap();
        assert!(!persisted.is_open());
        assert_eq!(persisted.expected_cash, Some(Money::new(100_000)));
        assert_eq!(persisted.actual_cash, Some(Money::new(98_000)));
        assert_eq!(persisted.close_note.as_deref(), Some("short"));

        // No second close
        let err = repo
            .close(&shift.id, Money::new(1), None, &ShiftPolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ShiftClosed(_))));
    }

    #[tokio::test]
    async fn test_large_discrepancy_needs_approval() {
        let db = db().await;
        let repo = db.shifts();

        let shift = repo
            .open("cashier-1", "Kasir 1", Money::new(200_000), None)
            .await
            .unwrap();
        // Short by 80.000, beyond the default 50.000 threshold
        repo.close(&shift.id, Money::new(120_000), None, &ShiftPolicy::default())
            .await
            .unwrap();

        let pending = repo.list_pending_approval().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, shift.id);

        let approved = repo
            .approve(&shift.id, Some("verified".to_string()))
            .await
            .unwrap();
        assert_eq!(approved.approval_status, ApprovalStatus::Approved);
        assert!(repo.list_pending_approval().await.unwrap().is_empty());

        // Decision is irreversible
        let err = repo.reject(&shift.id, None).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::ApprovalNotPending(_))
        ));
    }

    #[tokio::test]
    async fn test_approve_without_pending_fails() {
        let db = db().await;
        let repo = db.shifts();

        let shift = repo
            .open("cashier-1", "Kasir 1", Money::new(100_000), None)
            .await
            .unwrap();
        repo.close(&shift.id, Money::new(100_000), None, &ShiftPolicy::default())
            .await
            .unwrap();

        let err = repo.approve(&shift.id, None).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::ApprovalNotPending(_))
        ));
    }
}
