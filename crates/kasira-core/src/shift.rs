//! # Shift Ledger
//!
//! Bounds a cashier's working session for cash accountability.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Shift Lifecycle                                   │
//! │                                                                         │
//! │   open(opening_cash, terminal)                                          │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   ┌────────┐   sales/refunds accumulate    ┌──────────┐                 │
//! │   │  OPEN  │ ────────────────────────────► │  CLOSED  │  (terminal)     │
//! │   └────────┘   close(actual_cash)          └──────────┘                 │
//! │                                                  │                      │
//! │        difference = actual − expected            │ |difference| over    │
//! │        expected = opening + sales − refunds      │ threshold?           │
//! │                                                  ▼                      │
//! │                                    approval: NONE or PENDING            │
//! │                                    PENDING ──► APPROVED | REJECTED      │
//! │                                    (supervisor, irreversible)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No reopen transition exists. A closed shift is immutable except for the
//! approval fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Status Enums
// =============================================================================

/// Shift status. `ACTIVE` is accepted on input as an alias of `OPEN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    #[serde(alias = "active")]
    Open,
    Closed,
}

/// Supervisor approval state for shifts with a large cash discrepancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// No approval required (difference within threshold).
    None,
    /// Waiting on a supervisor decision.
    Pending,
    Approved,
    Rejected,
}

// =============================================================================
// Policy
// =============================================================================

/// Reconciliation policy applied at shift close.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShiftPolicy {
    /// A cash difference whose magnitude exceeds this flags the shift for
    /// supervisor approval.
    pub approval_threshold: Money,
}

impl Default for ShiftPolicy {
    fn default() -> Self {
        ShiftPolicy {
            approval_threshold: Money::new(50_000),
        }
    }
}

// =============================================================================
// Shift
// =============================================================================

/// A cashier's working session.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Shift {
    pub id: String,
    pub cashier_id: String,
    pub terminal_name: String,
    pub status: ShiftStatus,

    /// Cash in the drawer when the shift opened.
    pub opening_cash: Money,
    /// Cash sales accumulated during the shift (posted by the sale ledger).
    pub cash_sales: Money,
    /// Cash refunds accumulated during the shift.
    pub cash_refunds: Money,

    /// Snapshot of the expected drawer amount, persisted at close.
    pub expected_cash: Option<Money>,
    /// Cash counted by the cashier at close.
    pub actual_cash: Option<Money>,
    /// actual − expected, persisted at close. Negative = shortage.
    pub cash_difference: Option<Money>,

    pub approval_status: ApprovalStatus,

    pub note: Option<String>,
    pub close_note: Option<String>,
    pub approval_note: Option<String>,

    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Shift {
    /// Creates a freshly opened shift.
    pub fn open(
        cashier_id: impl Into<String>,
        terminal_name: impl Into<String>,
        opening_cash: Money,
        note: Option<String>,
        opened_at: DateTime<Utc>,
    ) -> Self {
        Shift {
            id: uuid::Uuid::new_v4().to_string(),
            cashier_id: cashier_id.into(),
            terminal_name: terminal_name.into(),
            status: ShiftStatus::Open,
            opening_cash,
            cash_sales: Money::zero(),
            cash_refunds: Money::zero(),
            expected_cash: None,
            actual_cash: None,
            cash_difference: None,
            approval_status: ApprovalStatus::None,
            note,
            close_note: None,
            approval_note: None,
            opened_at,
            closed_at: None,
        }
    }

    /// Checks if the shift is still open.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == ShiftStatus::Open
    }

    /// The amount that should be in the drawer right now:
    /// `opening cash + cash sales − cash refunds`.
    pub fn expected(&self) -> Money {
        self.opening_cash + self.cash_sales - self.cash_refunds
    }

    /// Closes the shift against the cash the cashier actually counted.
    ///
    /// Computes `cash difference = actual − expected` and flags the shift for
    /// supervisor approval when the magnitude exceeds the policy threshold.
    ///
    /// ## Errors
    /// [`CoreError::ShiftClosed`] when the shift is already closed; there is
    /// no reopen and no second close.
    ///
    /// ## Returns
    /// The computed cash difference (negative = shortage).
    pub fn close(
        &mut self,
        actual_cash: Money,
        close_note: Option<String>,
        policy: &ShiftPolicy,
        closed_at: DateTime<Utc>,
    ) -> CoreResult<Money> {
        if !self.is_open() {
            return Err(CoreError::ShiftClosed(self.id.clone()));
        }

        let expected = self.expected();
        let difference = actual_cash - expected;

        self.status = ShiftStatus::Closed;
        self.expected_cash = Some(expected);
        self.actual_cash = Some(actual_cash);
        self.cash_difference = Some(difference);
        self.close_note = close_note;
        self.closed_at = Some(closed_at);
        self.approval_status = if difference.abs() > policy.approval_threshold {
            ApprovalStatus::Pending
        } else {
            ApprovalStatus::None
        };

        Ok(difference)
    }

    /// Supervisor approval of a flagged discrepancy. Irreversible.
    ///
    /// ## Errors
    /// [`CoreError::ApprovalNotPending`] unless the shift is PENDING.
    pub fn approve(&mut self, approval_note: Option<String>) -> CoreResult<()> {
        self.decide(ApprovalStatus::Approved, approval_note)
    }

    /// Supervisor rejection of a flagged discrepancy. Irreversible.
    pub fn reject(&mut self, approval_note: Option<String>) -> CoreResult<()> {
        self.decide(ApprovalStatus::Rejected, approval_note)
    }

    fn decide(&mut self, decision: ApprovalStatus, note: Option<String>) -> CoreResult<()> {
        if self.approval_status != ApprovalStatus::Pending {
            return Err(CoreError::ApprovalNotPending(self.id.clone()));
        }
        self.approval_status = decision;
        self.approval_note = note;
        Ok(())
    }

    /// Elapsed time of the shift as of `until`, in whole seconds.
    ///
    /// For a closed shift, pass `closed_at`; for an open one the caller ticks
    /// with the current time once per second.
    pub fn duration_secs(&self, until: DateTime<Utc>) -> i64 {
        (until - self.opened_at).num_seconds().abs()
    }
}

/// Formats a duration in seconds as `HH:MM:SS`.
///
/// Hours are not wrapped at 24; a 26-hour shift displays as `26:00:00`.
pub fn format_duration(secs: i64) -> String {
    let secs = secs.abs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn open_shift() -> Shift {
        Shift::open(
            "cashier-1",
            "Kasir 1",
            Money::new(100_000),
            None,
            Utc::now(),
        )
    }

    #[test]
    fn test_expected_cash() {
        let mut shift = open_shift();
        shift.cash_sales = Money::new(250_000);
        shift.cash_refunds = Money::new(20_000);
        assert_eq!(shift.expected(), Money::new(330_000));
    }

    #[test]
    fn test_close_computes_difference() {
        let mut shift = open_shift();
        shift.cash_sales = Money::new(250_000);
        shift.cash_refunds = Money::new(20_000);

        let diff = shift
            .close(Money::new(328_000), None, &ShiftPolicy::default(), Utc::now())
            .unwrap();

        assert_eq!(diff, Money::new(-2_000));
        assert_eq!(shift.status, ShiftStatus::Closed);
        assert_eq!(shift.expected_cash, Some(Money::new(330_000)));
        assert_eq!(shift.actual_cash, Some(Money::new(328_000)));
        assert_eq!(shift.cash_difference, Some(Money::new(-2_000)));
        // 2.000 is within the default 50.000 threshold
        assert_eq!(shift.approval_status, ApprovalStatus::None);
    }

    #[test]
    fn test_large_discrepancy_flags_pending() {
        let mut shift = open_shift();
        shift.cash_sales = Money::new(500_000);

        // Expected 600.000, counted 520.000 → short by 80.000
        shift
            .close(Money::new(520_000), None, &ShiftPolicy::default(), Utc::now())
            .unwrap();
        assert_eq!(shift.approval_status, ApprovalStatus::Pending);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let policy = ShiftPolicy {
            approval_threshold: Money::new(5_000),
        };
        let mut exact = open_shift();
        exact.close(Money::new(95_000), None, &policy, Utc::now()).unwrap();
        // |−5.000| is not beyond the threshold
        assert_eq!(exact.approval_status, ApprovalStatus::None);

        let mut over = open_shift();
        over.close(Money::new(94_999), None, &policy, Utc::now()).unwrap();
        assert_eq!(over.approval_status, ApprovalStatus::Pending);
    }

    #[test]
    fn test_no_second_close() {
        let mut shift = open_shift();
        shift
            .close(Money::new(100_000), None, &ShiftPolicy::default(), Utc::now())
            .unwrap();

        let err = shift
            .close(Money::new(1), None, &ShiftPolicy::default(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::ShiftClosed(_)));
    }

    #[test]
    fn test_approval_flow() {
        let mut shift = open_shift();
        shift.cash_sales = Money::new(500_000);
        shift
            .close(Money::new(400_000), None, &ShiftPolicy::default(), Utc::now())
            .unwrap();
        assert_eq!(shift.approval_status, ApprovalStatus::Pending);

        shift.approve(Some("Verified against camera".to_string())).unwrap();
        assert_eq!(shift.approval_status, ApprovalStatus::Approved);

        // Irreversible once decided
        let err = shift.reject(None).unwrap_err();
        assert!(matches!(err, CoreError::ApprovalNotPending(_)));
    }

    #[test]
    fn test_approve_requires_pending() {
        let mut shift = open_shift();
        shift
            .close(Money::new(100_000), None, &ShiftPolicy::default(), Utc::now())
            .unwrap();
        assert_eq!(shift.approval_status, ApprovalStatus::None);

        let err = shift.approve(None).unwrap_err();
        assert!(matches!(err, CoreError::ApprovalNotPending(_)));
    }

    #[test]
    fn test_duration_formatting() {
        let shift = open_shift();
        let later = shift.opened_at + Duration::seconds(3_661);
        assert_eq!(shift.duration_secs(later), 3_661);
        assert_eq!(format_duration(3_661), "01:01:01");
        assert_eq!(format_duration(0), "00:00:00");
        assert_eq!(format_duration(59), "00:00:59");
        // Hours do not wrap at 24
        assert_eq!(format_duration(26 * 3600), "26:00:00");
        // Clock skew: magnitude is displayed
        assert_eq!(format_duration(-90), "00:01:30");
    }

    #[test]
    fn test_status_alias_active() {
        let status: ShiftStatus = serde_json::from_str("\"active\"").unwrap();
        assert_eq!(status, ShiftStatus::Open);
        let status: ShiftStatus = serde_json::from_str("\"open\"").unwrap();
        assert_eq!(status, ShiftStatus::Open);
    }
}
