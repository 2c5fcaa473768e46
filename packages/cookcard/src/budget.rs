//! Minute-denominated budget for the vision stage.
//!
//! Reservation is optimistic: the minutes are claimed *before* the
//! expensive call, so a burst of concurrent requests cannot all pass a
//! check against the same remaining headroom. The claim is released on
//! every failure path and consumed permanently on success.
//!
//! Release-on-failure is guaranteed by the [`BudgetReservation`] guard:
//! dropping it without calling [`BudgetReservation::commit`] returns the
//! minutes to the ledger, including on early returns and panics.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::types::config::BudgetConfig;

/// Why a reservation was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BudgetDenied {
    /// The user's monthly vision-minute allowance is exhausted.
    UserCeiling { requested: u32, remaining: u32 },
    /// The deployment-wide daily allowance is exhausted.
    GlobalCeiling { requested: u32, remaining: u32 },
}

impl std::fmt::Display for BudgetDenied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BudgetDenied::UserCeiling { requested, remaining } => write!(
                f,
                "monthly vision budget exhausted ({requested} min requested, {remaining} remaining)"
            ),
            BudgetDenied::GlobalCeiling { requested, remaining } => write!(
                f,
                "global vision budget exhausted ({requested} min requested, {remaining} remaining)"
            ),
        }
    }
}

#[derive(Debug, Default)]
struct Accounts {
    /// Reserved-but-not-consumed minutes per user
    user_reserved: HashMap<String, u32>,
    /// Consumed minutes per user (monthly window)
    user_consumed: HashMap<String, u32>,
    global_reserved: u32,
    global_consumed: u32,
}

impl Accounts {
    fn user_committed_total(&self, user_id: &str) -> u32 {
        self.user_reserved.get(user_id).copied().unwrap_or(0)
            + self.user_consumed.get(user_id).copied().unwrap_or(0)
    }
}

/// In-process budget ledger.
///
/// All checks and mutations happen under a single lock, so two concurrent
/// requests can never both reserve against the same remaining headroom.
#[derive(Debug)]
pub struct BudgetLedger {
    config: BudgetConfig,
    accounts: Mutex<Accounts>,
}

impl BudgetLedger {
    pub fn new(config: BudgetConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            accounts: Mutex::new(Accounts::default()),
        })
    }

    /// Atomically claim `minutes` for a user, or explain the refusal.
    pub fn reserve(
        self: &Arc<Self>,
        user_id: &str,
        minutes: u32,
    ) -> Result<BudgetReservation, BudgetDenied> {
        let mut accounts = self.accounts.lock().unwrap();

        let user_total = accounts.user_committed_total(user_id);
        let user_limit = self.config.user_monthly_vision_minutes;
        if user_total + minutes > user_limit {
            return Err(BudgetDenied::UserCeiling {
                requested: minutes,
                remaining: user_limit.saturating_sub(user_total),
            });
        }

        let global_total = accounts.global_reserved + accounts.global_consumed;
        let global_limit = self.config.global_daily_vision_minutes;
        if global_total + minutes > global_limit {
            return Err(BudgetDenied::GlobalCeiling {
                requested: minutes,
                remaining: global_limit.saturating_sub(global_total),
            });
        }

        *accounts.user_reserved.entry(user_id.to_string()).or_insert(0) += minutes;
        accounts.global_reserved += minutes;

        Ok(BudgetReservation {
            ledger: Arc::clone(self),
            user_id: user_id.to_string(),
            minutes,
            committed: false,
        })
    }

    fn release(&self, user_id: &str, minutes: u32) {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(reserved) = accounts.user_reserved.get_mut(user_id) {
            *reserved = reserved.saturating_sub(minutes);
        }
        accounts.global_reserved = accounts.global_reserved.saturating_sub(minutes);
    }

    fn consume(&self, user_id: &str, minutes: u32) {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(reserved) = accounts.user_reserved.get_mut(user_id) {
            *reserved = reserved.saturating_sub(minutes);
        }
        accounts.global_reserved = accounts.global_reserved.saturating_sub(minutes);
        *accounts.user_consumed.entry(user_id.to_string()).or_insert(0) += minutes;
        accounts.global_consumed += minutes;
    }

    /// Total reserved-but-neither-released-nor-consumed minutes.
    ///
    /// Zero whenever no request is in flight (budget conservation).
    pub fn outstanding_minutes(&self) -> u32 {
        self.accounts.lock().unwrap().global_reserved
    }

    /// Minutes consumed globally so far.
    pub fn consumed_minutes(&self) -> u32 {
        self.accounts.lock().unwrap().global_consumed
    }
}

/// A live claim against the budget.
///
/// Consumes the minutes permanently via [`commit`]; dropping the guard on
/// any other path returns them to the ledger.
///
/// [`commit`]: BudgetReservation::commit
#[derive(Debug)]
#[must_use = "dropping a reservation releases the budget"]
pub struct BudgetReservation {
    ledger: Arc<BudgetLedger>,
    user_id: String,
    minutes: u32,
    committed: bool,
}

impl BudgetReservation {
    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    /// Consume the reserved minutes permanently (the success path).
    pub fn commit(mut self) {
        self.ledger.consume(&self.user_id, self.minutes);
        self.committed = true;
    }
}

impl Drop for BudgetReservation {
    fn drop(&mut self) {
        if !self.committed {
            self.ledger.release(&self.user_id, self.minutes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(user_minutes: u32, global_minutes: u32) -> Arc<BudgetLedger> {
        BudgetLedger::new(BudgetConfig {
            user_monthly_vision_minutes: user_minutes,
            global_daily_vision_minutes: global_minutes,
        })
    }

    #[test]
    fn test_reserve_and_commit_consumes() {
        let ledger = ledger(10, 100);
        let reservation = ledger.reserve("u1", 3).unwrap();
        assert_eq!(ledger.outstanding_minutes(), 3);

        reservation.commit();
        assert_eq!(ledger.outstanding_minutes(), 0);
        assert_eq!(ledger.consumed_minutes(), 3);
    }

    #[test]
    fn test_drop_releases() {
        let ledger = ledger(10, 100);
        {
            let _reservation = ledger.reserve("u1", 4).unwrap();
            assert_eq!(ledger.outstanding_minutes(), 4);
        }
        assert_eq!(ledger.outstanding_minutes(), 0);
        assert_eq!(ledger.consumed_minutes(), 0);

        // Released minutes are available again
        assert!(ledger.reserve("u1", 10).is_ok());
    }

    #[test]
    fn test_user_ceiling() {
        let ledger = ledger(5, 100);
        ledger.reserve("u1", 3).unwrap().commit();

        let err = ledger.reserve("u1", 3).unwrap_err();
        assert_eq!(
            err,
            BudgetDenied::UserCeiling {
                requested: 3,
                remaining: 2
            }
        );

        // A different user is unaffected
        assert!(ledger.reserve("u2", 5).is_ok());
    }

    #[test]
    fn test_global_ceiling_counts_reservations() {
        let ledger = ledger(10, 6);
        let _held = ledger.reserve("u1", 4).unwrap();

        // A concurrent reservation sees the held claim, not just consumed spend
        let err = ledger.reserve("u2", 4).unwrap_err();
        assert!(matches!(err, BudgetDenied::GlobalCeiling { remaining: 2, .. }));
    }
}
