//! Budget ledger and the daily allocation pass.
//!
//! Each company keeps one integer credit pool per [`Budget`] category.
//! Balances persist across days; a category is replenished by the daily
//! allocation and drained by guarded spends. Category handlers report back
//! a [`BudgetOutcome`] and the allocator decides whether surplus should be
//! donated to the categories still waiting in the same pass.

use crate::CompanyAI;
use sim_core::{Budget, World};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Money kept liquid outside the budget pools, in credits.
pub(crate) const WORKING_RESERVE: i64 = 10_000;

/// Per-category running balances.
#[derive(Clone, Debug, Default)]
pub struct BudgetLedger {
    balances: BTreeMap<Budget, i64>,
}

impl BudgetLedger {
    pub fn get(&self, category: Budget) -> i64 {
        self.balances.get(&category).copied().unwrap_or(0)
    }

    /// Add `delta` to a category. Balances may go negative transiently;
    /// spends are guarded separately.
    pub fn modify(&mut self, category: Budget, delta: i64) {
        *self.balances.entry(category).or_insert(0) += delta;
    }

    /// Guarded spend: no-ops and returns false when `amount` exceeds the
    /// balance or is negative.
    pub fn spend(&mut self, category: Budget, amount: i64) -> bool {
        if amount < 0 || amount > self.get(category) {
            return false;
        }
        self.modify(category, -amount);
        true
    }

    /// Sum of the positive balances, i.e. money earmarked by the pools.
    pub fn total_positive(&self) -> i64 {
        self.balances.values().filter(|v| **v > 0).sum()
    }
}

/// Result of one category handler, returned by value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BudgetOutcome {
    /// Credits the handler committed this pass.
    pub spent: i64,
    /// The category has live plans and should retain its leftover rather
    /// than donate it (e.g. saving toward a station or a hull).
    pub locked: bool,
    /// Nothing useful to spend on this pass; the leftover rolls over.
    pub idle: bool,
}

impl BudgetOutcome {
    pub fn idle() -> Self {
        Self {
            spent: 0,
            locked: false,
            idle: true,
        }
    }

    pub fn locked(spent: i64) -> Self {
        Self {
            spent,
            locked: true,
            idle: false,
        }
    }

    pub fn spent(spent: i64) -> Self {
        Self {
            spent,
            locked: false,
            idle: false,
        }
    }
}

impl CompanyAI {
    /// Move unallocated company money into the budget pools, split by the
    /// behavior's category weights. Money already earmarked (positive
    /// balances) and the working reserve stay out.
    pub(crate) fn allocate_income(&mut self, world: &World) {
        let Some(company) = world.company(&self.company) else {
            return;
        };
        let allocatable = company.money as i64 - WORKING_RESERVE - self.ledger.total_positive();
        if allocatable <= 0 {
            return;
        }
        let weights: Vec<(Budget, f32)> = Budget::ALL
            .iter()
            .map(|b| (*b, self.behavior.budget_weight(*b)))
            .collect();
        let total: f32 = weights.iter().map(|(_, w)| w).sum();
        if total <= 0.0 {
            return;
        }
        for (category, weight) in weights {
            let share = ((allocatable as f64) * (weight / total) as f64) as i64;
            if share > 0 {
                self.ledger.modify(category, share);
            }
        }
        trace!(company = %self.company.0, allocatable, "income allocated to budgets");
    }

    /// Process categories in the caller-supplied order.
    ///
    /// A handler that spent and is neither locked nor idle donates its
    /// leftover to the categories still in the pass, weighted by the
    /// behavior's budget weights; locked and idle categories keep their
    /// balance for future days.
    pub fn process_budget(&mut self, world: &mut World, order: &[Budget]) {
        let mut remaining: Vec<Budget> = order.to_vec();
        while !remaining.is_empty() {
            let category = remaining.remove(0);
            let available = self.ledger.get(category);
            let outcome = match category {
                Budget::Military => self.process_budget_military(world, available),
                Budget::Station => self.process_budget_station(world, available),
                Budget::Trade => self.process_budget_trade(world, available),
                // Reserved category: no spend path is wired.
                Budget::Technology => BudgetOutcome::idle(),
            };
            debug!(
                company = %self.company.0,
                ?category,
                available,
                spent = outcome.spent,
                locked = outcome.locked,
                idle = outcome.idle,
                "budget category processed"
            );
            if outcome.locked || outcome.idle {
                continue;
            }
            let leftover = self.ledger.get(category);
            if leftover <= 0 || remaining.is_empty() {
                continue;
            }
            let weights: Vec<f32> = remaining
                .iter()
                .map(|b| self.behavior.budget_weight(*b))
                .collect();
            let total: f32 = weights.iter().sum();
            if total <= 0.0 {
                continue;
            }
            let mut donated = 0i64;
            for (target, weight) in remaining.iter().zip(&weights) {
                let share = ((leftover as f64) * (weight / total) as f64) as i64;
                if share > 0 {
                    self.ledger.modify(*target, share);
                    donated += share;
                }
            }
            self.ledger.modify(category, -donated);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn spend_is_guarded() {
        let mut ledger = BudgetLedger::default();
        ledger.modify(Budget::Trade, 100);
        assert!(!ledger.spend(Budget::Trade, 101));
        assert_eq!(ledger.get(Budget::Trade), 100);
        assert!(ledger.spend(Budget::Trade, 100));
        assert_eq!(ledger.get(Budget::Trade), 0);
        assert!(!ledger.spend(Budget::Trade, 1));
    }

    #[test]
    fn negative_spend_rejected() {
        let mut ledger = BudgetLedger::default();
        ledger.modify(Budget::Military, 50);
        assert!(!ledger.spend(Budget::Military, -10));
        assert_eq!(ledger.get(Budget::Military), 50);
    }

    #[test]
    fn modify_may_go_negative() {
        let mut ledger = BudgetLedger::default();
        ledger.modify(Budget::Station, -30);
        assert_eq!(ledger.get(Budget::Station), -30);
        assert_eq!(ledger.total_positive(), 0);
    }

    #[test]
    fn total_positive_ignores_negative_pools() {
        let mut ledger = BudgetLedger::default();
        ledger.modify(Budget::Station, -30);
        ledger.modify(Budget::Trade, 80);
        ledger.modify(Budget::Military, 20);
        assert_eq!(ledger.total_positive(), 100);
    }

    proptest! {
        #[test]
        fn ledger_arithmetic_never_fabricates(
            deposits in proptest::collection::vec(0i64..10_000, 0..8),
            spends in proptest::collection::vec(0i64..10_000, 0..8),
        ) {
            let mut ledger = BudgetLedger::default();
            let mut expected = 0i64;
            for d in &deposits {
                ledger.modify(Budget::Trade, *d);
                expected += d;
            }
            for s in &spends {
                if ledger.spend(Budget::Trade, *s) {
                    expected -= s;
                }
            }
            prop_assert_eq!(ledger.get(Budget::Trade), expected);
            prop_assert!(expected >= 0);
        }

        #[test]
        fn overdraw_leaves_balance_unchanged(balance in 0i64..1_000, over in 1i64..1_000) {
            let mut ledger = BudgetLedger::default();
            ledger.modify(Budget::Military, balance);
            prop_assert!(!ledger.spend(Budget::Military, balance + over));
            prop_assert_eq!(ledger.get(Budget::Military), balance);
        }
    }
}
