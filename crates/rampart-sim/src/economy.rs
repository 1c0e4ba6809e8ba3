//! Player economy ledger: health and money.
//!
//! The one piece of state several systems mutate (kills, leaks, purchases,
//! refunds). Everything runs on the simulation thread, so plain `&mut` access
//! serializes those mutations.

use rampart_core::error::Rejection;

/// Health and money. Both are unsigned, so they can never go negative:
/// damage saturates at zero and purchases that would overdraw are refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Economy {
    health: u32,
    money: u32,
}

impl Economy {
    pub fn new(health: u32, money: u32) -> Self {
        Self { health, money }
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn money(&self) -> u32 {
        self.money
    }

    /// Health has reached zero.
    pub fn is_depleted(&self) -> bool {
        self.health == 0
    }

    /// Apply leak damage, clamped at zero. Returns the new health.
    pub fn damage(&mut self, amount: u32) -> u32 {
        self.health = self.health.saturating_sub(amount);
        self.health
    }

    /// Kill rewards and sale/cancel refunds.
    pub fn earn(&mut self, amount: u32) {
        self.money = self.money.saturating_add(amount);
    }

    /// Debit `cost`, or refuse without changing anything.
    pub fn try_spend(&mut self, cost: u32) -> Result<(), Rejection> {
        if cost > self.money {
            return Err(Rejection::InsufficientMoney {
                cost,
                money: self.money,
            });
        }
        self.money -= cost;
        Ok(())
    }
}

impl Default for Economy {
    fn default() -> Self {
        Self::new(
            rampart_core::constants::DEFAULT_STARTING_HEALTH,
            rampart_core::constants::DEFAULT_STARTING_MONEY,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_clamps_at_zero() {
        let mut economy = Economy::new(5, 0);
        assert_eq!(economy.damage(3), 2);
        assert_eq!(economy.damage(10), 0);
        assert!(economy.is_depleted());
        assert_eq!(economy.damage(1), 0);
    }

    #[test]
    fn overdraw_is_refused_without_change() {
        let mut economy = Economy::new(10, 40);
        let err = economy.try_spend(100).unwrap_err();
        assert_eq!(err, Rejection::InsufficientMoney { cost: 100, money: 40 });
        assert_eq!(economy.money(), 40);

        economy.try_spend(40).unwrap();
        assert_eq!(economy.money(), 0);
    }

    #[test]
    fn earn_saturates() {
        let mut economy = Economy::new(1, u32::MAX - 1);
        economy.earn(10);
        assert_eq!(economy.money(), u32::MAX);
    }
}
