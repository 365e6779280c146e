//! Earnings calculation.
//!
//! Earnings are `minutes / 60 * hourly_rate`, rounded half-up to the cent.
//! Aggregates sum exact cent-minutes first and round once at the end, so the
//! total for many entries never drifts from the total computed in one go.

use crate::types::Money;

const MINUTES_PER_HOUR: i128 = 60;

/// Earnings for a single span of work.
///
/// Returns zero when the work is not billable.
pub fn earnings(duration_minutes: u64, hourly_rate: Money, billable: bool) -> Money {
    let mut acc = EarningsAccumulator::new();
    acc.add(duration_minutes, hourly_rate, billable);
    acc.total()
}

/// Running earnings total kept in exact cent-minutes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EarningsAccumulator {
    cent_minutes: i128,
}

impl EarningsAccumulator {
    pub const fn new() -> Self {
        Self { cent_minutes: 0 }
    }

    /// Adds a span of work. Non-billable work contributes nothing.
    pub fn add(&mut self, minutes: u64, hourly_rate: Money, billable: bool) {
        if !billable {
            return;
        }
        let amount = i128::from(minutes) * i128::from(hourly_rate.cents());
        self.cent_minutes = self.cent_minutes.saturating_add(amount);
    }

    /// Folds another accumulator into this one.
    pub const fn merge(&mut self, other: Self) {
        self.cent_minutes = self.cent_minutes.saturating_add(other.cent_minutes);
    }

    /// Rounds the exact total half-up to whole cents.
    pub fn total(self) -> Money {
        let cents = self
            .cent_minutes
            .saturating_add(MINUTES_PER_HOUR / 2)
            .div_euclid(MINUTES_PER_HOUR);
        let cents = i64::try_from(cents).unwrap_or(if cents > 0 { i64::MAX } else { i64::MIN });
        Money::from_cents(cents)
    }
}
