//! Money in integer minor units
//!
//! Amounts are carried as minor units (øre, cents) from the moment they are
//! created. Anything fractional (tax rates, decimal prices) is rounded once,
//! when the `Money` value is made, using `rust_decimal`. Rendering only
//! formats; it never rounds.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub};

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use crate::printing::types::PrintableItem;

/// Minor units per major unit
const MINOR_PER_MAJOR: i64 = 100;

/// Amount in minor currency units
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Create from a major-unit decimal, rounding half away from zero
    pub fn from_major(major: Decimal) -> Self {
        let minor = (major * Decimal::from(MINOR_PER_MAJOR))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Money(minor.to_i64().unwrap_or(0))
    }

    /// `rate` (e.g. `0.25` for 25 %) of this amount, rounded half away from zero
    pub fn percent(self, rate: Decimal) -> Self {
        let minor = (Decimal::from(self.0) * rate)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Money(minor.to_i64().unwrap_or(0))
    }

    pub fn times(self, quantity: u32) -> Self {
        Money(self.0.saturating_mul(i64::from(quantity)))
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Fixed two-decimal rendering with the given decimal separator
    pub fn format(self, decimal_separator: char) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per = MINOR_PER_MAJOR.unsigned_abs();
        format!(
            "{}{}{}{:02}",
            sign,
            abs / per,
            decimal_separator,
            abs % per
        )
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format('.'))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(self.0.saturating_neg())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

/// Receipt display settings for amounts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoneyFormat {
    pub decimal_separator: char,
    pub currency: String,
}

impl MoneyFormat {
    pub fn new(decimal_separator: char, currency: impl Into<String>) -> Self {
        Self {
            decimal_separator,
            currency: currency.into(),
        }
    }

    /// Amount without currency, e.g. `129,00`
    pub fn amount(&self, money: Money) -> String {
        money.format(self.decimal_separator)
    }

    /// Amount with currency, e.g. `129,00 kr.`
    pub fn with_currency(&self, money: Money) -> String {
        if self.currency.is_empty() {
            self.amount(money)
        } else {
            format!("{} {}", self.amount(money), self.currency)
        }
    }
}

impl Default for MoneyFormat {
    fn default() -> Self {
        Self::new(',', "kr.")
    }
}

/// Order-level amounts printed in a customer receipt's totals block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub tip: Money,
}

impl OrderTotals {
    /// Compute from line items; tax is `tax_rate` of the discounted subtotal
    pub fn from_items(
        items: &[PrintableItem],
        discount: Money,
        tax_rate: Decimal,
        tip: Money,
    ) -> Self {
        let subtotal: Money = items.iter().map(PrintableItem::line_total).sum();
        let tax = (subtotal - discount).percent(tax_rate);
        Self {
            subtotal,
            discount,
            tax,
            tip,
        }
    }

    /// `subtotal - discount + tax + tip`
    pub fn total(&self) -> Money {
        self.subtotal - self.discount + self.tax + self.tip
    }
}

#[cfg(test)]
mod tests;
