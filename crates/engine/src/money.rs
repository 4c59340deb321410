use std::{fmt, str::FromStr};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::ReferenceCurrency;

/// Value in the reference currency, rounded to **2 decimal places**.
///
/// Every monetary figure the engine hands back (per-currency values, totals,
/// profit/loss) is a `Money`. Rounding is half-up: midpoints go away from
/// zero, so `0.005` becomes `0.01` and `-0.005` becomes `-0.01`.
///
/// The value is signed only for profit/loss; valuations are never negative.
///
/// # Examples
///
/// ```rust
/// use engine::Money;
/// use rust_decimal::Decimal;
///
/// let value = Money::round(Decimal::new(12_345, 3));
/// assert_eq!(value.to_string(), "12.35");
/// assert_eq!(value.format_in(engine::ReferenceCurrency::Eur), "€12.35");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Rounds an arbitrary decimal to cents.
    #[must_use]
    pub fn round(value: Decimal) -> Self {
        let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(2);
        Self(rounded)
    }

    /// Creates a value from integer cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Returns the underlying decimal (2 fractional digits).
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    #[must_use]
    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Like [`Money::checked_add`], clamping to the largest representable
    /// value instead of failing.
    #[must_use]
    pub fn saturating_add(self, rhs: Money) -> Money {
        self.checked_add(rhs).unwrap_or_else(|| {
            tracing::warn!("overflow adding {self} and {rhs}, saturating");
            Money(self.0.saturating_add(rhs.0))
        })
    }

    #[must_use]
    pub fn saturating_sub(self, rhs: Money) -> Money {
        self.checked_sub(rhs).unwrap_or_else(|| {
            tracing::warn!("overflow subtracting {rhs} from {self}, saturating");
            Money(self.0.saturating_sub(rhs.0))
        })
    }

    /// Formats the value with the currency symbol, sign first: `€12.30`,
    /// `-€12.30`.
    #[must_use]
    pub fn format_in(self, currency: ReferenceCurrency) -> String {
        let sign = if self.is_negative() { "-" } else { "" };
        format!("{sign}{}{:.2}", currency.symbol(), self.0.abs())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

/// Parses a transaction amount.
///
/// Accepts plain decimals (`1.5`, `-0.25`, `+3`) and scientific notation
/// (`1e-8`), with surrounding whitespace. Anything else, including an empty
/// string, `NaN` or trailing text, is rejected.
pub(crate) fn parse_amount(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let unsigned = match trimmed.strip_prefix('+') {
        Some(rest) if rest.starts_with(['+', '-']) => return None,
        Some(rest) => rest,
        None => trimmed,
    };
    Decimal::from_str(unsigned)
        .or_else(|_| Decimal::from_scientific(unsigned))
        .ok()
}
