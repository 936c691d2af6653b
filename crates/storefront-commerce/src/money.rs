//! Money type for base-currency amounts, plus display conversion.
//!
//! Every stored price and total is denominated in the store's base currency
//! and kept as an integer number of hundredths, which avoids floating-point
//! drift in sums. Display currencies only exist at render time, through
//! [`convert`] and [`format`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::{Add, Mul, Sub};

/// Scale between major units and the stored integer amount.
const MINOR_PER_MAJOR: f64 = 100.0;

/// Currencies with known display metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    USD,
    EUR,
    GBP,
    JPY,
    CAD,
    AUD,
    CHF,
    CNY,
    INR,
    MXN,
    RUB,
}

impl Currency {
    /// Get the currency code (e.g., "USD").
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
            Currency::CHF => "CHF",
            Currency::CNY => "CNY",
            Currency::INR => "INR",
            Currency::MXN => "MXN",
            Currency::RUB => "RUB",
        }
    }

    /// Get the currency symbol (e.g., "$").
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::EUR => "\u{20ac}",
            Currency::GBP => "\u{00a3}",
            Currency::JPY => "\u{00a5}",
            Currency::CAD => "CA$",
            Currency::AUD => "A$",
            Currency::CHF => "CHF",
            Currency::CNY => "CN\u{00a5}",
            Currency::INR => "\u{20b9}",
            Currency::MXN => "MX$",
            Currency::RUB => "\u{20bd}",
        }
    }

    /// Get the number of decimal places for this currency.
    pub fn decimal_places(&self) -> usize {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }

    /// Parse a currency code string.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "USD" => Some(Currency::USD),
            "EUR" => Some(Currency::EUR),
            "GBP" => Some(Currency::GBP),
            "JPY" => Some(Currency::JPY),
            "CAD" => Some(Currency::CAD),
            "AUD" => Some(Currency::AUD),
            "CHF" => Some(Currency::CHF),
            "CNY" => Some(Currency::CNY),
            "INR" => Some(Currency::INR),
            "MXN" => Some(Currency::MXN),
            "RUB" => Some(Currency::RUB),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A base-currency amount.
///
/// Stored in hundredths of the base currency's major unit. Arithmetic
/// saturates instead of overflowing so totals can always be computed.
///
/// In JSON an amount is a number of major units (`19.99`), the same unit
/// persisted lines and the coupon validator use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Money {
    /// Amount in hundredths of the base currency.
    pub amount_cents: i64,
}

impl Money {
    /// Create a new Money value from cents.
    pub fn new(amount_cents: i64) -> Self {
        Self { amount_cents }
    }

    /// Create a Money value from a decimal amount.
    ///
    /// Non-finite input becomes zero; values beyond the representable range
    /// saturate.
    ///
    /// ```
    /// use storefront_commerce::money::Money;
    /// assert_eq!(Money::from_decimal(49.99).amount_cents, 4999);
    /// assert_eq!(Money::from_decimal(f64::NAN), Money::zero());
    /// ```
    pub fn from_decimal(amount: f64) -> Self {
        if !amount.is_finite() {
            return Self::zero();
        }
        // `as` saturates for out-of-range floats.
        Self::new((amount * MINOR_PER_MAJOR).round() as i64)
    }

    /// Create a zero amount.
    pub fn zero() -> Self {
        Self::new(0)
    }

    /// Check if this is zero.
    pub fn is_zero(&self) -> bool {
        self.amount_cents == 0
    }

    /// Check if this is positive.
    pub fn is_positive(&self) -> bool {
        self.amount_cents > 0
    }

    /// Check if this is negative.
    pub fn is_negative(&self) -> bool {
        self.amount_cents < 0
    }

    /// Clamp negative amounts to zero.
    pub fn non_negative(&self) -> Self {
        Self::new(self.amount_cents.max(0))
    }

    /// Convert to a decimal value in major units.
    pub fn to_decimal(&self) -> f64 {
        self.amount_cents as f64 / MINOR_PER_MAJOR
    }

    /// Multiply by a quantity.
    pub fn multiply(&self, factor: i64) -> Money {
        Money::new(self.amount_cents.saturating_mul(factor))
    }

    /// Sum an iterator of Money values.
    pub fn sum<'a>(iter: impl Iterator<Item = &'a Money>) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

impl Serialize for Money {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_decimal())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer).map(Money::from_decimal)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money::new(self.amount_cents.saturating_add(other.amount_cents))
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money::new(self.amount_cents.saturating_sub(other.amount_cents))
    }
}

impl Mul<i64> for Money {
    type Output = Money;

    fn mul(self, factor: i64) -> Money {
        self.multiply(factor)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.to_decimal())
    }
}

/// Exchange rates keyed by currency code, relative to a common reference.
///
/// The reference is normally the base currency itself (rate `1`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "HashMap<String, f64>")]
pub struct RateTable(HashMap<String, f64>);

impl RateTable {
    /// Create an empty rate table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a rate.
    pub fn with_rate(mut self, code: impl Into<String>, rate: f64) -> Self {
        self.insert(code, rate);
        self
    }

    /// Add or replace a rate.
    pub fn insert(&mut self, code: impl Into<String>, rate: f64) {
        self.0.insert(code.into().trim().to_uppercase(), rate);
    }

    /// Rate for a currency code.
    ///
    /// Unknown codes and rates that are not positive finite numbers fall back
    /// to `1`, i.e. the amount is shown as if it were in the base currency.
    pub fn rate(&self, code: &str) -> f64 {
        self.0
            .get(&code.trim().to_uppercase())
            .copied()
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .unwrap_or(1.0)
    }

    /// Stored rates, sorted by code.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        let mut rates: Vec<_> = self.0.iter().map(|(code, rate)| (code.as_str(), *rate)).collect();
        rates.sort_by(|a, b| a.0.cmp(b.0));
        rates.into_iter()
    }
}

impl From<HashMap<String, f64>> for RateTable {
    fn from(rates: HashMap<String, f64>) -> Self {
        rates.into_iter().collect()
    }
}

impl FromIterator<(String, f64)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut table = RateTable::new();
        for (code, rate) in iter {
            table.insert(code, rate);
        }
        table
    }
}

/// Convert a base-currency amount into a display currency.
///
/// Never fails and never returns a non-finite number.
///
/// ```
/// use storefront_commerce::money::{convert, RateTable};
/// let rates = RateTable::new().with_rate("EUR", 0.5);
/// assert_eq!(convert(10.0, &rates, "EUR", "USD"), 5.0);
/// assert_eq!(convert(10.0, &rates, "XYZ", "USD"), 10.0);
/// ```
pub fn convert(amount_base: f64, rates: &RateTable, target: &str, base: &str) -> f64 {
    if !amount_base.is_finite() {
        return 0.0;
    }
    if target.trim().eq_ignore_ascii_case(base.trim()) {
        return amount_base;
    }

    let converted = amount_base * rates.rate(target) / rates.rate(base);
    if converted.is_finite() {
        converted
    } else {
        0.0
    }
}

/// Separators and symbol placement for a locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LocaleStyle {
    group: char,
    decimal: char,
    symbol_first: bool,
}

impl LocaleStyle {
    const ENGLISH: LocaleStyle = LocaleStyle {
        group: ',',
        decimal: '.',
        symbol_first: true,
    };

    fn for_locale(locale: Option<&str>) -> Self {
        let language = locale
            .and_then(|l| l.split(['-', '_']).next())
            .map(|l| l.to_lowercase())
            .unwrap_or_default();

        match language.as_str() {
            "de" | "es" | "it" | "pt" | "nl" | "tr" | "id" | "da" => LocaleStyle {
                group: '.',
                decimal: ',',
                symbol_first: false,
            },
            "fr" | "ru" | "pl" | "cs" | "sv" | "fi" | "nb" | "uk" => LocaleStyle {
                group: '\u{00a0}',
                decimal: ',',
                symbol_first: false,
            },
            _ => Self::ENGLISH,
        }
    }
}

/// Format an amount for display in the given currency.
///
/// Known codes use their symbol and minor units; unknown codes render as
/// `"<amount> <CODE>"` with two decimals. Non-finite amounts are shown as 0.
///
/// ```
/// use storefront_commerce::money::format;
/// assert_eq!(format(1234.5, "USD", None), "$1,234.50");
/// assert_eq!(format(1234.5, "EUR", Some("de-DE")), "1.234,50\u{a0}\u{20ac}");
/// ```
pub fn format(amount: f64, currency_code: &str, locale: Option<&str>) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    let style = LocaleStyle::for_locale(locale);
    let currency = Currency::from_code(currency_code);
    let places = currency.map(|c| c.decimal_places()).unwrap_or(2);

    let number = format_number(amount.abs(), places, style);
    let sign = if amount < 0.0 && number.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };

    match currency {
        Some(c) if style.symbol_first => format!("{}{}{}", sign, c.symbol(), number),
        Some(c) => format!("{}{}\u{00a0}{}", sign, number, c.symbol()),
        None => format!(
            "{}{} {}",
            sign,
            number,
            currency_code.trim().to_uppercase()
        ),
    }
}

fn format_number(value: f64, places: usize, style: LocaleStyle) -> String {
    let fixed = format!("{:.places$}", value);
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(style.group);
        }
        grouped.push(*digit);
    }

    match frac_part {
        Some(frac) => format!("{}{}{}", grouped, style.decimal, frac),
        None => grouped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_amounts_are_major_units() {
        assert_eq!(serde_json::to_string(&Money::new(1999)).unwrap(), "19.99");
        assert_eq!(serde_json::to_string(&Money::new(1000)).unwrap(), "10.0");
        assert_eq!(serde_json::from_str::<Money>("10").unwrap(), Money::new(1000));
    }

    #[test]
    fn test_money_from_decimal() {
        assert_eq!(Money::from_decimal(49.99).amount_cents, 4999);
        assert_eq!(Money::from_decimal(0.1 + 0.2).amount_cents, 30);
        assert_eq!(Money::from_decimal(f64::INFINITY), Money::zero());
    }

    #[test]
    fn test_money_round_trips_through_decimal() {
        let m = Money::new(129_999);
        assert_eq!(Money::from_decimal(m.to_decimal()), m);
    }

    #[test]
    fn test_money_arithmetic_saturates() {
        let max = Money::new(i64::MAX);
        assert_eq!((max + Money::new(1)).amount_cents, i64::MAX);
        assert_eq!(max.multiply(3).amount_cents, i64::MAX);
        assert_eq!((Money::new(1000) - Money::new(300)).amount_cents, 700);
    }

    #[test]
    fn test_money_sum() {
        let amounts = [Money::new(100), Money::new(250)];
        assert_eq!(Money::sum(amounts.iter()), Money::new(350));
    }

    #[test]
    fn test_currency_from_code() {
        assert_eq!(Currency::from_code("USD"), Some(Currency::USD));
        assert_eq!(Currency::from_code("eur"), Some(Currency::EUR));
        assert_eq!(Currency::from_code("INVALID"), None);
    }

    #[test]
    fn test_rate_fallbacks() {
        let rates = RateTable::new()
            .with_rate("EUR", 0.9)
            .with_rate("BAD", -2.0)
            .with_rate("NAN", f64::NAN);
        assert_eq!(rates.rate("eur"), 0.9);
        assert_eq!(rates.rate("BAD"), 1.0);
        assert_eq!(rates.rate("NAN"), 1.0);
        assert_eq!(rates.rate("GBP"), 1.0);
    }

    #[test]
    fn test_rate_table_deserialize_normalizes_codes() {
        let rates: RateTable = serde_json::from_str(r#"{"eur": 0.5}"#).unwrap();
        assert_eq!(rates.rate("EUR"), 0.5);
    }

    #[test]
    fn test_convert_uses_base_rate() {
        let rates = RateTable::new().with_rate("USD", 2.0).with_rate("EUR", 4.0);
        assert_eq!(convert(10.0, &rates, "EUR", "USD"), 20.0);
        assert_eq!(convert(10.0, &rates, "USD", "USD"), 10.0);
        assert_eq!(convert(f64::NAN, &rates, "EUR", "USD"), 0.0);
    }

    #[test]
    fn test_format_known_currencies() {
        assert_eq!(format(1234.5, "USD", None), "$1,234.50");
        assert_eq!(format(1234.6, "JPY", Some("en-US")), "\u{00a5}1,235");
        assert_eq!(format(-5.0, "GBP", None), "-\u{00a3}5.00");
        assert_eq!(format(1_234_567.0, "RUB", Some("ru")), "1\u{a0}234\u{a0}567,00\u{a0}\u{20bd}");
    }

    #[test]
    fn test_format_degenerate_inputs() {
        assert_eq!(format(f64::NAN, "USD", None), "$0.00");
        assert_eq!(format(12.0, "xyz", None), "12.00 XYZ");
        assert_eq!(format(-0.001, "USD", None), "$0.00");
    }
}
