//! Display formatting for amounts and dates.

use std::fmt::Display;

use chrono::{DateTime, TimeZone};
use rust_decimal::{Decimal, RoundingStrategy};

/// Format an amount as euros the way German locales do: `1.234,56 €`
///
/// The currency sign is separated by a non-breaking space.
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();

    let digits = format!("{:.2}", rounded.abs());
    let (integer, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, c) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    format!(
        "{}{},{}\u{a0}€",
        if negative { "-" } else { "" },
        grouped,
        fraction
    )
}

/// Format a date as `Jan 1, 2024`
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    date.format("%b %-d, %Y").to_string()
}
