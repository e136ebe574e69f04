//! Amount extraction for Brazilian-style values ("35,90", "R$ 120")

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;

/// A maximal run of digits with separators between them
fn numeric_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:[.,]\d+)*").expect("numeric run pattern"))
}

/// Shape a run must have, as a whole, to count as an amount
fn amount_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,9}(?:[.,]\d{2})?$").expect("amount pattern"))
}

/// Extract the first amount in `text`.
///
/// Only a single group of up to nine digits with an optional two-digit
/// decimal part is understood. Grouped values such as `1.234,56` are not
/// recognized at all rather than misread as `1.23`. A dot is always a
/// thousands separator and is dropped, so `12.50` reads as 1250; only the
/// comma marks decimals.
pub fn parse_amount(text: &str) -> Option<Decimal> {
    numeric_run()
        .find_iter(text)
        .map(|m| m.as_str())
        .find(|run| amount_shape().is_match(run))
        .and_then(|run| Decimal::from_str(&run.replace('.', "").replace(',', ".")).ok())
}
