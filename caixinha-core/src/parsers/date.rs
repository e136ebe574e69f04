//! Competence date parsing ("hoje", "ontem", "29/12", "29-12-25")

use std::ops::Range;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use super::fold;

const TODAY_WORDS: &[&str] = &["hoje", "today"];
const YESTERDAY_WORDS: &[&str] = &["ontem", "yesterday"];

fn day_month_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(\d{1,2})[/-](\d{1,2})(?:[/-](\d{4}|\d{2}))?\b").expect("date pattern")
    })
}

/// Parse a whole reply as a date. `today` anchors the relative words and
/// the default year.
pub fn parse_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let folded = fold(text);
    if TODAY_WORDS.contains(&folded.as_str()) {
        return Some(today);
    }
    if YESTERDAY_WORDS.contains(&folded.as_str()) {
        return today.pred_opt();
    }
    find_day_month(&folded, today).map(|(date, _)| date)
}

/// Locate a `day/month[/year]` date inside `text`, returning the date and
/// the byte span it covers. Invalid calendar dates yield `None`.
pub(crate) fn find_day_month(text: &str, today: NaiveDate) -> Option<(NaiveDate, Range<usize>)> {
    let caps = day_month_pattern().captures(text)?;
    let span = caps.get(0)?.range();

    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year = match caps.get(3) {
        None => today.year(),
        Some(y) if y.as_str().len() == 2 => 2000 + y.as_str().parse::<i32>().ok()?,
        Some(y) => y.as_str().parse().ok()?,
    };

    NaiveDate::from_ymd_opt(year, month, day).map(|date| (date, span))
}

/// Whether a relative date word appears among the tokens
pub(crate) fn relative_date(tokens: &[String], today: NaiveDate) -> Option<NaiveDate> {
    let has = |words: &[&str]| tokens.iter().any(|t| words.contains(&t.as_str()));
    match (has(TODAY_WORDS), has(YESTERDAY_WORDS)) {
        (true, false) => Some(today),
        (false, true) => today.pred_opt(),
        _ => None,
    }
}

/// Canonical storage form
pub fn format_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Display form used in chat messages
pub fn format_br(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}
