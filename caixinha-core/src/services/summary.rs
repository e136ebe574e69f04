//! Summary service - period reports over stored records

use std::collections::HashMap;
use std::fmt::Write as _;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::result::{Error, Result};
use crate::domain::vocab::PERIOD_OPTIONS;
use crate::domain::{Kind, RecordRow};
use crate::parsers::{format_br, match_choice_text};
use crate::ports::{Clock, RecordStore};

/// Label for records stored without a category
const UNCATEGORIZED: &str = "Sem categoria";

/// Report window ending today (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Today,
    Last7Days,
    CurrentMonth,
    Last3Months,
    Last6Months,
    Last12Months,
}

impl Period {
    pub const ALL: [Period; 6] = [
        Period::Today,
        Period::Last7Days,
        Period::CurrentMonth,
        Period::Last3Months,
        Period::Last6Months,
        Period::Last12Months,
    ];

    /// Value carried by the matching picklist option
    pub fn value(&self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::Last7Days => "7d",
            Period::CurrentMonth => "month",
            Period::Last3Months => "3m",
            Period::Last6Months => "6m",
            Period::Last12Months => "12m",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.value() == value)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Period::Today => "Hoje",
            Period::Last7Days => "Últimos 7 dias",
            Period::CurrentMonth => "Mês atual",
            Period::Last3Months => "Últimos 3 meses",
            Period::Last6Months => "Últimos 6 meses",
            Period::Last12Months => "Últimos 12 meses",
        }
    }

    /// First day of the window
    pub fn start(&self, today: NaiveDate) -> NaiveDate {
        let days_back = match self {
            Period::Today => 0,
            Period::Last7Days => 6,
            Period::CurrentMonth => return today.with_day(1).unwrap_or(today),
            Period::Last3Months => 90,
            Period::Last6Months => 182,
            Period::Last12Months => 364,
        };
        today - Duration::days(days_back)
    }
}

impl FromStr for Period {
    type Err = Error;

    /// Accepts option values ("7d") and typed names ("mensal", "3 meses")
    fn from_str(s: &str) -> Result<Self> {
        Self::from_value(s.trim())
            .or_else(|| match_choice_text(PERIOD_OPTIONS, s).and_then(|c| Self::from_value(c.value)))
            .ok_or_else(|| Error::validation(format!("unknown period: {s}")))
    }
}

/// Amount spent or received under one label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub label: String,
    pub amount: Decimal,
}

/// Totals for one kind, categories largest first
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KindTotals {
    pub total: Decimal,
    pub categories: Vec<CategoryTotal>,
}

impl KindTotals {
    /// Add to a bucket, creating it in first-seen order
    fn add(&mut self, index: &mut HashMap<String, usize>, label: &str, amount: Decimal) {
        let position = *index.entry(label.to_string()).or_insert_with(|| {
            self.categories.push(CategoryTotal {
                label: label.to_string(),
                amount: Decimal::ZERO,
            });
            self.categories.len() - 1
        });
        self.categories[position].amount += amount;
        self.total += amount;
    }

    /// Descending by amount; ties keep bucket order
    fn sort(&mut self) {
        self.categories.sort_by(|a, b| b.amount.cmp(&a.amount));
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub period: Period,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub income: KindTotals,
    pub expense: KindTotals,
    /// Records counted in the window
    pub records: usize,
    /// Rows skipped for an unreadable kind, amount or date
    pub skipped: usize,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    pub fn net(&self) -> Decimal {
        self.income.total - self.expense.total
    }

    /// Expense as a percentage of income, zero when there is no income
    pub fn expense_ratio(&self) -> Decimal {
        if self.income.total.is_zero() {
            return Decimal::ZERO;
        }
        (self.expense.total / self.income.total * Decimal::ONE_HUNDRED).round_dp(1)
    }

    /// Chat-ready report text
    pub fn render(&self) -> String {
        let window = format!("{} a {}", format_br(self.start), format_br(self.end));
        if self.is_empty() {
            return format!(
                "Nenhum lançamento encontrado para {} ({}).",
                self.period.label(),
                window
            );
        }

        let mut out = String::new();
        let _ = writeln!(out, "Resumo: {}", self.period.label());
        let _ = writeln!(out, "Período: {}", window);

        for (title, totals) in [("Receitas", &self.income), ("Despesas", &self.expense)] {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}: {}", title, format_money(totals.total));
            for category in &totals.categories {
                let _ = writeln!(out, "- {}: {}", category.label, format_money(category.amount));
            }
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "Saldo: {}", format_money(self.net()));
        let _ = write!(out, "Despesas/Receitas: {}", format_percent(self.expense_ratio()));
        out
    }
}

fn parse_stored_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%d/%m/%Y"))
        .ok()
}

/// Stored amounts are normally "-50.00"; hand-edited sheets may say "R$ 1.234,56"
fn parse_stored_amount(value: &str) -> Option<Decimal> {
    let value = value.trim().trim_start_matches("R$").trim();
    Decimal::from_str(value).ok().or_else(|| {
        if value.contains(',') {
            Decimal::from_str(&value.replace('.', "").replace(',', ".")).ok()
        } else {
            None
        }
    })
}

/// Bucket rows whose competence date falls in the window
pub fn aggregate(rows: &[RecordRow], period: Period, today: NaiveDate) -> Summary {
    let start = period.start(today);
    let mut income = KindTotals::default();
    let mut expense = KindTotals::default();
    let mut income_index = HashMap::new();
    let mut expense_index = HashMap::new();
    let mut records = 0;
    let mut skipped = 0;

    for row in rows {
        let parsed = (
            Kind::from_str(&row.kind).ok(),
            parse_stored_date(&row.competence_date),
            parse_stored_amount(&row.amount),
        );
        let (kind, date, amount) = match parsed {
            (Some(kind), Some(date), Some(amount)) => (kind, date, amount),
            _ => {
                skipped += 1;
                continue;
            }
        };
        if date < start || date > today {
            continue;
        }

        let label = match row.category.trim() {
            "" => UNCATEGORIZED,
            label => label,
        };
        match kind {
            Kind::Income => income.add(&mut income_index, label, amount.abs()),
            Kind::Expense => expense.add(&mut expense_index, label, amount.abs()),
        }
        records += 1;
    }

    income.sort();
    expense.sort();

    Summary {
        period,
        start,
        end: today,
        income,
        expense,
        records,
        skipped,
    }
}

/// `R$ 1.234,56`, with the minus sign in front for negatives
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let digits = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}R$ {grouped},{frac_part}")
}

/// `7,0%`
pub fn format_percent(value: Decimal) -> String {
    format!("{:.1}%", value).replace('.', ",")
}

/// Summary service for period reports
pub struct SummaryService {
    records: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
}

impl SummaryService {
    pub fn new(records: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self { records, clock }
    }

    /// Read every stored record once and aggregate the window ending today
    pub async fn summarize(&self, period: Period) -> Result<Summary> {
        let rows = self.records.list_records().await?;
        let summary = aggregate(&rows, period, self.clock.today());
        if summary.skipped > 0 {
            tracing::debug!(skipped = summary.skipped, "skipped unreadable record rows");
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn row(kind: &str, amount: &str, category: &str, date: &str) -> RecordRow {
        RecordRow {
            kind: kind.to_string(),
            amount: amount.to_string(),
            category: category.to_string(),
            competence_date: date.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_period_windows() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(Period::Today.start(today()), today());
        assert_eq!(Period::Last7Days.start(today()), d(2026, 10, 12));
        assert_eq!(Period::CurrentMonth.start(today()), d(2026, 10, 1));
        assert_eq!(Period::Last3Months.start(today()), d(2026, 7, 20));
        assert_eq!(Period::Last6Months.start(today()), d(2026, 4, 19));
        assert_eq!(Period::Last12Months.start(today()), d(2025, 10, 19));
    }

    #[test]
    fn test_period_from_str() {
        assert_eq!("mensal".parse::<Period>().unwrap(), Period::CurrentMonth);
        assert_eq!("7d".parse::<Period>().unwrap(), Period::Last7Days);
        assert_eq!("Últimos 12 meses".parse::<Period>().unwrap(), Period::Last12Months);
        assert!("quinzena".parse::<Period>().is_err());
    }

    #[test]
    fn test_every_period_has_an_option() {
        for period in Period::ALL {
            let option = PERIOD_OPTIONS.iter().find(|c| c.value == period.value()).unwrap();
            assert_eq!(option.label, period.label());
        }
    }

    #[test]
    fn test_money_format() {
        assert_eq!(format_money(Decimal::new(123456, 2)), "R$ 1.234,56");
        assert_eq!(format_money(Decimal::new(-5000, 2)), "-R$ 50,00");
        assert_eq!(format_money(Decimal::new(100000000, 2)), "R$ 1.000.000,00");
        assert_eq!(format_money(Decimal::new(999, 0)), "R$ 999,00");
        assert_eq!(format_money(Decimal::ZERO), "R$ 0,00");
        assert_eq!(format_money(Decimal::new(5, 1)), "R$ 0,50");
    }

    #[test]
    fn test_percent_format() {
        assert_eq!(format_percent(Decimal::new(70, 1)), "7,0%");
        assert_eq!(format_percent(Decimal::ZERO), "0,0%");
    }

    #[test]
    fn test_aggregate_buckets_and_totals() {
        let rows = vec![
            row("income", "5000.00", "Salário", "2026-10-05"),
            row("expense", "-300.00", "Mercado", "2026-10-10"),
            row("expense", "-30.50", "Transporte", "2026-10-11"),
            row("expense", "-20.00", "Transporte", "2026-10-12"),
            // Outside the month
            row("expense", "-999.00", "Mercado", "2026-09-30"),
        ];
        let summary = aggregate(&rows, Period::CurrentMonth, today());

        assert_eq!(summary.records, 4);
        assert_eq!(summary.income.total, Decimal::new(500000, 2));
        assert_eq!(summary.expense.total, Decimal::new(35050, 2));
        assert_eq!(summary.expense.categories[0].label, "Mercado");
        assert_eq!(summary.expense.categories[1].amount, Decimal::new(5050, 2));
        assert_eq!(summary.net(), Decimal::new(464950, 2));
        assert_eq!(summary.expense_ratio(), Decimal::new(70, 1));
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let rows = vec![
            row("expense", "-10.00", "Lazer", "2026-10-18"),
            row("expense", "-10.00", "Contas", "2026-10-18"),
            row("expense", "-10.00", "Compras", "2026-10-18"),
        ];
        let summary = aggregate(&rows, Period::Today, today());
        let labels: Vec<&str> = summary.expense.categories.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Lazer", "Contas", "Compras"]);
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let rows = vec![
            row("transfer", "10.00", "X", "2026-10-18"),
            row("income", "abc", "X", "2026-10-18"),
            row("income", "10.00", "X", "ontem"),
            row("receita", "R$ 1.000,00", "", "18/10/2026"),
        ];
        let summary = aggregate(&rows, Period::Today, today());
        assert_eq!(summary.skipped, 3);
        assert_eq!(summary.records, 1);
        assert_eq!(summary.income.categories[0].label, "Sem categoria");
        assert_eq!(summary.income.total, Decimal::new(100000, 2));
    }

    #[test]
    fn test_ratio_without_income() {
        let rows = vec![row("expense", "-10.00", "Lazer", "2026-10-18")];
        let summary = aggregate(&rows, Period::Today, today());
        assert_eq!(summary.expense_ratio(), Decimal::ZERO);
    }

    #[test]
    fn test_render_report() {
        let rows = vec![
            row("income", "5000.00", "Salário", "2026-10-05"),
            row("expense", "-300.00", "Mercado", "2026-10-10"),
            row("expense", "-50.50", "Transporte", "2026-10-11"),
        ];
        let text = aggregate(&rows, Period::CurrentMonth, today()).render();
        let expected = "Resumo: Mês atual\n\
                        Período: 01/10/2026 a 18/10/2026\n\
                        \n\
                        Receitas: R$ 5.000,00\n\
                        - Salário: R$ 5.000,00\n\
                        \n\
                        Despesas: R$ 350,50\n\
                        - Mercado: R$ 300,00\n\
                        - Transporte: R$ 50,50\n\
                        \n\
                        Saldo: R$ 4.649,50\n\
                        Despesas/Receitas: 7,0%";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_empty() {
        let text = aggregate(&[], Period::CurrentMonth, today()).render();
        assert_eq!(
            text,
            "Nenhum lançamento encontrado para Mês atual (01/10/2026 a 18/10/2026)."
        );
    }
}
