//! Report command - period summary of the stored records

use anyhow::Result;
use colored::Colorize;

use caixinha_core::services::{format_money, format_percent, Period};

use super::{get_context, runtime};
use crate::output;

pub fn run(period: &str, json: bool) -> Result<()> {
    let period: Period = period.parse()?;
    let ctx = get_context()?;
    let summary = runtime()?.block_on(ctx.summary_service.summarize(period))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.is_empty() {
        output::warning(&summary.render());
        return Ok(());
    }

    println!("{}", format!("Resumo: {}", period.label()).bold());
    println!("{} a {}", summary.start.format("%d/%m/%Y"), summary.end.format("%d/%m/%Y"));
    println!();

    let mut table = output::table(&["Tipo", "Categoria", "Valor"]);
    for (title, totals) in [("Receita", &summary.income), ("Despesa", &summary.expense)] {
        for category in &totals.categories {
            table.add_row(vec![title.to_string(), category.label.clone(), format_money(category.amount)]);
        }
        table.add_row(vec![
            title.bold().to_string(),
            "Total".bold().to_string(),
            format_money(totals.total).bold().to_string(),
        ]);
    }
    println!("{}", table);
    println!();

    println!("Saldo: {}", output::signed_money(summary.net()));
    println!("Despesas/Receitas: {}", format_percent(summary.expense_ratio()));

    if summary.skipped > 0 {
        output::warning(&format!("{} unreadable rows were skipped", summary.skipped));
    }

    Ok(())
}
