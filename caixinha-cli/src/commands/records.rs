//! Records command - list what is stored in the sheet

use anyhow::Result;

use super::get_context;
use crate::output;

pub fn run(limit: Option<usize>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let rows = ctx.records.read_rows()?;
    let skip = limit.map_or(0, |n| rows.len().saturating_sub(n));
    let rows = &rows[skip..];

    if json {
        println!("{}", serde_json::to_string_pretty(rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No records found in {}.", ctx.records.path().display());
        return Ok(());
    }

    let mut table = output::table(&["Data", "Tipo", "Valor", "Categoria", "Descrição", "Pagamento"]);
    for row in rows {
        table.add_row(vec![
            row.competence_date.clone(),
            row.kind.clone(),
            output::sheet_amount(&row.amount),
            row.category.clone(),
            row.description.clone(),
            row.payment_method.clone(),
        ]);
    }
    println!("{}", table);
    println!("{} records", rows.len());

    Ok(())
}
