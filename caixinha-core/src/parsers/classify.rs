//! Best-effort pre-fill from a first free-text message
//!
//! Keyword tables map word tokens to values. A classifier only answers when
//! every hit agrees; conflicting hits leave the field empty so the wizard
//! asks for it.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::amount::parse_amount;
use super::date::{find_day_month, relative_date};
use super::{fold, tokens};
use crate::domain::vocab::RECEIPT_METHODS;
use crate::domain::{Kind, TransactionRecord};

const KIND_KEYWORDS: &[(&str, Kind)] = &[
    ("despesa", Kind::Expense),
    ("gasto", Kind::Expense),
    ("gastei", Kind::Expense),
    ("paguei", Kind::Expense),
    ("comprei", Kind::Expense),
    ("saida", Kind::Expense),
    ("receita", Kind::Income),
    ("recebi", Kind::Income),
    ("ganhei", Kind::Income),
    ("entrada", Kind::Income),
    ("salario", Kind::Income),
];

const EXPENSE_CATEGORY_KEYWORDS: &[(&str, &str)] = &[
    ("mercado", "Mercado"),
    ("supermercado", "Mercado"),
    ("feira", "Mercado"),
    ("restaurante", "Alimentação"),
    ("lanche", "Alimentação"),
    ("almoco", "Alimentação"),
    ("jantar", "Alimentação"),
    ("ifood", "Alimentação"),
    ("padaria", "Alimentação"),
    ("uber", "Transporte"),
    ("onibus", "Transporte"),
    ("gasolina", "Transporte"),
    ("combustivel", "Transporte"),
    ("taxi", "Transporte"),
    ("estacionamento", "Transporte"),
    ("aluguel", "Moradia"),
    ("condominio", "Moradia"),
    ("farmacia", "Saúde"),
    ("remedio", "Saúde"),
    ("medico", "Saúde"),
    ("dentista", "Saúde"),
    ("cinema", "Lazer"),
    ("show", "Lazer"),
    ("viagem", "Lazer"),
    ("curso", "Educação"),
    ("faculdade", "Educação"),
    ("livro", "Educação"),
    ("luz", "Contas"),
    ("energia", "Contas"),
    ("agua", "Contas"),
    ("internet", "Contas"),
    ("telefone", "Contas"),
    ("roupa", "Compras"),
    ("roupas", "Compras"),
    ("shopping", "Compras"),
];

const INCOME_ORIGIN_KEYWORDS: &[(&str, &str)] = &[
    ("salario", "Salário"),
    ("freela", "Freelance"),
    ("freelance", "Freelance"),
    ("venda", "Vendas"),
    ("vendi", "Vendas"),
    ("dividendos", "Investimentos"),
    ("rendimento", "Investimentos"),
    ("reembolso", "Reembolso"),
    ("presente", "Presente"),
];

const PAYMENT_KEYWORDS: &[(&str, &str)] = &[
    ("pix", "pix"),
    ("dinheiro", "dinheiro"),
    ("especie", "dinheiro"),
    ("debito", "debito"),
    ("credito", "credito"),
    ("boleto", "boleto"),
    ("transferencia", "transferencia"),
    ("ted", "transferencia"),
];

/// Number of fields a message can pre-fill; the confidence denominator
const INFERABLE_FIELDS: usize = 5;

/// Value shared by every keyword hit, or `None` on no hit or a conflict
fn unanimous<T: Copy + PartialEq>(tokens: &[String], table: &[(&str, T)]) -> Option<T> {
    let mut found: Option<T> = None;
    for token in tokens {
        for (keyword, value) in table {
            if token == keyword {
                match found {
                    Some(previous) if previous != *value => return None,
                    _ => found = Some(*value),
                }
            }
        }
    }
    found
}

pub fn classify_kind(text: &str) -> Option<Kind> {
    unanimous(&tokens(text), KIND_KEYWORDS)
}

/// Category (expense) or origin (income) label
pub fn classify_category(text: &str, kind: Kind) -> Option<&'static str> {
    let table = match kind {
        Kind::Expense => EXPENSE_CATEGORY_KEYWORDS,
        Kind::Income => INCOME_ORIGIN_KEYWORDS,
    };
    unanimous(&tokens(text), table)
}

/// Payment method, restricted to what the kind can use
pub fn classify_payment_method(text: &str, kind: Kind) -> Option<&'static str> {
    let method = unanimous(&tokens(text), PAYMENT_KEYWORDS)?;
    match kind {
        Kind::Expense => Some(method),
        Kind::Income => RECEIPT_METHODS
            .iter()
            .any(|c| c.value == method)
            .then_some(method),
    }
}

/// Fields recognized in a free-text message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prefill {
    pub kind: Option<Kind>,
    pub amount: Option<Decimal>,
    pub category: Option<&'static str>,
    pub payment_method: Option<&'static str>,
    pub competence_date: Option<NaiveDate>,
}

impl Prefill {
    pub fn inferred_count(&self) -> usize {
        [
            self.kind.is_some(),
            self.amount.is_some(),
            self.category.is_some(),
            self.payment_method.is_some(),
            self.competence_date.is_some(),
        ]
        .iter()
        .filter(|hit| **hit)
        .count()
    }

    /// Heuristic share of the record that came from the message
    pub fn confidence(&self) -> f64 {
        let ratio = self.inferred_count() as f64 / INFERABLE_FIELDS as f64;
        (ratio * 100.0).round() / 100.0
    }

    /// Copy recognized fields onto a draft, leaving the rest untouched
    pub fn apply(&self, record: &mut TransactionRecord) {
        if let Some(kind) = self.kind {
            record.kind = Some(kind);
        }
        if let Some(amount) = self.amount {
            record.amount = Some(amount);
        }
        if let Some(category) = self.category {
            record.category = Some(category.to_string());
        }
        if let Some(method) = self.payment_method {
            record.payment_method = Some(method.to_string());
        }
        if let Some(date) = self.competence_date {
            record.competence_date = Some(date);
        }
        record.confidence = self.confidence();
    }
}

/// Run every classifier over `text`.
///
/// Category and payment method depend on the kind, so they stay empty when
/// the kind is not recognized. A date found in the text is cut out before
/// looking for the amount, so "10/10" is not read as ten.
pub fn prefill(text: &str, today: NaiveDate) -> Prefill {
    let folded = fold(text);
    let words = tokens(text);

    let kind = unanimous(&words, KIND_KEYWORDS);

    let (competence_date, amount_text) = match find_day_month(&folded, today) {
        Some((date, span)) => {
            let mut rest = folded.clone();
            rest.replace_range(span, " ");
            (Some(date), rest)
        }
        None => (relative_date(&words, today), folded.clone()),
    };

    let amount = parse_amount(&amount_text).filter(|a| *a > Decimal::ZERO);

    Prefill {
        kind,
        amount,
        category: kind.and_then(|k| classify_category(text, k)),
        payment_method: kind.and_then(|k| classify_payment_method(text, k)),
        competence_date,
    }
}
