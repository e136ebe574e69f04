//! Prompt texts and their rendering onto the delivery port

use crate::domain::result::Result;
use crate::domain::vocab::{
    categories_for, payment_methods_for, Choice, CONFIRM_OPTIONS, DATE_OPTIONS, KIND_OPTIONS,
    MENU_OPTIONS, PERIOD_OPTIONS,
};
use crate::domain::{Kind, TransactionRecord, WizardState};
use crate::parsers::format_br;
use crate::ports::{ChoiceOption, Delivery, PicklistRow};

use super::summary::format_money;

pub const CANCELLED_MESSAGE: &str =
    "Tudo bem, cancelei. Mande \"oi\" quando quiser começar de novo.";

/// Short explanation put in front of a re-issued question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    InvalidChoice,
    InvalidAmount,
    InvalidDate,
    BlankText,
    TextExpected,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::InvalidChoice => "Não entendi sua escolha. Escolha uma das opções abaixo.",
            Notice::InvalidAmount => {
                "Não consegui entender o valor. Use só números, como 35,90 ou 1200."
            }
            Notice::InvalidDate => "Data inválida. Use dd/mm ou dd/mm/aaaa, como 29/12.",
            Notice::BlankText => "A resposta não pode ficar em branco.",
            Notice::TextExpected => "Aqui preciso que você digite a resposta.",
        }
    }
}

/// One outbound message, not yet addressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Text(String),
    Choice {
        body: String,
        options: Vec<ChoiceOption>,
    },
    Picklist {
        body: String,
        button: String,
        rows: Vec<PicklistRow>,
    },
}

impl Prompt {
    pub fn body(&self) -> &str {
        match self {
            Prompt::Text(body) | Prompt::Choice { body, .. } | Prompt::Picklist { body, .. } => body,
        }
    }
}

fn buttons(body: String, options: &[Choice]) -> Prompt {
    Prompt::Choice {
        body,
        options: options
            .iter()
            .map(|c| ChoiceOption {
                id: c.id.to_string(),
                label: c.label.to_string(),
            })
            .collect(),
    }
}

fn picklist(body: String, button: &str, options: &[Choice]) -> Prompt {
    Prompt::Picklist {
        body,
        button: button.to_string(),
        rows: options
            .iter()
            .map(|c| PicklistRow {
                id: c.id.to_string(),
                label: c.label.to_string(),
                description: c.description.to_string(),
            })
            .collect(),
    }
}

/// Label for a stored value ("pix" -> "PIX"), or the value itself
fn label_for(options: &[Choice], value: &str) -> String {
    options
        .iter()
        .find(|c| !c.value.is_empty() && c.value == value)
        .map(|c| c.label.to_string())
        .unwrap_or_else(|| value.to_string())
}

/// The question asked in `state`, with `notice` in front when the previous
/// answer was rejected
pub fn prompt_for(
    state: WizardState,
    record: Option<&TransactionRecord>,
    notice: Option<Notice>,
) -> Prompt {
    let kind = record.and_then(|r| r.kind).unwrap_or(Kind::Expense);
    let body = |text: &str| match notice {
        Some(notice) => format!("{}\n\n{}", notice.message(), text),
        None => text.to_string(),
    };

    match state {
        WizardState::StartMenu => buttons(
            body(
                "Olá! O que você quer fazer?\n\
                 Você também pode descrever o lançamento, como \"gastei 35,90 no mercado no pix hoje\".",
            ),
            MENU_OPTIONS,
        ),
        WizardState::AwaitingKind => buttons(body("É uma receita ou uma despesa?"), KIND_OPTIONS),
        WizardState::AwaitingCategory => match kind {
            Kind::Expense => picklist(
                body("Qual a categoria da despesa?"),
                "Categorias",
                categories_for(kind),
            ),
            Kind::Income => picklist(
                body("Qual a origem da receita?"),
                "Origens",
                categories_for(kind),
            ),
        },
        WizardState::AwaitingCategoryFreetext => Prompt::Text(body(match kind {
            Kind::Expense => "Digite o nome da categoria:",
            Kind::Income => "Digite a origem da receita:",
        })),
        WizardState::AwaitingAmount => Prompt::Text(body("Qual o valor? (ex.: 35,90)")),
        WizardState::AwaitingDescription => {
            Prompt::Text(body("Descreva a despesa (ex.: compras da semana):"))
        }
        WizardState::AwaitingPaymentMethod => picklist(
            body("Qual a forma de pagamento?"),
            "Formas de pagamento",
            payment_methods_for(Kind::Expense),
        ),
        WizardState::AwaitingReceiptMethod => buttons(
            body("Como você recebeu?"),
            payment_methods_for(Kind::Income),
        ),
        WizardState::AwaitingDate => buttons(body("Qual a data do lançamento?"), DATE_OPTIONS),
        WizardState::AwaitingDateFreetext => {
            Prompt::Text(body("Digite a data (dd/mm ou dd/mm/aaaa):"))
        }
        WizardState::AwaitingConfirmation => {
            let summary = record.map(confirmation_summary).unwrap_or_default();
            buttons(body(&format!("{summary}\n\nConfirma?")), CONFIRM_OPTIONS)
        }
        WizardState::AwaitingReportPeriod => picklist(
            body("Qual período você quer ver?"),
            "Períodos",
            PERIOD_OPTIONS,
        ),
    }
}

/// Record as shown before confirmation
pub fn confirmation_summary(record: &TransactionRecord) -> String {
    let kind = record.kind.unwrap_or(Kind::Expense);
    let (category_title, payment_title) = match kind {
        Kind::Expense => ("Categoria", "Pagamento"),
        Kind::Income => ("Origem", "Recebimento"),
    };
    let text = |value: &Option<String>| value.as_deref().unwrap_or("-").to_string();

    let mut lines = vec![
        "Confira o lançamento:".to_string(),
        format!("Tipo: {}", kind.label()),
        format!("{}: {}", category_title, text(&record.category)),
        format!(
            "Valor: {}",
            record
                .amount
                .map(|a| format_money(a.abs()))
                .unwrap_or_else(|| "-".to_string())
        ),
        format!("Descrição: {}", text(&record.description)),
    ];
    let payment = record
        .payment_method
        .as_deref()
        .map(|m| label_for(payment_methods_for(kind), m))
        .unwrap_or_else(|| "-".to_string());
    lines.push(format!("{}: {}", payment_title, payment));
    lines.push(format!(
        "Data: {}",
        record
            .competence_date
            .map(format_br)
            .unwrap_or_else(|| "-".to_string())
    ));
    lines.join("\n")
}

/// Acknowledgement after the record was stored
pub fn saved_message(record: &TransactionRecord) -> String {
    let kind = record.kind.unwrap_or(Kind::Expense);
    let amount = record.amount.map(|a| format_money(a.abs())).unwrap_or_default();
    match record.category.as_deref() {
        Some(category) => format!("Lançamento salvo! {} de {} em {}.", kind.label(), amount, category),
        None => format!("Lançamento salvo! {} de {}.", kind.label(), amount),
    }
}

/// Render a prompt with exactly one delivery call
pub async fn deliver(delivery: &dyn Delivery, to: &str, prompt: &Prompt) -> Result<()> {
    match prompt {
        Prompt::Text(body) => delivery.send_text(to, body).await,
        Prompt::Choice { body, options } => delivery.send_choice(to, body, options).await,
        Prompt::Picklist { body, button, rows } => {
            delivery.send_picklist(to, body, button, rows).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{MAX_CHOICE_OPTIONS, MAX_PICKLIST_ROWS};
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;

    fn record(kind: Kind) -> TransactionRecord {
        let mut record = TransactionRecord::with_kind(
            kind,
            Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap(),
            "BRL",
        );
        record.amount = Some(kind.signed(Decimal::new(123456, 2)));
        record.category = Some("Salário".to_string());
        record.payment_method = Some("pix".to_string());
        record.competence_date = NaiveDate::from_ymd_opt(2026, 10, 18);
        record.normalize();
        record
    }

    #[test]
    fn test_every_state_fits_message_limits() {
        for kind in [Kind::Income, Kind::Expense] {
            let record = record(kind);
            for state in WizardState::ALL {
                match prompt_for(state, Some(&record), None) {
                    Prompt::Choice { options, .. } => assert!(options.len() <= MAX_CHOICE_OPTIONS),
                    Prompt::Picklist { rows, .. } => assert!(rows.len() <= MAX_PICKLIST_ROWS),
                    Prompt::Text(body) => assert!(!body.is_empty()),
                }
            }
        }
    }

    #[test]
    fn test_notice_is_prepended() {
        let prompt = prompt_for(WizardState::AwaitingAmount, None, Some(Notice::InvalidAmount));
        assert!(prompt.body().starts_with(Notice::InvalidAmount.message()));
        assert!(prompt.body().ends_with("Qual o valor? (ex.: 35,90)"));
    }

    #[test]
    fn test_income_prompts_use_income_options() {
        let income = record(Kind::Income);
        let Prompt::Picklist { rows, button, .. } =
            prompt_for(WizardState::AwaitingCategory, Some(&income), None)
        else {
            panic!("category should be a picklist");
        };
        assert_eq!(button, "Origens");
        assert!(rows.iter().all(|r| r.id.starts_with("origin:")));

        let Prompt::Choice { options, .. } =
            prompt_for(WizardState::AwaitingReceiptMethod, Some(&income), None)
        else {
            panic!("receipt method should be buttons");
        };
        assert_eq!(options[0].id, "recv:pix");
    }

    #[test]
    fn test_confirmation_summary() {
        let summary = confirmation_summary(&record(Kind::Income));
        assert_eq!(
            summary,
            "Confira o lançamento:\n\
             Tipo: Receita\n\
             Origem: Salário\n\
             Valor: R$ 1.234,56\n\
             Descrição: Receita - Salário\n\
             Recebimento: PIX\n\
             Data: 18/10/2026"
        );
    }

    #[test]
    fn test_saved_message() {
        let mut expense = record(Kind::Expense);
        expense.category = Some("Mercado".to_string());
        assert_eq!(
            saved_message(&expense),
            "Lançamento salvo! Despesa de R$ 1.234,56 em Mercado."
        );
    }
}
