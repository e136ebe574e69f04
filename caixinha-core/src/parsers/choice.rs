//! Choice normalizers: map a reply onto one of the options a prompt offered

use super::squash;
use crate::domain::vocab::{Choice, CANCEL_KEYWORDS, MENU_KEYWORDS, PERIOD_OPTIONS, REPORT_KEYWORDS};
use crate::domain::InboundEvent;

/// Exact option id lookup. Ids from other questions never match.
pub fn match_choice_id(options: &'static [Choice], id: &str) -> Option<&'static Choice> {
    options.iter().find(|c| c.id == id.trim())
}

/// Typed reply lookup against labels, values and synonyms
pub fn match_choice_text(options: &'static [Choice], text: &str) -> Option<&'static Choice> {
    let reply = squash(text);
    if reply.is_empty() {
        return None;
    }
    options.iter().find(|c| {
        squash(c.label) == reply
            || (!c.value.is_empty() && squash(c.value) == reply)
            || c.synonyms.iter().any(|s| *s == reply)
    })
}

/// Resolve an event against the options: taps by id, typed replies by text
pub fn match_choice(options: &'static [Choice], event: &InboundEvent) -> Option<&'static Choice> {
    if event.is_text() {
        match_choice_text(options, &event.payload)
    } else {
        match_choice_id(options, &event.payload)
    }
}

pub fn is_cancel_keyword(text: &str) -> bool {
    CANCEL_KEYWORDS.contains(&squash(text).as_str())
}

pub fn is_menu_keyword(text: &str) -> bool {
    MENU_KEYWORDS.contains(&squash(text).as_str())
}

/// A typed report request. `Some(Some(choice))` names the period directly
/// ("relatório mensal"); `Some(None)` means the period must still be picked.
pub fn report_request(text: &str) -> Option<Option<&'static Choice>> {
    let reply = squash(text);
    let mut words = reply.splitn(2, ' ');
    let first = words.next()?;
    if !REPORT_KEYWORDS.contains(&first) {
        return None;
    }
    match words.next() {
        None => Some(None),
        Some(rest) => Some(match_choice_text(PERIOD_OPTIONS, rest)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::vocab::{CONFIRM_OPTIONS, EXPENSE_CATEGORIES, KIND_OPTIONS, PAYMENT_METHODS};

    #[test]
    fn test_kind_synonyms_normalize_to_same_value() {
        for reply in ["despesa", "Gasto", "SAÍDA", " saida "] {
            let choice = match_choice_text(KIND_OPTIONS, reply).unwrap();
            assert_eq!(choice.value, "expense", "{reply}");
        }
        assert_eq!(match_choice_text(KIND_OPTIONS, "receita").unwrap().value, "income");
        assert!(match_choice_text(KIND_OPTIONS, "talvez").is_none());
    }

    #[test]
    fn test_category_by_label_ignores_accents() {
        assert_eq!(match_choice_text(EXPENSE_CATEGORIES, "alimentacao").unwrap().id, "cat:alimentacao");
        assert_eq!(match_choice_text(EXPENSE_CATEGORIES, "Mercado").unwrap().value, "Mercado");
    }

    #[test]
    fn test_ids_are_scoped_to_their_question() {
        assert!(match_choice_id(PAYMENT_METHODS, "pay:pix").is_some());
        assert!(match_choice_id(PAYMENT_METHODS, "recv:pix").is_none());
        assert!(match_choice_id(CONFIRM_OPTIONS, "cat:mercado").is_none());
    }

    #[test]
    fn test_match_choice_uses_event_kind() {
        let tap = InboundEvent::choice("u", "confirm:yes");
        assert_eq!(match_choice(CONFIRM_OPTIONS, &tap).unwrap().value, "yes");

        // A typed id is text, not a tap
        let typed = InboundEvent::text("u", "confirm:yes");
        assert!(match_choice(CONFIRM_OPTIONS, &typed).is_none());

        let typed = InboundEvent::text("u", "Sim");
        assert_eq!(match_choice(CONFIRM_OPTIONS, &typed).unwrap().value, "yes");
    }

    #[test]
    fn test_keywords() {
        assert!(is_cancel_keyword("CANCELAR"));
        assert!(is_cancel_keyword(" sair "));
        assert!(!is_cancel_keyword("cancelar a conta de luz"));
        assert!(is_menu_keyword("Olá"));
        assert!(is_menu_keyword("bom   dia"));
    }

    #[test]
    fn test_report_requests() {
        assert_eq!(report_request("relatório"), Some(None));
        assert_eq!(report_request("Resumo mensal").unwrap().unwrap().value, "month");
        assert_eq!(report_request("relatorio 7 dias").unwrap().unwrap().value, "7d");
        assert_eq!(report_request("relatorio de ontem"), Some(None));
        assert_eq!(report_request("gastei 50"), None);
    }
}
