//! Field parsers
//!
//! Pure functions from free text to typed values. Each returns `None` when
//! it does not recognize the input; none of them guess.

mod amount;
mod choice;
mod classify;
mod date;

pub use amount::parse_amount;
pub use choice::{is_cancel_keyword, is_menu_keyword, match_choice, match_choice_id, match_choice_text, report_request};
pub use classify::{classify_category, classify_kind, classify_payment_method, prefill, Prefill};
pub use date::{format_br, format_iso, parse_date};

/// Lower-case and strip Portuguese diacritics so "Saída" matches "saida"
pub fn fold(text: &str) -> String {
    text.trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Folded word tokens, split on anything that is not a letter or digit
pub(crate) fn tokens(text: &str) -> Vec<String> {
    fold(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Folded text with runs of whitespace collapsed, for phrase comparison
pub(crate) fn squash(text: &str) -> String {
    fold(text).split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold() {
        assert_eq!(fold("  Saída "), "saida");
        assert_eq!(fold("SALÁRIO"), "salario");
        assert_eq!(fold("Alimentação"), "alimentacao");
    }

    #[test]
    fn test_tokens() {
        assert_eq!(tokens("Gastei R$50, no Mercado!"), vec!["gastei", "r", "50", "no", "mercado"]);
        assert!(tokens(" ... ").is_empty());
    }

    #[test]
    fn test_squash() {
        assert_eq!(squash("  Mês   Atual "), "mes atual");
    }
}
