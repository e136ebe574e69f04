//! Option tables offered by the wizard
//!
//! Every option id carries a per-question prefix (`cat:`, `pay:`, ...), so an
//! id tapped on an old prompt can never satisfy a different question.

use super::record::Kind;

/// One selectable option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub id: &'static str,
    pub label: &'static str,
    /// Secondary line shown in picklists
    pub description: &'static str,
    /// Canonical value stored on the record. Empty opens a free-text follow-up.
    pub value: &'static str,
    /// Typed replies accepted for this option (accent-free, lower case)
    pub synonyms: &'static [&'static str],
}

impl Choice {
    pub fn opens_freetext(&self) -> bool {
        self.value.is_empty()
    }
}

const fn choice(
    id: &'static str,
    label: &'static str,
    description: &'static str,
    value: &'static str,
    synonyms: &'static [&'static str],
) -> Choice {
    Choice {
        id,
        label,
        description,
        value,
        synonyms,
    }
}

/// Menu buttons. Typing a label counts as the tap; other typed text starts
/// a free-text draft.
pub const MENU_OPTIONS: &[Choice] = &[
    choice("menu:income", "Registrar receita", "", "income", &[]),
    choice("menu:expense", "Registrar despesa", "", "expense", &[]),
    choice("menu:report", "Ver relatório", "", "report", &[]),
];

pub const KIND_OPTIONS: &[Choice] = &[
    choice(
        "kind:income",
        "Receita",
        "",
        "income",
        &["receita", "entrada", "ganho", "recebi", "renda"],
    ),
    choice(
        "kind:expense",
        "Despesa",
        "",
        "expense",
        &["despesa", "gasto", "saida", "gastei", "paguei", "compra"],
    ),
];

pub const EXPENSE_CATEGORIES: &[Choice] = &[
    choice("cat:mercado", "Mercado", "Supermercado, feira", "Mercado", &["supermercado", "feira"]),
    choice("cat:alimentacao", "Alimentação", "Restaurantes, lanches, delivery", "Alimentação", &["comida", "restaurante"]),
    choice("cat:transporte", "Transporte", "Combustível, app, ônibus", "Transporte", &["uber", "gasolina"]),
    choice("cat:moradia", "Moradia", "Aluguel, condomínio", "Moradia", &["casa", "aluguel"]),
    choice("cat:saude", "Saúde", "Farmácia, consultas", "Saúde", &["farmacia"]),
    choice("cat:lazer", "Lazer", "Passeios, streaming", "Lazer", &[]),
    choice("cat:educacao", "Educação", "Cursos, livros", "Educação", &["curso", "escola"]),
    choice("cat:contas", "Contas", "Luz, água, internet", "Contas", &["conta", "boletos"]),
    choice("cat:compras", "Compras", "Roupas, eletrônicos", "Compras", &[]),
    choice("cat:outros", "Outros", "Digitar outra categoria", "", &["outro", "outra"]),
];

pub const INCOME_ORIGINS: &[Choice] = &[
    choice("origin:salario", "Salário", "Pagamento mensal", "Salário", &[]),
    choice("origin:freelance", "Freelance", "Trabalhos avulsos", "Freelance", &["freela", "bico"]),
    choice("origin:vendas", "Vendas", "Produtos ou serviços", "Vendas", &["venda"]),
    choice("origin:investimentos", "Investimentos", "Rendimentos, dividendos", "Investimentos", &["rendimento", "dividendos"]),
    choice("origin:reembolso", "Reembolso", "Devoluções", "Reembolso", &[]),
    choice("origin:presente", "Presente", "Doações recebidas", "Presente", &[]),
    choice("origin:outros", "Outros", "Digitar outra origem", "", &["outro", "outra"]),
];

pub const PAYMENT_METHODS: &[Choice] = &[
    choice("pay:pix", "PIX", "", "pix", &[]),
    choice("pay:dinheiro", "Dinheiro", "", "dinheiro", &["especie"]),
    choice("pay:debito", "Débito", "Cartão de débito", "debito", &["cartao de debito"]),
    choice("pay:credito", "Crédito", "Cartão de crédito", "credito", &["cartao de credito"]),
    choice("pay:boleto", "Boleto", "", "boleto", &[]),
    choice("pay:transferencia", "Transferência", "TED/DOC", "transferencia", &["ted", "doc"]),
];

pub const RECEIPT_METHODS: &[Choice] = &[
    choice("recv:pix", "PIX", "", "pix", &[]),
    choice("recv:dinheiro", "Dinheiro", "", "dinheiro", &["especie"]),
];

pub const DATE_OPTIONS: &[Choice] = &[
    choice("date:today", "Hoje", "", "today", &["hoje"]),
    choice("date:yesterday", "Ontem", "", "yesterday", &["ontem"]),
    choice("date:other", "Outra data", "", "", &["outra", "outro dia"]),
];

pub const CONFIRM_OPTIONS: &[Choice] = &[
    choice("confirm:yes", "Confirmar", "", "yes", &["sim", "s", "ok", "confirmo", "confirm", "yes", "isso", "certo"]),
    choice("confirm:no", "Cancelar", "", "no", &["nao", "n", "no", "errado"]),
];

pub const PERIOD_OPTIONS: &[Choice] = &[
    choice("period:today", "Hoje", "Lançamentos de hoje", "today", &["hoje", "diario"]),
    choice("period:7d", "Últimos 7 dias", "Hoje e os 6 dias anteriores", "7d", &["7 dias", "semana", "semanal"]),
    choice("period:month", "Mês atual", "Desde o dia 1º", "month", &["mes", "mensal", "mes atual"]),
    choice("period:3m", "Últimos 3 meses", "90 dias", "3m", &["3 meses", "trimestre", "trimestral"]),
    choice("period:6m", "Últimos 6 meses", "182 dias", "6m", &["6 meses", "semestre", "semestral"]),
    choice("period:12m", "Últimos 12 meses", "364 dias", "12m", &["12 meses", "ano", "anual"]),
];

/// Typed anywhere to abandon the current interaction
pub const CANCEL_KEYWORDS: &[&str] = &["cancelar", "cancela", "cancel", "sair"];

/// Greetings that open the menu instead of starting a draft
pub const MENU_KEYWORDS: &[&str] = &[
    "oi", "ola", "menu", "inicio", "ajuda", "bom dia", "boa tarde", "boa noite", "hi", "hello",
];

/// Words that open the report flow from a free-text message
pub const REPORT_KEYWORDS: &[&str] = &["relatorio", "resumo", "extrato", "report"];

/// Category or origin options for a kind
pub fn categories_for(kind: Kind) -> &'static [Choice] {
    match kind {
        Kind::Expense => EXPENSE_CATEGORIES,
        Kind::Income => INCOME_ORIGINS,
    }
}

/// Payment or receipt options for a kind
pub fn payment_methods_for(kind: Kind) -> &'static [Choice] {
    match kind {
        Kind::Expense => PAYMENT_METHODS,
        Kind::Income => RECEIPT_METHODS,
    }
}
