//! Transaction record domain model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::result::{Error, Result};

/// Currency used when the configuration does not name one
pub const DEFAULT_CURRENCY: &str = "BRL";

/// Description used for income when neither origin nor original text exist
const INCOME_FALLBACK_DESCRIPTION: &str = "Receita";

/// Whether money comes in or goes out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Income,
    Expense,
}

impl Kind {
    /// Canonical tag as written to the record store
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Income => "income",
            Kind::Expense => "expense",
        }
    }

    /// User-facing label
    pub fn label(&self) -> &'static str {
        match self {
            Kind::Income => "Receita",
            Kind::Expense => "Despesa",
        }
    }

    /// Fields that must be filled before confirmation, in the order the
    /// wizard asks for them.
    pub fn required_fields(self) -> &'static [Field] {
        match self {
            Kind::Expense => &[
                Field::Kind,
                Field::Category,
                Field::Amount,
                Field::Description,
                Field::PaymentMethod,
                Field::Date,
            ],
            Kind::Income => &[
                Field::Kind,
                Field::Category,
                Field::Amount,
                Field::PaymentMethod,
                Field::Date,
            ],
        }
    }

    /// Apply the sign convention of this kind to a magnitude
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            Kind::Income => amount.abs(),
            Kind::Expense => -amount.abs(),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = Error;

    /// Accepts the canonical tags and the Portuguese sheet labels
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" | "receita" => Ok(Kind::Income),
            "expense" | "despesa" => Ok(Kind::Expense),
            other => Err(Error::validation(format!("unknown kind: {other}"))),
        }
    }
}

/// A field the wizard collects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Kind,
    Category,
    Amount,
    Description,
    PaymentMethod,
    Date,
}

/// A financial entry, either a draft being collected or a finalized record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub kind: Option<Kind>,
    /// Signed once normalized: income >= 0, expense <= 0
    pub amount: Option<Decimal>,
    pub currency: String,
    /// Category for expenses, origin for income
    pub category: Option<String>,
    pub description: Option<String>,
    /// Payment method for expenses, receipt method for income
    pub payment_method: Option<String>,
    pub competence_date: Option<NaiveDate>,
    /// Share of the fields inferred from the first free-text message
    pub confidence: f64,
    pub confirmed: bool,
    pub original_text: Option<String>,
}

impl TransactionRecord {
    /// Create an empty draft
    pub fn new(created_at: DateTime<Utc>, currency: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at,
            kind: None,
            amount: None,
            currency: currency.into(),
            category: None,
            description: None,
            payment_method: None,
            competence_date: None,
            confidence: 0.0,
            confirmed: false,
            original_text: None,
        }
    }

    /// Create an empty draft of a known kind
    pub fn with_kind(kind: Kind, created_at: DateTime<Utc>, currency: impl Into<String>) -> Self {
        let mut record = Self::new(created_at, currency);
        record.kind = Some(kind);
        record
    }

    /// Whether a field holds a usable value (present and not blank)
    pub fn has_field(&self, field: Field) -> bool {
        fn filled(value: &Option<String>) -> bool {
            value.as_deref().is_some_and(|v| !v.trim().is_empty())
        }

        match field {
            Field::Kind => self.kind.is_some(),
            Field::Category => filled(&self.category),
            Field::Amount => self.amount.is_some(),
            Field::Description => filled(&self.description),
            Field::PaymentMethod => filled(&self.payment_method),
            Field::Date => self.competence_date.is_some(),
        }
    }

    /// First field still missing, following the kind-specific order.
    /// A record without a kind only knows it needs a kind.
    pub fn first_missing(&self) -> Option<Field> {
        match self.kind {
            None => Some(Field::Kind),
            Some(kind) => kind
                .required_fields()
                .iter()
                .copied()
                .find(|field| !self.has_field(*field)),
        }
    }

    /// All missing required fields, in asking order
    pub fn missing_fields(&self) -> Vec<Field> {
        match self.kind {
            None => vec![Field::Kind],
            Some(kind) => kind
                .required_fields()
                .iter()
                .copied()
                .filter(|field| !self.has_field(*field))
                .collect(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.first_missing().is_none()
    }

    /// Make the amount sign agree with the kind
    pub fn normalize_sign(&mut self) {
        if let (Some(kind), Some(amount)) = (self.kind, self.amount) {
            self.amount = Some(kind.signed(amount));
        }
    }

    /// Income descriptions are derived rather than asked for
    pub fn fill_income_description(&mut self) {
        if self.kind != Some(Kind::Income) || self.has_field(Field::Description) {
            return;
        }

        let origin = self.category.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let original = self
            .original_text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        self.description = Some(match (origin, original) {
            (Some(origin), _) => format!("{} - {}", Kind::Income.label(), origin),
            (None, Some(text)) => text.to_string(),
            (None, None) => INCOME_FALLBACK_DESCRIPTION.to_string(),
        });
    }

    /// Derived values applied right before confirmation
    pub fn normalize(&mut self) {
        self.fill_income_description();
        self.normalize_sign();
    }

    /// Flatten into the persisted column layout
    pub fn to_row(&self) -> RecordRow {
        RecordRow {
            id: self.id.to_string(),
            timestamp: self.created_at.to_rfc3339(),
            kind: self.kind.map(|k| k.as_str().to_string()).unwrap_or_default(),
            amount: self
                .amount
                .map(|a| format!("{:.2}", a))
                .unwrap_or_default(),
            currency: self.currency.clone(),
            category: self.category.clone().unwrap_or_default(),
            description: self.description.clone().unwrap_or_default(),
            payment_method: self.payment_method.clone().unwrap_or_default(),
            competence_date: self
                .competence_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            confidence: format!("{:.2}", self.confidence),
            confirmed: if self.confirmed { "yes" } else { "no" }.to_string(),
            original_text: self.original_text.clone().unwrap_or_default(),
        }
    }
}

/// A persisted record as text columns, in canonical column order.
///
/// Historical rows are kept as text so readers can skip malformed values
/// instead of failing the whole listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRow {
    pub id: String,
    pub timestamp: String,
    pub kind: String,
    pub amount: String,
    pub currency: String,
    pub category: String,
    pub description: String,
    pub payment_method: String,
    pub competence_date: String,
    pub confidence: String,
    pub confirmed: String,
    pub original_text: String,
}

impl RecordRow {
    /// Canonical column names, in storage order
    pub const COLUMNS: [&'static str; 12] = [
        "id",
        "timestamp",
        "kind",
        "amount",
        "currency",
        "category",
        "description",
        "payment_method",
        "competence_date",
        "confidence",
        "confirmed",
        "original_text",
    ];

    /// Build a row from values in canonical column order
    pub fn from_columns(values: [String; 12]) -> Self {
        let [id, timestamp, kind, amount, currency, category, description, payment_method, competence_date, confidence, confirmed, original_text] =
            values;
        Self {
            id,
            timestamp,
            kind,
            amount,
            currency,
            category,
            description,
            payment_method,
            competence_date,
            confidence,
            confirmed,
            original_text,
        }
    }

    /// Values in canonical column order
    pub fn columns(&self) -> [&str; 12] {
        [
            self.id.as_str(),
            self.timestamp.as_str(),
            self.kind.as_str(),
            self.amount.as_str(),
            self.currency.as_str(),
            self.category.as_str(),
            self.description.as_str(),
            self.payment_method.as_str(),
            self.competence_date.as_str(),
            self.confidence.as_str(),
            self.confirmed.as_str(),
            self.original_text.as_str(),
        ]
    }
}
