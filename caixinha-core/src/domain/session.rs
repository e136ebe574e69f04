//! Per-user wizard session

use serde::{Deserialize, Serialize};

use super::record::{Field, Kind, TransactionRecord};

/// The question a session is waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WizardState {
    StartMenu,
    AwaitingKind,
    AwaitingCategory,
    /// Only entered when the catch-all "Outros" is picked
    AwaitingCategoryFreetext,
    AwaitingAmount,
    /// Expense only
    AwaitingDescription,
    AwaitingPaymentMethod,
    /// Income counterpart of the payment method, with its own options
    AwaitingReceiptMethod,
    AwaitingDate,
    AwaitingDateFreetext,
    AwaitingConfirmation,
    AwaitingReportPeriod,
}

/// Coarse grouping of states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Menu,
    Collecting,
    Confirming,
    Reporting,
}

impl WizardState {
    pub const ALL: [WizardState; 12] = [
        WizardState::StartMenu,
        WizardState::AwaitingKind,
        WizardState::AwaitingCategory,
        WizardState::AwaitingCategoryFreetext,
        WizardState::AwaitingAmount,
        WizardState::AwaitingDescription,
        WizardState::AwaitingPaymentMethod,
        WizardState::AwaitingReceiptMethod,
        WizardState::AwaitingDate,
        WizardState::AwaitingDateFreetext,
        WizardState::AwaitingConfirmation,
        WizardState::AwaitingReportPeriod,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WizardState::StartMenu => "start-menu",
            WizardState::AwaitingKind => "awaiting-kind",
            WizardState::AwaitingCategory => "awaiting-category",
            WizardState::AwaitingCategoryFreetext => "awaiting-category-freetext",
            WizardState::AwaitingAmount => "awaiting-amount",
            WizardState::AwaitingDescription => "awaiting-description",
            WizardState::AwaitingPaymentMethod => "awaiting-payment-method",
            WizardState::AwaitingReceiptMethod => "awaiting-receipt-method",
            WizardState::AwaitingDate => "awaiting-date",
            WizardState::AwaitingDateFreetext => "awaiting-date-freetext",
            WizardState::AwaitingConfirmation => "awaiting-confirmation",
            WizardState::AwaitingReportPeriod => "awaiting-report-period",
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            WizardState::StartMenu => Stage::Menu,
            WizardState::AwaitingConfirmation => Stage::Confirming,
            WizardState::AwaitingReportPeriod => Stage::Reporting,
            _ => Stage::Collecting,
        }
    }

    /// The state that asks for `field`. Payment method is asked differently
    /// for income.
    pub fn for_field(field: Field, kind: Option<Kind>) -> Self {
        match field {
            Field::Kind => WizardState::AwaitingKind,
            Field::Category => WizardState::AwaitingCategory,
            Field::Amount => WizardState::AwaitingAmount,
            Field::Description => WizardState::AwaitingDescription,
            Field::PaymentMethod if kind == Some(Kind::Income) => {
                WizardState::AwaitingReceiptMethod
            }
            Field::PaymentMethod => WizardState::AwaitingPaymentMethod,
            Field::Date => WizardState::AwaitingDate,
        }
    }
}

/// Wizard state for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Absent while at the menu or picking a report period
    pub record: Option<TransactionRecord>,
    pub state: WizardState,
}

impl Session {
    pub fn menu() -> Self {
        Self {
            record: None,
            state: WizardState::StartMenu,
        }
    }

    pub fn reporting() -> Self {
        Self {
            record: None,
            state: WizardState::AwaitingReportPeriod,
        }
    }

    pub fn collecting(record: TransactionRecord, state: WizardState) -> Self {
        Self {
            record: Some(record),
            state,
        }
    }

    pub fn stage(&self) -> Stage {
        self.state.stage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_names_are_unique() {
        let mut names: Vec<&str> = WizardState::ALL.iter().map(|s| s.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), WizardState::ALL.len());
    }

    #[test]
    fn test_payment_state_depends_on_kind() {
        assert_eq!(
            WizardState::for_field(Field::PaymentMethod, Some(Kind::Income)),
            WizardState::AwaitingReceiptMethod
        );
        assert_eq!(
            WizardState::for_field(Field::PaymentMethod, Some(Kind::Expense)),
            WizardState::AwaitingPaymentMethod
        );
    }

    #[test]
    fn test_stages() {
        assert_eq!(Session::menu().stage(), Stage::Menu);
        assert_eq!(Session::reporting().stage(), Stage::Reporting);
        assert_eq!(WizardState::AwaitingDateFreetext.stage(), Stage::Collecting);
        assert_eq!(WizardState::AwaitingConfirmation.stage(), Stage::Confirming);
    }
}
