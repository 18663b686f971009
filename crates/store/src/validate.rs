//! Checks run before a write is sent to the server.

use api_types::transaction::{
    PaymentMode, Recurrence, TransactionCreate, TransactionPatch, TransactionType,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::ValidationErrors;

const MIN_DESCRIPTION_CHARS: usize = 2;

/// A transaction as entered by the user, before validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTransaction {
    pub kind: TransactionType,
    pub category: String,
    pub amount: Decimal,
    /// `None` means "now".
    pub date: Option<DateTime<Utc>>,
    pub description: String,
    pub payment_mode: PaymentMode,
    pub recurrence: Option<Recurrence>,
    pub related_to: Option<String>,
    pub is_paid: Option<bool>,
}

impl NewTransaction {
    pub fn new(
        kind: TransactionType,
        category: impl Into<String>,
        amount: Decimal,
        description: impl Into<String>,
        payment_mode: PaymentMode,
    ) -> Self {
        Self {
            kind,
            category: category.into(),
            amount,
            date: None,
            description: description.into(),
            payment_mode,
            recurrence: None,
            related_to: None,
            is_paid: None,
        }
    }
}

pub(crate) fn new_transaction(
    tx: NewTransaction,
    now: DateTime<Utc>,
) -> Result<TransactionCreate, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_amount(&mut errors, tx.amount);
    check_description(&mut errors, &tx.description);
    errors.into_result()?;

    Ok(TransactionCreate {
        kind: tx.kind,
        category: tx.category,
        amount: tx.amount,
        date: tx.date.unwrap_or(now),
        description: tx.description,
        payment_mode: tx.payment_mode,
        recurrence: tx.recurrence,
        related_to: tx.related_to,
        is_paid: tx.is_paid,
    })
}

/// Only the fields present in the patch are checked.
pub(crate) fn patch(patch: &TransactionPatch) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if let Some(amount) = patch.amount {
        check_amount(&mut errors, amount);
    }
    if let Some(description) = patch.description.as_deref() {
        check_description(&mut errors, description);
    }
    errors.into_result()
}

fn check_amount(errors: &mut ValidationErrors, amount: Decimal) {
    if amount <= Decimal::ZERO {
        errors.insert("amount", "Amount must be positive");
    }
}

fn check_description(errors: &mut ValidationErrors, description: &str) {
    if description.chars().count() < MIN_DESCRIPTION_CHARS {
        errors.insert(
            "description",
            format!("Description must be at least {MIN_DESCRIPTION_CHARS} characters"),
        );
    }
}
