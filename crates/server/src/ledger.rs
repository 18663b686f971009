//! In-memory transaction ledger, partitioned by user.

use std::collections::HashMap;

use api_types::{
    stats::TransactionStatistics,
    transaction::{
        Pagination, Transaction, TransactionCreate, TransactionListResponse, TransactionPatch,
        TransactionQuery, TransactionType,
    },
};
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Transaction not found")]
    NotFound(String),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Default)]
pub struct Ledger {
    users: RwLock<HashMap<String, Vec<Transaction>>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn list(&self, user: &str, query: &TransactionQuery) -> TransactionListResponse {
        let users = self.users.read().await;
        let mut matching: Vec<&Transaction> = users
            .get(user)
            .map(|txs| txs.iter().filter(|tx| is_match(tx, query)).collect())
            .unwrap_or_default();
        matching.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let pagination = Pagination::new(matching.len() as u64, query.page.unwrap_or(1), limit);
        let skip = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);

        let transactions = matching
            .into_iter()
            .skip(skip)
            .take(limit as usize)
            .cloned()
            .collect();

        TransactionListResponse {
            transactions,
            pagination,
        }
    }

    /// Totals over every transaction of `user`, ignoring any filter.
    pub async fn statistics(&self, user: &str) -> TransactionStatistics {
        let users = self.users.read().await;
        let mut stats = TransactionStatistics::default();
        for tx in users.get(user).into_iter().flatten() {
            let total = match tx.kind {
                TransactionType::Income => &mut stats.total_income,
                TransactionType::Expense => &mut stats.total_expense,
                TransactionType::CreditGiven => &mut stats.total_credit_given,
                TransactionType::CreditReceived => &mut stats.total_credit_received,
            };
            *total += tx.amount;
        }
        stats.net_balance = stats.total_income - stats.total_expense;
        stats
    }

    pub async fn create(
        &self,
        user: &str,
        body: TransactionCreate,
    ) -> Result<Transaction, LedgerError> {
        check_amount(body.amount)?;
        check_description(&body.description)?;

        let now = Utc::now();
        let tx = Transaction {
            id: Uuid::new_v4().to_string(),
            kind: body.kind,
            category: body.category,
            amount: body.amount,
            date: body.date,
            description: body.description,
            payment_mode: body.payment_mode,
            recurrence: body.recurrence,
            related_to: body.related_to,
            is_paid: body.is_paid,
            created_at: now,
            updated_at: now,
        };

        self.users
            .write()
            .await
            .entry(user.to_string())
            .or_default()
            .push(tx.clone());
        Ok(tx)
    }

    pub async fn update(
        &self,
        user: &str,
        id: &str,
        patch: TransactionPatch,
    ) -> Result<Transaction, LedgerError> {
        if let Some(amount) = patch.amount {
            check_amount(amount)?;
        }
        if let Some(description) = patch.description.as_deref() {
            check_description(description)?;
        }

        let mut users = self.users.write().await;
        let tx = users
            .get_mut(user)
            .and_then(|txs| txs.iter_mut().find(|tx| tx.id == id))
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;

        if let Some(kind) = patch.kind {
            tx.kind = kind;
        }
        if let Some(category) = patch.category {
            tx.category = category;
        }
        if let Some(amount) = patch.amount {
            tx.amount = amount;
        }
        if let Some(date) = patch.date {
            tx.date = date;
        }
        if let Some(description) = patch.description {
            tx.description = description;
        }
        if let Some(payment_mode) = patch.payment_mode {
            tx.payment_mode = payment_mode;
        }
        if patch.recurrence.is_some() {
            tx.recurrence = patch.recurrence;
        }
        if patch.related_to.is_some() {
            tx.related_to = patch.related_to;
        }
        if patch.is_paid.is_some() {
            tx.is_paid = patch.is_paid;
        }
        tx.updated_at = Utc::now();

        Ok(tx.clone())
    }

    pub async fn delete(&self, user: &str, id: &str) -> Result<(), LedgerError> {
        let mut users = self.users.write().await;
        let txs = users
            .get_mut(user)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        let idx = txs
            .iter()
            .position(|tx| tx.id == id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        txs.remove(idx);
        Ok(())
    }
}

fn is_match(tx: &Transaction, query: &TransactionQuery) -> bool {
    if query.kind.is_some_and(|kind| kind != tx.kind) {
        return false;
    }
    if let Some(category) = non_blank(query.category.as_deref())
        && !tx.category.eq_ignore_ascii_case(category)
    {
        return false;
    }
    if let Some(search) = non_blank(query.search.as_deref()) {
        let needle = search.to_lowercase();
        let hit = [
            Some(tx.description.as_str()),
            Some(tx.category.as_str()),
            tx.related_to.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle));
        if !hit {
            return false;
        }
    }
    if query.start_date.is_some_and(|start| tx.date < start) {
        return false;
    }
    if query.end_date.is_some_and(|end| tx.date > end) {
        return false;
    }
    true
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn check_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::Invalid("Amount must be positive".to_string()));
    }
    Ok(())
}

fn check_description(description: &str) -> Result<(), LedgerError> {
    if description.chars().count() < 2 {
        return Err(LedgerError::Invalid(
            "Description must be at least 2 characters".to_string(),
        ));
    }
    Ok(())
}
