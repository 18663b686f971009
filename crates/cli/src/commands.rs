//! Subcommands talking to the transaction store.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use store::{
    FilterUpdate, NewTransaction, Pagination, PaymentMode, Recurrence, StoreError, Transaction,
    TransactionListResponse, TransactionPatch, TransactionStatistics, TransactionStore,
    TransactionType,
};

use crate::error::{AppError, Result};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List transactions matching the given filters.
    List(ListArgs),
    /// Show income, expense and credit totals.
    Stats,
    /// Record a new transaction.
    Add(AddArgs),
    /// Change fields of an existing transaction.
    Update(UpdateArgs),
    /// Delete a transaction.
    Delete {
        id: String,
    },
    /// Run the in-memory reference API.
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long = "type")]
    kind: Option<TransactionType>,
    #[arg(long)]
    category: Option<String>,
    /// Case-insensitive match on description, category and related party.
    #[arg(long)]
    search: Option<String>,
    /// First day included (YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Last day included (YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,
    #[arg(long)]
    page: Option<u64>,
    #[arg(long)]
    limit: Option<u64>,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(long = "type")]
    kind: TransactionType,
    #[arg(long)]
    category: String,
    #[arg(long)]
    amount: Decimal,
    #[arg(long)]
    description: String,
    #[arg(long, default_value = "CASH")]
    payment_mode: PaymentMode,
    /// Defaults to now.
    #[arg(long)]
    date: Option<DateTime<Utc>>,
    #[arg(long)]
    recurrence: Option<Recurrence>,
    #[arg(long)]
    related_to: Option<String>,
    #[arg(long)]
    paid: Option<bool>,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    id: String,
    #[arg(long = "type")]
    kind: Option<TransactionType>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    amount: Option<Decimal>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    payment_mode: Option<PaymentMode>,
    #[arg(long)]
    date: Option<DateTime<Utc>>,
    #[arg(long)]
    recurrence: Option<Recurrence>,
    #[arg(long)]
    related_to: Option<String>,
    #[arg(long)]
    paid: Option<bool>,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub bind: Option<String>,
    #[arg(long)]
    pub port: Option<u16>,
}

impl ListArgs {
    fn filter_update(&self) -> FilterUpdate {
        let mut update = FilterUpdate::new();
        if let Some(kind) = self.kind {
            update = update.kind(kind);
        }
        if let Some(category) = &self.category {
            update = update.category(category.clone());
        }
        if let Some(search) = &self.search {
            update = update.search(search.clone());
        }
        if let Some(from) = self.from {
            update = update.start_date(start_of_day(from));
        }
        if let Some(to) = self.to {
            update = update.end_date(end_of_day(to));
        }
        if let Some(page) = self.page {
            update = update.page(page);
        }
        if let Some(limit) = self.limit {
            update = update.limit(limit);
        }
        update
    }
}

impl From<AddArgs> for NewTransaction {
    fn from(args: AddArgs) -> Self {
        let mut tx = NewTransaction::new(
            args.kind,
            args.category,
            args.amount,
            args.description,
            args.payment_mode,
        );
        tx.date = args.date;
        tx.recurrence = args.recurrence;
        tx.related_to = args.related_to;
        tx.is_paid = args.paid;
        tx
    }
}

impl UpdateArgs {
    fn into_patch(self) -> (String, TransactionPatch) {
        let patch = TransactionPatch {
            kind: self.kind,
            category: self.category,
            amount: self.amount,
            date: self.date,
            description: self.description,
            payment_mode: self.payment_mode,
            recurrence: self.recurrence,
            related_to: self.related_to,
            is_paid: self.paid,
        };
        (self.id, patch)
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + TimeDelta::days(1) - TimeDelta::milliseconds(1)
}

pub async fn list(store: &TransactionStore, args: ListArgs) -> Result<()> {
    let page = store.set_filters(args.filter_update()).await?;
    print_page(&page);
    Ok(())
}

pub async fn stats(store: &TransactionStore) -> Result<()> {
    let stats = store.fetch_statistics().await?;
    print_statistics(&stats);
    Ok(())
}

pub async fn add(store: &TransactionStore, args: AddArgs) -> Result<()> {
    let tx = store
        .add_transaction(args.into())
        .await
        .map_err(explain_validation)?;
    println!("created {}", tx.id);
    println!("{}", transaction_line(&tx));
    Ok(())
}

pub async fn update(store: &TransactionStore, args: UpdateArgs) -> Result<()> {
    let (id, patch) = args.into_patch();
    if patch.is_empty() {
        return Err(AppError::Usage("nothing to update".to_string()));
    }
    let tx = store
        .update_transaction(&id, patch)
        .await
        .map_err(explain_validation)?;
    println!("updated {}", tx.id);
    println!("{}", transaction_line(&tx));
    Ok(())
}

pub async fn delete(store: &TransactionStore, id: &str) -> Result<()> {
    store.delete_transaction(id).await?;
    println!("deleted {id}");
    Ok(())
}

fn explain_validation(err: StoreError) -> AppError {
    if let Some(errors) = err.validation() {
        for (field, message) in errors.iter() {
            eprintln!("  {field}: {message}");
        }
    }
    err.into()
}

fn print_page(page: &TransactionListResponse) {
    if page.transactions.is_empty() {
        println!("no transactions");
    }
    for tx in &page.transactions {
        println!("{}", transaction_line(tx));
    }
    println!("{}", page_footer(&page.pagination));
}

fn page_footer(p: &Pagination) -> String {
    let footer = format!(
        "page {} of {} ({} transactions)",
        p.page,
        p.last_page(),
        p.total
    );
    let mut hints = Vec::new();
    if p.has_prev() {
        hints.push(format!("--page {} for previous", p.page - 1));
    }
    if p.has_next() {
        hints.push(format!("--page {} for next", p.page + 1));
    }
    if hints.is_empty() {
        footer
    } else {
        format!("{footer}, {}", hints.join(", "))
    }
}

fn transaction_line(tx: &Transaction) -> String {
    let sign = match tx.kind {
        TransactionType::Income | TransactionType::CreditReceived => "+",
        TransactionType::Expense | TransactionType::CreditGiven => "-",
    };
    let amount = format!("{sign}{}", tx.amount.round_dp(2));
    let mut line = format!(
        "{}  {:<15}  {:<13}  {:>11}  {}  [{}]",
        tx.date.format("%Y-%m-%d"),
        tx.kind.as_str(),
        tx.category,
        amount,
        tx.description,
        tx.id
    );
    if tx.kind.is_credit() {
        if let Some(party) = tx.related_to.as_deref() {
            line.push_str(&format!("  with {party}"));
        }
        let status = if tx.is_paid.unwrap_or(false) { "paid" } else { "open" };
        line.push_str(&format!("  ({status})"));
    }
    line
}

fn print_statistics(stats: &TransactionStatistics) {
    let rows = [
        ("income", stats.total_income),
        ("expense", stats.total_expense),
        ("credit given", stats.total_credit_given),
        ("credit received", stats.total_credit_received),
        ("net balance", stats.net_balance),
    ];
    for (label, value) in rows {
        println!("{label:<16} {:>12}", value.round_dp(2).to_string());
    }
}
