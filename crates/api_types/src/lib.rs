//! Types exchanged between the transaction store and the remote API.
//!
//! Field names are camelCase on the wire, enum values are SCREAMING_SNAKE_CASE.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub mod envelope {
    use super::*;

    /// Every response body is wrapped in `{ success, data }`.
    ///
    /// Error bodies carry `success: false` and a human readable `message`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ApiResponse<T> {
        pub success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub data: Option<T>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub message: Option<String>,
    }

    impl<T> ApiResponse<T> {
        pub fn ok(data: T) -> Self {
            Self {
                success: true,
                data: Some(data),
                message: None,
            }
        }

        pub fn error(message: impl Into<String>) -> Self {
            Self {
                success: false,
                data: None,
                message: Some(message.into()),
            }
        }

        /// Returns the payload when the envelope reports success and carries data.
        pub fn into_data(self) -> Option<T> {
            if self.success { self.data } else { None }
        }
    }
}

pub mod stats {
    use super::*;

    /// Global totals for the authenticated user, computed by the server.
    ///
    /// `net_balance` is always `total_income - total_expense`; credit totals
    /// are reported separately and are not netted into the balance.
    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionStatistics {
        pub total_income: Decimal,
        pub total_expense: Decimal,
        pub total_credit_given: Decimal,
        pub total_credit_received: Decimal,
        pub net_balance: Decimal,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum TransactionType {
        Income,
        Expense,
        CreditGiven,
        CreditReceived,
    }

    impl TransactionType {
        pub const ALL: [TransactionType; 4] = [
            Self::Income,
            Self::Expense,
            Self::CreditGiven,
            Self::CreditReceived,
        ];

        pub fn as_str(self) -> &'static str {
            match self {
                Self::Income => "INCOME",
                Self::Expense => "EXPENSE",
                Self::CreditGiven => "CREDIT_GIVEN",
                Self::CreditReceived => "CREDIT_RECEIVED",
            }
        }

        pub fn is_credit(self) -> bool {
            matches!(self, Self::CreditGiven | Self::CreditReceived)
        }

        /// Suggested categories for forms.
        ///
        /// Categories are free-form on the wire; this list is only a vocabulary
        /// for input helpers and is never enforced.
        pub fn categories(self) -> &'static [&'static str] {
            match self {
                Self::Income => &[
                    "SALARY",
                    "BUSINESS",
                    "INVESTMENT",
                    "RENTAL",
                    "FREELANCE",
                    "OTHER",
                ],
                Self::Expense => &[
                    "FOOD",
                    "SHOPPING",
                    "TRANSPORT",
                    "BILLS",
                    "RENT",
                    "HEALTHCARE",
                    "EDUCATION",
                    "ENTERTAINMENT",
                    "GROCERIES",
                    "UTILITIES",
                    "INSURANCE",
                    "MAINTENANCE",
                    "CLOTHING",
                    "TRAVEL",
                    "OTHER",
                ],
                Self::CreditGiven | Self::CreditReceived => {
                    &["PERSONAL", "BUSINESS", "FAMILY", "FRIEND", "EMERGENCY"]
                }
            }
        }
    }

    impl std::fmt::Display for TransactionType {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.as_str())
        }
    }

    impl std::str::FromStr for TransactionType {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            Self::ALL
                .into_iter()
                .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
                .ok_or_else(|| format!("unknown transaction type: {s}"))
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum PaymentMode {
        Online,
        Cash,
    }

    impl std::str::FromStr for PaymentMode {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.trim().to_ascii_uppercase().as_str() {
                "ONLINE" => Ok(Self::Online),
                "CASH" => Ok(Self::Cash),
                _ => Err(format!("unknown payment mode: {s}")),
            }
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum Recurrence {
        Daily,
        Weekly,
        Monthly,
        Yearly,
    }

    impl std::str::FromStr for Recurrence {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.trim().to_ascii_uppercase().as_str() {
                "DAILY" => Ok(Self::Daily),
                "WEEKLY" => Ok(Self::Weekly),
                "MONTHLY" => Ok(Self::Monthly),
                "YEARLY" => Ok(Self::Yearly),
                _ => Err(format!("unknown recurrence: {s}")),
            }
        }
    }

    /// A transaction as stored by the server.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Transaction {
        pub id: String,
        #[serde(rename = "type")]
        pub kind: TransactionType,
        pub category: String,
        /// Always > 0. The direction is implied by `kind`.
        pub amount: Decimal,
        pub date: DateTime<Utc>,
        pub description: String,
        pub payment_mode: PaymentMode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub recurrence: Option<Recurrence>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub related_to: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub is_paid: Option<bool>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    /// Request body for `POST /transactions`.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionCreate {
        #[serde(rename = "type")]
        pub kind: TransactionType,
        pub category: String,
        pub amount: Decimal,
        pub date: DateTime<Utc>,
        pub description: String,
        pub payment_mode: PaymentMode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub recurrence: Option<Recurrence>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub related_to: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub is_paid: Option<bool>,
    }

    /// Request body for `PATCH /transactions/:id`. Absent fields are left as is.
    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionPatch {
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        pub kind: Option<TransactionType>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub category: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub amount: Option<Decimal>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub date: Option<DateTime<Utc>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub payment_mode: Option<PaymentMode>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub recurrence: Option<Recurrence>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub related_to: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub is_paid: Option<bool>,
    }

    impl TransactionPatch {
        pub fn is_empty(&self) -> bool {
            *self == Self::default()
        }
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Pagination {
        pub total: u64,
        pub page: u64,
        pub limit: u64,
        pub total_pages: u64,
    }

    impl Pagination {
        /// Builds the pagination block for `total` items split in pages of `limit`.
        ///
        /// `page` is clamped to `1..=max(total_pages, 1)`.
        pub fn new(total: u64, page: u64, limit: u64) -> Self {
            let limit = limit.max(1);
            let total_pages = total.div_ceil(limit);
            Self {
                total,
                page: page.clamp(1, total_pages.max(1)),
                limit,
                total_pages,
            }
        }

        /// Index of the first item of the page.
        pub fn offset(&self) -> u64 {
            self.page.saturating_sub(1).saturating_mul(self.limit)
        }

        /// Highest page a client may request; an empty result still has page 1.
        pub fn last_page(&self) -> u64 {
            self.total_pages.max(1)
        }

        pub fn has_next(&self) -> bool {
            self.page < self.last_page()
        }

        pub fn has_prev(&self) -> bool {
            self.page > 1
        }
    }

    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionListResponse {
        pub transactions: Vec<Transaction>,
        pub pagination: Pagination,
    }

    /// Query string of `GET /transactions`.
    ///
    /// Dates are sent as ISO-8601 timestamps with millisecond precision in UTC.
    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionQuery {
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        pub kind: Option<TransactionType>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub category: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub search: Option<String>,
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            serialize_with = "iso_timestamp::serialize"
        )]
        pub start_date: Option<DateTime<Utc>>,
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            serialize_with = "iso_timestamp::serialize"
        )]
        pub end_date: Option<DateTime<Utc>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub page: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub limit: Option<u64>,
    }

    mod iso_timestamp {
        use chrono::{DateTime, SecondsFormat, Utc};
        use serde::Serializer;

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => {
                    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
                }
                None => serializer.serialize_none(),
            }
        }
    }
}
