//! Active filter and paging state of a store.

use api_types::transaction::{TransactionQuery, TransactionType};
use chrono::{DateTime, Utc};

pub const DEFAULT_PAGE_SIZE: u64 = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filters {
    pub kind: Option<TransactionType>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// 1-based.
    pub page: u64,
    pub limit: u64,
}

impl Default for Filters {
    fn default() -> Self {
        Self::with_limit(DEFAULT_PAGE_SIZE)
    }
}

impl Filters {
    pub fn with_limit(limit: u64) -> Self {
        Self {
            kind: None,
            category: None,
            search: None,
            start_date: None,
            end_date: None,
            page: 1,
            limit: limit.max(1),
        }
    }

    /// Merges `update` into the filters.
    ///
    /// Touching any field other than `page` moves back to page 1 unless the
    /// same update also names a page.
    pub fn apply(&mut self, update: FilterUpdate) {
        let reset_page = update.touches_non_page();

        if let Some(kind) = update.kind {
            self.kind = kind;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(search) = update.search {
            self.search = search;
        }
        if let Some(start_date) = update.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = update.end_date {
            self.end_date = end_date;
        }
        if let Some(limit) = update.limit {
            self.limit = limit.max(1);
        }

        match update.page {
            Some(page) => self.page = page.max(1),
            None if reset_page => self.page = 1,
            None => {}
        }
    }

    pub fn to_query(&self) -> TransactionQuery {
        TransactionQuery {
            kind: self.kind,
            category: non_blank(self.category.as_deref()),
            search: non_blank(self.search.as_deref()),
            start_date: self.start_date,
            end_date: self.end_date,
            page: Some(self.page.max(1)),
            limit: Some(self.limit.max(1)),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Partial update for [`Filters`].
///
/// Each field is tri-state: untouched (`None`), cleared (`Some(None)`) or set
/// (`Some(Some(_))`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterUpdate {
    kind: Option<Option<TransactionType>>,
    category: Option<Option<String>>,
    search: Option<Option<String>>,
    start_date: Option<Option<DateTime<Utc>>>,
    end_date: Option<Option<DateTime<Utc>>>,
    page: Option<u64>,
    limit: Option<u64>,
}

impl FilterUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: TransactionType) -> Self {
        self.kind = Some(Some(kind));
        self
    }

    pub fn clear_kind(mut self) -> Self {
        self.kind = Some(None);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(Some(category.into()));
        self
    }

    pub fn clear_category(mut self) -> Self {
        self.category = Some(None);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(Some(search.into()));
        self
    }

    pub fn clear_search(mut self) -> Self {
        self.search = Some(None);
        self
    }

    pub fn start_date(mut self, start_date: DateTime<Utc>) -> Self {
        self.start_date = Some(Some(start_date));
        self
    }

    pub fn clear_start_date(mut self) -> Self {
        self.start_date = Some(None);
        self
    }

    pub fn end_date(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(Some(end_date));
        self
    }

    pub fn clear_end_date(mut self) -> Self {
        self.end_date = Some(None);
        self
    }

    pub fn page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    fn touches_non_page(&self) -> bool {
        self.kind.is_some()
            || self.category.is_some()
            || self.search.is_some()
            || self.start_date.is_some()
            || self.end_date.is_some()
            || self.limit.is_some()
    }
}
