//! Client-side transaction store.
//!
//! [`TransactionStore`] holds one signed-in user's view of their transactions:
//! the active page, the pagination block, global statistics and the filter
//! state. It is the only component talking to the remote API; callers render
//! [`StoreSnapshot`] and invoke operations.
//!
//! Writes are never patched into the cached page. After every successful
//! create, update or delete the store refetches the active page and the
//! statistics, so the view is always what the server holds.

pub use api_types::{
    stats::TransactionStatistics,
    transaction::{
        Pagination, PaymentMode, Recurrence, Transaction, TransactionListResponse,
        TransactionPatch, TransactionType,
    },
};

pub use auth::{AuthHandle, Credential, SessionWatch};
pub use client::{ClientError, HttpRemote, Remote};
pub use config::StoreConfig;
pub use error::{Result, StoreError, ValidationErrors};
pub use filters::{FilterUpdate, Filters};
pub use state::StoreSnapshot;
pub use store::TransactionStore;
pub use validate::NewTransaction;

pub mod auth;
pub mod client;
mod config;
mod error;
mod filters;
mod state;
mod store;
mod validate;
