use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use api_types::{
    stats::TransactionStatistics,
    transaction::{Transaction, TransactionListResponse, TransactionPatch},
};
use chrono::Utc;
use tokio::sync::Mutex;

use crate::{
    auth::{Credential, SessionWatch},
    client::{ClientError, HttpRemote, Remote},
    config::StoreConfig,
    error::{Result, StoreError},
    filters::{FilterUpdate, Filters},
    state::{InFlight, SessionState, StoreSnapshot},
    validate::{self, NewTransaction},
};

/// Client-side view of the signed-in user's transactions and statistics.
///
/// Clones share the same state. Reads never hold the state lock across a
/// network round trip; writes are serialized and always end with a refetch of
/// the active page and of the statistics, so the cached view is exactly what
/// the server holds.
pub struct TransactionStore<R = HttpRemote> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for TransactionStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<R> {
    remote: R,
    session: SessionWatch,
    config: StoreConfig,
    state: Mutex<SessionState>,
    writes: Mutex<()>,
    /// Requests currently awaiting the remote, across sessions.
    loading: AtomicUsize,
}

impl TransactionStore<HttpRemote> {
    pub fn connect(config: StoreConfig, session: SessionWatch) -> Result<Self> {
        let remote = HttpRemote::new(&config.base_url)?;
        Ok(Self::with_remote(remote, config, session))
    }
}

impl<R: Remote> TransactionStore<R> {
    pub fn with_remote(remote: R, config: StoreConfig, session: SessionWatch) -> Self {
        let identity = session.current().map(|c| c.user_id().to_string());
        let state = SessionState::new(identity, 0, config.page_size);
        Self {
            inner: Arc::new(Inner {
                remote,
                session,
                config,
                state: Mutex::new(state),
                writes: Mutex::new(()),
                loading: AtomicUsize::new(0),
            }),
        }
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        let mut state = self.inner.state.lock().await;
        self.sync_session(&mut state);
        state.snapshot(self.inner.loading.load(Ordering::SeqCst) > 0)
    }

    pub async fn filters(&self) -> Filters {
        self.inner.state.lock().await.filters.clone()
    }

    /// Fetches the page described by `filters` and, on success, the statistics.
    pub async fn list_transactions(&self, filters: &Filters) -> Result<TransactionListResponse> {
        let page = self.fetch_page(filters).await?;
        if let Err(err) = self.fetch_statistics().await {
            tracing::debug!("statistics refresh after listing failed: {err}");
        }
        Ok(page)
    }

    /// Global totals; never filtered.
    ///
    /// A failure clears the cached statistics but leaves the list error alone.
    pub async fn fetch_statistics(&self) -> Result<TransactionStatistics> {
        let (credential, generation) = self.begin().await?;
        let seq = self.inner.state.lock().await.stats_seq.issue();

        tracing::debug!(seq, "fetching statistics");
        let res = {
            let _loading = InFlight::start(&self.inner.loading);
            self.inner.remote.statistics(credential.token()).await
        };

        let mut state = self.inner.state.lock().await;
        if !self.settle(&mut state, generation) {
            return Err(StoreError::SessionChanged);
        }

        match res {
            Ok(statistics) => {
                if state.stats_seq.apply(seq) {
                    state.statistics = Some(statistics.clone());
                } else {
                    tracing::debug!(seq, "discarding stale statistics");
                }
                Ok(statistics)
            }
            Err(err) => {
                if state.stats_seq.apply(seq) {
                    tracing::warn!("failed to fetch statistics: {err}");
                    state.statistics = None;
                }
                Err(err.into())
            }
        }
    }

    /// Lists with the active filters unless the cache is still fresh.
    pub async fn load(&self) -> Result<()> {
        self.begin().await?;
        let fresh = {
            let state = self.inner.state.lock().await;
            state
                .fetched_at
                .is_some_and(|at| at.elapsed() < self.inner.config.cache_ttl())
        };
        if fresh {
            tracing::debug!("transactions cache still fresh, skipping fetch");
            return Ok(());
        }
        self.refresh().await.map(|_| ())
    }

    /// Refetches the active page and the statistics, regardless of cache age.
    ///
    /// Statistics are refreshed even when the list request fails.
    pub async fn refresh(&self) -> Result<TransactionListResponse> {
        let filters = self.filters().await;
        let page = self.fetch_page(&filters).await;
        if let Err(err) = self.fetch_statistics().await {
            tracing::debug!("statistics refresh failed: {err}");
        }
        page
    }

    pub async fn set_filters(&self, update: FilterUpdate) -> Result<TransactionListResponse> {
        self.begin().await?;
        let filters = {
            let mut state = self.inner.state.lock().await;
            state.filters.apply(update);
            state.filters.clone()
        };
        self.list_transactions(&filters).await
    }

    /// Moves to the next page. `Ok(None)` when already on the last one.
    pub async fn next_page(&self) -> Result<Option<TransactionListResponse>> {
        let (page, last_page) = {
            let state = self.inner.state.lock().await;
            (state.filters.page, state.pagination.last_page())
        };
        if page >= last_page {
            return Ok(None);
        }
        self.set_filters(FilterUpdate::new().page(page + 1))
            .await
            .map(Some)
    }

    /// Moves to the previous page. `Ok(None)` when already on the first one.
    pub async fn prev_page(&self) -> Result<Option<TransactionListResponse>> {
        let page = self.inner.state.lock().await.filters.page;
        if page <= 1 {
            return Ok(None);
        }
        self.set_filters(FilterUpdate::new().page(page - 1))
            .await
            .map(Some)
    }

    pub async fn add_transaction(&self, tx: NewTransaction) -> Result<Transaction> {
        let body = validate::new_transaction(tx, Utc::now()).map_err(StoreError::Validation)?;

        let _write = self.inner.writes.lock().await;
        let (credential, generation) = self.begin().await?;
        let created = self
            .write(generation, self.inner.remote.create(credential.token(), &body))
            .await?;
        tracing::info!(id = %created.id, kind = %created.kind, "transaction created");

        self.refresh_after_write().await;
        Ok(created)
    }

    pub async fn update_transaction(&self, id: &str, patch: TransactionPatch) -> Result<Transaction> {
        validate::patch(&patch).map_err(StoreError::Validation)?;

        let _write = self.inner.writes.lock().await;
        let (credential, generation) = self.begin().await?;
        let updated = self
            .write(
                generation,
                self.inner.remote.update(credential.token(), id, &patch),
            )
            .await?;
        tracing::info!(id, "transaction updated");

        self.refresh_after_write().await;
        Ok(updated)
    }

    pub async fn delete_transaction(&self, id: &str) -> Result<()> {
        let _write = self.inner.writes.lock().await;
        let (credential, generation) = self.begin().await?;
        self.write(generation, self.inner.remote.delete(credential.token(), id))
            .await?;
        tracing::info!(id, "transaction deleted");

        self.refresh_after_write().await;
        Ok(())
    }

    /// Resolves the current credential and drops state cached for another identity.
    async fn begin(&self) -> Result<(Credential, u64)> {
        let mut state = self.inner.state.lock().await;
        let credential = self.sync_session(&mut state).ok_or(StoreError::NotSignedIn)?;
        Ok((credential, state.generation))
    }

    fn sync_session(&self, state: &mut SessionState) -> Option<Credential> {
        let credential = self.inner.session.current();
        state.sync_identity(
            credential.as_ref().map(Credential::user_id),
            self.inner.config.page_size,
        );
        credential
    }

    /// Settles a request after its round trip. False when the identity
    /// changed while it was in flight.
    fn settle(&self, state: &mut SessionState, generation: u64) -> bool {
        self.sync_session(state);
        state.generation == generation
    }

    async fn fetch_page(&self, filters: &Filters) -> Result<TransactionListResponse> {
        let (page, out_of_range) = self.fetch_page_once(filters).await?;
        if !out_of_range {
            return Ok(page);
        }

        // The page may have disappeared, e.g. after deleting the last item of
        // the last page.
        let last_page = page.pagination.last_page();
        tracing::debug!(
            requested = filters.page,
            last_page,
            "requested page out of range, loading last page"
        );
        let mut clamped = filters.clone();
        clamped.page = last_page;
        let (page, _) = self.fetch_page_once(&clamped).await?;
        Ok(page)
    }

    /// Fetches one page. The flag is set when `filters.page` lies past the
    /// last page; such a response is never applied and the caller should
    /// retry with the last page.
    async fn fetch_page_once(&self, filters: &Filters) -> Result<(TransactionListResponse, bool)> {
        let (credential, generation) = self.begin().await?;
        let seq = self.inner.state.lock().await.list_seq.issue();

        tracing::debug!(seq, page = filters.page, limit = filters.limit, "listing transactions");
        let res = {
            let _loading = InFlight::start(&self.inner.loading);
            self.inner
                .remote
                .list(credential.token(), &filters.to_query())
                .await
        };

        let mut state = self.inner.state.lock().await;
        if !self.settle(&mut state, generation) {
            tracing::debug!(seq, "discarding transactions of a previous session");
            return Err(StoreError::SessionChanged);
        }

        match res {
            Ok(page) => {
                if filters.page > page.pagination.last_page() {
                    let retry = state.list_seq.apply(seq) && state.list_seq.is_latest(seq);
                    return Ok((page, retry));
                }
                if state.list_seq.apply(seq) {
                    state.transactions = page.transactions.clone();
                    state.pagination = page.pagination;
                    state.filters = filters.clone();
                    state.error = None;
                    state.mark_fetched();
                } else {
                    tracing::debug!(seq, "discarding stale transaction page");
                }
                Ok((page, false))
            }
            Err(err) => {
                if state.list_seq.apply(seq) {
                    state.error = Some(err.to_string());
                }
                Err(err.into())
            }
        }
    }

    /// Runs a mutating request, recording its failure in the list error.
    async fn write<T>(
        &self,
        generation: u64,
        request: impl Future<Output = std::result::Result<T, ClientError>>,
    ) -> Result<T> {
        self.inner.state.lock().await.error = None;

        let res = {
            let _loading = InFlight::start(&self.inner.loading);
            request.await
        };

        let mut state = self.inner.state.lock().await;
        if !self.settle(&mut state, generation) {
            return Err(StoreError::SessionChanged);
        }
        res.map_err(|err| {
            tracing::warn!("write failed: {err}");
            state.error = Some(err.to_string());
            err.into()
        })
    }

    async fn refresh_after_write(&self) {
        if let Err(err) = self.refresh().await {
            tracing::warn!("refresh after write failed: {err}");
        }
    }
}
