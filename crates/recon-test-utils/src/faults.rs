use async_trait::async_trait;
use parking_lot::Mutex;
use recon_model::{ExternalIdentity, HistoryEntry, UserRecord};
use recon_store::{CreateOutcome, ExternalUserSource, SourceError, StoreError, UserStore};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Consume one unit of a failure budget; `true` if one was left
fn take(budget: &AtomicUsize) -> bool {
    budget
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// Source that fails its first `n` lookups with `Unavailable`
#[derive(Debug)]
pub struct FlakySource<S> {
    inner: S,
    failures: AtomicUsize,
    calls: AtomicUsize,
}

impl<S> FlakySource<S> {
    pub fn new(inner: S, failures: usize) -> Self {
        Self {
            inner,
            failures: AtomicUsize::new(failures),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: ExternalUserSource> ExternalUserSource for FlakySource<S> {
    async fn get(&self, lookup_key: &str) -> Result<ExternalIdentity, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if take(&self.failures) {
            return Err(SourceError::unavailable("injected source fault"));
        }
        self.inner.get(lookup_key).await
    }
}

/// Store wrapper injecting faults per operation
///
/// - `fail_reads(n)`: the next `n` reads fail before touching the store
/// - `fail_creates(n)`: the next `n` creates fail before writing
/// - `drop_create_acks(n)`: the next `n` creates write, then report `Unavailable`
/// - `fail_merges(n)`: the next `n` merges fail before writing
/// - `race_create_with(record)`: the next create finds `record` written first
#[derive(Debug)]
pub struct FlakyStore<S> {
    inner: S,
    read_failures: AtomicUsize,
    create_failures: AtomicUsize,
    lost_create_acks: AtomicUsize,
    merge_failures: AtomicUsize,
    racer: Mutex<Option<UserRecord>>,
    reads: AtomicUsize,
    creates: AtomicUsize,
    merges: AtomicUsize,
}

impl<S> FlakyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            read_failures: AtomicUsize::new(0),
            create_failures: AtomicUsize::new(0),
            lost_create_acks: AtomicUsize::new(0),
            merge_failures: AtomicUsize::new(0),
            racer: Mutex::new(None),
            reads: AtomicUsize::new(0),
            creates: AtomicUsize::new(0),
            merges: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn fail_reads(self, n: usize) -> Self {
        self.read_failures.store(n, Ordering::SeqCst);
        self
    }

    #[must_use]
    pub fn fail_creates(self, n: usize) -> Self {
        self.create_failures.store(n, Ordering::SeqCst);
        self
    }

    #[must_use]
    pub fn drop_create_acks(self, n: usize) -> Self {
        self.lost_create_acks.store(n, Ordering::SeqCst);
        self
    }

    #[must_use]
    pub fn fail_merges(self, n: usize) -> Self {
        self.merge_failures.store(n, Ordering::SeqCst);
        self
    }

    #[must_use]
    pub fn race_create_with(self, record: UserRecord) -> Self {
        *self.racer.lock() = Some(record);
        self
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn merges(&self) -> usize {
        self.merges.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: UserStore> UserStore for FlakyStore<S> {
    async fn get_by_key(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if take(&self.read_failures) {
            return Err(StoreError::unavailable("injected read fault"));
        }
        self.inner.get_by_key(id).await
    }

    async fn create_if_absent(&self, record: UserRecord) -> Result<CreateOutcome, StoreError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if take(&self.create_failures) {
            return Err(StoreError::unavailable("injected create fault"));
        }
        let racer = self.racer.lock().take();
        if let Some(racer) = racer {
            self.inner.create_if_absent(racer).await?;
        }
        let outcome = self.inner.create_if_absent(record).await?;
        if take(&self.lost_create_acks) {
            return Err(StoreError::unavailable("injected lost acknowledgement"));
        }
        Ok(outcome)
    }

    async fn merge_update(
        &self,
        id: &str,
        name: &str,
        history_entry: &HistoryEntry,
    ) -> Result<UserRecord, StoreError> {
        self.merges.fetch_add(1, Ordering::SeqCst);
        if take(&self.merge_failures) {
            return Err(StoreError::unavailable("injected merge fault"));
        }
        self.inner.merge_update(id, name, history_entry).await
    }
}
