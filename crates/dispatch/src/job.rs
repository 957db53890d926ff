//! The reminder dispatch job: paged due-scan, semaphore-bounded fan-out,
//! and per-invocation outcome aggregation.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use followup_core::types::{DbId, Timestamp};
use followup_db::models::connection::Connection;
use followup_mailer::message::ReminderEmail;
use followup_mailer::Mailer;

use crate::config::DispatchConfig;
use crate::sender::send_with_retry;
use crate::store::ReminderStore;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of processing one reminder record.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RecordResult {
    pub id: DbId,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl RecordResult {
    fn sent(id: DbId) -> Self {
        Self {
            id,
            success: true,
            error_detail: None,
        }
    }

    fn failed(id: DbId, detail: impl Into<String>) -> Self {
        Self {
            id,
            success: false,
            error_detail: Some(detail.into()),
        }
    }
}

/// Aggregate counters for one invocation.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct DispatchOutcome {
    /// Records successfully sent and fulfilled.
    pub processed: u64,
    /// Records that ended in failure (left eligible for the next run).
    pub failed: u64,
    /// Per-record results in completion order.
    pub results: Vec<RecordResult>,
}

impl DispatchOutcome {
    fn record(&mut self, result: RecordResult) {
        if result.success {
            self.processed += 1;
        } else {
            self.failed += 1;
        }
        self.results.push(result);
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// One-shot reminder dispatch over all currently due records.
///
/// Construct once per invocation with an explicit [`DispatchConfig`]; the
/// job reads no process-wide state.
pub struct ReminderDispatchJob {
    store: Arc<dyn ReminderStore>,
    mailer: Arc<dyn Mailer>,
    config: DispatchConfig,
}

impl ReminderDispatchJob {
    pub fn new(
        store: Arc<dyn ReminderStore>,
        mailer: Arc<dyn Mailer>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            store,
            mailer,
            config,
        }
    }

    /// Run the job against a fixed `now`.
    ///
    /// Batches are fetched and settled strictly sequentially; a fetch error
    /// is fatal and propagates (mutations committed by earlier batches are
    /// kept). Per-record send failures never propagate — they are tallied
    /// into the returned [`DispatchOutcome`].
    pub async fn run(&self, now: Timestamp) -> Result<DispatchOutcome, sqlx::Error> {
        let limit = self.config.batch_size;
        let mut outcome = DispatchOutcome::default();
        // Fulfilled records drop out of the due predicate between pages, so
        // the offset only advances past records that stay in it: the failed
        // ones. Keeps each record to exactly one delivery sequence per run.
        let mut skip: i64 = 0;

        loop {
            let batch = self.store.find_due(now, skip, limit).await?;
            let fetched = batch.len();
            if fetched == 0 {
                break;
            }

            tracing::debug!(fetched, skip, "Dispatching reminder batch");
            let failed_before = outcome.failed;
            self.dispatch_batch(batch, &mut outcome).await;
            skip += (outcome.failed - failed_before) as i64;

            if fetched < limit as usize {
                break;
            }
        }

        tracing::info!(
            processed = outcome.processed,
            failed = outcome.failed,
            "Reminder dispatch finished"
        );
        Ok(outcome)
    }

    /// Fan one batch out across at most `concurrency` in-flight sends.
    ///
    /// Every task settles independently; a panicked task is tallied as a
    /// failure without aborting its siblings. Tallies are reduced by this
    /// single caller after each task joins.
    async fn dispatch_batch(&self, batch: Vec<Connection>, outcome: &mut DispatchOutcome) {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut tasks = JoinSet::new();

        for record in batch {
            let semaphore = Arc::clone(&semaphore);
            let store = Arc::clone(&self.store);
            let mailer = Arc::clone(&self.mailer);
            let policy = self.config.retry.clone();

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return RecordResult::failed(record.id, "dispatcher shut down");
                };
                process_record(store.as_ref(), mailer.as_ref(), &policy, record).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => outcome.record(result),
                Err(e) => {
                    tracing::error!(error = %e, "Dispatch task panicked");
                    outcome.record(RecordResult::failed(-1, format!("task failed: {e}")));
                }
            }
        }
    }
}

/// Send one reminder and, on success, fulfill the record.
async fn process_record(
    store: &dyn ReminderStore,
    mailer: &dyn Mailer,
    policy: &followup_core::retry::RetryPolicy,
    record: Connection,
) -> RecordResult {
    let id = record.id;
    let email = build_email(&record);

    let status = send_with_retry(mailer, &email, policy).await;
    if !status.is_delivered() {
        return RecordResult::failed(id, status.error_detail().unwrap_or("send failed"));
    }

    match store.mark_fulfilled(id).await {
        Ok(updated) => {
            if !updated {
                tracing::warn!(id, "Record was already fulfilled");
            }
            tracing::info!(id, to = %record.email, "Reminder sent and fulfilled");
            RecordResult::sent(id)
        }
        Err(e) => {
            // The email went out but the flag did not stick; the record will
            // be re-sent next run rather than silently lost.
            tracing::error!(id, error = %e, "Sent reminder but failed to mark fulfilled");
            RecordResult::failed(id, format!("fulfillment update failed: {e}"))
        }
    }
}

/// Pure formatting step from a stored record to the email payload.
fn build_email(record: &Connection) -> ReminderEmail {
    ReminderEmail {
        to: record.email.clone(),
        contact_name: record.display_name(),
        position: record.position.clone(),
        company_name: record.company_name.clone(),
        company_url: record.company_url.clone(),
        note: record.note.clone(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    use followup_core::retry::RetryPolicy;
    use followup_mailer::SendResult;

    // -- Fakes --------------------------------------------------------------

    /// In-memory store over a mutex-guarded record vector.
    struct InMemoryStore {
        records: Mutex<Vec<Connection>>,
        find_due_calls: Mutex<Vec<(i64, i64)>>,
        mark_calls: AtomicUsize,
        fail_fetch: bool,
    }

    impl InMemoryStore {
        fn new(records: Vec<Connection>) -> Self {
            Self {
                records: Mutex::new(records),
                find_due_calls: Mutex::new(Vec::new()),
                mark_calls: AtomicUsize::new(0),
                fail_fetch: false,
            }
        }

        fn get(&self, id: DbId) -> Connection {
            self.records
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.id == id)
                .cloned()
                .unwrap()
        }
    }

    #[async_trait]
    impl ReminderStore for InMemoryStore {
        async fn find_due(
            &self,
            now: Timestamp,
            skip: i64,
            limit: i64,
        ) -> Result<Vec<Connection>, sqlx::Error> {
            if self.fail_fetch {
                return Err(sqlx::Error::PoolTimedOut);
            }
            self.find_due_calls.lock().unwrap().push((skip, limit));
            let records = self.records.lock().unwrap();
            let mut due: Vec<Connection> = records
                .iter()
                .filter(|r| !r.reminded && r.remind_at.is_some_and(|t| t <= now))
                .cloned()
                .collect();
            due.sort_by_key(|r| r.id);
            Ok(due
                .into_iter()
                .skip(skip as usize)
                .take(limit as usize)
                .collect())
        }

        async fn mark_fulfilled(&self, id: DbId) -> Result<bool, sqlx::Error> {
            self.mark_calls.fetch_add(1, Ordering::SeqCst);
            let mut records = self.records.lock().unwrap();
            let record = records.iter_mut().find(|r| r.id == id);
            Ok(match record {
                Some(r) if !r.reminded => {
                    r.reminded = true;
                    r.remind_at = None;
                    true
                }
                _ => false,
            })
        }
    }

    /// Mailer that replays a per-recipient script; unscripted recipients
    /// always deliver.
    struct RoutedMailer {
        scripts: Mutex<HashMap<String, Vec<SendResult>>>,
        calls: AtomicUsize,
    }

    impl RoutedMailer {
        fn new(scripts: HashMap<String, Vec<SendResult>>) -> Self {
            Self {
                scripts: Mutex::new(scripts),
                calls: AtomicUsize::new(0),
            }
        }

        fn always_delivers() -> Self {
            Self::new(HashMap::new())
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Mailer for RoutedMailer {
        async fn send(&self, email: &ReminderEmail) -> SendResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut scripts = self.scripts.lock().unwrap();
            match scripts.get_mut(&email.to) {
                Some(script) if !script.is_empty() => script.remove(0),
                _ => SendResult::Delivered,
            }
        }
    }

    /// Mailer that tracks the high-water mark of concurrent sends.
    struct ConcurrencyProbe {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl ConcurrencyProbe {
        fn new() -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Mailer for ConcurrencyProbe {
        async fn send(&self, _email: &ReminderEmail) -> SendResult {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            SendResult::Delivered
        }
    }

    // -- Fixtures -----------------------------------------------------------

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    fn due_record(id: DbId) -> Connection {
        Connection {
            id,
            owner_id: "auth0|owner".into(),
            email: format!("user{id}@example.com"),
            first_name: "Contact".into(),
            last_name: format!("{id}"),
            position: "Engineer".into(),
            company_name: "Example Corp".into(),
            company_url: "https://example.com".into(),
            linkedin_url: "https://www.linkedin.com/in/contact".into(),
            profile_picture: String::new(),
            note: None,
            remind_at: Some(now() - chrono::Duration::minutes(5)),
            reminded: false,
            created_at: now() - chrono::Duration::days(1),
        }
    }

    fn job(store: Arc<InMemoryStore>, mailer: Arc<dyn Mailer>, config: DispatchConfig) -> ReminderDispatchJob {
        ReminderDispatchJob::new(store, mailer, config)
    }

    // -- Tests --------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn mixed_batch_tallies_and_mutates_correctly() {
        // A succeeds on attempt 1, B transiently fails then succeeds,
        // C is permanently rejected.
        let store = Arc::new(InMemoryStore::new(vec![
            due_record(1),
            due_record(2),
            due_record(3),
        ]));
        let scripts = HashMap::from([
            (
                "user2@example.com".to_string(),
                vec![SendResult::transient("hiccup"), SendResult::Delivered],
            ),
            (
                "user3@example.com".to_string(),
                vec![SendResult::permanent("blocked")],
            ),
        ]);
        let mailer = Arc::new(RoutedMailer::new(scripts));

        let outcome = job(Arc::clone(&store), mailer, DispatchConfig::default())
            .run(now())
            .await
            .unwrap();

        assert_eq!(outcome.processed, 2);
        assert_eq!(outcome.failed, 1);

        let a = store.get(1);
        let b = store.get(2);
        let c = store.get(3);
        assert!(a.reminded && a.remind_at.is_none());
        assert!(b.reminded && b.remind_at.is_none());
        assert!(!c.reminded && c.remind_at.is_some());

        // One fulfillment mutation per successful record, none for C.
        assert_eq!(store.mark_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn second_run_processes_nothing() {
        let store = Arc::new(InMemoryStore::new(vec![due_record(1), due_record(2)]));
        let mailer = Arc::new(RoutedMailer::always_delivers());

        let first = job(Arc::clone(&store), Arc::clone(&mailer) as Arc<dyn Mailer>, DispatchConfig::default())
            .run(now())
            .await
            .unwrap();
        assert_eq!(first.processed, 2);

        let second = job(Arc::clone(&store), mailer, DispatchConfig::default())
            .run(now())
            .await
            .unwrap();
        assert_eq!(second.processed, 0);
        assert_eq!(second.failed, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn in_flight_sends_never_exceed_concurrency_limit() {
        let store = Arc::new(InMemoryStore::new((1..=20).map(due_record).collect()));
        let probe = Arc::new(ConcurrencyProbe::new());

        let outcome = job(Arc::clone(&store), Arc::clone(&probe) as Arc<dyn Mailer>, DispatchConfig::default())
            .run(now())
            .await
            .unwrap();

        assert_eq!(outcome.processed, 20);
        assert!(probe.max_in_flight.load(Ordering::SeqCst) <= 5);
        // The bound should actually be reached with 20 queued sends.
        assert_eq!(probe.max_in_flight.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn paging_attempts_each_due_record_exactly_once() {
        // Five due records, page size two. Even-id recipients fail; the
        // offset must advance past them so no record is attempted twice.
        let store = Arc::new(InMemoryStore::new((1..=5).map(due_record).collect()));
        let scripts = HashMap::from([
            (
                "user2@example.com".to_string(),
                vec![SendResult::transient("down")],
            ),
            (
                "user4@example.com".to_string(),
                vec![SendResult::transient("down")],
            ),
        ]);
        let mailer = Arc::new(RoutedMailer::new(scripts));

        let config = DispatchConfig {
            batch_size: 2,
            concurrency: 5,
            retry: RetryPolicy {
                max_attempts: 1,
                ..RetryPolicy::default()
            },
        };

        let outcome = job(Arc::clone(&store), Arc::clone(&mailer) as Arc<dyn Mailer>, config)
            .run(now())
            .await
            .unwrap();

        assert_eq!(outcome.processed, 3);
        assert_eq!(outcome.failed, 2);
        // One send attempt per due record across all pages.
        assert_eq!(mailer.calls(), 5);
        assert_eq!(
            *store.find_due_calls.lock().unwrap(),
            vec![(0, 2), (1, 2), (2, 2)]
        );
    }

    #[tokio::test]
    async fn fetch_error_aborts_the_invocation() {
        let mut store = InMemoryStore::new(vec![due_record(1)]);
        store.fail_fetch = true;
        let mailer = Arc::new(RoutedMailer::always_delivers());

        let result = job(Arc::new(store), mailer, DispatchConfig::default())
            .run(now())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn no_due_records_yields_empty_outcome() {
        let mut record = due_record(1);
        record.remind_at = Some(now() + chrono::Duration::hours(2));
        let store = Arc::new(InMemoryStore::new(vec![record]));
        let mailer = Arc::new(RoutedMailer::always_delivers());

        let outcome = job(Arc::clone(&store), mailer, DispatchConfig::default())
            .run(now())
            .await
            .unwrap();

        assert_eq!(outcome.processed, 0);
        assert_eq!(outcome.failed, 0);
        assert!(outcome.results.is_empty());
        assert_eq!(store.find_due_calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn fulfilled_records_are_excluded_from_selection() {
        let mut fulfilled = due_record(1);
        fulfilled.reminded = true;
        fulfilled.remind_at = None;
        let store = Arc::new(InMemoryStore::new(vec![fulfilled, due_record(2)]));
        let mailer = Arc::new(RoutedMailer::always_delivers());

        let outcome = job(Arc::clone(&store), Arc::clone(&mailer) as Arc<dyn Mailer>, DispatchConfig::default())
            .run(now())
            .await
            .unwrap();

        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.results[0].id, 2);
    }
}
