//! Sequential and workflow drivers must answer byte-for-byte identically

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use recon_driver::conformance::{run_conformance, ROUNDS};
use recon_driver::{build_reconciler, ApiResponse, Collaborators, DriverConfig, DriverKind};
use recon_engine::{decide, reconcile_at};
use recon_model::{ExternalIdentity, HistoryEntry, NameHistory, UserRecord, UserStatus};
use recon_store::{CreateOutcome, MemoryUserStore, StaticUserSource, StoreError, UserStore};
use recon_test_utils::{fixture_table, t, Fixture, ManualClock};
use std::sync::Arc;

#[tokio::test]
async fn fixture_table_conforms() {
    let fixtures = fixture_table();
    let report = run_conformance(&fixtures, &DriverConfig::default()).await.unwrap();

    assert!(report.passed(), "{}", report.generate_text());
    assert_eq!(report.comparisons.len(), fixtures.len() * ROUNDS as usize);
    assert_eq!(report.sequential_store, report.workflow_store);
}

#[tokio::test]
async fn first_round_matches_engine() {
    let fixtures = fixture_table();
    let report = run_conformance(&fixtures, &DriverConfig::default()).await.unwrap();

    for (fixture, comparison) in fixtures.iter().zip(&report.comparisons) {
        let expected = reconcile_at(&fixture.external, fixture.stored.as_ref(), t(3_600)).unwrap();
        let expected = serde_json::to_string(&ApiResponse::ok(&expected.outcome)).unwrap();
        assert_eq!(comparison.sequential, expected, "{}", fixture.label);
    }
}

#[tokio::test]
async fn second_round_is_idempotent() {
    let fixtures = fixture_table();
    let report = run_conformance(&fixtures, &DriverConfig::default()).await.unwrap();

    for comparison in &report.comparisons[fixtures.len()..] {
        let response: ApiResponse = serde_json::from_str(&comparison.workflow).unwrap();
        assert_eq!(response.body["inserted"], false, "{}", comparison.label);
        assert_eq!(response.body["nameChanged"], false, "{}", comparison.label);
    }
}

/// Serialized response of each driver for `lookup_key`, plus its final store
async fn run_both(fixture: &Fixture, lookup_key: &str) -> Vec<(String, String)> {
    let mut runs = Vec::new();
    for kind in DriverKind::ALL {
        let source = StaticUserSource::new().with(fixture.lookup_key.clone(), fixture.external.clone());
        let store = Arc::new(MemoryUserStore::from_records(fixture.stored.clone()));
        let reconciler = build_reconciler(
            kind,
            Collaborators::new(Arc::new(source), store.clone()),
            Arc::new(ManualClock::new(t(90))),
            &DriverConfig::default(),
        )
        .unwrap();

        let response = reconciler.handle(lookup_key).await;
        runs.push((
            serde_json::to_string(&response).unwrap(),
            serde_json::to_string(&store.snapshot()).unwrap(),
        ));
    }
    runs
}

fn fixture(external: ExternalIdentity, stored: Option<UserRecord>) -> Fixture {
    Fixture {
        label: "adhoc",
        lookup_key: "key".to_string(),
        expected: decide(&external, stored.as_ref()),
        external,
        stored,
    }
}

#[tokio::test]
async fn failures_conform() {
    let cases = [
        // unknown lookup key
        (fixture(ExternalIdentity::new("U1", "Alice"), None), "other-key", 400),
        // empty name from upstream
        (fixture(ExternalIdentity::new("U1", ""), None), "key", 400),
    ];

    for (fixture, key, status) in cases {
        let runs = run_both(&fixture, key).await;
        assert_eq!(runs[0], runs[1], "{key}");
        let response: ApiResponse = serde_json::from_str(&runs[0].0).unwrap();
        assert_eq!(response.status_code, status, "{}", runs[0].0);
    }
}

/// Store whose reads always come back with another identity's record
struct ForeignRecord;

#[async_trait]
impl UserStore for ForeignRecord {
    async fn get_by_key(&self, _id: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(Some(UserRecord::create("U2", "Alice", t(0))))
    }

    async fn create_if_absent(&self, _record: UserRecord) -> Result<CreateOutcome, StoreError> {
        Ok(CreateOutcome::AlreadyExists)
    }

    async fn merge_update(
        &self,
        id: &str,
        _name: &str,
        _history_entry: &HistoryEntry,
    ) -> Result<UserRecord, StoreError> {
        Err(StoreError::NotFound { id: id.to_string() })
    }
}

/// Store that never shows a record yet rejects every write as a race
struct AlwaysRaced;

#[async_trait]
impl UserStore for AlwaysRaced {
    async fn get_by_key(&self, _id: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(None)
    }

    async fn create_if_absent(&self, _record: UserRecord) -> Result<CreateOutcome, StoreError> {
        Ok(CreateOutcome::AlreadyExists)
    }

    async fn merge_update(
        &self,
        id: &str,
        _name: &str,
        _history_entry: &HistoryEntry,
    ) -> Result<UserRecord, StoreError> {
        Err(StoreError::NotFound { id: id.to_string() })
    }
}

/// Serialized response of each driver over a caller-supplied store
async fn responses_over(store: Arc<dyn UserStore>, config: &DriverConfig) -> Vec<String> {
    let mut responses = Vec::new();
    for kind in DriverKind::ALL {
        let source = StaticUserSource::new().with("1", ExternalIdentity::new("U1", "Alice"));
        let reconciler = build_reconciler(
            kind,
            Collaborators::new(Arc::new(source), store.clone()),
            Arc::new(ManualClock::new(t(90))),
            config,
        )
        .unwrap();
        responses.push(serde_json::to_string(&reconciler.handle("1").await).unwrap());
    }
    responses
}

#[tokio::test]
async fn record_of_another_identity_is_rejected_alike() {
    let responses = responses_over(Arc::new(ForeignRecord), &DriverConfig::default()).await;

    assert_eq!(responses[0], responses[1]);
    let response: ApiResponse = serde_json::from_str(&responses[0]).unwrap();
    assert_eq!(response.status_code, 400, "{}", responses[0]);
    assert_eq!(response.body["error"], "invalid_input");
}

#[tokio::test]
async fn endless_races_exhaust_the_same_budget() {
    let config = DriverConfig::default().with_max_conflict_retries(10);
    let responses = responses_over(Arc::new(AlwaysRaced), &config).await;

    assert_eq!(responses[0], responses[1]);
    let response: ApiResponse = serde_json::from_str(&responses[0]).unwrap();
    assert_eq!(response.status_code, 409, "{}", responses[0]);
    assert_eq!(response.body["error"], "concurrent_modification");
    assert!(
        response.body["message"].as_str().unwrap().contains("11 conflict(s)"),
        "{}",
        responses[0]
    );
}

fn arb_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["Alice", "Bob", "Carol", "Dave"]).prop_map(str::to_string)
}

prop_compose! {
    fn arb_stored()(
        name in arb_name(),
        locked in any::<bool>(),
        seen in prop::collection::vec((arb_name(), -1_000i64..0), 0..4),
    ) -> UserRecord {
        let history: NameHistory = std::iter::once((name.clone(), t(-2_000)))
            .chain(seen.into_iter().map(|(n, secs)| (n, t(secs))))
            .collect();
        let status = if locked { UserStatus::Locked } else { UserStatus::Active };
        UserRecord::create("U1", name, t(-2_000)).with_status(status).with_history(history)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn drivers_agree_on_any_pair(
        external_name in arb_name(),
        stored in prop::option::of(arb_stored()),
    ) {
        let fixture = fixture(ExternalIdentity::new("U1", external_name), stored);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let runs = runtime.block_on(run_both(&fixture, "key"));

        prop_assert_eq!(&runs[0], &runs[1]);
        let response: ApiResponse = serde_json::from_str(&runs[0].0).unwrap();
        prop_assert_eq!(response.status_code, 200);
        prop_assert_eq!(
            response.body["userLocked"].as_bool(),
            Some(fixture.expected == recon_engine::Decision::Locked)
        );
    }
}
