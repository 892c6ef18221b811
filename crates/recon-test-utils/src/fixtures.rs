use chrono::{Duration, TimeZone, Utc};
use recon_engine::Decision;
use recon_model::{ExternalIdentity, NameHistory, Timestamp, UserRecord, UserStatus};
use recon_store::{MemoryUserStore, StaticUserSource};

/// Fixed reference instant, 2023-11-14T22:13:20Z
pub fn t0() -> Timestamp {
    Utc.timestamp_opt(1_700_000_000, 0)
        .single()
        .unwrap_or_default()
}

/// `t0() + secs`
pub fn t(secs: i64) -> Timestamp {
    t0() + Duration::seconds(secs)
}

/// One `(external, stored)` pair with the branch it must take
#[derive(Debug, Clone)]
pub struct Fixture {
    pub label: &'static str,
    pub lookup_key: String,
    pub external: ExternalIdentity,
    pub stored: Option<UserRecord>,
    pub expected: Decision,
}

impl Fixture {
    fn new(
        label: &'static str,
        external_name: &str,
        stored: Option<UserRecord>,
        expected: Decision,
    ) -> Self {
        let id = format!("EXTERNAL#{label}");
        Self {
            label,
            lookup_key: label.to_string(),
            external: ExternalIdentity::new(id, external_name),
            stored,
            expected,
        }
    }
}

fn record(label: &str, name: &str, status: UserStatus, history: &[(&str, i64)]) -> UserRecord {
    let history: NameHistory = history.iter().map(|(n, secs)| ((*n).to_string(), t(*secs))).collect();
    UserRecord::create(format!("EXTERNAL#{label}"), name, t0())
        .with_status(status)
        .with_history(history)
}

/// Every branch of the decision, including the locked-and-drifted overlap
///
/// Each fixture uses its own identity, so the whole table can share one store.
pub fn fixture_table() -> Vec<Fixture> {
    use UserStatus::{Active, Locked};

    vec![
        Fixture::new("absent", "Alice", None, Decision::Insert),
        Fixture::new(
            "unchanged",
            "Alice",
            Some(record("unchanged", "Alice", Active, &[("Alice", 0)])),
            Decision::Unchanged,
        ),
        Fixture::new(
            "renamed",
            "Bob",
            Some(record("renamed", "Alice", Active, &[("Alice", 0)])),
            Decision::Rename,
        ),
        Fixture::new(
            "reverted",
            "Alice",
            Some(record("reverted", "Bob", Active, &[("Alice", 0), ("Bob", 60)])),
            Decision::Rename,
        ),
        Fixture::new(
            "long-history",
            "Dave",
            Some(record(
                "long-history",
                "Carol",
                Active,
                &[("Alice", 0), ("Bob", 60), ("Carol", 120)],
            )),
            Decision::Rename,
        ),
        Fixture::new(
            "locked-unchanged",
            "Alice",
            Some(record("locked-unchanged", "Alice", Locked, &[("Alice", 0)])),
            Decision::Locked,
        ),
        Fixture::new(
            "locked-drifted",
            "Zoe",
            Some(record("locked-drifted", "Alice", Locked, &[("Alice", 0)])),
            Decision::Locked,
        ),
    ]
}

/// Source answering every fixture's lookup key
pub fn source_for(fixtures: &[Fixture]) -> StaticUserSource {
    let source = StaticUserSource::new();
    for fixture in fixtures {
        source.set(fixture.lookup_key.clone(), fixture.external.clone());
    }
    source
}

/// Store holding every fixture's stored record
pub fn seeded_store(fixtures: &[Fixture]) -> MemoryUserStore {
    MemoryUserStore::from_records(fixtures.iter().filter_map(|f| f.stored.clone()))
}
