//! Dispatcher Composition Tests
//!
//! Tests for work selection driven through a full run:
//! - Count limits stop a run after exactly N objects
//! - Time limits stop a run at the first boundary past the deadline
//! - Container scopes check every object beneath a handle
//! - Continuous mode always picks the least recently checked object

use std::sync::Arc;

use chrono::{Duration, Utc};
use fixity::checker::{
    CatalogObject, Clock, ContainerEntry, ContainerKind, CountLimit, Digest, DigestError,
    DigestSource, Dispatcher, FixityChecker, ManualClock, MemoryCatalog, MemoryCollector,
    MemoryLedger, ObjectId, OldestPending, OutcomeCode, RunController, ScopedResolver, TimeLimit,
};

// =============================================================================
// Test Utilities
// =============================================================================

/// Every object matches "aa"; each computation takes one simulated minute.
#[derive(Debug)]
struct SlowDigests {
    clock: Arc<ManualClock>,
}

impl DigestSource for SlowDigests {
    fn compute_digest(&self, _id: &ObjectId) -> Result<Digest, DigestError> {
        self.clock.advance(Duration::minutes(1));
        Ok(Digest {
            value: "aa".to_string(),
            algorithm: "SHA-256".to_string(),
        })
    }
}

fn object(id: &str) -> CatalogObject {
    CatalogObject {
        id: ObjectId::new(id).unwrap(),
        deleted: false,
        digest: Some("aa".to_string()),
        algorithm: None,
    }
}

fn setup(catalog: MemoryCatalog) -> (RunController, Arc<MemoryLedger>, Arc<ManualClock>) {
    let ledger = Arc::new(MemoryLedger::new());
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let checker = FixityChecker::new(
        ledger.clone(),
        Arc::new(catalog),
        Arc::new(SlowDigests { clock: clock.clone() }),
        clock.clone(),
    );
    (RunController::new(checker, "SHA-256"), ledger, clock)
}

fn catalog_of(n: usize) -> MemoryCatalog {
    let mut catalog = MemoryCatalog::new();
    for i in 0..n {
        catalog.add_object(object(&format!("obj-{:03}", i)));
    }
    catalog
}

// =============================================================================
// Limits
// =============================================================================

/// 100 pending objects, count limit 3: exactly 3 checks.
#[test]
fn test_count_limit_checks_exactly_n() {
    let (controller, ledger, clock) = setup(catalog_of(100));
    let mut dispatcher = CountLimit::new(OldestPending::once(ledger, clock.now()), 3);
    let mut collector = MemoryCollector::new();

    let summary = controller.run(&mut dispatcher, &mut collector, true).unwrap();

    assert_eq!(summary.checked, 3);
    assert_eq!(collector.len(), 3);
}

/// Ten-minute budget, one minute per check: the run stops after ten checks.
#[test]
fn test_time_limit_stops_run() {
    let (controller, ledger, clock) = setup(catalog_of(100));
    let mut dispatcher = TimeLimit::from_now(
        OldestPending::once(ledger, clock.now()),
        Duration::minutes(10),
        clock.clone(),
    );
    let mut collector = MemoryCollector::new();

    let summary = controller.run(&mut dispatcher, &mut collector, false).unwrap();

    assert_eq!(summary.checked, 10);
    assert_eq!(summary.count(OutcomeCode::DigestMatch), 10);
    // matches are not reported without verbose
    assert!(collector.is_empty());
}

/// Whichever limit is hit first ends the run.
#[test]
fn test_count_and_time_limits_compose() {
    let (controller, ledger, clock) = setup(catalog_of(100));
    let timed = TimeLimit::from_now(
        OldestPending::continuous(ledger),
        Duration::minutes(30),
        clock.clone(),
    );
    let mut dispatcher: Box<dyn Dispatcher> = Box::new(CountLimit::new(timed, 7));
    let mut collector = MemoryCollector::new();

    let summary = controller
        .run(dispatcher.as_mut(), &mut collector, false)
        .unwrap();

    assert_eq!(summary.checked, 7);
}

// =============================================================================
// Scopes
// =============================================================================

/// A collection handle covers the objects of its items, each once.
#[test]
fn test_container_scope_checks_members() {
    let mut catalog = catalog_of(5);
    catalog.add_container(ContainerEntry {
        handle: "10/1".into(),
        kind: ContainerKind::Item,
        objects: vec![
            ObjectId::new("obj-000").unwrap(),
            ObjectId::new("obj-001").unwrap(),
        ],
        children: vec![],
    });
    catalog.add_container(ContainerEntry {
        handle: "10/2".into(),
        kind: ContainerKind::Item,
        objects: vec![
            ObjectId::new("obj-001").unwrap(),
            ObjectId::new("obj-002").unwrap(),
        ],
        children: vec![],
    });
    catalog.add_container(ContainerEntry {
        handle: "10/100".into(),
        kind: ContainerKind::Collection,
        objects: vec![],
        children: vec!["10/1".into(), "10/2".into()],
    });

    let mut dispatcher = ScopedResolver::new(&catalog, "10/100").unwrap();
    assert_eq!(dispatcher.remaining(), 3);

    let (controller, _, _) = setup(catalog);
    let mut collector = MemoryCollector::new();
    let summary = controller.run(&mut dispatcher, &mut collector, true).unwrap();

    assert_eq!(summary.checked, 3);
    let mut checked: Vec<&str> = collector
        .results()
        .iter()
        .map(|r| r.object_id().as_str())
        .collect();
    checked.sort();
    assert_eq!(checked, vec!["obj-000", "obj-001", "obj-002"]);
}

// =============================================================================
// Continuous Selection
// =============================================================================

/// Continuous mode cycles round-robin through pending objects.
#[test]
fn test_continuous_mode_cycles_oldest_first() {
    let (controller, ledger, _) = setup(catalog_of(3));
    let mut dispatcher = CountLimit::new(OldestPending::continuous(ledger), 6);
    let mut collector = MemoryCollector::new();

    controller.run(&mut dispatcher, &mut collector, true).unwrap();

    let order: Vec<&str> = collector
        .results()
        .iter()
        .map(|r| r.object_id().as_str())
        .collect();
    assert_eq!(
        order,
        vec!["obj-000", "obj-001", "obj-002", "obj-000", "obj-001", "obj-002"]
    );
}
