//! End-to-end merge over a SQLite store database
//!
//! Exercises the whole pipeline against the on-disk wire formats: receiver
//! JSON triples, hierarchy metadata JSON, and derived partial graphs.

use tempfile::TempDir;

use stitcher::store::sqlite::SqliteStores;
use stitcher::{CallKind, Coordinate, InvocationSite, Merger};

fn site(kind: CallKind, receiver: &str) -> InvocationSite {
    InvocationSite {
        source_line: 12,
        kind,
        receiver_type: receiver.to_string(),
    }
}

/// Build a store database with a focal artifact calling one external
/// method that two dependency subclasses override.
fn build_fixture(stores: &SqliteStores) {
    let app = Coordinate::parse("g:app:1.0").unwrap();
    let lib = Coordinate::parse("g:lib:2.0").unwrap();

    let app_pv = stores.insert_package_version(&app).unwrap();
    let lib_pv = stores.insert_package_version(&lib).unwrap();

    let app_module = stores.insert_module(app_pv, "/app/Main", &[], &[]).unwrap();
    stores
        .insert_callable(10, app_module, "/app/Main.run()%2Fns%2FV", true)
        .unwrap();
    stores
        .insert_callable(90, app_module, "/ns/Animal.speak()%2Fns%2FV", false)
        .unwrap();
    stores
        .insert_edge(10, 90, &[site(CallKind::Virtual, "/ns/Animal")])
        .unwrap();

    let animal = stores
        .insert_module(lib_pv, "/ns/Animal", &[], &[])
        .unwrap();
    let dog = stores
        .insert_module(lib_pv, "/ns/Dog", &["/ns/Animal"], &[])
        .unwrap();
    let cat = stores
        .insert_module(lib_pv, "/ns/Cat", &["/ns/Animal"], &[])
        .unwrap();
    stores
        .insert_callable(70, animal, "/ns/Animal.speak()%2Fns%2FV", true)
        .unwrap();
    stores
        .insert_callable(71, dog, "/ns/Dog.speak()%2Fns%2FV", true)
        .unwrap();
    stores
        .insert_callable(72, cat, "/ns/Cat.speak()%2Fns%2FV", true)
        .unwrap();
}

#[test]
fn test_merge_over_sqlite_database() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("stores.db");

    let stores = SqliteStores::open(&db_path).unwrap();
    build_fixture(&stores);

    let outcome = Merger::new(&stores, &stores, &stores)
        .merge("g:app:1.0", &["g:lib:2.0".to_string()])
        .unwrap();

    assert_eq!(outcome.graph.successors(10), &[70, 71, 72]);
    assert!(outcome.report.is_clean());
}

#[test]
fn test_merge_twice_from_same_database_is_identical() {
    let stores = SqliteStores::open_in_memory().unwrap();
    build_fixture(&stores);
    let merger = Merger::new(&stores, &stores, &stores);
    let deps = vec!["g:lib:2.0".to_string()];

    let first = merger.merge("g:app:1.0", &deps).unwrap();
    let second = merger.merge("g:app:1.0", &deps).unwrap();

    assert_eq!(
        serde_json::to_string(&first.graph.to_export()).unwrap(),
        serde_json::to_string(&second.graph.to_export()).unwrap()
    );
}

#[test]
fn test_edge_metadata_survives_storage() {
    let stores = SqliteStores::open_in_memory().unwrap();
    build_fixture(&stores);

    use stitcher::EdgeMetadataStore;
    let rows = stores.edges(&[(10, 90)]).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].sites.len(), 1);
    assert_eq!(rows[0].sites[0].kind, CallKind::Virtual);
    assert_eq!(rows[0].sites[0].source_line, 12);
    assert_eq!(rows[0].sites[0].receiver_type, "/ns/Animal");
}

#[test]
fn test_status_counts() {
    let stores = SqliteStores::open_in_memory().unwrap();
    build_fixture(&stores);

    assert_eq!(stores.count("packages").unwrap(), 2);
    assert_eq!(stores.count("package_versions").unwrap(), 2);
    assert_eq!(stores.count("modules").unwrap(), 4);
    assert_eq!(stores.count("callables").unwrap(), 5);
    assert_eq!(stores.count("edges").unwrap(), 1);
}
