//! Integration tests for rumormill-store
//!
//! These tests verify the full save/load cycle for rumors, the query filters
//! and optimistic versioning.

use rumormill_domain::{
    Rumor, RumorCategory, RumorQuery, RumorSeverity, RumorStatus, RumorStore,
};
use rumormill_store::{SqliteStore, StoreError};
use std::collections::BTreeMap;

fn rumor(originator: &str, content: &str, categories: Vec<RumorCategory>, severity: RumorSeverity) -> Rumor {
    Rumor::new(originator, content, categories, severity, 0.6, 1_000)
}

#[test]
fn test_store_initialization() {
    let store = SqliteStore::new(":memory:");
    assert!(store.is_ok(), "Store should initialize successfully");
}

#[test]
fn test_round_trip_preserves_rumor() {
    let mut store = SqliteStore::in_memory().unwrap();

    let mut original = rumor(
        "npc_1",
        "The king is ill",
        vec![RumorCategory::Political, RumorCategory::Personal],
        RumorSeverity::Major,
    );
    let root = original.variants()[0].id;
    let mut metadata = BTreeMap::new();
    metadata.insert("distortion".to_string(), "0.5".to_string());
    let child = original
        .add_variant("The king is dying", "npc_2", root, metadata, 1_010)
        .unwrap();
    original.update_spread_record("npc_2", child, 0.55, Some("npc_1".to_string()), 1_010);

    store.save_rumor(&mut original).unwrap();

    let loaded = store.get_rumor(original.id()).unwrap().expect("rumor should exist");
    assert_eq!(loaded.id(), original.id());
    assert_eq!(loaded.original_content(), "The king is ill");
    assert_eq!(loaded.categories(), original.categories());
    assert_eq!(loaded.severity, RumorSeverity::Major);
    assert_eq!(loaded.truth_value(), original.truth_value());
    assert_eq!(loaded.variants().len(), 2);
    assert_eq!(loaded.spread_count(), 2);
    assert_eq!(loaded.version, 1);

    let loaded_child = loaded.variant_by_id(child).unwrap();
    assert_eq!(loaded_child.parent_variant_id, Some(root));
    assert_eq!(loaded_child.mutation_metadata.get("distortion").map(String::as_str), Some("0.5"));

    let record = loaded.spread_for_entity("npc_2").unwrap();
    assert_eq!(record.believability(), 0.55);
    assert_eq!(record.heard_from_entity_id.as_deref(), Some("npc_1"));
    assert!(loaded.validate().is_ok());
}

#[test]
fn test_get_missing_rumor() {
    let store = SqliteStore::in_memory().unwrap();
    let missing = store.get_rumor(rumormill_domain::RumorId::new()).unwrap();
    assert!(missing.is_none());
}

#[test]
fn test_update_bumps_version() {
    let mut store = SqliteStore::in_memory().unwrap();
    let mut r = rumor("npc_1", "Wolves in the forest", vec![], RumorSeverity::Moderate);
    store.save_rumor(&mut r).unwrap();

    let variant = r.variants()[0].id;
    r.set_believability_for_entity("npc_3", variant, 0.4);
    r.mark_expired();
    store.save_rumor(&mut r).unwrap();
    assert_eq!(r.version, 2);

    let loaded = store.get_rumor(r.id()).unwrap().unwrap();
    assert_eq!(loaded.version, 2);
    assert_eq!(loaded.status, RumorStatus::Expired);
    assert_eq!(loaded.spread_count(), 2);
}

#[test]
fn test_stale_write_is_rejected() {
    let mut store = SqliteStore::in_memory().unwrap();
    let mut r = rumor("npc_1", "The bridge is out", vec![], RumorSeverity::Minor);
    store.save_rumor(&mut r).unwrap();

    let mut first = store.get_rumor(r.id()).unwrap().unwrap();
    let mut second = store.get_rumor(r.id()).unwrap().unwrap();
    let variant = first.variants()[0].id;

    first.set_believability_for_entity("npc_2", variant, 0.5);
    store.save_rumor(&mut first).unwrap();

    second.set_believability_for_entity("npc_3", variant, 0.5);
    let err = store.save_rumor(&mut second).unwrap_err();
    assert!(matches!(err, StoreError::VersionConflict { expected: 1, found: 2, .. }));

    // The losing write left nothing behind
    let stored = store.get_rumor(r.id()).unwrap().unwrap();
    assert!(stored.entity_knows_rumor("npc_2"));
    assert!(!stored.entity_knows_rumor("npc_3"));
    assert_eq!(second.version, 1);
}

#[test]
fn test_inserting_twice_conflicts() {
    let mut store = SqliteStore::in_memory().unwrap();
    let mut r = rumor("npc_1", "Gold in the hills", vec![], RumorSeverity::Minor);
    let mut copy = r.clone();

    store.save_rumor(&mut r).unwrap();
    let err = store.save_rumor(&mut copy).unwrap_err();
    assert!(err.is_conflict());
}

#[test]
fn test_update_of_deleted_rumor() {
    let mut store = SqliteStore::in_memory().unwrap();
    let mut r = rumor("npc_1", "A ghost ship", vec![], RumorSeverity::Trivial);
    store.save_rumor(&mut r).unwrap();

    assert!(store.delete_rumor(r.id()).unwrap());
    assert!(!store.delete_rumor(r.id()).unwrap());

    let err = store.save_rumor(&mut r).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    assert_eq!(store.rumor_count().unwrap(), 0);
}

#[test]
fn test_get_all_and_by_entity() {
    let mut store = SqliteStore::in_memory().unwrap();

    let mut a = rumor("npc_1", "First", vec![], RumorSeverity::Minor);
    let mut b = rumor("npc_2", "Second", vec![], RumorSeverity::Minor);
    let variant = a.variants()[0].id;
    a.set_believability_for_entity("npc_3", variant, 0.5);

    store.save_rumor(&mut a).unwrap();
    store.save_rumor(&mut b).unwrap();

    assert_eq!(store.get_all_rumors().unwrap().len(), 2);

    let known_by_3 = store.get_rumors_by_entity("npc_3").unwrap();
    assert_eq!(known_by_3.len(), 1);
    assert_eq!(known_by_3[0].id(), a.id());

    assert!(store.get_rumors_by_entity("npc_404").unwrap().is_empty());
}

#[test]
fn test_filters() {
    let mut store = SqliteStore::in_memory().unwrap();

    let mut war = rumor("npc_1", "The Northern army marches", vec![RumorCategory::Military], RumorSeverity::Critical);
    let mut baker = rumor("npc_2", "The baker waters the flour", vec![RumorCategory::Gossip], RumorSeverity::Trivial);
    let mut tax = rumor(
        "npc_1",
        "A new tax on the ARMY's suppliers",
        vec![RumorCategory::Economic, RumorCategory::Military],
        RumorSeverity::Moderate,
    );
    let variant = tax.variants()[0].id;
    tax.set_believability_for_entity("npc_5", variant, 0.3);

    for r in [&mut war, &mut baker, &mut tax] {
        store.save_rumor(r).unwrap();
    }

    let military = store
        .get_rumors_by_filters(&RumorQuery {
            categories: vec![RumorCategory::Military],
            ..Default::default()
        })
        .unwrap();
    assert_eq!(military.len(), 2);

    let severe = store
        .get_rumors_by_filters(&RumorQuery {
            min_severity: Some(RumorSeverity::Moderate),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(severe.len(), 2);

    let text = store
        .get_rumors_by_filters(&RumorQuery {
            text: Some("army".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(text.len(), 2);

    let believed = store
        .get_rumors_by_filters(&RumorQuery {
            entity_id: Some("npc_5".to_string()),
            min_believability: Some(0.5),
            ..Default::default()
        })
        .unwrap();
    assert!(believed.is_empty());

    let known = store
        .get_rumors_by_filters(&RumorQuery {
            entity_id: Some("npc_5".to_string()),
            min_believability: Some(0.2),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(known.len(), 1);

    let limited = store
        .get_rumors_by_filters(&RumorQuery {
            limit: Some(1),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(limited.len(), 1);
}

#[test]
fn test_persistence_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rumors.db");

    let id = {
        let mut store = SqliteStore::new(&path).unwrap();
        let mut r = rumor("npc_1", "The well is poisoned", vec![RumorCategory::Social], RumorSeverity::Major);
        store.save_rumor(&mut r).unwrap();
        r.id()
    };

    let store = SqliteStore::new(&path).unwrap();
    let loaded = store.get_rumor(id).unwrap().unwrap();
    assert_eq!(loaded.original_content(), "The well is poisoned");
    assert_eq!(loaded.categories(), &[RumorCategory::Social]);
}

#[test]
fn test_listings_skip_corrupt_rumor() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rumors.db");

    let mut store = SqliteStore::new(&path).unwrap();
    let mut healthy = rumor("npc_1", "The mill burned", vec![], RumorSeverity::Minor);
    let mut broken = rumor("npc_1", "The mill is haunted", vec![], RumorSeverity::Minor);
    store.save_rumor(&mut healthy).unwrap();
    store.save_rumor(&mut broken).unwrap();

    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute(
        "UPDATE variants SET mutation_metadata = 'not json' WHERE rumor_id = ?1",
        rusqlite::params![&broken.id().to_bytes()[..]],
    )
    .unwrap();
    drop(conn);

    let all = store.get_all_rumors().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id(), healthy.id());

    let known = store.get_rumors_by_entity("npc_1").unwrap();
    assert_eq!(known.len(), 1);
    assert_eq!(store.get_rumors_by_filters(&RumorQuery::default()).unwrap().len(), 1);

    assert!(matches!(store.get_rumor(broken.id()), Err(StoreError::Serialization(_))));
    assert!(store.get_rumor(healthy.id()).unwrap().is_some());

    let ids = store.get_rumor_ids().unwrap();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&broken.id()));
}
