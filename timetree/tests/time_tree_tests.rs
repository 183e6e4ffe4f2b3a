// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! End-to-end behaviour of single-instant and range resolution

#[path = "testutils/mod.rs"]
mod testutils;

use testutils::{day, millis, TreeFixture};
use timetree::tree::ROOT_LABEL;
use timetree::{
    ErrorKind, Resolution, RootPolicy, RootSelection, TimeTreeError, TimeZoneId, TreeRoot, Value, VertexId,
};

fn utc() -> TimeZoneId {
    TimeZoneId::utc()
}

#[test]
fn test_first_request_builds_full_path() {
    let fixture = TreeFixture::new();

    let node = fixture
        .tree
        .resolve_single(TreeRoot::Default, day(2013, 5, 4), Resolution::Day, &utc())
        .unwrap();
    assert_eq!(node, VertexId(3));

    let root = fixture.default_root().unwrap();
    assert_eq!(root, VertexId(0));

    let years = fixture.child_ids(root);
    assert_eq!(fixture.child_values(root), vec![2013]);
    assert_eq!(fixture.first(root), Some(years[0]));
    assert_eq!(fixture.last(root), Some(years[0]));

    let months = fixture.child_ids(years[0]);
    assert_eq!(fixture.child_values(years[0]), vec![5]);
    assert_eq!(fixture.first(years[0]), fixture.last(years[0]));

    assert_eq!(fixture.child_ids(months[0]), vec![node]);
    assert_eq!(fixture.first(months[0]), Some(node));
    assert_eq!(fixture.last(months[0]), Some(node));
    assert!(fixture.has_label(node, "Day"));
    assert_eq!(fixture.value_of(node), 4);

    fixture.assert_invariants();
}

#[test]
fn test_range_creates_consecutive_days() {
    let fixture = TreeFixture::new();

    let nodes = fixture
        .tree
        .resolve_range(TreeRoot::Default, day(2013, 5, 4), day(2013, 5, 7), Resolution::Day, &utc())
        .unwrap();
    assert_eq!(nodes, vec![VertexId(3), VertexId(4), VertexId(5), VertexId(6)]);

    let root = fixture.default_root().unwrap();
    let month = fixture.child_ids(fixture.child_ids(root)[0])[0];
    assert_eq!(fixture.child_values(month), vec![4, 5, 6, 7]);
    assert_eq!(fixture.first(month), Some(nodes[0]));
    assert_eq!(fixture.last(month), Some(nodes[3]));
    for pair in nodes.windows(2) {
        assert_eq!(fixture.next(pair[0]), Some(pair[1]));
    }
    assert_eq!(fixture.next(nodes[3]), None);

    fixture.assert_invariants();
}

#[test]
fn test_range_across_month_boundary_matches_single_lookups() {
    let fixture = TreeFixture::new();

    let nodes = fixture
        .tree
        .resolve_range(TreeRoot::Default, day(2013, 1, 30), day(2013, 2, 2), Resolution::Day, &utc())
        .unwrap();
    assert_eq!(nodes.len(), 4);
    assert_eq!(fixture.path_of(nodes[1]), vec![2013, 1, 31]);
    assert_eq!(fixture.path_of(nodes[2]), vec![2013, 2, 1]);

    let feb_first = fixture
        .tree
        .resolve_single(TreeRoot::Default, millis(2013, 2, 1, 17, 0, 0, 0), Resolution::Day, &utc())
        .unwrap();
    assert_eq!(feb_first, nodes[2]);

    let root = fixture.default_root().unwrap();
    let year = fixture.child_ids(root)[0];
    assert_eq!(fixture.child_values(year), vec![1, 2]);
    fixture.assert_invariants();
}

#[test]
fn test_range_fills_gaps_around_existing_nodes() {
    let fixture = TreeFixture::new();
    let tree = &fixture.tree;

    let seventh = tree
        .resolve_single(TreeRoot::Default, day(2013, 5, 7), Resolution::Day, &utc())
        .unwrap();
    let fourth = tree
        .resolve_single(TreeRoot::Default, day(2013, 5, 4), Resolution::Day, &utc())
        .unwrap();

    let nodes = tree
        .resolve_range(TreeRoot::Default, day(2013, 5, 3), day(2013, 5, 8), Resolution::Day, &utc())
        .unwrap();
    assert_eq!(nodes.len(), 6);
    assert_eq!(nodes[1], fourth);
    assert_eq!(nodes[4], seventh);
    for pair in nodes.windows(2) {
        assert_eq!(fixture.next(pair[0]), Some(pair[1]));
    }
    fixture.assert_invariants();
}

#[test]
fn test_resolution_is_idempotent() {
    let fixture = TreeFixture::new();
    let instant = millis(2013, 5, 4, 10, 30, 0, 0);

    let first = fixture
        .tree
        .resolve_single(TreeRoot::Default, instant, Resolution::Hour, &utc())
        .unwrap();
    let vertices = fixture.graph.vertex_count();
    let edges = fixture.graph.edge_count();

    let second = fixture
        .tree
        .resolve_single(TreeRoot::Default, instant + 1000, Resolution::Hour, &utc())
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(fixture.graph.vertex_count(), vertices);
    assert_eq!(fixture.graph.edge_count(), edges);
}

#[test]
fn test_millisecond_path_in_offset_zone() {
    let fixture = TreeFixture::new();
    let zone: TimeZoneId = "GMT+1".parse().unwrap();

    let node = fixture
        .tree
        .resolve_single(
            TreeRoot::Default,
            millis(2014, 4, 5, 13, 56, 22, 123),
            Resolution::Millisecond,
            &zone,
        )
        .unwrap();
    assert!(fixture.has_label(node, "Millisecond"));
    assert_eq!(fixture.path_of(node), vec![2014, 4, 5, 14, 56, 22, 123]);
}

#[test]
fn test_named_zones_shift_the_day() {
    let fixture = TreeFixture::new();

    let pst: TimeZoneId = "PST".parse().unwrap();
    let node = fixture
        .tree
        .resolve_single(TreeRoot::Default, 1_414_264_162_000, Resolution::Minute, &pst)
        .unwrap();
    assert_eq!(fixture.path_of(node), vec![2014, 10, 25, 12, 9]);

    let la: TimeZoneId = "America/Los_Angeles".parse().unwrap();
    let instant = millis(2014, 10, 25, 6, 36, 0, 0);
    let local = fixture
        .tree
        .resolve_single(TreeRoot::Default, instant, Resolution::Minute, &la)
        .unwrap();
    assert_eq!(fixture.path_of(local), vec![2014, 10, 24, 23, 36]);

    let in_utc = fixture
        .tree
        .resolve_single(TreeRoot::Default, instant, Resolution::Day, &utc())
        .unwrap();
    let in_la = fixture
        .tree
        .resolve_single(TreeRoot::Default, instant, Resolution::Day, &la)
        .unwrap();
    assert_ne!(in_utc, in_la);
    fixture.assert_invariants();
}

#[test]
fn test_dates_before_epoch() {
    let fixture = TreeFixture::new();
    let node = fixture
        .tree
        .resolve_single(TreeRoot::Default, day(1940, 2, 5), Resolution::Day, &utc())
        .unwrap();
    assert_eq!(fixture.path_of(node), vec![1940, 2, 5]);

    // years before and after the epoch stay ordered under the root
    fixture
        .tree
        .resolve_single(TreeRoot::Default, day(2013, 5, 4), Resolution::Day, &utc())
        .unwrap();
    fixture
        .tree
        .resolve_single(TreeRoot::Default, day(1969, 12, 31), Resolution::Day, &utc())
        .unwrap();
    let root = fixture.default_root().unwrap();
    assert_eq!(fixture.child_values(root), vec![1940, 1969, 2013]);
    fixture.assert_invariants();
}

#[test]
fn test_deleted_default_root_is_recreated() {
    let fixture = TreeFixture::new();
    let first = fixture
        .tree
        .resolve_single(TreeRoot::Default, day(2013, 5, 4), Resolution::Day, &utc())
        .unwrap();
    assert_eq!(first, VertexId(3));

    fixture.with_tx(|tx| {
        for id in tx.vertex_ids().unwrap() {
            tx.delete_vertex(id).unwrap();
        }
    });
    assert_eq!(fixture.graph.vertex_count(), 0);

    let again = fixture
        .tree
        .resolve_single(TreeRoot::Default, day(2013, 5, 4), Resolution::Day, &utc())
        .unwrap();
    assert_eq!(again, VertexId(7));
    assert_eq!(fixture.path_of(again), vec![2013, 5, 4]);
    assert_eq!(fixture.count_label(ROOT_LABEL), 1);
}

#[test]
fn test_deleted_custom_root_is_reported() {
    let fixture = TreeFixture::new();
    let custom = fixture.create_vertex(&["Calendar"], &[]);

    let node = fixture
        .tree
        .resolve_single(TreeRoot::Custom(custom), day(2013, 5, 4), Resolution::Day, &utc())
        .unwrap();
    assert_eq!(fixture.path_of(node), vec![2013, 5, 4]);

    fixture.delete_vertex(custom);
    let err = fixture
        .tree
        .resolve_single(TreeRoot::Custom(custom), day(2013, 5, 4), Resolution::Day, &utc())
        .unwrap_err();
    assert!(matches!(err, TimeTreeError::RootNotFound(id) if id == custom));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_roots_are_independent() {
    let fixture = TreeFixture::new();
    let custom = fixture.create_vertex(&["Calendar"], &[]);

    let under_custom = fixture
        .tree
        .resolve_single(TreeRoot::Custom(custom), day(2013, 5, 4), Resolution::Day, &utc())
        .unwrap();
    assert_eq!(fixture.default_root(), None);

    let under_default = fixture
        .tree
        .resolve_single(TreeRoot::Default, day(2013, 5, 4), Resolution::Day, &utc())
        .unwrap();
    assert_ne!(under_custom, under_default);
    assert_eq!(fixture.child_values(custom), vec![2013]);
    assert_eq!(fixture.count_label("Year"), 2);
}

#[test]
fn test_find_single_never_creates() {
    let fixture = TreeFixture::new();
    let instant = day(2013, 5, 4);

    let err = fixture
        .tree
        .find_single(TreeRoot::Default, instant, Resolution::Day, &utc())
        .unwrap_err();
    assert!(matches!(err, TimeTreeError::PathNotFound(_)));
    assert_eq!(fixture.graph.vertex_count(), 0);

    let created = fixture
        .tree
        .resolve_single(TreeRoot::Default, instant, Resolution::Day, &utc())
        .unwrap();
    let found = fixture
        .tree
        .find_single(TreeRoot::Default, instant, Resolution::Day, &utc())
        .unwrap();
    assert_eq!(created, found);

    let err = fixture
        .tree
        .find_single(TreeRoot::Default, day(2013, 5, 5), Resolution::Day, &utc())
        .unwrap_err();
    match err {
        TimeTreeError::PathNotFound(missing) => assert_eq!(missing, "2013-05-05"),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_resolve_now_lands_on_today() {
    let fixture = TreeFixture::new();
    let before = chrono::Utc::now().timestamp_millis();
    let node = fixture
        .tree
        .resolve_now(TreeRoot::Default, Resolution::Day, &utc())
        .unwrap();
    let after = chrono::Utc::now().timestamp_millis();

    let candidates = [
        fixture
            .tree
            .find_single(TreeRoot::Default, before, Resolution::Day, &utc())
            .ok(),
        fixture
            .tree
            .find_single(TreeRoot::Default, after, Resolution::Day, &utc())
            .ok(),
    ];
    assert!(candidates.contains(&Some(node)));
}

#[test]
fn test_attach_and_detach_through_facade() {
    let fixture = TreeFixture::new();
    let node = fixture
        .tree
        .resolve_single(TreeRoot::Default, day(2013, 5, 4), Resolution::Day, &utc())
        .unwrap();
    let event = fixture.create_vertex(&["Email"], &[]);

    fixture.tree.attach_entity(event, node, "AT_TIME").unwrap();
    let err = fixture.tree.attach_entity(event, node, "AT_TIME").unwrap_err();
    assert!(matches!(err, TimeTreeError::AttachmentConflict { .. }));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    assert_eq!(fixture.tree.detach_entity(event, "AT_TIME").unwrap(), 1);
    fixture.tree.attach_entity(event, node, "AT_TIME").unwrap();
}

#[test]
fn test_events_in_range() {
    let fixture = TreeFixture::new();
    let tree = &fixture.tree;

    let attach_at = |instant: i64, resolution: Resolution| {
        let node = tree
            .resolve_single(TreeRoot::Default, instant, resolution, &utc())
            .unwrap();
        let event = fixture.create_vertex(&["Email"], &[]);
        tree.attach_entity(event, node, "AT_TIME").unwrap();
        event
    };
    let early = attach_at(day(2013, 5, 1), Resolution::Day);
    let inside = attach_at(day(2013, 5, 4), Resolution::Day);
    let fine = attach_at(millis(2013, 5, 5, 8, 15, 0, 0), Resolution::Minute);
    let late = attach_at(day(2013, 5, 9), Resolution::Day);

    let events = tree
        .events_in_range(TreeRoot::Default, day(2013, 5, 2), day(2013, 5, 7), Resolution::Day, &utc(), None)
        .unwrap();
    let entities: Vec<VertexId> = events.iter().map(|e| e.entity).collect();
    assert_eq!(entities, vec![inside, fine]);
    assert!(!entities.contains(&early));
    assert!(!entities.contains(&late));

    let none = tree
        .events_in_range(
            TreeRoot::Default,
            day(2013, 5, 2),
            day(2013, 5, 7),
            Resolution::Day,
            &utc(),
            Some("CREATED_ON"),
        )
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn test_events_in_range_on_empty_store() {
    let fixture = TreeFixture::new();
    let events = fixture
        .tree
        .events_in_range(TreeRoot::Default, day(2013, 5, 2), day(2013, 5, 7), Resolution::Day, &utc(), None)
        .unwrap();
    assert!(events.is_empty());
    assert_eq!(fixture.graph.vertex_count(), 0);
}

#[test]
fn test_select_root_through_facade() {
    let fixture = TreeFixture::new();
    let custom = fixture.create_vertex(&["Calendar"], &[]);
    let event = fixture.create_vertex(&["Email"], &[("rootId", Value::from(custom.0 as i64))]);

    let policy = RootPolicy {
        custom_root_property: Some("rootId".to_string()),
        dynamic_root: None,
    };
    assert_eq!(
        fixture.tree.select_root(event, &policy).unwrap(),
        RootSelection::Root(custom)
    );

    fixture.delete_vertex(custom);
    assert!(matches!(
        fixture.tree.select_root(event, &policy),
        Err(TimeTreeError::RootNotFound(_))
    ));
}

#[test]
fn test_invalid_inputs() {
    let fixture = TreeFixture::new();
    let err = fixture
        .tree
        .resolve_range(TreeRoot::Default, day(2013, 5, 7), day(2013, 5, 4), Resolution::Day, &utc())
        .unwrap_err();
    assert!(matches!(err, TimeTreeError::InvalidRange(_)));
    assert_eq!(err.kind(), ErrorKind::BadRequest);

    assert!(matches!(
        timetree::calendar::resolve_path(0, "fortnight", "UTC"),
        Err(TimeTreeError::InvalidResolution(_))
    ));
    assert!(matches!(
        timetree::calendar::resolve_path(0, "day", "Mars/Olympus"),
        Err(TimeTreeError::InvalidTimeZone(_))
    ));
    assert!(matches!(
        fixture
            .tree
            .resolve_single(TreeRoot::Default, i64::MAX, Resolution::Day, &utc()),
        Err(TimeTreeError::InvalidInstant(_))
    ));
}
