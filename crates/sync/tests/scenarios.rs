//! End-to-end sync scenarios over the in-memory store.

mod common;

use assert_matches::assert_matches;
use chrono::Duration;
use notesync_core::entity::EntityKind;
use notesync_sync::payload::SyncRequest;
use serde_json::json;

use common::*;

#[tokio::test]
async fn empty_first_sync_returns_empty_lists_and_fresh_cursor() {
    let h = Harness::new().await;

    let out = h.pull(None, t(100)).await;
    let res = out.response;

    assert_eq!(res.new_cursor, t(100));
    assert!(!res.full_resync);
    assert_eq!(res.record_count(), 0);

    let stored = h.store.snapshot().await;
    assert_eq!(stored.accounts[&h.account_id].last_sync_at, Some(t(100)));
}

#[tokio::test]
async fn submitted_category_is_visible_only_to_older_cursors() {
    let h = Harness::new().await;
    let c1 = id();

    h.sync(
        SyncRequest {
            categories: vec![category(c1, "Work", t(0))],
            ..Default::default()
        },
        t(1),
    )
    .await;

    let eps = Duration::milliseconds(1);
    let before = h.pull(Some(t(0) - eps), t(2)).await.response;
    assert_eq!(before.categories.len(), 1);
    assert_eq!(before.categories[0].id, c1);
    assert_eq!(before.categories[0].name, "Work");

    let after = h.pull(Some(t(0) + eps), t(3)).await.response;
    assert!(after.categories.is_empty());
}

#[tokio::test]
async fn older_write_does_not_overwrite_newer_row() {
    let h = Harness::new().await;
    let c1 = id();

    h.sync(
        SyncRequest {
            categories: vec![category(c1, "Work", t(10))],
            ..Default::default()
        },
        t(11),
    )
    .await;

    let out = h
        .sync(
            SyncRequest {
                categories: vec![category(c1, "Home", t(5))],
                ..Default::default()
            },
            t(12),
        )
        .await;

    assert_eq!(out.report.counts(EntityKind::Category).skipped, 1);
    let stored = h.store.snapshot().await;
    assert_eq!(stored.categories[&c1].name, "Work");
}

#[tokio::test]
async fn deletion_directive_tombstones_and_resists_older_writes() {
    let h = Harness::new().await;
    let c1 = id();

    h.sync(
        SyncRequest {
            categories: vec![category(c1, "Work", t(0))],
            ..Default::default()
        },
        t(1),
    )
    .await;

    let out = h
        .sync(
            SyncRequest {
                last_sync_cursor: Some(t(1)),
                deletions: vec![delete("category", c1)],
                ..Default::default()
            },
            t(10),
        )
        .await;
    assert_eq!(out.report.deletions_marked, 1);
    // The deleting client gets its own tombstone back in the same response.
    assert_eq!(out.response.categories[0].deleted_at, Some(t(10)));

    let feed = h.pull(Some(t(5)), t(11)).await.response;
    assert_eq!(feed.categories.len(), 1);
    assert_eq!(feed.categories[0].deleted_at, Some(t(10)));

    // A write stamped before the tombstone cannot revive it.
    let out = h
        .sync(
            SyncRequest {
                categories: vec![category(c1, "Work again", t(8))],
                ..Default::default()
            },
            t(12),
        )
        .await;
    assert_eq!(out.report.counts(EntityKind::Category).skipped, 1);
    let stored = h.store.snapshot().await;
    assert_eq!(stored.categories[&c1].deleted_at, Some(t(10)));
    assert_eq!(stored.categories[&c1].name, "Work");
}

#[tokio::test]
async fn schedule_listed_before_its_note_still_applies() {
    let h = Harness::new().await;
    let n1 = id();
    let s1 = id();

    // Schedules come first in the body; application order is fixed anyway.
    let body = json!({
        "schedules": [{
            "id": s1,
            "noteId": n1,
            "startDateTime": t(60),
            "recurrenceType": "dayBasedWeekly",
            "recurrenceInterval": 1,
            "recurrenceDay": 2,
            "createdAt": t(0),
            "updatedAt": t(0)
        }],
        "notes": [{
            "id": n1,
            "title": "Standup",
            "createdAt": t(0),
            "updatedAt": t(0)
        }]
    });
    let request: SyncRequest = serde_json::from_value(body).unwrap();

    let out = h.sync(request, t(1)).await;
    assert_eq!(out.report.counts(EntityKind::Note).inserted, 1);
    assert_eq!(out.report.counts(EntityKind::Schedule).inserted, 1);

    let stored = h.store.snapshot().await;
    assert_eq!(stored.schedules[&s1].note_id, n1);
    assert_matches!(
        stored.schedules[&s1].recurrence_type,
        Some(notesync_db::models::RecurrenceType::DayBasedWeekly)
    );
}

#[tokio::test]
async fn resubmitted_category_ids_replace_the_link_set() {
    let h = Harness::new().await;
    let (n1, c1, c2) = (id(), id(), id());

    h.sync(
        SyncRequest {
            categories: vec![category(c1, "Work", t(0)), category(c2, "Home", t(0))],
            notes: vec![note_in(n1, "Plan", t(0), &[c1, c2])],
            ..Default::default()
        },
        t(1),
    )
    .await;

    let out = h
        .sync(
            SyncRequest {
                last_sync_cursor: Some(t(1)),
                notes: vec![note_in(n1, "Plan", t(5), &[c1])],
                ..Default::default()
            },
            t(6),
        )
        .await;
    assert_eq!(out.report.links.unlinked, 1);
    assert_eq!(out.report.links.linked, 0);

    let res = out.response;
    assert_eq!(res.notes.len(), 1);
    assert_eq!(res.notes[0].category_ids, Some(vec![c1]));
    // The stale link is reported as a tombstone directive.
    assert_eq!(res.deletions, vec![delete("noteCategory", format!("{n1}:{c2}"))]);

    let stored = h.store.snapshot().await;
    assert_eq!(stored.note_categories[&(n1, c2)].deleted_at, Some(t(6)));
    assert!(stored.note_categories[&(n1, c1)].deleted_at.is_none());
}
