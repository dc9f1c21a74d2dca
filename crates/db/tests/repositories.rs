//! Integration tests for the sync repositories.
//!
//! Needs a live Postgres reachable through `DATABASE_URL`; compiled only with
//! `--features db-tests`.

#![cfg(feature = "db-tests")]

use chrono::{Duration, TimeZone, Utc};
use notesync_core::entity::Ownership;
use notesync_core::types::{AccountId, Timestamp};
use notesync_db::models::{
    Account, Category, CreateAccount, Note, NoteCategory, NoteStatus, NoteType, Schedule,
};
use notesync_db::repositories::{
    AccountRepo, CategoryRepo, NoteCategoryRepo, NoteRepo, NoteTypeRepo, ScheduleRepo,
    TombstoneRepo,
};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn t(mins: i64) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap() + Duration::minutes(mins)
}

async fn new_account(conn: &mut PgConnection, name: &str) -> Account {
    AccountRepo::create(
        conn,
        &CreateAccount {
            username: name.to_string(),
            email: format!("{name}@example.com"),
        },
    )
    .await
    .unwrap()
}

fn category(account_id: AccountId, name: &str, at: i64) -> Category {
    Category {
        id: Uuid::new_v4(),
        account_id,
        name: name.to_string(),
        created_at: t(at),
        updated_at: t(at),
        deleted_at: None,
    }
}

fn note(account_id: AccountId, title: &str, at: i64) -> Note {
    Note {
        id: Uuid::new_v4(),
        account_id,
        note_type_id: None,
        title: title.to_string(),
        content: None,
        is_important: false,
        status: NoteStatus::Todo,
        created_at: t(at),
        updated_at: t(at),
        deleted_at: None,
    }
}

fn schedule(note_id: Uuid, at: i64) -> Schedule {
    Schedule {
        id: Uuid::new_v4(),
        note_id,
        start_date_time: Some(t(at)),
        end_date_time: None,
        recurrence_type: None,
        recurrence_interval: None,
        recurrence_day: None,
        recurrence_end_date: None,
        created_at: t(at),
        updated_at: t(at),
        deleted_at: None,
    }
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_migrations_seed_global_note_types(pool: PgPool) {
    notesync_db::health_check(&pool).await.unwrap();
    let mut conn = pool.acquire().await.unwrap();

    let globals = NoteTypeRepo::list_global(&mut conn).await.unwrap();
    assert_eq!(globals.len(), 4);
    assert!(globals.iter().all(|nt| nt.owner == Ownership::Global));
}

// ---------------------------------------------------------------------------
// Guarded upserts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_upsert_never_overwrites_foreign_row(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let alice = new_account(&mut conn, "alice").await;
    let bob = new_account(&mut conn, "bob").await;

    let mut row = category(alice.id, "Work", 0);
    assert!(CategoryRepo::upsert(&mut conn, &row).await.unwrap());

    row.account_id = bob.id;
    row.name = "Hijacked".to_string();
    row.updated_at = t(10);
    assert!(!CategoryRepo::upsert(&mut conn, &row).await.unwrap());

    let stored = CategoryRepo::find_by_id(&mut conn, row.id).await.unwrap().unwrap();
    assert_eq!(stored.account_id, alice.id);
    assert_eq!(stored.name, "Work");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_global_note_type_is_read_only(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let alice = new_account(&mut conn, "alice").await;
    let global = NoteTypeRepo::list_global(&mut conn).await.unwrap().remove(0);

    let takeover = NoteType {
        owner: Ownership::Account(alice.id),
        name: "Mine now".to_string(),
        updated_at: t(1_000_000),
        ..global.clone()
    };
    assert!(!NoteTypeRepo::upsert(&mut conn, &takeover).await.unwrap());
    assert!(!NoteTypeRepo::mark_deleted(&mut conn, alice.id, global.id, t(5))
        .await
        .unwrap());

    let stored = NoteTypeRepo::find_by_id(&mut conn, global.id).await.unwrap().unwrap();
    assert_eq!(stored, global);
    assert_eq!(
        NoteTypeRepo::owner_of(&mut conn, global.id).await.unwrap(),
        Some(Ownership::Global)
    );
}

// ---------------------------------------------------------------------------
// Change feed queries
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_changed_since_filters_by_cursor_and_keeps_tombstones(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let alice = new_account(&mut conn, "alice").await;

    let old = category(alice.id, "Old", 0);
    let fresh = category(alice.id, "Fresh", 20);
    CategoryRepo::upsert(&mut conn, &old).await.unwrap();
    CategoryRepo::upsert(&mut conn, &fresh).await.unwrap();

    let all = CategoryRepo::changed_since(&mut conn, alice.id, None).await.unwrap();
    assert_eq!(all.len(), 2);

    let since = CategoryRepo::changed_since(&mut conn, alice.id, Some(t(10)))
        .await
        .unwrap();
    assert_eq!(since.len(), 1);
    assert_eq!(since[0].id, fresh.id);

    // A tombstone newer than the cursor shows up even though updated_at is old.
    sqlx::query("UPDATE categories SET deleted_at = $2 WHERE id = $1")
        .bind(old.id)
        .bind(t(30))
        .execute(&mut *conn)
        .await
        .unwrap();
    let since = CategoryRepo::changed_since(&mut conn, alice.id, Some(t(25)))
        .await
        .unwrap();
    assert_eq!(since.len(), 1);
    assert_eq!(since[0].id, old.id);
    assert_eq!(since[0].deleted_at, Some(t(30)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_links_are_scoped_through_their_note(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let alice = new_account(&mut conn, "alice").await;
    let bob = new_account(&mut conn, "bob").await;

    let n = note(alice.id, "Groceries", 0);
    let c = category(alice.id, "Home", 0);
    NoteRepo::upsert(&mut conn, &n).await.unwrap();
    CategoryRepo::upsert(&mut conn, &c).await.unwrap();
    NoteCategoryRepo::upsert(&mut conn, &NoteCategory::live(n.id, c.id, t(5)))
        .await
        .unwrap();

    assert_eq!(
        NoteCategoryRepo::owner_of(&mut conn, n.id, c.id).await.unwrap(),
        Some(alice.id)
    );
    assert!(NoteCategoryRepo::changed_since(&mut conn, bob.id, None)
        .await
        .unwrap()
        .is_empty());
    assert!(!NoteCategoryRepo::mark_deleted(&mut conn, bob.id, n.id, c.id, t(6))
        .await
        .unwrap());
    assert!(NoteCategoryRepo::mark_deleted(&mut conn, alice.id, n.id, c.id, t(6))
        .await
        .unwrap());

    let link = NoteCategoryRepo::find(&mut conn, n.id, c.id).await.unwrap().unwrap();
    assert_eq!(link.deleted_at, Some(t(6)));
    assert!(NoteCategoryRepo::live_for_notes(&mut conn, &[n.id])
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_schedule_ownership_follows_note(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let alice = new_account(&mut conn, "alice").await;
    let bob = new_account(&mut conn, "bob").await;

    let n = note(alice.id, "Dentist", 0);
    NoteRepo::upsert(&mut conn, &n).await.unwrap();
    let mut s = schedule(n.id, 0);
    assert!(ScheduleRepo::upsert(&mut conn, alice.id, &s).await.unwrap());

    s.updated_at = t(10);
    assert!(!ScheduleRepo::upsert(&mut conn, bob.id, &s).await.unwrap());
    assert_eq!(
        ScheduleRepo::owner_of(&mut conn, s.id).await.unwrap(),
        Some(alice.id)
    );

    assert!(!ScheduleRepo::mark_deleted(&mut conn, bob.id, s.id, t(20))
        .await
        .unwrap());
    assert!(ScheduleRepo::mark_deleted(&mut conn, alice.id, s.id, t(20))
        .await
        .unwrap());

    let stored = ScheduleRepo::list_for_notes(&mut conn, &[n.id]).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].deleted_at, Some(t(20)));
    assert_eq!(stored[0].updated_at, t(20));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_mark_deleted_keeps_later_updated_at(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let alice = new_account(&mut conn, "alice").await;

    // Written by a client whose clock runs ahead of the server.
    let ahead = category(alice.id, "Ahead", 100);
    CategoryRepo::upsert(&mut conn, &ahead).await.unwrap();
    assert!(CategoryRepo::mark_deleted(&mut conn, alice.id, ahead.id, t(20))
        .await
        .unwrap());

    let stored = CategoryRepo::find_by_id(&mut conn, ahead.id).await.unwrap().unwrap();
    assert_eq!(stored.deleted_at, Some(t(20)));
    assert_eq!(stored.updated_at, t(100));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_last_sync_at_is_persisted(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let alice = new_account(&mut conn, "alice").await;
    assert!(alice.last_sync_at.is_none());

    assert!(AccountRepo::set_last_sync_at(&mut conn, alice.id, t(42)).await.unwrap());
    let stored = AccountRepo::find_by_id(&mut conn, alice.id).await.unwrap().unwrap();
    assert_eq!(stored.last_sync_at, Some(t(42)));

    assert!(!AccountRepo::set_last_sync_at(&mut conn, Uuid::new_v4(), t(42))
        .await
        .unwrap());
}

// ---------------------------------------------------------------------------
// Purge
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_purge_keeps_parents_with_live_children(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let alice = new_account(&mut conn, "alice").await;

    // A tombstoned note that still has a live schedule.
    let mut parent = note(alice.id, "Parent", 0);
    parent.deleted_at = Some(t(1));
    NoteRepo::upsert(&mut conn, &parent).await.unwrap();
    ScheduleRepo::upsert(&mut conn, alice.id, &schedule(parent.id, 0))
        .await
        .unwrap();

    // A tombstoned note with nothing attached.
    let mut lonely = note(alice.id, "Lonely", 0);
    lonely.deleted_at = Some(t(1));
    NoteRepo::upsert(&mut conn, &lonely).await.unwrap();

    // A tombstone newer than the cutoff.
    let mut recent = category(alice.id, "Recent", 0);
    recent.deleted_at = Some(t(100));
    CategoryRepo::upsert(&mut conn, &recent).await.unwrap();

    let report = TombstoneRepo::purge_older_than(&pool, t(50)).await.unwrap();
    assert_eq!(report.total_count, 1);

    assert!(NoteRepo::find_by_id(&mut conn, lonely.id).await.unwrap().is_none());
    assert!(NoteRepo::find_by_id(&mut conn, parent.id).await.unwrap().is_some());
    assert!(CategoryRepo::find_by_id(&mut conn, recent.id).await.unwrap().is_some());
}
