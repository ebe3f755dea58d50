//! Integration tests for the SQLite share store
//!
//! These run against an in-memory database and exercise the full
//! [`ShareStore`] contract: hydration, access-filtered lookups, soft
//! deletion, grant syncing, and the mutation-plus-audit atomicity.

use common::access::GrantLevel;
use common::share::{AuditEntry, AuditKind, FileEntry};
use common::share_store::{ShareStore, ShareStoreError};
use common::testkit::{user, ShareFixture};
use serde_json::json;
use uuid::Uuid;

use service::Database;

/// Create an in-memory test database
async fn setup_test_db() -> Database {
    let db_url = url::Url::parse("sqlite::memory:").unwrap();
    Database::connect(&db_url).await.unwrap()
}

fn create_entry(share_id: Uuid, actor: Uuid) -> AuditEntry {
    AuditEntry::new(share_id, AuditKind::ShareCreate, Some(actor))
}

fn update_entry(share_id: Uuid, actor: Uuid) -> AuditEntry {
    AuditEntry::new(share_id, AuditKind::ShareUpdate, Some(actor))
}

#[tokio::test]
async fn test_insert_and_fetch_share() {
    let db = setup_test_db().await;
    let owner = user();
    let reader = user();
    let share = ShareFixture::new()
        .owned_by(owner)
        .named("drop zone")
        .public()
        .with_password("swordfish")
        .granting(reader, GrantLevel::Read)
        .build();

    db.insert_share(&share, create_entry(share.id(), owner))
        .await
        .unwrap();

    let got = db.share(share.id()).await.unwrap().unwrap();
    assert_eq!(got.id(), share.id());
    assert_eq!(got.owner_id(), owner);
    assert_eq!(got.name(), "drop zone");
    assert_eq!(got.public_token(), share.public_token());
    assert!(got.password().unwrap().verify("swordfish"));
    assert_eq!(got.grants().get(&reader), Some(&GrantLevel::Read));

    // unknown ids resolve to nothing
    assert!(db.share(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_lookups_filter_by_access() {
    let db = setup_test_db().await;
    let owner = user();
    let writer = user();
    let stranger = user();
    let share = ShareFixture::new()
        .owned_by(owner)
        .granting(writer, GrantLevel::Write)
        .build();

    db.insert_share(&share, create_entry(share.id(), owner))
        .await
        .unwrap();

    // owner and grant holder reach it, the stranger cannot
    assert!(db
        .share_accessible_to(share.id(), owner)
        .await
        .unwrap()
        .is_some());
    assert!(db
        .share_accessible_to(share.id(), writer)
        .await
        .unwrap()
        .is_some());
    assert!(db
        .share_accessible_to(share.id(), stranger)
        .await
        .unwrap()
        .is_none());

    // a private share has no public lookup
    assert!(db.public_share(share.id()).await.unwrap().is_none());

    let public = ShareFixture::new().owned_by(owner).public().build();
    db.insert_share(&public, create_entry(public.id(), owner))
        .await
        .unwrap();
    let got = db.public_share(public.id()).await.unwrap().unwrap();
    assert_eq!(got.public_token(), public.public_token());
}

#[tokio::test]
async fn test_shares_accessible_to_lists_owned_and_granted() {
    let db = setup_test_db().await;
    let owner = user();
    let other = user();

    let owned = ShareFixture::new().owned_by(owner).named("mine").build();
    let granted = ShareFixture::new()
        .owned_by(other)
        .named("theirs")
        .granting(owner, GrantLevel::Read)
        .build();
    let unrelated = ShareFixture::new().owned_by(other).build();

    for share in [&owned, &granted, &unrelated] {
        db.insert_share(share, create_entry(share.id(), share.owner_id()))
            .await
            .unwrap();
    }

    let listed = db.shares_accessible_to(owner).await.unwrap();
    let ids: Vec<Uuid> = listed.iter().map(|s| s.id()).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&owned.id()));
    assert!(ids.contains(&granted.id()));
}

#[tokio::test]
async fn test_update_share_persists_metadata() {
    let db = setup_test_db().await;
    let owner = user();
    let mut share = ShareFixture::new().owned_by(owner).named("before").build();

    db.insert_share(&share, create_entry(share.id(), owner))
        .await
        .unwrap();

    share.set_name("after".to_string());
    share.set_description("new words".to_string());
    let token = share.enable_public_link().clone();
    db.update_share(&share, update_entry(share.id(), owner))
        .await
        .unwrap();

    let got = db.share(share.id()).await.unwrap().unwrap();
    assert_eq!(got.name(), "after");
    assert_eq!(got.description(), "new words");
    assert_eq!(got.public_token().map(|t| t.as_str()), Some(token.as_str()));
}

#[tokio::test]
async fn test_update_missing_share_is_not_found_and_writes_no_audit() {
    let db = setup_test_db().await;
    let ghost = ShareFixture::new().build();

    let err = db
        .update_share(&ghost, update_entry(ghost.id(), ghost.owner_id()))
        .await
        .unwrap_err();
    assert!(matches!(err, ShareStoreError::NotFound));

    // the refused mutation left no audit entry behind
    assert!(db.audit_entries(ghost.id()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_insert_rolls_back_its_audit_entry() {
    let db = setup_test_db().await;
    let owner = user();
    let share = ShareFixture::new().owned_by(owner).build();

    db.insert_share(&share, create_entry(share.id(), owner))
        .await
        .unwrap();

    // same primary key again: the insert fails and the second create
    // entry must fail with it
    let err = db
        .insert_share(&share, create_entry(share.id(), owner))
        .await
        .unwrap_err();
    assert!(matches!(err, ShareStoreError::Provider(_)));

    assert_eq!(db.audit_entries(share.id()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_replace_grants_syncs_rows() {
    let db = setup_test_db().await;
    let owner = user();
    let first = user();
    let second = user();
    let third = user();
    let mut share = ShareFixture::new()
        .owned_by(owner)
        .granting(first, GrantLevel::Read)
        .granting(second, GrantLevel::Write)
        .build();

    db.insert_share(&share, create_entry(share.id(), owner))
        .await
        .unwrap();

    // drop `first`, demote `second`, add `third`
    share.replace_grants([(second, GrantLevel::Read), (third, GrantLevel::Write)]);
    db.replace_grants(
        &share,
        AuditEntry::new(share.id(), AuditKind::ShareAccessChange, Some(owner)),
    )
    .await
    .unwrap();

    let got = db.share(share.id()).await.unwrap().unwrap();
    assert_eq!(got.grants().len(), 2);
    assert!(!got.grants().contains_key(&first));
    assert_eq!(got.grants().get(&second), Some(&GrantLevel::Read));
    assert_eq!(got.grants().get(&third), Some(&GrantLevel::Write));
}

#[tokio::test]
async fn test_soft_delete_hides_share_but_keeps_audit() {
    let db = setup_test_db().await;
    let owner = user();
    let viewer = user();
    let share = ShareFixture::new()
        .owned_by(owner)
        .public()
        .granting(viewer, GrantLevel::Read)
        .build();

    db.insert_share(&share, create_entry(share.id(), owner))
        .await
        .unwrap();
    db.delete_share(
        share.id(),
        AuditEntry::new(share.id(), AuditKind::ShareDelete, Some(owner)),
    )
    .await
    .unwrap();

    // gone through every lookup
    assert!(db.share(share.id()).await.unwrap().is_none());
    assert!(db.public_share(share.id()).await.unwrap().is_none());
    assert!(db
        .share_accessible_to(share.id(), owner)
        .await
        .unwrap()
        .is_none());
    assert!(db.shares_accessible_to(viewer).await.unwrap().is_empty());

    // but the history survives, newest first
    let entries = db.audit_entries(share.id()).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].kind, AuditKind::ShareDelete);
    assert_eq!(entries[1].kind, AuditKind::ShareCreate);

    // deleting again is a miss
    let err = db
        .delete_share(
            share.id(),
            AuditEntry::new(share.id(), AuditKind::ShareDelete, Some(owner)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ShareStoreError::NotFound));
}

#[tokio::test]
async fn test_file_records_round_trip_and_filter() {
    let db = setup_test_db().await;
    let owner = user();
    let share = ShareFixture::new().owned_by(owner).build();
    db.insert_share(&share, create_entry(share.id(), owner))
        .await
        .unwrap();

    let report = FileEntry::new(
        share.id(),
        owner,
        "report.pdf".to_string(),
        "q3 numbers".to_string(),
        4096,
    );
    let notes = FileEntry::new(
        share.id(),
        owner,
        "notes.txt".to_string(),
        String::new(),
        128,
    );

    for file in [&report, &notes] {
        db.insert_file(
            file,
            AuditEntry::new(share.id(), AuditKind::FileCreate, Some(owner)).with_file(file.id()),
        )
        .await
        .unwrap();
    }

    let got = db.file(share.id(), report.id()).await.unwrap().unwrap();
    assert_eq!(got.name(), "report.pdf");
    assert_eq!(got.size(), 4096);
    assert_eq!(got.fs_path(), report.fs_path());
    assert_eq!(db.files(share.id()).await.unwrap().len(), 2);

    db.delete_file(
        share.id(),
        report.id(),
        AuditEntry::new(share.id(), AuditKind::FileDelete, Some(owner)).with_file(report.id()),
    )
    .await
    .unwrap();

    assert!(db.file(share.id(), report.id()).await.unwrap().is_none());
    let remaining = db.files(share.id()).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id(), notes.id());
}

#[tokio::test]
async fn test_insert_file_requires_live_share() {
    let db = setup_test_db().await;
    let owner = user();
    let share = ShareFixture::new().owned_by(owner).build();
    db.insert_share(&share, create_entry(share.id(), owner))
        .await
        .unwrap();
    db.delete_share(
        share.id(),
        AuditEntry::new(share.id(), AuditKind::ShareDelete, Some(owner)),
    )
    .await
    .unwrap();

    // neither a deleted share nor a missing one accepts files
    let orphan = FileEntry::new(
        share.id(),
        owner,
        "late.txt".to_string(),
        String::new(),
        1,
    );
    let err = db
        .insert_file(
            &orphan,
            AuditEntry::new(share.id(), AuditKind::FileCreate, Some(owner)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ShareStoreError::NotFound));

    let stray = FileEntry::new(
        Uuid::new_v4(),
        owner,
        "stray.txt".to_string(),
        String::new(),
        1,
    );
    let err = db
        .insert_file(
            &stray,
            AuditEntry::new(stray.share_id(), AuditKind::FileCreate, Some(owner)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ShareStoreError::NotFound));
}

#[tokio::test]
async fn test_audit_entries_preserve_shape() {
    let db = setup_test_db().await;
    let owner = user();
    let share = ShareFixture::new().owned_by(owner).build();
    db.insert_share(&share, create_entry(share.id(), owner))
        .await
        .unwrap();

    let file_id = Uuid::new_v4();
    db.append_audit(
        AuditEntry::new(share.id(), AuditKind::FileDownload, None)
            .with_file(file_id)
            .with_details(json!({ "name": "report.pdf" })),
    )
    .await
    .unwrap();

    let entries = db.audit_entries(share.id()).await.unwrap();
    assert_eq!(entries.len(), 2);

    let download = &entries[0];
    assert_eq!(download.kind, AuditKind::FileDownload);
    assert_eq!(download.share_id, share.id());
    assert_eq!(download.file_id, Some(file_id));
    // token-path downloads carry no actor
    assert_eq!(download.actor, None);
    assert_eq!(download.details["name"], "report.pdf");

    let create = &entries[1];
    assert_eq!(create.kind, AuditKind::ShareCreate);
    assert_eq!(create.actor, Some(owner));
}
