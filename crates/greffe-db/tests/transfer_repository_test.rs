//! Integration tests for the transfer ledger using in-memory SurrealDB.
//!
//! The accept path is exercised together with the entity store, since
//! acceptance moves entity ownership in the same transaction.

use chrono::NaiveDate;
use greffe_core::RoleName;
use greffe_core::models::entity::{Entity, EntityKind, RegisterEntity};
use greffe_core::models::transfer::{NewTransfer, TransferPatch, TransferStatus};
use greffe_core::repository::{EntityRepository, Pagination, TransferRepository};
use greffe_db::repository::{SurrealEntityRepository, SurrealTransferRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = Surreal<surrealdb::engine::local::Db>;

async fn setup() -> Db {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    greffe_db::run_migrations(&db).await.unwrap();
    db
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn seed_entity(db: &Db, owner: Uuid) -> Entity {
    SurrealEntityRepository::new(db.clone())
        .create(
            RegisterEntity {
                number: "42/2025".into(),
                subject: "Succession".into(),
                part_one: "Dupont".into(),
                part_two: "Estate".into(),
                status: "open".into(),
                magistrate: "J. Bernard".into(),
                kind: EntityKind::Dossier,
            },
            owner,
            day(2025, 1, 1),
        )
        .await
        .unwrap()
}

fn row(entity_id: Uuid, from: Uuid, to_user: Option<Uuid>, to_role: Option<&str>) -> NewTransfer {
    NewTransfer {
        entity_id,
        from_user: from,
        to_user,
        to_role: to_role.map(RoleName::new),
        content: "please review".into(),
        date_sent: day(2025, 4, 1),
    }
}

#[tokio::test]
async fn create_many_persists_all_rows() {
    let db = setup().await;
    let repo = SurrealTransferRepository::new(db.clone());
    let sender = Uuid::new_v4();
    let entity = seed_entity(&db, sender).await;

    let batch = vec![
        row(entity.id, sender, Some(Uuid::new_v4()), Some("clerk")),
        row(entity.id, sender, Some(Uuid::new_v4()), Some("clerk")),
        row(entity.id, sender, Some(Uuid::new_v4()), Some("clerk")),
    ];
    let created = repo.create_many(batch).await.unwrap();
    assert_eq!(created.len(), 3);

    for transfer in &created {
        let fetched = repo.get_by_id(transfer.id).await.unwrap();
        assert_eq!(fetched.status, TransferStatus::Sent);
        assert_eq!(fetched.entity_id, entity.id);
        assert_eq!(fetched.date_sent, day(2025, 4, 1));
        assert!(fetched.date_resolved.is_none());
    }
}

#[tokio::test]
async fn create_many_empty_batch_is_a_no_op() {
    let repo = SurrealTransferRepository::new(setup().await);
    let created = repo.create_many(Vec::new()).await.unwrap();
    assert!(created.is_empty());
}

#[tokio::test]
async fn accept_closes_transfer_and_moves_ownership() {
    let db = setup().await;
    let repo = SurrealTransferRepository::new(db.clone());
    let entities = SurrealEntityRepository::new(db.clone());
    let sender = Uuid::new_v4();
    let recipient = Uuid::new_v4();
    let entity = seed_entity(&db, sender).await;

    let created = repo
        .create_many(vec![row(entity.id, sender, Some(recipient), None)])
        .await
        .unwrap();

    let accepted = repo
        .accept(created[0].id, entity.id, recipient, day(2025, 4, 2))
        .await
        .unwrap()
        .expect("transfer was pending");

    assert_eq!(accepted.status, TransferStatus::Accepted);
    assert_eq!(accepted.to_user, Some(recipient));
    assert_eq!(accepted.date_resolved, Some(day(2025, 4, 2)));

    let entity = entities.get_by_id(entity.id).await.unwrap();
    assert_eq!(entity.owner_id, recipient);
}

#[tokio::test]
async fn accept_is_rejected_once_resolved() {
    let db = setup().await;
    let repo = SurrealTransferRepository::new(db.clone());
    let entities = SurrealEntityRepository::new(db.clone());
    let sender = Uuid::new_v4();
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    let entity = seed_entity(&db, sender).await;

    let created = repo
        .create_many(vec![row(entity.id, sender, None, Some("clerk"))])
        .await
        .unwrap();
    let id = created[0].id;

    repo.accept(id, entity.id, first, day(2025, 4, 2))
        .await
        .unwrap()
        .expect("first accept wins");

    // The loser must not flip the status or steal ownership.
    let lost = repo.accept(id, entity.id, second, day(2025, 4, 3)).await.unwrap();
    assert!(lost.is_none());

    let entity = entities.get_by_id(entity.id).await.unwrap();
    assert_eq!(entity.owner_id, first);
}

#[tokio::test]
async fn refuse_records_date_without_moving_ownership() {
    let db = setup().await;
    let repo = SurrealTransferRepository::new(db.clone());
    let entities = SurrealEntityRepository::new(db.clone());
    let sender = Uuid::new_v4();
    let recipient = Uuid::new_v4();
    let entity = seed_entity(&db, sender).await;

    let created = repo
        .create_many(vec![row(entity.id, sender, Some(recipient), None)])
        .await
        .unwrap();

    let refused = repo
        .refuse(created[0].id, day(2025, 4, 2))
        .await
        .unwrap()
        .expect("transfer was pending");
    assert_eq!(refused.status, TransferStatus::Refused);
    assert_eq!(refused.date_resolved, Some(day(2025, 4, 2)));

    let entity = entities.get_by_id(entity.id).await.unwrap();
    assert_eq!(entity.owner_id, sender);

    // Refusing again finds no pending row.
    assert!(repo.refuse(created[0].id, day(2025, 4, 3)).await.unwrap().is_none());
}

#[tokio::test]
async fn update_resends_a_refused_transfer() {
    let db = setup().await;
    let repo = SurrealTransferRepository::new(db.clone());
    let sender = Uuid::new_v4();
    let entity = seed_entity(&db, sender).await;

    let created = repo
        .create_many(vec![row(entity.id, sender, Some(Uuid::new_v4()), None)])
        .await
        .unwrap();
    let id = created[0].id;

    repo.refuse(id, day(2025, 4, 2)).await.unwrap().unwrap();

    let new_recipient = Uuid::new_v4();
    let updated = repo
        .update(
            id,
            TransferPatch {
                to_user: Some(new_recipient),
                to_role: None,
                content: Some("second attempt".into()),
            },
            day(2025, 4, 5),
        )
        .await
        .unwrap()
        .expect("refused transfers can be edited");

    assert_eq!(updated.status, TransferStatus::Sent);
    assert_eq!(updated.to_user, Some(new_recipient));
    // Recipient pair replaced as a unit.
    assert!(updated.to_role.is_none());
    assert_eq!(updated.content, "second attempt");
    assert_eq!(updated.date_sent, day(2025, 4, 5));
}

#[tokio::test]
async fn update_refuses_to_touch_accepted_transfers() {
    let db = setup().await;
    let repo = SurrealTransferRepository::new(db.clone());
    let sender = Uuid::new_v4();
    let recipient = Uuid::new_v4();
    let entity = seed_entity(&db, sender).await;

    let created = repo
        .create_many(vec![row(entity.id, sender, Some(recipient), None)])
        .await
        .unwrap();
    let id = created[0].id;

    repo.accept(id, entity.id, recipient, day(2025, 4, 2))
        .await
        .unwrap()
        .unwrap();

    let result = repo
        .update(
            id,
            TransferPatch {
                to_user: None,
                to_role: None,
                content: Some("too late".into()),
            },
            day(2025, 4, 3),
        )
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn delete_removes_the_row() {
    let db = setup().await;
    let repo = SurrealTransferRepository::new(db.clone());
    let sender = Uuid::new_v4();
    let entity = seed_entity(&db, sender).await;

    let created = repo
        .create_many(vec![row(entity.id, sender, Some(Uuid::new_v4()), None)])
        .await
        .unwrap();

    repo.delete(created[0].id).await.unwrap();
    assert!(repo.get_by_id(created[0].id).await.is_err());
}

#[tokio::test]
async fn incoming_matches_user_and_role() {
    let db = setup().await;
    let repo = SurrealTransferRepository::new(db.clone());
    let sender = Uuid::new_v4();
    let me = Uuid::new_v4();
    let entity = seed_entity(&db, sender).await;

    repo.create_many(vec![
        row(entity.id, sender, Some(me), None),
        row(entity.id, sender, None, Some("clerk")),
        row(entity.id, sender, Some(Uuid::new_v4()), Some("cashier")),
    ])
    .await
    .unwrap();

    let incoming = repo.list_incoming(me, &RoleName::new("clerk")).await.unwrap();
    assert_eq!(incoming.len(), 2);
}

#[tokio::test]
async fn outgoing_hides_accepted_rows() {
    let db = setup().await;
    let repo = SurrealTransferRepository::new(db.clone());
    let sender = Uuid::new_v4();
    let recipient = Uuid::new_v4();
    let entity = seed_entity(&db, sender).await;

    let created = repo
        .create_many(vec![
            row(entity.id, sender, Some(recipient), None),
            row(entity.id, sender, Some(Uuid::new_v4()), None),
        ])
        .await
        .unwrap();

    repo.accept(created[0].id, entity.id, recipient, day(2025, 4, 2))
        .await
        .unwrap()
        .unwrap();
    repo.refuse(created[1].id, day(2025, 4, 2)).await.unwrap().unwrap();

    // The sender still sees the refused row, never the accepted one.
    let outgoing = repo.list_outgoing(sender).await.unwrap();
    assert_eq!(outgoing.len(), 1);
    assert_eq!(outgoing[0].status, TransferStatus::Refused);

    let pending = repo.list_sent_by(sender).await.unwrap();
    assert!(pending.is_empty());
}

#[tokio::test]
async fn accepted_history_is_paginated() {
    let db = setup().await;
    let repo = SurrealTransferRepository::new(db.clone());
    let sender = Uuid::new_v4();
    let recipient = Uuid::new_v4();
    let entity = seed_entity(&db, sender).await;

    for d in 1..=5 {
        let created = repo
            .create_many(vec![row(entity.id, sender, Some(recipient), None)])
            .await
            .unwrap();
        repo.accept(created[0].id, entity.id, recipient, day(2025, 5, d))
            .await
            .unwrap()
            .unwrap();
    }

    let page1 = repo
        .list_accepted(
            sender,
            &RoleName::new("clerk"),
            Pagination {
                offset: 0,
                limit: 3,
            },
        )
        .await
        .unwrap();
    assert_eq!(page1.items.len(), 3);
    assert_eq!(page1.total, 5);
    // Newest resolution first.
    assert_eq!(page1.items[0].date_resolved, Some(day(2025, 5, 5)));

    let page2 = repo
        .list_accepted(
            sender,
            &RoleName::new("clerk"),
            Pagination {
                offset: 3,
                limit: 3,
            },
        )
        .await
        .unwrap();
    assert_eq!(page2.items.len(), 2);
}

#[tokio::test]
async fn entities_with_pending_deduplicates() {
    let db = setup().await;
    let repo = SurrealTransferRepository::new(db.clone());
    let sender = Uuid::new_v4();
    let entity = seed_entity(&db, sender).await;

    repo.create_many(vec![
        row(entity.id, sender, Some(Uuid::new_v4()), None),
        row(entity.id, sender, Some(Uuid::new_v4()), None),
    ])
    .await
    .unwrap();

    let pending = repo.entities_with_pending().await.unwrap();
    assert_eq!(pending, vec![entity.id]);
}
