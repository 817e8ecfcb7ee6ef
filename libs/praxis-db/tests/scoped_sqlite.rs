//! End-to-end checks of the scoped layer against in-memory sqlite.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use praxis_db::scoped::{ScopeError, TenantDb};
use praxis_db::DbConfig;
use praxis_tenancy::{OrgId, TenantContext};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, Set};

mod document {
    use praxis_db::scoped::OrgScopedEntity;
    use praxis_tenancy::OrgId;
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "documents")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub org_id: i64,
        pub title: String,
        pub status: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl OrgScopedEntity for Entity {
        fn org_col() -> Option<Self::Column> {
            Some(Column::OrgId)
        }

        fn org_of(model: &Self::Model) -> Option<OrgId> {
            OrgId::new(model.org_id)
        }
    }
}

mod audit_event {
    use praxis_db::scoped::OrgScopedEntity;
    use praxis_tenancy::OrgId;
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "audit_events")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub action: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl OrgScopedEntity for Entity {
        fn org_col() -> Option<Self::Column> {
            None
        }

        fn org_of(_model: &Self::Model) -> Option<OrgId> {
            None
        }
    }
}

async fn test_db() -> TenantDb {
    let db = DbConfig::in_memory().connect().await.expect("connect");
    db.conn()
        .execute_unprepared(
            "CREATE TABLE documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                org_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'draft',
                UNIQUE (org_id, title)
            )",
        )
        .await
        .expect("documents table");
    db.conn()
        .execute_unprepared(
            "CREATE TABLE audit_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                action TEXT NOT NULL
            )",
        )
        .await
        .expect("audit_events table");
    db
}

fn ctx_org(raw: i64) -> TenantContext {
    TenantContext::organisation(OrgId::new(raw).unwrap())
}

async fn seed_doc(db: &TenantDb, org: i64, title: &str, status: &str) -> document::Model {
    db.insert::<document::Entity>(
        &ctx_org(org),
        document::ActiveModel {
            title: Set(title.to_owned()),
            status: Set(status.to_owned()),
            ..Default::default()
        },
    )
    .await
    .expect("seed document")
}

#[tokio::test]
async fn list_returns_only_rows_of_the_context_org() {
    let db = test_db().await;
    seed_doc(&db, 1, "intake form", "draft").await;
    seed_doc(&db, 1, "consent form", "final").await;
    seed_doc(&db, 2, "intake form", "draft").await;

    let docs = db
        .find::<document::Entity>(&ctx_org(1))
        .all(db.conn())
        .await
        .unwrap();
    assert_eq!(docs.len(), 2);
    assert!(docs.iter().all(|d| d.org_id == 1));
}

#[tokio::test]
async fn caller_filters_are_and_merged_with_the_org_predicate() {
    let db = test_db().await;
    seed_doc(&db, 1, "intake form", "draft").await;
    seed_doc(&db, 1, "consent form", "final").await;
    seed_doc(&db, 2, "referral form", "draft").await;

    let drafts = db
        .find::<document::Entity>(&ctx_org(1))
        .filter(document::Column::Status.eq("draft"))
        .all(db.conn())
        .await
        .unwrap();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].title, "intake form");
    assert_eq!(drafts[0].org_id, 1);
}

#[tokio::test]
async fn count_respects_the_scope() {
    let db = test_db().await;
    seed_doc(&db, 1, "a", "draft").await;
    seed_doc(&db, 1, "b", "draft").await;
    seed_doc(&db, 2, "c", "draft").await;

    let scoped = db
        .find::<document::Entity>(&ctx_org(1))
        .count(db.conn())
        .await
        .unwrap();
    assert_eq!(scoped, 2);

    let all = db
        .find::<document::Entity>(&TenantContext::unrestricted())
        .count(db.conn())
        .await
        .unwrap();
    assert_eq!(all, 3);
}

#[tokio::test]
async fn unique_lookup_reports_foreign_rows_as_absent() {
    let db = test_db().await;
    let foreign = seed_doc(&db, 2, "referral form", "draft").await;

    let miss = db
        .get_unique::<document::Entity, _>(&ctx_org(1), foreign.id)
        .await
        .unwrap();
    assert!(miss.is_none());

    let hit = db
        .get_unique::<document::Entity, _>(&ctx_org(2), foreign.id)
        .await
        .unwrap();
    assert_eq!(hit.map(|d| d.id), Some(foreign.id));
}

#[tokio::test]
async fn unique_lookup_passes_through_without_org_context() {
    let db = test_db().await;
    let doc = seed_doc(&db, 2, "referral form", "draft").await;

    let found = db
        .get_unique::<document::Entity, _>(&TenantContext::unrestricted(), doc.id)
        .await
        .unwrap();
    assert_eq!(found.map(|d| d.org_id), Some(2));
}

#[tokio::test]
async fn unique_lookup_rejects_rows_without_valid_org() {
    let db = test_db().await;
    db.conn()
        .execute_unprepared(
            "INSERT INTO documents (id, org_id, title, status) VALUES (41, -5, 'broken', 'draft')",
        )
        .await
        .unwrap();

    let err = db
        .get_unique::<document::Entity, _>(&ctx_org(1), 41i64)
        .await
        .unwrap_err();
    assert!(matches!(err, ScopeError::Invalid(_)));
}

#[tokio::test]
async fn insert_stamps_the_context_org_over_the_payload() {
    let db = test_db().await;

    // Payload claims org 2; the context pins org 1 and wins.
    let created = db
        .insert::<document::Entity>(
            &ctx_org(1),
            document::ActiveModel {
                org_id: Set(2),
                title: Set("smuggled".to_owned()),
                status: Set("draft".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(created.org_id, 1);

    let visible_to_org2 = db
        .find::<document::Entity>(&ctx_org(2))
        .all(db.conn())
        .await
        .unwrap();
    assert!(visible_to_org2.is_empty());
}

#[tokio::test]
async fn insert_fills_org_when_payload_leaves_it_unset() {
    let db = test_db().await;

    let created = db
        .insert::<document::Entity>(
            &ctx_org(3),
            document::ActiveModel {
                title: Set("fresh".to_owned()),
                status: Set("draft".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(created.org_id, 3);
}

#[tokio::test]
async fn update_matches_zero_rows_across_orgs() {
    let db = test_db().await;
    let foreign = seed_doc(&db, 2, "referral form", "draft").await;

    let res = db
        .update_many::<document::Entity>(&ctx_org(1))
        .col_expr(document::Column::Status, Expr::value("final"))
        .filter(document::Column::Id.eq(foreign.id))
        .exec(db.conn())
        .await
        .unwrap();
    assert_eq!(res.rows_affected, 0);

    // The row is untouched for its owner.
    let kept = db
        .get_unique::<document::Entity, _>(&ctx_org(2), foreign.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kept.status, "draft");

    let res = db
        .update_many::<document::Entity>(&ctx_org(2))
        .col_expr(document::Column::Status, Expr::value("final"))
        .filter(document::Column::Id.eq(foreign.id))
        .exec(db.conn())
        .await
        .unwrap();
    assert_eq!(res.rows_affected, 1);
}

#[tokio::test]
async fn delete_matches_zero_rows_across_orgs() {
    let db = test_db().await;
    let foreign = seed_doc(&db, 2, "referral form", "draft").await;

    let res = db
        .delete_many::<document::Entity>(&ctx_org(1))
        .filter(document::Column::Id.eq(foreign.id))
        .exec(db.conn())
        .await
        .unwrap();
    assert_eq!(res.rows_affected, 0);

    let still_there = db
        .get_unique::<document::Entity, _>(&ctx_org(2), foreign.id)
        .await
        .unwrap();
    assert!(still_there.is_some());

    let res = db
        .delete_many::<document::Entity>(&ctx_org(2))
        .filter(document::Column::Id.eq(foreign.id))
        .exec(db.conn())
        .await
        .unwrap();
    assert_eq!(res.rows_affected, 1);
}

#[tokio::test]
async fn unrestricted_context_passes_statements_through() {
    let db = test_db().await;
    seed_doc(&db, 1, "a", "draft").await;
    seed_doc(&db, 2, "b", "draft").await;

    let ctx = TenantContext::unrestricted();
    let all = db
        .find::<document::Entity>(&ctx)
        .all(db.conn())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    // Writes pass through as well; the payload's org is kept.
    let created = db
        .insert::<document::Entity>(
            &ctx,
            document::ActiveModel {
                org_id: Set(7),
                title: Set("provisioned".to_owned()),
                status: Set("draft".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(created.org_id, 7);
}

#[tokio::test]
async fn global_entities_ignore_the_org_context() {
    let db = test_db().await;
    let ctx = ctx_org(1);

    db.insert::<audit_event::Entity>(
        &ctx,
        audit_event::ActiveModel {
            action: Set("login".to_owned()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let events = db
        .find::<audit_event::Entity>(&ctx_org(2))
        .all(db.conn())
        .await
        .unwrap();
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn duplicate_org_predicate_is_harmless() {
    let db = test_db().await;
    seed_doc(&db, 1, "a", "draft").await;
    seed_doc(&db, 2, "b", "draft").await;

    // A caller filter that repeats the org equality conjoins with the
    // injected predicate; the result set is unchanged.
    let docs = db
        .find::<document::Entity>(&ctx_org(1))
        .filter(document::Column::OrgId.eq(1))
        .all(db.conn())
        .await
        .unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].org_id, 1);
}

#[tokio::test]
async fn store_errors_surface_unchanged() {
    let db = test_db().await;
    seed_doc(&db, 1, "intake form", "draft").await;

    // Second insert violates the (org_id, title) unique constraint.
    let err = db
        .insert::<document::Entity>(
            &ctx_org(1),
            document::ActiveModel {
                title: Set("intake form".to_owned()),
                status: Set("draft".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ScopeError::Db(_)));
}

#[tokio::test]
async fn transaction_commits_on_ok() {
    let db = test_db().await;
    let ctx = ctx_org(1);

    let inserted: Vec<i64> = db
        .transaction(|tx| {
            let ctx = ctx.clone();
            Box::pin(async move {
                let mut ids = Vec::new();
                for title in ["a", "b"] {
                    let doc = praxis_db::scoped::insert_org_scoped::<document::Entity, _>(
                        &ctx,
                        document::ActiveModel {
                            title: Set(title.to_owned()),
                            status: Set("draft".to_owned()),
                            ..Default::default()
                        },
                        tx,
                    )
                    .await?;
                    ids.push(doc.id);
                }
                Ok::<_, ScopeError>(ids)
            })
        })
        .await
        .unwrap();
    assert_eq!(inserted.len(), 2);

    let count = db
        .find::<document::Entity>(&ctx)
        .count(db.conn())
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn transaction_rolls_back_on_err() {
    let db = test_db().await;
    let ctx = ctx_org(1);

    let res: Result<(), ScopeError> = db
        .transaction(|tx| {
            let ctx = ctx.clone();
            Box::pin(async move {
                praxis_db::scoped::insert_org_scoped::<document::Entity, _>(
                    &ctx,
                    document::ActiveModel {
                        title: Set("doomed".to_owned()),
                        status: Set("draft".to_owned()),
                        ..Default::default()
                    },
                    tx,
                )
                .await?;
                Err(ScopeError::Invalid("forced failure"))
            })
        })
        .await;
    assert!(res.is_err());

    let count = db
        .find::<document::Entity>(&ctx)
        .count(db.conn())
        .await
        .unwrap();
    assert_eq!(count, 0);
}
