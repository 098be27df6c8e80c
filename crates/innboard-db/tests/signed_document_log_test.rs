//! Integration tests for the append-only signed document log and upload
//! lookups.
//!
//! These tests need a PostgreSQL instance and are skipped unless
//! `DATABASE_URL` is set.

use chrono::Utc;
use innboard_db::{
    Database, RecordSignedDocumentRequest, SignedDocumentRepository, UploadRepository,
};
use sqlx::PgPool;
use uuid::Uuid;

async fn setup_test_db() -> Option<Database> {
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("skipping: DATABASE_URL not set");
            return None;
        }
    };
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test database");
    sqlx::raw_sql(include_str!("../../../migrations/0001_init.sql"))
        .execute(&pool)
        .await
        .expect("Failed to apply schema");
    Some(Database::new(pool))
}

fn record(employee_id: Uuid, form_type: &str, path: &str) -> RecordSignedDocumentRequest {
    RecordSignedDocumentRequest {
        tenant_id: Uuid::new_v4(),
        employee_id,
        form_type: form_type.to_string(),
        storage_path: path.to_string(),
        bucket: "onboarding".to_string(),
        static_url: None,
    }
}

#[tokio::test]
async fn test_latest_returns_none_for_unsigned_employee() {
    let Some(db) = setup_test_db().await else {
        return;
    };

    let employee = Uuid::new_v4();
    let latest = db
        .documents
        .latest(employee, "human_trafficking")
        .await
        .expect("query failed");
    assert!(latest.is_none());
}

#[tokio::test]
async fn test_second_sign_wins_on_read() {
    let Some(db) = setup_test_db().await else {
        return;
    };

    let employee = Uuid::new_v4();
    db.documents
        .insert(record(employee, "weapons_policy", "t/e/forms/weapons_policy/1_a.pdf"))
        .await
        .expect("first insert failed");
    db.documents
        .insert(record(employee, "weapons_policy", "t/e/forms/weapons_policy/2_b.pdf"))
        .await
        .expect("second insert failed");

    let latest = db
        .documents
        .latest(employee, "weapons_policy")
        .await
        .expect("query failed")
        .expect("expected a document");
    assert_eq!(latest.storage_path, "t/e/forms/weapons_policy/2_b.pdf");
}

#[tokio::test]
async fn test_latest_is_scoped_per_form_type() {
    let Some(db) = setup_test_db().await else {
        return;
    };

    let employee = Uuid::new_v4();
    db.documents
        .insert(record(employee, "w4", "t/e/forms/w4/1_a.pdf"))
        .await
        .expect("insert failed");

    assert!(db
        .documents
        .latest(employee, "direct_deposit")
        .await
        .expect("query failed")
        .is_none());
}

#[tokio::test]
async fn test_upload_lookup_by_id_and_kind() {
    let Some(db) = setup_test_db().await else {
        return;
    };

    let employee = Uuid::new_v4();
    let upload_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO uploaded_attachment
            (id, tenant_id, employee_id, kind, storage_path, bucket, content_type, created_at)
        VALUES ($1, $2, $3, 'voided_check', 't/e/uploads/check.jpg', 'onboarding', 'image/jpeg', $4)
        "#,
    )
    .bind(upload_id)
    .bind(Uuid::new_v4())
    .bind(employee)
    .bind(Utc::now())
    .execute(db.pool())
    .await
    .expect("seed insert failed");

    let by_id = db.uploads.get(upload_id).await.expect("query failed");
    assert_eq!(by_id.expect("expected upload").id, upload_id);

    let by_kind = db
        .uploads
        .latest_for_kind(employee, "voided_check")
        .await
        .expect("query failed")
        .expect("expected upload");
    assert_eq!(by_kind.storage_path, "t/e/uploads/check.jpg");
}
