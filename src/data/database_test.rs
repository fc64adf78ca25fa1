//! Database tests

use super::*;
use crate::error::AppError;
use chrono::Utc;
use tempfile::TempDir;

/// Helper to create a test database
async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::connect(&db_path).await.unwrap();
    (db, temp_dir)
}

fn local_user(email: &str) -> User {
    User::new_local(
        email.to_string(),
        "Test User".to_string(),
        "$argon2id$placeholder".to_string(),
    )
}

#[tokio::test]
async fn test_database_connection() {
    let (db, _temp_dir) = create_test_db().await;
    assert_eq!(db.count_users().await.unwrap(), 0);
}

#[tokio::test]
async fn test_user_insert_and_find() {
    let (db, _temp_dir) = create_test_db().await;
    let user = local_user("test@example.com");

    db.insert_user(&user).await.unwrap();

    let by_id = db.find_user_by_id(&user.id).await.unwrap().unwrap();
    assert_eq!(by_id.email, "test@example.com");
    assert_eq!(by_id.provider, Provider::Local);
    assert_eq!(by_id.password_hash.as_deref(), Some("$argon2id$placeholder"));

    let by_email = db
        .find_user_by_email("TEST@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_email.id, user.id);
}

#[tokio::test]
async fn test_missing_user_is_none() {
    let (db, _temp_dir) = create_test_db().await;
    assert!(db.find_user_by_id("01HXXXXXXXXXXXXXXXXXXXXXXX").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let (db, _temp_dir) = create_test_db().await;
    db.insert_user(&local_user("dup@example.com")).await.unwrap();

    let result = db.insert_user(&local_user("Dup@Example.com")).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert_eq!(db.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn test_save_user_keeps_provider_and_hash() {
    let (db, _temp_dir) = create_test_db().await;
    let mut user = local_user("keep@example.com");
    db.insert_user(&user).await.unwrap();

    user.name = "Renamed".to_string();
    user.provider = Provider::Github;
    user.password_hash = None;
    user.updated_at = Utc::now();
    assert!(db.save_user(&user).await.unwrap());

    let stored = db.find_user_by_id(&user.id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Renamed");
    assert_eq!(stored.provider, Provider::Local);
    assert!(stored.password_hash.is_some());
}

#[tokio::test]
async fn test_save_unknown_user_returns_false() {
    let (db, _temp_dir) = create_test_db().await;
    let user = local_user("ghost@example.com");
    assert!(!db.save_user(&user).await.unwrap());
}

#[tokio::test]
async fn test_save_user_email_conflict() {
    let (db, _temp_dir) = create_test_db().await;
    db.insert_user(&local_user("first@example.com")).await.unwrap();
    let mut second = local_user("second@example.com");
    db.insert_user(&second).await.unwrap();

    second.email = "first@example.com".to_string();
    let result = db.save_user(&second).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_oauth_user_created_once() {
    let (db, _temp_dir) = create_test_db().await;

    let first = db
        .find_or_create_oauth_user(Provider::Google, "g@example.com", "G", None)
        .await
        .unwrap();
    let second = db
        .find_or_create_oauth_user(Provider::Github, "g@example.com", "Other", None)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.provider, Provider::Google);
    assert!(second.is_verified);
    assert_eq!(db.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn test_touch_last_login() {
    let (db, _temp_dir) = create_test_db().await;
    let user = local_user("login@example.com");
    db.insert_user(&user).await.unwrap();

    let at = Utc::now() + chrono::Duration::minutes(5);
    assert!(db.touch_last_login(&user.id, at).await.unwrap());

    let stored = db.find_user_by_id(&user.id).await.unwrap().unwrap();
    assert_eq!(
        stored.last_login.map(|t| t.timestamp()),
        Some(at.timestamp())
    );
}
