//! Integration tests for the access token slice


use accounts_core::{AccessToken, AccountError, UserId};
use chrono::{Duration, Utc};
use test_helpers::*;

fn token_for(user_id: &UserId, token: &str, issued_secs_ago: i64, lifetime_secs: i64) -> AccessToken {
    let issued_at = Utc::now() - Duration::seconds(issued_secs_ago);
    AccessToken {
        user_id: user_id.clone(),
        token: token.to_string(),
        issued_at,
        expires_at: issued_at + Duration::seconds(lifetime_secs),
    }
}

#[tokio::test]
async fn test_saved_token_is_active_until_expiry() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let user = create_test_user(pool, "Alice", "alice@example.com", 30).await;

    let token = token_for(&user.id, "live", 0, 300);
    accounts_storage::access_tokens::save(pool, &token).await.unwrap();

    let now = Utc::now();
    assert!(accounts_storage::access_tokens::is_active(pool, "live", now).await.unwrap());
    assert!(!accounts_storage::access_tokens::is_active(pool, "live", token.expires_at)
        .await
        .unwrap());
    assert!(!accounts_storage::access_tokens::is_active(pool, "unknown", now).await.unwrap());
}

#[tokio::test]
async fn test_duplicate_token_is_rejected() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let user = create_test_user(pool, "Alice", "alice@example.com", 30).await;

    let token = token_for(&user.id, "same", 0, 300);
    accounts_storage::access_tokens::save(pool, &token).await.unwrap();
    let result = accounts_storage::access_tokens::save(pool, &token).await;

    assert!(matches!(result, Err(AccountError::Conflict(_))));
}

#[tokio::test]
async fn test_revoke_removes_token() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let user = create_test_user(pool, "Alice", "alice@example.com", 30).await;

    accounts_storage::access_tokens::save(pool, &token_for(&user.id, "t", 0, 300))
        .await
        .unwrap();

    assert!(accounts_storage::access_tokens::revoke(pool, "t").await.unwrap());
    assert!(!accounts_storage::access_tokens::revoke(pool, "t").await.unwrap());
    assert!(!accounts_storage::access_tokens::is_active(pool, "t", Utc::now()).await.unwrap());
}

#[tokio::test]
async fn test_tokens_listed_newest_first() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let user = create_test_user(pool, "Alice", "alice@example.com", 30).await;

    accounts_storage::access_tokens::save(pool, &token_for(&user.id, "older", 120, 300))
        .await
        .unwrap();
    accounts_storage::access_tokens::save(pool, &token_for(&user.id, "newer", 10, 300))
        .await
        .unwrap();

    let tokens = accounts_storage::access_tokens::get_for_user(pool, &user.id).await.unwrap();
    let values: Vec<&str> = tokens.iter().map(|t| t.token.as_str()).collect();
    assert_eq!(values, vec!["newer", "older"]);
}

#[tokio::test]
async fn test_purge_expired_keeps_live_tokens() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let user = create_test_user(pool, "Alice", "alice@example.com", 30).await;

    accounts_storage::access_tokens::save(pool, &token_for(&user.id, "expired", 600, 60))
        .await
        .unwrap();
    accounts_storage::access_tokens::save(pool, &token_for(&user.id, "live", 0, 600))
        .await
        .unwrap();

    let purged = accounts_storage::access_tokens::purge_expired(pool, Utc::now()).await.unwrap();
    assert_eq!(purged, 1);

    let remaining = accounts_storage::access_tokens::get_for_user(pool, &user.id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].token, "live");
}
