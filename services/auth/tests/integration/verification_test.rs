use std::time::Duration as StdDuration;

use chrono::Duration;
use uuid::Uuid;

use skypipe_auth::domain::secret::hash_token;
use skypipe_auth::domain::types::TokenRecord;
use skypipe_auth::error::AuthServiceError;
use skypipe_auth::infra::registry::{ConnectionHandle, ConnectionRegistry};
use skypipe_auth::usecase::verification::{
    VerifyCodeInput, VerifyCodeOutput, VerifyCodeUseCase, VerifyPurpose,
};

use crate::helpers::{
    MockCodeRepo, MockResetCache, MockStore, MockUserRepo, RacingSessionRepo, is_hex64,
    pending_code, test_policy, test_user, verify_usecase,
};

fn by_email(email: &str, code: &str) -> VerifyCodeInput {
    VerifyCodeInput {
        code: code.to_owned(),
        email: Some(email.to_owned()),
        user_id: None,
    }
}

fn seed_old_tokens(store: &MockStore, user_id: Uuid) {
    store.access_tokens.lock().unwrap().push(TokenRecord::issue(
        user_id,
        "old-access".to_owned(),
        Duration::hours(1),
    ));
    store.refresh_tokens.lock().unwrap().push(TokenRecord::issue(
        user_id,
        "old-refresh".to_owned(),
        Duration::days(1),
    ));
}

#[tokio::test]
async fn should_issue_fresh_token_pair_for_correct_code() {
    let user = test_user();
    let store = MockStore::with_user(user.clone());
    store.insert_code(pending_code(&user.email, "123456", Duration::minutes(3)));
    seed_old_tokens(&store, user.id);

    let uc = verify_usecase(&store, MockResetCache::default(), ConnectionRegistry::new(), 5);
    let out = uc
        .execute(VerifyPurpose::Session, by_email(&user.email, "123456"))
        .await
        .unwrap();

    let (user_id, access_token, refresh_token) = match out {
        VerifyCodeOutput::Session {
            user_id,
            access_token,
            refresh_token,
        } => (user_id, access_token, refresh_token),
        other => panic!("expected session tokens, got {other:?}"),
    };
    assert_eq!(user_id, user.id);
    assert!(is_hex64(&access_token), "access token: {access_token}");
    assert!(is_hex64(&refresh_token), "refresh token: {refresh_token}");
    assert_ne!(access_token, refresh_token);

    assert!(store.code_for(&user.email).is_none(), "code must be consumed");
    let access: Vec<String> = store
        .access_tokens_of(user.id)
        .into_iter()
        .map(|t| t.token)
        .collect();
    let refresh: Vec<String> = store
        .refresh_tokens_of(user.id)
        .into_iter()
        .map(|t| t.token)
        .collect();
    assert_eq!(access, vec![access_token], "old access tokens must be gone");
    assert_eq!(refresh, vec![refresh_token], "old refresh tokens must be gone");
}

#[tokio::test]
async fn should_set_token_lifetimes_from_policy() {
    let user = test_user();
    let store = MockStore::with_user(user.clone());
    store.insert_code(pending_code(&user.email, "123456", Duration::minutes(3)));

    verify_usecase(&store, MockResetCache::default(), ConnectionRegistry::new(), 5)
        .execute(VerifyPurpose::Session, by_email(&user.email, "123456"))
        .await
        .unwrap();

    let access = &store.access_tokens_of(user.id)[0];
    let refresh = &store.refresh_tokens_of(user.id)[0];
    assert_eq!(access.expires_at - access.created_at, Duration::hours(4));
    assert_eq!(refresh.expires_at - refresh.created_at, Duration::days(7));
}

#[tokio::test]
async fn should_increment_attempts_by_one_per_wrong_code() {
    let user = test_user();
    let store = MockStore::with_user(user.clone());
    store.insert_code(pending_code(&user.email, "123456", Duration::minutes(3)));
    let uc = verify_usecase(&store, MockResetCache::default(), ConnectionRegistry::new(), 5);

    for expected in 1..=3 {
        let result = uc
            .execute(VerifyPurpose::Session, by_email(&user.email, "000000"))
            .await;
        let remaining = 5 - expected as u32;
        assert!(
            matches!(result, Err(AuthServiceError::InvalidCode { remaining: r }) if r == remaining),
            "expected InvalidCode {{ remaining: {remaining} }}, got {result:?}"
        );
        assert_eq!(store.code_for(&user.email).unwrap().input_count, expected);
    }
    assert!(store.user(user.id).status, "account stays active below the limit");
}

#[tokio::test]
async fn should_suspend_account_on_final_wrong_attempt() {
    let user = test_user();
    let store = MockStore::with_user(user.clone());
    store.insert_code(pending_code(&user.email, "123456", Duration::minutes(3)));
    let uc = verify_usecase(&store, MockResetCache::default(), ConnectionRegistry::new(), 3);

    for _ in 0..2 {
        let result = uc
            .execute(VerifyPurpose::Session, by_email(&user.email, "999999"))
            .await;
        assert!(matches!(result, Err(AuthServiceError::InvalidCode { .. })));
    }
    let result = uc
        .execute(VerifyPurpose::Session, by_email(&user.email, "999999"))
        .await;

    assert!(
        matches!(result, Err(AuthServiceError::AccountSuspended)),
        "expected AccountSuspended, got {result:?}"
    );
    assert!(store.code_for(&user.email).is_none(), "code must be deleted");
    assert!(!store.user(user.id).status, "user must be deactivated");
    assert!(store.access_tokens_of(user.id).is_empty());
}

#[tokio::test]
async fn should_reject_expired_code_even_when_correct() {
    let user = test_user();
    let store = MockStore::with_user(user.clone());
    store.insert_code(pending_code(&user.email, "123456", Duration::seconds(-1)));

    let result = verify_usecase(&store, MockResetCache::default(), ConnectionRegistry::new(), 5)
        .execute(VerifyPurpose::Session, by_email(&user.email, "123456"))
        .await;

    assert!(
        matches!(result, Err(AuthServiceError::CodeExpired)),
        "expected CodeExpired, got {result:?}"
    );
    assert!(store.code_for(&user.email).is_none(), "expired code must be deleted");
    assert!(store.access_tokens_of(user.id).is_empty());
}

#[tokio::test]
async fn should_reject_expired_code_without_counting_attempt() {
    let user = test_user();
    let store = MockStore::with_user(user.clone());
    store.insert_code(pending_code(&user.email, "123456", Duration::seconds(-1)));

    let result = verify_usecase(&store, MockResetCache::default(), ConnectionRegistry::new(), 1)
        .execute(VerifyPurpose::Session, by_email(&user.email, "000000"))
        .await;

    assert!(
        matches!(result, Err(AuthServiceError::CodeExpired)),
        "expected CodeExpired, got {result:?}"
    );
    assert!(store.code_for(&user.email).is_none());
    assert!(store.user(user.id).status, "expiry must not suspend the account");
}

#[tokio::test]
async fn should_return_not_found_without_pending_code() {
    let user = test_user();
    let store = MockStore::with_user(user.clone());

    let result = verify_usecase(&store, MockResetCache::default(), ConnectionRegistry::new(), 5)
        .execute(VerifyPurpose::Session, by_email(&user.email, "123456"))
        .await;

    assert!(
        matches!(result, Err(AuthServiceError::VerificationNotFound)),
        "expected VerificationNotFound, got {result:?}"
    );
}

#[tokio::test]
async fn should_return_not_found_for_unknown_user() {
    let store = MockStore::default();
    store.insert_code(pending_code("ghost@x.com", "123456", Duration::minutes(3)));

    let result = verify_usecase(&store, MockResetCache::default(), ConnectionRegistry::new(), 5)
        .execute(VerifyPurpose::Session, by_email("ghost@x.com", "123456"))
        .await;

    assert!(
        matches!(result, Err(AuthServiceError::UserNotFound)),
        "expected UserNotFound, got {result:?}"
    );
}

#[tokio::test]
async fn should_resolve_user_by_id() {
    let user = test_user();
    let store = MockStore::with_user(user.clone());
    store.insert_code(pending_code(&user.email, "123456", Duration::minutes(3)));

    let out = verify_usecase(&store, MockResetCache::default(), ConnectionRegistry::new(), 5)
        .execute(
            VerifyPurpose::Session,
            VerifyCodeInput {
                code: "123456".to_owned(),
                email: None,
                user_id: Some(user.id),
            },
        )
        .await
        .unwrap();

    assert!(matches!(out, VerifyCodeOutput::Session { user_id, .. } if user_id == user.id));
}

#[tokio::test]
async fn should_reject_mismatched_email_and_user_id() {
    let user = test_user();
    let store = MockStore::with_user(user.clone());
    store.insert_code(pending_code(&user.email, "123456", Duration::minutes(3)));

    let result = verify_usecase(&store, MockResetCache::default(), ConnectionRegistry::new(), 5)
        .execute(
            VerifyPurpose::Session,
            VerifyCodeInput {
                code: "123456".to_owned(),
                email: Some("someone-else@x.com".to_owned()),
                user_id: Some(user.id),
            },
        )
        .await;

    assert!(
        matches!(result, Err(AuthServiceError::UserNotFound)),
        "expected UserNotFound, got {result:?}"
    );
    assert!(store.code_for(&user.email).is_some(), "code must stay pending");
}

#[tokio::test]
async fn should_require_email_or_user_id() {
    let store = MockStore::default();

    let result = verify_usecase(&store, MockResetCache::default(), ConnectionRegistry::new(), 5)
        .execute(
            VerifyPurpose::Session,
            VerifyCodeInput {
                code: "123456".to_owned(),
                email: None,
                user_id: None,
            },
        )
        .await;

    assert!(
        matches!(result, Err(AuthServiceError::Validation(_))),
        "expected Validation, got {result:?}"
    );
}

#[tokio::test]
async fn should_notify_open_socket_when_session_starts() {
    let user = test_user();
    let store = MockStore::with_user(user.clone());
    store.insert_code(pending_code(&user.email, "123456", Duration::minutes(3)));
    let registry = ConnectionRegistry::new();
    let (handle, mut events) = ConnectionHandle::channel();
    registry.register(user.id, handle);

    verify_usecase(&store, MockResetCache::default(), registry, 5)
        .execute(VerifyPurpose::Session, by_email(&user.email, "123456"))
        .await
        .unwrap();

    let event: serde_json::Value = serde_json::from_str(&events.try_recv().unwrap()).unwrap();
    assert_eq!(event["type"], "session_started");
    assert_eq!(event["user_id"], user.id.to_string());
}

#[tokio::test]
async fn should_issue_reset_token_and_cache_its_hash() {
    let user = test_user();
    let store = MockStore::with_user(user.clone());
    store.insert_code(pending_code(&user.email, "654321", Duration::minutes(3)));
    seed_old_tokens(&store, user.id);
    let cache = MockResetCache::default();

    let out = verify_usecase(&store, cache.clone(), ConnectionRegistry::new(), 5)
        .execute(VerifyPurpose::PasswordReset, by_email(&user.email, "654321"))
        .await
        .unwrap();

    let (user_id, token) = match out {
        VerifyCodeOutput::PasswordReset { user_id, token } => (user_id, token),
        other => panic!("expected reset token, got {other:?}"),
    };
    assert_eq!(user_id, user.id);
    assert!(is_hex64(&token));

    let entries = cache.entries.lock().unwrap();
    let (stored_hash, ttl) = entries.get(&user.id).expect("hash cached under user id");
    assert_eq!(stored_hash, &hash_token(&token));
    assert_ne!(stored_hash, &token, "raw token must not be cached");
    assert_eq!(*ttl, StdDuration::from_secs(300));

    assert!(store.code_for(&user.email).is_none());
    assert!(store.access_tokens_of(user.id).is_empty());
    assert!(store.refresh_tokens_of(user.id).is_empty());
}

#[tokio::test]
async fn should_count_wrong_reset_code_like_login_code() {
    let user = test_user();
    let store = MockStore::with_user(user.clone());
    store.insert_code(pending_code(&user.email, "654321", Duration::minutes(3)));
    let cache = MockResetCache::default();

    let result = verify_usecase(&store, cache.clone(), ConnectionRegistry::new(), 5)
        .execute(VerifyPurpose::PasswordReset, by_email(&user.email, "111111"))
        .await;

    assert!(
        matches!(result, Err(AuthServiceError::InvalidCode { remaining: 4 })),
        "expected InvalidCode {{ remaining: 4 }}, got {result:?}"
    );
    assert_eq!(store.code_for(&user.email).unwrap().input_count, 1);
    assert!(cache.entries.lock().unwrap().is_empty());
}

// ── Suspended accounts and concurrent submissions ────────────────────────────

fn racing_usecase(
    store: &MockStore,
    reset_tokens: MockResetCache,
    race: fn(&MockStore),
) -> VerifyCodeUseCase<MockUserRepo, MockCodeRepo, RacingSessionRepo, MockResetCache> {
    VerifyCodeUseCase {
        users: store.user_repo(),
        codes: store.code_repo(),
        sessions: RacingSessionRepo {
            inner: store.session_repo(),
            race,
        },
        reset_tokens,
        registry: ConnectionRegistry::new(),
        policy: test_policy(5),
    }
}

#[tokio::test]
async fn should_refuse_session_for_inactive_account() {
    let mut user = test_user();
    user.status = false;
    let store = MockStore::with_user(user.clone());
    store.insert_code(pending_code(&user.email, "123456", Duration::minutes(3)));

    let result = verify_usecase(&store, MockResetCache::default(), ConnectionRegistry::new(), 5)
        .execute(VerifyPurpose::Session, by_email(&user.email, "123456"))
        .await;

    assert!(
        matches!(result, Err(AuthServiceError::AccountInactive)),
        "expected AccountInactive, got {result:?}"
    );
    assert!(store.access_tokens_of(user.id).is_empty());
    assert!(store.refresh_tokens_of(user.id).is_empty());
}

#[tokio::test]
async fn should_refuse_session_when_suspended_before_commit() {
    let user = test_user();
    let store = MockStore::with_user(user.clone());
    store.insert_code(pending_code(&user.email, "123456", Duration::minutes(3)));

    let result = racing_usecase(&store, MockResetCache::default(), |store: &MockStore| {
        store.users.lock().unwrap()[0].status = false;
    })
    .execute(VerifyPurpose::Session, by_email(&user.email, "123456"))
    .await;

    assert!(
        matches!(result, Err(AuthServiceError::AccountInactive)),
        "expected AccountInactive, got {result:?}"
    );
    assert!(store.access_tokens_of(user.id).is_empty());
}

#[tokio::test]
async fn should_not_issue_tokens_when_code_consumed_concurrently() {
    let user = test_user();
    let store = MockStore::with_user(user.clone());
    store.insert_code(pending_code(&user.email, "123456", Duration::minutes(3)));
    seed_old_tokens(&store, user.id);

    let result = racing_usecase(&store, MockResetCache::default(), |store: &MockStore| {
        store.codes.lock().unwrap().clear();
    })
    .execute(VerifyPurpose::Session, by_email(&user.email, "123456"))
    .await;

    assert!(
        matches!(result, Err(AuthServiceError::VerificationNotFound)),
        "expected VerificationNotFound, got {result:?}"
    );
    let access = store.access_tokens_of(user.id);
    assert_eq!(access.len(), 1);
    assert_eq!(access[0].token, "old-access", "existing session untouched");
}

#[tokio::test]
async fn should_not_issue_tokens_when_code_replaced_concurrently() {
    let user = test_user();
    let store = MockStore::with_user(user.clone());
    store.insert_code(pending_code(&user.email, "123456", Duration::minutes(3)));

    let result = racing_usecase(&store, MockResetCache::default(), |store: &MockStore| {
        store.set_code("a@x.com", "999999");
    })
    .execute(VerifyPurpose::Session, by_email(&user.email, "123456"))
    .await;

    assert!(
        matches!(result, Err(AuthServiceError::VerificationNotFound)),
        "expected VerificationNotFound, got {result:?}"
    );
    assert_eq!(store.code_for(&user.email).unwrap().code, "999999");
    assert!(store.access_tokens_of(user.id).is_empty());
}

#[tokio::test]
async fn should_issue_reset_token_for_inactive_account() {
    let mut user = test_user();
    user.status = false;
    let store = MockStore::with_user(user.clone());
    store.insert_code(pending_code(&user.email, "654321", Duration::minutes(3)));
    let cache = MockResetCache::default();

    let out = verify_usecase(&store, cache.clone(), ConnectionRegistry::new(), 5)
        .execute(VerifyPurpose::PasswordReset, by_email(&user.email, "654321"))
        .await;

    assert!(
        matches!(out, Ok(VerifyCodeOutput::PasswordReset { .. })),
        "expected reset token, got {out:?}"
    );
    assert!(!store.user(user.id).status, "reset does not reactivate");
    assert!(cache.entries.lock().unwrap().contains_key(&user.id));
}

#[tokio::test]
async fn should_keep_code_and_sessions_when_reset_cache_fails() {
    let user = test_user();
    let store = MockStore::with_user(user.clone());
    store.insert_code(pending_code(&user.email, "654321", Duration::minutes(3)));
    seed_old_tokens(&store, user.id);

    let result = verify_usecase(&store, MockResetCache::failing(), ConnectionRegistry::new(), 5)
        .execute(VerifyPurpose::PasswordReset, by_email(&user.email, "654321"))
        .await;

    assert!(
        matches!(result, Err(AuthServiceError::Internal(_))),
        "expected Internal, got {result:?}"
    );
    assert!(store.code_for(&user.email).is_some(), "code not consumed");
    assert_eq!(store.access_tokens_of(user.id).len(), 1);
    assert_eq!(store.refresh_tokens_of(user.id).len(), 1);
}

#[tokio::test]
async fn should_drop_cached_reset_token_when_code_consumed_concurrently() {
    let user = test_user();
    let store = MockStore::with_user(user.clone());
    store.insert_code(pending_code(&user.email, "654321", Duration::minutes(3)));
    let cache = MockResetCache::default();

    let result = racing_usecase(&store, cache.clone(), |store: &MockStore| {
        store.codes.lock().unwrap().clear();
    })
    .execute(VerifyPurpose::PasswordReset, by_email(&user.email, "654321"))
    .await;

    assert!(
        matches!(result, Err(AuthServiceError::VerificationNotFound)),
        "expected VerificationNotFound, got {result:?}"
    );
    assert!(cache.entries.lock().unwrap().is_empty());
}
