use skypipe_auth::error::AuthServiceError;
use skypipe_auth::usecase::login::{LoginInput, LoginUseCase};

use crate::helpers::{MockCodeRepo, MockSender, MockStore, MockUserRepo, TEST_PASSWORD, test_user};

fn usecase(
    store: &MockStore,
    sender: MockSender,
) -> LoginUseCase<MockUserRepo, MockCodeRepo, MockSender> {
    LoginUseCase {
        users: store.user_repo(),
        codes: store.code_repo(),
        sender,
    }
}

#[tokio::test]
async fn should_send_code_after_correct_password() {
    let user = test_user();
    let store = MockStore::with_user(user.clone());
    let sender = MockSender::default();
    let sent = sender.sent_handle();

    let out = usecase(&store, sender)
        .execute(LoginInput {
            email: user.email.clone(),
            password: TEST_PASSWORD.to_owned(),
        })
        .await
        .unwrap();

    assert_eq!(out.email, user.email);
    let pending = store.code_for(&user.email).expect("code stored");
    assert_eq!(
        sent.lock().unwrap().as_slice(),
        &[(user.email.clone(), pending.code)]
    );
}

#[tokio::test]
async fn should_reject_wrong_password_without_issuing_code() {
    let user = test_user();
    let store = MockStore::with_user(user.clone());

    let result = usecase(&store, MockSender::default())
        .execute(LoginInput {
            email: user.email.clone(),
            password: "not-the-password".to_owned(),
        })
        .await;

    assert!(
        matches!(result, Err(AuthServiceError::InvalidCredentials)),
        "expected InvalidCredentials, got {result:?}"
    );
    assert!(store.code_for(&user.email).is_none());
}

#[tokio::test]
async fn should_reject_unknown_email_like_wrong_password() {
    let store = MockStore::default();

    let result = usecase(&store, MockSender::default())
        .execute(LoginInput {
            email: "ghost@x.com".to_owned(),
            password: TEST_PASSWORD.to_owned(),
        })
        .await;

    assert!(
        matches!(result, Err(AuthServiceError::InvalidCredentials)),
        "expected InvalidCredentials, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_suspended_account() {
    let mut user = test_user();
    user.status = false;
    let store = MockStore::with_user(user.clone());

    let result = usecase(&store, MockSender::default())
        .execute(LoginInput {
            email: user.email.clone(),
            password: TEST_PASSWORD.to_owned(),
        })
        .await;

    assert!(
        matches!(result, Err(AuthServiceError::AccountInactive)),
        "expected AccountInactive, got {result:?}"
    );
    assert!(store.code_for(&user.email).is_none());
}

#[tokio::test]
async fn should_validate_input_before_lookup() {
    let store = MockStore::default();

    let result = usecase(&store, MockSender::default())
        .execute(LoginInput {
            email: "not-an-email".to_owned(),
            password: String::new(),
        })
        .await;

    assert!(
        matches!(result, Err(AuthServiceError::Validation(_))),
        "expected Validation, got {result:?}"
    );
}
