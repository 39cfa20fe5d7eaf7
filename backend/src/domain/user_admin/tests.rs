//! Tests for the user administration service.

use std::sync::Arc;

use mockall::predicate::eq;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::{FixtureUserRepository, MockUserRepository};

struct Harness {
    repo: Arc<FixtureUserRepository>,
    service: UserAdmin,
}

impl Harness {
    async fn seed(&self, name: &str, email: &str) -> UserId {
        let draft = UserDraft::parse(name, email).expect("valid seed");
        self.repo.insert(&draft).await.expect("seed insert")
    }

    async fn rows(&self) -> Vec<User> {
        self.repo.list_newest_first().await.expect("list")
    }
}

#[fixture]
fn harness() -> Harness {
    let repo = Arc::new(FixtureUserRepository::new());
    let service = UserAdmin::new(repo.clone());
    Harness { repo, service }
}

fn id(raw: i64) -> UserId {
    UserId::new(raw).expect("valid id")
}

#[rstest]
#[tokio::test]
async fn create_inserts_valid_user(harness: Harness) {
    let notice = harness.service.create("Jo", "a@b.com").await.expect("create");
    assert_eq!(notice, Notice::CREATED);

    let rows = harness.rows().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name().as_ref(), "Jo");
    assert_eq!(rows[0].email().as_ref(), "a@b.com");
}

#[rstest]
#[tokio::test]
async fn create_stores_sanitised_values(harness: Harness) {
    harness
        .service
        .create("  Grace   Hopper ", " grace@example.com ")
        .await
        .expect("create");
    let rows = harness.rows().await;
    assert_eq!(rows[0].name().as_ref(), "Grace Hopper");
    assert_eq!(rows[0].email().as_ref(), "grace@example.com");
}

#[rstest]
#[case("A", "a@b.com", "Name must be at least 2 characters.")]
#[case("Jo", "a@b", "Please provide a valid email.")]
#[case(" ", "", "Name must be at least 2 characters. Please provide a valid email.")]
#[tokio::test]
async fn create_rejects_invalid_input_without_writing(
    harness: Harness,
    #[case] name: &str,
    #[case] email: &str,
    #[case] expected: &str,
) {
    let err = harness.service.create(name, email).await.expect_err("invalid");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.message(), expected);
    assert!(harness.rows().await.is_empty());
}

#[rstest]
#[tokio::test]
async fn create_reports_duplicate_email_generically(harness: Harness) {
    harness.seed("Ada", "ada@example.com").await;
    let err = harness
        .service
        .create("Ada Again", "ada@example.com")
        .await
        .expect_err("duplicate");
    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.message(), CREATE_FAILED);
    assert_eq!(harness.rows().await.len(), 1);
}

#[rstest]
#[tokio::test]
async fn find_missing_user_is_not_found(harness: Harness) {
    let err = harness.service.find(id(9999)).await.expect_err("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert!(err.message().contains("not found"));
}

#[rstest]
#[tokio::test]
async fn update_changes_row(harness: Harness) {
    let ada = harness.seed("Ada", "ada@example.com").await;
    let notice = harness
        .service
        .update(ada, "Ada King", "ada.king@example.com")
        .await
        .expect("update");
    assert_eq!(notice, Notice::UPDATED);

    let user = harness.service.find(ada).await.expect("find");
    assert_eq!(user.name().as_ref(), "Ada King");
    assert_eq!(user.email().as_ref(), "ada.king@example.com");
}

#[rstest]
#[tokio::test]
async fn update_with_identical_values_is_neutral_success(harness: Harness) {
    let ada = harness.seed("Ada", "ada@example.com").await;
    let notice = harness
        .service
        .update(ada, " Ada ", "ada@example.com")
        .await
        .expect("unchanged");
    assert_eq!(notice, Notice::UNCHANGED);
}

#[rstest]
#[tokio::test]
async fn update_of_vanished_row_is_not_found(harness: Harness) {
    let err = harness
        .service
        .update(id(42), "Ghost", "ghost@example.com")
        .await
        .expect_err("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn update_cannot_claim_another_users_email(harness: Harness) {
    let ada = harness.seed("Ada", "ada@example.com").await;
    let alan = harness.seed("Alan", "alan@example.com").await;

    let err = harness
        .service
        .update(alan, "Alan", "ada@example.com")
        .await
        .expect_err("conflict");
    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.message(), EMAIL_TAKEN);

    let alan_row = harness.service.find(alan).await.expect("find");
    assert_eq!(alan_row.email().as_ref(), "alan@example.com");
    let ada_row = harness.service.find(ada).await.expect("find");
    assert_eq!(ada_row.email().as_ref(), "ada@example.com");
}

#[rstest]
#[tokio::test]
async fn update_rejects_invalid_input_without_writing(harness: Harness) {
    let ada = harness.seed("Ada", "ada@example.com").await;
    let err = harness
        .service
        .update(ada, "A", "ada@example.com")
        .await
        .expect_err("invalid");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    let row = harness.service.find(ada).await.expect("find");
    assert_eq!(row.name().as_ref(), "Ada");
}

#[rstest]
#[tokio::test]
async fn delete_is_idempotent(harness: Harness) {
    let ada = harness.seed("Ada", "ada@example.com").await;
    assert_eq!(harness.service.delete(ada).await, Ok(Notice::DELETED));
    assert_eq!(harness.service.delete(ada).await, Ok(Notice::DELETED));
    assert_eq!(harness.service.delete(id(9999)).await, Ok(Notice::DELETED));
    assert!(harness.rows().await.is_empty());
}

#[rstest]
#[tokio::test]
async fn update_skips_write_when_email_is_taken() {
    let mut repo = MockUserRepository::new();
    repo.expect_email_owned_by_other()
        .times(1)
        .returning(|_, _| Ok(true));
    repo.expect_update_if_changed().never();

    let service = UserAdmin::new(Arc::new(repo));
    let err = service
        .update(id(1), "Ada", "ada@example.com")
        .await
        .expect_err("conflict");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn concurrent_email_claim_during_update_maps_to_conflict() {
    let mut repo = MockUserRepository::new();
    repo.expect_email_owned_by_other().returning(|_, _| Ok(false));
    repo.expect_update_if_changed()
        .returning(|_, _| Err(UserPersistenceError::duplicate_email()));

    let service = UserAdmin::new(Arc::new(repo));
    let err = service
        .update(id(1), "Ada", "ada@example.com")
        .await
        .expect_err("conflict");
    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.message(), EMAIL_TAKEN);
}

#[rstest]
#[tokio::test]
async fn invalid_input_never_reaches_storage() {
    let mut repo = MockUserRepository::new();
    repo.expect_insert().never();
    repo.expect_email_owned_by_other().never();
    repo.expect_update_if_changed().never();

    let service = UserAdmin::new(Arc::new(repo));
    assert!(service.create("A", "a@b.com").await.is_err());
    assert!(service.update(id(1), "Jo", "broken").await.is_err());
}

#[rstest]
#[case(UserPersistenceError::connection("refused"), ErrorCode::StorageUnavailable, CONNECTION_FAILED)]
#[case(UserPersistenceError::query("syntax error"), ErrorCode::InternalError, DELETE_FAILED)]
#[tokio::test]
async fn delete_maps_storage_failures(
    #[case] failure: UserPersistenceError,
    #[case] code: ErrorCode,
    #[case] message: &str,
) {
    let mut repo = MockUserRepository::new();
    repo.expect_delete()
        .with(eq(id(5)))
        .returning(move |_| Err(failure.clone()));

    let service = UserAdmin::new(Arc::new(repo));
    let err = service.delete(id(5)).await.expect_err("failure");
    assert_eq!(err.code(), code);
    assert_eq!(err.message(), message);
    assert!(!err.message().contains("syntax"));
}

#[rstest]
#[tokio::test]
async fn list_failure_is_generic() {
    let mut repo = MockUserRepository::new();
    repo.expect_list_newest_first()
        .returning(|| Err(UserPersistenceError::query("relation \"users\" does not exist")));

    let service = UserAdmin::new(Arc::new(repo));
    let err = service.list().await.expect_err("failure");
    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), LOAD_FAILED);
}
