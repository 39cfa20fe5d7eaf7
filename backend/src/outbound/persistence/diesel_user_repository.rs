//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! All values travel as bound parameters through Diesel's query builder.

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{Email, User, UserDraft, UserId};

use super::models::{NewUserRow, UserRow, UserUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    UserPersistenceError::connection(error.into_message())
}

/// Map Diesel errors to user persistence errors.
///
/// Only the unique constraint on `email` can raise `UniqueViolation` for
/// this table, so it maps straight to `DuplicateEmail`.
fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = info.constraint_name(),
                "diesel operation failed"
            );
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            UserPersistenceError::duplicate_email()
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            UserPersistenceError::connection("database connection error")
        }
        DieselError::NotFound => UserPersistenceError::query("record not found"),
        DieselError::QueryBuilderError(_) => UserPersistenceError::query("database query error"),
        _ => UserPersistenceError::query("database error"),
    }
}

/// Rows are taken as stored; only the identifier is checked, and the schema
/// already guarantees it is positive.
fn row_to_user(row: UserRow) -> Result<User, UserPersistenceError> {
    let UserRow { id, name, email, .. } = row;
    let id = UserId::new(id)
        .map_err(|_| UserPersistenceError::query(format!("stored user has invalid id {id}")))?;
    Ok(User::from_stored(id, name, email))
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn list_newest_first(&self) -> Result<Vec<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<UserRow> = users::table
            .order(users::id.desc())
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_user).collect()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .find(id.get())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user).transpose()
    }

    async fn insert(&self, draft: &UserDraft) -> Result<UserId, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewUserRow {
            name: draft.name().as_ref(),
            email: draft.email().as_ref(),
        };
        let id: i64 = diesel::insert_into(users::table)
            .values(&new_row)
            .returning(users::id)
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        UserId::new(id)
            .map_err(|_| UserPersistenceError::query(format!("sequence produced invalid id {id}")))
    }

    async fn email_owned_by_other(
        &self,
        email: &Email,
        id: UserId,
    ) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::select(exists(
            users::table
                .filter(users::email.eq(email.as_ref()))
                .filter(users::id.ne(id.get())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn update_if_changed(
        &self,
        id: UserId,
        draft: &UserDraft,
    ) -> Result<usize, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let name = draft.name().as_ref();
        let email = draft.email().as_ref();
        // PostgreSQL counts matched rows, so identical values are filtered out
        // here to make a zero count mean "missing or unchanged".
        diesel::update(
            users::table
                .filter(users::id.eq(id.get()))
                .filter(users::name.ne(name).or(users::email.ne(email))),
        )
        .set(&UserUpdate { name, email })
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn exists(&self, id: UserId) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::select(exists(users::table.find(id.get())))
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn delete(&self, id: UserId) -> Result<usize, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::delete(users::table.find(id.get()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)
    }
}
