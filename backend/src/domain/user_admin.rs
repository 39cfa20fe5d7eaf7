//! User administration use-cases.
//!
//! Each operation sanitises and validates its input, talks to the
//! [`UserRepository`] port, and returns either a [`Notice`] for the success
//! banner or a domain [`Error`] whose message is safe to display. Storage
//! diagnostics are logged here and never copied into messages.

use std::fmt;
use std::sync::Arc;

use tracing::{error, info};

use super::ports::{UserPersistenceError, UserRepository};
use super::{Error, User, UserDraft, UserId};

const USER_NOT_FOUND: &str = "User not found.";
const CONNECTION_FAILED: &str = "Database connection error.";
const LOAD_FAILED: &str = "Could not load users.";
const CREATE_FAILED: &str = "Could not create user. Email may already exist.";
const UPDATE_FAILED: &str = "Could not update user.";
const DELETE_FAILED: &str = "Could not delete user.";
const EMAIL_TAKEN: &str = "Another user already uses this email.";

/// Success message shown after a completed mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice(&'static str);

impl Notice {
    pub const CREATED: Self = Self("User created successfully.");
    pub const UPDATED: Self = Self("User updated successfully.");
    pub const UNCHANGED: Self = Self("No changes were made.");
    pub const DELETED: Self = Self("User deleted successfully.");

    pub fn message(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Map a persistence failure to a displayable error.
///
/// Connection failures become fatal; everything else, including constraint
/// violations the caller did not anticipate, becomes `fallback`.
fn storage_error(err: UserPersistenceError, fallback: &'static str) -> Error {
    match err {
        UserPersistenceError::Connection { .. } => {
            error!(error = %err, "user storage unreachable");
            Error::storage_unavailable(CONNECTION_FAILED)
        }
        UserPersistenceError::DuplicateEmail => Error::conflict(fallback),
        UserPersistenceError::Query { .. } => {
            error!(error = %err, "user storage query failed");
            Error::internal(fallback)
        }
    }
}

fn validate(name: &str, email: &str) -> Result<UserDraft, Error> {
    UserDraft::parse(name, email).map_err(|err| Error::invalid_request(err.to_string()))
}

/// Service implementing list, read, create, update, and delete.
#[derive(Clone)]
pub struct UserAdmin {
    repository: Arc<dyn UserRepository>,
}

impl UserAdmin {
    /// Build the service over a repository implementation.
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    /// All users, newest first.
    pub async fn list(&self) -> Result<Vec<User>, Error> {
        self.repository
            .list_newest_first()
            .await
            .map_err(|err| storage_error(err, LOAD_FAILED))
    }

    /// A single user for the edit form.
    pub async fn find(&self, id: UserId) -> Result<User, Error> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(|err| storage_error(err, LOAD_FAILED))?
            .ok_or_else(|| Error::not_found(USER_NOT_FOUND))
    }

    /// Validate and insert a new user.
    ///
    /// Duplicate emails are left to the storage constraint and reported with
    /// a generic hint rather than the raw constraint error.
    pub async fn create(&self, name: &str, email: &str) -> Result<Notice, Error> {
        let draft = validate(name, email)?;
        let id = self
            .repository
            .insert(&draft)
            .await
            .map_err(|err| storage_error(err, CREATE_FAILED))?;
        info!(user_id = %id, "user created");
        Ok(Notice::CREATED)
    }

    /// Validate and apply an edit.
    ///
    /// The email ownership check runs before the write. A zero row count is
    /// resolved with an existence check: a vanished row is `NotFound`, an
    /// unchanged one is a neutral success.
    pub async fn update(&self, id: UserId, name: &str, email: &str) -> Result<Notice, Error> {
        let draft = validate(name, email)?;

        let taken = self
            .repository
            .email_owned_by_other(draft.email(), id)
            .await
            .map_err(|err| storage_error(err, UPDATE_FAILED))?;
        if taken {
            return Err(Error::conflict(EMAIL_TAKEN));
        }

        let changed = self
            .repository
            .update_if_changed(id, &draft)
            .await
            .map_err(|err| match err {
                UserPersistenceError::DuplicateEmail => Error::conflict(EMAIL_TAKEN),
                other => storage_error(other, UPDATE_FAILED),
            })?;
        if changed > 0 {
            info!(user_id = %id, "user updated");
            return Ok(Notice::UPDATED);
        }

        let exists = self
            .repository
            .exists(id)
            .await
            .map_err(|err| storage_error(err, UPDATE_FAILED))?;
        if exists {
            Ok(Notice::UNCHANGED)
        } else {
            Err(Error::not_found(USER_NOT_FOUND))
        }
    }

    /// Delete a user. Deleting an absent id still succeeds.
    pub async fn delete(&self, id: UserId) -> Result<Notice, Error> {
        let removed = self
            .repository
            .delete(id)
            .await
            .map_err(|err| storage_error(err, DELETE_FAILED))?;
        info!(user_id = %id, removed, "user delete processed");
        Ok(Notice::DELETED)
    }
}

#[cfg(test)]
mod tests;
