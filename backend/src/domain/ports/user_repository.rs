//! Port abstraction for user persistence adapters and their errors.

use async_trait::async_trait;

use crate::domain::{Email, User, UserDraft, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// The unique constraint on `email` rejected the write.
        DuplicateEmail => "user repository rejected a duplicate email",
    }
}

/// Storage operations behind the user administration screens.
///
/// Every implementation must bind values as statement parameters; none may
/// splice them into SQL text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch all users, highest id first.
    async fn list_newest_first(&self) -> Result<Vec<User>, UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Insert a new user and return the generated identifier.
    async fn insert(&self, draft: &UserDraft) -> Result<UserId, UserPersistenceError>;

    /// Whether a user other than `id` already owns `email`.
    async fn email_owned_by_other(
        &self,
        email: &Email,
        id: UserId,
    ) -> Result<bool, UserPersistenceError>;

    /// Overwrite name and email, touching the row only when a value differs.
    ///
    /// Returns the number of rows changed, so `0` means the row is missing
    /// or already holds these values.
    async fn update_if_changed(
        &self,
        id: UserId,
        draft: &UserDraft,
    ) -> Result<usize, UserPersistenceError>;

    /// Whether a row with `id` exists.
    async fn exists(&self, id: UserId) -> Result<bool, UserPersistenceError>;

    /// Delete by identifier, returning the number of rows removed.
    async fn delete(&self, id: UserId) -> Result<usize, UserPersistenceError>;
}

#[cfg(any(test, feature = "test-support"))]
pub use fixture::FixtureUserRepository;

#[cfg(any(test, feature = "test-support"))]
mod fixture {
    use std::collections::BTreeMap;
    use std::sync::{Mutex, MutexGuard};

    use async_trait::async_trait;

    use super::{UserPersistenceError, UserRepository};
    use crate::domain::{Email, User, UserDraft, UserId};

    #[derive(Debug)]
    struct FixtureState {
        rows: BTreeMap<UserId, User>,
        next_id: i64,
    }

    impl Default for FixtureState {
        fn default() -> Self {
            Self {
                rows: BTreeMap::new(),
                next_id: 1,
            }
        }
    }

    impl FixtureState {
        fn email_taken(&self, email: &Email, except: Option<UserId>) -> bool {
            self.rows
                .values()
                .any(|user| user.email() == email && Some(user.id()) != except)
        }
    }

    /// In-memory repository mirroring the PostgreSQL adapter's semantics,
    /// including the unique email constraint and identity sequence.
    #[derive(Debug, Default)]
    pub struct FixtureUserRepository {
        state: Mutex<FixtureState>,
    }

    impl FixtureUserRepository {
        /// Create an empty repository.
        pub fn new() -> Self {
            Self::default()
        }

        /// Store a row as-is, bypassing input validation, the way rows
        /// written by older tooling may look.
        pub fn insert_stored(
            &self,
            name: &str,
            email: &str,
        ) -> Result<UserId, UserPersistenceError> {
            let mut state = self.lock()?;
            let id = UserId::new(state.next_id)
                .map_err(|_| UserPersistenceError::query("identity sequence exhausted"))?;
            state.next_id += 1;
            state
                .rows
                .insert(id, User::from_stored(id, name.to_owned(), email.to_owned()));
            Ok(id)
        }

        fn lock(&self) -> Result<MutexGuard<'_, FixtureState>, UserPersistenceError> {
            self.state
                .lock()
                .map_err(|_| UserPersistenceError::query("fixture state poisoned"))
        }
    }

    #[async_trait]
    impl UserRepository for FixtureUserRepository {
        async fn list_newest_first(&self) -> Result<Vec<User>, UserPersistenceError> {
            Ok(self.lock()?.rows.values().rev().cloned().collect())
        }

        async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
            Ok(self.lock()?.rows.get(&id).cloned())
        }

        async fn insert(&self, draft: &UserDraft) -> Result<UserId, UserPersistenceError> {
            let mut state = self.lock()?;
            if state.email_taken(draft.email(), None) {
                return Err(UserPersistenceError::duplicate_email());
            }
            let id = UserId::new(state.next_id)
                .map_err(|_| UserPersistenceError::query("identity sequence exhausted"))?;
            state.next_id += 1;
            state.rows.insert(id, User::new(id, draft.clone()));
            Ok(id)
        }

        async fn email_owned_by_other(
            &self,
            email: &Email,
            id: UserId,
        ) -> Result<bool, UserPersistenceError> {
            Ok(self.lock()?.email_taken(email, Some(id)))
        }

        async fn update_if_changed(
            &self,
            id: UserId,
            draft: &UserDraft,
        ) -> Result<usize, UserPersistenceError> {
            let mut state = self.lock()?;
            if state.email_taken(draft.email(), Some(id)) {
                return Err(UserPersistenceError::duplicate_email());
            }
            match state.rows.get_mut(&id) {
                Some(user) if !user.matches(draft) => {
                    *user = User::new(id, draft.clone());
                    Ok(1)
                }
                _ => Ok(0),
            }
        }

        async fn exists(&self, id: UserId) -> Result<bool, UserPersistenceError> {
            Ok(self.lock()?.rows.contains_key(&id))
        }

        async fn delete(&self, id: UserId) -> Result<usize, UserPersistenceError> {
            Ok(usize::from(self.lock()?.rows.remove(&id).is_some()))
        }
    }
}
