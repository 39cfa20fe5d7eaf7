//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod user_repository;

#[cfg(test)]
pub use user_repository::MockUserRepository;
#[cfg(any(test, feature = "test-support"))]
pub use user_repository::FixtureUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
