//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only depend
//! on the domain service and the page renderer, and remain testable without
//! I/O.

use std::sync::Arc;

use super::views::Views;
use crate::domain::UserAdmin;
use crate::domain::ports::UserRepository;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub users: UserAdmin,
    pub views: Views,
}

impl HttpState {
    /// Construct state from a repository implementation and compiled views.
    pub fn new(repository: Arc<dyn UserRepository>, views: Views) -> Self {
        Self {
            users: UserAdmin::new(repository),
            views,
        }
    }
}
