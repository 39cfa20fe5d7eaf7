//! Server-rendered user administration over a single `users` table.

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

pub use middleware::RequestLog;
