//! HTTP inbound adapter serving the user administration pages.

pub mod csrf;
pub mod error;
pub mod redirect;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod views;

pub use error::ApiResult;
