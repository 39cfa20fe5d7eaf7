//! Inbound adapters that translate external requests into domain service
//! calls while keeping framework details at the edge.
//!
//! HTML form handlers live under [`http`].

pub mod http;
