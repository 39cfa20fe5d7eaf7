//! Domain primitives, ports, and use-cases.
//!
//! Purpose: define the strongly typed user model, the storage port, and the
//! administration service shared by every HTTP endpoint. Nothing here knows
//! about actix, Diesel, or HTML.
//!
//! Public surface:
//! - `Error` / `ErrorCode`: displayable failure with a stable category.
//! - `User`, `UserId`, `UserName`, `Email`, `UserDraft`: validated values.
//! - `clean_string`: form input normalisation.
//! - `UserAdmin` / `Notice`: the create/read/update/delete use-cases.

pub mod error;
pub mod ports;
pub mod sanitize;
pub mod user;
pub mod user_admin;

pub use self::error::{Error, ErrorCode};
pub use self::sanitize::clean_string;
pub use self::user::{
    DraftValidationError, EMAIL_MAX, Email, NAME_MAX, NAME_MIN, User, UserDraft, UserId, UserName,
    UserValidationError,
};
pub use self::user_admin::{Notice, UserAdmin};
