//! User data model.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::OnceLock;

use regex::Regex;

use super::sanitize::clean_string;

/// Minimum allowed length for a name, counted in characters.
pub const NAME_MIN: usize = 2;
/// Maximum stored length for a name; longer input is truncated.
pub const NAME_MAX: usize = 80;
/// Maximum stored length for an email; longer input is truncated.
pub const EMAIL_MAX: usize = 120;
const EMAIL_LOCAL_MAX: usize = 64;

/// Validation errors returned by the user value constructors.
///
/// The `Display` text is shown to the person filling in the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserValidationError {
    InvalidId,
    NameTooShort { min: usize },
    InvalidEmail,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "Invalid user ID."),
            Self::NameTooShort { min } => {
                write!(f, "Name must be at least {min} characters.")
            }
            Self::InvalidEmail => write!(f, "Please provide a valid email."),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Storage-generated user identifier. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(i64);

impl UserId {
    /// Validate and wrap a numeric identifier.
    pub fn new(id: i64) -> Result<Self, UserValidationError> {
        if id > 0 {
            Ok(Self(id))
        } else {
            Err(UserValidationError::InvalidId)
        }
    }

    /// Parse an identifier from a query string or form field.
    ///
    /// Surrounding whitespace is ignored; anything other than a positive
    /// decimal integer is rejected.
    ///
    /// # Examples
    /// ```
    /// use user_admin::domain::UserId;
    ///
    /// assert_eq!(UserId::parse(" 42 ").map(UserId::get), Ok(42));
    /// assert!(UserId::parse("0").is_err());
    /// assert!(UserId::parse("1; DROP TABLE users").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, UserValidationError> {
        let id = raw
            .trim()
            .parse::<i64>()
            .map_err(|_| UserValidationError::InvalidId)?;
        Self::new(id)
    }

    /// Access the raw integer.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whitespace-normalised display name of 2 to 80 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserName(String);

impl UserName {
    /// Sanitise and validate raw input.
    pub fn new(raw: &str) -> Result<Self, UserValidationError> {
        let cleaned = clean_string(raw, NAME_MAX);
        if cleaned.chars().count() < NAME_MIN {
            return Err(UserValidationError::NameTooShort { min: NAME_MIN });
        }
        Ok(Self(cleaned))
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Syntactically valid email address of at most 120 characters.
///
/// The domain is either a dotted host name whose last label starts with a
/// letter (or is an `xn--` label), or a bracketed address literal such as
/// `[192.0.2.1]` or `[IPv6:2001:db8::1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email(String);

static LOCAL_PART_RE: OnceLock<Regex> = OnceLock::new();
static HOST_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
}

fn local_part_regex() -> &'static Regex {
    LOCAL_PART_RE.get_or_init(|| {
        compile(concat!(
            r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+",
            r"(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*$",
        ))
    })
}

fn host_name_regex() -> &'static Regex {
    HOST_NAME_RE.get_or_init(|| {
        compile(concat!(
            r"^(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+",
            r"(?:[A-Za-z][A-Za-z0-9]*|xn--[A-Za-z0-9]+)(?:-+[A-Za-z0-9]+)*$",
        ))
    })
}

fn is_address_literal(literal: &str) -> bool {
    match literal.strip_prefix("IPv6:") {
        Some(v6) => v6.parse::<Ipv6Addr>().is_ok(),
        None => literal.parse::<Ipv4Addr>().is_ok(),
    }
}

fn is_valid_domain(domain: &str) -> bool {
    match domain.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
        Some(literal) => is_address_literal(literal),
        None => host_name_regex().is_match(domain),
    }
}

impl Email {
    /// Sanitise and validate raw input.
    ///
    /// # Examples
    /// ```
    /// use user_admin::domain::Email;
    ///
    /// assert!(Email::new("ip@[127.0.0.1]").is_ok());
    /// assert!(Email::new("a@127.0.0.1").is_err());
    /// ```
    pub fn new(raw: &str) -> Result<Self, UserValidationError> {
        let cleaned = clean_string(raw, EMAIL_MAX);
        let valid = cleaned.rsplit_once('@').is_some_and(|(local, domain)| {
            local.len() <= EMAIL_LOCAL_MAX
                && local_part_regex().is_match(local)
                && is_valid_domain(domain)
        });
        if !valid {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(cleaned))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// All field failures collected while validating a submitted form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftValidationError(Vec<UserValidationError>);

impl DraftValidationError {
    /// Individual failures in field order.
    pub fn errors(&self) -> &[UserValidationError] {
        &self.0
    }
}

impl fmt::Display for DraftValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&messages.join(" "))
    }
}

impl std::error::Error for DraftValidationError {}

/// Validated name and email pair, ready to be written.
///
/// ## Invariants
/// - both fields are sanitised;
/// - `name` has at least [`NAME_MIN`] characters;
/// - `email` matches the address grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    name: UserName,
    email: Email,
}

impl UserDraft {
    /// Validate raw form values, reporting every failing field at once.
    ///
    /// # Examples
    /// ```
    /// use user_admin::domain::UserDraft;
    ///
    /// let err = UserDraft::parse("A", "nope").expect_err("both fields invalid");
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Name must be at least 2 characters. Please provide a valid email."
    /// );
    /// ```
    pub fn parse(name: &str, email: &str) -> Result<Self, DraftValidationError> {
        match (UserName::new(name), Email::new(email)) {
            (Ok(name), Ok(email)) => Ok(Self { name, email }),
            (name, email) => Err(DraftValidationError(
                [name.err(), email.err()].into_iter().flatten().collect(),
            )),
        }
    }

    pub fn name(&self) -> &UserName {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }
}

/// Persisted user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    name: UserName,
    email: Email,
}

impl User {
    /// Combine a stored identifier with validated fields.
    pub fn new(id: UserId, draft: UserDraft) -> Self {
        let UserDraft { name, email } = draft;
        Self { id, name, email }
    }

    /// Wrap values read back from storage.
    ///
    /// Stored rows are shown as they are, even when they would fail today's
    /// input rules, so that they can still be listed, edited, and deleted.
    pub fn from_stored(id: UserId, name: String, email: String) -> Self {
        Self {
            id,
            name: UserName(name),
            email: Email(email),
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn name(&self) -> &UserName {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Whether the stored values already equal the draft.
    pub fn matches(&self, draft: &UserDraft) -> bool {
        self.name == draft.name && self.email == draft.email
    }
}
