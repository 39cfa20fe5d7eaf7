//! CSRF tokens for the HTML forms.

use std::fmt;

use rand::RngCore;
use subtle::ConstantTimeEq;

const TOKEN_BYTES: usize = 32;

/// Random per-session token embedded in every mutating form.
#[derive(Clone, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    /// Generate a fresh token from 32 random bytes, hex encoded.
    pub fn generate() -> Self {
        let mut bytes = [0_u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Wrap a token previously stored in the session.
    pub(crate) fn from_stored(raw: String) -> Option<Self> {
        (!raw.is_empty()).then_some(Self(raw))
    }

    /// Compare against a submitted value in constant time.
    ///
    /// # Examples
    /// ```
    /// use user_admin::inbound::http::csrf::CsrfToken;
    ///
    /// let token = CsrfToken::generate();
    /// assert!(token.matches(token.as_str()));
    /// assert!(!token.matches(""));
    /// ```
    pub fn matches(&self, submitted: &str) -> bool {
        self.0.as_bytes().ct_eq(submitted.as_bytes()).into()
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

// Keep tokens out of logs.
impl fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CsrfToken(..)")
    }
}
