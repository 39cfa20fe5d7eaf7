//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! The session is the per-browser key-value store holding the CSRF token.
//! Handlers receive it as an extractor instead of reaching for global state.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use super::csrf::CsrfToken;
use crate::domain::Error;

pub(crate) const CSRF_KEY: &str = "csrf";
const INVALID_CSRF: &str = "Invalid CSRF token.";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    fn stored_token(&self) -> Result<Option<CsrfToken>, Error> {
        let raw = self
            .0
            .get::<String>(CSRF_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        Ok(raw.and_then(CsrfToken::from_stored))
    }

    /// Return the session's CSRF token, creating it on first use.
    pub fn csrf_token(&self) -> Result<CsrfToken, Error> {
        if let Some(token) = self.stored_token()? {
            return Ok(token);
        }
        let token = CsrfToken::generate();
        self.0
            .insert(CSRF_KEY, token.as_str())
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))?;
        Ok(token)
    }

    /// Check a submitted token against the session.
    ///
    /// A session without a token, or one that cannot be read, never matches.
    pub fn verify_csrf(&self, submitted: &str) -> Result<(), Error> {
        let stored = self.stored_token().unwrap_or_else(|error| {
            warn!(%error, "unreadable session during CSRF check");
            None
        });
        match stored {
            Some(token) if token.matches(submitted) => Ok(()),
            Some(_) => {
                warn!("CSRF token mismatch");
                Err(Error::forbidden(INVALID_CSRF))
            }
            None => {
                warn!("CSRF check without session token");
                Err(Error::forbidden(INVALID_CSRF))
            }
        }
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
