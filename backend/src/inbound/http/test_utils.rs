//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, test, web};

use super::session_config::{SESSION_COOKIE_NAME, SessionSettings};
use super::state::HttpState;
use super::users;
use super::views::Views;
use crate::domain::ports::UserRepository;

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Disables the `Secure` flag for local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionSettings {
        key: Key::generate(),
        cookie_secure: false,
    }
    .middleware()
}

/// The user routes over `repository`, behind a test session.
pub fn users_app(
    repository: Arc<dyn UserRepository>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let views = Views::new().expect("bundled templates compile");
    App::new()
        .app_data(web::Data::new(HttpState::new(repository, views)))
        .wrap(test_session_middleware())
        .configure(users::configure)
}

/// Pull the first CSRF field value out of a rendered page.
pub fn csrf_from_html(html: &str) -> String {
    let marker = "name=\"csrf\" value=\"";
    let start = html.find(marker).expect("page embeds a csrf field") + marker.len();
    let len = html[start..].find('"').expect("csrf value is quoted");
    html[start..start + len].to_owned()
}

/// Read the session cookie and the CSRF token from a rendered page.
pub async fn session_from_page<B: MessageBody>(
    res: ServiceResponse<B>,
) -> (Cookie<'static>, String) {
    let cookie = res
        .response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .expect("session cookie set")
        .into_owned();
    let body = test::read_body(res).await;
    let html = String::from_utf8(body.to_vec()).expect("utf-8 page");
    (cookie, csrf_from_html(&html))
}

/// The `Location` header of a redirect.
pub fn location<B>(res: &ServiceResponse<B>) -> String {
    res.headers()
        .get(actix_web::http::header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .expect("redirect has a location")
        .to_owned()
}
