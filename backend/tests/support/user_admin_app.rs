//! Full application harness for HTTP integration tests.
//!
//! Mirrors the production wiring: request logging outermost, then the
//! encrypted cookie session, then the user routes.

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header;
use actix_web::{App, test, web};
use user_admin::RequestLog;
use user_admin::domain::ports::UserRepository;
use user_admin::inbound::http::session_config::{SESSION_COOKIE_NAME, SessionSettings};
use user_admin::inbound::http::state::HttpState;
use user_admin::inbound::http::users;
use user_admin::inbound::http::views::Views;

pub fn app(
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
    let session = SessionSettings {
        key: Key::generate(),
        cookie_secure: false,
    };
    App::new()
        .app_data(web::Data::new(HttpState::new(repository, views)))
        .wrap(session.middleware())
        .wrap(RequestLog)
        .configure(users::configure)
}

/// A browser-side view of one session: its cookie and CSRF token.
pub struct Browser {
    pub cookie: Cookie<'static>,
    pub csrf: String,
}

impl Browser {
    /// Build from the response to a page load.
    pub async fn from_page<B: MessageBody>(res: ServiceResponse<B>) -> Self {
        let cookie = res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
            .expect("session cookie set")
            .into_owned();
        let html = body_text(res).await;
        let marker = "name=\"csrf\" value=\"";
        let start = html.find(marker).expect("page embeds a csrf field") + marker.len();
        let len = html[start..].find('"').expect("csrf value is quoted");
        Self {
            cookie,
            csrf: html[start..start + len].to_owned(),
        }
    }

    pub fn get(&self, uri: &str) -> test::TestRequest {
        test::TestRequest::get().uri(uri).cookie(self.cookie.clone())
    }

    /// A form POST carrying the session cookie and the CSRF token.
    pub fn post(&self, uri: &str, fields: &[(&str, &str)]) -> test::TestRequest {
        let mut form: Vec<(&str, &str)> = fields.to_vec();
        form.push(("csrf", self.csrf.as_str()));
        test::TestRequest::post()
            .uri(uri)
            .cookie(self.cookie.clone())
            .set_form(&form)
    }
}

pub async fn body_text<B: MessageBody>(res: ServiceResponse<B>) -> String {
    String::from_utf8(test::read_body(res).await.to_vec()).expect("utf-8 body")
}

pub fn location<B>(res: &ServiceResponse<B>) -> String {
    res.headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .expect("redirect has a location")
        .to_owned()
}
