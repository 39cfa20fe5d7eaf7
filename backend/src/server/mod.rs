//! Server construction and middleware wiring.

mod config;

pub use config::{DatabaseSettings, ServerConfig};

use actix_session::SessionMiddleware;
use actix_session::storage::CookieSessionStore;
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use user_admin::RequestLog;
use user_admin::inbound::http::state::HttpState;
use user_admin::inbound::http::users;

fn build_app(
    http_state: web::Data<HttpState>,
    session: SessionMiddleware<CookieSessionStore>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(http_state)
        .wrap(session)
        .wrap(RequestLog)
        .configure(users::configure)
}

/// Construct the Actix HTTP server.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(http_state: HttpState, config: ServerConfig) -> std::io::Result<Server> {
    let http_state = web::Data::new(http_state);
    let ServerConfig { session, bind_addr } = config;

    let server = HttpServer::new(move || build_app(http_state.clone(), session.middleware()))
        .bind(bind_addr)?
        .run();
    Ok(server)
}
