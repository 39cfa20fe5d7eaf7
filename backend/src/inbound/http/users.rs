//! User administration pages and form handlers.
//!
//! ```text
//! GET  /                  list, create form, banner from ?status=&msg=
//! POST /create            name, email, csrf
//! GET  /edit?id=3         edit form
//! POST /edit              id, name, email, csrf
//! POST /delete            id, csrf
//! ```
//!
//! Every mutation answers with a `303 See Other` carrying a status message.
//! Only a storage outage escapes as an error response.

use std::future::Future;

use actix_web::error::{InternalError, UrlencodedError};
use actix_web::{HttpRequest, HttpResponse, http::header::ContentType, web};
use serde::Deserialize;
use tracing::warn;

use super::ApiResult;
use super::redirect::{Flash, StatusQuery, Target, query_value, redirect};
use super::session::SessionContext;
use super::state::HttpState;
use crate::domain::{Error, ErrorCode, Notice, UserId};

const METHOD_NOT_ALLOWED: &str = "Method Not Allowed";
const MALFORMED_FORM: &str = "Invalid form submission.";

/// Form body for `POST /create`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateForm {
    pub name: String,
    pub email: String,
    pub csrf: String,
}

/// Form body for `POST /edit`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EditForm {
    pub id: String,
    pub name: String,
    pub email: String,
    pub csrf: String,
}

/// Form body for `POST /delete`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeleteForm {
    pub id: String,
    pub csrf: String,
}

/// Query string for `GET /edit`.
#[derive(Debug, Default)]
pub struct EditQuery {
    pub id: Option<String>,
    pub banner: StatusQuery,
}

impl EditQuery {
    pub fn parse(raw: &str) -> Self {
        Self {
            id: query_value(raw, "id"),
            banner: StatusQuery::parse(raw),
        }
    }
}

fn parse_id(raw: &str) -> Result<UserId, Error> {
    UserId::parse(raw).map_err(|err| Error::invalid_request(err.to_string()))
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(body)
}

/// Input problems on the edit form go back to the form; anything else, or an
/// unusable id, goes to the list.
fn edit_or_list(err: &Error, raw_id: &str) -> Target {
    match err.code() {
        ErrorCode::InvalidRequest | ErrorCode::Conflict => {
            UserId::parse(raw_id).map_or(Target::List, Target::Edit)
        }
        _ => Target::List,
    }
}

/// Run one form mutation: verify the CSRF token, then await `action` and
/// turn its outcome into a status redirect.
///
/// `action` is not polled unless the token matches. Fatal errors propagate
/// so the client gets a generic error page.
async fn submit<F>(
    session: &SessionContext,
    csrf: &str,
    action: F,
    on_error: impl FnOnce(&Error) -> Target,
) -> ApiResult<HttpResponse>
where
    F: Future<Output = Result<Notice, Error>>,
{
    if let Err(err) = session.verify_csrf(csrf) {
        return Ok(redirect(Target::List, &Flash::error(&err)));
    }
    match action.await {
        Ok(notice) => Ok(redirect(Target::List, &Flash::success(&notice))),
        Err(err) if err.is_fatal() => Err(err),
        Err(err) => Ok(redirect(on_error(&err), &Flash::error(&err))),
    }
}

/// Render the list page.
///
/// A failed load still renders the page, with an error banner and no rows.
pub async fn list_users(
    state: web::Data<HttpState>,
    session: SessionContext,
    req: HttpRequest,
) -> ApiResult<HttpResponse> {
    let (users, flash) = match state.users.list().await {
        Ok(users) => (users, StatusQuery::parse(req.query_string()).flash()),
        Err(err) if err.is_fatal() => return Err(err),
        Err(err) => (Vec::new(), Some(Flash::error(&err))),
    };
    let csrf = session.csrf_token()?;
    let body = state.views.users_page(&users, flash.as_ref(), &csrf)?;
    Ok(html(body))
}

/// Handle `POST /create`.
pub async fn create_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: web::Form<CreateForm>,
) -> ApiResult<HttpResponse> {
    let form = form.into_inner();
    let action = state.users.create(&form.name, &form.email);
    submit(&session, &form.csrf, action, |_| Target::List).await
}

/// Render the edit form for `?id=`.
pub async fn edit_form(
    state: web::Data<HttpState>,
    session: SessionContext,
    req: HttpRequest,
) -> ApiResult<HttpResponse> {
    let query = EditQuery::parse(req.query_string());
    let id = match parse_id(query.id.as_deref().unwrap_or_default()) {
        Ok(id) => id,
        Err(err) => return Ok(redirect(Target::List, &Flash::error(&err))),
    };
    let user = match state.users.find(id).await {
        Ok(user) => user,
        Err(err) if err.is_fatal() => return Err(err),
        Err(err) => return Ok(redirect(Target::List, &Flash::error(&err))),
    };
    let csrf = session.csrf_token()?;
    let flash = query.banner.flash();
    let body = state.views.edit_page(&user, flash.as_ref(), &csrf)?;
    Ok(html(body))
}

/// Handle `POST /edit`.
pub async fn update_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: web::Form<EditForm>,
) -> ApiResult<HttpResponse> {
    let form = form.into_inner();
    let action = async {
        let id = parse_id(&form.id)?;
        state.users.update(id, &form.name, &form.email).await
    };
    submit(&session, &form.csrf, action, |err| edit_or_list(err, &form.id)).await
}

/// Handle `POST /delete`.
pub async fn delete_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: web::Form<DeleteForm>,
) -> ApiResult<HttpResponse> {
    let form = form.into_inner();
    let action = async {
        let id = parse_id(&form.id)?;
        state.users.delete(id).await
    };
    submit(&session, &form.csrf, action, |_| Target::List).await
}

/// Fallback for verbs a resource does not accept.
pub async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed()
        .content_type(ContentType::plaintext())
        .body(METHOD_NOT_ALLOWED)
}

/// Bodies that cannot be decoded as a form end on the list with a banner,
/// like any other rejected submission.
fn malformed_form(err: UrlencodedError, _req: &HttpRequest) -> actix_web::Error {
    warn!(error = %err, "rejected undecodable form body");
    let flash = Flash::error(&Error::invalid_request(MALFORMED_FORM));
    InternalError::from_response(err, redirect(Target::List, &flash)).into()
}

/// Register the user administration routes.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use user_admin::inbound::http::users;
///
/// let _app = App::new().configure(users::configure);
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::FormConfig::default().error_handler(malformed_form));
    cfg.service(
        web::resource("/")
            .route(web::get().to(list_users))
            .default_service(web::to(method_not_allowed)),
    )
    .service(
        web::resource("/create")
            .route(web::post().to(create_user))
            .default_service(web::to(method_not_allowed)),
    )
    .service(
        web::resource("/edit")
            .route(web::get().to(edit_form))
            .route(web::post().to(update_user))
            .default_service(web::to(method_not_allowed)),
    )
    .service(
        web::resource("/delete")
            .route(web::post().to(delete_user))
            .default_service(web::to(method_not_allowed)),
    );
}
