//! HTML pages rendered with `minijinja`.
//!
//! Templates are compiled into the binary and registered under `.html`
//! names, which turns on HTML auto-escaping for every interpolated value.

use std::sync::Arc;

use minijinja::Environment;
use serde::Serialize;
use tracing::error;

use super::csrf::CsrfToken;
use super::redirect::Flash;
use crate::domain::{EMAIL_MAX, Error, NAME_MAX, User};

const USERS_TEMPLATE: &str = "users.html";
const EDIT_TEMPLATE: &str = "edit.html";

#[derive(Serialize)]
struct FlashView<'a> {
    status: &'static str,
    msg: &'a str,
}

impl<'a> From<&'a Flash> for FlashView<'a> {
    fn from(flash: &'a Flash) -> Self {
        Self {
            status: flash.status().as_str(),
            msg: flash.msg(),
        }
    }
}

#[derive(Serialize)]
struct UserView<'a> {
    id: i64,
    name: &'a str,
    email: &'a str,
}

impl<'a> From<&'a User> for UserView<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            id: user.id().get(),
            name: user.name().as_ref(),
            email: user.email().as_ref(),
        }
    }
}

#[derive(Serialize)]
struct UsersPage<'a> {
    users: Vec<UserView<'a>>,
    flash: Option<FlashView<'a>>,
    csrf: &'a str,
    name_max: usize,
    email_max: usize,
}

#[derive(Serialize)]
struct EditPage<'a> {
    user: UserView<'a>,
    flash: Option<FlashView<'a>>,
    csrf: &'a str,
    name_max: usize,
    email_max: usize,
}

/// Compiled page templates shared across workers.
#[derive(Clone)]
pub struct Views {
    env: Arc<Environment<'static>>,
}

impl Views {
    /// Compile the bundled templates.
    pub fn new() -> Result<Self, Error> {
        let mut env = Environment::new();
        env.add_template(
            USERS_TEMPLATE,
            include_str!("../../../templates/users.html"),
        )
        .map_err(template_error)?;
        env.add_template(EDIT_TEMPLATE, include_str!("../../../templates/edit.html"))
            .map_err(template_error)?;
        Ok(Self { env: Arc::new(env) })
    }

    /// The list page: banner, create form, and the user table.
    pub fn users_page(
        &self,
        users: &[User],
        flash: Option<&Flash>,
        csrf: &CsrfToken,
    ) -> Result<String, Error> {
        let page = UsersPage {
            users: users.iter().map(UserView::from).collect(),
            flash: flash.map(FlashView::from),
            csrf: csrf.as_str(),
            name_max: NAME_MAX,
            email_max: EMAIL_MAX,
        };
        self.render(USERS_TEMPLATE, &page)
    }

    /// The edit form pre-filled with the stored values.
    pub fn edit_page(
        &self,
        user: &User,
        flash: Option<&Flash>,
        csrf: &CsrfToken,
    ) -> Result<String, Error> {
        let page = EditPage {
            user: UserView::from(user),
            flash: flash.map(FlashView::from),
            csrf: csrf.as_str(),
            name_max: NAME_MAX,
            email_max: EMAIL_MAX,
        };
        self.render(EDIT_TEMPLATE, &page)
    }

    fn render<S: Serialize>(&self, name: &str, page: &S) -> Result<String, Error> {
        self.env
            .get_template(name)
            .and_then(|template| template.render(page))
            .map_err(template_error)
    }
}

fn template_error(err: minijinja::Error) -> Error {
    error!(error = %err, "template rendering failed");
    Error::internal("failed to render page")
}
