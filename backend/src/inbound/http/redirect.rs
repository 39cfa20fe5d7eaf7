//! Status/message redirects.
//!
//! Every mutation ends in a `303 See Other` whose query string carries a
//! coarse `status` and a human-readable `msg` for the next page to display.

use actix_web::HttpResponse;
use actix_web::http::header;
use url::form_urlencoded;

use crate::domain::{Error, Notice, UserId};

/// Outcome category shown in the banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "success" => Some(Self::Success),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// A status and message pair travelling through a redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    status: Status,
    msg: String,
}

impl Flash {
    pub fn success(notice: &Notice) -> Self {
        Self {
            status: Status::Success,
            msg: notice.message().to_owned(),
        }
    }

    pub fn error(error: &Error) -> Self {
        Self {
            status: Status::Error,
            msg: error.message().to_owned(),
        }
    }

    /// Rebuild a flash from query parameters, ignoring unknown statuses and
    /// empty messages.
    pub fn from_query(status: Option<&str>, msg: Option<&str>) -> Option<Self> {
        let status = Status::parse(status?)?;
        let msg = msg.map(str::trim).filter(|msg| !msg.is_empty())?;
        Some(Self {
            status,
            msg: msg.to_owned(),
        })
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn msg(&self) -> &str {
        &self.msg
    }
}

/// First value of `key` in a raw query string.
///
/// Repeated keys keep their first occurrence and unknown keys are ignored,
/// so no query string can turn a page view into an error.
pub fn query_value(raw: &str, key: &str) -> Option<String> {
    form_urlencoded::parse(raw.as_bytes())
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.into_owned())
}

/// Banner parameters accepted by the list view.
#[derive(Debug, Default)]
pub struct StatusQuery {
    pub status: Option<String>,
    pub msg: Option<String>,
}

impl StatusQuery {
    pub fn parse(raw: &str) -> Self {
        Self {
            status: query_value(raw, "status"),
            msg: query_value(raw, "msg"),
        }
    }

    pub fn flash(&self) -> Option<Flash> {
        Flash::from_query(self.status.as_deref(), self.msg.as_deref())
    }
}

/// Page a redirect lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    List,
    Edit(UserId),
}

impl Target {
    /// Build the `Location` value, e.g. `/edit?id=3&status=error&msg=...`.
    ///
    /// # Examples
    /// ```
    /// use user_admin::domain::{Error, UserId};
    /// use user_admin::inbound::http::redirect::{Flash, Target};
    ///
    /// let flash = Flash::error(&Error::not_found("User not found."));
    /// assert_eq!(
    ///     Target::List.location(&flash),
    ///     "/?status=error&msg=User+not+found."
    /// );
    /// ```
    pub fn location(self, flash: &Flash) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        let path = match self {
            Self::List => "/",
            Self::Edit(id) => {
                query.append_pair("id", &id.to_string());
                "/edit"
            }
        };
        query
            .append_pair("status", flash.status.as_str())
            .append_pair("msg", &flash.msg);
        format!("{path}?{}", query.finish())
    }
}

/// Redirect to `target` carrying `flash`.
pub fn redirect(target: Target, flash: &Flash) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, target.location(flash)))
        .finish()
}
