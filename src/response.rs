//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! Build a [`Response`] in your handler and return it. Error pages come from
//! [`Response::error`] (with the request at hand) or from returning an
//! [`Error`] (without).

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http_body_util::Full;
use tracing::{error, warn};

use crate::error::Error;
use crate::negotiate::NotAcceptable;
use crate::page::{self, DefaultShell, PageShell, escape_html};
use crate::request::Request;
use crate::status::Status;
use crate::uri::UrlBase;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for use with [`ResponseBuilder::bytes`].
pub enum ContentType {
    Csv,          // text/csv
    FormData,     // application/x-www-form-urlencoded
    Html,         // text/html; charset=utf-8
    Json,         // application/json
    OctetStream,  // application/octet-stream
    Tdv,          // text/tdv  (tab-delimited values)
    Text,         // text/plain; charset=utf-8
    Xhtml,        // application/xhtml+xml; charset=utf-8
    Xml,          // application/xml
}

impl ContentType {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Csv         => "text/csv",
            Self::FormData    => "application/x-www-form-urlencoded",
            Self::Html        => "text/html; charset=utf-8",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Tdv         => "text/tdv",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Xhtml       => "application/xhtml+xml; charset=utf-8",
            Self::Xml         => "application/xml",
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// # Shortcuts (200 OK, no custom headers needed)
///
/// ```rust
/// use restkit::{Response, Status};
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::status(Status::NoContent);
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use restkit::{Response, Status, UrlBase};
///
/// let base = UrlBase::new(false, "example.org", 80);
/// Response::builder()
///     .status(Status::Created)
///     .location(&base, "/users/42")
///     .json(br#"{"id":42}"#.to_vec());
///
/// Response::builder()
///     .content_type("text/csv; charset=UTF-8")
///     .body(b"\"Name\"\r\n".to_vec());
/// ```
#[derive(Debug)]
pub struct Response {
    pub(crate) body: Vec<u8>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) status: u16,
}

impl Response {
    /// `200 OK`, `application/json`.
    pub fn json(body: Vec<u8>) -> Self {
        Self::bytes_raw("application/json", body)
    }

    /// `200 OK`, `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::bytes_raw("text/plain; charset=utf-8", body.into().into_bytes())
    }

    /// Response with no body.
    pub fn status(code: Status) -> Self {
        Self { body: Vec::new(), headers: Vec::new(), status: code.into() }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: Status::Ok.into() }
    }

    /// XHTML error page for `status`, framed by the configured page shell
    /// and typed for the client's browser.
    ///
    /// `message` is HTML; plain text is wrapped in a paragraph. Server errors
    /// (5xx) are also logged at `error` level.
    pub fn error(req: &Request, status: Status, message: &str) -> Self {
        let config = req.config();
        let media_type = format!("{}; charset=UTF-8", req.best_xhtml_type());
        render_error(config.page_shell(), config.stylesheet_href(), &media_type, status, message)
    }

    /// Like [`Response::error`], for an [`Error`] raised while handling `req`.
    pub fn from_error(req: &Request, err: &Error) -> Self {
        let (status, message) = describe(err);
        let mut response = Self::error(req, status, &message);
        response.headers.extend(extra_headers(err));
        response
    }

    /// `406 Not Acceptable` listing the media types the server could produce.
    pub fn not_acceptable(req: &Request, err: &NotAcceptable) -> Self {
        Self::error(req, Status::NotAcceptable, &not_acceptable_message(err))
    }

    fn bytes_raw(content_type: &str, body: Vec<u8>) -> Self {
        Self {
            body,
            headers: vec![("content-type".to_owned(), content_type.to_owned())],
            status: Status::Ok.into(),
        }
    }

    pub fn status_code(&self) -> u16 { self.status }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Converts into the `http` crate's response for hyper. Headers that are
    /// not valid on the wire are dropped with a warning.
    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(Bytes::from(self.body)));
        *res.status_mut() = http::StatusCode::from_u16(self.status)
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
        let headers = res.headers_mut();
        for (name, value) in self.headers {
            match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(&value)) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => warn!(header = %name, "dropping invalid response header"),
            }
        }
        res
    }
}

fn render_error(
    shell: &dyn PageShell,
    stylesheet: Option<&str>,
    media_type: &str,
    status: Status,
    message: &str,
) -> Response {
    if status.code() >= 500 {
        error!(status = status.code(), "{message}");
    }
    Response {
        body: page::error_page(shell, status, message, stylesheet).into_bytes(),
        headers: vec![("content-type".to_owned(), media_type.to_owned())],
        status: status.code(),
    }
}

fn not_acceptable_message(err: &NotAcceptable) -> String {
    let items: Vec<String> = err.offered().iter().map(|t| escape_html(t)).collect();
    format!(
        "<p>Sorry, we couldn't agree on a mime-type. I can serve any of the following:</p>\
         <ul><li>{}</li></ul>",
        items.join("</li><li>"),
    )
}

fn describe(err: &Error) -> (Status, String) {
    match err {
        Error::NotAcceptable(e) => (Status::NotAcceptable, not_acceptable_message(e)),
        Error::MethodNotAllowed { method, .. } => {
            (Status::MethodNotAllowed, format!("Method {method} is not allowed on this resource."))
        }
        other => (Status::InternalServerError, escape_html(&other.to_string())),
    }
}

fn extra_headers(err: &Error) -> Vec<(String, String)> {
    match err {
        Error::MethodNotAllowed { allowed, .. } => {
            let allow: Vec<&str> = allowed.iter().map(|m| m.as_str()).collect();
            vec![("allow".to_owned(), allow.join(", "))]
        }
        _ => Vec::new(),
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `Status::Ok` (200).
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: u16,
}

impl ResponseBuilder {
    pub fn status(mut self, code: Status) -> Self {
        self.status = code.into();
        self
    }

    /// Sets `name`, replacing any value set earlier under the same name.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        set_header(&mut self.headers, name, value);
        self
    }

    /// Shorthand for `.header("content-type", media_type)`.
    pub fn content_type(self, media_type: &str) -> Self {
        self.header("content-type", media_type)
    }

    /// `Location` header, made absolute against `base`.
    pub fn location(self, base: &UrlBase, url: &str) -> Self {
        let absolute = base.rel2url(url);
        self.header("location", &absolute)
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: Vec<u8>) -> Response {
        self.finish("application/json", body)
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish("text/plain; charset=utf-8", body.into().into_bytes())
    }

    /// Terminate with a typed body.
    pub fn bytes(self, content_type: ContentType, body: Vec<u8>) -> Response {
        self.finish(content_type.as_str(), body)
    }

    /// Terminate with a body whose type was set through
    /// [`content_type`](Self::content_type) or [`header`](Self::header).
    pub fn body(self, body: Vec<u8>) -> Response {
        Response { body, headers: self.headers, status: self.status }
    }

    /// Terminate with no body (e.g. `Status::NoContent`, `Status::MovedPermanently`).
    pub fn no_body(self) -> Response {
        self.body(Vec::new())
    }

    fn finish(mut self, content_type: &str, body: Vec<u8>) -> Response {
        set_header(&mut self.headers, "content-type", content_type);
        Response { body, headers: self.headers, status: self.status }
    }
}

fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    headers.push((name.to_owned(), value.to_owned()));
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a [`Status`] directly from a handler: `return Status::NotFound`
impl IntoResponse for Status {
    fn into_response(self) -> Response { Response::status(self) }
}

/// Error page without request context: default shell, no stylesheet,
/// `text/html`. Use [`Response::from_error`] to honour the configured shell
/// and the client's XHTML support.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = describe(&self);
        let mut response =
            render_error(&DefaultShell, None, "text/html; charset=UTF-8", status, &message);
        response.headers.extend(extra_headers(&self));
        response
    }
}

impl IntoResponse for NotAcceptable {
    fn into_response(self) -> Response { Error::from(self).into_response() }
}

/// Lets handlers bail out with `?`.
impl<T: IntoResponse, E: IntoResponse> IntoResponse for Result<T, E> {
    fn into_response(self) -> Response {
        match self {
            Ok(v) => v.into_response(),
            Err(e) => e.into_response(),
        }
    }
}
