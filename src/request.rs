//! Incoming HTTP request type.
//!
//! A [`Request`] is also the per-request context: it parses the `Accept`
//! header on first use and keeps the result for every later negotiation in
//! the same request.

use std::sync::{Arc, OnceLock};
use std::time::SystemTime;

use tracing::debug;

use crate::config::Config;
use crate::date;
use crate::error::Error;
use crate::method::{Method, Spoof, UnknownMethod};
use crate::negotiate::{self, AcceptList, NotAcceptable};
use crate::uri::UrlBase;

/// An incoming HTTP request with its body fully buffered.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) uri: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
    pub(crate) config: Arc<Config>,
    accept: OnceLock<AcceptList>,
}

impl Request {
    pub(crate) fn new(
        method: Method,
        uri: String,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
        config: Arc<Config>,
    ) -> Self {
        Self { method, uri, headers, body, config, accept: OnceLock::new() }
    }

    /// Builder for synthetic requests (tests, CLI tools, offline rendering).
    pub fn builder() -> RequestBuilder {
        RequestBuilder {
            method: Method::Get,
            uri: "/".to_owned(),
            headers: Vec::new(),
            body: Vec::new(),
            config: None,
        }
    }

    pub fn method(&self) -> Method { self.method }
    /// Path plus query string, as the client sent it (or as rewritten by
    /// method spoofing).
    pub fn uri(&self) -> &str { &self.uri }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn config(&self) -> &Config { &self.config }

    pub fn path(&self) -> &str {
        self.uri.split_once('?').map_or(self.uri.as_str(), |(path, _)| path)
    }

    pub fn query(&self) -> Option<&str> {
        self.uri.split_once('?').map(|(_, query)| query)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn user_agent(&self) -> Option<&str> { self.header("user-agent") }
    pub fn content_type(&self) -> Option<&str> { self.header("content-type") }

    /// The parsed `Accept` header. Parsed on first call, then reused.
    pub fn accept(&self) -> &AcceptList {
        self.accept.get_or_init(|| {
            let list = AcceptList::parse(self.header("accept"));
            debug!(entries = list.len(), "parsed accept header");
            list
        })
    }

    /// Negotiates a media type against this request's `Accept` header.
    ///
    /// See [`negotiate::best_content_type`]. On `Err`, answer with the error
    /// (it converts into a `406 Not Acceptable` page) and do nothing else.
    pub fn best_content_type(
        &self,
        offers: &[(&str, f64)],
        fallback: Option<&str>,
    ) -> Result<String, NotAcceptable> {
        let result = negotiate::best_content_type(self.accept(), offers, fallback);
        match &result {
            Ok(media_type) => debug!(%media_type, "negotiated content type"),
            Err(e) => debug!("{e}"),
        }
        result
    }

    /// `text/html` for Internet Explorer, `application/xhtml+xml` otherwise.
    pub fn best_xhtml_type(&self) -> &'static str {
        negotiate::best_xhtml_type(self.user_agent())
    }

    /// Fails with [`Error::MethodNotAllowed`] unless the request method is
    /// one of `allowed`.
    pub fn require_method(&self, allowed: &[Method]) -> Result<(), Error> {
        if allowed.contains(&self.method) {
            return Ok(());
        }
        Err(Error::MethodNotAllowed { method: self.method, allowed: allowed.to_vec() })
    }

    /// `scheme://host[:port]` as clients see this server.
    pub fn url_base(&self) -> UrlBase {
        let (host, host_port) = match self.header("host") {
            Some(host) => split_host(host),
            None => ("localhost", None),
        };
        let name = self.config.server_name.as_deref().unwrap_or(host);
        let default_port = if self.config.https { 443 } else { 80 };
        let port = self.config.port.or(host_port).unwrap_or(default_port);
        UrlBase::new(self.config.https, name, port)
    }

    /// Makes `url` absolute against [`url_base`](Self::url_base).
    pub fn rel2url(&self, url: &str) -> String {
        self.url_base().rel2url(url)
    }

    /// `true` unless the client's `If-Modified-Since` shows it already holds
    /// the version last modified at `last_modified`.
    pub fn check_if_modified_since(&self, last_modified: SystemTime) -> bool {
        date::check_if_modified_since(self.header("if-modified-since"), last_modified)
    }

    /// Applies a `POST ...?http_method=X` override in place.
    pub(crate) fn apply_spoof(&mut self) -> Result<(), UnknownMethod> {
        let spoof = Spoof::detect(self.method, &self.uri, self.content_type(), &self.body)?;
        if let Some(spoof) = spoof {
            debug!(method = %spoof.method, uri = %spoof.uri, "method spoofed");
            self.method = spoof.method;
            self.uri = spoof.uri;
            if let Some(body) = spoof.body {
                self.body = body;
            }
        }
        Ok(())
    }
}

/// `example.org:8080` → (`example.org`, `Some(8080)`); IPv6 literals keep
/// their brackets.
fn split_host(host: &str) -> (&str, Option<u16>) {
    match host.rsplit_once(':') {
        Some((name, port)) if !name.contains(':') || name.ends_with(']') => {
            (name, port.parse().ok())
        }
        _ => (host, None),
    }
}

// ── RequestBuilder ────────────────────────────────────────────────────────────

/// Fluent builder for [`Request`]. Defaults to `GET /`.
pub struct RequestBuilder {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    config: Option<Arc<Config>>,
}

impl RequestBuilder {
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn uri(mut self, uri: &str) -> Self {
        self.uri = uri.to_owned();
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(Arc::new(config));
        self
    }

    pub fn build(self) -> Request {
        let config = self.config.unwrap_or_default();
        Request::new(self.method, self.uri, self.headers, self.body, config)
    }

    /// Builds the request and applies method spoofing the way the server
    /// does before calling a handler.
    pub fn build_spoofed(self) -> Result<Request, UnknownMethod> {
        let mut req = self.build();
        req.apply_spoof()?;
        Ok(req)
    }
}
